pub mod configuration;
pub mod download;
pub mod extract;
pub mod fetch;
pub mod http_client;
pub mod models;
pub mod render;
pub mod run;

pub use configuration::Settings;
pub use models::Cli;
pub use render::render;
pub use run::run;
