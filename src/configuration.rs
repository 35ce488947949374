use crate::models::ComicRule;
use config::{Config, ConfigError, FileFormat};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

#[derive(Deserialize, Debug)]
pub struct Settings {
    pub comics: Vec<ComicRule>,
    #[serde(default)]
    pub http: HttpSettings,
}

#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct HttpSettings {
    /// How many comics are fetched at once.
    pub concurrency: usize,
    /// Limit for connecting, and for a whole page request.
    pub timeout_seconds: u64,
    /// Limit for a whole image transfer, body included.
    pub image_timeout_seconds: u64,
    /// Retries for transient failures (connection errors, 5xx, 429).
    pub retries: u32,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            concurrency: 4,
            timeout_seconds: 30,
            image_timeout_seconds: 300,
            retries: 2,
        }
    }
}

impl HttpSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    pub fn image_timeout(&self) -> Duration {
        Duration::from_secs(self.image_timeout_seconds)
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency.max(1)
    }
}

impl Settings {
    /// Loads `config_file`, guessing the format from its extension. Files
    /// with no or an unknown extension are read as YAML.
    pub fn new(config_file: &str) -> Result<Self, ConfigError> {
        let format = format_for(Path::new(config_file)).unwrap_or(FileFormat::Yaml);
        let builder = Config::builder()
            .add_source(config::File::new(config_file, format))
            .build()?;
        builder.try_deserialize()
    }
}

fn format_for(path: &Path) -> Option<FileFormat> {
    let ext = path.extension()?.to_string_lossy().to_lowercase();
    match ext.as_str() {
        "yaml" | "yml" => Some(FileFormat::Yaml),
        "toml" => Some(FileFormat::Toml),
        "json" => Some(FileFormat::Json),
        "json5" => Some(FileFormat::Json5),
        "ini" => Some(FileFormat::Ini),
        "ron" => Some(FileFormat::Ron),
        _ => None,
    }
}
