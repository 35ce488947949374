use chrono::Local;
use dailystrips::configuration::Settings;
use dailystrips::models::Cli;
use dailystrips::render::{load_template, publish};
use dailystrips::run::run;
use env_logger::{Builder, Env, Target};
use log::{error, info};
use resolve_path::PathResolveExt;
use std::{env, path::Path, process};

#[tokio::main]
async fn main() {
    // Init logging
    let mut builder = Builder::from_env(Env::default().default_filter_or("info"));
    builder.target(Target::Stdout);
    builder.init();

    // Parse Args
    let args = Cli::new();

    // One date for the whole run, however long it takes
    let today = Local::now().date_naive();

    // Everything below is relative to the output folder
    let folder = args.folder.resolve();
    if let Err(e) = env::set_current_dir(&folder) {
        error!("Unable to enter {}: {}", folder.display(), e);
        process::exit(1);
    }
    info!("Output Directory: {}", folder.display());

    // Parse Settings
    let config_path = args.config.resolve();
    let settings = match Settings::new(&config_path.to_string_lossy()) {
        Ok(s) => s,
        Err(e) => {
            error!("Configuration error: {}", e);
            process::exit(1);
        }
    };
    let template_path = args.template.as_ref().map(|t| t.resolve());
    let template = match load_template(template_path.as_deref()) {
        Ok(t) => t,
        Err(e) => {
            error!("Template error: {:#}", e);
            process::exit(1);
        }
    };

    // Run
    let result = run(&settings, today, Path::new(".")).await;
    if let Err(e) = publish(&result, &template, Path::new(".")) {
        error!("Application error: {:#}", e);
        process::exit(1);
    }
}
