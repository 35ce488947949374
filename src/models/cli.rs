use clap::Parser;

#[derive(clap::Parser, Debug)]
#[command(about = "Fetch today's comic strips into a single digest page")]
pub struct Cli {
    /// Comic list (yaml, toml or json)
    #[arg(long)]
    pub config: String,

    /// Directory everything is read from and written to
    #[arg(long, default_value = ".")]
    pub folder: String,

    /// Digest template; the bundled one is used when omitted
    #[arg(long)]
    pub template: Option<String>,
}

impl Cli {
    pub fn new() -> Self {
        Cli::parse()
    }
}

impl Default for Cli {
    fn default() -> Self {
        Self::new()
    }
}
