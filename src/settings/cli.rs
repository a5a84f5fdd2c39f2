use super::Parser;

#[derive(Parser, Debug)]
#[command(name = "tripline", about = "Trip API auth server")]
pub struct Cli {
    /// Path to a settings file, without or with the `.toml` extension.
    #[arg(long)]
    pub settings: Option<String>,
}
