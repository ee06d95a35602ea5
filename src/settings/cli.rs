use super::Parser;

#[derive(Parser, Debug)]
#[command(about = "Issues, rotates and revokes access/refresh token pairs")]
pub struct Cli {
    /// Path to the settings file (defaults to settings/dev.toml or settings/release.toml).
    #[arg(long)]
    pub settings: Option<String>,
}
