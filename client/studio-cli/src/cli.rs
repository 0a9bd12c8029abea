use crate::commands::Commands;

use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "studio")]
#[command(about = "Drive a studio project's environment, preview and deployments")]
#[command(version)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Backend URL (overrides api.base_url)
    #[arg(long, global = true)]
    pub server: Option<String>,

    /// User ID sent with every request
    #[arg(long, global = true)]
    pub user_id: Option<String>,

    /// Pretty-print JSON output
    #[arg(long, global = true)]
    pub pretty: bool,
}
