use clap::Parser;

#[derive(Debug, Clone, Parser)]
#[command(name = "etl-automator")]
#[command(
    about = "Pull records from APIs and CSV files, transform them, and write one destination"
)]
pub struct CliArgs {
    /// Path to TOML configuration file
    #[arg(short, long, default_value = "automator.toml")]
    pub config: String,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long)]
    pub json_logs: bool,

    /// Load and validate the configuration, print a summary, and stop
    #[arg(long)]
    pub dry_run: bool,
}
