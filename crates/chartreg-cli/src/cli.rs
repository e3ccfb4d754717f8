use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "chartreg",
    about = "Chart registry — store, compose, and serve chart bundles",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Path to the yaml configuration file.
    #[arg(short, long, global = true)]
    pub config: Option<String>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Start the registry server
    Serve(ServeArgs),
    /// Print the effective configuration
    Config(ConfigArgs),
}

#[derive(Args)]
pub struct ServeArgs {
    /// Listen address, overriding the config file.
    #[arg(long)]
    pub listen: Option<String>,
}

#[derive(Args)]
pub struct ConfigArgs {}
