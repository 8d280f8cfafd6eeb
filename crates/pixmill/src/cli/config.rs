//! The `pixmill config` command for viewing configuration.

use clap::{Args, Subcommand};
use pixmill_core::Config;

/// Arguments for the `config` command.
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommands,
}

/// Config subcommands.
#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show the effective configuration as TOML
    Show,

    /// Print the config file path
    Path,
}

/// Execute the config command.
pub fn execute(args: ConfigArgs, config: Config) -> anyhow::Result<()> {
    match args.command {
        ConfigCommands::Show => {
            println!("{}", config.to_toml()?);
        }
        ConfigCommands::Path => {
            println!("{}", Config::default_path().display());
        }
    }
    Ok(())
}
