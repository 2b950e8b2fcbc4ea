use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use tracing::level_filters::LevelFilter;
use vesrates::cli::convert::Currency;
use vesrates::core::log::init_logging;

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to optional configuration file
    #[arg(short, long, global = true)]
    config_path: Option<String>,

    /// Use a process-local store instead of the configured cache
    #[arg(long, global = true)]
    memory: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Clone, Copy, ValueEnum)]
enum CurrencyArg {
    Usd,
    Eur,
}

impl From<CurrencyArg> for Currency {
    fn from(arg: CurrencyArg) -> Currency {
        match arg {
            CurrencyArg::Usd => Currency::Usd,
            CurrencyArg::Eur => Currency::Eur,
        }
    }
}

impl From<Commands> for vesrates::AppCommand {
    fn from(cmd: Commands) -> vesrates::AppCommand {
        match cmd {
            Commands::Serve => vesrates::AppCommand::Serve,
            Commands::Refresh => vesrates::AppCommand::Refresh,
            Commands::Rates => vesrates::AppCommand::Rates,
            Commands::Convert { amount, currency } => vesrates::AppCommand::Convert {
                amount,
                currency: currency.into(),
            },
            Commands::Setup => unreachable!("Setup command should be handled separately"),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// Serve the rates and update-rates endpoints
    Serve,
    /// Fetch current rates and write them to the cache
    Refresh,
    /// Display the cached rates
    Rates,
    /// Convert an amount to bolívares at the cached rates
    Convert {
        /// Amount to convert
        #[arg(allow_negative_numbers = true)]
        amount: f64,
        /// Currency of the amount
        #[arg(long, value_enum, default_value = "usd")]
        currency: CurrencyArg,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let quiet_level = match cli.command {
        Some(Commands::Serve) => LevelFilter::INFO,
        _ => LevelFilter::OFF,
    };
    init_logging(cli.verbose, quiet_level);

    let result = match cli.command {
        Some(Commands::Setup) => vesrates::cli::setup::setup(),
        Some(cmd) => {
            vesrates::run_command(cmd.into(), cli.config_path.as_deref(), cli.memory).await
        },
        None => {
            Cli::command().print_help()?;
            Ok(())
        }
    };

    if let Err(e) = &result {
        tracing::error!(error = %e, "Application failed");
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_negative_amount_parses() {
        let cli = Cli::try_parse_from(["vesrates", "convert", "-3"]).unwrap();

        match cli.command {
            Some(Commands::Convert { amount, .. }) => assert_eq!(amount, -3.0),
            _ => panic!("Expected convert command"),
        }
    }

    #[test]
    fn test_memory_flag_is_global() {
        let cli = Cli::try_parse_from(["vesrates", "serve", "--memory"]).unwrap();
        assert!(cli.memory);

        let cli = Cli::try_parse_from(["vesrates", "rates"]).unwrap();
        assert!(!cli.memory);
    }
}
