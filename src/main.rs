//! smali2java CLI entry point.

use clap::Parser;

use smali2java::cli::{self, Cli, Commands};
use smali2java::LoggerImpl;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match cli::load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(err) => cli::handle_error(err, cli.json),
    };

    let _logger = match LoggerImpl::init(&config.logging) {
        Ok(logger) => logger,
        Err(err) => cli::handle_error(err, cli.json),
    };

    let result = match cli.command {
        Commands::Convert(args) => cli::commands::convert::execute(args, &config, cli.json).await,
        Commands::Locate(args) => cli::commands::locate::execute(args, &config, cli.json).await,
        Commands::Tools(args) => cli::commands::tools::execute(args, &config, cli.json).await,
    };

    if let Err(err) = result {
        cli::handle_error(err, cli.json);
    }
}
