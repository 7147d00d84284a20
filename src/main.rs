use anyhow::Result;
use clap::Parser;

use staffdesk::{
    app::load_config,
    cli::{handle_command, report_error, Cli, Commands},
    utils::init_logger,
    Config,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    init_logger(if cli.verbose { "info" } else { "warn" })?;

    // `init` may be pointed at a file that doesn't exist yet
    let mut config = match cli.command {
        Commands::Init => Config::default(),
        _ => load_config(cli.config.as_deref())?,
    };

    if let Some(base_url) = &cli.base_url {
        config.api.base_url = base_url.clone();
    }

    if let Err(e) = handle_command(&cli, config).await {
        std::process::exit(report_error(&e));
    }

    Ok(())
}
