//! CLI entry point.
//!
//! Parses arguments, initialises logging, bootstraps the composition root
//! and dispatches to a handler. Failures are mapped to exit codes here.

use std::process::ExitCode;

use clap::{CommandFactory, Parser};
use tracing_subscriber::EnvFilter;

use gatewatch_cli::bootstrap::NoticeSink;
use gatewatch_cli::{Cli, CliConfig, CliError, Commands, bootstrap, handlers};

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    // Load environment variables before anything reads them
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {err:#}");
            let code = err.downcast_ref::<CliError>().map_or(1, CliError::exit_code);
            ExitCode::from(u8::try_from(code).unwrap_or(1))
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let Some(command) = cli.command else {
        Cli::command().print_help()?;
        return Ok(());
    };

    let notices = if matches!(command, Commands::Watch { .. }) {
        NoticeSink::Log
    } else {
        NoticeSink::Console
    };
    let config = CliConfig::with_defaults()?.with_notices(notices);
    let ctx = bootstrap(config).await?;

    match command {
        Commands::Status { json } => handlers::status::execute(&ctx, json).await,
        Commands::Start => handlers::lifecycle::start(&ctx).await,
        Commands::Stop => handlers::lifecycle::stop(&ctx).await,
        Commands::Restart => handlers::lifecycle::restart(&ctx).await,
        Commands::Refresh => handlers::lifecycle::refresh(&ctx).await,
        Commands::InstallService => handlers::service::install(&ctx).await,
        Commands::UninstallService => handlers::service::uninstall(&ctx).await,
        Commands::Mode { mode } => handlers::settings::mode(&ctx, mode).await,
        Commands::Entry { path, clear } => handlers::settings::entry(&ctx, path, clear).await,
        Commands::Update => handlers::update::execute(&ctx).await,
        Commands::Watch { start } => handlers::watch::execute(&ctx, start).await,
        Commands::Paths => handlers::paths::execute(&ctx).await,
    }
}
