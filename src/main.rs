use clap::Parser;
use orka_sync::args::{Args, Command};
use orka_sync::{commands, Config, Mode, Result};
use std::process::ExitCode;
use tracing::{debug, error, trace};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    let log_level = args.common().log_level();
    init_logger(log_level);
    debug!("Log level set to {}", log_level.to_string().to_lowercase());

    match main_inner(args).await {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Exiting with error: {e}");
            ExitCode::FAILURE
        }
    }
}

pub async fn main_inner(args: Args) -> Result<()> {
    trace!("{args:?}");
    let home = args.common().orka_home().path();

    // This allows for testing the program without hitting the Orka APIs.
    // When ORKA_SYNC_IN_TEST_MODE is set and non-zero in length, the mode
    // will be Mode::Test, otherwise it will be Mode::Http.
    let mode = Mode::from_env();

    // Route to appropriate command handler
    let _: () = match args.command() {
        Command::Init(init_args) => commands::init(
            home,
            init_args.api_key(),
            init_args.base_url(),
            init_args.company_year(),
        )
        .await?
        .print(),

        Command::Login(login_args) => {
            let config = Config::load(home).await?;
            commands::login(config, mode, login_args.year()).await?.print()
        }

        Command::Companies(companies_args) => {
            let config = Config::load(home).await?;
            commands::companies(config, mode, companies_args.year())
                .await?
                .print()
        }

        Command::Company(company_args) => {
            let config = Config::load(home).await?;
            commands::select_company(config, mode, company_args.database())
                .await?
                .print()
        }

        Command::Fetch(fetch_args) => {
            let config = Config::load(home).await?;
            commands::fetch(config, mode, fetch_args.collection(), fetch_args.refresh())
                .await?
                .print()
        }

        Command::Dashboard(dashboard_args) => {
            let config = Config::load(home).await?;
            commands::dashboard(config, mode, dashboard_args.refresh())
                .await?
                .print()
        }

        Command::Logout => {
            let config = Config::load(home).await?;
            commands::logout(config).await?.print()
        }
    };
    Ok(())
}

/// Initializes the tracing subscriber.
pub fn init_logger(level: LevelFilter) {
    let filter = match std::env::var("RUST_LOG").ok() {
        Some(_) => {
            // RUST_LOG exists; use it.
            EnvFilter::from_default_env()
        }
        None => {
            // RUST_LOG does not exist; use the default log level for this
            // package's crates only (command output prints from the lib).
            EnvFilter::new(format!(
                "orka_sync={},{}={}",
                level,
                env!("CARGO_CRATE_NAME"),
                level
            ))
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
