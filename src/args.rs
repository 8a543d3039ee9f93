//! These structs provide the CLI interface for the orka CLI.

use crate::commands::Collection;
use crate::session::DEFAULT_COMPANY_YEAR;
use clap::{Parser, Subcommand};
use std::convert::Infallible;
use std::fmt::{Display, Formatter};
use std::ops::Deref;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::error;
use tracing_subscriber::filter::LevelFilter;

/// orka: A command-line tool for Orka ERP financial data.
///
/// The purpose of this program is to log in to an Orka ERP backend with an
/// API key, select one of the account's company databases, download its
/// financial documents into a local cache, and summarize them (sales,
/// purchases, profit) on the command line.
///
/// You will need an Orka API key for this; your Orka administrator can
/// issue one. Start with `orka init --api-key <key>`.
#[derive(Debug, Parser, Clone)]
pub struct Args {
    #[clap(flatten)]
    common: Common,

    #[command(subcommand)]
    command: Command,
}

impl Args {
    pub fn new(common: Common, command: Command) -> Self {
        Self { common, command }
    }

    pub fn common(&self) -> &Common {
        &self.common
    }

    pub fn command(&self) -> &Command {
        &self.command
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Create the data directory and initialize the configuration files.
    ///
    /// This is the first command you should run when setting up the orka
    /// CLI.
    ///
    /// - Decide what directory you want to store data in and pass this as
    ///   --orka-home. By default, it will be $HOME/orka.
    ///
    /// - Pass your Orka API key as --api-key. It is stored under the data
    ///   directory with restrictive permissions and used to authenticate
    ///   from then on.
    Init(InitArgs),

    /// Authenticate with the Orka backend and list the available companies.
    Login(LoginArgs),

    /// Refresh and list the companies available to the account.
    Companies(CompaniesArgs),

    /// Select the active company database.
    Company(CompanyArgs),

    /// Download a document collection for the active company.
    Fetch(FetchArgs),

    /// Compute and display the financial dashboard summary.
    Dashboard(DashboardArgs),

    /// Drop the persisted session state (tokens, company selection).
    Logout,
}

/// Arguments common to all subcommands.
#[derive(Debug, Parser, Clone)]
pub struct Common {
    /// The logging verbosity. One of, from least to most verbose:
    /// off, error, warn, info, debug, trace
    ///
    /// This can be overridden by RUST_LOG. See the tracing-subscriber
    /// crate for instructions.
    #[arg(long, default_value_t = LevelFilter::INFO)]
    log_level: LevelFilter,

    /// The directory where orka data and configuration is held. Defaults
    /// to ~/orka
    #[arg(long, env = "ORKA_HOME", default_value_t = default_orka_home())]
    orka_home: DisplayPath,
}

impl Common {
    pub fn new(log_level: LevelFilter, orka_home: PathBuf) -> Self {
        Self {
            log_level,
            orka_home: orka_home.into(),
        }
    }

    pub fn log_level(&self) -> LevelFilter {
        self.log_level
    }

    pub fn orka_home(&self) -> &DisplayPath {
        &self.orka_home
    }
}

/// Args for the `orka init` command.
#[derive(Debug, Parser, Clone)]
pub struct InitArgs {
    /// The Orka API key used to authenticate this installation.
    #[arg(long)]
    api_key: String,

    /// The base URL of the Orka backend. Defaults to the hosted service.
    #[arg(long)]
    base_url: Option<String>,

    /// The company database year used when listing companies.
    #[arg(long, default_value_t = DEFAULT_COMPANY_YEAR)]
    company_year: i32,
}

impl InitArgs {
    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    pub fn base_url(&self) -> Option<&str> {
        self.base_url.as_deref()
    }

    pub fn company_year(&self) -> i32 {
        self.company_year
    }
}

/// Args for the `orka login` command.
#[derive(Debug, Parser, Clone)]
pub struct LoginArgs {
    /// Override the configured company database year.
    #[arg(long)]
    year: Option<i32>,
}

impl LoginArgs {
    pub fn year(&self) -> Option<i32> {
        self.year
    }
}

/// Args for the `orka companies` command.
#[derive(Debug, Parser, Clone)]
pub struct CompaniesArgs {
    /// Override the configured company database year.
    #[arg(long)]
    year: Option<i32>,
}

impl CompaniesArgs {
    pub fn year(&self) -> Option<i32> {
        self.year
    }
}

/// Args for the `orka company` command.
#[derive(Debug, Parser, Clone)]
pub struct CompanyArgs {
    /// The company database name, as listed by `orka companies`.
    database: String,
}

impl CompanyArgs {
    pub fn database(&self) -> &str {
        &self.database
    }
}

/// Args for the `orka fetch` command.
#[derive(Debug, Parser, Clone)]
pub struct FetchArgs {
    /// Which collection to fetch: "documents" or "receipts"
    collection: Collection,

    /// Bypass the cache and fetch from the backend.
    #[arg(long)]
    refresh: bool,
}

impl FetchArgs {
    pub fn collection(&self) -> Collection {
        self.collection
    }

    pub fn refresh(&self) -> bool {
        self.refresh
    }
}

/// Args for the `orka dashboard` command.
#[derive(Debug, Parser, Clone)]
pub struct DashboardArgs {
    /// Bypass the cache and fetch from the backend.
    #[arg(long)]
    refresh: bool,
}

impl DashboardArgs {
    pub fn refresh(&self) -> bool {
        self.refresh
    }
}

fn default_orka_home() -> DisplayPath {
    DisplayPath(match dirs::home_dir() {
        Some(home) => home.join("orka"),
        None => {
            error!(
                "There was an error when trying to get your home directory. You can get around \
                this by providing --orka-home or ORKA_HOME instead of relying on the default \
                orka home directory. If you continue using the program right now, you may have \
                problems!",
            );
            PathBuf::from("orka")
        }
    })
}

#[derive(Debug, Default, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct DisplayPath(PathBuf);

impl From<PathBuf> for DisplayPath {
    fn from(value: PathBuf) -> Self {
        DisplayPath(value)
    }
}

impl Deref for DisplayPath {
    type Target = Path;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl AsRef<Path> for DisplayPath {
    fn as_ref(&self) -> &Path {
        &self.0
    }
}

impl Display for DisplayPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.to_string_lossy())
    }
}

impl FromStr for DisplayPath {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(PathBuf::from(s)))
    }
}

impl DisplayPath {
    pub fn new(path: PathBuf) -> Self {
        Self(path)
    }

    pub fn path(&self) -> &Path {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition_is_consistent() {
        use clap::CommandFactory;
        <Args as CommandFactory>::command().debug_assert();
    }

    #[test]
    fn test_parse_fetch() {
        let args =
            Args::try_parse_from(["orka", "fetch", "receipts", "--refresh"]).unwrap();
        match args.command() {
            Command::Fetch(fetch) => {
                assert_eq!(fetch.collection(), Collection::Receipts);
                assert!(fetch.refresh());
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_parse_common_home_override() {
        let args =
            Args::try_parse_from(["orka", "--orka-home", "/tmp/orka-x", "logout"]).unwrap();
        assert_eq!(args.common().orka_home().path(), Path::new("/tmp/orka-x"));
    }
}
