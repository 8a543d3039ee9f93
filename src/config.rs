//! Configuration and data-directory handling.
//!
//! The data directory (`$ORKA_HOME`, default `~/orka`) holds `config.json`,
//! the persisted session state, the API key secret and the sqlite cache:
//!
//! ```text
//! $ORKA_HOME/
//!   config.json
//!   session.json
//!   orka.sqlite
//!   .secrets/api_key
//! ```

use crate::db::Db;
use crate::{utils, Result};
use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use url::Url;

const APP_NAME: &str = "orka";
const CONFIG_VERSION: u8 = 1;
const DEFAULT_BASE_URL: &str = "https://admin.orka.com.tr";
const DEFAULT_CACHE_TTL_MINUTES: i64 = 60;
const SECRETS: &str = ".secrets";
const API_KEY_FILE: &str = "api_key";
const CONFIG_JSON: &str = "config.json";
const SESSION_JSON: &str = "session.json";
const ORKA_SQLITE: &str = "orka.sqlite";

/// The `Config` object represents the configuration of the app. You
/// instantiate it by providing the path to `$ORKA_HOME`, and from there it
/// loads `config.json` and provides paths to everything else the data
/// directory holds.
#[derive(Debug, Clone)]
pub struct Config {
    root: PathBuf,
    secrets: PathBuf,
    config_path: PathBuf,
    session_path: PathBuf,
    sqlite_path: PathBuf,
    config_file: ConfigFile,
    db: Db,
}

impl Config {
    /// Creates the data directory and:
    /// - writes an initial `config.json` with the base URL and company year
    /// - stores `api_key` at its default location under `.secrets`
    /// - initializes the sqlite cache
    ///
    /// # Errors
    /// Returns an error if the directory cannot be created, the base URL is
    /// invalid, or the database already exists.
    pub async fn create(
        dir: impl Into<PathBuf>,
        api_key: &str,
        base_url: Option<&str>,
        company_year: i32,
    ) -> Result<Self> {
        let maybe_relative = dir.into();
        utils::make_dir(&maybe_relative)
            .await
            .context("Unable to create the orka home directory")?;
        let root = utils::canonicalize(&maybe_relative).await?;

        let base_url = base_url.unwrap_or(DEFAULT_BASE_URL).to_string();
        Url::parse(&base_url).with_context(|| format!("Invalid base URL '{base_url}'"))?;

        let secrets = root.join(SECRETS);
        utils::make_dir(&secrets).await?;
        let api_key_path = secrets.join(API_KEY_FILE);
        write_secret(&api_key_path, api_key.trim()).await?;

        let config_path = root.join(CONFIG_JSON);
        let config_file = ConfigFile {
            app_name: APP_NAME.to_string(),
            config_version: CONFIG_VERSION,
            base_url,
            company_year,
            cache_ttl_minutes: DEFAULT_CACHE_TTL_MINUTES,
            api_key_path: None,
        };
        config_file.save(&config_path).await?;

        let sqlite_path = root.join(ORKA_SQLITE);
        let db = Db::init(&sqlite_path)
            .await
            .context("Unable to create the sqlite cache")?;

        Ok(Self {
            root: root.clone(),
            secrets,
            config_path,
            session_path: root.join(SESSION_JSON),
            sqlite_path,
            config_file,
            db,
        })
    }

    /// Validates that the home directory and its expected contents exist,
    /// loads `config.json`, and opens the sqlite cache.
    pub async fn load(orka_home: impl Into<PathBuf>) -> Result<Self> {
        let maybe_relative = orka_home.into();
        let root = utils::canonicalize(&maybe_relative)
            .await
            .context("Orka home is missing. Run 'orka init' first")?;
        let _ = utils::read_dir(&root).await?;

        let config_path = root.join(CONFIG_JSON);
        if !config_path.is_file() {
            bail!("The config file is missing '{}'", config_path.display());
        }
        let config_file = ConfigFile::load(&config_path).await?;

        let secrets = root.join(SECRETS);
        if !secrets.is_dir() {
            bail!("The secrets directory is missing '{}'", secrets.display());
        }

        let sqlite_path = root.join(ORKA_SQLITE);
        let db = Db::load(&sqlite_path)
            .await
            .context("Unable to open the sqlite cache")?;

        Ok(Self {
            root: root.clone(),
            secrets,
            config_path,
            session_path: root.join(SESSION_JSON),
            sqlite_path,
            config_file,
            db,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    pub fn session_path(&self) -> &Path {
        &self.session_path
    }

    pub fn sqlite_path(&self) -> &Path {
        &self.sqlite_path
    }

    pub fn base_url(&self) -> &str {
        &self.config_file.base_url
    }

    pub fn company_year(&self) -> i32 {
        self.config_file.company_year
    }

    pub fn cache_ttl_minutes(&self) -> i64 {
        self.config_file.cache_ttl_minutes
    }

    pub(crate) fn db(&self) -> &Db {
        &self.db
    }

    /// Reads the API key from its secret file. The stored path may be
    /// absolute or relative to the home directory.
    pub async fn api_key(&self) -> Result<String> {
        let path = self.api_key_path();
        let content = utils::read(&path)
            .await
            .context("Unable to read the API key. Run 'orka init' first")?;
        let api_key = content.trim().to_string();
        if api_key.is_empty() {
            bail!("The API key file at {} is empty", path.display());
        }
        Ok(api_key)
    }

    fn api_key_path(&self) -> PathBuf {
        let p = self.config_file.api_key_path();
        if p.is_absolute() {
            return p;
        }
        self.root.join(p)
    }
}

/// Represents the serialization format of the configuration file.
///
/// Example configuration:
/// ```json
/// {
///   "app_name": "orka",
///   "config_version": 1,
///   "base_url": "https://admin.orka.com.tr",
///   "company_year": 2025,
///   "cache_ttl_minutes": 60
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
struct ConfigFile {
    /// Application name, should always be "orka".
    app_name: String,

    /// Configuration file version.
    config_version: u8,

    /// Base URL of the Orka backend.
    base_url: String,

    /// Database year passed to `GetCompanyCodes`.
    company_year: i32,

    /// How long fetched collections are served from the cache.
    #[serde(default = "default_cache_ttl")]
    cache_ttl_minutes: i64,

    /// Path to the API key file (optional, relative to the home directory
    /// or absolute). Defaults to `.secrets/api_key`.
    #[serde(skip_serializing_if = "Option::is_none")]
    api_key_path: Option<PathBuf>,
}

fn default_cache_ttl() -> i64 {
    DEFAULT_CACHE_TTL_MINUTES
}

impl ConfigFile {
    async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let config: ConfigFile = utils::deserialize(path).await?;
        anyhow::ensure!(
            config.app_name == APP_NAME,
            "Invalid app_name in config file: expected '{}', got '{}'",
            APP_NAME,
            config.app_name
        );
        Ok(config)
    }

    async fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let data = serde_json::to_string_pretty(self).context("Unable to serialize config")?;
        utils::write(path.as_ref(), data)
            .await
            .context("Unable to write config file")
    }

    fn api_key_path(&self) -> PathBuf {
        self.api_key_path
            .clone()
            .unwrap_or_else(|| PathBuf::from(SECRETS).join(API_KEY_FILE))
    }
}

/// Writes a secret file with restrictive permissions (0600 on Unix).
async fn write_secret(path: &Path, contents: &str) -> Result<()> {
    utils::write(path, contents).await?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let permissions = std::fs::Permissions::from_mode(0o600);
        std::fs::set_permissions(path, permissions)
            .with_context(|| format!("Failed to set permissions on {}", path.display()))?;
    }
    Ok(())
}
