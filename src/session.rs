//! Login and firm token lifecycle.
//!
//! Orka issues two short-lived bearer tokens: a login token scoped to the
//! account and a firm token scoped to one company database. Selecting a
//! company consumes the login token upstream, so the stored one is dropped
//! at that point and re-created on demand from the API key. State is
//! persisted as `session.json` in the data directory so tokens survive
//! across invocations within their lifetime.

use crate::api::Erp;
use crate::model::Company;
use crate::{utils, Config, Result};
use anyhow::{ensure, Context};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{debug, warn};

/// Tokens expire upstream at about 15 minutes; refresh a little early.
const TOKEN_LIFETIME_MINUTES: i64 = 14;

/// The company database year used when none was configured.
pub const DEFAULT_COMPANY_YEAR: i32 = 2025;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct TokenState {
    token: String,
    expires_at: DateTime<Utc>,
}

impl TokenState {
    fn issue(token: String) -> Self {
        Self {
            token,
            expires_at: Utc::now() + Duration::minutes(TOKEN_LIFETIME_MINUTES),
        }
    }

    fn is_expired(&self) -> bool {
        Utc::now() >= self.expires_at
    }
}

/// The serialization format of `session.json`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
struct SessionFile {
    company_year: Option<i32>,
    login: Option<TokenState>,
    firm: Option<TokenState>,
    companies: Vec<Company>,
    selected_company: Option<Company>,
}

/// The session state machine plus its persistence path: logged out →
/// logged in (login token) → company selected (firm token).
pub struct Session {
    path: PathBuf,
    api_key: String,
    file: SessionFile,
}

impl Session {
    /// Loads the persisted session, or starts an empty one. An unreadable
    /// session file is treated as logged out, not as a fatal error.
    pub async fn load(config: &Config) -> Result<Self> {
        let path = config.session_path().to_path_buf();
        let api_key = config.api_key().await?;
        let file = if path.is_file() {
            match utils::deserialize(&path).await {
                Ok(file) => file,
                Err(error) => {
                    warn!("Discarding unreadable session state: {error:#}");
                    SessionFile::default()
                }
            }
        } else {
            SessionFile::default()
        };
        Ok(Self {
            path,
            api_key,
            file,
        })
    }

    /// The companies fetched at the most recent login.
    pub fn companies(&self) -> &[Company] {
        &self.file.companies
    }

    pub fn selected_company(&self) -> Option<&Company> {
        self.file.selected_company.as_ref()
    }

    /// Authenticates with the stored API key and refreshes the company
    /// list for `year` (falling back to the configured year). Returns the
    /// new login token.
    pub async fn login(&mut self, erp: &dyn Erp, year: Option<i32>) -> Result<String> {
        let year = year
            .or(self.file.company_year)
            .unwrap_or(DEFAULT_COMPANY_YEAR);
        let user = erp.login(&self.api_key).await?;
        ensure!(
            !user.token.is_empty(),
            "Login succeeded but the response carried no token"
        );
        let companies = erp.company_codes(&user.token, year).await?;
        debug!("Logged in; {} companies for {year}", companies.len());

        self.file.company_year = Some(year);
        self.file.companies = companies;
        self.file.login = Some(TokenState::issue(user.token.clone()));
        self.save().await?;
        Ok(user.token)
    }

    /// A valid login token, re-authenticating when missing or expired.
    pub async fn ensure_login_token(&mut self, erp: &dyn Erp) -> Result<String> {
        if let Some(login) = &self.file.login {
            if !login.is_expired() {
                return Ok(login.token.clone());
            }
            debug!("Login token expired, re-authenticating");
        }
        self.login(erp, None).await
    }

    /// Refreshes the company list, re-authenticating first if needed.
    pub async fn refresh_companies(&mut self, erp: &dyn Erp, year: Option<i32>) -> Result<()> {
        let token = self.ensure_login_token(erp).await?;
        let year = year
            .or(self.file.company_year)
            .unwrap_or(DEFAULT_COMPANY_YEAR);
        self.file.companies = erp.company_codes(&token, year).await?;
        self.file.company_year = Some(year);
        self.save().await
    }

    /// Selects the active company database and stores its firm token. The
    /// login token is consumed by the backend, so it is dropped here and
    /// re-created from the API key next time it is needed.
    pub async fn select_company(&mut self, erp: &dyn Erp, database: &str) -> Result<()> {
        let token = self.ensure_login_token(erp).await?;
        let user = erp.select_company(&token, database).await?;
        ensure!(
            !user.token.is_empty(),
            "Company selection succeeded but the response carried no token"
        );

        let selected = self
            .file
            .companies
            .iter()
            .find(|company| company.database == database)
            .cloned()
            .or(user.company);
        self.file.selected_company = selected;
        self.file.firm = Some(TokenState::issue(user.token));
        self.file.login = None;
        self.save().await
    }

    /// A valid firm token for the selected company, re-selecting it when
    /// the stored token expired. Returns the token and the company
    /// database name.
    pub async fn ensure_firm_token(&mut self, erp: &dyn Erp) -> Result<(String, String)> {
        let database = self
            .file
            .selected_company
            .as_ref()
            .map(|company| company.database.clone())
            .context("No company selected. Run 'orka company <database>' first")?;

        if let Some(firm) = &self.file.firm {
            if !firm.is_expired() {
                return Ok((firm.token.clone(), database));
            }
            debug!("Firm token expired, re-selecting {database}");
        }

        self.select_company(erp, &database).await?;
        let firm = self
            .file
            .firm
            .as_ref()
            .context("Company selection did not produce a firm token")?;
        Ok((firm.token.clone(), database))
    }

    /// Drops all session state and deletes the persisted file.
    pub async fn logout(&mut self) -> Result<()> {
        self.file = SessionFile::default();
        if self.path.is_file() {
            tokio::fs::remove_file(&self.path)
                .await
                .with_context(|| format!("Unable to remove {}", self.path.display()))?;
        }
        Ok(())
    }

    async fn save(&self) -> Result<()> {
        let data =
            serde_json::to_string_pretty(&self.file).context("Unable to serialize the session")?;
        utils::write(&self.path, data).await
    }
}
