//! The HTTP interface to the Orka backend.
//!
//! Everything the rest of the app needs from the backend goes through the
//! `Erp` trait, so commands and the session layer never touch HTTP types
//! directly. Two implementations exist: `ErpHttp` (reqwest, the real
//! backend) and `TestErp` (in-memory seed data), selected by
//! `Mode::from_env()`.

mod client;
mod test_client;
mod types;

pub use client::ErpHttp;
pub(crate) use test_client::TestErp;
#[cfg(test)]
pub(crate) use test_client::{TEST_DATABASE, TEST_FIRM_TOKEN, TEST_LOGIN_TOKEN};
pub use types::{ApiUser, Envelope};

use crate::model::Company;
use crate::{Config, Result};
use serde_json::Value;

/// Selects between the real backend and the in-memory test backend.
///
/// This allows for testing the program without hitting the Orka APIs: when
/// `ORKA_SYNC_IN_TEST_MODE` is set and non-zero in length the mode is
/// `Test`, otherwise `Http`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Mode {
    #[default]
    Http,
    Test,
}

impl Mode {
    pub fn from_env() -> Self {
        match std::env::var("ORKA_SYNC_IN_TEST_MODE") {
            Ok(value) if !value.is_empty() => Mode::Test,
            _ => Mode::Http,
        }
    }
}

/// Creates an ERP client for `mode`.
pub fn erp(config: &Config, mode: Mode) -> Result<Box<dyn Erp>> {
    Ok(match mode {
        Mode::Http => Box::new(ErpHttp::new(config.base_url())?),
        Mode::Test => Box::new(TestErp::default()),
    })
}

/// Operations the application needs from the Orka backend.
#[async_trait::async_trait]
pub trait Erp: Send + Sync {
    /// `POST /Auth/Login`: exchanges the API key for a login token.
    async fn login(&self, api_key: &str) -> Result<ApiUser>;

    /// `GET /Auth/GetCompanyCodes`: companies visible to the account for
    /// the given database year.
    async fn company_codes(&self, token: &str, year: i32) -> Result<Vec<Company>>;

    /// `GET /Auth/SetCompanyCode`: exchanges a login token for a token
    /// scoped to one company database. The login token is consumed.
    async fn select_company(&self, token: &str, database: &str) -> Result<ApiUser>;

    /// `GET /ERP/Documents/GetAll`: one page of financial documents.
    async fn documents(&self, token: &str, page: u32) -> Result<Vec<Value>>;

    /// `GET /ERP/Accounting/GetAllReceipts`: one page of accounting
    /// receipts.
    async fn receipts(&self, token: &str, page: u32) -> Result<Vec<Value>>;
}
