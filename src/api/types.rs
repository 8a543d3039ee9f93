//! Wire types for the Orka HTTP API.

use crate::model::Company;
use crate::Result;
use anyhow::{bail, Context};
use serde::Deserialize;

/// The success/error wrapper around every Orka response body.
#[derive(Debug, Clone, Deserialize)]
pub struct Envelope<T> {
    #[serde(rename = "Data")]
    data: Option<T>,

    #[serde(rename = "ErrorCode", default)]
    error_code: Option<i64>,

    #[serde(rename = "ErrorMessage", default)]
    error_message: Option<String>,

    #[serde(rename = "ErrorCodeDescription", default)]
    error_code_description: Option<String>,

    /// Informational message, unused for error reporting.
    #[serde(rename = "Message", default)]
    _message: Option<String>,
}

impl<T> Envelope<T> {
    /// Unwraps the payload, turning a non-zero `ErrorCode` into an error.
    pub(crate) fn require_data(self) -> Result<T> {
        self.check()?;
        self.data.context("The Orka response carried no Data payload")
    }

    /// Like `require_data`, except a missing payload becomes
    /// `T::default()`. List endpoints omit `Data` instead of sending `[]`.
    pub(crate) fn data_or_default(self) -> Result<T>
    where
        T: Default,
    {
        self.check()?;
        Ok(self.data.unwrap_or_default())
    }

    fn check(&self) -> Result<()> {
        match self.error_code {
            Some(code) if code != 0 => {
                let reason = self
                    .error_message
                    .as_deref()
                    .or(self.error_code_description.as_deref())
                    .unwrap_or("Orka API error");
                bail!("Orka error {code}: {reason}")
            }
            _ => Ok(()),
        }
    }
}

/// An authenticated account session, as returned by both `Login` and
/// `SetCompanyCode` (the latter includes the selected company record).
#[derive(Debug, Clone, Deserialize)]
pub struct ApiUser {
    #[serde(rename = "Key", default)]
    pub key: Option<String>,

    #[serde(rename = "KullaniciAdi", default)]
    pub user_name: Option<String>,

    /// The bearer token for subsequent calls.
    #[serde(rename = "Token", default)]
    pub token: String,

    #[serde(rename = "FirmaKodu", default)]
    pub firm_code: Option<String>,

    #[serde(rename = "Connection", default)]
    pub connection: Option<String>,

    /// Present on `SetCompanyCode` responses.
    #[serde(rename = "FirmaTanim", default)]
    pub company: Option<Company>,
}
