//! Typed records from the Orka authentication endpoints.

use serde::{Deserialize, Serialize};

/// One company (database) available to the authenticated account.
///
/// Field names mirror the wire format so session state round-trips the
/// record exactly as the backend sent it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Company {
    #[serde(rename = "ID", default)]
    pub id: i64,

    /// Database name; doubles as the selector key for `SetCompanyCode`.
    #[serde(rename = "veritabaniadi")]
    pub database: String,

    /// Legal title.
    #[serde(rename = "unvan1", default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    /// Continuation of the legal title.
    #[serde(rename = "unvan2", default, skip_serializing_if = "Option::is_none")]
    pub title_extra: Option<String>,

    #[serde(
        rename = "vergidairekod",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub tax_office_code: Option<i64>,

    #[serde(
        rename = "vergidairesi",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub tax_office: Option<String>,
}

impl Company {
    /// The best available display label: the legal title when present,
    /// otherwise the database name.
    pub fn label(&self) -> &str {
        self.title
            .as_deref()
            .filter(|title| !title.is_empty())
            .unwrap_or(&self.database)
    }
}
