//! Implements the `Erp` trait against the real Orka HTTP backend.

use crate::api::{ApiUser, Envelope, Erp};
use crate::model::Company;
use crate::Result;
use anyhow::{bail, Context};
use reqwest::header;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;
use tracing::trace;
use url::Url;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(20);

/// Identification the backend expects alongside the API key.
const INTEGRATION_APP: &str = "Orka Sync";
const INTEGRATION_USER: &str = "CLI";

/// A thin reqwest wrapper around the Orka endpoints. Stateless: tokens are
/// owned by the session layer and passed in per call.
pub struct ErpHttp {
    http: reqwest::Client,
    base_url: Url,
}

impl ErpHttp {
    pub fn new(base_url: &str) -> Result<Self> {
        let base_url = Url::parse(base_url)
            .with_context(|| format!("Invalid Orka base URL '{base_url}'"))?;
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("Unable to build the HTTP client")?;
        Ok(Self { http, base_url })
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path)
            .with_context(|| format!("Invalid endpoint path '{path}'"))
    }

    async fn get_envelope<T>(
        &self,
        path: &str,
        token: &str,
        query: &[(&str, String)],
    ) -> Result<Envelope<T>>
    where
        T: DeserializeOwned,
    {
        let url = self.endpoint(path)?;
        trace!("GET {url}");
        let response = self
            .http
            .get(url)
            .header(header::ACCEPT, "application/json")
            .header(header::AUTHORIZATION, token)
            .query(query)
            .send()
            .await
            .with_context(|| format!("Request to {path} failed"))?;
        decode(response, path).await
    }
}

#[async_trait::async_trait]
impl Erp for ErpHttp {
    async fn login(&self, api_key: &str) -> Result<ApiUser> {
        let url = self.endpoint("/Auth/Login")?;
        trace!("POST {}", url.path());
        let response = self
            .http
            .post(url)
            .header(header::ACCEPT, "application/json")
            .query(&[
                ("ApiKey", api_key),
                ("EntegreApp", INTEGRATION_APP),
                ("EntegreUserName", INTEGRATION_USER),
            ])
            .send()
            .await
            .context("The login request failed")?;
        decode::<ApiUser>(response, "/Auth/Login")
            .await?
            .require_data()
    }

    async fn company_codes(&self, token: &str, year: i32) -> Result<Vec<Company>> {
        self.get_envelope(
            "/Auth/GetCompanyCodes",
            token,
            &[("CompanyDataBaseYear", year.to_string())],
        )
        .await?
        .data_or_default()
    }

    async fn select_company(&self, token: &str, database: &str) -> Result<ApiUser> {
        self.get_envelope(
            "/Auth/SetCompanyCode",
            token,
            &[("VeritabaniKodu", database.to_string())],
        )
        .await?
        .require_data()
    }

    async fn documents(&self, token: &str, page: u32) -> Result<Vec<Value>> {
        self.get_envelope(
            "/ERP/Documents/GetAll",
            token,
            &[("Page", page.to_string())],
        )
        .await?
        .data_or_default()
    }

    async fn receipts(&self, token: &str, page: u32) -> Result<Vec<Value>> {
        self.get_envelope(
            "/ERP/Accounting/GetAllReceipts",
            token,
            &[("Page", page.to_string())],
        )
        .await?
        .data_or_default()
    }
}

/// Rejects non-2xx responses, then decodes the response envelope.
async fn decode<T>(response: reqwest::Response, path: &str) -> Result<Envelope<T>>
where
    T: DeserializeOwned,
{
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        bail!("Orka returned {status} for {path}: {body}");
    }
    response
        .json()
        .await
        .with_context(|| format!("Unable to decode the {path} response"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_joins_against_base() {
        let client = ErpHttp::new("https://admin.orka.com.tr").unwrap();
        let url = client.endpoint("/Auth/Login").unwrap();
        assert_eq!(url.as_str(), "https://admin.orka.com.tr/Auth/Login");
    }

    #[test]
    fn test_invalid_base_url_is_rejected() {
        assert!(ErpHttp::new("not a url").is_err());
    }
}
