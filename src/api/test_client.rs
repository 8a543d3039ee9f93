//! Implements the `Erp` trait using in-memory data for testing purposes.
//!
//! Note: this is compiled even in the "production" version of this app so
//! that we can run the whole app, top-to-bottom, without an Orka backend.

use crate::api::{ApiUser, Erp};
use crate::model::Company;
use crate::Result;
use anyhow::bail;
use serde_json::Value;

pub(crate) const TEST_LOGIN_TOKEN: &str = "test-login-token";
pub(crate) const TEST_FIRM_TOKEN: &str = "test-firm-token";
#[cfg(test)]
pub(crate) const TEST_DATABASE: &str = "ORKA2025_DEMO";

/// An `Erp` implementation seeded with a small, fixed data set. Token
/// checks are just strict enough to catch a command wiring the wrong token
/// into the wrong call.
#[derive(Debug, Default, Clone, Copy)]
pub(crate) struct TestErp;

#[async_trait::async_trait]
impl Erp for TestErp {
    async fn login(&self, api_key: &str) -> Result<ApiUser> {
        if api_key.trim().is_empty() {
            bail!("Orka error 401: Gecersiz API anahtari");
        }
        Ok(ApiUser {
            key: Some("test-key".to_string()),
            user_name: Some("Test Kullanici".to_string()),
            token: TEST_LOGIN_TOKEN.to_string(),
            firm_code: None,
            connection: None,
            company: None,
        })
    }

    async fn company_codes(&self, token: &str, _year: i32) -> Result<Vec<Company>> {
        require_token(token, TEST_LOGIN_TOKEN, "GetCompanyCodes")?;
        serde_json::from_str(COMPANY_DATA).map_err(Into::into)
    }

    async fn select_company(&self, token: &str, database: &str) -> Result<ApiUser> {
        require_token(token, TEST_LOGIN_TOKEN, "SetCompanyCode")?;
        let companies: Vec<Company> = serde_json::from_str(COMPANY_DATA)?;
        let Some(company) = companies.into_iter().find(|c| c.database == database) else {
            bail!("Orka error 404: Veritabani bulunamadi: {database}");
        };
        Ok(ApiUser {
            key: Some("test-key".to_string()),
            user_name: Some("Test Kullanici".to_string()),
            token: TEST_FIRM_TOKEN.to_string(),
            firm_code: Some(format!("{:03}", company.id)),
            connection: None,
            company: Some(company),
        })
    }

    async fn documents(&self, token: &str, _page: u32) -> Result<Vec<Value>> {
        require_token(token, TEST_FIRM_TOKEN, "Documents/GetAll")?;
        serde_json::from_str(DOCUMENT_DATA).map_err(Into::into)
    }

    async fn receipts(&self, token: &str, _page: u32) -> Result<Vec<Value>> {
        require_token(token, TEST_FIRM_TOKEN, "Accounting/GetAllReceipts")?;
        serde_json::from_str(RECEIPT_DATA).map_err(Into::into)
    }
}

fn require_token(actual: &str, expected: &str, endpoint: &str) -> Result<()> {
    if actual != expected {
        bail!("Orka error 401: token gecersiz ({endpoint})");
    }
    Ok(())
}

/// Seed company data.
const COMPANY_DATA: &str = r#"[
  {
    "ID": 3,
    "veritabaniadi": "ORKA2025_DEMO",
    "unvan1": "Demo Ticaret A.S.",
    "vergidairekod": 34,
    "vergidairesi": "Kadikoy"
  },
  {
    "ID": 7,
    "veritabaniadi": "ORKA2025_YEDEK",
    "unvan1": "Yedek Depo Ltd. Sti."
  }
]"#;

/// Seed document data. Covers the encodings seen in the wild: plain
/// decimals, minor-unit integers, locale-formatted strings, header-level
/// fallback documents, and one record with nothing resolvable.
const DOCUMENT_DATA: &str = r#"[
  {
    "OrkaUQ": "F2025-000041",
    "STK_STOKBASLIK": {
      "belgeno": "000041",
      "belgeserino": "A",
      "belgetarihi": "2025-02-14T00:00:00",
      "cariunvan": "Yilmaz Insaat Ltd.",
      "IOdurum": -1
    },
    "STK_STOKSATIR": [
      {
        "stokkodu": "PRF-100",
        "stokadi": "Aluminyum Profil",
        "miktaradet": 12,
        "IOdurum": -1,
        "nettutar": 1850.5
      },
      {
        "stokkodu": "PRF-220",
        "stokadi": "Celik Levha",
        "miktaradet": 4,
        "IOdurum": -1,
        "nettutar": "2.149,50"
      }
    ]
  },
  {
    "OrkaUQ": "F2025-000042",
    "STK_STOKBASLIK": {
      "belgeno": "000042",
      "belgeserino": "B",
      "belgetarihi": "2025-02-20T00:00:00",
      "cariunvan": "Demir Metal San.",
      "IOdurum": 1
    },
    "STK_STOKSATIR": [
      {
        "stokkodu": "HAM-010",
        "stokadi": "Sac Rulo",
        "miktaradet": 2,
        "IOdurum": 1,
        "nettutar": 125000
      },
      {
        "stokkodu": "HAM-011",
        "stokadi": "Epoksi Boya",
        "miktaradet": 10,
        "IOdurum": 1,
        "nettutar": 75000
      }
    ]
  },
  {
    "OrkaUQ": "F2025-000043",
    "STK_STOKBASLIK": {
      "belgeno": "000043",
      "belgeserino": "A",
      "belgetarihi": "20250226",
      "toplamtutar": "1.500,00",
      "alisSatis": "satis"
    },
    "STK_STOKSATIR": [
      { "stokkodu": "HZM-001", "stokadi": "Nakliye Hizmeti", "miktaradet": 1 }
    ]
  },
  {
    "OrkaUQ": "F2025-000044",
    "STK_STOKBASLIK": {
      "belgeno": "000044",
      "belgeserino": "C",
      "belgetarihi": "2025-02-28T00:00:00"
    },
    "STK_STOKSATIR": [{ "stokkodu": "NOT-001", "aciklama": "iptal edildi" }]
  }
]"#;

/// Seed accounting receipt data.
const RECEIPT_DATA: &str = r#"[
  {
    "OrkaUQ": "M2025-000101",
    "fisno": 101,
    "fistarihi": "2025-02-15T00:00:00",
    "fisaciklama": "Kira odemesi",
    "borctoplam": "12.000,00"
  },
  {
    "OrkaUQ": "M2025-000102",
    "fisno": 102,
    "fistarihi": "2025-02-18T00:00:00",
    "fisaciklama": "Musteri tahsilati",
    "alacaktoplam": 350000
  }
]"#;
