use crate::api::{self, Erp, Mode};
use crate::commands::{format_amount, Out};
use crate::model::{
    document_amount, normalize_date, receipt_amount, resolve_direction, Document,
};
use crate::{Config, Result, Session};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

/// How many records the fetch message lists.
const LISTING_LIMIT: usize = 5;

/// Which document collection to fetch.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum Collection {
    /// Financial documents (invoices, despatches).
    #[default]
    Documents,
    /// Accounting receipts.
    Receipts,
}

serde_plain::derive_display_from_serialize!(Collection);
serde_plain::derive_fromstr_from_deserialize!(Collection);

/// Downloads one collection for the selected company, serving it from the
/// cache when fresh, and prints a short listing.
pub async fn fetch(config: Config, mode: Mode, collection: Collection, refresh: bool) -> Result<Out<Vec<Value>>> {
    let erp = api::erp(&config, mode)?;
    let mut session = Session::load(&config).await?;
    let records = records(&config, erp.as_ref(), &mut session, collection, refresh).await?;

    let mut message = format!("{} {collection}", records.len());
    for record in records.iter().take(LISTING_LIMIT) {
        message.push('\n');
        message.push_str(&match collection {
            Collection::Documents => document_listing_line(record),
            Collection::Receipts => receipt_listing_line(record),
        });
    }
    if records.len() > LISTING_LIMIT {
        message.push_str(&format!("\n  ... and {} more", records.len() - LISTING_LIMIT));
    }
    Ok(Out::new(message, records))
}

/// The read-through cache path shared by `fetch` and `dashboard`: serve a
/// fresh cache entry, otherwise call the backend and store the result.
pub(crate) async fn records(
    config: &Config,
    erp: &dyn Erp,
    session: &mut Session,
    collection: Collection,
    refresh: bool,
) -> Result<Vec<Value>> {
    let (token, database) = session.ensure_firm_token(erp).await?;
    let cache_key = format!("{database}/{collection}");

    if !refresh {
        if let Some(Value::Array(records)) = config.db().get_json(&cache_key).await? {
            debug!("Serving {cache_key} from cache ({} records)", records.len());
            return Ok(records);
        }
    }

    let records = match collection {
        Collection::Documents => erp.documents(&token, 1).await?,
        Collection::Receipts => erp.receipts(&token, 1).await?,
    };
    debug!("Fetched {} {collection} from the backend", records.len());

    config
        .db()
        .put_json(
            &cache_key,
            &Value::Array(records.clone()),
            config.cache_ttl_minutes(),
        )
        .await?;
    let purged = config.db().purge_expired().await?;
    if purged > 0 {
        debug!("Purged {purged} expired cache entries");
    }
    Ok(records)
}

fn document_listing_line(record: &Value) -> String {
    let document = Document::new(record);
    let number = document.number().unwrap_or("-");
    let series = document.series().unwrap_or("-");
    let date = document
        .raw_date()
        .and_then(normalize_date)
        .map(|date| date.to_string())
        .unwrap_or_else(|| "-".to_string());
    let amount = document_amount(record)
        .map(format_amount)
        .unwrap_or_else(|| "-".to_string());
    let direction = resolve_direction(&document)
        .map(|direction| direction.to_string())
        .unwrap_or_default();
    format!("  #{number:<8} {series:<2} {date:<10} {amount:>14} {direction}")
}

fn receipt_listing_line(record: &Value) -> String {
    let identity = record
        .get("OrkaUQ")
        .and_then(Value::as_str)
        .unwrap_or("-");
    let description = ["fisaciklama", "FisAciklama"]
        .iter()
        .find_map(|key| record.get(*key))
        .and_then(Value::as_str)
        .unwrap_or("-");
    let amount = receipt_amount(record)
        .map(format_amount)
        .unwrap_or_else(|| "-".to_string());
    format!("  {identity:<14} {description:<24} {amount:>14}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test::TestEnv;

    async fn selected_env() -> TestEnv {
        let env = TestEnv::new().await;
        crate::commands::select_company(env.config().clone(), Mode::Test, "ORKA2025_DEMO")
            .await
            .unwrap();
        env
    }

    #[tokio::test]
    async fn test_fetch_documents_lists_and_returns_records() {
        let env = selected_env().await;
        let out = fetch(env.config().clone(), Mode::Test, Collection::Documents, false)
            .await
            .unwrap();
        assert!(out.message().starts_with("4 documents"));
        assert!(out.message().contains("#000041"));
        assert!(out.message().contains("2025-02-14"));
        assert!(out.message().contains("4,000.00"));
        assert!(out.message().contains("sale"));
        assert_eq!(out.structure().unwrap().len(), 4);
    }

    #[tokio::test]
    async fn test_fetch_receipts_lists_headline_amounts() {
        let env = selected_env().await;
        let out = fetch(env.config().clone(), Mode::Test, Collection::Receipts, false)
            .await
            .unwrap();
        assert!(out.message().starts_with("2 receipts"));
        assert!(out.message().contains("Kira odemesi"));
        assert!(out.message().contains("12,000.00"));
        assert!(out.message().contains("3,500.00"));
    }

    #[tokio::test]
    async fn test_fetch_requires_a_selected_company() {
        let env = TestEnv::new().await;
        let error = fetch(env.config().clone(), Mode::Test, Collection::Documents, false)
            .await
            .unwrap_err();
        assert!(error.to_string().contains("No company selected"));
    }

    #[tokio::test]
    async fn test_second_fetch_is_served_from_cache() {
        let env = selected_env().await;
        fetch(env.config().clone(), Mode::Test, Collection::Documents, false)
            .await
            .unwrap();
        // Poison the cache entry; a cached read returns it verbatim.
        let key = "ORKA2025_DEMO/documents";
        env.config()
            .db()
            .put_json(key, &serde_json::json!([{"OrkaUQ": "CACHED"}]), 60)
            .await
            .unwrap();
        let out = fetch(env.config().clone(), Mode::Test, Collection::Documents, false)
            .await
            .unwrap();
        assert_eq!(out.structure().unwrap().len(), 1);

        // --refresh bypasses the cache and overwrites the entry.
        let out = fetch(env.config().clone(), Mode::Test, Collection::Documents, true)
            .await
            .unwrap();
        assert_eq!(out.structure().unwrap().len(), 4);
        let cached = env.config().db().get_json(key).await.unwrap().unwrap();
        assert_eq!(cached.as_array().unwrap().len(), 4);
    }
}
