use crate::api::{self, Mode};
use crate::commands::fetch::{records, Collection};
use crate::commands::{format_amount, Out};
use crate::model::{build_summary, DashboardSummary};
use crate::{Config, Result, Session};

/// Computes and displays the financial summary over the documents
/// collection: total sales, total purchases, profit, and how many
/// documents count as transactions.
pub async fn dashboard(config: Config, mode: Mode, refresh: bool) -> Result<Out<DashboardSummary>> {
    let erp = api::erp(&config, mode)?;
    let mut session = Session::load(&config).await?;
    let documents = records(
        &config,
        erp.as_ref(),
        &mut session,
        Collection::Documents,
        refresh,
    )
    .await?;
    let summary = build_summary(&documents);

    let heading = session
        .selected_company()
        .map(|company| company.label().to_string())
        .unwrap_or_else(|| "Dashboard".to_string());
    let message = format!(
        "{heading}\n\
         \x20 Sales:        {:>14}\n\
         \x20 Purchases:    {:>14}\n\
         \x20 Profit:       {:>14}\n\
         \x20 Transactions: {:>14}",
        format_amount(summary.total_sales),
        format_amount(summary.total_purchases),
        format_amount(summary.profit),
        summary.transaction_count,
    );
    Ok(Out::new(message, summary))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test::TestEnv;
    use rust_decimal::Decimal;
    use std::str::FromStr;

    #[tokio::test]
    async fn test_dashboard_over_seed_documents() {
        let env = TestEnv::new().await;
        crate::commands::select_company(env.config().clone(), Mode::Test, "ORKA2025_DEMO")
            .await
            .unwrap();

        let out = dashboard(env.config().clone(), Mode::Test, false).await.unwrap();
        assert!(out.message().contains("Demo Ticaret A.S."));
        assert!(out.message().contains("5,500.00"));
        assert!(out.message().contains("2,000.00"));
        assert!(out.message().contains("3,500.00"));

        let summary = out.structure().unwrap();
        assert_eq!(summary.total_sales, Decimal::from_str("5500.00").unwrap());
        assert_eq!(summary.profit, Decimal::from_str("3500.00").unwrap());
        assert_eq!(summary.transaction_count, 3);
    }

    #[tokio::test]
    async fn test_dashboard_requires_a_selected_company() {
        let env = TestEnv::new().await;
        assert!(dashboard(env.config().clone(), Mode::Test, false).await.is_err());
    }
}
