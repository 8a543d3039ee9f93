use crate::api::{self, Mode};
use crate::commands::Out;
use crate::model::Company;
use crate::{Config, Result, Session};

/// Refreshes and lists the companies available to the account.
pub async fn companies(config: Config, mode: Mode, year: Option<i32>) -> Result<Out<Vec<Company>>> {
    let erp = api::erp(&config, mode)?;
    let mut session = Session::load(&config).await?;
    session.refresh_companies(erp.as_ref(), year).await?;

    let companies = session.companies().to_vec();
    let mut message = format!("{} companies:", companies.len());
    for company in &companies {
        let marker = if session
            .selected_company()
            .is_some_and(|selected| selected.database == company.database)
        {
            "*"
        } else {
            " "
        };
        message.push_str(&format!(
            "\n{marker} {:<24} {}",
            company.database,
            company.label()
        ));
    }
    Ok(Out::new(message, companies))
}

/// Selects the active company database for subsequent fetches.
pub async fn select_company(config: Config, mode: Mode, database: &str) -> Result<Out<Company>> {
    let erp = api::erp(&config, mode)?;
    let mut session = Session::load(&config).await?;
    session.select_company(erp.as_ref(), database).await?;

    match session.selected_company() {
        Some(company) => Ok(Out::new(
            format!("Active company: {} ({})", company.label(), company.database),
            company.clone(),
        )),
        None => Ok(Out::new_message(format!(
            "Active company set to {database}, but the backend returned no company record"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test::TestEnv;

    #[tokio::test]
    async fn test_companies_marks_the_selected_one() {
        let env = TestEnv::new().await;
        select_company(env.config().clone(), Mode::Test, "ORKA2025_DEMO")
            .await
            .unwrap();
        let out = companies(env.config().clone(), Mode::Test, None).await.unwrap();
        assert!(out.message().contains("* ORKA2025_DEMO"));
        assert!(out.message().contains("  ORKA2025_YEDEK"));
    }

    #[tokio::test]
    async fn test_select_company_reports_the_label() {
        let env = TestEnv::new().await;
        let out = select_company(env.config().clone(), Mode::Test, "ORKA2025_DEMO")
            .await
            .unwrap();
        assert!(out.message().contains("Demo Ticaret A.S."));
        assert_eq!(out.structure().unwrap().database, "ORKA2025_DEMO");
    }

    #[tokio::test]
    async fn test_select_unknown_company_fails() {
        let env = TestEnv::new().await;
        assert!(
            select_company(env.config().clone(), Mode::Test, "ORKA2025_YOK")
                .await
                .is_err()
        );
    }
}
