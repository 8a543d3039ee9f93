use crate::api::{self, Mode};
use crate::commands::Out;
use crate::model::Company;
use crate::{Config, Result, Session};

/// Authenticates with the stored API key and lists the companies available
/// to the account.
pub async fn login(config: Config, mode: Mode, year: Option<i32>) -> Result<Out<Vec<Company>>> {
    let erp = api::erp(&config, mode)?;
    let mut session = Session::load(&config).await?;
    session
        .login(erp.as_ref(), year.or(Some(config.company_year())))
        .await?;

    let companies = session.companies().to_vec();
    let mut message = format!("Logged in. {} companies available:", companies.len());
    for company in &companies {
        message.push_str(&format!("\n  {:<24} {}", company.database, company.label()));
    }
    message.push_str("\nSelect one with 'orka company <database>'.");
    Ok(Out::new(message, companies))
}

/// Drops the persisted session state.
pub async fn logout(config: Config) -> Result<Out<()>> {
    let mut session = Session::load(&config).await?;
    session.logout().await?;
    Ok(Out::new_message("Logged out; session state removed."))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test::TestEnv;

    #[tokio::test]
    async fn test_login_lists_companies() {
        let env = TestEnv::new().await;
        let out = login(env.config().clone(), Mode::Test, None).await.unwrap();
        assert!(out.message().contains("2 companies"));
        assert!(out.message().contains("ORKA2025_DEMO"));
        assert_eq!(out.structure().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_logout_after_login() {
        let env = TestEnv::new().await;
        login(env.config().clone(), Mode::Test, None).await.unwrap();
        assert!(env.config().session_path().is_file());
        logout(env.config().clone()).await.unwrap();
        assert!(!env.config().session_path().is_file());
    }
}
