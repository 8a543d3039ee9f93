use crate::commands::Out;
use crate::{Config, Result};
use std::path::Path;

/// Creates the data directory, stores the API key, and initializes the
/// local cache.
pub async fn init(
    home: &Path,
    api_key: &str,
    base_url: Option<&str>,
    company_year: i32,
) -> Result<Out<()>> {
    let config = Config::create(home, api_key, base_url, company_year).await?;
    Ok(Out::new_message(format!(
        "Initialized orka home at {} (backend {})",
        config.root().display(),
        config.base_url()
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_init_creates_a_loadable_home() {
        let dir = TempDir::new().unwrap();
        let home = dir.path().join("orka");
        let out = init(&home, "abc123", None, 2025).await.unwrap();
        assert!(out.message().contains("Initialized"));
        let config = Config::load(&home).await.unwrap();
        assert_eq!(config.company_year(), 2025);
    }

    #[tokio::test]
    async fn test_init_twice_fails() {
        let dir = TempDir::new().unwrap();
        let home = dir.path().join("orka");
        init(&home, "abc123", None, 2025).await.unwrap();
        assert!(init(&home, "abc123", None, 2025).await.is_err());
    }
}
