use anyhow::{Context, Result};
use std::path::PathBuf;
use std::sync::Arc;

use super::config::Config;
use crate::api::{AuthApi, EmployeesApi, FormsApi};
use crate::gateway::{AuthObserver, Gateway};
use crate::session::{FileTokenStore, MemoryTokenStore, Session, TokenStore};

/// Everything a command needs: config, the persisted session and the API handles
pub struct AppContext {
    pub config: Config,
    /// `None` when credentials live only in memory
    pub credentials_path: Option<PathBuf>,
    pub session: Session,
    pub auth: AuthApi,
    pub forms: FormsApi,
    pub employees: EmployeesApi,
}

impl AppContext {
    /// Open the credentials file and wire up one shared gateway
    pub fn new(config: Config, observer: Arc<dyn AuthObserver>) -> Result<Self> {
        let credentials_path = config.storage.credentials_file()?;
        let store = FileTokenStore::open(&credentials_path).with_context(|| {
            format!("Failed to open credentials at {}", credentials_path.display())
        })?;
        Self::assemble(config, Arc::new(store), Some(credentials_path), observer)
    }

    /// Like [`AppContext::new`] but nothing is read from or written to disk
    pub fn ephemeral(config: Config, observer: Arc<dyn AuthObserver>) -> Result<Self> {
        Self::assemble(config, Arc::new(MemoryTokenStore::new()), None, observer)
    }

    fn assemble(
        config: Config,
        store: Arc<dyn TokenStore>,
        credentials_path: Option<PathBuf>,
        observer: Arc<dyn AuthObserver>,
    ) -> Result<Self> {
        let session = Session::new(store);
        let gateway = Gateway::from_config(&config.api, session.clone(), observer)
            .context("Failed to create HTTP client")?;

        Ok(Self {
            auth: AuthApi::new(gateway.clone()),
            forms: FormsApi::new(gateway.clone()),
            employees: EmployeesApi::new(gateway),
            config,
            credentials_path,
            session,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::LogOnlyObserver;
    use tempfile::TempDir;

    fn config_in(dir: &TempDir) -> Config {
        let mut config = Config::default();
        config.storage.credentials_path = Some(dir.path().join("credentials.toml"));
        config
    }

    #[test]
    fn test_file_backed_context_persists() {
        let temp_dir = TempDir::new().unwrap();
        let ctx = AppContext::new(config_in(&temp_dir), Arc::new(LogOnlyObserver)).unwrap();

        ctx.session.set_tokens("a1", Some("r1")).unwrap();

        let path = temp_dir.path().join("credentials.toml");
        assert_eq!(ctx.credentials_path.as_deref(), Some(path.as_path()));
        assert!(path.exists());
    }

    #[test]
    fn test_ephemeral_context_touches_no_file() {
        let temp_dir = TempDir::new().unwrap();
        let ctx = AppContext::ephemeral(config_in(&temp_dir), Arc::new(LogOnlyObserver)).unwrap();

        ctx.session.set_tokens("a1", Some("r1")).unwrap();

        assert!(ctx.credentials_path.is_none());
        assert_eq!(ctx.session.access_token().as_deref(), Some("a1"));
        assert!(!temp_dir.path().join("credentials.toml").exists());
    }
}
