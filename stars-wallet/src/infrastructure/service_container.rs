//! Service container for dependency injection

use std::sync::Arc;
use tracing::info;

use crate::adapters::{session, storage};
use crate::config::WalletConfig;
use crate::core::{AccountStore, SessionStore, WalletError, WalletResult};
use crate::domain::deposit::DepositWorkflow;
use crate::metrics::WalletMetrics;
use crate::services::WalletService;

/// Health of the two backends
#[derive(Debug, Clone, serde::Serialize)]
pub struct ServiceHealth {
    pub account_store: bool,
    pub session_store: bool,
    pub overall: bool,
}

/// Service container managing all dependencies
pub struct ServiceContainer {
    /// Configuration
    pub config: WalletConfig,

    /// Durable ledger
    pub accounts: Arc<dyn AccountStore>,

    /// Pending deposits
    pub sessions: Arc<dyn SessionStore>,

    pub metrics: Arc<WalletMetrics>,

    /// Facade used by the messaging surface
    pub wallet: Arc<WalletService>,
}

impl ServiceContainer {
    /// Initialize the service container with all dependencies
    pub async fn new(config: WalletConfig) -> WalletResult<Self> {
        info!("Initializing service container");

        let accounts = storage::connect(&config.storage).await?;
        let sessions = session::build(&config.session)?;
        info!("Storage backends initialized");

        Self::from_parts(config, accounts, sessions)
    }

    /// Wire the services around already constructed backends
    pub fn from_parts(
        config: WalletConfig,
        accounts: Arc<dyn AccountStore>,
        sessions: Arc<dyn SessionStore>,
    ) -> WalletResult<Self> {
        let metrics = Arc::new(WalletMetrics::new()?);
        let workflow = Arc::new(DepositWorkflow::from_config(
            accounts.clone(),
            sessions.clone(),
            &config.deposit,
            metrics.clone(),
        ));
        let wallet = Arc::new(WalletService::new(accounts.clone(), workflow));

        Ok(Self {
            config,
            accounts,
            sessions,
            metrics,
            wallet,
        })
    }

    /// Probe both backends without failing
    pub async fn health(&self) -> ServiceHealth {
        let (accounts, sessions) =
            futures::future::join(self.accounts.health_check(), self.sessions.health_check()).await;
        let account_store = accounts.is_ok();
        let session_store = sessions.is_ok();
        ServiceHealth {
            account_store,
            session_store,
            overall: account_store && session_store,
        }
    }

    /// Perform health check on all services
    pub async fn health_check(&self) -> WalletResult<()> {
        info!("Performing health check");

        let health = self.health().await;
        if !health.overall {
            return Err(WalletError::Configuration(format!(
                "Health check failed: account_store={}, session_store={}",
                health.account_store, health.session_store
            )));
        }

        info!("All services healthy");
        Ok(())
    }
}
