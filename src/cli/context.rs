//! Wiring from configuration to services for a single command run.

use anyhow::{Context, Result};
use std::sync::Arc;

use crate::domain::models::Config;
use crate::domain::ports::SessionStore;
use crate::infrastructure::http::{IconeSignClient, IconeSignClientConfig, SigningClient};
use crate::infrastructure::storage::{FileSessionStore, JsonlActivityRepository};
use crate::services::{ActivityService, AuthService, BatchSignService, TtnService};

/// Configuration and shared services handed to every command.
pub struct AppContext {
    pub config: Config,
    pub session: Arc<FileSessionStore>,
    pub activity: Arc<ActivityService>,
}

impl AppContext {
    pub fn new(config: Config) -> Self {
        let session = Arc::new(FileSessionStore::new(&config.storage.dir));
        let activity = Arc::new(ActivityService::new(Arc::new(JsonlActivityRepository::new(
            &config.storage.dir,
        ))));
        Self {
            config,
            session,
            activity,
        }
    }

    pub fn stored_token(&self) -> Result<Option<String>> {
        Ok(self
            .session
            .load()
            .context("Failed to read the stored session")?
            .token)
    }

    /// Backend client carrying `token`, if any.
    pub fn client_with_token(&self, token: Option<String>) -> Result<Arc<IconeSignClient>> {
        let client = IconeSignClient::new(IconeSignClientConfig::from(&self.config))
            .context("Failed to create IconeSign client")?;
        Ok(Arc::new(client.with_token(token)))
    }

    /// Backend client carrying the stored token.
    pub fn client(&self) -> Result<Arc<IconeSignClient>> {
        self.client_with_token(self.stored_token()?)
    }

    pub fn auth_service(&self) -> Result<AuthService> {
        Ok(AuthService::new(self.client_with_token(None)?, self.session.clone()))
    }

    pub fn ttn_service(&self) -> Result<TtnService> {
        Ok(TtnService::new(self.client()?, self.session.clone()))
    }

    pub fn batch_sign_service(&self) -> Result<BatchSignService> {
        let client = SigningClient::from_config(&self.config)
            .context("Failed to create signing client")?;
        Ok(BatchSignService::new(Arc::new(client), self.config.ttn.clone()))
    }
}
