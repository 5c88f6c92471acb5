use std::sync::Arc;

use axum::extract::FromRef;

use crate::auth::{jwt::TokenIssuer, services::CredentialStore};
use crate::config::AppConfig;
use crate::db;

#[derive(Clone)]
pub struct AppState {
    pub store: CredentialStore,
    pub tokens: TokenIssuer,
    pub config: Arc<AppConfig>,
}

impl AppState {
    /// Validates `config`, opens the store and makes sure the schema exists.
    pub async fn init(config: AppConfig) -> anyhow::Result<Self> {
        config.validate()?;
        let tokens = TokenIssuer::from_config(&config.jwt)?;

        let store = CredentialStore::new(db::connect(&config.database_url).await?);
        store.ensure_schema().await?;

        Ok(Self::from_parts(store, tokens, Arc::new(config)))
    }

    pub fn from_parts(store: CredentialStore, tokens: TokenIssuer, config: Arc<AppConfig>) -> Self {
        Self {
            store,
            tokens,
            config,
        }
    }
}

impl FromRef<AppState> for TokenIssuer {
    fn from_ref(state: &AppState) -> Self {
        state.tokens.clone()
    }
}
