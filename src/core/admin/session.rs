use crate::core::failover::context::FailoverContext;
use crate::core::network::storage::LocalStore;
use crate::core::network::types::ClientError;
use serde_json::Value;
use std::sync::Arc;

/// Persisted admin login (`authToken` + `user`)
pub struct AdminSession {
    store: Arc<LocalStore>,
    context: Arc<FailoverContext>,
}

impl AdminSession {
    pub fn new(store: Arc<LocalStore>, context: Arc<FailoverContext>) -> Self {
        Self { store, context }
    }

    pub async fn save(&self, token: &str, user: Value) -> Result<(), ClientError> {
        let token = token.to_string();
        self.store
            .update(move |state| {
                state.auth_token = Some(token);
                state.user = Some(user);
            })
            .await?;
        Ok(())
    }

    /// Token and user, if both were persisted
    pub async fn restore(&self) -> Option<(String, Value)> {
        let state = self.store.load().await;
        match (state.auth_token, state.user) {
            (Some(token), Some(user)) if !token.is_empty() => Some((token, user)),
            _ => None,
        }
    }

    pub async fn token(&self) -> Result<String, ClientError> {
        self.restore()
            .await
            .map(|(token, _)| token)
            .ok_or(ClientError::Unauthorized)
    }

    /// `Authorization` header value for admin calls
    pub async fn bearer(&self) -> Result<String, ClientError> {
        Ok(format!("Bearer {}", self.token().await?))
    }

    /// Forget the session and the sticky server
    pub async fn logout(&self) -> Result<(), ClientError> {
        self.store
            .update(|state| {
                state.auth_token = None;
                state.user = None;
            })
            .await?;
        self.context.clear_sticky().await;
        Ok(())
    }
}
