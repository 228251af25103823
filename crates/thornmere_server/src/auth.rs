//! The authentication collaborator (spec §6), grounded on `valence`'s
//! `AsyncCallbacks` trait in `crates/valence/src/config.rs`: host code
//! implements this against whatever identity provider it runs, and the
//! server calls it at session start without knowing the details.

use async_trait::async_trait;
use thiserror::Error;

use crate::ids::AccountId;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("credentials were rejected")]
    InvalidCredentials,
    #[error("account is banned")]
    Banned,
    #[error("auth provider is unreachable")]
    Unreachable,
}

#[derive(Debug, Clone)]
pub struct Authenticated {
    pub account_id: AccountId,
    pub username: String,
}

/// Verifies client-presented credentials and issues the account identity a
/// session is bound to. Implementations typically call out to a web
/// identity service or a local password/token store; the trait is async so
/// that call never blocks the simulation thread.
#[async_trait]
pub trait AuthProvider: Send + Sync {
    async fn authenticate(&self, username: &str, credential: &str) -> Result<Authenticated, AuthError>;

    /// Unauthenticated status hook for server-list-style pings, grounded on
    /// `AsyncCallbacks::server_list_ping`. Returns a human-readable status
    /// line; implementations that don't support this can return a static
    /// string.
    async fn status(&self) -> String {
        "online".to_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct AlwaysReject;

    #[async_trait]
    impl AuthProvider for AlwaysReject {
        async fn authenticate(&self, _username: &str, _credential: &str) -> Result<Authenticated, AuthError> {
            Err(AuthError::InvalidCredentials)
        }
    }

    #[tokio::test]
    async fn default_status_is_online() {
        let provider = AlwaysReject;
        assert_eq!(provider.status().await, "online");
    }

    #[tokio::test]
    async fn rejecting_provider_returns_invalid_credentials() {
        let provider = AlwaysReject;
        let err = provider.authenticate("user", "pw").await.unwrap_err();
        assert_eq!(err, AuthError::InvalidCredentials);
    }
}
