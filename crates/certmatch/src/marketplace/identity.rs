use std::sync::Arc;

use axum::http::header::AUTHORIZATION;
use axum::http::HeaderMap;

use super::domain::{UserId, UserRole};
use super::repository::{RepositoryError, UserRepository};

/// Credentials presented on an inbound request. The only transport we accept
/// is a bearer token; how a session became a token is the auth provider's
/// business.
#[derive(Debug, Clone, Default)]
pub struct RequestCredentials {
    pub bearer: Option<String>,
}

impl RequestCredentials {
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let bearer = headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(|token| token.trim().to_string())
            .filter(|token| !token.is_empty());

        Self { bearer }
    }
}

/// Resolved caller: who they are and which role gates what they may do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub id: UserId,
    pub role: UserRole,
}

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("authentication required")]
    Unauthenticated,
    #[error("identity provider unavailable: {0}")]
    Directory(String),
}

/// Validates request credentials against the managed auth subsystem and
/// returns the account id they belong to.
pub trait IdentityProvider: Send + Sync {
    fn authenticate(&self, credentials: &RequestCredentials) -> Result<UserId, AuthError>;
}

/// Provisioned credential handed back by the auth directory at signup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvisionedCredential {
    pub user_id: UserId,
    pub credential_hash: String,
}

/// Account provisioning side of the managed auth subsystem. Separate from the
/// record store, which is why signup needs compensating deletes instead of a
/// transaction.
pub trait AuthDirectory: Send + Sync {
    fn provision(&self, email: &str, password: &str) -> Result<ProvisionedCredential, AuthError>;
    fn remove(&self, user_id: &UserId) -> Result<(), AuthError>;
}

/// Composes the identity provider with the account store so every request
/// resolves to an [`Identity`] exactly once.
pub struct IdentityResolver {
    provider: Arc<dyn IdentityProvider>,
    users: Arc<dyn UserRepository>,
}

impl IdentityResolver {
    pub fn new(provider: Arc<dyn IdentityProvider>, users: Arc<dyn UserRepository>) -> Self {
        Self { provider, users }
    }

    /// Resolves the caller, or fails with [`AuthError::Unauthenticated`].
    ///
    /// A valid session pointing at an account that no longer exists is
    /// treated as unauthenticated rather than as a server fault.
    pub fn resolve(&self, credentials: &RequestCredentials) -> Result<Identity, AuthError> {
        let user_id = self.provider.authenticate(credentials)?;

        let account = self.users.fetch(&user_id).map_err(|err| match err {
            RepositoryError::Unavailable(detail) => AuthError::Directory(detail),
            _ => AuthError::Unauthenticated,
        })?;

        match account {
            Some(account) => Ok(Identity {
                id: account.id,
                role: account.role,
            }),
            None => Err(AuthError::Unauthenticated),
        }
    }
}
