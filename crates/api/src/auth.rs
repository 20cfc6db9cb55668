//! Caller authentication and role checks.
//!
//! Identity verification is separate from the store: an [`IdentityProvider`]
//! only resolves bearer tokens and never touches inventory or orders.

use std::collections::HashMap;

use async_trait::async_trait;
use axum::http::HeaderMap;
use axum::http::header::AUTHORIZATION;
use common::{CallerIdentity, Role};

use crate::config::TokenGrant;
use crate::error::ApiError;

/// Resolves a bearer token to the caller it belongs to.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn verify(&self, token: &str) -> Option<CallerIdentity>;
}

/// Identity provider backed by a fixed token table.
#[derive(Debug, Clone, Default)]
pub struct StaticIdentityProvider {
    tokens: HashMap<String, CallerIdentity>,
}

impl StaticIdentityProvider {
    pub fn new(grants: impl IntoIterator<Item = TokenGrant>) -> Self {
        Self {
            tokens: grants
                .into_iter()
                .map(|g| (g.token, g.identity))
                .collect(),
        }
    }

    pub fn with_token(mut self, token: impl Into<String>, identity: CallerIdentity) -> Self {
        self.tokens.insert(token.into(), identity);
        self
    }
}

#[async_trait]
impl IdentityProvider for StaticIdentityProvider {
    async fn verify(&self, token: &str) -> Option<CallerIdentity> {
        self.tokens.get(token).copied()
    }
}

fn bearer_token(headers: &HeaderMap) -> Result<&str, ApiError> {
    let value = headers
        .get(AUTHORIZATION)
        .ok_or(ApiError::MissingAuthorization)?
        .to_str()
        .map_err(|_| ApiError::Unauthorized)?;

    value
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or(ApiError::Unauthorized)
}

/// Resolves the caller from the `Authorization: Bearer` header.
pub async fn authenticate(
    provider: &dyn IdentityProvider,
    headers: &HeaderMap,
) -> Result<CallerIdentity, ApiError> {
    let token = bearer_token(headers)?;
    provider.verify(token).await.ok_or_else(|| {
        tracing::debug!("rejected unknown bearer token");
        ApiError::Unauthorized
    })
}

/// Fails with `Forbidden` unless the caller is an owner or staff member.
pub fn require_back_office(caller: &CallerIdentity) -> Result<(), ApiError> {
    if caller.role.is_back_office() {
        Ok(())
    } else {
        tracing::debug!(user_id = %caller.user_id, role = %caller.role, "back-office access denied");
        Err(ApiError::Forbidden)
    }
}

/// Fails with `Forbidden` for callers whose role could not be resolved.
pub fn require_known_role(caller: &CallerIdentity) -> Result<(), ApiError> {
    if caller.role == Role::Unknown {
        Err(ApiError::Forbidden)
    } else {
        Ok(())
    }
}
