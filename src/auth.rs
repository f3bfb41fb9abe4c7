use async_trait::async_trait;
use serde::Deserialize;
use tracing::warn;
use uuid::Uuid;

use crate::error::NovaError;

/// Resolves an opaque bearer credential to the uploader's user id.
#[async_trait]
pub trait IdentityResolver: Send + Sync {
    async fn resolve(&self, bearer_token: &str) -> Result<Uuid, NovaError>;
}

/// Resolver backed by the auth service's user endpoint: the caller's
/// bearer token is forwarded as-is and the service answers with the
/// authenticated user record.
pub struct AuthServiceResolver {
    client: reqwest::Client,
    auth_url: String,
    anon_key: String,
}

#[derive(Debug, Deserialize)]
struct AuthUser {
    id: Uuid,
}

impl AuthServiceResolver {
    pub fn new(auth_url: String, anon_key: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            auth_url,
            anon_key,
        }
    }
}

#[async_trait]
impl IdentityResolver for AuthServiceResolver {
    async fn resolve(&self, bearer_token: &str) -> Result<Uuid, NovaError> {
        let response = self
            .client
            .get(format!("{}/auth/v1/user", self.auth_url))
            .bearer_auth(bearer_token)
            .header("apikey", &self.anon_key)
            .send()
            .await?;

        if !response.status().is_success() {
            warn!("Auth service rejected credential: {}", response.status());
            return Err(NovaError::Unauthorized);
        }

        let user: AuthUser = response.json().await.map_err(|_| NovaError::Unauthorized)?;
        Ok(user.id)
    }
}

/// Resolver with one fixed credential, for development and tests.
pub struct StaticResolver {
    token: String,
    user_id: Uuid,
}

impl StaticResolver {
    pub fn new(token: impl Into<String>, user_id: Uuid) -> Self {
        Self {
            token: token.into(),
            user_id,
        }
    }
}

#[async_trait]
impl IdentityResolver for StaticResolver {
    async fn resolve(&self, bearer_token: &str) -> Result<Uuid, NovaError> {
        if bearer_token == self.token {
            Ok(self.user_id)
        } else {
            Err(NovaError::Unauthorized)
        }
    }
}
