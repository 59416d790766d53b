// Authenticator - bearer token cache with TTL and single-flight login

use crate::application::endpoints::LOGIN_PATH;
use crate::application::executor::RequestExecutor;
use crate::domain::Credentials;
use crate::error::{CodexError, Result};
use crate::port::http_transport::{HttpMethod, HttpRequest, RequestBody};
use crate::port::TimeProvider;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, info};

/// Platform token lifetime observed in production (3 hours)
pub const DEFAULT_TOKEN_TTL: Duration = Duration::from_secs(10_800);

struct CachedToken {
    token: String,
    expires_at_millis: i64,
}

/// Obtains and caches session tokens per credential set
///
/// The cache lock is held across the login call, so concurrent callers
/// with the same credentials wait for one login instead of racing.
pub struct Authenticator {
    executor: Arc<RequestExecutor>,
    time_provider: Arc<dyn TimeProvider>,
    ttl: Duration,
    cache: Mutex<HashMap<Credentials, CachedToken>>,
}

impl Authenticator {
    pub fn new(
        executor: Arc<RequestExecutor>,
        time_provider: Arc<dyn TimeProvider>,
        ttl: Duration,
    ) -> Self {
        Self {
            executor,
            time_provider,
            ttl,
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// `("Authorization", "Bearer <token>")` for these credentials
    pub async fn get_header(&self, credentials: &Credentials) -> Result<(String, String)> {
        let token = self.token(credentials).await?;
        Ok(("Authorization".to_string(), format!("Bearer {token}")))
    }

    /// Cached token, or a fresh login when absent or expired
    ///
    /// # Errors
    /// - Authentication if the platform rejects the credentials (401)
    /// - Server on 5xx
    pub async fn token(&self, credentials: &Credentials) -> Result<String> {
        let mut cache = self.cache.lock().await;
        let now = self.time_provider.now_millis();

        if let Some(cached) = cache.get(credentials) {
            if now < cached.expires_at_millis {
                return Ok(cached.token.clone());
            }
            debug!(login = %credentials.login(), "Session token expired");
        }

        let token = self.login(credentials).await?;
        cache.insert(
            credentials.clone(),
            CachedToken {
                token: token.clone(),
                expires_at_millis: now + self.ttl.as_millis() as i64,
            },
        );
        Ok(token)
    }

    /// Drop the cached token if it is still `rejected`
    ///
    /// A token refreshed by another caller since `rejected` was handed out
    /// stays cached.
    pub async fn invalidate(&self, credentials: &Credentials, rejected: &str) {
        let mut cache = self.cache.lock().await;
        if cache
            .get(credentials)
            .is_some_and(|cached| cached.token == rejected)
        {
            cache.remove(credentials);
            debug!(login = %credentials.login(), "Session token invalidated");
        }
    }

    async fn login(&self, credentials: &Credentials) -> Result<String> {
        let request = HttpRequest::new(HttpMethod::Post, self.executor.url(LOGIN_PATH)).body(
            RequestBody::Form(vec![
                ("user".to_string(), credentials.login().to_string()),
                ("password".to_string(), credentials.password().to_string()),
                ("tenant".to_string(), credentials.tenant().to_string()),
            ]),
        );

        let body = self.executor.send_json(request, 200).await?;
        let token = body
            .get("Token")
            .and_then(|t| t.as_str())
            .filter(|t| !t.is_empty())
            .ok_or_else(|| CodexError::invalid_response("Token", "missing from login response"))?;

        info!(login = %credentials.login(), tenant = %credentials.tenant(), "Logged in");
        Ok(token.to_string())
    }
}
