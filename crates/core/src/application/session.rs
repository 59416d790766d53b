// Session - injects auth and tracing headers into enumerated operations

use crate::application::auth::Authenticator;
use crate::application::endpoints::ApiOperation;
use crate::application::executor::RequestExecutor;
use crate::domain::Credentials;
use crate::error::{CodexError, Result};
use crate::port::http_transport::{HttpRequest, HttpResponse, RequestBody};
use std::sync::Arc;
use tracing::warn;

pub const ORIGIN_HEADER: &str = "Neomaril-Origin";
pub const METHOD_HEADER: &str = "Neomaril-Method";
pub const ORIGIN: &str = "Codex";

/// Authenticated access to the platform for one credential set
pub struct Session {
    executor: Arc<RequestExecutor>,
    authenticator: Arc<Authenticator>,
    credentials: Credentials,
}

impl Session {
    pub fn new(
        executor: Arc<RequestExecutor>,
        authenticator: Arc<Authenticator>,
        credentials: Credentials,
    ) -> Self {
        Self {
            executor,
            authenticator,
            credentials,
        }
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    pub fn base_url(&self) -> &str {
        self.executor.base_url()
    }

    /// Log in (or reuse the cached token) without calling any operation
    pub async fn authenticate(&self) -> Result<()> {
        self.authenticator.token(&self.credentials).await?;
        Ok(())
    }

    /// Call `operation` with no body and no query
    pub async fn call(&self, operation: ApiOperation<'_>) -> Result<HttpResponse> {
        self.call_with(operation, RequestBody::Empty, Vec::new()).await
    }

    pub async fn call_json(&self, operation: ApiOperation<'_>) -> Result<serde_json::Value> {
        self.call(operation).await?.json()
    }

    /// Call `operation` with a body and query parameters
    ///
    /// A 401 on a session-authenticated call drops the token it was sent
    /// with, so the next call logs in again. The error is still returned.
    pub async fn call_with(
        &self,
        operation: ApiOperation<'_>,
        body: RequestBody,
        query: Vec<(String, String)>,
    ) -> Result<HttpResponse> {
        let (bearer, session_token) = match operation.group_token() {
            Some(token) => (token.to_string(), None),
            None => {
                let token = self.authenticator.token(&self.credentials).await?;
                (token.clone(), Some(token))
            }
        };

        let request = HttpRequest::new(operation.method(), self.executor.url(&operation.path()))
            .header("Authorization", format!("Bearer {bearer}"))
            .header(ORIGIN_HEADER, ORIGIN)
            .header(METHOD_HEADER, operation.name())
            .query(query)
            .body(body);

        let result = self
            .executor
            .send(request, operation.expected_status())
            .await;

        if let (Err(CodexError::Authentication(_)), Some(token)) = (&result, &session_token) {
            warn!(operation = operation.name(), "Session token rejected");
            self.authenticator.invalidate(&self.credentials, token).await;
        }
        result
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::application::auth::DEFAULT_TOKEN_TTL;
    use crate::port::http_transport::mocks::ScriptedTransport;
    use crate::port::http_transport::HttpMethod;
    use crate::port::time_provider::mocks::ManualTimeProvider;

    pub const BASE_URL: &str = "http://mlops.test/api";

    /// Session over a scripted transport that already answers `/login`
    pub fn session(transport: Arc<ScriptedTransport>) -> Arc<Session> {
        transport.on(
            HttpMethod::Post,
            "/login",
            200,
            serde_json::json!({"Token": "session-token"}),
        );
        let executor = Arc::new(RequestExecutor::new(transport, BASE_URL));
        let authenticator = Arc::new(Authenticator::new(
            executor.clone(),
            Arc::new(ManualTimeProvider::new(0)),
            DEFAULT_TOKEN_TTL,
        ));
        Arc::new(Session::new(
            executor,
            authenticator,
            Credentials::new("ds@acme.io", "pw", "acme"),
        ))
    }
}
