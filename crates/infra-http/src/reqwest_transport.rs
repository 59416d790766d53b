// Reqwest-based HttpTransport

use async_trait::async_trait;
use mlops_codex_core::port::http_transport::{
    HttpMethod, HttpRequest, HttpResponse, HttpTransport, MultipartForm, RequestBody,
    TransportError,
};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Method};
use std::time::Duration;
use tracing::debug;

/// Hard per-request cutoff (60s)
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Real network transport
///
/// One `send` is one request. No retries and no status interpretation.
pub struct ReqwestTransport {
    client: Client,
    timeout: Duration,
}

impl ReqwestTransport {
    /// Build a transport with a fixed timeout for every request
    ///
    /// # Errors
    /// - TransportError::Other if the TLS backend cannot be initialised
    pub fn new(timeout: Duration) -> Result<Self, TransportError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(format!("mlops-codex/{}", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| TransportError::Other(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self { client, timeout })
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn map_error(&self, e: reqwest::Error) -> TransportError {
        if e.is_timeout() {
            TransportError::Timeout(format!("{:?}", self.timeout))
        } else if e.is_connect() {
            TransportError::Connection(e.to_string())
        } else {
            TransportError::Other(e.to_string())
        }
    }
}

fn method(method: HttpMethod) -> Method {
    match method {
        HttpMethod::Get => Method::GET,
        HttpMethod::Post => Method::POST,
    }
}

/// Read every file part; the file handles close as each part is consumed
fn multipart(form: MultipartForm) -> Result<Form, TransportError> {
    let mut multipart = Form::new();
    for (name, value) in form.fields {
        multipart = multipart.text(name, value);
    }
    for part in form.files {
        let (field, file_name, bytes) = part.into_bytes()?;
        multipart = multipart.part(field, Part::bytes(bytes).file_name(file_name));
    }
    Ok(multipart)
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let mut builder = self.client.request(method(request.method), &request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        builder = match request.body {
            RequestBody::Empty => builder,
            RequestBody::Form(fields) => builder.form(&fields),
            RequestBody::Json(value) => builder.json(&value),
            RequestBody::Multipart(form) => builder.multipart(multipart(form)?),
        };

        let response = builder.send().await.map_err(|e| self.map_error(e))?;
        let status = response.status().as_u16();
        let body = response.text().await.map_err(|e| self.map_error(e))?;
        debug!(status, bytes = body.len(), "HTTP response received");

        Ok(HttpResponse { status, body })
    }
}
