// HTTP Transport Port
// One network round-trip per call. No retries, no status interpretation.

use crate::error::{CodexError, Result};
use async_trait::async_trait;
use std::io::Read;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
}

impl std::fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HttpMethod::Get => write!(f, "GET"),
            HttpMethod::Post => write!(f, "POST"),
        }
    }
}

/// A file attached to a multipart request
///
/// The handle is opened when the part is built and closed when the part
/// is dropped, whether or not the upload succeeded.
#[derive(Debug)]
pub struct FilePart {
    pub field: String,
    pub file_name: String,
    file: std::fs::File,
    len: u64,
}

impl FilePart {
    /// Open a regular, non-empty file for upload under `field`
    ///
    /// # Errors
    /// - CodexError::Input if the path is not a regular file or is empty
    /// - CodexError::Io if the file cannot be opened
    pub fn open(field: impl Into<String>, path: &Path) -> Result<Self> {
        let field = field.into();
        let meta = std::fs::metadata(path).map_err(|e| {
            CodexError::Input(format!(
                "Cannot read '{}' for field '{}': {}",
                path.display(),
                field,
                e
            ))
        })?;
        if !meta.is_file() {
            return Err(CodexError::Input(format!(
                "'{}' is not a regular file",
                path.display()
            )));
        }
        if meta.len() == 0 {
            return Err(CodexError::Input(format!(
                "'{}' is empty",
                path.display()
            )));
        }

        let file = std::fs::File::open(path)?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| field.clone());

        Ok(Self {
            field,
            file_name,
            file,
            len: meta.len(),
        })
    }

    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Consume the part, reading the whole file
    pub fn into_bytes(mut self) -> std::io::Result<(String, String, Vec<u8>)> {
        let mut buf = Vec::with_capacity(self.len as usize);
        self.file.read_to_end(&mut buf)?;
        Ok((self.field, self.file_name, buf))
    }
}

/// Text fields plus files of one multipart request
#[derive(Debug, Default)]
pub struct MultipartForm {
    pub fields: Vec<(String, String)>,
    pub files: Vec<FilePart>,
}

impl MultipartForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.push((name.into(), value.into()));
        self
    }

    pub fn set_text(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        self.fields.retain(|(n, _)| *n != name);
        self.fields.push((name, value.into()));
    }

    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn file_fields(&self) -> Vec<&str> {
        self.files.iter().map(|f| f.field.as_str()).collect()
    }
}

#[derive(Debug, Default)]
pub enum RequestBody {
    #[default]
    Empty,
    Form(Vec<(String, String)>),
    Json(serde_json::Value),
    Multipart(MultipartForm),
}

#[derive(Debug)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub query: Vec<(String, String)>,
    pub body: RequestBody,
}

impl HttpRequest {
    pub fn new(method: HttpMethod, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: Vec::new(),
            query: Vec::new(),
            body: RequestBody::Empty,
        }
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn body(mut self, body: RequestBody) -> Self {
        self.body = body;
        self
    }

    pub fn query(mut self, query: Vec<(String, String)>) -> Self {
        self.query = query;
        self
    }
}

#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn json(&self) -> Result<serde_json::Value> {
        if self.body.trim().is_empty() {
            return Ok(serde_json::Value::Null);
        }
        Ok(serde_json::from_str(&self.body)?)
    }
}

/// Transport-level failures (no HTTP status was received)
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("request timed out after {0}")]
    Timeout(String),

    #[error("connection failed: {0}")]
    Connection(String),

    #[error("local IO failure: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

impl From<TransportError> for CodexError {
    fn from(e: TransportError) -> Self {
        match e {
            TransportError::Timeout(msg) => CodexError::Timeout(msg),
            TransportError::Connection(msg) => CodexError::Connection(msg),
            TransportError::Io(e) => CodexError::Io(e),
            TransportError::Other(msg) => CodexError::Connection(msg),
        }
    }
}

/// HTTP transport trait
///
/// Implementations:
/// - ReqwestTransport (infra-http): real network with a fixed timeout
/// - mocks::ScriptedTransport: canned replies for tests
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Perform exactly one request
    ///
    /// # Errors
    /// - TransportError::Timeout if no response arrived in time
    /// - TransportError::Connection if the server could not be reached
    async fn send(&self, request: HttpRequest) -> std::result::Result<HttpResponse, TransportError>;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::time::Duration;

    /// What a scripted route answers with
    #[derive(Debug, Clone)]
    pub enum MockReply {
        Response { status: u16, body: String },
        Timeout,
        ConnectionRefused,
    }

    /// A request as the mock saw it (files already read)
    #[derive(Debug, Clone)]
    pub struct RecordedRequest {
        pub method: HttpMethod,
        pub url: String,
        pub headers: Vec<(String, String)>,
        pub query: Vec<(String, String)>,
        pub form: Vec<(String, String)>,
        pub json: Option<serde_json::Value>,
        /// (field, file name, content)
        pub files: Vec<(String, String, Vec<u8>)>,
    }

    impl RecordedRequest {
        pub fn header(&self, name: &str) -> Option<&str> {
            self.headers
                .iter()
                .find(|(n, _)| n.eq_ignore_ascii_case(name))
                .map(|(_, v)| v.as_str())
        }

        pub fn form_field(&self, name: &str) -> Option<&str> {
            self.form
                .iter()
                .find(|(n, _)| n == name)
                .map(|(_, v)| v.as_str())
        }

        pub fn file_fields(&self) -> Vec<&str> {
            self.files.iter().map(|(f, _, _)| f.as_str()).collect()
        }
    }

    struct Route {
        method: HttpMethod,
        path: String,
        replies: VecDeque<MockReply>,
    }

    /// Transport answering from a script of (method, path) routes
    ///
    /// Each route pops its replies in order; the last one repeats.
    /// Unknown routes answer 404.
    pub struct ScriptedTransport {
        routes: Mutex<Vec<Route>>,
        requests: Mutex<Vec<RecordedRequest>>,
        latency: Duration,
    }

    impl Default for ScriptedTransport {
        fn default() -> Self {
            Self::new()
        }
    }

    impl ScriptedTransport {
        pub fn new() -> Self {
            Self {
                routes: Mutex::new(Vec::new()),
                requests: Mutex::new(Vec::new()),
                latency: Duration::ZERO,
            }
        }

        /// Delay every reply (to overlap concurrent callers)
        pub fn with_latency(mut self, latency: Duration) -> Self {
            self.latency = latency;
            self
        }

        /// Queue a JSON reply for `method path`
        pub fn on(&self, method: HttpMethod, path: &str, status: u16, body: serde_json::Value) {
            self.push(
                method,
                path,
                MockReply::Response {
                    status,
                    body: body.to_string(),
                },
            );
        }

        /// Queue a raw reply for `method path`
        pub fn on_raw(&self, method: HttpMethod, path: &str, status: u16, body: &str) {
            self.push(
                method,
                path,
                MockReply::Response {
                    status,
                    body: body.to_string(),
                },
            );
        }

        pub fn on_reply(&self, method: HttpMethod, path: &str, reply: MockReply) {
            self.push(method, path, reply);
        }

        fn push(&self, method: HttpMethod, path: &str, reply: MockReply) {
            let mut routes = self.routes.lock().unwrap();
            if let Some(route) = routes
                .iter_mut()
                .find(|r| r.method == method && r.path == path)
            {
                route.replies.push_back(reply);
                return;
            }
            routes.push(Route {
                method,
                path: path.to_string(),
                replies: VecDeque::from([reply]),
            });
        }

        pub fn requests(&self) -> Vec<RecordedRequest> {
            self.requests.lock().unwrap().clone()
        }

        pub fn total_requests(&self) -> usize {
            self.requests.lock().unwrap().len()
        }

        /// Number of requests whose URL ends with `path`
        pub fn count(&self, method: HttpMethod, path: &str) -> usize {
            self.requests
                .lock()
                .unwrap()
                .iter()
                .filter(|r| r.method == method && r.url.ends_with(path))
                .count()
        }

        /// Requests whose URL ends with `path`, in order
        pub fn requests_to(&self, path: &str) -> Vec<RecordedRequest> {
            self.requests
                .lock()
                .unwrap()
                .iter()
                .filter(|r| r.url.ends_with(path))
                .cloned()
                .collect()
        }

        fn next_reply(&self, method: HttpMethod, url: &str) -> MockReply {
            let mut routes = self.routes.lock().unwrap();
            let route = routes
                .iter_mut()
                .filter(|r| r.method == method && url.ends_with(&r.path))
                .max_by_key(|r| r.path.len());

            match route {
                Some(route) if route.replies.len() > 1 => route.replies.pop_front().unwrap(),
                Some(route) => route.replies.front().cloned().unwrap(),
                None => MockReply::Response {
                    status: 404,
                    body: format!("{{\"Message\":\"no scripted route for {} {}\"}}", method, url),
                },
            }
        }

        fn record(request: HttpRequest) -> std::io::Result<RecordedRequest> {
            let mut form = Vec::new();
            let mut json = None;
            let mut files = Vec::new();
            match request.body {
                RequestBody::Empty => {}
                RequestBody::Form(fields) => form = fields,
                RequestBody::Json(value) => json = Some(value),
                RequestBody::Multipart(multipart) => {
                    form = multipart.fields;
                    for part in multipart.files {
                        files.push(part.into_bytes()?);
                    }
                }
            }
            Ok(RecordedRequest {
                method: request.method,
                url: request.url,
                headers: request.headers,
                query: request.query,
                form,
                json,
                files,
            })
        }
    }

    #[async_trait]
    impl HttpTransport for ScriptedTransport {
        async fn send(
            &self,
            request: HttpRequest,
        ) -> std::result::Result<HttpResponse, TransportError> {
            let method = request.method;
            let url = request.url.clone();
            let recorded = Self::record(request)?;
            self.requests.lock().unwrap().push(recorded);

            if !self.latency.is_zero() {
                tokio::time::sleep(self.latency).await;
            }

            match self.next_reply(method, &url) {
                MockReply::Response { status, body } => Ok(HttpResponse::new(status, body)),
                MockReply::Timeout => Err(TransportError::Timeout("60s".to_string())),
                MockReply::ConnectionRefused => {
                    Err(TransportError::Connection("connection refused".to_string()))
                }
            }
        }
    }
}
