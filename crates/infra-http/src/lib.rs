// MLOps Codex Infrastructure - HTTP Adapter
// Implements: HttpTransport (the only crate that opens sockets)

pub mod reqwest_transport;

pub use reqwest_transport::{ReqwestTransport, DEFAULT_REQUEST_TIMEOUT};
