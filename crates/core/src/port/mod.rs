// Port Layer - Interfaces for external dependencies

pub mod http_transport;
pub mod time_provider; // For deterministic testing

// Re-exports
pub use http_transport::{
    FilePart, HttpMethod, HttpRequest, HttpResponse, HttpTransport, MultipartForm, RequestBody,
    TransportError,
};
pub use time_provider::{SystemTimeProvider, TimeProvider};
