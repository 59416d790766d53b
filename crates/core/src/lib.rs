// MLOps Codex Core - Domain Logic, Ports & Remote Execution Lifecycle
// NO network code: every HTTP call goes through port::HttpTransport

pub mod application;
pub mod domain;
pub mod error;
pub mod port;

pub use error::{CodexError, Result};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
