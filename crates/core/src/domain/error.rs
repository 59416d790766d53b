// Status machine errors

use thiserror::Error;

/// A platform status that would move a local record backwards
#[derive(Error, Debug, PartialEq, Eq)]
pub enum DomainError {
    #[error("Invalid execution status transition: {from} -> {to}")]
    InvalidStateTransition { from: String, to: String },
}
