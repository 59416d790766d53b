// Application Layer - Remote execution lifecycle

pub mod admin;
pub mod auth;
pub mod endpoints;
pub mod executor;
pub mod model;
pub mod poller;
pub mod preprocessing;
pub mod registrar;
pub mod session;
pub mod training;
pub mod uploader;

// Re-exports
pub use admin::AdminClient;
pub use auth::{Authenticator, DEFAULT_TOKEN_TTL};
pub use endpoints::ApiOperation;
pub use executor::{map_status, RequestExecutor};
pub use model::ModelClient;
pub use poller::{cancel_channel, CancelHandle, CancelToken, PollOptions, StatusPayload};
pub use preprocessing::{AsyncRun, PreprocessingClient};
pub use registrar::Registrar;
pub use session::Session;
pub use training::{RegistrationMode, TrainingClient};
pub use uploader::resolve_file_or_dataset;
