//! MLOps Codex SDK - Rust Client Library
//!
//! Client for the MLOps Codex (Neomaril) platform: groups, training
//! experiments, model promotion and hosting, preprocessing scripts.
//!
//! # Example
//!
//! ```no_run
//! use mlops_codex_sdk::{
//!     CustomTraining, MlopsCodexClient, RegistrationMode, TrainingRun,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Reads MLOPS_CODEX_LOGIN / PASSWORD / TENANT and optional config files
//!     let client = MlopsCodexClient::from_env()?;
//!     let training = client.training();
//!
//!     let experiment = training
//!         .setup_experiment("churn", "Classification", "teama", RegistrationMode::ReuseExisting)
//!         .await?;
//!
//!     let run = TrainingRun::Custom(CustomTraining {
//!         run_name: "first".into(),
//!         training_reference: "train_model".into(),
//!         python_version: "3.9".into(),
//!         input_data: "train.csv".into(),
//!         source: "app.py".into(),
//!         requirements: "requirements.txt".into(),
//!         ..Default::default()
//!     });
//!
//!     let execution = training
//!         .run(&experiment, &run, Some(&client.poll_options()))
//!         .await?;
//!     println!("Execution {} is {}", execution.execution_id, execution.status);
//!
//!     Ok(())
//! }
//! ```

mod client;
pub mod config;
mod error;

pub use client::MlopsCodexClient;
pub use crate::config::ClientConfig;
pub use error::{Result, SdkError};

// Client-facing types from the core crate
pub use mlops_codex_core::application::{
    cancel_channel, AdminClient, AsyncRun, CancelHandle, CancelToken, ModelClient, PollOptions,
    PreprocessingClient, RegistrationMode, StatusPayload, TrainingClient,
};
pub use mlops_codex_core::domain::{
    AutoMlTraining, Credentials, CustomTraining, ExecutionStatus, Experiment, ExperimentQuery,
    ExternalTraining, FileOrHash, ModelHandle, ModelState, ModelType, OperationKind,
    PreprocessingHandle, PreprocessingScript, PromoteRequest, PythonVersion, TerminalStatus,
    TrainingExecution, TrainingRun,
};
pub use mlops_codex_core::CodexError;
