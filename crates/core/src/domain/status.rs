// Execution & Model Status Enums

use serde::{Deserialize, Serialize};

/// A status reported by a polled endpoint
///
/// The poller only needs to know which values end the wait.
pub trait TerminalStatus: Clone + PartialEq + std::fmt::Display + Send + Sync {
    fn is_terminal(&self) -> bool;

    /// Terminal and successful
    fn is_success(&self) -> bool;
}

/// Status of a training or async preprocessing execution
///
/// Uploaded -> Requested -> Running -> Succeeded | Failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExecutionStatus {
    Uploaded,
    Requested,
    Running,
    Succeeded,
    Failed,
}

impl ExecutionStatus {
    pub const TERMINAL: &'static [ExecutionStatus] =
        &[ExecutionStatus::Succeeded, ExecutionStatus::Failed];

    fn rank(self) -> u8 {
        match self {
            ExecutionStatus::Uploaded => 0,
            ExecutionStatus::Requested => 1,
            ExecutionStatus::Running => 2,
            ExecutionStatus::Succeeded | ExecutionStatus::Failed => 3,
        }
    }

    /// Forward-only. Intermediate states may be skipped because polling
    /// can miss them; a terminal state never changes.
    pub fn can_transition_to(self, next: ExecutionStatus) -> bool {
        if self == next {
            return true;
        }
        !self.is_terminal() && next.rank() >= self.rank()
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Uploaded" => Some(ExecutionStatus::Uploaded),
            "Requested" => Some(ExecutionStatus::Requested),
            "Running" => Some(ExecutionStatus::Running),
            "Succeeded" => Some(ExecutionStatus::Succeeded),
            "Failed" => Some(ExecutionStatus::Failed),
            _ => None,
        }
    }
}

impl TerminalStatus for ExecutionStatus {
    fn is_terminal(&self) -> bool {
        matches!(self, ExecutionStatus::Succeeded | ExecutionStatus::Failed)
    }

    fn is_success(&self) -> bool {
        *self == ExecutionStatus::Succeeded
    }
}

impl std::fmt::Display for ExecutionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExecutionStatus::Uploaded => write!(f, "Uploaded"),
            ExecutionStatus::Requested => write!(f, "Requested"),
            ExecutionStatus::Running => write!(f, "Running"),
            ExecutionStatus::Succeeded => write!(f, "Succeeded"),
            ExecutionStatus::Failed => write!(f, "Failed"),
        }
    }
}

/// Host status of a deployed model or preprocessing script
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModelState {
    Ready,
    Building,
    Recovering,
    FailedRecovery,
    Failed,
    Deployed,
    Disabled,
    DisabledRecovery,
    DisabledFailed,
    Deleted,
}

impl ModelState {
    pub const TERMINAL: &'static [ModelState] = &[
        ModelState::Ready,
        ModelState::Deployed,
        ModelState::Failed,
        ModelState::FailedRecovery,
        ModelState::Disabled,
        ModelState::DisabledFailed,
        ModelState::Deleted,
    ];

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Ready" => Some(ModelState::Ready),
            "Building" => Some(ModelState::Building),
            "Recovering" => Some(ModelState::Recovering),
            "FailedRecovery" => Some(ModelState::FailedRecovery),
            "Failed" => Some(ModelState::Failed),
            "Deployed" => Some(ModelState::Deployed),
            "Disabled" => Some(ModelState::Disabled),
            "DisabledRecovery" => Some(ModelState::DisabledRecovery),
            "DisabledFailed" => Some(ModelState::DisabledFailed),
            "Deleted" => Some(ModelState::Deleted),
            _ => None,
        }
    }
}

impl TerminalStatus for ModelState {
    fn is_terminal(&self) -> bool {
        !matches!(
            self,
            ModelState::Building | ModelState::Recovering | ModelState::DisabledRecovery
        )
    }

    fn is_success(&self) -> bool {
        matches!(self, ModelState::Ready | ModelState::Deployed)
    }
}

impl std::fmt::Display for ModelState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ModelState::Ready => "Ready",
            ModelState::Building => "Building",
            ModelState::Recovering => "Recovering",
            ModelState::FailedRecovery => "FailedRecovery",
            ModelState::Failed => "Failed",
            ModelState::Deployed => "Deployed",
            ModelState::Disabled => "Disabled",
            ModelState::DisabledRecovery => "DisabledRecovery",
            ModelState::DisabledFailed => "DisabledFailed",
            ModelState::Deleted => "Deleted",
        };
        write!(f, "{}", s)
    }
}
