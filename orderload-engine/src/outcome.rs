//! Outcome of a single dispatched request

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Why a request counts as an error
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
    /// Connection failure, timeout, or any other failure before a status arrived
    #[error("transport error: {0}")]
    Transport(String),

    /// A status no classification rule accepts
    #[error("unexpected status {status}: {body}")]
    Protocol { status: u16, body: String },

    /// The request was never sent
    #[error("unsupported request method {0}")]
    Validation(String),
}

/// Classified result of one dispatch
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkloadOutcome {
    Success { message: String },
    /// Anticipated business rejection, counted as success
    SoftFailure { reason: String },
    HardFailure(DispatchError),
}

impl WorkloadOutcome {
    /// Successes and soft failures both count toward the success rate
    pub fn counts_as_success(&self) -> bool {
        !matches!(self, WorkloadOutcome::HardFailure(_))
    }

    pub fn kind(&self) -> OutcomeKind {
        match self {
            WorkloadOutcome::Success { .. } => OutcomeKind::Success,
            WorkloadOutcome::SoftFailure { .. } => OutcomeKind::SoftFailure,
            WorkloadOutcome::HardFailure(DispatchError::Transport(_)) => OutcomeKind::TransportError,
            WorkloadOutcome::HardFailure(DispatchError::Protocol { .. }) => OutcomeKind::ProtocolError,
            WorkloadOutcome::HardFailure(DispatchError::Validation(_)) => OutcomeKind::ValidationError,
        }
    }

    pub fn message(&self) -> String {
        match self {
            WorkloadOutcome::Success { message } => message.clone(),
            WorkloadOutcome::SoftFailure { reason } => reason.clone(),
            WorkloadOutcome::HardFailure(error) => error.to_string(),
        }
    }
}

impl fmt::Display for WorkloadOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind(), self.message())
    }
}

/// Flat outcome tag stored in the results snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeKind {
    Success,
    SoftFailure,
    TransportError,
    ProtocolError,
    ValidationError,
}

impl fmt::Display for OutcomeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            OutcomeKind::Success => "success",
            OutcomeKind::SoftFailure => "soft failure",
            OutcomeKind::TransportError => "transport error",
            OutcomeKind::ProtocolError => "protocol error",
            OutcomeKind::ValidationError => "validation error",
        };
        f.write_str(s)
    }
}
