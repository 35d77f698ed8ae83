// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Simulation(#[from] SimulationError),
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::Config(err.to_string())
    }
}

/// Failure of a single simulated scenario. Nothing here is recovered from
/// inside the engine; every variant reaches the orchestrator caller as-is.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SimulationError {
    #[error("Encoding error: {0}")]
    Encoding(String),

    #[error("Execution reverted: {reason}")]
    ExecutionReverted { reason: String },

    #[error("RPC error: {0}")]
    Rpc(String),

    #[error("Decoding error: {0}")]
    Decoding(String),

    #[error("Validation failed for field {field}: {message}")]
    Validation { field: String, message: String },

    #[error("Arithmetic overflow: {0}")]
    Overflow(String),

    #[error("Malformed RPC error envelope: {0}")]
    Parse(String),
}

impl SimulationError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn reverted(reason: impl Into<String>) -> Self {
        Self::ExecutionReverted {
            reason: reason.into(),
        }
    }

    /// Transport-class failures; the scenario itself may still be valid.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Rpc(_) | Self::Parse(_))
    }

    pub fn revert_reason(&self) -> Option<&str> {
        match self {
            Self::ExecutionReverted { reason } => Some(reason),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_transport_failures_are_retryable() {
        assert!(SimulationError::Rpc("timeout".into()).is_retryable());
        assert!(SimulationError::Parse("not json".into()).is_retryable());
        assert!(!SimulationError::reverted("boom").is_retryable());
        assert!(!SimulationError::validation("tokens", "too short").is_retryable());
        assert!(!SimulationError::Decoding("short".into()).is_retryable());
    }

    #[test]
    fn revert_reason_is_surfaced_verbatim() {
        let err = SimulationError::reverted("UniswapV2Router: EXPIRED");
        assert_eq!(err.revert_reason(), Some("UniswapV2Router: EXPIRED"));
        assert_eq!(err.to_string(), "Execution reverted: UniswapV2Router: EXPIRED");
        assert_eq!(SimulationError::Rpc("x".into()).revert_reason(), None);
    }
}
