use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Core domain errors
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Unknown chain: '{chain}'")]
    UnknownChain { chain: String },

    #[error("Unknown backend: '{backend}'")]
    UnknownBackend { backend: String },

    #[error("Unauthorized by {backend}: {message}")]
    Unauthorized { backend: String, message: String },

    #[error("Rate limited by {backend}: {message}")]
    RateLimited { backend: String, message: String },

    #[error("Backend {backend} unavailable: {message}")]
    Unavailable { backend: String, message: String },

    #[error("Invalid response from {backend}: {message}")]
    InvalidResponse { backend: String, message: String },

    #[error("Call to {backend} timed out after {timeout_ms}ms")]
    Timeout { backend: String, timeout_ms: u64 },

    #[error("Batch deadline elapsed before item started")]
    BatchTimeout,

    #[error("Dispatch cancelled")]
    Cancelled,

    #[error("All steps of chain '{chain}' exhausted without success")]
    ChainExhausted { chain: String },

    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl DomainError {
    pub fn unknown_chain(chain: impl Into<String>) -> Self {
        Self::UnknownChain {
            chain: chain.into(),
        }
    }

    pub fn unknown_backend(backend: impl Into<String>) -> Self {
        Self::UnknownBackend {
            backend: backend.into(),
        }
    }

    pub fn unauthorized(backend: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Unauthorized {
            backend: backend.into(),
            message: message.into(),
        }
    }

    pub fn rate_limited(backend: impl Into<String>, message: impl Into<String>) -> Self {
        Self::RateLimited {
            backend: backend.into(),
            message: message.into(),
        }
    }

    pub fn unavailable(backend: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Unavailable {
            backend: backend.into(),
            message: message.into(),
        }
    }

    pub fn invalid_response(backend: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidResponse {
            backend: backend.into(),
            message: message.into(),
        }
    }

    pub fn timeout(backend: impl Into<String>, timeout_ms: u64) -> Self {
        Self::Timeout {
            backend: backend.into(),
            timeout_ms,
        }
    }

    pub fn chain_exhausted(chain: impl Into<String>) -> Self {
        Self::ChainExhausted {
            chain: chain.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Classification of this error for retry decisions and reporting.
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::UnknownChain { .. } => FailureKind::UnknownChain,
            Self::UnknownBackend { .. } => FailureKind::UnknownBackend,
            Self::Unauthorized { .. } => FailureKind::Unauthorized,
            Self::RateLimited { .. } => FailureKind::RateLimited,
            Self::Unavailable { .. } => FailureKind::Unavailable,
            Self::InvalidResponse { .. } => FailureKind::InvalidResponse,
            Self::Timeout { .. } => FailureKind::Timeout,
            Self::BatchTimeout => FailureKind::BatchTimeout,
            Self::Cancelled => FailureKind::Cancelled,
            Self::ChainExhausted { .. } => FailureKind::ChainExhausted,
            Self::Validation { .. } => FailureKind::Validation,
            Self::Configuration { .. } => FailureKind::Configuration,
            Self::Internal { .. } => FailureKind::Internal,
        }
    }

    /// Whether the same chain step may be retried after this error.
    pub fn is_retryable(&self) -> bool {
        self.kind().is_retryable()
    }
}

/// Serializable failure classification, surfaced per attempted step and per
/// failed batch item so callers can tell "provider down" from "bad
/// credentials" from "malformed request" without re-running anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    UnknownChain,
    UnknownBackend,
    Unauthorized,
    RateLimited,
    Unavailable,
    InvalidResponse,
    Timeout,
    BatchTimeout,
    Cancelled,
    ChainExhausted,
    Validation,
    Configuration,
    Internal,
}

impl FailureKind {
    /// Transient failures are retried on the same step; everything else is
    /// structurally certain to repeat and advances the chain immediately.
    pub fn is_retryable(self) -> bool {
        matches!(self, Self::RateLimited | Self::Unavailable | Self::Timeout)
    }
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::UnknownChain => "unknown_chain",
            Self::UnknownBackend => "unknown_backend",
            Self::Unauthorized => "unauthorized",
            Self::RateLimited => "rate_limited",
            Self::Unavailable => "unavailable",
            Self::InvalidResponse => "invalid_response",
            Self::Timeout => "timeout",
            Self::BatchTimeout => "batch_timeout",
            Self::Cancelled => "cancelled",
            Self::ChainExhausted => "chain_exhausted",
            Self::Validation => "validation",
            Self::Configuration => "configuration",
            Self::Internal => "internal",
        };
        write!(f, "{}", name)
    }
}
