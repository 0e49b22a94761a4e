//! Provider adapters and their shared HTTP plumbing

pub mod anthropic;
pub mod factory;
pub mod gemini;
pub mod http_client;

pub use anthropic::AnthropicAdapter;
pub use factory::{build_adapters, default_probes};
pub use gemini::GeminiAdapter;
pub use http_client::{HttpClient, HttpClientTrait, HttpError};

use crate::domain::DomainError;

/// Map a transport failure onto the domain taxonomy. Status code semantics
/// are shared across providers: auth failures and client mistakes are final,
/// throttling and server trouble are worth retrying.
pub(crate) fn classify_http_error(backend: &str, timeout_ms: u64, error: HttpError) -> DomainError {
    match error {
        HttpError::Timeout => DomainError::timeout(backend, timeout_ms),
        HttpError::Status { status, body } => match status {
            401 | 403 => DomainError::unauthorized(backend, body),
            429 => DomainError::rate_limited(backend, body),
            408 | 500..=599 => {
                DomainError::unavailable(backend, format!("HTTP {}: {}", status, body))
            }
            _ => DomainError::invalid_response(backend, format!("HTTP {}: {}", status, body)),
        },
        HttpError::Transport(message) => DomainError::unavailable(backend, message),
        HttpError::Decode(message) => DomainError::invalid_response(backend, message),
    }
}
