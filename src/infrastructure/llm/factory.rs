use std::sync::Arc;

use super::http_client::HttpClient;
use super::{AnthropicAdapter, GeminiAdapter};
use crate::config::{BackendConfig, BackendsConfig};
use crate::domain::chain::{BackendId, ChainStep};
use crate::domain::dispatch::AdapterRegistry;
use crate::domain::DomainError;

/// Cheapest model per backend, used as the health probe target.
const ANTHROPIC_PROBE_MODEL: &str = "claude-sonnet-4-5";
const GEMINI_PROBE_MODEL: &str = "gemini-2.5-flash-lite";

/// Build the adapter registry from the configured backends. At least one
/// backend must be configured with a non-empty key.
pub fn build_adapters(backends: &BackendsConfig) -> Result<AdapterRegistry, DomainError> {
    let mut registry = AdapterRegistry::new();

    if let Some(config) = &backends.anthropic {
        validate_backend("anthropic", config)?;

        let adapter = match &config.base_url {
            Some(url) => AnthropicAdapter::with_base_url(HttpClient::new(), &config.api_key, url),
            None => AnthropicAdapter::new(HttpClient::new(), &config.api_key),
        };

        registry.register(Arc::new(adapter));
    }

    if let Some(config) = &backends.gemini {
        validate_backend("gemini", config)?;

        let adapter = match &config.base_url {
            Some(url) => GeminiAdapter::with_base_url(HttpClient::new(), &config.api_key, url),
            None => GeminiAdapter::new(HttpClient::new(), &config.api_key),
        };

        registry.register(Arc::new(adapter));
    }

    if registry.is_empty() {
        return Err(DomainError::configuration("no backends configured"));
    }

    Ok(registry)
}

/// Health probe targets for the configured backends.
pub fn default_probes(backends: &BackendsConfig) -> Vec<ChainStep> {
    let mut probes = Vec::new();

    if backends.anthropic.is_some() {
        if let Ok(id) = BackendId::new("anthropic") {
            probes.push(ChainStep::new(id, ANTHROPIC_PROBE_MODEL));
        }
    }

    if backends.gemini.is_some() {
        if let Ok(id) = BackendId::new("gemini") {
            probes.push(ChainStep::new(id, GEMINI_PROBE_MODEL));
        }
    }

    probes
}

fn validate_backend(name: &str, config: &BackendConfig) -> Result<(), DomainError> {
    if config.api_key.trim().is_empty() {
        return Err(DomainError::configuration(format!(
            "backend '{}' has an empty api key",
            name
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BackendConfig;

    fn backend(api_key: &str) -> BackendConfig {
        BackendConfig {
            api_key: api_key.to_string(),
            base_url: None,
        }
    }

    #[test]
    fn test_build_both_backends() {
        let backends = BackendsConfig {
            anthropic: Some(backend("a-key")),
            gemini: Some(backend("g-key")),
        };

        let registry = build_adapters(&backends).unwrap();

        assert_eq!(registry.len(), 2);
        assert!(registry.contains(&BackendId::new("anthropic").unwrap()));
        assert!(registry.contains(&BackendId::new("gemini").unwrap()));
    }

    #[test]
    fn test_unconfigured_backend_is_absent() {
        let backends = BackendsConfig {
            anthropic: None,
            gemini: Some(backend("g-key")),
        };

        let registry = build_adapters(&backends).unwrap();

        assert_eq!(registry.len(), 1);
        assert!(!registry.contains(&BackendId::new("anthropic").unwrap()));
    }

    #[test]
    fn test_no_backends_is_a_configuration_error() {
        let backends = BackendsConfig::default();
        let error = build_adapters(&backends).unwrap_err();

        assert!(matches!(error, DomainError::Configuration { .. }));
    }

    #[test]
    fn test_empty_api_key_is_rejected() {
        let backends = BackendsConfig {
            anthropic: Some(backend("  ")),
            gemini: None,
        };

        assert!(build_adapters(&backends).is_err());
    }

    #[test]
    fn test_probe_targets_follow_configuration() {
        let backends = BackendsConfig {
            anthropic: None,
            gemini: Some(backend("g-key")),
        };

        let probes = default_probes(&backends);

        assert_eq!(probes.len(), 1);
        assert_eq!(probes[0].backend().as_str(), "gemini");
        assert_eq!(probes[0].model(), GEMINI_PROBE_MODEL);
    }
}
