//! Fallback chain entities and retry policy

use std::time::Duration;

use once_cell::sync::Lazy;
use rand::Rng;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::domain::DomainError;

/// Maximum length for chain and backend identifiers
const MAX_ID_LENGTH: usize = 50;

/// Identifiers are alphanumeric with inner hyphens, matching config keys
static ID_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z0-9][a-zA-Z0-9-]*[a-zA-Z0-9]$|^[a-zA-Z0-9]$").unwrap());

fn validate_id(kind: &str, id: &str) -> Result<(), DomainError> {
    if id.is_empty() {
        return Err(DomainError::validation(format!("{} id cannot be empty", kind)));
    }

    if id.len() > MAX_ID_LENGTH {
        return Err(DomainError::validation(format!(
            "{} id too long: {} characters (max {})",
            kind,
            id.len(),
            MAX_ID_LENGTH
        )));
    }

    if !ID_PATTERN.is_match(id) {
        return Err(DomainError::validation(format!(
            "invalid {} id '{}': must be alphanumeric with hyphens, cannot start or end with hyphen",
            kind, id
        )));
    }

    Ok(())
}

/// Name of a fallback chain (`standard`, `fast`, `deep`, ...)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ChainId(String);

impl ChainId {
    pub fn new(id: impl Into<String>) -> Result<Self, DomainError> {
        let id = id.into();
        validate_id("chain", &id)?;
        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for ChainId {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ChainId> for String {
    fn from(id: ChainId) -> Self {
        id.0
    }
}

impl std::fmt::Display for ChainId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Name of a configured backend (`anthropic`, `gemini`, ...)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BackendId(String);

impl BackendId {
    pub fn new(id: impl Into<String>) -> Result<Self, DomainError> {
        let id = id.into();
        validate_id("backend", &id)?;
        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for BackendId {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<BackendId> for String {
    fn from(id: BackendId) -> Self {
        id.0
    }
}

impl std::fmt::Display for BackendId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Retry behavior for transient step failures
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Maximum retries of the same step after its first attempt
    pub max_retries: u32,
    /// Delay before the first retry
    pub base_delay_ms: u64,
    /// Cap on the delay between retries
    pub max_delay_ms: u64,
    /// Multiplier for exponential backoff
    pub backoff_multiplier: f64,
    /// Fractional jitter applied to each delay (0.2 = ±20%)
    pub jitter: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 2,
            base_delay_ms: 500,
            max_delay_ms: 10_000,
            backoff_multiplier: 2.0,
            jitter: 0.2,
        }
    }
}

impl RetryPolicy {
    pub fn new(max_retries: u32) -> Self {
        Self {
            max_retries,
            ..Default::default()
        }
    }

    pub fn with_base_delay(mut self, ms: u64) -> Self {
        self.base_delay_ms = ms;
        self
    }

    pub fn with_max_delay(mut self, ms: u64) -> Self {
        self.max_delay_ms = ms;
        self
    }

    pub fn with_backoff_multiplier(mut self, multiplier: f64) -> Self {
        self.backoff_multiplier = multiplier;
        self
    }

    pub fn with_jitter(mut self, jitter: f64) -> Self {
        self.jitter = jitter;
        self
    }

    /// Exponential delay for a given retry (0-indexed), before jitter.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let delay = self.base_delay_ms as f64 * self.backoff_multiplier.powi(attempt as i32);
        let delay_ms = delay.min(self.max_delay_ms as f64) as u64;

        Duration::from_millis(delay_ms)
    }

    /// Delay with ±jitter applied, so concurrent dispatches retrying against
    /// the same throttled provider do not resynchronize.
    pub fn jittered_delay_for_attempt(&self, attempt: u32) -> Duration {
        let base = self.delay_for_attempt(attempt).as_millis() as f64;
        let jitter = self.jitter.clamp(0.0, 1.0);

        if jitter == 0.0 || base == 0.0 {
            return Duration::from_millis(base as u64);
        }

        let factor = 1.0 + rand::thread_rng().gen_range(-jitter..=jitter);
        Duration::from_millis((base * factor) as u64)
    }
}

/// One step in a fallback chain: which backend to call with which model
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainStep {
    backend: BackendId,
    model: String,
}

impl ChainStep {
    pub fn new(backend: BackendId, model: impl Into<String>) -> Self {
        Self {
            backend,
            model: model.into(),
        }
    }

    pub fn backend(&self) -> &BackendId {
        &self.backend
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

/// Ordered sequence of backend/model pairs tried in priority order.
/// Immutable once constructed; step order is the fallback priority.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FallbackChain {
    id: ChainId,
    steps: Vec<ChainStep>,
}

impl FallbackChain {
    /// Build a chain, rejecting the degenerate zero-step case.
    pub fn new(id: ChainId, steps: Vec<ChainStep>) -> Result<Self, DomainError> {
        if steps.is_empty() {
            return Err(DomainError::configuration(format!(
                "chain '{}' has no steps",
                id
            )));
        }

        Ok(Self { id, steps })
    }

    pub fn id(&self) -> &ChainId {
        &self.id
    }

    pub fn steps(&self) -> &[ChainStep] {
        &self.steps
    }

    pub fn step_count(&self) -> usize {
        self.steps.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chain_id_valid() {
        let id = ChainId::new("fast").unwrap();
        assert_eq!(id.as_str(), "fast");
        assert!(ChainId::new("my-chain-1").is_ok());
        assert!(ChainId::new("a").is_ok());
    }

    #[test]
    fn test_chain_id_invalid() {
        assert!(ChainId::new("").is_err());
        assert!(ChainId::new("bad_chain!").is_err());
        assert!(ChainId::new("-leading").is_err());
        assert!(ChainId::new("trailing-").is_err());
        assert!(ChainId::new("a".repeat(51)).is_err());
    }

    #[test]
    fn test_backend_id_roundtrip() {
        let id = BackendId::new("anthropic").unwrap();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"anthropic\"");

        let parsed: BackendId = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, id);
    }

    #[test]
    fn test_retry_policy_defaults() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_retries, 2);
        assert_eq!(policy.base_delay_ms, 500);
        assert_eq!(policy.backoff_multiplier, 2.0);
        assert_eq!(policy.jitter, 0.2);
    }

    #[test]
    fn test_retry_delay_calculation() {
        let policy = RetryPolicy::new(5)
            .with_base_delay(100)
            .with_backoff_multiplier(2.0)
            .with_max_delay(1000);

        assert_eq!(policy.delay_for_attempt(0), Duration::from_millis(100));
        assert_eq!(policy.delay_for_attempt(1), Duration::from_millis(200));
        assert_eq!(policy.delay_for_attempt(2), Duration::from_millis(400));
        assert_eq!(policy.delay_for_attempt(3), Duration::from_millis(800));
        // Capped at max_delay
        assert_eq!(policy.delay_for_attempt(4), Duration::from_millis(1000));
    }

    #[test]
    fn test_jittered_delay_stays_in_band() {
        let policy = RetryPolicy::default()
            .with_base_delay(1000)
            .with_jitter(0.2);

        for _ in 0..50 {
            let delay = policy.jittered_delay_for_attempt(0).as_millis() as u64;
            assert!((800..=1200).contains(&delay), "delay {} out of band", delay);
        }
    }

    #[test]
    fn test_zero_jitter_is_deterministic() {
        let policy = RetryPolicy::default().with_base_delay(300).with_jitter(0.0);
        assert_eq!(
            policy.jittered_delay_for_attempt(0),
            Duration::from_millis(300)
        );
    }

    #[test]
    fn test_chain_requires_steps() {
        let id = ChainId::new("empty").unwrap();
        assert!(FallbackChain::new(id, vec![]).is_err());
    }

    #[test]
    fn test_chain_preserves_step_order() {
        let chain = FallbackChain::new(
            ChainId::new("fast").unwrap(),
            vec![
                ChainStep::new(BackendId::new("gemini").unwrap(), "gemini-2.5-flash-lite"),
                ChainStep::new(BackendId::new("anthropic").unwrap(), "claude-sonnet-4-5"),
            ],
        )
        .unwrap();

        assert_eq!(chain.step_count(), 2);
        assert_eq!(chain.steps()[0].model(), "gemini-2.5-flash-lite");
        assert_eq!(chain.steps()[1].backend().as_str(), "anthropic");
    }
}
