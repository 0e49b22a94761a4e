//! Chain registry: the static name-to-chain lookup shared by all dispatches

use std::collections::HashMap;

use super::{BackendId, ChainId, ChainStep, FallbackChain};
use crate::domain::DomainError;

/// Immutable mapping from chain name to its fallback definition. Built once
/// at startup and shared read-only across all concurrent dispatches; there is
/// deliberately no mutation path after construction.
#[derive(Debug)]
pub struct ChainRegistry {
    chains: HashMap<String, FallbackChain>,
}

impl ChainRegistry {
    /// Build a registry from chain definitions, rejecting duplicates.
    pub fn new(chains: Vec<FallbackChain>) -> Result<Self, DomainError> {
        let mut map = HashMap::with_capacity(chains.len());

        for chain in chains {
            let name = chain.id().as_str().to_string();

            if map.insert(name.clone(), chain).is_some() {
                return Err(DomainError::configuration(format!(
                    "duplicate chain '{}'",
                    name
                )));
            }
        }

        Ok(Self { chains: map })
    }

    /// The built-in chains, mirroring the proxy's default configuration:
    /// `standard` for review-quality work, `fast` for bulk generation,
    /// `deep` for tasks that justify thinking-model latency, and `image`
    /// for image-capable models.
    pub fn builtin() -> Self {
        let anthropic = BackendId::new("anthropic").expect("valid backend id");
        let gemini = BackendId::new("gemini").expect("valid backend id");

        let chains = vec![
            FallbackChain::new(
                ChainId::new("standard").expect("valid chain id"),
                vec![
                    ChainStep::new(anthropic.clone(), "claude-sonnet-4-5"),
                    ChainStep::new(gemini.clone(), "gemini-2.5-flash"),
                    ChainStep::new(gemini.clone(), "gemini-2.5-pro"),
                    ChainStep::new(gemini.clone(), "gemini-3-flash"),
                ],
            ),
            FallbackChain::new(
                ChainId::new("fast").expect("valid chain id"),
                vec![
                    ChainStep::new(gemini.clone(), "gemini-2.5-flash-lite"),
                    ChainStep::new(gemini.clone(), "gemini-2.5-flash"),
                    ChainStep::new(gemini.clone(), "gemini-3-flash"),
                    ChainStep::new(anthropic.clone(), "claude-sonnet-4-5"),
                ],
            ),
            FallbackChain::new(
                ChainId::new("deep").expect("valid chain id"),
                vec![
                    ChainStep::new(anthropic.clone(), "claude-sonnet-4-5-thinking"),
                    ChainStep::new(anthropic, "claude-opus-4-5-thinking"),
                    ChainStep::new(gemini.clone(), "gemini-2.5-pro"),
                    ChainStep::new(gemini.clone(), "gemini-3-pro-high"),
                ],
            ),
            FallbackChain::new(
                ChainId::new("image").expect("valid chain id"),
                vec![
                    ChainStep::new(gemini.clone(), "gemini-3-pro-image"),
                    ChainStep::new(gemini.clone(), "gemini-3-pro"),
                    ChainStep::new(gemini, "gemini-2.5-pro"),
                ],
            ),
        ];

        let chains = chains
            .into_iter()
            .collect::<Result<Vec<_>, _>>()
            .expect("builtin chains are non-empty");

        Self::new(chains).expect("builtin chain names are unique")
    }

    /// Resolve a chain by name. Pure lookup, no I/O.
    pub fn resolve(&self, name: &str) -> Result<&FallbackChain, DomainError> {
        self.chains
            .get(name)
            .ok_or_else(|| DomainError::unknown_chain(name))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.chains.contains_key(name)
    }

    pub fn chain_names(&self) -> Vec<&str> {
        self.chains.keys().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.chains.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chains.is_empty()
    }
}
