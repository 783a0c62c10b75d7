//! LLM provider abstraction layer.
//!
//! - Kimi: OpenAI-compatible chat completions
//! - MiniMax: `chatcompletion_pro` with bot personas
//! - Mock provider for tests and offline development

pub mod kimi;
pub mod minimax;
pub mod mock;
pub mod traits;

pub use kimi::KimiProvider;
pub use minimax::MiniMaxProvider;
pub use mock::MockProvider;
pub use traits::{CompletionRequest, ProviderError, ScoringProvider};

use std::sync::Arc;

use tracing::info;

use crate::config::{ProviderArgs, ProviderKind};

/// Configured providers, keyed by kind.
///
/// Similarity is judged by one selected provider. Reasonableness and
/// reference generation use every configured provider, Kimi first.
#[derive(Clone)]
pub struct ProviderRegistry {
    providers: Vec<(ProviderKind, Arc<dyn ScoringProvider>)>,
    similarity: ProviderKind,
}

impl ProviderRegistry {
    /// Empty registry judging similarity with `similarity`
    pub fn new(similarity: ProviderKind) -> Self {
        Self {
            providers: Vec::new(),
            similarity,
        }
    }

    /// Register a provider, replacing any previous one of the same kind.
    pub fn with_provider(mut self, kind: ProviderKind, provider: Arc<dyn ScoringProvider>) -> Self {
        self.providers.retain(|(k, _)| *k != kind);
        self.providers.push((kind, provider));
        self.providers.sort_by_key(|(k, _)| match k {
            ProviderKind::Kimi => 0,
            ProviderKind::Minimax => 1,
        });
        self
    }

    /// Build HTTP providers for every configured credential set.
    pub fn from_args(args: &ProviderArgs) -> Result<Self, ProviderError> {
        let mut registry = Self::new(args.similarity_provider);
        let timeout = args.timeout();

        for kind in args.configured() {
            let provider: Arc<dyn ScoringProvider> = match kind {
                ProviderKind::Kimi => Arc::new(KimiProvider::new(
                    &args.kimi_base_url,
                    &args.kimi_model,
                    args.kimi_api_key.clone().unwrap_or_default(),
                    timeout,
                )?),
                ProviderKind::Minimax => Arc::new(MiniMaxProvider::new(
                    &args.minimax_base_url,
                    &args.minimax_model,
                    args.minimax_api_key.clone().unwrap_or_default(),
                    args.minimax_group_id.clone().unwrap_or_default(),
                    timeout,
                )?),
            };
            info!(provider = %kind, "Provider configured");
            registry = registry.with_provider(kind, provider);
        }

        Ok(registry)
    }

    /// Provider that judges answer similarity, if configured
    pub fn similarity(&self) -> Option<Arc<dyn ScoringProvider>> {
        self.get(self.similarity)
    }

    /// Providers that judge reasonableness
    pub fn reasonableness(&self) -> Vec<Arc<dyn ScoringProvider>> {
        self.all()
    }

    /// Providers that generate reference answers
    pub fn generators(&self) -> Vec<Arc<dyn ScoringProvider>> {
        self.all()
    }

    pub fn get(&self, kind: ProviderKind) -> Option<Arc<dyn ScoringProvider>> {
        self.providers
            .iter()
            .find(|(k, _)| *k == kind)
            .map(|(_, p)| Arc::clone(p))
    }

    /// Configured kinds in evaluation order
    pub fn kinds(&self) -> Vec<ProviderKind> {
        self.providers.iter().map(|(k, _)| *k).collect()
    }

    fn all(&self) -> Vec<Arc<dyn ScoringProvider>> {
        self.providers.iter().map(|(_, p)| Arc::clone(p)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_registry_order_and_selection() {
        let registry = ProviderRegistry::new(ProviderKind::Minimax)
            .with_provider(ProviderKind::Minimax, Arc::new(MockProvider::new("MiniMax")))
            .with_provider(ProviderKind::Kimi, Arc::new(MockProvider::new("Kimi")));

        assert_eq!(registry.kinds(), vec![ProviderKind::Kimi, ProviderKind::Minimax]);
        assert_eq!(registry.similarity().unwrap().name(), "MiniMax");
        let names: Vec<_> = registry
            .reasonableness()
            .iter()
            .map(|p| p.name().to_string())
            .collect();
        assert_eq!(names, vec!["Kimi", "MiniMax"]);
    }

    #[test]
    fn test_replacing_a_provider() {
        let registry = ProviderRegistry::new(ProviderKind::Kimi)
            .with_provider(ProviderKind::Kimi, Arc::new(MockProvider::new("old")))
            .with_provider(ProviderKind::Kimi, Arc::new(MockProvider::new("new")));
        assert_eq!(registry.generators().len(), 1);
        assert_eq!(registry.similarity().unwrap().name(), "new");
    }

    #[test]
    fn test_from_args_skips_incomplete_credentials() {
        let args = crate::config::Args::try_parse_from([
            "ideamesh",
            "--kimi-api-key",
            "k",
            "--minimax-api-key",
            "m",
        ])
        .unwrap();
        let registry = ProviderRegistry::from_args(&args.providers).unwrap();
        assert_eq!(registry.kinds(), vec![ProviderKind::Kimi]);
        assert!(registry.get(ProviderKind::Minimax).is_none());
    }
}
