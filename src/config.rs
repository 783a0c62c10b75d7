//! Configuration for IdeaMesh
//!
//! CLI arguments and environment variable handling using clap.

use clap::{Parser, ValueEnum};
use std::fmt;
use std::net::SocketAddr;
use std::time::Duration;

/// IdeaMesh - questions, answers and LLM-scored ideas
#[derive(Parser, Debug, Clone)]
#[command(name = "ideamesh")]
#[command(about = "Question and answer service with LLM scoring and incentive points")]
pub struct Args {
    /// Address to listen on
    #[arg(long, env = "LISTEN", default_value = "0.0.0.0:8080")]
    pub listen: SocketAddr,

    /// Enable development mode (in-memory store fallback, dev JWT secret,
    /// X-Dev-User header identity)
    #[arg(long, env = "DEV_MODE", default_value = "false")]
    pub dev_mode: bool,

    /// MongoDB connection URI
    #[arg(long, env = "MONGODB_URI", default_value = "mongodb://localhost:27017")]
    pub mongodb_uri: String,

    /// MongoDB database name
    #[arg(long, env = "MONGODB_DB", default_value = "ideamesh")]
    pub mongodb_db: String,

    /// JWT secret shared with the identity provider (required in production)
    #[arg(long, env = "JWT_SECRET")]
    pub jwt_secret: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Log output format
    #[arg(long, env = "LOG_FORMAT", value_enum, default_value_t = LogFormat::Pretty)]
    pub log_format: LogFormat,

    /// Provider credentials and endpoints
    #[command(flatten)]
    pub providers: ProviderArgs,

    /// Number of deferred scoring workers
    #[arg(long, env = "SCORING_WORKERS", default_value = "2")]
    pub scoring_workers: usize,

    /// Capacity of the deferred scoring queue
    #[arg(long, env = "SCORING_QUEUE_SIZE", default_value = "256")]
    pub scoring_queue_size: usize,
}

/// LLM provider configuration
#[derive(Parser, Debug, Clone)]
pub struct ProviderArgs {
    /// Kimi (Moonshot) API key
    #[arg(long = "kimi-api-key", env = "KIMI")]
    pub kimi_api_key: Option<String>,

    /// Kimi OpenAI-compatible base URL
    #[arg(long, env = "KIMI_BASE_URL", default_value = "https://api.moonshot.cn/v1")]
    pub kimi_base_url: String,

    /// Kimi model name
    #[arg(long, env = "KIMI_MODEL", default_value = "kimi-k2-0711-preview")]
    pub kimi_model: String,

    /// MiniMax API key
    #[arg(long = "minimax-api-key", env = "MINIMAX")]
    pub minimax_api_key: Option<String>,

    /// MiniMax group identifier
    #[arg(long = "minimax-group-id", env = "MINIMAX_GROUP")]
    pub minimax_group_id: Option<String>,

    /// MiniMax base URL
    #[arg(long, env = "MINIMAX_BASE_URL", default_value = "https://api.minimaxi.com/v1")]
    pub minimax_base_url: String,

    /// MiniMax model name
    #[arg(long, env = "MINIMAX_MODEL", default_value = "abab6-chat")]
    pub minimax_model: String,

    /// Provider used to judge answer similarity against reference answers
    #[arg(long, env = "SIMILARITY_PROVIDER", value_enum, default_value_t = ProviderKind::Kimi)]
    pub similarity_provider: ProviderKind,

    /// HTTP timeout for provider calls in milliseconds (no timeout when unset)
    #[arg(long, env = "PROVIDER_TIMEOUT_MS")]
    pub provider_timeout_ms: Option<u64>,
}

/// Supported LLM backends
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderKind {
    Kimi,
    Minimax,
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Kimi => write!(f, "kimi"),
            Self::Minimax => write!(f, "minimax"),
        }
    }
}

/// Log output format
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

impl ProviderArgs {
    /// Whether every credential the given provider needs is present
    pub fn is_configured(&self, kind: ProviderKind) -> bool {
        match kind {
            ProviderKind::Kimi => self.kimi_api_key.as_deref().is_some_and(|k| !k.is_empty()),
            ProviderKind::Minimax => {
                self.minimax_api_key.as_deref().is_some_and(|k| !k.is_empty())
                    && self.minimax_group_id.as_deref().is_some_and(|g| !g.is_empty())
            }
        }
    }

    /// Configured providers in evaluation order
    pub fn configured(&self) -> Vec<ProviderKind> {
        [ProviderKind::Kimi, ProviderKind::Minimax]
            .into_iter()
            .filter(|k| self.is_configured(*k))
            .collect()
    }

    /// Provider HTTP timeout, if any
    pub fn timeout(&self) -> Option<Duration> {
        self.provider_timeout_ms.map(Duration::from_millis)
    }
}

impl Args {
    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        match &self.jwt_secret {
            None if !self.dev_mode => {
                return Err("JWT_SECRET is required in production mode".to_string());
            }
            Some(secret) if secret.len() < 32 => {
                return Err("JWT_SECRET must be at least 32 characters".to_string());
            }
            _ => {}
        }

        let similarity = self.providers.similarity_provider;
        if !self.providers.is_configured(similarity) {
            return Err(format!(
                "SIMILARITY_PROVIDER={} but its credentials are not set",
                similarity
            ));
        }

        if self.scoring_workers == 0 {
            return Err("SCORING_WORKERS must be at least 1".to_string());
        }

        if self.scoring_queue_size == 0 {
            return Err("SCORING_QUEUE_SIZE must be at least 1".to_string());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(extra: &[&str]) -> Args {
        let mut argv = vec!["ideamesh"];
        argv.extend_from_slice(extra);
        Args::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_defaults() {
        let args = parse(&[]);
        assert_eq!(args.listen.port(), 8080);
        assert_eq!(args.mongodb_db, "ideamesh");
        assert_eq!(args.providers.similarity_provider, ProviderKind::Kimi);
        assert_eq!(args.providers.kimi_model, "kimi-k2-0711-preview");
        assert_eq!(args.providers.minimax_model, "abab6-chat");
        assert!(args.providers.timeout().is_none());
    }

    #[test]
    fn test_validate_requires_secret_in_production() {
        let args = parse(&["--kimi-api-key", "k"]);
        assert!(args.validate().unwrap_err().contains("JWT_SECRET"));

        let args = parse(&["--kimi-api-key", "k", "--jwt-secret", "short"]);
        assert!(args.validate().unwrap_err().contains("32"));

        let args = parse(&[
            "--kimi-api-key",
            "k",
            "--jwt-secret",
            "this-secret-is-at-least-32-chars-long",
        ]);
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_validate_similarity_provider_credentials() {
        let args = parse(&[
            "--dev-mode",
            "--similarity-provider",
            "minimax",
            "--minimax-api-key",
            "k",
        ]);
        assert!(args.validate().unwrap_err().contains("minimax"));

        let args = parse(&[
            "--dev-mode",
            "--similarity-provider",
            "minimax",
            "--minimax-api-key",
            "k",
            "--minimax-group-id",
            "g",
        ]);
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_configured_order() {
        let args = parse(&[
            "--kimi-api-key",
            "k",
            "--minimax-api-key",
            "m",
            "--minimax-group-id",
            "g",
        ]);
        assert_eq!(
            args.providers.configured(),
            vec![ProviderKind::Kimi, ProviderKind::Minimax]
        );

        let args = parse(&["--minimax-api-key", "m"]);
        assert!(args.providers.configured().is_empty());
    }
}
