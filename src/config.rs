use crate::resolve::{MatchStrategy, OverlapStabilizer, ProximityMatcher};
use thiserror::Error;

pub const DEFAULT_PORT: u16 = 3000;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("PYANNOTE_API_KEY is not set")]
    MissingApiKey,

    #[error("Invalid PORT: {0}")]
    InvalidPort(String),

    #[error("Unknown MATCH_STRATEGY: {0} (expected \"proximity\" or \"overlap\")")]
    UnknownStrategy(String),
}

/// Which resolution strategy a deployment runs. The two are never mixed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrategyKind {
    Proximity,
    Overlap,
}

impl StrategyKind {
    pub fn matcher(self) -> Box<dyn MatchStrategy> {
        match self {
            StrategyKind::Proximity => Box::new(ProximityMatcher),
            StrategyKind::Overlap => Box::new(OverlapStabilizer),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub api_key: String,
    /// Override for the provider base URL; the adapter default applies
    /// when unset.
    pub api_url: Option<String>,
    pub port: u16,
    pub strategy: StrategyKind,
    /// Callback URL handed to diarization jobs. When set, results arrive
    /// through the webhook route instead of polling.
    pub webhook_url: Option<String>,
}

impl AppConfig {
    /// Read configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        let api_key =
            std::env::var("PYANNOTE_API_KEY").map_err(|_| ConfigError::MissingApiKey)?;
        let api_url = std::env::var("PYANNOTE_API_URL").ok();

        let port = match std::env::var("PORT") {
            Ok(raw) => raw.parse().map_err(|_| ConfigError::InvalidPort(raw))?,
            Err(_) => DEFAULT_PORT,
        };

        let strategy = match std::env::var("MATCH_STRATEGY").ok().as_deref() {
            None | Some("proximity") => StrategyKind::Proximity,
            Some("overlap") => StrategyKind::Overlap,
            Some(other) => return Err(ConfigError::UnknownStrategy(other.to_string())),
        };

        let webhook_url = std::env::var("DIARIZATION_WEBHOOK_URL").ok();

        Ok(Self {
            api_key,
            api_url,
            port,
            strategy,
            webhook_url,
        })
    }
}
