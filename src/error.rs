//! Error taxonomies for engine construction and discovery runs.
//!
//! Fetch-time network and HTTP failures are deliberately *not* errors:
//! the engine contract encodes them in the returned document (status 0
//! sentinel for transport failure, the real code otherwise) so callers
//! never need a try/catch around a fetch. Errors here are the things
//! that should fail fast instead — bad configuration and unusable runs.

use crate::fetch::EngineKind;

/// Errors raised while building a fetch engine. All of these occur
/// before any network activity.
#[derive(thiserror::Error, Debug)]
pub enum EngineError {
    #[error("invalid proxy endpoint `{endpoint}`: {reason}")]
    InvalidProxy { endpoint: String, reason: String },

    #[error("{kind} engine requires a proxy but none was configured")]
    ProxyRequired { kind: EngineKind },

    #[error("Chromium binary not found; set SITEROVER_CHROMIUM_PATH or install Chrome")]
    BrowserUnavailable,

    #[error("failed to build HTTP client: {0}")]
    ClientBuild(#[from] reqwest::Error),
}

/// Errors that abort a discovery run outright. Per-page fetch failures
/// inside a run are absorbed into [`DiscoveryStats`](crate::discovery::DiscoveryStats)
/// instead.
#[derive(thiserror::Error, Debug)]
pub enum DiscoveryError {
    #[error("invalid seed URL `{input}`: {reason}")]
    InvalidSeed { input: String, reason: String },

    #[error("site root {root} unreachable: {reason}")]
    RootUnreachable { root: String, reason: String },

    #[error(transparent)]
    Engine(#[from] EngineError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_error_display() {
        let err = EngineError::InvalidProxy {
            endpoint: "not-a-proxy".to_string(),
            reason: "missing scheme".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "invalid proxy endpoint `not-a-proxy`: missing scheme"
        );

        let err = EngineError::ProxyRequired {
            kind: EngineKind::Http,
        };
        assert!(err.to_string().contains("http engine requires a proxy"));
    }

    #[test]
    fn test_discovery_error_wraps_engine_error() {
        let err: DiscoveryError = EngineError::BrowserUnavailable.into();
        assert!(err.to_string().contains("Chromium binary not found"));
    }
}
