//! Fetch engine contract: one async trait turning a URL plus options into
//! a normalized document, with two implementations (plain HTTP and
//! browser rendering) sharing a single retry policy.
//!
//! Engines never raise for network or HTTP failures. A failed fetch is a
//! [`FetchDocument`] with `status = 0` (transport failure) or the real
//! HTTP error code, `meta.success = false` and `meta.error` set. Errors
//! are reserved for configuration problems at engine-build time.

pub mod browser;
pub mod factory;
pub mod http;

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Status sentinel recorded when a request never produced an HTTP
/// response (DNS failure, refused connection, timeout, TLS failure).
pub const NETWORK_FAILURE_STATUS: u16 = 0;

/// Default per-attempt timeout.
pub const DEFAULT_TIMEOUT_MS: u64 = 60_000;

/// Default retry budget. This is the *total* number of attempts, not the
/// number of retries after the first.
pub const DEFAULT_RETRIES: u32 = 3;

/// Browser-identity headers sent when the caller supplies none.
const DEFAULT_HEADERS: &[(&str, &str)] = &[
    (
        "User-Agent",
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
         (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36",
    ),
    (
        "Accept",
        "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
    ),
    ("Accept-Language", "en-US,en;q=0.9"),
    ("Cache-Control", "no-cache"),
    ("Pragma", "no-cache"),
];

/// The default header map as owned strings.
pub fn default_headers() -> HashMap<String, String> {
    DEFAULT_HEADERS
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

/// Which fetch engine implementation to use.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineKind {
    /// Plain HTTP requests (reqwest), no JavaScript execution.
    #[default]
    Http,
    /// Headless Chromium rendering for JavaScript-heavy pages.
    Browser,
}

impl fmt::Display for EngineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineKind::Http => write!(f, "http"),
            EngineKind::Browser => write!(f, "browser"),
        }
    }
}

impl FromStr for EngineKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "http" => Ok(EngineKind::Http),
            "browser" => Ok(EngineKind::Browser),
            other => Err(format!(
                "unknown engine kind `{other}` (expected `http` or `browser`)"
            )),
        }
    }
}

/// Partial fetch options. Every field is optional; unset fields take
/// defaults when resolved. Merging is field-wise: a field explicitly set
/// in the higher-precedence options wins, and `headers` replaces the
/// whole map when set.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchOptions {
    /// Proxy endpoint, `scheme://[user:pass@]host:port`.
    pub proxy: Option<String>,
    /// Request headers. Replaces the default browser-identity set.
    pub headers: Option<HashMap<String, String>>,
    /// Per-attempt timeout in milliseconds.
    pub timeout_ms: Option<u64>,
    /// Total attempts per fetch call.
    pub retries: Option<u32>,
    /// Post-load settle time for the browser engine.
    pub render_wait_ms: Option<u64>,
}

impl FetchOptions {
    /// Field-wise merge, `overrides` winning where set.
    pub fn merged_with(&self, overrides: &FetchOptions) -> FetchOptions {
        FetchOptions {
            proxy: overrides.proxy.clone().or_else(|| self.proxy.clone()),
            headers: overrides.headers.clone().or_else(|| self.headers.clone()),
            timeout_ms: overrides.timeout_ms.or(self.timeout_ms),
            retries: overrides.retries.or(self.retries),
            render_wait_ms: overrides.render_wait_ms.or(self.render_wait_ms),
        }
    }

    /// Fill unset fields with defaults. Pure; a zero retry budget is
    /// clamped to one attempt.
    pub fn resolve(&self) -> ResolvedFetchOptions {
        ResolvedFetchOptions {
            proxy: self.proxy.clone(),
            headers: self.headers.clone().unwrap_or_else(default_headers),
            timeout_ms: self.timeout_ms.unwrap_or(DEFAULT_TIMEOUT_MS),
            retries: self.retries.unwrap_or(DEFAULT_RETRIES).max(1),
            render_wait_ms: self.render_wait_ms,
        }
    }
}

/// Fully-resolved options an engine actually runs with.
#[derive(Clone, Debug)]
pub struct ResolvedFetchOptions {
    pub proxy: Option<String>,
    pub headers: HashMap<String, String>,
    pub timeout_ms: u64,
    pub retries: u32,
    pub render_wait_ms: Option<u64>,
}

impl ResolvedFetchOptions {
    /// Apply a per-call partial on top of already-resolved options.
    /// Same precedence rules as [`FetchOptions::merged_with`].
    pub fn overridden_with(&self, overrides: &FetchOptions) -> ResolvedFetchOptions {
        ResolvedFetchOptions {
            proxy: overrides.proxy.clone().or_else(|| self.proxy.clone()),
            headers: overrides
                .headers
                .clone()
                .unwrap_or_else(|| self.headers.clone()),
            timeout_ms: overrides.timeout_ms.unwrap_or(self.timeout_ms),
            retries: overrides.retries.unwrap_or(self.retries).max(1),
            render_wait_ms: overrides.render_wait_ms.or(self.render_wait_ms),
        }
    }
}

/// Outcome metadata attached to every fetched document.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct FetchMeta {
    /// True iff the final status is 2xx/3xx and no transport error occurred.
    pub success: bool,
    /// Human-readable failure description.
    pub error: Option<String>,
    /// The HTTP engine downgraded TLS to reach a legacy server.
    pub used_legacy_tls: bool,
    /// Effective per-attempt timeout of the final attempt.
    pub timeout_ms: Option<u64>,
}

/// Normalized result of a fetch: markdown payload plus raw markup and
/// outcome metadata. Failures are documents too, never errors.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FetchDocument {
    /// Requested URL.
    pub url: String,
    /// Final HTTP status; 0 means the request never got a response.
    pub status: u16,
    /// Markdown rendition of the fetched markup. Empty on failure.
    pub markdown: String,
    /// Raw markup, when the fetch produced one.
    pub html: Option<String>,
    /// Outcome metadata.
    pub meta: FetchMeta,
}

impl FetchDocument {
    /// Successful document from raw markup; converts markdown here so
    /// every engine shares one conversion path.
    pub fn from_markup(url: &str, status: u16, html: String) -> Self {
        let markdown = crate::markdown::html_to_markdown(&html);
        FetchDocument {
            url: url.to_string(),
            status,
            markdown,
            html: Some(html),
            meta: FetchMeta {
                success: true,
                ..FetchMeta::default()
            },
        }
    }

    /// Failure document. `status` is 0 for transport failures or the
    /// real HTTP error code.
    pub fn failure(url: &str, status: u16, error: impl Into<String>) -> Self {
        FetchDocument {
            url: url.to_string(),
            status,
            markdown: String::new(),
            html: None,
            meta: FetchMeta {
                success: false,
                error: Some(error.into()),
                ..FetchMeta::default()
            },
        }
    }

    /// The status mapping callers use: crawled iff the fetch succeeded
    /// with a 2xx/3xx status.
    pub fn is_crawled(&self) -> bool {
        self.meta.success && (200..400).contains(&self.status)
    }
}

/// Should this attempt outcome be retried? Network failures, 429 and
/// 5xx are transient; everything else (including other 4xx) is terminal.
pub fn is_retryable_status(status: u16) -> bool {
    status == NETWORK_FAILURE_STATUS || status == 429 || (500..600).contains(&status)
}

/// Deterministic backoff slept after a failed attempt (0-based):
/// 500ms, 1s, 2s, 4s, ...
pub fn backoff_delay(attempt: u32) -> Duration {
    Duration::from_millis(500u64.saturating_mul(2u64.saturating_pow(attempt)))
}

/// How the per-attempt timeout evolves across the retry budget.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TimeoutSchedule {
    /// Every attempt gets the base timeout (HTTP engine).
    Fixed,
    /// Attempt `i` gets `base * 2^i` — slow renders get more room on
    /// each retry (browser engine).
    Geometric,
}

impl TimeoutSchedule {
    /// Effective timeout for a 0-based attempt index.
    pub fn timeout_for(&self, base_ms: u64, attempt: u32) -> u64 {
        match self {
            TimeoutSchedule::Fixed => base_ms,
            TimeoutSchedule::Geometric => base_ms.saturating_mul(2u64.saturating_pow(attempt)),
        }
    }
}

/// A pluggable fetch engine. Implementations are cheap to share across
/// tasks; per-call state lives inside `fetch`.
#[async_trait]
pub trait FetchEngine: Send + Sync {
    /// Fetch a URL into a normalized document, merging `options` over the
    /// engine's build-time options. Never returns an error and never
    /// panics for network or HTTP failures.
    async fn fetch(&self, url: &str, options: Option<&FetchOptions>) -> FetchDocument;

    /// Which implementation this engine is.
    fn kind(&self) -> EngineKind;
}
