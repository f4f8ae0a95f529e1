//! Bounded breadth-first URL discovery over a fetch engine.
//!
//! Feed it a seed URL and it walks the site level by level: fetch a
//! page, harvest its links, filter, dedup, enqueue. Bounded by depth,
//! by result count, and by a cancellation flag.

pub mod explorer;
pub mod extract;

pub use explorer::{normalize_seed, Discoverer};

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::fetch::{EngineKind, FetchOptions};

/// Seed page is depth 0; its links are depth 1.
pub const DEFAULT_MAX_DEPTH: u32 = 1;

/// Default cap on the number of discovered URLs per run.
pub const DEFAULT_MAX_URLS: usize = 200;

/// Default parallel fetches within one depth level.
pub const DEFAULT_CONCURRENCY: usize = 20;

/// Path suffixes that never count as discoverable pages: images, docs,
/// archives, media, styles/scripts, fonts, binaries. Matched
/// case-insensitively against the URL path.
pub const DEFAULT_EXCLUDED_EXTENSIONS: &[&str] = &[
    ".jpg", ".jpeg", ".png", ".gif", ".svg", ".webp", ".ico", ".bmp", ".tif", ".tiff", ".pdf",
    ".doc", ".docx", ".xls", ".xlsx", ".ppt", ".pptx", ".csv", ".zip", ".rar", ".tar", ".gz",
    ".bz2", ".7z", ".mp3", ".mp4", ".avi", ".mov", ".wmv", ".webm", ".mkv", ".wav", ".flac",
    ".css", ".js", ".json", ".xml", ".woff", ".woff2", ".ttf", ".eot", ".otf", ".exe", ".dmg",
    ".iso", ".bin", ".apk", ".msi",
];

/// The default exclusion list as owned strings.
pub fn default_excluded_extensions() -> Vec<String> {
    DEFAULT_EXCLUDED_EXTENSIONS
        .iter()
        .map(|e| e.to_string())
        .collect()
}

/// Options for one discovery run.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscoveryOptions {
    /// How deep to expand; the seed is depth 0.
    pub max_depth: u32,
    /// Stop once this many URLs are discovered. Zero means an empty
    /// run: no fetches at all.
    pub max_urls: usize,
    /// Proxy for every fetch in the run.
    pub proxy: Option<String>,
    /// Path suffixes to skip, matched case-insensitively.
    pub excluded_extensions: Vec<String>,
    /// Which fetch engine expands pages.
    pub engine: EngineKind,
    /// Fetch overrides applied to every fetch in the run.
    pub fetch: FetchOptions,
    /// Parallel fetches within one depth level.
    pub concurrency: usize,
    /// Only expand links on the seed's host:port.
    pub same_domain_only: bool,
}

impl Default for DiscoveryOptions {
    fn default() -> Self {
        DiscoveryOptions {
            max_depth: DEFAULT_MAX_DEPTH,
            max_urls: DEFAULT_MAX_URLS,
            proxy: None,
            excluded_extensions: default_excluded_extensions(),
            engine: EngineKind::Http,
            fetch: FetchOptions::default(),
            concurrency: DEFAULT_CONCURRENCY,
            same_domain_only: true,
        }
    }
}

/// Counters accumulated across a run.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct DiscoveryStats {
    /// Fetches performed (including failed ones).
    pub pages_visited: usize,
    /// Resolved http(s) link candidates extracted from fetched pages.
    pub links_seen: usize,
    /// Candidates discarded by the extension or domain rules.
    pub links_filtered: usize,
    /// Visited pages whose fetch failed.
    pub fetch_failures: usize,
    /// Deepest level that was actually fetched.
    pub max_depth_reached: u32,
    /// Wall-clock time for the whole run.
    pub elapsed_ms: u64,
}

/// Outcome of a discovery run. `urls` is in discovery order: the order
/// each URL was first accepted, starting with the root.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DiscoveryResult {
    /// Normalized site root the run started from.
    pub root: String,
    /// Discovered URLs, insertion-ordered, capped at `max_urls`.
    pub urls: Vec<String>,
    /// Run counters.
    pub stats: DiscoveryStats,
}

/// Clonable cancellation signal. Setting it stops a run at the next
/// depth-level boundary; in-flight fetches finish first.
#[derive(Clone, Debug, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        CancelFlag::default()
    }

    /// Request cancellation. Idempotent.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_options() {
        let opts = DiscoveryOptions::default();
        assert_eq!(opts.max_depth, 1);
        assert_eq!(opts.max_urls, 200);
        assert_eq!(opts.engine, EngineKind::Http);
        assert!(opts.same_domain_only);
        assert!(opts.excluded_extensions.contains(&".pdf".to_string()));
        assert!(opts.excluded_extensions.contains(&".jpg".to_string()));
    }

    #[test]
    fn test_options_deserialize_partial_json() {
        let opts: DiscoveryOptions =
            serde_json::from_str(r#"{"max_depth": 3, "engine": "browser"}"#).unwrap();
        assert_eq!(opts.max_depth, 3);
        assert_eq!(opts.engine, EngineKind::Browser);
        // Unmentioned fields keep their defaults.
        assert_eq!(opts.max_urls, 200);
    }

    #[test]
    fn test_cancel_flag_shared_across_clones() {
        let flag = CancelFlag::new();
        let other = flag.clone();
        assert!(!other.is_cancelled());

        flag.cancel();
        assert!(other.is_cancelled());

        // Idempotent.
        flag.cancel();
        assert!(flag.is_cancelled());
    }
}
