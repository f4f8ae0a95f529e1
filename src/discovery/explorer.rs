//! Seed normalization and the breadth-first discovery loop.

use std::collections::HashSet;
use std::time::Instant;

use futures::stream::{self, StreamExt};
use tracing::{info, warn};
use url::Url;

use super::extract::{extract_links, is_excluded_extension, same_site};
use super::{CancelFlag, DiscoveryOptions, DiscoveryResult, DiscoveryStats};
use crate::error::DiscoveryError;
use crate::events::{new_run_id, now_timestamp, CrawlEvent, EventBus};
use crate::fetch::factory::EngineFactory;
use crate::fetch::{FetchDocument, FetchEngine};

/// Normalize a seed into its site root `scheme://host[:port]/`.
///
/// A missing scheme defaults to https; scheme and host are lowercased
/// by URL parsing; path, query and fragment are dropped.
pub fn normalize_seed(seed: &str) -> Result<Url, DiscoveryError> {
    let invalid = |reason: String| DiscoveryError::InvalidSeed {
        input: seed.to_string(),
        reason,
    };

    let trimmed = seed.trim();
    if trimmed.is_empty() {
        return Err(invalid("empty input".to_string()));
    }

    let with_scheme = if trimmed.contains("://") {
        trimmed.to_string()
    } else {
        format!("https://{trimmed}")
    };

    let mut parsed = Url::parse(&with_scheme).map_err(|e| invalid(e.to_string()))?;

    if parsed.scheme() != "http" && parsed.scheme() != "https" {
        return Err(invalid(format!("unsupported scheme `{}`", parsed.scheme())));
    }
    if parsed.host_str().map_or(true, str::is_empty) {
        return Err(invalid("missing host".to_string()));
    }

    parsed.set_path("/");
    parsed.set_query(None);
    parsed.set_fragment(None);
    Ok(parsed)
}

/// Runs bounded breadth-first discovery over engines built by its
/// factory, emitting progress on an event bus.
pub struct Discoverer {
    factory: EngineFactory,
    events: EventBus,
}

impl Discoverer {
    pub fn new(factory: EngineFactory) -> Self {
        Discoverer {
            factory,
            events: EventBus::default(),
        }
    }

    /// Subscribe point for run progress events.
    pub fn events(&self) -> &EventBus {
        &self.events
    }

    /// Discover URLs reachable from `seed` within the configured bounds.
    pub async fn discover(
        &self,
        seed: &str,
        options: &DiscoveryOptions,
    ) -> Result<DiscoveryResult, DiscoveryError> {
        self.discover_with_cancel(seed, options, &CancelFlag::new())
            .await
    }

    /// Like [`discover`](Self::discover), but stops at the next depth
    /// boundary once `cancel` is set. In-flight fetches finish and the
    /// partial result is returned.
    pub async fn discover_with_cancel(
        &self,
        seed: &str,
        options: &DiscoveryOptions,
        cancel: &CancelFlag,
    ) -> Result<DiscoveryResult, DiscoveryError> {
        let started = Instant::now();
        let run_id = new_run_id();

        let root = normalize_seed(seed)?;
        let root_str = root.to_string();

        // The run's proxy applies to every fetch unless the fetch
        // overrides already carry one.
        let mut fetch_opts = options.fetch.clone();
        if fetch_opts.proxy.is_none() {
            fetch_opts.proxy = options.proxy.clone();
        }
        let engine = self.factory.build(options.engine, Some(&fetch_opts), None)?;

        let mut stats = DiscoveryStats::default();
        let mut urls: Vec<String> = Vec::new();

        if options.max_urls == 0 {
            // Degenerate but legal: nothing to discover, nothing fetched.
            stats.elapsed_ms = started.elapsed().as_millis() as u64;
            return Ok(DiscoveryResult {
                root: root_str,
                urls,
                stats,
            });
        }

        info!(
            "discovery started: root={root_str} engine={} max_depth={} max_urls={}",
            options.engine, options.max_depth, options.max_urls
        );
        self.events.emit(CrawlEvent::DiscoveryStarted {
            run_id: run_id.clone(),
            root: root_str.clone(),
            max_depth: options.max_depth,
            max_urls: options.max_urls,
            timestamp: now_timestamp(),
        });

        // Visited means fetched or enqueued; the root is both.
        let mut visited: HashSet<String> = HashSet::new();
        visited.insert(root_str.clone());
        urls.push(root_str.clone());

        let mut frontier: Vec<Url> = vec![root.clone()];
        let mut depth: u32 = 0;
        let concurrency = options.concurrency.max(1);

        while !frontier.is_empty() {
            if cancel.is_cancelled() {
                info!("discovery cancelled at depth {depth} with {} urls", urls.len());
                break;
            }

            let level_started = Instant::now();
            self.events.emit(CrawlEvent::DepthStarted {
                run_id: run_id.clone(),
                depth,
                frontier: frontier.len(),
            });

            // Fetch the whole level in parallel. `buffered` (not
            // unordered) keeps results in frontier order, which keeps
            // discovery order deterministic for a static site.
            let engine_ref: &dyn FetchEngine = engine.as_ref();
            let docs: Vec<FetchDocument> = stream::iter(frontier.iter())
                .map(|url| async move { engine_ref.fetch(url.as_str(), None).await })
                .buffered(concurrency)
                .collect()
                .await;

            stats.max_depth_reached = depth;
            // Count the fetches themselves; a cap hit mid-level stops
            // processing, not the already-issued requests.
            stats.pages_visited += docs.len();

            let mut next: Vec<Url> = Vec::new();
            'level: for (page_url, doc) in frontier.iter().zip(docs.iter()) {
                self.events.emit(CrawlEvent::PageVisited {
                    run_id: run_id.clone(),
                    url: doc.url.clone(),
                    status: doc.status,
                    success: doc.meta.success,
                });

                if !doc.is_crawled() {
                    stats.fetch_failures += 1;
                    let reason = doc
                        .meta
                        .error
                        .clone()
                        .unwrap_or_else(|| format!("HTTP {}", doc.status));

                    if depth == 0 {
                        self.events.emit(CrawlEvent::DiscoveryFailed {
                            run_id: run_id.clone(),
                            root: root_str.clone(),
                            error: reason.clone(),
                            elapsed_ms: started.elapsed().as_millis() as u64,
                        });
                        return Err(DiscoveryError::RootUnreachable {
                            root: root_str,
                            reason,
                        });
                    }

                    warn!("fetch failed for {page_url}: {reason}");
                    continue;
                }

                let html = match doc.html.as_deref() {
                    Some(h) => h,
                    None => continue,
                };

                for link in extract_links(html, page_url) {
                    stats.links_seen += 1;

                    if is_excluded_extension(&link, &options.excluded_extensions)
                        || (options.same_domain_only && !same_site(&link, &root))
                    {
                        stats.links_filtered += 1;
                        continue;
                    }

                    let link_str = link.to_string();
                    if visited.contains(&link_str) {
                        continue;
                    }
                    // Links past the depth bound are not discovered at
                    // all; the final level is fetched only to be counted.
                    if depth + 1 > options.max_depth {
                        continue;
                    }
                    if urls.len() >= options.max_urls {
                        break 'level;
                    }

                    visited.insert(link_str.clone());
                    urls.push(link_str);
                    next.push(link);
                }
            }

            self.events.emit(CrawlEvent::DepthComplete {
                run_id: run_id.clone(),
                depth,
                discovered: urls.len(),
                elapsed_ms: level_started.elapsed().as_millis() as u64,
            });
            info!(
                "depth {depth} complete: fetched={} discovered={}",
                frontier.len(),
                urls.len()
            );

            if urls.len() >= options.max_urls {
                break;
            }
            frontier = next;
            depth += 1;
        }

        stats.elapsed_ms = started.elapsed().as_millis() as u64;
        self.events.emit(CrawlEvent::DiscoveryComplete {
            run_id,
            root: root_str.clone(),
            url_count: urls.len(),
            pages_visited: stats.pages_visited,
            elapsed_ms: stats.elapsed_ms,
            timestamp: now_timestamp(),
        });
        info!(
            "discovery complete: root={root_str} urls={} visited={} failures={} in {}ms",
            urls.len(),
            stats.pages_visited,
            stats.fetch_failures,
            stats.elapsed_ms
        );

        Ok(DiscoveryResult {
            root: root_str,
            urls,
            stats,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_adds_https_and_reduces_to_root() {
        let root = normalize_seed("example.com/some/path?q=1#frag").unwrap();
        assert_eq!(root.as_str(), "https://example.com/");
    }

    #[test]
    fn test_normalize_keeps_explicit_scheme_and_port() {
        let root = normalize_seed("http://example.com:8080/deep/page").unwrap();
        assert_eq!(root.as_str(), "http://example.com:8080/");
    }

    #[test]
    fn test_normalize_lowercases_scheme_and_host() {
        let root = normalize_seed("HTTP://EXAMPLE.COM/Path").unwrap();
        assert_eq!(root.as_str(), "http://example.com/");
    }

    #[test]
    fn test_normalize_rejects_bad_seeds() {
        assert!(normalize_seed("").is_err());
        assert!(normalize_seed("   ").is_err());
        assert!(normalize_seed("ftp://example.com/").is_err());
        assert!(normalize_seed("https://").is_err());

        let err = normalize_seed("ftp://example.com/").unwrap_err();
        assert!(matches!(err, DiscoveryError::InvalidSeed { .. }));
    }

    #[test]
    fn test_discoverer_exposes_event_bus() {
        let discoverer = Discoverer::new(EngineFactory::new());
        let _rx = discoverer.events().subscribe();
    }
}
