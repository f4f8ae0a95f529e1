//! `siterover discover <seed>` — walk a site breadth-first and list
//! discovered URLs.

use anyhow::Result;

use crate::cli::output;
use crate::discovery::{Discoverer, DiscoveryOptions};
use crate::fetch::factory::EngineFactory;
use crate::fetch::EngineKind;

/// Run the discover command.
#[allow(clippy::too_many_arguments)]
pub async fn run(
    seed: &str,
    engine: &str,
    max_depth: u32,
    max_urls: usize,
    proxy: Option<&str>,
    exclude_ext: &[String],
    concurrency: usize,
    timeout_ms: Option<u64>,
    retries: Option<u32>,
    all_domains: bool,
) -> Result<()> {
    let kind: EngineKind = engine.parse().map_err(|e: String| anyhow::anyhow!(e))?;

    let mut options = DiscoveryOptions {
        max_depth,
        max_urls,
        proxy: proxy.map(str::to_string),
        engine: kind,
        concurrency,
        same_domain_only: !all_domains,
        ..DiscoveryOptions::default()
    };
    if !exclude_ext.is_empty() {
        options.excluded_extensions = exclude_ext.to_vec();
    }
    options.fetch.timeout_ms = timeout_ms;
    options.fetch.retries = retries;

    let discoverer = Discoverer::new(EngineFactory::new());
    let result = discoverer.discover(seed, &options).await?;

    if output::is_json() {
        output::print_json(&serde_json::to_value(&result)?);
        return Ok(());
    }

    for url in &result.urls {
        println!("{url}");
    }

    if !output::is_quiet() {
        let stats = &result.stats;
        eprintln!(
            "discovered {} urls from {} (visited {}, links seen {}, filtered {}, failures {}, depth {}, {}ms)",
            result.urls.len(),
            result.root,
            stats.pages_visited,
            stats.links_seen,
            stats.links_filtered,
            stats.fetch_failures,
            stats.max_depth_reached,
            stats.elapsed_ms
        );
    }

    Ok(())
}
