//! `siterover fetch <url>` — fetch a single page into a normalized document.

use anyhow::Result;

use crate::cli::output;
use crate::fetch::factory::EngineFactory;
use crate::fetch::{EngineKind, FetchOptions};

/// Run the fetch command. The document is printed whatever the outcome;
/// fetch failures live in its metadata, not in the exit code.
#[allow(clippy::too_many_arguments)]
pub async fn run(
    url: &str,
    engine: &str,
    proxy: Option<&str>,
    timeout_ms: Option<u64>,
    retries: Option<u32>,
    render_wait_ms: Option<u64>,
    markdown_only: bool,
) -> Result<()> {
    let kind: EngineKind = engine.parse().map_err(|e: String| anyhow::anyhow!(e))?;

    let options = FetchOptions {
        proxy: proxy.map(str::to_string),
        headers: None,
        timeout_ms,
        retries,
        render_wait_ms,
    };

    let engine = EngineFactory::new().build(kind, Some(&options), None)?;
    let doc = engine.fetch(url, None).await;

    if output::is_json() {
        output::print_json(&serde_json::to_value(&doc)?);
        return Ok(());
    }

    if !doc.is_crawled() {
        eprintln!(
            "fetch failed: status={} error={}",
            doc.status,
            doc.meta.error.as_deref().unwrap_or("unknown")
        );
    } else if !output::is_quiet() && !markdown_only {
        let tls_note = if doc.meta.used_legacy_tls {
            " (legacy TLS)"
        } else {
            ""
        };
        eprintln!("fetched {} [{}]{tls_note}", doc.url, doc.status);
    }

    if !doc.markdown.is_empty() {
        println!("{}", doc.markdown);
    }

    Ok(())
}
