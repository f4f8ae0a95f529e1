// Copyright 2026 Siterover Contributors
// SPDX-License-Identifier: Apache-2.0

use anyhow::Result;
use clap::{Parser, Subcommand};

use siterover::cli;

#[derive(Parser)]
#[command(
    name = "siterover",
    about = "Siterover — bounded breadth-first site discovery over pluggable fetch engines",
    version,
    after_help = "Run 'siterover <command> --help' for details on each command."
)]
struct Cli {
    /// Output results as JSON (machine-readable)
    #[arg(long, global = true)]
    json: bool,

    /// Suppress non-essential output
    #[arg(long, short, global = true)]
    quiet: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch a single page into a normalized markdown document
    Fetch {
        /// URL to fetch
        url: String,
        /// Engine to use (http, browser)
        #[arg(long, default_value = "http")]
        engine: String,
        /// Proxy endpoint (scheme://[user:pass@]host:port)
        #[arg(long)]
        proxy: Option<String>,
        /// Per-attempt timeout in milliseconds
        #[arg(long)]
        timeout_ms: Option<u64>,
        /// Total attempts per fetch
        #[arg(long)]
        retries: Option<u32>,
        /// Post-load settle time for the browser engine (ms)
        #[arg(long)]
        render_wait_ms: Option<u64>,
        /// Print only the markdown payload
        #[arg(long)]
        markdown_only: bool,
    },
    /// Walk a site breadth-first and list discovered URLs
    Discover {
        /// Seed URL; scheme optional, reduced to the site root
        seed: String,
        /// Engine to use (http, browser)
        #[arg(long, default_value = "http")]
        engine: String,
        /// How deep to expand; the seed is depth 0
        #[arg(long, default_value = "1")]
        max_depth: u32,
        /// Stop after this many URLs
        #[arg(long, default_value = "200")]
        max_urls: usize,
        /// Proxy endpoint (scheme://[user:pass@]host:port)
        #[arg(long)]
        proxy: Option<String>,
        /// Replace the default excluded-extension list (repeatable)
        #[arg(long = "exclude-ext")]
        exclude_ext: Vec<String>,
        /// Parallel fetches per depth level
        #[arg(long, default_value = "20")]
        concurrency: usize,
        /// Per-attempt timeout in milliseconds
        #[arg(long)]
        timeout_ms: Option<u64>,
        /// Total attempts per fetch
        #[arg(long)]
        retries: Option<u32>,
        /// Follow links off the seed's domain too
        #[arg(long)]
        all_domains: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set output-mode flags via environment variables so all modules can
    // check them without plumbing.
    if cli.json {
        std::env::set_var("SITEROVER_JSON", "1");
    }
    if cli.quiet {
        std::env::set_var("SITEROVER_QUIET", "1");
    }

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&cli.log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Commands::Fetch {
            url,
            engine,
            proxy,
            timeout_ms,
            retries,
            render_wait_ms,
            markdown_only,
        } => {
            cli::fetch_cmd::run(
                &url,
                &engine,
                proxy.as_deref(),
                timeout_ms,
                retries,
                render_wait_ms,
                markdown_only,
            )
            .await
        }
        Commands::Discover {
            seed,
            engine,
            max_depth,
            max_urls,
            proxy,
            exclude_ext,
            concurrency,
            timeout_ms,
            retries,
            all_domains,
        } => {
            cli::discover_cmd::run(
                &seed,
                &engine,
                max_depth,
                max_urls,
                proxy.as_deref(),
                &exclude_ext,
                concurrency,
                timeout_ms,
                retries,
                all_domains,
            )
            .await
        }
    };

    // Consistent exit codes: 0=success, 1=error
    if let Err(e) = &result {
        if !cli::output::is_quiet() && !cli::output::is_json() {
            eprintln!("Error: {e:#}");
        }
        if cli::output::is_json() {
            cli::output::print_json(&serde_json::json!({
                "error": true,
                "message": format!("{e:#}"),
            }));
        }
        std::process::exit(1);
    }

    result
}
