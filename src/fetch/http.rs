//! Plain-HTTP fetch engine wrapping reqwest.
//!
//! Not a browser — just HTTP requests. Handles redirects, per-attempt
//! timeouts, retry on transient statuses, and a one-shot relaxed-TLS
//! fallback for servers stuck on legacy renegotiation.

use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, warn};

use super::factory::parse_proxy_endpoint;
use super::{
    backoff_delay, is_retryable_status, EngineKind, FetchDocument, FetchEngine, FetchOptions,
    ResolvedFetchOptions, TimeoutSchedule, NETWORK_FAILURE_STATUS,
};
use crate::error::EngineError;

const MAX_REDIRECTS: usize = 5;

/// Error-chain markers that identify a renegotiation-class TLS failure.
/// Matched case-insensitively against every error in the `source()` chain.
const LEGACY_TLS_MARKERS: &[&str] = &[
    "unsafe legacy renegotiation",
    "legacy_server_connect",
    "renegotiation",
    "handshake failure",
    "handshakefailure",
    "peer is incompatible",
];

/// HTTP fetch engine. Cheap to clone; both clients share connection pools.
#[derive(Clone)]
pub struct HttpEngine {
    options: ResolvedFetchOptions,
    clients: ClientPair,
}

/// Primary strict-TLS client plus a relaxed fallback client for servers
/// that still require legacy TLS renegotiation. rustls has no
/// renegotiation toggle, so the fallback drops certificate verification
/// instead; it is only ever used after a renegotiation-class failure.
#[derive(Clone)]
struct ClientPair {
    primary: reqwest::Client,
    relaxed: reqwest::Client,
}

impl ClientPair {
    fn build(timeout_ms: u64, proxy: Option<&str>) -> Result<ClientPair, EngineError> {
        let primary = Self::builder(timeout_ms, proxy)?.build()?;
        let relaxed = Self::builder(timeout_ms, proxy)?
            .danger_accept_invalid_certs(true)
            .build()?;
        Ok(ClientPair { primary, relaxed })
    }

    fn builder(
        timeout_ms: u64,
        proxy: Option<&str>,
    ) -> Result<reqwest::ClientBuilder, EngineError> {
        let mut builder = reqwest::Client::builder()
            .timeout(Duration::from_millis(timeout_ms))
            .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS));

        if let Some(endpoint) = proxy {
            let parsed = parse_proxy_endpoint(endpoint)?;
            let proxy = reqwest::Proxy::all(parsed.as_str()).map_err(|e| {
                EngineError::InvalidProxy {
                    endpoint: endpoint.to_string(),
                    reason: e.to_string(),
                }
            })?;
            builder = builder.proxy(proxy);
        }

        Ok(builder)
    }
}

impl HttpEngine {
    /// Build the engine from fully-resolved options. Fails fast on an
    /// invalid proxy endpoint, before any network activity.
    pub fn new(options: ResolvedFetchOptions) -> Result<Self, EngineError> {
        let clients = ClientPair::build(options.timeout_ms, options.proxy.as_deref())?;
        Ok(HttpEngine { options, clients })
    }

    async fn attempt(
        &self,
        clients: &ClientPair,
        url: &str,
        resolved: &ResolvedFetchOptions,
        timeout_ms: u64,
        legacy_available: &mut bool,
    ) -> FetchDocument {
        match self.send(&clients.primary, url, resolved, timeout_ms).await {
            Ok(doc) => doc,
            Err(err) if *legacy_available && is_legacy_tls_error(&err) => {
                // One-shot downgrade per fetch call, regardless of how
                // many attempts remain.
                *legacy_available = false;
                warn!("legacy TLS fallback for {url}: {err}");

                match self.send(&clients.relaxed, url, resolved, timeout_ms).await {
                    Ok(mut doc) => {
                        doc.meta.used_legacy_tls = true;
                        doc
                    }
                    // A failed fallback is an ordinary transport failure;
                    // the flag marks documents obtained over downgraded
                    // TLS, not downgrade attempts.
                    Err(fallback_err) => FetchDocument::failure(
                        url,
                        NETWORK_FAILURE_STATUS,
                        error_chain_text(&fallback_err),
                    ),
                }
            }
            Err(err) => {
                FetchDocument::failure(url, NETWORK_FAILURE_STATUS, error_chain_text(&err))
            }
        }
    }

    async fn send(
        &self,
        client: &reqwest::Client,
        url: &str,
        resolved: &ResolvedFetchOptions,
        timeout_ms: u64,
    ) -> Result<FetchDocument, reqwest::Error> {
        let response = client
            .get(url)
            .headers(header_map(&resolved.headers))
            .timeout(Duration::from_millis(timeout_ms))
            .send()
            .await?;

        let status = response.status().as_u16();
        if (200..400).contains(&status) {
            let body = response.text().await.unwrap_or_default();
            Ok(FetchDocument::from_markup(url, status, body))
        } else {
            let reason = response
                .status()
                .canonical_reason()
                .unwrap_or("unknown status");
            Ok(FetchDocument::failure(
                url,
                status,
                format!("HTTP {status} {reason}"),
            ))
        }
    }
}

#[async_trait]
impl FetchEngine for HttpEngine {
    async fn fetch(&self, url: &str, options: Option<&FetchOptions>) -> FetchDocument {
        let resolved = match options {
            Some(overrides) => self.options.overridden_with(overrides),
            None => self.options.clone(),
        };

        // A per-call proxy override needs its own client pair. A broken
        // override is a configuration failure, not a transient one, so it
        // gets no attempts at all.
        let clients = if resolved.proxy == self.options.proxy {
            self.clients.clone()
        } else {
            match ClientPair::build(resolved.timeout_ms, resolved.proxy.as_deref()) {
                Ok(pair) => pair,
                Err(err) => {
                    return FetchDocument::failure(url, NETWORK_FAILURE_STATUS, err.to_string())
                }
            }
        };

        let mut legacy_available = true;
        let mut last: Option<FetchDocument> = None;

        for attempt in 0..resolved.retries {
            let timeout_ms = TimeoutSchedule::Fixed.timeout_for(resolved.timeout_ms, attempt);

            let mut doc = self
                .attempt(&clients, url, &resolved, timeout_ms, &mut legacy_available)
                .await;
            doc.meta.timeout_ms = Some(timeout_ms);

            if !is_retryable_status(doc.status) {
                return doc;
            }

            debug!(
                "fetch attempt {attempt} for {url} failed with status {}",
                doc.status
            );
            last = Some(doc);

            if attempt + 1 < resolved.retries {
                tokio::time::sleep(backoff_delay(attempt)).await;
            }
        }

        last.unwrap_or_else(|| {
            FetchDocument::failure(url, NETWORK_FAILURE_STATUS, "no attempts executed")
        })
    }

    fn kind(&self) -> EngineKind {
        EngineKind::Http
    }
}

/// Convert the resolved header map, skipping entries reqwest rejects.
fn header_map(headers: &std::collections::HashMap<String, String>) -> reqwest::header::HeaderMap {
    use reqwest::header::{HeaderName, HeaderValue};

    let mut map = reqwest::header::HeaderMap::new();
    for (name, value) in headers {
        match (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            (Ok(n), Ok(v)) => {
                map.insert(n, v);
            }
            _ => warn!("skipping invalid header `{name}`"),
        }
    }
    map
}

/// Walk the `source()` chain looking for renegotiation-class TLS markers.
fn is_legacy_tls_error(err: &(dyn std::error::Error + 'static)) -> bool {
    let mut current: Option<&(dyn std::error::Error + 'static)> = Some(err);
    while let Some(e) = current {
        let text = e.to_string().to_ascii_lowercase();
        if LEGACY_TLS_MARKERS.iter().any(|m| text.contains(m)) {
            return true;
        }
        current = e.source();
    }
    false
}

/// Full error text including every cause in the chain.
fn error_chain_text(err: &(dyn std::error::Error + 'static)) -> String {
    let mut text = err.to_string();
    let mut source = err.source();
    while let Some(s) = source {
        text.push_str(": ");
        text.push_str(&s.to_string());
        source = s.source();
    }
    text
}
