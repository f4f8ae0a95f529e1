// Copyright 2026 Siterover Contributors
// SPDX-License-Identifier: Apache-2.0

//! Siterover event bus — typed progress events from discovery runs.
//!
//! The EventBus is a `tokio::sync::broadcast` channel that carries
//! [`CrawlEvent`] values. Any consumer — an embedding service, a progress
//! UI, log files — can subscribe independently. When no subscribers
//! exist, events are silently dropped (zero overhead).

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Every event a discovery run emits. Serialized to JSON for embedders.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum CrawlEvent {
    /// A discovery run has started.
    DiscoveryStarted {
        run_id: String,
        root: String,
        max_depth: u32,
        max_urls: usize,
        timestamp: String,
    },
    /// A depth level is about to be fetched.
    DepthStarted {
        run_id: String,
        depth: u32,
        frontier: usize,
    },
    /// A single page fetch finished (success or failure).
    PageVisited {
        run_id: String,
        url: String,
        status: u16,
        success: bool,
    },
    /// A depth level finished processing.
    DepthComplete {
        run_id: String,
        depth: u32,
        discovered: usize,
        elapsed_ms: u64,
    },
    /// Discovery completed successfully.
    DiscoveryComplete {
        run_id: String,
        root: String,
        url_count: usize,
        pages_visited: usize,
        elapsed_ms: u64,
        timestamp: String,
    },
    /// Discovery aborted with an error.
    DiscoveryFailed {
        run_id: String,
        root: String,
        error: String,
        elapsed_ms: u64,
    },
}

/// The event bus for discovery runs.
///
/// The discoverer emits events through this bus. Consumers subscribe
/// to receive a stream of all events.
pub struct EventBus {
    sender: broadcast::Sender<CrawlEvent>,
}

impl EventBus {
    /// Create a new event bus with the given buffer capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Emit an event to all subscribers. Silently ignores if no subscribers.
    pub fn emit(&self, event: CrawlEvent) {
        let _ = self.sender.send(event);
    }

    /// Subscribe to receive all future events.
    pub fn subscribe(&self) -> broadcast::Receiver<CrawlEvent> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}

/// Check if an event belongs to a specific run.
pub fn event_matches_run(event: &CrawlEvent, run_id: &str) -> bool {
    match event {
        CrawlEvent::DiscoveryStarted { run_id: r, .. }
        | CrawlEvent::DepthStarted { run_id: r, .. }
        | CrawlEvent::PageVisited { run_id: r, .. }
        | CrawlEvent::DepthComplete { run_id: r, .. }
        | CrawlEvent::DiscoveryComplete { run_id: r, .. }
        | CrawlEvent::DiscoveryFailed { run_id: r, .. } => r == run_id,
    }
}

/// Fresh run identifier for a discovery run.
pub fn new_run_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// RFC 3339 timestamp for the current time.
pub fn now_timestamp() -> String {
    chrono::Utc::now().to_rfc3339()
}
