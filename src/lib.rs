// Copyright 2026 Siterover Contributors
// SPDX-License-Identifier: Apache-2.0

//! Siterover — bounded breadth-first site discovery over pluggable
//! fetch engines.
//!
//! Two layers: a [`fetch`] engine abstraction (plain HTTP or headless
//! Chromium behind one [`FetchEngine`] contract, sharing a retry and
//! fallback policy) and a [`discovery`] loop that expands a seed URL
//! level by level under depth, count and cancellation bounds. Fetch
//! failures are data, not errors: every fetch yields a document whose
//! metadata records the outcome.

pub mod cli;
pub mod discovery;
pub mod error;
pub mod events;
pub mod fetch;
pub mod markdown;

pub use discovery::{CancelFlag, Discoverer, DiscoveryOptions, DiscoveryResult, DiscoveryStats};
pub use error::{DiscoveryError, EngineError};
pub use events::{CrawlEvent, EventBus};
pub use fetch::factory::EngineFactory;
pub use fetch::{EngineKind, FetchDocument, FetchEngine, FetchMeta, FetchOptions};
