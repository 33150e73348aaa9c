//! Query orchestration: credential gate → completion filter → cache probe →
//! backend call → cache fill.
//!
//! Each incoming input-changed event is resolved independently; the caches
//! are the only state shared between queries. No retries — the next
//! keystroke event supersedes a failed attempt.

use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info, warn};

use super::cache::{compute_key, MemoryCache, MEMORY_CACHE_CAPACITY, RETENTION_HORIZON};
use super::sqlite_cache::SqliteCache;
use super::{Decision, FailureKind, TranslationBackend, WaitingReason};
use crate::config::Settings;
use crate::filter;
use crate::metrics::{metric_names, MetricsRegistry};

/// Resolves raw launcher input into a per-query [`Decision`].
pub struct Resolver {
    backend: Arc<dyn TranslationBackend>,
    memory: MemoryCache,
    durable: Option<SqliteCache>,
    metrics: Arc<MetricsRegistry>,
}

impl Resolver {
    /// Build a resolver with the default 24-hour retention horizon.
    /// `durable` is None when the cache database could not be opened; the
    /// resolver then treats every lookup as a miss.
    pub fn new(
        backend: Arc<dyn TranslationBackend>,
        durable: Option<SqliteCache>,
        metrics: Arc<MetricsRegistry>,
    ) -> Self {
        Self {
            backend,
            memory: MemoryCache::new(MEMORY_CACHE_CAPACITY, RETENTION_HORIZON),
            durable,
            metrics,
        }
    }

    /// Resolve one input-changed event.
    pub async fn resolve(&self, text: &str, settings: &Settings) -> Decision {
        let request_id = uuid::Uuid::new_v4().to_string();
        let start = Instant::now();

        let decision = self.resolve_inner(&request_id, text, settings).await;

        self.metrics.record(
            metric_names::RESOLVE,
            start.elapsed().as_micros() as f64,
        );
        decision
    }

    async fn resolve_inner(&self, request_id: &str, text: &str, settings: &Settings) -> Decision {
        if !settings.has_credential() {
            return Decision::Failed {
                kind: FailureKind::ConfigMissing,
                message: "API key not configured".to_string(),
            };
        }

        let filter_start = Instant::now();
        let ready = filter::should_translate(text);
        self.metrics.record(
            metric_names::FILTER_DECIDE,
            filter_start.elapsed().as_micros() as f64,
        );

        if !ready {
            let reason = if text.trim().is_empty() {
                WaitingReason::Empty
            } else {
                WaitingReason::StillTyping
            };
            debug!(request_id, reason = ?reason, "input not ready");
            return Decision::Waiting(reason);
        }

        let key = compute_key(text, &settings.model, &settings.prompt);

        let lookup_start = Instant::now();
        let cached = self.lookup(&key);
        self.metrics.record(
            metric_names::CACHE_LOOKUP,
            lookup_start.elapsed().as_micros() as f64,
        );

        if let Some(translated) = cached {
            info!(request_id, "cache hit");
            return Decision::Translated {
                text: translated,
                from_cache: true,
            };
        }

        let backend_start = Instant::now();
        let result = self.backend.translate(text, settings).await;
        self.metrics.record(
            metric_names::BACKEND_CALL,
            backend_start.elapsed().as_micros() as f64,
        );

        match result {
            Ok(translated) => {
                self.store(&key, &translated);
                info!(
                    request_id,
                    elapsed_ms = backend_start.elapsed().as_millis() as u64,
                    "translated via backend"
                );
                Decision::Translated {
                    text: translated,
                    from_cache: false,
                }
            }
            Err(e) => {
                warn!(request_id, error = %e, "backend call failed");
                Decision::Failed {
                    kind: e.kind(),
                    message: e.to_string(),
                }
            }
        }
    }

    /// Probe the memory tier, then the durable tier. A durable hit
    /// repopulates the memory tier for subsequent queries in this process.
    fn lookup(&self, key: &super::cache::CacheKey) -> Option<String> {
        if let Some(text) = self.memory.get(key) {
            return Some(text);
        }
        let text = self.durable.as_ref()?.get(key)?;
        self.memory.insert(*key, text.clone());
        Some(text)
    }

    fn store(&self, key: &super::cache::CacheKey, translated: &str) {
        if let Some(durable) = &self.durable {
            durable.insert(key, translated);
        }
        self.memory.insert(*key, translated.to_string());
    }
}
