//! Debounced symbol autocomplete.
//!
//! Runs beside the orchestrator and never touches its state. A newer query
//! supersedes any query still waiting on its debounce or on the provider.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use crate::data_source::{SearchProvider, SourceError};
use crate::SearchResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchConfig {
    pub debounce: Duration,
    /// Shorter queries produce no suggestions and no provider call.
    pub min_query_len: usize,
    pub max_suggestions: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(250),
            min_query_len: 2,
            max_suggestions: 6,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchOutcome {
    Suggestions(Vec<SearchResult>),
    /// A newer query arrived first; its result is the one to display.
    Superseded,
}

impl SearchOutcome {
    pub fn suggestions(&self) -> &[SearchResult] {
        match self {
            Self::Suggestions(results) => results,
            Self::Superseded => &[],
        }
    }
}

pub struct SymbolSearch {
    provider: Arc<dyn SearchProvider>,
    config: SearchConfig,
    generation: AtomicU64,
}

impl SymbolSearch {
    pub fn new(provider: Arc<dyn SearchProvider>, config: SearchConfig) -> Self {
        Self {
            provider,
            config,
            generation: AtomicU64::new(0),
        }
    }

    /// Suggestions for free-text `input`, upper-cased before lookup.
    pub async fn suggest(&self, input: &str) -> Result<SearchOutcome, SourceError> {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let query = input.trim().to_ascii_uppercase();

        if query.chars().count() < self.config.min_query_len {
            return Ok(SearchOutcome::Suggestions(Vec::new()));
        }

        tokio::time::sleep(self.config.debounce).await;
        if self.is_stale(generation) {
            debug!(query = %query, "search superseded during debounce");
            return Ok(SearchOutcome::Superseded);
        }

        let mut results = self.provider.search(&query).await?;
        if self.is_stale(generation) {
            debug!(query = %query, "discarding superseded search result");
            return Ok(SearchOutcome::Superseded);
        }

        results.truncate(self.config.max_suggestions);
        Ok(SearchOutcome::Suggestions(results))
    }

    fn is_stale(&self, generation: u64) -> bool {
        self.generation.load(Ordering::SeqCst) != generation
    }
}
