//! Request-cycle state machine behind the quote/chart view.
//!
//! Every parameter change starts a new cycle with a strictly increasing id.
//! The id is bumped and later compared while holding the `watch` channel's
//! write lock, so only the most recently started cycle can publish its
//! result; a slower earlier cycle resolves as [`CycleOutcome::Superseded`].

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::data_source::{with_timeout, CandleProvider, CandlesRequest, QuoteProvider};
use crate::normalize::{normalize_candles, normalize_quote};
use crate::{
    CandleSeries, CoreError, ErrorClass, Quote, RangeSelection, Symbol, UtcDateTime,
    ValidationError,
};

const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrchestratorConfig {
    /// Upper bound for each outbound fetch.
    pub fetch_timeout: Duration,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CyclePhase {
    #[default]
    Idle,
    Loading,
    Success,
    Failed,
}

/// Error surfaced to the view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ViewError {
    pub class: ErrorClass,
    pub message: String,
    pub detail: String,
    /// Offer a retry only when the failure is transient.
    pub retryable: bool,
}

impl From<&CoreError> for ViewError {
    fn from(error: &CoreError) -> Self {
        let class = error.class();
        Self {
            class,
            message: class.user_message().to_owned(),
            detail: error.to_string(),
            retryable: error.retryable(),
        }
    }
}

/// Everything the view renders. Replaced as a unit per published update.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ViewState {
    /// Id of the most recently started cycle.
    pub cycle: u64,
    /// Most recently requested symbol, which may still be loading.
    pub symbol: Option<Symbol>,
    pub range: RangeSelection,
    pub phase: CyclePhase,
    pub quote: Option<Quote>,
    pub series: CandleSeries,
    pub error: Option<ViewError>,
    /// Symbol the displayed quote and series belong to.
    #[serde(skip)]
    loaded_symbol: Option<Symbol>,
}

impl ViewState {
    pub fn is_loading(&self) -> bool {
        self.phase == CyclePhase::Loading
    }

    pub fn loaded_symbol(&self) -> Option<&Symbol> {
        self.loaded_symbol.as_ref()
    }
}

/// How one call to [`DataFetchOrchestrator::on_parameters_changed`] ended.
#[derive(Debug, Clone, PartialEq)]
pub enum CycleOutcome {
    Success { cycle: u64 },
    Failed { cycle: u64, error: CoreError },
    /// A newer cycle started first; nothing was published.
    Superseded { cycle: u64 },
}

impl CycleOutcome {
    pub const fn cycle(&self) -> u64 {
        match self {
            Self::Success { cycle } | Self::Failed { cycle, .. } | Self::Superseded { cycle } => {
                *cycle
            }
        }
    }
}

/// Sole writer of the view's quote and candle series.
pub struct DataFetchOrchestrator {
    quotes: Arc<dyn QuoteProvider>,
    candles: Arc<dyn CandleProvider>,
    config: OrchestratorConfig,
    state: watch::Sender<ViewState>,
}

impl DataFetchOrchestrator {
    pub fn new(
        quotes: Arc<dyn QuoteProvider>,
        candles: Arc<dyn CandleProvider>,
        config: OrchestratorConfig,
    ) -> Self {
        let (state, _) = watch::channel(ViewState::default());
        Self {
            quotes,
            candles,
            config,
            state,
        }
    }

    pub fn config(&self) -> OrchestratorConfig {
        self.config
    }

    pub fn subscribe(&self) -> watch::Receiver<ViewState> {
        self.state.subscribe()
    }

    pub fn snapshot(&self) -> ViewState {
        self.state.borrow().clone()
    }

    /// Validate free-text symbol input and start a cycle for it. Invalid input
    /// is rejected before any fetch and leaves the view untouched.
    pub async fn submit_symbol(
        &self,
        input: &str,
        range: RangeSelection,
    ) -> Result<CycleOutcome, ValidationError> {
        let symbol = Symbol::parse(input)?;
        Ok(self.on_parameters_changed(symbol, range).await)
    }

    /// Re-issue the last requested parameters as a fresh cycle.
    pub async fn retry(&self) -> Option<CycleOutcome> {
        let (symbol, range) = {
            let state = self.state.borrow();
            (state.symbol.clone()?, state.range)
        };
        Some(self.on_parameters_changed(symbol, range).await)
    }

    /// Run one request cycle for `(symbol, range)`.
    ///
    /// Quote and candles are fetched concurrently, each bounded by
    /// `fetch_timeout`. Errors never escape: they are published as
    /// [`CyclePhase::Failed`] and returned in the outcome.
    pub async fn on_parameters_changed(
        &self,
        symbol: Symbol,
        range: RangeSelection,
    ) -> CycleOutcome {
        let cycle = self.begin(&symbol, range);
        let window = range.resolve();
        let request = CandlesRequest::for_window(symbol.clone(), window, UtcDateTime::now());
        debug!(
            cycle,
            symbol = %symbol,
            days = window.days,
            interval = %window.interval,
            "cycle started"
        );

        let limit = self.config.fetch_timeout;
        let (quote, candles) = tokio::join!(
            with_timeout("quote fetch", limit, self.quotes.get_quote(&symbol)),
            with_timeout("candle fetch", limit, self.candles.get_candles(&request)),
        );

        let result = quote
            .and_then(|quote| candles.map(|candles| (quote, candles)))
            .map_err(CoreError::from)
            .and_then(|(quote, candles)| {
                let quote = normalize_quote(&symbol, quote)?;
                Ok((quote, normalize_candles(candles)))
            });

        self.finish(cycle, &symbol, result)
    }

    fn begin(&self, symbol: &Symbol, range: RangeSelection) -> u64 {
        let mut cycle = 0;
        self.state.send_modify(|state| {
            state.cycle += 1;
            cycle = state.cycle;
            state.symbol = Some(symbol.clone());
            state.range = range;
            state.phase = CyclePhase::Loading;
            state.error = None;
        });
        cycle
    }

    fn finish(
        &self,
        cycle: u64,
        symbol: &Symbol,
        result: Result<(Quote, CandleSeries), CoreError>,
    ) -> CycleOutcome {
        let mut outcome = CycleOutcome::Superseded { cycle };

        self.state.send_if_modified(|state| {
            if state.cycle != cycle {
                return false;
            }

            match result {
                Ok((quote, series)) => {
                    info!(
                        cycle,
                        symbol = %symbol,
                        candles = series.len(),
                        price = quote.price,
                        "cycle succeeded"
                    );
                    state.phase = CyclePhase::Success;
                    state.quote = Some(quote);
                    state.series = series;
                    state.error = None;
                    state.loaded_symbol = Some(symbol.clone());
                    outcome = CycleOutcome::Success { cycle };
                }
                Err(error) => {
                    warn!(
                        cycle,
                        symbol = %symbol,
                        class = %error.class(),
                        error = %error,
                        "cycle failed"
                    );
                    if state.loaded_symbol.as_ref() != Some(symbol) {
                        state.quote = None;
                        state.series = CandleSeries::empty();
                        state.loaded_symbol = None;
                    }
                    state.phase = CyclePhase::Failed;
                    state.error = Some(ViewError::from(&error));
                    outcome = CycleOutcome::Failed { cycle, error };
                }
            }
            true
        });

        if let CycleOutcome::Superseded { cycle } = outcome {
            debug!(cycle, symbol = %symbol, "discarding superseded cycle result");
        }
        outcome
    }
}
