//! Cursor readout derived from chart pointer events.

use serde::Serialize;
use tokio::sync::watch;

use crate::{CandleSeries, UtcDateTime};

/// Pointer event emitted by the rendering surface.
///
/// `time` is `None` once the cursor leaves the plot area; otherwise it is a
/// timestamp taken from the series the surface was given.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CursorMoveEvent {
    pub time: Option<i64>,
}

impl CursorMoveEvent {
    pub const fn at(time: i64) -> Self {
        Self { time: Some(time) }
    }

    pub const fn left_plot() -> Self {
        Self { time: None }
    }
}

/// OHLCV readout for the candle under the cursor.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CursorStat {
    /// Raw epoch seconds of the hovered candle.
    pub time: i64,
    pub time_label: String,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: Option<f64>,
    /// Absent when the open is zero or not finite.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delta_percent: Option<f64>,
}

impl CursorStat {
    /// Signed badge text such as `+1.23%`, or `None` when no delta exists.
    pub fn delta_badge(&self) -> Option<String> {
        self.delta_percent.map(|delta| {
            let sign = if delta >= 0.0 { "+" } else { "" };
            format!("{sign}{delta:.2}%")
        })
    }

    pub fn volume_label(&self) -> String {
        format_compact_volume(self.volume)
    }
}

/// Percentage change from open to close; `None` unless open is finite and nonzero.
pub fn delta_percent(open: f64, close: f64) -> Option<f64> {
    if !open.is_finite() || open == 0.0 {
        return None;
    }
    Some((close - open) / open * 100.0).filter(|delta| delta.is_finite())
}

/// Compact volume label (`950`, `1.2K`, `3.4M`, `1.1B`), `—` when unknown.
pub fn format_compact_volume(volume: Option<f64>) -> String {
    const UNITS: [(f64, &str); 4] = [(1e12, "T"), (1e9, "B"), (1e6, "M"), (1e3, "K")];

    let Some(volume) = volume.filter(|value| value.is_finite()) else {
        return String::from("—");
    };

    UNITS
        .iter()
        .find(|(scale, _)| volume.abs() >= *scale)
        .map(|(scale, suffix)| format!("{:.1}{suffix}", volume / scale))
        .unwrap_or_else(|| format!("{volume:.0}"))
}

/// Pure projection of a cursor event onto the loaded series.
pub fn project(event: &CursorMoveEvent, series: &CandleSeries) -> Option<CursorStat> {
    let time = event.time?;
    let candle = series.find(time)?;

    let time_label = UtcDateTime::from_unix(candle.time)
        .map(UtcDateTime::display_label)
        .unwrap_or_else(|_| candle.time.to_string());

    Some(CursorStat {
        time: candle.time,
        time_label,
        open: candle.open,
        high: candle.high,
        low: candle.low,
        close: candle.close,
        volume: candle.volume,
        delta_percent: delta_percent(candle.open, candle.close),
    })
}

/// Publishes the current cursor readout to display-state observers.
#[derive(Debug)]
pub struct CrosshairProjector {
    current: watch::Sender<Option<CursorStat>>,
}

impl Default for CrosshairProjector {
    fn default() -> Self {
        Self::new()
    }
}

impl CrosshairProjector {
    pub fn new() -> Self {
        let (current, _) = watch::channel(None);
        Self { current }
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<CursorStat>> {
        self.current.subscribe()
    }

    pub fn current(&self) -> Option<CursorStat> {
        self.current.borrow().clone()
    }

    /// Project `event` and publish the result. Observers are only woken when
    /// the readout actually changes.
    pub fn on_cursor_move(
        &self,
        event: &CursorMoveEvent,
        series: &CandleSeries,
    ) -> Option<CursorStat> {
        let next = project(event, series);
        self.current.send_if_modified(|current| {
            if *current == next {
                return false;
            }
            current.clone_from(&next);
            true
        });
        next
    }
}
