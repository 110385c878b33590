use std::io::Write;
use std::process::ExitCode;
use std::time::Duration;

use quoteview_core::{
    CrosshairProjector, CursorMoveEvent, CursorStat, CycleOutcome, DataFetchOrchestrator,
    OrchestratorConfig, ViewState, VolumePoint,
};
use serde::Serialize;
use tracing::info;

use super::Providers;
use crate::cli::ShowArgs;
use crate::error::CliError;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ShowOutput<'a> {
    state: &'a ViewState,
    volume: Vec<VolumePoint>,
    #[serde(skip_serializing_if = "Option::is_none")]
    cursor: Option<CursorView>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CursorView {
    requested: i64,
    stat: Option<CursorStat>,
    delta_badge: Option<String>,
    volume_label: Option<String>,
}

pub async fn run(
    args: &ShowArgs,
    providers: Providers,
    fetch_timeout: Duration,
) -> Result<ExitCode, CliError> {
    let orchestrator = DataFetchOrchestrator::new(
        providers.yahoo.clone(),
        providers.yahoo,
        OrchestratorConfig { fetch_timeout },
    );

    let outcome = orchestrator.submit_symbol(&args.symbol, args.range).await?;
    let state = orchestrator.snapshot();
    info!(cycle = outcome.cycle(), phase = ?state.phase, "load cycle finished");

    let cursor = args.cursor.map(|time| {
        let projector = CrosshairProjector::new();
        let stat = projector.on_cursor_move(&CursorMoveEvent::at(time), &state.series);
        CursorView {
            requested: time,
            delta_badge: stat.as_ref().and_then(CursorStat::delta_badge),
            volume_label: stat.as_ref().map(CursorStat::volume_label),
            stat,
        }
    });

    let output = ShowOutput {
        state: &state,
        volume: state.series.volume_points(),
        cursor,
    };
    let rendered = if args.pretty {
        serde_json::to_string_pretty(&output)?
    } else {
        serde_json::to_string(&output)?
    };

    let mut stdout = std::io::stdout().lock();
    writeln!(stdout, "{rendered}")?;

    match outcome {
        CycleOutcome::Failed { .. } => Ok(ExitCode::from(3)),
        CycleOutcome::Success { .. } | CycleOutcome::Superseded { .. } => Ok(ExitCode::SUCCESS),
    }
}
