use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;
use tracing::{info, warn};

use super::Providers;
use crate::cli::ServeArgs;
use crate::error::CliError;
use crate::server::{self, AppState};

pub async fn run(
    args: &ServeArgs,
    providers: Providers,
    fetch_timeout: Duration,
) -> Result<ExitCode, CliError> {
    let state = Arc::new(AppState {
        quotes: providers.yahoo.clone(),
        candles: providers.yahoo.clone(),
        search: providers.finnhub,
        fetch_timeout,
    });

    let listener = TcpListener::bind(args.bind)
        .await
        .map_err(|source| CliError::Bind {
            addr: args.bind,
            source,
        })?;
    info!(
        addr = %args.bind,
        offline = providers.yahoo.is_offline(),
        timeout_ms = fetch_timeout.as_millis() as u64,
        "quoteview listening"
    );

    axum::serve(listener, server::router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("server stopped");
    Ok(ExitCode::SUCCESS)
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("shutdown requested"),
        Err(error) => {
            warn!(error = %error, "ctrl-c handler unavailable, serving until killed");
            std::future::pending::<()>().await;
        }
    }
}
