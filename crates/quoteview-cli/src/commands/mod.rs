mod serve;
mod show;

use std::process::ExitCode;
use std::sync::Arc;

use quoteview_core::{FinnhubAdapter, HttpClient, NoopHttpClient, ReqwestHttpClient, YahooAdapter};
use tracing::debug;

use crate::cli::{Cli, Command};
use crate::error::CliError;

/// Provider adapters configured from global flags.
pub struct Providers {
    pub yahoo: Arc<YahooAdapter>,
    pub finnhub: Arc<FinnhubAdapter>,
}

impl Providers {
    pub fn from_cli(cli: &Cli) -> Self {
        let http_client: Arc<dyn HttpClient> = if cli.mock {
            Arc::new(NoopHttpClient)
        } else {
            Arc::new(ReqwestHttpClient::new())
        };
        debug!(mock = cli.mock, timeout_ms = cli.timeout_ms, "building providers");

        let timeout = cli.fetch_timeout();
        Self {
            yahoo: Arc::new(
                YahooAdapter::with_http_client(http_client.clone()).with_request_timeout(timeout),
            ),
            finnhub: Arc::new(
                FinnhubAdapter::with_http_client(http_client, cli.finnhub_api_key.clone())
                    .with_request_timeout(timeout),
            ),
        }
    }
}

pub async fn run(cli: &Cli) -> Result<ExitCode, CliError> {
    let providers = Providers::from_cli(cli);

    match &cli.command {
        Command::Serve(args) => serve::run(args, providers, cli.fetch_timeout()).await,
        Command::Show(args) => show::run(args, providers, cli.fetch_timeout()).await,
    }
}
