//! transfer-stats CLI
//!
//! Fetches URLs concurrently through the instrumented client and optionally
//! appends one transfer line per response to a log file.
//!
//! ```text
//! URLs ──▶ tag `<key>-<n>` ──▶ InstrumentedClient ──▶ drain body
//!                                     │
//!                                     └──▶ transfer log (--log)
//! ```

use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Instant;

use bytes::Bytes;
use clap::Parser;
use futures_util::{stream, StreamExt};
use http::{Request, Uri};
use http_body_util::{BodyExt, Empty};
use serde::Serialize;

use transfer_stats::config::{load_config, validate_config, ClientConfig, ConfigError};
use transfer_stats::observability::{logging, metrics};
use transfer_stats::InstrumentedClient;

#[derive(Parser)]
#[command(name = "transfer-stats")]
#[command(about = "Fetch URLs concurrently and log per-transfer HTTP stats", long_about = None)]
struct Cli {
    /// Configuration file (TOML).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Append the transfer log to this file.
    #[arg(short, long)]
    log: Option<PathBuf>,

    /// Maximum transfers in flight.
    #[arg(short = 'j', long)]
    concurrency: Option<usize>,

    /// Key prefix; request n is tagged `<key>-<n>`.
    #[arg(short, long, default_value = "fetch")]
    key: String,

    /// Print a Prometheus snapshot of transfer metrics on exit.
    #[arg(long)]
    print_metrics: bool,

    /// URLs to fetch (http only).
    #[arg(required = true)]
    urls: Vec<String>,
}

/// Outcome of one fetch, printed as a JSON line.
#[derive(Debug, Serialize)]
struct FetchSummary {
    key: String,
    url: String,
    status: Option<u16>,
    bytes: u64,
    elapsed_ms: u128,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => ClientConfig::default(),
    };
    if let Some(n) = cli.concurrency {
        config.client.concurrent_transfers = n;
    }
    if let Some(path) = &cli.log {
        config.stats.log_path = Some(path.display().to_string());
    }
    validate_config(&config).map_err(ConfigError::Validation)?;

    logging::init_logging(&config.observability.log_level);
    tracing::info!(
        concurrent_transfers = config.client.concurrent_transfers,
        log_path = ?config.stats.log_path,
        urls = cli.urls.len(),
        "transfer-stats starting"
    );

    let metrics_handle = if cli.print_metrics || config.observability.metrics_enabled {
        Some(metrics::init_metrics()?)
    } else {
        None
    };

    let client: InstrumentedClient<Empty<Bytes>> = InstrumentedClient::new(&config.client);

    if let Some(path) = &config.stats.log_path {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        client.log_http_stats(Arc::new(Mutex::new(file)));
        tracing::info!(path = %path, "Transfer log enabled");
    }

    let concurrency = config.client.concurrent_transfers;
    let summaries: Vec<FetchSummary> = stream::iter(cli.urls.iter().enumerate())
        .map(|(n, url)| fetch(&client, format!("{}-{}", cli.key, n), url))
        .buffer_unordered(concurrency)
        .collect()
        .await;

    let mut failed = 0;
    for summary in &summaries {
        if summary.error.is_some() {
            failed += 1;
        }
        println!("{}", serde_json::to_string(summary)?);
    }

    if let Some(handle) = metrics_handle {
        print!("{}", handle.render());
    }

    if failed > 0 {
        return Err(format!("{} of {} transfers failed", failed, summaries.len()).into());
    }
    Ok(())
}

/// Fetch `url` tagged with `key`, draining the body without keeping it.
async fn fetch(client: &InstrumentedClient<Empty<Bytes>>, key: String, url: &str) -> FetchSummary {
    let start = Instant::now();
    let mut summary = FetchSummary {
        key: key.clone(),
        url: url.to_string(),
        status: None,
        bytes: 0,
        elapsed_ms: 0,
        error: None,
    };

    let result = async {
        let uri = parse_target(url)?;
        let request = Request::get(uri).body(Empty::new())?;
        let request = client.log_request(request, key);

        let response = client.request(request).await?;
        summary.status = Some(response.status().as_u16());

        let mut body = response.into_body();
        while let Some(frame) = body.frame().await {
            if let Some(data) = frame?.data_ref() {
                summary.bytes += data.len() as u64;
            }
        }
        Ok::<_, Box<dyn std::error::Error + Send + Sync>>(())
    }
    .await;

    if let Err(e) = result {
        tracing::warn!(key = %summary.key, url = %url, error = %e, "Fetch failed");
        summary.error = Some(e.to_string());
    }
    summary.elapsed_ms = start.elapsed().as_millis();
    summary
}

/// Validate `url` and convert it into a request target.
fn parse_target(url: &str) -> Result<Uri, Box<dyn std::error::Error + Send + Sync>> {
    let parsed = url::Url::parse(url)?;
    if parsed.scheme() != "http" {
        return Err(format!("unsupported scheme {:?}; only http is supported", parsed.scheme()).into());
    }
    Ok(parsed.as_str().parse::<Uri>()?)
}
