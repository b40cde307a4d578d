//! `dispatch`: run a file of request descriptors against a backend.
//!
//! ```text
//! dispatch --requests requests.json [--config dispatcher.toml]
//!          [--host H] [--port P] [--workers N] [--chunk-size C] [--repeat R]
//! ```
//!
//! `requests.json` holds an array of descriptors, e.g.
//! `[{"endpoint": "/", "method": "GET"}]`.

use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use clap::Parser;
use futures_util::StreamExt;

use request_dispatcher::config::{load_config, validate_config, ConfigError, DispatcherConfig};
use request_dispatcher::observability::{logging, metrics};
use request_dispatcher::report::{summarize_by_endpoint, LatencySummary};
use request_dispatcher::{partition, Dispatcher, RequestDescriptor};

#[derive(Parser)]
#[command(name = "dispatch")]
#[command(about = "Send batches of HTTP requests to one backend from parallel workers", long_about = None)]
struct Cli {
    /// TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// JSON file containing an array of request descriptors.
    #[arg(short, long)]
    requests: PathBuf,

    #[arg(long)]
    host: Option<String>,

    #[arg(short, long)]
    port: Option<u16>,

    #[arg(short, long)]
    workers: Option<usize>,

    /// Requests per partition (default: spread evenly over the workers).
    #[arg(long)]
    chunk_size: Option<usize>,

    /// Send the whole request list this many times.
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u64).range(1..))]
    repeat: u64,
}

/// Upper bound on the number of requests one run may send.
const MAX_REQUESTS: usize = 1 << 24;

/// `descriptors` repeated `repeat` times, refusing runs above `MAX_REQUESTS`.
fn repeated(descriptors: &[RequestDescriptor], repeat: u64) -> Result<Vec<RequestDescriptor>, String> {
    let total = usize::try_from(repeat)
        .ok()
        .and_then(|repeat| descriptors.len().checked_mul(repeat))
        .filter(|&total| total <= MAX_REQUESTS)
        .ok_or_else(|| {
            format!(
                "{} requests repeated {repeat} times exceeds the limit of {MAX_REQUESTS}",
                descriptors.len()
            )
        })?;

    Ok(descriptors.iter().cycle().take(total).cloned().collect())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => DispatcherConfig::default(),
    };
    if let Some(host) = cli.host {
        config.target.hostname = host;
    }
    if let Some(port) = cli.port {
        config.target.port = port;
    }
    if let Some(workers) = cli.workers {
        config.pool.workers = workers;
    }
    if cli.chunk_size.is_some() {
        config.pool.chunk_size = cli.chunk_size;
    }
    validate_config(&config).map_err(ConfigError::Validation)?;

    logging::init_logging(&config.observability.log_filter);

    if let Some(addr) = &config.observability.metrics_address {
        metrics::init_metrics(addr.parse()?);
    }

    let descriptors: Vec<RequestDescriptor> =
        serde_json::from_str(&fs::read_to_string(&cli.requests)?)?;
    let descriptors = repeated(&descriptors, cli.repeat)?;

    tracing::info!(
        backend = %format!("{}:{}", config.target.hostname, config.target.port),
        workers = config.pool.workers,
        requests = descriptors.len(),
        "Configuration loaded"
    );

    let dispatcher = Dispatcher::from_config(&config)?;
    let partitions = match config.pool.chunk_size {
        Some(chunk_size) => partition(&descriptors, chunk_size)?,
        None => dispatcher.partition_for_workers(&descriptors)?,
    };

    let start = Instant::now();
    let mut results = dispatcher.dispatch_batch(partitions)?;
    let mut outcomes = Vec::with_capacity(descriptors.len());
    let mut failed_partitions = 0;
    let mut index = 0;
    while let Some(result) = results.next().await {
        match result {
            Ok(partition_outcomes) => outcomes.extend(partition_outcomes),
            Err(e) => {
                failed_partitions += 1;
                tracing::error!(partition = index, kind = ?e.kind(), error = %e, "Partition failed");
            }
        }
        index += 1;
    }
    let wall_clock = start.elapsed();

    dispatcher.shutdown().await;

    println!("\n--- Dispatch Results ---");
    for (endpoint, summary) in summarize_by_endpoint(&outcomes) {
        println!("{endpoint:<30} {summary}");
    }
    if let Some(overall) = LatencySummary::from_outcomes(&outcomes) {
        println!("Total Requests: {}", overall.count);
        println!("Total Duration: {:?}", wall_clock);
        println!("Requests/sec:   {:.2}", overall.requests_per_sec(wall_clock));
        println!("P50 Latency:    {:?}", overall.p50);
        println!("P95 Latency:    {:?}", overall.p95);
        println!("P99 Latency:    {:?}", overall.p99);
    }
    println!("Failed partitions: {failed_partitions}");
    println!("------------------------\n");

    if failed_partitions > 0 {
        std::process::exit(1);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repeated_cycles_in_order() {
        let list = vec![
            RequestDescriptor::get("/a").unwrap(),
            RequestDescriptor::get("/b").unwrap(),
        ];
        let endpoints: Vec<String> = repeated(&list, 3)
            .unwrap()
            .iter()
            .map(|d| d.endpoint().to_string())
            .collect();
        assert_eq!(endpoints, vec!["/a", "/b", "/a", "/b", "/a", "/b"]);

        assert!(repeated(&[], u64::MAX).unwrap().is_empty());
    }

    #[test]
    fn test_repeated_rejects_oversized_runs() {
        let list = vec![
            RequestDescriptor::get("/a").unwrap(),
            RequestDescriptor::get("/b").unwrap(),
        ];
        let err = repeated(&list, u64::MAX).unwrap_err();
        assert!(err.contains("exceeds the limit"));

        assert!(repeated(&list, (MAX_REQUESTS / 2 + 1) as u64).is_err());
    }
}
