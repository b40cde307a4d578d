//! Latency summaries over dispatch outcomes.
//!
//! # Data Flow
//! ```text
//! PartitionResults → Vec<RequestOutcome>
//!     → LatencySummary::from_outcomes (all requests)
//!     → summarize_by_endpoint (one summary per endpoint)
//!     → printed by the CLI / asserted on by load tests
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use crate::dispatch::RequestOutcome;

/// Aggregate latency figures for a set of requests.
#[derive(Debug, Clone, PartialEq)]
pub struct LatencySummary {
    pub count: usize,
    pub failures: usize,
    pub total: Duration,
    pub min: Duration,
    pub max: Duration,
    pub mean: Duration,
    pub p50: Duration,
    pub p95: Duration,
    pub p99: Duration,
}

impl LatencySummary {
    /// Summarize `outcomes`; `None` when there are none.
    ///
    /// `failures` counts responses with a non-2xx status.
    pub fn from_outcomes<'a, I>(outcomes: I) -> Option<Self>
    where
        I: IntoIterator<Item = &'a RequestOutcome>,
    {
        let mut failures = 0;
        let mut latencies: Vec<Duration> = outcomes
            .into_iter()
            .inspect(|o| {
                if !o.is_success() {
                    failures += 1;
                }
            })
            .map(|o| o.elapsed)
            .collect();

        if latencies.is_empty() {
            return None;
        }
        latencies.sort();

        let count = latencies.len();
        let total: Duration = latencies.iter().sum();

        Some(Self {
            count,
            failures,
            total,
            min: latencies[0],
            max: latencies[count - 1],
            mean: mean(total, count),
            p50: percentile(&latencies, 0.50),
            p95: percentile(&latencies, 0.95),
            p99: percentile(&latencies, 0.99),
        })
    }

    /// Completed requests per second over `wall_clock`.
    pub fn requests_per_sec(&self, wall_clock: Duration) -> f64 {
        let secs = wall_clock.as_secs_f64();
        if secs > 0.0 {
            self.count as f64 / secs
        } else {
            0.0
        }
    }
}

impl fmt::Display for LatencySummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "n={} failed={} min={:?} mean={:?} p50={:?} p95={:?} p99={:?} max={:?}",
            self.count,
            self.failures,
            self.min,
            self.mean,
            self.p50,
            self.p95,
            self.p99,
            self.max
        )
    }
}

fn mean(total: Duration, count: usize) -> Duration {
    let nanos = total.as_nanos() / count as u128;
    Duration::from_nanos(u64::try_from(nanos).unwrap_or(u64::MAX))
}

/// Nearest-rank percentile over sorted, non-empty `latencies`.
fn percentile(latencies: &[Duration], q: f64) -> Duration {
    let index = ((latencies.len() as f64 * q) as usize).min(latencies.len() - 1);
    latencies[index]
}

/// One summary per endpoint, ordered by endpoint.
pub fn summarize_by_endpoint<'a, I>(outcomes: I) -> BTreeMap<String, LatencySummary>
where
    I: IntoIterator<Item = &'a RequestOutcome>,
{
    let mut grouped: BTreeMap<&str, Vec<&RequestOutcome>> = BTreeMap::new();
    for outcome in outcomes {
        grouped.entry(outcome.endpoint.as_str()).or_default().push(outcome);
    }

    grouped
        .into_iter()
        .filter_map(|(endpoint, outcomes)| {
            LatencySummary::from_outcomes(outcomes).map(|s| (endpoint.to_string(), s))
        })
        .collect()
}
