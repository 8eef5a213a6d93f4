//! Plain-text rendering of scenario reports, injector statistics and
//! policy tables

use std::fmt::Write as _;
use std::time::Duration;

use application::ScenarioReport;
use domain::{SimulatedFailure, SimulatedSuccess};
use infrastructure::{ChaosStats, PolicyCatalog, RetryConfig};

/// Waits the engine would take before each retry of `config`
///
/// Randomized shapes yield one sample per call.
pub fn backoff_schedule(config: &RetryConfig) -> Vec<(u32, Duration)> {
    (1..config.max_attempts())
        .map(|attempt| (attempt, config.backoff().delay(attempt)))
        .collect()
}

/// Human readable scenario summary
pub fn render_report(report: &ScenarioReport) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Scenario:   {}", report.scenario);
    let _ = writeln!(out, "Policy:     {}", report.policy);
    let _ = writeln!(out, "Requests:   {}", report.requests);
    let _ = writeln!(
        out,
        "Succeeded:  {} ({:.1}%)",
        report.succeeded,
        report.success_rate() * 100.0
    );
    let _ = writeln!(out, "Degraded:   {}", report.degraded);
    let _ = writeln!(out, "Failed:     {}", report.failed);
    let _ = writeln!(
        out,
        "Attempts:   {} (avg {:.2})",
        report.total_attempts,
        report.average_attempts()
    );
    let _ = writeln!(out, "Elapsed:    {}ms", report.elapsed_ms);

    if !report.failures.is_empty() {
        out.push_str("Failures:\n");
        for (tag, count) in &report.failures {
            let _ = writeln!(out, "  {tag:<20} {count}");
        }
    }
    out
}

/// Injector counters after a run
#[allow(clippy::cast_precision_loss)]
pub fn render_stats(stats: &ChaosStats) -> String {
    format!(
        "Injector:   {} calls, {} faults ({:.1}%), {} skipped, {} timeouts, {} rate limits, {}ms latency added\n",
        stats.total_calls,
        stats.faults_injected,
        stats.actual_fault_rate() * 100.0,
        stats.calls_skipped,
        stats.timeouts_injected,
        stats.rate_limits_injected,
        stats.total_latency_added_ms
    )
}

/// One line per catalog entry
pub fn render_policies(catalog: &PolicyCatalog) -> String {
    let mut out = String::new();
    for config in catalog.iter() {
        let _ = writeln!(
            out,
            "{:<22} attempts={:<3} backoff={}",
            config.name(),
            config.max_attempts(),
            config.backoff()
        );
    }
    out
}

/// Outcome of a single simulated call
pub fn render_outcome(outcome: &Result<SimulatedSuccess, SimulatedFailure>) -> String {
    match outcome {
        Ok(success) => format!("OK    {} ({})\n", success.data, success.message),
        Err(failure) => format!(
            "FAIL  {} {} after {}ms, retry after {}s\n",
            failure.status(),
            failure.message(),
            failure.injected_delay_ms,
            failure.retry_after_seconds
        ),
    }
}
