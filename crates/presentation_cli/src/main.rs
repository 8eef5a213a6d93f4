//! Resilience CLI
//!
//! Command-line front end for the fault injector and the retry engine.

#![allow(clippy::print_stdout)]

mod report;

use std::path::PathBuf;
use std::sync::Arc;

use application::ResilienceTestService;
use clap::{Parser, Subcommand};
use domain::FaultConfig;
use infrastructure::{
    AppConfig, FaultInjectionClient, FaultInjector, RetryPolicy, TelemetryConfig,
    TracingRetryObserver, init_telemetry,
};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Resilience CLI
#[derive(Parser)]
#[command(name = "resilience-cli")]
#[command(author, version, about = "Fault injection and retry policy test harness", long_about = None)]
struct Cli {
    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Configuration file (default: ./resilience.toml if present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Overrides for the configured fault
#[derive(clap::Args, Debug, Default)]
struct FaultArgs {
    /// Status code to fail with (500, 502, 503, 504, 429, 408)
    #[arg(long)]
    error_code: Option<String>,

    /// Probability of failing a call, 0.0 to 1.0
    #[arg(long)]
    error_rate: Option<f64>,

    /// Latency added before every injected failure, in milliseconds
    #[arg(long)]
    delay_ms: Option<i64>,

    /// Advisory retry-after carried by the failure, in seconds
    #[arg(long)]
    retry_after: Option<i64>,

    /// Extra latency for timeout classes, in milliseconds
    #[arg(long)]
    timeout_delay_ms: Option<i64>,

    /// Turn fault injection off
    #[arg(long)]
    disabled: bool,
}

impl FaultArgs {
    fn apply(&self, mut fault: FaultConfig) -> FaultConfig {
        if let Some(code) = &self.error_code {
            fault.set_error_code(code.as_str());
        }
        if let Some(rate) = self.error_rate {
            fault.set_error_rate(rate);
        }
        if let Some(delay) = self.delay_ms {
            fault.set_response_delay_ms(delay);
        }
        if let Some(seconds) = self.retry_after {
            fault.set_retry_after_seconds(seconds);
        }
        if let Some(delay) = self.timeout_delay_ms {
            fault.set_timeout_delay_ms(delay);
        }
        if self.disabled {
            fault.set_enabled(false);
        }
        fault
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Make one call to the simulated endpoint
    ///
    /// Example: resilience-cli simulate --error-code 429 --error-rate 1
    Simulate {
        #[command(flatten)]
        fault: FaultArgs,
    },

    /// Run a scenario of protected calls and print a report
    ///
    /// Example: resilience-cli run --requests 50 --concurrency 5 --policy robust
    Run {
        #[command(flatten)]
        fault: FaultArgs,

        /// Scenario label
        #[arg(long)]
        name: Option<String>,

        /// Number of logical requests
        #[arg(short = 'n', long)]
        requests: Option<u32>,

        /// Requests in flight at once
        #[arg(long)]
        concurrency: Option<usize>,

        /// Retry policy name from the catalog
        #[arg(short, long)]
        policy: Option<String>,

        /// Answer exhausted calls with this degraded message
        #[arg(long)]
        fallback: Option<String>,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// List the retry policies in the catalog
    Policies,

    /// Show the waits a policy takes between attempts
    Backoff {
        /// Retry policy name from the catalog
        #[arg(default_value = "standard")]
        policy: String,
    },
}

/// Determine log filter level from verbosity count
const fn log_filter_from_verbosity(verbose: u8) -> &'static str {
    match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

/// Configured telemetry, with `-v` taking over the filter when given
fn telemetry_for(configured: &TelemetryConfig, verbose: u8) -> TelemetryConfig {
    if verbose == 0 {
        configured.clone()
    } else {
        configured
            .clone()
            .with_log_filter(log_filter_from_verbosity(verbose))
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = AppConfig::load_from(cli.config.as_deref())?;
    init_telemetry(&telemetry_for(&config.telemetry, cli.verbose))?;
    let catalog = config.policy_catalog()?;

    match cli.command {
        Commands::Simulate { fault } => {
            let fault = fault.apply(config.fault.clone());
            let injector = FaultInjector::new();

            let outcome = injector.simulate(&fault).await;
            print!("{}", report::render_outcome(&outcome));
            print!("{}", report::render_stats(&injector.stats()));
        },

        Commands::Run {
            fault,
            name,
            requests,
            concurrency,
            policy,
            fallback,
            json,
        } => {
            let mut scenario = config.scenario.clone();
            scenario.name = name.unwrap_or(scenario.name);
            scenario.requests = requests.unwrap_or(scenario.requests);
            scenario.concurrency = concurrency.unwrap_or(scenario.concurrency);
            scenario.policy = policy.unwrap_or(scenario.policy);
            scenario.fallback_message = fallback.or(scenario.fallback_message);

            let retry = catalog.get(&scenario.policy)?.clone();
            let injector = Arc::new(FaultInjector::new());
            let policy =
                RetryPolicy::new(retry).with_observer(Arc::new(TracingRetryObserver::new()));
            let mut client = FaultInjectionClient::new(injector.clone(), policy);
            if let Some(message) = &scenario.fallback_message {
                client = client.with_fallback(message.clone());
            }
            let service = ResilienceTestService::new(Arc::new(client));

            let request = scenario.to_request(fault.apply(config.fault.clone()));
            info!(scenario = %request.name, policy = %scenario.policy, "Starting scenario");

            let token = CancellationToken::new();
            let interrupt = token.clone();
            let watcher = tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    warn!("Interrupted, cancelling outstanding requests");
                    interrupt.cancel();
                }
            });
            let summary = service
                .run_scenario_with_cancellation(&request, &token)
                .await;
            watcher.abort();
            let summary = summary?;

            if json {
                println!("{}", serde_json::to_string_pretty(&summary)?);
            } else {
                print!("{}", report::render_report(&summary));
                print!("{}", report::render_stats(&injector.stats()));
            }
        },

        Commands::Policies => {
            print!("{}", report::render_policies(&catalog));
        },

        Commands::Backoff { policy } => {
            let retry = catalog.get(&policy)?;
            println!(
                "{} ({}, {} attempts)",
                retry.name(),
                retry.backoff(),
                retry.max_attempts()
            );
            let schedule = report::backoff_schedule(retry);
            if schedule.is_empty() {
                println!("  no retries");
            }
            for (attempt, wait) in schedule {
                println!("  after attempt {attempt}: {}ms", wait.as_millis());
            }
            if retry.backoff().is_randomized() {
                println!("  (randomized: one sample shown)");
            }
        },
    }

    Ok(())
}
