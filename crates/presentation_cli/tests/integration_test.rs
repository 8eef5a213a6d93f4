//! Integration tests for CLI
//!
//! These tests verify command parsing and structure without running the
//! commands themselves.

#![allow(clippy::panic)] // Allow panic! in tests for clear failure messages

use std::ffi::OsString;
use std::path::PathBuf;

use clap::Parser;

// Mock CLI structure for testing (mirrors main.rs)
#[derive(Parser)]
#[command(name = "resilience-cli")]
struct Cli {
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Args, Debug)]
struct FaultArgs {
    #[arg(long)]
    error_code: Option<String>,
    #[arg(long)]
    error_rate: Option<f64>,
    #[arg(long)]
    delay_ms: Option<i64>,
    #[arg(long)]
    retry_after: Option<i64>,
    #[arg(long)]
    timeout_delay_ms: Option<i64>,
    #[arg(long)]
    disabled: bool,
}

#[derive(clap::Subcommand)]
enum Commands {
    Simulate {
        #[command(flatten)]
        fault: FaultArgs,
    },
    Run {
        #[command(flatten)]
        fault: FaultArgs,
        #[arg(long)]
        name: Option<String>,
        #[arg(short = 'n', long)]
        requests: Option<u32>,
        #[arg(long)]
        concurrency: Option<usize>,
        #[arg(short, long)]
        policy: Option<String>,
        #[arg(long)]
        fallback: Option<String>,
        #[arg(long)]
        json: bool,
    },
    Policies,
    Backoff {
        #[arg(default_value = "standard")]
        policy: String,
    },
}

fn parse_args(args: &[&str]) -> Result<Cli, clap::Error> {
    let os_args: Vec<OsString> = args.iter().map(OsString::from).collect();
    Cli::try_parse_from(os_args)
}

#[test]
fn cli_parses_simulate_command() {
    let cli = parse_args(&["resilience-cli", "simulate"]).unwrap();
    if let Commands::Simulate { fault } = cli.command {
        assert!(fault.error_code.is_none());
        assert!(!fault.disabled);
    } else {
        panic!("Expected Simulate command");
    }
}

#[test]
fn cli_parses_simulate_overrides() {
    let cli = parse_args(&[
        "resilience-cli",
        "simulate",
        "--error-code",
        "429",
        "--error-rate",
        "0.5",
        "--delay-ms",
        "250",
        "--retry-after",
        "10",
        "--timeout-delay-ms",
        "0",
    ])
    .unwrap();
    if let Commands::Simulate { fault } = cli.command {
        assert_eq!(fault.error_code.as_deref(), Some("429"));
        assert_eq!(fault.error_rate, Some(0.5));
        assert_eq!(fault.delay_ms, Some(250));
        assert_eq!(fault.retry_after, Some(10));
        assert_eq!(fault.timeout_delay_ms, Some(0));
    } else {
        panic!("Expected Simulate command");
    }
}

#[test]
fn cli_accepts_negative_delay_for_clamping() {
    let cli = parse_args(&["resilience-cli", "simulate", "--delay-ms=-5"]).unwrap();
    if let Commands::Simulate { fault } = cli.command {
        assert_eq!(fault.delay_ms, Some(-5));
    } else {
        panic!("Expected Simulate command");
    }
}

#[test]
fn cli_rejects_non_numeric_rate() {
    let result = parse_args(&["resilience-cli", "simulate", "--error-rate", "often"]);
    assert!(result.is_err());
}

#[test]
fn cli_parses_run_command_defaults() {
    let cli = parse_args(&["resilience-cli", "run"]).unwrap();
    if let Commands::Run {
        requests,
        policy,
        json,
        fallback,
        ..
    } = cli.command
    {
        assert!(requests.is_none());
        assert!(policy.is_none());
        assert!(fallback.is_none());
        assert!(!json);
    } else {
        panic!("Expected Run command");
    }
}

#[test]
fn cli_parses_run_with_options() {
    let cli = parse_args(&[
        "resilience-cli",
        "run",
        "-n",
        "50",
        "--concurrency",
        "5",
        "-p",
        "robust",
        "--fallback",
        "cached",
        "--name",
        "checkout",
        "--json",
        "--disabled",
    ])
    .unwrap();
    if let Commands::Run {
        fault,
        name,
        requests,
        concurrency,
        policy,
        fallback,
        json,
    } = cli.command
    {
        assert_eq!(requests, Some(50));
        assert_eq!(concurrency, Some(5));
        assert_eq!(policy.as_deref(), Some("robust"));
        assert_eq!(fallback.as_deref(), Some("cached"));
        assert_eq!(name.as_deref(), Some("checkout"));
        assert!(json);
        assert!(fault.disabled);
    } else {
        panic!("Expected Run command");
    }
}

#[test]
fn cli_parses_policies_command() {
    let cli = parse_args(&["resilience-cli", "policies"]).unwrap();
    assert!(matches!(cli.command, Commands::Policies));
}

#[test]
fn cli_backoff_uses_default_policy() {
    let cli = parse_args(&["resilience-cli", "backoff"]).unwrap();
    if let Commands::Backoff { policy } = cli.command {
        assert_eq!(policy, "standard");
    } else {
        panic!("Expected Backoff command");
    }
}

#[test]
fn cli_backoff_takes_policy_name() {
    let cli = parse_args(&["resilience-cli", "backoff", "database-friendly"]).unwrap();
    if let Commands::Backoff { policy } = cli.command {
        assert_eq!(policy, "database-friendly");
    } else {
        panic!("Expected Backoff command");
    }
}

#[test]
fn cli_parses_config_path_after_subcommand() {
    let cli = parse_args(&["resilience-cli", "policies", "--config", "ci.toml"]).unwrap();
    assert_eq!(cli.config, Some(PathBuf::from("ci.toml")));
}

#[test]
fn cli_parses_verbose_flag() {
    let cli = parse_args(&["resilience-cli", "-v", "policies"]).unwrap();
    assert_eq!(cli.verbose, 1);
}

#[test]
fn cli_parses_multiple_verbose_flags() {
    let cli = parse_args(&["resilience-cli", "-vvv", "run"]).unwrap();
    assert_eq!(cli.verbose, 3);
}

#[test]
fn cli_verbosity_zero_by_default() {
    let cli = parse_args(&["resilience-cli", "policies"]).unwrap();
    assert_eq!(cli.verbose, 0);
    assert!(cli.config.is_none());
}

#[test]
fn cli_requires_subcommand() {
    let result = parse_args(&["resilience-cli"]);
    assert!(result.is_err());
}

#[test]
fn cli_rejects_unknown_subcommand() {
    let result = parse_args(&["resilience-cli", "chat"]);
    assert!(result.is_err());
}
