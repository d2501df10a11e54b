//! verify-audit-chain: check an auditchain log and its checkpoint.
//!
//! Replays the hash chain of a JSONL audit log, then compares the chain's
//! tail with the checkpoint file.  Prints `ok` and exits 0 when both agree;
//! otherwise prints the first failure and exits 1.
//!
//! Usage:
//!   verify-audit-chain --log /var/log/auditchain/audit.jsonl
//!   verify-audit-chain --log audit.jsonl --state audit.checkpoint
//!   verify-audit-chain --config /etc/auditchain.toml
//!   verify-audit-chain --self-test
//!   AUDITCHAIN_LOG=/srv/audit.jsonl verify-audit-chain
//!
//! Without `--self-test`, one of `--log`, `--config` or `AUDITCHAIN_LOG`
//! must name the log.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use auditchain_contracts::{AuditError, AuditResult};
use auditchain_policy::{AuditConfig, LOG_PATH_ENV};
use auditchain_store::state_path_for;
use auditchain_verify::{run_self_test, verify_log};

// ── CLI definition ────────────────────────────────────────────────────────────

/// Verify the integrity of an auditchain hash-chained log.
#[derive(Parser)]
#[command(
    name = "verify-audit-chain",
    about = "Verify auditchain audit log integrity",
    long_about = "Replays every record of a JSONL audit log, recomputing its FNV-1a chain hash,\n\
                  then cross-checks the final (seq, hash) against the checkpoint file."
)]
struct Cli {
    /// Path to the audit log (JSONL) [default: $AUDITCHAIN_LOG].
    #[arg(long)]
    log: Option<PathBuf>,

    /// Path to the checkpoint file [default: <log>.state].
    #[arg(long)]
    state: Option<PathBuf>,

    /// Read log and checkpoint paths from a TOML config file.
    #[arg(long, conflicts_with = "log")]
    config: Option<PathBuf>,

    /// Build a deterministic fixture, verify it, tamper with it, and check
    /// that the tampering is detected.
    #[arg(long)]
    self_test: bool,
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn main() -> ExitCode {
    // Set RUST_LOG=debug for verbose output.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();

    let cli = Cli::parse();

    if cli.self_test {
        return match run_self_test() {
            Ok(()) => {
                println!("ok");
                ExitCode::SUCCESS
            }
            Err(e) => {
                println!("{e}");
                ExitCode::FAILURE
            }
        };
    }

    let (log, state) = match resolve_paths(&cli, |key| std::env::var(key).ok()) {
        Ok(paths) => paths,
        Err(e) => {
            println!("{e}");
            return ExitCode::FAILURE;
        }
    };

    let report = verify_log(&log, &state);
    println!("{}", report.message);
    if report.ok {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

/// Log and checkpoint paths from the flags, the config file, or the
/// environment (read through `lookup`), in that order of precedence.
fn resolve_paths(
    cli: &Cli,
    lookup: impl Fn(&str) -> Option<String>,
) -> AuditResult<(PathBuf, PathBuf)> {
    if let Some(log) = &cli.log {
        let state = cli.state.clone().unwrap_or_else(|| state_path_for(log));
        return Ok((log.clone(), state));
    }

    let mut config = match &cli.config {
        Some(path) => AuditConfig::from_file(path)?,
        None if lookup(LOG_PATH_ENV).is_some_and(|v| !v.is_empty()) => AuditConfig::default(),
        None => {
            return Err(AuditError::Config {
                reason: "--log is required unless --self-test is used".to_string(),
            })
        }
    };
    config.apply_overrides(lookup);
    let state = cli.state.clone().unwrap_or_else(|| config.state_path());
    Ok((config.log_path().to_path_buf(), state))
}
