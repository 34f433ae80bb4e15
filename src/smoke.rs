// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Smoke testing of profiles.
//!
//! A __smoke test__ proves that the server can load a profile at all. The
//! profile is validated first. Then the server binary is launched with
//! `--stop-after-init` under a wall-clock bound, so it initializes and exits
//! without serving requests. Nothing about server-internal state is
//! asserted.
//!
//! Combined output of every run lands in its own log file under `logs/`. On
//! failure the tail of that log is surfaced to the caller.

use crate::{
    config::Settings,
    runner::{which, Invocation, ProcessRunner, RunnerError},
    validate::{ValidationFailed, ValidationReport},
};

use chrono::Local;
use std::{
    ffi::OsString,
    fs::write,
    path::{Path, PathBuf},
    time::Duration,
};
use tracing::{debug, info, instrument};

/// Number of log lines surfaced when a smoke test fails.
pub const LOG_TAIL_LINES: usize = 20;

/// Name of the server binary looked up on `PATH` as last resort.
pub const FALLBACK_SERVER_BIN: &str = "odoo";

/// Options of one smoke test run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SmokeOptions {
    /// Database to initialize against, passed as `-d`.
    pub database: Option<String>,
    pub timeout: Duration,
}

impl SmokeOptions {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            database: None,
            timeout: settings.smoke_timeout(),
        }
    }
}

/// Successful smoke test outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SmokeReport {
    pub validation: ValidationReport,
    pub log_path: PathBuf,
}

/// Resolve the server binary.
///
/// Prefers the explicit binary from settings. Otherwise uses the binary
/// inside the project's Odoo checkout, and falls back to `odoo` on `PATH`
/// if that checkout is absent.
pub fn resolve_server_bin(settings: &Settings) -> PathBuf {
    if let Some(bin) = &settings.odoo_bin {
        return bin.clone();
    }

    let bundled = settings.project_root.join("odoo").join("odoo-bin");
    if bundled.is_file() {
        return bundled;
    }

    debug!("no bundled server at {:?}, fall back to PATH", bundled.display());
    which(FALLBACK_SERVER_BIN).unwrap_or_else(|| PathBuf::from(FALLBACK_SERVER_BIN))
}

/// Smoke test profile at `profile_path`.
///
/// The profile path is expected to already be resolved.
///
/// # Errors
///
/// - Return [`SmokeError::Read`] if profile cannot be read.
/// - Return [`SmokeError::Validation`] if profile has validation errors.
/// - Return [`SmokeError::Runner`] if server cannot be started.
/// - Return [`SmokeError::WriteLog`] if run log cannot be written.
/// - Return [`SmokeError::ExternalToolFailure`] if server exits nonzero or
///   exceeds its time bound.
#[instrument(skip(settings, runner), level = "debug")]
pub async fn smoke_test(
    settings: &Settings,
    runner: &impl ProcessRunner,
    profile_path: &Path,
    opts: &SmokeOptions,
) -> Result<SmokeReport> {
    let content = std::fs::read_to_string(profile_path).map_err(|err| SmokeError::Read {
        source: err,
        path: profile_path.to_path_buf(),
    })?;

    let validation = ValidationReport::check_str(&content);
    validation.ensure_passed(profile_path)?;

    let mut args: Vec<OsString> = vec![
        "-c".into(),
        profile_path.as_os_str().to_owned(),
        "--stop-after-init".into(),
    ];
    if let Some(database) = &opts.database {
        args.push("-d".into());
        args.push(database.into());
    }
    let invocation =
        Invocation::new(resolve_server_bin(settings), args).with_timeout(opts.timeout);

    info!("smoke test {:?}", profile_path.display());
    let output = runner.run(&invocation).await?;

    let stem = profile_path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "profile".into());
    let logs_dir = settings.logs_dir();
    mkdirp::mkdirp(&logs_dir).map_err(|err| SmokeError::WriteLog {
        source: err,
        path: logs_dir.clone(),
    })?;
    let log_path = logs_dir.join(format!(
        "test-{stem}-{}.log",
        Local::now().format("%Y%m%d_%H%M%S")
    ));
    let log = output.combined.as_str();
    write(&log_path, log).map_err(|err| SmokeError::WriteLog {
        source: err,
        path: log_path.clone(),
    })?;
    debug!("smoke test output written to {:?}", log_path.display());

    if !output.success() {
        let reason = if output.timed_out {
            format!("timed out after {}s", opts.timeout.as_secs())
        } else {
            match output.exit_code {
                Some(code) => format!("exited with code {code}"),
                None => "terminated by signal".into(),
            }
        };

        return Err(SmokeError::ExternalToolFailure {
            command: invocation.to_string(),
            reason,
            log_path,
            tail: tail_lines(log, LOG_TAIL_LINES),
        });
    }

    Ok(SmokeReport {
        validation,
        log_path,
    })
}

/// Last `count` lines of `text`.
pub fn tail_lines(text: &str, count: usize) -> String {
    let lines = text.lines().collect::<Vec<_>>();
    let start = lines.len().saturating_sub(count);
    lines[start..].join("\n")
}

/// Smoke test error types.
#[derive(Debug, thiserror::Error)]
pub enum SmokeError {
    /// Profile cannot be read.
    #[error("failed to read profile at {:?}", path.display())]
    Read {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },

    /// Profile failed validation.
    #[error(transparent)]
    Validation(#[from] ValidationFailed),

    /// Run log cannot be written.
    #[error("failed to write smoke test log at {:?}", path.display())]
    WriteLog {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },

    /// Server exited nonzero or exceeded its time bound.
    #[error("{command:?} {reason}, see {:?}:\n{tail}", log_path.display())]
    ExternalToolFailure {
        command: String,
        reason: String,
        log_path: PathBuf,
        tail: String,
    },

    /// Server could not be run at all.
    #[error(transparent)]
    Runner(#[from] RunnerError),
}

/// Friendly result alias :3
pub type Result<T, E = SmokeError> = std::result::Result<T, E>;
