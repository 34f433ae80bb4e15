// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Profile validation.
//!
//! Validation runs a fixed sequence of checks over a parsed profile:
//!
//! 1. The `[options]` section header is present (error).
//! 2. Every required option is present with a non-empty value (error).
//! 3. `admin_passwd` is not a well-known insecure default (warning).
//! 4. Cron threads are not configured while multiprocessing is off (warning).
//! 5. Every `addons_path` entry is an existing directory (warning).
//!
//! A profile passes validation if and only if no errors were found. Warnings
//! never fail validation on their own.

use crate::profile::{ProfileDocument, ADDONS_PATH_SEPARATOR, REQUIRED_KEYS};

use std::{
    fmt::{Display, Formatter, Result as FmtResult},
    path::{Path, PathBuf},
};

/// Admin passwords considered insecure.
pub const INSECURE_ADMIN_PASSWORDS: [&str; 3] = ["admin", "odoo", "password"];

/// Severity of a validation finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
}

/// Single validation finding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Finding {
    pub severity: Severity,
    pub message: String,
}

impl Finding {
    fn error(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            message: message.into(),
        }
    }

    fn warning(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            message: message.into(),
        }
    }
}

impl Display for Finding {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        fmt.write_str(&self.message)
    }
}

/// Outcome of validating one profile.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ValidationReport {
    findings: Vec<Finding>,
}

impl ValidationReport {
    /// Validate parsed profile document.
    ///
    /// Relative addons path entries are checked against the current working
    /// directory, the same way the server itself would resolve them.
    pub fn check(document: &ProfileDocument) -> Self {
        let mut findings = Vec::new();

        if !document.has_options_header() {
            findings.push(Finding::error("missing [options] section header"));
        }

        for key in REQUIRED_KEYS {
            match document.get(key) {
                Some(value) if !value.is_empty() => {}
                Some(_) => findings.push(Finding::error(format!("required option {key:?} is empty"))),
                None => findings.push(Finding::error(format!("missing required option {key:?}"))),
            }
        }

        if let Some(password) = document.get("admin_passwd") {
            if INSECURE_ADMIN_PASSWORDS.contains(&password) {
                findings.push(Finding::warning(format!(
                    "admin_passwd uses insecure default {password:?}"
                )));
            }
        }

        let workers = document.get_int("workers").unwrap_or(0);
        let cron_threads = document.get_int("max_cron_threads").unwrap_or(0);
        if workers == 0 && cron_threads > 0 {
            findings.push(Finding::warning(format!(
                "max_cron_threads = {cron_threads} has no effect while workers = 0"
            )));
        }

        if let Some(addons_path) = document.get("addons_path") {
            for entry in addons_path
                .split(ADDONS_PATH_SEPARATOR)
                .map(str::trim)
                .filter(|entry| !entry.is_empty())
            {
                if !Path::new(entry).is_dir() {
                    findings.push(Finding::warning(format!(
                        "addons path entry {entry:?} does not exist"
                    )));
                }
            }
        }

        Self { findings }
    }

    /// Validate raw profile text.
    pub fn check_str(content: &str) -> Self {
        Self::check(&ProfileDocument::from(content))
    }

    pub fn findings(&self) -> &[Finding] {
        &self.findings
    }

    pub fn errors(&self) -> impl Iterator<Item = &Finding> {
        self.findings
            .iter()
            .filter(|finding| finding.severity == Severity::Error)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Finding> {
        self.findings
            .iter()
            .filter(|finding| finding.severity == Severity::Warning)
    }

    pub fn error_count(&self) -> usize {
        self.errors().count()
    }

    pub fn warning_count(&self) -> usize {
        self.warnings().count()
    }

    /// Check if profile passed validation, i.e., no errors were found.
    pub fn passed(&self) -> bool {
        self.error_count() == 0
    }

    /// Turn failed validation of profile at `path` into an error.
    ///
    /// # Errors
    ///
    /// - Return [`ValidationFailed`] if any error was found.
    pub fn ensure_passed(&self, path: impl AsRef<Path>) -> Result<(), ValidationFailed> {
        if self.passed() {
            return Ok(());
        }

        Err(ValidationFailed {
            path: path.as_ref().to_path_buf(),
            errors: self.error_count(),
        })
    }
}

/// Profile has at least one validation error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("profile {:?} failed validation with {errors} error(s)", path.display())]
pub struct ValidationFailed {
    pub path: PathBuf,
    pub errors: usize,
}
