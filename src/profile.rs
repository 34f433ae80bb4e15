// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Configuration profiles.
//!
//! A __profile__ is a complete Odoo configuration for one deployment
//! environment. Profiles are generated from three layers, with later layers
//! winning:
//!
//! 1. Environment defaults, see [`Environment::defaults`].
//! 2. Connection defaults from [`Settings`].
//! 3. Caller supplied [`Overrides`].
//!
//! # Required Options
//!
//! Every profile defines `addons_path`, `db_host`, `db_port`, `db_user`, and
//! `xmlrpc_port` with non-empty values. The server refuses to start in a
//! useful state without them, so validation treats their absence as an error.
//!
//! # Addons Path
//!
//! The addons search path is built by probing the candidate directories from
//! [`Settings::addon_candidates`] in order (core, enterprise, local-custom,
//! project-custom) and keeping the ones that exist, joined with `,`. If none
//! exist the core candidate is kept anyway so the option never ends up empty.

pub mod document;
pub mod environment;

pub use document::ProfileDocument;
pub use environment::{Environment, EnvironmentDefaults, EnvironmentError, Limits, LogLevel};

use crate::config::Settings;

use chrono::{DateTime, Local};
use std::path::PathBuf;
use tracing::debug;

/// Options every profile must define.
pub const REQUIRED_KEYS: [&str; 5] = ["addons_path", "db_host", "db_port", "db_user", "xmlrpc_port"];

/// Separator of addons path entries.
pub const ADDONS_PATH_SEPARATOR: &str = ",";

/// Caller supplied overrides applied on top of environment defaults.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Overrides {
    pub workers: Option<u32>,
    pub log_level: Option<LogLevel>,

    /// Load demo data, i.e., the inverse of `without_demo`.
    pub demo_data: Option<bool>,
    pub http_port: Option<u16>,
    pub db_host: Option<String>,
    pub db_port: Option<u16>,
    pub db_user: Option<String>,
    pub admin_password: Option<String>,
}

/// Fully merged profile ready to be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Profile {
    environment: Environment,
    options: ProfileDocument,
}

impl Profile {
    /// Merge environment defaults, settings, and overrides into a profile.
    ///
    /// Probes the file system for addon directories, but writes nothing.
    pub fn build(environment: Environment, settings: &Settings, overrides: &Overrides) -> Self {
        let defaults = environment.defaults();
        let http_port = overrides.http_port.unwrap_or(defaults.http_port);
        let mut options = ProfileDocument::new();

        options.set("addons_path", probe_addons_path(settings));
        options.set(
            "admin_passwd",
            overrides
                .admin_password
                .as_deref()
                .unwrap_or(&settings.admin_password),
        );

        options.set(
            "db_host",
            overrides.db_host.as_deref().unwrap_or(&settings.database.host),
        );
        options.set("db_port", overrides.db_port.unwrap_or(settings.database.port));
        options.set(
            "db_user",
            overrides.db_user.as_deref().unwrap_or(&settings.database.user),
        );
        match &settings.database.password {
            Some(password) => options.set("db_password", password),
            None => options.set_bool("db_password", false),
        }
        if let Some(maxconn) = defaults.db_maxconn {
            options.set("db_maxconn", maxconn);
        }
        if let Some(dbfilter) = defaults.dbfilter {
            options.set("dbfilter", dbfilter);
        }
        if let Some(list_db) = defaults.list_db {
            options.set_bool("list_db", list_db);
        }

        options.set("xmlrpc_port", http_port);
        if defaults.gevent {
            options.set("gevent_port", u32::from(http_port) + 3);
        }
        if let Some(interface) = defaults.http_interface {
            options.set("http_interface", interface);
        }
        if let Some(proxy_mode) = defaults.proxy_mode {
            options.set_bool("proxy_mode", proxy_mode);
        }

        options.set("workers", overrides.workers.unwrap_or(defaults.workers));
        options.set("max_cron_threads", defaults.max_cron_threads);
        if let Some(limits) = defaults.limits {
            options.set("limit_memory_hard", limits.memory_hard);
            options.set("limit_memory_soft", limits.memory_soft);
            options.set("limit_time_cpu", limits.time_cpu);
            options.set("limit_time_real", limits.time_real);
        }

        options.set("log_level", overrides.log_level.unwrap_or(defaults.log_level));
        if defaults.logfile {
            let logfile = settings
                .logs_dir()
                .join(format!("{}-{}.log", settings.file_prefix, environment));
            options.set("logfile", logfile.display());
        }

        // INVARIANT: Demo override follows Odoo's meaning of `without_demo`.
        let without_demo = match overrides.demo_data {
            Some(demo_data) => !demo_data,
            None => defaults.without_demo,
        };
        options.set_bool("without_demo", without_demo);

        if let Some(dev_mode) = defaults.dev_mode {
            options.set("dev_mode", dev_mode);
        }
        if defaults.test_enable {
            options.set_bool("test_enable", true);
        }

        Self {
            environment,
            options,
        }
    }

    pub fn environment(&self) -> Environment {
        self.environment
    }

    pub fn options(&self) -> &ProfileDocument {
        &self.options
    }

    /// Render profile as file content.
    ///
    /// Only the generation timestamp comment depends on `generated_at`.
    pub fn render(&self, generated_at: DateTime<Local>) -> String {
        format!(
            "# Odoo configuration profile: {}\n# Generated at {}\n{}",
            self.environment,
            generated_at.format("%Y-%m-%d %H:%M:%S"),
            self.options,
        )
    }
}

/// Build addons search path from existing candidate directories.
pub fn probe_addons_path(settings: &Settings) -> String {
    let candidates = settings.addon_candidates();
    let found = candidates
        .iter()
        .filter(|candidate| {
            let exists = candidate.is_dir();
            debug!("probe addons candidate {:?}: exists={exists}", candidate.display());
            exists
        })
        .map(|candidate| candidate.display().to_string())
        .collect::<Vec<_>>();

    if found.is_empty() {
        let [core, ..] = candidates;
        return core.display().to_string();
    }

    found.join(ADDONS_PATH_SEPARATOR)
}

/// File name of profile generated for environment, i.e., `<prefix>-<env>.conf`.
pub fn profile_file_name(prefix: &str, environment: Environment) -> PathBuf {
    PathBuf::from(format!("{prefix}-{environment}.conf"))
}

/// Determine environment from profile file name.
///
/// Only the exact shape `<prefix>-<environment>.conf` with a supported
/// environment is accepted. Anything else returns `None`, which callers
/// present as `unknown`.
pub fn environment_from_file_name(prefix: &str, file_name: &str) -> Option<Environment> {
    file_name
        .strip_suffix(".conf")?
        .strip_prefix(prefix)?
        .strip_prefix('-')?
        .parse()
        .ok()
}
