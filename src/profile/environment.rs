// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Deployment environments and their default settings.
//!
//! Each environment carries a fixed set of defaults that shape the generated
//! profile: worker counts, memory ceilings, log verbosity, network ports, and
//! security posture. Development favours hot-reload and permissive database
//! filters on the loopback interface. Production binds every interface, sits
//! behind a proxy, and hides the database manager listing.

use std::{
    fmt::{Display, Formatter, Result as FmtResult},
    str::FromStr,
};

/// Deployment environment a profile is generated for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Environment {
    Development,
    Testing,
    Staging,
    Production,
    Minimal,
}

impl Environment {
    /// Every supported environment.
    pub const ALL: [Environment; 5] = [
        Environment::Development,
        Environment::Testing,
        Environment::Staging,
        Environment::Production,
        Environment::Minimal,
    ];

    /// Name of environment as used in file names and on the command line.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Development => "development",
            Self::Testing => "testing",
            Self::Staging => "staging",
            Self::Production => "production",
            Self::Minimal => "minimal",
        }
    }

    /// Default settings of environment.
    pub fn defaults(&self) -> EnvironmentDefaults {
        let limits = Limits {
            memory_hard: 2_684_354_560,
            memory_soft: 2_147_483_648,
            time_cpu: 600,
            time_real: 1200,
        };

        match self {
            Self::Development => EnvironmentDefaults {
                http_port: 8069,
                workers: 0,
                max_cron_threads: 0,
                log_level: LogLevel::Info,
                without_demo: true,
                db_maxconn: Some(64),
                proxy_mode: Some(false),
                dbfilter: Some(".*"),
                http_interface: Some("127.0.0.1"),
                list_db: Some(true),
                limits: Some(limits),
                gevent: false,
                logfile: false,
                dev_mode: Some("reload,qweb,werkzeug,xml"),
                test_enable: false,
            },
            Self::Testing => EnvironmentDefaults {
                http_port: 8169,
                workers: 0,
                max_cron_threads: 0,
                log_level: LogLevel::Error,
                without_demo: false,
                db_maxconn: Some(16),
                proxy_mode: Some(false),
                dbfilter: Some("test_.*"),
                http_interface: Some("127.0.0.1"),
                list_db: Some(true),
                limits: Some(limits),
                gevent: false,
                logfile: false,
                dev_mode: None,
                test_enable: true,
            },
            Self::Staging => EnvironmentDefaults {
                http_port: 8269,
                workers: 2,
                max_cron_threads: 1,
                log_level: LogLevel::Warn,
                without_demo: false,
                db_maxconn: Some(32),
                proxy_mode: Some(true),
                dbfilter: Some("staging_.*"),
                http_interface: Some("0.0.0.0"),
                list_db: Some(false),
                limits: Some(limits),
                gevent: true,
                logfile: false,
                dev_mode: None,
                test_enable: false,
            },
            Self::Production => EnvironmentDefaults {
                http_port: 8369,
                workers: 4,
                max_cron_threads: 2,
                log_level: LogLevel::Warn,
                without_demo: false,
                db_maxconn: Some(64),
                proxy_mode: Some(true),
                dbfilter: Some("production_.*"),
                http_interface: Some("0.0.0.0"),
                list_db: Some(false),
                limits: Some(Limits {
                    memory_hard: 4_294_967_296,
                    memory_soft: 3_221_225_472,
                    ..limits
                }),
                gevent: true,
                logfile: true,
                dev_mode: None,
                test_enable: false,
            },
            Self::Minimal => EnvironmentDefaults {
                http_port: 8469,
                workers: 0,
                max_cron_threads: 0,
                log_level: LogLevel::Error,
                without_demo: false,
                db_maxconn: None,
                proxy_mode: None,
                dbfilter: None,
                http_interface: None,
                list_db: None,
                limits: None,
                gevent: false,
                logfile: false,
                dev_mode: None,
                test_enable: false,
            },
        }
    }
}

impl Display for Environment {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        fmt.write_str(self.as_str())
    }
}

impl FromStr for Environment {
    type Err = EnvironmentError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|env| env.as_str() == name)
            .ok_or_else(|| EnvironmentError::UnknownEnvironment(name.to_string()))
    }
}

/// Server log verbosity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

impl Display for LogLevel {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        fmt.write_str(self.as_str())
    }
}

impl FromStr for LogLevel {
    type Err = EnvironmentError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        match name {
            "debug" => Ok(Self::Debug),
            "info" => Ok(Self::Info),
            "warn" => Ok(Self::Warn),
            "error" => Ok(Self::Error),
            other => Err(EnvironmentError::UnknownLogLevel(other.to_string())),
        }
    }
}

/// Resource ceilings applied per worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    pub memory_hard: u64,
    pub memory_soft: u64,
    pub time_cpu: u32,
    pub time_real: u32,
}

/// Default settings of one environment.
///
/// Fields holding `None` are left out of the generated profile entirely.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvironmentDefaults {
    pub http_port: u16,
    pub workers: u32,
    pub max_cron_threads: u32,
    pub log_level: LogLevel,

    /// Literal value of `without_demo`.
    pub without_demo: bool,
    pub db_maxconn: Option<u32>,
    pub proxy_mode: Option<bool>,
    pub dbfilter: Option<&'static str>,
    pub http_interface: Option<&'static str>,

    /// Whether the database manager may list databases.
    pub list_db: Option<bool>,
    pub limits: Option<Limits>,

    /// Emit `gevent_port` three ports above the HTTP port.
    pub gevent: bool,

    /// Emit `logfile` inside the project's `logs/` directory.
    pub logfile: bool,
    pub dev_mode: Option<&'static str>,
    pub test_enable: bool,
}

/// Environment parsing error types.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EnvironmentError {
    /// Name does not match any supported environment.
    #[error("unknown environment {0:?}, expected one of: development, testing, staging, production, minimal")]
    UnknownEnvironment(String),

    /// Name does not match any supported log level.
    #[error("unknown log level {0:?}, expected one of: debug, info, warn, error")]
    UnknownLogLevel(String),
}
