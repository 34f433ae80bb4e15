// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Settings layout.
//!
//! Specify the layout of the settings file that odoo-profile reads at start
//! up. Every profile operation receives its defaults through [`Settings`]
//! instead of reading the process environment, so two stores built from two
//! settings values never interfere with each other.
//!
//! # General Layout
//!
//! ```toml
//! project_root = "~/src/odoo-project"
//! file_prefix = "odoo"
//! admin_password = "admin"
//! smoke_timeout_secs = 120
//!
//! [database]
//! host = "localhost"
//! port = 5432
//! user = "odoo"
//!
//! [addons]
//! core = "odoo/addons"
//! enterprise = "enterprise"
//! local = "custom-addons"
//! project = "addons"
//! ```
//!
//! Every field is optional. Path fields go through shell expansion, so
//! `~` and `$VARIABLE` references are resolved while parsing.

use serde::{Deserialize, Serialize};
use std::{
    fmt::{Display, Error as FmtError, Formatter, Result as FmtResult},
    fs::read_to_string,
    path::{Path, PathBuf},
    str::FromStr,
    time::Duration,
};

/// Directory holding generated profiles, relative to the project root.
pub const CONFIGS_DIR: &str = "configs";

/// Directory holding profile backups, relative to the project root.
pub const BACKUPS_DIR: &str = "backups";

/// Directory holding operational logs, relative to the project root.
pub const LOGS_DIR: &str = "logs";

/// Settings for a profile store.
#[derive(Debug, PartialEq, Eq, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    /// Root of the Odoo project that owns `configs/`, `backups/`, and `logs/`.
    pub project_root: PathBuf,

    /// Prefix of generated profile file names, i.e., `<prefix>-<env>.conf`.
    pub file_prefix: String,

    /// Master password written to `admin_passwd`.
    pub admin_password: String,

    /// Explicit path to the Odoo server binary.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub odoo_bin: Option<PathBuf>,

    /// Wall-clock bound of a smoke test in seconds.
    pub smoke_timeout_secs: u64,

    /// Database connection defaults.
    pub database: DatabaseSettings,

    /// Candidate addon directories.
    pub addons: AddonsSettings,
}

impl Settings {
    /// Load settings from file at target path.
    ///
    /// # Errors
    ///
    /// - Return [`SettingsError::Read`] if file cannot be read.
    /// - Return [`SettingsError::Deserialize`] if file is not valid TOML.
    /// - Return [`SettingsError::ShellExpansion`] if a path field references
    ///   an undefined variable.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let data = read_to_string(path.as_ref()).map_err(|err| SettingsError::Read {
            source: err,
            path: path.as_ref().to_path_buf(),
        })?;

        data.parse()
    }

    /// Replace project root.
    pub fn with_project_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.project_root = root.into();
        self
    }

    /// Absolute or root-relative path to `configs/`.
    pub fn configs_dir(&self) -> PathBuf {
        self.project_root.join(CONFIGS_DIR)
    }

    /// Absolute or root-relative path to `backups/`.
    pub fn backups_dir(&self) -> PathBuf {
        self.project_root.join(BACKUPS_DIR)
    }

    /// Absolute or root-relative path to `logs/`.
    pub fn logs_dir(&self) -> PathBuf {
        self.project_root.join(LOGS_DIR)
    }

    /// Smoke test bound as [`Duration`].
    pub fn smoke_timeout(&self) -> Duration {
        Duration::from_secs(self.smoke_timeout_secs)
    }

    /// Addon candidates resolved against the project root.
    ///
    /// Order is fixed: core, enterprise, local-custom, project-custom.
    pub fn addon_candidates(&self) -> [PathBuf; 4] {
        let resolve = |path: &PathBuf| {
            if path.is_absolute() {
                path.clone()
            } else {
                self.project_root.join(path)
            }
        };

        [
            resolve(&self.addons.core),
            resolve(&self.addons.enterprise),
            resolve(&self.addons.local),
            resolve(&self.addons.project),
        ]
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            project_root: PathBuf::from("."),
            file_prefix: "odoo".into(),
            admin_password: "admin".into(),
            odoo_bin: None,
            smoke_timeout_secs: 120,
            database: DatabaseSettings::default(),
            addons: AddonsSettings::default(),
        }
    }
}

impl FromStr for Settings {
    type Err = SettingsError;

    fn from_str(data: &str) -> Result<Self, Self::Err> {
        let mut settings: Settings = toml::de::from_str(data).map_err(SettingsError::Deserialize)?;

        // INVARIANT: Perform shell expansion on every path field.
        settings.project_root = expand_path(&settings.project_root)?;
        settings.odoo_bin = settings.odoo_bin.as_deref().map(expand_path).transpose()?;
        settings.addons.core = expand_path(&settings.addons.core)?;
        settings.addons.enterprise = expand_path(&settings.addons.enterprise)?;
        settings.addons.local = expand_path(&settings.addons.local)?;
        settings.addons.project = expand_path(&settings.addons.project)?;

        Ok(settings)
    }
}

impl Display for Settings {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        fmt.write_str(
            toml::ser::to_string_pretty(self)
                .map_err(SettingsError::Serialize)?
                .as_str(),
        )
    }
}

/// Database connection defaults.
#[derive(Debug, PartialEq, Eq, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DatabaseSettings {
    pub host: String,
    pub port: u16,
    pub user: String,

    /// Password of database user, `None` means peer authentication.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            host: "localhost".into(),
            port: 5432,
            user: "odoo".into(),
            password: None,
        }
    }
}

/// Candidate addon directories, probed in declaration order.
#[derive(Debug, PartialEq, Eq, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AddonsSettings {
    /// Addons shipped with the Odoo source tree.
    pub core: PathBuf,

    /// Enterprise addons checkout.
    pub enterprise: PathBuf,

    /// Addons local to the developer's machine.
    pub local: PathBuf,

    /// Addons tracked by the project itself.
    pub project: PathBuf,
}

impl Default for AddonsSettings {
    fn default() -> Self {
        Self {
            core: PathBuf::from("odoo/addons"),
            enterprise: PathBuf::from("enterprise"),
            local: PathBuf::from("custom-addons"),
            project: PathBuf::from("addons"),
        }
    }
}

fn expand_path(path: &Path) -> Result<PathBuf> {
    Ok(PathBuf::from(
        shellexpand::full(path.to_string_lossy().as_ref())
            .map_err(SettingsError::ShellExpansion)?
            .into_owned(),
    ))
}

/// Settings error types.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    /// Settings file cannot be read.
    #[error("failed to read settings file at {:?}", path.display())]
    Read {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },

    /// Failed to deserialize settings.
    #[error(transparent)]
    Deserialize(#[from] toml::de::Error),

    /// Failed to serialize settings.
    #[error(transparent)]
    Serialize(#[from] toml::ser::Error),

    /// Failed to perform shell expansion on settings.
    #[error(transparent)]
    ShellExpansion(#[from] shellexpand::LookupError<std::env::VarError>),
}

impl From<SettingsError> for FmtError {
    fn from(_: SettingsError) -> Self {
        FmtError
    }
}

/// Friendly result alias :3
type Result<T, E = SettingsError> = std::result::Result<T, E>;
