// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Profile store management and manipulation.
//!
//! odoo-profile groups generated profiles together into one place called the
//! __profile store__. The store lives inside an Odoo project root and owns
//! three directories exclusively:
//!
//! - `configs/` holds live profiles named `<prefix>-<environment>.conf`.
//! - `backups/` holds timestamped copies named
//!   `<profile>_<YYYYMMDD_HHMMSS>.conf`.
//! - `logs/` holds operational logs, e.g., smoke test output.
//!
//! # Path Resolution
//!
//! Operations that take an existing profile first try the path exactly as
//! given, then fall back to the same name inside `configs/`. Restoring works
//! the same way against `backups/`.
//!
//! # Concurrency
//!
//! Nothing is locked. Two invocations writing the same profile race, and the
//! later write wins.

use crate::{
    config::Settings,
    path::resolve_with_fallback,
    profile::{
        environment_from_file_name, profile_file_name, Environment, Overrides, Profile,
        ProfileDocument,
    },
    validate::ValidationReport,
};

use chrono::Local;
use std::{
    fmt::{Display, Formatter, Result as FmtResult},
    fs::{copy, metadata, read_to_string, write},
    path::{Path, PathBuf},
    time::SystemTime,
};
use tracing::{debug, info, instrument};

/// Profile store rooted at a project directory.
#[derive(Debug, Clone)]
pub struct ProfileStore {
    settings: Settings,
}

impl ProfileStore {
    /// Construct new profile store.
    ///
    /// Does not touch the file system. Directories are created on first
    /// write.
    pub fn new(settings: Settings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Generate profile for environment and write it into `configs/`.
    ///
    /// Overwrites existing profile of the same name without confirmation.
    ///
    /// # Errors
    ///
    /// - Return [`StoreError::CreateDir`] if `configs/` cannot be created.
    /// - Return [`StoreError::Write`] if profile cannot be written.
    #[instrument(skip(self, overrides), level = "debug")]
    pub fn create(&self, environment: Environment, overrides: &Overrides) -> Result<PathBuf> {
        let profile = Profile::build(environment, &self.settings, overrides);
        let configs_dir = self.settings.configs_dir();
        create_dir(&configs_dir)?;

        let path = configs_dir.join(profile_file_name(&self.settings.file_prefix, environment));
        if path.exists() {
            debug!("overwrite existing profile {:?}", path.display());
        }

        write_file(&path, profile.render(Local::now()))?;
        info!("created {environment} profile at {:?}", path.display());

        Ok(path)
    }

    /// List profiles in `configs/`.
    ///
    /// Recomputed from the directory listing on every call, ordered by file
    /// name. Yields nothing if `configs/` does not exist.
    ///
    /// # Errors
    ///
    /// - Return [`StoreError::Pattern`] if `configs/` path cannot be turned
    ///   into a glob pattern.
    pub fn list(&self) -> Result<impl Iterator<Item = Result<ProfileEntry>> + '_> {
        // INVARIANT: Project root is matched literally, even with glob metacharacters.
        let configs_dir = glob::Pattern::escape(self.settings.configs_dir().to_string_lossy().as_ref());
        let pattern = Path::new(&configs_dir).join("*.conf");
        let paths = glob::glob(pattern.to_string_lossy().as_ref())?;

        Ok(paths.map(move |entry| {
            let path = entry.map_err(StoreError::Glob)?;
            let file_name = path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_default();
            let meta = metadata(&path).map_err(|err| StoreError::Read {
                source: err,
                path: path.clone(),
            })?;

            Ok(ProfileEntry {
                environment: environment_from_file_name(&self.settings.file_prefix, &file_name),
                file_name,
                size: meta.len(),
                modified: meta.modified().ok(),
            })
        }))
    }

    /// Resolve existing profile path, falling back to `configs/`.
    ///
    /// # Errors
    ///
    /// - Return [`StoreError::FileNotFound`] if profile cannot be resolved.
    pub fn resolve(&self, path: impl AsRef<Path>) -> Result<PathBuf> {
        resolve_with_fallback(path.as_ref(), self.settings.configs_dir())
            .ok_or_else(|| StoreError::FileNotFound(path.as_ref().to_path_buf()))
    }

    /// Validate profile.
    ///
    /// Never mutates the profile.
    ///
    /// # Errors
    ///
    /// - Return [`StoreError::FileNotFound`] if profile cannot be resolved.
    /// - Return [`StoreError::Read`] if profile cannot be read.
    pub fn validate(&self, path: impl AsRef<Path>) -> Result<ValidationReport> {
        let content = self.show(path)?;
        Ok(ValidationReport::check_str(&content))
    }

    /// Read profile verbatim.
    ///
    /// # Errors
    ///
    /// - Return [`StoreError::FileNotFound`] if profile cannot be resolved.
    /// - Return [`StoreError::Read`] if profile cannot be read.
    pub fn show(&self, path: impl AsRef<Path>) -> Result<String> {
        let path = self.resolve(path)?;
        read_file(&path)
    }

    /// Copy profile into `backups/` under a timestamped name.
    ///
    /// Timestamps have one-second resolution, a second backup within the same
    /// second overwrites the first.
    ///
    /// # Errors
    ///
    /// - Return [`StoreError::FileNotFound`] if profile cannot be resolved.
    /// - Return [`StoreError::CreateDir`] if `backups/` cannot be created.
    /// - Return [`StoreError::Copy`] if profile cannot be copied.
    #[instrument(skip(self, path), level = "debug")]
    pub fn backup(&self, path: impl AsRef<Path>) -> Result<PathBuf> {
        let source = self.resolve(path)?;
        let stem = source
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .ok_or_else(|| StoreError::FileNotFound(source.clone()))?;

        let backups_dir = self.settings.backups_dir();
        create_dir(&backups_dir)?;
        let target = backups_dir.join(backup_file_name(&stem, Local::now()));
        copy_file(&source, &target)?;
        info!("backed up {:?} to {:?}", source.display(), target.display());

        Ok(target)
    }

    /// Restore backup over its live profile in `configs/`.
    ///
    /// Overwrites the live profile unconditionally.
    ///
    /// # Errors
    ///
    /// - Return [`StoreError::FileNotFound`] if backup cannot be resolved.
    /// - Return [`StoreError::InvalidBackupName`] if backup name carries no
    ///   timestamp suffix.
    /// - Return [`StoreError::CreateDir`] if `configs/` cannot be created.
    /// - Return [`StoreError::Copy`] if backup cannot be copied.
    #[instrument(skip(self, backup), level = "debug")]
    pub fn restore(&self, backup: impl AsRef<Path>) -> Result<PathBuf> {
        let source = resolve_with_fallback(backup.as_ref(), self.settings.backups_dir())
            .ok_or_else(|| StoreError::FileNotFound(backup.as_ref().to_path_buf()))?;
        let file_name = source
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        let live_name = original_file_name(&file_name)
            .ok_or_else(|| StoreError::InvalidBackupName(file_name.clone()))?;

        let configs_dir = self.settings.configs_dir();
        create_dir(&configs_dir)?;
        let target = configs_dir.join(live_name);
        copy_file(&source, &target)?;
        info!("restored {:?} from {:?}", target.display(), source.display());

        Ok(target)
    }

    /// Compare options of two profiles.
    ///
    /// Differences follow the option order of the first profile, then options
    /// only present in the second.
    ///
    /// # Errors
    ///
    /// - Return [`StoreError::FileNotFound`] if either profile cannot be
    ///   resolved.
    /// - Return [`StoreError::Read`] if either profile cannot be read.
    pub fn diff(&self, left: impl AsRef<Path>, right: impl AsRef<Path>) -> Result<Vec<OptionDiff>> {
        let left = ProfileDocument::from(self.show(left)?);
        let right = ProfileDocument::from(self.show(right)?);
        Ok(diff_documents(&left, &right))
    }
}

/// Listing entry of a live profile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileEntry {
    pub file_name: String,

    /// Environment parsed from file name, `None` is presented as `unknown`.
    pub environment: Option<Environment>,
    pub size: u64,
    pub modified: Option<SystemTime>,
}

impl ProfileEntry {
    /// Environment name, or `unknown` when file name does not follow the
    /// naming convention.
    pub fn environment_name(&self) -> &'static str {
        self.environment
            .as_ref()
            .map(Environment::as_str)
            .unwrap_or("unknown")
    }
}

/// Difference of one option between two profiles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionDiff {
    pub key: String,
    pub left: Option<String>,
    pub right: Option<String>,
}

impl Display for OptionDiff {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        let show = |value: &Option<String>| value.clone().unwrap_or_else(|| "<unset>".into());
        write!(fmt, "{}: {} -> {}", self.key, show(&self.left), show(&self.right))
    }
}

/// Compare options of two parsed profiles.
pub fn diff_documents(left: &ProfileDocument, right: &ProfileDocument) -> Vec<OptionDiff> {
    let mut diffs = Vec::new();
    for (key, value) in left.iter() {
        let other = right.get(key);
        if other != Some(value) {
            diffs.push(OptionDiff {
                key: key.into(),
                left: Some(value.into()),
                right: other.map(Into::into),
            });
        }
    }

    for (key, value) in right.iter() {
        if left.get(key).is_none() {
            diffs.push(OptionDiff {
                key: key.into(),
                left: None,
                right: Some(value.into()),
            });
        }
    }

    diffs
}

/// Backup file name of profile stem at a point in time.
pub fn backup_file_name(stem: &str, at: chrono::DateTime<Local>) -> String {
    format!("{stem}_{}.conf", at.format("%Y%m%d_%H%M%S"))
}

/// Derive live profile file name from backup file name.
///
/// Strips the `_<digits>_<digits>` timestamp suffix from the file stem.
/// Returns `None` if no such suffix exists.
pub fn original_file_name(backup_name: &str) -> Option<String> {
    let (stem, extension) = match backup_name.rsplit_once('.') {
        Some((stem, extension)) => (stem, Some(extension)),
        None => (backup_name, None),
    };

    let is_digits = |part: &str| !part.is_empty() && part.bytes().all(|byte| byte.is_ascii_digit());
    let (rest, time) = stem.rsplit_once('_')?;
    let (original, date) = rest.rsplit_once('_')?;
    if original.is_empty() || !is_digits(date) || !is_digits(time) {
        return None;
    }

    Some(match extension {
        Some(extension) => format!("{original}.{extension}"),
        None => original.to_string(),
    })
}

fn create_dir(path: &Path) -> Result<()> {
    mkdirp::mkdirp(path).map_err(|err| StoreError::CreateDir {
        source: err,
        path: path.to_path_buf(),
    })?;
    Ok(())
}

fn read_file(path: &Path) -> Result<String> {
    read_to_string(path).map_err(|err| StoreError::Read {
        source: err,
        path: path.to_path_buf(),
    })
}

fn write_file(path: &Path, content: impl AsRef<[u8]>) -> Result<()> {
    write(path, content).map_err(|err| StoreError::Write {
        source: err,
        path: path.to_path_buf(),
    })
}

fn copy_file(from: &Path, to: &Path) -> Result<()> {
    copy(from, to).map_err(|err| StoreError::Copy {
        source: err,
        from: from.to_path_buf(),
        to: to.to_path_buf(),
    })?;
    Ok(())
}

/// All possible error types for profile store interaction.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Profile or backup cannot be resolved.
    #[error("file not found: {:?}", .0.display())]
    FileNotFound(PathBuf),

    /// Backup name lacks the `_<YYYYMMDD>_<HHMMSS>` suffix.
    #[error("backup name {0:?} has no timestamp suffix")]
    InvalidBackupName(String),

    /// Store directory cannot be created.
    #[error("failed to create directory {:?}", path.display())]
    CreateDir {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },

    /// File cannot be read.
    #[error("failed to read {:?}", path.display())]
    Read {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },

    /// File cannot be written.
    #[error("failed to write {:?}", path.display())]
    Write {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },

    /// File cannot be copied.
    #[error("failed to copy {:?} to {:?}", from.display(), to.display())]
    Copy {
        #[source]
        source: std::io::Error,
        from: PathBuf,
        to: PathBuf,
    },

    /// Listing pattern is invalid.
    #[error(transparent)]
    Pattern(#[from] glob::PatternError),

    /// Listing entry cannot be inspected.
    #[error(transparent)]
    Glob(#[from] glob::GlobError),
}

/// Friendly result alias :3
pub type Result<T, E = StoreError> = std::result::Result<T, E>;
