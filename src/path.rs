// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Path resolution utilities.
//!
//! Determine relevent path information for external files that need to be
//! interacted with, or managed in some way.

use std::path::{Path, PathBuf};

/// Determine default absolute path to settings file.
///
/// Uses XDG Base Directory path `$XDG_CONFIG_HOME/odoo-profile/settings.toml`
/// as the default absolute path for the settings file. Does not check if the
/// path returned actually exists.
///
/// # Errors
///
/// - Return [`NoWayHome`] if home directory path cannot be determined.
///
/// # See Also
///
/// - [XDG Base Directory](https://wiki.archlinux.org/title/XDG_Base_Directory)
pub fn default_settings_file() -> Result<PathBuf> {
    dirs::config_dir()
        .map(|path| path.join("odoo-profile").join("settings.toml"))
        .ok_or(NoWayHome)
}

/// Resolve path to existing file, falling back to a managed directory.
///
/// Returns `path` as is when it exists. Otherwise returns `fallback/path`
/// when that exists. Returns `None` if neither location holds a file.
pub fn resolve_with_fallback(path: impl AsRef<Path>, fallback: impl AsRef<Path>) -> Option<PathBuf> {
    let path = path.as_ref();
    if path.is_file() {
        return Some(path.to_path_buf());
    }

    let candidate = fallback.as_ref().join(path);
    candidate.is_file().then_some(candidate)
}

/// No way to determine user's home directory.
///
/// # See Also
///
/// - [`dirs::home_dir`](https://docs.rs/dirs/latest/dirs/fn.home_dir.html)
#[derive(Clone, Debug, thiserror::Error)]
#[error("cannot determine absolute path to user's home directory")]
pub struct NoWayHome;

/// Friendly result alias :3
pub type Result<T, E = NoWayHome> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs::{create_dir_all, write};

    #[test]
    fn resolve_prefers_given_path() -> anyhow::Result<()> {
        let root = tempfile::tempdir()?;
        let direct = root.path().join("direct.conf");
        write(&direct, "[options]\n")?;

        let result = resolve_with_fallback(&direct, root.path().join("configs"));
        assert_eq!(result, Some(direct));

        Ok(())
    }

    #[test]
    fn resolve_falls_back_to_managed_directory() -> anyhow::Result<()> {
        let root = tempfile::tempdir()?;
        let configs = root.path().join("configs");
        create_dir_all(&configs)?;
        write(configs.join("odoo-testing.conf"), "[options]\n")?;

        let result = resolve_with_fallback("odoo-testing.conf", &configs);
        assert_eq!(result, Some(configs.join("odoo-testing.conf")));

        let result = resolve_with_fallback("odoo-missing.conf", &configs);
        assert_eq!(result, None);

        Ok(())
    }
}
