// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

mod integration;

use anyhow::Result;
use odoo_profile::{ProfileStore, Settings};
use std::{
    fs::{create_dir_all, write},
    path::{Path, PathBuf},
    process::{Command, Output},
};
use tempfile::TempDir;

/// Throwaway Odoo project root.
pub(crate) struct ProjectFixture {
    root: TempDir,
}

impl ProjectFixture {
    pub(crate) fn new() -> Result<Self> {
        let root = tempfile::tempdir()?;

        // INVARIANT: Always provide an explicit settings file.
        //   - Keeps the binary away from the user's own settings.
        write(root.path().join("settings.toml"), "admin_password = \"admin\"\n")?;

        Ok(Self { root })
    }

    /// Create every default addon candidate directory.
    pub(crate) fn with_addons(self) -> Result<Self> {
        for dir in ["odoo/addons", "enterprise", "custom-addons", "addons"] {
            create_dir_all(self.root.path().join(dir))?;
        }

        Ok(self)
    }

    pub(crate) fn path(&self) -> &Path {
        self.root.path()
    }

    pub(crate) fn settings(&self) -> Settings {
        Settings::default().with_project_root(self.root.path())
    }

    pub(crate) fn store(&self) -> ProfileStore {
        ProfileStore::new(self.settings())
    }

    pub(crate) fn write(&self, relative: impl AsRef<Path>, contents: impl AsRef<str>) -> Result<PathBuf> {
        let path = self.root.path().join(relative);
        if let Some(parent) = path.parent() {
            create_dir_all(parent)?;
        }
        write(&path, contents.as_ref())?;

        Ok(path)
    }

    /// Run the odoo-profile binary against this project.
    pub(crate) fn cli<I, S>(&self, args: I) -> Result<Output>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<std::ffi::OsStr>,
    {
        let output = Command::new(env!("CARGO_BIN_EXE_odoo-profile"))
            .arg("--settings")
            .arg(self.root.path().join("settings.toml"))
            .arg("--root")
            .arg(self.root.path())
            .args(args)
            .env("RUST_LOG", "info")
            .output()?;

        Ok(output)
    }
}
