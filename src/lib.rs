// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Configuration profile manager for local Odoo installations.
//!
//! Generates, lists, validates, backs up, restores, and smoke-tests named
//! configuration profiles for the Odoo server, one per deployment
//! environment.

pub mod config;
pub mod path;
pub mod profile;
pub mod runner;
pub mod smoke;
pub mod store;
pub mod validate;

pub use config::Settings;
pub use profile::{Environment, LogLevel, Overrides, Profile};
pub use runner::{Invocation, ProcessOutput, ProcessRunner, SystemRunner};
pub use smoke::{smoke_test, SmokeError, SmokeOptions, SmokeReport};
pub use store::{ProfileEntry, ProfileStore, StoreError};
pub use validate::{Severity, ValidationReport};
