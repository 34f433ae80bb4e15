// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Profile file layout.
//!
//! Odoo reads its configuration from an INI-style file with one `[options]`
//! section. Each line holds one `key = value` pair. Lines starting with `#`
//! or `;` are comments. Values are plain strings: booleans are spelled
//! `True` and `False`, and lists are joined with commas, so consumers must
//! trim each element themselves.
//!
//! [`ProfileDocument`] keeps entries in insertion order so that rendering the
//! same set of options always yields the same bytes.

use std::fmt::{Display, Formatter, Result as FmtResult};

/// Name of the only section Odoo reads options from.
pub const OPTIONS_SECTION: &str = "options";

/// Ordered set of profile options.
///
/// # Invariant
///
/// - No duplicate keys.
/// - Setting an existing key replaces its value in place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileDocument {
    has_header: bool,
    entries: Vec<(String, String)>,
}

impl ProfileDocument {
    /// Construct empty document with an `[options]` header.
    pub fn new() -> Self {
        Self {
            has_header: true,
            entries: Vec::new(),
        }
    }

    /// Check if document declared the `[options]` section header.
    pub fn has_options_header(&self) -> bool {
        self.has_header
    }

    /// Set option value.
    pub fn set(&mut self, key: impl Into<String>, value: impl ToString) {
        let key = key.into();
        let value = value.to_string();
        match self.entries.iter_mut().find(|(existing, _)| *existing == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    /// Set boolean option using capitalized literals.
    pub fn set_bool(&mut self, key: impl Into<String>, value: bool) {
        self.set(key, bool_literal(value));
    }

    /// Get option value.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(existing, _)| existing == key)
            .map(|(_, value)| value.as_str())
    }

    /// Get option value parsed as an integer.
    ///
    /// Returns `None` if option is missing or not an integer.
    pub fn get_int(&self, key: &str) -> Option<i64> {
        self.get(key).and_then(|value| value.parse().ok())
    }

    /// Iterate over options in document order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(key, value)| (key.as_str(), value.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for ProfileDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for ProfileDocument {
    fn fmt(&self, fmt: &mut Formatter) -> FmtResult {
        if self.has_header {
            writeln!(fmt, "[{OPTIONS_SECTION}]")?;
        }

        for (key, value) in &self.entries {
            writeln!(fmt, "{key} = {value}")?;
        }

        Ok(())
    }
}

impl From<&str> for ProfileDocument {
    fn from(content: &str) -> Self {
        let mut document = Self {
            has_header: false,
            entries: Vec::new(),
        };

        // INVARIANT: Only collect options outside of foreign sections.
        //   - Keys before any header still count, so a missing header does not
        //     hide the keys that follow it.
        let mut in_options = true;
        for line in content.lines().map(str::trim) {
            if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
                continue;
            }

            if let Some(section) = line
                .strip_prefix('[')
                .and_then(|rest| rest.strip_suffix(']'))
            {
                in_options = section.trim() == OPTIONS_SECTION;
                if in_options {
                    document.has_header = true;
                }
                continue;
            }

            if !in_options {
                continue;
            }

            if let Some((key, value)) = line.split_once('=') {
                document.set(key.trim(), value.trim());
            }
        }

        document
    }
}

impl From<String> for ProfileDocument {
    fn from(content: String) -> Self {
        Self::from(content.as_str())
    }
}

/// Serialize boolean the way Odoo spells it.
pub fn bool_literal(value: bool) -> &'static str {
    if value {
        "True"
    } else {
        "False"
    }
}
