// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

use crate::ProjectFixture;

use anyhow::Result;
use odoo_profile::{profile::ProfileDocument, Environment, Overrides, Severity, StoreError};
use pretty_assertions::assert_eq;
use std::fs::{read_to_string, write};

fn without_timestamp(content: &str) -> String {
    content
        .lines()
        .filter(|line| !line.starts_with("# Generated at"))
        .collect::<Vec<_>>()
        .join("\n")
}

#[test]
fn default_profiles_validate_without_errors() -> Result<()> {
    let fixture = ProjectFixture::new()?.with_addons()?;
    let store = fixture.store();

    for environment in Environment::ALL {
        let path = store.create(environment, &Overrides::default())?;
        let report = store.validate(&path)?;

        assert_eq!(report.error_count(), 0, "{environment} has errors");
        // Only the insecure default admin password is flagged.
        assert_eq!(report.warning_count(), 1, "{environment} has extra warnings");
        assert!(report.passed());
    }

    Ok(())
}

#[test]
fn testing_profile_content() -> Result<()> {
    let fixture = ProjectFixture::new()?.with_addons()?;
    let store = fixture.store();

    store.create(Environment::Testing, &Overrides::default())?;
    let document = ProfileDocument::from(store.show("odoo-testing.conf")?);

    assert_eq!(document.get("workers"), Some("0"));
    assert_eq!(document.get("log_level"), Some("error"));
    assert_eq!(document.get("without_demo"), Some("False"));
    assert_eq!(document.get("dbfilter"), Some("test_.*"));
    assert_eq!(document.get("limit_time_cpu"), Some("600"));

    let expect = ["odoo/addons", "enterprise", "custom-addons", "addons"]
        .iter()
        .map(|dir| fixture.path().join(dir).display().to_string())
        .collect::<Vec<_>>()
        .join(",");
    assert_eq!(document.get("addons_path"), Some(expect.as_str()));

    Ok(())
}

#[test]
fn create_is_idempotent_apart_from_timestamp() -> Result<()> {
    let fixture = ProjectFixture::new()?;
    let store = fixture.store();
    let overrides = Overrides {
        workers: Some(3),
        db_host: Some("db.internal".into()),
        ..Overrides::default()
    };

    let path = store.create(Environment::Staging, &overrides)?;
    let first = read_to_string(&path)?;
    let path = store.create(Environment::Staging, &overrides)?;
    let second = read_to_string(&path)?;

    assert_eq!(without_timestamp(&first), without_timestamp(&second));

    Ok(())
}

#[test]
fn restore_brings_back_backed_up_content() -> Result<()> {
    let fixture = ProjectFixture::new()?.with_addons()?;
    let store = fixture.store();

    let live = store.create(Environment::Development, &Overrides::default())?;
    let original = read_to_string(&live)?;
    let backup = store.backup("odoo-development.conf")?;
    assert!(backup.starts_with(fixture.path().join("backups")));

    write(&live, "[options]\nworkers = 16\n")?;

    let backup_name = backup.file_name().map(|name| name.to_os_string()).unwrap_or_default();
    let restored = store.restore(&backup_name)?;
    assert_eq!(restored, live);
    assert_eq!(read_to_string(&restored)?, original);

    Ok(())
}

#[test]
fn list_tags_profiles_by_environment() -> Result<()> {
    let fixture = ProjectFixture::new()?;
    let store = fixture.store();

    store.create(Environment::Development, &Overrides::default())?;
    store.create(Environment::Testing, &Overrides::default())?;

    let entries = store.list()?.collect::<Result<Vec<_>, _>>()?;
    let result = entries
        .iter()
        .map(|entry| (entry.file_name.as_str(), entry.environment_name()))
        .collect::<Vec<_>>();
    assert_eq!(
        result,
        vec![
            ("odoo-development.conf", "development"),
            ("odoo-testing.conf", "testing"),
        ]
    );
    assert!(entries.iter().all(|entry| entry.size > 0));

    Ok(())
}

#[test]
fn list_marks_foreign_files_unknown() -> Result<()> {
    let fixture = ProjectFixture::new()?;
    fixture.write("configs/legacy.conf", "[options]\n")?;
    fixture.write("configs/odoo-qa.conf", "[options]\n")?;
    fixture.write("configs/notes.txt", "ignored\n")?;

    let entries = fixture.store().list()?.collect::<Result<Vec<_>, _>>()?;
    let result = entries
        .iter()
        .map(|entry| (entry.file_name.as_str(), entry.environment_name()))
        .collect::<Vec<_>>();
    assert_eq!(
        result,
        vec![("legacy.conf", "unknown"), ("odoo-qa.conf", "unknown")]
    );

    Ok(())
}

#[test]
fn validation_findings_by_severity() -> Result<()> {
    let fixture = ProjectFixture::new()?.with_addons()?;
    let addons = fixture.path().join("addons");
    fixture.write(
        "configs/weak.conf",
        format!(
            "[options]\naddons_path = {}\nadmin_passwd = admin\ndb_host = localhost\ndb_port = 5432\ndb_user = odoo\nxmlrpc_port = 8069\n",
            addons.display()
        ),
    )?;
    fixture.write(
        "configs/hostless.conf",
        format!(
            "[options]\naddons_path = {}\nadmin_passwd = 1f9a\ndb_port = 5432\ndb_user = odoo\nxmlrpc_port = 8069\n",
            addons.display()
        ),
    )?;
    let store = fixture.store();

    let weak = store.validate("weak.conf")?;
    assert_eq!(weak.error_count(), 0);
    assert_eq!(weak.warning_count(), 1);
    assert!(weak.passed());

    let hostless = store.validate("hostless.conf")?;
    assert_eq!(hostless.error_count(), 1);
    assert_eq!(hostless.findings()[0].severity, Severity::Error);
    assert!(!hostless.passed());

    Ok(())
}

#[test]
fn restore_rejects_backup_without_timestamp() -> Result<()> {
    let fixture = ProjectFixture::new()?;
    fixture.write("backups/odoo-testing.conf", "[options]\n")?;

    let result = fixture.store().restore("odoo-testing.conf");
    assert!(matches!(result, Err(StoreError::InvalidBackupName(_))));

    Ok(())
}

#[test]
fn diff_environments() -> Result<()> {
    let fixture = ProjectFixture::new()?;
    let store = fixture.store();
    store.create(Environment::Testing, &Overrides::default())?;
    store.create(Environment::Production, &Overrides::default())?;

    let diffs = store.diff("odoo-testing.conf", "odoo-production.conf")?;
    let workers = diffs
        .iter()
        .find(|diff| diff.key == "workers")
        .map(ToString::to_string);
    assert_eq!(workers.as_deref(), Some("workers: 0 -> 4"));
    assert!(diffs.iter().all(|diff| diff.key != "db_host"));

    Ok(())
}
