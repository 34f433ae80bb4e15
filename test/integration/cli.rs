// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

use crate::ProjectFixture;

use anyhow::Result;
use simple_test_case::test_case;
use std::fs::read_to_string;

#[test]
fn create_writes_profile_into_configs() -> Result<()> {
    let fixture = ProjectFixture::new()?.with_addons()?;
    let output = fixture.cli(["create", "testing", "--workers", "2"])?;

    pretty_assertions::assert_eq!(output.status.code(), Some(0));
    let path = fixture.path().join("configs").join("odoo-testing.conf");
    pretty_assertions::assert_eq!(
        String::from_utf8_lossy(&output.stdout).trim(),
        path.display().to_string()
    );
    assert!(read_to_string(&path)?.contains("workers = 2"));

    Ok(())
}

#[test_case(&["create", "qa"]; "unknown environment")]
#[test_case(&["create"]; "missing environment")]
#[test_case(&["create", "testing", "--log-level", "verbose"]; "unknown log level")]
#[test_case(&["create", "testing", "--enable-demo", "--disable-demo"]; "conflicting demo flags")]
#[test_case(&["frobnicate"]; "unknown command")]
#[test_case(&["validate", "odoo-nowhere.conf"]; "missing profile")]
#[test_case(&["restore", "odoo-testing.conf"]; "missing backup")]
#[test]
fn usage_and_lookup_errors_exit_one(args: &[&str]) {
    let fixture = ProjectFixture::new().unwrap();
    let output = fixture.cli(args).unwrap();

    pretty_assertions::assert_eq!(output.status.code(), Some(1));
}

#[test_case(&["--help"]; "help")]
#[test_case(&["--version"]; "version")]
#[test_case(&["list"]; "empty listing")]
#[test]
fn informational_commands_exit_zero(args: &[&str]) {
    let fixture = ProjectFixture::new().unwrap();
    let output = fixture.cli(args).unwrap();

    pretty_assertions::assert_eq!(output.status.code(), Some(0));
}

#[test]
fn validate_exit_code_follows_errors_only() -> Result<()> {
    let fixture = ProjectFixture::new()?.with_addons()?;
    fixture.write("configs/broken.conf", "db_host = localhost\n")?;
    pretty_assertions::assert_eq!(fixture.cli(["create", "development"])?.status.code(), Some(0));

    let broken = fixture.cli(["validate", "broken.conf"])?;
    pretty_assertions::assert_eq!(broken.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&broken.stderr).contains("missing [options] section header"));

    // Insecure default admin password is only a warning.
    let warned = fixture.cli(["validate", "odoo-development.conf"])?;
    pretty_assertions::assert_eq!(warned.status.code(), Some(0));
    assert!(String::from_utf8_lossy(&warned.stderr).contains("admin_passwd"));

    Ok(())
}

#[test]
fn list_prints_profiles_with_environment() -> Result<()> {
    let fixture = ProjectFixture::new()?;
    fixture.cli(["create", "production"])?;
    fixture.write("configs/legacy.conf", "[options]\n")?;

    let output = fixture.cli(["list"])?;
    pretty_assertions::assert_eq!(output.status.code(), Some(0));
    let result = String::from_utf8_lossy(&output.stdout)
        .lines()
        .map(|line| line.split_whitespace().take(2).collect::<Vec<_>>().join(" "))
        .collect::<Vec<_>>();
    pretty_assertions::assert_eq!(result, vec!["legacy.conf unknown", "odoo-production.conf production"]);

    Ok(())
}

#[test]
fn show_prints_profile_verbatim() -> Result<()> {
    let fixture = ProjectFixture::new()?;
    let path = fixture.write("configs/custom.conf", "[options]\n; keep me\nworkers = 1\n")?;

    let output = fixture.cli(["show", "custom.conf"])?;
    pretty_assertions::assert_eq!(output.status.code(), Some(0));
    pretty_assertions::assert_eq!(String::from_utf8_lossy(&output.stdout), read_to_string(path)?);

    Ok(())
}

#[test]
fn backup_then_restore_round_trip() -> Result<()> {
    let fixture = ProjectFixture::new()?;
    fixture.cli(["create", "staging"])?;
    let live = fixture.path().join("configs").join("odoo-staging.conf");
    let original = read_to_string(&live)?;

    let output = fixture.cli(["backup", "odoo-staging.conf"])?;
    pretty_assertions::assert_eq!(output.status.code(), Some(0));
    let backup = String::from_utf8_lossy(&output.stdout).trim().to_string();

    fixture.write("configs/odoo-staging.conf", "[options]\n")?;
    let output = fixture.cli(["restore", backup.as_str()])?;
    pretty_assertions::assert_eq!(output.status.code(), Some(0));
    pretty_assertions::assert_eq!(read_to_string(&live)?, original);

    Ok(())
}

#[test]
fn smoke_test_refuses_invalid_profile() -> Result<()> {
    let fixture = ProjectFixture::new()?;
    fixture.write("configs/broken.conf", "[options]\n")?;

    let output = fixture.cli(["test", "broken.conf"])?;
    pretty_assertions::assert_eq!(output.status.code(), Some(1));
    assert!(!fixture.path().join("logs").exists());

    Ok(())
}

#[test]
fn usage_goes_to_stdout_for_help_and_stderr_for_errors() -> Result<()> {
    let fixture = ProjectFixture::new()?;

    let help = fixture.cli(["--help"])?;
    pretty_assertions::assert_eq!(help.status.code(), Some(0));
    assert!(String::from_utf8_lossy(&help.stdout).contains("Commands"));

    let unknown = fixture.cli(["frobnicate"])?;
    pretty_assertions::assert_eq!(unknown.status.code(), Some(1));
    assert!(unknown.stdout.is_empty());
    assert!(String::from_utf8_lossy(&unknown.stderr).contains("frobnicate"));

    Ok(())
}
