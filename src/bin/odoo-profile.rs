// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

use odoo_profile::{
    path::default_settings_file,
    smoke::{smoke_test, SmokeOptions},
    store::ProfileStore,
    validate::{Severity, ValidationReport},
    Environment, LogLevel, Overrides, Settings, SystemRunner,
};

use anyhow::Result;
use chrono::{DateTime, Local};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use std::{path::PathBuf, process::exit, time::Duration};
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Debug, Clone, Parser)]
#[command(
    about,
    override_usage = "odoo-profile [options] <command>",
    subcommand_help_heading = "Commands",
    version
)]
struct Cli {
    /// Path to settings file.
    #[arg(short, long, global = true, value_name = "path")]
    pub settings: Option<PathBuf>,

    /// Project root owning configs/, backups/, and logs/.
    #[arg(short, long, global = true, value_name = "path")]
    pub root: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    async fn run(self) -> Result<()> {
        let store = ProfileStore::new(load_settings(self.settings, self.root)?);
        match self.command {
            Command::Create(opts) => run_create(&store, opts),
            Command::List => run_list(&store),
            Command::Validate(opts) => run_validate(&store, opts),
            Command::Backup(opts) => run_backup(&store, opts),
            Command::Restore(opts) => run_restore(&store, opts),
            Command::Show(opts) => run_show(&store, opts),
            Command::Test(opts) => run_test(&store, opts).await,
            Command::Diff(opts) => run_diff(&store, opts),
        }
    }
}

#[derive(Debug, Clone, Subcommand)]
enum Command {
    /// Generate profile for environment.
    #[command(override_usage = "odoo-profile create [options] <environment>")]
    Create(CreateOptions),

    /// List generated profiles.
    #[command(override_usage = "odoo-profile list")]
    List,

    /// Validate profile.
    #[command(override_usage = "odoo-profile validate <file>")]
    Validate(FileOptions),

    /// Copy profile into backups under a timestamped name.
    #[command(override_usage = "odoo-profile backup <file>")]
    Backup(FileOptions),

    /// Overwrite live profile with backup.
    #[command(override_usage = "odoo-profile restore <backup_file>")]
    Restore(FileOptions),

    /// Print profile verbatim.
    #[command(override_usage = "odoo-profile show <file>")]
    Show(FileOptions),

    /// Validate profile, then trial launch the server with it.
    #[command(override_usage = "odoo-profile test [options] <file>")]
    Test(TestOptions),

    /// Compare options of two profiles.
    #[command(override_usage = "odoo-profile diff <file> <file>")]
    Diff(DiffOptions),
}

#[derive(Parser, Clone, Debug)]
#[command(author, about, long_about)]
struct CreateOptions {
    /// One of development, testing, staging, production, or minimal.
    #[arg(value_name = "environment")]
    pub environment: String,

    /// HTTP port of the server.
    #[arg(long, value_name = "port")]
    pub port: Option<u16>,

    /// Database host.
    #[arg(long, value_name = "host")]
    pub db_host: Option<String>,

    /// Database port.
    #[arg(long, value_name = "port")]
    pub db_port: Option<u16>,

    /// Database user.
    #[arg(long, value_name = "user")]
    pub db_user: Option<String>,

    /// Master password of the database manager.
    #[arg(long, value_name = "password")]
    pub admin_pass: Option<String>,

    /// Number of worker processes, 0 disables multiprocessing.
    #[arg(long, value_name = "count")]
    pub workers: Option<u32>,

    /// One of debug, info, warn, or error.
    #[arg(long, value_name = "level")]
    pub log_level: Option<LogLevel>,

    /// Load demo data into new databases.
    #[arg(long, conflicts_with = "disable_demo")]
    pub enable_demo: bool,

    /// Skip demo data for new databases.
    #[arg(long)]
    pub disable_demo: bool,
}

impl CreateOptions {
    fn overrides(&self) -> Overrides {
        Overrides {
            workers: self.workers,
            log_level: self.log_level,
            demo_data: match (self.enable_demo, self.disable_demo) {
                (true, _) => Some(true),
                (_, true) => Some(false),
                _ => None,
            },
            http_port: self.port,
            db_host: self.db_host.clone(),
            db_port: self.db_port,
            db_user: self.db_user.clone(),
            admin_password: self.admin_pass.clone(),
        }
    }
}

#[derive(Parser, Clone, Debug)]
#[command(author, about, long_about)]
struct FileOptions {
    /// Path to file, or its name inside the managed directory.
    #[arg(required = true, value_name = "file")]
    pub file: PathBuf,
}

#[derive(Parser, Clone, Debug)]
#[command(author, about, long_about)]
struct TestOptions {
    /// Path to profile, or its name inside configs/.
    #[arg(required = true, value_name = "file")]
    pub file: PathBuf,

    /// Database to initialize against.
    #[arg(short, long, value_name = "name")]
    pub database: Option<String>,

    /// Wall-clock bound in seconds, overrides settings.
    #[arg(short, long, value_name = "secs")]
    pub timeout: Option<u64>,
}

#[derive(Parser, Clone, Debug)]
#[command(author, about, long_about)]
struct DiffOptions {
    #[arg(required = true, value_name = "file")]
    pub left: PathBuf,

    #[arg(required = true, value_name = "file")]
    pub right: PathBuf,
}

#[tokio::main]
async fn main() {
    let layer = fmt::layer()
        .compact()
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr);
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(layer)
        .with(filter)
        .init();

    // INVARIANT: Every argument error exits with 1, help and version with 0.
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(usage) => {
            if let Err(error) = usage.print() {
                error!("failed to print usage: {error}");
                exit(1);
            }
            exit(if usage.use_stderr() { 1 } else { 0 });
        }
    };

    if let Err(error) = cli.run().await {
        error!("{error:?}");
        exit(1);
    }

    exit(0)
}

fn load_settings(path: Option<PathBuf>, root: Option<PathBuf>) -> Result<Settings> {
    let default_path = default_settings_file().ok().filter(|path| path.is_file());
    let settings = match path.or(default_path) {
        Some(path) => {
            info!("load settings from {:?}", path.display());
            Settings::load(path)?
        }
        None => Settings::default(),
    };

    Ok(match root {
        Some(root) => settings.with_project_root(root),
        None => settings,
    })
}

fn run_create(store: &ProfileStore, opts: CreateOptions) -> Result<()> {
    let environment: Environment = opts.environment.parse()?;
    let path = store.create(environment, &opts.overrides())?;
    println!("{}", path.display());

    Ok(())
}

fn run_list(store: &ProfileStore) -> Result<()> {
    let mut count = 0;
    for entry in store.list()? {
        let entry = entry?;
        let modified = entry
            .modified
            .map(|time| DateTime::<Local>::from(time).format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_else(|| "-".into());
        println!(
            "{:<32} {:<12} {:>8} {}",
            entry.file_name,
            entry.environment_name(),
            entry.size,
            modified
        );
        count += 1;
    }

    if count == 0 {
        info!("no profiles in {:?}", store.settings().configs_dir().display());
    }

    Ok(())
}

fn run_validate(store: &ProfileStore, opts: FileOptions) -> Result<()> {
    let report = store.validate(&opts.file)?;
    log_findings(&report);
    report.ensure_passed(&opts.file)?;

    Ok(())
}

fn run_backup(store: &ProfileStore, opts: FileOptions) -> Result<()> {
    let path = store.backup(&opts.file)?;
    println!("{}", path.display());

    Ok(())
}

fn run_restore(store: &ProfileStore, opts: FileOptions) -> Result<()> {
    let path = store.restore(&opts.file)?;
    println!("{}", path.display());

    Ok(())
}

fn run_show(store: &ProfileStore, opts: FileOptions) -> Result<()> {
    print!("{}", store.show(&opts.file)?);

    Ok(())
}

async fn run_test(store: &ProfileStore, opts: TestOptions) -> Result<()> {
    let path = store.resolve(&opts.file)?;
    let mut smoke_opts = SmokeOptions::from_settings(store.settings());
    smoke_opts.database = opts.database;
    if let Some(secs) = opts.timeout {
        smoke_opts.timeout = Duration::from_secs(secs);
    }

    let bar = ProgressBar::new_spinner();
    bar.set_style(ProgressStyle::with_template(
        "{spinner:.yellow} {elapsed_precise:.green}  {msg}",
    )?);
    bar.set_message(format!("smoke testing {}", path.display()));
    bar.enable_steady_tick(Duration::from_millis(100));
    let result = smoke_test(store.settings(), &SystemRunner, &path, &smoke_opts).await;
    bar.finish_and_clear();

    let report = result?;
    log_findings(&report.validation);
    info!("smoke test passed, log at {:?}", report.log_path.display());

    Ok(())
}

fn run_diff(store: &ProfileStore, opts: DiffOptions) -> Result<()> {
    let diffs = store.diff(&opts.left, &opts.right)?;
    if diffs.is_empty() {
        info!("profiles define identical options");
    }

    for diff in diffs {
        println!("{diff}");
    }

    Ok(())
}

fn log_findings(report: &ValidationReport) {
    for finding in report.findings() {
        match finding.severity {
            Severity::Error => error!("{finding}"),
            Severity::Warning => warn!("{finding}"),
        }
    }

    info!(
        "{} error(s), {} warning(s)",
        report.error_count(),
        report.warning_count()
    );
}
