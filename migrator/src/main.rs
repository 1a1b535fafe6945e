//! Wallet state migrator.
//!
//! Brings a persisted wallet state file (`version`-tagged JSON) up to the
//! latest schema, or reports how far behind it is.

use std::path::{Path, PathBuf};

use anyhow::{Result, bail};
use clap::{Parser, Subcommand};

use migrator::core::invariants::check_registry;
use migrator::core::registry::MigrationRegistry;
use migrator::exit_codes;
use migrator::io::config::load_config;
use migrator::logging;
use migrator::upgrade::{UpgradeOptions, inspect_file, upgrade_file};
use migrator::wallet::{self, NoAddresses};

#[derive(Parser)]
#[command(
    name = "migrator",
    version,
    about = "Versioned wallet state migrator"
)]
struct Cli {
    /// Path to the migrator config (defaults apply if the file is missing).
    #[arg(long, global = true, default_value = "migrator.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the state's version and whether it needs migration.
    Status {
        /// State file to inspect.
        state: PathBuf,
    },
    /// List the migrations that would run, without running them.
    Plan {
        /// State file to inspect.
        state: PathBuf,
    },
    /// Migrate the state file in place.
    Migrate {
        /// State file to migrate.
        state: PathBuf,
        /// Run the migrations but do not write the result.
        #[arg(long)]
        dry_run: bool,
    },
    /// Check the built-in registry for ordering mistakes.
    Check,
}

fn main() {
    logging::init();
    match run() {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("{:#}", err);
            std::process::exit(exit_codes::INVALID);
        }
    }
}

fn run() -> Result<i32> {
    let cli = Cli::parse();
    let registry = build_registry(&cli.config)?;
    match cli.command {
        Command::Status { state } => cmd_status(&state, &registry),
        Command::Plan { state } => cmd_plan(&state, &registry),
        Command::Migrate { state, dry_run } => cmd_migrate(&state, &registry, dry_run),
        Command::Check => cmd_check(&registry),
    }
}

fn build_registry(config_path: &Path) -> Result<MigrationRegistry> {
    let cfg = load_config(config_path)?;
    Ok(wallet::registry(&cfg, NoAddresses))
}

fn cmd_status(path: &Path, registry: &MigrationRegistry) -> Result<i32> {
    let status = inspect_file(path, registry)?;
    println!("version: {}", status.version);
    println!("latest: {}", status.latest);
    if status.is_ahead() {
        println!("state is newer than this migrator");
        return Ok(exit_codes::AHEAD);
    }
    if status.needs_migration() {
        println!("migration needed ({} pending)", status.pending.len());
        return Ok(exit_codes::PENDING);
    }
    println!("up to date");
    Ok(exit_codes::OK)
}

fn cmd_plan(path: &Path, registry: &MigrationRegistry) -> Result<i32> {
    let status = inspect_file(path, registry)?;
    for (version, name) in &status.pending {
        println!("v{} {}", version, name);
    }
    Ok(exit_codes::OK)
}

fn cmd_migrate(path: &Path, registry: &MigrationRegistry, dry_run: bool) -> Result<i32> {
    let report = upgrade_file(path, registry, UpgradeOptions { dry_run })?;
    if report.is_ahead() {
        eprintln!(
            "state v{} is newer than latest v{}; left unchanged",
            report.from_version, report.latest_version
        );
        return Ok(exit_codes::AHEAD);
    }
    if report.applied.is_empty() && report.failure.is_none() {
        println!("up to date at v{}", report.reached_version);
        return Ok(exit_codes::OK);
    }
    println!(
        "migrated v{} -> v{}{}",
        report.from_version,
        report.reached_version,
        if dry_run { " (dry run)" } else { "" }
    );
    if let Some(failure) = &report.failure {
        eprintln!(
            "failed to migrate to v{} ({}): {}",
            failure.version, failure.name, failure.cause
        );
        return Ok(exit_codes::PARTIAL);
    }
    Ok(exit_codes::OK)
}

fn cmd_check(registry: &MigrationRegistry) -> Result<i32> {
    let errors = check_registry(registry);
    if !errors.is_empty() {
        bail!("registry invariant violations:\n- {}", errors.join("\n- "));
    }
    println!("{} migrations, latest v{}", registry.len(), registry.latest_version());
    Ok(exit_codes::OK)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_migrate_dry_run() {
        let cli = Cli::parse_from(["migrator", "migrate", "state.json", "--dry-run"]);
        assert!(matches!(cli.command, Command::Migrate { dry_run: true, .. }));
        assert_eq!(cli.config, PathBuf::from("migrator.toml"));
    }

    #[test]
    fn parse_global_config_after_subcommand() {
        let cli = Cli::parse_from(["migrator", "status", "state.json", "--config", "custom.toml"]);
        assert!(matches!(cli.command, Command::Status { .. }));
        assert_eq!(cli.config, PathBuf::from("custom.toml"));
    }

    #[test]
    fn parse_check() {
        let cli = Cli::parse_from(["migrator", "check"]);
        assert!(matches!(cli.command, Command::Check));
    }
}
