use anyhow::Context;
use colored::Colorize;
use mds_server::{MetadataServer, ServerConfig};
use mds_store::{open_store, StoreBackend};
use mds_types::validate_key;

use crate::cli::*;

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Command::Serve(args) => cmd_serve(args),
        Command::Migrate(args) => cmd_migrate(args),
        Command::CheckKey(args) => cmd_check_key(args),
    }
}

/// Load the config file if given, then apply command-line overrides.
fn resolve_config(args: &StoreArgs) -> anyhow::Result<ServerConfig> {
    let mut config = match &args.config {
        Some(path) => ServerConfig::load(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => ServerConfig::default(),
    };
    if args.in_memory {
        config.store.backend = StoreBackend::Memory;
    } else if let Some(db) = &args.db {
        config.store.backend = StoreBackend::Sqlite;
        config.store.path = db.clone();
    }
    Ok(config)
}

fn cmd_serve(args: ServeArgs) -> anyhow::Result<()> {
    let mut config = resolve_config(&args.store)?;
    if let Some(bind) = args.bind {
        config.bind_addr = bind;
    }
    tracing::info!(
        bind = %config.bind_addr,
        backend = ?config.store.backend,
        "starting metadata server"
    );

    let server = MetadataServer::from_config(config).context("opening metadata store")?;
    let runtime = tokio::runtime::Runtime::new().context("starting async runtime")?;
    runtime.block_on(server.serve())?;
    Ok(())
}

fn cmd_migrate(args: MigrateArgs) -> anyhow::Result<()> {
    let config = resolve_config(&args.into())?;
    if config.store.backend == StoreBackend::Memory {
        println!(
            "{} Memory backend keeps no schema; nothing to migrate",
            "!".yellow().bold()
        );
        return Ok(());
    }
    let store = open_store(&config.store).context("migrating metadata store")?;
    println!(
        "{} Schema ready ({} at {})",
        "✓".green().bold(),
        store.backend_name().bold(),
        config.store.path.display()
    );
    Ok(())
}

fn cmd_check_key(args: CheckKeyArgs) -> anyhow::Result<()> {
    let mut invalid = 0usize;
    for key in &args.keys {
        match validate_key(key) {
            Ok(()) => println!("  {} {}", "valid:".green(), key),
            Err(err) => {
                invalid += 1;
                println!("  {} {:?}: {}", "invalid:".red(), key, err);
            }
        }
    }
    if invalid > 0 {
        anyhow::bail!("{invalid} of {} keys are invalid", args.keys.len());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::{CommandFactory, Parser};
    use std::path::PathBuf;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parse_serve_flags() {
        let cli = Cli::parse_from(["mds", "serve", "--bind", "0.0.0.0:8080", "--db", "x.db"]);
        match cli.command {
            Command::Serve(args) => {
                assert_eq!(args.bind.unwrap().port(), 8080);
                assert_eq!(args.store.db, Some(PathBuf::from("x.db")));
            }
            _ => panic!("expected serve"),
        }
    }

    #[test]
    fn db_and_in_memory_conflict() {
        assert!(Cli::try_parse_from(["mds", "serve", "--db", "x.db", "--in-memory"]).is_err());
    }

    #[test]
    fn migrate_has_no_in_memory_flag() {
        assert!(Cli::try_parse_from(["mds", "migrate", "--in-memory"]).is_err());
        assert!(Cli::try_parse_from(["mds", "migrate", "--db", "x.db"]).is_ok());
    }

    #[test]
    fn migrate_creates_database_file() {
        let dir = tempfile::tempdir().unwrap();
        let db = dir.path().join("m.db");
        cmd_migrate(MigrateArgs {
            config: None,
            db: Some(db.clone()),
        })
        .unwrap();
        assert!(db.exists());
    }

    #[test]
    fn migrate_skips_memory_backend_from_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mds.toml");
        std::fs::write(&path, "[store]\nbackend = \"memory\"\n").unwrap();
        cmd_migrate(MigrateArgs {
            config: Some(path),
            db: None,
        })
        .unwrap();
        assert!(!dir.path().join("metadata.db").exists());
    }

    #[test]
    fn overrides_apply_over_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mds.toml");
        std::fs::write(&path, "bind_addr = \"127.0.0.1:4000\"\n[store]\nbackend = \"memory\"\n")
            .unwrap();

        let from_file = resolve_config(&StoreArgs {
            config: Some(path.clone()),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(from_file.bind_addr.port(), 4000);
        assert_eq!(from_file.store.backend, StoreBackend::Memory);

        let overridden = resolve_config(&StoreArgs {
            config: Some(path),
            db: Some(dir.path().join("m.db")),
            in_memory: false,
        })
        .unwrap();
        assert_eq!(overridden.bind_addr.port(), 4000);
        assert_eq!(overridden.store.backend, StoreBackend::Sqlite);
        assert_eq!(overridden.store.path, dir.path().join("m.db"));
    }

    #[test]
    fn check_key_reports_failures() {
        assert!(cmd_check_key(CheckKeyArgs { keys: vec!["ok.key".into()] }).is_ok());
        assert!(cmd_check_key(CheckKeyArgs {
            keys: vec!["ok".into(), "not ok".into()]
        })
        .is_err());
    }
}
