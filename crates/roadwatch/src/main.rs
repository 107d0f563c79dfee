//! `roadwatch` - CLI and HTTP server for speed advisories
//!
//! This binary opens the advisory store described by the configuration and
//! either serves it over HTTP or runs a single store operation.

#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;

use roadwatch::cli::{Cli, Command, ConfigCommand};
use roadwatch::{init_logging, Advisory, AdvisoryStore, Config};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbosity());

    let mut config = Config::load_from(cli.config.clone())?;

    match cli.command {
        Command::Serve(cmd) => {
            if let Some(bind) = cmd.bind {
                config.server.bind_address = bind;
                config.validate()?;
            }
            handle_serve(&config)
        }
        Command::Add(args) => {
            let store = open_store(&config)?;
            let advisory = args.into_payload().into_advisory()?;
            let id = store.create(&advisory)?;
            println!("Added advisory {id}");
            Ok(())
        }
        Command::List(cmd) => handle_list(&open_store(&config)?, cmd.json),
        Command::Show(cmd) => handle_show(&open_store(&config)?, cmd.id, cmd.json),
        Command::Update(cmd) => {
            let store = open_store(&config)?;
            let advisory = cmd.advisory.into_payload().into_advisory()?;
            store.update(cmd.id, &advisory)?;
            println!("Updated advisory {}", cmd.id);
            Ok(())
        }
        Command::Delete(cmd) => {
            open_store(&config)?.delete(cmd.id)?;
            println!("Deleted advisory {}", cmd.id);
            Ok(())
        }
        Command::Config(config_cmd) => handle_config(&config, config_cmd),
    }
}

fn open_store(config: &Config) -> anyhow::Result<AdvisoryStore> {
    let path = config.database_path();
    AdvisoryStore::open_with_timeout(&path, config.busy_timeout())
        .with_context(|| format!("opening advisory store at {}", path.display()))
}

fn handle_serve(config: &Config) -> anyhow::Result<()> {
    let addr = config.bind_address()?;
    let store = Arc::new(open_store(config)?);

    let runtime = tokio::runtime::Runtime::new().context("starting async runtime")?;
    runtime.block_on(roadwatch::server::serve(store, addr))?;
    Ok(())
}

fn handle_list(store: &AdvisoryStore, json: bool) -> anyhow::Result<()> {
    let advisories = store.list()?;

    if json {
        let records: Vec<_> = advisories.iter().filter_map(Advisory::to_record).collect();
        println!("{}", serde_json::to_string_pretty(&records)?);
        return Ok(());
    }

    if advisories.is_empty() {
        println!("No advisories.");
        return Ok(());
    }

    println!(
        "{:>5}  {:<9} {:>10} {:>11} {:>7}  {:<28} {:<13}",
        "ID", "CATEGORY", "LAT", "LON", "SPEED", "DAYS", "WINDOW"
    );
    for advisory in &advisories {
        println!(
            "{:>5}  {:<9} {:>10.5} {:>11.5} {:>7}  {:<28} {:<13}",
            advisory.id.unwrap_or_default(),
            advisory.category.as_str(),
            advisory.position.lat,
            advisory.position.lon,
            advisory.speed_limit,
            advisory.recurrence.days.describe(),
            advisory.recurrence.describe_window(),
        );
    }
    Ok(())
}

fn handle_show(store: &AdvisoryStore, id: i64, json: bool) -> anyhow::Result<()> {
    let advisory = store
        .get(id)?
        .ok_or_else(|| roadwatch::Error::not_found(id))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&advisory.to_record())?);
    } else {
        println!("Advisory {id}");
        println!("  Category:    {}", advisory.category);
        println!(
            "  Location:    {}, {}",
            advisory.position.lat, advisory.position.lon
        );
        println!("  Speed limit: {} km/h", advisory.speed_limit);
        println!("  Created at:  {}", advisory.created_at);
        println!("  Days:        {}", advisory.recurrence.days.describe());
        println!("  Time window: {}", advisory.recurrence.describe_window());
    }
    Ok(())
}

fn handle_config(config: &Config, cmd: ConfigCommand) -> anyhow::Result<()> {
    match cmd {
        ConfigCommand::Show { json } => {
            if json {
                println!("{}", serde_json::to_string_pretty(config)?);
            } else {
                println!("Current Configuration");
                println!("=====================");
                println!();
                println!("[Storage]");
                println!("  Database path:      {}", config.database_path().display());
                println!("  Busy timeout (ms):  {}", config.storage.busy_timeout_ms);
                println!();
                println!("[Server]");
                println!("  Bind address:       {}", config.server.bind_address);
            }
        }
        ConfigCommand::Path => {
            println!("{}", Config::default_config_path().display());
        }
        ConfigCommand::Validate { file } => {
            match file {
                Some(path) => {
                    println!("Validating configuration: {}", path.display());
                    Config::validate_file(&path)?;
                }
                None => {
                    let path = Config::default_config_path();
                    println!("Validating configuration: {}", path.display());
                    Config::load_from(Some(path))?;
                }
            }
            println!("Configuration is valid.");
        }
    }
    Ok(())
}
