//! Strictly Wager - sandbox CLI
//!
//! Runs scripted sessions against the game registry.

#![warn(missing_docs)]

mod cli;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Command};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use strictly_wager::{
    AccountId, Amount, CallReport, Game, GameState, Position, RegistryEvent, Script, Session,
    WagerConfig,
};
use tracing::{info, instrument};
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Play {
            script,
            config,
            json,
        } => run_play(script, config, json),
        Command::Config { config } => run_config(config.as_deref()),
    }
}

/// Everything a finished session reports.
#[derive(Serialize)]
struct PlayReport<'a> {
    calls: &'a [CallReport],
    events: &'a [RegistryEvent],
    games: &'a [Game],
    balances: &'a BTreeMap<AccountId, Amount>,
    total_escrowed: Amount,
}

/// Run a scripted session and print what happened
#[instrument]
fn run_play(script_path: PathBuf, config_path: Option<PathBuf>, json: bool) -> Result<()> {
    let config = WagerConfig::load(config_path.as_deref())?;
    let script = Script::from_file(&script_path)?;

    let mut session = Session::with_accounts(config, &script)?;
    let calls = session.run(&script);
    let accepted = calls.iter().filter(|report| report.is_accepted()).count();
    info!(accepted, rejected = calls.len() - accepted, "Script finished");

    let registry = session.registry();
    let report = PlayReport {
        calls: &calls,
        events: registry.events(),
        games: registry.games(),
        balances: registry.treasury().balances(),
        total_escrowed: registry.total_escrowed(),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }
    Ok(())
}

fn print_report(report: &PlayReport<'_>) {
    println!("Calls:");
    for call in report.calls {
        match (call.outcome(), call.error()) {
            (_, Some(error)) => println!("  [t={}] {} -> rejected: {}", call.at(), call.call(), error),
            (Some(outcome), None) => println!("  [t={}] {} -> {:?}", call.at(), call.call(), outcome),
            (None, None) => println!("  [t={}] {}", call.at(), call.call()),
        }
    }

    println!("\nEvents:");
    for event in report.events {
        println!("  {:?}", event);
    }

    println!("\nGames:");
    for game in report.games {
        let outcome = game
            .outcome()
            .map_or_else(|| format!("{:?}", game.state()), |outcome| outcome.to_string());
        println!("  #{} ({}):", game.id(), outcome);
        for line in game.board().display().lines() {
            println!("    {}", line);
        }
        if *game.state() == GameState::InProgress {
            let open: Vec<String> = Position::valid_moves(game.board())
                .iter()
                .map(|pos| pos.to_index().to_string())
                .collect();
            println!("    open cells: {}", open.join(", "));
        }
    }

    println!("\nBalances:");
    for (account, balance) in report.balances {
        println!("  {}: {}", account, balance);
    }
    println!("  (escrowed: {})", report.total_escrowed);
}

/// Print the effective configuration as TOML
#[instrument]
fn run_config(config_path: Option<&Path>) -> Result<()> {
    let config = WagerConfig::load(config_path)?;
    print!("{}", toml::to_string(&config)?);
    Ok(())
}
