/*
 * Jieqi engine core
 *
 * This program is free software: you can redistribute it and/or modify it
 * under the terms of the GNU General Public License as published by the
 * Free Software Foundation, either version 3 of the License, or (at your
 * option) any later version.
 */

//! The thin CLI surface (spec §6): `moves`, `best`, and `list`, each a
//! direct call into [`jieqi_core::server`]. Argument parsing itself is out
//! of scope for the engine's core (spec §1), so this binary is deliberately
//! small — it only adapts the server's three operations to argv/stdout.

use std::time::Duration;

use clap::{Parser, Subcommand};
use jieqi_core::search::Limits;
use jieqi_core::server;
use serde::Serialize;

#[derive(Parser)]
#[command(name = "engine", about = "Jieqi search, evaluation, and game-logic engine")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List every legal move from a position.
    Moves {
        #[arg(long)]
        fen: String,
        #[arg(long)]
        json: bool,
    },
    /// Rank the top-N moves from a position by a named strategy.
    Best {
        #[arg(long)]
        fen: String,
        #[arg(long)]
        strategy: String,
        #[arg(long)]
        depth: Option<u8>,
        #[arg(long)]
        time: Option<f64>,
        #[arg(long, default_value_t = 1)]
        n: usize,
        #[arg(long)]
        seed: Option<u64>,
        #[arg(long)]
        json: bool,
    },
    /// List every bundled strategy name.
    List {
        #[arg(long)]
        json: bool,
    },
}

#[derive(Serialize)]
struct BestMovesOutput {
    strategy: String,
    moves: Vec<ScoredMoveOutput>,
}

#[derive(Serialize)]
struct ScoredMoveOutput {
    #[serde(rename = "move")]
    mv: String,
    score: f64,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(1);
        }
    };

    let exit_code = match cli.command {
        Command::Moves { fen, json } => run_moves(&fen, json),
        Command::Best {
            fen,
            strategy,
            depth,
            time,
            n,
            seed,
            json,
        } => run_best(&fen, &strategy, depth, time, n, seed, json),
        Command::List { json } => run_list(json),
    };
    std::process::exit(exit_code);
}

fn run_moves(fen: &str, json: bool) -> i32 {
    match server::legal_moves(fen) {
        Ok(moves) => {
            if json {
                print_json(&moves);
            } else {
                for mv in &moves {
                    println!("{mv}");
                }
            }
            0
        }
        Err(err) => {
            tracing::error!(%err, "moves request failed");
            eprintln!("{err}");
            err.exit_code()
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn run_best(fen: &str, strategy: &str, depth: Option<u8>, time: Option<f64>, n: usize, seed: Option<u64>, json: bool) -> i32 {
    let limits = match (depth, time) {
        (Some(depth), _) => Some(Limits::to_depth(depth)),
        (None, Some(seconds)) => Some(Limits::to_time(Duration::from_secs_f64(seconds))),
        (None, None) => None,
    };

    match server::best_moves(fen, strategy, n, limits, seed) {
        Ok(ranked) => {
            if json {
                let output = BestMovesOutput {
                    strategy: strategy.to_string(),
                    moves: ranked
                        .into_iter()
                        .map(|(mv, score)| ScoredMoveOutput {
                            mv,
                            score: f64::from(score),
                        })
                        .collect(),
                };
                print_json(&output);
            } else {
                for (mv, score) in &ranked {
                    println!("{mv} {score}");
                }
            }
            0
        }
        Err(err) => {
            tracing::error!(%err, strategy, "best request failed");
            eprintln!("{err}");
            err.exit_code()
        }
    }
}

fn run_list(json: bool) -> i32 {
    let names = server::strategies();
    if json {
        print_json(&names);
    } else {
        for name in names {
            println!("{name}");
        }
    }
    0
}

fn print_json<T: Serialize>(value: &T) {
    match serde_json::to_string(value) {
        Ok(text) => println!("{text}"),
        Err(err) => {
            tracing::error!(%err, "failed to serialise JSON output");
            eprintln!("internal error: {err}");
            std::process::exit(1);
        }
    }
}
