//! Replay CLI
//!
//! Replays a Level-I archive (or a directory of session files) through the
//! replay engine and reports what it saw.
//!
//! Usage:
//!   cargo run --release --bin replay -- --archive ./data/PETR4.zip
//!   cargo run --release --bin replay -- --dir ./sessions --buckets-out buckets.jsonl
//!
//! Exits with status 2 when a session cannot be read or parsed.

use anyhow::{bail, Context, Result};
use clap::Parser;
use lobsim_core::{Bucket, ReplayConfig};
use lobsim_ingestion::{DirectorySource, SessionSource, ZipArchiveSource};
use lobsim_replay::{ReplayEngine, StepResult};
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(name = "replay")]
#[command(about = "Replay Level-I quote and trade sessions into a limit order book")]
struct Args {
    /// Zip archive with one CSV member per session
    #[arg(long, conflicts_with = "dir")]
    archive: Option<PathBuf>,

    /// Directory of per-session CSV files
    #[arg(long)]
    dir: Option<PathBuf>,

    /// JSON configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override the first session to replay
    #[arg(long)]
    start_session: Option<usize>,

    /// Stop after this many steps
    #[arg(long)]
    max_steps: Option<u64>,

    /// Write closed buckets as JSON lines
    #[arg(long)]
    buckets_out: Option<PathBuf>,

    /// Log every applied command
    #[arg(long, short)]
    verbose: bool,
}

#[derive(Serialize)]
struct BucketLine<'a> {
    session: &'a str,
    #[serde(flatten)]
    bucket: &'a Bucket,
}

fn main() -> Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => ReplayConfig::load(path)
            .with_context(|| format!("Failed to load config: {}", path.display()))?,
        None => ReplayConfig::default(),
    };
    if let Some(start) = args.start_session {
        config.engine.start_session = start;
    }

    let source: Box<dyn SessionSource> = match (&args.archive, &args.dir) {
        (Some(path), _) => Box::new(
            ZipArchiveSource::open(path, config.feed.clone())
                .with_context(|| format!("Failed to open archive: {}", path.display()))?,
        ),
        (None, Some(dir)) => Box::new(
            DirectorySource::open(dir, config.feed.clone())
                .with_context(|| format!("Failed to scan directory: {}", dir.display()))?,
        ),
        (None, None) => bail!("one of --archive or --dir is required"),
    };

    let mut buckets_out = match &args.buckets_out {
        Some(path) => Some(BufWriter::new(
            File::create(path).with_context(|| format!("Failed to create {}", path.display()))?,
        )),
        None => None,
    };

    let mut engine = ReplayEngine::new(config, source)?;
    let mut written = 0usize;

    loop {
        if args.max_steps.is_some_and(|max| engine.stats().steps >= max) {
            info!(steps = engine.stats().steps, "step limit reached");
            break;
        }

        let session = engine.current_session_id();
        let result = match engine.step(args.verbose) {
            Ok(result) => result,
            Err(err) if err.is_input_failure() => {
                error!(session = %session, %err, "unreadable session data");
                return Ok(ExitCode::from(2));
            }
            Err(err) => {
                return Err(err).with_context(|| format!("Replay failed in session {session}"))
            }
        };

        match result {
            StepResult::Emitted(_) => {
                let buckets = engine.buckets();
                if let Some(out) = buckets_out.as_mut() {
                    for bucket in &buckets[written..] {
                        serde_json::to_writer(&mut *out, &BucketLine { session: &session, bucket })?;
                        writeln!(out)?;
                    }
                }
                written = buckets.len();
            }
            StepResult::SessionEnded => {
                println!("{session}: done");
                written = 0;
            }
            StepResult::ReplayExhausted => {
                if !session.is_empty() {
                    println!("{session}: done");
                }
                break;
            }
        }
    }

    if let Some(mut out) = buckets_out {
        out.flush()?;
    }

    let stats = engine.stats();
    println!();
    println!("Instrument         : {}", engine.config().instrument.symbol);
    println!(
        "Sessions completed : {} of {}",
        stats.sessions_completed,
        engine.session_count()
    );
    println!("Steps              : {}", stats.steps);
    println!("Records            : {}", stats.records);
    println!("Commands           : {}", stats.commands);
    println!("Corrections        : {} ({:.2}%)", stats.corrections, stats.correction_rate() * 100.0);
    println!("Aggressive fills   : {}", stats.aggressive_fills);
    println!("OFI updates        : {}", stats.ofi_updates);

    Ok(ExitCode::SUCCESS)
}
