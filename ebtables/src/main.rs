#![forbid(unsafe_code)]

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use ebtables_core::classifier::Frame;
use ebtables_core::codec::serialize;
use ebtables_core::model::{Hook, MacAddr, Policy, Registry, Table};
use ebtables_core::{load_initial_ruleset, Engine};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// A thin demo of `ebtables-core`: load a table (from a declarative TOML
/// initial rule-set, or a small built-in default), install it into a fresh
/// classifier engine, and classify a handful of synthetic frames against
/// it. Not the ebtables CLI front end — no `-A`/`-I`/`-D` grammar.
#[derive(Parser, Debug)]
#[command(author, version, about = "ebtables-core demo: classify synthetic frames against a table")]
struct Cli {
    /// Path to a declarative initial rule-set TOML file. Without one, a
    /// default `filter` table (INPUT/FORWARD/OUTPUT, policy ACCEPT) is used.
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Number of synthetic frames to classify.
    #[arg(long, default_value_t = 5)]
    frames: usize,
}

fn main() {
    init_tracing();
    let cli = Cli::parse();

    let registry = Arc::new(Registry::new());
    let table = match &cli.config {
        Some(path) => match load_initial_ruleset(path, &registry) {
            Ok(table) => table,
            Err(err) => {
                error!(%err, path = %path.display(), "failed to load initial rule-set");
                std::process::exit(1);
            }
        },
        None => default_table(),
    };

    let blob = match serialize(&table) {
        Ok(blob) => blob,
        Err(err) => {
            error!(%err, "failed to serialize table");
            std::process::exit(1);
        }
    };

    let entry_count: usize = table.iter_chains().map(|(_, c)| c.entries.len()).sum();
    let engine = Engine::new(registry);
    if let Err(err) = engine.install(blob, vec![Default::default(); entry_count]) {
        error!(%err, "failed to install table");
        std::process::exit(1);
    }
    info!(table = %table.name, chains = table.chain_count(), entries = entry_count, "table installed");

    for (i, synth) in synthetic_frames(cli.frames).iter().enumerate() {
        let frame = synth.as_frame();
        match engine.classify(&frame) {
            Ok(outcome) => info!(frame = i, in_if = synth.in_if, ?outcome, "classified"),
            Err(err) => warn!(frame = i, %err, "classification failed"),
        }
    }

    let counters = engine.counters().snapshot();
    info!(hits = ?counters, "final per-entry counters");
}

fn default_table() -> Table {
    let valid_hooks = Hook::Input.bit() | Hook::Forward.bit() | Hook::Output.bit();
    Table::new("filter", valid_hooks, Policy::Accept)
}

/// A synthetic Ethernet frame, owned so [`Frame`]'s borrowed fields can
/// reference it. Standing in for a packet capture source, which is out of
/// scope (spec.md §1).
struct SyntheticFrame {
    hook: Hook,
    ethproto: u16,
    in_if: String,
    out_if: String,
}

impl SyntheticFrame {
    fn as_frame(&self) -> Frame<'_> {
        Frame {
            hook: self.hook,
            ethproto: self.ethproto,
            in_if: &self.in_if,
            out_if: &self.out_if,
            logical_in: &self.in_if,
            logical_out: &self.out_if,
            source: MacAddr::ZERO,
            dest: MacAddr::BROADCAST,
            payload: &[],
        }
    }
}

fn synthetic_frames(n: usize) -> Vec<SyntheticFrame> {
    (0..n)
        .map(|i| SyntheticFrame {
            hook: Hook::Input,
            ethproto: 0x0800,
            in_if: format!("eth{i}"),
            out_if: "br0".to_string(),
        })
        .collect()
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .init();
}
