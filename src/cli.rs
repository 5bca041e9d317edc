//! Command line interface of the demo host.
//!
//! The engine itself is a library; this binary drives it against an
//! in-memory world so budgets, cancellation and determinism can be watched
//! from a terminal.

use clap::{Parser, Subcommand};

/// shadowmap: cooperative shadow-map generation demo.
#[derive(Debug, Parser)]
#[command(name = "shadowmap", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Enable debug logging.
    #[arg(long, short, global = true, default_value_t = false)]
    pub verbose: bool,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Mirror one generated station onto a shadow map, one resume per tick.
    Demo {
        /// Generation seed.
        #[arg(long, default_value_t = 42)]
        seed: u64,

        /// Station width in tiles.
        #[arg(long, default_value_t = 48)]
        width: i32,

        /// Station height in tiles.
        #[arg(long, default_value_t = 32)]
        height: i32,

        /// Per-resume budget in milliseconds (overrides the config file).
        #[arg(long)]
        budget_ms: Option<u64>,

        /// Tiles mirrored per atomic step (overrides the config file).
        #[arg(long)]
        tiles_per_step: Option<usize>,

        /// Target tile kind (overrides the config file).
        #[arg(long)]
        tile_kind: Option<String>,

        /// Draw tile variants from the seeded generator.
        #[arg(long, default_value_t = false)]
        variation: bool,

        /// Cancel the job after this many resumes.
        #[arg(long)]
        cancel_after: Option<u32>,

        /// Drive the job from a tokio interval instead of thread sleeps.
        #[arg(long = "async", default_value_t = false)]
        run_async: bool,
    },

    /// Generate shadow maps for several stations through one shared queue.
    Batch {
        /// Number of stations.
        #[arg(long, default_value_t = 4)]
        stations: u32,

        /// Base seed; station `i` uses `seed + i`.
        #[arg(long, default_value_t = 42)]
        seed: u64,
    },

    /// Print the effective configuration as TOML.
    Config,
}
