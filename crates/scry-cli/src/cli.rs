use std::path::PathBuf;

use clap::{Parser, Subcommand};
use scry_core::memory::layout::timing;

#[derive(Parser)]
#[command(name = "scry")]
#[command(about = "Process memory inspector")]
#[command(version)]
pub struct Args {
    /// Runtime configuration (JSON)
    #[arg(short, long, default_value = "scry.json", global = true)]
    pub config: PathBuf,

    /// Pointer chains and patch definitions (JSON)
    #[arg(short, long, default_value = "offsets.json", global = true)]
    pub offsets: PathBuf,

    /// Attach to this PID instead of searching by process name
    #[arg(short, long, env = "SCRY_PID", global = true)]
    pub pid: Option<u32>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// List running processes
    Processes {
        /// Only show names containing this text (case-insensitive)
        filter: Option<String>,
    },
    /// List modules loaded in the target
    Modules,
    /// Read one stats snapshot
    Stats {
        #[arg(long)]
        json: bool,
    },
    /// Refresh and list entities
    Entities {
        /// Player, Monster, Item, NPC or Unknown
        #[arg(short, long)]
        kind: Option<String>,
        /// Only entities within this distance of the player
        #[arg(short = 'd', long)]
        max_distance: Option<f32>,
        #[arg(long)]
        json: bool,
    },
    /// Monsters around the player, nearest first
    Monsters {
        #[arg(short, long, default_value_t = 100.0)]
        range: f32,
    },
    /// Walk a linked list from a raw head address
    Walk {
        /// Head node address (hex)
        head: String,
        /// Next pointer offset (hex); defaults to the configured layout
        #[arg(long)]
        next_offset: Option<String>,
        /// Id field offset (hex); defaults to the configured layout
        #[arg(long)]
        id_offset: Option<String>,
        #[arg(long)]
        max_nodes: Option<usize>,
        /// Accept any canonical user-space address
        #[arg(long)]
        permissive: bool,
    },
    /// Trace a pointer chain step by step
    Chain {
        /// Stat name from the offsets file, or "entity_list"
        #[arg(conflicts_with = "offsets_list")]
        name: Option<String>,
        /// Explicit comma-separated offsets, e.g. "0x70,0x0,-0x8"
        #[arg(long = "chain", value_name = "OFFSETS")]
        offsets_list: Option<String>,
        /// Base address (hex); defaults to the stats base
        #[arg(long)]
        base: Option<String>,
    },
    /// Find a byte signature in a module
    Scan {
        /// Signature such as "48 8B 05 ?? ?? ?? ??"
        pattern: String,
        /// Module name; defaults to the main module
        #[arg(short, long)]
        module: Option<String>,
    },
    /// Apply a named patch from the offsets file
    Patch {
        name: String,
    },
    /// Dump raw bytes
    Hexdump {
        /// Start address (hex)
        address: String,
        #[arg(short, long, default_value_t = 256)]
        size: usize,
        /// Show the ASCII column
        #[arg(short, long)]
        ascii: bool,
    },
    /// Poll stats and entities until interrupted
    Watch {
        #[arg(short, long, default_value_t = timing::WATCH_POLL_INTERVAL_MS)]
        interval_ms: u64,
    },
}
