mod cli;
mod commands;
mod session;
mod shutdown;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::{Args, Command};

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("scry=info".parse()?))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    match &args.command {
        Command::Processes { filter } => commands::processes::run(filter.as_deref()),
        Command::Modules => commands::modules::run(&args),
        Command::Stats { json } => commands::stats::run(&args, *json),
        Command::Entities {
            kind,
            max_distance,
            json,
        } => commands::entities::run(&args, kind.as_deref(), *max_distance, *json),
        Command::Monsters { range } => commands::entities::run_monsters(&args, *range),
        Command::Walk {
            head,
            next_offset,
            id_offset,
            max_nodes,
            permissive,
        } => commands::walk::run(
            &args,
            commands::walk::WalkArgs {
                head,
                next_offset: next_offset.as_deref(),
                id_offset: id_offset.as_deref(),
                max_nodes: *max_nodes,
                permissive: *permissive,
            },
        ),
        Command::Chain {
            name,
            offsets_list,
            base,
        } => commands::chain::run(
            &args,
            name.as_deref(),
            offsets_list.as_deref(),
            base.as_deref(),
        ),
        Command::Scan { pattern, module } => commands::scan::run(&args, pattern, module.as_deref()),
        Command::Patch { name } => commands::patch::run(&args, name),
        Command::Hexdump {
            address,
            size,
            ascii,
        } => commands::hexdump::run(&args, address, *size, *ascii),
        Command::Watch { interval_ms } => commands::watch::run(&args, *interval_ms),
    }
}
