use anyhow::Result;
use scry_core::StatsSnapshot;
use scry_core::stats::keys;

use crate::cli::Args;
use crate::session::Session;

pub fn run(args: &Args, json: bool) -> Result<()> {
    let session = Session::attach(args)?;
    let stats = session.scry.read_stats(&session.reader());

    if json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
    } else {
        print_stats(&stats);
    }
    Ok(())
}

pub fn print_stats(stats: &StatsSnapshot) {
    let derived = [keys::HP_PERCENT, keys::MP_PERCENT, keys::ES_PERCENT];
    if stats.iter().all(|(name, _)| derived.contains(&name)) {
        println!("No stat chains resolved");
    }
    for (name, value) in stats.iter() {
        println!("{:<14} {}", name, value);
    }
}

/// One-line summary used by the watch loop.
pub fn summary(stats: &StatsSnapshot) -> String {
    let mut line = format!(
        "HP {:>5.1}%  MP {:>5.1}%  ES {:>5.1}%",
        stats.hp_percent(),
        stats.mp_percent(),
        stats.es_percent()
    );
    if let Some((x, y)) = stats.position() {
        line.push_str(&format!("  pos ({:.1}, {:.1})", x, y));
    }
    line
}
