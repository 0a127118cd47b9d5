//! Polling loop over stats and entities.

use std::time::Duration;

use anyhow::Result;
use scry_core::{MemoryReader, RefreshOutcome};
use tracing::{info, warn};

use super::stats::summary;
use crate::cli::Args;
use crate::session::Session;
use crate::shutdown::StopSignal;

pub fn run(args: &Args, interval_ms: u64) -> Result<()> {
    let stop = StopSignal::ctrlc()?;

    let mut session = Session::attach(args)?;
    let interval = Duration::from_millis(interval_ms);
    info!(
        "Watching PID {} every {:?} (Ctrl+C to stop)",
        session.process.pid, interval
    );

    let mut entity_count = 0;
    loop {
        let reader = MemoryReader::new(&session.process);
        if !session.process.is_alive() {
            info!("Process exited");
            break;
        }

        let stats = session.scry.read_stats(&reader);
        // Cooldown keeps this from walking the list on every tick
        match session.scry.refresh_entities(&reader, false) {
            Ok(RefreshOutcome::Refreshed { count, .. }) => entity_count = count,
            Ok(RefreshOutcome::Skipped) => {}
            Err(e) if e.is_actionable() => return Err(e.into()),
            Err(e) => warn!("Entity refresh failed: {}", e),
        }

        let nearest = session
            .scry
            .catalog()
            .nearby_monsters(f32::MAX)
            .first()
            .map(|(monster, distance)| {
                format!("  nearest {} @ {:.1}", monster.display_name(), distance)
            })
            .unwrap_or_default();
        println!("{}  entities {}{}", summary(&stats), entity_count, nearest);

        if stop.wait(interval) {
            break;
        }
    }
    Ok(())
}
