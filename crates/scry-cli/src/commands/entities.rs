use anyhow::{Result, anyhow};
use scry_core::{EntityRecord, EntityType, MemoryReader};

use crate::cli::Args;
use crate::session::Session;

pub fn run(
    args: &Args,
    kind: Option<&str>,
    max_distance: Option<f32>,
    json: bool,
) -> Result<()> {
    let kind = kind
        .map(|k| {
            k.parse::<EntityType>()
                .map_err(|_| anyhow!("Unknown entity type: {}", k))
        })
        .transpose()?;

    let mut session = Session::attach(args)?;
    let reader = MemoryReader::new(&session.process);
    session.scry.refresh_entities(&reader, true)?;

    let catalog = session.scry.catalog();
    let origin = catalog.get_player().and_then(|player| player.position);
    let records = catalog.get_nearby(kind, max_distance, origin);

    if json {
        println!("{}", serde_json::to_string_pretty(&records)?);
        return Ok(());
    }

    for record in &records {
        println!("{}", describe(record));
    }
    println!("{} entit{}", records.len(), if records.len() == 1 { "y" } else { "ies" });
    Ok(())
}

pub fn run_monsters(args: &Args, range: f32) -> Result<()> {
    let mut session = Session::attach(args)?;
    let reader = MemoryReader::new(&session.process);
    session.scry.refresh_entities(&reader, true)?;

    let catalog = session.scry.catalog();
    if catalog.get_player().is_none() {
        println!("No player entity found");
        return Ok(());
    }

    let monsters = catalog.nearby_monsters(range);
    for (monster, distance) in &monsters {
        println!("{:>7.1}  {}", distance, describe(monster));
    }
    println!("{} monster(s) within {:.1}", monsters.len(), range);
    Ok(())
}

fn describe(record: &EntityRecord) -> String {
    let life = record
        .life
        .map(|life| format!("{}/{} ({:.0}%)", life.current, life.maximum, life.percent))
        .unwrap_or_else(|| "-".to_string());
    format!("0x{:X}  {:<32} life {}", record.address, record.display_name(), life)
}
