//! Top-level inspector tying configuration to the readers.
//!
//! `Scry` owns the static configuration and the entity catalog. The memory
//! reader is passed into each call, so the same instance works against a live
//! process or a mock image.
//!
//! ## Example
//!
//! ```ignore
//! use scry_core::{Config, MemoryReader, ProcessHandle, Scry, load_offsets};
//!
//! let config = Config::load("scry.json")?;
//! let offsets = load_offsets("offsets.json")?;
//! let process = ProcessHandle::find_and_open(&config.process.names)?;
//! let reader = MemoryReader::new(&process);
//!
//! let mut scry = Scry::new(config, offsets);
//! let stats = scry.read_stats(&reader);
//! scry.refresh_entities(&reader, false)?;
//! for (monster, distance) in scry.catalog().nearby_monsters(60.0) {
//!     println!("{} at {:.1}", monster.display_name(), distance);
//! }
//! ```

use tracing::{debug, info};

use crate::config::Config;
use crate::entity::{EntityCatalog, RefreshOutcome};
use crate::error::{Error, Result};
use crate::memory::{ModuleProvider, ReadMemory, WriteMemory};
use crate::offset::{OffsetsCollection, PatternScanner};
use crate::stats::{StatsSnapshot, StatsSnapshotReader};

pub struct Scry {
    config: Config,
    offsets: OffsetsCollection,
    catalog: EntityCatalog,
}

impl Scry {
    pub fn new(config: Config, offsets: OffsetsCollection) -> Self {
        if offsets.is_valid() {
            debug!(
                "Offsets {}: {} stat chain(s), entity list {}",
                if offsets.version.is_empty() {
                    "(unversioned)"
                } else {
                    offsets.version.as_str()
                },
                offsets.stats.len(),
                offsets.entity_list
            );
        } else {
            info!("Offsets define no stat chains and no entity list");
        }
        if !offsets.has_entity_list() {
            info!("No entity list chain configured, entity refresh disabled");
        }

        let catalog = EntityCatalog::new(
            config.entity.clone(),
            config.validator,
            offsets.entity_list.clone(),
        );

        Self {
            config,
            offsets,
            catalog,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn offsets(&self) -> &OffsetsCollection {
        &self.offsets
    }

    pub fn catalog(&self) -> &EntityCatalog {
        &self.catalog
    }

    /// Address every stat and entity list chain is resolved against.
    pub fn stats_base<R: ReadMemory + ?Sized>(&self, reader: &R) -> u64 {
        reader
            .base_address()
            .wrapping_add(self.config.process.stats_base_offset)
    }

    pub fn read_stats<R: ReadMemory + ?Sized>(&self, reader: &R) -> StatsSnapshot {
        StatsSnapshotReader::new(reader, &self.config.validator)
            .read(self.stats_base(reader), &self.offsets.stats)
    }

    /// Rebuild the entity catalog; see [`EntityCatalog::refresh`].
    ///
    /// Without an entity list chain in the offsets this is always
    /// [`RefreshOutcome::Skipped`].
    pub fn refresh_entities<R: ReadMemory + ?Sized>(
        &mut self,
        reader: &R,
        force: bool,
    ) -> Result<RefreshOutcome> {
        if !self.offsets.has_entity_list() {
            return Ok(RefreshOutcome::Skipped);
        }
        let base = self.stats_base(reader);
        self.catalog.refresh(reader, base, force)
    }

    /// Apply the patch definition named `name`, returning the matched address.
    pub fn apply_patch<M>(&self, memory: &M, name: &str) -> Result<u64>
    where
        M: ReadMemory + WriteMemory + ModuleProvider + ?Sized,
    {
        let definition = self
            .offsets
            .patch(name)
            .ok_or_else(|| Error::UnknownPatch(name.to_string()))?;
        PatternScanner::new(memory).apply(definition)
    }
}
