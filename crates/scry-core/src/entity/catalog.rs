//! Rate-limited entity list snapshots
//!
//! A refresh resolves the list head, walks it and materializes every node
//! into a fresh [`EntitySet`]. The set is published by swapping an `Arc`, so
//! a reader holding a previous snapshot never sees a partially built one.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info, warn};

use crate::config::EntityLayout;
use crate::entity::{EntityRecord, EntityType, EntityView, LinkedStructureWalker, Position};
use crate::error::{Error, Result};
use crate::memory::{AddressValidator, ReadMemory};
use crate::offset::{OffsetChain, PointerChainResolver};

/// Entities from one refresh, in list order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntitySet {
    records: Vec<EntityRecord>,
    by_id: HashMap<u64, usize>,
}

impl EntitySet {
    /// Insert a record; a repeated id replaces the earlier record in place.
    fn insert(&mut self, record: EntityRecord) {
        match self.by_id.get(&record.id) {
            Some(&index) => self.records[index] = record,
            None => {
                self.by_id.insert(record.id, self.records.len());
                self.records.push(record);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, id: u64) -> Option<&EntityRecord> {
        self.by_id.get(&id).map(|&index| &self.records[index])
    }

    pub fn iter(&self) -> impl Iterator<Item = &EntityRecord> {
        self.records.iter()
    }

    pub fn player(&self) -> Option<&EntityRecord> {
        self.records
            .iter()
            .find(|record| record.kind == EntityType::Player)
    }

    /// Records matching `kind`, and within `max_distance` of `origin` when
    /// both are given. Records without a position are not distance-filtered.
    pub fn nearby(
        &self,
        kind: Option<EntityType>,
        max_distance: Option<f32>,
        origin: Option<Position>,
    ) -> Vec<&EntityRecord> {
        self.records
            .iter()
            .filter(|record| kind.is_none_or(|kind| record.kind == kind))
            .filter(|record| match (max_distance, origin) {
                (Some(max_distance), Some(origin)) => record
                    .distance_to(&origin)
                    .is_none_or(|distance| distance <= max_distance),
                _ => true,
            })
            .collect()
    }

    /// Monsters within `max_distance` of the player, nearest first.
    pub fn nearby_monsters(&self, max_distance: f32) -> Vec<(&EntityRecord, f32)> {
        let Some(origin) = self.player().and_then(|player| player.position) else {
            return Vec::new();
        };

        let mut monsters: Vec<(&EntityRecord, f32)> = self
            .records
            .iter()
            .filter(|record| record.kind == EntityType::Monster)
            .filter_map(|record| {
                let distance = record.distance_to(&origin)?;
                (distance <= max_distance).then_some((record, distance))
            })
            .collect();
        monsters.sort_by(|a, b| a.1.total_cmp(&b.1));
        monsters
    }
}

/// Result of a [`EntityCatalog::refresh`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// A new set was published
    Refreshed {
        count: usize,
        /// Nodes whose materialization failed
        skipped: usize,
    },
    /// Still within the cooldown; the previous set is kept
    Skipped,
}

pub struct EntityCatalog {
    layout: EntityLayout,
    validator: AddressValidator,
    list_chain: OffsetChain,
    entities: Arc<EntitySet>,
    last_refresh: Option<Instant>,
}

impl EntityCatalog {
    pub fn new(layout: EntityLayout, validator: AddressValidator, list_chain: OffsetChain) -> Self {
        Self {
            layout,
            validator,
            list_chain,
            entities: Arc::new(EntitySet::default()),
            last_refresh: None,
        }
    }

    /// Rebuild the entity set from memory.
    ///
    /// `base` is the address the entity list chain is resolved against. On
    /// error the previously published set is left untouched.
    pub fn refresh<R: ReadMemory + ?Sized>(
        &mut self,
        reader: &R,
        base: u64,
        force: bool,
    ) -> Result<RefreshOutcome> {
        if !reader.is_attached() {
            return Err(Error::NotAttached);
        }

        if !force
            && self
                .last_refresh
                .is_some_and(|at| at.elapsed() < self.layout.refresh_cooldown())
        {
            return Ok(RefreshOutcome::Skipped);
        }

        let head = self.resolve_head(reader, base)?;

        let walker = LinkedStructureWalker::new(reader);
        let walk = walker.walk_with_stats(
            head,
            self.layout.next_offset,
            self.layout.id_offset,
            self.layout.max_nodes,
            &self.validator,
        );

        let mut set = EntitySet::default();
        let mut skipped = 0;
        for node in &walk.nodes {
            let view = EntityView::new(reader, &self.layout, &self.validator, node.address);
            match view.materialize() {
                Ok(Some(record)) => set.insert(record),
                Ok(None) => {}
                Err(e) => {
                    debug!("Skipping entity at {:#x}: {}", node.address, e);
                    skipped += 1;
                }
            }
        }

        let count = set.len();
        info!(
            "Entity refresh: {} entities from {} nodes (stopped on {}, {} skipped)",
            count,
            walk.nodes.len(),
            walk.stop,
            skipped
        );

        self.entities = Arc::new(set);
        self.last_refresh = Some(Instant::now());
        Ok(RefreshOutcome::Refreshed { count, skipped })
    }

    fn resolve_head<R: ReadMemory + ?Sized>(&self, reader: &R, base: u64) -> Result<u64> {
        let Some(list) = PointerChainResolver::new(reader).resolve(base, &self.list_chain) else {
            warn!(
                "Entity list chain {} did not resolve from {:#x}",
                self.list_chain, base
            );
            return Err(Error::MemoryReadFailed {
                address: base,
                message: format!("entity list chain {} did not resolve", self.list_chain),
            });
        };

        let head = reader.read_u64(list.wrapping_add(self.layout.head_offset))?;
        if !self.validator.is_valid(head) {
            warn!("Entity list head {:#x} is not a valid address", head);
            return Err(Error::InvalidAddress(head));
        }
        Ok(head)
    }

    /// The current set. Cheap; the snapshot stays valid across later refreshes.
    pub fn snapshot(&self) -> Arc<EntitySet> {
        Arc::clone(&self.entities)
    }

    pub fn entities(&self) -> &EntitySet {
        &self.entities
    }

    pub fn get_player(&self) -> Option<&EntityRecord> {
        self.entities.player()
    }

    pub fn get_nearby(
        &self,
        kind: Option<EntityType>,
        max_distance: Option<f32>,
        origin: Option<Position>,
    ) -> Vec<&EntityRecord> {
        self.entities.nearby(kind, max_distance, origin)
    }

    pub fn nearby_monsters(&self, max_distance: f32) -> Vec<(&EntityRecord, f32)> {
        self.entities.nearby_monsters(max_distance)
    }
}
