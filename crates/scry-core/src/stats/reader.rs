use std::collections::BTreeMap;

use tracing::{debug, trace};

use crate::memory::{AddressValidator, ReadMemory};
use crate::offset::{OffsetChain, PointerChainResolver};
use crate::stats::{StatField, StatValue, StatsSnapshot};

/// Reads the named stat chains into one [`StatsSnapshot`].
pub struct StatsSnapshotReader<'a, R: ReadMemory + ?Sized> {
    reader: &'a R,
    validator: &'a AddressValidator,
}

impl<'a, R: ReadMemory + ?Sized> StatsSnapshotReader<'a, R> {
    pub fn new(reader: &'a R, validator: &'a AddressValidator) -> Self {
        Self { reader, validator }
    }

    /// Resolve every chain against `base` and read its value.
    ///
    /// Names that are not a known [`StatField`] are read as 4-byte ints under
    /// their own name. Never fails: an unresolved or unreadable field is left
    /// out of the snapshot. A detached reader yields an empty snapshot.
    pub fn read(&self, base: u64, chains: &BTreeMap<String, OffsetChain>) -> StatsSnapshot {
        let mut snapshot = StatsSnapshot::default();
        if !self.reader.is_attached() {
            debug!("Stats read skipped: not attached");
            return snapshot;
        }

        let resolver = PointerChainResolver::new(self.reader);
        for (name, chain) in chains {
            let field = name.parse::<StatField>().ok();
            let key = field.map_or(name.as_str(), |field| field.key());

            let Some(address) = resolver
                .resolve(base, chain)
                .filter(|address| self.validator.is_valid(*address))
            else {
                trace!("Stat {} unresolved", name);
                continue;
            };

            let value = if field.is_some_and(|field| field.is_float()) {
                self.reader
                    .read_f32(address)
                    .map(|v| StatValue::Float(v as f64))
            } else {
                self.reader.read_i32(address).map(StatValue::Int)
            };

            match value {
                Ok(value) => snapshot.insert(key, value),
                Err(e) => trace!("Stat {} unreadable at {:#x}: {}", name, address, e),
            }
        }

        snapshot.derive_percentages();
        snapshot
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MockMemoryBuilder;
    use crate::stats::keys;

    const BASE: u64 = 0x1E0_0000_0000;
    const STATS: u64 = 0x1E8_0000_0000;

    fn chains(entries: &[(&str, i64)]) -> BTreeMap<String, OffsetChain> {
        entries
            .iter()
            .map(|(name, offset)| (name.to_string(), OffsetChain::from([0x10, *offset])))
            .collect()
    }

    /// BASE -> (BASE + 0x10) -> STATS; every chain ends at STATS + offset
    fn image() -> MockMemoryBuilder {
        MockMemoryBuilder::new()
            .with_u64(BASE, BASE)
            .with_u64(BASE + 0x10, STATS)
            .with_zeroed(STATS, 0x100)
    }

    #[test]
    fn test_reads_typed_fields() {
        let reader = image()
            .with_i32(STATS + 0x10, 420)
            .with_i32(STATS + 0x14, 600)
            .with_f32(STATS + 0x20, -12.5)
            .with_f32(STATS + 0x24, 8.0)
            .build();
        let validator = AddressValidator::default();

        let snapshot = StatsSnapshotReader::new(&reader, &validator).read(
            BASE,
            &chains(&[("LiveHP", 0x10), ("MaxHP", 0x14), ("PosX", 0x20), ("PosY", 0x24)]),
        );

        assert_eq!(snapshot.current_hp(), Some(420));
        assert_eq!(snapshot.max_hp(), Some(600));
        assert_eq!(snapshot.hp_percent(), 70.0);
        assert_eq!(snapshot.position(), Some((-12.5, 8.0)));
        assert_eq!(snapshot.get(keys::POS_X), Some(StatValue::Float(-12.5)));
    }

    #[test]
    fn test_zero_max_hp() {
        let reader = image().with_i32(STATS + 0x10, 250).build();
        let validator = AddressValidator::default();

        let snapshot = StatsSnapshotReader::new(&reader, &validator)
            .read(BASE, &chains(&[("LiveHP", 0x10), ("MaxHP", 0x14)]));

        assert_eq!(snapshot.max_hp(), Some(0));
        assert_eq!(snapshot.current_hp(), Some(250));
        assert_eq!(snapshot.hp_percent(), 0.0);
    }

    #[test]
    fn test_absent_is_not_zero() {
        let reader = image().build();
        let validator = AddressValidator::default();

        let mut chains = chains(&[("CurMP", 0x30)]);
        // Unmapped target field
        chains.insert("MaxMP".to_string(), OffsetChain::from([0x10, 0x1000]));
        // Dereferences a null pointer
        chains.insert("LiveES".to_string(), OffsetChain::from([0x10, 0x40, 0x0]));

        let snapshot = StatsSnapshotReader::new(&reader, &validator).read(BASE, &chains);

        assert_eq!(snapshot.int(keys::CURRENT_MP), Some(0));
        assert!(!snapshot.contains(keys::MAX_MP));
        assert!(!snapshot.contains(keys::CURRENT_ES));
        assert_eq!(snapshot.mp_percent(), 0.0);
        assert_eq!(snapshot.es_percent(), 0.0);
    }

    #[test]
    fn test_rejects_address_outside_validator() {
        let reader = MockMemoryBuilder::new()
            .with_u64(BASE, 0x7FF6_0000_0000)
            .with_zeroed(0x7FF6_0000_0000, 0x100)
            .build();
        let validator = AddressValidator::default();

        let chains = BTreeMap::from([("LiveHP".to_string(), OffsetChain::from([0x10]))]);
        let snapshot = StatsSnapshotReader::new(&reader, &validator).read(BASE, &chains);
        assert!(!snapshot.contains(keys::CURRENT_HP));
    }

    #[test]
    fn test_unknown_name_read_as_int() {
        let reader = image().with_i32(STATS + 0x50, 3).build();
        let validator = AddressValidator::default();

        let snapshot = StatsSnapshotReader::new(&reader, &validator)
            .read(BASE, &chains(&[("AreaLevel", 0x50), ("IngameState", 0x54)]));
        assert_eq!(snapshot.int("AreaLevel"), Some(3));
        assert_eq!(snapshot.int(keys::INGAME_STATE), Some(0));
    }

    #[test]
    fn test_detached_reader_yields_empty_snapshot() {
        let reader = image().build();
        reader.detach();
        let validator = AddressValidator::default();

        let snapshot = StatsSnapshotReader::new(&reader, &validator)
            .read(BASE, &chains(&[("LiveHP", 0x10)]));
        assert!(snapshot.is_empty());
    }
}
