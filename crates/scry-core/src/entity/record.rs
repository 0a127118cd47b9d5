use std::cell::OnceCell;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString, IntoStaticStr};

use crate::config::EntityLayout;
use crate::error::{Error, Result};
use crate::memory::{AddressValidator, ReadMemory};

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    EnumString,
    IntoStaticStr,
    Display,
)]
#[strum(ascii_case_insensitive)]
pub enum EntityType {
    Player,
    Monster,
    Item,
    #[strum(to_string = "NPC")]
    Npc,
    #[default]
    Unknown,
}

/// Component pointers an entity may carry.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Display,
)]
pub enum Component {
    Life,
    Mana,
    Position,
    Rendered,
    Player,
    Monster,
    Item,
    Npc,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f32,
    pub y: f32,
}

impl Position {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn distance_to(&self, other: &Position) -> f32 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Life {
    pub current: i32,
    pub maximum: i32,
    pub percent: f64,
}

impl Life {
    /// Accept a (current, maximum) pair only if `0 <= current <= maximum`
    /// and `maximum > 0`.
    pub fn from_raw(current: i32, maximum: i32) -> Option<Self> {
        if maximum <= 0 || current < 0 || current > maximum {
            return None;
        }
        Some(Self {
            current,
            maximum,
            percent: current as f64 / maximum as f64 * 100.0,
        })
    }
}

/// Decoded view of one entity list node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityRecord {
    pub id: u64,
    pub address: u64,
    pub kind: EntityType,
    pub position: Option<Position>,
    pub life: Option<Life>,
    /// Valid component pointers found on the entity
    pub components: BTreeMap<Component, u64>,
}

impl EntityRecord {
    pub fn distance_to(&self, origin: &Position) -> Option<f32> {
        self.position.map(|position| position.distance_to(origin))
    }

    /// Synthetic label such as `Monster_1234 (12.5, -3.2)`.
    pub fn display_name(&self) -> String {
        match self.position {
            Some(position) => format!(
                "{}_{:X} ({:.1}, {:.1})",
                self.kind, self.id, position.x, position.y
            ),
            None => format!("{}_{:X}", self.kind, self.id),
        }
    }
}

/// Lazily decodes an entity from memory, caching each field on first access.
pub struct EntityView<'a, R: ReadMemory + ?Sized> {
    reader: &'a R,
    layout: &'a EntityLayout,
    validator: &'a AddressValidator,
    address: u64,
    id: OnceCell<std::result::Result<Option<u64>, String>>,
    components: OnceCell<BTreeMap<Component, u64>>,
    life: OnceCell<Option<Life>>,
    position: OnceCell<Option<Position>>,
    kind: OnceCell<EntityType>,
}

impl<'a, R: ReadMemory + ?Sized> EntityView<'a, R> {
    pub fn new(
        reader: &'a R,
        layout: &'a EntityLayout,
        validator: &'a AddressValidator,
        address: u64,
    ) -> Self {
        Self {
            reader,
            layout,
            validator,
            address,
            id: OnceCell::new(),
            components: OnceCell::new(),
            life: OnceCell::new(),
            position: OnceCell::new(),
            kind: OnceCell::new(),
        }
    }

    pub fn address(&self) -> u64 {
        self.address
    }

    /// First positive id among the candidate offsets.
    ///
    /// Fails only if every candidate read faults, i.e. the node itself is
    /// unreadable.
    pub fn id(&self) -> Result<Option<u64>> {
        self.id
            .get_or_init(|| self.probe_id())
            .clone()
            .map_err(|message| Error::MemoryReadFailed {
                address: self.address,
                message,
            })
    }

    fn probe_id(&self) -> std::result::Result<Option<u64>, String> {
        let mut first_error = None;
        let mut any_readable = false;

        for offset in &self.layout.id_candidates {
            match self.reader.read_i64(self.address.wrapping_add(*offset)) {
                Ok(value) if value > 0 => return Ok(Some(value as u64)),
                Ok(_) => any_readable = true,
                Err(e) => {
                    first_error.get_or_insert_with(|| e.to_string());
                }
            }
        }

        match first_error {
            Some(message) if !any_readable => Err(message),
            _ => Ok(None),
        }
    }

    pub fn components(&self) -> &BTreeMap<Component, u64> {
        self.components.get_or_init(|| {
            let table = &self.layout.components;
            let mut slots = vec![
                (Component::Life, table.life),
                (Component::Mana, table.mana),
                (Component::Position, table.position),
                (Component::Rendered, table.rendered),
                (Component::Player, table.player),
                (Component::Monster, table.monster),
                (Component::Item, table.item),
            ];
            if let Some(npc) = table.npc {
                slots.push((Component::Npc, npc));
            }

            slots
                .into_iter()
                .filter_map(|(component, offset)| {
                    let ptr = self
                        .reader
                        .read_u64(self.address.wrapping_add(offset))
                        .ok()?;
                    self.validator.is_valid(ptr).then_some((component, ptr))
                })
                .collect()
        })
    }

    pub fn life(&self) -> Option<Life> {
        *self.life.get_or_init(|| {
            let ptr = *self.components().get(&Component::Life)?;
            let fields = &self.layout.life;
            let current = self.reader.read_i32(ptr.wrapping_add(fields.current)).ok()?;
            let maximum = self.reader.read_i32(ptr.wrapping_add(fields.maximum)).ok()?;
            Life::from_raw(current, maximum)
        })
    }

    pub fn position(&self) -> Option<Position> {
        *self.position.get_or_init(|| {
            let ptr = *self.components().get(&Component::Position)?;
            let fields = &self.layout.position;
            let x = self.reader.read_f32(ptr.wrapping_add(fields.x)).ok()?;
            let y = self.reader.read_f32(ptr.wrapping_add(fields.y)).ok()?;
            (x.is_finite() && y.is_finite()).then_some(Position { x, y })
        })
    }

    /// Type by component presence, in priority order
    /// Player > Monster > Item > NPC > Unknown.
    pub fn kind(&self) -> EntityType {
        *self.kind.get_or_init(|| {
            const PRIORITY: [(Component, EntityType); 4] = [
                (Component::Player, EntityType::Player),
                (Component::Monster, EntityType::Monster),
                (Component::Item, EntityType::Item),
                (Component::Npc, EntityType::Npc),
            ];

            let components = self.components();
            PRIORITY
                .iter()
                .find(|(component, _)| components.contains_key(component))
                .map(|(_, kind)| *kind)
                .unwrap_or(EntityType::Unknown)
        })
    }

    /// Decode every field. `Ok(None)` when the node carries no id.
    pub fn materialize(&self) -> Result<Option<EntityRecord>> {
        let Some(id) = self.id()? else {
            return Ok(None);
        };

        Ok(Some(EntityRecord {
            id,
            address: self.address,
            kind: self.kind(),
            position: self.position(),
            life: self.life(),
            components: self.components().clone(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MockMemoryBuilder;

    const ENTITY: u64 = 0x1E8_0000_1000;
    const LIFE_COMPONENT: u64 = 0x1E8_0000_2000;
    const POSITION_COMPONENT: u64 = 0x1E8_0000_3000;
    const MARKER: u64 = 0x1E8_0000_4000;

    fn layout() -> EntityLayout {
        EntityLayout::default()
    }

    fn base_entity() -> MockMemoryBuilder {
        let layout = layout();
        // Map the whole entity header so component reads succeed (null)
        MockMemoryBuilder::new()
            .with_zeroed(ENTITY, 0x80)
            .with_u64(ENTITY + 0x8, 0x1234)
            .with_u64(ENTITY + layout.components.life, LIFE_COMPONENT)
            .with_i32(LIFE_COMPONENT + layout.life.current, 50)
            .with_i32(LIFE_COMPONENT + layout.life.maximum, 100)
            .with_u64(ENTITY + layout.components.position, POSITION_COMPONENT)
            .with_f32(POSITION_COMPONENT + layout.position.x, 12.5)
            .with_f32(POSITION_COMPONENT + layout.position.y, -3.25)
    }

    #[test]
    fn test_life_bounds() {
        assert!(Life::from_raw(50, 100).is_some());
        assert!(Life::from_raw(0, 100).is_some());
        assert!(Life::from_raw(100, 100).is_some());
        assert!(Life::from_raw(101, 100).is_none());
        assert!(Life::from_raw(-1, 100).is_none());
        assert!(Life::from_raw(0, 0).is_none());
        assert_eq!(Life::from_raw(25, 200).unwrap().percent, 12.5);
    }

    #[test]
    fn test_materialize_monster() {
        let layout = layout();
        let reader = base_entity()
            .with_u64(ENTITY + layout.components.monster, MARKER)
            .build();
        let validator = AddressValidator::default();

        let view = EntityView::new(&reader, &layout, &validator, ENTITY);
        let record = view.materialize().unwrap().unwrap();

        assert_eq!(record.id, 0x1234);
        assert_eq!(record.kind, EntityType::Monster);
        assert_eq!(record.life.unwrap().percent, 50.0);
        assert_eq!(record.position, Some(Position::new(12.5, -3.25)));
    }

    #[test]
    fn test_display_name() {
        let mut record = EntityRecord {
            id: 0xBEEF,
            address: ENTITY,
            kind: EntityType::Npc,
            position: None,
            life: None,
            components: BTreeMap::new(),
        };
        assert_eq!(record.display_name(), "NPC_BEEF");

        record.position = Some(Position::new(12.5, -3.4));
        assert_eq!(record.display_name(), "NPC_BEEF (12.5, -3.4)");
    }

    #[test]
    fn test_type_priority() {
        let layout = layout();
        let reader = base_entity()
            .with_u64(ENTITY + layout.components.monster, MARKER)
            .with_u64(ENTITY + layout.components.player, MARKER)
            .with_u64(ENTITY + layout.components.item, MARKER)
            .build();
        let validator = AddressValidator::default();

        let view = EntityView::new(&reader, &layout, &validator, ENTITY);
        assert_eq!(view.kind(), EntityType::Player);
    }

    #[test]
    fn test_invalid_component_pointer_is_absent() {
        let layout = layout();
        // Monster slot holds a small integer, not a pointer
        let reader = base_entity()
            .with_u64(ENTITY + layout.components.monster, 0x42)
            .build();
        let validator = AddressValidator::default();

        let view = EntityView::new(&reader, &layout, &validator, ENTITY);
        assert_eq!(view.kind(), EntityType::Unknown);
        assert!(!view.components().contains_key(&Component::Monster));
    }

    #[test]
    fn test_implausible_life_is_dropped() {
        let layout = layout();
        let reader = base_entity()
            .with_i32(LIFE_COMPONENT + layout.life.current, 150)
            .build();
        let validator = AddressValidator::default();

        let view = EntityView::new(&reader, &layout, &validator, ENTITY);
        assert!(view.life().is_none());
        assert!(view.position().is_some());
    }

    #[test]
    fn test_id_probes_candidates_in_order() {
        let reader = MockMemoryBuilder::new()
            .with_zeroed(ENTITY, 0x80)
            .with_u64(ENTITY + 0x10, 0x99)
            .with_u64(ENTITY + 0x18, 0x77)
            .build();
        let layout = layout();
        let validator = AddressValidator::default();

        let view = EntityView::new(&reader, &layout, &validator, ENTITY);
        assert_eq!(view.id().unwrap(), Some(0x99));
    }

    #[test]
    fn test_negative_id_is_rejected() {
        let reader = MockMemoryBuilder::new()
            .with_zeroed(ENTITY, 0x80)
            .with_u64(ENTITY + 0x8, u64::MAX)
            .build();
        let layout = layout();
        let validator = AddressValidator::default();

        let view = EntityView::new(&reader, &layout, &validator, ENTITY);
        assert_eq!(view.id().unwrap(), None);
        assert_eq!(view.materialize().unwrap(), None);
    }

    #[test]
    fn test_unreadable_node_is_an_error() {
        let reader = MockMemoryBuilder::new().build();
        let layout = layout();
        let validator = AddressValidator::default();

        let view = EntityView::new(&reader, &layout, &validator, ENTITY);
        assert!(view.materialize().is_err());
    }

    #[test]
    fn test_fields_are_cached() {
        let layout = layout();
        let reader = base_entity().build();
        let validator = AddressValidator::default();

        let view = EntityView::new(&reader, &layout, &validator, ENTITY);
        assert_eq!(view.life().unwrap().current, 50);

        // Later memory changes do not affect an already-decoded field
        reader.poke(LIFE_COMPONENT + layout.life.current, &10i32.to_le_bytes());
        assert_eq!(view.life().unwrap().current, 50);
    }

    #[test]
    fn test_entity_type_parse() {
        assert_eq!("monster".parse::<EntityType>().unwrap(), EntityType::Monster);
        assert_eq!("NPC".parse::<EntityType>().unwrap(), EntityType::Npc);
        assert_eq!("npc".parse::<EntityType>().unwrap(), EntityType::Npc);
        assert!("boss".parse::<EntityType>().is_err());
    }

    #[test]
    fn test_entity_type_labels() {
        assert_eq!(EntityType::Npc.to_string(), "NPC");
        assert_eq!(<&'static str>::from(EntityType::Npc), "NPC");
        assert_eq!(EntityType::Monster.to_string(), "Monster");
    }
}
