//! Runtime configuration
//!
//! Everything here is static data loaded at startup. The core never derives
//! these values; wrong values produce absent fields, not failures.

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::memory::AddressValidator;
use crate::memory::layout::{component, life, node, position, timing};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub process: ProcessConfig,
    pub validator: AddressValidator,
    pub entity: EntityLayout,
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path)?;
        let config = serde_json::from_str(&content)?;
        Ok(config)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }
}

/// Which process to attach to and where its stats root lives.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessConfig {
    /// Candidate executable names, tried in order
    pub names: Vec<String>,
    /// Offset of the stats root pointer from the main module base
    pub stats_base_offset: u64,
}

/// Layout of the entity list and of the components hanging off each entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EntityLayout {
    pub head_offset: u64,
    pub next_offset: u64,
    pub id_offset: u64,
    pub id_candidates: Vec<u64>,
    pub max_nodes: usize,
    pub refresh_cooldown_ms: u64,
    pub components: ComponentTable,
    pub life: LifeFields,
    pub position: PositionFields,
}

impl Default for EntityLayout {
    fn default() -> Self {
        Self {
            head_offset: node::HEAD,
            next_offset: node::NEXT,
            id_offset: node::ID,
            id_candidates: node::ID_CANDIDATES.to_vec(),
            max_nodes: node::MAX_NODES,
            refresh_cooldown_ms: timing::ENTITY_REFRESH_COOLDOWN_MS,
            components: ComponentTable::default(),
            life: LifeFields::default(),
            position: PositionFields::default(),
        }
    }
}

impl EntityLayout {
    pub fn refresh_cooldown(&self) -> Duration {
        Duration::from_millis(self.refresh_cooldown_ms)
    }
}

/// Component pointer offsets from an entity address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComponentTable {
    pub life: u64,
    pub mana: u64,
    pub position: u64,
    pub rendered: u64,
    pub player: u64,
    pub monster: u64,
    pub item: u64,
    /// Not present in every target build
    pub npc: Option<u64>,
}

impl Default for ComponentTable {
    fn default() -> Self {
        Self {
            life: component::LIFE,
            mana: component::MANA,
            position: component::POSITION,
            rendered: component::RENDERED,
            player: component::PLAYER,
            monster: component::MONSTER,
            item: component::ITEM,
            npc: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LifeFields {
    pub current: u64,
    pub maximum: u64,
}

impl Default for LifeFields {
    fn default() -> Self {
        Self {
            current: life::CURRENT,
            maximum: life::MAXIMUM,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PositionFields {
    pub x: u64,
    pub y: u64,
}

impl Default for PositionFields {
    fn default() -> Self {
        Self {
            x: position::X,
            y: position::Y,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn test_config_save_and_load() {
        let temp_file = NamedTempFile::new().unwrap();

        let mut config = Config::default();
        config.process.names = vec!["game.exe".to_string(), "game_x64.exe".to_string()];
        config.process.stats_base_offset = 0x03BB_2158;
        config.entity.max_nodes = 500;
        config.entity.components.npc = Some(0x68);
        config.save(temp_file.path()).unwrap();

        let loaded = Config::load(temp_file.path()).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let temp_file = NamedTempFile::new().unwrap();
        std::fs::write(
            temp_file.path(),
            r#"{"process": {"stats_base_offset": 4096}, "entity": {"next_offset": 0}}"#,
        )
        .unwrap();

        let loaded = Config::load(temp_file.path()).unwrap();
        assert_eq!(loaded.process.stats_base_offset, 0x1000);
        assert!(loaded.process.names.is_empty());
        assert_eq!(loaded.entity.next_offset, 0);
        assert_eq!(loaded.entity.max_nodes, node::MAX_NODES);
        assert_eq!(loaded.validator, AddressValidator::default());
    }

    #[test]
    fn test_refresh_cooldown() {
        let layout = EntityLayout::default();
        assert_eq!(layout.refresh_cooldown(), Duration::from_secs(1));
    }
}
