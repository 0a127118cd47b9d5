use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::offset::{ByteSignature, OffsetChain};

/// One write performed by a [`PatchDefinition`], relative to the signature match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatchSite {
    #[serde(default)]
    pub offset: i64,
    pub bytes: Vec<u8>,
}

/// A named byte patch located by signature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatchDefinition {
    pub name: String,
    pub module: String,
    pub signature: ByteSignature,
    pub sites: Vec<PatchSite>,
}

/// Externally supplied pointer chains and patch definitions.
///
/// Loaded once at startup and never mutated afterwards.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OffsetsCollection {
    #[serde(default)]
    pub version: String,
    /// Named stat chains, resolved against the stats base pointer
    #[serde(default)]
    pub stats: BTreeMap<String, OffsetChain>,
    /// Chain to the entity list pointer, resolved against the stats base pointer
    #[serde(default)]
    pub entity_list: OffsetChain,
    #[serde(default)]
    pub patches: Vec<PatchDefinition>,
}

impl OffsetsCollection {
    pub fn is_valid(&self) -> bool {
        !self.stats.is_empty() || !self.entity_list.is_empty()
    }

    pub fn has_entity_list(&self) -> bool {
        !self.entity_list.is_empty()
    }

    /// Find a patch definition by name (case-insensitive)
    pub fn patch(&self, name: &str) -> Option<&PatchDefinition> {
        self.patches
            .iter()
            .find(|patch| patch.name.eq_ignore_ascii_case(name))
    }
}

pub fn load_offsets<P: AsRef<Path>>(path: P) -> Result<OffsetsCollection> {
    let content = fs::read_to_string(&path)?;
    let data = serde_json::from_str(&content)?;
    Ok(data)
}

pub fn save_offsets<P: AsRef<Path>>(path: P, offsets: &OffsetsCollection) -> Result<()> {
    let content = serde_json::to_string_pretty(offsets)?;
    fs::write(path, content)?;
    Ok(())
}
