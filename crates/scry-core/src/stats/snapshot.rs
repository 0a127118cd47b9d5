use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString, IntoStaticStr};

/// Known stat chain names, as they appear in the offsets file.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumString, IntoStaticStr, Display,
)]
pub enum StatField {
    #[strum(serialize = "LiveHP")]
    CurrentHp,
    #[strum(serialize = "MaxHP")]
    MaxHp,
    #[strum(serialize = "CurMP")]
    CurrentMp,
    #[strum(serialize = "MaxMP")]
    MaxMp,
    #[strum(serialize = "LiveES")]
    CurrentEs,
    #[strum(serialize = "MaxES")]
    MaxEs,
    #[strum(serialize = "PosX")]
    PosX,
    #[strum(serialize = "PosY")]
    PosY,
    #[strum(serialize = "IngameState")]
    IngameState,
    #[strum(serialize = "EntityList")]
    EntityList,
}

impl StatField {
    /// Key under which the value is stored in a [`StatsSnapshot`]
    pub fn key(&self) -> &'static str {
        match self {
            Self::CurrentHp => keys::CURRENT_HP,
            Self::MaxHp => keys::MAX_HP,
            Self::CurrentMp => keys::CURRENT_MP,
            Self::MaxMp => keys::MAX_MP,
            Self::CurrentEs => keys::CURRENT_ES,
            Self::MaxEs => keys::MAX_ES,
            Self::PosX => keys::POS_X,
            Self::PosY => keys::POS_Y,
            Self::IngameState => keys::INGAME_STATE,
            Self::EntityList => keys::ENTITY_LIST,
        }
    }

    /// Position fields are 4-byte floats; everything else is a 4-byte int.
    pub fn is_float(&self) -> bool {
        matches!(self, Self::PosX | Self::PosY)
    }
}

/// Snapshot keys
pub mod keys {
    pub const CURRENT_HP: &str = "current_hp";
    pub const MAX_HP: &str = "max_hp";
    pub const CURRENT_MP: &str = "current_mp";
    pub const MAX_MP: &str = "max_mp";
    pub const CURRENT_ES: &str = "current_es";
    pub const MAX_ES: &str = "max_es";
    pub const POS_X: &str = "pos_x";
    pub const POS_Y: &str = "pos_y";
    pub const INGAME_STATE: &str = "ingame_state";
    pub const ENTITY_LIST: &str = "entity_list";
    pub const HP_PERCENT: &str = "hp_percent";
    pub const MP_PERCENT: &str = "mp_percent";
    pub const ES_PERCENT: &str = "es_percent";
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StatValue {
    Int(i32),
    Float(f64),
}

impl StatValue {
    pub fn as_f64(&self) -> f64 {
        match self {
            Self::Int(v) => *v as f64,
            Self::Float(v) => *v,
        }
    }
}

impl fmt::Display for StatValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(v) => write!(f, "{}", v),
            Self::Float(v) => write!(f, "{:.2}", v),
        }
    }
}

/// Flat mapping of stat name to value from one read cycle.
///
/// A field whose chain did not resolve is absent, which is distinct from a
/// field that was read as zero. The three percentages are always present.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StatsSnapshot {
    values: BTreeMap<String, StatValue>,
}

impl StatsSnapshot {
    pub(crate) fn insert(&mut self, key: impl Into<String>, value: StatValue) {
        self.values.insert(key.into(), value);
    }

    pub fn get(&self, key: &str) -> Option<StatValue> {
        self.values.get(key).copied()
    }

    pub fn int(&self, key: &str) -> Option<i32> {
        match self.get(key)? {
            StatValue::Int(v) => Some(v),
            StatValue::Float(_) => None,
        }
    }

    pub fn float(&self, key: &str) -> Option<f64> {
        self.get(key).map(|value| value.as_f64())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, StatValue)> {
        self.values.iter().map(|(key, value)| (key.as_str(), *value))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn current_hp(&self) -> Option<i32> {
        self.int(keys::CURRENT_HP)
    }

    pub fn max_hp(&self) -> Option<i32> {
        self.int(keys::MAX_HP)
    }

    pub fn hp_percent(&self) -> f64 {
        self.float(keys::HP_PERCENT).unwrap_or(0.0)
    }

    pub fn mp_percent(&self) -> f64 {
        self.float(keys::MP_PERCENT).unwrap_or(0.0)
    }

    pub fn es_percent(&self) -> f64 {
        self.float(keys::ES_PERCENT).unwrap_or(0.0)
    }

    /// Player position from `pos_x`/`pos_y`, if both were read.
    pub fn position(&self) -> Option<(f64, f64)> {
        Some((self.float(keys::POS_X)?, self.float(keys::POS_Y)?))
    }

    /// `current / maximum * 100`, or `0.0` when either is missing or
    /// `maximum <= 0`.
    pub(crate) fn percent(&self, current: &str, maximum: &str) -> f64 {
        match (self.int(current), self.int(maximum)) {
            (Some(current), Some(maximum)) if maximum > 0 => {
                current as f64 / maximum as f64 * 100.0
            }
            _ => 0.0,
        }
    }

    pub(crate) fn derive_percentages(&mut self) {
        let hp = self.percent(keys::CURRENT_HP, keys::MAX_HP);
        let mp = self.percent(keys::CURRENT_MP, keys::MAX_MP);
        let es = self.percent(keys::CURRENT_ES, keys::MAX_ES);
        self.insert(keys::HP_PERCENT, StatValue::Float(hp));
        self.insert(keys::MP_PERCENT, StatValue::Float(mp));
        self.insert(keys::ES_PERCENT, StatValue::Float(es));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_names() {
        assert_eq!("LiveHP".parse::<StatField>().unwrap(), StatField::CurrentHp);
        assert_eq!(StatField::MaxEs.to_string(), "MaxES");
        assert_eq!(StatField::PosY.key(), "pos_y");
        assert!(StatField::PosX.is_float());
        assert!(!StatField::IngameState.is_float());
        assert!("Mana".parse::<StatField>().is_err());
    }

    #[test]
    fn test_percentages() {
        let mut snapshot = StatsSnapshot::default();
        snapshot.insert(keys::CURRENT_HP, StatValue::Int(30));
        snapshot.insert(keys::MAX_HP, StatValue::Int(120));
        snapshot.insert(keys::CURRENT_MP, StatValue::Int(10));
        snapshot.insert(keys::MAX_ES, StatValue::Int(-5));
        snapshot.derive_percentages();

        assert_eq!(snapshot.hp_percent(), 25.0);
        // Missing maximum
        assert_eq!(snapshot.mp_percent(), 0.0);
        // Negative maximum, missing current
        assert_eq!(snapshot.es_percent(), 0.0);
    }

    #[test]
    fn test_serializes_flat() {
        let mut snapshot = StatsSnapshot::default();
        snapshot.insert(keys::CURRENT_HP, StatValue::Int(7));
        snapshot.insert(keys::POS_X, StatValue::Float(1.5));

        let json = serde_json::to_string(&snapshot).unwrap();
        assert_eq!(json, r#"{"current_hp":7,"pos_x":1.5}"#);
    }
}
