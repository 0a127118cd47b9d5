use serde::{Deserialize, Serialize};

use crate::memory::layout::address;

/// Pointer plausibility check.
///
/// A value is accepted only if it is at least `min_address`, at most
/// `max_address`, and its high dword (bits 32..63) lies in
/// `[min_high, max_high]`. Null is always rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AddressValidator {
    pub min_address: u64,
    pub max_address: u64,
    pub min_high: u32,
    pub max_high: u32,
}

impl Default for AddressValidator {
    fn default() -> Self {
        Self {
            min_address: address::MIN,
            max_address: address::MAX_USER,
            min_high: address::MIN_HIGH,
            max_high: address::MAX_HIGH,
        }
    }
}

impl AddressValidator {
    /// Accept any canonical user-space address above the floor, with no
    /// constraint on the high dword.
    pub fn permissive() -> Self {
        Self {
            min_address: address::MIN,
            max_address: address::MAX_USER,
            min_high: 0,
            max_high: (address::MAX_USER >> 32) as u32,
        }
    }

    pub fn is_valid(&self, addr: u64) -> bool {
        if addr == 0 || addr < self.min_address || addr > self.max_address {
            return false;
        }

        let high = (addr >> 32) as u32;
        (self.min_high..=self.max_high).contains(&high)
    }
}
