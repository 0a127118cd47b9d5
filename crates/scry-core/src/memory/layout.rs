//! Default memory layout constants for the target's data structures
//!
//! These are the starting values for [`crate::config::Config`]. They are
//! configuration, not facts: a wrong value yields absent fields, never a
//! failure. Constants are organized by structure type.

/// Entity list node layout (offsets from a node address)
pub mod node {
    /// Offset from the resolved entity-list pointer to the head node pointer
    pub const HEAD: u64 = 0x0;
    /// Offset of the next-node pointer
    pub const NEXT: u64 = 0x8;
    /// Offset of the identifier read during traversal
    pub const ID: u64 = 0x8;
    /// Candidate identifier offsets, probed in order during materialization
    pub const ID_CANDIDATES: [u64; 3] = [0x8, 0x10, 0x18];
    /// Hard cap on nodes visited in one traversal
    pub const MAX_NODES: usize = 2000;
}

/// Component pointer offsets (from an entity address)
pub mod component {
    pub const LIFE: u64 = 0x30;
    pub const MANA: u64 = 0x38;
    pub const POSITION: u64 = 0x40;
    pub const RENDERED: u64 = 0x48;
    pub const PLAYER: u64 = 0x50;
    pub const MONSTER: u64 = 0x58;
    pub const ITEM: u64 = 0x60;
}

/// Field offsets inside the Life component
pub mod life {
    pub const CURRENT: u64 = 0x2C;
    pub const MAXIMUM: u64 = 0x30;
}

/// Field offsets inside the Position component
pub mod position {
    pub const X: u64 = 0x2C;
    pub const Y: u64 = 0x30;
}

/// Address plausibility bounds
pub mod address {
    /// Anything below this is a small integer, not a pointer
    pub const MIN: u64 = 0x10000;
    /// Highest canonical user-space address on x86-64
    pub const MAX_USER: u64 = 0x7FFF_FFFF_FFFF;
    /// Observed range of bits 32..63 for heap pointers of the target family
    pub const MIN_HIGH: u32 = 0x1E0;
    pub const MAX_HIGH: u32 = 0x1F0;
}

/// Timing constants for polling and rate limiting
pub mod timing {
    /// Minimum interval between two non-forced entity refreshes (ms)
    pub const ENTITY_REFRESH_COOLDOWN_MS: u64 = 1000;

    /// Default poll interval for the watch loop (ms)
    pub const WATCH_POLL_INTERVAL_MS: u64 = 200;
}

/// Signature scanning
pub mod scan {
    /// Bytes read per chunk while scanning a module image
    pub const CHUNK_SIZE: usize = 0x10000;
}
