//! # scry-core
//!
//! Core library for inspecting the memory of a running process.
//!
//! This crate provides:
//! - Windows process attachment and memory reading/writing
//! - Pointer chain resolution and masked byte signature scanning
//! - Bounded traversal of linked entity lists
//! - Player stat snapshots and a rate-limited entity catalog
//!
//! Offsets, signatures and structure layouts are configuration data loaded at
//! startup; nothing here is specific to one target build.
//!
//! ## Feature Flags
//!
//! - `debug-tools`: Enables step-by-step pointer chain tracing.
//!   This feature is intended for CLI tools and development, not production use.
//! - `test-support`: Exposes the in-memory mock reader used by the integration tests.

pub mod config;
pub mod entity;
pub mod error;
pub mod memory;
pub mod offset;
pub mod scry;
pub mod stats;

pub use config::{ComponentTable, Config, EntityLayout, LifeFields, PositionFields, ProcessConfig};
pub use entity::{
    Component, EntityCatalog, EntityRecord, EntitySet, EntityType, EntityView, Life,
    LinkedStructureWalker, MemoryNode, Position, RefreshOutcome, StopReason, Walk,
};
pub use error::{Error, Result};
pub use memory::{
    AddressValidator, MemoryReader, ModuleInfo, ModuleProvider, ProcessHandle, ProcessInfo,
    ReadMemory, WriteMemory,
};
pub use offset::{
    ByteSignature, OffsetChain, OffsetsCollection, PatchDefinition, PatchSite, PatternScanner,
    PointerChainResolver, find_in_buffer, load_offsets, save_offsets,
};
pub use scry::Scry;
pub use stats::{StatField, StatValue, StatsSnapshot, StatsSnapshotReader};

// Chain tracing (requires debug-tools feature)
#[cfg(feature = "debug-tools")]
pub use offset::{ChainFailure, ChainStep, ChainTrace};
