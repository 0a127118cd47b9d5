//! CLI command implementations.

pub mod chain;
pub mod entities;
pub mod hex_utils;
pub mod hexdump;
pub mod modules;
pub mod patch;
pub mod processes;
pub mod scan;
pub mod stats;
pub mod walk;
pub mod watch;
