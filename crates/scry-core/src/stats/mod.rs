//! Player stat snapshots

mod reader;
mod snapshot;

pub use reader::*;
pub use snapshot::*;
