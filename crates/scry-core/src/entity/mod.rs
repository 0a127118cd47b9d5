//! Entity list traversal and decoding

mod catalog;
mod record;
mod walker;

pub use catalog::*;
pub use record::*;
pub use walker::*;
