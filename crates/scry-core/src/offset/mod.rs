mod chain;
mod collection;
mod scanner;
mod signature;

pub use chain::*;
pub use collection::*;
pub use scanner::*;
pub use signature::*;
