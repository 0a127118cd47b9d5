pub mod layout;
mod process;
mod reader;
mod validator;

// Mock memory reader for unit tests, and for integration tests via `test-support`
#[cfg(any(test, feature = "test-support"))]
#[doc(hidden)]
pub mod mock;

pub use process::*;
pub use reader::{MemoryReader, ModuleProvider, ReadMemory, WriteMemory};
pub use validator::AddressValidator;

#[cfg(any(test, feature = "test-support"))]
#[doc(hidden)]
pub use mock::{MockMemoryBuilder, MockMemoryReader};
