use crate::error::{Error, Result};
use crate::memory::{ModuleInfo, ProcessHandle};

/// Read access to a target address space.
///
/// Typed reads decode little-endian values on top of [`ReadMemory::read_bytes`].
/// A short read is reported as [`Error::MemoryReadFailed`], never padded.
pub trait ReadMemory {
    fn read_bytes(&self, address: u64, size: usize) -> Result<Vec<u8>>;

    /// Base address of the main module.
    fn base_address(&self) -> u64;

    /// Whether the target is still reachable. Readers without a notion of
    /// detachment are always attached.
    fn is_attached(&self) -> bool {
        true
    }

    fn read_u64(&self, address: u64) -> Result<u64> {
        let bytes = self.read_bytes(address, 8)?;
        decode::<8>(address, &bytes).map(u64::from_le_bytes)
    }

    fn read_i64(&self, address: u64) -> Result<i64> {
        let bytes = self.read_bytes(address, 8)?;
        decode::<8>(address, &bytes).map(i64::from_le_bytes)
    }

    fn read_i32(&self, address: u64) -> Result<i32> {
        let bytes = self.read_bytes(address, 4)?;
        decode::<4>(address, &bytes).map(i32::from_le_bytes)
    }

    fn read_f32(&self, address: u64) -> Result<f32> {
        let bytes = self.read_bytes(address, 4)?;
        decode::<4>(address, &bytes).map(f32::from_le_bytes)
    }
}

/// Write access to a target address space.
pub trait WriteMemory {
    fn write_bytes(&self, address: u64, bytes: &[u8]) -> Result<()>;
}

/// Enumeration of the modules loaded in the target.
pub trait ModuleProvider {
    fn modules(&self) -> Result<Vec<ModuleInfo>>;

    /// Find a module by name (case-insensitive)
    fn find_module(&self, name: &str) -> Result<ModuleInfo> {
        self.modules()?
            .into_iter()
            .find(|module| module.name.eq_ignore_ascii_case(name))
            .ok_or_else(|| Error::ModuleNotFound(name.to_string()))
    }
}

fn decode<const N: usize>(address: u64, bytes: &[u8]) -> Result<[u8; N]> {
    bytes
        .get(..N)
        .and_then(|b| b.try_into().ok())
        .ok_or_else(|| Error::MemoryReadFailed {
            address,
            message: format!("short read: expected {} bytes, got {}", N, bytes.len()),
        })
}

/// Memory access backed by an open process handle.
pub struct MemoryReader<'a> {
    process: &'a ProcessHandle,
}

impl<'a> MemoryReader<'a> {
    pub fn new(process: &'a ProcessHandle) -> Self {
        Self { process }
    }
}

impl ReadMemory for MemoryReader<'_> {
    fn read_bytes(&self, address: u64, size: usize) -> Result<Vec<u8>> {
        self.process.read_memory(address, size)
    }

    fn base_address(&self) -> u64 {
        self.process.base_address
    }

    fn is_attached(&self) -> bool {
        self.process.is_alive()
    }
}

impl WriteMemory for MemoryReader<'_> {
    fn write_bytes(&self, address: u64, bytes: &[u8]) -> Result<()> {
        self.process.write_memory(address, bytes)
    }
}

impl ModuleProvider for MemoryReader<'_> {
    fn modules(&self) -> Result<Vec<ModuleInfo>> {
        self.process.modules()
    }
}
