//! In-memory stand-in for a target process.
//!
//! Memory is sparse: only bytes placed through the builder are mapped, and any
//! read touching an unmapped byte fails the same way a real unmapped page does.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::RwLock;

use crate::error::{Error, Result};
use crate::memory::{ModuleInfo, ModuleProvider, ReadMemory, WriteMemory};

pub struct MockMemoryReader {
    bytes: RwLock<BTreeMap<u64, u8>>,
    base_address: u64,
    modules: Vec<ModuleInfo>,
    read_only: bool,
    attached: AtomicBool,
}

impl MockMemoryReader {
    /// Simulate the target process exiting.
    pub fn detach(&self) {
        self.attached.store(false, Ordering::SeqCst);
    }

    /// Poke bytes after construction (e.g. to change state between refreshes).
    pub fn poke(&self, address: u64, data: &[u8]) {
        let mut bytes = self.bytes.write().unwrap_or_else(|e| e.into_inner());
        for (i, byte) in data.iter().enumerate() {
            bytes.insert(address + i as u64, *byte);
        }
    }

    pub fn poke_u64(&self, address: u64, value: u64) {
        self.poke(address, &value.to_le_bytes());
    }
}

impl ReadMemory for MockMemoryReader {
    fn read_bytes(&self, address: u64, size: usize) -> Result<Vec<u8>> {
        if !self.attached.load(Ordering::SeqCst) {
            return Err(Error::NotAttached);
        }

        let bytes = self.bytes.read().unwrap_or_else(|e| e.into_inner());
        let mut out = Vec::with_capacity(size);
        for i in 0..size as u64 {
            let addr = address
                .checked_add(i)
                .ok_or_else(|| Error::MemoryReadFailed {
                    address,
                    message: "address overflow".to_string(),
                })?;
            match bytes.get(&addr) {
                Some(byte) => out.push(*byte),
                None => {
                    return Err(Error::MemoryReadFailed {
                        address,
                        message: format!("unmapped byte at {:#x}", addr),
                    });
                }
            }
        }
        Ok(out)
    }

    fn base_address(&self) -> u64 {
        self.base_address
    }

    fn is_attached(&self) -> bool {
        self.attached.load(Ordering::SeqCst)
    }
}

impl WriteMemory for MockMemoryReader {
    fn write_bytes(&self, address: u64, data: &[u8]) -> Result<()> {
        if !self.attached.load(Ordering::SeqCst) {
            return Err(Error::NotAttached);
        }
        if self.read_only {
            return Err(Error::MemoryWriteFailed {
                address,
                message: "access denied".to_string(),
            });
        }

        let mut bytes = self.bytes.write().unwrap_or_else(|e| e.into_inner());
        if (0..data.len() as u64).any(|i| !bytes.contains_key(&(address + i))) {
            return Err(Error::MemoryWriteFailed {
                address,
                message: "unmapped region".to_string(),
            });
        }
        for (i, byte) in data.iter().enumerate() {
            bytes.insert(address + i as u64, *byte);
        }
        Ok(())
    }
}

impl ModuleProvider for MockMemoryReader {
    fn modules(&self) -> Result<Vec<ModuleInfo>> {
        if !self.attached.load(Ordering::SeqCst) {
            return Err(Error::NotAttached);
        }
        Ok(self.modules.clone())
    }
}

#[derive(Default)]
pub struct MockMemoryBuilder {
    bytes: BTreeMap<u64, u8>,
    base_address: u64,
    modules: Vec<ModuleInfo>,
    read_only: bool,
}

impl MockMemoryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn base_address(mut self, address: u64) -> Self {
        self.base_address = address;
        self
    }

    pub fn with_bytes(mut self, address: u64, data: &[u8]) -> Self {
        for (i, byte) in data.iter().enumerate() {
            self.bytes.insert(address + i as u64, *byte);
        }
        self
    }

    /// Map `size` zero bytes starting at `address`.
    pub fn with_zeroed(self, address: u64, size: usize) -> Self {
        self.with_bytes(address, &vec![0u8; size])
    }

    pub fn with_u64(self, address: u64, value: u64) -> Self {
        self.with_bytes(address, &value.to_le_bytes())
    }

    pub fn with_i32(self, address: u64, value: i32) -> Self {
        self.with_bytes(address, &value.to_le_bytes())
    }

    pub fn with_f32(self, address: u64, value: f32) -> Self {
        self.with_bytes(address, &value.to_le_bytes())
    }

    pub fn with_module(mut self, name: &str, base: u64, size: u64) -> Self {
        self.modules.push(ModuleInfo::new(name, base, size));
        self
    }

    /// Reject all writes as access-denied.
    pub fn read_only(mut self) -> Self {
        self.read_only = true;
        self
    }

    pub fn build(self) -> MockMemoryReader {
        MockMemoryReader {
            bytes: RwLock::new(self.bytes),
            base_address: self.base_address,
            modules: self.modules,
            read_only: self.read_only,
            attached: AtomicBool::new(true),
        }
    }
}
