//! Signature scanning and byte patching
//!
//! Module images are scanned in fixed-size chunks. The last `len - 1` bytes of
//! each chunk are carried into the next one, so a pattern straddling a chunk
//! boundary is still found. Only the leftmost match is reported.

use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::memory::layout::scan;
use crate::memory::{ModuleInfo, ModuleProvider, ReadMemory, WriteMemory};
use crate::offset::{ByteSignature, PatchDefinition};

pub struct PatternScanner<'a, M: ?Sized> {
    memory: &'a M,
    chunk_size: usize,
}

impl<'a, M: ReadMemory + ?Sized> PatternScanner<'a, M> {
    pub fn new(memory: &'a M) -> Self {
        Self {
            memory,
            chunk_size: scan::CHUNK_SIZE,
        }
    }

    /// Override the per-read chunk size (clamped to at least one byte).
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    /// Find the leftmost occurrence of `signature` in the module image.
    ///
    /// An unreadable chunk is skipped: the overlap tail is dropped, so a
    /// match spanning into an unreadable chunk cannot be reported.
    pub fn find(&self, module: &ModuleInfo, signature: &ByteSignature) -> Option<u64> {
        let pattern_len = signature.len();
        if pattern_len == 0 || (module.size as usize) < pattern_len {
            return None;
        }

        let end = module.end();
        let keep = pattern_len - 1;
        let mut addr = module.base;
        let mut tail: Vec<u8> = Vec::new();

        while addr < end {
            let read_size = (end - addr).min(self.chunk_size as u64) as usize;

            let chunk = match self.memory.read_bytes(addr, read_size) {
                Ok(bytes) => bytes,
                Err(e) => {
                    debug!(
                        "Skipping unreadable chunk at {:#x} ({} bytes): {}",
                        addr, read_size, e
                    );
                    tail.clear();
                    addr += read_size as u64;
                    continue;
                }
            };

            let mut data = Vec::with_capacity(tail.len() + chunk.len());
            data.extend_from_slice(&tail);
            data.extend_from_slice(&chunk);
            let data_base = addr - tail.len() as u64;

            if let Some(pos) = find_in_buffer(&data, signature) {
                return Some(data_base + pos as u64);
            }

            if data.len() > keep {
                tail = data.split_off(data.len() - keep);
            } else {
                tail = data;
            }

            addr += read_size as u64;
        }

        None
    }
}

impl<'a, M: ReadMemory + ModuleProvider + ?Sized> PatternScanner<'a, M> {
    /// Look up a module by name, then scan it.
    pub fn find_in_module(&self, module_name: &str, signature: &ByteSignature) -> Option<u64> {
        match self.memory.find_module(module_name) {
            Ok(module) => self.find(&module, signature),
            Err(e) => {
                warn!("AOB scan in {} skipped: {}", module_name, e);
                None
            }
        }
    }
}

impl<'a, M: WriteMemory + ?Sized> PatternScanner<'a, M> {
    /// Write raw bytes at an absolute address.
    ///
    /// No check is made that the region is writable; failure is whatever the
    /// underlying write reports.
    pub fn patch(&self, address: u64, bytes: &[u8]) -> Result<()> {
        self.memory.write_bytes(address, bytes)?;
        debug!("Patched {} bytes at {:#x}", bytes.len(), address);
        Ok(())
    }
}

impl<'a, M: ReadMemory + WriteMemory + ModuleProvider + ?Sized> PatternScanner<'a, M> {
    /// Apply a named patch: locate its signature, then write every site.
    ///
    /// Returns the address where the signature matched. Sites are written in
    /// order; a failure stops at that site and earlier writes stay applied.
    pub fn apply(&self, definition: &PatchDefinition) -> Result<u64> {
        let module = self.memory.find_module(&definition.module)?;
        let address = self
            .find(&module, &definition.signature)
            .ok_or_else(|| Error::SignatureNotFound(definition.name.clone()))?;

        for site in &definition.sites {
            let target = address.wrapping_add_signed(site.offset);
            self.patch(target, &site.bytes)?;
        }

        info!(
            "Applied patch '{}' at {:#x} ({} site(s))",
            definition.name,
            address,
            definition.sites.len()
        );
        Ok(address)
    }
}

/// Leftmost match of `signature` in `buffer`.
///
/// Candidates are located with `memchr` on the first concrete byte; an
/// all-wildcard signature matches at offset zero.
pub fn find_in_buffer(buffer: &[u8], signature: &ByteSignature) -> Option<usize> {
    let pattern_len = signature.len();
    if pattern_len == 0 || buffer.len() < pattern_len {
        return None;
    }
    let last = buffer.len() - pattern_len;

    let Some((anchor_index, anchor_byte)) = signature.anchor() else {
        return Some(0);
    };

    memchr::memchr_iter(anchor_byte, &buffer[anchor_index..=anchor_index + last])
        .find(|&start| signature.matches(&buffer[start..start + pattern_len]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{MockMemoryBuilder, MockMemoryReader};
    use crate::offset::PatchSite;

    const MODULE_BASE: u64 = 0x1_4000_0000;

    fn module_with(image: &[u8]) -> (MockMemoryReader, ModuleInfo) {
        let reader = MockMemoryBuilder::new()
            .base_address(MODULE_BASE)
            .with_bytes(MODULE_BASE, image)
            .with_module("game.exe", MODULE_BASE, image.len() as u64)
            .build();
        let module = ModuleInfo::new("game.exe", MODULE_BASE, image.len() as u64);
        (reader, module)
    }

    #[test]
    fn test_find_in_buffer_leftmost() {
        let signature: ByteSignature = "AB ?? CD".parse().unwrap();
        let buffer = [0x00, 0xAB, 0x01, 0xCD, 0xAB, 0x02, 0xCD];
        assert_eq!(find_in_buffer(&buffer, &signature), Some(1));
    }

    #[test]
    fn test_find_in_buffer_leading_wildcard() {
        let signature: ByteSignature = "?? ?? CD".parse().unwrap();
        assert_eq!(find_in_buffer(&[0xCD, 0x00, 0x11, 0xCD], &signature), Some(1));
        assert_eq!(find_in_buffer(&[0xCD, 0x00], &signature), None);
    }

    #[test]
    fn test_wildcards_match_any_value() {
        let signature: ByteSignature = "F3 0F 5D 0D ?? ?? ?? 02".parse().unwrap();
        for filler in [0x00u8, 0x7F, 0xFF] {
            let mut image = vec![0xCCu8; 64];
            image[20..28].copy_from_slice(&[0xF3, 0x0F, 0x5D, 0x0D, filler, filler, filler, 0x02]);
            let (reader, module) = module_with(&image);

            let scanner = PatternScanner::new(&reader).with_chunk_size(16);
            assert_eq!(scanner.find(&module, &signature), Some(MODULE_BASE + 20));
        }
    }

    #[test]
    fn test_returns_leftmost_of_multiple_matches() {
        let mut image = vec![0u8; 256];
        image[200..203].copy_from_slice(&[0xDE, 0xAD, 0xBE]);
        image[40..43].copy_from_slice(&[0xDE, 0xAD, 0xBE]);
        let (reader, module) = module_with(&image);

        let scanner = PatternScanner::new(&reader).with_chunk_size(32);
        let signature: ByteSignature = "DE AD BE".parse().unwrap();
        assert_eq!(scanner.find(&module, &signature), Some(MODULE_BASE + 40));
    }

    #[test]
    fn test_match_straddling_chunk_boundary() {
        const CHUNK: usize = 64;
        let pattern = [0x48, 0x8B, 0x05, 0x11, 0x22, 0x33];

        // Every split point of the pattern across the first boundary
        for split in 1..pattern.len() {
            let mut image = vec![0u8; CHUNK * 4];
            let start = CHUNK - split;
            image[start..start + pattern.len()].copy_from_slice(&pattern);
            let (reader, module) = module_with(&image);

            let scanner = PatternScanner::new(&reader).with_chunk_size(CHUNK);
            let signature: ByteSignature = "48 8B 05 ?? ?? 33".parse().unwrap();
            assert_eq!(
                scanner.find(&module, &signature),
                Some(MODULE_BASE + start as u64),
                "split at {}",
                split
            );
        }
    }

    #[test]
    fn test_match_at_end_of_image() {
        let mut image = vec![0u8; 100];
        image[97..100].copy_from_slice(&[1, 2, 3]);
        let (reader, module) = module_with(&image);

        let scanner = PatternScanner::new(&reader).with_chunk_size(32);
        let signature: ByteSignature = "01 02 03".parse().unwrap();
        assert_eq!(scanner.find(&module, &signature), Some(MODULE_BASE + 97));
    }

    #[test]
    fn test_not_found() {
        let (reader, module) = module_with(&[0u8; 128]);
        let scanner = PatternScanner::new(&reader).with_chunk_size(32);
        let signature: ByteSignature = "01 02".parse().unwrap();
        assert_eq!(scanner.find(&module, &signature), None);
    }

    #[test]
    fn test_unreadable_chunk_is_skipped() {
        // Second chunk of the module is unmapped
        let reader = MockMemoryBuilder::new()
            .with_zeroed(MODULE_BASE, 32)
            .with_bytes(MODULE_BASE + 64, &[0xAA, 0xBB, 0, 0])
            .with_zeroed(MODULE_BASE + 68, 28)
            .build();
        let module = ModuleInfo::new("game.exe", MODULE_BASE, 96);

        let scanner = PatternScanner::new(&reader).with_chunk_size(32);
        let signature: ByteSignature = "AA BB".parse().unwrap();
        assert_eq!(scanner.find(&module, &signature), Some(MODULE_BASE + 64));
    }

    #[test]
    fn test_find_in_unknown_module() {
        let (reader, _) = module_with(&[0xAA; 16]);
        let scanner = PatternScanner::new(&reader);
        let signature: ByteSignature = "AA".parse().unwrap();
        assert_eq!(scanner.find_in_module("missing.dll", &signature), None);
        assert_eq!(
            scanner.find_in_module("GAME.EXE", &signature),
            Some(MODULE_BASE)
        );
    }

    #[test]
    fn test_patch_writes_bytes() {
        let (reader, _) = module_with(&[0u8; 16]);
        let scanner = PatternScanner::new(&reader);

        scanner.patch(MODULE_BASE + 4, &[0x90, 0x90]).unwrap();
        assert_eq!(
            reader.read_bytes(MODULE_BASE + 3, 4).unwrap(),
            vec![0x00, 0x90, 0x90, 0x00]
        );
    }

    #[test]
    fn test_patch_failure_is_reported() {
        let reader = MockMemoryBuilder::new()
            .with_zeroed(MODULE_BASE, 16)
            .read_only()
            .build();
        let scanner = PatternScanner::new(&reader);

        assert!(matches!(
            scanner.patch(MODULE_BASE, &[0x90]),
            Err(Error::MemoryWriteFailed { .. })
        ));
    }

    #[test]
    fn test_apply_patch_definition() {
        let mut image = vec![0xCCu8; 64];
        image[10..14].copy_from_slice(&[0x74, 0x05, 0x0F, 0x84]);
        let (reader, _) = module_with(&image);
        let scanner = PatternScanner::new(&reader);

        let definition = PatchDefinition {
            name: "skip-branch".to_string(),
            module: "game.exe".to_string(),
            signature: "74 ?? 0F 84".parse().unwrap(),
            sites: vec![
                PatchSite {
                    offset: 0,
                    bytes: vec![0x75],
                },
                PatchSite {
                    offset: 4,
                    bytes: vec![0x90, 0x90],
                },
            ],
        };

        let address = scanner.apply(&definition).unwrap();
        assert_eq!(address, MODULE_BASE + 10);
        assert_eq!(
            reader.read_bytes(MODULE_BASE + 10, 6).unwrap(),
            vec![0x75, 0x05, 0x0F, 0x84, 0x90, 0x90]
        );
    }

    #[test]
    fn test_apply_missing_signature() {
        let (reader, _) = module_with(&[0u8; 32]);
        let scanner = PatternScanner::new(&reader);

        let definition = PatchDefinition {
            name: "absent".to_string(),
            module: "game.exe".to_string(),
            signature: "DE AD".parse().unwrap(),
            sites: vec![PatchSite {
                offset: 0,
                bytes: vec![0x90],
            }],
        };

        assert!(matches!(
            scanner.apply(&definition),
            Err(Error::SignatureNotFound(name)) if name == "absent"
        ));
    }
}
