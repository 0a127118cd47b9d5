use std::fmt;

use serde::{Deserialize, Serialize};

use crate::memory::ReadMemory;

/// Ordered pointer-chain offsets.
///
/// All but the last offset are (dereference, add) steps; the last one is added
/// to the final pointer without a further dereference because it addresses a
/// field, not another pointer.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OffsetChain(Vec<i64>);

impl OffsetChain {
    pub fn new(offsets: Vec<i64>) -> Self {
        Self(offsets)
    }

    pub fn offsets(&self) -> &[i64] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

impl From<Vec<i64>> for OffsetChain {
    fn from(offsets: Vec<i64>) -> Self {
        Self(offsets)
    }
}

impl<const N: usize> From<[i64; N]> for OffsetChain {
    fn from(offsets: [i64; N]) -> Self {
        Self(offsets.to_vec())
    }
}

impl fmt::Display for OffsetChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, offset) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            if *offset < 0 {
                write!(f, "-{:#X}", offset.unsigned_abs())?;
            } else {
                write!(f, "{:#X}", offset)?;
            }
        }
        write!(f, "]")
    }
}

/// Follows pointer chains through a memory reader.
pub struct PointerChainResolver<'a, R: ReadMemory + ?Sized> {
    reader: &'a R,
}

impl<'a, R: ReadMemory + ?Sized> PointerChainResolver<'a, R> {
    pub fn new(reader: &'a R) -> Self {
        Self { reader }
    }

    /// Resolve `chain` starting at `base`.
    ///
    /// Reads the pointer stored at `base`, then for every offset but the last
    /// dereferences `addr + offset`. The last offset is only added. A zero
    /// intermediate pointer, an empty chain, or any read fault yields `None`;
    /// partial results are never returned.
    pub fn resolve(&self, base: u64, chain: &OffsetChain) -> Option<u64> {
        let (last, steps) = chain.offsets().split_last()?;

        let mut addr = self.reader.read_u64(base).ok()?;
        for offset in steps {
            if addr == 0 {
                return None;
            }
            addr = self.reader.read_u64(addr.wrapping_add_signed(*offset)).ok()?;
        }

        Some(addr.wrapping_add_signed(*last))
    }

    /// Resolve `chain` and record every step, for diagnosing broken chains.
    ///
    /// Follows exactly the same rules as [`Self::resolve`].
    #[cfg(feature = "debug-tools")]
    pub fn resolve_traced(&self, base: u64, chain: &OffsetChain) -> ChainTrace {
        let mut trace = ChainTrace {
            base,
            steps: Vec::new(),
            result: None,
            failure: None,
        };

        let Some((last, steps)) = chain.offsets().split_last() else {
            trace.failure = Some(ChainFailure::EmptyChain);
            return trace;
        };

        let mut addr = match self.reader.read_u64(base) {
            Ok(value) => value,
            Err(e) => {
                trace.failure = Some(ChainFailure::ReadFault {
                    address: base,
                    message: e.to_string(),
                });
                return trace;
            }
        };
        trace.steps.push(ChainStep {
            read_at: base,
            value: addr,
            offset: None,
        });

        for (index, offset) in steps.iter().enumerate() {
            if addr == 0 {
                trace.failure = Some(ChainFailure::NullPointer { step: index });
                return trace;
            }
            let read_at = addr.wrapping_add_signed(*offset);
            addr = match self.reader.read_u64(read_at) {
                Ok(value) => value,
                Err(e) => {
                    trace.failure = Some(ChainFailure::ReadFault {
                        address: read_at,
                        message: e.to_string(),
                    });
                    return trace;
                }
            };
            trace.steps.push(ChainStep {
                read_at,
                value: addr,
                offset: Some(*offset),
            });
        }

        trace.result = Some(addr.wrapping_add_signed(*last));
        trace
    }
}

/// One dereference performed during traced resolution.
#[cfg(feature = "debug-tools")]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainStep {
    pub read_at: u64,
    pub value: u64,
    /// Offset added before this read (`None` for the initial read at base)
    pub offset: Option<i64>,
}

#[cfg(feature = "debug-tools")]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChainFailure {
    EmptyChain,
    NullPointer { step: usize },
    ReadFault { address: u64, message: String },
}

#[cfg(feature = "debug-tools")]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainTrace {
    pub base: u64,
    pub steps: Vec<ChainStep>,
    pub result: Option<u64>,
    pub failure: Option<ChainFailure>,
}
