//! Scratch memory context for per-row replacement values.
//!
//! Rewriter stages allocate replacement values here, hand them downstream for
//! the duration of a single row, and release them once the downstream call
//! returns. The context keeps counters so callers can check that every
//! allocation was paired with a release.

use std::cell::Cell;

use bytes::BytesMut;
use serde::Serialize;

use super::datum::{Datum, VARHDRSZ, Varlena};
use crate::error::AppError;
use crate::result::AppResult;

/// Allocation counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MemoryStats {
    /// Successful allocations.
    pub allocations: u64,
    /// Releases.
    pub releases: u64,
    /// Allocations refused because of the limit.
    pub failures: u64,
    /// Bytes currently allocated and not yet released.
    pub live_bytes: usize,
    /// High-water mark of `live_bytes`.
    pub peak_bytes: usize,
}

impl MemoryStats {
    /// Number of allocations not yet released.
    pub fn outstanding(&self) -> u64 {
        self.allocations.saturating_sub(self.releases)
    }
}

/// A scratch memory context.
#[derive(Debug)]
pub struct MemoryContext {
    name: String,
    limit: Option<usize>,
    stats: Cell<MemoryStats>,
}

impl MemoryContext {
    /// Creates an unbounded context.
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_limit(name, None)
    }

    /// Creates a context that refuses allocations once `limit` live bytes
    /// would be exceeded.
    pub fn with_limit(name: impl Into<String>, limit: Option<usize>) -> Self {
        Self {
            name: name.into(),
            limit,
            stats: Cell::new(MemoryStats::default()),
        }
    }

    /// Context name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Current counters.
    pub fn stats(&self) -> MemoryStats {
        self.stats.get()
    }

    /// Allocates a length-prefixed value with a `payload_len`-byte payload.
    ///
    /// The header is written from the real size; `fill` only sees the payload.
    pub fn alloc_varlena(
        &self,
        payload_len: usize,
        fill: impl FnOnce(&mut [u8]),
    ) -> AppResult<ScratchValue> {
        let mut stats = self.stats.get();
        let total = payload_len
            .checked_add(VARHDRSZ)
            .filter(|t| u32::try_from(*t).is_ok())
            .ok_or_else(|| {
                AppError::allocation(format!(
                    "Value of {payload_len} payload bytes exceeds the maximum value size"
                ))
            })?;

        if let Some(limit) = self.limit {
            if stats.live_bytes.saturating_add(total) > limit {
                stats.failures += 1;
                self.stats.set(stats);
                return Err(AppError::allocation(format!(
                    "Memory context '{}' cannot allocate {total} bytes ({} of {limit} in use)",
                    self.name, stats.live_bytes
                )));
            }
        }

        let mut buf = BytesMut::zeroed(total);
        Varlena::write_header(&mut buf, total);
        fill(&mut buf[VARHDRSZ..]);

        stats.allocations += 1;
        stats.live_bytes += total;
        stats.peak_bytes = stats.peak_bytes.max(stats.live_bytes);
        self.stats.set(stats);

        Ok(ScratchValue {
            value: Varlena::from_raw(buf.freeze()),
        })
    }

    /// Returns a value to the context.
    pub fn release(&self, value: ScratchValue) {
        let mut stats = self.stats.get();
        stats.releases += 1;
        stats.live_bytes = stats.live_bytes.saturating_sub(value.value.total_len());
        self.stats.set(stats);
    }
}

/// A value allocated from a [`MemoryContext`].
///
/// Must be handed back with [`MemoryContext::release`].
#[derive(Debug)]
#[must_use = "scratch values must be released back to their context"]
pub struct ScratchValue {
    value: Varlena,
}

impl ScratchValue {
    /// The allocated value.
    pub fn varlena(&self) -> &Varlena {
        &self.value
    }

    /// A datum sharing this value's bytes.
    pub fn datum(&self) -> Datum {
        Datum::Varlena(self.value.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alloc_writes_header_from_real_size() {
        let ctx = MemoryContext::new("test");
        let value = ctx.alloc_varlena(12, |buf| buf.fill(b'x')).expect("alloc");
        assert_eq!(value.varlena().total_len(), 16);
        assert_eq!(value.varlena().declared_len(), 16);
        assert!(value.varlena().payload().iter().all(|b| *b == b'x'));
        ctx.release(value);

        let stats = ctx.stats();
        assert_eq!(stats.allocations, 1);
        assert_eq!(stats.releases, 1);
        assert_eq!(stats.live_bytes, 0);
        assert_eq!(stats.peak_bytes, 16);
    }

    #[test]
    fn test_limit_refuses_allocation() {
        let ctx = MemoryContext::with_limit("tight", Some(10));
        let first = ctx.alloc_varlena(4, |_| {}).expect("fits");
        let err = ctx.alloc_varlena(4, |_| {}).expect_err("over limit");
        assert_eq!(err.kind, crate::error::ErrorKind::Allocation);
        assert_eq!(ctx.stats().failures, 1);
        ctx.release(first);
        assert!(ctx.alloc_varlena(4, |_| {}).map(|v| ctx.release(v)).is_ok());
    }
}
