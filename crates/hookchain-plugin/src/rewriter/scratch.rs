//! Scoped replacement of column values.
//!
//! A stage that rewrites columns wraps the row in a [`SlotRewrite`], installs
//! replacement values through it, and hands `rewrite.slot()` downstream. When
//! the guard goes out of scope (normal return, `?` on a downstream error, or
//! unwinding) the original values go back into the row and every scratch
//! value is released, newest first.

use hookchain_core::host::{Datum, MemoryContext, ScratchValue, TupleSlot};
use hookchain_core::{AppError, AppResult};

/// Guard owning the replacement values installed into one row.
#[must_use = "dropping the guard immediately restores the original row"]
pub struct SlotRewrite<'s, 'm> {
    slot: &'s mut TupleSlot,
    memory: &'m MemoryContext,
    originals: Vec<(usize, Datum)>,
    scratch: Vec<ScratchValue>,
}

impl<'s, 'm> SlotRewrite<'s, 'm> {
    /// Starts rewriting `slot`, allocating from `memory`.
    pub fn new(slot: &'s mut TupleSlot, memory: &'m MemoryContext) -> Self {
        Self {
            slot,
            memory,
            originals: Vec::new(),
            scratch: Vec::new(),
        }
    }

    /// Replaces column `attno` with a freshly allocated value whose payload
    /// is `payload_len` bytes written by `fill`.
    ///
    /// The length header is computed from the allocation, never by `fill`.
    /// On allocation failure the row is left as it was.
    pub fn replace_varlena(
        &mut self,
        attno: usize,
        payload_len: usize,
        fill: impl FnOnce(&mut [u8]),
    ) -> AppResult<()> {
        if attno >= self.slot.values().len() {
            return Err(AppError::execution(format!("Column {attno} out of range")));
        }
        let value = self.memory.alloc_varlena(payload_len, fill)?;
        let original = match self.slot.replace(attno, value.datum()) {
            Ok(original) => original,
            Err(e) => {
                self.memory.release(value);
                return Err(e);
            }
        };
        self.originals.push((attno, original));
        self.scratch.push(value);
        Ok(())
    }

    /// The row with replacements installed.
    pub fn slot(&mut self) -> &mut TupleSlot {
        &mut *self.slot
    }

    /// The original value of column `attno`, whether or not it was replaced.
    pub fn original(&self, attno: usize) -> Option<&Datum> {
        self.originals
            .iter()
            .rev()
            .find(|(a, _)| *a == attno)
            .map(|(_, d)| d)
            .or_else(|| self.slot.value(attno))
    }
}

impl Drop for SlotRewrite<'_, '_> {
    fn drop(&mut self) {
        while let Some((attno, original)) = self.originals.pop() {
            // attno was validated when the value was replaced
            let _ = self.slot.replace(attno, original);
        }
        while let Some(value) = self.scratch.pop() {
            self.memory.release(value);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use super::*;
    use hookchain_core::host::{ColumnDesc, TupleDesc, TypeOid};

    fn slot() -> TupleSlot {
        let desc = Rc::new(TupleDesc::new(vec![
            ColumnDesc::new("id", TypeOid::Int4),
            ColumnDesc::new("name", TypeOid::Text),
        ]));
        TupleSlot::new(desc, vec![Datum::Int4(1), Datum::text("abc")]).expect("slot")
    }

    #[test]
    fn test_guard_restores_and_releases() {
        let memory = MemoryContext::new("test");
        let mut row = slot();
        {
            let mut rewrite = SlotRewrite::new(&mut row, &memory);
            rewrite
                .replace_varlena(1, 2, |buf| buf.copy_from_slice(b"zz"))
                .expect("replace");
            assert_eq!(rewrite.slot().value(1), Some(&Datum::text("zz")));
            assert_eq!(rewrite.original(1), Some(&Datum::text("abc")));
            assert_eq!(memory.stats().outstanding(), 1);
        }
        assert_eq!(row.value(1), Some(&Datum::text("abc")));
        assert_eq!(memory.stats().outstanding(), 0);
        assert_eq!(memory.stats().live_bytes, 0);
    }

    #[test]
    fn test_guard_releases_on_error_path() {
        let memory = MemoryContext::new("test");
        let mut row = slot();
        let result: AppResult<()> = (|| {
            let mut rewrite = SlotRewrite::new(&mut row, &memory);
            rewrite.replace_varlena(1, 4, |_| {})?;
            Err(AppError::execution("downstream failed"))
        })();
        assert!(result.is_err());
        assert_eq!(memory.stats().allocations, 1);
        assert_eq!(memory.stats().releases, 1);
    }

    #[test]
    fn test_out_of_range_column_allocates_nothing() {
        let memory = MemoryContext::new("test");
        let mut row = slot();
        let mut rewrite = SlotRewrite::new(&mut row, &memory);
        assert!(rewrite.replace_varlena(9, 4, |_| {}).is_err());
        assert_eq!(memory.stats().allocations, 0);
    }
}
