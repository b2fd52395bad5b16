//! The stage interface.

use std::any::Any;
use std::fmt;

use hookchain_core::AppResult;
use hookchain_core::host::{CmdType, QueryDesc, TupleDesc, TupleSlot};

use super::downstream::Downstream;

/// One row-transform stage.
///
/// Every method has a pass-through default, so a stage only implements what
/// it needs. Per stream the pipeline calls `filter` once, then `startup`,
/// `receive` for each row, `shutdown` and finally `destroy`. `destroy` always
/// runs exactly once, even when `startup` or `receive` failed.
pub trait OutputRewriter {
    /// Whether this stage applies to the query. Evaluated once per stream.
    fn filter(&self, _qd: &QueryDesc) -> bool {
        true
    }

    /// Prepares per-stream state.
    fn startup(&self, _operation: CmdType, _desc: &TupleDesc) -> AppResult<StageContext> {
        Ok(StageContext::empty())
    }

    /// Handles one row. Must hand the row to `next` to deliver it, and must
    /// return what `next` returned when that was `false`.
    fn receive(
        &self,
        _cx: &mut StageContext,
        slot: &mut TupleSlot,
        next: Downstream<'_>,
    ) -> AppResult<bool> {
        next.send(slot)
    }

    /// Called once after the last row.
    fn shutdown(&self, _cx: &mut StageContext) -> AppResult<()> {
        Ok(())
    }

    /// Releases per-stream state.
    fn destroy(&self, _cx: StageContext) {}
}

/// Opaque per-stream state owned by one stage.
#[derive(Default)]
pub struct StageContext(Option<Box<dyn Any>>);

impl StageContext {
    /// Wraps a value.
    pub fn new<T: Any>(value: T) -> Self {
        Self(Some(Box::new(value)))
    }

    /// A context holding nothing.
    pub fn empty() -> Self {
        Self(None)
    }

    /// Whether the context holds nothing.
    pub fn is_empty(&self) -> bool {
        self.0.is_none()
    }

    /// Borrows the value if it is a `T`.
    pub fn get<T: Any>(&self) -> Option<&T> {
        self.0.as_ref()?.downcast_ref()
    }

    /// Mutably borrows the value if it is a `T`.
    pub fn get_mut<T: Any>(&mut self) -> Option<&mut T> {
        self.0.as_mut()?.downcast_mut()
    }

    /// Unwraps the value if it is a `T`.
    pub fn into_inner<T: Any>(self) -> Option<T> {
        self.0?.downcast::<T>().ok().map(|b| *b)
    }
}

impl fmt::Debug for StageContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StageContext")
            .field("empty", &self.is_empty())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_downcast() {
        let mut cx = StageContext::new(7u32);
        assert_eq!(cx.get::<u32>(), Some(&7));
        assert!(cx.get::<String>().is_none());
        if let Some(v) = cx.get_mut::<u32>() {
            *v += 1;
        }
        assert_eq!(cx.into_inner::<u32>(), Some(8));
        assert!(StageContext::empty().is_empty());
    }
}
