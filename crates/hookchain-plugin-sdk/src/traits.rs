//! Simplified traits for module development.

use hookchain_core::AppResult;
use hookchain_core::host::{CmdType, ColumnDesc, QueryDesc, TupleDesc, TupleSlot};
use hookchain_plugin::{Downstream, OutputRewriter, SlotRewrite, StageContext};
use tracing::trace;

/// Per-column rewrite of length-prefixed values.
///
/// Module authors implement this instead of the raw [`OutputRewriter`] when
/// the stage only replaces whole column values. Wrap it in a
/// [`ColumnStage`] to register it.
pub trait ColumnRewriter {
    /// Whether values of `column` are rewritten.
    fn applies_to(&self, column: &ColumnDesc) -> bool;

    /// Payload length of the replacement for `payload`.
    ///
    /// An error aborts the query; use an allocation error when the length
    /// cannot be represented.
    fn rewritten_len(&self, payload: &[u8]) -> AppResult<usize>;

    /// Writes the replacement for `payload` into `out`, which is exactly
    /// [`rewritten_len`](Self::rewritten_len) bytes.
    fn rewrite(&self, payload: &[u8], out: &mut [u8]);

    /// Whether the stage takes part in the query at all.
    fn accepts(&self, _qd: &QueryDesc) -> bool {
        true
    }
}

/// Adapts a [`ColumnRewriter`] to the [`OutputRewriter`] stage interface.
///
/// Target columns are resolved once at startup. Null values are passed
/// through untouched; replacements live in the session's scratch context
/// and are released after downstream returns.
#[derive(Debug)]
pub struct ColumnStage<C> {
    inner: C,
}

impl<C: ColumnRewriter> ColumnStage<C> {
    /// Wraps `inner`.
    pub fn new(inner: C) -> Self {
        Self { inner }
    }

    /// The wrapped rewriter.
    pub fn inner(&self) -> &C {
        &self.inner
    }
}

/// Column positions a stream's rows are rewritten at.
struct Targets(Vec<usize>);

impl<C: ColumnRewriter> OutputRewriter for ColumnStage<C> {
    fn filter(&self, qd: &QueryDesc) -> bool {
        self.inner.accepts(qd)
    }

    fn startup(&self, _operation: CmdType, desc: &TupleDesc) -> AppResult<StageContext> {
        let targets: Vec<usize> = desc
            .iter()
            .enumerate()
            .filter(|(_, column)| column.type_oid.is_varlena() && self.inner.applies_to(column))
            .map(|(attno, _)| attno)
            .collect();
        trace!(targets = ?targets, "Column stage started");
        Ok(StageContext::new(Targets(targets)))
    }

    fn receive(
        &self,
        cx: &mut StageContext,
        slot: &mut TupleSlot,
        next: Downstream<'_>,
    ) -> AppResult<bool> {
        let targets = match cx.get::<Targets>() {
            Some(Targets(targets)) if !targets.is_empty() => targets,
            _ => return next.send(slot),
        };

        let mut rewrite = SlotRewrite::new(slot, next.memory());
        for &attno in targets {
            let payload = match rewrite.slot().value(attno).and_then(|d| d.as_varlena()) {
                Some(value) => value.payload().to_vec(),
                None => continue,
            };
            let len = self.inner.rewritten_len(&payload)?;
            rewrite.replace_varlena(attno, len, |out| self.inner.rewrite(&payload, out))?;
        }
        next.send(rewrite.slot())
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use hookchain_core::config::AppConfig;
    use hookchain_core::host::mock::{MockHost, RecordingDest, users_relation};
    use hookchain_core::host::{Datum, ParamList, Query, TypeOid, portal};
    use hookchain_plugin::Session;

    use super::*;

    struct Reverse;

    impl ColumnRewriter for Reverse {
        fn applies_to(&self, column: &ColumnDesc) -> bool {
            column.type_oid == TypeOid::Varchar
        }

        fn rewritten_len(&self, payload: &[u8]) -> AppResult<usize> {
            Ok(payload.len())
        }

        fn rewrite(&self, payload: &[u8], out: &mut [u8]) {
            for (dst, src) in out.iter_mut().zip(payload.iter().rev()) {
                *dst = *src;
            }
        }
    }

    #[test]
    fn test_column_stage_rewrites_matching_columns() {
        let session = Session::new(Rc::new(MockHost::with_sample_catalog()), AppConfig::default());
        session
            .load_module("reverse", |cx| {
                cx.api().register_output_rewriter(ColumnStage::new(Reverse))
            })
            .expect("load");

        let (dest, log) = RecordingDest::new();
        portal::run_query(
            &session,
            &Query::select(users_relation()),
            ParamList::default(),
            Box::new(dest),
        )
        .expect("run");

        let rows = log.borrow().rows();
        assert_eq!(rows[0][1], Datum::text("nna"));
        assert_eq!(rows[1][1], Datum::text("bob"));
        assert_eq!(rows[2][1], Datum::Null);
        assert_eq!(rows[0][0], Datum::Int4(1));
        assert_eq!(session.memory().stats().outstanding(), 0);
    }

    struct Oversized;

    impl ColumnRewriter for Oversized {
        fn applies_to(&self, column: &ColumnDesc) -> bool {
            column.type_oid == TypeOid::Varchar
        }

        fn rewritten_len(&self, payload: &[u8]) -> AppResult<usize> {
            Err(hookchain_core::AppError::allocation(format!(
                "{} bytes overflow",
                payload.len()
            )))
        }

        fn rewrite(&self, _payload: &[u8], _out: &mut [u8]) {}
    }

    #[test]
    fn test_length_error_aborts_query() {
        let session = Session::new(Rc::new(MockHost::with_sample_catalog()), AppConfig::default());
        session
            .load_module("oversized", |cx| {
                cx.api().register_output_rewriter(ColumnStage::new(Oversized))
            })
            .expect("load");

        let (dest, log) = RecordingDest::new();
        let err = portal::run_query(
            &session,
            &Query::select(users_relation()),
            ParamList::default(),
            Box::new(dest),
        )
        .expect_err("length overflow");

        assert_eq!(err.kind, hookchain_core::error::ErrorKind::Allocation);
        assert!(log.borrow().rows().is_empty());
        assert_eq!(session.memory().stats().outstanding(), 0);
    }
}
