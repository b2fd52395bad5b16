//! Row shapes and row slots.

use std::rc::Rc;

use serde::Serialize;

use super::datum::{Datum, TypeOid};
use crate::error::AppError;
use crate::result::AppResult;

/// One column of a row shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnDesc {
    /// Column name.
    pub name: String,
    /// Declared type.
    pub type_oid: TypeOid,
}

impl ColumnDesc {
    /// Creates a column description.
    pub fn new(name: impl Into<String>, type_oid: TypeOid) -> Self {
        Self {
            name: name.into(),
            type_oid,
        }
    }
}

/// Shape of the rows a query produces.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TupleDesc {
    columns: Vec<ColumnDesc>,
}

impl TupleDesc {
    /// Creates a row shape from its columns.
    pub fn new(columns: Vec<ColumnDesc>) -> Self {
        Self { columns }
    }

    /// Number of attributes.
    pub fn natts(&self) -> usize {
        self.columns.len()
    }

    /// Column at `attno` (zero based).
    pub fn column(&self, attno: usize) -> Option<&ColumnDesc> {
        self.columns.get(attno)
    }

    /// Iterates over the columns in order.
    pub fn iter(&self) -> impl Iterator<Item = &ColumnDesc> {
        self.columns.iter()
    }
}

/// A single row as handed to a destination.
///
/// Destinations may temporarily replace values in place; whoever replaces a
/// value is responsible for putting the original back before returning.
#[derive(Debug, Clone)]
pub struct TupleSlot {
    desc: Rc<TupleDesc>,
    values: Vec<Datum>,
}

impl TupleSlot {
    /// Creates a slot, checking the value count against the row shape.
    pub fn new(desc: Rc<TupleDesc>, values: Vec<Datum>) -> AppResult<Self> {
        if values.len() != desc.natts() {
            return Err(AppError::execution(format!(
                "Row has {} values but the row shape has {} columns",
                values.len(),
                desc.natts()
            )));
        }
        Ok(Self { desc, values })
    }

    /// The row shape.
    pub fn desc(&self) -> &TupleDesc {
        &self.desc
    }

    /// All values in column order.
    pub fn values(&self) -> &[Datum] {
        &self.values
    }

    /// Value of column `attno`.
    pub fn value(&self, attno: usize) -> Option<&Datum> {
        self.values.get(attno)
    }

    /// Replaces the value of column `attno`, returning the previous value.
    pub fn replace(&mut self, attno: usize, value: Datum) -> AppResult<Datum> {
        let slot = self.values.get_mut(attno).ok_or_else(|| {
            AppError::execution(format!("Column {attno} out of range"))
        })?;
        Ok(std::mem::replace(slot, value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn desc() -> Rc<TupleDesc> {
        Rc::new(TupleDesc::new(vec![
            ColumnDesc::new("id", TypeOid::Int4),
            ColumnDesc::new("name", TypeOid::Varchar),
        ]))
    }

    #[test]
    fn test_slot_arity_checked() {
        assert!(TupleSlot::new(desc(), vec![Datum::Int4(1)]).is_err());
        assert!(TupleSlot::new(desc(), vec![Datum::Int4(1), Datum::Null]).is_ok());
    }

    #[test]
    fn test_replace_returns_previous() {
        let mut slot = TupleSlot::new(desc(), vec![Datum::Int4(1), Datum::text("a")]).expect("slot");
        let old = slot.replace(1, Datum::text("b")).expect("replace");
        assert_eq!(old, Datum::text("a"));
        assert_eq!(slot.value(1), Some(&Datum::text("b")));
        assert!(slot.replace(5, Datum::Null).is_err());
    }
}
