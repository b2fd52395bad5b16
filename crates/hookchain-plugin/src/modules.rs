//! Loaded-module bookkeeping and the load window.

use std::cell::RefCell;
use std::rc::Rc;

use chrono::{DateTime, Utc};
use serde::Serialize;

use hookchain_core::AppResult;

use crate::hooks::definitions::HookKind;
use crate::session::Session;

/// Signature of a module's fixed-name load entry point.
///
/// The entry point brackets the module's init with the session's load
/// window and returns the resulting record.
pub type ModuleEntryFn = fn(&Session) -> AppResult<ModuleRecord>;

/// Symbol name dynamic modules export their entry point under.
pub const MODULE_ENTRY_SYMBOL: &[u8] = b"_hookchain_module_init";

/// Where a module is in its load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ModuleState {
    /// Inside its load window.
    Loading,
    /// Init completed and registrations validated.
    Loaded,
    /// Init or validation failed. Registrations made before the failure stay
    /// in place.
    Failed,
}

impl std::fmt::Display for ModuleState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Loading => "loading",
            Self::Loaded => "loaded",
            Self::Failed => "failed",
        };
        write!(f, "{s}")
    }
}

/// Metadata about one module load.
#[derive(Debug, Clone, Serialize)]
pub struct ModuleRecord {
    /// Position in load order, starting at 1.
    pub order: usize,
    /// Module name.
    pub name: String,
    /// Load state.
    pub state: ModuleState,
    /// Extension points the module installed handlers on.
    pub hooks: Vec<HookKind>,
    /// Number of row-transform stages the module registered.
    pub rewriters: usize,
    /// When the load window opened.
    pub loaded_at: DateTime<Utc>,
}

/// Tracks which module, if any, is inside its load window.
#[derive(Debug, Default)]
pub struct LoadWindow {
    loading: RefCell<Option<Rc<str>>>,
}

impl LoadWindow {
    /// Name of the module currently loading.
    pub fn current(&self) -> Option<Rc<str>> {
        self.loading.borrow().clone()
    }

    /// Whether `module` is the one currently loading.
    pub fn is_open_for(&self, module: &str) -> bool {
        self.loading.borrow().as_deref() == Some(module)
    }

    pub(crate) fn open(&self, module: Rc<str>) {
        *self.loading.borrow_mut() = Some(module);
    }

    pub(crate) fn close(&self) -> Option<Rc<str>> {
        self.loading.borrow_mut().take()
    }
}

/// Records of every module load, in load order.
#[derive(Debug, Default)]
pub struct ModuleTable {
    records: Vec<ModuleRecord>,
}

impl ModuleTable {
    /// Whether a module with this name was ever loaded (or attempted).
    pub fn contains(&self, name: &str) -> bool {
        self.records.iter().any(|r| r.name == name)
    }

    /// Appends a record for a module entering its load window.
    pub(crate) fn begin(&mut self, name: &str) -> &ModuleRecord {
        let order = self.records.len() + 1;
        self.records.push(ModuleRecord {
            order,
            name: name.to_string(),
            state: ModuleState::Loading,
            hooks: Vec::new(),
            rewriters: 0,
            loaded_at: Utc::now(),
        });
        &self.records[order - 1]
    }

    /// The record of the module currently loading.
    pub(crate) fn loading_mut(&mut self, name: &str) -> Option<&mut ModuleRecord> {
        self.records
            .iter_mut()
            .rev()
            .find(|r| r.name == name && r.state == ModuleState::Loading)
    }

    /// Looks up a record by name.
    pub fn get(&self, name: &str) -> Option<&ModuleRecord> {
        self.records.iter().find(|r| r.name == name)
    }

    /// All records in load order.
    pub fn records(&self) -> &[ModuleRecord] {
        &self.records
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_open_close() {
        let window = LoadWindow::default();
        assert!(window.current().is_none());
        window.open(Rc::from("scramble"));
        assert!(window.is_open_for("scramble"));
        assert!(!window.is_open_for("passthrough"));
        assert_eq!(window.close().as_deref(), Some("scramble"));
        assert!(window.current().is_none());
    }

    #[test]
    fn test_table_orders_records() {
        let mut table = ModuleTable::default();
        table.begin("a");
        table.begin("b");
        assert_eq!(table.get("b").map(|r| r.order), Some(2));
        assert!(table.loading_mut("a").is_some());
        assert!(table.contains("a"));
        assert!(!table.contains("c"));
    }

    #[test]
    fn test_record_serializes_snake_case() {
        let mut table = ModuleTable::default();
        table.begin("scramble");
        let record = table.get("scramble").cloned().expect("record");
        let json = serde_json::to_value(&record).expect("serialize");
        assert_eq!(json["state"], "loading");
        assert_eq!(json["order"], 1);
        assert!(json["hooks"].as_array().is_some_and(|h| h.is_empty()));
    }
}
