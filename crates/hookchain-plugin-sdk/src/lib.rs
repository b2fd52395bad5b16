//! # hookchain-plugin-sdk
//!
//! SDK for developing hookchain modules.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use hookchain_plugin_sdk::prelude::*;
//!
//! struct Upper;
//!
//! impl ColumnRewriter for Upper {
//!     fn applies_to(&self, column: &ColumnDesc) -> bool {
//!         column.type_oid == TypeOid::Text
//!     }
//!
//!     fn rewritten_len(&self, payload: &[u8]) -> AppResult<usize> {
//!         Ok(payload.len())
//!     }
//!
//!     fn rewrite(&self, payload: &[u8], out: &mut [u8]) {
//!         out.copy_from_slice(&payload.to_ascii_uppercase());
//!     }
//! }
//!
//! struct UpperModule;
//!
//! impl Module for UpperModule {
//!     fn init(&self, cx: &mut ModuleInit<'_>) -> AppResult<()> {
//!         cx.api().register_output_rewriter(ColumnStage::new(Upper))
//!     }
//! }
//!
//! declare_module!("upper", UpperModule);
//! ```

pub mod traits;

/// Prelude for convenient imports.
pub mod prelude {
    pub use hookchain_plugin::hookchain_core::host::{ColumnDesc, MemoryContext};
    pub use hookchain_plugin::prelude::*;

    pub use crate::traits::{ColumnRewriter, ColumnStage};
}
