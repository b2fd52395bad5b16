//! Row-transform pipeline.
//!
//! Registered stages form one ordered chain per host process. When a query
//! starts producing rows the core swaps itself in as the query's destination
//! and keeps the real destination as the terminal sink. Each row then runs
//! through the selected stages, outermost first, each deciding whether and
//! how to pass it on:
//!
//! ```text
//! executor ──▶ stage 1 ──▶ stage 2 ──▶ … ──▶ terminal sink
//!            ◀── bool ◀──── bool ◀──────────── bool
//! ```
//!
//! A `false` coming back from downstream means "stop" and reaches the
//! executor unchanged.

pub mod downstream;
pub mod pipeline;
pub mod scratch;
pub mod stage;

pub use downstream::Downstream;
pub use pipeline::{RegisteredRewriter, RewriterChain};
pub use scratch::SlotRewrite;
pub use stage::{OutputRewriter, StageContext};
