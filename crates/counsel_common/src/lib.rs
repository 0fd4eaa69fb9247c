//! Counsel Common - Shared types and prompt builders for the Counsel engine
//!
//! Pure data model, no I/O. Every run-scoped entity (plan, context, result)
//! lives here; the control flow that mutates them lives in `counsel_engine`.

pub mod capability;
pub mod context;
pub mod decision;
pub mod fetch;
pub mod plan;
pub mod prompts;
pub mod protocol;
pub mod query;

pub use capability::*;
pub use context::*;
pub use decision::*;
pub use fetch::*;
pub use plan::*;
pub use protocol::*;
pub use query::*;
