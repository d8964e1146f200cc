//! API implementation submodules.
//!
//! Each submodule contains `impl ModelLinker` blocks that extend the public
//! API with domain-specific methods. The struct definition remains in `lib.rs`.

mod builder;
mod downloads;
mod models;
mod state;
mod workflow;

pub use builder::ModelLinkerBuilder;
pub use workflow::AutoResolveOutcome;
pub(crate) use state::LinkerState;
