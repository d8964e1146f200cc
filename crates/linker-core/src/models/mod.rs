//! Data models shared by the matcher, the workflow analyzer and the RPC layer.
//!
//! Field names follow the JSON the workflow editor front-end exchanges with
//! the server; legacy names are accepted as serde aliases.

mod asset;
mod reference;

pub use asset::*;
pub use reference::*;
