//! Command implementations for the siterover binary.

pub mod discover_cmd;
pub mod fetch_cmd;
pub mod output;
