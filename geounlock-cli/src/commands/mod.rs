//! CLI command handlers.

pub mod common;
pub mod config;
pub mod landmarks;
pub mod nearest;
pub mod reset;
pub mod simulate;
pub mod unlock;
