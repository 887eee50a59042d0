//! One module per top-level subcommand (spec.md §6).

pub mod api;
pub mod chat;
pub mod config;
pub mod logs;
pub mod session;
