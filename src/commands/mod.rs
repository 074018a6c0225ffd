//! Command implementations for the extman CLI

pub mod completions;
pub mod helpers;
pub mod install;
pub mod list;
pub mod search;
pub mod show;
pub mod uninstall;
pub mod upgrade;
pub mod version;
