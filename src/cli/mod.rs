//! CLI module for the bgremove-remote library
//!
//! This module is only available when the "cli" feature is enabled.

mod config;
#[path = "main.rs"]
mod main_impl;
mod shell;
mod view;

pub use main_impl::{main, Cli, CliTheme};
