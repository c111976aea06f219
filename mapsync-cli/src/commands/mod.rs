//! CLI subcommands.

pub mod common;
pub mod config;
pub mod demo;
pub mod resolve;
pub mod search;
