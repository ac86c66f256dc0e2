//! Utilities that are used across the `prpr` subcommands.

pub mod display;
pub mod histogram;
pub mod output;
pub mod pathbuf;
