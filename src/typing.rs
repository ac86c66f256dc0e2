//! Functionality related to typing results.

pub mod command;
pub mod shigapass;
