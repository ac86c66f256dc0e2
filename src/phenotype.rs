//! Functionality related to resistance prediction results.

pub mod command;
pub mod lookup;
pub mod resfinder;
