//! Functionality related to assembly and alignment quality control.
//!
//! [`quast`] and [`postalign`] normalize existing reports. [`alignment`]
//! produces the post-alignment metrics itself by driving external tools
//! through the [`runner::ToolRunner`] seam.

pub mod alignment;
pub mod command;
pub mod postalign;
pub mod quast;
pub mod runner;
pub mod tools;
