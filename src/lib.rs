//! `prpr` normalizes the outputs of bacterial genome analysis tools
//! (resistance prediction, serotyping, assembly and alignment QC) into typed,
//! serializable records. This package is composed of both a library crate, as
//! well as a binary crate.
//!
//! Every adapter returns one of the envelopes in [`models::index`]:
//!
//! * [`phenotype::resfinder`] for ResFinder resistance predictions.
//! * [`typing::shigapass`] for ShigaPass serotype predictions.
//! * [`qc::quast`] for QUAST assembly statistics.
//! * [`qc::alignment`] and [`qc::postalign`] for post-alignment QC.
#![warn(missing_docs)]
#![warn(rust_2018_idioms)]
#![warn(rust_2021_compatibility)]

pub mod models;
pub mod phenotype;
pub mod qc;
pub mod typing;
pub mod utils;
