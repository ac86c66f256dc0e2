//! Typed records that every adapter in `prpr` produces.
//!
//! The models are plain data: they are constructed once by an adapter, never
//! mutated afterwards and serialized with [`serde`] by whoever consumes them.
//! Results are always handed out wrapped in one of the envelopes from
//! [`index`], which tie a result payload to the software (and method or
//! category) that produced it.

pub mod index;
pub mod phenotype;
pub mod qc;
pub mod typing;

pub use index::MethodIndex;
pub use index::QcMethodIndex;
