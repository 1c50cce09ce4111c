//! Shared traits for the strided-fft workspace.
//!
//! This crate provides the conjugation operation used for Hermitian mirroring
//! and the bound every real transform scalar satisfies.

pub mod element_op;
pub mod scalar;

pub use element_op::{Conj, ElementOp, ElementOpApply};
pub use scalar::RealScalar;
