//! Error-correction primitives: GF(2^m) arithmetic and Reed-Solomon coding

pub mod galois;
pub mod reed_solomon;

pub use galois::{GaloisField, GfPoly};
pub use reed_solomon::{decode, ReedSolomonEncoder};
