//! Sparse tensor wrapper

mod canonical;
mod core;
mod dense;
mod elementwise;
mod shape;

pub use self::core::SparseTensor;
