//! N-dimensional space-to-batch and batch-to-space transforms.
//!
//! `core` holds the shared types (errors, shapes, parameters, execution options), `ops` the kernels, and `layer` the
//! configuration records that tie a set of parameters to a kernel.

pub use blockbatch_core as core;
pub use blockbatch_ops as ops;

pub mod layer;
