//! Numeric kernels for the space-to-batch family of transforms.
//!
//! All kernels borrow their input read-only, accept any storage and memory order, and return a freshly allocated
//! `ArrayD` in standard layout.

mod copy;
pub mod shape;
