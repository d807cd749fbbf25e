//! Shared types for the space-to-batch family of transforms: errors, (partially known) shapes and their
//! arithmetic, validated parameters, and execution options.

pub mod errors;
pub mod exec;
pub mod params;
pub mod shape;
pub mod util;
