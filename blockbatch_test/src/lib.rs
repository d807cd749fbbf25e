//! Test tooling for the space-to-batch transforms.

mod random;

pub use layout_law_test::LayoutLawTest;
pub use random::{random_array, random_permutation};
