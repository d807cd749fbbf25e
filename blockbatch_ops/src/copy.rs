use blockbatch_core::exec::ExecConfig;
use ndarray::{ArrayViewD, ArrayViewMutD, Zip};

/// Copy `src` into `dst` element by element, in parallel if the config allows it for this many elements.
///
/// Returns whether the copy ran in parallel.
///
/// # Panics
/// Panics if the shapes differ.
pub(crate) fn assign<T>(dst: ArrayViewMutD<T>, src: ArrayViewD<T>, config: &ExecConfig) -> bool
where
	T: Clone + Send + Sync,
{
	assert_eq!(dst.shape(), src.shape(), "copy source and destination shapes differ");

	if config.use_parallel(dst.len()) {
		Zip::from(dst).and(src).par_for_each(|d, s| *d = s.clone());
		true
	} else {
		Zip::from(dst).and(src).for_each(|d, s| *d = s.clone());
		false
	}
}
