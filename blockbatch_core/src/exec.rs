//! Options controlling how the transforms execute.

/// Execution options for the kernels in `blockbatch_ops`.
///
/// Results do not depend on these settings, only how the element copy is scheduled.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExecConfig {
	pub parallel: bool,
	pub parallel_threshold: usize,
}

impl ExecConfig {
	/// Whether element copies may be split across the rayon thread pool.
	///
	/// Default: true
	pub fn parallel(mut self, parallel: bool) -> Self {
		self.parallel = parallel;
		self
	}

	/// Minimum number of elements to copy before the copy is done in parallel.
	///
	/// Default: 4096
	pub fn parallel_threshold(mut self, parallel_threshold: usize) -> Self {
		self.parallel_threshold = parallel_threshold;
		self
	}

	/// Whether a copy of `len` elements should run in parallel under this config.
	pub fn use_parallel(&self, len: usize) -> bool {
		self.parallel && len >= self.parallel_threshold
	}
}

impl Default for ExecConfig {
	fn default() -> Self {
		ExecConfig {
			parallel: true,
			parallel_threshold: 4096,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::ExecConfig;

	#[test]
	fn threshold() {
		let config = ExecConfig::default();
		assert!(!config.use_parallel(10));
		assert!(config.use_parallel(4096));

		let config = ExecConfig::default().parallel_threshold(0);
		assert!(config.use_parallel(0));

		let config = config.parallel(false);
		assert!(!config.use_parallel(1 << 20));
	}
}
