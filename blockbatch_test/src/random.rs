use ndarray::ArrayD;
use rand::{seq::SliceRandom, Rng};
use rand_distr::{Distribution, Normal};

/// A random permutation of `0..len` and its inverse.
pub fn random_permutation<R: Rng>(len: usize, rng: &mut R) -> (Vec<usize>, Vec<usize>) {
	let mut a: Vec<usize> = (0..len).collect();
	a.shuffle(rng);
	let mut b = vec![0; len];
	for i in 0..len {
		b[a[i]] = i;
	}
	(a, b)
}

/// An array of the given shape filled from a standard normal distribution.
///
/// The memory order of the axes is a random permutation, so that kernels relying on standard layout get exercised
/// with strided inputs.
pub fn random_array<R: Rng>(shape: &[usize], rng: &mut R) -> ArrayD<f32> {
	let norm = Normal::new(0.0f32, 1.0).expect("Could not create normal distribution");

	let (permute, inv_permute) = random_permutation(shape.len(), rng);
	let shape_permute: Vec<usize> = permute.iter().map(|&i| shape[i]).collect();
	let mut arr = ArrayD::zeros(shape_permute);

	for x in &mut arr {
		*x = norm.sample(rng);
	}

	arr.permuted_axes(inv_permute)
}
