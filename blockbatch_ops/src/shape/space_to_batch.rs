use crate::{
	copy::assign,
	shape::pad::{crop_with_config, pad_with_config},
};
use blockbatch_core::{
	errors::TransformError,
	exec::ExecConfig,
	shape::{batch_to_space_shape, block_product, space_to_batch_shape, NodeShape},
	util::display::{IterDisplay, PairsDisplay},
};
use ndarray::{ArrayBase, ArrayD, CowArray, Data, Dimension, IxDyn};
use num_traits::Zero;
use smallvec::SmallVec;
use std::iter::once;

/// Move blocks of spatial entries into the batch dimension
///
/// The input is laid out as `[batch, spatial_0, .., spatial_{M-1}, channels]`, with one entry of `blocks` and one
/// `(before, after)` pair of `padding` per spatial axis. Each spatial axis is zero padded, then split into
/// `padded_i / blocks[i]` strided positions, with the `blocks[i]` offsets between them folded into the batch axis.
///
/// The output has shape `[batch * product(blocks), padded_0 / blocks[0], .., padded_{M-1} / blocks[M-1], channels]`.
/// Padded spatial coordinate `p_i = r_i * blocks[i] + o_i` of input batch entry `b` ends up at spatial coordinate
/// `r_i` of output batch entry `((o_0 * blocks[1] + o_1) * blocks[2] + ..) * batch + b`. Inverse of
/// `batch_to_space`.
///
/// ```
/// # use blockbatch_ops::shape::space_to_batch::space_to_batch;
/// # use ndarray::{ArrayD, IxDyn};
/// let input = ArrayD::from_shape_vec(IxDyn(&[1, 2, 2, 1]), vec![1, 2, 3, 4]).unwrap();
/// let output = space_to_batch(&input, &[2, 2], &[(0, 0), (0, 0)]).unwrap();
/// assert_eq!(output.shape(), &[4, 1, 1, 1]);
/// assert_eq!(output.iter().cloned().collect::<Vec<_>>(), vec![1, 2, 3, 4]);
/// ```
///
/// # Errors
///  * `InvalidParameter` if any block size is 0
///  * `ShapeMismatch` if `blocks` and `padding` differ in length, if the input rank isn't `blocks.len() + 2`, or if a
///    padded spatial axis isn't divisible by its block size
pub fn space_to_batch<S, D, T>(
	input: &ArrayBase<S, D>,
	blocks: &[usize],
	padding: &[(usize, usize)],
) -> Result<ArrayD<T>, TransformError>
where
	S: Data<Elem = T>,
	D: Dimension,
	T: Clone + Zero + Send + Sync,
{
	space_to_batch_with_config(input, blocks, padding, &ExecConfig::default())
}

/// As `space_to_batch`, with explicit execution options.
pub fn space_to_batch_with_config<S, D, T>(
	input: &ArrayBase<S, D>,
	blocks: &[usize],
	padding: &[(usize, usize)],
	config: &ExecConfig,
) -> Result<ArrayD<T>, TransformError>
where
	S: Data<Elem = T>,
	D: Dimension,
	T: Clone + Zero + Send + Sync,
{
	let input = input.view().into_dyn();
	let input_shape = NodeShape::from(input.shape());

	let output_shape = space_to_batch_shape(&input_shape, blocks, padding)?;
	output_shape.known_flat_size()?;
	let output_shape = output_shape.to_data_shape()?;

	let m = blocks.len();

	// batch and channel axes are never padded
	let padded: CowArray<T, IxDyn> = if padding.iter().all(|&p| p == (0, 0)) {
		input.as_standard_layout()
	} else {
		let full_padding: SmallVec<[(usize, usize); 6]> =
			once((0, 0)).chain(padding.iter().cloned()).chain(once((0, 0))).collect();
		pad_with_config(&input, &full_padding, config)?.into()
	};

	// [batch, r_0, o_0, r_1, o_1, .., channels]
	let padded_shape = padded.shape();
	let split_shape: SmallVec<[usize; 8]> = once(padded_shape[0])
		.chain(
			blocks
				.iter()
				.zip(&padded_shape[1..=m])
				.flat_map(|(&block, &len)| once(len / block).chain(once(block))),
		)
		.chain(once(padded_shape[m + 1]))
		.collect();

	// [o_0, .., o_{M-1}, batch, r_0, .., r_{M-1}, channels]
	let permutation: SmallVec<[usize; 8]> = (0..m)
		.map(|i| 2 + 2 * i)
		.chain(once(0))
		.chain((0..m).map(|i| 1 + 2 * i))
		.chain(once(2 * m + 1))
		.collect();

	let permuted = padded
		.view()
		.into_shape(IxDyn(&split_shape))?
		.permuted_axes(IxDyn(&permutation));

	log::trace!(
		"space_to_batch: split shape {:?} permuted to {:?}",
		split_shape.as_slice(),
		permuted.shape()
	);

	let mut output = ArrayD::zeros(output_shape);
	let parallel = {
		let permuted_shape = permuted.shape().to_vec();
		let output_view = output.view_mut().into_shape(IxDyn(&permuted_shape))?;
		assign(output_view, permuted, config)
	};

	log::debug!(
		"space_to_batch: {:?} -> {:?} (blocks {}, padding {}, parallel {})",
		input.shape(),
		output.shape(),
		IterDisplay { inner: blocks },
		PairsDisplay { inner: padding },
		parallel
	);

	Ok(output)
}

/// Move entries of the batch dimension back out into blocks of spatial entries
///
/// The input is laid out as `[batch, spatial_0, .., spatial_{M-1}, channels]`, where `batch` must be a multiple of
/// `product(blocks)`. The batch axis is split back into the block offsets and the original batch, the offsets are
/// interleaved with their spatial axes, and then `cropping[i]` is removed from the ends of each merged spatial axis.
///
/// The output has shape
/// `[batch / product(blocks), spatial_0 * blocks[0] - crop_0, .., spatial_{M-1} * blocks[M-1] - crop_{M-1}, channels]`.
/// Inverse of `space_to_batch`: `batch_to_space(space_to_batch(x, blocks, p), blocks, p) == x`.
///
/// # Errors
///  * `InvalidParameter` if any block size is 0
///  * `ShapeMismatch` if `blocks` and `cropping` differ in length, if the input rank isn't `blocks.len() + 2`, if the
///    batch axis isn't divisible by the product of the blocks, or if a cropping exceeds its merged spatial axis
pub fn batch_to_space<S, D, T>(
	input: &ArrayBase<S, D>,
	blocks: &[usize],
	cropping: &[(usize, usize)],
) -> Result<ArrayD<T>, TransformError>
where
	S: Data<Elem = T>,
	D: Dimension,
	T: Clone + Zero + Send + Sync,
{
	batch_to_space_with_config(input, blocks, cropping, &ExecConfig::default())
}

/// As `batch_to_space`, with explicit execution options.
pub fn batch_to_space_with_config<S, D, T>(
	input: &ArrayBase<S, D>,
	blocks: &[usize],
	cropping: &[(usize, usize)],
	config: &ExecConfig,
) -> Result<ArrayD<T>, TransformError>
where
	S: Data<Elem = T>,
	D: Dimension,
	T: Clone + Zero + Send + Sync,
{
	let input = input.view().into_dyn();
	let input_shape = NodeShape::from(input.shape());

	// validates everything, including cropping, before any data moves
	let output_shape = batch_to_space_shape(&input_shape, blocks, cropping)?;
	let output_shape = output_shape.to_data_shape()?;

	let m = blocks.len();
	let batch = input.shape()[0] / block_product(blocks)?;

	// [o_0, .., o_{M-1}, batch, r_0, .., r_{M-1}, channels]
	let split_shape: SmallVec<[usize; 8]> = blocks
		.iter()
		.cloned()
		.chain(once(batch))
		.chain(input.shape()[1..].iter().cloned())
		.collect();

	// [batch, r_0, o_0, r_1, o_1, .., channels]
	let permutation: SmallVec<[usize; 8]> = once(m)
		.chain((0..m).flat_map(|i| once(m + 1 + i).chain(once(i))))
		.chain(once(2 * m + 1))
		.collect();

	let merged_shape: SmallVec<[usize; 6]> = once(batch)
		.chain(input.shape()[1..=m].iter().zip(blocks).map(|(&len, &block)| len * block))
		.chain(once(input.shape()[m + 1]))
		.collect();

	let standard = input.as_standard_layout();
	let permuted = standard
		.view()
		.into_shape(IxDyn(&split_shape))?
		.permuted_axes(IxDyn(&permutation));

	log::trace!(
		"batch_to_space: split shape {:?} permuted to {:?}",
		split_shape.as_slice(),
		permuted.shape()
	);

	let mut merged = ArrayD::zeros(IxDyn(&merged_shape));
	let parallel = {
		let permuted_shape = permuted.shape().to_vec();
		let merged_view = merged.view_mut().into_shape(IxDyn(&permuted_shape))?;
		assign(merged_view, permuted, config)
	};

	let output = if cropping.iter().all(|&c| c == (0, 0)) {
		merged
	} else {
		let full_cropping: SmallVec<[(usize, usize); 6]> =
			once((0, 0)).chain(cropping.iter().cloned()).chain(once((0, 0))).collect();
		crop_with_config(&merged, &full_cropping, config)?
	};

	debug_assert_eq!(output.raw_dim(), output_shape);

	log::debug!(
		"batch_to_space: {:?} -> {:?} (blocks {}, cropping {}, parallel {})",
		input.shape(),
		output.shape(),
		IterDisplay { inner: blocks },
		PairsDisplay { inner: cropping },
		parallel
	);

	Ok(output)
}

#[cfg(test)]
mod tests {
	use super::{batch_to_space, batch_to_space_with_config, space_to_batch, space_to_batch_with_config};
	use blockbatch_core::exec::ExecConfig;
	use blockbatch_test::{random_array, LayoutLawTest};
	use ndarray::{ArrayD, Axis, IxDyn, ShapeBuilder};

	fn array(shape: &[usize], values: Vec<f32>) -> ArrayD<f32> {
		ArrayD::from_shape_vec(IxDyn(shape), values).unwrap()
	}

	#[test]
	fn forward_2x2_single_entries() {
		let input = array(&[1, 2, 2, 1], vec![1.0, 2.0, 3.0, 4.0]);

		let output = space_to_batch(&input, &[2, 2], &[(0, 0), (0, 0)]).unwrap();

		assert_eq!(output, array(&[4, 1, 1, 1], vec![1.0, 2.0, 3.0, 4.0]));
	}

	#[test]
	fn forward_strided_blocks() {
		let input = array(&[1, 4, 4, 1], (1..=16).map(|x| x as f32).collect());

		let output = space_to_batch(&input, &[2, 2], &[(0, 0), (0, 0)]).unwrap();

		let expected = array(
			&[4, 2, 2, 1],
			vec![
				1.0, 3.0, 9.0, 11.0, //
				2.0, 4.0, 10.0, 12.0, //
				5.0, 7.0, 13.0, 15.0, //
				6.0, 8.0, 14.0, 16.0,
			],
		);
		assert_eq!(output, expected);
	}

	#[test]
	fn forward_padded_batch_of_two() {
		let input = array(&[2, 2, 4, 1], (1..=16).map(|x| x as f32).collect());

		let output = space_to_batch(&input, &[2, 2], &[(0, 0), (2, 0)]).unwrap();

		let expected = array(
			&[8, 1, 3, 1],
			vec![
				0.0, 1.0, 3.0, //
				0.0, 9.0, 11.0, //
				0.0, 2.0, 4.0, //
				0.0, 10.0, 12.0, //
				0.0, 5.0, 7.0, //
				0.0, 13.0, 15.0, //
				0.0, 6.0, 8.0, //
				0.0, 14.0, 16.0,
			],
		);
		assert_eq!(output, expected);

		let back = batch_to_space(&output, &[2, 2], &[(0, 0), (2, 0)]).unwrap();
		assert_eq!(back, input);
	}

	#[test]
	fn channels_move_together() {
		// 1 spatial axis of 4, 2 channels
		let input = array(&[1, 4, 2], vec![0.0, 0.5, 1.0, 1.5, 2.0, 2.5, 3.0, 3.5]);

		let output = space_to_batch(&input, &[2], &[(1, 1)]).unwrap();

		let expected = array(
			&[2, 3, 2],
			vec![
				0.0, 0.0, 1.0, 1.5, 3.0, 3.5, //
				0.0, 0.5, 2.0, 2.5, 0.0, 0.0,
			],
		);
		assert_eq!(output, expected);
	}

	#[test]
	fn identity_blocks() {
		let rng = &mut rand::thread_rng();
		let input = random_array(&[3, 4, 5, 2], rng);

		let output = space_to_batch(&input, &[1, 1], &[(0, 0), (0, 0)]).unwrap();
		assert_eq!(output, input);

		let output = batch_to_space(&input, &[1, 1], &[(0, 0), (0, 0)]).unwrap();
		assert_eq!(output, input);
	}

	#[test]
	fn no_spatial_axes() {
		let input = array(&[2, 3], vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
		let output = space_to_batch(&input, &[], &[]).unwrap();
		assert_eq!(output, input);
	}

	#[test]
	fn non_standard_layout_input() {
		let input = array(&[1, 4, 4, 1], (1..=16).map(|x| x as f32).collect());

		// same logical values, column major memory
		let mut fortran = ArrayD::<f32>::zeros(IxDyn(&[1, 4, 4, 1]).f());
		fortran.assign(&input);
		assert!(!fortran.is_standard_layout());

		let expected = space_to_batch(&input, &[2, 2], &[(1, 1), (0, 0)]).unwrap();
		let output = space_to_batch(&fortran, &[2, 2], &[(1, 1), (0, 0)]).unwrap();
		assert_eq!(output, expected);

		// reversed view of the batch of outputs still round trips to the reversed input
		let mut reversed = expected.view();
		reversed.invert_axis(Axis(1));
		let back = batch_to_space(&reversed, &[2, 2], &[(1, 1), (0, 0)]).unwrap();
		assert_eq!(back.shape(), input.shape());
	}

	#[test]
	fn parallel_matches_serial() {
		let rng = &mut rand::thread_rng();
		let input = random_array(&[2, 12, 9, 3], rng);
		let blocks = [4, 3];
		let padding = [(2, 2), (0, 3)];

		let serial = ExecConfig::default().parallel(false);
		let parallel = ExecConfig::default().parallel_threshold(0);

		let out_serial = space_to_batch_with_config(&input, &blocks, &padding, &serial).unwrap();
		let out_parallel = space_to_batch_with_config(&input, &blocks, &padding, &parallel).unwrap();
		assert_eq!(out_serial, out_parallel);

		let back_serial = batch_to_space_with_config(&out_serial, &blocks, &padding, &serial).unwrap();
		let back_parallel = batch_to_space_with_config(&out_parallel, &blocks, &padding, &parallel).unwrap();
		assert_eq!(back_serial, back_parallel);
		assert_eq!(back_serial, input);
	}

	#[test]
	fn integer_elements() {
		let input = ArrayD::from_shape_vec(IxDyn(&[1, 2, 2, 1]), vec![1i64, 2, 3, 4]).unwrap();
		let output = space_to_batch(&input, &[1, 2], &[(0, 0), (1, 1)]).unwrap();
		assert_eq!(output.shape(), &[2, 2, 2, 1]);
		assert_eq!(output.iter().cloned().collect::<Vec<_>>(), vec![0, 2, 0, 4, 1, 0, 3, 0]);
	}

	#[test]
	fn layout_laws() {
		LayoutLawTest::new(&[2, 6, 4, 3], &[2, 2], &[(0, 0), (0, 0)]).run();
		LayoutLawTest::new(&[1, 5, 7, 2], &[3, 3], &[(1, 0), (1, 1)]).run();
		LayoutLawTest::new(&[3, 4, 1], &[3], &[(1, 4)]).run();
		LayoutLawTest::new(&[2, 3, 2, 5, 1], &[2, 1, 3], &[(0, 1), (0, 0), (0, 1)])
			.config(ExecConfig::default().parallel_threshold(0))
			.run();
	}

	#[test]
	fn rejects_indivisible() {
		let input = ArrayD::<f32>::zeros(IxDyn(&[1, 5, 4, 1]));
		let err = space_to_batch(&input, &[2, 2], &[(0, 0), (0, 0)]).unwrap_err();
		assert!(err.is_shape_mismatch(), "{}", err);

		// padding can make it divisible
		assert!(space_to_batch(&input, &[2, 2], &[(1, 0), (0, 0)]).is_ok());
	}

	#[test]
	fn rejects_zero_block() {
		let input = ArrayD::<f32>::zeros(IxDyn(&[1, 4, 4, 1]));
		let err = space_to_batch(&input, &[0, 2], &[(0, 0), (0, 0)]).unwrap_err();
		assert!(err.is_invalid_parameter(), "{}", err);

		let err = batch_to_space(&input, &[2, 0], &[(0, 0), (0, 0)]).unwrap_err();
		assert!(err.is_invalid_parameter(), "{}", err);
	}

	#[test]
	fn rejects_rank_and_lengths() {
		let input = ArrayD::<f32>::zeros(IxDyn(&[1, 4, 4, 1]));
		assert!(space_to_batch(&input, &[2], &[(0, 0)]).unwrap_err().is_shape_mismatch());
		assert!(space_to_batch(&input, &[2, 2], &[(0, 0)]).unwrap_err().is_shape_mismatch());
		assert!(batch_to_space(&input, &[2, 2, 2], &[(0, 0); 3]).unwrap_err().is_shape_mismatch());
	}

	#[test]
	fn batch_to_space_rejects_batch_and_cropping() {
		let input = ArrayD::<f32>::zeros(IxDyn(&[3, 2, 2, 1]));
		assert!(batch_to_space(&input, &[2, 1], &[(0, 0), (0, 0)])
			.unwrap_err()
			.is_shape_mismatch());

		let input = ArrayD::<f32>::zeros(IxDyn(&[4, 2, 2, 1]));
		assert!(batch_to_space(&input, &[2, 2], &[(2, 3), (0, 0)])
			.unwrap_err()
			.is_shape_mismatch());
		assert_eq!(
			batch_to_space(&input, &[2, 2], &[(2, 2), (0, 0)]).unwrap().shape(),
			&[1, 0, 4, 1]
		);
	}
}
