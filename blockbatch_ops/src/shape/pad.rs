use crate::copy::assign;
use blockbatch_core::{errors::TransformError, exec::ExecConfig, util::display::PairsDisplay};
use ndarray::{ArrayBase, ArrayD, Axis, Data, Dimension, IxDyn, Slice};
use num_traits::Zero;

/// Zero pad every axis of the input.
///
/// `padding` holds one `(before, after)` pair per axis of the input; `before` zeros are inserted ahead of the existing
/// elements and `after` zeros behind them. Inverse of `crop`.
///
/// # Errors
///  * `ShapeMismatch` if `padding.len()` differs from the number of axes of the input
///  * `ShapeMismatch` if the padded shape overflows usize
pub fn pad<S, D, T>(input: &ArrayBase<S, D>, padding: &[(usize, usize)]) -> Result<ArrayD<T>, TransformError>
where
	S: Data<Elem = T>,
	D: Dimension,
	T: Clone + Zero + Send + Sync,
{
	pad_with_config(input, padding, &ExecConfig::default())
}

/// As `pad`, with explicit execution options.
pub fn pad_with_config<S, D, T>(
	input: &ArrayBase<S, D>,
	padding: &[(usize, usize)],
	config: &ExecConfig,
) -> Result<ArrayD<T>, TransformError>
where
	S: Data<Elem = T>,
	D: Dimension,
	T: Clone + Zero + Send + Sync,
{
	let input = input.view().into_dyn();

	if padding.len() != input.ndim() {
		return Err(TransformError::shape_mismatch(format!(
			"The number of padding pairs ({}) must equal the number of input axes ({:?})",
			padding.len(),
			input.shape()
		)));
	}

	let output_shape = input
		.shape()
		.iter()
		.zip(padding)
		.map(|(&len, &(before, after))| len.checked_add(before)?.checked_add(after))
		.collect::<Option<Vec<usize>>>()
		.filter(|shape| shape.iter().try_fold(1usize, |acc, &len| acc.checked_mul(len)).is_some())
		.ok_or_else(|| {
			TransformError::shape_mismatch(format!(
				"Padding input shape {:?} by {} overflows usize",
				input.shape(),
				PairsDisplay { inner: padding }
			))
		})?;

	let mut output = ArrayD::zeros(IxDyn(&output_shape));

	{
		let mut interior = output.view_mut();
		for (axis, (&len, &(before, _))) in input.shape().iter().zip(padding).enumerate() {
			interior.slice_axis_inplace(Axis(axis), Slice::from(before..before + len));
		}
		assign(interior, input, config);
	}

	Ok(output)
}

/// Remove elements from both ends of every axis of the input.
///
/// `cropping` holds one `(before, after)` pair per axis of the input; the first `before` and the last `after` elements
/// along each axis are dropped. Inverse of `pad`.
///
/// # Errors
///  * `ShapeMismatch` if `cropping.len()` differs from the number of axes of the input
///  * `ShapeMismatch` if `before + after` exceeds the length of an axis
pub fn crop<S, D, T>(input: &ArrayBase<S, D>, cropping: &[(usize, usize)]) -> Result<ArrayD<T>, TransformError>
where
	S: Data<Elem = T>,
	D: Dimension,
	T: Clone + Zero + Send + Sync,
{
	crop_with_config(input, cropping, &ExecConfig::default())
}

/// As `crop`, with explicit execution options.
pub fn crop_with_config<S, D, T>(
	input: &ArrayBase<S, D>,
	cropping: &[(usize, usize)],
	config: &ExecConfig,
) -> Result<ArrayD<T>, TransformError>
where
	S: Data<Elem = T>,
	D: Dimension,
	T: Clone + Zero + Send + Sync,
{
	let mut view = input.view().into_dyn();

	if cropping.len() != view.ndim() {
		return Err(TransformError::shape_mismatch(format!(
			"The number of cropping pairs ({}) must equal the number of input axes ({:?})",
			cropping.len(),
			view.shape()
		)));
	}

	let input_shape = view.shape().to_vec();
	for (axis, (&len, &(before, after))) in input_shape.iter().zip(cropping).enumerate() {
		match before.checked_add(after) {
			Some(total) if total <= len => {
				view.slice_axis_inplace(Axis(axis), Slice::from(before..len - after));
			}
			_ => {
				return Err(TransformError::shape_mismatch(format!(
					"Cropping {} removes more than the length of axis {} of input shape {:?}",
					PairsDisplay { inner: cropping },
					axis,
					input_shape
				)));
			}
		}
	}

	let mut output = ArrayD::zeros(view.raw_dim());
	assign(output.view_mut(), view, config);

	Ok(output)
}

#[cfg(test)]
mod tests {
	use super::{crop, pad, pad_with_config};
	use blockbatch_core::exec::ExecConfig;
	use blockbatch_test::random_array;
	use ndarray::{arr2, arr3, ArrayD, IxDyn};

	#[test]
	fn pad_2d() {
		let input = arr2(&[[1.0, 2.0], [3.0, 4.0]]);

		let output = pad(&input, &[(1, 0), (0, 2)]).unwrap();

		let expected = arr2(&[
			[0.0, 0.0, 0.0, 0.0],
			[1.0, 2.0, 0.0, 0.0],
			[3.0, 4.0, 0.0, 0.0],
		])
		.into_dyn();

		assert_eq!(output, expected);
	}

	#[test]
	fn crop_3d() {
		let input = arr3(&[[[1, 2, 3], [4, 5, 6]], [[7, 8, 9], [10, 11, 12]]]);

		let output = crop(&input, &[(1, 0), (0, 1), (1, 1)]).unwrap();

		assert_eq!(output, ArrayD::from_shape_vec(IxDyn(&[1, 1, 1]), vec![8]).unwrap());
	}

	#[test]
	fn crop_to_empty() {
		let input = arr2(&[[1u8, 2], [3, 4]]);
		let output = crop(&input, &[(1, 1), (0, 0)]).unwrap();
		assert_eq!(output.shape(), &[0, 2]);
	}

	#[test]
	fn crop_inverts_pad() {
		let rng = &mut rand::thread_rng();
		let input = random_array(&[3, 5, 2, 4], rng);
		let padding = [(0, 1), (2, 3), (1, 1), (0, 0)];

		let padded = pad_with_config(&input, &padding, &ExecConfig::default().parallel_threshold(0)).unwrap();
		assert_eq!(padded.shape(), &[4, 10, 4, 4]);
		assert_eq!(padded.iter().filter(|&&x| x != 0.0).count(), input.len());

		let cropped = crop(&padded, &padding).unwrap();
		assert_eq!(cropped, input);
		assert!(cropped.is_standard_layout());
	}

	#[test]
	fn rank_mismatch() {
		let input = arr2(&[[1.0f32, 2.0], [3.0, 4.0]]);
		assert!(pad(&input, &[(1, 0)]).unwrap_err().is_shape_mismatch());
		assert!(crop(&input, &[(1, 0), (0, 0), (0, 0)]).unwrap_err().is_shape_mismatch());
	}

	#[test]
	fn over_crop() {
		let input = arr2(&[[1.0f32, 2.0], [3.0, 4.0]]);
		assert!(crop(&input, &[(2, 1), (0, 0)]).unwrap_err().is_shape_mismatch());
		assert!(crop(&input, &[(0, 0), (usize::MAX, 1)]).unwrap_err().is_shape_mismatch());
	}

	#[test]
	fn pad_overflow() {
		let input = arr2(&[[1.0f32]]);
		assert!(pad(&input, &[(usize::MAX, 0), (0, 0)]).unwrap_err().is_shape_mismatch());
	}
}
