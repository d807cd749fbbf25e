//! Types for describing tensor shapes that may only be partially known, and the shape arithmetic of the
//! space-to-batch family of transforms.
use crate::errors::{DimError, ShapeError, TransformError};
use crate::util::display::IterDisplay;
use ndarray::IxDyn;
use smallvec::SmallVec;
use std::{
	cmp::{self, Ordering},
	fmt::{self, Debug, Display, Write},
};

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum NodeAxis {
	/// A fully constrained dimension
	Known { val: usize },

	/// Inclusive interval of possible sizes for a given dimension
	Interval { lower: usize, upper: usize },
}

impl NodeAxis {
	/// Create a `NodeAxis` contrained only by usize::MAX.
	pub fn unknown() -> NodeAxis {
		NodeAxis::interval(0, usize::MAX)
	}

	/// Create a `NodeAxis` with a known size.
	pub fn known(x: usize) -> NodeAxis {
		NodeAxis::Known { val: x }
	}

	/// Create a `NodeAxis` with a limited range of flexibility.
	///
	/// # Panics
	/// Panics if lower > upper.
	pub fn interval(lower: usize, upper: usize) -> NodeAxis {
		match lower.cmp(&upper) {
			Ordering::Less => NodeAxis::Interval { lower, upper },
			Ordering::Equal => NodeAxis::Known { val: lower },
			Ordering::Greater => panic!(
				"NodeAxis::Interval cannot be constructed with lower({}) > upper({})",
				lower, upper
			),
		}
	}

	pub fn is_known(&self) -> bool {
		match self {
			NodeAxis::Known { .. } => true,
			NodeAxis::Interval { .. } => false,
		}
	}

	pub fn as_known(&self) -> Option<usize> {
		match self {
			NodeAxis::Known { val } => Some(*val),
			NodeAxis::Interval { .. } => None,
		}
	}

	pub fn as_interval(&self) -> (usize, usize) {
		match self {
			NodeAxis::Known { val } => (*val, *val),
			NodeAxis::Interval { lower, upper } => (*lower, *upper),
		}
	}

	pub fn lower(&self) -> usize {
		self.as_interval().0
	}

	pub fn upper(&self) -> usize {
		self.as_interval().1
	}

	/// Add a constant to every size the axis can take.
	///
	/// An unbounded upper limit stays unbounded. Returns `None` if the lower bound overflows.
	pub fn add(&self, x: usize) -> Option<NodeAxis> {
		match self {
			NodeAxis::Known { val } => val.checked_add(x).map(NodeAxis::known),
			NodeAxis::Interval { lower, upper } => {
				Some(NodeAxis::interval(lower.checked_add(x)?, upper.saturating_add(x)))
			}
		}
	}

	/// Multiply every size the axis can take by a constant.
	///
	/// An unbounded upper limit stays unbounded. Returns `None` if the lower bound overflows.
	pub fn multiply(&self, x: usize) -> Option<NodeAxis> {
		match self {
			NodeAxis::Known { val } => val.checked_mul(x).map(NodeAxis::known),
			NodeAxis::Interval { lower, upper } => {
				Some(NodeAxis::interval(lower.checked_mul(x)?, upper.saturating_mul(x)))
			}
		}
	}

	/// Divide every size the axis can take by `divisor`, keeping only the sizes that divide exactly.
	///
	/// Returns `None` if no size the axis can take is divisible, or if `divisor` is zero.
	pub fn divide_exact(&self, divisor: usize) -> Option<NodeAxis> {
		if divisor == 0 {
			return None;
		}
		match self {
			NodeAxis::Known { val } => {
				if val % divisor == 0 {
					Some(NodeAxis::known(val / divisor))
				} else {
					None
				}
			}
			NodeAxis::Interval { lower, upper } => {
				let lower = lower / divisor + if lower % divisor == 0 { 0 } else { 1 };
				let upper = if *upper == usize::MAX { usize::MAX } else { upper / divisor };
				if lower > upper {
					None
				} else {
					Some(NodeAxis::interval(lower, upper))
				}
			}
		}
	}

	/// Remove a constant from every size the axis can take, dropping sizes that would go below zero.
	///
	/// Returns `None` if every size the axis can take is smaller than `x`.
	pub fn subtract(&self, x: usize) -> Option<NodeAxis> {
		match self {
			NodeAxis::Known { val } => val.checked_sub(x).map(NodeAxis::known),
			NodeAxis::Interval { lower, upper } => {
				if *upper < x {
					None
				} else if *upper == usize::MAX {
					Some(NodeAxis::interval(lower.saturating_sub(x), usize::MAX))
				} else {
					Some(NodeAxis::interval(lower.saturating_sub(x), upper - x))
				}
			}
		}
	}

	pub fn merge(&self, other: &NodeAxis) -> Result<NodeAxis, DimError> {
		match (self, other) {
			(NodeAxis::Known { val: x }, NodeAxis::Known { val: y }) => {
				if x == y {
					Ok(NodeAxis::known(*x))
				} else {
					Err(DimError::IncompatibleDimension {
						dim1: self.clone(),
						dim2: other.clone(),
					})
				}
			}
			(NodeAxis::Known { val }, NodeAxis::Interval { upper, lower })
			| (NodeAxis::Interval { upper, lower }, NodeAxis::Known { val }) => {
				if val >= lower && val <= upper {
					Ok(NodeAxis::known(*val))
				} else {
					Err(DimError::IncompatibleDimension {
						dim1: self.clone(),
						dim2: other.clone(),
					})
				}
			}
			(
				NodeAxis::Interval {
					upper: upper1,
					lower: lower1,
				},
				NodeAxis::Interval {
					upper: upper2,
					lower: lower2,
				},
			) => {
				let upper = *cmp::min(upper1, upper2);
				let lower = *cmp::max(lower1, lower2);
				if lower > upper {
					Err(DimError::IncompatibleDimension {
						dim1: self.clone(),
						dim2: other.clone(),
					})
				} else {
					Ok(NodeAxis::interval(lower, upper))
				}
			}
		}
	}
}

impl<'a> From<&'a NodeAxis> for NodeAxis {
	fn from(s: &NodeAxis) -> NodeAxis {
		s.clone()
	}
}

impl From<usize> for NodeAxis {
	fn from(s: usize) -> NodeAxis {
		NodeAxis::known(s)
	}
}

impl<'a> From<&'a usize> for NodeAxis {
	fn from(s: &usize) -> NodeAxis {
		NodeAxis::known(*s)
	}
}

/// Negative values produce an unknown axis.
impl From<isize> for NodeAxis {
	fn from(s: isize) -> NodeAxis {
		if s < 0 {
			NodeAxis::unknown()
		} else {
			NodeAxis::known(s as usize)
		}
	}
}

impl<'a> From<&'a isize> for NodeAxis {
	fn from(s: &isize) -> NodeAxis {
		NodeAxis::from(*s)
	}
}

impl From<i32> for NodeAxis {
	fn from(s: i32) -> NodeAxis {
		NodeAxis::from(s as isize)
	}
}

impl<'a> From<&'a i32> for NodeAxis {
	fn from(s: &i32) -> NodeAxis {
		NodeAxis::from(*s as isize)
	}
}

impl From<i64> for NodeAxis {
	fn from(s: i64) -> NodeAxis {
		if s < 0 {
			NodeAxis::unknown()
		} else {
			NodeAxis::known(s as usize)
		}
	}
}

impl<'a> From<&'a i64> for NodeAxis {
	fn from(s: &i64) -> NodeAxis {
		NodeAxis::from(*s)
	}
}

impl From<(usize, usize)> for NodeAxis {
	fn from((lower, upper): (usize, usize)) -> NodeAxis {
		NodeAxis::interval(lower, upper)
	}
}

impl Display for NodeAxis {
	fn fmt(&self, fmt: &mut fmt::Formatter) -> ::std::fmt::Result {
		match self {
			NodeAxis::Known { val } => fmt.pad(&format!("{}", val)),
			NodeAxis::Interval { lower, upper } if *lower == 0 && *upper == usize::MAX => fmt.pad("-1"),
			NodeAxis::Interval { lower, upper } if *upper == usize::MAX => fmt.pad(&format!("({} - MAX)", lower)),
			NodeAxis::Interval { lower, upper } => fmt.pad(&format!("({} - {})", lower, upper)),
		}
	}
}

/// Represents the range of shapes a tensor can take on.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct NodeShape {
	dimensions: SmallVec<[NodeAxis; 4]>,
}

impl Display for NodeShape {
	fn fmt(&self, fmt: &mut fmt::Formatter) -> ::std::fmt::Result {
		let mut string = String::new();
		let mut iter = self.dimensions.iter();
		write!(string, "[")?;
		if let Some(axis) = iter.next() {
			write!(string, "{}", axis)?;
			for axis in iter {
				write!(string, ", {}", axis)?;
			}
		}
		write!(string, "]")?;

		fmt.pad(&string)
	}
}

impl Debug for NodeShape {
	fn fmt(&self, fmt: &mut fmt::Formatter) -> ::std::fmt::Result {
		Display::fmt(self, fmt)
	}
}

impl<'a> IntoIterator for &'a NodeShape {
	type IntoIter = ::std::slice::Iter<'a, NodeAxis>;
	type Item = &'a NodeAxis;

	fn into_iter(self) -> Self::IntoIter {
		self.dimensions.iter()
	}
}

impl<T: Into<NodeAxis>, I: IntoIterator<Item = T>> From<I> for NodeShape {
	fn from(i: I) -> NodeShape {
		NodeShape {
			dimensions: i.into_iter().map(Into::into).collect(),
		}
	}
}

impl NodeShape {
	/// Return the number of axes in the shape
	pub fn len(&self) -> usize {
		self.dimensions.len()
	}

	pub fn is_empty(&self) -> bool {
		self.dimensions.is_empty()
	}

	pub fn ndim(&self) -> usize {
		self.dimensions.len()
	}

	pub fn slice(&self) -> &[NodeAxis] {
		&self.dimensions
	}

	pub fn iter(&self) -> impl Iterator<Item = &NodeAxis> + DoubleEndedIterator {
		self.dimensions.iter()
	}

	/// Returns true if all NodeAxes have a Known size.
	pub fn is_known(&self) -> bool {
		self.dimensions.iter().all(NodeAxis::is_known)
	}

	/// Return the product of known NodeAxis, or an error if any non-Known axis is present.
	///
	/// # Errors
	/// * `ShapeError::UnderDeterminedDimensions` if not all `NodeAxis` are known.
	/// * `ShapeError::Overflow` if the product doesn't fit in a usize.
	pub fn known_flat_size(&self) -> Result<usize, ShapeError> {
		let mut size = 1usize;

		for dim in self.dimensions.iter() {
			match dim {
				NodeAxis::Known { val } => {
					size = size
						.checked_mul(*val)
						.ok_or_else(|| ShapeError::Overflow { shape: self.clone() })?
				}
				_ => return Err(ShapeError::UnderDeterminedDimensions { shape: self.clone() }),
			}
		}

		Ok(size)
	}

	/// If all dimension values are `Known` returns the shape as an ndarray dimension.
	pub fn to_data_shape(&self) -> Result<IxDyn, ShapeError> {
		let mut dims = Vec::with_capacity(self.dimensions.len());

		for dim in self.dimensions.iter() {
			match dim {
				NodeAxis::Known { val } => dims.push(*val),
				_ => return Err(ShapeError::UnderDeterminedDimensions { shape: self.clone() }),
			}
		}
		Ok(IxDyn(&dims))
	}

	pub fn merge(&self, other: &NodeShape) -> Result<NodeShape, ShapeError> {
		if self.ndim() != other.ndim() {
			return Err(ShapeError::IncompatibleRanks {
				shape1: self.clone(),
				shape2: other.clone(),
			});
		}

		let mut vec = SmallVec::new();
		for (i, (s, o)) in self.dimensions.iter().zip(&other.dimensions).enumerate() {
			match s.merge(o) {
				Ok(x) => vec.push(x),
				Err(x) => {
					return Err(ShapeError::IncompatibleDimensionAt {
						shape1: self.clone(),
						shape2: other.clone(),
						index: i,
						cause: x,
					});
				}
			}
		}
		Ok(NodeShape { dimensions: vec })
	}
}

/// Checks that must hold between an input rank, block sizes and padding (or cropping) for either transform.
///
/// Block sizes are checked first, so that a zero block is reported as `InvalidParameter` even when the shapes are
/// also inconsistent.
pub fn check_block_params(rank: usize, blocks: &[usize], padding: &[(usize, usize)]) -> Result<(), TransformError> {
	if let Some(i) = blocks.iter().position(|&b| b == 0) {
		return Err(TransformError::invalid_parameter(format!(
			"All block sizes must be at least 1, found {} at index {} of blocks {}",
			blocks[i],
			i,
			IterDisplay { inner: blocks }
		)));
	}

	if blocks.len() != padding.len() {
		return Err(TransformError::shape_mismatch(format!(
			"The number of blocks ({}) must equal the number of padding pairs ({})",
			blocks.len(),
			padding.len()
		)));
	}

	if rank != blocks.len() + 2 {
		return Err(TransformError::shape_mismatch(format!(
			"The input rank ({}) must be the number of blocks ({}) plus 2 (batch and channel axes)",
			rank,
			blocks.len()
		)));
	}

	Ok(())
}

/// The shape produced by space-to-batch for a (possibly partially known) input shape.
///
/// * batch axis: multiplied by the product of `blocks`.
/// * spatial axis `i`: padded by `padding[i]` then divided by `blocks[i]`. A known axis must divide exactly, an
///   interval axis is narrowed to the sizes that do.
/// * channel axis: unchanged.
pub fn space_to_batch_shape(
	input_shape: &NodeShape,
	blocks: &[usize],
	padding: &[(usize, usize)],
) -> Result<NodeShape, TransformError> {
	check_block_params(input_shape.len(), blocks, padding)?;

	let axes = input_shape.slice();
	let block_product = block_product(blocks)?;

	let mut dimensions: SmallVec<[NodeAxis; 4]> = SmallVec::with_capacity(axes.len());

	dimensions.push(
		axes[0]
			.multiply(block_product)
			.ok_or_else(|| overflow(input_shape, "batch axis"))?,
	);

	for (i, ((axis, &block), &(before, after))) in axes[1..axes.len() - 1].iter().zip(blocks).zip(padding).enumerate() {
		let padded = before
			.checked_add(after)
			.and_then(|pad| axis.add(pad))
			.ok_or_else(|| overflow(input_shape, "padded spatial axis"))?;

		let divided = padded.divide_exact(block).ok_or_else(|| {
			TransformError::shape_mismatch(format!(
				"Spatial axis {} of input shape {} has padded size {} (padding ({}, {})) which is not divisible by its block size {}",
				i,
				input_shape,
				padded,
				before,
				after,
				block
			))
		})?;
		dimensions.push(divided);
	}

	dimensions.push(axes[axes.len() - 1].clone());

	Ok(NodeShape { dimensions })
}

/// The shape produced by batch-to-space for a (possibly partially known) input shape.
///
/// * batch axis: divided by the product of `blocks`, which must divide it exactly.
/// * spatial axis `i`: multiplied by `blocks[i]` then cropped by `cropping[i]`.
/// * channel axis: unchanged.
pub fn batch_to_space_shape(
	input_shape: &NodeShape,
	blocks: &[usize],
	cropping: &[(usize, usize)],
) -> Result<NodeShape, TransformError> {
	check_block_params(input_shape.len(), blocks, cropping)?;

	let axes = input_shape.slice();
	let block_product = block_product(blocks)?;

	let mut dimensions: SmallVec<[NodeAxis; 4]> = SmallVec::with_capacity(axes.len());

	dimensions.push(axes[0].divide_exact(block_product).ok_or_else(|| {
		TransformError::shape_mismatch(format!(
			"The batch axis of input shape {} is not divisible by the product of blocks {} ({})",
			input_shape,
			IterDisplay { inner: blocks },
			block_product
		))
	})?);

	for (i, ((axis, &block), &(before, after))) in axes[1..axes.len() - 1].iter().zip(blocks).zip(cropping).enumerate() {
		let merged = axis
			.multiply(block)
			.ok_or_else(|| overflow(input_shape, "merged spatial axis"))?;

		let cropped = before.checked_add(after).and_then(|crop| merged.subtract(crop)).ok_or_else(|| {
			TransformError::shape_mismatch(format!(
				"Spatial axis {} of input shape {} has merged size {} which is smaller than its cropping ({}, {})",
				i, input_shape, merged, before, after
			))
		})?;
		dimensions.push(cropped);
	}

	dimensions.push(axes[axes.len() - 1].clone());

	Ok(NodeShape { dimensions })
}

/// Product of all block sizes, or `ShapeMismatch` on overflow.
pub fn block_product(blocks: &[usize]) -> Result<usize, TransformError> {
	blocks.iter().try_fold(1usize, |acc, &b| acc.checked_mul(b)).ok_or_else(|| {
		TransformError::shape_mismatch(format!(
			"The product of blocks {} overflows usize",
			IterDisplay { inner: blocks }
		))
	})
}

fn overflow(shape: &NodeShape, what: &str) -> TransformError {
	TransformError::shape_mismatch(format!("The {} of input shape {} overflows usize", what, shape))
}
