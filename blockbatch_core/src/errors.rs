use crate::shape::{NodeAxis, NodeShape};
use failure::Fail;

/// Returned by the space-to-batch family of transforms, and by the parameter types feeding them.
///
/// Both kinds are configuration errors: the call is aborted before any output is produced, and retrying with the
/// same arguments will fail the same way.
#[derive(Debug, Fail, Clone, PartialEq, Eq)]
pub enum TransformError {
	/// The rank of the input, the number of blocks/padding pairs, or the divisibility of a (padded) axis by its block
	/// size does not line up.
	#[fail(display = "ShapeMismatch: {}", desc)]
	ShapeMismatch { desc: String },

	/// A block size was less than one, or a padding/cropping amount was negative.
	#[fail(display = "InvalidParameter: {}", desc)]
	InvalidParameter { desc: String },
}

impl TransformError {
	pub fn shape_mismatch<I: Into<String>>(desc: I) -> Self {
		TransformError::ShapeMismatch { desc: desc.into() }
	}

	pub fn invalid_parameter<I: Into<String>>(desc: I) -> Self {
		TransformError::InvalidParameter { desc: desc.into() }
	}

	pub fn is_shape_mismatch(&self) -> bool {
		matches!(self, TransformError::ShapeMismatch { .. })
	}

	pub fn is_invalid_parameter(&self) -> bool {
		matches!(self, TransformError::InvalidParameter { .. })
	}

	/// Prefix the description with some context, such as the name of the layer that raised it.
	pub fn context<C: ::std::fmt::Display>(self, context: C) -> Self {
		match self {
			TransformError::ShapeMismatch { desc } => TransformError::ShapeMismatch {
				desc: format!("{}: {}", context, desc),
			},
			TransformError::InvalidParameter { desc } => TransformError::InvalidParameter {
				desc: format!("{}: {}", context, desc),
			},
		}
	}
}

impl From<ShapeError> for TransformError {
	fn from(err: ShapeError) -> TransformError {
		TransformError::ShapeMismatch {
			desc: format!("{}", err),
		}
	}
}

impl From<ndarray::ShapeError> for TransformError {
	fn from(err: ndarray::ShapeError) -> TransformError {
		TransformError::ShapeMismatch {
			desc: format!("array reshape failed: {}", err),
		}
	}
}

#[allow(clippy::large_enum_variant)]
#[derive(Debug, Fail)]
pub enum ShapeError {
	#[fail(
		display = "Cannot produce a final array shape, as shape contains to dimensions that aren't known: {}.",
		shape
	)]
	UnderDeterminedDimensions { shape: NodeShape },

	#[fail(
		display = "Cannot merge shapes as they have a different number of dimensions ({} vs {}).",
		shape1, shape2
	)]
	IncompatibleRanks { shape1: NodeShape, shape2: NodeShape },

	#[fail(
		display = "Cannot merge shapes due to incompatible dimensions at index {} in shapes ({} vs {}).",
		index, shape1, shape2
	)]
	IncompatibleDimensionAt {
		shape1: NodeShape,
		shape2: NodeShape,
		index: usize,
		#[cause]
		cause: DimError,
	},

	#[fail(display = "Shape arithmetic overflowed usize for shape {}.", shape)]
	Overflow { shape: NodeShape },
}

#[derive(Debug, Fail)]
pub enum DimError {
	#[fail(display = "Cannot merge incompatible dimensions ({} vs {}).", dim1, dim2)]
	IncompatibleDimension { dim1: NodeAxis, dim2: NodeAxis },
}
