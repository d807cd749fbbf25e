//! Validated block sizes and padding/cropping amounts.
//!
//! The transforms themselves take plain `&[usize]` and `&[(usize, usize)]`, which cannot express a negative padding.
//! These types are the entry point for raw, signed configuration values.
use crate::errors::TransformError;
use crate::shape::block_product;
use crate::util::display::{IterDisplay, PairsDisplay};
use itertools::Itertools;
use smallvec::SmallVec;
use std::fmt::{self, Display};

/// One block size per spatial axis, each at least 1.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Blocks {
	sizes: SmallVec<[usize; 4]>,
}

impl Blocks {
	/// # Errors
	/// `InvalidParameter` if any block size is less than 1.
	pub fn new(blocks: &[i64]) -> Result<Self, TransformError> {
		let sizes: SmallVec<[usize; 4]> = blocks
			.iter()
			.enumerate()
			.map(|(i, &b)| {
				if b < 1 {
					Err(TransformError::invalid_parameter(format!(
						"All block sizes must be at least 1, found {} at index {} of blocks {}",
						b,
						i,
						IterDisplay { inner: blocks }
					)))
				} else {
					usize::try_from(b).map_err(|_| {
						TransformError::invalid_parameter(format!("Block size {} does not fit in usize", b))
					})
				}
			})
			.collect::<Result<_, TransformError>>()?;

		Ok(Blocks { sizes })
	}

	/// # Errors
	/// `InvalidParameter` if any block size is zero.
	pub fn from_sizes(sizes: &[usize]) -> Result<Self, TransformError> {
		if let Some(i) = sizes.iter().position(|&b| b == 0) {
			return Err(TransformError::invalid_parameter(format!(
				"All block sizes must be at least 1, found 0 at index {} of blocks {}",
				i,
				IterDisplay { inner: sizes }
			)));
		}
		Ok(Blocks { sizes: sizes.into() })
	}

	pub fn len(&self) -> usize {
		self.sizes.len()
	}

	pub fn is_empty(&self) -> bool {
		self.sizes.is_empty()
	}

	pub fn as_slice(&self) -> &[usize] {
		&self.sizes
	}

	/// Factor by which the batch axis grows.
	pub fn product(&self) -> Result<usize, TransformError> {
		block_product(&self.sizes)
	}
}

impl Display for Blocks {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		write!(f, "{}", IterDisplay { inner: self.sizes.as_slice() })
	}
}

/// One `(before, after)` pair per spatial axis.
///
/// Used both as padding for space-to-batch and as cropping for batch-to-space.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Padding {
	pairs: SmallVec<[(usize, usize); 4]>,
}

impl Padding {
	/// # Errors
	/// `InvalidParameter` if any amount is negative.
	pub fn new(padding: &[[i64; 2]]) -> Result<Self, TransformError> {
		let pairs: SmallVec<[(usize, usize); 4]> = padding
			.iter()
			.enumerate()
			.map(|(i, &[before, after])| {
				let convert = |x: i64| {
					usize::try_from(x).map_err(|_| {
						TransformError::invalid_parameter(format!(
							"Padding must not be negative, found [{}, {}] at index {} of padding [{}]",
							before,
							after,
							i,
							padding.iter().map(|p| format!("[{}, {}]", p[0], p[1])).join(", ")
						))
					})
				};
				Ok((convert(before)?, convert(after)?))
			})
			.collect::<Result<_, TransformError>>()?;

		Ok(Padding { pairs })
	}

	/// No padding on any of `len` axes.
	pub fn zeros(len: usize) -> Self {
		Padding {
			pairs: SmallVec::from_elem((0, 0), len),
		}
	}

	pub fn from_pairs(pairs: &[(usize, usize)]) -> Self {
		Padding { pairs: pairs.into() }
	}

	pub fn len(&self) -> usize {
		self.pairs.len()
	}

	pub fn is_empty(&self) -> bool {
		self.pairs.is_empty()
	}

	pub fn as_slice(&self) -> &[(usize, usize)] {
		&self.pairs
	}

	/// Total padding on axis `i`, `before + after`.
	///
	/// # Panics
	/// Panics if `i` is out of range.
	pub fn total(&self, i: usize) -> usize {
		let (before, after) = self.pairs[i];
		before.saturating_add(after)
	}

	pub fn is_zero(&self) -> bool {
		self.pairs.iter().all(|&p| p == (0, 0))
	}
}

impl Display for Padding {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		write!(f, "{}", PairsDisplay { inner: &self.pairs })
	}
}

#[cfg(test)]
mod tests {
	use super::{Blocks, Padding};

	#[test]
	fn blocks_reject_non_positive() {
		assert!(Blocks::new(&[0, 2]).unwrap_err().is_invalid_parameter());
		assert!(Blocks::new(&[2, -3]).unwrap_err().is_invalid_parameter());
		assert!(Blocks::from_sizes(&[1, 0]).unwrap_err().is_invalid_parameter());

		let blocks = Blocks::new(&[2, 3]).unwrap();
		assert_eq!(blocks.as_slice(), &[2, 3]);
		assert_eq!(blocks.product().unwrap(), 6);
		assert_eq!(format!("{}", blocks), "[2, 3]");
	}

	#[test]
	fn padding_rejects_negative() {
		let err = Padding::new(&[[-1, 0], [0, 0]]).unwrap_err();
		assert!(err.is_invalid_parameter());
		assert!(format!("{}", err).contains("[-1, 0]"));

		let padding = Padding::new(&[[1, 2], [0, 3]]).unwrap();
		assert_eq!(padding.as_slice(), &[(1, 2), (0, 3)]);
		assert_eq!(padding.total(1), 3);
		assert_eq!(format!("{}", padding), "[[1, 2], [0, 3]]");
	}

	#[test]
	fn zeros_and_equality() {
		let zeros = Padding::zeros(3);
		assert!(zeros.is_zero());
		assert_eq!(zeros, Padding::new(&[[0, 0], [0, 0], [0, 0]]).unwrap());
		assert_eq!(zeros.clone(), Padding::from_pairs(&[(0, 0); 3]));
	}
}
