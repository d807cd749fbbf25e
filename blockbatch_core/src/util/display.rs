use std::fmt::{Debug, Display, Formatter, Result};

/// Wrapper type to impl display for iterable types for use with Failure
///
/// `vec![1, 2, 3]` should display as `[1, 2, 3]`.
#[derive(Clone, Copy)]
pub struct IterDisplay<I>
where
	I: Clone + IntoIterator,
	I::Item: Display,
{
	pub inner: I,
}

impl<I> Display for IterDisplay<I>
where
	I: Clone + IntoIterator,
	I::Item: Display,
{
	fn fmt(&self, f: &mut Formatter) -> Result {
		let mut inner = self.inner.clone().into_iter();
		write!(f, "[")?;
		if let Some(d) = inner.next() {
			write!(f, "{}", d)?;
			for d in inner {
				write!(f, ", {}", d)?;
			}
		}
		write!(f, "]")?;
		Ok(())
	}
}

impl<I> Debug for IterDisplay<I>
where
	I: Clone + IntoIterator,
	I::Item: Display,
{
	fn fmt(&self, fmt: &mut Formatter) -> Result {
		Display::fmt(self, fmt)
	}
}

/// Wrapper type to display `(before, after)` pairs, as used for padding and cropping.
///
/// `[(1, 0), (2, 2)]` should display as `[[1, 0], [2, 2]]`.
#[derive(Clone, Copy)]
pub struct PairsDisplay<'a> {
	pub inner: &'a [(usize, usize)],
}

impl<'a> Display for PairsDisplay<'a> {
	fn fmt(&self, f: &mut Formatter) -> Result {
		write!(f, "[")?;
		for (i, (before, after)) in self.inner.iter().enumerate() {
			if i > 0 {
				write!(f, ", ")?;
			}
			write!(f, "[{}, {}]", before, after)?;
		}
		write!(f, "]")
	}
}

impl<'a> Debug for PairsDisplay<'a> {
	fn fmt(&self, fmt: &mut Formatter) -> Result {
		Display::fmt(self, fmt)
	}
}
