//! Configuration records for the space-to-batch and batch-to-space layers.
//!
//! A layer holds only its parameters. It has no trainable parameters of its own, and running it hands those
//! parameters to the kernels in `blockbatch_ops`.
use crate::core::{
	errors::TransformError,
	exec::ExecConfig,
	params::{Blocks, Padding},
	shape::{batch_to_space_shape, space_to_batch_shape, NodeShape},
};
use crate::ops::shape::space_to_batch::{batch_to_space_with_config, space_to_batch_with_config};
use ndarray::{ArrayBase, ArrayD, Data, Dimension};
use num_traits::Zero;
use std::fmt::{self, Display};

/// A layer in a network definition.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Layer {
	SpaceToBatch(SpaceToBatchLayer),
	BatchToSpace(BatchToSpaceLayer),
}

impl Layer {
	pub fn type_name(&self) -> &'static str {
		match self {
			Layer::SpaceToBatch(_) => "SpaceToBatch",
			Layer::BatchToSpace(_) => "BatchToSpace",
		}
	}

	pub fn name(&self) -> Option<&str> {
		match self {
			Layer::SpaceToBatch(layer) => layer.name(),
			Layer::BatchToSpace(layer) => layer.name(),
		}
	}

	/// Number of trainable parameters. Always zero for these layers.
	pub fn num_params(&self) -> usize {
		0
	}

	/// Infer the output shape for a (possibly partially known) input shape.
	pub fn output_shape(&self, input_shape: &NodeShape) -> Result<NodeShape, TransformError> {
		match self {
			Layer::SpaceToBatch(layer) => layer.output_shape(input_shape),
			Layer::BatchToSpace(layer) => layer.output_shape(input_shape),
		}
	}

	pub fn apply<S, D, T>(&self, input: &ArrayBase<S, D>, config: &ExecConfig) -> Result<ArrayD<T>, TransformError>
	where
		S: Data<Elem = T>,
		D: Dimension,
		T: Clone + Zero + Send + Sync,
	{
		match self {
			Layer::SpaceToBatch(layer) => layer.apply(input, config),
			Layer::BatchToSpace(layer) => layer.apply(input, config),
		}
	}

	/// The layer that undoes this one: padding becomes cropping and vice versa.
	pub fn inverse(&self) -> Layer {
		match self {
			Layer::SpaceToBatch(layer) => Layer::BatchToSpace(BatchToSpaceLayer {
				name: layer.name.as_ref().map(|n| format!("{}_inverse", n)),
				blocks: layer.blocks.clone(),
				cropping: layer.padding.clone(),
			}),
			Layer::BatchToSpace(layer) => Layer::SpaceToBatch(SpaceToBatchLayer {
				name: layer.name.as_ref().map(|n| format!("{}_inverse", n)),
				blocks: layer.blocks.clone(),
				padding: layer.cropping.clone(),
			}),
		}
	}
}

impl Display for Layer {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		match self {
			Layer::SpaceToBatch(layer) => Display::fmt(layer, f),
			Layer::BatchToSpace(layer) => Display::fmt(layer, f),
		}
	}
}

impl From<SpaceToBatchLayer> for Layer {
	fn from(layer: SpaceToBatchLayer) -> Layer {
		Layer::SpaceToBatch(layer)
	}
}

impl From<BatchToSpaceLayer> for Layer {
	fn from(layer: BatchToSpaceLayer) -> Layer {
		Layer::BatchToSpace(layer)
	}
}

/// Moves blocks of spatial entries into the batch axis, after zero padding the spatial axes.
///
/// Example, with blocks `[2, 2]` and no padding:
/// ```
/// # use blockbatch::layer::SpaceToBatchLayer;
/// # use blockbatch::core::exec::ExecConfig;
/// # use ndarray::{ArrayD, IxDyn};
/// let layer = SpaceToBatchLayer::builder(&[2, 2]).build().unwrap();
/// let input = ArrayD::from_shape_vec(IxDyn(&[1, 2, 2, 1]), vec![1.0, 2.0, 3.0, 4.0]).unwrap();
/// let output = layer.apply(&input, &ExecConfig::default()).unwrap();
/// assert_eq!(output.shape(), &[4, 1, 1, 1]);
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct SpaceToBatchLayer {
	name: Option<String>,
	blocks: Blocks,
	padding: Padding,
}

impl SpaceToBatchLayer {
	pub fn builder(blocks: &[i64]) -> SpaceToBatchBuilder {
		SpaceToBatchBuilder {
			name: None,
			blocks: blocks.to_vec(),
			padding: None,
		}
	}

	/// # Errors
	/// `InvalidParameter` if `blocks` and `padding` differ in length.
	pub fn new(blocks: Blocks, padding: Padding) -> Result<Self, TransformError> {
		check_lengths(&blocks, &padding, "padding")?;
		Ok(SpaceToBatchLayer {
			name: None,
			blocks,
			padding,
		})
	}

	pub fn name(&self) -> Option<&str> {
		self.name.as_deref()
	}

	pub fn blocks(&self) -> &Blocks {
		&self.blocks
	}

	pub fn padding(&self) -> &Padding {
		&self.padding
	}

	pub fn output_shape(&self, input_shape: &NodeShape) -> Result<NodeShape, TransformError> {
		space_to_batch_shape(input_shape, self.blocks.as_slice(), self.padding.as_slice())
			.map_err(|err| err.context(LayerContext("space to batch", &self.name)))
	}

	pub fn apply<S, D, T>(&self, input: &ArrayBase<S, D>, config: &ExecConfig) -> Result<ArrayD<T>, TransformError>
	where
		S: Data<Elem = T>,
		D: Dimension,
		T: Clone + Zero + Send + Sync,
	{
		space_to_batch_with_config(input, self.blocks.as_slice(), self.padding.as_slice(), config)
			.map_err(|err| err.context(LayerContext("space to batch", &self.name)))
	}
}

impl Display for SpaceToBatchLayer {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		write!(f, "SpaceToBatch(")?;
		if let Some(name) = &self.name {
			write!(f, "name={:?}, ", name)?;
		}
		write!(f, "blocks={}, padding={})", self.blocks, self.padding)
	}
}

#[must_use]
#[derive(Clone, Debug)]
pub struct SpaceToBatchBuilder {
	name: Option<String>,
	blocks: Vec<i64>,
	padding: Option<Vec<[i64; 2]>>,
}

impl SpaceToBatchBuilder {
	/// One `[before, after]` pair per block.
	///
	/// Default: `[0, 0]` for every block
	pub fn padding(mut self, padding: &[[i64; 2]]) -> Self {
		self.padding = Some(padding.to_vec());
		self
	}

	/// Default: None
	pub fn name<N: Into<String>>(mut self, name: N) -> Self {
		self.name = Some(name.into());
		self
	}

	/// # Errors
	/// `InvalidParameter` if a block size is less than 1, if a padding amount is negative, or if the number of
	/// padding pairs differs from the number of blocks.
	pub fn build(self) -> Result<SpaceToBatchLayer, TransformError> {
		let context = LayerContext("space to batch", &self.name);
		let blocks = Blocks::new(&self.blocks).map_err(|err| err.context(&context))?;
		let padding = match &self.padding {
			Some(padding) => Padding::new(padding).map_err(|err| err.context(&context))?,
			None => Padding::zeros(blocks.len()),
		};
		check_lengths(&blocks, &padding, "padding").map_err(|err| err.context(&context))?;

		let layer = SpaceToBatchLayer {
			name: self.name,
			blocks,
			padding,
		};
		log::debug!("built {}", layer);
		Ok(layer)
	}
}

/// Moves entries of the batch axis back out into blocks of spatial entries, then crops the spatial axes.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct BatchToSpaceLayer {
	name: Option<String>,
	blocks: Blocks,
	cropping: Padding,
}

impl BatchToSpaceLayer {
	pub fn builder(blocks: &[i64]) -> BatchToSpaceBuilder {
		BatchToSpaceBuilder {
			name: None,
			blocks: blocks.to_vec(),
			cropping: None,
		}
	}

	/// # Errors
	/// `InvalidParameter` if `blocks` and `cropping` differ in length.
	pub fn new(blocks: Blocks, cropping: Padding) -> Result<Self, TransformError> {
		check_lengths(&blocks, &cropping, "cropping")?;
		Ok(BatchToSpaceLayer {
			name: None,
			blocks,
			cropping,
		})
	}

	pub fn name(&self) -> Option<&str> {
		self.name.as_deref()
	}

	pub fn blocks(&self) -> &Blocks {
		&self.blocks
	}

	pub fn cropping(&self) -> &Padding {
		&self.cropping
	}

	pub fn output_shape(&self, input_shape: &NodeShape) -> Result<NodeShape, TransformError> {
		batch_to_space_shape(input_shape, self.blocks.as_slice(), self.cropping.as_slice())
			.map_err(|err| err.context(LayerContext("batch to space", &self.name)))
	}

	pub fn apply<S, D, T>(&self, input: &ArrayBase<S, D>, config: &ExecConfig) -> Result<ArrayD<T>, TransformError>
	where
		S: Data<Elem = T>,
		D: Dimension,
		T: Clone + Zero + Send + Sync,
	{
		batch_to_space_with_config(input, self.blocks.as_slice(), self.cropping.as_slice(), config)
			.map_err(|err| err.context(LayerContext("batch to space", &self.name)))
	}
}

impl Display for BatchToSpaceLayer {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		write!(f, "BatchToSpace(")?;
		if let Some(name) = &self.name {
			write!(f, "name={:?}, ", name)?;
		}
		write!(f, "blocks={}, cropping={})", self.blocks, self.cropping)
	}
}

#[must_use]
#[derive(Clone, Debug)]
pub struct BatchToSpaceBuilder {
	name: Option<String>,
	blocks: Vec<i64>,
	cropping: Option<Vec<[i64; 2]>>,
}

impl BatchToSpaceBuilder {
	/// One `[before, after]` pair per block.
	///
	/// Default: `[0, 0]` for every block
	pub fn cropping(mut self, cropping: &[[i64; 2]]) -> Self {
		self.cropping = Some(cropping.to_vec());
		self
	}

	/// Default: None
	pub fn name<N: Into<String>>(mut self, name: N) -> Self {
		self.name = Some(name.into());
		self
	}

	/// # Errors
	/// `InvalidParameter` if a block size is less than 1, if a cropping amount is negative, or if the number of
	/// cropping pairs differs from the number of blocks.
	pub fn build(self) -> Result<BatchToSpaceLayer, TransformError> {
		let context = LayerContext("batch to space", &self.name);
		let blocks = Blocks::new(&self.blocks).map_err(|err| err.context(&context))?;
		let cropping = match &self.cropping {
			Some(cropping) => Padding::new(cropping).map_err(|err| err.context(&context))?,
			None => Padding::zeros(blocks.len()),
		};
		check_lengths(&blocks, &cropping, "cropping").map_err(|err| err.context(&context))?;

		let layer = BatchToSpaceLayer {
			name: self.name,
			blocks,
			cropping,
		};
		log::debug!("built {}", layer);
		Ok(layer)
	}
}

fn check_lengths(blocks: &Blocks, pairs: &Padding, what: &str) -> Result<(), TransformError> {
	if blocks.len() != pairs.len() {
		return Err(TransformError::invalid_parameter(format!(
			"The number of {} pairs ({}) must equal the number of blocks ({})",
			what,
			pairs.len(),
			blocks.len()
		)));
	}
	Ok(())
}

/// Names the layer in error messages.
struct LayerContext<'a>(&'static str, &'a Option<String>);

impl<'a> Display for LayerContext<'a> {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		match self.1 {
			Some(name) => write!(f, "{} layer (layer name=\"{}\")", self.0, name),
			None => write!(f, "{} layer", self.0),
		}
	}
}
