/*!
This crate implements the classification tree that random forests are built from. A forest trains many of these trees on bootstrapped samples of the training data, restricting the variables each node may split on to a small random subset, and aggregates their votes.

A [`ClassificationTree`](struct.ClassificationTree.html) is grown with [`ClassificationTree::grow`](struct.ClassificationTree.html#method.grow). It is stored as a flat [`Tree`](struct.Tree.html): three arrays indexed by node id, with no pointers between nodes. Finished trees make predictions, contribute Gini and permutation variable importances to a shared [`VariableImportance`](struct.VariableImportance.html), and serialize to a fixed width binary layout or, through serde, to JSON.

For an end to end example, see `benchmarks/synthetic.rs`.
*/

#![allow(clippy::tabs_in_doc_comments)]

mod classification;
mod data;
mod error;
mod grow;
mod importance;
mod predict;
mod sampling;
mod serialize;
mod split;
mod tree;

pub use self::classification::ClassificationTree;
pub use self::data::{ColumnType, Data, DataMatrix, MAX_CATEGORICAL_LEVELS};
pub use self::error::{DataError, LoadError, TreeError};
pub use self::importance::{ImportanceScaling, VariableImportance};
pub use self::predict::{Accuracy, Estimate};
pub use self::sampling::{permute_oob_positions, Bootstrap, RandomSubset, SplitVariableSampler};
pub use self::split::{gini, gini_decrease, MAX_LEVELS_FOR_EXHAUSTIVE_SEARCH, SPLIT_TOLERANCE};
pub use self::tree::{Tree, TreeLayout, LEAF_SENTINEL};

/// These are the options passed to `ClassificationTree::new`.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct TreeOptions {
	/// A split will only be considered valid if the number of samples sent to each of the resulting children is at least this value. Nodes with fewer than twice this many samples become leaves.
	pub min_node_size: usize,
	/// If this is `Some`, nodes at this depth become leaves. The root is at depth 0.
	pub max_depth: Option<usize>,
	/// This controls what `ClassificationTree::estimate` returns for a leaf.
	pub estimate_mode: EstimateMode,
	/// This controls how a split's impurity decrease is weighted before it is added to the Gini importance.
	pub importance_scaling: ImportanceScaling,
}

impl Default for TreeOptions {
	fn default() -> Self {
		Self {
			min_node_size: 1,
			max_depth: None,
			estimate_mode: EstimateMode::Majority,
			importance_scaling: ImportanceScaling::NodeFraction,
		}
	}
}

/// An `EstimateMode` selects between reporting the most frequent class at a leaf and reporting the full class distribution.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum EstimateMode {
	/// The estimate is the label of the most frequent class among the training samples that reached the leaf. Ties go to the class with the lowest id.
	Majority,
	/// The estimate is the proportion of each class among the training samples that reached the leaf, in the order of the class values.
	Probability,
}
