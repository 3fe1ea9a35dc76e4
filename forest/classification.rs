use crate::{Tree, TreeOptions};
use std::collections::BTreeMap;

/**
A `ClassificationTree` is a single tree of a random forest classifier.

The class values and the response class ids are borrowed from the data container and are shared by every tree in the forest. The tree owns its node arrays, the bookkeeping used while it grows, and the memory of the current prediction round.
*/
#[derive(Debug)]
pub struct ClassificationTree<'a> {
	pub(crate) tree: Tree,
	/// The distinct labels of the response, indexed by class id.
	pub(crate) class_values: &'a [f64],
	/// The class id of every sample in the data.
	pub(crate) response_class_ids: &'a [usize],
	pub(crate) options: TreeOptions,
	/// While growing, these are the samples routed to each node that has not been processed yet.
	pub(crate) sample_ids: Vec<Vec<usize>>,
	/// While growing, this is the depth of each node.
	pub(crate) depths: Vec<usize>,
	/// While growing, this is the number of samples that reached each node.
	pub(crate) node_n_samples: Vec<usize>,
	/// The number of samples the tree was grown from.
	pub(crate) n_root_samples: usize,
	/// The class counts of the training samples that reached each leaf. Filled by `grow` and `replay_leaf_class_counts`.
	pub(crate) training_class_counts: BTreeMap<usize, Vec<usize>>,
	/// The predicted classes tallied at each leaf in the current prediction round.
	pub(crate) leaf_class_counts: BTreeMap<usize, Vec<usize>>,
	/// The predicted label of each sample in the current prediction round, `NaN` for samples not yet predicted.
	pub(crate) predictions: Vec<f64>,
}

impl<'a> ClassificationTree<'a> {
	/// Create an empty tree, ready to be grown with `grow`.
	pub fn new(class_values: &'a [f64], response_class_ids: &'a [usize], options: TreeOptions) -> Self {
		Self::from_tree(Tree::empty(), class_values, response_class_ids, options)
	}

	/// Wrap a tree that was already grown, for example one reconstructed with `Tree::from_layout` or `Tree::read_from`. It is ready to make predictions.
	pub fn from_tree(
		tree: Tree,
		class_values: &'a [f64],
		response_class_ids: &'a [usize],
		options: TreeOptions,
	) -> Self {
		Self {
			tree,
			class_values,
			response_class_ids,
			options,
			sample_ids: Vec::new(),
			depths: Vec::new(),
			node_n_samples: Vec::new(),
			n_root_samples: 0,
			training_class_counts: BTreeMap::new(),
			leaf_class_counts: BTreeMap::new(),
			predictions: Vec::new(),
		}
	}

	pub fn tree(&self) -> &Tree {
		&self.tree
	}

	pub fn into_tree(self) -> Tree {
		self.tree
	}

	pub fn options(&self) -> &TreeOptions {
		&self.options
	}

	pub fn class_values(&self) -> &[f64] {
		self.class_values
	}

	pub fn n_classes(&self) -> usize {
		self.class_values.len()
	}

	/// The class counts of the training samples that reached the leaf `node_id`, if they are known. The binary and JSON layouts store only the leaf labels, so a reconstructed tree knows them only after `replay_leaf_class_counts`.
	pub fn training_class_counts(&self, node_id: usize) -> Option<&[usize]> {
		self.training_class_counts.get(&node_id).map(Vec::as_slice)
	}

	/// The predicted classes tallied at the leaf `node_id` in the current prediction round.
	pub fn leaf_prediction_counts(&self, node_id: usize) -> Option<&[usize]> {
		self.leaf_class_counts.get(&node_id).map(Vec::as_slice)
	}

	/// The class id of a label, if it is one of the class values.
	pub(crate) fn class_id(&self, label: f64) -> Option<usize> {
		self.class_values.iter().position(|&class_value| class_value == label)
	}

	/// Append a node with no children to the tree and return its id.
	pub(crate) fn create_empty_node_internal(&mut self, depth: usize) -> usize {
		let node_id = self.tree.n_nodes();
		self.tree.child_node_ids.push([crate::LEAF_SENTINEL; 2]);
		self.tree.split_var_ids.push(0);
		self.tree.split_values.push(0.0);
		self.sample_ids.push(Vec::new());
		self.depths.push(depth);
		self.node_n_samples.push(0);
		node_id
	}

	/// Count the classes of the given samples.
	pub(crate) fn class_counts(&self, sample_ids: &[usize]) -> Vec<usize> {
		let mut class_counts = vec![0; self.n_classes()];
		for &sample_id in sample_ids {
			class_counts[self.response_class_ids[sample_id]] += 1;
		}
		class_counts
	}

	/// The true label of a sample, if its class id is valid.
	pub(crate) fn true_label(&self, sample_id: usize) -> Option<f64> {
		let class_id = *self.response_class_ids.get(sample_id)?;
		self.class_values.get(class_id).copied()
	}
}
