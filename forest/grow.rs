use crate::{
	split::{choose_best_split, majority_class_id},
	tree::sends_left,
	ClassificationTree, Data, SplitVariableSampler, TreeError, VariableImportance,
};
use tracing::{debug, trace};

impl<'a> ClassificationTree<'a> {
	/**
	Grow the tree from the samples in `sample_ids`. Samples may appear more than once, as they do in a bootstrap sample.

	Nodes are processed in increasing order of their ids, starting with the root. Each node either becomes a leaf or is split in two, appending its children to the end of the node arrays, until no node remains to be processed. `sampler` supplies the variables each node may split on. If `importance` is `Some`, the impurity decrease of every accepted split is added to it.
	*/
	pub fn grow<D, S>(
		&mut self,
		data: &D,
		sample_ids: &[usize],
		sampler: &mut S,
		importance: Option<&VariableImportance>,
	) -> Result<(), TreeError>
	where
		D: Data + ?Sized,
		S: SplitVariableSampler + ?Sized,
	{
		if self.tree.n_nodes() > 0 {
			return Err(TreeError::AlreadyGrown);
		}
		if sample_ids.is_empty() {
			return Err(TreeError::EmptySample);
		}
		self.check_sample_ids(data, sample_ids)?;
		debug!(
			n_samples = sample_ids.len(),
			n_vars = data.n_cols(),
			n_classes = self.n_classes(),
			"growing classification tree"
		);
		self.n_root_samples = sample_ids.len();
		let root_id = self.create_empty_node_internal(0);
		self.sample_ids[root_id] = sample_ids.to_vec();
		let mut node_id = 0;
		while node_id < self.tree.n_nodes() {
			self.split_node(node_id, data, sampler, importance);
			node_id += 1;
		}
		// The bookkeeping is only needed while growing.
		self.sample_ids = Vec::new();
		self.depths = Vec::new();
		self.node_n_samples = Vec::new();
		debug!(
			n_nodes = self.tree.n_nodes(),
			n_leaves = self.tree.n_leaves(),
			"classification tree grown"
		);
		Ok(())
	}

	/// Make the node a leaf, or split it and route its samples to the two new children.
	fn split_node<D, S>(
		&mut self,
		node_id: usize,
		data: &D,
		sampler: &mut S,
		importance: Option<&VariableImportance>,
	) where
		D: Data + ?Sized,
		S: SplitVariableSampler + ?Sized,
	{
		let sample_ids = std::mem::take(&mut self.sample_ids[node_id]);
		self.node_n_samples[node_id] = sample_ids.len();
		if self.split_node_internal(node_id, &sample_ids, data, sampler, importance) {
			return;
		}
		let var_id = self.tree.split_var_ids[node_id];
		let split_value = self.tree.split_values[node_id];
		let column_type = data.column_type(var_id);
		let depth = self.depths[node_id] + 1;
		let left_child_id = self.create_empty_node_internal(depth);
		let right_child_id = self.create_empty_node_internal(depth);
		self.tree.child_node_ids[node_id] = [left_child_id, right_child_id];
		let (left_sample_ids, right_sample_ids): (Vec<usize>, Vec<usize>) = sample_ids
			.iter()
			.partition(|&&sample_id| sends_left(column_type, data.get(sample_id, var_id), split_value));
		self.sample_ids[left_child_id] = left_sample_ids;
		self.sample_ids[right_child_id] = right_sample_ids;
	}

	/// Decide whether the node is a leaf. Returns `true` if it is, in which case its split value is set to the majority class label. Otherwise the best split has been installed.
	pub(crate) fn split_node_internal<D, S>(
		&mut self,
		node_id: usize,
		sample_ids: &[usize],
		data: &D,
		sampler: &mut S,
		importance: Option<&VariableImportance>,
	) -> bool
	where
		D: Data + ?Sized,
		S: SplitVariableSampler + ?Sized,
	{
		let class_counts = self.class_counts(sample_ids);
		let n_samples = sample_ids.len();
		let min_node_size = self.options.min_node_size.max(1);
		// Neither child of a split could reach the minimum node size.
		let too_small = n_samples < 2 * min_node_size;
		let pure = class_counts.iter().filter(|&&count| count > 0).count() <= 1;
		let too_deep = self
			.options
			.max_depth
			.map_or(false, |max_depth| self.depths[node_id] >= max_depth);
		if too_small || pure || too_deep {
			self.make_leaf(node_id, &class_counts);
			return true;
		}
		let mut candidate_var_ids = sampler.possible_split_var_ids(node_id);
		candidate_var_ids.retain(|&var_id| var_id < data.n_cols());
		candidate_var_ids.sort_unstable();
		candidate_var_ids.dedup();
		if !self.find_best_split(node_id, sample_ids, &class_counts, &candidate_var_ids, data, importance) {
			self.make_leaf(node_id, &class_counts);
			return true;
		}
		false
	}

	/// Find the best split among the candidate variables and install it in the node. Returns `true` if a split with a positive impurity decrease was found.
	pub(crate) fn find_best_split<D: Data + ?Sized>(
		&mut self,
		node_id: usize,
		sample_ids: &[usize],
		class_counts: &[usize],
		candidate_var_ids: &[usize],
		data: &D,
		importance: Option<&VariableImportance>,
	) -> bool {
		let split = match choose_best_split(
			data,
			sample_ids,
			self.response_class_ids,
			class_counts,
			candidate_var_ids,
			self.options.min_node_size.max(1),
		) {
			Some(split) => split,
			None => return false,
		};
		trace!(
			node_id,
			var_id = split.var_id,
			decrease = split.decrease,
			n_left = split.left_class_counts.iter().sum::<usize>(),
			n_right = split.right_class_counts.iter().sum::<usize>(),
			"split node"
		);
		self.tree.split_var_ids[node_id] = split.var_id;
		self.tree.split_values[node_id] = split.rule.split_value();
		if let Some(importance) = importance {
			self.add_gini_importance(importance, node_id, split.var_id, split.decrease);
		}
		true
	}

	fn make_leaf(&mut self, node_id: usize, class_counts: &[usize]) {
		self.tree.split_var_ids[node_id] = 0;
		self.tree.split_values[node_id] = self.class_values[majority_class_id(class_counts)];
		self.training_class_counts.insert(node_id, class_counts.to_vec());
	}
}

#[cfg(test)]
fn informative_and_constant_data() -> (crate::DataMatrix, Vec<usize>) {
	use ndarray::prelude::*;
	// Feature 0 determines the class, feature 1 is constant.
	let values = arr2(&[
		[0.0, 1.0],
		[0.0, 1.0],
		[0.0, 1.0],
		[1.0, 1.0],
		[1.0, 1.0],
		[1.0, 1.0],
	]);
	let data = crate::DataMatrix::numeric(values).unwrap();
	(data, vec![0, 0, 0, 1, 1, 1])
}

#[test]
fn test_grow_single_split() {
	use crate::TreeOptions;
	let (data, response_class_ids) = informative_and_constant_data();
	let class_values = vec![0.0, 1.0];
	let mut tree = ClassificationTree::new(&class_values, &response_class_ids, TreeOptions::default());
	let sample_ids: Vec<usize> = (0..6).collect();
	let importance = VariableImportance::new(2);
	tree.grow(&data, &sample_ids, &mut |_: usize| vec![0, 1], Some(&importance))
		.unwrap();
	assert_eq!(tree.tree().child_node_ids(), &[[1, 2], [0, 0], [0, 0]]);
	assert_eq!(tree.tree().split_var_ids(), &[0, 0, 0]);
	assert_eq!(tree.tree().split_values(), &[0.5, 0.0, 1.0]);
	assert_eq!(importance.values(), vec![0.5, 0.0]);
}

#[test]
fn test_pure_root_skips_split_search() {
	use crate::TreeOptions;
	let (data, _) = informative_and_constant_data();
	let response_class_ids = vec![1; 6];
	let class_values = vec![0.0, 1.0];
	let mut tree = ClassificationTree::new(&class_values, &response_class_ids, TreeOptions::default());
	let mut n_draws = 0;
	let mut sampler = |_: usize| {
		n_draws += 1;
		vec![0, 1]
	};
	tree.grow(&data, &[0, 1, 2, 3, 4, 5], &mut sampler, None).unwrap();
	assert_eq!(n_draws, 0);
	assert_eq!(tree.tree().n_nodes(), 1);
	assert_eq!(tree.tree().split_values(), &[1.0]);
}

#[test]
fn test_constant_candidates_make_a_leaf() {
	use crate::TreeOptions;
	let (data, response_class_ids) = informative_and_constant_data();
	let class_values = vec![0.0, 1.0];
	let mut tree = ClassificationTree::new(&class_values, &response_class_ids, TreeOptions::default());
	// Only the constant feature is offered, so no split decreases the impurity.
	tree.grow(&data, &[0, 1, 3, 4, 5], &mut |_: usize| vec![1], None)
		.unwrap();
	assert_eq!(tree.tree().n_nodes(), 1);
	assert_eq!(tree.tree().split_values(), &[1.0]);
}

#[test]
fn test_max_depth_and_min_node_size() {
	use crate::TreeOptions;
	let (data, response_class_ids) = informative_and_constant_data();
	let class_values = vec![0.0, 1.0];
	let sample_ids: Vec<usize> = (0..6).collect();
	let options = TreeOptions {
		max_depth: Some(0),
		..Default::default()
	};
	let mut tree = ClassificationTree::new(&class_values, &response_class_ids, options);
	tree.grow(&data, &sample_ids, &mut |_: usize| vec![0], None).unwrap();
	assert_eq!(tree.tree().n_nodes(), 1);
	// Ties between classes go to the lowest class id.
	assert_eq!(tree.tree().split_values(), &[0.0]);
	let options = TreeOptions {
		min_node_size: 4,
		..Default::default()
	};
	let mut tree = ClassificationTree::new(&class_values, &response_class_ids, options);
	tree.grow(&data, &sample_ids, &mut |_: usize| vec![0], None).unwrap();
	assert_eq!(tree.tree().n_nodes(), 1);
}

#[test]
fn test_grow_rejects_bad_samples() {
	use crate::TreeOptions;
	let (data, response_class_ids) = informative_and_constant_data();
	let class_values = vec![0.0, 1.0];
	let mut tree = ClassificationTree::new(&class_values, &response_class_ids, TreeOptions::default());
	let error = tree.grow(&data, &[0, 9], &mut |_: usize| vec![0], None).unwrap_err();
	assert!(matches!(error, TreeError::SampleOutOfRange { sample_id: 9, .. }));
	let error = tree.grow(&data, &[], &mut |_: usize| vec![0], None).unwrap_err();
	assert!(matches!(error, TreeError::EmptySample));
	tree.grow(&data, &[0, 3], &mut |_: usize| vec![0], None).unwrap();
	let error = tree.grow(&data, &[0, 3], &mut |_: usize| vec![0], None).unwrap_err();
	assert!(matches!(error, TreeError::AlreadyGrown));
}
