use crate::{split::gini_decrease, tree::sends_left, ClassificationTree, Data, TreeError};
use itertools::izip;
use num_traits::ToPrimitive;
use std::{
	collections::VecDeque,
	sync::atomic::{AtomicU64, Ordering},
};

/// An `ImportanceScaling` controls how the impurity decrease of a split is weighted before it is added to the Gini importance.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum ImportanceScaling {
	/// Add the decrease as it is.
	Unscaled,
	/// Multiply the decrease by the fraction of the tree's samples that reached the node.
	NodeFraction,
}

/**
A `VariableImportance` accumulates one importance value per variable. It is shared by every tree of a forest. Each slot is an `f64` stored as its bit pattern in an `AtomicU64` and updated with a compare and swap loop, so trees grown on different threads add to it without a lock.
*/
pub struct VariableImportance {
	slots: Vec<AtomicU64>,
}

impl VariableImportance {
	pub fn new(n_vars: usize) -> Self {
		Self {
			slots: (0..n_vars).map(|_| AtomicU64::new(0.0f64.to_bits())).collect(),
		}
	}

	pub fn len(&self) -> usize {
		self.slots.len()
	}

	pub fn is_empty(&self) -> bool {
		self.slots.is_empty()
	}

	/// Add `value` to the importance of `var_id`.
	pub fn add(&self, var_id: usize, value: f64) {
		let slot = match self.slots.get(var_id) {
			Some(slot) => slot,
			None => {
				tracing::warn!(var_id, n_vars = self.len(), "importance for unknown variable");
				return;
			}
		};
		let mut current = slot.load(Ordering::Relaxed);
		loop {
			let next = (f64::from_bits(current) + value).to_bits();
			match slot.compare_exchange_weak(current, next, Ordering::Relaxed, Ordering::Relaxed) {
				Ok(_) => break,
				Err(actual) => current = actual,
			}
		}
	}

	/// Add `values[var_id]` to the importance of every variable.
	pub fn add_all(&self, values: &[f64]) {
		for (var_id, &value) in values.iter().enumerate() {
			self.add(var_id, value);
		}
	}

	/// A snapshot of the accumulated importances.
	pub fn values(&self) -> Vec<f64> {
		self.slots
			.iter()
			.map(|slot| f64::from_bits(slot.load(Ordering::Relaxed)))
			.collect()
	}

	/// The accumulated importances scaled to sum to one. If they sum to zero, they are returned unchanged.
	pub fn normalized(&self) -> Vec<f64> {
		let mut values = self.values();
		let total = values.iter().sum::<f64>();
		if total != 0.0 {
			for value in values.iter_mut() {
				*value /= total;
			}
		}
		values
	}
}

impl std::fmt::Debug for VariableImportance {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "{:?}", self.values())
	}
}

fn scale_decrease(scaling: ImportanceScaling, n_node_samples: usize, n_root_samples: usize, decrease: f64) -> f64 {
	match scaling {
		ImportanceScaling::Unscaled => decrease,
		ImportanceScaling::NodeFraction => {
			decrease * (n_node_samples.to_f64().unwrap() / n_root_samples.to_f64().unwrap())
		}
	}
}

impl<'a> ClassificationTree<'a> {
	/// Add the impurity decrease of the split at `node_id` to the importance of `var_id`. This is called by `grow` for every accepted split.
	pub(crate) fn add_gini_importance(
		&self,
		importance: &VariableImportance,
		node_id: usize,
		var_id: usize,
		decrease: f64,
	) {
		let value = scale_decrease(
			self.options.importance_scaling,
			self.node_n_samples[node_id],
			self.n_root_samples,
			decrease,
		);
		importance.add(var_id, value);
	}

	/**
	Route `sample_ids` through the finished tree and add the impurity decrease of every split to `importance`.

	For the tree grown from `sample_ids`, this adds exactly what `grow` added, so the Gini importance of a tree reconstructed with `load` can be recovered from its in-bag samples. Branches that receive no samples contribute nothing.
	*/
	pub fn replay_gini_importance<D: Data + ?Sized>(
		&self,
		data: &D,
		sample_ids: &[usize],
		importance: &VariableImportance,
	) -> Result<(), TreeError> {
		if self.tree.n_nodes() == 0 || sample_ids.is_empty() {
			return Ok(());
		}
		self.check_sample_ids(data, sample_ids)?;
		let n_root_samples = sample_ids.len();
		let mut queue = VecDeque::new();
		queue.push_back((0, sample_ids.to_vec()));
		while let Some((node_id, node_sample_ids)) = queue.pop_front() {
			if self.tree.is_leaf(node_id) || node_sample_ids.is_empty() {
				continue;
			}
			let var_id = self.tree.split_var_ids[node_id];
			let split_value = self.tree.split_values[node_id];
			let column_type = data.column_type(var_id);
			let (left_sample_ids, right_sample_ids): (Vec<usize>, Vec<usize>) = node_sample_ids
				.iter()
				.partition(|&&sample_id| sends_left(column_type, data.get(sample_id, var_id), split_value));
			let class_counts = self.class_counts(&node_sample_ids);
			let left_class_counts = self.class_counts(&left_sample_ids);
			let decrease = gini_decrease(&class_counts, &left_class_counts);
			let value = scale_decrease(
				self.options.importance_scaling,
				node_sample_ids.len(),
				n_root_samples,
				decrease,
			);
			importance.add(var_id, value);
			let [left_child_id, right_child_id] = self.tree.child_node_ids[node_id];
			queue.push_back((left_child_id, left_sample_ids));
			queue.push_back((right_child_id, right_sample_ids));
		}
		Ok(())
	}

	/**
	Compute the permutation importance of every variable on the out-of-bag samples.

	`permutations[var_id]` is a permutation of the positions `0..oob_sample_ids.len()`. The sample at position `i` is predicted with its value for `var_id` taken from the sample at position `permutations[var_id][i]`. An empty permutation skips the variable, whose importance is then 0. The returned value for each variable is the baseline accuracy minus the accuracy with the variable permuted.

	The tree's structure is not changed, but its prediction memory is overwritten.
	*/
	pub fn compute_permutation_importance_internal<D: Data + ?Sized>(
		&mut self,
		data: &D,
		oob_sample_ids: &[usize],
		permutations: &[Vec<usize>],
	) -> Result<Vec<f64>, TreeError> {
		let n_oob = oob_sample_ids.len();
		self.check_sample_ids(data, oob_sample_ids)?;
		for (var_id, permutation) in permutations.iter().enumerate() {
			if permutation.is_empty() {
				continue;
			}
			if permutation.len() != n_oob {
				return Err(TreeError::PermutationLength {
					var_id,
					expected: n_oob,
					got: permutation.len(),
				});
			}
			if let Some(&position) = permutation.iter().find(|&&position| position >= n_oob) {
				return Err(TreeError::PermutationOutOfRange {
					var_id,
					position,
					n_oob,
				});
			}
		}
		let mut importances = vec![0.0; permutations.len()];
		if n_oob == 0 || self.tree.n_nodes() == 0 {
			return Ok(importances);
		}
		self.predict(data, oob_sample_ids);
		let baseline = self.compute_prediction_accuracy_internal().unwrap_or(0.0);
		for (var_id, (importance, permutation)) in importances.iter_mut().zip(permutations).enumerate() {
			if permutation.is_empty() {
				continue;
			}
			self.reserve_prediction_memory(data.n_rows());
			for (&sample_id, &position) in izip!(oob_sample_ids, permutation) {
				let permuted_sample_id = oob_sample_ids[position];
				let node_id = self.tree.find_leaf_with(data, |col| {
					if col == var_id {
						data.get(permuted_sample_id, col)
					} else {
						data.get(sample_id, col)
					}
				});
				self.add_prediction(node_id, sample_id);
			}
			let permuted = self.compute_prediction_accuracy_internal().unwrap_or(0.0);
			*importance = baseline - permuted;
		}
		Ok(importances)
	}

	/// Compute the permutation importance of the tree and add it to `importance`. Returns the tree's own contribution.
	pub fn add_permutation_importance<D: Data + ?Sized>(
		&mut self,
		data: &D,
		oob_sample_ids: &[usize],
		permutations: &[Vec<usize>],
		importance: &VariableImportance,
	) -> Result<Vec<f64>, TreeError> {
		let importances = self.compute_permutation_importance_internal(data, oob_sample_ids, permutations)?;
		importance.add_all(&importances);
		Ok(importances)
	}

	pub(crate) fn check_sample_ids<D: Data + ?Sized>(&self, data: &D, sample_ids: &[usize]) -> Result<(), TreeError> {
		for &sample_id in sample_ids {
			if sample_id >= data.n_rows() || sample_id >= self.response_class_ids.len() {
				return Err(TreeError::SampleOutOfRange {
					sample_id,
					n_rows: data.n_rows(),
					n_responses: self.response_class_ids.len(),
				});
			}
			let class_id = self.response_class_ids[sample_id];
			if class_id >= self.n_classes() {
				return Err(TreeError::ClassOutOfRange {
					sample_id,
					class_id,
					n_classes: self.n_classes(),
				});
			}
		}
		Ok(())
	}
}

#[cfg(test)]
fn predictive_and_noise_data() -> (crate::DataMatrix, Vec<usize>) {
	use ndarray::prelude::*;
	// Feature 0 determines the class, feature 1 alternates regardless of it.
	let mut values = Array2::zeros((8, 2));
	let mut response_class_ids = Vec::new();
	for row in 0..8 {
		values[[row, 0]] = row as f64;
		values[[row, 1]] = (row % 2) as f64;
		response_class_ids.push(if row < 4 { 0 } else { 1 });
	}
	(crate::DataMatrix::numeric(values).unwrap(), response_class_ids)
}

#[test]
fn test_variable_importance_accumulates() {
	let importance = VariableImportance::new(3);
	importance.add(0, 1.5);
	importance.add(0, 0.5);
	importance.add(2, 2.0);
	importance.add(7, 1.0);
	assert_eq!(importance.values(), vec![2.0, 0.0, 2.0]);
	assert_eq!(importance.normalized(), vec![0.5, 0.0, 0.5]);
	assert_eq!(VariableImportance::new(2).normalized(), vec![0.0, 0.0]);
}

#[test]
fn test_variable_importance_is_shared_across_threads() {
	let importance = VariableImportance::new(1);
	std::thread::scope(|scope| {
		for _ in 0..4 {
			scope.spawn(|| {
				for _ in 0..1000 {
					importance.add(0, 1.0);
				}
			});
		}
	});
	assert_eq!(importance.values(), vec![4000.0]);
}

#[test]
fn test_scale_decrease() {
	assert_eq!(scale_decrease(ImportanceScaling::Unscaled, 2, 8, 0.5), 0.5);
	assert_eq!(scale_decrease(ImportanceScaling::NodeFraction, 2, 8, 0.5), 0.125);
}

#[test]
fn test_replay_matches_grow() {
	let (data, response_class_ids) = predictive_and_noise_data();
	let class_values = vec![0.0, 1.0];
	let sample_ids = vec![0, 1, 1, 2, 3, 4, 5, 6, 6, 7];
	let grown = VariableImportance::new(2);
	let mut tree = ClassificationTree::new(&class_values, &response_class_ids, Default::default());
	tree.grow(&data, &sample_ids, &mut |_: usize| vec![0, 1], Some(&grown))
		.unwrap();
	let replayed = VariableImportance::new(2);
	tree.replay_gini_importance(&data, &sample_ids, &replayed).unwrap();
	assert_eq!(grown.values(), replayed.values());
	assert!(grown.values()[0] > 0.0);
	assert_eq!(grown.values()[1], 0.0);
}

#[test]
fn test_permutation_importance() {
	let (data, response_class_ids) = predictive_and_noise_data();
	let class_values = vec![0.0, 1.0];
	let mut tree = ClassificationTree::new(&class_values, &response_class_ids, Default::default());
	tree.grow(&data, &[0, 1, 2, 3, 4, 5, 6, 7], &mut |_: usize| vec![0], None)
		.unwrap();
	let oob_sample_ids = vec![0, 1, 6, 7];
	// Swap the first and last samples, which have different classes.
	let permutations = vec![vec![3, 1, 2, 0], vec![1, 0, 3, 2]];
	let importance = VariableImportance::new(2);
	let importances = tree
		.add_permutation_importance(&data, &oob_sample_ids, &permutations, &importance)
		.unwrap();
	assert_eq!(importances, vec![0.5, 0.0]);
	assert_eq!(importance.values(), vec![0.5, 0.0]);
	// An empty permutation skips the variable.
	let importances = tree
		.compute_permutation_importance_internal(&data, &oob_sample_ids, &[vec![], vec![1, 0, 3, 2]])
		.unwrap();
	assert_eq!(importances, vec![0.0, 0.0]);
}

#[test]
fn test_permutation_importance_rejects_bad_permutations() {
	let (data, response_class_ids) = predictive_and_noise_data();
	let class_values = vec![0.0, 1.0];
	let mut tree = ClassificationTree::new(&class_values, &response_class_ids, Default::default());
	tree.grow(&data, &[0, 1, 2, 3, 4, 5, 6, 7], &mut |_: usize| vec![0], None)
		.unwrap();
	let error = tree
		.compute_permutation_importance_internal(&data, &[0, 1], &[vec![0]])
		.unwrap_err();
	assert!(matches!(
		error,
		TreeError::PermutationLength {
			var_id: 0,
			expected: 2,
			got: 1,
		}
	));
	let error = tree
		.compute_permutation_importance_internal(&data, &[0, 1], &[vec![0, 2]])
		.unwrap_err();
	assert!(matches!(error, TreeError::PermutationOutOfRange { position: 2, .. }));
}
