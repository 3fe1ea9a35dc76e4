use crate::{ClassificationTree, Data, EstimateMode, TreeError};
use num_traits::ToPrimitive;

/// The estimate for a leaf returned by `ClassificationTree::estimate`.
#[derive(Clone, Debug, PartialEq)]
pub enum Estimate {
	/// The label of the most frequent class.
	Class(f64),
	/// The proportion of each class, in the order of the class values.
	Probabilities(Vec<f64>),
}

/// The accuracy is the proportion of samples where the predicted label equals the true label.
#[derive(Clone, Debug, Default)]
pub struct Accuracy {
	n_correct: usize,
	n_samples: usize,
}

impl Accuracy {
	pub fn new() -> Self {
		Self::default()
	}

	/// Update the accuracy with a `(predicted, label)` pair.
	pub fn update(&mut self, value: (f64, f64)) {
		if value.0 == value.1 {
			self.n_correct += 1;
		}
		self.n_samples += 1;
	}

	/// Merge an accuracy computed on a separate set of samples.
	pub fn merge(&mut self, other: Self) {
		self.n_correct += other.n_correct;
		self.n_samples += other.n_samples;
	}

	/// The accuracy, or `None` if no samples were seen.
	pub fn finalize(self) -> Option<f64> {
		if self.n_samples == 0 {
			None
		} else {
			Some(self.n_correct.to_f64().unwrap() / self.n_samples.to_f64().unwrap())
		}
	}
}

impl<'a> ClassificationTree<'a> {
	/// Start a new prediction round for up to `num_predictions` samples, discarding the previous round's leaf tallies and predictions.
	pub fn reserve_prediction_memory(&mut self, num_predictions: usize) {
		self.leaf_class_counts.clear();
		self.predictions.clear();
		self.predictions.resize(num_predictions, f64::NAN);
	}

	/// Record that the sample `sample_id` was sent to the leaf `node_id`. The sample is predicted to have the leaf's label, and the leaf's tally for that label's class is incremented.
	pub fn add_prediction(&mut self, node_id: usize, sample_id: usize) {
		if sample_id >= self.predictions.len() {
			self.predictions.resize(sample_id + 1, f64::NAN);
		}
		let label = self.tree.split_values[node_id];
		self.predictions[sample_id] = label;
		let n_classes = self.n_classes();
		if let Some(class_id) = self.class_id(label) {
			self.leaf_class_counts
				.entry(node_id)
				.or_insert_with(|| vec![0; n_classes])[class_id] += 1;
		}
	}

	/**
	The estimate for the leaf `node_id`.

	In majority mode this is the leaf's label, the same label `predict` returns for every sample sent to the leaf. In probability mode this is the class distribution of the training samples that reached the leaf. A leaf whose training class counts are unknown, such as a leaf of a reconstructed tree before `replay_leaf_class_counts`, reports all of its probability on its label.
	*/
	pub fn estimate(&self, node_id: usize) -> Estimate {
		let label = self.tree.split_values[node_id];
		match self.options.estimate_mode {
			EstimateMode::Majority => Estimate::Class(label),
			EstimateMode::Probability => {
				let class_counts = self
					.training_class_counts
					.get(&node_id)
					.filter(|class_counts| class_counts.iter().any(|&count| count > 0));
				match class_counts {
					Some(class_counts) => {
						let n_samples = class_counts.iter().sum::<usize>().to_f64().unwrap();
						Estimate::Probabilities(
							class_counts
								.iter()
								.map(|&count| count.to_f64().unwrap() / n_samples)
								.collect(),
						)
					}
					None => Estimate::Probabilities(
						self.class_values
							.iter()
							.map(|&class_value| if class_value == label { 1.0 } else { 0.0 })
							.collect(),
					),
				}
			}
		}
	}

	/// Recompute the training class counts of every leaf by sending the samples the tree was grown from down the tree. Replaying a tree's in-bag samples restores exactly the counts `grow` recorded.
	pub fn replay_leaf_class_counts<D: Data + ?Sized>(
		&mut self,
		data: &D,
		sample_ids: &[usize],
	) -> Result<(), TreeError> {
		self.check_sample_ids(data, sample_ids)?;
		self.training_class_counts.clear();
		if self.tree.n_nodes() == 0 {
			return Ok(());
		}
		let n_classes = self.n_classes();
		for &sample_id in sample_ids {
			let node_id = self.tree.find_leaf(data, sample_id);
			let class_id = self.response_class_ids[sample_id];
			self.training_class_counts
				.entry(node_id)
				.or_insert_with(|| vec![0; n_classes])[class_id] += 1;
		}
		Ok(())
	}

	/// Find the leaf that the sample at `sample_id` is sent to.
	pub fn find_leaf<D: Data + ?Sized>(&self, data: &D, sample_id: usize) -> usize {
		self.tree.find_leaf(data, sample_id)
	}

	/// Run a prediction round over `sample_ids` and return the predicted label of each.
	pub fn predict<D: Data + ?Sized>(&mut self, data: &D, sample_ids: &[usize]) -> Vec<f64> {
		self.reserve_prediction_memory(data.n_rows());
		for &sample_id in sample_ids {
			let node_id = self.find_leaf(data, sample_id);
			self.add_prediction(node_id, sample_id);
		}
		sample_ids
			.iter()
			.map(|&sample_id| self.predictions[sample_id])
			.collect()
	}

	/// The predicted label of a sample in the current round, if it was predicted.
	pub fn prediction(&self, sample_id: usize) -> Option<f64> {
		self.predictions
			.get(sample_id)
			.copied()
			.filter(|prediction| !prediction.is_nan())
	}

	/// The fraction of samples predicted in the current round whose predicted label equals their true label, or `None` if no samples were predicted.
	pub fn compute_prediction_accuracy_internal(&self) -> Option<f64> {
		let mut accuracy = Accuracy::new();
		for (sample_id, &prediction) in self.predictions.iter().enumerate() {
			if prediction.is_nan() {
				continue;
			}
			if let Some(label) = self.true_label(sample_id) {
				accuracy.update((prediction, label));
			}
		}
		accuracy.finalize()
	}
}

#[cfg(test)]
fn grown_tree<'a>(
	data: &crate::DataMatrix,
	class_values: &'a [f64],
	response_class_ids: &'a [usize],
	estimate_mode: EstimateMode,
) -> ClassificationTree<'a> {
	let options = crate::TreeOptions {
		estimate_mode,
		..Default::default()
	};
	let mut tree = ClassificationTree::new(class_values, response_class_ids, options);
	let sample_ids: Vec<usize> = (0..data.n_rows()).collect();
	tree.grow(data, &sample_ids, &mut |_: usize| vec![0], None).unwrap();
	tree
}

#[cfg(test)]
fn threshold_data() -> crate::DataMatrix {
	use ndarray::prelude::*;
	crate::DataMatrix::numeric(arr2(&[[1.0], [2.0], [3.0], [7.0], [8.0], [9.0]])).unwrap()
}

#[test]
fn test_predict_and_accuracy() {
	let data = threshold_data();
	let class_values = vec![10.0, 20.0];
	let response_class_ids = vec![0, 0, 0, 1, 1, 1];
	let mut tree = grown_tree(&data, &class_values, &response_class_ids, EstimateMode::Majority);
	assert_eq!(tree.predict(&data, &[0, 5]), vec![10.0, 20.0]);
	assert_eq!(tree.prediction(0), Some(10.0));
	assert_eq!(tree.prediction(3), None);
	assert_eq!(tree.compute_prediction_accuracy_internal(), Some(1.0));
	tree.reserve_prediction_memory(6);
	assert_eq!(tree.compute_prediction_accuracy_internal(), None);
}

#[test]
fn test_estimate_agrees_with_predict() {
	let data = threshold_data();
	let class_values = vec![0.0, 1.0];
	let response_class_ids = vec![0, 0, 0, 1, 1, 1];
	let tree = grown_tree(&data, &class_values, &response_class_ids, EstimateMode::Majority);
	// Predict the grown tree on samples whose labels disagree with the leaves.
	let evaluation_class_ids = vec![1, 1, 0, 1, 0, 0];
	let mut evaluation = ClassificationTree::from_tree(
		tree.into_tree(),
		&class_values,
		&evaluation_class_ids,
		Default::default(),
	);
	let predictions = evaluation.predict(&data, &[0, 1, 2, 3, 4, 5]);
	assert_eq!(predictions, vec![0.0, 0.0, 0.0, 1.0, 1.0, 1.0]);
	let left_leaf = evaluation.find_leaf(&data, 0);
	let right_leaf = evaluation.find_leaf(&data, 5);
	assert_eq!(evaluation.estimate(left_leaf), Estimate::Class(0.0));
	assert_eq!(evaluation.estimate(right_leaf), Estimate::Class(1.0));
	assert_eq!(evaluation.estimate(left_leaf), evaluation.estimate(left_leaf));
	// The tallies count predicted classes, not the evaluation labels.
	assert_eq!(evaluation.leaf_prediction_counts(left_leaf), Some(&[3, 0][..]));
	assert_eq!(evaluation.leaf_prediction_counts(right_leaf), Some(&[0, 3][..]));
	assert_eq!(evaluation.compute_prediction_accuracy_internal(), Some(2.0 / 6.0));
	evaluation.reserve_prediction_memory(6);
	assert_eq!(evaluation.leaf_prediction_counts(left_leaf), None);
	assert_eq!(evaluation.estimate(left_leaf), Estimate::Class(0.0));
}

#[test]
fn test_probability_estimate_uses_training_distribution() {
	use ndarray::prelude::*;
	// A constant feature leaves the root impure: three samples of class 0 and one of class 1.
	let data = crate::DataMatrix::numeric(arr2(&[[1.0], [1.0], [1.0], [1.0]])).unwrap();
	let class_values = vec![0.0, 1.0];
	let response_class_ids = vec![0, 0, 0, 1];
	let mut tree = grown_tree(&data, &class_values, &response_class_ids, EstimateMode::Probability);
	assert_eq!(tree.tree().n_nodes(), 1);
	assert_eq!(tree.training_class_counts(0), Some(&[3, 1][..]));
	assert_eq!(tree.estimate(0), Estimate::Probabilities(vec![0.75, 0.25]));
	// Rows the tree has never seen do not change the estimate.
	let new_rows = crate::DataMatrix::numeric(arr2(&[[5.0], [-2.0]])).unwrap();
	assert_eq!(tree.predict(&new_rows, &[0, 1]), vec![0.0, 0.0]);
	assert_eq!(tree.estimate(0), Estimate::Probabilities(vec![0.75, 0.25]));
	// Neither do evaluation labels that all disagree with the leaf.
	let options = crate::TreeOptions {
		estimate_mode: EstimateMode::Probability,
		..Default::default()
	};
	let evaluation_class_ids = vec![1, 1, 1, 1];
	let mut evaluation =
		ClassificationTree::from_tree(tree.tree().clone(), &class_values, &evaluation_class_ids, options.clone());
	assert_eq!(evaluation.predict(&data, &[0, 1, 2, 3]), vec![0.0; 4]);
	assert_eq!(evaluation.estimate(0), Estimate::Probabilities(vec![1.0, 0.0]));
	let majority = ClassificationTree::from_tree(
		tree.tree().clone(),
		&class_values,
		&evaluation_class_ids,
		Default::default(),
	);
	assert_eq!(majority.estimate(0), Estimate::Class(0.0));
	// A reconstructed tree recovers the training distribution from its in-bag samples.
	let mut reconstructed =
		ClassificationTree::from_tree(tree.into_tree(), &class_values, &response_class_ids, options);
	reconstructed.replay_leaf_class_counts(&data, &[0, 1, 2, 3]).unwrap();
	assert_eq!(reconstructed.estimate(0), Estimate::Probabilities(vec![0.75, 0.25]));
}

#[test]
fn test_replay_leaf_class_counts_matches_grow() {
	let data = threshold_data();
	let class_values = vec![0.0, 1.0];
	let response_class_ids = vec![0, 0, 0, 1, 1, 1];
	let sample_ids = [0, 0, 2, 3, 5, 5];
	let options = crate::TreeOptions {
		estimate_mode: EstimateMode::Probability,
		..Default::default()
	};
	let mut tree = ClassificationTree::new(&class_values, &response_class_ids, options.clone());
	tree.grow(&data, &sample_ids, &mut |_: usize| vec![0], None).unwrap();
	let mut reconstructed =
		ClassificationTree::from_tree(tree.tree().clone(), &class_values, &response_class_ids, options);
	let left_leaf = tree.find_leaf(&data, 0);
	assert_eq!(reconstructed.training_class_counts(left_leaf), None);
	assert_eq!(reconstructed.estimate(left_leaf), Estimate::Probabilities(vec![1.0, 0.0]));
	reconstructed.replay_leaf_class_counts(&data, &sample_ids).unwrap();
	for node_id in 0..tree.tree().n_nodes() {
		assert_eq!(reconstructed.training_class_counts(node_id), tree.training_class_counts(node_id));
	}
	let error = reconstructed.replay_leaf_class_counts(&data, &[7]).unwrap_err();
	assert!(matches!(error, TreeError::SampleOutOfRange { sample_id: 7, .. }));
}

#[test]
fn test_accuracy_merge() {
	let mut a = Accuracy::new();
	a.update((1.0, 1.0));
	a.update((0.0, 1.0));
	let mut b = Accuracy::new();
	b.update((2.0, 2.0));
	b.update((2.0, 2.0));
	a.merge(b);
	assert_eq!(a.finalize(), Some(0.75));
}
