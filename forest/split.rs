use crate::{ColumnType, Data, MAX_CATEGORICAL_LEVELS};
use num_traits::ToPrimitive;

/// A candidate split must beat the best split so far by more than this to replace it, and must decrease the impurity by more than this to be accepted at all.
pub const SPLIT_TOLERANCE: f64 = 1e-12;

/// Categorical variables with at most this many levels observed at a node are split by trying every bipartition of the levels. Above it, levels are sorted and only the prefixes of the sorted order are tried.
pub const MAX_LEVELS_FOR_EXHAUSTIVE_SEARCH: usize = 10;

/// A `SplitRule` describes how samples at a node are sent to its left or right child.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum SplitRule {
	/// Samples with a value less than `threshold` are sent left.
	Number { threshold: f64 },
	/// Samples whose level's bit is set in `left_levels` are sent left.
	Categorical { left_levels: u64 },
}

impl SplitRule {
	/// The value stored in the tree's `split_values` for this rule.
	pub fn split_value(&self) -> f64 {
		match self {
			SplitRule::Number { threshold } => *threshold,
			SplitRule::Categorical { left_levels } => *left_levels as f64,
		}
	}
}

#[derive(Clone, Debug)]
pub struct ChooseBestSplitOutput {
	pub var_id: usize,
	pub rule: SplitRule,
	pub decrease: f64,
	pub left_class_counts: Vec<usize>,
	pub right_class_counts: Vec<usize>,
}

/// The Gini impurity of a node with the given class counts, `1 - Σ p_c²`. An empty node has impurity 0.
pub fn gini(class_counts: &[usize]) -> f64 {
	let n = class_counts.iter().sum::<usize>();
	if n == 0 {
		return 0.0;
	}
	let n = n.to_f64().unwrap();
	let sum_squares = class_counts
		.iter()
		.map(|&count| {
			let p = count.to_f64().unwrap() / n;
			p * p
		})
		.sum::<f64>();
	1.0 - sum_squares
}

/// The impurity decrease of splitting a node with `parent_class_counts` so that `left_class_counts` go left and the rest go right: `gini(parent) - (n_left / n) * gini(left) - (n_right / n) * gini(right)`.
pub fn gini_decrease(parent_class_counts: &[usize], left_class_counts: &[usize]) -> f64 {
	let right_class_counts: Vec<usize> = parent_class_counts
		.iter()
		.zip(left_class_counts)
		.map(|(parent, left)| parent - left)
		.collect();
	let n = parent_class_counts.iter().sum::<usize>().to_f64().unwrap();
	let n_left = left_class_counts.iter().sum::<usize>().to_f64().unwrap();
	let n_right = right_class_counts.iter().sum::<usize>().to_f64().unwrap();
	gini(parent_class_counts)
		- (n_left / n) * gini(left_class_counts)
		- (n_right / n) * gini(&right_class_counts)
}

/// Find the split with the highest impurity decrease across the candidate variables, if a valid one exists. `candidate_var_ids` must be sorted: when two splits are within `SPLIT_TOLERANCE` of each other, the one found first wins, so ties go to the lowest variable id and then to the first threshold or subset enumerated.
#[allow(clippy::too_many_arguments)]
pub fn choose_best_split<D: Data + ?Sized>(
	data: &D,
	sample_ids: &[usize],
	response_class_ids: &[usize],
	parent_class_counts: &[usize],
	candidate_var_ids: &[usize],
	min_node_size: usize,
) -> Option<ChooseBestSplitOutput> {
	let mut best_split_so_far: Option<ChooseBestSplitOutput> = None;
	for &var_id in candidate_var_ids {
		let split = match data.column_type(var_id) {
			ColumnType::Number => find_best_number_split_for_variable(
				data,
				var_id,
				sample_ids,
				response_class_ids,
				parent_class_counts,
				min_node_size,
			),
			ColumnType::Categorical { n_levels } => find_best_categorical_split_for_variable(
				data,
				var_id,
				n_levels,
				sample_ids,
				response_class_ids,
				parent_class_counts,
				min_node_size,
			),
		};
		match split {
			Some(split) if improves(split.decrease, best_split_so_far.as_ref()) => {
				best_split_so_far = Some(split);
			}
			Some(_) => {}
			None => {
				tracing::trace!(var_id, "variable has no admissible split");
			}
		}
	}
	best_split_so_far
}

fn improves(decrease: f64, best_split_so_far: Option<&ChooseBestSplitOutput>) -> bool {
	match best_split_so_far {
		Some(best_split_so_far) => decrease > best_split_so_far.decrease + SPLIT_TOLERANCE,
		None => decrease > SPLIT_TOLERANCE,
	}
}

/// Try a threshold between every pair of consecutive distinct values of a number variable.
fn find_best_number_split_for_variable<D: Data + ?Sized>(
	data: &D,
	var_id: usize,
	sample_ids: &[usize],
	response_class_ids: &[usize],
	parent_class_counts: &[usize],
	min_node_size: usize,
) -> Option<ChooseBestSplitOutput> {
	let mut values: Vec<(f64, usize)> = sample_ids
		.iter()
		.map(|&sample_id| (data.get(sample_id, var_id), response_class_ids[sample_id]))
		.collect();
	values.sort_by(|(a, _), (b, _)| a.total_cmp(b));
	let n_samples = values.len();
	let mut best_split_so_far: Option<ChooseBestSplitOutput> = None;
	let mut left_class_counts = vec![0; parent_class_counts.len()];
	for index in 0..n_samples.saturating_sub(1) {
		let (value, class_id) = values[index];
		left_class_counts[class_id] += 1;
		let next_value = values[index + 1].0;
		// Only split between distinct values.
		if value == next_value {
			continue;
		}
		let n_left = index + 1;
		let n_right = n_samples - n_left;
		if n_left < min_node_size {
			continue;
		}
		// The right child only shrinks from here on.
		if n_right < min_node_size {
			break;
		}
		let decrease = gini_decrease(parent_class_counts, &left_class_counts);
		if improves(decrease, best_split_so_far.as_ref()) {
			best_split_so_far = Some(ChooseBestSplitOutput {
				var_id,
				rule: SplitRule::Number {
					threshold: threshold_between(value, next_value),
				},
				decrease,
				left_class_counts: left_class_counts.clone(),
				right_class_counts: subtract(parent_class_counts, &left_class_counts),
			});
		}
	}
	best_split_so_far
}

/// The midpoint of two consecutive values, moved to `upper` if rounding would put it at or below `lower`. This keeps `lower < threshold <= upper`, so a value-less-than-threshold test sends exactly the values up to `lower` left.
fn threshold_between(lower: f64, upper: f64) -> f64 {
	let mut midpoint = (lower + upper) / 2.0;
	if !midpoint.is_finite() {
		midpoint = lower / 2.0 + upper / 2.0;
	}
	if midpoint > lower && midpoint <= upper {
		midpoint
	} else {
		upper
	}
}

/// Split a categorical variable by a subset of its levels. A variable with more than `MAX_CATEGORICAL_LEVELS` levels has no split, because its level subsets cannot be stored exactly in a split value.
fn find_best_categorical_split_for_variable<D: Data + ?Sized>(
	data: &D,
	var_id: usize,
	n_levels: usize,
	sample_ids: &[usize],
	response_class_ids: &[usize],
	parent_class_counts: &[usize],
	min_node_size: usize,
) -> Option<ChooseBestSplitOutput> {
	if n_levels > MAX_CATEGORICAL_LEVELS {
		tracing::trace!(
			var_id,
			n_levels,
			max_levels = MAX_CATEGORICAL_LEVELS,
			"categorical variable has too many levels to split"
		);
		return None;
	}
	let n_classes = parent_class_counts.len();
	let mut class_counts_per_level = vec![vec![0usize; n_classes]; n_levels];
	for &sample_id in sample_ids {
		let level = data.get(sample_id, var_id).to_usize()?;
		let class_counts = class_counts_per_level.get_mut(level)?;
		class_counts[response_class_ids[sample_id]] += 1;
	}
	let n_samples_per_level: Vec<usize> = class_counts_per_level
		.iter()
		.map(|class_counts| class_counts.iter().sum())
		.collect();
	let observed_levels: Vec<usize> = (0..n_levels)
		.filter(|&level| n_samples_per_level[level] > 0)
		.collect();
	// A variable with a single level at this node cannot split it.
	if observed_levels.len() < 2 {
		return None;
	}
	let candidates: Vec<u64> = if observed_levels.len() <= MAX_LEVELS_FOR_EXHAUSTIVE_SEARCH {
		// Every bipartition, enumerated once: the last observed level always stays right.
		let n_free_levels = observed_levels.len() - 1;
		(1..(1u64 << n_free_levels))
			.map(|subset| {
				observed_levels[..n_free_levels]
					.iter()
					.enumerate()
					.filter(|(position, _)| (subset >> position) & 1 == 1)
					.fold(0u64, |left_levels, (_, &level)| left_levels | (1 << level))
			})
			.collect()
	} else {
		// Sort the levels by the fraction of their samples in the node's majority class and try each prefix.
		let majority_class_id = majority_class_id(parent_class_counts);
		let fraction = |level: usize| {
			class_counts_per_level[level][majority_class_id].to_f64().unwrap()
				/ n_samples_per_level[level].to_f64().unwrap()
		};
		let mut sorted_levels = observed_levels;
		sorted_levels.sort_by(|&a, &b| fraction(a).total_cmp(&fraction(b)).then(a.cmp(&b)));
		sorted_levels[..sorted_levels.len() - 1]
			.iter()
			.scan(0u64, |left_levels, &level| {
				*left_levels |= 1 << level;
				Some(*left_levels)
			})
			.collect()
	};
	let mut best_split_so_far: Option<ChooseBestSplitOutput> = None;
	for left_levels in candidates {
		let mut left_class_counts = vec![0; n_classes];
		for (level, class_counts) in class_counts_per_level.iter().enumerate() {
			if (left_levels >> level) & 1 == 1 {
				for (left_count, count) in left_class_counts.iter_mut().zip(class_counts) {
					*left_count += count;
				}
			}
		}
		let n_left = left_class_counts.iter().sum::<usize>();
		let n_right = sample_ids.len() - n_left;
		if n_left == 0 || n_right == 0 || n_left < min_node_size || n_right < min_node_size {
			continue;
		}
		let decrease = gini_decrease(parent_class_counts, &left_class_counts);
		if improves(decrease, best_split_so_far.as_ref()) {
			best_split_so_far = Some(ChooseBestSplitOutput {
				var_id,
				rule: SplitRule::Categorical { left_levels },
				decrease,
				right_class_counts: subtract(parent_class_counts, &left_class_counts),
				left_class_counts,
			});
		}
	}
	best_split_so_far
}

/// The id of the most frequent class. Ties go to the lowest class id.
pub fn majority_class_id(class_counts: &[usize]) -> usize {
	let mut best_class_id = 0;
	for (class_id, &count) in class_counts.iter().enumerate() {
		if count > class_counts[best_class_id] {
			best_class_id = class_id;
		}
	}
	best_class_id
}

fn subtract(parent_class_counts: &[usize], left_class_counts: &[usize]) -> Vec<usize> {
	parent_class_counts
		.iter()
		.zip(left_class_counts)
		.map(|(parent, left)| parent - left)
		.collect()
}

#[cfg(test)]
fn class_counts(sample_ids: &[usize], response_class_ids: &[usize], n_classes: usize) -> Vec<usize> {
	let mut class_counts = vec![0; n_classes];
	for &sample_id in sample_ids {
		class_counts[response_class_ids[sample_id]] += 1;
	}
	class_counts
}

#[test]
fn test_gini() {
	assert_eq!(gini(&[5, 5]), 0.5);
	assert_eq!(gini(&[10, 0]), 0.0);
	assert_eq!(gini(&[0, 0]), 0.0);
	assert_eq!(gini_decrease(&[5, 5], &[5, 0]), 0.5);
	assert_eq!(gini_decrease(&[4, 4], &[2, 2]), 0.0);
}

#[test]
fn test_threshold_between() {
	assert_eq!(threshold_between(1.0, 2.0), 1.5);
	let lower = 1.0f64;
	let upper = f64::from_bits(lower.to_bits() + 1);
	assert_eq!(threshold_between(lower, upper), upper);
}

#[test]
fn test_number_split_separates_classes() {
	use crate::DataMatrix;
	use ndarray::prelude::*;
	let data = DataMatrix::numeric(arr2(&[[3.0], [1.0], [2.0], [10.0], [12.0], [11.0]])).unwrap();
	let response_class_ids = vec![0, 0, 0, 1, 1, 1];
	let sample_ids: Vec<usize> = (0..6).collect();
	let parent = class_counts(&sample_ids, &response_class_ids, 2);
	let split = choose_best_split(&data, &sample_ids, &response_class_ids, &parent, &[0], 1).unwrap();
	assert_eq!(split.var_id, 0);
	assert_eq!(split.rule, SplitRule::Number { threshold: 6.5 });
	assert_eq!(split.decrease, 0.5);
	assert_eq!(split.left_class_counts, vec![3, 0]);
	assert_eq!(split.right_class_counts, vec![0, 3]);
}

#[test]
fn test_constant_variable_has_no_split() {
	use crate::DataMatrix;
	use ndarray::prelude::*;
	let data = DataMatrix::numeric(arr2(&[[1.0], [1.0], [1.0], [1.0]])).unwrap();
	let response_class_ids = vec![0, 1, 0, 1];
	let sample_ids: Vec<usize> = (0..4).collect();
	let parent = class_counts(&sample_ids, &response_class_ids, 2);
	assert!(choose_best_split(&data, &sample_ids, &response_class_ids, &parent, &[0], 1).is_none());
}

#[test]
fn test_min_node_size_rejects_small_children() {
	use crate::DataMatrix;
	use ndarray::prelude::*;
	// The only pure split isolates a single sample.
	let data = DataMatrix::numeric(arr2(&[[0.0], [1.0], [1.0], [1.0]])).unwrap();
	let response_class_ids = vec![1, 0, 0, 0];
	let sample_ids: Vec<usize> = (0..4).collect();
	let parent = class_counts(&sample_ids, &response_class_ids, 2);
	assert!(choose_best_split(&data, &sample_ids, &response_class_ids, &parent, &[0], 1).is_some());
	assert!(choose_best_split(&data, &sample_ids, &response_class_ids, &parent, &[0], 2).is_none());
}

#[test]
fn test_ties_go_to_the_lowest_variable() {
	use crate::DataMatrix;
	use ndarray::prelude::*;
	// Both variables separate the classes perfectly.
	let data = DataMatrix::numeric(arr2(&[[0.0, 5.0], [0.0, 5.0], [1.0, 9.0], [1.0, 9.0]])).unwrap();
	let response_class_ids = vec![0, 0, 1, 1];
	let sample_ids: Vec<usize> = (0..4).collect();
	let parent = class_counts(&sample_ids, &response_class_ids, 2);
	let split = choose_best_split(&data, &sample_ids, &response_class_ids, &parent, &[0, 1], 1).unwrap();
	assert_eq!(split.var_id, 0);
	let split = choose_best_split(&data, &sample_ids, &response_class_ids, &parent, &[1], 1).unwrap();
	assert_eq!(split.var_id, 1);
	assert_eq!(split.rule, SplitRule::Number { threshold: 7.0 });
}

#[test]
fn test_categorical_split_groups_levels() {
	use crate::{ColumnType, DataMatrix};
	use ndarray::prelude::*;
	// Levels 0 and 2 are class 0, levels 1 and 3 are class 1.
	let values = arr2(&[[0.0], [2.0], [0.0], [1.0], [3.0], [1.0], [2.0], [3.0]]);
	let data = DataMatrix::new(values, vec![ColumnType::Categorical { n_levels: 4 }]).unwrap();
	let response_class_ids = vec![0, 0, 0, 1, 1, 1, 0, 1];
	let sample_ids: Vec<usize> = (0..8).collect();
	let parent = class_counts(&sample_ids, &response_class_ids, 2);
	let split = choose_best_split(&data, &sample_ids, &response_class_ids, &parent, &[0], 1).unwrap();
	assert_eq!(split.rule, SplitRule::Categorical { left_levels: 0b0101 });
	assert_eq!(split.decrease, 0.5);
}

#[test]
fn test_categorical_split_with_many_levels() {
	use crate::{ColumnType, DataMatrix};
	use ndarray::prelude::*;
	// Twelve levels, the even ones are class 0 and the odd ones class 1.
	let values: Vec<f64> = (0..24).map(|i| (i % 12) as f64).collect();
	let response_class_ids: Vec<usize> = (0..24).map(|i| (i % 12) % 2).collect();
	let values = Array2::from_shape_vec((24, 1), values).unwrap();
	let data = DataMatrix::new(values, vec![ColumnType::Categorical { n_levels: 12 }]).unwrap();
	let sample_ids: Vec<usize> = (0..24).collect();
	let parent = class_counts(&sample_ids, &response_class_ids, 2);
	let split = choose_best_split(&data, &sample_ids, &response_class_ids, &parent, &[0], 1).unwrap();
	// The odd levels have no samples of the majority class, class 0, so they sort first.
	let odd_levels = (0..12).filter(|level| level % 2 == 1).fold(0u64, |mask, level| mask | (1 << level));
	assert_eq!(split.rule, SplitRule::Categorical { left_levels: odd_levels });
	assert_eq!(split.decrease, 0.5);
}

#[test]
fn test_single_observed_level_is_skipped() {
	use crate::{ColumnType, DataMatrix};
	use ndarray::prelude::*;
	let values = arr2(&[[2.0], [2.0], [2.0]]);
	let data = DataMatrix::new(values, vec![ColumnType::Categorical { n_levels: 3 }]).unwrap();
	let response_class_ids = vec![0, 1, 0];
	let sample_ids: Vec<usize> = (0..3).collect();
	let parent = class_counts(&sample_ids, &response_class_ids, 2);
	assert!(choose_best_split(&data, &sample_ids, &response_class_ids, &parent, &[0], 1).is_none());
}

#[test]
fn test_chosen_split_is_optimal() {
	use crate::{tree::sends_left, DataMatrix};
	use rand::{Rng, SeedableRng};
	use rand_chacha::ChaCha8Rng;
	let mut rng = ChaCha8Rng::seed_from_u64(7);
	let n_samples = 60;
	let n_vars = 3;
	let values: Vec<f64> = (0..n_samples * n_vars)
		.map(|_| rng.gen_range(0, 8) as f64)
		.collect();
	let response_class_ids: Vec<usize> = (0..n_samples).map(|_| rng.gen_range(0, 3)).collect();
	let data = DataMatrix::numeric(ndarray::Array2::from_shape_vec((n_samples, n_vars), values).unwrap()).unwrap();
	let sample_ids: Vec<usize> = (0..n_samples).collect();
	let parent = class_counts(&sample_ids, &response_class_ids, 3);
	let split = choose_best_split(&data, &sample_ids, &response_class_ids, &parent, &[0, 1, 2], 1).unwrap();
	// Enumerate every threshold of every variable independently.
	for var_id in 0..n_vars {
		for threshold in (1..8).map(|value| value as f64 - 0.5) {
			let left: Vec<usize> = sample_ids
				.iter()
				.copied()
				.filter(|&sample_id| data.get(sample_id, var_id) < threshold)
				.collect();
			if left.is_empty() || left.len() == n_samples {
				continue;
			}
			let decrease = gini_decrease(&parent, &class_counts(&left, &response_class_ids, 3));
			assert!(split.decrease >= decrease - SPLIT_TOLERANCE);
		}
	}
	// Both children of the chosen split are non-empty.
	let n_left = sample_ids
		.iter()
		.filter(|&&sample_id| {
			sends_left(
				data.column_type(split.var_id),
				data.get(sample_id, split.var_id),
				split.rule.split_value(),
			)
		})
		.count();
	assert!(n_left > 0 && n_left < n_samples);
	assert_eq!(n_left, split.left_class_counts.iter().sum::<usize>());
}

#[cfg(test)]
fn best_decrease_over_all_subsets(
	levels: &[usize],
	n_levels: usize,
	response_class_ids: &[usize],
	parent_class_counts: &[usize],
) -> f64 {
	let n_classes = parent_class_counts.len();
	let mut best = 0.0f64;
	for left_levels in 1..(1u64 << n_levels) - 1 {
		let mut left_class_counts = vec![0; n_classes];
		for (&level, &class_id) in levels.iter().zip(response_class_ids) {
			if (left_levels >> level) & 1 == 1 {
				left_class_counts[class_id] += 1;
			}
		}
		let n_left = left_class_counts.iter().sum::<usize>();
		if n_left == 0 || n_left == levels.len() {
			continue;
		}
		best = best.max(gini_decrease(parent_class_counts, &left_class_counts));
	}
	best
}

#[test]
fn test_categorical_split_matches_exhaustive_search() {
	use crate::{tree::sends_left, ColumnType, DataMatrix};
	use rand::{Rng, SeedableRng};
	use rand_chacha::ChaCha8Rng;
	let mut rng = ChaCha8Rng::seed_from_u64(13);
	for n_levels in 2..=MAX_LEVELS_FOR_EXHAUSTIVE_SEARCH {
		for _ in 0..5 {
			let n_samples = 40;
			let levels: Vec<usize> = (0..n_samples).map(|_| rng.gen_range(0, n_levels)).collect();
			let response_class_ids: Vec<usize> = (0..n_samples).map(|_| rng.gen_range(0, 3)).collect();
			let values = ndarray::Array2::from_shape_fn((n_samples, 1), |(row, _)| levels[row] as f64);
			let data = DataMatrix::new(values, vec![ColumnType::Categorical { n_levels }]).unwrap();
			let sample_ids: Vec<usize> = (0..n_samples).collect();
			let parent = class_counts(&sample_ids, &response_class_ids, 3);
			let best = best_decrease_over_all_subsets(&levels, n_levels, &response_class_ids, &parent);
			let split = match choose_best_split(&data, &sample_ids, &response_class_ids, &parent, &[0], 1) {
				Some(split) => split,
				None => {
					assert!(best <= SPLIT_TOLERANCE);
					continue;
				}
			};
			assert!(split.decrease >= best - SPLIT_TOLERANCE);
			assert!(split.decrease <= best + SPLIT_TOLERANCE);
			// The stored mask routes samples the way the decrease was computed.
			let left: Vec<usize> = sample_ids
				.iter()
				.copied()
				.filter(|&sample_id| {
					sends_left(data.column_type(0), data.get(sample_id, 0), split.rule.split_value())
				})
				.collect();
			assert_eq!(class_counts(&left, &response_class_ids, 3), split.left_class_counts);
		}
	}
}

#[test]
fn test_sorted_prefixes_are_optimal_for_two_classes() {
	use crate::{ColumnType, DataMatrix};
	use rand::{Rng, SeedableRng};
	use rand_chacha::ChaCha8Rng;
	let mut rng = ChaCha8Rng::seed_from_u64(21);
	let n_levels = 12;
	let n_samples = 200;
	// Each level has its own probability of class 1.
	let probabilities: Vec<f64> = (0..n_levels).map(|_| rng.gen::<f64>()).collect();
	let levels: Vec<usize> = (0..n_samples).map(|_| rng.gen_range(0, n_levels)).collect();
	let response_class_ids: Vec<usize> = levels
		.iter()
		.map(|&level| if rng.gen_bool(probabilities[level]) { 1 } else { 0 })
		.collect();
	let values = ndarray::Array2::from_shape_fn((n_samples, 1), |(row, _)| levels[row] as f64);
	let data = DataMatrix::new(values, vec![ColumnType::Categorical { n_levels }]).unwrap();
	let sample_ids: Vec<usize> = (0..n_samples).collect();
	let parent = class_counts(&sample_ids, &response_class_ids, 2);
	let split = choose_best_split(&data, &sample_ids, &response_class_ids, &parent, &[0], 1).unwrap();
	let best = best_decrease_over_all_subsets(&levels, n_levels, &response_class_ids, &parent);
	assert!((split.decrease - best).abs() <= SPLIT_TOLERANCE);
}

#[cfg(test)]
struct DeclaredLevels {
	n_levels: usize,
	rows: Vec<[f64; 2]>,
}

#[cfg(test)]
impl Data for DeclaredLevels {
	fn n_rows(&self) -> usize {
		self.rows.len()
	}

	fn n_cols(&self) -> usize {
		2
	}

	fn get(&self, row: usize, col: usize) -> f64 {
		self.rows[row][col]
	}

	fn column_type(&self, col: usize) -> ColumnType {
		match col {
			0 => ColumnType::Categorical {
				n_levels: self.n_levels,
			},
			_ => ColumnType::Number,
		}
	}
}

#[test]
fn test_categorical_variable_with_too_many_levels_is_skipped() {
	// Column 0 separates the classes with levels 0 and the highest level, column 1 only partly.
	for &n_levels in &[60, 70] {
		let high_level = (n_levels - 5) as f64;
		let data = DeclaredLevels {
			n_levels,
			rows: vec![[0.0, 1.0], [0.0, 2.0], [0.0, 3.0], [high_level, 2.0], [high_level, 4.0], [high_level, 5.0]],
		};
		let response_class_ids = vec![0, 0, 0, 1, 1, 1];
		let sample_ids: Vec<usize> = (0..6).collect();
		let parent = class_counts(&sample_ids, &response_class_ids, 2);
		assert!(choose_best_split(&data, &sample_ids, &response_class_ids, &parent, &[0], 1).is_none());
		let split = choose_best_split(&data, &sample_ids, &response_class_ids, &parent, &[0, 1], 1).unwrap();
		assert_eq!(split.var_id, 1);
		let class_values = vec![0.0, 1.0];
		let mut tree = crate::ClassificationTree::new(&class_values, &response_class_ids, Default::default());
		tree.grow(&data, &sample_ids, &mut |_: usize| vec![0, 1], None).unwrap();
		assert_eq!(tree.tree().split_var_ids()[0], 1);
	}
}
