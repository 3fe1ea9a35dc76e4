use ndarray::prelude::*;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tangram_forest::{
	permute_oob_positions, Bootstrap, ClassificationTree, ColumnType, Data, DataMatrix, RandomSubset,
	Tree, TreeOptions, VariableImportance, LEAF_SENTINEL,
};

/// Column 0 determines the class up to `label_noise`, the other columns are noise.
fn threshold_data(n_rows: usize, n_noise_columns: usize, label_noise: f64, seed: u64) -> (DataMatrix, Vec<usize>) {
	let mut rng = ChaCha8Rng::seed_from_u64(seed);
	let mut values = Array2::zeros((n_rows, 1 + n_noise_columns));
	let mut response_class_ids = Vec::with_capacity(n_rows);
	for mut row in values.axis_iter_mut(Axis(0)) {
		for value in row.iter_mut() {
			*value = rng.gen::<f64>();
		}
		let mut class_id = if row[0] > 0.5 { 1 } else { 0 };
		if rng.gen_bool(label_noise) {
			class_id = 1 - class_id;
		}
		response_class_ids.push(class_id);
	}
	(DataMatrix::numeric(values).unwrap(), response_class_ids)
}

#[test]
fn test_response_equal_to_feature() {
	let rows: Vec<Vec<f64>> = (0..20).map(|row| vec![(row % 2) as f64]).collect();
	let data = DataMatrix::from_rows(&rows, vec![ColumnType::Number]).unwrap();
	let response_class_ids: Vec<usize> = (0..20).map(|row| row % 2).collect();
	let class_values = vec![0.0, 1.0];
	let mut tree = ClassificationTree::new(&class_values, &response_class_ids, TreeOptions::default());
	let sample_ids: Vec<usize> = (0..20).collect();
	tree.grow(&data, &sample_ids, &mut |_: usize| vec![0], None).unwrap();
	assert_eq!(tree.tree().n_nodes(), 3);
	assert_eq!(tree.tree().n_leaves(), 2);
	assert_eq!(tree.tree().split_values(), &[0.5, 0.0, 1.0]);
	// Predict samples the tree has not seen.
	let held_out = DataMatrix::from_rows(
		&[vec![1.0], vec![0.0], vec![0.0], vec![1.0]],
		vec![ColumnType::Number],
	)
	.unwrap();
	for row in 0..held_out.n_rows() {
		let leaf = tree.find_leaf(&held_out, row);
		assert_eq!(tree.tree().split_values()[leaf], held_out.get(row, 0));
	}
}

#[test]
fn test_tree_invariants() {
	let mut rng = ChaCha8Rng::seed_from_u64(3);
	let (data, _) = threshold_data(300, 3, 0.0, 3);
	let response_class_ids: Vec<usize> = (0..300).map(|_| rng.gen_range(0, 3)).collect();
	let class_values = vec![1.0, 2.0, 3.0];
	let options = TreeOptions {
		min_node_size: 2,
		max_depth: Some(6),
		..Default::default()
	};
	let bootstrap = Bootstrap::with_replacement(300, 1.0, 3);
	let mut tree = ClassificationTree::new(&class_values, &response_class_ids, options);
	tree.grow(&data, &bootstrap.in_bag, &mut RandomSubset::new(4, 2, 3), None)
		.unwrap();
	let tree = tree.into_tree();
	assert!(tree.n_nodes() > 1);
	assert_eq!(tree.split_var_ids().len(), tree.n_nodes());
	assert_eq!(tree.split_values().len(), tree.n_nodes());
	assert!(tree.depth() <= 6);
	let mut n_parents = vec![0; tree.n_nodes()];
	for (node_id, &[left_child_id, right_child_id]) in tree.child_node_ids().iter().enumerate() {
		if tree.is_leaf(node_id) {
			assert!(class_values.contains(&tree.split_values()[node_id]));
			continue;
		}
		assert_ne!(left_child_id, LEAF_SENTINEL);
		assert!(left_child_id > node_id);
		assert!(right_child_id > node_id);
		assert!(tree.split_var_ids()[node_id] < data.n_cols());
		n_parents[left_child_id] += 1;
		n_parents[right_child_id] += 1;
	}
	assert_eq!(n_parents[0], 0);
	assert!(n_parents[1..].iter().all(|&n| n == 1));
}

#[test]
fn test_round_trip_preserves_predictions_and_importance() {
	let (data, response_class_ids) = threshold_data(200, 2, 0.1, 11);
	let class_values = vec![0.0, 1.0];
	let bootstrap = Bootstrap::with_replacement(200, 1.0, 11);
	let grown_importance = VariableImportance::new(3);
	let mut tree = ClassificationTree::new(&class_values, &response_class_ids, TreeOptions::default());
	tree.grow(
		&data,
		&bootstrap.in_bag,
		&mut RandomSubset::new(3, 2, 11),
		Some(&grown_importance),
	)
	.unwrap();
	let all_sample_ids: Vec<usize> = (0..200).collect();
	let predictions = tree.predict(&data, &all_sample_ids);

	// Binary layout.
	let mut bytes = Vec::new();
	tree.append_to_file_internal(&mut bytes).unwrap();
	let mut loaded = ClassificationTree::load(
		&mut bytes.as_slice(),
		&class_values,
		&response_class_ids,
		TreeOptions::default(),
	)
	.unwrap();
	assert_eq!(loaded.tree(), tree.tree());
	loaded.tree().check_split_var_ids(data.n_cols()).unwrap();
	assert_eq!(loaded.predict(&data, &all_sample_ids), predictions);
	loaded.replay_leaf_class_counts(&data, &bootstrap.in_bag).unwrap();
	for node_id in 0..tree.tree().n_nodes() {
		assert_eq!(loaded.training_class_counts(node_id), tree.training_class_counts(node_id));
	}
	let replayed_importance = VariableImportance::new(3);
	loaded
		.replay_gini_importance(&data, &bootstrap.in_bag, &replayed_importance)
		.unwrap();
	assert_eq!(replayed_importance.values(), grown_importance.values());

	// JSON layout.
	let json = serde_json::to_string(tree.tree()).unwrap();
	let from_json: Tree = serde_json::from_str(&json).unwrap();
	assert_eq!(&from_json, tree.tree());
	let mut from_json =
		ClassificationTree::from_tree(from_json, &class_values, &response_class_ids, TreeOptions::default());
	assert_eq!(from_json.predict(&data, &all_sample_ids), predictions);
}

#[test]
fn test_permutation_importance_separates_signal_from_noise() {
	let (data, response_class_ids) = threshold_data(400, 1, 0.05, 5);
	let class_values = vec![0.0, 1.0];
	let importance = VariableImportance::new(2);
	let n_trees = 50;
	for seed in 0..n_trees {
		let bootstrap = Bootstrap::with_replacement(400, 1.0, seed);
		let mut tree = ClassificationTree::new(&class_values, &response_class_ids, TreeOptions::default());
		tree.grow(&data, &bootstrap.in_bag, &mut |_: usize| vec![0, 1], None)
			.unwrap();
		let permutations = permute_oob_positions(bootstrap.out_of_bag.len(), 2, seed);
		tree.add_permutation_importance(&data, &bootstrap.out_of_bag, &permutations, &importance)
			.unwrap();
	}
	let mean: Vec<f64> = importance
		.values()
		.iter()
		.map(|value| value / n_trees as f64)
		.collect();
	assert!(mean[0] > 0.0);
	assert!(mean[0] > mean[1]);
	assert!(mean[1].abs() < 0.05);
}

#[test]
fn test_categorical_split_few_levels() {
	// Levels 0 and 3 are class 0, levels 1 and 2 are class 1.
	let rows: Vec<Vec<f64>> = (0..16).map(|row| vec![(row % 4) as f64]).collect();
	let data = DataMatrix::from_rows(&rows, vec![ColumnType::Categorical { n_levels: 4 }]).unwrap();
	let response_class_ids: Vec<usize> = (0..16)
		.map(|row| if row % 4 == 1 || row % 4 == 2 { 1 } else { 0 })
		.collect();
	let class_values = vec![0.0, 1.0];
	let mut tree = ClassificationTree::new(&class_values, &response_class_ids, TreeOptions::default());
	let sample_ids: Vec<usize> = (0..16).collect();
	tree.grow(&data, &sample_ids, &mut |_: usize| vec![0], None).unwrap();
	assert_eq!(tree.tree().n_nodes(), 3);
	// Level 3 stays right, so levels 1 and 2 go left.
	assert_eq!(tree.tree().split_values()[0], 0b0110 as f64);
	assert_eq!(tree.predict(&data, &sample_ids).len(), 16);
	assert_eq!(tree.compute_prediction_accuracy_internal(), Some(1.0));
}

#[test]
fn test_categorical_split_many_levels() {
	// Odd levels are class 1. A number column of noise competes with the categorical column.
	let mut rng = ChaCha8Rng::seed_from_u64(9);
	let rows: Vec<Vec<f64>> = (0..240)
		.map(|row| vec![(row % 12) as f64, rng.gen::<f64>()])
		.collect();
	let column_types = vec![ColumnType::Categorical { n_levels: 12 }, ColumnType::Number];
	let data = DataMatrix::from_rows(&rows, column_types).unwrap();
	let response_class_ids: Vec<usize> = (0..240).map(|row| row % 12 % 2).collect();
	let class_values = vec![0.0, 1.0];
	let importance = VariableImportance::new(2);
	let mut tree = ClassificationTree::new(&class_values, &response_class_ids, TreeOptions::default());
	let sample_ids: Vec<usize> = (0..240).collect();
	tree.grow(&data, &sample_ids, &mut |_: usize| vec![1, 0], Some(&importance))
		.unwrap();
	assert_eq!(tree.tree().n_nodes(), 3);
	assert_eq!(tree.tree().split_var_ids()[0], 0);
	let left_levels = tree.tree().split_values()[0] as u64;
	assert!(left_levels == 0b0101_0101_0101 || left_levels == 0b1010_1010_1010);
	assert_eq!(importance.values(), vec![0.5, 0.0]);
	tree.predict(&data, &sample_ids);
	assert_eq!(tree.compute_prediction_accuracy_internal(), Some(1.0));
}
