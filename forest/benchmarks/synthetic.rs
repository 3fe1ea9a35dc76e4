use clap::Parser;
use itertools::Itertools;
use ndarray::prelude::*;
use num_traits::ToPrimitive;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde_json::json;
use std::time::Instant;
use tangram_forest::{
	permute_oob_positions, Accuracy, Bootstrap, ClassificationTree, ColumnType, Data, DataMatrix,
	RandomSubset, TreeOptions, VariableImportance,
};
use tracing_subscriber::EnvFilter;

const N_LEVELS: usize = 8;

#[derive(Parser)]
#[clap(about = "Grow a forest of classification trees on synthetic data and report its out of bag accuracy and variable importances.")]
struct Args {
	#[clap(long, default_value = "2000")]
	n_rows: usize,
	#[clap(long, default_value = "4")]
	n_noise_columns: usize,
	#[clap(long, default_value = "100")]
	n_trees: usize,
	#[clap(long, default_value = "2")]
	mtry: usize,
	#[clap(long, default_value = "1")]
	min_node_size: usize,
	#[clap(long)]
	max_depth: Option<usize>,
	#[clap(long, default_value = "42")]
	seed: u64,
}

fn main() -> anyhow::Result<()> {
	tracing_subscriber::fmt()
		.with_env_filter(EnvFilter::from_default_env())
		.init();
	let args = Args::parse();

	// Generate the data.
	let (data, response_class_ids) = synthetic_data(&args)?;
	let class_values = vec![0.0, 1.0];
	let n_vars = data.n_cols();

	// Grow the trees.
	let options = TreeOptions {
		min_node_size: args.min_node_size,
		max_depth: args.max_depth,
		..Default::default()
	};
	let gini_importance = VariableImportance::new(n_vars);
	let permutation_importance = VariableImportance::new(n_vars);
	let start = Instant::now();
	let oob_predictions = (0..args.n_trees)
		.into_par_iter()
		.map(|tree_index| -> anyhow::Result<Vec<(usize, f64)>> {
			let seed = args.seed.wrapping_add(tree_index.to_u64().unwrap());
			let bootstrap = Bootstrap::with_replacement(data.n_rows(), 1.0, seed);
			let mut sampler = RandomSubset::new(n_vars, args.mtry, seed);
			let mut tree = ClassificationTree::new(&class_values, &response_class_ids, options.clone());
			tree.grow(&data, &bootstrap.in_bag, &mut sampler, Some(&gini_importance))?;
			let permutations = permute_oob_positions(bootstrap.out_of_bag.len(), n_vars, seed);
			tree.add_permutation_importance(
				&data,
				&bootstrap.out_of_bag,
				&permutations,
				&permutation_importance,
			)?;
			let predictions = tree.predict(&data, &bootstrap.out_of_bag);
			Ok(bootstrap.out_of_bag.into_iter().zip(predictions).collect())
		})
		.collect::<anyhow::Result<Vec<_>>>()?;
	let duration = start.elapsed();

	// Compute the out of bag accuracy of the forest's majority vote.
	let mut votes = vec![vec![0usize; class_values.len()]; data.n_rows()];
	for (sample_id, prediction) in oob_predictions.into_iter().flatten() {
		if let Some(class_id) = class_values.iter().position(|&value| value == prediction) {
			votes[sample_id][class_id] += 1;
		}
	}
	let mut accuracy = Accuracy::new();
	for (sample_votes, &class_id) in votes.iter().zip(response_class_ids.iter()) {
		let n_votes = sample_votes.iter().sum::<usize>();
		if n_votes == 0 {
			continue;
		}
		let predicted_class_id = sample_votes
			.iter()
			.enumerate()
			.fold(0, |best, (class_id, &count)| {
				if count > sample_votes[best] {
					class_id
				} else {
					best
				}
			});
		accuracy.update((class_values[predicted_class_id], class_values[class_id]));
	}

	let n_trees = args.n_trees.to_f64().unwrap();
	let output = json!({
		"oob_accuracy": accuracy.finalize(),
		"gini_importance": gini_importance.normalized(),
		"permutation_importance": permutation_importance
			.values()
			.iter()
			.map(|value| value / n_trees)
			.collect_vec(),
		"duration_ms": duration.as_millis().to_u64(),
	});
	println!("{}", output);
	Ok(())
}

/// Column 0 is a number and column 1 a categorical level. Together they determine the class, up to 5% label noise. The remaining columns are noise.
fn synthetic_data(args: &Args) -> anyhow::Result<(DataMatrix, Vec<usize>)> {
	let mut rng = ChaCha8Rng::seed_from_u64(args.seed);
	let n_cols = 2 + args.n_noise_columns;
	let mut values = Array2::zeros((args.n_rows, n_cols));
	let mut response_class_ids = Vec::with_capacity(args.n_rows);
	for mut row in values.axis_iter_mut(Axis(0)) {
		let x: f64 = rng.gen();
		let level = rng.gen_range(0, N_LEVELS);
		let threshold = if level % 2 == 0 { 0.35 } else { 0.65 };
		let mut class_id = if x > threshold { 1 } else { 0 };
		if rng.gen_bool(0.05) {
			class_id = 1 - class_id;
		}
		row[0] = x;
		row[1] = level.to_f64().unwrap();
		for value in row.iter_mut().skip(2) {
			*value = rng.gen();
		}
		response_class_ids.push(class_id);
	}
	let column_types = std::iter::once(ColumnType::Number)
		.chain(std::iter::once(ColumnType::Categorical { n_levels: N_LEVELS }))
		.chain(std::iter::repeat(ColumnType::Number).take(args.n_noise_columns))
		.collect_vec();
	Ok((DataMatrix::new(values, column_types)?, response_class_ids))
}
