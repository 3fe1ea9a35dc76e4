use num_traits::ToPrimitive;
use rand::{seq::SliceRandom, Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// A `SplitVariableSampler` supplies the variables a node may split on. `grow` calls it once for every node that passes the stopping checks, so a forest can draw a fresh random subset per node.
pub trait SplitVariableSampler {
	fn possible_split_var_ids(&mut self, node_id: usize) -> Vec<usize>;
}

impl<F> SplitVariableSampler for F
where
	F: FnMut(usize) -> Vec<usize>,
{
	fn possible_split_var_ids(&mut self, node_id: usize) -> Vec<usize> {
		self(node_id)
	}
}

/**
A `RandomSubset` draws `mtry` distinct variables for every node, the way a random forest restricts its trees.

Variables in `always_split_var_ids` are offered at every node in addition to the draw. Variables in `excluded_var_ids`, such as the response column of a data frame, are never offered.
*/
#[derive(Clone, Debug)]
pub struct RandomSubset {
	mtry: usize,
	drawable_var_ids: Vec<usize>,
	always_split_var_ids: Vec<usize>,
	rng: ChaCha8Rng,
}

impl RandomSubset {
	pub fn new(n_vars: usize, mtry: usize, seed: u64) -> Self {
		Self {
			mtry,
			drawable_var_ids: (0..n_vars).collect(),
			always_split_var_ids: Vec::new(),
			rng: ChaCha8Rng::seed_from_u64(seed),
		}
	}

	pub fn with_always_split_var_ids(mut self, var_ids: &[usize]) -> Self {
		self.always_split_var_ids = var_ids.to_vec();
		self.always_split_var_ids.sort_unstable();
		self.always_split_var_ids.dedup();
		let always_split_var_ids = &self.always_split_var_ids;
		self.drawable_var_ids
			.retain(|var_id| always_split_var_ids.binary_search(var_id).is_err());
		self
	}

	pub fn with_excluded_var_ids(mut self, var_ids: &[usize]) -> Self {
		self.drawable_var_ids.retain(|var_id| !var_ids.contains(var_id));
		self.always_split_var_ids.retain(|var_id| !var_ids.contains(var_id));
		self
	}
}

impl SplitVariableSampler for RandomSubset {
	fn possible_split_var_ids(&mut self, _node_id: usize) -> Vec<usize> {
		let n_drawable = self.drawable_var_ids.len();
		let amount = self.mtry.min(n_drawable);
		let mut var_ids: Vec<usize> = rand::seq::index::sample(&mut self.rng, n_drawable, amount)
			.into_iter()
			.map(|index| self.drawable_var_ids[index])
			.collect();
		var_ids.extend_from_slice(&self.always_split_var_ids);
		var_ids.sort_unstable();
		var_ids.dedup();
		var_ids
	}
}

/// A `Bootstrap` is the sample a tree is grown from, along with the samples it never saw.
#[derive(Clone, Debug, PartialEq)]
pub struct Bootstrap {
	/// The samples drawn for the tree. With replacement, a sample may appear more than once.
	pub in_bag: Vec<usize>,
	/// The samples that were not drawn, in increasing order.
	pub out_of_bag: Vec<usize>,
}

impl Bootstrap {
	/// Draw `ceil(n_samples * fraction)` samples with replacement.
	pub fn with_replacement(n_samples: usize, fraction: f64, seed: u64) -> Self {
		let mut rng = ChaCha8Rng::seed_from_u64(seed);
		let n_draws = n_draws(n_samples, fraction);
		let mut drawn = vec![false; n_samples];
		let mut in_bag = Vec::with_capacity(n_draws);
		if n_samples > 0 {
			for _ in 0..n_draws {
				let sample_id = rng.gen_range(0, n_samples);
				drawn[sample_id] = true;
				in_bag.push(sample_id);
			}
		}
		Self::from_drawn(in_bag, &drawn)
	}

	/// Draw `ceil(n_samples * fraction)` distinct samples.
	pub fn without_replacement(n_samples: usize, fraction: f64, seed: u64) -> Self {
		let mut rng = ChaCha8Rng::seed_from_u64(seed);
		let n_draws = n_draws(n_samples, fraction).min(n_samples);
		let in_bag = rand::seq::index::sample(&mut rng, n_samples, n_draws).into_vec();
		let mut drawn = vec![false; n_samples];
		for &sample_id in &in_bag {
			drawn[sample_id] = true;
		}
		Self::from_drawn(in_bag, &drawn)
	}

	fn from_drawn(in_bag: Vec<usize>, drawn: &[bool]) -> Self {
		let out_of_bag = drawn
			.iter()
			.enumerate()
			.filter(|(_, drawn)| !**drawn)
			.map(|(sample_id, _)| sample_id)
			.collect();
		Self { in_bag, out_of_bag }
	}
}

fn n_draws(n_samples: usize, fraction: f64) -> usize {
	(n_samples.to_f64().unwrap() * fraction.max(0.0))
		.ceil()
		.to_usize()
		.unwrap_or(0)
}

/// Draw one permutation of the positions `0..n_oob` per variable, for `compute_permutation_importance_internal`.
pub fn permute_oob_positions(n_oob: usize, n_vars: usize, seed: u64) -> Vec<Vec<usize>> {
	let mut rng = ChaCha8Rng::seed_from_u64(seed);
	(0..n_vars)
		.map(|_| {
			let mut positions: Vec<usize> = (0..n_oob).collect();
			positions.shuffle(&mut rng);
			positions
		})
		.collect()
}

#[test]
fn test_random_subset() {
	let mut sampler = RandomSubset::new(10, 3, 42)
		.with_always_split_var_ids(&[9])
		.with_excluded_var_ids(&[0]);
	for node_id in 0..50 {
		let var_ids = sampler.possible_split_var_ids(node_id);
		assert_eq!(var_ids.len(), 4);
		assert!(var_ids.contains(&9));
		assert!(!var_ids.contains(&0));
		assert!(var_ids.windows(2).all(|pair| pair[0] < pair[1]));
	}
	let draws = |seed| {
		let mut sampler = RandomSubset::new(10, 3, seed);
		(0..5)
			.map(|node_id| sampler.possible_split_var_ids(node_id))
			.collect::<Vec<_>>()
	};
	assert_eq!(draws(7), draws(7));
}

#[test]
fn test_random_subset_mtry_larger_than_n_vars() {
	let mut sampler = RandomSubset::new(3, 10, 0);
	assert_eq!(sampler.possible_split_var_ids(0), vec![0, 1, 2]);
}

#[test]
fn test_bootstrap_with_replacement() {
	let bootstrap = Bootstrap::with_replacement(100, 1.0, 1);
	assert_eq!(bootstrap.in_bag.len(), 100);
	assert!(!bootstrap.out_of_bag.is_empty());
	assert!(bootstrap.out_of_bag.windows(2).all(|pair| pair[0] < pair[1]));
	for sample_id in &bootstrap.out_of_bag {
		assert!(!bootstrap.in_bag.contains(sample_id));
	}
	assert_eq!(bootstrap, Bootstrap::with_replacement(100, 1.0, 1));
}

#[test]
fn test_bootstrap_without_replacement() {
	let bootstrap = Bootstrap::without_replacement(10, 0.55, 3);
	assert_eq!(bootstrap.in_bag.len(), 6);
	assert_eq!(bootstrap.out_of_bag.len(), 4);
	let mut all: Vec<usize> = bootstrap
		.in_bag
		.iter()
		.chain(bootstrap.out_of_bag.iter())
		.copied()
		.collect();
	all.sort_unstable();
	assert_eq!(all, (0..10).collect::<Vec<_>>());
}

#[test]
fn test_permute_oob_positions() {
	let permutations = permute_oob_positions(20, 3, 5);
	assert_eq!(permutations.len(), 3);
	for permutation in &permutations {
		let mut sorted = permutation.clone();
		sorted.sort_unstable();
		assert_eq!(sorted, (0..20).collect::<Vec<_>>());
	}
	assert_eq!(permutations, permute_oob_positions(20, 3, 5));
}
