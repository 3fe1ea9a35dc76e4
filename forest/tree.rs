use crate::{ColumnType, Data, LoadError};
use std::{collections::VecDeque, convert::TryFrom};

/// Leaves store this value as both of their child ids. The root is never a child, so its id is free to mark the absence of children.
pub const LEAF_SENTINEL: usize = 0;

/**
A `Tree` is stored as three arrays indexed by node id. Node 0 is the root. Each branch stores the ids of its two children, so the tree needs no pointers and serializes as it is stored.

For a branch, `split_values` holds either the threshold of a number split or the bitmask of the levels sent left by a categorical split. For a leaf, it holds the predicted class label.
*/
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "TreeLayout", into = "TreeLayout")]
pub struct Tree {
	pub(crate) child_node_ids: Vec<[usize; 2]>,
	pub(crate) split_var_ids: Vec<usize>,
	pub(crate) split_values: Vec<f64>,
}

/// The unvalidated arrays of a tree. `Tree::from_layout` checks that they describe a tree.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct TreeLayout {
	pub child_node_ids: Vec<[usize; 2]>,
	pub split_var_ids: Vec<usize>,
	pub split_values: Vec<f64>,
}

impl Tree {
	pub(crate) fn empty() -> Self {
		Self {
			child_node_ids: Vec::new(),
			split_var_ids: Vec::new(),
			split_values: Vec::new(),
		}
	}

	/// Reconstruct a tree from its arrays. The arrays must have the same length, every branch must have two children in range, and every node other than the root must be reachable from the root through exactly one parent. The split variables are not checked here because the layout does not record the number of variables. Call `check_split_var_ids` before predicting with data from another source.
	pub fn from_layout(layout: TreeLayout) -> Result<Self, LoadError> {
		let TreeLayout {
			child_node_ids,
			split_var_ids,
			split_values,
		} = layout;
		let n_nodes = child_node_ids.len();
		if split_var_ids.len() != n_nodes || split_values.len() != n_nodes {
			return Err(LoadError::LengthMismatch {
				n_child_node_ids: n_nodes,
				n_split_var_ids: split_var_ids.len(),
				n_split_values: split_values.len(),
			});
		}
		if n_nodes == 0 {
			return Err(LoadError::Empty);
		}
		// Record the parent of every node, rejecting nodes claimed twice.
		let mut parents: Vec<Option<usize>> = vec![None; n_nodes];
		for (node_id, &[left_child_id, right_child_id]) in child_node_ids.iter().enumerate() {
			match (left_child_id == LEAF_SENTINEL, right_child_id == LEAF_SENTINEL) {
				(true, true) => continue,
				(false, false) => {}
				_ => return Err(LoadError::HalfLeaf { node_id }),
			}
			for &child_id in &[left_child_id, right_child_id] {
				if child_id >= n_nodes {
					return Err(LoadError::ChildOutOfRange {
						node_id,
						child_id,
						n_nodes,
					});
				}
				if parents[child_id].is_some() {
					return Err(LoadError::MultipleParents { node_id: child_id });
				}
				parents[child_id] = Some(node_id);
			}
		}
		// Every node must be reachable from the root.
		let mut reached = vec![false; n_nodes];
		let mut queue = VecDeque::new();
		queue.push_back(0);
		reached[0] = true;
		while let Some(node_id) = queue.pop_front() {
			let [left_child_id, right_child_id] = child_node_ids[node_id];
			if left_child_id == LEAF_SENTINEL {
				continue;
			}
			for &child_id in &[left_child_id, right_child_id] {
				reached[child_id] = true;
				queue.push_back(child_id);
			}
		}
		if let Some(node_id) = reached.iter().position(|reached| !reached) {
			// An unreachable node either hangs off a cycle or off a node that has no parent.
			let mut visited = vec![false; n_nodes];
			let mut current = node_id;
			while let Some(parent_id) = parents[current] {
				if visited[current] {
					return Err(LoadError::Cycle { node_id });
				}
				visited[current] = true;
				current = parent_id;
			}
			return Err(LoadError::Unreachable { node_id });
		}
		Ok(Self {
			child_node_ids,
			split_var_ids,
			split_values,
		})
	}

	/// Check that every branch splits on one of the first `n_vars` variables, so the tree can be evaluated on data with `n_vars` columns.
	pub fn check_split_var_ids(&self, n_vars: usize) -> Result<(), LoadError> {
		for (node_id, &var_id) in self.split_var_ids.iter().enumerate() {
			if !self.is_leaf(node_id) && var_id >= n_vars {
				return Err(LoadError::SplitVarOutOfRange {
					node_id,
					var_id,
					n_vars,
				});
			}
		}
		Ok(())
	}

	pub fn n_nodes(&self) -> usize {
		self.child_node_ids.len()
	}

	pub fn n_leaves(&self) -> usize {
		(0..self.n_nodes()).filter(|&node_id| self.is_leaf(node_id)).count()
	}

	pub fn is_leaf(&self, node_id: usize) -> bool {
		self.child_node_ids[node_id] == [LEAF_SENTINEL, LEAF_SENTINEL]
	}

	pub fn child_node_ids(&self) -> &[[usize; 2]] {
		&self.child_node_ids
	}

	pub fn split_var_ids(&self) -> &[usize] {
		&self.split_var_ids
	}

	pub fn split_values(&self) -> &[f64] {
		&self.split_values
	}

	/// The depth of the deepest leaf. A tree with a single leaf has depth 0.
	pub fn depth(&self) -> usize {
		let mut max_depth = 0;
		let mut stack = vec![(0, 0)];
		while let Some((node_id, depth)) = stack.pop() {
			max_depth = max_depth.max(depth);
			if !self.is_leaf(node_id) {
				let [left_child_id, right_child_id] = self.child_node_ids[node_id];
				stack.push((left_child_id, depth + 1));
				stack.push((right_child_id, depth + 1));
			}
		}
		max_depth
	}

	/// Find the leaf that the sample at `row` is sent to.
	pub fn find_leaf<D: Data + ?Sized>(&self, data: &D, row: usize) -> usize {
		self.find_leaf_with(data, |col| data.get(row, col))
	}

	/// Find the leaf for a sample whose value for each variable is given by `value`. `data` only supplies the column types. Every split variable must be a column of `data`, which `check_split_var_ids` verifies.
	pub fn find_leaf_with<D, F>(&self, data: &D, value: F) -> usize
	where
		D: Data + ?Sized,
		F: Fn(usize) -> f64,
	{
		// Start at the root node.
		let mut node_id = 0;
		// Traverse the tree until we get to a leaf.
		while !self.is_leaf(node_id) {
			let var_id = self.split_var_ids[node_id];
			let [left_child_id, right_child_id] = self.child_node_ids[node_id];
			node_id = if sends_left(data.column_type(var_id), value(var_id), self.split_values[node_id]) {
				left_child_id
			} else {
				right_child_id
			};
		}
		node_id
	}
}

impl TryFrom<TreeLayout> for Tree {
	type Error = LoadError;
	fn try_from(layout: TreeLayout) -> Result<Self, Self::Error> {
		Tree::from_layout(layout)
	}
}

impl From<Tree> for TreeLayout {
	fn from(tree: Tree) -> Self {
		Self {
			child_node_ids: tree.child_node_ids,
			split_var_ids: tree.split_var_ids,
			split_values: tree.split_values,
		}
	}
}

/// Decide whether a sample with `value` for the split variable is sent to the left child.
pub(crate) fn sends_left(column_type: ColumnType, value: f64, split_value: f64) -> bool {
	match column_type {
		ColumnType::Number => value < split_value,
		ColumnType::Categorical { .. } => {
			let level = value as u64;
			let left_levels = split_value as u64;
			level < 64 && (left_levels >> level) & 1 == 1
		}
	}
}

#[cfg(test)]
fn layout(child_node_ids: Vec<[usize; 2]>) -> TreeLayout {
	let n_nodes = child_node_ids.len();
	TreeLayout {
		child_node_ids,
		split_var_ids: vec![0; n_nodes],
		split_values: vec![0.0; n_nodes],
	}
}

#[test]
fn test_from_layout_accepts_tree() {
	let tree = Tree::from_layout(layout(vec![[1, 2], [0, 0], [3, 4], [0, 0], [0, 0]])).unwrap();
	assert_eq!(tree.n_nodes(), 5);
	assert_eq!(tree.n_leaves(), 3);
	assert_eq!(tree.depth(), 2);
	assert!(tree.is_leaf(1));
	assert!(!tree.is_leaf(2));
}

#[test]
fn test_from_layout_rejects_length_mismatch() {
	let mut tree_layout = layout(vec![[1, 2], [0, 0], [0, 0]]);
	tree_layout.split_values.pop();
	let error = Tree::from_layout(tree_layout).unwrap_err();
	assert!(matches!(
		error,
		LoadError::LengthMismatch {
			n_child_node_ids: 3,
			n_split_var_ids: 3,
			n_split_values: 2,
		}
	));
}

#[test]
fn test_from_layout_rejects_child_out_of_range() {
	let error = Tree::from_layout(layout(vec![[1, 7], [0, 0], [0, 0]])).unwrap_err();
	assert!(matches!(
		error,
		LoadError::ChildOutOfRange {
			node_id: 0,
			child_id: 7,
			n_nodes: 3,
		}
	));
}

#[test]
fn test_from_layout_rejects_half_leaf() {
	let error = Tree::from_layout(layout(vec![[0, 1], [0, 0]])).unwrap_err();
	assert!(matches!(error, LoadError::HalfLeaf { node_id: 0 }));
}

#[test]
fn test_from_layout_rejects_shared_child() {
	let error = Tree::from_layout(layout(vec![[1, 1], [0, 0]])).unwrap_err();
	assert!(matches!(error, LoadError::MultipleParents { node_id: 1 }));
}

#[test]
fn test_from_layout_rejects_cycle() {
	// Nodes 3 and 4 are each other's parent.
	let child_node_ids = vec![[1, 2], [0, 0], [0, 0], [4, 5], [3, 6], [0, 0], [0, 0]];
	let error = Tree::from_layout(layout(child_node_ids)).unwrap_err();
	assert!(matches!(error, LoadError::Cycle { node_id: 3 }));
	let error = Tree::from_layout(layout(vec![[1, 2], [0, 0], [0, 0], [3, 4], [0, 0]])).unwrap_err();
	assert!(matches!(error, LoadError::Cycle { node_id: 3 }));
}

#[test]
fn test_from_layout_rejects_unreachable() {
	let error = Tree::from_layout(layout(vec![[1, 2], [0, 0], [0, 0], [0, 0]])).unwrap_err();
	assert!(matches!(error, LoadError::Unreachable { node_id: 3 }));
}

#[test]
fn test_check_split_var_ids() {
	let mut tree_layout = layout(vec![[1, 2], [0, 0], [3, 4], [0, 0], [0, 0]]);
	tree_layout.split_var_ids = vec![1, 9, 4, 9, 9];
	// The layout itself is accepted, only the branches' variables are checked against the data.
	let tree = Tree::from_layout(tree_layout).unwrap();
	assert!(tree.check_split_var_ids(5).is_ok());
	let error = tree.check_split_var_ids(4).unwrap_err();
	assert!(matches!(
		error,
		LoadError::SplitVarOutOfRange {
			node_id: 2,
			var_id: 4,
			n_vars: 4,
		}
	));
}

#[test]
fn test_sends_left() {
	assert!(sends_left(ColumnType::Number, 0.4, 0.5));
	assert!(!sends_left(ColumnType::Number, 0.5, 0.5));
	let categorical = ColumnType::Categorical { n_levels: 4 };
	// Levels 0 and 2 are sent left.
	let left_levels = 0b101 as f64;
	assert!(sends_left(categorical, 0.0, left_levels));
	assert!(!sends_left(categorical, 1.0, left_levels));
	assert!(sends_left(categorical, 2.0, left_levels));
	assert!(!sends_left(categorical, 3.0, left_levels));
}
