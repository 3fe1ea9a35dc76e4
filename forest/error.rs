use thiserror::Error;

/// Errors returned when a tree is reconstructed from a serialized layout. All of them are fatal: the layout is rejected as a whole.
#[derive(Debug, Error)]
pub enum LoadError {
	#[error("failed to read the tree")]
	Io(#[from] std::io::Error),
	#[error("the tree declares {n_nodes} nodes but the input ended after {n_read}")]
	Truncated { n_nodes: usize, n_read: usize },
	#[error("the node arrays have different lengths: {n_child_node_ids} child pairs, {n_split_var_ids} split variables, {n_split_values} split values")]
	LengthMismatch {
		n_child_node_ids: usize,
		n_split_var_ids: usize,
		n_split_values: usize,
	},
	#[error("the tree has no nodes")]
	Empty,
	#[error("node {node_id} has child {child_id} but the tree only has {n_nodes} nodes")]
	ChildOutOfRange {
		node_id: usize,
		child_id: usize,
		n_nodes: usize,
	},
	#[error("node {node_id} has exactly one child")]
	HalfLeaf { node_id: usize },
	#[error("node {node_id} has more than one parent")]
	MultipleParents { node_id: usize },
	#[error("node {node_id} is part of a cycle")]
	Cycle { node_id: usize },
	#[error("node {node_id} is not reachable from the root")]
	Unreachable { node_id: usize },
	#[error("the value {value} does not fit in a node id")]
	IdOverflow { value: u64 },
	#[error("node {node_id} splits on variable {var_id} but the data only has {n_vars} variables")]
	SplitVarOutOfRange {
		node_id: usize,
		var_id: usize,
		n_vars: usize,
	},
}

/// Errors returned by a data container that does not satisfy the contract of `Data`.
#[derive(Debug, Error)]
pub enum DataError {
	#[error("the matrix has {n_cols} columns but {n_column_types} column types were given")]
	ColumnCountMismatch { n_cols: usize, n_column_types: usize },
	#[error("row {row} has {got} values, expected {expected}")]
	RowLengthMismatch {
		row: usize,
		expected: usize,
		got: usize,
	},
	#[error("column {col} declares {n_levels} levels, categorical columns must have between 1 and {max_levels}")]
	InvalidLevelCount {
		col: usize,
		n_levels: usize,
		max_levels: usize,
	},
	#[error("value {value} at row {row}, column {col} is not a level of a categorical column with {n_levels} levels")]
	InvalidLevel {
		row: usize,
		col: usize,
		value: f64,
		n_levels: usize,
	},
	#[error("value at row {row}, column {col} is not finite")]
	NonFiniteValue { row: usize, col: usize },
}

/// Errors returned when a tree is grown or evaluated with inputs that do not match its data.
#[derive(Debug, Error)]
pub enum TreeError {
	#[error("the tree has already been grown")]
	AlreadyGrown,
	#[error("the tree cannot be grown from an empty sample")]
	EmptySample,
	#[error("sample {sample_id} is out of range, the data has {n_rows} rows and {n_responses} responses")]
	SampleOutOfRange {
		sample_id: usize,
		n_rows: usize,
		n_responses: usize,
	},
	#[error("sample {sample_id} has class id {class_id} but there are only {n_classes} classes")]
	ClassOutOfRange {
		sample_id: usize,
		class_id: usize,
		n_classes: usize,
	},
	#[error("the permutation for variable {var_id} has {got} samples, expected {expected}")]
	PermutationLength {
		var_id: usize,
		expected: usize,
		got: usize,
	},
	#[error("the permutation for variable {var_id} contains position {position}, but there are only {n_oob} out of bag samples")]
	PermutationOutOfRange {
		var_id: usize,
		position: usize,
		n_oob: usize,
	},
}
