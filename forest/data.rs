use crate::DataError;
use ndarray::prelude::*;

/// Categorical splits store the set of levels sent left as the integer value of a bitmask in an `f64`, which is exact for up to 53 bits.
pub const MAX_CATEGORICAL_LEVELS: usize = 53;

/// A `ColumnType` tells the tree how to split on a column and how to route samples at nodes that split on it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum ColumnType {
	/// Number columns are split by a threshold. Samples with a value less than the threshold are sent left.
	Number,
	/// Categorical columns hold level indexes `0..n_levels` stored as `f64`. They are split by a subset of levels, and samples whose level is in the subset are sent left.
	Categorical { n_levels: usize },
}

/// The `Data` trait is the interface to the training data container. Trees only ever read values through it, by sample index and variable index.
pub trait Data {
	fn n_rows(&self) -> usize;
	fn n_cols(&self) -> usize;
	fn get(&self, row: usize, col: usize) -> f64;
	/// A categorical column's values are its level indices. Trees never split a categorical column declaring more than `MAX_CATEGORICAL_LEVELS` levels, and a node where some sample's level is not below `n_levels` is not split on that column.
	fn column_type(&self, col: usize) -> ColumnType;
}

/// A dense, row major feature matrix.
#[derive(Clone, Debug)]
pub struct DataMatrix {
	values: Array2<f64>,
	column_types: Vec<ColumnType>,
}

impl DataMatrix {
	/// Create a matrix, checking that every value is finite and that every categorical value is one of its column's levels.
	pub fn new(values: Array2<f64>, column_types: Vec<ColumnType>) -> Result<Self, DataError> {
		if values.ncols() != column_types.len() {
			return Err(DataError::ColumnCountMismatch {
				n_cols: values.ncols(),
				n_column_types: column_types.len(),
			});
		}
		for (col, column_type) in column_types.iter().enumerate() {
			if let ColumnType::Categorical { n_levels } = column_type {
				if *n_levels == 0 || *n_levels > MAX_CATEGORICAL_LEVELS {
					return Err(DataError::InvalidLevelCount {
						col,
						n_levels: *n_levels,
						max_levels: MAX_CATEGORICAL_LEVELS,
					});
				}
			}
		}
		for ((row, col), &value) in values.indexed_iter() {
			if !value.is_finite() {
				return Err(DataError::NonFiniteValue { row, col });
			}
			if let ColumnType::Categorical { n_levels } = column_types[col] {
				if value < 0.0 || value.fract() != 0.0 || value >= n_levels as f64 {
					return Err(DataError::InvalidLevel {
						row,
						col,
						value,
						n_levels,
					});
				}
			}
		}
		Ok(Self {
			values,
			column_types,
		})
	}

	/// Create a matrix where every column is a number column.
	pub fn numeric(values: Array2<f64>) -> Result<Self, DataError> {
		let column_types = vec![ColumnType::Number; values.ncols()];
		Self::new(values, column_types)
	}

	/// Create a matrix from rows of equal length.
	pub fn from_rows(rows: &[Vec<f64>], column_types: Vec<ColumnType>) -> Result<Self, DataError> {
		let n_cols = column_types.len();
		let mut flat = Vec::with_capacity(rows.len() * n_cols);
		for (row, values) in rows.iter().enumerate() {
			if values.len() != n_cols {
				return Err(DataError::RowLengthMismatch {
					row,
					expected: n_cols,
					got: values.len(),
				});
			}
			flat.extend_from_slice(values);
		}
		let values = Array2::from_shape_vec((rows.len(), n_cols), flat).map_err(|_| {
			DataError::ColumnCountMismatch {
				n_cols,
				n_column_types: n_cols,
			}
		})?;
		Self::new(values, column_types)
	}

	pub fn view(&self) -> ArrayView2<f64> {
		self.values.view()
	}

	pub fn column_types(&self) -> &[ColumnType] {
		&self.column_types
	}
}

impl Data for DataMatrix {
	fn n_rows(&self) -> usize {
		self.values.nrows()
	}

	fn n_cols(&self) -> usize {
		self.values.ncols()
	}

	fn get(&self, row: usize, col: usize) -> f64 {
		self.values[[row, col]]
	}

	fn column_type(&self, col: usize) -> ColumnType {
		self.column_types[col]
	}
}

#[test]
fn test_rejects_invalid_levels() {
	let values = arr2(&[[0.0, 1.0], [1.0, 3.0]]);
	let column_types = vec![ColumnType::Number, ColumnType::Categorical { n_levels: 3 }];
	let error = DataMatrix::new(values, column_types).unwrap_err();
	assert!(matches!(
		error,
		DataError::InvalidLevel {
			row: 1,
			col: 1,
			n_levels: 3,
			..
		}
	));
}

#[test]
fn test_rejects_too_many_levels() {
	let values = arr2(&[[0.0]]);
	let column_types = vec![ColumnType::Categorical { n_levels: 54 }];
	let error = DataMatrix::new(values, column_types).unwrap_err();
	assert!(matches!(error, DataError::InvalidLevelCount { col: 0, .. }));
}

#[test]
fn test_from_rows() {
	let rows = vec![vec![0.5, 2.0], vec![1.5, 0.0]];
	let column_types = vec![ColumnType::Number, ColumnType::Categorical { n_levels: 3 }];
	let data = DataMatrix::from_rows(&rows, column_types).unwrap();
	assert_eq!(data.n_rows(), 2);
	assert_eq!(data.n_cols(), 2);
	assert_eq!(data.get(1, 0), 1.5);
	assert_eq!(data.column_type(1), ColumnType::Categorical { n_levels: 3 });
	let error = DataMatrix::from_rows(&[vec![1.0]], vec![ColumnType::Number; 2]).unwrap_err();
	assert!(matches!(error, DataError::RowLengthMismatch { row: 0, .. }));
}
