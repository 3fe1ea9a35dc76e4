use crate::{ClassificationTree, LoadError, Tree, TreeLayout, TreeOptions};
use itertools::izip;
use std::{
	convert::TryFrom,
	io::{self, Read, Write},
};

/// The number of bytes each node occupies in the binary layout: its two child ids, its split variable id, and its split value.
const NODE_SIZE: usize = 4 * 8;

/// Do not trust the declared node count for preallocation beyond this many nodes.
const MAX_PREALLOCATED_NODES: usize = 1 << 16;

impl Tree {
	/**
	Write the tree in its binary layout: the number of nodes as a little endian `u64`, then for every node in id order its left child id, right child id and split variable id as little endian `u64`s and its split value as the little endian bits of an `f64`.
	*/
	pub fn write_to<W: Write>(&self, writer: &mut W) -> io::Result<()> {
		writer.write_all(&(self.n_nodes() as u64).to_le_bytes())?;
		for (&[left_child_id, right_child_id], &split_var_id, &split_value) in izip!(
			self.child_node_ids.iter(),
			self.split_var_ids.iter(),
			self.split_values.iter()
		) {
			writer.write_all(&(left_child_id as u64).to_le_bytes())?;
			writer.write_all(&(right_child_id as u64).to_le_bytes())?;
			writer.write_all(&(split_var_id as u64).to_le_bytes())?;
			writer.write_all(&split_value.to_bits().to_le_bytes())?;
		}
		Ok(())
	}

	/// Read a tree written by `write_to` and validate it with `Tree::from_layout`.
	pub fn read_from<R: Read>(reader: &mut R) -> Result<Self, LoadError> {
		let n_nodes = read_u64(reader).map_err(|error| match error.kind() {
			io::ErrorKind::UnexpectedEof => LoadError::Truncated {
				n_nodes: 0,
				n_read: 0,
			},
			_ => LoadError::Io(error),
		})?;
		let n_nodes = to_usize(n_nodes)?;
		let capacity = n_nodes.min(MAX_PREALLOCATED_NODES);
		let mut layout = TreeLayout {
			child_node_ids: Vec::with_capacity(capacity),
			split_var_ids: Vec::with_capacity(capacity),
			split_values: Vec::with_capacity(capacity),
		};
		let mut node = [0u8; NODE_SIZE];
		for n_read in 0..n_nodes {
			reader.read_exact(&mut node).map_err(|error| match error.kind() {
				io::ErrorKind::UnexpectedEof => LoadError::Truncated { n_nodes, n_read },
				_ => LoadError::Io(error),
			})?;
			let left_child_id = to_usize(u64_at(&node, 0))?;
			let right_child_id = to_usize(u64_at(&node, 1))?;
			let split_var_id = to_usize(u64_at(&node, 2))?;
			let split_value = f64::from_bits(u64_at(&node, 3));
			layout.child_node_ids.push([left_child_id, right_child_id]);
			layout.split_var_ids.push(split_var_id);
			layout.split_values.push(split_value);
		}
		Tree::from_layout(layout)
	}
}

impl<'a> ClassificationTree<'a> {
	/// Append the tree to `writer` in the binary layout of `Tree::write_to`.
	pub fn append_to_file_internal<W: Write>(&self, writer: &mut W) -> io::Result<()> {
		self.tree.write_to(writer)
	}

	/// Read a tree written by `append_to_file_internal`. The returned tree is ready to make predictions.
	pub fn load<R: Read>(
		reader: &mut R,
		class_values: &'a [f64],
		response_class_ids: &'a [usize],
		options: TreeOptions,
	) -> Result<Self, LoadError> {
		let tree = Tree::read_from(reader)?;
		tracing::debug!(n_nodes = tree.n_nodes(), "loaded classification tree");
		Ok(Self::from_tree(tree, class_values, response_class_ids, options))
	}
}

fn read_u64<R: Read>(reader: &mut R) -> io::Result<u64> {
	let mut bytes = [0u8; 8];
	reader.read_exact(&mut bytes)?;
	Ok(u64::from_le_bytes(bytes))
}

fn u64_at(node: &[u8; NODE_SIZE], field: usize) -> u64 {
	let mut bytes = [0u8; 8];
	bytes.copy_from_slice(&node[field * 8..(field + 1) * 8]);
	u64::from_le_bytes(bytes)
}

fn to_usize(value: u64) -> Result<usize, LoadError> {
	usize::try_from(value).map_err(|_| LoadError::IdOverflow { value })
}

#[cfg(test)]
fn small_tree() -> Tree {
	Tree::from_layout(TreeLayout {
		child_node_ids: vec![[1, 2], [0, 0], [0, 0]],
		split_var_ids: vec![0, 0, 0],
		split_values: vec![0.5, 0.0, 1.0],
	})
	.unwrap()
}

#[test]
fn test_binary_layout() {
	let tree = small_tree();
	let mut bytes = Vec::new();
	tree.write_to(&mut bytes).unwrap();
	assert_eq!(bytes.len(), 8 + 3 * NODE_SIZE);
	assert_eq!(&bytes[0..8], &3u64.to_le_bytes());
	assert_eq!(&bytes[8..16], &1u64.to_le_bytes());
	assert_eq!(&bytes[16..24], &2u64.to_le_bytes());
	assert_eq!(&bytes[32..40], &0.5f64.to_bits().to_le_bytes());
	let read = Tree::read_from(&mut bytes.as_slice()).unwrap();
	assert_eq!(read, tree);
}

#[test]
fn test_json_layout() {
	let tree = small_tree();
	let json = serde_json::to_string(&tree).unwrap();
	insta::assert_snapshot!(json, @r###"{"child_node_ids":[[1,2],[0,0],[0,0]],"split_var_ids":[0,0,0],"split_values":[0.5,0.0,1.0]}"###);
	let read: Tree = serde_json::from_str(&json).unwrap();
	assert_eq!(read, tree);
}

#[test]
fn test_json_layout_is_validated() {
	let json = r#"{"child_node_ids":[[1,2],[0,0]],"split_var_ids":[0,0],"split_values":[0.5,0.0]}"#;
	let error = serde_json::from_str::<Tree>(json).unwrap_err();
	assert!(error.to_string().contains("child 2"));
}

#[test]
fn test_read_truncated() {
	let mut bytes = Vec::new();
	small_tree().write_to(&mut bytes).unwrap();
	bytes.truncate(8 + NODE_SIZE + 5);
	let error = Tree::read_from(&mut bytes.as_slice()).unwrap_err();
	assert!(matches!(error, LoadError::Truncated { n_nodes: 3, n_read: 1 }));
	let error = Tree::read_from(&mut &[1u8, 0][..]).unwrap_err();
	assert!(matches!(error, LoadError::Truncated { n_nodes: 0, n_read: 0 }));
}

#[test]
fn test_read_rejects_invalid_tree() {
	let mut bytes = Vec::new();
	bytes.extend_from_slice(&1u64.to_le_bytes());
	bytes.extend_from_slice(&5u64.to_le_bytes());
	bytes.extend_from_slice(&6u64.to_le_bytes());
	bytes.extend_from_slice(&0u64.to_le_bytes());
	bytes.extend_from_slice(&0.0f64.to_bits().to_le_bytes());
	let error = Tree::read_from(&mut bytes.as_slice()).unwrap_err();
	assert!(matches!(error, LoadError::ChildOutOfRange { node_id: 0, child_id: 5, n_nodes: 1 }));
}

#[test]
fn test_load_classification_tree() {
	let class_values = vec![0.0, 1.0];
	let response_class_ids = vec![0, 1];
	let tree = ClassificationTree::from_tree(small_tree(), &class_values, &response_class_ids, Default::default());
	let mut bytes = Vec::new();
	tree.append_to_file_internal(&mut bytes).unwrap();
	let loaded = ClassificationTree::load(
		&mut bytes.as_slice(),
		&class_values,
		&response_class_ids,
		Default::default(),
	)
	.unwrap();
	assert_eq!(loaded.tree(), tree.tree());
}
