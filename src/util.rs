use std::hash::Hash;

use rustc_hash::FxHashMap;

/// Id value meaning "no object", shared with the scene service.
pub const INVALID_ID: i32 = -1;

pub struct SparseVec<T> {
	pub vec: Vec<Option<T>>,
}

impl<T> SparseVec<T> {
	pub fn new() -> Self {
		Self { vec: vec![] }
	}

	pub fn insert(&mut self, index: usize, v: T) {
		while index >= self.vec.len() {
			self.vec.push(None);
		}
		self.vec[index] = Some(v);
	}

	pub fn get(&self, index: usize) -> Option<&T> {
		self.vec.get(index).and_then(|o| o.as_ref())
	}

	pub fn clear(&mut self) {
		self.vec.clear();
	}

	pub fn len(&self) -> usize {
		self.iter().count()
	}

	pub fn iter(&self) -> impl std::iter::Iterator<Item = &T> {
		self.vec.iter().filter_map(|v| v.as_ref())
	}
}

impl<T> Default for SparseVec<T> {
	fn default() -> Self {
		Self::new()
	}
}

/// Ids are allocated in first-seen order starting at zero.
pub struct IdGenerator<K> {
	ids: FxHashMap<K, i32>,
	next: i32,
}

impl<K: Hash + Eq> IdGenerator<K> {
	pub fn new() -> Self {
		Self { ids: FxHashMap::default(), next: 0 }
	}

	pub fn get_id(&mut self, key: K) -> i32 {
		let next = &mut self.next;
		*self.ids.entry(key).or_insert_with(|| {
			let id = *next;
			*next += 1;
			id
		})
	}

	pub fn len(&self) -> usize {
		self.ids.len()
	}
}

impl<K: Hash + Eq> Default for IdGenerator<K> {
	fn default() -> Self {
		Self::new()
	}
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct ByteRange {
	pub offset: usize,
	pub len: usize,
}

impl ByteRange {
	pub fn new(offset: usize, len: usize) -> Self {
		Self { offset, len }
	}

	/// `None` when `offset + len` overflows.
	pub fn end(&self) -> Option<usize> {
		self.offset.checked_add(self.len)
	}

	pub fn fits_in(&self, size: usize) -> bool {
		self.end().map_or(false, |end| end <= size)
	}

	pub fn as_range(&self) -> std::ops::Range<usize> {
		self.offset..self.offset + self.len
	}
}
