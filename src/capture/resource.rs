use std::hash::Hash;

use rustc_hash::FxHashMap;

use super::gl::*;

/// Records of one resource kind keyed by host handle, plus the kind's binding slots.
///
/// Handle 0 never owns a record: binding it clears the slot. Deleting a handle clears every slot that still points at it.
pub struct ResourceTable<R, S = GLenum> {
	kind: &'static str,
	records: FxHashMap<GLuint, R>,
	bindings: FxHashMap<S, GLuint>,
}

impl<R: Default, S: Hash + Eq + Copy> ResourceTable<R, S> {
	pub fn new(kind: &'static str) -> Self {
		Self { kind, records: FxHashMap::default(), bindings: FxHashMap::default() }
	}

	/// Starts a fresh record for each handle. Records left over from an unobserved delete are returned.
	pub fn create(&mut self, handles: &[GLuint]) -> Vec<(GLuint, R)> {
		let mut stale = vec![];
		for &handle in handles.iter().filter(|&&h| h != 0) {
			if let Some(old) = self.records.insert(handle, R::default()) {
				log::debug!("{} {handle} reused without delete", self.kind);
				stale.push((handle, old));
			}
		}
		stale
	}

	pub fn destroy(&mut self, handles: &[GLuint]) -> Vec<(GLuint, R)> {
		let mut removed = vec![];
		for &handle in handles.iter().filter(|&&h| h != 0) {
			self.bindings.retain(|_, bound| *bound != handle);
			if let Some(record) = self.records.remove(&handle) {
				removed.push((handle, record));
			}
		}
		removed
	}

	pub fn bind(&mut self, slot: S, handle: GLuint) {
		if handle == 0 {
			self.bindings.remove(&slot);
		} else {
			self.get_or_create(handle);
			self.bindings.insert(slot, handle);
		}
	}

	pub fn bound(&self, slot: S) -> GLuint {
		self.bindings.get(&slot).copied().unwrap_or(0)
	}

	pub fn bound_record(&self, slot: S) -> Option<(GLuint, &R)> {
		let handle = self.bound(slot);
		self.records.get(&handle).map(|r| (handle, r))
	}

	pub fn bound_record_mut(&mut self, slot: S) -> Option<(GLuint, &mut R)> {
		let handle = self.bound(slot);
		self.get_or_create(handle).map(|r| (handle, r))
	}

	pub fn get(&self, handle: GLuint) -> Option<&R> {
		self.records.get(&handle)
	}

	pub fn get_mut(&mut self, handle: GLuint) -> Option<&mut R> {
		self.records.get_mut(&handle)
	}

	/// Looks up a record for a mutating call, creating a default one for handles never seen before.
	pub fn get_or_create(&mut self, handle: GLuint) -> Option<&mut R> {
		if handle == 0 {
			return None;
		}
		let kind = self.kind;
		Some(self.records.entry(handle).or_insert_with(|| {
			log::trace!("{kind} {handle} used before creation");
			R::default()
		}))
	}

	pub fn contains(&self, handle: GLuint) -> bool {
		self.records.contains_key(&handle)
	}

	pub fn len(&self) -> usize {
		self.records.len()
	}

	pub fn iter(&self) -> impl Iterator<Item = (GLuint, &R)> {
		self.records.iter().map(|(h, r)| (*h, r))
	}

	pub fn iter_mut(&mut self) -> impl Iterator<Item = (GLuint, &mut R)> {
		self.records.iter_mut().map(|(h, r)| (*h, r))
	}
}
