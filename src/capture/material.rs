use std::hash::Hasher;

use rustc_hash::{FxHashMap, FxHashSet, FxHasher};

use crate::math::*;
use crate::sync::Material;
use crate::util::{IdGenerator, INVALID_ID};

use super::texture::MAX_TEXTURE_SLOTS;

/// Material parameters synthesized from a program's uniforms.
///
/// Map and slot fields hold exported texture ids. Which program produced the values is not part of the material.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct MaterialRecord {
	pub diffuse_color: Vec4,
	pub specular_color: Vec4,
	pub bump_scale: f32,
	pub color_map: i32,
	pub bump_map: i32,
	pub specular_map: i32,
	pub texture_slots: [i32; MAX_TEXTURE_SLOTS],
}

impl Default for MaterialRecord {
	fn default() -> Self {
		Self {
			diffuse_color: Vec4::ZERO,
			specular_color: Vec4::ZERO,
			bump_scale: 0.0,
			color_map: INVALID_ID,
			bump_map: INVALID_ID,
			specular_map: INVALID_ID,
			texture_slots: [INVALID_ID; MAX_TEXTURE_SLOTS],
		}
	}
}

impl MaterialRecord {
	pub fn checksum(&self) -> u64 {
		let mut canonical = *self;
		canonical.diffuse_color = canonical_vec4(self.diffuse_color);
		canonical.specular_color = canonical_vec4(self.specular_color);
		canonical.bump_scale = canonical_f32(self.bump_scale);
		let mut hasher = FxHasher::default();
		hasher.write(bytemuck::bytes_of(&canonical));
		hasher.finish()
	}

	pub fn to_scene(&self, id: i32) -> Material {
		Material {
			id,
			name: format!("Material{id}"),
			diffuse_color: self.diffuse_color,
			specular_color: self.specular_color,
			bump_scale: self.bump_scale,
			color_map: self.color_map,
			bump_map: self.bump_map,
			specular_map: self.specular_map,
			texture_slots: self.texture_slots.iter().copied().enumerate().filter(|(_, id)| *id != INVALID_ID).collect(),
		}
	}
}

/// Deduplicated materials keyed by checksum-derived id.
///
/// The first record seen with a checksum allocates its id; if two different records ever share a checksum the one
/// resolved last is what the id describes.
#[derive(Default)]
pub struct MaterialTable {
	ids: IdGenerator<u64>,
	records: FxHashMap<i32, MaterialRecord>,
	sent: FxHashSet<i32>,
	pending: FxHashSet<i32>,
}

impl MaterialTable {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn resolve(&mut self, record: &MaterialRecord) -> i32 {
		let id = self.ids.get_id(record.checksum());
		if self.records.get(&id) != Some(record) {
			if self.records.insert(id, *record).is_some() {
				self.sent.remove(&id);
			}
		}
		id
	}

	pub fn get(&self, id: i32) -> Option<&MaterialRecord> {
		self.records.get(&id)
	}

	pub fn len(&self) -> usize {
		self.records.len()
	}

	/// Queues a material for the next snapshot unless it was already sent.
	pub fn touch(&mut self, id: i32) {
		if self.records.contains_key(&id) && !self.sent.contains(&id) {
			self.pending.insert(id);
		}
	}

	pub fn take_pending(&mut self) -> Vec<Material> {
		let mut ids: Vec<i32> = self.pending.drain().collect();
		ids.sort_unstable();
		ids.into_iter()
			.filter_map(|id| {
				self.sent.insert(id);
				self.records.get(&id).map(|r| r.to_scene(id))
			})
			.collect()
	}

	/// Forgets what has been sent so every material in use goes out again.
	pub fn resend_all(&mut self) {
		self.pending.extend(self.sent.drain());
	}
}
