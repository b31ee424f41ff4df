use std::sync::Arc;

use crate::sync::{DeletedMesh, SceneBatch};

use super::CaptureCtx;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum SendOutcome {
	Sent,
	/// A previous batch is still in flight; changes stay queued for the next send.
	Deferred,
	Empty,
	/// A forced send failed. Everything is queued again.
	Failed,
}

impl CaptureCtx {
	/// Snapshots everything changed since the last send and hands it to the sender.
	///
	/// Unforced sends back off while a batch is in flight. A forced send waits for the in-flight batch, and then for
	/// its own, so the service holds the complete current scene when it returns [`SendOutcome::Sent`].
	pub fn send(&mut self, force: bool) -> SendOutcome {
		if self.sender.take_failure() {
			self.resync();
		}
		if self.sender.is_sending() {
			if !force {
				log::trace!("send deferred, previous batch in flight");
				return SendOutcome::Deferred;
			}
			self.sender.wait();
			if self.sender.take_failure() {
				self.resync();
			}
		}

		let batch = self.compose();
		if batch.is_empty() {
			return SendOutcome::Empty;
		}
		log::debug!(
			"snapshot: {} meshes, {} materials, {} textures, camera {}, {} deletions",
			batch.meshes.len(), batch.materials.len(), batch.textures.len(), batch.camera.is_some(), batch.deleted.len(),
		);
		self.inflight_deleted = batch.deleted.iter().map(|d| d.id).collect();
		self.sender.kick(batch, self.settings().client.clone());

		if force {
			self.sender.wait();
			if self.sender.take_failure() {
				self.resync();
				return SendOutcome::Failed;
			}
		}
		SendOutcome::Sent
	}

	fn compose(&mut self) -> SceneBatch {
		let mut batch = SceneBatch::default();
		let scale = self.settings().scale_factor;

		let buffers = &self.buffers;
		let mut handles: Vec<_> = buffers
			.iter()
			.filter(|(_, b)| b.mesh.is_some())
			.filter(|(_, b)| b.dirty || b.signature.is_some_and(|s| s.is_stale(buffers)))
			.map(|(h, _)| h)
			.collect();
		handles.sort_unstable();
		for handle in handles {
			let refreshed = self.refresh_mesh(handle);
			let Some(record) = self.buffers.get_mut(handle) else { continue };
			record.dirty = false;
			if let Err(e) = refreshed {
				log::warn!("buffer {handle}: mesh dropped: {e}");
				record.mesh = None;
				record.signature = None;
				if !self.deleted.contains(&handle) {
					self.deleted.push(handle);
				}
				continue;
			}
			let Some(mesh) = &record.mesh else { continue };
			let mut mesh = mesh.scaled(scale);
			mesh.visible = record.visible;
			mesh.material_id = record.material_id;
			batch.meshes.push(mesh);
		}

		batch.materials = self.materials.take_pending();

		if self.settings().sync_textures {
			let mut textures: Vec<_> = self
				.textures
				.iter_mut()
				.filter(|(_, t)| t.dirty && t.used)
				.filter_map(|(_, t)| {
					let dst = Arc::clone(t.dst.as_ref()?);
					t.dirty = false;
					Some(dst)
				})
				.collect();
			textures.sort_unstable_by_key(|t| t.id);
			batch.textures = textures;
		}

		if self.settings().sync_camera && self.camera.dirty {
			batch.camera = Some(self.camera.to_scene(&self.settings().camera_path, scale));
			self.camera.dirty = false;
		}

		let deleted = std::mem::take(&mut self.deleted);
		if self.settings().sync_delete {
			batch.deleted = deleted.into_iter().map(DeletedMesh::new).collect();
		}
		batch
	}

	fn resync(&mut self) {
		log::warn!("scene send failed, resyncing everything on the next snapshot");
		for (_, record) in self.buffers.iter_mut() {
			if record.mesh.is_some() {
				record.dirty = true;
			}
		}
		self.materials.resend_all();
		for (_, texture) in self.textures.iter_mut() {
			if texture.used && texture.dst.is_some() {
				texture.dirty = true;
			}
		}
		self.camera.dirty = true;
		for handle in std::mem::take(&mut self.inflight_deleted) {
			let recaptured = self.buffers.get(handle).is_some_and(|b| b.mesh.is_some());
			if !recaptured && !self.deleted.contains(&handle) {
				self.deleted.push(handle);
			}
		}
	}
}
