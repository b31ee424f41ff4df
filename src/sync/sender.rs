use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;

use crossbeam_channel::Sender;

use crate::settings::ClientSettings;

use super::SceneBatch;

/// Transmits a batch to the scene service. Runs on the sender worker thread.
pub trait SceneClient: Send {
	fn send(&mut self, batch: &SceneBatch, settings: &ClientSettings) -> anyhow::Result<()>;
}

enum Job {
	Send { batch: SceneBatch, settings: ClientSettings },
	Wait(Sender<()>),
}

/// Runs a [`SceneClient`] on a background thread.
///
/// Batches are transmitted in the order they are kicked. Dropping the sender drains the queue and joins the worker.
pub struct AsyncSceneSender {
	jobs: Option<Sender<Job>>,
	pending: Arc<AtomicUsize>,
	failed: Arc<AtomicBool>,
	handle: Option<thread::JoinHandle<()>>,
}

impl AsyncSceneSender {
	pub fn new(mut client: impl SceneClient + 'static) -> Self {
		let (tx, rx) = crossbeam_channel::unbounded::<Job>();
		let pending = Arc::new(AtomicUsize::new(0));
		let failed = Arc::new(AtomicBool::new(false));

		let worker_pending = Arc::clone(&pending);
		let worker_failed = Arc::clone(&failed);
		let handle = thread::spawn(move || {
			log::info!("scene sender started");
			for job in rx.iter() {
				match job {
					Job::Send { batch, settings } => {
						match client.send(&batch, &settings) {
							Ok(()) => log::debug!(
								"sent {} meshes, {} materials, {} textures, {} deletions to {}",
								batch.meshes.len(), batch.materials.len(), batch.textures.len(), batch.deleted.len(),
								settings.endpoint(),
							),
							Err(e) => {
								log::error!("scene send to {} failed: {e:#}", settings.endpoint());
								worker_failed.store(true, Ordering::SeqCst);
							},
						}
						worker_pending.fetch_sub(1, Ordering::SeqCst);
					},
					Job::Wait(reply) => {
						let _ = reply.send(());
					},
				}
			}
			log::info!("scene sender stopped");
		});

		Self { jobs: Some(tx), pending, failed, handle: Some(handle) }
	}

	pub fn is_sending(&self) -> bool {
		self.pending.load(Ordering::SeqCst) > 0
	}

	pub fn kick(&self, batch: SceneBatch, settings: ClientSettings) {
		let Some(jobs) = &self.jobs else { return };
		self.pending.fetch_add(1, Ordering::SeqCst);
		if jobs.send(Job::Send { batch, settings }).is_err() {
			log::error!("scene sender worker is gone, batch dropped");
			self.pending.fetch_sub(1, Ordering::SeqCst);
			self.failed.store(true, Ordering::SeqCst);
		}
	}

	/// Blocks until every batch kicked so far has been handled.
	pub fn wait(&self) {
		let Some(jobs) = &self.jobs else { return };
		let (tx, rx) = crossbeam_channel::bounded(1);
		if jobs.send(Job::Wait(tx)).is_ok() {
			let _ = rx.recv();
		}
	}

	/// Returns whether a send failed since the last call, and clears the flag.
	pub fn take_failure(&self) -> bool {
		self.failed.swap(false, Ordering::SeqCst)
	}
}

impl Drop for AsyncSceneSender {
	fn drop(&mut self) {
		self.jobs = None;
		if let Some(handle) = self.handle.take() {
			if handle.join().is_err() {
				log::error!("scene sender worker panicked");
			}
		}
	}
}

/// Keeps every batch in memory. Useful for offline capture and tests.
#[derive(Clone, Default)]
pub struct MemoryClient {
	batches: Arc<Mutex<Vec<SceneBatch>>>,
}

impl MemoryClient {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn batches(&self) -> Vec<SceneBatch> {
		match self.batches.lock() {
			Ok(batches) => batches.clone(),
			Err(poisoned) => poisoned.into_inner().clone(),
		}
	}

	pub fn take(&self) -> Vec<SceneBatch> {
		match self.batches.lock() {
			Ok(mut batches) => std::mem::take(&mut *batches),
			Err(poisoned) => std::mem::take(&mut *poisoned.into_inner()),
		}
	}
}

impl SceneClient for MemoryClient {
	fn send(&mut self, batch: &SceneBatch, _settings: &ClientSettings) -> anyhow::Result<()> {
		self.batches.lock().map_err(|_| anyhow::anyhow!("batch store poisoned"))?.push(batch.clone());
		Ok(())
	}
}
