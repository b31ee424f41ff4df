use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientSettings {
	pub server: String,
	pub port: u16,
	pub timeout_ms: u64,
}

impl Default for ClientSettings {
	fn default() -> Self {
		Self {
			server: String::from("127.0.0.1"),
			port: 8080,
			timeout_ms: 30_000,
		}
	}
}

impl ClientSettings {
	pub fn endpoint(&self) -> String {
		format!("{}:{}", self.server, self.port)
	}
}

/// Every field may be changed between sends; a snapshot uses the values current when it is composed.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
	pub client: ClientSettings,
	/// Multiplier applied to every exported position.
	pub scale_factor: f32,
	/// Send opportunistically on every frame boundary.
	pub auto_sync: bool,
	pub sync_delete: bool,
	pub sync_camera: bool,
	pub sync_textures: bool,
	pub camera_path: String,
}

impl Default for Settings {
	fn default() -> Self {
		Self {
			client: ClientSettings::default(),
			scale_factor: 100.0,
			auto_sync: false,
			sync_delete: true,
			sync_camera: true,
			sync_textures: true,
			camera_path: String::from("/Main Camera"),
		}
	}
}

impl Settings {
	pub fn from_ron(text: &str) -> anyhow::Result<Self> {
		ron::from_str(text).context("invalid settings")
	}

	pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
		let path = path.as_ref();
		let text = std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
		Self::from_ron(&text)
	}
}
