//! Boundary to the scene-synchronization service.
//!
//! The capture side only produces [`SceneBatch`]es; how they reach the service is up to a [`SceneClient`].

mod scene;
mod sender;
mod json;

pub use scene::*;
pub use sender::*;
pub use json::*;
