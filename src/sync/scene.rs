use std::sync::Arc;

use serde::Serialize;

use crate::math::*;
use crate::util::INVALID_ID;

#[derive(Default, Clone, Copy, PartialEq, Eq, Debug, Serialize)]
pub enum Topology {
	Points,
	Lines,
	#[default]
	Triangles,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Mesh {
	pub id: u32,
	pub path: String,
	pub visible: bool,
	pub topology: Topology,
	pub points: Vec<Vec3>,
	pub normals: Vec<Vec3>,
	pub uvs: Vec<Vec2>,
	pub colors: Vec<Vec4>,
	pub indices: Vec<u32>,
	pub material_id: i32,
}

impl Mesh {
	pub fn new(id: u32) -> Self {
		Self {
			id,
			path: mesh_path(id),
			visible: true,
			topology: Topology::Triangles,
			points: vec![],
			normals: vec![],
			uvs: vec![],
			colors: vec![],
			indices: vec![],
			material_id: INVALID_ID,
		}
	}

	pub fn vertex_count(&self) -> usize {
		self.points.len()
	}

	pub fn scaled(&self, scale: f32) -> Self {
		let mut mesh = self.clone();
		for p in &mut mesh.points {
			*p *= scale;
		}
		mesh
	}
}

pub fn mesh_path(id: u32) -> String {
	format!("/Buffer{id}")
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Material {
	pub id: i32,
	pub name: String,
	pub diffuse_color: Vec4,
	pub specular_color: Vec4,
	pub bump_scale: f32,
	pub color_map: i32,
	pub bump_map: i32,
	pub specular_map: i32,
	/// Texture ids of the generic slots that hold a texture.
	pub texture_slots: Vec<(usize, i32)>,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize)]
pub enum TextureFormat {
	R8, Rg8, Rgb8, Rgba8, Bgra8,
	RF32, RgF32, RgbF32, RgbaF32,
}

impl TextureFormat {
	pub fn bytes_per_pixel(self) -> usize {
		match self {
			TextureFormat::R8 => 1,
			TextureFormat::Rg8 => 2,
			TextureFormat::Rgb8 => 3,
			TextureFormat::Rgba8 | TextureFormat::Bgra8 => 4,
			TextureFormat::RF32 => 4,
			TextureFormat::RgF32 => 8,
			TextureFormat::RgbF32 => 12,
			TextureFormat::RgbaF32 => 16,
		}
	}
}

/// Pixel payload of a captured texture.
///
/// Shared by reference between the tracker and in-flight snapshots; a new upload replaces the whole value.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Texture {
	pub id: i32,
	pub name: String,
	pub format: TextureFormat,
	pub width: u32,
	pub height: u32,
	pub data: Arc<[u8]>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Camera {
	pub path: String,
	pub position: Vec3,
	pub rotation: Quat,
	pub fov: f32,
	pub near_plane: f32,
	pub far_plane: f32,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DeletedMesh {
	pub id: u32,
	pub path: String,
}

impl DeletedMesh {
	pub fn new(id: u32) -> Self {
		Self { id, path: mesh_path(id) }
	}
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct SceneBatch {
	pub meshes: Vec<Mesh>,
	pub materials: Vec<Material>,
	pub textures: Vec<Arc<Texture>>,
	pub camera: Option<Camera>,
	pub deleted: Vec<DeletedMesh>,
}

impl SceneBatch {
	pub fn is_empty(&self) -> bool {
		self.meshes.is_empty()
			&& self.materials.is_empty()
			&& self.textures.is_empty()
			&& self.camera.is_none()
			&& self.deleted.is_empty()
	}
}
