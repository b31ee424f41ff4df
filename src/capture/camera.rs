use crate::math::*;
use crate::sync::Camera;

const EPSILON: f32 = 1e-5;

/// Camera state recovered from view and projection uniforms.
#[derive(Clone, Debug, PartialEq)]
pub struct CameraRecord {
	pub position: Vec3,
	pub rotation: Quat,
	/// Vertical field of view in degrees.
	pub fov: f32,
	pub near_plane: f32,
	pub far_plane: f32,
	pub dirty: bool,
}

impl Default for CameraRecord {
	fn default() -> Self {
		Self {
			position: Vec3::ZERO,
			rotation: Quat::IDENTITY,
			fov: 60.0,
			near_plane: 0.01,
			far_plane: 100.0,
			dirty: false,
		}
	}
}

impl CameraRecord {
	pub fn set_view(&mut self, view: Mat4) -> bool {
		if view.determinant().abs() < EPSILON {
			return false;
		}
		let (_, rotation, position) = view.inverse().to_scale_rotation_translation();
		if self.position.abs_diff_eq(position, EPSILON) && self.rotation.abs_diff_eq(rotation, EPSILON) {
			return false;
		}
		self.position = position;
		self.rotation = rotation;
		self.dirty = true;
		true
	}

	/// Takes fov and clip planes from a perspective projection. Other projections are ignored.
	pub fn set_projection(&mut self, proj: Mat4) -> bool {
		if (proj.z_axis.w + 1.0).abs() > EPSILON || proj.y_axis.y.abs() < EPSILON {
			return false;
		}
		let fov = (2.0 * (1.0 / proj.y_axis.y).atan()).to_degrees();
		let near = proj.w_axis.z / (proj.z_axis.z - 1.0);
		let far = proj.w_axis.z / (proj.z_axis.z + 1.0);
		if !near.is_finite() || !far.is_finite() {
			return false;
		}
		let same = (self.fov - fov).abs() < EPSILON
			&& (self.near_plane - near).abs() < EPSILON
			&& (self.far_plane - far).abs() < EPSILON;
		if same {
			return false;
		}
		self.fov = fov;
		self.near_plane = near;
		self.far_plane = far;
		self.dirty = true;
		true
	}

	pub fn to_scene(&self, path: &str, scale: f32) -> Camera {
		Camera {
			path: String::from(path),
			position: self.position * scale,
			rotation: self.rotation,
			fov: self.fov,
			near_plane: self.near_plane * scale,
			far_plane: self.far_plane * scale,
		}
	}
}
