pub use glam::*;

/// Folds values that compare equal but differ bitwise (`-0.0`, NaN payloads)
/// onto one representation.
pub fn canonical_f32(v: f32) -> f32 {
	if v == 0.0 {
		0.0
	} else if v.is_nan() {
		f32::NAN
	} else {
		v
	}
}

pub fn canonical_vec4(v: Vec4) -> Vec4 {
	Vec4::new(canonical_f32(v.x), canonical_f32(v.y), canonical_f32(v.z), canonical_f32(v.w))
}

/// Reads a column-major 4x4 matrix, transposing when asked.
pub fn mat4_from_slice(v: &[f32], transpose: bool) -> Option<Mat4> {
	let cols: &[f32; 16] = v.get(..16)?.try_into().ok()?;
	let m = Mat4::from_cols_array(cols);
	Some(if transpose { m.transpose() } else { m })
}
