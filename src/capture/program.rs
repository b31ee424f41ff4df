use crate::math::*;
use crate::util::{SparseVec, INVALID_ID};

use super::gl::*;
use super::material::MaterialRecord;
use super::texture::MAX_TEXTURE_SLOTS;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum UniformType {
	Bool,
	Int,
	IntVec(u8),
	Float,
	Vec2,
	Vec3,
	Vec4,
	Mat2,
	Mat3,
	Mat4,
	Sampler,
	Other(GLenum),
}

impl UniformType {
	pub fn from_gl(ty: GLenum) -> Self {
		match ty {
			BOOL => Self::Bool,
			INT => Self::Int,
			INT_VEC2 => Self::IntVec(2),
			INT_VEC3 => Self::IntVec(3),
			INT_VEC4 => Self::IntVec(4),
			FLOAT => Self::Float,
			FLOAT_VEC2 => Self::Vec2,
			FLOAT_VEC3 => Self::Vec3,
			FLOAT_VEC4 => Self::Vec4,
			FLOAT_MAT2 => Self::Mat2,
			FLOAT_MAT3 => Self::Mat3,
			FLOAT_MAT4 => Self::Mat4,
			SAMPLER_2D | SAMPLER_3D | SAMPLER_CUBE => Self::Sampler,
			other => Self::Other(other),
		}
	}
}

/// What a uniform means to the capture, decided from its name.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum UniformRole {
	DiffuseColor,
	SpecularColor,
	BumpScale,
	ColorMap,
	BumpMap,
	SpecularMap,
	TextureSlot(usize),
	ViewMatrix,
	ProjectionMatrix,
	None,
}

/// Splits `"material.u_diffuseColor[2]"` into `("diffusecolor", Some(2))`.
fn normalize_name(name: &str) -> (String, Option<usize>) {
	let (base, index) = match name.strip_suffix(']').and_then(|n| n.rsplit_once('[')) {
		Some((base, index)) => (base, index.parse().ok()),
		None => (name, None),
	};
	let base = base.rsplit('.').next().unwrap_or(base);
	let base = base.strip_prefix("u_").or_else(|| base.strip_prefix("g_")).unwrap_or(base);
	(base.to_ascii_lowercase(), index)
}

impl UniformRole {
	pub fn from_name(name: &str, array_index: usize) -> Self {
		let (base, index) = normalize_name(name);
		let element = index.unwrap_or(0) + array_index;
		match base.as_str() {
			"diffusecolor" | "diffuse" | "basecolor" | "albedo" => Self::DiffuseColor,
			"specularcolor" | "specular" => Self::SpecularColor,
			"bumpscale" | "bumpintensity" | "normalscale" => Self::BumpScale,
			"colormap" | "diffusemap" | "diffusetexture" | "basecolortexture" => Self::ColorMap,
			"bumpmap" | "normalmap" | "bumptexture" => Self::BumpMap,
			"specularmap" | "speculartexture" => Self::SpecularMap,
			"textures" | "texture" | "samplers" | "tex" if element < MAX_TEXTURE_SLOTS => Self::TextureSlot(element),
			"view" | "viewmatrix" | "worldtoview" | "modelview" | "modelviewmatrix" => Self::ViewMatrix,
			"projection" | "projmatrix" | "projectionmatrix" | "viewtoclip" => Self::ProjectionMatrix,
			_ => Self::None,
		}
	}
}

#[derive(Clone, Debug, PartialEq)]
pub struct ActiveUniform {
	pub location: GLint,
	pub name: String,
	pub ty: GLenum,
	pub size: GLint,
}

/// Queries a linked program's uniforms the way the host itself would.
pub trait ProgramIntrospect {
	fn active_uniforms(&mut self, program: GLuint) -> Vec<ActiveUniform>;
}

/// Introspection that knows nothing; every uniform write is ignored.
pub struct NoIntrospection;

impl ProgramIntrospect for NoIntrospection {
	fn active_uniforms(&mut self, _program: GLuint) -> Vec<ActiveUniform> {
		vec![]
	}
}

#[derive(Clone, Debug, PartialEq)]
pub struct Uniform {
	pub name: String,
	pub ty: UniformType,
	pub size: i32,
	pub array_index: usize,
	pub role: UniformRole,
}

/// Last values written to recognized uniforms. Samplers hold texture units.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MaterialParams {
	pub diffuse_color: Vec4,
	pub specular_color: Vec4,
	pub bump_scale: f32,
	pub color_unit: Option<u32>,
	pub bump_unit: Option<u32>,
	pub specular_unit: Option<u32>,
	pub slot_units: [Option<u32>; MAX_TEXTURE_SLOTS],
}

impl Default for MaterialParams {
	fn default() -> Self {
		Self {
			diffuse_color: Vec4::ZERO,
			specular_color: Vec4::ZERO,
			bump_scale: 0.0,
			color_unit: None,
			bump_unit: None,
			specular_unit: None,
			slot_units: [None; MAX_TEXTURE_SLOTS],
		}
	}
}

impl MaterialParams {
	/// Builds the material, turning texture units into texture ids with `texture_id`.
	pub fn resolve(&self, mut texture_id: impl FnMut(u32) -> i32) -> MaterialRecord {
		let mut unit_id = |unit: Option<u32>| unit.map_or(INVALID_ID, &mut texture_id);
		let mut record = MaterialRecord {
			diffuse_color: self.diffuse_color,
			specular_color: self.specular_color,
			bump_scale: self.bump_scale,
			color_map: unit_id(self.color_unit),
			bump_map: unit_id(self.bump_unit),
			specular_map: unit_id(self.specular_unit),
			..Default::default()
		};
		for (slot, unit) in record.texture_slots.iter_mut().zip(self.slot_units) {
			*slot = unit_id(unit);
		}
		record
	}
}

pub struct ProgramRecord {
	pub(crate) uniforms: SparseVec<Uniform>,
	pub params: MaterialParams,
	pub mrec: MaterialRecord,
	pub material_id: i32,
}

impl Default for ProgramRecord {
	fn default() -> Self {
		Self {
			uniforms: SparseVec::new(),
			params: MaterialParams::default(),
			mrec: MaterialRecord::default(),
			material_id: INVALID_ID,
		}
	}
}

impl ProgramRecord {
	/// Replaces the uniform table. Array uniforms take one location per element.
	pub fn link(&mut self, active: Vec<ActiveUniform>) {
		self.uniforms.clear();
		self.params = MaterialParams::default();
		for u in active {
			if u.location < 0 {
				continue;
			}
			let ty = UniformType::from_gl(u.ty);
			let base = u.name.strip_suffix("[0]").unwrap_or(&u.name);
			for element in 0..u.size.max(1) as usize {
				let name = if u.size > 1 { format!("{base}[{element}]") } else { u.name.clone() };
				let role = UniformRole::from_name(base, element);
				self.uniforms.insert(u.location as usize + element, Uniform { name, ty, size: u.size, array_index: element, role });
			}
		}
	}

	pub fn uniform(&self, location: GLint) -> Option<&Uniform> {
		usize::try_from(location).ok().and_then(|l| self.uniforms.get(l))
	}

	pub fn role(&self, location: GLint) -> UniformRole {
		self.uniform(location).map_or(UniformRole::None, |u| u.role)
	}

	pub fn set_int(&mut self, location: GLint, v: GLint) -> bool {
		let unit = u32::try_from(v).ok();
		let target = match self.role(location) {
			UniformRole::ColorMap => &mut self.params.color_unit,
			UniformRole::BumpMap => &mut self.params.bump_unit,
			UniformRole::SpecularMap => &mut self.params.specular_unit,
			UniformRole::TextureSlot(slot) => &mut self.params.slot_units[slot],
			UniformRole::BumpScale => return set_changed(&mut self.params.bump_scale, v as f32),
			_ => return false,
		};
		set_changed(target, unit)
	}

	/// Applies one element of a float vector write. Returns whether material parameters changed.
	pub fn set_floats(&mut self, location: GLint, v: &[f32]) -> bool {
		let color = match *v {
			[r, g, b] => Some(vec4(r, g, b, 1.0)),
			[r, g, b, a] => Some(vec4(r, g, b, a)),
			_ => None,
		};
		match (self.role(location), color, v) {
			(UniformRole::BumpScale, _, [s]) => set_changed(&mut self.params.bump_scale, *s),
			(UniformRole::DiffuseColor, Some(c), _) => set_changed(&mut self.params.diffuse_color, c),
			(UniformRole::SpecularColor, Some(c), _) => set_changed(&mut self.params.specular_color, c),
			_ => false,
		}
	}
}

fn set_changed<T: PartialEq>(dst: &mut T, v: T) -> bool {
	if *dst == v {
		false
	} else {
		*dst = v;
		true
	}
}
