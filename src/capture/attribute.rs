use strum::EnumCount as _;
use strum_macros::{EnumCount, EnumIter};

use crate::math::*;

use super::gl::*;
use super::error::*;

/// What a vertex attribute carries, fixed by attribute index:
/// 0 position, 1 normal, 2 texture coordinate, 3 color.
#[derive(Clone, Copy, PartialEq, Eq, Debug, EnumCount, EnumIter)]
pub enum AttributeRole {
	Position,
	Normal,
	TexCoord,
	Color,
}

impl AttributeRole {
	pub fn from_index(index: u32) -> Option<Self> {
		match index {
			0 => Some(Self::Position),
			1 => Some(Self::Normal),
			2 => Some(Self::TexCoord),
			3 => Some(Self::Color),
			_ => None,
		}
	}

	pub fn index(self) -> usize {
		self as usize
	}
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ComponentType {
	I8, U8, I16, U16, I32, U32, F32,
}

macro_rules! read_int_component {
	($ty:ty, $bytes:expr, $normalized:expr) => {{
		let v: $ty = bytemuck::pod_read_unaligned(&$bytes[..std::mem::size_of::<$ty>()]);
		if $normalized {
			(v as f32 / <$ty>::MAX as f32).max(-1.0)
		} else {
			v as f32
		}
	}};
}

impl ComponentType {
	pub fn from_gl(ty: GLenum) -> Option<Self> {
		match ty {
			BYTE => Some(Self::I8),
			UNSIGNED_BYTE => Some(Self::U8),
			SHORT => Some(Self::I16),
			UNSIGNED_SHORT => Some(Self::U16),
			INT => Some(Self::I32),
			UNSIGNED_INT => Some(Self::U32),
			FLOAT => Some(Self::F32),
			_ => None,
		}
	}

	pub fn size(self) -> usize {
		match self {
			Self::I8 | Self::U8 => 1,
			Self::I16 | Self::U16 => 2,
			Self::I32 | Self::U32 | Self::F32 => 4,
		}
	}

	/// `bytes` must hold at least [`size`](Self::size) bytes.
	fn read(self, bytes: &[u8], normalized: bool) -> f32 {
		match self {
			Self::I8 => read_int_component!(i8, bytes, normalized),
			Self::U8 => read_int_component!(u8, bytes, normalized),
			Self::I16 => read_int_component!(i16, bytes, normalized),
			Self::U16 => read_int_component!(u16, bytes, normalized),
			Self::I32 => read_int_component!(i32, bytes, normalized),
			Self::U32 => read_int_component!(u32, bytes, normalized),
			Self::F32 => bytemuck::pod_read_unaligned::<f32>(&bytes[..4]),
		}
	}
}

/// Where one attribute's values live inside a buffer. The stride is always resolved.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct AttributePointer {
	/// Source buffer, 0 when the attribute is fed through a vertex buffer binding.
	pub buffer: GLuint,
	pub components: usize,
	pub ty: ComponentType,
	pub normalized: bool,
	pub offset: usize,
	pub stride: usize,
}

impl AttributePointer {
	/// Builds a pointer from host parameters. A stride of zero means tightly packed.
	pub fn new(buffer: GLuint, size: GLint, ty: GLenum, normalized: bool, stride: GLsizei, offset: usize) -> CaptureResult<Self> {
		let ty = ComponentType::from_gl(ty).ok_or(CaptureError::UnsupportedComponentType(ty))?;
		if !(1..=4).contains(&size) {
			return Err(CaptureError::InvalidComponentCount(size));
		}
		let components = size as usize;
		let stride = if stride <= 0 { components * ty.size() } else { stride as usize };
		Ok(Self { buffer, components, ty, normalized, offset, stride })
	}

	pub fn byte_size(&self) -> usize {
		self.components * self.ty.size()
	}

	/// Decodes the attribute of `vertex`, filling absent components with (0, 0, 0, 1).
	pub fn read(&self, data: &[u8], vertex: u32) -> Option<Vec4> {
		let start = (vertex as usize).checked_mul(self.stride)?.checked_add(self.offset)?;
		let bytes = data.get(start..start.checked_add(self.byte_size())?)?;
		let mut v = [0.0, 0.0, 0.0, 1.0];
		for (i, chunk) in bytes.chunks_exact(self.ty.size()).enumerate() {
			v[i] = self.ty.read(chunk, self.normalized);
		}
		Some(Vec4::from_array(v))
	}
}

#[derive(Clone, Copy, Default, Debug, PartialEq)]
pub struct VertexAttrib {
	pub enabled: bool,
	pub pointer: Option<AttributePointer>,
}

/// The pointers that feed each role for one draw. Disabled attributes are absent.
#[derive(Clone, Copy, Default, Debug, PartialEq)]
pub struct VertexLayout {
	pub roles: [Option<AttributePointer>; AttributeRole::COUNT],
}

impl VertexLayout {
	pub fn get(&self, role: AttributeRole) -> Option<&AttributePointer> {
		self.roles[role.index()].as_ref()
	}
}
