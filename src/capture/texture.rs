use std::sync::Arc;

use crate::sync::{Texture, TextureFormat};
use crate::util::INVALID_ID;

use super::error::*;
use super::gl::*;

pub const MAX_TEXTURE_SLOTS: usize = 32;
pub const MAX_COLOR_ATTACHMENTS: usize = 16;

/// Tracking state of one host texture. The pixels belong to the shared [`Texture`] it points at.
#[derive(Clone, Debug)]
pub struct TextureRecord {
	pub id: i32,
	pub dst: Option<Arc<Texture>>,
	pub dirty: bool,
	pub used: bool,
}

impl Default for TextureRecord {
	fn default() -> Self {
		Self { id: INVALID_ID, dst: None, dirty: true, used: false }
	}
}

pub fn texel_format(format: GLenum, ty: GLenum) -> Option<TextureFormat> {
	match (format, ty) {
		(RED, UNSIGNED_BYTE) => Some(TextureFormat::R8),
		(RG, UNSIGNED_BYTE) => Some(TextureFormat::Rg8),
		(RGB, UNSIGNED_BYTE) => Some(TextureFormat::Rgb8),
		(RGBA, UNSIGNED_BYTE) => Some(TextureFormat::Rgba8),
		(BGRA, UNSIGNED_BYTE) => Some(TextureFormat::Bgra8),
		(RED, FLOAT) => Some(TextureFormat::RF32),
		(RG, FLOAT) => Some(TextureFormat::RgF32),
		(RGB, FLOAT) => Some(TextureFormat::RgbF32),
		(RGBA, FLOAT) => Some(TextureFormat::RgbaF32),
		_ => None,
	}
}

impl TextureRecord {
	/// Replaces the pixel payload. `data` of `None` allocates storage without content.
	pub fn upload(&mut self, width: GLsizei, height: GLsizei, format: GLenum, ty: GLenum, data: Option<&[u8]>) -> CaptureResult<()> {
		if width <= 0 || height <= 0 {
			return Err(CaptureError::InvalidDimensions { width, height });
		}
		let texel = texel_format(format, ty).ok_or(CaptureError::UnsupportedTexelFormat { format, ty })?;
		let Some(data) = data else {
			self.dst = None;
			return Ok(());
		};
		let expected = (width as usize)
			.checked_mul(height as usize)
			.and_then(|n| n.checked_mul(texel.bytes_per_pixel()))
			.ok_or(CaptureError::InvalidDimensions { width, height })?;
		if data.len() < expected {
			return Err(CaptureError::PixelDataTooShort { expected, got: data.len() });
		}
		self.dst = Some(Arc::new(Texture {
			id: self.id,
			name: format!("Texture{}", self.id),
			format: texel,
			width: width as u32,
			height: height as u32,
			data: Arc::from(&data[..expected]),
		}));
		self.dirty = true;
		Ok(())
	}
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum FramebufferSlot {
	Draw,
	Read,
}

impl FramebufferSlot {
	pub fn for_bind(target: GLenum) -> &'static [FramebufferSlot] {
		match target {
			DRAW_FRAMEBUFFER => &[FramebufferSlot::Draw],
			READ_FRAMEBUFFER => &[FramebufferSlot::Read],
			_ => &[FramebufferSlot::Draw, FramebufferSlot::Read],
		}
	}

	pub fn for_attach(target: GLenum) -> FramebufferSlot {
		match target {
			READ_FRAMEBUFFER => FramebufferSlot::Read,
			_ => FramebufferSlot::Draw,
		}
	}
}

#[derive(Clone, Default, Debug, PartialEq)]
pub struct FramebufferRecord {
	pub colors: [GLuint; MAX_COLOR_ATTACHMENTS],
	pub depth_stencil: GLuint,
}

impl FramebufferRecord {
	/// Returns false for attachment points that are not tracked.
	pub fn attach(&mut self, attachment: GLenum, texture: GLuint) -> bool {
		match attachment {
			DEPTH_ATTACHMENT | STENCIL_ATTACHMENT | DEPTH_STENCIL_ATTACHMENT => {
				self.depth_stencil = texture;
				true
			},
			a if (COLOR_ATTACHMENT0..COLOR_ATTACHMENT0 + MAX_COLOR_ATTACHMENTS as GLenum).contains(&a) => {
				self.colors[(a - COLOR_ATTACHMENT0) as usize] = texture;
				true
			},
			_ => false,
		}
	}

	pub fn forget_texture(&mut self, texture: GLuint) {
		for color in &mut self.colors {
			if *color == texture {
				*color = 0;
			}
		}
		if self.depth_stencil == texture {
			self.depth_stencil = 0;
		}
	}

	/// A framebuffer without attachments is the presentable one; anything else is an off-screen pass.
	pub fn is_main_target(&self) -> bool {
		self.depth_stencil == 0 && self.colors.iter().all(|&c| c == 0)
	}
}
