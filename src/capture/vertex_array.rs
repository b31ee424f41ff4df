use super::attribute::*;
use super::error::*;
use super::gl::*;

pub const MAX_VERTEX_ATTRIBS: usize = 16;

#[derive(Clone, Copy, Default, Debug, PartialEq)]
pub struct VertexBufferBinding {
	pub buffer: GLuint,
	pub offset: usize,
	pub stride: usize,
}

#[derive(Clone, Default, Debug)]
pub struct VertexArrayRecord {
	pub attribs: [VertexAttrib; MAX_VERTEX_ATTRIBS],
	pub bindings: [VertexBufferBinding; MAX_VERTEX_ATTRIBS],
	pub index_buffer: GLuint,
}

impl VertexArrayRecord {
	fn attrib_mut(&mut self, index: GLuint) -> CaptureResult<&mut VertexAttrib> {
		self.attribs.get_mut(index as usize).ok_or(CaptureError::AttributeIndexOutOfRange(index))
	}

	pub fn set_enabled(&mut self, index: GLuint, enabled: bool) -> CaptureResult<()> {
		self.attrib_mut(index)?.enabled = enabled;
		Ok(())
	}

	pub fn set_pointer(&mut self, index: GLuint, pointer: AttributePointer) -> CaptureResult<()> {
		self.attrib_mut(index)?.pointer = Some(pointer);
		Ok(())
	}

	pub fn set_binding(&mut self, index: GLuint, binding: VertexBufferBinding) -> CaptureResult<()> {
		let slot = self.bindings.get_mut(index as usize).ok_or(CaptureError::AttributeIndexOutOfRange(index))?;
		*slot = binding;
		Ok(())
	}

	pub fn forget_buffer(&mut self, buffer: GLuint) {
		for attrib in &mut self.attribs {
			if let Some(pointer) = &mut attrib.pointer {
				if pointer.buffer == buffer {
					pointer.buffer = 0;
				}
			}
		}
		for binding in &mut self.bindings {
			if binding.buffer == buffer {
				*binding = VertexBufferBinding::default();
			}
		}
		if self.index_buffer == buffer {
			self.index_buffer = 0;
		}
	}

	/// Resolves enabled attributes to concrete buffer pointers.
	pub fn layout(&self) -> VertexLayout {
		let mut layout = VertexLayout::default();
		for (index, attrib) in self.attribs.iter().enumerate() {
			let Some(role) = AttributeRole::from_index(index as u32) else { continue };
			if !attrib.enabled {
				continue;
			}
			let Some(mut pointer) = attrib.pointer else { continue };
			if pointer.buffer == 0 {
				let binding = self.bindings[index];
				if binding.buffer == 0 {
					continue;
				}
				pointer.buffer = binding.buffer;
				pointer.offset += binding.offset;
				if binding.stride != 0 {
					pointer.stride = binding.stride;
				}
			}
			layout.roles[role.index()] = Some(pointer);
		}
		layout
	}
}
