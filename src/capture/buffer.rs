use crate::sync::Mesh;
use crate::util::{ByteRange, INVALID_ID};

use super::gl::*;
use super::error::*;
use super::draw::DrawSignature;

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum BufferSlot {
	Target(GLenum),
	Indexed(GLenum, GLuint),
}

pub struct BufferRecord {
	/// Host-side contents as far as they have been observed.
	pub data: Vec<u8>,
	/// Contents confirmed by the host while a mapping is open.
	pub tmp_data: Vec<u8>,
	pub(crate) mapped: Option<ByteRange>,
	pub stride: usize,
	pub dirty: bool,
	pub visible: bool,
	pub material_id: i32,
	pub mesh: Option<Mesh>,
	/// Bumped on every change to the contents.
	pub generation: u64,
	pub(crate) signature: Option<DrawSignature>,
}

impl Default for BufferRecord {
	fn default() -> Self {
		Self {
			data: vec![],
			tmp_data: vec![],
			mapped: None,
			stride: 0,
			dirty: false,
			visible: true,
			material_id: INVALID_ID,
			mesh: None,
			generation: 0,
			signature: None,
		}
	}
}

/// Converts host offset/size parameters, rejecting negative values.
pub(crate) fn byte_range(offset: GLintptr, len: GLsizeiptr) -> CaptureResult<ByteRange> {
	if offset < 0 || len < 0 {
		return Err(CaptureError::InvalidRange { offset, len });
	}
	Ok(ByteRange::new(offset as usize, len as usize))
}

impl BufferRecord {
	/// Reallocates the storage. Bytes past the end of `data` are zeroed.
	pub fn upload(&mut self, size: usize, data: Option<&[u8]>) {
		self.data.clear();
		self.data.resize(size, 0);
		if let Some(data) = data {
			let n = data.len().min(size);
			self.data[..n].copy_from_slice(&data[..n]);
		}
		// reallocation implicitly ends any mapping
		self.mapped = None;
		self.tmp_data.clear();
		self.touch();
		self.visible = true;
	}

	fn touch(&mut self) {
		self.generation += 1;
		self.dirty = true;
	}

	pub fn write(&mut self, handle: GLuint, offset: usize, bytes: &[u8]) -> CaptureResult<()> {
		let range = ByteRange::new(offset, bytes.len());
		if !range.fits_in(self.data.len()) {
			return Err(CaptureError::SubDataOutOfRange { buffer: handle, offset, len: bytes.len(), size: self.data.len() });
		}
		self.data[range.as_range()].copy_from_slice(bytes);
		// sub-data writes are complete on return, mapping or not
		if self.mapped.is_some() && range.fits_in(self.tmp_data.len()) {
			self.tmp_data[range.as_range()].copy_from_slice(bytes);
		}
		self.touch();
		Ok(())
	}

	pub(crate) fn map(&mut self, handle: GLuint, range: ByteRange) -> CaptureResult<&mut [u8]> {
		if self.mapped.is_some() {
			return Err(CaptureError::AlreadyMapped(handle));
		}
		let end = range.end().ok_or(CaptureError::SubDataOutOfRange {
			buffer: handle, offset: range.offset, len: range.len, size: self.data.len(),
		})?;
		if self.data.len() < end {
			self.data.resize(end, 0);
		}
		self.tmp_data.clear();
		self.tmp_data.extend_from_slice(&self.data);
		self.mapped = Some(range);
		Ok(&mut self.data[range.as_range()])
	}

	pub fn unmap(&mut self, handle: GLuint) -> CaptureResult<()> {
		if self.mapped.take().is_none() {
			return Err(CaptureError::NotMapped(handle));
		}
		self.tmp_data.clear();
		self.touch();
		Ok(())
	}

	/// Confirms host writes to `range`, given relative to the start of the mapping.
	pub(crate) fn flush(&mut self, handle: GLuint, range: ByteRange) -> CaptureResult<()> {
		let mapped = self.mapped.ok_or(CaptureError::NotMapped(handle))?;
		if !range.fits_in(mapped.len) {
			return Err(CaptureError::FlushOutOfRange { buffer: handle, offset: range.offset, len: range.len });
		}
		let abs = ByteRange::new(mapped.offset + range.offset, range.len);
		self.tmp_data[abs.as_range()].copy_from_slice(&self.data[abs.as_range()]);
		self.touch();
		Ok(())
	}

	pub fn is_mapped(&self) -> bool {
		self.mapped.is_some()
	}

	/// Bytes to read vertices and indices from: the confirmed copy while mapped, the storage otherwise.
	pub fn contents(&self) -> &[u8] {
		if self.mapped.is_some() {
			&self.tmp_data
		} else {
			&self.data
		}
	}
}
