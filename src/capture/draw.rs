use strum::{EnumCount as _, IntoEnumIterator};

use crate::math::*;
use crate::sync::{Mesh, Topology};
use crate::util::INVALID_ID;

use super::gl::*;
use super::error::*;
use super::{report, AttributeRole, BufferRecord, BufferSlot, CaptureCtx, ResourceTable, VertexLayout};

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum DrawOutcome {
	/// The mesh of the vertex buffer was extracted again.
	Captured,
	/// Same draw as last time against unchanged contents.
	Unchanged,
	/// Drawn into an auxiliary framebuffer, not captured.
	Offscreen,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum IndexType {
	U8,
	U16,
	U32,
}

impl IndexType {
	fn from_gl(ty: GLenum) -> Option<Self> {
		match ty {
			UNSIGNED_BYTE => Some(Self::U8),
			UNSIGNED_SHORT => Some(Self::U16),
			UNSIGNED_INT => Some(Self::U32),
			_ => None,
		}
	}

	fn size(self) -> usize {
		match self {
			Self::U8 => 1,
			Self::U16 => 2,
			Self::U32 => 4,
		}
	}

	fn read(self, bytes: &[u8]) -> u32 {
		match self {
			Self::U8 => bytes[0] as u32,
			Self::U16 => bytemuck::pod_read_unaligned::<u16>(&bytes[..2]) as u32,
			Self::U32 => bytemuck::pod_read_unaligned::<u32>(&bytes[..4]),
		}
	}
}

fn topology(mode: GLenum) -> Option<Topology> {
	match mode {
		TRIANGLES | TRIANGLE_STRIP => Some(Topology::Triangles),
		LINES => Some(Topology::Lines),
		POINTS => Some(Topology::Points),
		_ => None,
	}
}

/// Everything a captured mesh depends on. A draw with an equal signature would extract the same mesh.
#[derive(Clone, Copy, PartialEq, Debug)]
pub(crate) struct DrawSignature {
	mode: GLenum,
	start: GLuint,
	end: GLuint,
	count: usize,
	index_type: GLenum,
	index_offset: usize,
	index_buffer: GLuint,
	index_generation: u64,
	layout: VertexLayout,
	generations: [u64; AttributeRole::COUNT],
	material_id: i32,
}

impl DrawSignature {
	fn call(&self) -> Option<DrawCall> {
		Some(DrawCall {
			mode: self.mode,
			start: self.start,
			end: self.end,
			count: self.count,
			index_type: IndexType::from_gl(self.index_type)?,
			index_offset: self.index_offset,
			index_buffer: self.index_buffer,
		})
	}

	pub fn is_stale(&self, buffers: &ResourceTable<BufferRecord, BufferSlot>) -> bool {
		self.index_generation != generation(buffers, self.index_buffer) || self.generations != generations(buffers, &self.layout)
	}

	fn refreshed(self, buffers: &ResourceTable<BufferRecord, BufferSlot>) -> Self {
		Self {
			index_generation: generation(buffers, self.index_buffer),
			generations: generations(buffers, &self.layout),
			..self
		}
	}
}

fn generation(buffers: &ResourceTable<BufferRecord, BufferSlot>, buffer: GLuint) -> u64 {
	buffers.get(buffer).map_or(0, |b| b.generation)
}

fn generations(buffers: &ResourceTable<BufferRecord, BufferSlot>, layout: &VertexLayout) -> [u64; AttributeRole::COUNT] {
	let mut generations = [0; AttributeRole::COUNT];
	for role in AttributeRole::iter() {
		if let Some(pointer) = layout.get(role) {
			generations[role.index()] = generation(buffers, pointer.buffer);
		}
	}
	generations
}

#[derive(Clone, Copy, Debug)]
struct DrawCall {
	mode: GLenum,
	start: GLuint,
	end: GLuint,
	count: usize,
	index_type: IndexType,
	index_offset: usize,
	index_buffer: GLuint,
}

fn read_indices(buffers: &ResourceTable<BufferRecord, BufferSlot>, buffer: GLuint, ty: IndexType, offset: usize, count: usize) -> CaptureResult<Vec<u32>> {
	let record = buffers.get(buffer).ok_or(CaptureError::NoIndexBuffer)?;
	let len = count.checked_mul(ty.size()).ok_or(CaptureError::IndexDataOutOfRange { buffer })?;
	let bytes = offset
		.checked_add(len)
		.and_then(|end| record.contents().get(offset..end))
		.ok_or(CaptureError::IndexDataOutOfRange { buffer })?;
	Ok(bytes.chunks_exact(ty.size()).map(|b| ty.read(b)).collect())
}

/// Strip order alternates winding; degenerate stitching triangles are dropped.
fn strip_to_triangles(strip: &[u32]) -> Vec<u32> {
	let mut out = Vec::with_capacity(strip.len().saturating_sub(2) * 3);
	for (i, w) in strip.windows(3).enumerate() {
		if w[0] == w[1] || w[1] == w[2] || w[0] == w[2] {
			continue;
		}
		if i % 2 == 0 {
			out.extend_from_slice(&[w[0], w[1], w[2]]);
		} else {
			out.extend_from_slice(&[w[1], w[0], w[2]]);
		}
	}
	out
}

fn read_role(buffers: &ResourceTable<BufferRecord, BufferSlot>, layout: &VertexLayout, role: AttributeRole, start: u32, end: u32) -> Option<Vec<Vec4>> {
	let pointer = layout.get(role)?;
	let data = buffers.get(pointer.buffer)?.contents();
	(start..=end).map(|v| pointer.read(data, v)).collect()
}

fn extract(buffers: &ResourceTable<BufferRecord, BufferSlot>, layout: &VertexLayout, call: &DrawCall, mesh_id: GLuint) -> CaptureResult<Mesh> {
	let topology = topology(call.mode).ok_or(CaptureError::UnsupportedTopology(call.mode))?;
	let mut indices = read_indices(buffers, call.index_buffer, call.index_type, call.index_offset, call.count)?;
	for index in &mut indices {
		if *index < call.start || *index > call.end {
			return Err(CaptureError::IndexOutOfRange { index: *index, start: call.start, end: call.end });
		}
		*index -= call.start;
	}
	if call.mode == TRIANGLE_STRIP {
		indices = strip_to_triangles(&indices);
	}

	let pointer = layout.get(AttributeRole::Position).ok_or(CaptureError::NoPositionAttribute)?;
	let data = buffers.get(pointer.buffer).map(|b| b.contents()).unwrap_or_default();
	let mut mesh = Mesh::new(mesh_id);
	mesh.topology = topology;
	mesh.indices = indices;
	for vertex in call.start..=call.end {
		let p = pointer.read(data, vertex).ok_or(CaptureError::VertexDataOutOfRange { buffer: pointer.buffer, vertex })?;
		mesh.points.push(p.truncate());
	}

	for role in AttributeRole::iter().skip(1) {
		let Some(values) = read_role(buffers, layout, role, call.start, call.end) else {
			if layout.get(role).is_some() {
				log::debug!("buffer {mesh_id}: dropping unreadable {role:?} attribute");
			}
			continue;
		};
		match role {
			AttributeRole::Normal => mesh.normals = values.iter().map(|v| v.truncate()).collect(),
			AttributeRole::TexCoord => mesh.uvs = values.iter().map(|v| v.xy()).collect(),
			AttributeRole::Color => mesh.colors = values,
			AttributeRole::Position => {},
		}
	}
	Ok(mesh)
}

impl CaptureCtx {
	/// `indices` is the byte offset into the bound element array buffer.
	pub fn on_draw_range_elements(
		&mut self, mode: GLenum, start: GLuint, end: GLuint, count: GLsizei, ty: GLenum, indices: usize,
	) -> CaptureResult<DrawOutcome> {
		report("glDrawRangeElements", self.draw_range_elements(mode, start, end, count, ty, indices))
	}

	/// Like [`on_draw_range_elements`](Self::on_draw_range_elements) with the range taken from the indices themselves.
	pub fn on_draw_elements(&mut self, mode: GLenum, count: GLsizei, ty: GLenum, indices: usize) -> CaptureResult<DrawOutcome> {
		report("glDrawElements", self.draw_elements(mode, count, ty, indices))
	}

	fn draw_elements(&mut self, mode: GLenum, count: GLsizei, ty: GLenum, offset: usize) -> CaptureResult<DrawOutcome> {
		if !self.draw_target_is_main() {
			return Ok(DrawOutcome::Offscreen);
		}
		let index_type = IndexType::from_gl(ty).ok_or(CaptureError::UnsupportedIndexType(ty))?;
		let index_buffer = self.bound_buffer(ELEMENT_ARRAY_BUFFER);
		let values = read_indices(&self.buffers, index_buffer, index_type, offset, count.max(0) as usize)?;
		let (Some(&start), Some(&end)) = (values.iter().min(), values.iter().max()) else {
			return Ok(DrawOutcome::Unchanged);
		};
		self.draw_range_elements(mode, start, end, count, ty, offset)
	}

	fn draw_range_elements(&mut self, mode: GLenum, start: GLuint, end: GLuint, count: GLsizei, ty: GLenum, offset: usize) -> CaptureResult<DrawOutcome> {
		if !self.draw_target_is_main() {
			return Ok(DrawOutcome::Offscreen);
		}
		topology(mode).ok_or(CaptureError::UnsupportedTopology(mode))?;
		let index_type = IndexType::from_gl(ty).ok_or(CaptureError::UnsupportedIndexType(ty))?;
		if end < start {
			return Err(CaptureError::IndexOutOfRange { index: end, start, end });
		}
		let index_buffer = self.bound_buffer(ELEMENT_ARRAY_BUFFER);
		if index_buffer == 0 || !self.buffers.contains(index_buffer) {
			return Err(CaptureError::NoIndexBuffer);
		}
		let layout = self.current_vertex_array().layout();
		let vertex_buffer = layout.get(AttributeRole::Position).ok_or(CaptureError::NoPositionAttribute)?.buffer;

		let program = self.active_program();
		let material_id = if program != 0 { self.update_program_material(program, true) } else { INVALID_ID };

		let signature = DrawSignature {
			mode,
			start,
			end,
			count: count.max(0) as usize,
			index_type: ty,
			index_offset: offset,
			index_buffer,
			index_generation: generation(&self.buffers, index_buffer),
			layout,
			generations: generations(&self.buffers, &layout),
			material_id,
		};
		if self.buffers.get(vertex_buffer).and_then(|b| b.signature.as_ref()) == Some(&signature) {
			return Ok(DrawOutcome::Unchanged);
		}

		let call = DrawCall { mode, start, end, count: signature.count, index_type, index_offset: offset, index_buffer };
		let mut mesh = extract(&self.buffers, &layout, &call, vertex_buffer)?;
		log::debug!("captured buffer {vertex_buffer}: {} vertices, {} indices, material {material_id}", mesh.vertex_count(), mesh.indices.len());

		let record = self.buffers.get_or_create(vertex_buffer).ok_or(CaptureError::NullHandle("buffer"))?;
		mesh.visible = record.visible;
		mesh.material_id = material_id;
		record.mesh = Some(mesh);
		record.material_id = material_id;
		record.signature = Some(signature);
		record.dirty = true;

		self.deleted.retain(|&h| h != vertex_buffer);
		self.materials.touch(material_id);
		Ok(DrawOutcome::Captured)
	}

	/// Repeats the last draw of `buffer` against current contents if anything it read has changed since.
	pub(crate) fn refresh_mesh(&mut self, buffer: GLuint) -> CaptureResult<()> {
		let Some(signature) = self.buffers.get(buffer).and_then(|b| b.signature) else { return Ok(()) };
		if !signature.is_stale(&self.buffers) {
			return Ok(());
		}
		let call = signature.call().ok_or(CaptureError::UnsupportedIndexType(signature.index_type))?;
		let mut mesh = extract(&self.buffers, &signature.layout, &call, buffer)?;
		let signature = signature.refreshed(&self.buffers);
		log::debug!("refreshed buffer {buffer}: {} vertices, {} indices", mesh.vertex_count(), mesh.indices.len());

		let record = self.buffers.get_mut(buffer).ok_or(CaptureError::NullHandle("buffer"))?;
		mesh.visible = record.visible;
		mesh.material_id = signature.material_id;
		record.mesh = Some(mesh);
		record.signature = Some(signature);
		Ok(())
	}
}
