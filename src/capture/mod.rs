//! Mirrors the host's resource calls and turns them into scene data.
//!
//! [`CaptureCtx`] is the whole tracked state. The hook glue calls one `on_*` handler per intercepted host call, after
//! or alongside the real call, and [`CaptureCtx::send`] (or [`CaptureCtx::on_flush`] with auto sync) hands what
//! changed to the scene service.
//!
//! Handlers never panic. A call that cannot be mirrored is logged and returned as a [`CaptureError`]; the glue is free
//! to ignore it since the host call is unaffected.

pub mod gl;
mod error;
mod resource;
mod buffer;
mod attribute;
mod vertex_array;
mod texture;
mod material;
mod program;
mod camera;
mod draw;
mod emit;

pub use error::*;
pub use resource::*;
pub use buffer::*;
pub use attribute::*;
pub use vertex_array::*;
pub use texture::*;
pub use material::*;
pub use program::*;
pub use camera::*;
pub use draw::DrawOutcome;
pub use emit::SendOutcome;

use gl::*;

use crate::math::*;
use crate::settings::Settings;
use crate::sync::{AsyncSceneSender, Mesh, SceneClient};
use crate::util::INVALID_ID;

fn report<T>(call: &str, result: CaptureResult<T>) -> CaptureResult<T> {
	if let Err(e) = &result {
		log::warn!("{call}: {e}");
	}
	result
}

macro_rules! uniform_vector_handlers {
	($($n:literal),+) => {
		paste::paste! {
			$(
				pub fn [<on_uniform_ $n fv>](&mut self, location: GLint, count: GLsizei, value: &[GLfloat]) -> CaptureResult<()> {
					report(concat!("glUniform", $n, "fv"), self.uniform_fv(location, $n, count, value))
				}
			)+
		}
	};
}

macro_rules! uniform_matrix_handlers {
	($($n:literal),+) => {
		paste::paste! {
			$(
				pub fn [<on_uniform_matrix_ $n fv>](&mut self, location: GLint, count: GLsizei, transpose: GLboolean, value: &[GLfloat]) -> CaptureResult<()> {
					report(concat!("glUniformMatrix", $n, "fv"), self.uniform_matrix_fv(location, $n, count, transpose, value))
				}
			)+
		}
	};
}

pub struct CaptureCtx {
	settings: Settings,

	pub(crate) buffers: ResourceTable<BufferRecord, BufferSlot>,
	/// Buffers whose meshes were deleted since the last snapshot.
	pub(crate) deleted: Vec<GLuint>,
	pub(crate) inflight_deleted: Vec<GLuint>,

	pub(crate) vertex_arrays: ResourceTable<VertexArrayRecord, ()>,
	default_vertex_array: VertexArrayRecord,

	active_texture: u32,
	pub(crate) textures: ResourceTable<TextureRecord, u32>,
	next_texture_id: i32,

	pub(crate) framebuffers: ResourceTable<FramebufferRecord, FramebufferSlot>,

	pub(crate) programs: ResourceTable<ProgramRecord, ()>,
	introspect: Box<dyn ProgramIntrospect>,
	pub(crate) materials: MaterialTable,

	pub(crate) camera: CameraRecord,
	pub(crate) sender: AsyncSceneSender,
}

impl CaptureCtx {
	pub fn new(settings: Settings, client: impl SceneClient + 'static, introspect: impl ProgramIntrospect + 'static) -> Self {
		Self {
			settings,
			buffers: ResourceTable::new("buffer"),
			deleted: vec![],
			inflight_deleted: vec![],
			vertex_arrays: ResourceTable::new("vertex array"),
			default_vertex_array: VertexArrayRecord::default(),
			active_texture: 0,
			textures: ResourceTable::new("texture"),
			next_texture_id: 0,
			framebuffers: ResourceTable::new("framebuffer"),
			programs: ResourceTable::new("program"),
			introspect: Box::new(introspect),
			materials: MaterialTable::new(),
			camera: CameraRecord::default(),
			sender: AsyncSceneSender::new(client),
		}
	}

	pub fn settings(&self) -> &Settings {
		&self.settings
	}

	pub fn settings_mut(&mut self) -> &mut Settings {
		&mut self.settings
	}

	pub fn buffer(&self, handle: GLuint) -> Option<&BufferRecord> {
		self.buffers.get(handle)
	}

	pub fn mesh(&self, buffer: GLuint) -> Option<&Mesh> {
		self.buffers.get(buffer).and_then(|b| b.mesh.as_ref())
	}

	pub fn bound_buffer(&self, target: GLenum) -> GLuint {
		self.buffers.bound(BufferSlot::Target(target))
	}

	pub fn bound_framebuffer(&self, slot: FramebufferSlot) -> GLuint {
		self.framebuffers.bound(slot)
	}

	pub fn framebuffer(&self, handle: GLuint) -> Option<&FramebufferRecord> {
		self.framebuffers.get(handle)
	}

	pub fn texture(&self, handle: GLuint) -> Option<&TextureRecord> {
		self.textures.get(handle)
	}

	pub fn bound_texture(&self, unit: u32) -> GLuint {
		self.textures.bound(unit)
	}

	pub fn active_program(&self) -> GLuint {
		self.programs.bound(())
	}

	pub fn program(&self, handle: GLuint) -> Option<&ProgramRecord> {
		self.programs.get(handle)
	}

	pub fn material(&self, id: i32) -> Option<&MaterialRecord> {
		self.materials.get(id)
	}

	pub fn camera(&self) -> &CameraRecord {
		&self.camera
	}

	pub fn bound_vertex_array(&self) -> GLuint {
		self.vertex_arrays.bound(())
	}

	pub(crate) fn current_vertex_array(&self) -> &VertexArrayRecord {
		match self.vertex_arrays.bound_record(()) {
			Some((_, vao)) => vao,
			None => &self.default_vertex_array,
		}
	}

	fn current_vertex_array_mut(&mut self) -> &mut VertexArrayRecord {
		let handle = self.vertex_arrays.bound(());
		match self.vertex_arrays.get_or_create(handle) {
			Some(vao) => vao,
			None => &mut self.default_vertex_array,
		}
	}

	fn queue_mesh_deletion(&mut self, handle: GLuint, record: &BufferRecord) {
		if record.mesh.is_some() && !self.deleted.contains(&handle) {
			self.deleted.push(handle);
		}
	}

	// textures

	pub fn on_gen_textures(&mut self, textures: &[GLuint]) {
		self.textures.create(textures);
	}

	pub fn on_delete_textures(&mut self, textures: &[GLuint]) {
		for (handle, _) in self.textures.destroy(textures) {
			for (_, fb) in self.framebuffers.iter_mut() {
				fb.forget_texture(handle);
			}
		}
	}

	pub fn on_active_texture(&mut self, texture: GLenum) -> CaptureResult<()> {
		let unit = texture.wrapping_sub(TEXTURE0);
		if unit as usize >= MAX_TEXTURE_SLOTS {
			return report("glActiveTexture", Err(CaptureError::TextureUnitOutOfRange(unit)));
		}
		self.active_texture = unit;
		Ok(())
	}

	pub fn on_bind_texture(&mut self, _target: GLenum, texture: GLuint) {
		self.textures.bind(self.active_texture, texture);
		self.texture_id(texture);
	}

	#[allow(clippy::too_many_arguments)]
	pub fn on_tex_image_2d(
		&mut self, _target: GLenum, level: GLint, _internalformat: GLint, width: GLsizei, height: GLsizei, _border: GLint,
		format: GLenum, ty: GLenum, data: Option<&[u8]>,
	) -> CaptureResult<()> {
		report("glTexImage2D", self.tex_image_2d(level, width, height, format, ty, data))
	}

	fn tex_image_2d(&mut self, level: GLint, width: GLsizei, height: GLsizei, format: GLenum, ty: GLenum, data: Option<&[u8]>) -> CaptureResult<()> {
		if level != 0 {
			return Ok(());
		}
		let unit = self.active_texture;
		let handle = self.textures.bound(unit);
		if handle == 0 {
			return Err(CaptureError::NoTextureBound(unit));
		}
		self.texture_id(handle);
		let texture = self.textures.get_or_create(handle).ok_or(CaptureError::NoTextureBound(unit))?;
		texture.upload(width, height, format, ty, data)
	}

	/// Exported id of a texture, allocated on first use.
	pub(crate) fn texture_id(&mut self, handle: GLuint) -> i32 {
		let next = &mut self.next_texture_id;
		match self.textures.get_or_create(handle) {
			Some(texture) => {
				if texture.id == INVALID_ID {
					texture.id = *next;
					*next += 1;
				}
				texture.id
			},
			None => INVALID_ID,
		}
	}

	// framebuffers

	pub fn on_gen_framebuffers(&mut self, framebuffers: &[GLuint]) {
		self.framebuffers.create(framebuffers);
	}

	pub fn on_bind_framebuffer(&mut self, target: GLenum, framebuffer: GLuint) {
		for &slot in FramebufferSlot::for_bind(target) {
			self.framebuffers.bind(slot, framebuffer);
		}
	}

	pub fn on_delete_framebuffers(&mut self, framebuffers: &[GLuint]) {
		self.framebuffers.destroy(framebuffers);
	}

	pub fn on_framebuffer_texture(&mut self, target: GLenum, attachment: GLenum, texture: GLuint, _level: GLint) -> CaptureResult<()> {
		report("glFramebufferTexture", self.framebuffer_texture(target, attachment, texture))
	}

	pub fn on_framebuffer_texture_2d(
		&mut self, target: GLenum, attachment: GLenum, _textarget: GLenum, texture: GLuint, _level: GLint,
	) -> CaptureResult<()> {
		report("glFramebufferTexture2D", self.framebuffer_texture(target, attachment, texture))
	}

	fn framebuffer_texture(&mut self, target: GLenum, attachment: GLenum, texture: GLuint) -> CaptureResult<()> {
		let (_, fb) = self
			.framebuffers
			.bound_record_mut(FramebufferSlot::for_attach(target))
			.ok_or(CaptureError::NoFramebufferBound(target))?;
		if fb.attach(attachment, texture) {
			Ok(())
		} else {
			Err(CaptureError::UnsupportedAttachment(attachment))
		}
	}

	pub fn draw_target_is_main(&self) -> bool {
		self.framebuffers
			.bound_record(FramebufferSlot::Draw)
			.map_or(true, |(_, fb)| fb.is_main_target())
	}

	// buffers

	pub fn on_gen_buffers(&mut self, buffers: &[GLuint]) {
		for (handle, stale) in self.buffers.create(buffers) {
			self.queue_mesh_deletion(handle, &stale);
		}
	}

	pub fn on_delete_buffers(&mut self, buffers: &[GLuint]) {
		for (handle, record) in self.buffers.destroy(buffers) {
			self.queue_mesh_deletion(handle, &record);
			self.default_vertex_array.forget_buffer(handle);
			for (_, vao) in self.vertex_arrays.iter_mut() {
				vao.forget_buffer(handle);
			}
		}
	}

	pub fn on_bind_buffer(&mut self, target: GLenum, buffer: GLuint) {
		self.buffers.bind(BufferSlot::Target(target), buffer);
		if target == ELEMENT_ARRAY_BUFFER {
			self.current_vertex_array_mut().index_buffer = buffer;
		}
	}

	pub fn on_bind_vertex_buffer(&mut self, bindingindex: GLuint, buffer: GLuint, offset: GLintptr, stride: GLsizei) -> CaptureResult<()> {
		report("glBindVertexBuffer", self.bind_vertex_buffer(bindingindex, buffer, offset, stride))
	}

	fn bind_vertex_buffer(&mut self, bindingindex: GLuint, buffer: GLuint, offset: GLintptr, stride: GLsizei) -> CaptureResult<()> {
		let range = buffer::byte_range(offset, stride as GLsizeiptr)?;
		self.current_vertex_array_mut().set_binding(bindingindex, VertexBufferBinding { buffer, offset: range.offset, stride: range.len })?;
		if let Some(record) = self.buffers.get_or_create(buffer) {
			record.stride = range.len;
		}
		Ok(())
	}

	pub fn on_bind_buffer_base(&mut self, target: GLenum, index: GLuint, buffer: GLuint) {
		self.buffers.bind(BufferSlot::Indexed(target, index), buffer);
		self.buffers.bind(BufferSlot::Target(target), buffer);
	}

	pub fn on_buffer_data(&mut self, target: GLenum, size: GLsizeiptr, data: Option<&[u8]>, _usage: GLenum) -> CaptureResult<()> {
		report("glBufferData", self.buffer_data(target, size, data))
	}

	fn buffer_data(&mut self, target: GLenum, size: GLsizeiptr, data: Option<&[u8]>) -> CaptureResult<()> {
		let size = buffer::byte_range(0, size)?.len;
		let (_, record) = self.buffers.bound_record_mut(BufferSlot::Target(target)).ok_or(CaptureError::NoBufferBound { target })?;
		record.upload(size, data);
		Ok(())
	}

	pub fn on_named_buffer_sub_data(&mut self, buffer: GLuint, offset: GLintptr, size: GLsizeiptr, data: &[u8]) -> CaptureResult<()> {
		report("glNamedBufferSubData", self.named_buffer_sub_data(buffer, offset, size, data))
	}

	fn named_buffer_sub_data(&mut self, buffer: GLuint, offset: GLintptr, size: GLsizeiptr, data: &[u8]) -> CaptureResult<()> {
		let range = buffer::byte_range(offset, size)?;
		let bytes = data.get(..range.len).ok_or(CaptureError::InvalidRange { offset, len: size })?;
		let record = self.buffers.get_or_create(buffer).ok_or(CaptureError::NullHandle("buffer"))?;
		record.write(buffer, range.offset, bytes)
	}

	pub fn on_map_buffer(&mut self, target: GLenum, _access: GLenum) -> CaptureResult<&mut [u8]> {
		let size = self.buffers.bound_record(BufferSlot::Target(target)).map_or(0, |(_, b)| b.data.len());
		report("glMapBuffer", self.map_buffer(target, 0, size as GLsizeiptr))
	}

	pub fn on_map_buffer_range(&mut self, target: GLenum, offset: GLintptr, length: GLsizeiptr, _access: GLbitfield) -> CaptureResult<&mut [u8]> {
		report("glMapBufferRange", self.map_buffer(target, offset, length))
	}

	fn map_buffer(&mut self, target: GLenum, offset: GLintptr, length: GLsizeiptr) -> CaptureResult<&mut [u8]> {
		let range = buffer::byte_range(offset, length)?;
		let (handle, record) = self.buffers.bound_record_mut(BufferSlot::Target(target)).ok_or(CaptureError::NoBufferBound { target })?;
		record.map(handle, range)
	}

	pub fn on_unmap_buffer(&mut self, target: GLenum) -> CaptureResult<()> {
		report("glUnmapBuffer", self.unmap_buffer(target))
	}

	fn unmap_buffer(&mut self, target: GLenum) -> CaptureResult<()> {
		let (handle, record) = self.buffers.bound_record_mut(BufferSlot::Target(target)).ok_or(CaptureError::NoBufferBound { target })?;
		record.unmap(handle)
	}

	pub fn on_flush_mapped_buffer_range(&mut self, target: GLenum, offset: GLintptr, length: GLsizeiptr) -> CaptureResult<()> {
		report("glFlushMappedBufferRange", self.flush_mapped_buffer_range(target, offset, length))
	}

	fn flush_mapped_buffer_range(&mut self, target: GLenum, offset: GLintptr, length: GLsizeiptr) -> CaptureResult<()> {
		let range = buffer::byte_range(offset, length)?;
		let (handle, record) = self.buffers.bound_record_mut(BufferSlot::Target(target)).ok_or(CaptureError::NoBufferBound { target })?;
		record.flush(handle, range)
	}

	// vertex arrays

	pub fn on_gen_vertex_arrays(&mut self, arrays: &[GLuint]) {
		self.vertex_arrays.create(arrays);
	}

	pub fn on_delete_vertex_arrays(&mut self, arrays: &[GLuint]) {
		let bound = self.vertex_arrays.bound(());
		self.vertex_arrays.destroy(arrays);
		if bound != 0 && arrays.contains(&bound) {
			self.on_bind_vertex_array(0);
		}
	}

	pub fn on_bind_vertex_array(&mut self, array: GLuint) {
		self.vertex_arrays.bind((), array);
		let index_buffer = self.current_vertex_array().index_buffer;
		self.buffers.bind(BufferSlot::Target(ELEMENT_ARRAY_BUFFER), index_buffer);
	}

	pub fn on_enable_vertex_attrib_array(&mut self, index: GLuint) -> CaptureResult<()> {
		report("glEnableVertexAttribArray", self.current_vertex_array_mut().set_enabled(index, true))
	}

	pub fn on_disable_vertex_attrib_array(&mut self, index: GLuint) -> CaptureResult<()> {
		report("glDisableVertexAttribArray", self.current_vertex_array_mut().set_enabled(index, false))
	}

	/// `pointer` is the byte offset into the bound array buffer.
	pub fn on_vertex_attrib_pointer(
		&mut self, index: GLuint, size: GLint, ty: GLenum, normalized: GLboolean, stride: GLsizei, pointer: usize,
	) -> CaptureResult<()> {
		report("glVertexAttribPointer", self.vertex_attrib_pointer(index, size, ty, normalized, stride, pointer))
	}

	fn vertex_attrib_pointer(&mut self, index: GLuint, size: GLint, ty: GLenum, normalized: bool, stride: GLsizei, offset: usize) -> CaptureResult<()> {
		let buffer = self.buffers.bound(BufferSlot::Target(ARRAY_BUFFER));
		let pointer = AttributePointer::new(buffer, size, ty, normalized, stride, offset)?;
		self.current_vertex_array_mut().set_pointer(index, pointer)?;
		if let Some(record) = self.buffers.get_mut(buffer) {
			record.stride = pointer.stride;
		}
		Ok(())
	}

	// programs

	pub fn on_link_program(&mut self, program: GLuint) -> CaptureResult<()> {
		if program == 0 {
			return report("glLinkProgram", Err(CaptureError::NullHandle("program")));
		}
		let uniforms = self.introspect.active_uniforms(program);
		if let Some(record) = self.programs.get_or_create(program) {
			record.link(uniforms);
		}
		self.update_program_material(program, false);
		Ok(())
	}

	pub fn on_delete_program(&mut self, program: GLuint) {
		self.programs.destroy(&[program]);
	}

	pub fn on_use_program(&mut self, program: GLuint) {
		self.programs.bind((), program);
	}

	fn active_program_mut(&mut self) -> CaptureResult<(GLuint, &mut ProgramRecord)> {
		self.programs.bound_record_mut(()).ok_or(CaptureError::NoActiveProgram)
	}

	pub fn on_uniform_1i(&mut self, location: GLint, v0: GLint) -> CaptureResult<()> {
		report("glUniform1i", self.uniform_1i(location, v0))
	}

	fn uniform_1i(&mut self, location: GLint, v0: GLint) -> CaptureResult<()> {
		let (program, record) = self.active_program_mut()?;
		if record.set_int(location, v0) {
			self.update_program_material(program, false);
		}
		Ok(())
	}

	pub fn on_uniform_1f(&mut self, location: GLint, v0: GLfloat) -> CaptureResult<()> {
		report("glUniform1f", self.uniform_fv(location, 1, 1, &[v0]))
	}

	uniform_vector_handlers!(1, 2, 3, 4);
	uniform_matrix_handlers!(2, 3, 4);

	fn uniform_fv(&mut self, location: GLint, components: usize, count: GLsizei, value: &[GLfloat]) -> CaptureResult<()> {
		let (program, record) = self.active_program_mut()?;
		if location < 0 {
			return Ok(());
		}
		let mut changed = false;
		for (element, v) in value.chunks_exact(components).take(count.max(0) as usize).enumerate() {
			let Some(location) = GLint::try_from(element).ok().and_then(|e| location.checked_add(e)) else { break };
			changed |= record.set_floats(location, v);
		}
		if changed {
			self.update_program_material(program, false);
		}
		Ok(())
	}

	fn uniform_matrix_fv(&mut self, location: GLint, n: usize, count: GLsizei, transpose: bool, value: &[GLfloat]) -> CaptureResult<()> {
		let (_, record) = self.active_program_mut()?;
		if n != 4 || count < 1 {
			return Ok(());
		}
		let role = record.role(location);
		let Some(matrix) = mat4_from_slice(value, transpose) else { return Ok(()) };
		match role {
			UniformRole::ViewMatrix => {
				self.camera.set_view(matrix);
			},
			UniformRole::ProjectionMatrix => {
				self.camera.set_projection(matrix);
			},
			_ => {},
		}
		Ok(())
	}

	/// Re-synthesizes a program's material against the textures bound now and returns its id.
	pub(crate) fn update_program_material(&mut self, program: GLuint, mark_used: bool) -> i32 {
		let Some(params) = self.programs.get(program).map(|p| p.params) else { return INVALID_ID };
		let mrec = params.resolve(|unit| self.unit_texture_id(unit, mark_used));
		let id = self.materials.resolve(&mrec);
		if let Some(record) = self.programs.get_mut(program) {
			record.mrec = mrec;
			record.material_id = id;
		}
		id
	}

	fn unit_texture_id(&mut self, unit: u32, mark_used: bool) -> i32 {
		let handle = self.textures.bound(unit);
		let id = self.texture_id(handle);
		if mark_used {
			if let Some(texture) = self.textures.get_mut(handle) {
				texture.used = true;
			}
		}
		id
	}

	/// Frame boundary. Sends opportunistically when auto sync is on.
	pub fn on_flush(&mut self) -> Option<SendOutcome> {
		if self.settings.auto_sync {
			Some(self.send(false))
		} else {
			None
		}
	}
}
