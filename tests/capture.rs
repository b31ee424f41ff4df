use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use meshtap::bytemuck;
use meshtap::capture::gl::*;
use meshtap::capture::*;
use meshtap::math::*;
use meshtap::settings::ClientSettings;
use meshtap::sync::*;
use meshtap::{Settings, INVALID_ID};

const VBO: GLuint = 5;
const IBO: GLuint = 6;
const PROGRAM: GLuint = 1;
const STRIDE: GLsizei = 48;

const DIFFUSE: GLint = 0;
const COLOR_MAP: GLint = 1;
const VIEW: GLint = 2;
const PROJECTION: GLint = 3;

/// Reports the same uniform table for every program.
struct FixedUniforms;

impl ProgramIntrospect for FixedUniforms {
	fn active_uniforms(&mut self, _program: GLuint) -> Vec<ActiveUniform> {
		let uniform = |location, name: &str, ty| ActiveUniform { location, name: String::from(name), ty, size: 1 };
		vec![
			uniform(DIFFUSE, "u_diffuseColor", FLOAT_VEC4),
			uniform(COLOR_MAP, "u_colorMap", SAMPLER_2D),
			uniform(VIEW, "viewMatrix", FLOAT_MAT4),
			uniform(PROJECTION, "projMatrix", FLOAT_MAT4),
		]
	}
}

/// Fails the first `failures` sends, then records like [`MemoryClient`].
struct FlakyClient {
	failures: Arc<AtomicUsize>,
	inner: MemoryClient,
}

impl SceneClient for FlakyClient {
	fn send(&mut self, batch: &SceneBatch, settings: &ClientSettings) -> anyhow::Result<()> {
		if self.failures.load(Ordering::SeqCst) > 0 {
			self.failures.fetch_sub(1, Ordering::SeqCst);
			anyhow::bail!("connection refused");
		}
		self.inner.send(batch, settings)
	}
}

fn init_logger() {
	let _ = env_logger::builder().is_test(true).try_init();
}

fn new_ctx() -> (CaptureCtx, MemoryClient) {
	init_logger();
	let client = MemoryClient::new();
	let ctx = CaptureCtx::new(Settings::default(), client.clone(), FixedUniforms);
	(ctx, client)
}

/// Position, normal, uv and color interleaved, 48 bytes per vertex.
fn triangle() -> [[f32; 12]; 3] {
	[
		[0.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0],
		[1.0, 0.0, 0.0, 0.0, 0.0, 1.0, 1.0, 0.0, 0.0, 1.0, 0.0, 1.0],
		[0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 1.0, 0.0, 0.0, 1.0, 1.0],
	]
}

fn triangle_bytes() -> Vec<u8> {
	bytemuck::cast_slice(&triangle()).to_vec()
}

fn set_interleaved_layout(ctx: &mut CaptureCtx) {
	for (index, size, offset) in [(0, 3, 0), (1, 3, 12), (2, 2, 24), (3, 4, 32)] {
		ctx.on_vertex_attrib_pointer(index, size, FLOAT, false, STRIDE, offset).unwrap();
		ctx.on_enable_vertex_attrib_array(index).unwrap();
	}
}

fn upload_indices(ctx: &mut CaptureCtx, indices: &[u16]) {
	ctx.on_bind_buffer(ELEMENT_ARRAY_BUFFER, IBO);
	let bytes: &[u8] = bytemuck::cast_slice(indices);
	ctx.on_buffer_data(ELEMENT_ARRAY_BUFFER, bytes.len() as GLsizeiptr, Some(bytes), STATIC_DRAW).unwrap();
}

fn use_program(ctx: &mut CaptureCtx, program: GLuint, diffuse: [f32; 4]) {
	ctx.on_link_program(program).unwrap();
	ctx.on_use_program(program);
	ctx.on_uniform_4fv(DIFFUSE, 1, &diffuse).unwrap();
}

/// Buffer 5 holding the interleaved triangle, buffer 6 its indices, program 1 in use.
fn setup_triangle(ctx: &mut CaptureCtx) {
	ctx.on_gen_buffers(&[VBO, IBO]);
	ctx.on_bind_buffer(ARRAY_BUFFER, VBO);
	let bytes = triangle_bytes();
	ctx.on_buffer_data(ARRAY_BUFFER, bytes.len() as GLsizeiptr, Some(&bytes), STATIC_DRAW).unwrap();
	set_interleaved_layout(ctx);
	upload_indices(ctx, &[0, 1, 2]);
	use_program(ctx, PROGRAM, [1.0, 0.5, 0.25, 1.0]);
}

fn draw_triangle(ctx: &mut CaptureCtx) -> CaptureResult<DrawOutcome> {
	ctx.on_draw_range_elements(TRIANGLES, 0, 2, 3, UNSIGNED_SHORT, 0)
}

fn sent_meshes(client: &MemoryClient) -> Vec<Mesh> {
	client.batches().into_iter().flat_map(|b| b.meshes).collect()
}

#[test]
fn interleaved_triangle_is_captured() {
	let (mut ctx, _client) = new_ctx();
	setup_triangle(&mut ctx);
	assert_eq!(draw_triangle(&mut ctx), Ok(DrawOutcome::Captured));

	let mesh = ctx.mesh(VBO).unwrap();
	let tri = triangle();
	assert_eq!(mesh.vertex_count(), 3);
	assert_eq!(mesh.topology, Topology::Triangles);
	assert_eq!(mesh.indices, vec![0, 1, 2]);
	for (i, v) in tri.iter().enumerate() {
		assert_eq!(mesh.points[i], vec3(v[0], v[1], v[2]));
		assert_eq!(mesh.normals[i], vec3(v[3], v[4], v[5]));
		assert_eq!(mesh.uvs[i], vec2(v[6], v[7]));
		assert_eq!(mesh.colors[i], vec4(v[8], v[9], v[10], v[11]));
	}

	let program = ctx.program(PROGRAM).unwrap();
	assert_ne!(program.material_id, INVALID_ID);
	assert_eq!(mesh.material_id, program.material_id);
	assert_eq!(ctx.material(mesh.material_id), Some(&program.mrec));
	assert_eq!(program.mrec.diffuse_color, vec4(1.0, 0.5, 0.25, 1.0));
}

#[test]
fn repeated_draw_is_unchanged() {
	let (mut ctx, _client) = new_ctx();
	setup_triangle(&mut ctx);
	assert_eq!(draw_triangle(&mut ctx), Ok(DrawOutcome::Captured));
	assert_eq!(draw_triangle(&mut ctx), Ok(DrawOutcome::Unchanged));
	ctx.on_uniform_4fv(DIFFUSE, 1, &[0.0, 0.0, 1.0, 1.0]).unwrap();
	assert_eq!(draw_triangle(&mut ctx), Ok(DrawOutcome::Captured));
}

#[test]
fn offscreen_draws_are_excluded() {
	let (mut ctx, client) = new_ctx();
	setup_triangle(&mut ctx);
	ctx.on_gen_framebuffers(&[7]);
	ctx.on_gen_textures(&[9]);
	ctx.on_bind_framebuffer(FRAMEBUFFER, 7);
	ctx.on_framebuffer_texture_2d(FRAMEBUFFER, COLOR_ATTACHMENT0, TEXTURE_2D, 9, 0).unwrap();
	assert!(!ctx.draw_target_is_main());
	assert_eq!(draw_triangle(&mut ctx), Ok(DrawOutcome::Offscreen));
	ctx.send(true);
	assert!(sent_meshes(&client).is_empty());

	ctx.on_bind_framebuffer(FRAMEBUFFER, 0);
	assert!(ctx.draw_target_is_main());
	assert_eq!(draw_triangle(&mut ctx), Ok(DrawOutcome::Captured));
	assert_eq!(ctx.send(true), SendOutcome::Sent);
	let meshes = sent_meshes(&client);
	assert_eq!(meshes.len(), 1);
	assert_eq!(meshes[0].path, "/Buffer5");
}

#[test]
fn deleting_attachment_restores_main_target() {
	let (mut ctx, _client) = new_ctx();
	ctx.on_gen_framebuffers(&[7]);
	ctx.on_gen_textures(&[9]);
	ctx.on_bind_framebuffer(DRAW_FRAMEBUFFER, 7);
	ctx.on_framebuffer_texture(DRAW_FRAMEBUFFER, DEPTH_ATTACHMENT, 9, 0).unwrap();
	assert!(!ctx.draw_target_is_main());
	ctx.on_delete_textures(&[9]);
	assert!(ctx.draw_target_is_main());
}

#[test]
fn delete_unbinds() {
	let (mut ctx, _client) = new_ctx();
	ctx.on_gen_buffers(&[3]);
	ctx.on_bind_buffer(ARRAY_BUFFER, 3);
	ctx.on_bind_buffer_base(UNIFORM_BUFFER, 1, 3);
	ctx.on_delete_buffers(&[3]);
	assert_eq!(ctx.bound_buffer(ARRAY_BUFFER), 0);
	assert_eq!(ctx.bound_buffer(UNIFORM_BUFFER), 0);
	assert!(ctx.buffer(3).is_none());

	ctx.on_gen_framebuffers(&[2]);
	ctx.on_bind_framebuffer(FRAMEBUFFER, 2);
	ctx.on_delete_framebuffers(&[2]);
	assert_eq!(ctx.bound_framebuffer(FramebufferSlot::Draw), 0);
	assert_eq!(ctx.bound_framebuffer(FramebufferSlot::Read), 0);

	ctx.on_link_program(4).unwrap();
	ctx.on_use_program(4);
	ctx.on_delete_program(4);
	assert_eq!(ctx.active_program(), 0);
	assert_eq!(ctx.on_uniform_1i(COLOR_MAP, 0), Err(CaptureError::NoActiveProgram));
}

#[test]
fn deleted_mesh_is_reported_once() {
	let (mut ctx, client) = new_ctx();
	setup_triangle(&mut ctx);
	draw_triangle(&mut ctx).unwrap();
	ctx.send(true);
	ctx.on_delete_buffers(&[VBO]);
	assert_eq!(ctx.send(true), SendOutcome::Sent);
	assert_eq!(ctx.send(true), SendOutcome::Empty);

	let deleted: Vec<u32> = client.batches().iter().flat_map(|b| b.deleted.iter().map(|d| d.id)).collect();
	assert_eq!(deleted, vec![VBO]);
}

#[test]
fn handles_without_records_are_tolerated() {
	let (mut ctx, _client) = new_ctx();
	ctx.on_bind_buffer(ARRAY_BUFFER, 42);
	ctx.on_buffer_data(ARRAY_BUFFER, 8, None, DYNAMIC_DRAW).unwrap();
	assert_eq!(ctx.buffer(42).unwrap().data.len(), 8);
	ctx.on_delete_buffers(&[0, 77]);
	ctx.on_bind_texture(TEXTURE_2D, 0);
	assert!(matches!(ctx.on_unmap_buffer(ELEMENT_ARRAY_BUFFER), Err(CaptureError::NoBufferBound { .. })));
	assert_eq!(draw_triangle(&mut ctx), Err(CaptureError::NoIndexBuffer));
}

#[test]
fn materials_are_shared_across_programs() {
	let (mut ctx, _client) = new_ctx();
	use_program(&mut ctx, 1, [0.2, 0.4, 0.6, 1.0]);
	use_program(&mut ctx, 2, [0.2, 0.4, 0.6, 1.0]);
	use_program(&mut ctx, 3, [0.9, 0.4, 0.6, 1.0]);
	let id = |ctx: &CaptureCtx, p| ctx.program(p).unwrap().material_id;
	assert_eq!(id(&ctx, 1), id(&ctx, 2));
	assert_ne!(id(&ctx, 1), id(&ctx, 3));

	// writing program 3 back to the shared values finds the existing id
	ctx.on_uniform_4fv(DIFFUSE, 1, &[0.2, 0.4, 0.6, 1.0]).unwrap();
	assert_eq!(id(&ctx, 3), id(&ctx, 1));
}

#[test]
fn mapped_writes_round_trip() {
	let (mut ctx, _client) = new_ctx();
	ctx.on_gen_buffers(&[VBO, IBO]);
	ctx.on_bind_buffer(ARRAY_BUFFER, VBO);
	let bytes = triangle_bytes();
	ctx.on_buffer_data(ARRAY_BUFFER, bytes.len() as GLsizeiptr, None, DYNAMIC_DRAW).unwrap();
	set_interleaved_layout(&mut ctx);
	upload_indices(&mut ctx, &[0, 1, 2]);
	use_program(&mut ctx, PROGRAM, [1.0; 4]);

	let view = ctx.on_map_buffer_range(ARRAY_BUFFER, 0, bytes.len() as GLsizeiptr, MAP_WRITE_BIT).unwrap();
	view.copy_from_slice(&bytes);
	assert!(matches!(ctx.on_map_buffer(ARRAY_BUFFER, WRITE_ONLY), Err(CaptureError::AlreadyMapped(VBO))));
	ctx.on_unmap_buffer(ARRAY_BUFFER).unwrap();
	assert_eq!(ctx.buffer(VBO).unwrap().contents(), &bytes[..]);

	draw_triangle(&mut ctx).unwrap();
	let mesh = ctx.mesh(VBO).unwrap();
	assert_eq!(mesh.points, vec![Vec3::ZERO, Vec3::X, Vec3::Y]);
	assert_eq!(mesh.colors[2], vec4(0.0, 0.0, 1.0, 1.0));
}

#[test]
fn draws_while_mapped_see_flushed_ranges_only() {
	let (mut ctx, _client) = new_ctx();
	ctx.on_gen_buffers(&[VBO, IBO]);
	ctx.on_bind_buffer(ARRAY_BUFFER, VBO);
	let bytes = triangle_bytes();
	ctx.on_buffer_data(ARRAY_BUFFER, bytes.len() as GLsizeiptr, None, DYNAMIC_DRAW).unwrap();
	set_interleaved_layout(&mut ctx);
	upload_indices(&mut ctx, &[0, 1, 2]);

	let view = ctx.on_map_buffer_range(ARRAY_BUFFER, 0, bytes.len() as GLsizeiptr, MAP_WRITE_BIT | MAP_FLUSH_EXPLICIT_BIT).unwrap();
	view.copy_from_slice(&bytes);
	draw_triangle(&mut ctx).unwrap();
	assert_eq!(ctx.mesh(VBO).unwrap().points[1], Vec3::ZERO);

	// second vertex only
	ctx.on_flush_mapped_buffer_range(ARRAY_BUFFER, STRIDE as GLintptr, STRIDE as GLsizeiptr).unwrap();
	assert_eq!(draw_triangle(&mut ctx), Ok(DrawOutcome::Captured));
	let mesh = ctx.mesh(VBO).unwrap();
	assert_eq!(mesh.points[1], Vec3::X);
	assert_eq!(mesh.points[2], Vec3::ZERO);
	assert!(ctx.buffer(VBO).unwrap().is_mapped());
}

#[test]
fn out_of_range_sub_data_is_rejected() {
	let (mut ctx, _client) = new_ctx();
	ctx.on_gen_buffers(&[VBO]);
	ctx.on_bind_buffer(ARRAY_BUFFER, VBO);
	ctx.on_buffer_data(ARRAY_BUFFER, 4, Some(&[1, 2, 3, 4]), STATIC_DRAW).unwrap();
	let result = ctx.on_named_buffer_sub_data(VBO, 2, 4, &[9, 9, 9, 9]);
	assert!(matches!(result, Err(CaptureError::SubDataOutOfRange { .. })));
	assert_eq!(ctx.buffer(VBO).unwrap().data, vec![1, 2, 3, 4]);
	ctx.on_named_buffer_sub_data(VBO, 2, 2, &[7, 8]).unwrap();
	assert_eq!(ctx.buffer(VBO).unwrap().data, vec![1, 2, 7, 8]);
}

#[test]
fn disabled_attribute_stops_contributing() {
	let (mut ctx, _client) = new_ctx();
	setup_triangle(&mut ctx);
	draw_triangle(&mut ctx).unwrap();
	assert_eq!(ctx.mesh(VBO).unwrap().normals.len(), 3);

	ctx.on_disable_vertex_attrib_array(1).unwrap();
	assert_eq!(draw_triangle(&mut ctx), Ok(DrawOutcome::Captured));
	let mesh = ctx.mesh(VBO).unwrap();
	assert!(mesh.normals.is_empty());
	assert_eq!(mesh.uvs.len(), 3);

	ctx.on_disable_vertex_attrib_array(0).unwrap();
	assert_eq!(draw_triangle(&mut ctx), Err(CaptureError::NoPositionAttribute));
}

#[test]
fn indices_outside_the_range_skip_the_draw() {
	let (mut ctx, _client) = new_ctx();
	setup_triangle(&mut ctx);
	upload_indices(&mut ctx, &[0, 1, 5]);
	let result = draw_triangle(&mut ctx);
	assert_eq!(result, Err(CaptureError::IndexOutOfRange { index: 5, start: 0, end: 2 }));
	assert!(ctx.mesh(VBO).is_none());
}

#[test]
fn strips_and_ranges_are_rebased() {
	let (mut ctx, _client) = new_ctx();
	setup_triangle(&mut ctx);
	upload_indices(&mut ctx, &[1, 2]);
	assert_eq!(ctx.on_draw_elements(LINES, 2, UNSIGNED_SHORT, 0), Ok(DrawOutcome::Captured));
	let mesh = ctx.mesh(VBO).unwrap();
	assert_eq!(mesh.topology, Topology::Lines);
	assert_eq!(mesh.indices, vec![0, 1]);
	assert_eq!(mesh.points, vec![Vec3::X, Vec3::Y]);

	upload_indices(&mut ctx, &[0, 1, 2, 0]);
	ctx.on_draw_range_elements(TRIANGLE_STRIP, 0, 2, 4, UNSIGNED_SHORT, 0).unwrap();
	assert_eq!(ctx.mesh(VBO).unwrap().indices, vec![0, 1, 2, 2, 1, 0]);
}

#[test]
fn forced_send_includes_every_dirty_buffer() {
	let (mut ctx, client) = new_ctx();
	let buffers = [10, 11, 12, 13];
	ctx.on_gen_buffers(&buffers);
	ctx.on_gen_buffers(&[IBO]);
	upload_indices(&mut ctx, &[0, 1, 2]);
	ctx.on_enable_vertex_attrib_array(0).unwrap();
	let points: [f32; 9] = [0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0];
	for &buffer in &buffers {
		ctx.on_bind_buffer(ARRAY_BUFFER, buffer);
		let bytes: &[u8] = bytemuck::cast_slice(&points);
		ctx.on_buffer_data(ARRAY_BUFFER, bytes.len() as GLsizeiptr, Some(bytes), STATIC_DRAW).unwrap();
		ctx.on_vertex_attrib_pointer(0, 3, FLOAT, false, 0, 0).unwrap();
		assert_eq!(draw_triangle(&mut ctx), Ok(DrawOutcome::Captured));
	}

	assert_eq!(ctx.send(true), SendOutcome::Sent);
	let ids: Vec<u32> = sent_meshes(&client).iter().map(|m| m.id).collect();
	assert_eq!(ids, buffers);
	assert_eq!(ctx.send(true), SendOutcome::Empty);
	assert_eq!(sent_meshes(&client).len(), buffers.len());
}

#[test]
fn sent_meshes_are_scaled() {
	let (mut ctx, client) = new_ctx();
	ctx.settings_mut().scale_factor = 2.0;
	setup_triangle(&mut ctx);
	draw_triangle(&mut ctx).unwrap();
	ctx.send(true);
	let batches = client.batches();
	let mesh = &batches[0].meshes[0];
	assert_eq!(mesh.points[1], vec3(2.0, 0.0, 0.0));
	assert_eq!(mesh.normals[1], Vec3::Z);
	assert_eq!(batches[0].materials.len(), 1);
	assert_eq!(batches[0].materials[0].id, mesh.material_id);
}

#[test]
fn failed_send_resyncs_everything() {
	init_logger();
	let failures = Arc::new(AtomicUsize::new(1));
	let inner = MemoryClient::new();
	let client = FlakyClient { failures: Arc::clone(&failures), inner: inner.clone() };
	let mut ctx = CaptureCtx::new(Settings::default(), client, FixedUniforms);
	setup_triangle(&mut ctx);
	draw_triangle(&mut ctx).unwrap();

	assert_eq!(ctx.send(true), SendOutcome::Failed);
	assert!(inner.batches().is_empty());

	assert_eq!(ctx.send(true), SendOutcome::Sent);
	let batches = inner.batches();
	assert_eq!(batches.len(), 1);
	assert_eq!(batches[0].meshes.len(), 1);
	assert_eq!(batches[0].materials.len(), 1);
	assert!(batches[0].camera.is_some());
	assert_eq!(failures.load(Ordering::SeqCst), 0);
}

#[test]
fn camera_follows_matrix_uniforms() {
	let (mut ctx, client) = new_ctx();
	use_program(&mut ctx, PROGRAM, [1.0; 4]);
	let eye = vec3(0.0, 1.0, 5.0);
	let view = Mat4::look_at_rh(eye, Vec3::ZERO, Vec3::Y);
	let proj = Mat4::perspective_rh_gl(60f32.to_radians(), 1.5, 0.1, 50.0);
	ctx.on_uniform_matrix_4fv(VIEW, 1, false, &view.to_cols_array()).unwrap();
	ctx.on_uniform_matrix_4fv(PROJECTION, 1, false, &proj.to_cols_array()).unwrap();

	let cam = ctx.camera();
	assert!(cam.position.abs_diff_eq(eye, 1e-4));
	assert!((cam.fov - 60.0).abs() < 1e-3);
	assert!((cam.near_plane - 0.1).abs() < 1e-4);
	assert!((cam.far_plane - 50.0).abs() < 1e-2);

	assert_eq!(ctx.send(true), SendOutcome::Sent);
	let camera = client.batches()[0].camera.clone().unwrap();
	assert_eq!(camera.path, "/Main Camera");
	assert!(camera.position.abs_diff_eq(eye * 100.0, 1e-2));
	assert_eq!(ctx.send(true), SendOutcome::Empty);
}

#[test]
fn sync_toggles_filter_the_batch() {
	let (mut ctx, client) = new_ctx();
	ctx.settings_mut().sync_camera = false;
	ctx.settings_mut().sync_delete = false;
	setup_triangle(&mut ctx);
	ctx.on_uniform_matrix_4fv(VIEW, 1, false, &Mat4::from_translation(Vec3::X).to_cols_array()).unwrap();
	draw_triangle(&mut ctx).unwrap();
	ctx.send(true);
	ctx.on_delete_buffers(&[VBO]);
	ctx.send(true);
	for batch in client.batches() {
		assert!(batch.camera.is_none());
		assert!(batch.deleted.is_empty());
	}
}

#[test]
fn used_textures_are_sent_with_their_material() {
	let (mut ctx, client) = new_ctx();
	setup_triangle(&mut ctx);
	ctx.on_gen_textures(&[9, 10]);
	ctx.on_active_texture(TEXTURE0 + 2).unwrap();
	ctx.on_bind_texture(TEXTURE_2D, 9);
	let pixels = [255u8; 16];
	ctx.on_tex_image_2d(TEXTURE_2D, 0, RGBA as GLint, 2, 2, 0, RGBA, UNSIGNED_BYTE, Some(&pixels)).unwrap();
	// never sampled by a draw
	ctx.on_bind_texture(TEXTURE_2D, 10);
	ctx.on_tex_image_2d(TEXTURE_2D, 0, RGBA as GLint, 2, 2, 0, RGBA, UNSIGNED_BYTE, Some(&pixels)).unwrap();
	ctx.on_bind_texture(TEXTURE_2D, 9);
	ctx.on_uniform_1i(COLOR_MAP, 2).unwrap();
	draw_triangle(&mut ctx).unwrap();

	ctx.send(true);
	let batches = client.batches();
	let batch = &batches[0];
	let texture_id = ctx.texture(9).unwrap().id;
	assert_eq!(batch.textures.len(), 1);
	assert_eq!(batch.textures[0].id, texture_id);
	assert_eq!((batch.textures[0].width, batch.textures[0].height), (2, 2));
	assert_eq!(batch.materials[0].color_map, texture_id);
	assert!(ctx.on_active_texture(TEXTURE0 + 40).is_err());
	assert!(matches!(
		ctx.on_tex_image_2d(TEXTURE_2D, 0, 0, 2, 2, 0, 0x1234, UNSIGNED_BYTE, Some(&pixels)),
		Err(CaptureError::UnsupportedTexelFormat { .. })
	));
}

#[test]
fn vertex_arrays_own_their_layout() {
	let (mut ctx, _client) = new_ctx();
	ctx.on_gen_vertex_arrays(&[1, 2]);
	ctx.on_bind_vertex_array(1);
	setup_triangle(&mut ctx);
	assert_eq!(draw_triangle(&mut ctx), Ok(DrawOutcome::Captured));

	ctx.on_bind_vertex_array(2);
	assert_eq!(ctx.bound_buffer(ELEMENT_ARRAY_BUFFER), 0);
	assert_eq!(draw_triangle(&mut ctx), Err(CaptureError::NoIndexBuffer));

	ctx.on_bind_vertex_array(1);
	assert_eq!(ctx.bound_buffer(ELEMENT_ARRAY_BUFFER), IBO);
	assert_eq!(draw_triangle(&mut ctx), Ok(DrawOutcome::Unchanged));

	ctx.on_delete_vertex_arrays(&[1]);
	assert_eq!(ctx.bound_vertex_array(), 0);
}

#[test]
fn vertex_buffer_bindings_feed_attributes() {
	let (mut ctx, _client) = new_ctx();
	ctx.on_gen_buffers(&[VBO, IBO]);
	let bytes = triangle_bytes();
	ctx.on_bind_buffer(ARRAY_BUFFER, VBO);
	ctx.on_buffer_data(ARRAY_BUFFER, bytes.len() as GLsizeiptr, Some(&bytes), STATIC_DRAW).unwrap();
	ctx.on_bind_buffer(ARRAY_BUFFER, 0);
	// pointer without an array buffer, sourced from binding 0
	ctx.on_vertex_attrib_pointer(0, 3, FLOAT, false, 0, 0).unwrap();
	ctx.on_enable_vertex_attrib_array(0).unwrap();
	ctx.on_bind_vertex_buffer(0, VBO, 0, STRIDE).unwrap();
	upload_indices(&mut ctx, &[0, 1, 2]);
	assert_eq!(draw_triangle(&mut ctx), Ok(DrawOutcome::Captured));
	assert_eq!(ctx.mesh(VBO).unwrap().points, vec![Vec3::ZERO, Vec3::X, Vec3::Y]);
	assert_eq!(ctx.buffer(VBO).unwrap().stride, STRIDE as usize);
}

#[test]
fn flush_sends_only_with_auto_sync() {
	let (mut ctx, client) = new_ctx();
	setup_triangle(&mut ctx);
	draw_triangle(&mut ctx).unwrap();
	assert_eq!(ctx.on_flush(), None);
	assert!(client.batches().is_empty());

	ctx.settings_mut().auto_sync = true;
	assert_eq!(ctx.on_flush(), Some(SendOutcome::Sent));
	assert_eq!(ctx.send(true), SendOutcome::Empty);
	assert_eq!(sent_meshes(&client).len(), 1);
}

#[test]
fn forced_send_picks_up_data_changed_after_the_draw() {
	let (mut ctx, client) = new_ctx();
	setup_triangle(&mut ctx);
	draw_triangle(&mut ctx).unwrap();
	assert_eq!(ctx.send(true), SendOutcome::Sent);

	// move the second vertex to (3, 0, 0)
	let moved: &[u8] = bytemuck::cast_slice(&[3.0f32, 0.0, 0.0]);
	ctx.on_named_buffer_sub_data(VBO, STRIDE as GLintptr, 12, moved).unwrap();
	assert_eq!(ctx.send(true), SendOutcome::Sent);
	assert!(!ctx.buffer(VBO).unwrap().dirty);

	let meshes = sent_meshes(&client);
	assert_eq!(meshes.len(), 2);
	assert_eq!(meshes[1].points[1], vec3(300.0, 0.0, 0.0));
	assert_eq!(ctx.mesh(VBO).unwrap().points[1], vec3(3.0, 0.0, 0.0));
	assert_eq!(draw_triangle(&mut ctx), Ok(DrawOutcome::Unchanged));
}

#[test]
fn forced_send_picks_up_index_changes() {
	let (mut ctx, client) = new_ctx();
	setup_triangle(&mut ctx);
	draw_triangle(&mut ctx).unwrap();
	ctx.send(true);

	let reversed: &[u8] = bytemuck::cast_slice(&[2u16, 1, 0]);
	ctx.on_named_buffer_sub_data(IBO, 0, 6, reversed).unwrap();
	assert_eq!(ctx.send(true), SendOutcome::Sent);
	let meshes = sent_meshes(&client);
	assert_eq!(meshes.len(), 2);
	assert_eq!(meshes[1].indices, vec![2, 1, 0]);
}

#[test]
fn unreadable_changes_retract_the_mesh() {
	let (mut ctx, client) = new_ctx();
	setup_triangle(&mut ctx);
	draw_triangle(&mut ctx).unwrap();
	ctx.send(true);

	// shrink the vertex buffer below the drawn range
	ctx.on_bind_buffer(ARRAY_BUFFER, VBO);
	ctx.on_buffer_data(ARRAY_BUFFER, 12, None, STATIC_DRAW).unwrap();
	assert_eq!(ctx.send(true), SendOutcome::Sent);
	assert!(ctx.mesh(VBO).is_none());

	let batches = client.batches();
	assert!(batches[1].meshes.is_empty());
	assert_eq!(batches[1].deleted.iter().map(|d| d.id).collect::<Vec<_>>(), vec![VBO]);
}

#[test]
fn large_uniform_locations_are_ignored() {
	let (mut ctx, _client) = new_ctx();
	use_program(&mut ctx, PROGRAM, [1.0; 4]);
	let id = ctx.program(PROGRAM).unwrap().material_id;
	assert_eq!(ctx.on_uniform_1fv(i32::MAX, 2, &[1.0, 2.0]), Ok(()));
	assert_eq!(ctx.on_uniform_4fv(GLint::MAX - 1, 3, &[0.0; 12]), Ok(()));
	assert_eq!(ctx.program(PROGRAM).unwrap().material_id, id);
}

#[test]
fn oversized_texture_is_rejected() {
	let (mut ctx, _client) = new_ctx();
	ctx.on_gen_textures(&[9]);
	ctx.on_bind_texture(TEXTURE_2D, 9);
	let result = ctx.on_tex_image_2d(TEXTURE_2D, 0, RGBA as GLint, i32::MAX, i32::MAX, 0, RGBA, FLOAT, Some(&[0; 16]));
	assert_eq!(result, Err(CaptureError::InvalidDimensions { width: i32::MAX, height: i32::MAX }));
	assert!(ctx.texture(9).unwrap().dst.is_none());
}
