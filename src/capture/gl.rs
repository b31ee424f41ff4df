//! Host API enums and scalar types used by the handlers.
#![allow(non_camel_case_types)]

pub type GLenum = u32;
pub type GLuint = u32;
pub type GLint = i32;
pub type GLsizei = i32;
pub type GLintptr = isize;
pub type GLsizeiptr = isize;
pub type GLbitfield = u32;
pub type GLboolean = bool;
pub type GLfloat = f32;

// primitive modes
pub const POINTS: GLenum = 0x0000;
pub const LINES: GLenum = 0x0001;
pub const TRIANGLES: GLenum = 0x0004;
pub const TRIANGLE_STRIP: GLenum = 0x0005;

// component types
pub const BYTE: GLenum = 0x1400;
pub const UNSIGNED_BYTE: GLenum = 0x1401;
pub const SHORT: GLenum = 0x1402;
pub const UNSIGNED_SHORT: GLenum = 0x1403;
pub const INT: GLenum = 0x1404;
pub const UNSIGNED_INT: GLenum = 0x1405;
pub const FLOAT: GLenum = 0x1406;

// buffers
pub const ARRAY_BUFFER: GLenum = 0x8892;
pub const ELEMENT_ARRAY_BUFFER: GLenum = 0x8893;
pub const UNIFORM_BUFFER: GLenum = 0x8A11;
pub const STATIC_DRAW: GLenum = 0x88E4;
pub const DYNAMIC_DRAW: GLenum = 0x88E8;
pub const WRITE_ONLY: GLenum = 0x88B9;
pub const MAP_WRITE_BIT: GLbitfield = 0x0002;
pub const MAP_FLUSH_EXPLICIT_BIT: GLbitfield = 0x0010;

// textures
pub const TEXTURE_2D: GLenum = 0x0DE1;
pub const TEXTURE0: GLenum = 0x84C0;
pub const RED: GLenum = 0x1903;
pub const RG: GLenum = 0x8227;
pub const RGB: GLenum = 0x1907;
pub const RGBA: GLenum = 0x1908;
pub const BGRA: GLenum = 0x80E1;

// framebuffers
pub const FRAMEBUFFER: GLenum = 0x8D40;
pub const READ_FRAMEBUFFER: GLenum = 0x8CA8;
pub const DRAW_FRAMEBUFFER: GLenum = 0x8CA9;
pub const COLOR_ATTACHMENT0: GLenum = 0x8CE0;
pub const DEPTH_ATTACHMENT: GLenum = 0x8D00;
pub const STENCIL_ATTACHMENT: GLenum = 0x8D20;
pub const DEPTH_STENCIL_ATTACHMENT: GLenum = 0x821A;

// uniform types reported by program introspection
pub const FLOAT_VEC2: GLenum = 0x8B50;
pub const FLOAT_VEC3: GLenum = 0x8B51;
pub const FLOAT_VEC4: GLenum = 0x8B52;
pub const INT_VEC2: GLenum = 0x8B53;
pub const INT_VEC3: GLenum = 0x8B54;
pub const INT_VEC4: GLenum = 0x8B55;
pub const BOOL: GLenum = 0x8B56;
pub const FLOAT_MAT2: GLenum = 0x8B5A;
pub const FLOAT_MAT3: GLenum = 0x8B5B;
pub const FLOAT_MAT4: GLenum = 0x8B5C;
pub const SAMPLER_2D: GLenum = 0x8B5E;
pub const SAMPLER_3D: GLenum = 0x8B5F;
pub const SAMPLER_CUBE: GLenum = 0x8B60;
