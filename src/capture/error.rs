use super::gl::GLenum;

/// A call that could not be mirrored. The host call itself is never affected.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CaptureError {
	#[error("no buffer bound to target {target:#x}")]
	NoBufferBound { target: GLenum },
	#[error("write of {len} bytes at offset {offset} exceeds buffer {buffer} of {size} bytes")]
	SubDataOutOfRange { buffer: u32, offset: usize, len: usize, size: usize },
	#[error("buffer {0} is already mapped")]
	AlreadyMapped(u32),
	#[error("buffer {0} is not mapped")]
	NotMapped(u32),
	#[error("flushed range {offset}+{len} is outside the mapped range of buffer {buffer}")]
	FlushOutOfRange { buffer: u32, offset: usize, len: usize },
	#[error("invalid byte range {offset}+{len}")]
	InvalidRange { offset: isize, len: isize },
	#[error("unsupported vertex component type {0:#x}")]
	UnsupportedComponentType(GLenum),
	#[error("vertex attribute size {0} outside 1..=4")]
	InvalidComponentCount(i32),
	#[error("vertex attribute index {0} out of range")]
	AttributeIndexOutOfRange(u32),
	#[error("texture unit {0} out of range")]
	TextureUnitOutOfRange(u32),
	#[error("no framebuffer bound to target {0:#x}")]
	NoFramebufferBound(GLenum),
	#[error("unsupported framebuffer attachment {0:#x}")]
	UnsupportedAttachment(GLenum),
	#[error("handle 0 does not name a {0}")]
	NullHandle(&'static str),
	#[error("no program in use")]
	NoActiveProgram,
	#[error("no texture bound to unit {0}")]
	NoTextureBound(u32),
	#[error("unsupported texel format {format:#x} / {ty:#x}")]
	UnsupportedTexelFormat { format: GLenum, ty: GLenum },
	#[error("invalid texture size {width}x{height}")]
	InvalidDimensions { width: i32, height: i32 },
	#[error("pixel data holds {got} bytes, {expected} expected")]
	PixelDataTooShort { expected: usize, got: usize },
	#[error("no index buffer bound")]
	NoIndexBuffer,
	#[error("no enabled position attribute with a source buffer")]
	NoPositionAttribute,
	#[error("unsupported index type {0:#x}")]
	UnsupportedIndexType(GLenum),
	#[error("unsupported primitive mode {0:#x}")]
	UnsupportedTopology(GLenum),
	#[error("index data of buffer {buffer} too short for the draw")]
	IndexDataOutOfRange { buffer: u32 },
	#[error("index {index} outside draw range {start}..={end}")]
	IndexOutOfRange { index: u32, start: u32, end: u32 },
	#[error("vertex {vertex} of buffer {buffer} lies outside its data")]
	VertexDataOutOfRange { buffer: u32, vertex: u32 },
}

pub type CaptureResult<T> = Result<T, CaptureError>;
