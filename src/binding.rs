//! Marker types naming GL binding points.
//!
//! Each marker carries the target enum it binds to and the `glGetIntegerv` query that reports
//! what is currently bound there, so handles can skip redundant binds.

use crate::backend::*;
use crate::context::*;
use crate::gl;
use crate::gl::types::*;

/// A buffer binding point.
pub trait BufferTarget {
    const TARGET: GLenum;
    const BINDING: GLenum;

    fn query_current_binding<B: Backend>(context: &GlContext<B>) -> GLuint {
        context.query_binding(Self::BINDING)
    }
}

/// `ARRAY_BUFFER`: vertex attributes.
#[derive(Copy, Clone, Debug)]
pub enum ArrayTarget {}

/// `ELEMENT_ARRAY_BUFFER`: indices.
#[derive(Copy, Clone, Debug)]
pub enum ElementArrayTarget {}

/// `PIXEL_PACK_BUFFER`: GPU writes pixels, the host reads them back.
#[derive(Copy, Clone, Debug)]
pub enum PixelPackTarget {}

/// `PIXEL_UNPACK_BUFFER`: the host writes pixels, GPU reads them into textures.
#[derive(Copy, Clone, Debug)]
pub enum PixelUnpackTarget {}

/// `TEXTURE_BUFFER` as a buffer binding point: the storage behind a buffer texture.
#[derive(Copy, Clone, Debug)]
pub enum TextureBufferTarget {}

impl BufferTarget for ArrayTarget {
    const TARGET: GLenum = gl::ARRAY_BUFFER;
    const BINDING: GLenum = gl::ARRAY_BUFFER_BINDING;
}

impl BufferTarget for ElementArrayTarget {
    const TARGET: GLenum = gl::ELEMENT_ARRAY_BUFFER;
    const BINDING: GLenum = gl::ELEMENT_ARRAY_BUFFER_BINDING;
}

impl BufferTarget for PixelPackTarget {
    const TARGET: GLenum = gl::PIXEL_PACK_BUFFER;
    const BINDING: GLenum = gl::PIXEL_PACK_BUFFER_BINDING;
}

impl BufferTarget for PixelUnpackTarget {
    const TARGET: GLenum = gl::PIXEL_UNPACK_BUFFER;
    const BINDING: GLenum = gl::PIXEL_UNPACK_BUFFER_BINDING;
}

impl BufferTarget for TextureBufferTarget {
    const TARGET: GLenum = gl::TEXTURE_BUFFER;
    const BINDING: GLenum = gl::TEXTURE_BUFFER_BINDING;
}

/// A texture target.
pub trait TextureTarget {
    const TARGET: GLenum;
    const BINDING: GLenum;
    /// The GLSL sampler type for textures of this target.
    const GLSL_TYPE: &'static str;

    fn query_current_binding<B: Backend>(context: &GlContext<B>) -> GLuint {
        context.query_binding(Self::BINDING)
    }
}

/// A texture target backed by a 2D image: it can be sampled, rendered to and read back by
/// region. Buffer textures are excluded.
pub trait ImageTarget2d: TextureTarget {}

/// `TEXTURE_2D` with mutable storage.
#[derive(Copy, Clone, Debug)]
pub enum Texture2d {}

/// `TEXTURE_2D` with immutable storage only, as image load/store from compute shaders
/// requires.
#[derive(Copy, Clone, Debug)]
pub enum StorageTexture2d {}

/// `TEXTURE_RECTANGLE`: unnormalized texel coordinates, no mipmaps.
#[derive(Copy, Clone, Debug)]
pub enum TextureRectangle {}

/// `TEXTURE_BUFFER` as a texture target: a 1D view over a buffer object.
#[derive(Copy, Clone, Debug)]
pub enum TextureBuffer {}

impl TextureTarget for Texture2d {
    const TARGET: GLenum = gl::TEXTURE_2D;
    const BINDING: GLenum = gl::TEXTURE_BINDING_2D;
    const GLSL_TYPE: &'static str = "sampler2D";
}

impl TextureTarget for StorageTexture2d {
    const TARGET: GLenum = gl::TEXTURE_2D;
    const BINDING: GLenum = gl::TEXTURE_BINDING_2D;
    const GLSL_TYPE: &'static str = "sampler2D";
}

impl TextureTarget for TextureRectangle {
    const TARGET: GLenum = gl::TEXTURE_RECTANGLE;
    const BINDING: GLenum = gl::TEXTURE_BINDING_RECTANGLE;
    const GLSL_TYPE: &'static str = "sampler2DRect";
}

impl TextureTarget for TextureBuffer {
    const TARGET: GLenum = gl::TEXTURE_BUFFER;
    const BINDING: GLenum = gl::TEXTURE_BINDING_BUFFER;
    const GLSL_TYPE: &'static str = "samplerBuffer";
}

impl ImageTarget2d for Texture2d {}
impl ImageTarget2d for StorageTexture2d {}
impl ImageTarget2d for TextureRectangle {}

/// Which framebuffer binding points a framebuffer device binds to.
pub trait DeviceScope {
    const TARGET: GLenum;
    const READS: bool;
    const DRAWS: bool;
}

/// `FRAMEBUFFER`: both read and draw.
#[derive(Copy, Clone, Debug)]
pub enum Combined {}

/// `READ_FRAMEBUFFER`.
#[derive(Copy, Clone, Debug)]
pub enum ReadOnly {}

/// `DRAW_FRAMEBUFFER`.
#[derive(Copy, Clone, Debug)]
pub enum DrawOnly {}

impl DeviceScope for Combined {
    const TARGET: GLenum = gl::FRAMEBUFFER;
    const READS: bool = true;
    const DRAWS: bool = true;
}

impl DeviceScope for ReadOnly {
    const TARGET: GLenum = gl::READ_FRAMEBUFFER;
    const READS: bool = true;
    const DRAWS: bool = false;
}

impl DeviceScope for DrawOnly {
    const TARGET: GLenum = gl::DRAW_FRAMEBUFFER;
    const READS: bool = false;
    const DRAWS: bool = true;
}

/// Scopes that bind the draw framebuffer, so clears and draws land in the device.
pub trait DrawScope: DeviceScope {}

impl DrawScope for Combined {}
impl DrawScope for DrawOnly {}
