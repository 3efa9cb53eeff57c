use bytemuck::Pod;
use cgmath::*;
use log::*;
use std::cell::Cell;
use std::marker::PhantomData;

use crate::backend::*;
use crate::binding::*;
use crate::buffer::*;
use crate::context::*;
use crate::gl;
use crate::gl::types::*;
use crate::rect::*;

#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum MinFilter {
    Nearest,
    Linear,
    NearestMipmapNearest,
    NearestMipmapLinear,
    LinearMipmapNearest,
    LinearMipmapLinear,
}

impl MinFilter {
    fn as_gl(self) -> u32 {
        match self {
            MinFilter::Nearest => gl::NEAREST,
            MinFilter::Linear => gl::LINEAR,
            MinFilter::NearestMipmapNearest => gl::NEAREST_MIPMAP_NEAREST,
            MinFilter::NearestMipmapLinear => gl::NEAREST_MIPMAP_LINEAR,
            MinFilter::LinearMipmapNearest => gl::LINEAR_MIPMAP_NEAREST,
            MinFilter::LinearMipmapLinear => gl::LINEAR_MIPMAP_LINEAR,
        }
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum MagFilter {
    Nearest,
    Linear,
}

impl MagFilter {
    fn as_gl(self) -> u32 {
        match self {
            MagFilter::Nearest => gl::NEAREST,
            MagFilter::Linear => gl::LINEAR,
        }
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum WrapMode {
    ClampToEdge,
    ClampToBorder,
    Repeat,
    MirroredRepeat,
    /// Legacy `CLAMP`; only accepted by compatibility-profile desktop GL.
    Clamp,
}

impl WrapMode {
    fn as_gl(self) -> u32 {
        match self {
            WrapMode::ClampToEdge => gl::CLAMP_TO_EDGE,
            WrapMode::ClampToBorder => gl::CLAMP_TO_BORDER,
            WrapMode::Repeat => gl::REPEAT,
            WrapMode::MirroredRepeat => gl::MIRRORED_REPEAT,
            WrapMode::Clamp => gl::CLAMP,
        }
    }
}

/// Bytes per pixel for a pixel transfer `format`/`ty` pair, or `None` if the pair isn't known.
pub fn pixel_size(format: GLenum, ty: GLenum) -> Option<usize> {
    let packed = match ty {
        gl::UNSIGNED_BYTE_3_3_2 | gl::UNSIGNED_BYTE_2_3_3_REV => Some(1),
        gl::UNSIGNED_SHORT_5_6_5
        | gl::UNSIGNED_SHORT_5_6_5_REV
        | gl::UNSIGNED_SHORT_4_4_4_4
        | gl::UNSIGNED_SHORT_4_4_4_4_REV
        | gl::UNSIGNED_SHORT_5_5_5_1
        | gl::UNSIGNED_SHORT_1_5_5_5_REV => Some(2),
        gl::UNSIGNED_INT_8_8_8_8
        | gl::UNSIGNED_INT_8_8_8_8_REV
        | gl::UNSIGNED_INT_10_10_10_2
        | gl::UNSIGNED_INT_2_10_10_10_REV
        | gl::UNSIGNED_INT_24_8
        | gl::UNSIGNED_INT_10F_11F_11F_REV
        | gl::UNSIGNED_INT_5_9_9_9_REV => Some(4),
        gl::FLOAT_32_UNSIGNED_INT_24_8_REV => Some(8),
        _ => None,
    };
    if packed.is_some() {
        return packed;
    }

    let components = match format {
        gl::RED
        | gl::GREEN
        | gl::BLUE
        | gl::ALPHA
        | gl::LUMINANCE
        | gl::RED_INTEGER
        | gl::DEPTH_COMPONENT
        | gl::STENCIL_INDEX => 1,
        gl::RG | gl::RG_INTEGER | gl::LUMINANCE_ALPHA => 2,
        gl::RGB | gl::BGR | gl::RGB_INTEGER | gl::BGR_INTEGER => 3,
        gl::RGBA | gl::BGRA | gl::RGBA_INTEGER | gl::BGRA_INTEGER => 4,
        _ => return None,
    };
    let component_size = match ty {
        gl::UNSIGNED_BYTE | gl::BYTE => 1,
        gl::UNSIGNED_SHORT | gl::SHORT | gl::HALF_FLOAT => 2,
        gl::UNSIGNED_INT | gl::INT | gl::FLOAT => 4,
        _ => return None,
    };
    Some(components * component_size)
}

/// Bytes a host-memory transfer of a `size` region touches, given the row `alignment` set
/// with `glPixelStorei`.
pub fn transfer_len(size: Vector2<i32>, format: GLenum, ty: GLenum, alignment: i32) -> Option<usize> {
    if size.x <= 0 || size.y <= 0 {
        return Some(0);
    }
    let row = size.x as usize * pixel_size(format, ty)?;
    let alignment = alignment.max(1) as usize;
    let stride = (row + alignment - 1) / alignment * alignment;
    Some(stride * (size.y as usize - 1) + row)
}

fn checked_transfer_len(size: Vector2<i32>, format: GLenum, ty: GLenum, alignment: i32) -> usize {
    match transfer_len(size, format, ty, alignment) {
        Some(len) => len,
        None => panic!(
            "unsupported pixel format 0x{:04X} / type 0x{:04X} for a host memory transfer",
            format, ty
        ),
    }
}

/// A GL texture object of target `T`.
///
/// Like buffers, the object is created by the first `ensure` and deleted on drop. Operations
/// other than `ensure` act on the texture bound to `T` on the active texture unit.
pub struct GpuImage<T: TextureTarget, B: Backend> {
    name: Cell<GLuint>,
    context: GlContext<B>,
    phantom: PhantomData<T>,
}

/// A 2D texture for sampling and rendering.
pub type Image2d<B> = GpuImage<Texture2d, B>;
/// A 2D texture with immutable storage, for image load/store.
pub type StorageImage2d<B> = GpuImage<StorageTexture2d, B>;
/// A rectangle texture, addressed in texels.
pub type ImageRect<B> = GpuImage<TextureRectangle, B>;

impl<T: TextureTarget, B: Backend> Drop for GpuImage<T, B> {
    fn drop(&mut self) {
        let name = self.name.get();
        if name != 0 {
            self.context.inner.delete_texture(name);
            trace!("Deleted texture {}", name);
        }
    }
}

impl<T: TextureTarget, B: Backend> GpuImage<T, B> {
    pub fn new(context: &GlContext<B>) -> Self {
        GpuImage { name: Cell::new(0), context: context.clone(), phantom: PhantomData }
    }

    /// The texture name, or 0 if it hasn't been created yet.
    pub fn name(&self) -> GLuint {
        self.name.get()
    }

    pub fn glsl_type() -> &'static str {
        T::GLSL_TYPE
    }

    /// The texture bound to this target on the active texture unit.
    pub fn query_current_binding(&self) -> GLuint {
        T::query_current_binding(&self.context)
    }

    /// Creates the texture if needed, makes `unit` the active texture unit and binds the
    /// texture there unless it is already bound.
    pub fn ensure(&self, unit: u32) {
        if self.name.get() == 0 {
            let name = self.context.inner.gen_texture();
            trace!("Created texture {} for 0x{:04X}", name, T::TARGET);
            self.name.set(name);
        }
        let name = self.name.get();
        self.context.inner.active_texture(gl::TEXTURE0 + unit);
        if self.query_current_binding() != name {
            self.context.inner.bind_texture(T::TARGET, name);
        } else {
            trace!("Texture {} already bound on unit {}", name, unit);
        }
    }

    /// True if the name refers to a live texture object.
    pub fn available(&self) -> bool {
        self.context.inner.is_texture(self.name.get())
    }

    fn parameter(&self, pname: GLenum, param: GLint) {
        self.context.inner.tex_parameter_i32(T::TARGET, pname, param);
    }
}

impl<T: ImageTarget2d, B: Backend> GpuImage<T, B> {
    pub fn set_min_filter(&self, filter: MinFilter) {
        self.parameter(gl::TEXTURE_MIN_FILTER, filter.as_gl() as GLint);
    }

    pub fn set_min_filter_to_nearest(&self) {
        self.set_min_filter(MinFilter::Nearest);
    }

    pub fn set_min_filter_to_linear(&self) {
        self.set_min_filter(MinFilter::Linear);
    }

    pub fn set_mag_filter(&self, filter: MagFilter) {
        self.parameter(gl::TEXTURE_MAG_FILTER, filter.as_gl() as GLint);
    }

    pub fn set_mag_filter_to_nearest(&self) {
        self.set_mag_filter(MagFilter::Nearest);
    }

    pub fn set_mag_filter_to_linear(&self) {
        self.set_mag_filter(MagFilter::Linear);
    }

    pub fn set_wrap_s(&self, mode: WrapMode) {
        self.parameter(gl::TEXTURE_WRAP_S, mode.as_gl() as GLint);
    }

    pub fn set_wrap_t(&self, mode: WrapMode) {
        self.parameter(gl::TEXTURE_WRAP_T, mode.as_gl() as GLint);
    }

    pub fn set_wrap_r(&self, mode: WrapMode) {
        self.parameter(gl::TEXTURE_WRAP_R, mode.as_gl() as GLint);
    }

    /// GL's default is -1000.
    pub fn set_min_lod(&self, lod: f32) {
        self.context.inner.tex_parameter_f32(T::TARGET, gl::TEXTURE_MIN_LOD, lod);
    }

    /// GL's default is 1000.
    pub fn set_max_lod(&self, lod: f32) {
        self.context.inner.tex_parameter_f32(T::TARGET, gl::TEXTURE_MAX_LOD, lod);
    }

    /// GL's default is 0.
    pub fn set_base_level(&self, level: i32) {
        self.parameter(gl::TEXTURE_BASE_LEVEL, level);
    }

    /// GL's default is 1000.
    pub fn set_max_level(&self, level: i32) {
        self.parameter(gl::TEXTURE_MAX_LEVEL, level);
    }

    /// Sets up the texture as a plain data grid for general-purpose computation: nearest
    /// filtering, clamped coordinates.
    pub fn set_gp(&self) {
        let wrap = match self.context.profile() {
            Profile::Desktop => WrapMode::Clamp,
            Profile::Es => WrapMode::ClampToEdge,
        };
        self.set_min_filter_to_nearest();
        self.set_mag_filter_to_nearest();
        self.set_wrap_s(wrap);
        self.set_wrap_t(wrap);
    }

    /// Reads `region` of the current read framebuffer into `out`.
    ///
    /// Select the attachment first with `FramebufferDevice::open_read_current`. Any pack
    /// buffer is unbound for the duration of the call.
    ///
    /// Panics if `out` is too small for the region.
    pub fn read_region_to_cpu_memory(&self, region: Rect<i32>, format: GLenum, ty: GLenum, out: &mut [u8]) {
        let size = region.size();
        let needed = checked_transfer_len(size, format, ty, self.context.options().pack_alignment);
        assert!(out.len() >= needed, "{} bytes needed, {} provided", needed, out.len());

        let _saver = PixelPackBindingSaver::new(&self.context);
        self.context.inner.read_pixels(
            region.start.x,
            region.start.y,
            size.x,
            size.y,
            format,
            ty,
            PixelPackData::Slice(out),
        );
    }

    /// Reads `region` of the current read framebuffer into the bound pack buffer at byte
    /// `offset`. Skipped if no pack buffer is bound.
    pub fn read_region_to_pixel_pack_buffer(&self, region: Rect<i32>, format: GLenum, ty: GLenum, offset: usize) {
        if PixelPackTarget::query_current_binding(&self.context) == 0 {
            warn!("No pixel pack buffer bound; skipping read of {:?}", region);
            return;
        }
        let size = region.size();
        self.context.inner.read_pixels(
            region.start.x,
            region.start.y,
            size.x,
            size.y,
            format,
            ty,
            PixelPackData::BufferOffset(offset),
        );
    }

    /// Uploads `data` into `region` of mip `level`.
    ///
    /// Any unpack buffer is unbound for the duration of the call. With a single-channel
    /// `format`, the other channels of the texels written are discarded.
    ///
    /// Panics if `data` is too small for the region.
    pub fn copy_from_cpu_memory(&self, level: i32, region: Rect<i32>, format: GLenum, ty: GLenum, data: &[u8]) {
        let size = region.size();
        let needed = checked_transfer_len(size, format, ty, self.context.options().unpack_alignment);
        assert!(data.len() >= needed, "{} bytes needed, {} provided", needed, data.len());

        let _saver = PixelUnpackBindingSaver::new(&self.context);
        self.context.inner.tex_sub_image_2d(
            T::TARGET,
            level,
            region.start.x,
            region.start.y,
            size.x,
            size.y,
            format,
            ty,
            PixelUnpackData::Slice(data),
        );
    }

    /// Copies `source` of the current read framebuffer into mip `level`, with its lower-left
    /// corner at `offset`.
    pub fn copy_from_current_framebuffer(&self, level: i32, offset: Point2<i32>, source: Rect<i32>) {
        let size = source.size();
        self.context.inner.copy_tex_sub_image_2d(
            T::TARGET,
            level,
            offset.x,
            offset.y,
            source.start.x,
            source.start.y,
            size.x,
            size.y,
        );
    }

    /// Uploads `region` of mip `level` from the bound unpack buffer at byte `offset`.
    /// Skipped if no unpack buffer is bound.
    ///
    /// With a single-channel `format`, the other channels of the texels written are
    /// discarded.
    pub fn copy_from_pixel_unpack_buffer(
        &self,
        level: i32,
        region: Rect<i32>,
        format: GLenum,
        ty: GLenum,
        offset: usize,
    ) {
        if PixelUnpackTarget::query_current_binding(&self.context) == 0 {
            warn!("No pixel unpack buffer bound; skipping upload to {:?}", region);
            return;
        }
        let size = region.size();
        self.context.inner.tex_sub_image_2d(
            T::TARGET,
            level,
            region.start.x,
            region.start.y,
            size.x,
            size.y,
            format,
            ty,
            PixelUnpackData::BufferOffset(offset),
        );
    }
}

impl<T: ImageTarget2d, B: DesktopBackend> GpuImage<T, B> {
    /// The size of mip `level` of the bound texture.
    pub fn level_size(&self, level: i32) -> Vector2<i32> {
        vec2(
            self.context.inner.get_tex_level_parameter_i32(T::TARGET, level, gl::TEXTURE_WIDTH),
            self.context.inner.get_tex_level_parameter_i32(T::TARGET, level, gl::TEXTURE_HEIGHT),
        )
    }

    /// Reads the whole of mip `level` into `out`. Any pack buffer is unbound for the duration
    /// of the call.
    ///
    /// Panics if `out` is too small for the level.
    pub fn copy_to_cpu_memory(&self, level: i32, format: GLenum, ty: GLenum, out: &mut [u8]) {
        let size = self.level_size(level);
        let needed = checked_transfer_len(size, format, ty, self.context.options().pack_alignment);
        assert!(out.len() >= needed, "{} bytes needed, {} provided", needed, out.len());

        let _saver = PixelPackBindingSaver::new(&self.context);
        self.context.inner.get_tex_image(T::TARGET, level, format, ty, PixelPackData::Slice(out));
    }

    /// Reads the whole of mip `level` into the bound pack buffer at byte `offset`. Skipped if
    /// no pack buffer is bound.
    pub fn copy_to_pixel_pack_buffer(&self, level: i32, format: GLenum, ty: GLenum, offset: usize) {
        if PixelPackTarget::query_current_binding(&self.context) == 0 {
            warn!("No pixel pack buffer bound; skipping read of texture {}", self.name());
            return;
        }
        self.context.inner.get_tex_image(
            T::TARGET,
            level,
            format,
            ty,
            PixelPackData::BufferOffset(offset),
        );
    }
}

fn tex_image_2d<T: TextureTarget, B: Backend>(
    context: &GlContext<B>,
    level: i32,
    internal_format: GLint,
    size: Vector2<i32>,
    border: i32,
    format: GLenum,
    ty: GLenum,
    data: Option<&[u8]>,
) {
    debug!("Allocating {}x{} level {} on 0x{:04X}", size.x, size.y, level, T::TARGET);
    let pixels = match data {
        Some(data) => {
            let needed = checked_transfer_len(size, format, ty, context.options().unpack_alignment);
            assert!(data.len() >= needed, "{} bytes needed, {} provided", needed, data.len());
            PixelUnpackData::Slice(data)
        }
        None => PixelUnpackData::None,
    };
    let _saver = PixelUnpackBindingSaver::new(context);
    context.inner.tex_image_2d(T::TARGET, level, internal_format, size.x, size.y, border, format, ty, pixels);
}

fn tex_storage_2d<T: TextureTarget, B: Backend>(
    context: &GlContext<B>,
    levels: i32,
    internal_format: GLenum,
    size: Vector2<i32>,
) {
    debug!("Allocating {}x{} immutable storage with {} levels on 0x{:04X}", size.x, size.y, levels, T::TARGET);
    context.inner.tex_storage_2d(T::TARGET, levels, internal_format, size.x, size.y);
}

impl<B: Backend> GpuImage<Texture2d, B> {
    /// Specifies mip `level` with mutable storage, optionally filled from `data`.
    pub fn alloc_mutable(
        &self,
        level: i32,
        internal_format: GLint,
        size: Vector2<i32>,
        border: i32,
        format: GLenum,
        ty: GLenum,
        data: Option<&[u8]>,
    ) {
        tex_image_2d::<Texture2d, B>(&self.context, level, internal_format, size, border, format, ty, data);
    }

    /// Allocates `levels` mip levels of immutable storage.
    pub fn alloc_storage(&self, levels: i32, internal_format: GLenum, size: Vector2<i32>) {
        tex_storage_2d::<Texture2d, B>(&self.context, levels, internal_format, size);
    }
}

impl<B: Backend> GpuImage<StorageTexture2d, B> {
    /// Allocates `levels` mip levels of immutable storage. This is the only way to allocate a
    /// `StorageImage2d`.
    pub fn alloc_storage(&self, levels: i32, internal_format: GLenum, size: Vector2<i32>) {
        tex_storage_2d::<StorageTexture2d, B>(&self.context, levels, internal_format, size);
    }
}

impl<B: Backend> GpuImage<TextureRectangle, B> {
    /// Specifies the image with mutable storage, optionally filled from `data`. Rectangle
    /// textures only have level 0.
    pub fn alloc_mutable(
        &self,
        internal_format: GLint,
        size: Vector2<i32>,
        format: GLenum,
        ty: GLenum,
        data: Option<&[u8]>,
    ) {
        tex_image_2d::<TextureRectangle, B>(&self.context, 0, internal_format, size, 0, format, ty, data);
    }
}

/// A buffer texture: a 1D, randomly indexable texel array whose storage is a buffer object.
///
/// Its storage is either owned (`alloc`) or another buffer attached by name (`attach_*`).
/// Buffer textures cannot be framebuffer attachments and can't be read back by region, so
/// neither is offered here. A 2D image pins fine:
///
/// ```
/// use glhandle::*;
///
/// let context = GlContext::new(RecordingGl::new(Profile::Desktop), ContextOptions::default());
/// let framebuffer: FramebufferDevice<_> = FramebufferDevice::new(&context);
/// let image = Image2d::new(&context);
/// image.ensure(0);
/// framebuffer.ensure();
/// framebuffer.color_pin_image(0, &image, 0);
/// ```
///
/// but neither a buffer image nor its texture does:
///
/// ```compile_fail
/// use glhandle::*;
///
/// let context = GlContext::new(RecordingGl::new(Profile::Desktop), ContextOptions::default());
/// let framebuffer: FramebufferDevice<_> = FramebufferDevice::new(&context);
/// let image = BufferImage::new(&context);
/// framebuffer.color_pin_image(0, &image, 0);
/// ```
///
/// ```compile_fail
/// use glhandle::*;
///
/// let context = GlContext::new(RecordingGl::new(Profile::Desktop), ContextOptions::default());
/// let framebuffer: FramebufferDevice<_> = FramebufferDevice::new(&context);
/// let texture: GpuImage<TextureBuffer, _> = GpuImage::new(&context);
/// framebuffer.color_pin_image(0, &texture, 0);
/// ```
///
/// Region reads and writes are likewise missing on the texture:
///
/// ```compile_fail
/// use glhandle::*;
///
/// let context = GlContext::new(RecordingGl::new(Profile::Desktop), ContextOptions::default());
/// let texture: GpuImage<TextureBuffer, _> = GpuImage::new(&context);
/// let region = Rect::new(cgmath::Point2::new(0, 0), cgmath::Point2::new(1, 1));
/// let mut out = [0u8; 4];
/// texture.read_region_to_cpu_memory(region, gl::RGBA, gl::UNSIGNED_BYTE, &mut out);
/// ```
pub struct BufferImage<B: DesktopBackend> {
    texture: GpuImage<TextureBuffer, B>,
    storage: TexBuffer<B>,
    attached: Cell<GLuint>,
}

impl<B: DesktopBackend> BufferImage<B> {
    pub fn new(context: &GlContext<B>) -> Self {
        BufferImage {
            texture: GpuImage::new(context),
            storage: GpuBuffer::new(context),
            attached: Cell::new(0),
        }
    }

    pub fn name(&self) -> GLuint {
        self.texture.name()
    }

    /// The buffer whose storage the texture currently views, or 0.
    pub fn attached_buffer(&self) -> GLuint {
        self.attached.get()
    }

    pub fn glsl_type() -> &'static str {
        TextureBuffer::GLSL_TYPE
    }

    /// Binds the owned storage, if any, then the texture on unit `unit`.
    pub fn ensure(&self, unit: u32) {
        if self.storage.name() != 0 {
            self.storage.ensure();
        }
        self.texture.ensure(unit);
    }

    pub fn available(&self) -> bool {
        self.texture.available()
    }

    pub fn attach_pack_buffer(&self, internal_format: GLenum, buffer: &PixelPackBuffer<B>) {
        self.attach_raw(internal_format, buffer.name());
    }

    pub fn attach_unpack_buffer(&self, internal_format: GLenum, buffer: &PixelUnpackBuffer<B>) {
        self.attach_raw(internal_format, buffer.name());
    }

    /// Makes the bound buffer texture view buffer `name`, interpreted as `internal_format`
    /// texels. The buffer must already exist.
    pub fn attach_raw(&self, internal_format: GLenum, name: GLuint) {
        self.texture.context.inner.tex_buffer(gl::TEXTURE_BUFFER, internal_format, name);
        self.attached.set(name);
    }

    /// Allocates `bytes` of owned storage and attaches it.
    pub fn alloc(&self, internal_format: GLenum, bytes: usize, usage: BufferUsage) {
        self.storage.ensure();
        self.storage.alloc(bytes, usage);
        self.attach_raw(internal_format, self.storage.name());
    }

    /// Allocates owned storage holding a copy of `data` and attaches it.
    pub fn alloc_with_data<T: Pod>(&self, internal_format: GLenum, data: &[T], usage: BufferUsage) {
        self.storage.ensure();
        self.storage.alloc_with_data(data, usage);
        self.attach_raw(internal_format, self.storage.name());
    }

    /// Writes `data` into the attached buffer at byte `offset`.
    ///
    /// Skipped, with a warning, if no buffer is attached.
    pub fn copy_from_cpu_memory<T: Pod>(&self, offset: usize, data: &[T]) {
        if let Some(handle) = self.attached_handle() {
            handle.ensure();
            handle.copy(offset, data);
        }
    }

    /// Reads the attached buffer from byte `offset` into `out`.
    ///
    /// Skipped, with a warning, if no buffer is attached.
    pub fn copy_to_cpu_memory<T: Pod>(&self, offset: usize, out: &mut [T]) {
        if let Some(handle) = self.attached_handle() {
            handle.ensure();
            handle.copy_to(offset, out);
        }
    }

    fn attached_handle(&self) -> Option<TexBufferHandle<'_, B>> {
        let name = self.attached.get();
        if name == 0 {
            warn!("Buffer image {} has no attached buffer; skipping copy", self.texture.name());
            return None;
        }
        // SAFETY: the handle is only used for sub-range copies, which never reallocate the
        // buffer and which the driver rejects while it is mapped.
        Some(unsafe { TexBufferHandle::from_raw(&self.texture.context, name) })
    }

    /// `MAX_TEXTURE_BUFFER_SIZE`, in texels.
    pub fn max_size(&self) -> i32 {
        self.texture.context.inner.get_integer(gl::MAX_TEXTURE_BUFFER_SIZE)
    }

    /// Queries `TEXTURE_BINDING_BUFFER`.
    ///
    /// Drivers disagree on whether this reports the texture bound to `TEXTURE_BUFFER` or the
    /// buffer bound to it, so this is only useful for diagnostics. The copy methods use
    /// `attached_buffer` instead.
    pub fn bound_buffer(&self) -> GLuint {
        self.texture.context.query_binding(gl::TEXTURE_BINDING_BUFFER)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recording::*;

    fn rect(x: i32, y: i32, width: i32, height: i32) -> Rect<i32> {
        Rect::with_size(Point2::new(x, y), vec2(width, height))
    }

    #[test]
    fn ensure_skips_bind_on_same_unit() {
        let context = recording_context(Profile::Desktop);
        let image = Image2d::new(&context);
        image.ensure(3);
        image.ensure(3);

        let backend = context.backend();
        assert_eq!(backend.count(|call| matches!(call, Call::GenTexture(_))), 1);
        assert_eq!(backend.count(|call| matches!(call, Call::BindTexture(..))), 1);
        assert_eq!(backend.count(|call| *call == Call::ActiveTexture(gl::TEXTURE3)), 2);

        image.ensure(0);
        assert_eq!(backend.count(|call| matches!(call, Call::BindTexture(..))), 2);
    }

    #[test]
    fn drop_deletes_created_texture_only() {
        let context = recording_context(Profile::Es);
        drop(Image2d::new(&context));
        assert_eq!(context.backend().count(|call| matches!(call, Call::DeleteTexture(_))), 0);

        let image = ImageRect::new(&context);
        image.ensure(0);
        let name = image.name();
        assert!(image.available());
        drop(image);
        assert!(context.backend().calls().contains(&Call::DeleteTexture(name)));
        assert!(!context.backend().is_texture(name));
    }

    #[test]
    fn setters_issue_one_call_each() {
        let context = recording_context(Profile::Desktop);
        let image = Image2d::new(&context);
        image.ensure(0);
        context.backend().take_calls();

        image.set_min_filter(MinFilter::LinearMipmapNearest);
        image.set_mag_filter_to_linear();
        image.set_wrap_r(WrapMode::MirroredRepeat);
        image.set_max_level(4);
        image.set_base_level(1);
        image.set_min_lod(-2.0);

        assert_eq!(
            context.backend().calls(),
            vec![
                Call::TexParameterI(
                    gl::TEXTURE_2D,
                    gl::TEXTURE_MIN_FILTER,
                    gl::LINEAR_MIPMAP_NEAREST as GLint
                ),
                Call::TexParameterI(gl::TEXTURE_2D, gl::TEXTURE_MAG_FILTER, gl::LINEAR as GLint),
                Call::TexParameterI(
                    gl::TEXTURE_2D,
                    gl::TEXTURE_WRAP_R,
                    gl::MIRRORED_REPEAT as GLint
                ),
                Call::TexParameterI(gl::TEXTURE_2D, gl::TEXTURE_MAX_LEVEL, 4),
                Call::TexParameterI(gl::TEXTURE_2D, gl::TEXTURE_BASE_LEVEL, 1),
                Call::TexParameterF(gl::TEXTURE_2D, gl::TEXTURE_MIN_LOD, -2.0),
            ]
        );
    }

    #[test]
    fn gp_preset_clamps_per_profile() {
        for &(profile, wrap) in &[(Profile::Desktop, gl::CLAMP), (Profile::Es, gl::CLAMP_TO_EDGE)] {
            let context = recording_context(profile);
            let image = ImageRect::new(&context);
            image.set_gp();
            assert_eq!(
                context.backend().calls(),
                vec![
                    Call::TexParameterI(gl::TEXTURE_RECTANGLE, gl::TEXTURE_MIN_FILTER, gl::NEAREST as GLint),
                    Call::TexParameterI(gl::TEXTURE_RECTANGLE, gl::TEXTURE_MAG_FILTER, gl::NEAREST as GLint),
                    Call::TexParameterI(gl::TEXTURE_RECTANGLE, gl::TEXTURE_WRAP_S, wrap as GLint),
                    Call::TexParameterI(gl::TEXTURE_RECTANGLE, gl::TEXTURE_WRAP_T, wrap as GLint),
                ]
            );
        }
    }

    #[test]
    fn rectangle_alloc_specifies_the_rectangle_target() {
        let context = recording_context(Profile::Desktop);
        let image = ImageRect::new(&context);
        image.ensure(0);
        image.alloc_mutable(gl::RGBA8 as GLint, vec2(3, 2), gl::RGBA, gl::UNSIGNED_BYTE, None);

        assert!(context.backend().calls().contains(&Call::TexImage2d {
            target: gl::TEXTURE_RECTANGLE,
            level: 0,
            internal_format: gl::RGBA8 as GLint,
            width: 3,
            height: 2,
            border: 0,
            format: gl::RGBA,
            ty: gl::UNSIGNED_BYTE,
            pixels: PixelTransfer::None,
        }));
    }

    #[test]
    fn storage_image_allocates_immutable_levels() {
        let context = recording_context(Profile::Desktop);
        let image = StorageImage2d::new(&context);
        image.ensure(0);
        image.alloc_storage(3, gl::RGBA32F, vec2(8, 4));

        assert!(context.backend().calls().contains(&Call::TexStorage2d {
            target: gl::TEXTURE_2D,
            levels: 3,
            internal_format: gl::RGBA32F,
            width: 8,
            height: 4,
        }));
        assert_eq!(image.level_size(2), vec2(2, 1));
    }

    #[test]
    fn cpu_upload_bypasses_bound_unpack_buffer() {
        let context = recording_context(Profile::Es);
        let unpack = PixelUnpackBuffer::new(&context);
        unpack.ensure();
        let image = Image2d::new(&context);
        image.ensure(0);
        context.backend().take_calls();

        image.copy_from_cpu_memory(0, rect(1, 1, 2, 2), gl::RGB, gl::UNSIGNED_BYTE, &[0; 12]);

        let calls = context.backend().calls();
        let upload = calls
            .iter()
            .position(|call| matches!(call, Call::TexSubImage2d { pixels: PixelTransfer::Host(12), .. }))
            .expect("upload");
        assert_eq!(calls[upload - 1], Call::BindBuffer(gl::PIXEL_UNPACK_BUFFER, 0));
        assert_eq!(calls[upload + 1], Call::BindBuffer(gl::PIXEL_UNPACK_BUFFER, unpack.name()));
    }

    #[test]
    #[should_panic(expected = "bytes needed")]
    fn cpu_upload_rejects_short_data() {
        let context = recording_context(Profile::Desktop);
        let image = Image2d::new(&context);
        image.copy_from_cpu_memory(0, rect(0, 0, 4, 4), gl::RGBA, gl::UNSIGNED_BYTE, &[0; 63]);
    }

    #[test]
    fn pixel_buffer_copies_skip_without_binding() {
        let context = recording_context(Profile::Desktop);
        let image = Image2d::new(&context);
        image.ensure(0);

        image.copy_to_pixel_pack_buffer(0, gl::RGBA, gl::FLOAT, 0);
        image.read_region_to_pixel_pack_buffer(rect(0, 0, 2, 2), gl::RGBA, gl::FLOAT, 0);
        image.copy_from_pixel_unpack_buffer(0, rect(0, 0, 2, 2), gl::RED, gl::FLOAT, 0);
        let backend = context.backend();
        assert_eq!(backend.count(|call| matches!(call, Call::GetTexImage { .. })), 0);
        assert_eq!(backend.count(|call| matches!(call, Call::ReadPixels { .. })), 0);
        assert_eq!(backend.count(|call| matches!(call, Call::TexSubImage2d { .. })), 0);

        let pack = PixelPackBuffer::new(&context);
        pack.ensure();
        image.copy_to_pixel_pack_buffer(0, gl::RGBA, gl::FLOAT, 16);
        assert!(backend.calls().contains(&Call::GetTexImage {
            target: gl::TEXTURE_2D,
            level: 0,
            format: gl::RGBA,
            ty: gl::FLOAT,
            pixels: PixelTransfer::BufferOffset(16),
        }));
    }

    #[test]
    fn whole_level_download_sizes_from_the_driver() {
        let context = recording_context(Profile::Desktop);
        let image = Image2d::new(&context);
        image.ensure(0);
        image.alloc_mutable(0, gl::RGBA8 as GLint, vec2(2, 2), 0, gl::RGBA, gl::UNSIGNED_BYTE, None);

        let mut out = [0u8; 16];
        image.copy_to_cpu_memory(0, gl::RGBA, gl::UNSIGNED_BYTE, &mut out);
        assert!(context.backend().calls().contains(&Call::GetTexImage {
            target: gl::TEXTURE_2D,
            level: 0,
            format: gl::RGBA,
            ty: gl::UNSIGNED_BYTE,
            pixels: PixelTransfer::Host(16),
        }));
    }

    #[test]
    fn copy_from_framebuffer_uses_own_target() {
        let context = recording_context(Profile::Desktop);
        let image = ImageRect::new(&context);
        image.copy_from_current_framebuffer(0, Point2::new(1, 2), rect(3, 4, 5, 6));
        assert_eq!(
            context.backend().calls(),
            vec![Call::CopyTexSubImage2d {
                target: gl::TEXTURE_RECTANGLE,
                level: 0,
                x_offset: 1,
                y_offset: 2,
                x: 3,
                y: 4,
                width: 5,
                height: 6,
            }]
        );
    }

    #[test]
    fn transfer_lengths_respect_alignment() {
        assert_eq!(pixel_size(gl::RGB, gl::UNSIGNED_BYTE), Some(3));
        assert_eq!(pixel_size(gl::RGBA, gl::FLOAT), Some(16));
        assert_eq!(pixel_size(gl::RGBA, gl::UNSIGNED_INT_8_8_8_8_REV), Some(4));
        assert_eq!(pixel_size(gl::RGBA, gl::FIXED), None);

        assert_eq!(transfer_len(vec2(3, 2), gl::RGB, gl::UNSIGNED_BYTE, 1), Some(18));
        // 9-byte rows padded to 12.
        assert_eq!(transfer_len(vec2(3, 2), gl::RGB, gl::UNSIGNED_BYTE, 4), Some(21));
        assert_eq!(transfer_len(vec2(0, 5), gl::RGB, gl::UNSIGNED_BYTE, 4), Some(0));
    }

    #[test]
    fn buffer_image_owns_and_attaches_storage() {
        let context = recording_context(Profile::Desktop);
        let image = BufferImage::new(&context);
        image.ensure(0);
        image.alloc_with_data(gl::R32F, &[1.0f32, 2.0, 3.0, 4.0], BufferUsage::StaticRead);

        let storage = image.attached_buffer();
        assert_ne!(storage, 0);
        assert!(context.backend().calls().contains(&Call::TexBuffer {
            target: gl::TEXTURE_BUFFER,
            internal_format: gl::R32F,
            buffer: storage,
        }));

        image.copy_from_cpu_memory(4, &[9.0f32]);
        let mut out = [0.0f32; 4];
        image.copy_to_cpu_memory(0, &mut out);
        assert_eq!(out, [1.0, 9.0, 3.0, 4.0]);
        assert_eq!(image.max_size(), 65536);
        assert_eq!(BufferImage::<RecordingGl>::glsl_type(), "samplerBuffer");
    }

    #[test]
    fn buffer_image_views_attached_pixel_buffer() {
        let context = recording_context(Profile::Desktop);
        let pack = PixelPackBuffer::new(&context);
        pack.ensure();
        pack.alloc_static(8);

        let image = BufferImage::new(&context);
        image.ensure(1);
        image.attach_pack_buffer(gl::RGBA8, &pack);
        assert_eq!(image.attached_buffer(), pack.name());

        image.copy_from_cpu_memory(0, &[5u8, 6]);
        assert_eq!(context.backend().buffer_contents(pack.name()), Some(vec![5, 6, 0, 0, 0, 0, 0, 0]));
        // Only the pack buffer exists; the image never created storage of its own.
        assert_eq!(context.backend().count(|call| matches!(call, Call::GenBuffer(_))), 1);
    }

    #[test]
    fn detached_buffer_image_skips_copies() {
        let context = recording_context(Profile::Desktop);
        let image = BufferImage::new(&context);
        image.ensure(0);
        context.backend().take_calls();

        image.copy_from_cpu_memory(0, &[1u8, 2]);
        let mut out = [7u8; 2];
        image.copy_to_cpu_memory(0, &mut out);

        assert_eq!(out, [7, 7]);
        let backend = context.backend();
        assert_eq!(backend.count(|call| matches!(call, Call::BindBuffer(..))), 0);
        assert_eq!(backend.count(|call| matches!(call, Call::BufferSubData { .. })), 0);
        assert_eq!(backend.count(|call| matches!(call, Call::GetBufferSubData { .. })), 0);
        assert!(context.check_error().is_ok());
    }
}
