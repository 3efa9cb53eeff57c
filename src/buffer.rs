use bytemuck::Pod;
use log::*;
use serde::*;
use std::cell::Cell;
use std::marker::PhantomData;
use std::os::raw::c_void;
use std::slice;

use crate::backend::*;
use crate::binding::*;
use crate::context::*;
use crate::gl;
use crate::gl::types::*;

/// How the contents of a buffer will be used; passed to the driver as a hint.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum BufferUsage {
    StreamDraw,
    StreamRead,
    StreamCopy,
    StaticDraw,
    StaticRead,
    StaticCopy,
    DynamicDraw,
    DynamicRead,
    DynamicCopy,
}

impl BufferUsage {
    pub(crate) fn as_gl(self) -> u32 {
        match self {
            BufferUsage::StreamDraw => gl::STREAM_DRAW,
            BufferUsage::StreamRead => gl::STREAM_READ,
            BufferUsage::StreamCopy => gl::STREAM_COPY,
            BufferUsage::StaticDraw => gl::STATIC_DRAW,
            BufferUsage::StaticRead => gl::STATIC_READ,
            BufferUsage::StaticCopy => gl::STATIC_COPY,
            BufferUsage::DynamicDraw => gl::DYNAMIC_DRAW,
            BufferUsage::DynamicRead => gl::DYNAMIC_READ,
            BufferUsage::DynamicCopy => gl::DYNAMIC_COPY,
        }
    }
}

/// An OpenGL primitive.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Primitive {
    Points,
    Lines,
    LineLoop,
    LineStrip,
    Triangles,
    TriangleStrip,
    TriangleFan,
}

impl Primitive {
    pub(crate) fn as_gl(self) -> u32 {
        match self {
            Primitive::Points => gl::POINTS,
            Primitive::Lines => gl::LINES,
            Primitive::LineLoop => gl::LINE_LOOP,
            Primitive::LineStrip => gl::LINE_STRIP,
            Primitive::Triangles => gl::TRIANGLES,
            Primitive::TriangleStrip => gl::TRIANGLE_STRIP,
            Primitive::TriangleFan => gl::TRIANGLE_FAN,
        }
    }
}

/// The integer type of an index buffer.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum IndexType {
    U8,
    U16,
    U32,
}

impl IndexType {
    pub(crate) fn as_gl(self) -> u32 {
        match self {
            IndexType::U8 => gl::UNSIGNED_BYTE,
            IndexType::U16 => gl::UNSIGNED_SHORT,
            IndexType::U32 => gl::UNSIGNED_INT,
        }
    }

    /// Size of one index in bytes.
    pub fn size(self) -> usize {
        match self {
            IndexType::U8 => 1,
            IndexType::U16 => 2,
            IndexType::U32 => 4,
        }
    }
}

/// The access mode of a buffer mapping.
pub trait MapAccess {
    const ACCESS: GLenum;
}

pub trait ReadableAccess: MapAccess {}
pub trait WritableAccess: MapAccess {}

#[derive(Copy, Clone, Debug)]
pub enum ReadAccess {}

#[derive(Copy, Clone, Debug)]
pub enum WriteAccess {}

#[derive(Copy, Clone, Debug)]
pub enum ReadWriteAccess {}

impl MapAccess for ReadAccess {
    const ACCESS: GLenum = gl::READ_ONLY;
}

impl MapAccess for WriteAccess {
    const ACCESS: GLenum = gl::WRITE_ONLY;
}

impl MapAccess for ReadWriteAccess {
    const ACCESS: GLenum = gl::READ_WRITE;
}

impl ReadableAccess for ReadAccess {}
impl ReadableAccess for ReadWriteAccess {}
impl WritableAccess for WriteAccess {}
impl WritableAccess for ReadWriteAccess {}

/// Operations shared by owning buffers and borrowed buffer handles.
///
/// Apart from `ensure`, `leave` and the `map_*` methods, these act on whatever buffer is bound
/// to the target, exactly like the GL calls they wrap. Call `ensure` first.
pub trait BufferObject {
    type Target: BufferTarget;
    type Backend: Backend;

    fn context(&self) -> &GlContext<Self::Backend>;

    /// The object name, or 0 if no object has been created yet.
    fn name(&self) -> GLuint;

    /// Returns the object name, creating the object if this handle is allowed to.
    #[doc(hidden)]
    fn create_name(&self) -> GLuint;

    /// The name of the buffer currently bound to this handle's target.
    fn query_current_binding(&self) -> GLuint {
        Self::Target::query_current_binding(self.context())
    }

    /// Creates the buffer if needed and binds it, unless it is already bound.
    fn ensure(&self) {
        let name = self.create_name();
        if self.query_current_binding() != name {
            self.context().inner.bind_buffer(Self::Target::TARGET, name);
        } else {
            trace!("Buffer {} already bound to 0x{:04X}", name, Self::Target::TARGET);
        }
    }

    /// Unbinds the buffer, if and only if it is the one currently bound.
    fn leave(&self) {
        let name = self.name();
        if name != 0 && self.query_current_binding() == name {
            self.context().inner.bind_buffer(Self::Target::TARGET, 0);
        }
    }

    /// (Re)allocates `size` bytes of uninitialized storage.
    fn alloc(&self, size: usize, usage: BufferUsage) {
        debug!("Allocating {} bytes on 0x{:04X} ({:?})", size, Self::Target::TARGET, usage);
        self.context().inner.buffer_data_size(Self::Target::TARGET, size, usage.as_gl());
    }

    /// (Re)allocates storage holding a copy of `data`.
    fn alloc_with_data<T: Pod>(&self, data: &[T], usage: BufferUsage) {
        let bytes: &[u8] = bytemuck::cast_slice(data);
        debug!("Allocating {} bytes on 0x{:04X} ({:?})", bytes.len(), Self::Target::TARGET, usage);
        self.context().inner.buffer_data_u8_slice(Self::Target::TARGET, bytes, usage.as_gl());
    }

    /// Overwrites storage starting at byte `offset`.
    fn copy<T: Pod>(&self, offset: usize, data: &[T]) {
        self.context().inner.buffer_sub_data_u8_slice(
            Self::Target::TARGET,
            offset,
            bytemuck::cast_slice(data),
        );
    }

    /// Reads storage starting at byte `offset` into `out`.
    fn copy_to<T: Pod>(&self, offset: usize, out: &mut [T])
    where
        Self::Backend: DesktopBackend,
    {
        self.context().inner.get_buffer_sub_data(
            Self::Target::TARGET,
            offset,
            bytemuck::cast_slice_mut(out),
        );
    }

    /// Binds this buffer and maps its whole storage for reading.
    ///
    /// Returns `None` if the driver refuses, e.g. when the buffer has no storage or is already
    /// mapped.
    fn map_read_only(&mut self) -> Option<MappedBuffer<'_, Self::Backend, ReadAccess>>
    where
        Self::Backend: DesktopBackend,
    {
        map_buffer(&*self)
    }

    /// Binds this buffer and maps its whole storage for writing.
    fn map_write_only(&mut self) -> Option<MappedBuffer<'_, Self::Backend, WriteAccess>>
    where
        Self::Backend: DesktopBackend,
    {
        map_buffer(&*self)
    }

    /// Binds this buffer and maps its whole storage for reading and writing.
    fn map_read_write(&mut self) -> Option<MappedBuffer<'_, Self::Backend, ReadWriteAccess>>
    where
        Self::Backend: DesktopBackend,
    {
        map_buffer(&*self)
    }
}

fn map_buffer<O, A>(buffer: &O) -> Option<MappedBuffer<'_, O::Backend, A>>
where
    O: BufferObject + ?Sized,
    O::Backend: DesktopBackend,
    A: MapAccess,
{
    buffer.ensure();
    let context = buffer.context();
    let target = O::Target::TARGET;
    let pointer = context.inner.map_buffer(target, A::ACCESS);
    if pointer.is_null() {
        warn!("Unable to map buffer {} on 0x{:04X}", buffer.name(), target);
        return None;
    }
    let len = context.inner.get_buffer_parameter_i32(target, gl::BUFFER_SIZE).max(0) as usize;
    Some(MappedBuffer {
        context,
        target,
        binding: O::Target::BINDING,
        name: buffer.name(),
        pointer: pointer as *mut u8,
        len,
        phantom: PhantomData,
    })
}

/// The storage of a buffer, mapped into host memory.
///
/// Unmaps when dropped. The buffer it came from stays mutably borrowed until then.
pub struct MappedBuffer<'a, B: DesktopBackend, A: MapAccess> {
    context: &'a GlContext<B>,
    target: GLenum,
    binding: GLenum,
    name: GLuint,
    pointer: *mut u8,
    len: usize,
    phantom: PhantomData<(&'a mut [u8], A)>,
}

impl<'a, B: DesktopBackend, A: MapAccess> MappedBuffer<'a, B, A> {
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Unmaps the buffer. Returns false if the driver reports that the contents were corrupted
    /// while mapped, in which case they must be uploaded again.
    pub fn unmap(mut self) -> bool {
        self.release()
    }

    fn release(&mut self) -> bool {
        if self.pointer.is_null() {
            return true;
        }
        self.pointer = std::ptr::null_mut();

        // Someone else may have taken the binding point since we mapped.
        let current = self.context.query_binding(self.binding);
        if current != self.name {
            self.context.inner.bind_buffer(self.target, self.name);
        }
        let intact = self.context.inner.unmap_buffer(self.target);
        if current != self.name {
            self.context.inner.bind_buffer(self.target, current);
        }
        if !intact {
            warn!("Buffer {} was corrupted while mapped", self.name);
        }
        intact
    }
}

impl<'a, B: DesktopBackend, A: ReadableAccess> MappedBuffer<'a, B, A> {
    pub fn as_slice(&self) -> &[u8] {
        // SAFETY: `pointer` came from a successful map of `len` bytes and stays valid until
        // `release`, which needs `&mut self`.
        unsafe { slice::from_raw_parts(self.pointer, self.len) }
    }
}

impl<'a, B: DesktopBackend, A: WritableAccess> MappedBuffer<'a, B, A> {
    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        // SAFETY: as in `as_slice`; the mapping is exclusive to this guard.
        unsafe { slice::from_raw_parts_mut(self.pointer, self.len) }
    }
}

impl<'a, B: DesktopBackend, A: MapAccess> Drop for MappedBuffer<'a, B, A> {
    fn drop(&mut self) {
        self.release();
    }
}

/// An owned GL buffer object bound to target `T`.
///
/// The object is created lazily by the first `ensure`, and deleted when the `GpuBuffer` is
/// dropped.
pub struct GpuBuffer<T: BufferTarget, B: Backend> {
    name: Cell<GLuint>,
    context: GlContext<B>,
    phantom: PhantomData<T>,
}

pub type VertexBuffer<B> = GpuBuffer<ArrayTarget, B>;
pub type ElementBuffer<B> = GpuBuffer<ElementArrayTarget, B>;
pub type PixelPackBuffer<B> = GpuBuffer<PixelPackTarget, B>;
pub type PixelUnpackBuffer<B> = GpuBuffer<PixelUnpackTarget, B>;
/// The storage of a buffer texture.
pub type TexBuffer<B> = GpuBuffer<TextureBufferTarget, B>;

impl<T: BufferTarget, B: Backend> GpuBuffer<T, B> {
    pub fn new(context: &GlContext<B>) -> Self {
        GpuBuffer { name: Cell::new(0), context: context.clone(), phantom: PhantomData }
    }
}

impl<T: BufferTarget, B: Backend> BufferObject for GpuBuffer<T, B> {
    type Target = T;
    type Backend = B;

    fn context(&self) -> &GlContext<B> {
        &self.context
    }

    fn name(&self) -> GLuint {
        self.name.get()
    }

    #[doc(hidden)]
    fn create_name(&self) -> GLuint {
        if self.name.get() == 0 {
            let name = self.context.inner.gen_buffer();
            trace!("Created buffer {} for 0x{:04X}", name, T::TARGET);
            self.name.set(name);
        }
        self.name.get()
    }
}

impl<T: BufferTarget, B: Backend> Drop for GpuBuffer<T, B> {
    fn drop(&mut self) {
        let name = self.name.get();
        if name != 0 {
            self.leave();
            self.context.inner.delete_buffer(name);
            trace!("Deleted buffer {}", name);
        }
    }
}

/// A borrowed view of a buffer object owned elsewhere. Never creates or deletes the object.
pub struct BufferHandle<'a, T: BufferTarget, B: Backend> {
    name: GLuint,
    context: &'a GlContext<B>,
    phantom: PhantomData<T>,
}

pub type TexBufferHandle<'a, B> = BufferHandle<'a, TextureBufferTarget, B>;

impl<'a, T: BufferTarget, B: Backend> BufferHandle<'a, T, B> {
    /// Wraps an existing buffer name.
    ///
    /// # Safety
    ///
    /// While the handle lives, nothing else may map the buffer or reallocate its storage:
    /// the handle's own mappings hand out host slices that must stay valid.
    pub unsafe fn from_raw(context: &'a GlContext<B>, name: GLuint) -> Self {
        BufferHandle { name, context, phantom: PhantomData }
    }
}

impl<'a, T: BufferTarget, B: Backend> BufferObject for BufferHandle<'a, T, B> {
    type Target = T;
    type Backend = B;

    fn context(&self) -> &GlContext<B> {
        self.context
    }

    fn name(&self) -> GLuint {
        self.name
    }

    #[doc(hidden)]
    fn create_name(&self) -> GLuint {
        self.name
    }
}

impl<B: Backend> GpuBuffer<ArrayTarget, B> {
    pub fn draw_arrays(&self, mode: Primitive, first: i32, count: i32) {
        self.context.inner.draw_arrays(mode.as_gl(), first, count);
    }
}

/// Pins fixed-function client arrays to this buffer. Each method binds the buffer first, so
/// `offset` is always a byte offset into it.
impl<B: FixedFunctionBackend> GpuBuffer<ArrayTarget, B> {
    pub fn vertex_use_this_buffer(&self, size: i32, ty: GLenum, stride: i32, offset: usize) {
        self.ensure();
        // SAFETY: a non-zero buffer is bound to ARRAY_BUFFER, so GL reads `offset` as an
        // offset into it rather than as a host pointer.
        unsafe { self.context.inner.vertex_pointer(size, ty, stride, offset as *const c_void) }
    }

    pub fn vertex3f_use_this_buffer(&self, stride: i32, offset: usize) {
        self.vertex_use_this_buffer(3, gl::FLOAT, stride, offset);
    }

    pub fn vertex4f_use_this_buffer(&self, stride: i32, offset: usize) {
        self.vertex_use_this_buffer(4, gl::FLOAT, stride, offset);
    }

    pub fn color_use_this_buffer(&self, size: i32, ty: GLenum, stride: i32, offset: usize) {
        self.ensure();
        // SAFETY: see `vertex_use_this_buffer`.
        unsafe { self.context.inner.color_pointer(size, ty, stride, offset as *const c_void) }
    }

    pub fn color3f_use_this_buffer(&self, stride: i32, offset: usize) {
        self.color_use_this_buffer(3, gl::FLOAT, stride, offset);
    }

    pub fn color4f_use_this_buffer(&self, stride: i32, offset: usize) {
        self.color_use_this_buffer(4, gl::FLOAT, stride, offset);
    }

    pub fn normal_use_this_buffer(&self, ty: GLenum, stride: i32, offset: usize) {
        self.ensure();
        // SAFETY: see `vertex_use_this_buffer`.
        unsafe { self.context.inner.normal_pointer(ty, stride, offset as *const c_void) }
    }

    pub fn color_index_use_this_buffer(&self, ty: GLenum, stride: i32, offset: usize) {
        self.ensure();
        // SAFETY: see `vertex_use_this_buffer`.
        unsafe { self.context.inner.index_pointer(ty, stride, offset as *const c_void) }
    }

    /// Selects client texture unit `unit`, then pins its coordinates to this buffer.
    pub fn tex_coord_use_this_buffer(
        &self,
        unit: u32,
        size: i32,
        ty: GLenum,
        stride: i32,
        offset: usize,
    ) {
        self.context.inner.client_active_texture(gl::TEXTURE0 + unit);
        self.tex_coord_use_this_buffer_and_current_unit(size, ty, stride, offset);
    }

    pub fn tex_coord_use_this_buffer_and_current_unit(
        &self,
        size: i32,
        ty: GLenum,
        stride: i32,
        offset: usize,
    ) {
        self.ensure();
        // SAFETY: see `vertex_use_this_buffer`.
        unsafe { self.context.inner.tex_coord_pointer(size, ty, stride, offset as *const c_void) }
    }
}

impl<B: Backend> GpuBuffer<ElementArrayTarget, B> {
    /// Binds this buffer and draws `count` indices of type `ty` starting at byte `offset` of it.
    pub fn draw_elements(&self, mode: Primitive, count: i32, ty: IndexType, offset: usize) {
        self.ensure();
        self.context.inner.draw_elements(mode.as_gl(), count, ty.as_gl(), offset);
    }
}

impl<B: Backend> GpuBuffer<PixelPackTarget, B> {
    pub fn alloc_static(&self, size: usize) {
        self.alloc(size, BufferUsage::StaticRead);
    }

    pub fn alloc_dynamic(&self, size: usize) {
        self.alloc(size, BufferUsage::DynamicRead);
    }
}

impl<B: DesktopBackend> GpuBuffer<PixelPackTarget, B> {
    pub fn map(&mut self) -> Option<MappedBuffer<'_, B, ReadAccess>> {
        self.map_read_only()
    }
}

impl<B: Backend> GpuBuffer<PixelUnpackTarget, B> {
    pub fn alloc_static(&self, size: usize) {
        self.alloc(size, BufferUsage::StaticDraw);
    }

    pub fn alloc_dynamic(&self, size: usize) {
        self.alloc(size, BufferUsage::DynamicDraw);
    }
}

impl<B: DesktopBackend> GpuBuffer<PixelUnpackTarget, B> {
    pub fn map(&mut self) -> Option<MappedBuffer<'_, B, WriteAccess>> {
        self.map_write_only()
    }
}

/// Unbinds whatever buffer is bound to `T` and rebinds it when dropped.
pub struct BindingSaver<'a, T: BufferTarget, B: Backend> {
    context: &'a GlContext<B>,
    saved: GLuint,
    phantom: PhantomData<T>,
}

/// Keeps pixel downloads going to host memory rather than into a bound pack buffer.
pub type PixelPackBindingSaver<'a, B> = BindingSaver<'a, PixelPackTarget, B>;
/// Keeps pixel uploads coming from host memory rather than from a bound unpack buffer.
pub type PixelUnpackBindingSaver<'a, B> = BindingSaver<'a, PixelUnpackTarget, B>;

impl<'a, T: BufferTarget, B: Backend> BindingSaver<'a, T, B> {
    pub fn new(context: &'a GlContext<B>) -> Self {
        let saved = T::query_current_binding(context);
        if saved != 0 {
            context.inner.bind_buffer(T::TARGET, 0);
        }
        BindingSaver { context, saved, phantom: PhantomData }
    }

    /// The buffer that will be rebound, or 0.
    pub fn saved(&self) -> GLuint {
        self.saved
    }
}

impl<'a, T: BufferTarget, B: Backend> Drop for BindingSaver<'a, T, B> {
    fn drop(&mut self) {
        if self.saved != 0 {
            self.context.inner.bind_buffer(T::TARGET, self.saved);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recording::*;

    fn is_bind(call: &Call) -> bool {
        matches!(call, Call::BindBuffer(..))
    }

    #[test]
    fn ensure_creates_and_binds_once() {
        let context = recording_context(Profile::Desktop);
        let buffer = VertexBuffer::new(&context);
        assert_eq!(buffer.name(), 0);

        buffer.ensure();
        buffer.ensure();

        let backend = context.backend();
        assert_eq!(backend.count(|call| matches!(call, Call::GenBuffer(_))), 1);
        assert_eq!(backend.count(is_bind), 1);
        assert_ne!(buffer.name(), 0);
        assert_eq!(buffer.query_current_binding(), buffer.name());
    }

    #[test]
    fn leave_only_unbinds_own_buffer() {
        let context = recording_context(Profile::Desktop);
        let first = VertexBuffer::new(&context);
        let second = VertexBuffer::new(&context);

        first.ensure();
        first.leave();
        assert_eq!(first.query_current_binding(), 0);

        first.ensure();
        second.ensure();
        context.backend().take_calls();
        first.leave();
        assert_eq!(context.backend().count(is_bind), 0);
        assert_eq!(first.query_current_binding(), second.name());
    }

    #[test]
    fn drop_deletes_exactly_once() {
        let context = recording_context(Profile::Desktop);
        {
            let _unused = ElementBuffer::new(&context);
        }
        assert_eq!(context.backend().count(|call| matches!(call, Call::DeleteBuffer(_))), 0);

        let name = {
            let buffer = ElementBuffer::new(&context);
            buffer.ensure();
            buffer.name()
        };
        assert_eq!(
            context.backend().count(|call| matches!(call, Call::DeleteBuffer(_))),
            1
        );
        assert!(context.backend().calls().contains(&Call::DeleteBuffer(name)));
        assert_eq!(context.query_binding(gl::ELEMENT_ARRAY_BUFFER_BINDING), 0);
    }

    #[test]
    fn borrowed_handle_never_creates_or_deletes() {
        let context = recording_context(Profile::Desktop);
        let owner = TexBuffer::new(&context);
        owner.ensure();
        owner.alloc(8, BufferUsage::StaticRead);
        owner.leave();
        context.backend().take_calls();

        {
            let handle = unsafe { TexBufferHandle::from_raw(&context, owner.name()) };
            handle.ensure();
            handle.copy(0, &[1u8, 2, 3, 4]);
        }
        let backend = context.backend();
        assert_eq!(backend.count(|call| matches!(call, Call::GenBuffer(_))), 0);
        assert_eq!(backend.count(|call| matches!(call, Call::DeleteBuffer(_))), 0);
        assert_eq!(backend.buffer_contents(owner.name()), Some(vec![1, 2, 3, 4, 0, 0, 0, 0]));
    }

    #[test]
    fn typed_uploads_and_downloads() {
        let context = recording_context(Profile::Desktop);
        let buffer = VertexBuffer::new(&context);
        buffer.ensure();
        buffer.alloc_with_data(&[1.0f32, 2.0, 3.0], BufferUsage::DynamicDraw);
        buffer.copy(4, &[5.0f32]);

        let mut out = [0.0f32; 3];
        buffer.copy_to(0, &mut out);
        assert_eq!(out, [1.0, 5.0, 3.0]);
        assert!(context.backend().calls().contains(&Call::BufferData {
            target: gl::ARRAY_BUFFER,
            size: 12,
            usage: gl::DYNAMIC_DRAW,
        }));
    }

    #[test]
    fn usage_is_forwarded_verbatim() {
        let context = recording_context(Profile::Es);
        let buffer = PixelUnpackBuffer::new(&context);
        buffer.ensure();
        buffer.alloc(64, BufferUsage::StreamCopy);
        buffer.alloc_dynamic(32);
        let usages: Vec<GLenum> = context
            .backend()
            .calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::BufferData { usage, .. } => Some(usage),
                _ => None,
            })
            .collect();
        assert_eq!(usages, vec![gl::STREAM_COPY, gl::DYNAMIC_DRAW]);
    }

    #[test]
    fn mapping_writes_through_and_unmaps_on_drop() {
        let context = recording_context(Profile::Desktop);
        let mut buffer = PixelUnpackBuffer::new(&context);
        buffer.ensure();
        buffer.alloc_static(4);

        {
            let mut mapped = buffer.map().expect("mapped");
            assert_eq!(mapped.len(), 4);
            mapped.as_mut_slice().copy_from_slice(&[9, 8, 7, 6]);
        }
        assert_eq!(context.backend().count(|call| matches!(call, Call::UnmapBuffer(_))), 1);
        assert_eq!(context.backend().buffer_contents(buffer.name()), Some(vec![9, 8, 7, 6]));

        let mapped = buffer.map_read_write().expect("mapped again");
        assert_eq!(mapped.as_slice(), &[9, 8, 7, 6]);
        assert!(mapped.unmap());
        assert_eq!(context.backend().count(|call| matches!(call, Call::UnmapBuffer(_))), 2);
    }

    #[test]
    fn mapping_without_storage_is_none() {
        let context = recording_context(Profile::Desktop);
        let mut buffer = PixelPackBuffer::new(&context);
        assert!(buffer.map().is_none());
        assert_eq!(context.backend().count(|call| matches!(call, Call::UnmapBuffer(_))), 0);
    }

    #[test]
    fn unmap_rebinds_mapped_buffer_when_displaced() {
        let context = recording_context(Profile::Desktop);
        let mut mapped_buffer = PixelPackBuffer::new(&context);
        let other = PixelPackBuffer::new(&context);
        mapped_buffer.ensure();
        mapped_buffer.alloc_static(8);
        let name = mapped_buffer.name();

        let mapped = mapped_buffer.map().expect("mapped");
        other.ensure();
        context.backend().take_calls();
        assert!(mapped.unmap());

        let binds: Vec<Call> =
            context.backend().calls().into_iter().filter(|call| is_bind(call)).collect();
        assert_eq!(
            binds,
            vec![
                Call::BindBuffer(gl::PIXEL_PACK_BUFFER, name),
                Call::BindBuffer(gl::PIXEL_PACK_BUFFER, other.name()),
            ]
        );
    }

    #[test]
    fn binding_saver_restores_previous_binding() {
        let context = recording_context(Profile::Desktop);
        let pack = PixelPackBuffer::new(&context);
        pack.ensure();
        {
            let saver = PixelPackBindingSaver::new(&context);
            assert_eq!(saver.saved(), pack.name());
            assert_eq!(pack.query_current_binding(), 0);
        }
        assert_eq!(pack.query_current_binding(), pack.name());

        pack.leave();
        context.backend().take_calls();
        drop(PixelPackBindingSaver::new(&context));
        assert_eq!(context.backend().count(is_bind), 0);
    }

    #[test]
    fn draws_forward_mode_and_index_type() {
        let context = recording_context(Profile::Es);
        let vertices = VertexBuffer::new(&context);
        let indices = ElementBuffer::new(&context);
        vertices.draw_arrays(Primitive::TriangleStrip, 2, 4);
        indices.draw_elements(Primitive::Triangles, 6, IndexType::U16, 12);

        let calls = context.backend().calls();
        assert!(calls.contains(&Call::DrawArrays { mode: gl::TRIANGLE_STRIP, first: 2, count: 4 }));
        assert!(calls.contains(&Call::DrawElements {
            mode: gl::TRIANGLES,
            count: 6,
            ty: gl::UNSIGNED_SHORT,
            offset: 12,
        }));
    }

    #[test]
    fn element_draw_binds_its_buffer_first() {
        let context = recording_context(Profile::Desktop);
        let indices = ElementBuffer::new(&context);
        indices.draw_elements(Primitive::Triangles, 3, IndexType::U16, 64);

        assert_ne!(indices.name(), 0);
        let calls = context.backend().calls();
        let bind = calls
            .iter()
            .position(|call| *call == Call::BindBuffer(gl::ELEMENT_ARRAY_BUFFER, indices.name()));
        let draw = calls.iter().position(|call| matches!(call, Call::DrawElements { offset: 64, .. }));
        assert!(bind.is_some() && bind < draw);
    }

    #[test]
    fn borrowed_handle_leaves_only_when_current() {
        let context = recording_context(Profile::Desktop);
        let first = VertexBuffer::new(&context);
        let second = VertexBuffer::new(&context);
        first.ensure();
        second.ensure();
        let handle = unsafe { BufferHandle::<ArrayTarget, _>::from_raw(&context, first.name()) };
        context.backend().take_calls();

        handle.leave();
        assert_eq!(context.backend().count(is_bind), 0);
        assert_eq!(context.query_binding(gl::ARRAY_BUFFER_BINDING), second.name());

        handle.ensure();
        handle.leave();
        assert_eq!(context.query_binding(gl::ARRAY_BUFFER_BINDING), 0);
        assert_eq!(
            context.backend().calls().last(),
            Some(&Call::BindBuffer(gl::ARRAY_BUFFER, 0))
        );
    }

    #[test]
    fn client_arrays_point_into_this_buffer() {
        let context = recording_context(Profile::Desktop);
        let buffer = VertexBuffer::new(&context);
        buffer.vertex3f_use_this_buffer(24, 0);
        buffer.color4f_use_this_buffer(24, 12);
        buffer.tex_coord_use_this_buffer(1, 2, gl::FLOAT, 0, 64);

        let calls = context.backend().calls();
        assert_eq!(calls.iter().filter(|call| is_bind(call)).count(), 1);
        assert!(calls.contains(&Call::VertexPointer { size: 3, ty: gl::FLOAT, stride: 24, pointer: 0 }));
        assert!(calls.contains(&Call::ColorPointer { size: 4, ty: gl::FLOAT, stride: 24, pointer: 12 }));

        let unit = calls.iter().position(|call| *call == Call::ClientActiveTexture(gl::TEXTURE1));
        let pointer = calls.iter().position(|call| {
            *call == Call::TexCoordPointer { size: 2, ty: gl::FLOAT, stride: 0, pointer: 64 }
        });
        assert!(unit.is_some() && unit < pointer);
    }

    #[test]
    fn index_sizes() {
        assert_eq!(IndexType::U8.size(), 1);
        assert_eq!(IndexType::U16.size(), 2);
        assert_eq!(IndexType::U32.size(), 4);
    }
}
