//! Legacy fixed-function pipeline state: client arrays, enable bits and the attrib and matrix
//! stacks. Desktop compatibility profile only.

use bytemuck::Pod;
use std::ops::Deref;
use std::os::raw::c_void;

use crate::backend::*;
use crate::binding::*;
use crate::buffer::*;
use crate::context::*;
use crate::gl;
use crate::gl::types::*;

/// Indices read from host memory by `FixedPipelineClient::draw_elements`.
#[derive(Copy, Clone, Debug)]
pub enum Indices<'a> {
    U8(&'a [u8]),
    U16(&'a [u16]),
    U32(&'a [u32]),
}

impl<'a> Indices<'a> {
    pub fn len(&self) -> usize {
        match self {
            Indices::U8(indices) => indices.len(),
            Indices::U16(indices) => indices.len(),
            Indices::U32(indices) => indices.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn index_type(&self) -> IndexType {
        match self {
            Indices::U8(_) => IndexType::U8,
            Indices::U16(_) => IndexType::U16,
            Indices::U32(_) => IndexType::U32,
        }
    }

    fn as_bytes(&self) -> &'a [u8] {
        match *self {
            Indices::U8(indices) => indices,
            Indices::U16(indices) => bytemuck::cast_slice(indices),
            Indices::U32(indices) => bytemuck::cast_slice(indices),
        }
    }
}

/// Drives the fixed-function pipeline with arrays pinned to buffers (see the
/// `*_use_this_buffer` methods of `VertexBuffer`).
pub struct FixedPipelineClient<B: FixedFunctionBackend> {
    context: GlContext<B>,
}

impl<B: FixedFunctionBackend> FixedPipelineClient<B> {
    pub fn new(context: &GlContext<B>) -> Self {
        FixedPipelineClient { context: context.clone() }
    }

    /// Switches to the fixed pipeline by unbinding any program.
    pub fn ensure(&self) {
        self.context.inner.use_program(0);
    }

    fn connect(&self, array: GLenum) -> &Self {
        self.context.inner.enable_client_state(array);
        self
    }

    fn disconnect(&self, array: GLenum) -> &Self {
        self.context.inner.disable_client_state(array);
        self
    }

    pub fn connect_color(&self) -> &Self {
        self.connect(gl::COLOR_ARRAY)
    }

    pub fn disconnect_color(&self) -> &Self {
        self.disconnect(gl::COLOR_ARRAY)
    }

    pub fn connect_vertex(&self) -> &Self {
        self.connect(gl::VERTEX_ARRAY)
    }

    pub fn disconnect_vertex(&self) -> &Self {
        self.disconnect(gl::VERTEX_ARRAY)
    }

    /// Acts on the client texture unit selected last.
    pub fn connect_tex_coord(&self) -> &Self {
        self.connect(gl::TEXTURE_COORD_ARRAY)
    }

    pub fn disconnect_tex_coord(&self) -> &Self {
        self.disconnect(gl::TEXTURE_COORD_ARRAY)
    }

    pub fn connect_normal(&self) -> &Self {
        self.connect(gl::NORMAL_ARRAY)
    }

    pub fn disconnect_normal(&self) -> &Self {
        self.disconnect(gl::NORMAL_ARRAY)
    }

    /// Pushes the client vertex array state.
    pub fn save_attrib_arrays(&self) {
        self.context.inner.push_client_attrib(gl::CLIENT_VERTEX_ARRAY_BIT);
    }

    pub fn restore_attrib_arrays(&self) {
        self.context.inner.pop_client_attrib();
    }

    pub fn open_texture_2d(&self) {
        self.context.enable(GlFlag::Texture2d);
    }

    pub fn close_texture_2d(&self) {
        self.context.disable(GlFlag::Texture2d);
    }

    pub fn open_lighting(&self) {
        self.context.enable(GlFlag::Lighting);
    }

    pub fn close_lighting(&self) {
        self.context.disable(GlFlag::Lighting);
    }

    pub fn open_depth_test(&self) {
        self.context.enable(GlFlag::DepthTest);
    }

    pub fn close_depth_test(&self) {
        self.context.disable(GlFlag::DepthTest);
    }

    /// Pushes the enable, depth buffer and lighting state, which covers everything the
    /// `open_*`/`close_*` methods touch.
    pub fn save_states(&self) {
        self.context.inner.push_attrib(gl::ENABLE_BIT | gl::DEPTH_BUFFER_BIT | gl::LIGHTING_BIT);
    }

    pub fn restore_states(&self) {
        self.context.inner.pop_attrib();
    }

    pub fn save_matrix(&self) {
        self.context.inner.push_matrix();
    }

    pub fn restore_matrix(&self) {
        self.context.inner.pop_matrix();
    }

    pub fn draw_arrays(&self, mode: Primitive, first: i32, count: i32) {
        self.context.inner.draw_arrays(mode.as_gl(), first, count);
    }

    /// Draws with indices from host memory. Any element buffer is unbound for the duration of
    /// the call.
    pub fn draw_elements(&self, mode: Primitive, indices: Indices<'_>) {
        let _saver = BindingSaver::<ElementArrayTarget, B>::new(&self.context);
        self.context.inner.draw_elements_u8_slice(
            mode.as_gl(),
            indices.len() as GLsizei,
            indices.index_type().as_gl(),
            indices.as_bytes(),
        );
    }
}

/// A `FixedPipelineClient` whose arrays live in host memory.
pub struct CpuClient<B: FixedFunctionBackend> {
    client: FixedPipelineClient<B>,
}

impl<B: FixedFunctionBackend> Deref for CpuClient<B> {
    type Target = FixedPipelineClient<B>;

    fn deref(&self) -> &FixedPipelineClient<B> {
        &self.client
    }
}

/// # Safety
///
/// For every `*_use_this_array` method: GL keeps the address of `data` and reads through it on
/// each later draw, so `data` must stay alive, unmoved and large enough for every draw made
/// until the array is disconnected or pointed elsewhere.
impl<B: FixedFunctionBackend> CpuClient<B> {
    pub fn new(context: &GlContext<B>) -> Self {
        CpuClient { client: FixedPipelineClient::new(context) }
    }

    /// Unbinds any program, array buffer and element buffer, so pointers are read as host
    /// addresses.
    pub fn ensure(&self) {
        self.client.ensure();
        let context = &self.client.context;
        context.inner.bind_buffer(gl::ARRAY_BUFFER, 0);
        context.inner.bind_buffer(gl::ELEMENT_ARRAY_BUFFER, 0);
    }

    fn unbind_array_buffer(&self) {
        let context = &self.client.context;
        if ArrayTarget::query_current_binding(context) != 0 {
            context.inner.bind_buffer(gl::ARRAY_BUFFER, 0);
        }
    }

    fn pointer<T: Pod>(data: &[T]) -> *const c_void {
        data.as_ptr() as *const c_void
    }

    /// # Safety
    ///
    /// See the `impl` block.
    pub unsafe fn vertex_use_this_array<T: Pod>(&self, size: i32, ty: GLenum, stride: i32, data: &[T]) {
        self.unbind_array_buffer();
        self.client.context.inner.vertex_pointer(size, ty, stride, Self::pointer(data));
    }

    /// # Safety
    ///
    /// See the `impl` block.
    pub unsafe fn color_use_this_array<T: Pod>(&self, size: i32, ty: GLenum, stride: i32, data: &[T]) {
        self.unbind_array_buffer();
        self.client.context.inner.color_pointer(size, ty, stride, Self::pointer(data));
    }

    /// # Safety
    ///
    /// See the `impl` block.
    pub unsafe fn normal_use_this_array<T: Pod>(&self, ty: GLenum, stride: i32, data: &[T]) {
        self.unbind_array_buffer();
        self.client.context.inner.normal_pointer(ty, stride, Self::pointer(data));
    }

    /// # Safety
    ///
    /// See the `impl` block.
    pub unsafe fn color_index_use_this_array<T: Pod>(&self, ty: GLenum, stride: i32, data: &[T]) {
        self.unbind_array_buffer();
        self.client.context.inner.index_pointer(ty, stride, Self::pointer(data));
    }

    /// Selects client texture unit `unit`, then points its coordinates at `data`.
    ///
    /// # Safety
    ///
    /// See the `impl` block.
    pub unsafe fn tex_coord_use_this_array<T: Pod>(
        &self,
        unit: u32,
        size: i32,
        ty: GLenum,
        stride: i32,
        data: &[T],
    ) {
        self.unbind_array_buffer();
        let inner = &self.client.context.inner;
        inner.client_active_texture(gl::TEXTURE0 + unit);
        inner.tex_coord_pointer(size, ty, stride, Self::pointer(data));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recording::*;

    #[test]
    fn connections_chain() {
        let context = recording_context(Profile::Desktop);
        let client = FixedPipelineClient::new(&context);
        client.connect_vertex().connect_color().connect_normal().disconnect_tex_coord();
        assert_eq!(
            context.backend().calls(),
            vec![
                Call::EnableClientState(gl::VERTEX_ARRAY),
                Call::EnableClientState(gl::COLOR_ARRAY),
                Call::EnableClientState(gl::NORMAL_ARRAY),
                Call::DisableClientState(gl::TEXTURE_COORD_ARRAY),
            ]
        );
    }

    #[test]
    fn state_toggles_are_single_calls() {
        let context = recording_context(Profile::Desktop);
        let client = FixedPipelineClient::new(&context);
        client.ensure();
        client.save_states();
        client.open_depth_test();
        client.close_lighting();
        client.open_texture_2d();
        client.restore_states();
        client.save_attrib_arrays();
        client.restore_attrib_arrays();
        client.save_matrix();
        client.restore_matrix();
        assert_eq!(
            context.backend().calls(),
            vec![
                Call::UseProgram(0),
                Call::PushAttrib(gl::ENABLE_BIT | gl::DEPTH_BUFFER_BIT | gl::LIGHTING_BIT),
                Call::Enable(gl::DEPTH_TEST),
                Call::Disable(gl::LIGHTING),
                Call::Enable(gl::TEXTURE_2D),
                Call::PopAttrib,
                Call::PushClientAttrib(gl::CLIENT_VERTEX_ARRAY_BIT),
                Call::PopClientAttrib,
                Call::PushMatrix,
                Call::PopMatrix,
            ]
        );
    }

    #[test]
    fn host_indices_bypass_bound_element_buffer() {
        let context = recording_context(Profile::Desktop);
        let elements = ElementBuffer::new(&context);
        elements.ensure();
        let client = FixedPipelineClient::new(&context);
        context.backend().take_calls();

        client.draw_elements(Primitive::Triangles, Indices::U16(&[0, 1, 2, 2, 3, 0]));
        let calls = context.backend().calls();
        let draw = calls
            .iter()
            .position(|call| {
                *call
                    == Call::DrawElementsHost {
                        mode: gl::TRIANGLES,
                        count: 6,
                        ty: gl::UNSIGNED_SHORT,
                        len: 12,
                    }
            })
            .expect("draw");
        assert_eq!(calls[draw - 1], Call::BindBuffer(gl::ELEMENT_ARRAY_BUFFER, 0));
        assert_eq!(calls[draw + 1], Call::BindBuffer(gl::ELEMENT_ARRAY_BUFFER, elements.name()));
    }

    #[test]
    fn cpu_client_points_at_host_memory() {
        let context = recording_context(Profile::Desktop);
        let vertices = VertexBuffer::new(&context);
        vertices.ensure();
        let client = CpuClient::new(&context);
        let positions = [0.0f32; 9];
        let coords = [0.0f32; 6];
        unsafe {
            client.vertex_use_this_array(3, gl::FLOAT, 0, &positions);
            client.tex_coord_use_this_array(1, 2, gl::FLOAT, 0, &coords);
        }
        client.connect_vertex().draw_arrays(Primitive::Triangles, 0, 3);

        let calls = context.backend().calls();
        assert!(calls.contains(&Call::BindBuffer(gl::ARRAY_BUFFER, 0)));
        assert!(calls.contains(&Call::VertexPointer {
            size: 3,
            ty: gl::FLOAT,
            stride: 0,
            pointer: positions.as_ptr() as usize,
        }));
        assert!(calls.contains(&Call::ClientActiveTexture(gl::TEXTURE1)));
        assert!(calls.contains(&Call::TexCoordPointer {
            size: 2,
            ty: gl::FLOAT,
            stride: 0,
            pointer: coords.as_ptr() as usize,
        }));
        assert_eq!(
            calls.last(),
            Some(&Call::DrawArrays { mode: gl::TRIANGLES, first: 0, count: 3 })
        );
    }

    #[test]
    fn cpu_client_ensure_unbinds_buffers() {
        let context = recording_context(Profile::Desktop);
        CpuClient::new(&context).ensure();
        assert_eq!(
            context.backend().calls(),
            vec![
                Call::UseProgram(0),
                Call::BindBuffer(gl::ARRAY_BUFFER, 0),
                Call::BindBuffer(gl::ELEMENT_ARRAY_BUFFER, 0),
            ]
        );
    }
}
