//! The backend for native desktop GL, through bindings generated at build time.

use std::os::raw::c_void;
use std::ptr;

use crate::backend::*;
use crate::context::*;
use crate::gl;
use crate::gl::types::*;
use crate::texture::transfer_len;

/// Compatibility-profile GL loaded through a proc-address function, e.g. glutin's
/// `get_proc_address` or SDL's `gl_get_proc_address`.
///
/// Host-memory pixel transfers check the slice against the transfer size GL will touch,
/// assuming the pack/unpack row length and skip parameters are left at 0.
pub struct NativeGl {
    gl: gl::Gl,
}

impl NativeGl {
    /// Loads every entry point through `loader`.
    ///
    /// # Safety
    ///
    /// The context `loader` resolves symbols for must be current on this thread whenever the
    /// returned backend is used, and must outlive it.
    pub unsafe fn load_with<F>(loader: F) -> Self
    where
        F: FnMut(&'static str) -> *const c_void,
    {
        NativeGl { gl: gl::Gl::load_with(loader) }
    }

    /// The raw generated bindings, for calls this crate doesn't wrap.
    pub fn raw(&self) -> &gl::Gl {
        &self.gl
    }

    fn get(&self, pname: GLenum) -> GLint {
        let mut value = 0;
        unsafe { self.gl.GetIntegerv(pname, &mut value) };
        value
    }

    /// Panics unless a buffer is bound at `binding`, so a buffer offset is never read as a
    /// host address.
    fn require_buffer(&self, binding: GLenum, offset: usize) {
        assert!(
            self.get(binding) != 0,
            "offset {} used with no buffer bound to 0x{:04X}",
            offset,
            binding
        );
    }

    fn check_transfer(
        &self,
        alignment: GLenum,
        width: GLsizei,
        height: GLsizei,
        format: GLenum,
        ty: GLenum,
        len: usize,
    ) {
        let needed = transfer_len(cgmath::vec2(width, height), format, ty, self.get(alignment));
        match needed {
            Some(needed) => assert!(len >= needed, "{} bytes needed, {} provided", needed, len),
            None => panic!(
                "unsupported pixel format 0x{:04X} / type 0x{:04X} for a host memory transfer",
                format, ty
            ),
        }
    }

    fn unpack_pointer(
        &self,
        width: GLsizei,
        height: GLsizei,
        format: GLenum,
        ty: GLenum,
        pixels: &PixelUnpackData,
    ) -> *const c_void {
        match *pixels {
            PixelUnpackData::None => ptr::null(),
            PixelUnpackData::Slice(data) => {
                self.check_transfer(gl::UNPACK_ALIGNMENT, width, height, format, ty, data.len());
                data.as_ptr() as *const c_void
            }
            PixelUnpackData::BufferOffset(offset) => {
                self.require_buffer(gl::PIXEL_UNPACK_BUFFER_BINDING, offset);
                offset as *const c_void
            }
        }
    }

    fn pack_pointer(
        &self,
        width: GLsizei,
        height: GLsizei,
        format: GLenum,
        ty: GLenum,
        pixels: PixelPackData,
    ) -> *mut c_void {
        match pixels {
            PixelPackData::Slice(data) => {
                self.check_transfer(gl::PACK_ALIGNMENT, width, height, format, ty, data.len());
                data.as_mut_ptr() as *mut c_void
            }
            PixelPackData::BufferOffset(offset) => {
                self.require_buffer(gl::PIXEL_PACK_BUFFER_BINDING, offset);
                offset as *mut c_void
            }
        }
    }
}

/// Floats GL reads for a vector light, light model or material parameter.
fn vector_param_len(pname: GLenum) -> usize {
    match pname {
        gl::SPOT_DIRECTION | gl::COLOR_INDEXES => 3,
        gl::AMBIENT
        | gl::DIFFUSE
        | gl::SPECULAR
        | gl::EMISSION
        | gl::AMBIENT_AND_DIFFUSE
        | gl::POSITION
        | gl::LIGHT_MODEL_AMBIENT => 4,
        _ => 1,
    }
}

fn check_params(pname: GLenum, params: &[GLfloat]) {
    let needed = vector_param_len(pname);
    assert!(
        params.len() >= needed,
        "parameter 0x{:04X} takes {} values, {} provided",
        pname,
        needed,
        params.len()
    );
}

impl GlContext<NativeGl> {
    /// Loads a `NativeGl` through `loader` and wraps it.
    ///
    /// # Safety
    ///
    /// See [`NativeGl::load_with`].
    pub unsafe fn load_with<F>(loader: F, options: ContextOptions) -> Self
    where
        F: FnMut(&'static str) -> *const c_void,
    {
        GlContext::new(NativeGl::load_with(loader), options)
    }
}

impl Backend for NativeGl {
    fn profile(&self) -> Profile {
        Profile::Desktop
    }

    fn get_integer(&self, pname: GLenum) -> GLint {
        self.get(pname)
    }

    fn get_error(&self) -> GLenum {
        unsafe { self.gl.GetError() }
    }

    fn finish(&self) {
        unsafe { self.gl.Finish() }
    }

    fn pixel_store_i32(&self, pname: GLenum, param: GLint) {
        unsafe { self.gl.PixelStorei(pname, param) }
    }

    fn enable(&self, cap: GLenum) {
        unsafe { self.gl.Enable(cap) }
    }

    fn disable(&self, cap: GLenum) {
        unsafe { self.gl.Disable(cap) }
    }

    fn use_program(&self, program: GLuint) {
        unsafe { self.gl.UseProgram(program) }
    }

    fn gen_buffer(&self) -> GLuint {
        let mut name = 0;
        unsafe { self.gl.GenBuffers(1, &mut name) };
        name
    }

    fn delete_buffer(&self, buffer: GLuint) {
        unsafe { self.gl.DeleteBuffers(1, &buffer) }
    }

    fn bind_buffer(&self, target: GLenum, buffer: GLuint) {
        unsafe { self.gl.BindBuffer(target, buffer) }
    }

    fn buffer_data_size(&self, target: GLenum, size: usize, usage: GLenum) {
        unsafe { self.gl.BufferData(target, size as GLsizeiptr, ptr::null(), usage) }
    }

    fn buffer_data_u8_slice(&self, target: GLenum, data: &[u8], usage: GLenum) {
        unsafe {
            self.gl.BufferData(target, data.len() as GLsizeiptr, data.as_ptr() as *const c_void, usage)
        }
    }

    fn buffer_sub_data_u8_slice(&self, target: GLenum, offset: usize, data: &[u8]) {
        unsafe {
            self.gl.BufferSubData(
                target,
                offset as GLintptr,
                data.len() as GLsizeiptr,
                data.as_ptr() as *const c_void,
            )
        }
    }

    fn gen_texture(&self) -> GLuint {
        let mut name = 0;
        unsafe { self.gl.GenTextures(1, &mut name) };
        name
    }

    fn delete_texture(&self, texture: GLuint) {
        unsafe { self.gl.DeleteTextures(1, &texture) }
    }

    fn is_texture(&self, texture: GLuint) -> bool {
        unsafe { self.gl.IsTexture(texture) == gl::TRUE }
    }

    fn active_texture(&self, unit: GLenum) {
        unsafe { self.gl.ActiveTexture(unit) }
    }

    fn bind_texture(&self, target: GLenum, texture: GLuint) {
        unsafe { self.gl.BindTexture(target, texture) }
    }

    fn tex_parameter_i32(&self, target: GLenum, pname: GLenum, param: GLint) {
        unsafe { self.gl.TexParameteri(target, pname, param) }
    }

    fn tex_parameter_f32(&self, target: GLenum, pname: GLenum, param: GLfloat) {
        unsafe { self.gl.TexParameterf(target, pname, param) }
    }

    fn tex_image_2d(
        &self,
        target: GLenum,
        level: GLint,
        internal_format: GLint,
        width: GLsizei,
        height: GLsizei,
        border: GLint,
        format: GLenum,
        ty: GLenum,
        pixels: PixelUnpackData,
    ) {
        let pointer = self.unpack_pointer(width, height, format, ty, &pixels);
        unsafe {
            self.gl.TexImage2D(target, level, internal_format, width, height, border, format, ty, pointer)
        }
    }

    fn tex_storage_2d(
        &self,
        target: GLenum,
        levels: GLsizei,
        internal_format: GLenum,
        width: GLsizei,
        height: GLsizei,
    ) {
        unsafe { self.gl.TexStorage2D(target, levels, internal_format, width, height) }
    }

    fn tex_sub_image_2d(
        &self,
        target: GLenum,
        level: GLint,
        x_offset: GLint,
        y_offset: GLint,
        width: GLsizei,
        height: GLsizei,
        format: GLenum,
        ty: GLenum,
        pixels: PixelUnpackData,
    ) {
        let pointer = self.unpack_pointer(width, height, format, ty, &pixels);
        unsafe {
            self.gl.TexSubImage2D(target, level, x_offset, y_offset, width, height, format, ty, pointer)
        }
    }

    fn copy_tex_sub_image_2d(
        &self,
        target: GLenum,
        level: GLint,
        x_offset: GLint,
        y_offset: GLint,
        x: GLint,
        y: GLint,
        width: GLsizei,
        height: GLsizei,
    ) {
        unsafe { self.gl.CopyTexSubImage2D(target, level, x_offset, y_offset, x, y, width, height) }
    }

    fn read_pixels(
        &self,
        x: GLint,
        y: GLint,
        width: GLsizei,
        height: GLsizei,
        format: GLenum,
        ty: GLenum,
        pixels: PixelPackData,
    ) {
        let pointer = self.pack_pointer(width, height, format, ty, pixels);
        unsafe { self.gl.ReadPixels(x, y, width, height, format, ty, pointer) }
    }

    fn gen_framebuffer(&self) -> GLuint {
        let mut name = 0;
        unsafe { self.gl.GenFramebuffers(1, &mut name) };
        name
    }

    fn delete_framebuffer(&self, framebuffer: GLuint) {
        unsafe { self.gl.DeleteFramebuffers(1, &framebuffer) }
    }

    fn bind_framebuffer(&self, target: GLenum, framebuffer: GLuint) {
        unsafe { self.gl.BindFramebuffer(target, framebuffer) }
    }

    fn framebuffer_texture_2d(
        &self,
        target: GLenum,
        attachment: GLenum,
        texture_target: GLenum,
        texture: GLuint,
        level: GLint,
    ) {
        unsafe { self.gl.FramebufferTexture2D(target, attachment, texture_target, texture, level) }
    }

    fn framebuffer_renderbuffer(
        &self,
        target: GLenum,
        attachment: GLenum,
        renderbuffer_target: GLenum,
        renderbuffer: GLuint,
    ) {
        unsafe {
            self.gl.FramebufferRenderbuffer(target, attachment, renderbuffer_target, renderbuffer)
        }
    }

    fn check_framebuffer_status(&self, target: GLenum) -> GLenum {
        unsafe { self.gl.CheckFramebufferStatus(target) }
    }

    fn read_buffer(&self, mode: GLenum) {
        unsafe { self.gl.ReadBuffer(mode) }
    }

    fn draw_buffers(&self, buffers: &[GLenum]) {
        unsafe { self.gl.DrawBuffers(buffers.len() as GLsizei, buffers.as_ptr()) }
    }

    fn gen_renderbuffer(&self) -> GLuint {
        let mut name = 0;
        unsafe { self.gl.GenRenderbuffers(1, &mut name) };
        name
    }

    fn delete_renderbuffer(&self, renderbuffer: GLuint) {
        unsafe { self.gl.DeleteRenderbuffers(1, &renderbuffer) }
    }

    fn bind_renderbuffer(&self, target: GLenum, renderbuffer: GLuint) {
        unsafe { self.gl.BindRenderbuffer(target, renderbuffer) }
    }

    fn renderbuffer_storage(
        &self,
        target: GLenum,
        internal_format: GLenum,
        width: GLsizei,
        height: GLsizei,
    ) {
        unsafe { self.gl.RenderbufferStorage(target, internal_format, width, height) }
    }

    fn clear_color(&self, red: GLfloat, green: GLfloat, blue: GLfloat, alpha: GLfloat) {
        unsafe { self.gl.ClearColor(red, green, blue, alpha) }
    }

    fn clear(&self, mask: GLbitfield) {
        unsafe { self.gl.Clear(mask) }
    }

    fn draw_arrays(&self, mode: GLenum, first: GLint, count: GLsizei) {
        unsafe { self.gl.DrawArrays(mode, first, count) }
    }

    fn draw_elements(&self, mode: GLenum, count: GLsizei, ty: GLenum, offset: usize) {
        self.require_buffer(gl::ELEMENT_ARRAY_BUFFER_BINDING, offset);
        unsafe { self.gl.DrawElements(mode, count, ty, offset as *const c_void) }
    }
}

impl DesktopBackend for NativeGl {
    fn get_buffer_sub_data(&self, target: GLenum, offset: usize, data: &mut [u8]) {
        unsafe {
            self.gl.GetBufferSubData(
                target,
                offset as GLintptr,
                data.len() as GLsizeiptr,
                data.as_mut_ptr() as *mut c_void,
            )
        }
    }

    fn get_buffer_parameter_i32(&self, target: GLenum, pname: GLenum) -> GLint {
        let mut value = 0;
        unsafe { self.gl.GetBufferParameteriv(target, pname, &mut value) };
        value
    }

    fn map_buffer(&self, target: GLenum, access: GLenum) -> *mut c_void {
        unsafe { self.gl.MapBuffer(target, access) }
    }

    fn unmap_buffer(&self, target: GLenum) -> bool {
        unsafe { self.gl.UnmapBuffer(target) == gl::TRUE }
    }

    fn get_tex_image(
        &self,
        target: GLenum,
        level: GLint,
        format: GLenum,
        ty: GLenum,
        pixels: PixelPackData,
    ) {
        let width = self.get_tex_level_parameter_i32(target, level, gl::TEXTURE_WIDTH);
        let height = self.get_tex_level_parameter_i32(target, level, gl::TEXTURE_HEIGHT);
        let pointer = self.pack_pointer(width, height, format, ty, pixels);
        unsafe { self.gl.GetTexImage(target, level, format, ty, pointer) }
    }

    fn get_tex_level_parameter_i32(&self, target: GLenum, level: GLint, pname: GLenum) -> GLint {
        let mut value = 0;
        unsafe { self.gl.GetTexLevelParameteriv(target, level, pname, &mut value) };
        value
    }

    fn tex_buffer(&self, target: GLenum, internal_format: GLenum, buffer: GLuint) {
        unsafe { self.gl.TexBuffer(target, internal_format, buffer) }
    }

    fn framebuffer_texture(&self, target: GLenum, attachment: GLenum, texture: GLuint, level: GLint) {
        unsafe { self.gl.FramebufferTexture(target, attachment, texture, level) }
    }

    fn draw_buffer(&self, mode: GLenum) {
        unsafe { self.gl.DrawBuffer(mode) }
    }
}

impl FixedFunctionBackend for NativeGl {
    fn enable_client_state(&self, array: GLenum) {
        unsafe { self.gl.EnableClientState(array) }
    }

    fn disable_client_state(&self, array: GLenum) {
        unsafe { self.gl.DisableClientState(array) }
    }

    fn client_active_texture(&self, unit: GLenum) {
        unsafe { self.gl.ClientActiveTexture(unit) }
    }

    fn push_client_attrib(&self, mask: GLbitfield) {
        unsafe { self.gl.PushClientAttrib(mask) }
    }

    fn pop_client_attrib(&self) {
        unsafe { self.gl.PopClientAttrib() }
    }

    fn push_attrib(&self, mask: GLbitfield) {
        unsafe { self.gl.PushAttrib(mask) }
    }

    fn pop_attrib(&self) {
        unsafe { self.gl.PopAttrib() }
    }

    fn push_matrix(&self) {
        unsafe { self.gl.PushMatrix() }
    }

    fn pop_matrix(&self) {
        unsafe { self.gl.PopMatrix() }
    }

    unsafe fn vertex_pointer(&self, size: GLint, ty: GLenum, stride: GLsizei, pointer: *const c_void) {
        self.gl.VertexPointer(size, ty, stride, pointer)
    }

    unsafe fn color_pointer(&self, size: GLint, ty: GLenum, stride: GLsizei, pointer: *const c_void) {
        self.gl.ColorPointer(size, ty, stride, pointer)
    }

    unsafe fn normal_pointer(&self, ty: GLenum, stride: GLsizei, pointer: *const c_void) {
        self.gl.NormalPointer(ty, stride, pointer)
    }

    unsafe fn index_pointer(&self, ty: GLenum, stride: GLsizei, pointer: *const c_void) {
        self.gl.IndexPointer(ty, stride, pointer)
    }

    unsafe fn tex_coord_pointer(
        &self,
        size: GLint,
        ty: GLenum,
        stride: GLsizei,
        pointer: *const c_void,
    ) {
        self.gl.TexCoordPointer(size, ty, stride, pointer)
    }

    fn draw_elements_u8_slice(&self, mode: GLenum, count: GLsizei, ty: GLenum, indices: &[u8]) {
        let index_size = match ty {
            gl::UNSIGNED_BYTE => 1,
            gl::UNSIGNED_SHORT => 2,
            _ => 4,
        };
        assert!(
            indices.len() >= count.max(0) as usize * index_size,
            "{} indices don't fit in {} bytes",
            count,
            indices.len()
        );
        unsafe { self.gl.DrawElements(mode, count, ty, indices.as_ptr() as *const c_void) }
    }

    fn light_model_fv(&self, pname: GLenum, params: &[GLfloat]) {
        check_params(pname, params);
        unsafe { self.gl.LightModelfv(pname, params.as_ptr()) }
    }

    fn light_model_i32(&self, pname: GLenum, param: GLint) {
        unsafe { self.gl.LightModeli(pname, param) }
    }

    fn light_fv(&self, light: GLenum, pname: GLenum, params: &[GLfloat]) {
        check_params(pname, params);
        unsafe { self.gl.Lightfv(light, pname, params.as_ptr()) }
    }

    fn light_i32(&self, light: GLenum, pname: GLenum, param: GLint) {
        unsafe { self.gl.Lighti(light, pname, param) }
    }

    fn light_f32(&self, light: GLenum, pname: GLenum, param: GLfloat) {
        unsafe { self.gl.Lightf(light, pname, param) }
    }

    fn material_fv(&self, face: GLenum, pname: GLenum, params: &[GLfloat]) {
        check_params(pname, params);
        unsafe { self.gl.Materialfv(face, pname, params.as_ptr()) }
    }

    fn material_i32(&self, face: GLenum, pname: GLenum, param: GLint) {
        unsafe { self.gl.Materiali(face, pname, param) }
    }

    fn color_material(&self, face: GLenum, mode: GLenum) {
        unsafe { self.gl.ColorMaterial(face, mode) }
    }
}
