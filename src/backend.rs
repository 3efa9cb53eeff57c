use serde::*;
use std::os::raw::c_void;

use crate::gl::types::*;

/// The API family a backend speaks.
///
/// Some calls behave differently between the two; most notably `glDrawBuffers` only accepts
/// `COLOR_ATTACHMENTi` in slot `i` on ES and WebGL.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum Profile {
    Desktop,
    Es,
}

/// Where the pixels for an upload come from.
#[derive(Copy, Clone, Debug)]
pub enum PixelUnpackData<'a> {
    /// No data; only storage is specified.
    None,
    /// Host memory, read during the call.
    Slice(&'a [u8]),
    /// A byte offset into the buffer bound to `PIXEL_UNPACK_BUFFER`.
    BufferOffset(usize),
}

/// Where the pixels of a download go.
#[derive(Debug)]
pub enum PixelPackData<'a> {
    /// Host memory, written during the call.
    Slice(&'a mut [u8]),
    /// A byte offset into the buffer bound to `PIXEL_PACK_BUFFER`.
    BufferOffset(usize),
}

/// The entry points shared by desktop GL 3.3+, GL ES 3 and WebGL 2.
///
/// Objects are identified by integer names, with 0 meaning "no object", exactly as in the C
/// API. All methods act on the state of the context the backend wraps.
///
/// Buffer offsets (`draw_elements`, `PixelUnpackData::BufferOffset`,
/// `PixelPackData::BufferOffset`) are relative to the buffer bound to the matching target.
/// An implementation must never let the driver read such an offset as a host address when no
/// buffer is bound there: `NativeGl` panics, while WebGL rejects the call itself.
pub trait Backend {
    fn profile(&self) -> Profile;

    fn get_integer(&self, pname: GLenum) -> GLint;
    fn get_error(&self) -> GLenum;
    fn finish(&self);
    fn pixel_store_i32(&self, pname: GLenum, param: GLint);
    fn enable(&self, cap: GLenum);
    fn disable(&self, cap: GLenum);
    fn use_program(&self, program: GLuint);

    fn gen_buffer(&self) -> GLuint;
    fn delete_buffer(&self, buffer: GLuint);
    fn bind_buffer(&self, target: GLenum, buffer: GLuint);
    fn buffer_data_size(&self, target: GLenum, size: usize, usage: GLenum);
    fn buffer_data_u8_slice(&self, target: GLenum, data: &[u8], usage: GLenum);
    fn buffer_sub_data_u8_slice(&self, target: GLenum, offset: usize, data: &[u8]);

    fn gen_texture(&self) -> GLuint;
    fn delete_texture(&self, texture: GLuint);
    fn is_texture(&self, texture: GLuint) -> bool;
    fn active_texture(&self, unit: GLenum);
    fn bind_texture(&self, target: GLenum, texture: GLuint);
    fn tex_parameter_i32(&self, target: GLenum, pname: GLenum, param: GLint);
    fn tex_parameter_f32(&self, target: GLenum, pname: GLenum, param: GLfloat);
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
    );
    fn tex_storage_2d(
        &self,
        target: GLenum,
        levels: GLsizei,
        internal_format: GLenum,
        width: GLsizei,
        height: GLsizei,
    );
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
    );
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
    );
    fn read_pixels(
        &self,
        x: GLint,
        y: GLint,
        width: GLsizei,
        height: GLsizei,
        format: GLenum,
        ty: GLenum,
        pixels: PixelPackData,
    );

    fn gen_framebuffer(&self) -> GLuint;
    fn delete_framebuffer(&self, framebuffer: GLuint);
    fn bind_framebuffer(&self, target: GLenum, framebuffer: GLuint);
    fn framebuffer_texture_2d(
        &self,
        target: GLenum,
        attachment: GLenum,
        texture_target: GLenum,
        texture: GLuint,
        level: GLint,
    );
    fn framebuffer_renderbuffer(
        &self,
        target: GLenum,
        attachment: GLenum,
        renderbuffer_target: GLenum,
        renderbuffer: GLuint,
    );
    fn check_framebuffer_status(&self, target: GLenum) -> GLenum;
    fn read_buffer(&self, mode: GLenum);
    fn draw_buffers(&self, buffers: &[GLenum]);

    fn gen_renderbuffer(&self) -> GLuint;
    fn delete_renderbuffer(&self, renderbuffer: GLuint);
    fn bind_renderbuffer(&self, target: GLenum, renderbuffer: GLuint);
    fn renderbuffer_storage(
        &self,
        target: GLenum,
        internal_format: GLenum,
        width: GLsizei,
        height: GLsizei,
    );

    fn clear_color(&self, red: GLfloat, green: GLfloat, blue: GLfloat, alpha: GLfloat);
    fn clear(&self, mask: GLbitfield);
    fn draw_arrays(&self, mode: GLenum, first: GLint, count: GLsizei);
    /// Draws using the bound element buffer; `offset` is in bytes.
    fn draw_elements(&self, mode: GLenum, count: GLsizei, ty: GLenum, offset: usize);
}

/// Desktop-only entry points: buffer read-back and mapping, whole-level texture read-back,
/// buffer textures and layered framebuffer attachment.
pub trait DesktopBackend: Backend {
    fn get_buffer_sub_data(&self, target: GLenum, offset: usize, data: &mut [u8]);
    fn get_buffer_parameter_i32(&self, target: GLenum, pname: GLenum) -> GLint;
    /// Returns null if the buffer couldn't be mapped.
    fn map_buffer(&self, target: GLenum, access: GLenum) -> *mut c_void;
    /// Returns false if the data store was corrupted while mapped.
    fn unmap_buffer(&self, target: GLenum) -> bool;
    fn get_tex_image(
        &self,
        target: GLenum,
        level: GLint,
        format: GLenum,
        ty: GLenum,
        pixels: PixelPackData,
    );
    fn get_tex_level_parameter_i32(&self, target: GLenum, level: GLint, pname: GLenum) -> GLint;
    fn tex_buffer(&self, target: GLenum, internal_format: GLenum, buffer: GLuint);
    fn framebuffer_texture(&self, target: GLenum, attachment: GLenum, texture: GLuint, level: GLint);
    fn draw_buffer(&self, mode: GLenum);
}

/// The legacy fixed-function pipeline of compatibility-profile GL.
pub trait FixedFunctionBackend: Backend {
    fn enable_client_state(&self, array: GLenum);
    fn disable_client_state(&self, array: GLenum);
    fn client_active_texture(&self, unit: GLenum);
    fn push_client_attrib(&self, mask: GLbitfield);
    fn pop_client_attrib(&self);
    fn push_attrib(&self, mask: GLbitfield);
    fn pop_attrib(&self);
    fn push_matrix(&self);
    fn pop_matrix(&self);

    /// # Safety
    ///
    /// GL keeps `pointer` and reads through it on later draw calls. If no buffer is bound to
    /// `ARRAY_BUFFER` it must point to host memory that stays valid and large enough for every
    /// such draw; otherwise it is a byte offset into the bound buffer.
    unsafe fn vertex_pointer(&self, size: GLint, ty: GLenum, stride: GLsizei, pointer: *const c_void);
    /// # Safety
    ///
    /// See [`FixedFunctionBackend::vertex_pointer`].
    unsafe fn color_pointer(&self, size: GLint, ty: GLenum, stride: GLsizei, pointer: *const c_void);
    /// # Safety
    ///
    /// See [`FixedFunctionBackend::vertex_pointer`].
    unsafe fn normal_pointer(&self, ty: GLenum, stride: GLsizei, pointer: *const c_void);
    /// # Safety
    ///
    /// See [`FixedFunctionBackend::vertex_pointer`].
    unsafe fn index_pointer(&self, ty: GLenum, stride: GLsizei, pointer: *const c_void);
    /// # Safety
    ///
    /// See [`FixedFunctionBackend::vertex_pointer`].
    unsafe fn tex_coord_pointer(
        &self,
        size: GLint,
        ty: GLenum,
        stride: GLsizei,
        pointer: *const c_void,
    );
    /// Draws with indices read from host memory during the call.
    fn draw_elements_u8_slice(&self, mode: GLenum, count: GLsizei, ty: GLenum, indices: &[u8]);

    fn light_model_fv(&self, pname: GLenum, params: &[GLfloat]);
    fn light_model_i32(&self, pname: GLenum, param: GLint);
    fn light_fv(&self, light: GLenum, pname: GLenum, params: &[GLfloat]);
    fn light_i32(&self, light: GLenum, pname: GLenum, param: GLint);
    fn light_f32(&self, light: GLenum, pname: GLenum, param: GLfloat);
    fn material_fv(&self, face: GLenum, pname: GLenum, params: &[GLfloat]);
    fn material_i32(&self, face: GLenum, pname: GLenum, param: GLint);
    fn color_material(&self, face: GLenum, mode: GLenum);
}
