//! The WebGL 2 backend. WebGL hands out JS objects rather than integer names, so each kind of
//! object gets a table mapping names to objects.

use log::*;
use std::cell::RefCell;
use std::collections::HashMap;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::*;

use crate::backend::*;
use crate::context::*;
use crate::error::*;
use crate::gl::types::*;

struct NameTable<T> {
    last: GLuint,
    objects: HashMap<GLuint, T>,
}

impl<T: PartialEq> NameTable<T> {
    fn new() -> Self {
        NameTable { last: 0, objects: HashMap::new() }
    }

    fn insert(&mut self, object: T) -> GLuint {
        self.last += 1;
        self.objects.insert(self.last, object);
        self.last
    }

    fn get(&self, name: GLuint) -> Option<&T> {
        self.objects.get(&name)
    }

    fn remove(&mut self, name: GLuint) -> Option<T> {
        self.objects.remove(&name)
    }

    fn name_of(&self, object: &T) -> GLuint {
        self.objects.iter().find(|(_, o)| *o == object).map_or(0, |(name, _)| *name)
    }
}

struct Objects {
    buffers: NameTable<WebGlBuffer>,
    textures: NameTable<WebGlTexture>,
    framebuffers: NameTable<WebGlFramebuffer>,
    renderbuffers: NameTable<WebGlRenderbuffer>,
}

/// A WebGL 2 context. Reports `Profile::Es`.
pub struct WebGl {
    inner: WebGl2RenderingContext,
    canvas: HtmlCanvasElement,
    objects: RefCell<Objects>,
}

fn creation_error(message: impl Into<String>) -> Error {
    Error::ContextCreation(message.into())
}

impl WebGl {
    /// Creates a WebGL 2 context on the canvas with id `canvas_id`.
    pub fn from_canvas(canvas_id: &str) -> Result<Self, Error> {
        let document = window()
            .and_then(|window| window.document())
            .ok_or_else(|| creation_error("no document"))?;
        let canvas = document
            .get_element_by_id(canvas_id)
            .ok_or_else(|| creation_error(format!("no element with id {}", canvas_id)))?
            .dyn_into::<HtmlCanvasElement>()
            .map_err(|_| creation_error(format!("{} is not a canvas", canvas_id)))?;
        let inner = canvas
            .get_context_with_context_options(
                "webgl2",
                WebGlContextAttributes::new().antialias(true).as_ref(),
            )
            .map_err(|err| creation_error(format!("{:?}", err)))?
            .ok_or_else(|| creation_error("WebGL 2 is not supported"))?
            .dyn_into::<WebGl2RenderingContext>()
            .map_err(|_| creation_error("unexpected context type"))?;

        Ok(WebGl {
            inner,
            canvas,
            objects: RefCell::new(Objects {
                buffers: NameTable::new(),
                textures: NameTable::new(),
                framebuffers: NameTable::new(),
                renderbuffers: NameTable::new(),
            }),
        })
    }

    pub fn canvas(&self) -> &HtmlCanvasElement {
        &self.canvas
    }

    pub fn raw(&self) -> &WebGl2RenderingContext {
        &self.inner
    }

    fn binding_name(&self, value: &JsValue) -> GLuint {
        let objects = self.objects.borrow();
        if let Some(buffer) = value.dyn_ref::<WebGlBuffer>() {
            objects.buffers.name_of(buffer)
        } else if let Some(texture) = value.dyn_ref::<WebGlTexture>() {
            objects.textures.name_of(texture)
        } else if let Some(framebuffer) = value.dyn_ref::<WebGlFramebuffer>() {
            objects.framebuffers.name_of(framebuffer)
        } else if let Some(renderbuffer) = value.dyn_ref::<WebGlRenderbuffer>() {
            objects.renderbuffers.name_of(renderbuffer)
        } else {
            0
        }
    }
}

impl GlContext<WebGl> {
    /// Creates a context on the canvas with id `canvas_id`.
    pub fn from_canvas(canvas_id: &str, options: ContextOptions) -> Result<Self, Error> {
        Ok(GlContext::new(WebGl::from_canvas(canvas_id)?, options))
    }
}

fn log_js_error(call: &str, result: Result<(), JsValue>) {
    if let Err(err) = result {
        error!("{} failed: {:?}", call, err);
    }
}

impl Backend for WebGl {
    fn profile(&self) -> Profile {
        Profile::Es
    }

    fn get_integer(&self, pname: GLenum) -> GLint {
        let value = match self.inner.get_parameter(pname) {
            Ok(value) => value,
            Err(err) => {
                error!("getParameter(0x{:04X}) failed: {:?}", pname, err);
                return 0;
            }
        };
        if let Some(number) = value.as_f64() {
            number as GLint
        } else if let Some(flag) = value.as_bool() {
            flag as GLint
        } else if value.is_null() || value.is_undefined() {
            0
        } else {
            self.binding_name(&value) as GLint
        }
    }

    fn get_error(&self) -> GLenum {
        self.inner.get_error()
    }

    fn finish(&self) {
        self.inner.finish();
    }

    fn pixel_store_i32(&self, pname: GLenum, param: GLint) {
        self.inner.pixel_storei(pname, param);
    }

    fn enable(&self, cap: GLenum) {
        self.inner.enable(cap);
    }

    fn disable(&self, cap: GLenum) {
        self.inner.disable(cap);
    }

    fn use_program(&self, program: GLuint) {
        if program != 0 {
            warn!("WebGl only supports unbinding programs; ignoring program {}", program);
            return;
        }
        self.inner.use_program(None);
    }

    fn gen_buffer(&self) -> GLuint {
        match self.inner.create_buffer() {
            Some(buffer) => self.objects.borrow_mut().buffers.insert(buffer),
            None => 0,
        }
    }

    fn delete_buffer(&self, buffer: GLuint) {
        if let Some(object) = self.objects.borrow_mut().buffers.remove(buffer) {
            self.inner.delete_buffer(Some(&object));
        }
    }

    fn bind_buffer(&self, target: GLenum, buffer: GLuint) {
        let objects = self.objects.borrow();
        self.inner.bind_buffer(target, objects.buffers.get(buffer));
    }

    fn buffer_data_size(&self, target: GLenum, size: usize, usage: GLenum) {
        self.inner.buffer_data_with_i32(target, size as i32, usage);
    }

    fn buffer_data_u8_slice(&self, target: GLenum, data: &[u8], usage: GLenum) {
        self.inner.buffer_data_with_u8_array(target, data, usage);
    }

    fn buffer_sub_data_u8_slice(&self, target: GLenum, offset: usize, data: &[u8]) {
        self.inner.buffer_sub_data_with_i32_and_u8_array(target, offset as i32, data);
    }

    fn gen_texture(&self) -> GLuint {
        match self.inner.create_texture() {
            Some(texture) => self.objects.borrow_mut().textures.insert(texture),
            None => 0,
        }
    }

    fn delete_texture(&self, texture: GLuint) {
        if let Some(object) = self.objects.borrow_mut().textures.remove(texture) {
            self.inner.delete_texture(Some(&object));
        }
    }

    fn is_texture(&self, texture: GLuint) -> bool {
        let objects = self.objects.borrow();
        self.inner.is_texture(objects.textures.get(texture))
    }

    fn active_texture(&self, unit: GLenum) {
        self.inner.active_texture(unit);
    }

    fn bind_texture(&self, target: GLenum, texture: GLuint) {
        let objects = self.objects.borrow();
        self.inner.bind_texture(target, objects.textures.get(texture));
    }

    fn tex_parameter_i32(&self, target: GLenum, pname: GLenum, param: GLint) {
        self.inner.tex_parameteri(target, pname, param);
    }

    fn tex_parameter_f32(&self, target: GLenum, pname: GLenum, param: GLfloat) {
        self.inner.tex_parameterf(target, pname, param);
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
        let result = match pixels {
            PixelUnpackData::None => self
                .inner
                .tex_image_2d_with_i32_and_i32_and_i32_and_format_and_type_and_opt_u8_array(
                    target,
                    level,
                    internal_format,
                    width,
                    height,
                    border,
                    format,
                    ty,
                    None,
                ),
            PixelUnpackData::Slice(data) => self
                .inner
                .tex_image_2d_with_i32_and_i32_and_i32_and_format_and_type_and_opt_u8_array(
                    target,
                    level,
                    internal_format,
                    width,
                    height,
                    border,
                    format,
                    ty,
                    Some(data),
                ),
            PixelUnpackData::BufferOffset(offset) => self
                .inner
                .tex_image_2d_with_i32_and_i32_and_i32_and_format_and_type_and_i32(
                    target,
                    level,
                    internal_format,
                    width,
                    height,
                    border,
                    format,
                    ty,
                    offset as i32,
                ),
        };
        log_js_error("texImage2D", result);
    }

    fn tex_storage_2d(
        &self,
        target: GLenum,
        levels: GLsizei,
        internal_format: GLenum,
        width: GLsizei,
        height: GLsizei,
    ) {
        self.inner.tex_storage_2d(target, levels, internal_format, width, height);
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
        let result = match pixels {
            PixelUnpackData::None => self
                .inner
                .tex_sub_image_2d_with_i32_and_i32_and_u32_and_type_and_opt_u8_array(
                    target, level, x_offset, y_offset, width, height, format, ty, None,
                ),
            PixelUnpackData::Slice(data) => self
                .inner
                .tex_sub_image_2d_with_i32_and_i32_and_u32_and_type_and_opt_u8_array(
                    target,
                    level,
                    x_offset,
                    y_offset,
                    width,
                    height,
                    format,
                    ty,
                    Some(data),
                ),
            PixelUnpackData::BufferOffset(offset) => self
                .inner
                .tex_sub_image_2d_with_i32_and_i32_and_u32_and_type_and_i32(
                    target,
                    level,
                    x_offset,
                    y_offset,
                    width,
                    height,
                    format,
                    ty,
                    offset as i32,
                ),
        };
        log_js_error("texSubImage2D", result);
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
        self.inner.copy_tex_sub_image_2d(target, level, x_offset, y_offset, x, y, width, height);
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
        let result = match pixels {
            PixelPackData::Slice(data) => {
                self.inner.read_pixels_with_opt_u8_array(x, y, width, height, format, ty, Some(data))
            }
            PixelPackData::BufferOffset(offset) => {
                self.inner.read_pixels_with_i32(x, y, width, height, format, ty, offset as i32)
            }
        };
        log_js_error("readPixels", result);
    }

    fn gen_framebuffer(&self) -> GLuint {
        match self.inner.create_framebuffer() {
            Some(framebuffer) => self.objects.borrow_mut().framebuffers.insert(framebuffer),
            None => 0,
        }
    }

    fn delete_framebuffer(&self, framebuffer: GLuint) {
        if let Some(object) = self.objects.borrow_mut().framebuffers.remove(framebuffer) {
            self.inner.delete_framebuffer(Some(&object));
        }
    }

    fn bind_framebuffer(&self, target: GLenum, framebuffer: GLuint) {
        let objects = self.objects.borrow();
        self.inner.bind_framebuffer(target, objects.framebuffers.get(framebuffer));
    }

    fn framebuffer_texture_2d(
        &self,
        target: GLenum,
        attachment: GLenum,
        texture_target: GLenum,
        texture: GLuint,
        level: GLint,
    ) {
        let objects = self.objects.borrow();
        self.inner.framebuffer_texture_2d(
            target,
            attachment,
            texture_target,
            objects.textures.get(texture),
            level,
        );
    }

    fn framebuffer_renderbuffer(
        &self,
        target: GLenum,
        attachment: GLenum,
        renderbuffer_target: GLenum,
        renderbuffer: GLuint,
    ) {
        let objects = self.objects.borrow();
        self.inner.framebuffer_renderbuffer(
            target,
            attachment,
            renderbuffer_target,
            objects.renderbuffers.get(renderbuffer),
        );
    }

    fn check_framebuffer_status(&self, target: GLenum) -> GLenum {
        self.inner.check_framebuffer_status(target)
    }

    fn read_buffer(&self, mode: GLenum) {
        self.inner.read_buffer(mode);
    }

    fn draw_buffers(&self, buffers: &[GLenum]) {
        let list = js_sys::Array::new();
        for &buffer in buffers {
            list.push(&JsValue::from(buffer));
        }
        self.inner.draw_buffers(&list);
    }

    fn gen_renderbuffer(&self) -> GLuint {
        match self.inner.create_renderbuffer() {
            Some(renderbuffer) => self.objects.borrow_mut().renderbuffers.insert(renderbuffer),
            None => 0,
        }
    }

    fn delete_renderbuffer(&self, renderbuffer: GLuint) {
        if let Some(object) = self.objects.borrow_mut().renderbuffers.remove(renderbuffer) {
            self.inner.delete_renderbuffer(Some(&object));
        }
    }

    fn bind_renderbuffer(&self, target: GLenum, renderbuffer: GLuint) {
        let objects = self.objects.borrow();
        self.inner.bind_renderbuffer(target, objects.renderbuffers.get(renderbuffer));
    }

    fn renderbuffer_storage(
        &self,
        target: GLenum,
        internal_format: GLenum,
        width: GLsizei,
        height: GLsizei,
    ) {
        self.inner.renderbuffer_storage(target, internal_format, width, height);
    }

    fn clear_color(&self, red: GLfloat, green: GLfloat, blue: GLfloat, alpha: GLfloat) {
        self.inner.clear_color(red, green, blue, alpha);
    }

    fn clear(&self, mask: GLbitfield) {
        self.inner.clear(mask);
    }

    fn draw_arrays(&self, mode: GLenum, first: GLint, count: GLsizei) {
        self.inner.draw_arrays(mode, first, count);
    }

    fn draw_elements(&self, mode: GLenum, count: GLsizei, ty: GLenum, offset: usize) {
        self.inner.draw_elements_with_i32(mode, count, ty, offset as i32);
    }
}
