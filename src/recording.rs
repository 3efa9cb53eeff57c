//! A headless backend that simulates just enough GL state to drive the handles, and records
//! every call it receives.

use std::cell::RefCell;
use std::collections::HashMap;
use std::os::raw::c_void;
use std::ptr;

use crate::backend::*;
use crate::gl;
use crate::gl::types::*;

/// How a pixel transfer was addressed.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum PixelTransfer {
    None,
    /// Host memory of the given length.
    Host(usize),
    BufferOffset(usize),
}

impl<'a> From<&PixelUnpackData<'a>> for PixelTransfer {
    fn from(data: &PixelUnpackData<'a>) -> Self {
        match data {
            PixelUnpackData::None => PixelTransfer::None,
            PixelUnpackData::Slice(data) => PixelTransfer::Host(data.len()),
            PixelUnpackData::BufferOffset(offset) => PixelTransfer::BufferOffset(*offset),
        }
    }
}

impl<'a> From<&PixelPackData<'a>> for PixelTransfer {
    fn from(data: &PixelPackData<'a>) -> Self {
        match data {
            PixelPackData::Slice(data) => PixelTransfer::Host(data.len()),
            PixelPackData::BufferOffset(offset) => PixelTransfer::BufferOffset(*offset),
        }
    }
}

/// One call received by a `RecordingGl`.
#[derive(Clone, Debug, PartialEq)]
pub enum Call {
    GetInteger(GLenum),
    GetError,
    Finish,
    PixelStore(GLenum, GLint),
    Enable(GLenum),
    Disable(GLenum),
    UseProgram(GLuint),

    GenBuffer(GLuint),
    DeleteBuffer(GLuint),
    BindBuffer(GLenum, GLuint),
    BufferData { target: GLenum, size: usize, usage: GLenum },
    BufferSubData { target: GLenum, offset: usize, size: usize },
    GetBufferSubData { target: GLenum, offset: usize, size: usize },
    GetBufferParameter(GLenum, GLenum),
    MapBuffer(GLenum, GLenum),
    UnmapBuffer(GLenum),

    GenTexture(GLuint),
    DeleteTexture(GLuint),
    IsTexture(GLuint),
    ActiveTexture(GLenum),
    BindTexture(GLenum, GLuint),
    TexParameterI(GLenum, GLenum, GLint),
    TexParameterF(GLenum, GLenum, GLfloat),
    TexImage2d {
        target: GLenum,
        level: GLint,
        internal_format: GLint,
        width: GLsizei,
        height: GLsizei,
        border: GLint,
        format: GLenum,
        ty: GLenum,
        pixels: PixelTransfer,
    },
    TexStorage2d {
        target: GLenum,
        levels: GLsizei,
        internal_format: GLenum,
        width: GLsizei,
        height: GLsizei,
    },
    TexSubImage2d {
        target: GLenum,
        level: GLint,
        x_offset: GLint,
        y_offset: GLint,
        width: GLsizei,
        height: GLsizei,
        format: GLenum,
        ty: GLenum,
        pixels: PixelTransfer,
    },
    CopyTexSubImage2d {
        target: GLenum,
        level: GLint,
        x_offset: GLint,
        y_offset: GLint,
        x: GLint,
        y: GLint,
        width: GLsizei,
        height: GLsizei,
    },
    ReadPixels {
        x: GLint,
        y: GLint,
        width: GLsizei,
        height: GLsizei,
        format: GLenum,
        ty: GLenum,
        pixels: PixelTransfer,
    },
    GetTexImage { target: GLenum, level: GLint, format: GLenum, ty: GLenum, pixels: PixelTransfer },
    GetTexLevelParameter(GLenum, GLint, GLenum),
    TexBuffer { target: GLenum, internal_format: GLenum, buffer: GLuint },

    GenFramebuffer(GLuint),
    DeleteFramebuffer(GLuint),
    BindFramebuffer(GLenum, GLuint),
    FramebufferTexture2d {
        target: GLenum,
        attachment: GLenum,
        texture_target: GLenum,
        texture: GLuint,
        level: GLint,
    },
    FramebufferTexture { target: GLenum, attachment: GLenum, texture: GLuint, level: GLint },
    FramebufferRenderbuffer { target: GLenum, attachment: GLenum, renderbuffer: GLuint },
    CheckFramebufferStatus(GLenum),
    ReadBuffer(GLenum),
    DrawBuffer(GLenum),
    DrawBuffers(Vec<GLenum>),

    GenRenderbuffer(GLuint),
    DeleteRenderbuffer(GLuint),
    BindRenderbuffer(GLenum, GLuint),
    RenderbufferStorage { target: GLenum, internal_format: GLenum, width: GLsizei, height: GLsizei },

    ClearColor([GLfloat; 4]),
    Clear(GLbitfield),
    DrawArrays { mode: GLenum, first: GLint, count: GLsizei },
    DrawElements { mode: GLenum, count: GLsizei, ty: GLenum, offset: usize },
    DrawElementsHost { mode: GLenum, count: GLsizei, ty: GLenum, len: usize },

    EnableClientState(GLenum),
    DisableClientState(GLenum),
    ClientActiveTexture(GLenum),
    PushClientAttrib(GLbitfield),
    PopClientAttrib,
    PushAttrib(GLbitfield),
    PopAttrib,
    PushMatrix,
    PopMatrix,
    VertexPointer { size: GLint, ty: GLenum, stride: GLsizei, pointer: usize },
    ColorPointer { size: GLint, ty: GLenum, stride: GLsizei, pointer: usize },
    NormalPointer { ty: GLenum, stride: GLsizei, pointer: usize },
    IndexPointer { ty: GLenum, stride: GLsizei, pointer: usize },
    TexCoordPointer { size: GLint, ty: GLenum, stride: GLsizei, pointer: usize },

    LightModelFv(GLenum, Vec<GLfloat>),
    LightModelI(GLenum, GLint),
    LightFv(GLenum, GLenum, Vec<GLfloat>),
    LightI(GLenum, GLenum, GLint),
    LightF(GLenum, GLenum, GLfloat),
    MaterialFv(GLenum, GLenum, Vec<GLfloat>),
    MaterialI(GLenum, GLenum, GLint),
    ColorMaterial(GLenum, GLenum),
}

#[derive(Default)]
struct State {
    calls: Vec<Call>,
    last_name: GLuint,
    errors: Vec<GLenum>,
    /// Binding pname -> bound name, for buffers, framebuffers and renderbuffers.
    bindings: HashMap<GLenum, GLuint>,
    active_unit: GLuint,
    /// (unit, texture target) -> bound texture.
    textures: HashMap<(GLuint, GLenum), GLuint>,
    live_textures: Vec<GLuint>,
    /// (texture, level) -> size.
    levels: HashMap<(GLuint, GLint), (GLsizei, GLsizei)>,
    buffers: HashMap<GLuint, Vec<u8>>,
    mapped: Vec<GLuint>,
    /// framebuffer -> attachment point -> attached object.
    attachments: HashMap<GLuint, HashMap<GLenum, GLuint>>,
}

/// A `Backend` with no GPU behind it.
///
/// Binding points, object names, texture units, buffer contents, buffer mapping, texture level
/// sizes and framebuffer attachments are simulated; everything else is only recorded. The
/// recorded calls can be inspected with [`RecordingGl::calls`].
pub struct RecordingGl {
    profile: Profile,
    state: RefCell<State>,
}

impl Default for RecordingGl {
    fn default() -> Self {
        RecordingGl::new(Profile::Desktop)
    }
}

fn buffer_binding(target: GLenum) -> GLenum {
    match target {
        gl::ARRAY_BUFFER => gl::ARRAY_BUFFER_BINDING,
        gl::ELEMENT_ARRAY_BUFFER => gl::ELEMENT_ARRAY_BUFFER_BINDING,
        gl::PIXEL_PACK_BUFFER => gl::PIXEL_PACK_BUFFER_BINDING,
        gl::PIXEL_UNPACK_BUFFER => gl::PIXEL_UNPACK_BUFFER_BINDING,
        gl::TEXTURE_BUFFER => gl::TEXTURE_BUFFER_BINDING,
        other => panic!("RecordingGl: unsupported buffer target 0x{:04X}", other),
    }
}

fn texture_target_for_binding(pname: GLenum) -> Option<GLenum> {
    match pname {
        gl::TEXTURE_BINDING_2D => Some(gl::TEXTURE_2D),
        gl::TEXTURE_BINDING_RECTANGLE => Some(gl::TEXTURE_RECTANGLE),
        gl::TEXTURE_BINDING_BUFFER => Some(gl::TEXTURE_BUFFER),
        _ => None,
    }
}

impl RecordingGl {
    pub fn new(profile: Profile) -> Self {
        RecordingGl { profile, state: RefCell::new(State::default()) }
    }

    /// All calls received so far.
    pub fn calls(&self) -> Vec<Call> {
        self.state.borrow().calls.clone()
    }

    /// Returns and forgets all calls received so far.
    pub fn take_calls(&self) -> Vec<Call> {
        std::mem::take(&mut self.state.borrow_mut().calls)
    }

    /// Counts the recorded calls matching `predicate`.
    pub fn count(&self, predicate: impl Fn(&Call) -> bool) -> usize {
        self.state.borrow().calls.iter().filter(|call| predicate(call)).count()
    }

    /// Queues an error for `get_error` to report.
    pub fn push_error(&self, code: GLenum) {
        self.state.borrow_mut().errors.push(code);
    }

    /// The simulated contents of buffer `name`, if it has storage.
    pub fn buffer_contents(&self, name: GLuint) -> Option<Vec<u8>> {
        self.state.borrow().buffers.get(&name).cloned()
    }

    /// The object attached to `attachment` of framebuffer `framebuffer`, or 0.
    pub fn attached(&self, framebuffer: GLuint, attachment: GLenum) -> GLuint {
        let state = self.state.borrow();
        state
            .attachments
            .get(&framebuffer)
            .and_then(|points| points.get(&attachment))
            .copied()
            .unwrap_or(0)
    }

    fn record(&self, call: Call) {
        self.state.borrow_mut().calls.push(call);
    }

    fn gen_name(&self, call: fn(GLuint) -> Call) -> GLuint {
        let mut state = self.state.borrow_mut();
        state.last_name += 1;
        let name = state.last_name;
        state.calls.push(call(name));
        name
    }

    fn bound_buffer(&self, target: GLenum) -> GLuint {
        let state = self.state.borrow();
        state.bindings.get(&buffer_binding(target)).copied().unwrap_or(0)
    }

    fn bound_texture(&self, target: GLenum) -> GLuint {
        let state = self.state.borrow();
        state.textures.get(&(state.active_unit, target)).copied().unwrap_or(0)
    }

    fn set_error(&self, code: GLenum) {
        self.state.borrow_mut().errors.push(code);
    }

    fn framebuffer_for(&self, target: GLenum) -> GLuint {
        let pname = match target {
            gl::READ_FRAMEBUFFER => gl::READ_FRAMEBUFFER_BINDING,
            _ => gl::DRAW_FRAMEBUFFER_BINDING,
        };
        self.state.borrow().bindings.get(&pname).copied().unwrap_or(0)
    }

    fn attach(&self, target: GLenum, attachment: GLenum, object: GLuint) {
        let framebuffer = self.framebuffer_for(target);
        if framebuffer == 0 {
            self.set_error(gl::INVALID_OPERATION);
            return;
        }
        let mut state = self.state.borrow_mut();
        let points = state.attachments.entry(framebuffer).or_default();
        if object == 0 {
            points.remove(&attachment);
        } else {
            points.insert(attachment, object);
        }
    }
}

/// A context over a fresh `RecordingGl`, with the setup calls already cleared.
#[cfg(test)]
pub(crate) fn recording_context(profile: Profile) -> crate::context::GlContext<RecordingGl> {
    let _ = env_logger::builder().is_test(true).try_init();
    let context = crate::context::GlContext::new(
        RecordingGl::new(profile),
        crate::context::ContextOptions::default(),
    );
    context.backend().take_calls();
    context
}

impl Backend for RecordingGl {
    fn profile(&self) -> Profile {
        self.profile
    }

    fn get_integer(&self, pname: GLenum) -> GLint {
        self.record(Call::GetInteger(pname));
        let state = self.state.borrow();
        let value = if let Some(target) = texture_target_for_binding(pname) {
            state.textures.get(&(state.active_unit, target)).copied().unwrap_or(0)
        } else {
            match pname {
                gl::ACTIVE_TEXTURE => gl::TEXTURE0 + state.active_unit,
                gl::MAX_TEXTURE_BUFFER_SIZE => 65536,
                _ => state.bindings.get(&pname).copied().unwrap_or(0),
            }
        };
        value as GLint
    }

    fn get_error(&self) -> GLenum {
        self.record(Call::GetError);
        let mut state = self.state.borrow_mut();
        if state.errors.is_empty() {
            gl::NO_ERROR
        } else {
            state.errors.remove(0)
        }
    }

    fn finish(&self) {
        self.record(Call::Finish);
    }

    fn pixel_store_i32(&self, pname: GLenum, param: GLint) {
        self.record(Call::PixelStore(pname, param));
    }

    fn enable(&self, cap: GLenum) {
        self.record(Call::Enable(cap));
    }

    fn disable(&self, cap: GLenum) {
        self.record(Call::Disable(cap));
    }

    fn use_program(&self, program: GLuint) {
        self.record(Call::UseProgram(program));
    }

    fn gen_buffer(&self) -> GLuint {
        self.gen_name(Call::GenBuffer)
    }

    fn delete_buffer(&self, buffer: GLuint) {
        self.record(Call::DeleteBuffer(buffer));
        let mut state = self.state.borrow_mut();
        // Mapped storage stays alive until it is unmapped.
        if state.mapped.contains(&buffer) {
            state.errors.push(gl::INVALID_OPERATION);
            return;
        }
        state.buffers.remove(&buffer);
        for bound in state.bindings.values_mut() {
            if *bound == buffer {
                *bound = 0;
            }
        }
    }

    fn bind_buffer(&self, target: GLenum, buffer: GLuint) {
        self.record(Call::BindBuffer(target, buffer));
        self.state.borrow_mut().bindings.insert(buffer_binding(target), buffer);
    }

    fn buffer_data_size(&self, target: GLenum, size: usize, usage: GLenum) {
        self.record(Call::BufferData { target, size, usage });
        let buffer = self.bound_buffer(target);
        if buffer == 0 || self.state.borrow().mapped.contains(&buffer) {
            self.set_error(gl::INVALID_OPERATION);
            return;
        }
        self.state.borrow_mut().buffers.insert(buffer, vec![0; size]);
    }

    fn buffer_data_u8_slice(&self, target: GLenum, data: &[u8], usage: GLenum) {
        self.record(Call::BufferData { target, size: data.len(), usage });
        let buffer = self.bound_buffer(target);
        if buffer == 0 || self.state.borrow().mapped.contains(&buffer) {
            self.set_error(gl::INVALID_OPERATION);
            return;
        }
        self.state.borrow_mut().buffers.insert(buffer, data.to_vec());
    }

    fn buffer_sub_data_u8_slice(&self, target: GLenum, offset: usize, data: &[u8]) {
        self.record(Call::BufferSubData { target, offset, size: data.len() });
        let buffer = self.bound_buffer(target);
        let mut state = self.state.borrow_mut();
        let State { buffers, errors, mapped, .. } = &mut *state;
        if mapped.contains(&buffer) {
            errors.push(gl::INVALID_OPERATION);
            return;
        }
        match buffers.get_mut(&buffer) {
            Some(store) if offset + data.len() <= store.len() => {
                store[offset..offset + data.len()].copy_from_slice(data);
            }
            Some(_) => errors.push(gl::INVALID_VALUE),
            None => errors.push(gl::INVALID_OPERATION),
        }
    }

    fn gen_texture(&self) -> GLuint {
        let name = self.gen_name(Call::GenTexture);
        self.state.borrow_mut().live_textures.push(name);
        name
    }

    fn delete_texture(&self, texture: GLuint) {
        self.record(Call::DeleteTexture(texture));
        let mut state = self.state.borrow_mut();
        state.live_textures.retain(|&name| name != texture);
        for bound in state.textures.values_mut() {
            if *bound == texture {
                *bound = 0;
            }
        }
    }

    fn is_texture(&self, texture: GLuint) -> bool {
        self.record(Call::IsTexture(texture));
        texture != 0 && self.state.borrow().live_textures.contains(&texture)
    }

    fn active_texture(&self, unit: GLenum) {
        self.record(Call::ActiveTexture(unit));
        let mut state = self.state.borrow_mut();
        match unit.checked_sub(gl::TEXTURE0) {
            Some(index) => state.active_unit = index,
            None => state.errors.push(gl::INVALID_ENUM),
        }
    }

    fn bind_texture(&self, target: GLenum, texture: GLuint) {
        self.record(Call::BindTexture(target, texture));
        let mut state = self.state.borrow_mut();
        let unit = state.active_unit;
        state.textures.insert((unit, target), texture);
    }

    fn tex_parameter_i32(&self, target: GLenum, pname: GLenum, param: GLint) {
        self.record(Call::TexParameterI(target, pname, param));
    }

    fn tex_parameter_f32(&self, target: GLenum, pname: GLenum, param: GLfloat) {
        self.record(Call::TexParameterF(target, pname, param));
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
        self.record(Call::TexImage2d {
            target,
            level,
            internal_format,
            width,
            height,
            border,
            format,
            ty,
            pixels: (&pixels).into(),
        });
        let texture = self.bound_texture(target);
        self.state.borrow_mut().levels.insert((texture, level), (width, height));
    }

    fn tex_storage_2d(
        &self,
        target: GLenum,
        levels: GLsizei,
        internal_format: GLenum,
        width: GLsizei,
        height: GLsizei,
    ) {
        self.record(Call::TexStorage2d { target, levels, internal_format, width, height });
        let texture = self.bound_texture(target);
        let mut state = self.state.borrow_mut();
        for level in 0..levels {
            let size = ((width >> level).max(1), (height >> level).max(1));
            state.levels.insert((texture, level), size);
        }
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
        self.record(Call::TexSubImage2d {
            target,
            level,
            x_offset,
            y_offset,
            width,
            height,
            format,
            ty,
            pixels: (&pixels).into(),
        });
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
        self.record(Call::CopyTexSubImage2d {
            target,
            level,
            x_offset,
            y_offset,
            x,
            y,
            width,
            height,
        });
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
        self.record(Call::ReadPixels { x, y, width, height, format, ty, pixels: (&pixels).into() });
    }

    fn gen_framebuffer(&self) -> GLuint {
        self.gen_name(Call::GenFramebuffer)
    }

    fn delete_framebuffer(&self, framebuffer: GLuint) {
        self.record(Call::DeleteFramebuffer(framebuffer));
        let mut state = self.state.borrow_mut();
        state.attachments.remove(&framebuffer);
        for pname in &[gl::READ_FRAMEBUFFER_BINDING, gl::DRAW_FRAMEBUFFER_BINDING] {
            if state.bindings.get(pname) == Some(&framebuffer) {
                state.bindings.insert(*pname, 0);
            }
        }
    }

    fn bind_framebuffer(&self, target: GLenum, framebuffer: GLuint) {
        self.record(Call::BindFramebuffer(target, framebuffer));
        let mut state = self.state.borrow_mut();
        if target != gl::DRAW_FRAMEBUFFER {
            state.bindings.insert(gl::READ_FRAMEBUFFER_BINDING, framebuffer);
        }
        if target != gl::READ_FRAMEBUFFER {
            state.bindings.insert(gl::DRAW_FRAMEBUFFER_BINDING, framebuffer);
        }
    }

    fn framebuffer_texture_2d(
        &self,
        target: GLenum,
        attachment: GLenum,
        texture_target: GLenum,
        texture: GLuint,
        level: GLint,
    ) {
        self.record(Call::FramebufferTexture2d {
            target,
            attachment,
            texture_target,
            texture,
            level,
        });
        self.attach(target, attachment, texture);
    }

    fn framebuffer_renderbuffer(
        &self,
        target: GLenum,
        attachment: GLenum,
        _renderbuffer_target: GLenum,
        renderbuffer: GLuint,
    ) {
        self.record(Call::FramebufferRenderbuffer { target, attachment, renderbuffer });
        self.attach(target, attachment, renderbuffer);
    }

    fn check_framebuffer_status(&self, target: GLenum) -> GLenum {
        self.record(Call::CheckFramebufferStatus(target));
        let framebuffer = self.framebuffer_for(target);
        let state = self.state.borrow();
        let attached = state.attachments.get(&framebuffer).map_or(false, |points| !points.is_empty());
        if framebuffer == 0 || attached {
            gl::FRAMEBUFFER_COMPLETE
        } else {
            gl::FRAMEBUFFER_INCOMPLETE_MISSING_ATTACHMENT
        }
    }

    fn read_buffer(&self, mode: GLenum) {
        self.record(Call::ReadBuffer(mode));
    }

    fn draw_buffers(&self, buffers: &[GLenum]) {
        self.record(Call::DrawBuffers(buffers.to_vec()));
    }

    fn gen_renderbuffer(&self) -> GLuint {
        self.gen_name(Call::GenRenderbuffer)
    }

    fn delete_renderbuffer(&self, renderbuffer: GLuint) {
        self.record(Call::DeleteRenderbuffer(renderbuffer));
        let mut state = self.state.borrow_mut();
        if state.bindings.get(&gl::RENDERBUFFER_BINDING) == Some(&renderbuffer) {
            state.bindings.insert(gl::RENDERBUFFER_BINDING, 0);
        }
    }

    fn bind_renderbuffer(&self, target: GLenum, renderbuffer: GLuint) {
        self.record(Call::BindRenderbuffer(target, renderbuffer));
        self.state.borrow_mut().bindings.insert(gl::RENDERBUFFER_BINDING, renderbuffer);
    }

    fn renderbuffer_storage(
        &self,
        target: GLenum,
        internal_format: GLenum,
        width: GLsizei,
        height: GLsizei,
    ) {
        self.record(Call::RenderbufferStorage { target, internal_format, width, height });
    }

    fn clear_color(&self, red: GLfloat, green: GLfloat, blue: GLfloat, alpha: GLfloat) {
        self.record(Call::ClearColor([red, green, blue, alpha]));
    }

    fn clear(&self, mask: GLbitfield) {
        self.record(Call::Clear(mask));
    }

    fn draw_arrays(&self, mode: GLenum, first: GLint, count: GLsizei) {
        self.record(Call::DrawArrays { mode, first, count });
    }

    fn draw_elements(&self, mode: GLenum, count: GLsizei, ty: GLenum, offset: usize) {
        self.record(Call::DrawElements { mode, count, ty, offset });
    }
}

impl DesktopBackend for RecordingGl {
    fn get_buffer_sub_data(&self, target: GLenum, offset: usize, data: &mut [u8]) {
        self.record(Call::GetBufferSubData { target, offset, size: data.len() });
        let buffer = self.bound_buffer(target);
        let mut state = self.state.borrow_mut();
        let State { buffers, errors, mapped, .. } = &mut *state;
        if mapped.contains(&buffer) {
            errors.push(gl::INVALID_OPERATION);
            return;
        }
        match buffers.get(&buffer) {
            Some(store) if offset + data.len() <= store.len() => {
                data.copy_from_slice(&store[offset..offset + data.len()]);
            }
            Some(_) => errors.push(gl::INVALID_VALUE),
            None => errors.push(gl::INVALID_OPERATION),
        }
    }

    fn get_buffer_parameter_i32(&self, target: GLenum, pname: GLenum) -> GLint {
        self.record(Call::GetBufferParameter(target, pname));
        let buffer = self.bound_buffer(target);
        let state = self.state.borrow();
        match pname {
            gl::BUFFER_SIZE => state.buffers.get(&buffer).map_or(0, |store| store.len() as GLint),
            gl::BUFFER_MAPPED => state.mapped.contains(&buffer) as GLint,
            _ => 0,
        }
    }

    fn map_buffer(&self, target: GLenum, access: GLenum) -> *mut c_void {
        self.record(Call::MapBuffer(target, access));
        let buffer = self.bound_buffer(target);
        let mut state = self.state.borrow_mut();
        if buffer == 0 || state.mapped.contains(&buffer) {
            state.errors.push(gl::INVALID_OPERATION);
            return ptr::null_mut();
        }
        let pointer = match state.buffers.get_mut(&buffer) {
            Some(store) => store.as_mut_ptr() as *mut c_void,
            None => return ptr::null_mut(),
        };
        state.mapped.push(buffer);
        pointer
    }

    fn unmap_buffer(&self, target: GLenum) -> bool {
        self.record(Call::UnmapBuffer(target));
        let buffer = self.bound_buffer(target);
        let mut state = self.state.borrow_mut();
        if state.mapped.contains(&buffer) {
            state.mapped.retain(|&name| name != buffer);
            true
        } else {
            state.errors.push(gl::INVALID_OPERATION);
            false
        }
    }

    fn get_tex_image(
        &self,
        target: GLenum,
        level: GLint,
        format: GLenum,
        ty: GLenum,
        pixels: PixelPackData,
    ) {
        self.record(Call::GetTexImage { target, level, format, ty, pixels: (&pixels).into() });
    }

    fn get_tex_level_parameter_i32(&self, target: GLenum, level: GLint, pname: GLenum) -> GLint {
        self.record(Call::GetTexLevelParameter(target, level, pname));
        let texture = self.bound_texture(target);
        let state = self.state.borrow();
        let (width, height) = state.levels.get(&(texture, level)).copied().unwrap_or((0, 0));
        match pname {
            gl::TEXTURE_WIDTH => width,
            gl::TEXTURE_HEIGHT => height,
            _ => 0,
        }
    }

    fn tex_buffer(&self, target: GLenum, internal_format: GLenum, buffer: GLuint) {
        self.record(Call::TexBuffer { target, internal_format, buffer });
    }

    fn framebuffer_texture(&self, target: GLenum, attachment: GLenum, texture: GLuint, level: GLint) {
        self.record(Call::FramebufferTexture { target, attachment, texture, level });
        self.attach(target, attachment, texture);
    }

    fn draw_buffer(&self, mode: GLenum) {
        self.record(Call::DrawBuffer(mode));
    }
}

impl FixedFunctionBackend for RecordingGl {
    fn enable_client_state(&self, array: GLenum) {
        self.record(Call::EnableClientState(array));
    }

    fn disable_client_state(&self, array: GLenum) {
        self.record(Call::DisableClientState(array));
    }

    fn client_active_texture(&self, unit: GLenum) {
        self.record(Call::ClientActiveTexture(unit));
    }

    fn push_client_attrib(&self, mask: GLbitfield) {
        self.record(Call::PushClientAttrib(mask));
    }

    fn pop_client_attrib(&self) {
        self.record(Call::PopClientAttrib);
    }

    fn push_attrib(&self, mask: GLbitfield) {
        self.record(Call::PushAttrib(mask));
    }

    fn pop_attrib(&self) {
        self.record(Call::PopAttrib);
    }

    fn push_matrix(&self) {
        self.record(Call::PushMatrix);
    }

    fn pop_matrix(&self) {
        self.record(Call::PopMatrix);
    }

    unsafe fn vertex_pointer(&self, size: GLint, ty: GLenum, stride: GLsizei, pointer: *const c_void) {
        self.record(Call::VertexPointer { size, ty, stride, pointer: pointer as usize });
    }

    unsafe fn color_pointer(&self, size: GLint, ty: GLenum, stride: GLsizei, pointer: *const c_void) {
        self.record(Call::ColorPointer { size, ty, stride, pointer: pointer as usize });
    }

    unsafe fn normal_pointer(&self, ty: GLenum, stride: GLsizei, pointer: *const c_void) {
        self.record(Call::NormalPointer { ty, stride, pointer: pointer as usize });
    }

    unsafe fn index_pointer(&self, ty: GLenum, stride: GLsizei, pointer: *const c_void) {
        self.record(Call::IndexPointer { ty, stride, pointer: pointer as usize });
    }

    unsafe fn tex_coord_pointer(
        &self,
        size: GLint,
        ty: GLenum,
        stride: GLsizei,
        pointer: *const c_void,
    ) {
        self.record(Call::TexCoordPointer { size, ty, stride, pointer: pointer as usize });
    }

    fn draw_elements_u8_slice(&self, mode: GLenum, count: GLsizei, ty: GLenum, indices: &[u8]) {
        self.record(Call::DrawElementsHost { mode, count, ty, len: indices.len() });
    }

    fn light_model_fv(&self, pname: GLenum, params: &[GLfloat]) {
        self.record(Call::LightModelFv(pname, params.to_vec()));
    }

    fn light_model_i32(&self, pname: GLenum, param: GLint) {
        self.record(Call::LightModelI(pname, param));
    }

    fn light_fv(&self, light: GLenum, pname: GLenum, params: &[GLfloat]) {
        self.record(Call::LightFv(light, pname, params.to_vec()));
    }

    fn light_i32(&self, light: GLenum, pname: GLenum, param: GLint) {
        self.record(Call::LightI(light, pname, param));
    }

    fn light_f32(&self, light: GLenum, pname: GLenum, param: GLfloat) {
        self.record(Call::LightF(light, pname, param));
    }

    fn material_fv(&self, face: GLenum, pname: GLenum, params: &[GLfloat]) {
        self.record(Call::MaterialFv(face, pname, params.to_vec()));
    }

    fn material_i32(&self, face: GLenum, pname: GLenum, param: GLint) {
        self.record(Call::MaterialI(face, pname, param));
    }

    fn color_material(&self, face: GLenum, mode: GLenum) {
        self.record(Call::ColorMaterial(face, mode));
    }
}
