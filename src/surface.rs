use cgmath::*;

use crate::backend::*;
use crate::context::*;
use crate::gl;
use crate::gl::types::*;

/// Something that can be drawn to: a framebuffer device or the default framebuffer.
pub trait Surface<B: Backend> {
    fn context(&self) -> &GlContext<B>;

    /// Binds the surface for drawing.
    fn bind(&self);

    /// Binds the surface and clears one or more of its buffers.
    ///
    /// Example usage:
    /// ```ignore
    /// surface.clear(&[ClearBuffer::Color([0.0, 0.0, 0.0, 0.0]), ClearBuffer::Depth]);
    /// ```
    fn clear(&self, buffers: &[ClearBuffer]) {
        assert!(!buffers.is_empty());
        self.bind();

        let inner = &self.context().inner;
        let mut bits = 0;
        for buffer in buffers {
            bits |= buffer.as_gl();

            if let Some(color) = buffer.color() {
                inner.clear_color(color[0], color[1], color[2], color[3]);
            }
        }

        inner.clear(bits);
    }
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub enum ClearBuffer {
    Color([f32; 4]),
    Depth,
    Stencil,
}

impl ClearBuffer {
    fn as_gl(&self) -> GLbitfield {
        match self {
            ClearBuffer::Color(_) => gl::COLOR_BUFFER_BIT,
            ClearBuffer::Depth => gl::DEPTH_BUFFER_BIT,
            ClearBuffer::Stencil => gl::STENCIL_BUFFER_BIT,
        }
    }

    fn color(&self) -> Option<[f32; 4]> {
        match self {
            ClearBuffer::Color(color) => Some(*color),
            _ => None,
        }
    }
}

/// The framebuffer provided by the window system.
///
/// Holds no GL object. Apart from `ensure` and `clear`, the methods act on whatever
/// framebuffer is bound, so call `ensure` first.
pub struct DefaultRenderDevice<B: Backend> {
    context: GlContext<B>,
}

impl<B: Backend> DefaultRenderDevice<B> {
    pub fn new(context: &GlContext<B>) -> Self {
        DefaultRenderDevice { context: context.clone() }
    }

    /// Binds `ContextOptions::default_framebuffer` for reading and drawing, unless it is
    /// already bound to both.
    pub fn ensure(&self) {
        let name = self.context.options().default_framebuffer;
        if self.context.query_binding(gl::READ_FRAMEBUFFER_BINDING) != name
            || self.context.query_binding(gl::DRAW_FRAMEBUFFER_BINDING) != name
        {
            self.context.inner.bind_framebuffer(gl::FRAMEBUFFER, name);
        }
    }

    pub fn open_read_on_front(&self) {
        self.context.inner.read_buffer(gl::FRONT);
    }

    pub fn open_read_on_back(&self) {
        self.context.inner.read_buffer(gl::BACK);
    }

    pub fn open_read_on_front_and_back(&self) {
        self.context.inner.read_buffer(gl::FRONT_AND_BACK);
    }

    pub fn close_read(&self) {
        self.context.inner.read_buffer(gl::NONE);
    }

    /// Sets the clear colour without clearing.
    pub fn clear_color(&self, rgba: Vector4<f32>) {
        self.context.inner.clear_color(rgba.x, rgba.y, rgba.z, rgba.w);
    }

    pub fn clear_color_buffer(&self) {
        self.context.inner.clear(gl::COLOR_BUFFER_BIT);
    }

    pub fn clear_depth(&self) {
        self.context.inner.clear(gl::DEPTH_BUFFER_BIT);
    }

    pub fn clear_stencil(&self) {
        self.context.inner.clear(gl::STENCIL_BUFFER_BIT);
    }
}

impl<B: DesktopBackend> DefaultRenderDevice<B> {
    pub fn open_draw_on_front(&self) {
        self.context.inner.draw_buffer(gl::FRONT);
    }

    pub fn open_draw_on_back(&self) {
        self.context.inner.draw_buffer(gl::BACK);
    }

    pub fn open_draw_on_front_and_back(&self) {
        self.context.inner.draw_buffer(gl::FRONT_AND_BACK);
    }
}

impl<B: Backend> Surface<B> for DefaultRenderDevice<B> {
    fn context(&self) -> &GlContext<B> {
        &self.context
    }

    fn bind(&self) {
        self.ensure();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recording::*;

    #[test]
    fn ensure_binds_configured_default_once() {
        let context = GlContext::new(
            RecordingGl::new(Profile::Es),
            ContextOptions { default_framebuffer: 1, ..ContextOptions::default() },
        );
        let device = DefaultRenderDevice::new(&context);
        device.ensure();
        device.ensure();
        assert_eq!(
            context.backend().count(|call| matches!(call, Call::BindFramebuffer(..))),
            1
        );
        assert!(context.backend().calls().contains(&Call::BindFramebuffer(gl::FRAMEBUFFER, 1)));
    }

    #[test]
    fn ensure_is_a_no_op_when_window_is_bound() {
        let context = recording_context(Profile::Desktop);
        DefaultRenderDevice::new(&context).ensure();
        assert_eq!(
            context.backend().count(|call| matches!(call, Call::BindFramebuffer(..))),
            0
        );
    }

    #[test]
    fn ensure_rebinds_when_either_target_is_elsewhere() {
        let context = recording_context(Profile::Desktop);
        context.backend().bind_framebuffer(gl::READ_FRAMEBUFFER, 7);
        context.backend().take_calls();

        DefaultRenderDevice::new(&context).ensure();

        assert_eq!(
            context.backend().count(|call| matches!(call, Call::BindFramebuffer(..))),
            1
        );
        assert_eq!(context.query_binding(gl::READ_FRAMEBUFFER_BINDING), 0);
        assert_eq!(context.query_binding(gl::DRAW_FRAMEBUFFER_BINDING), 0);
    }

    #[test]
    fn buffer_selection_is_one_call_each() {
        let context = recording_context(Profile::Desktop);
        let device = DefaultRenderDevice::new(&context);
        device.open_read_on_back();
        device.open_draw_on_front_and_back();
        device.close_read();
        device.clear_color(vec4(0.25, 0.5, 0.75, 1.0));
        device.clear_depth();
        device.clear_stencil();
        device.clear_color_buffer();
        assert_eq!(
            context.backend().calls(),
            vec![
                Call::ReadBuffer(gl::BACK),
                Call::DrawBuffer(gl::FRONT_AND_BACK),
                Call::ReadBuffer(gl::NONE),
                Call::ClearColor([0.25, 0.5, 0.75, 1.0]),
                Call::Clear(gl::DEPTH_BUFFER_BIT),
                Call::Clear(gl::STENCIL_BUFFER_BIT),
                Call::Clear(gl::COLOR_BUFFER_BIT),
            ]
        );
    }

    #[test]
    fn clear_combines_bits() {
        let context = recording_context(Profile::Es);
        let device = DefaultRenderDevice::new(&context);
        device.clear(&[ClearBuffer::Depth, ClearBuffer::Stencil]);
        assert_eq!(
            context.backend().take_calls().last(),
            Some(&Call::Clear(gl::DEPTH_BUFFER_BIT | gl::STENCIL_BUFFER_BIT))
        );
    }
}
