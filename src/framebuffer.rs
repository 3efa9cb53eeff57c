use cgmath::*;
use log::*;
use std::cell::{Cell, RefCell};
use std::marker::PhantomData;

use crate::backend::*;
use crate::binding::*;
use crate::context::*;
use crate::error::*;
use crate::gl;
use crate::gl::types::*;
use crate::surface::*;
use crate::texture::*;

/// Colour attachment points a framebuffer device tracks.
pub const MAX_COLOR_ATTACHMENTS: usize = 16;

/// Width of the draw-buffer list `open_draw_current` passes on ES and WebGL.
pub const ES_DRAW_BUFFERS: usize = 8;

/// A renderbuffer.
pub struct Renderbuffer<B: Backend> {
    name: Cell<GLuint>,
    context: GlContext<B>,
}

impl<B: Backend> Drop for Renderbuffer<B> {
    fn drop(&mut self) {
        let name = self.name.get();
        if name != 0 {
            self.context.inner.delete_renderbuffer(name);
            trace!("Deleted renderbuffer {}", name);
        }
    }
}

impl<B: Backend> Renderbuffer<B> {
    pub fn new(context: &GlContext<B>) -> Self {
        Renderbuffer { name: Cell::new(0), context: context.clone() }
    }

    pub fn name(&self) -> GLuint {
        self.name.get()
    }

    /// Creates the renderbuffer if needed and binds it, unless it is already bound.
    pub fn ensure(&self) {
        if self.name.get() == 0 {
            let name = self.context.inner.gen_renderbuffer();
            trace!("Created renderbuffer {}", name);
            self.name.set(name);
        }
        let name = self.name.get();
        if self.context.query_binding(gl::RENDERBUFFER_BINDING) != name {
            self.context.inner.bind_renderbuffer(gl::RENDERBUFFER, name);
        }
    }

    /// (Re)allocates storage for the bound renderbuffer.
    pub fn alloc(&self, internal_format: GLenum, size: Vector2<i32>) {
        debug!("Allocating {}x{} renderbuffer storage (0x{:04X})", size.x, size.y, internal_format);
        self.context.inner.renderbuffer_storage(gl::RENDERBUFFER, internal_format, size.x, size.y);
    }
}

/// What occupies one attachment point of a framebuffer device.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Attachment {
    /// A level of a 2D image, attached with `glFramebufferTexture2D`.
    Image { target: GLenum, name: GLuint, level: i32 },
    /// A texture attached by name with `glFramebufferTexture`.
    Texture { name: GLuint, level: i32 },
    Renderbuffer(GLuint),
}

impl Attachment {
    pub fn name(&self) -> GLuint {
        match *self {
            Attachment::Image { name, .. } => name,
            Attachment::Texture { name, .. } => name,
            Attachment::Renderbuffer(name) => name,
        }
    }
}

/// Something that can be pinned to a framebuffer attachment point: a 2D image or a
/// renderbuffer. Buffer images deliberately don't implement this.
pub trait FramebufferAttachment<B: Backend> {
    /// Attaches level `level` (ignored by renderbuffers) to `attachment` of the framebuffer
    /// bound to `target`.
    #[doc(hidden)]
    fn attach_to_framebuffer(
        &self,
        context: &GlContext<B>,
        target: GLenum,
        attachment: GLenum,
        level: i32,
    ) -> Attachment;
}

impl<T: ImageTarget2d, B: Backend> FramebufferAttachment<B> for GpuImage<T, B> {
    fn attach_to_framebuffer(
        &self,
        context: &GlContext<B>,
        target: GLenum,
        attachment: GLenum,
        level: i32,
    ) -> Attachment {
        context.inner.framebuffer_texture_2d(target, attachment, T::TARGET, self.name(), level);
        Attachment::Image { target: T::TARGET, name: self.name(), level }
    }
}

impl<B: Backend> FramebufferAttachment<B> for Renderbuffer<B> {
    fn attach_to_framebuffer(
        &self,
        context: &GlContext<B>,
        target: GLenum,
        attachment: GLenum,
        _level: i32,
    ) -> Attachment {
        context.inner.framebuffer_renderbuffer(target, attachment, gl::RENDERBUFFER, self.name());
        Attachment::Renderbuffer(self.name())
    }
}

/// A framebuffer object, bound to the targets of `D`.
///
/// The attachment methods act on the framebuffer bound to `D::TARGET`; call `ensure` first.
pub struct FramebufferDevice<B: Backend, D: DeviceScope = Combined> {
    name: Cell<GLuint>,
    attachments: RefCell<[Option<Attachment>; MAX_COLOR_ATTACHMENTS]>,
    context: GlContext<B>,
    phantom: PhantomData<D>,
}

impl<B: Backend, D: DeviceScope> Drop for FramebufferDevice<B, D> {
    fn drop(&mut self) {
        self.leave();
        let name = self.name.get();
        if name != 0 {
            self.context.inner.delete_framebuffer(name);
            trace!("Deleted framebuffer {}", name);
        }
    }
}

fn color_attachment(index: usize) -> GLenum {
    assert!(
        index < MAX_COLOR_ATTACHMENTS,
        "colour attachment {} out of range (0..{})",
        index,
        MAX_COLOR_ATTACHMENTS
    );
    gl::COLOR_ATTACHMENT0 + index as GLenum
}

impl<B: Backend, D: DeviceScope> FramebufferDevice<B, D> {
    pub fn new(context: &GlContext<B>) -> Self {
        FramebufferDevice {
            name: Cell::new(0),
            attachments: RefCell::new([None; MAX_COLOR_ATTACHMENTS]),
            context: context.clone(),
            phantom: PhantomData,
        }
    }

    pub fn name(&self) -> GLuint {
        self.name.get()
    }

    /// True if this framebuffer is bound on every target of `D`.
    pub fn is_current(&self) -> bool {
        let name = self.name.get();
        (!D::READS || self.context.query_binding(gl::READ_FRAMEBUFFER_BINDING) == name)
            && (!D::DRAWS || self.context.query_binding(gl::DRAW_FRAMEBUFFER_BINDING) == name)
    }

    /// Creates the framebuffer if needed and binds it to `D::TARGET`, unless it is already
    /// bound there.
    pub fn ensure(&self) {
        if self.name.get() == 0 {
            let name = self.context.inner.gen_framebuffer();
            trace!("Created framebuffer {}", name);
            self.name.set(name);
        }
        if !self.is_current() {
            self.context.inner.bind_framebuffer(D::TARGET, self.name.get());
        } else {
            trace!("Framebuffer {} already bound", self.name.get());
        }
    }

    /// Rebinds the default framebuffer on each target where this framebuffer is bound.
    pub fn leave(&self) {
        let name = self.name.get();
        if name == 0 {
            return;
        }
        let default = self.context.options().default_framebuffer;
        for &(target, binding) in &[
            (gl::READ_FRAMEBUFFER, gl::READ_FRAMEBUFFER_BINDING),
            (gl::DRAW_FRAMEBUFFER, gl::DRAW_FRAMEBUFFER_BINDING),
        ] {
            if self.context.query_binding(binding) == name {
                self.context.inner.bind_framebuffer(target, default);
            }
        }
    }

    /// Attaches level `level` of `image` (ignored for renderbuffers) to colour attachment
    /// `index`, replacing whatever was there.
    ///
    /// Panics if `index` is 16 or more.
    pub fn color_pin_image<A: FramebufferAttachment<B>>(&self, index: usize, image: &A, level: i32) {
        let attachment = color_attachment(index);
        let pinned = image.attach_to_framebuffer(&self.context, D::TARGET, attachment, level);
        self.record(index, pinned);
    }

    /// Detaches colour attachment `index`.
    ///
    /// Panics if `index` is 16 or more.
    pub fn color_unpin(&self, index: usize) {
        let attachment = color_attachment(index);
        match self.attachments.borrow()[index] {
            Some(Attachment::Renderbuffer(_)) => {
                self.context.inner.framebuffer_renderbuffer(D::TARGET, attachment, gl::RENDERBUFFER, 0);
            }
            _ => {
                self.context.inner.framebuffer_texture_2d(D::TARGET, attachment, gl::TEXTURE_2D, 0, 0);
            }
        }
        self.attachments.borrow_mut()[index] = None;
    }

    /// The object pinned to colour attachment `index`, if any.
    pub fn attachment(&self, index: usize) -> Option<Attachment> {
        self.attachments.borrow().get(index).copied().flatten()
    }

    fn record(&self, index: usize, pinned: Attachment) {
        if pinned.name() == 0 {
            warn!("Pinned an object that was never created to colour attachment {}; it is now empty", index);
            self.attachments.borrow_mut()[index] = None;
        } else {
            self.attachments.borrow_mut()[index] = Some(pinned);
        }
    }

    /// Makes colour attachment `index` the source for pixel reads.
    pub fn open_read_current(&self, index: usize) {
        self.context.inner.read_buffer(color_attachment(index));
    }

    /// Directs fragment output to colour attachment `index` only.
    ///
    /// ES and WebGL require attachment `i` in slot `i` of the draw-buffer list, so there an
    /// 8-wide list is passed with every other slot `NONE`, and `index` must be below 8.
    pub fn open_draw_current(&self, index: usize) {
        let attachment = color_attachment(index);
        match self.context.profile() {
            Profile::Desktop => self.context.inner.draw_buffers(&[attachment]),
            Profile::Es => {
                assert!(index < ES_DRAW_BUFFERS, "ES draw buffer {} out of range (0..{})", index, ES_DRAW_BUFFERS);
                let mut buffers = [gl::NONE; ES_DRAW_BUFFERS];
                buffers[index] = attachment;
                self.context.inner.draw_buffers(&buffers);
            }
        }
    }

    /// Checks the completeness of the framebuffer bound to `D::TARGET`.
    pub fn check_status(&self) -> Result<(), Error> {
        let status = self.context.inner.check_framebuffer_status(D::TARGET);
        if status == gl::FRAMEBUFFER_COMPLETE {
            Ok(())
        } else {
            let err = Error::from_framebuffer_status(status);
            error!("Framebuffer {}: {}", self.name.get(), err);
            Err(err)
        }
    }
}

impl<B: DesktopBackend, D: DeviceScope> FramebufferDevice<B, D> {
    /// Attaches texture `texture` by name to colour attachment `index`.
    ///
    /// Panics if `index` is 16 or more.
    pub fn color_pin_texture(&self, index: usize, texture: GLuint, level: i32) {
        let attachment = color_attachment(index);
        self.context.inner.framebuffer_texture(D::TARGET, attachment, texture, level);
        self.record(index, Attachment::Texture { name: texture, level });
    }
}

impl<B: Backend, D: DrawScope> Surface<B> for FramebufferDevice<B, D> {
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
    fn ensure_binds_once_per_scope() {
        let context = recording_context(Profile::Desktop);
        let device: FramebufferDevice<_> = FramebufferDevice::new(&context);
        device.ensure();
        device.ensure();

        let backend = context.backend();
        assert_eq!(backend.count(|call| matches!(call, Call::GenFramebuffer(_))), 1);
        assert_eq!(
            backend.count(|call| matches!(call, Call::BindFramebuffer(..))),
            1
        );
        assert!(backend.calls().contains(&Call::BindFramebuffer(gl::FRAMEBUFFER, device.name())));
    }

    #[test]
    fn combined_scope_rebinds_when_only_read_is_current() {
        let context = recording_context(Profile::Desktop);
        let device: FramebufferDevice<_> = FramebufferDevice::new(&context);
        device.ensure();
        context.backend().bind_framebuffer(gl::DRAW_FRAMEBUFFER, 0);
        context.backend().take_calls();

        device.ensure();
        assert_eq!(
            context.backend().count(|call| *call == Call::BindFramebuffer(gl::FRAMEBUFFER, device.name())),
            1
        );
    }

    #[test]
    fn leave_restores_only_targets_it_holds() {
        let context = GlContext::new(
            RecordingGl::new(Profile::Es),
            ContextOptions { default_framebuffer: 100, ..ContextOptions::default() },
        );
        let reader: FramebufferDevice<_, ReadOnly> = FramebufferDevice::new(&context);
        reader.ensure();
        let other: FramebufferDevice<_, DrawOnly> = FramebufferDevice::new(&context);
        other.ensure();
        context.backend().take_calls();

        reader.leave();
        assert!(context.backend().calls().contains(&Call::BindFramebuffer(gl::READ_FRAMEBUFFER, 100)));
        assert_eq!(context.query_binding(gl::DRAW_FRAMEBUFFER_BINDING), other.name());

        context.backend().take_calls();
        reader.leave();
        assert_eq!(context.backend().count(|call| matches!(call, Call::BindFramebuffer(..))), 0);
    }

    #[test]
    fn drop_leaves_and_deletes() {
        let context = recording_context(Profile::Desktop);
        let device: FramebufferDevice<_, DrawOnly> = FramebufferDevice::new(&context);
        device.ensure();
        let name = device.name();
        drop(device);

        let calls = context.backend().calls();
        let n = calls.len();
        assert_eq!(calls[n - 1], Call::DeleteFramebuffer(name));
        assert!(calls.contains(&Call::BindFramebuffer(gl::DRAW_FRAMEBUFFER, 0)));

        let never_created: FramebufferDevice<_> = FramebufferDevice::new(&context);
        drop(never_created);
        assert_eq!(context.backend().count(|call| matches!(call, Call::DeleteFramebuffer(_))), 1);
    }

    #[test]
    fn pinning_is_last_write_wins() {
        let context = recording_context(Profile::Desktop);
        let device: FramebufferDevice<_> = FramebufferDevice::new(&context);
        device.ensure();
        let first = Image2d::new(&context);
        first.ensure(0);
        let second = ImageRect::new(&context);
        second.ensure(0);
        let depth = Renderbuffer::new(&context);
        depth.ensure();

        device.color_pin_image(2, &first, 0);
        device.color_pin_image(2, &second, 0);
        assert_eq!(
            device.attachment(2),
            Some(Attachment::Image { target: gl::TEXTURE_RECTANGLE, name: second.name(), level: 0 })
        );
        assert_eq!(context.backend().attached(device.name(), gl::COLOR_ATTACHMENT2), second.name());

        device.color_pin_image(15, &depth, 0);
        assert_eq!(device.attachment(15), Some(Attachment::Renderbuffer(depth.name())));
        assert!(device.check_status().is_ok());

        device.color_unpin(2);
        device.color_unpin(15);
        assert_eq!(device.attachment(2), None);
        assert_eq!(device.attachment(15), None);
        assert_eq!(context.backend().attached(device.name(), gl::COLOR_ATTACHMENT2), 0);
        assert!(context.backend().calls().contains(&Call::FramebufferRenderbuffer {
            target: gl::FRAMEBUFFER,
            attachment: gl::COLOR_ATTACHMENT15,
            renderbuffer: 0,
        }));
    }

    #[test]
    fn pin_by_name_uses_framebuffer_texture() {
        let context = recording_context(Profile::Desktop);
        let device: FramebufferDevice<_, DrawOnly> = FramebufferDevice::new(&context);
        device.ensure();
        device.color_pin_texture(1, 42, 3);
        assert!(context.backend().calls().contains(&Call::FramebufferTexture {
            target: gl::DRAW_FRAMEBUFFER,
            attachment: gl::COLOR_ATTACHMENT1,
            texture: 42,
            level: 3,
        }));
        assert_eq!(device.attachment(1), Some(Attachment::Texture { name: 42, level: 3 }));
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn pin_index_sixteen_panics() {
        let context = recording_context(Profile::Desktop);
        let device: FramebufferDevice<_> = FramebufferDevice::new(&context);
        device.color_unpin(16);
    }

    #[test]
    fn check_status_reports_missing_attachment() {
        let context = recording_context(Profile::Desktop);
        let device: FramebufferDevice<_> = FramebufferDevice::new(&context);
        device.ensure();
        match device.check_status() {
            Err(Error::FramebufferIncomplete { status, .. }) => {
                assert_eq!(status, gl::FRAMEBUFFER_INCOMPLETE_MISSING_ATTACHMENT)
            }
            other => panic!("unexpected status {:?}", other),
        }
    }

    #[test]
    fn draw_selection_depends_on_profile() {
        let context = recording_context(Profile::Es);
        let device: FramebufferDevice<_> = FramebufferDevice::new(&context);
        device.open_draw_current(2);
        device.open_read_current(2);
        let mut expected = vec![gl::NONE; 8];
        expected[2] = gl::COLOR_ATTACHMENT2;
        assert_eq!(
            context.backend().calls(),
            vec![Call::DrawBuffers(expected), Call::ReadBuffer(gl::COLOR_ATTACHMENT2)]
        );

        let context = recording_context(Profile::Desktop);
        let device: FramebufferDevice<_> = FramebufferDevice::new(&context);
        device.open_draw_current(9);
        assert_eq!(context.backend().calls(), vec![Call::DrawBuffers(vec![gl::COLOR_ATTACHMENT9])]);
    }

    #[test]
    fn renderbuffer_allocates_bound_storage() {
        let context = recording_context(Profile::Es);
        let renderbuffer = Renderbuffer::new(&context);
        renderbuffer.ensure();
        renderbuffer.ensure();
        renderbuffer.alloc(gl::DEPTH24_STENCIL8, vec2(64, 32));
        let name = renderbuffer.name();
        drop(renderbuffer);

        assert_eq!(
            context.backend().calls(),
            vec![
                Call::GenRenderbuffer(name),
                Call::GetInteger(gl::RENDERBUFFER_BINDING),
                Call::BindRenderbuffer(gl::RENDERBUFFER, name),
                Call::GetInteger(gl::RENDERBUFFER_BINDING),
                Call::RenderbufferStorage {
                    target: gl::RENDERBUFFER,
                    internal_format: gl::DEPTH24_STENCIL8,
                    width: 64,
                    height: 32,
                },
                Call::DeleteRenderbuffer(name),
            ]
        );
    }

    #[test]
    fn clearing_a_device_binds_it_first() {
        let context = recording_context(Profile::Desktop);
        let device: FramebufferDevice<_> = FramebufferDevice::new(&context);
        device.clear(&[ClearBuffer::Color([0.0, 0.5, 1.0, 1.0]), ClearBuffer::Depth]);
        let calls = context.backend().calls();
        assert!(calls.contains(&Call::BindFramebuffer(gl::FRAMEBUFFER, device.name())));
        assert_eq!(calls[calls.len() - 2], Call::ClearColor([0.0, 0.5, 1.0, 1.0]));
        assert_eq!(calls[calls.len() - 1], Call::Clear(gl::COLOR_BUFFER_BIT | gl::DEPTH_BUFFER_BIT));
    }
}
