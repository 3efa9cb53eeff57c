use log::*;
use serde::*;
use std::rc::Rc;

use crate::backend::*;
use crate::error::*;
use crate::gl;
use crate::gl::types::*;

/// Settings applied once, when a `GlContext` is created.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContextOptions {
    /// The framebuffer name that handles restore when they leave, and that
    /// `DefaultRenderDevice::ensure` binds.
    ///
    /// 0 unbinds any framebuffer object, which is what almost every driver means by "the window".
    /// A few embedded drivers expose the window-system framebuffer as name 1 instead.
    pub default_framebuffer: GLuint,
    pub unpack_alignment: GLint,
    pub pack_alignment: GLint,
}

impl Default for ContextOptions {
    fn default() -> Self {
        ContextOptions { default_framebuffer: 0, unpack_alignment: 1, pack_alignment: 4 }
    }
}

/// A GL context.
///
/// Cheap to clone; every handle keeps a clone so it can delete its object when dropped. Not
/// `Send`, since GL state belongs to a single thread.
pub struct GlContext<B: Backend> {
    pub(crate) inner: Rc<B>,
    options: ContextOptions,
}

impl<B: Backend> Clone for GlContext<B> {
    fn clone(&self) -> Self {
        GlContext { inner: Rc::clone(&self.inner), options: self.options }
    }
}

#[derive(Copy, Clone, Debug)]
pub(crate) enum GlFlag {
    DepthTest,
    Lighting,
    Texture2d,
    ColorMaterial,
    Light(u32),
}

impl GlFlag {
    fn as_gl(self) -> u32 {
        match self {
            GlFlag::DepthTest => gl::DEPTH_TEST,
            GlFlag::Lighting => gl::LIGHTING,
            GlFlag::Texture2d => gl::TEXTURE_2D,
            GlFlag::ColorMaterial => gl::COLOR_MATERIAL,
            GlFlag::Light(index) => gl::LIGHT0 + index,
        }
    }
}

impl<B: Backend> GlContext<B> {
    /// Wraps a backend whose context is current on this thread.
    pub fn new(backend: B, options: ContextOptions) -> Self {
        backend.pixel_store_i32(gl::UNPACK_ALIGNMENT, options.unpack_alignment);
        backend.pixel_store_i32(gl::PACK_ALIGNMENT, options.pack_alignment);
        GlContext { inner: Rc::new(backend), options }
    }

    pub fn backend(&self) -> &B {
        &self.inner
    }

    pub fn options(&self) -> &ContextOptions {
        &self.options
    }

    pub fn profile(&self) -> Profile {
        self.inner.profile()
    }

    /// Returns the object name bound to the binding point `pname`, or 0.
    pub fn query_binding(&self, pname: GLenum) -> GLuint {
        self.inner.get_integer(pname) as GLuint
    }

    /// Drains the GL error queue, logging every error and returning the first.
    pub fn check_error(&self) -> Result<(), Error> {
        // A lost context can keep reporting errors forever.
        const MAX_ERRORS: usize = 32;

        let mut first = None;
        for _ in 0..MAX_ERRORS {
            let code = self.inner.get_error();
            if code == gl::NO_ERROR {
                break;
            }
            let err = Error::from_gl_code(code);
            error!("{}", err);
            if first.is_none() {
                first = Some(err);
            }
        }
        match first {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Blocks until all previously issued commands have completed.
    pub fn finish(&self) {
        self.inner.finish();
    }

    pub(crate) fn enable(&self, flag: GlFlag) {
        self.inner.enable(flag.as_gl());
    }

    pub(crate) fn disable(&self, flag: GlFlag) {
        self.inner.disable(flag.as_gl());
    }
}
