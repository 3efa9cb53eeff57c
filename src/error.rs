use thiserror::Error;

use crate::gl;
use crate::gl::types::*;

#[derive(Debug, Error)]
pub enum Error {
    #[error("unable to create context: {0}")]
    ContextCreation(String),
    #[error("framebuffer not complete: {reason} (0x{status:04X})")]
    FramebufferIncomplete { status: GLenum, reason: &'static str },
    #[error("GL error {name} (0x{code:04X})")]
    Gl { code: GLenum, name: &'static str },
}

impl Error {
    pub(crate) fn from_gl_code(code: GLenum) -> Self {
        let name = match code {
            gl::INVALID_ENUM => "INVALID_ENUM",
            gl::INVALID_VALUE => "INVALID_VALUE",
            gl::INVALID_OPERATION => "INVALID_OPERATION",
            gl::INVALID_FRAMEBUFFER_OPERATION => "INVALID_FRAMEBUFFER_OPERATION",
            gl::OUT_OF_MEMORY => "OUT_OF_MEMORY",
            gl::STACK_OVERFLOW => "STACK_OVERFLOW",
            gl::STACK_UNDERFLOW => "STACK_UNDERFLOW",
            gl::CONTEXT_LOST => "CONTEXT_LOST",
            _ => "unknown error",
        };
        Error::Gl { code, name }
    }

    pub(crate) fn from_framebuffer_status(status: GLenum) -> Self {
        let reason = match status {
            gl::FRAMEBUFFER_INCOMPLETE_ATTACHMENT => "incomplete attachment",
            gl::FRAMEBUFFER_INCOMPLETE_MISSING_ATTACHMENT => "incomplete missing attachment",
            gl::FRAMEBUFFER_INCOMPLETE_DRAW_BUFFER => "incomplete draw buffer",
            gl::FRAMEBUFFER_INCOMPLETE_READ_BUFFER => "incomplete read buffer",
            gl::FRAMEBUFFER_INCOMPLETE_MULTISAMPLE => "incomplete multisample",
            gl::FRAMEBUFFER_INCOMPLETE_LAYER_TARGETS => "incomplete layer targets",
            gl::FRAMEBUFFER_UNDEFINED => "undefined",
            gl::FRAMEBUFFER_UNSUPPORTED => "unsupported",
            _ => "unknown reason",
        };
        Error::FramebufferIncomplete { status, reason }
    }
}
