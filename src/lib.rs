//! Typed, RAII handles over OpenGL, OpenGL ES 3 and WebGL 2 objects.
//!
//! Every handle owns a GL name, binds itself lazily through `ensure`, and deletes its object when
//! dropped. The GL entry points themselves sit behind the [`Backend`] traits, so the same
//! handles drive a native context, a WebGL 2 canvas, or the call-recording [`RecordingGl`].

#![deny(bare_trait_objects)]

/// Generated GL 4.5 compatibility-profile bindings.
#[allow(
    clippy::all,
    non_upper_case_globals,
    non_snake_case,
    non_camel_case_types,
    dead_code,
    missing_docs,
    unused_parens
)]
pub mod gl {
    include!(concat!(env!("OUT_DIR"), "/gl_bindings.rs"));
}

mod backend;
mod binding;
mod buffer;
mod context;
mod error;
mod fixed_function;
mod framebuffer;
mod lighting;
mod native;
mod rect;
pub mod recording;
mod surface;
mod texture;
#[cfg(all(target_arch = "wasm32", feature = "webgl"))]
mod webgl;

pub use crate::backend::*;
pub use crate::binding::*;
pub use crate::buffer::*;
pub use crate::context::*;
pub use crate::error::*;
pub use crate::fixed_function::*;
pub use crate::framebuffer::*;
pub use crate::lighting::*;
pub use crate::native::*;
pub use crate::rect::*;
pub use crate::surface::*;
pub use crate::texture::*;
#[cfg(all(target_arch = "wasm32", feature = "webgl"))]
pub use crate::webgl::*;
pub use recording::RecordingGl;
