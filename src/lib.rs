//! Headless OpenGL ES 2.0 rendering contexts with WebGL semantics.
//!
//! Each [`Context`] renders into an off-screen EGL pbuffer surface; no window
//! system is involved. The crate layers the WebGL-specific behaviors GLES 2.0
//! lacks on top of the raw API: pixel unpacking (vertical flip, alpha
//! premultiplication), the combined depth-stencil attachment point, depth
//! format negotiation, and a dual error channel that lets validation errors
//! coexist with the driver's own error queue.
//!
//! All contexts share one lazily initialized EGL display and are tracked in a
//! process-wide registry. Calls on any context transparently make it current
//! first, so several live contexts can be used interleaved from one thread.
//! Cross-thread use is not supported.
//!
//! The driver must support `GL_OES_packed_depth_stencil` and
//! `GL_ANGLE_instanced_arrays`; context creation fails otherwise.
//! `GL_OES_vertex_array_object` and `GL_EXT_draw_buffers` are optional and
//! only gate their own operations.
//!
//! Set `HEADLESS_GLES_DEBUG=1` to trace lifecycle transitions to stderr.

#![deny(unsafe_op_in_unsafe_fn)]

mod context;
mod debug;
mod display;
mod errors;
mod ext;
mod extensions;
mod objects;
mod params;
mod pixels;

pub mod egl_ffi;
pub mod gles_ffi;

pub use context::{
    ActiveInfo, Context, ContextAttributes, ContextState, ShaderPrecisionFormat,
    REQUIRED_EXTENSIONS,
};
pub use display::dispose_all;
pub use errors::{EglError, Error, Result};
pub use params::Parameter;

/// Create a headless context with a pbuffer surface of the given size.
///
/// The first call opens and initializes the shared EGL display. The new
/// context is made current and becomes the active context of the thread.
/// Fails without touching the driver if either dimension is not positive.
pub fn create_context(width: i32, height: i32, attrs: &ContextAttributes) -> Result<Context> {
    Context::new(width, height, attrs)
}
