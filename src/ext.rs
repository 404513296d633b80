//! Extension entry points resolved once per context.
//!
//! Instanced draws are backed by `GL_ANGLE_instanced_arrays`, which context
//! creation has already verified, so those lookups are required. Vertex array
//! objects and multiple draw buffers are optional: a missing pointer disables
//! only the operations that need it.

use std::ffi::c_void;

use crate::egl_ffi;
use crate::errors::{Error, Result};
use crate::gles_ffi as gl;

pub(crate) struct ExtProcs {
    pub draw_arrays_instanced: gl::DrawArraysInstancedProc,
    pub draw_elements_instanced: gl::DrawElementsInstancedProc,
    pub vertex_attrib_divisor: gl::VertexAttribDivisorProc,

    pub gen_vertex_arrays: Option<gl::GenVertexArraysProc>,
    pub delete_vertex_arrays: Option<gl::DeleteVertexArraysProc>,
    pub bind_vertex_array: Option<gl::BindVertexArrayProc>,
    pub is_vertex_array: Option<gl::IsVertexArrayProc>,

    pub draw_buffers: Option<gl::DrawBuffersProc>,
}

// NOTE: eglGetProcAddress may return a non-null pointer even when the
// extension is not supported; required lookups are therefore paired with the
// extension-string verification done during context creation.
fn lookup<T>(name: &'static [u8]) -> Option<T> {
    debug_assert!(name.ends_with(b"\0"));
    let ptr = unsafe { egl_ffi::eglGetProcAddress(name.as_ptr() as *const _) };
    if ptr.is_null() {
        return None;
    }
    Some(unsafe { std::mem::transmute_copy::<*mut c_void, T>(&ptr) })
}

fn lookup_required<T>(name: &'static [u8], label: &'static str) -> Result<T> {
    lookup(name).ok_or(Error::MissingProc(label))
}

impl ExtProcs {
    pub(crate) fn load() -> Result<Self> {
        Ok(Self {
            draw_arrays_instanced: lookup_required(
                b"glDrawArraysInstancedANGLE\0",
                "glDrawArraysInstancedANGLE",
            )?,
            draw_elements_instanced: lookup_required(
                b"glDrawElementsInstancedANGLE\0",
                "glDrawElementsInstancedANGLE",
            )?,
            vertex_attrib_divisor: lookup_required(
                b"glVertexAttribDivisorANGLE\0",
                "glVertexAttribDivisorANGLE",
            )?,

            gen_vertex_arrays: lookup(b"glGenVertexArraysOES\0"),
            delete_vertex_arrays: lookup(b"glDeleteVertexArraysOES\0"),
            bind_vertex_array: lookup(b"glBindVertexArrayOES\0"),
            is_vertex_array: lookup(b"glIsVertexArrayOES\0"),

            draw_buffers: lookup(b"glDrawBuffersEXT\0"),
        })
    }
}
