//! Raw EGL 1.4 bindings, limited to what pbuffer-backed contexts need.

use std::ffi::{c_char, c_uint, c_void};

pub type EGLBoolean = c_uint;
pub type EGLenum = c_uint;
pub type EGLint = i32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(transparent)]
pub struct EGLDisplay(pub *mut c_void);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(transparent)]
pub struct EGLConfig(pub *mut c_void);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(transparent)]
pub struct EGLContext(pub *mut c_void);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(transparent)]
pub struct EGLSurface(pub *mut c_void);

pub const EGL_ALPHA_SIZE: EGLint = 0x3021;
pub const EGL_BAD_ACCESS: EGLint = 0x3002;
pub const EGL_BAD_ALLOC: EGLint = 0x3003;
pub const EGL_BAD_ATTRIBUTE: EGLint = 0x3004;
pub const EGL_BAD_CONFIG: EGLint = 0x3005;
pub const EGL_BAD_CONTEXT: EGLint = 0x3006;
pub const EGL_BAD_CURRENT_SURFACE: EGLint = 0x3007;
pub const EGL_BAD_DISPLAY: EGLint = 0x3008;
pub const EGL_BAD_MATCH: EGLint = 0x3009;
pub const EGL_BAD_NATIVE_PIXMAP: EGLint = 0x300A;
pub const EGL_BAD_NATIVE_WINDOW: EGLint = 0x300B;
pub const EGL_BAD_PARAMETER: EGLint = 0x300C;
pub const EGL_BAD_SURFACE: EGLint = 0x300D;
pub const EGL_BLUE_SIZE: EGLint = 0x3022;
pub const EGL_CONTEXT_CLIENT_VERSION: EGLint = 0x3098;
pub const EGL_CONTEXT_LOST: EGLint = 0x300E;
pub const EGL_DEFAULT_DISPLAY: *mut c_void = std::ptr::null_mut();
pub const EGL_DEPTH_SIZE: EGLint = 0x3025;
pub const EGL_FALSE: EGLBoolean = 0;
pub const EGL_GREEN_SIZE: EGLint = 0x3023;
pub const EGL_HEIGHT: EGLint = 0x3056;
pub const EGL_NO_CONTEXT: EGLContext = EGLContext(std::ptr::null_mut());
pub const EGL_NO_DISPLAY: EGLDisplay = EGLDisplay(std::ptr::null_mut());
pub const EGL_NO_SURFACE: EGLSurface = EGLSurface(std::ptr::null_mut());
pub const EGL_NONE: EGLint = 0x3038;
pub const EGL_NOT_INITIALIZED: EGLint = 0x3001;
pub const EGL_PBUFFER_BIT: EGLint = 0x0001;
pub const EGL_RED_SIZE: EGLint = 0x3024;
pub const EGL_STENCIL_SIZE: EGLint = 0x3026;
pub const EGL_SUCCESS: EGLint = 0x3000;
pub const EGL_SURFACE_TYPE: EGLint = 0x3033;
pub const EGL_TRUE: EGLBoolean = 1;
pub const EGL_WIDTH: EGLint = 0x3057;

#[link(name = "EGL")]
extern "C" {
    pub fn eglGetDisplay(native_display: *mut c_void) -> EGLDisplay;

    pub fn eglInitialize(dpy: EGLDisplay, major: *mut EGLint, minor: *mut EGLint) -> EGLBoolean;

    pub fn eglTerminate(dpy: EGLDisplay) -> EGLBoolean;

    pub fn eglChooseConfig(
        dpy: EGLDisplay,
        attrib_list: *const EGLint,
        configs: *mut EGLConfig,
        config_size: EGLint,
        num_config: *mut EGLint,
    ) -> EGLBoolean;

    pub fn eglCreateContext(
        dpy: EGLDisplay,
        config: EGLConfig,
        share_context: EGLContext,
        attrib_list: *const EGLint,
    ) -> EGLContext;

    pub fn eglDestroyContext(dpy: EGLDisplay, context: EGLContext) -> EGLBoolean;

    pub fn eglCreatePbufferSurface(
        dpy: EGLDisplay,
        config: EGLConfig,
        attrib_list: *const EGLint,
    ) -> EGLSurface;

    pub fn eglDestroySurface(dpy: EGLDisplay, surface: EGLSurface) -> EGLBoolean;

    pub fn eglMakeCurrent(
        dpy: EGLDisplay,
        draw: EGLSurface,
        read: EGLSurface,
        context: EGLContext,
    ) -> EGLBoolean;

    pub fn eglGetProcAddress(procname: *const c_char) -> *mut c_void;

    pub fn eglGetError() -> EGLint;
}
