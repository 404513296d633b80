//! Context lifecycle and the per-context operation surface.
//!
//! A [`Context`] owns one EGL context bound to an off-screen pbuffer surface.
//! Every driver-touching method first makes its context current (rebinding
//! only when another context holds the driver), so callers can interleave
//! calls on several live contexts freely.

use std::cell::RefCell;
use std::ffi::CString;
use std::rc::Rc;

use crate::debug::trace;
use crate::display;
use crate::egl_ffi as egl;
use crate::errors::{EglError, Error, Result};
use crate::ext::ExtProcs;
use crate::extensions::GlExtensions;
use crate::gles_ffi as gl;
use crate::gles_ffi::{GLbitfield, GLboolean, GLclampf, GLenum, GLfloat, GLint, GLintptr, GLsizei, GLsizeiptr, GLuint};
use crate::objects::{ObjectKind, ObjectRegistry};
use crate::params::{classify, ParamClass, Parameter};
use crate::pixels::{self, UnpackState};

/// Extensions every context must expose; creation fails without them.
pub const REQUIRED_EXTENSIONS: [&str; 2] =
    ["GL_OES_packed_depth_stencil", "GL_ANGLE_instanced_arrays"];

/// Lifecycle state of a context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextState {
    /// Created but not yet registered. Never observable through the public API.
    Init,
    /// Fully negotiated and usable.
    Ok,
    /// Disposed; all driver handles are gone.
    Destroyed,
    /// A rebind failed. The context cannot execute calls but may still be
    /// disposed.
    Error,
}

/// Creation-time options, recorded verbatim for later queries.
///
/// The underlying pbuffer configuration is fixed (8-bit RGBA, 24-bit depth,
/// 8-bit stencil), so these do not alter surface selection.
#[derive(Debug, Clone, Copy)]
pub struct ContextAttributes {
    pub alpha: bool,
    pub depth: bool,
    pub stencil: bool,
    pub antialias: bool,
    pub premultiplied_alpha: bool,
    pub preserve_drawing_buffer: bool,
    pub prefer_low_power: bool,
    pub fail_on_major_performance_caveat: bool,
}

impl Default for ContextAttributes {
    fn default() -> Self {
        Self {
            alpha: true,
            depth: true,
            stencil: false,
            antialias: true,
            premultiplied_alpha: true,
            preserve_drawing_buffer: false,
            prefer_low_power: false,
            fail_on_major_performance_caveat: false,
        }
    }
}

/// Result of an active attribute or uniform query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveInfo {
    pub name: String,
    pub size: GLint,
    pub type_: GLenum,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShaderPrecisionFormat {
    pub range_min: GLint,
    pub range_max: GLint,
    pub precision: GLint,
}

pub(crate) type ContextShared = Rc<RefCell<ContextInner>>;

pub(crate) struct ContextInner {
    id: display::ContextId,
    state: ContextState,
    raw_display: egl::EGLDisplay,
    raw_context: egl::EGLContext,
    raw_surface: egl::EGLSurface,
    width: i32,
    height: i32,
    attrs: ContextAttributes,
    unpack: UnpackState,
    preferred_depth_format: GLenum,
    sticky_error: GLenum,
    objects: ObjectRegistry,
    extensions: GlExtensions,
    ext: ExtProcs,
}

/// Whether a candidate error may reach the sticky latch. `GL_NO_ERROR` never
/// latches and an occupied latch is never overwritten; in both cases the
/// driver's own error queue must be left untouched, so this runs before any
/// poll.
fn should_latch(current: GLenum, candidate: GLenum) -> bool {
    candidate != gl::GL_NO_ERROR && current == gl::GL_NO_ERROR
}

/// One read of the dual error channel: a latched error wins and is cleared,
/// otherwise the freshly polled driver code is reported. The driver is polled
/// either way, so a stale driver error cannot outlive the read that the latch
/// preempted.
fn consume_error(latch: &mut GLenum, driver: GLenum) -> GLenum {
    if *latch != gl::GL_NO_ERROR {
        std::mem::replace(latch, gl::GL_NO_ERROR)
    } else {
        driver
    }
}

/// GLES 2.0 has no combined depth-stencil attachment point; the WebGL enum
/// expands into the two native ones.
fn expand_attachment(attachment: GLenum) -> (GLenum, Option<GLenum>) {
    if attachment == gl::GL_DEPTH_STENCIL_ATTACHMENT_WEBGL {
        (gl::GL_DEPTH_ATTACHMENT, Some(gl::GL_STENCIL_ATTACHMENT))
    } else {
        (attachment, None)
    }
}

fn remap_storage_format(internalformat: GLenum, preferred_depth: GLenum) -> GLenum {
    match internalformat {
        gl::GL_DEPTH_STENCIL_OES => gl::GL_DEPTH24_STENCIL8_OES,
        gl::GL_DEPTH_COMPONENT32_OES => preferred_depth,
        other => other,
    }
}

/// Deepest depth renderbuffer format the driver advertises.
fn preferred_depth_format(exts: &GlExtensions) -> GLenum {
    if exts.contains("GL_OES_depth32") {
        gl::GL_DEPTH_COMPONENT32_OES
    } else if exts.contains("GL_OES_depth24") {
        gl::GL_DEPTH_COMPONENT24_OES
    } else {
        gl::GL_DEPTH_COMPONENT16
    }
}

/// Pick the unique EGLConfig for an 8-bit RGBA, 24-bit depth, 8-bit stencil
/// pbuffer. Zero or more than one match is a hard failure; rendering results
/// must not depend on an arbitrary driver ordering.
fn choose_config(dpy: egl::EGLDisplay) -> Result<egl::EGLConfig> {
    #[rustfmt::skip]
    let attribs = [
        egl::EGL_SURFACE_TYPE, egl::EGL_PBUFFER_BIT,
        egl::EGL_RED_SIZE, 8,
        egl::EGL_GREEN_SIZE, 8,
        egl::EGL_BLUE_SIZE, 8,
        egl::EGL_ALPHA_SIZE, 8,
        egl::EGL_DEPTH_SIZE, 24,
        egl::EGL_STENCIL_SIZE, 8,
        egl::EGL_NONE,
    ];

    let mut count: egl::EGLint = 0;
    if unsafe {
        egl::eglChooseConfig(dpy, attribs.as_ptr(), std::ptr::null_mut(), 0, &mut count)
    } != egl::EGL_TRUE
        || count != 1
    {
        return Err(Error::Config);
    }

    let mut config = egl::EGLConfig(std::ptr::null_mut());
    let mut returned: egl::EGLint = 0;
    if unsafe { egl::eglChooseConfig(dpy, attribs.as_ptr(), &mut config, 1, &mut returned) }
        != egl::EGL_TRUE
        || returned != 1
    {
        return Err(Error::Config);
    }
    Ok(config)
}

/// Release the thread's current binding. Must only run when the binding
/// belongs to the context being torn down; another context's binding stays.
fn unbind(dpy: egl::EGLDisplay) {
    unsafe {
        egl::eglMakeCurrent(dpy, egl::EGL_NO_SURFACE, egl::EGL_NO_SURFACE, egl::EGL_NO_CONTEXT);
    }
    display::set_active(None);
}

fn destroy_egl(dpy: egl::EGLDisplay, surface: egl::EGLSurface, context: egl::EGLContext) {
    unsafe {
        if surface != egl::EGL_NO_SURFACE {
            egl::eglDestroySurface(dpy, surface);
        }
        if context != egl::EGL_NO_CONTEXT {
            egl::eglDestroyContext(dpy, context);
        }
    }
}

impl ContextInner {
    /// Make this context current unless it already is. A rebind failure
    /// poisons the context; later calls fail fast without touching the driver.
    pub(crate) fn ensure_active(&mut self) -> Result<()> {
        match self.state {
            ContextState::Ok => {}
            state => return Err(Error::Defunct(state)),
        }
        if display::active() == Some(self.id) {
            return Ok(());
        }
        if unsafe {
            egl::eglMakeCurrent(self.raw_display, self.raw_surface, self.raw_surface, self.raw_context)
        } != egl::EGL_TRUE
        {
            self.state = ContextState::Error;
            display::set_active(None);
            return Err(Error::Bind(EglError::last()));
        }
        display::set_active(Some(self.id));
        trace!("context {:?} made current", self.id);
        Ok(())
    }

    fn latch_error(&mut self, error: GLenum) {
        if !should_latch(self.sticky_error, error) {
            return;
        }
        // A pending driver error still wins over the candidate.
        if unsafe { gl::glGetError() } == gl::GL_NO_ERROR {
            self.sticky_error = error;
        }
    }

    /// Release every driver resource this context owns. Safe to call twice;
    /// the second call returns immediately.
    pub(crate) fn dispose(&mut self) {
        if self.state == ContextState::Destroyed {
            return;
        }
        display::unregister(self.id);

        if self.state == ContextState::Ok && display::active() != Some(self.id) {
            if unsafe {
                egl::eglMakeCurrent(
                    self.raw_display,
                    self.raw_surface,
                    self.raw_surface,
                    self.raw_context,
                )
            } != egl::EGL_TRUE
            {
                self.state = ContextState::Error;
                display::set_active(None);
                return;
            }
            display::set_active(Some(self.id));
        }
        self.state = ContextState::Destroyed;

        if display::active() == Some(self.id) {
            for (handle, kind) in self.objects.take() {
                match kind {
                    ObjectKind::Buffer => unsafe { gl::glDeleteBuffers(1, &handle) },
                    ObjectKind::Framebuffer => unsafe { gl::glDeleteFramebuffers(1, &handle) },
                    ObjectKind::Program => unsafe { gl::glDeleteProgram(handle) },
                    ObjectKind::Renderbuffer => unsafe { gl::glDeleteRenderbuffers(1, &handle) },
                    ObjectKind::Shader => unsafe { gl::glDeleteShader(handle) },
                    ObjectKind::Texture => unsafe { gl::glDeleteTextures(1, &handle) },
                    ObjectKind::VertexArray => {
                        if let Some(delete) = self.ext.delete_vertex_arrays {
                            unsafe { delete(1, &handle) };
                        }
                    }
                }
            }
            unbind(self.raw_display);
        } else {
            self.objects.take();
        }

        destroy_egl(self.raw_display, self.raw_surface, self.raw_context);
        self.raw_surface = egl::EGL_NO_SURFACE;
        self.raw_context = egl::EGL_NO_CONTEXT;
        trace!("context {:?} disposed", self.id);
    }
}

/// A headless GLES 2.0 rendering context backed by a pbuffer surface.
pub struct Context {
    inner: ContextShared,
}

impl Context {
    pub(crate) fn new(width: i32, height: i32, attrs: &ContextAttributes) -> Result<Self> {
        if width <= 0 || height <= 0 {
            return Err(Error::BadDimensions);
        }

        let dpy = display::acquire()?;
        let config = choose_config(dpy)?;

        let context_attribs = [egl::EGL_CONTEXT_CLIENT_VERSION, 2, egl::EGL_NONE];
        let raw_context =
            unsafe { egl::eglCreateContext(dpy, config, egl::EGL_NO_CONTEXT, context_attribs.as_ptr()) };
        if raw_context == egl::EGL_NO_CONTEXT {
            return Err(Error::ContextCreation(EglError::last()));
        }

        #[rustfmt::skip]
        let surface_attribs = [
            egl::EGL_WIDTH, width,
            egl::EGL_HEIGHT, height,
            egl::EGL_NONE,
        ];
        let raw_surface =
            unsafe { egl::eglCreatePbufferSurface(dpy, config, surface_attribs.as_ptr()) };
        if raw_surface == egl::EGL_NO_SURFACE {
            let err = EglError::last();
            destroy_egl(dpy, egl::EGL_NO_SURFACE, raw_context);
            return Err(Error::Surface(err));
        }

        // A failed eglMakeCurrent leaves the previous binding in place, so the
        // formerly active context stays both bound and tracked.
        if unsafe { egl::eglMakeCurrent(dpy, raw_surface, raw_surface, raw_context) }
            != egl::EGL_TRUE
        {
            let err = EglError::last();
            destroy_egl(dpy, raw_surface, raw_context);
            return Err(Error::Bind(err));
        }
        // The half-built context is now the thread's binding; from here on,
        // failure cleanup must unbind before destroying.
        display::set_active(None);

        let extensions = GlExtensions::query();
        for required in REQUIRED_EXTENSIONS {
            if let Err(e) = extensions.require(required) {
                unbind(dpy);
                destroy_egl(dpy, raw_surface, raw_context);
                return Err(e);
            }
        }

        let ext = match ExtProcs::load() {
            Ok(ext) => ext,
            Err(e) => {
                unbind(dpy);
                destroy_egl(dpy, raw_surface, raw_context);
                return Err(e);
            }
        };

        let id = display::next_context_id();
        let inner = Rc::new(RefCell::new(ContextInner {
            id,
            state: ContextState::Init,
            raw_display: dpy,
            raw_context,
            raw_surface,
            width,
            height,
            attrs: *attrs,
            unpack: UnpackState::default(),
            preferred_depth_format: preferred_depth_format(&extensions),
            sticky_error: gl::GL_NO_ERROR,
            objects: ObjectRegistry::default(),
            extensions,
            ext,
        }));
        inner.borrow_mut().state = ContextState::Ok;
        display::register(id, Rc::clone(&inner));
        display::set_active(Some(id));
        trace!("context {id:?} created ({width}x{height})");

        Ok(Self { inner })
    }

    fn with_active<R>(&self, f: impl FnOnce(&mut ContextInner) -> R) -> Result<R> {
        let mut me = self.inner.borrow_mut();
        me.ensure_active()?;
        Ok(f(&mut me))
    }

    pub fn state(&self) -> ContextState {
        self.inner.borrow().state
    }

    pub fn attributes(&self) -> ContextAttributes {
        self.inner.borrow().attrs
    }

    pub fn drawing_buffer_width(&self) -> i32 {
        self.inner.borrow().width
    }

    pub fn drawing_buffer_height(&self) -> i32 {
        self.inner.borrow().height
    }

    /// Release all driver resources. Idempotent; afterwards every other
    /// method fails with [`Error::Defunct`].
    pub fn dispose(&self) {
        self.inner.borrow_mut().dispose();
    }

    // ---- Error channels ----------------------------------------------------

    /// Latch an error for the next [`Context::error`] call. Ignored when
    /// `error` is `GL_NO_ERROR`, another error is already latched, or the
    /// driver has its own error pending.
    pub fn set_error(&self, error: GLenum) -> Result<()> {
        self.with_active(|me| me.latch_error(error))
    }

    /// Pop the next pending error: a latched one takes precedence (and is
    /// cleared), otherwise the freshly polled driver code is returned. The
    /// driver is polled on every call; a polled code the latch outranks is
    /// discarded rather than left pending.
    pub fn error(&self) -> Result<GLenum> {
        self.with_active(|me| {
            let driver = unsafe { gl::glGetError() };
            consume_error(&mut me.sticky_error, driver)
        })
    }

    /// Peek the latched error without clearing it or touching the driver.
    pub fn last_error(&self) -> GLenum {
        self.inner.borrow().sticky_error
    }

    /// Poll the driver directly, bypassing the latch.
    pub fn driver_error(&self) -> Result<GLenum> {
        self.with_active(|_| unsafe { gl::glGetError() })
    }

    // ---- Object lifecycle --------------------------------------------------

    pub fn create_buffer(&self) -> Result<GLuint> {
        self.with_active(|me| {
            let mut handle = 0;
            unsafe { gl::glGenBuffers(1, &mut handle) };
            me.objects.register(ObjectKind::Buffer, handle);
            handle
        })
    }

    pub fn delete_buffer(&self, handle: GLuint) -> Result<()> {
        self.with_active(|me| {
            me.objects.unregister(ObjectKind::Buffer, handle);
            unsafe { gl::glDeleteBuffers(1, &handle) };
        })
    }

    pub fn create_framebuffer(&self) -> Result<GLuint> {
        self.with_active(|me| {
            let mut handle = 0;
            unsafe { gl::glGenFramebuffers(1, &mut handle) };
            me.objects.register(ObjectKind::Framebuffer, handle);
            handle
        })
    }

    pub fn delete_framebuffer(&self, handle: GLuint) -> Result<()> {
        self.with_active(|me| {
            me.objects.unregister(ObjectKind::Framebuffer, handle);
            unsafe { gl::glDeleteFramebuffers(1, &handle) };
        })
    }

    pub fn create_program(&self) -> Result<GLuint> {
        self.with_active(|me| {
            let handle = unsafe { gl::glCreateProgram() };
            me.objects.register(ObjectKind::Program, handle);
            handle
        })
    }

    pub fn delete_program(&self, handle: GLuint) -> Result<()> {
        self.with_active(|me| {
            me.objects.unregister(ObjectKind::Program, handle);
            unsafe { gl::glDeleteProgram(handle) };
        })
    }

    pub fn create_renderbuffer(&self) -> Result<GLuint> {
        self.with_active(|me| {
            let mut handle = 0;
            unsafe { gl::glGenRenderbuffers(1, &mut handle) };
            me.objects.register(ObjectKind::Renderbuffer, handle);
            handle
        })
    }

    pub fn delete_renderbuffer(&self, handle: GLuint) -> Result<()> {
        self.with_active(|me| {
            me.objects.unregister(ObjectKind::Renderbuffer, handle);
            unsafe { gl::glDeleteRenderbuffers(1, &handle) };
        })
    }

    pub fn create_shader(&self, type_: GLenum) -> Result<GLuint> {
        self.with_active(|me| {
            let handle = unsafe { gl::glCreateShader(type_) };
            me.objects.register(ObjectKind::Shader, handle);
            handle
        })
    }

    pub fn delete_shader(&self, handle: GLuint) -> Result<()> {
        self.with_active(|me| {
            me.objects.unregister(ObjectKind::Shader, handle);
            unsafe { gl::glDeleteShader(handle) };
        })
    }

    pub fn create_texture(&self) -> Result<GLuint> {
        self.with_active(|me| {
            let mut handle = 0;
            unsafe { gl::glGenTextures(1, &mut handle) };
            me.objects.register(ObjectKind::Texture, handle);
            handle
        })
    }

    pub fn delete_texture(&self, handle: GLuint) -> Result<()> {
        self.with_active(|me| {
            me.objects.unregister(ObjectKind::Texture, handle);
            unsafe { gl::glDeleteTextures(1, &handle) };
        })
    }

    pub fn create_vertex_array(&self) -> Result<GLuint> {
        self.with_active(|me| {
            let Some(gen_arrays) = me.ext.gen_vertex_arrays else {
                me.latch_error(gl::GL_INVALID_OPERATION);
                return 0;
            };
            let mut handle = 0;
            unsafe { gen_arrays(1, &mut handle) };
            me.objects.register(ObjectKind::VertexArray, handle);
            handle
        })
    }

    pub fn delete_vertex_array(&self, handle: GLuint) -> Result<()> {
        self.with_active(|me| {
            let Some(delete) = me.ext.delete_vertex_arrays else {
                me.latch_error(gl::GL_INVALID_OPERATION);
                return;
            };
            me.objects.unregister(ObjectKind::VertexArray, handle);
            unsafe { delete(1, &handle) };
        })
    }

    pub fn bind_vertex_array(&self, handle: GLuint) -> Result<()> {
        self.with_active(|me| {
            let Some(bind) = me.ext.bind_vertex_array else {
                me.latch_error(gl::GL_INVALID_OPERATION);
                return;
            };
            unsafe { bind(handle) };
        })
    }

    pub fn is_buffer(&self, handle: GLuint) -> Result<bool> {
        self.with_active(|_| unsafe { gl::glIsBuffer(handle) } == gl::GL_TRUE)
    }

    pub fn is_framebuffer(&self, handle: GLuint) -> Result<bool> {
        self.with_active(|_| unsafe { gl::glIsFramebuffer(handle) } == gl::GL_TRUE)
    }

    pub fn is_program(&self, handle: GLuint) -> Result<bool> {
        self.with_active(|_| unsafe { gl::glIsProgram(handle) } == gl::GL_TRUE)
    }

    pub fn is_renderbuffer(&self, handle: GLuint) -> Result<bool> {
        self.with_active(|_| unsafe { gl::glIsRenderbuffer(handle) } == gl::GL_TRUE)
    }

    pub fn is_shader(&self, handle: GLuint) -> Result<bool> {
        self.with_active(|_| unsafe { gl::glIsShader(handle) } == gl::GL_TRUE)
    }

    pub fn is_texture(&self, handle: GLuint) -> Result<bool> {
        self.with_active(|_| unsafe { gl::glIsTexture(handle) } == gl::GL_TRUE)
    }

    pub fn is_vertex_array(&self, handle: GLuint) -> Result<bool> {
        self.with_active(|me| match me.ext.is_vertex_array {
            Some(is) => (unsafe { is(handle) }) == gl::GL_TRUE,
            None => {
                me.latch_error(gl::GL_INVALID_OPERATION);
                false
            }
        })
    }

    // ---- Pixel path --------------------------------------------------------

    /// Record or forward a pixel-store parameter. The WebGL pseudo-enums are
    /// stored locally and never reach the driver.
    pub fn pixel_storei(&self, pname: GLenum, param: GLint) -> Result<()> {
        self.with_active(|me| match pname {
            gl::GL_UNPACK_FLIP_Y_WEBGL => me.unpack.flip_y = param != 0,
            gl::GL_UNPACK_PREMULTIPLY_ALPHA_WEBGL => me.unpack.premultiply_alpha = param != 0,
            gl::GL_UNPACK_COLORSPACE_CONVERSION_WEBGL => me.unpack.colorspace_conversion = param,
            gl::GL_UNPACK_ALIGNMENT => {
                me.unpack.alignment = param;
                unsafe { gl::glPixelStorei(pname, param) };
            }
            gl::GL_PACK_ALIGNMENT => {
                me.unpack.pack_alignment = param;
                unsafe { gl::glPixelStorei(pname, param) };
            }
            _ => unsafe { gl::glPixelStorei(pname, param) },
        })
    }

    /// Upload one texture level. With no pixel source a zeroed image of the
    /// requested size is uploaded. A source shorter than one packed image
    /// latches `GL_INVALID_OPERATION` and uploads nothing.
    #[allow(clippy::too_many_arguments)]
    pub fn tex_image_2d(
        &self,
        target: GLenum,
        level: GLint,
        internalformat: GLint,
        width: GLsizei,
        height: GLsizei,
        border: GLint,
        format: GLenum,
        type_: GLenum,
        pixels: Option<&[u8]>,
    ) -> Result<()> {
        self.with_active(|me| {
            let (w, h) = (width.max(0) as usize, height.max(0) as usize);
            let needed = pixels::image_size(type_, format, w, h, me.unpack.alignment);
            let upload = |data: *const std::ffi::c_void| unsafe {
                gl::glTexImage2D(target, level, internalformat, width, height, border, format, type_, data);
            };
            match pixels {
                None => upload(vec![0u8; needed].as_ptr().cast()),
                Some(src) if src.len() < needed => me.latch_error(gl::GL_INVALID_OPERATION),
                Some(src) if me.unpack.is_active() => {
                    let transformed = pixels::unpack(&me.unpack, type_, format, w, h, src);
                    upload(transformed.as_ptr().cast());
                }
                Some(src) => upload(src.as_ptr().cast()),
            }
        })
    }

    #[allow(clippy::too_many_arguments)]
    pub fn tex_sub_image_2d(
        &self,
        target: GLenum,
        level: GLint,
        xoffset: GLint,
        yoffset: GLint,
        width: GLsizei,
        height: GLsizei,
        format: GLenum,
        type_: GLenum,
        pixels: &[u8],
    ) -> Result<()> {
        self.with_active(|me| {
            let (w, h) = (width.max(0) as usize, height.max(0) as usize);
            let needed = pixels::image_size(type_, format, w, h, me.unpack.alignment);
            if pixels.len() < needed {
                me.latch_error(gl::GL_INVALID_OPERATION);
                return;
            }
            let upload = |data: *const std::ffi::c_void| unsafe {
                gl::glTexSubImage2D(target, level, xoffset, yoffset, width, height, format, type_, data);
            };
            if me.unpack.is_active() {
                let transformed = pixels::unpack(&me.unpack, type_, format, w, h, pixels);
                upload(transformed.as_ptr().cast());
            } else {
                upload(pixels.as_ptr().cast());
            }
        })
    }

    /// Read back from the bound framebuffer into `dest`. A destination
    /// shorter than one packed image latches `GL_INVALID_OPERATION` and
    /// leaves `dest` untouched.
    pub fn read_pixels(
        &self,
        x: GLint,
        y: GLint,
        width: GLsizei,
        height: GLsizei,
        format: GLenum,
        type_: GLenum,
        dest: &mut [u8],
    ) -> Result<()> {
        self.with_active(|me| {
            let (w, h) = (width.max(0) as usize, height.max(0) as usize);
            // The driver pads readback rows to GL_PACK_ALIGNMENT, not to the
            // unpack alignment.
            let needed = pixels::image_size(type_, format, w, h, me.unpack.pack_alignment);
            if dest.len() < needed {
                me.latch_error(gl::GL_INVALID_OPERATION);
                return;
            }
            unsafe { gl::glReadPixels(x, y, width, height, format, type_, dest.as_mut_ptr().cast()) };
        })
    }

    // ---- Framebuffers and renderbuffers ------------------------------------

    pub fn bind_framebuffer(&self, target: GLenum, handle: GLuint) -> Result<()> {
        self.with_active(|_| unsafe { gl::glBindFramebuffer(target, handle) })
    }

    pub fn bind_renderbuffer(&self, target: GLenum, handle: GLuint) -> Result<()> {
        self.with_active(|_| unsafe { gl::glBindRenderbuffer(target, handle) })
    }

    pub fn framebuffer_texture_2d(
        &self,
        target: GLenum,
        attachment: GLenum,
        textarget: GLenum,
        texture: GLuint,
        level: GLint,
    ) -> Result<()> {
        self.with_active(|_| {
            let (first, second) = expand_attachment(attachment);
            unsafe { gl::glFramebufferTexture2D(target, first, textarget, texture, level) };
            if let Some(second) = second {
                unsafe { gl::glFramebufferTexture2D(target, second, textarget, texture, level) };
            }
        })
    }

    pub fn framebuffer_renderbuffer(
        &self,
        target: GLenum,
        attachment: GLenum,
        renderbuffertarget: GLenum,
        renderbuffer: GLuint,
    ) -> Result<()> {
        self.with_active(|_| {
            let (first, second) = expand_attachment(attachment);
            unsafe { gl::glFramebufferRenderbuffer(target, first, renderbuffertarget, renderbuffer) };
            if let Some(second) = second {
                unsafe {
                    gl::glFramebufferRenderbuffer(target, second, renderbuffertarget, renderbuffer)
                };
            }
        })
    }

    pub fn renderbuffer_storage(
        &self,
        target: GLenum,
        internalformat: GLenum,
        width: GLsizei,
        height: GLsizei,
    ) -> Result<()> {
        self.with_active(|me| {
            let format = remap_storage_format(internalformat, me.preferred_depth_format);
            unsafe { gl::glRenderbufferStorage(target, format, width, height) };
        })
    }

    pub fn check_framebuffer_status(&self, target: GLenum) -> Result<GLenum> {
        self.with_active(|_| unsafe { gl::glCheckFramebufferStatus(target) })
    }

    pub fn get_framebuffer_attachment_parameter(
        &self,
        target: GLenum,
        attachment: GLenum,
        pname: GLenum,
    ) -> Result<GLint> {
        self.with_active(|_| {
            // The combined attachment reads through its depth half.
            let (attachment, _) = expand_attachment(attachment);
            let mut value = 0;
            unsafe { gl::glGetFramebufferAttachmentParameteriv(target, attachment, pname, &mut value) };
            value
        })
    }

    pub fn get_renderbuffer_parameter(&self, target: GLenum, pname: GLenum) -> Result<GLint> {
        self.with_active(|_| {
            let mut value = 0;
            unsafe { gl::glGetRenderbufferParameteriv(target, pname, &mut value) };
            value
        })
    }

    pub fn draw_buffers(&self, buffers: &[GLenum]) -> Result<()> {
        self.with_active(|me| {
            let Some(draw_buffers) = me.ext.draw_buffers else {
                me.latch_error(gl::GL_INVALID_OPERATION);
                return;
            };
            unsafe { draw_buffers(buffers.len() as GLsizei, buffers.as_ptr()) };
        })
    }

    // ---- Buffers -----------------------------------------------------------

    pub fn bind_buffer(&self, target: GLenum, handle: GLuint) -> Result<()> {
        self.with_active(|_| unsafe { gl::glBindBuffer(target, handle) })
    }

    pub fn buffer_data(&self, target: GLenum, data: &[u8], usage: GLenum) -> Result<()> {
        self.with_active(|_| unsafe {
            gl::glBufferData(target, data.len() as GLsizeiptr, data.as_ptr().cast(), usage)
        })
    }

    /// Allocate uninitialized buffer storage of the given size.
    pub fn buffer_data_size(&self, target: GLenum, size: GLsizeiptr, usage: GLenum) -> Result<()> {
        self.with_active(|_| unsafe {
            gl::glBufferData(target, size, std::ptr::null(), usage)
        })
    }

    pub fn buffer_sub_data(&self, target: GLenum, offset: GLintptr, data: &[u8]) -> Result<()> {
        self.with_active(|_| unsafe {
            gl::glBufferSubData(target, offset, data.len() as GLsizeiptr, data.as_ptr().cast())
        })
    }

    pub fn get_buffer_parameter(&self, target: GLenum, pname: GLenum) -> Result<GLint> {
        self.with_active(|_| {
            let mut value = 0;
            unsafe { gl::glGetBufferParameteriv(target, pname, &mut value) };
            value
        })
    }

    // ---- Textures ----------------------------------------------------------

    pub fn bind_texture(&self, target: GLenum, handle: GLuint) -> Result<()> {
        self.with_active(|_| unsafe { gl::glBindTexture(target, handle) })
    }

    pub fn active_texture(&self, texture: GLenum) -> Result<()> {
        self.with_active(|_| unsafe { gl::glActiveTexture(texture) })
    }

    pub fn tex_parameteri(&self, target: GLenum, pname: GLenum, param: GLint) -> Result<()> {
        self.with_active(|_| unsafe { gl::glTexParameteri(target, pname, param) })
    }

    pub fn tex_parameterf(&self, target: GLenum, pname: GLenum, param: GLfloat) -> Result<()> {
        self.with_active(|_| unsafe { gl::glTexParameterf(target, pname, param) })
    }

    pub fn get_tex_parameter(&self, target: GLenum, pname: GLenum) -> Result<Parameter> {
        self.with_active(|_| {
            if pname == gl::GL_TEXTURE_MAX_ANISOTROPY_EXT {
                let mut value = 0.0;
                unsafe { gl::glGetTexParameterfv(target, pname, &mut value) };
                Parameter::Float(value)
            } else {
                let mut value = 0;
                unsafe { gl::glGetTexParameteriv(target, pname, &mut value) };
                Parameter::Int(value)
            }
        })
    }

    pub fn generate_mipmap(&self, target: GLenum) -> Result<()> {
        self.with_active(|_| unsafe { gl::glGenerateMipmap(target) })
    }

    #[allow(clippy::too_many_arguments)]
    pub fn copy_tex_image_2d(
        &self,
        target: GLenum,
        level: GLint,
        internalformat: GLenum,
        x: GLint,
        y: GLint,
        width: GLsizei,
        height: GLsizei,
        border: GLint,
    ) -> Result<()> {
        self.with_active(|_| unsafe {
            gl::glCopyTexImage2D(target, level, internalformat, x, y, width, height, border)
        })
    }

    #[allow(clippy::too_many_arguments)]
    pub fn copy_tex_sub_image_2d(
        &self,
        target: GLenum,
        level: GLint,
        xoffset: GLint,
        yoffset: GLint,
        x: GLint,
        y: GLint,
        width: GLsizei,
        height: GLsizei,
    ) -> Result<()> {
        self.with_active(|_| unsafe {
            gl::glCopyTexSubImage2D(target, level, xoffset, yoffset, x, y, width, height)
        })
    }

    // ---- Shaders and programs ----------------------------------------------

    pub fn shader_source(&self, shader: GLuint, source: &str) -> Result<()> {
        self.with_active(|_| {
            // Length-counted upload; the source needs no NUL terminator.
            let ptr = source.as_ptr() as *const gl::GLchar;
            let len = source.len() as GLint;
            unsafe { gl::glShaderSource(shader, 1, &ptr, &len) };
        })
    }

    pub fn compile_shader(&self, shader: GLuint) -> Result<()> {
        self.with_active(|_| unsafe { gl::glCompileShader(shader) })
    }

    pub fn get_shader_parameter(&self, shader: GLuint, pname: GLenum) -> Result<Parameter> {
        self.with_active(|_| {
            let mut value = 0;
            unsafe { gl::glGetShaderiv(shader, pname, &mut value) };
            match pname {
                gl::GL_DELETE_STATUS | gl::GL_COMPILE_STATUS => Parameter::Bool(value != 0),
                _ => Parameter::Int(value),
            }
        })
    }

    pub fn get_shader_info_log(&self, shader: GLuint) -> Result<String> {
        self.with_active(|_| {
            let mut len = 0;
            unsafe { gl::glGetShaderiv(shader, gl::GL_INFO_LOG_LENGTH, &mut len) };
            read_driver_string(len, |cap, written, buf| unsafe {
                gl::glGetShaderInfoLog(shader, cap, written, buf)
            })
        })
    }

    pub fn get_shader_source(&self, shader: GLuint) -> Result<String> {
        self.with_active(|_| {
            let mut len = 0;
            unsafe { gl::glGetShaderiv(shader, gl::GL_SHADER_SOURCE_LENGTH, &mut len) };
            read_driver_string(len, |cap, written, buf| unsafe {
                gl::glGetShaderSource(shader, cap, written, buf)
            })
        })
    }

    pub fn get_shader_precision_format(
        &self,
        shadertype: GLenum,
        precisiontype: GLenum,
    ) -> Result<ShaderPrecisionFormat> {
        self.with_active(|_| {
            let mut range = [0; 2];
            let mut precision = 0;
            unsafe {
                gl::glGetShaderPrecisionFormat(shadertype, precisiontype, range.as_mut_ptr(), &mut precision)
            };
            ShaderPrecisionFormat {
                range_min: range[0],
                range_max: range[1],
                precision,
            }
        })
    }

    pub fn attach_shader(&self, program: GLuint, shader: GLuint) -> Result<()> {
        self.with_active(|_| unsafe { gl::glAttachShader(program, shader) })
    }

    pub fn detach_shader(&self, program: GLuint, shader: GLuint) -> Result<()> {
        self.with_active(|_| unsafe { gl::glDetachShader(program, shader) })
    }

    pub fn link_program(&self, program: GLuint) -> Result<()> {
        self.with_active(|_| unsafe { gl::glLinkProgram(program) })
    }

    pub fn validate_program(&self, program: GLuint) -> Result<()> {
        self.with_active(|_| unsafe { gl::glValidateProgram(program) })
    }

    pub fn use_program(&self, program: GLuint) -> Result<()> {
        self.with_active(|_| unsafe { gl::glUseProgram(program) })
    }

    pub fn get_program_parameter(&self, program: GLuint, pname: GLenum) -> Result<Parameter> {
        self.with_active(|_| {
            let mut value = 0;
            unsafe { gl::glGetProgramiv(program, pname, &mut value) };
            match pname {
                gl::GL_DELETE_STATUS | gl::GL_LINK_STATUS | gl::GL_VALIDATE_STATUS => {
                    Parameter::Bool(value != 0)
                }
                _ => Parameter::Int(value),
            }
        })
    }

    pub fn get_program_info_log(&self, program: GLuint) -> Result<String> {
        self.with_active(|_| {
            let mut len = 0;
            unsafe { gl::glGetProgramiv(program, gl::GL_INFO_LOG_LENGTH, &mut len) };
            read_driver_string(len, |cap, written, buf| unsafe {
                gl::glGetProgramInfoLog(program, cap, written, buf)
            })
        })
    }

    pub fn get_attached_shaders(&self, program: GLuint) -> Result<Vec<GLuint>> {
        self.with_active(|_| {
            let mut count = 0;
            unsafe { gl::glGetProgramiv(program, gl::GL_ATTACHED_SHADERS, &mut count) };
            let mut shaders = vec![0; count.max(0) as usize];
            let mut written = 0;
            unsafe {
                gl::glGetAttachedShaders(program, count, &mut written, shaders.as_mut_ptr())
            };
            shaders.truncate(written.max(0) as usize);
            shaders
        })
    }

    pub fn get_attrib_location(&self, program: GLuint, name: &str) -> Result<GLint> {
        self.with_active(|me| {
            let Ok(name) = CString::new(name) else {
                me.latch_error(gl::GL_INVALID_VALUE);
                return -1;
            };
            unsafe { gl::glGetAttribLocation(program, name.as_ptr()) }
        })
    }

    pub fn bind_attrib_location(&self, program: GLuint, index: GLuint, name: &str) -> Result<()> {
        self.with_active(|me| {
            let Ok(name) = CString::new(name) else {
                me.latch_error(gl::GL_INVALID_VALUE);
                return;
            };
            unsafe { gl::glBindAttribLocation(program, index, name.as_ptr()) };
        })
    }

    pub fn get_uniform_location(&self, program: GLuint, name: &str) -> Result<GLint> {
        self.with_active(|me| {
            let Ok(name) = CString::new(name) else {
                me.latch_error(gl::GL_INVALID_VALUE);
                return -1;
            };
            unsafe { gl::glGetUniformLocation(program, name.as_ptr()) }
        })
    }

    pub fn get_active_attrib(&self, program: GLuint, index: GLuint) -> Result<ActiveInfo> {
        self.with_active(|_| {
            let mut cap = 0;
            unsafe { gl::glGetProgramiv(program, gl::GL_ACTIVE_ATTRIBUTE_MAX_LENGTH, &mut cap) };
            read_active_info(cap, |cap, written, size, type_, buf| unsafe {
                gl::glGetActiveAttrib(program, index, cap, written, size, type_, buf)
            })
        })
    }

    pub fn get_active_uniform(&self, program: GLuint, index: GLuint) -> Result<ActiveInfo> {
        self.with_active(|_| {
            let mut cap = 0;
            unsafe { gl::glGetProgramiv(program, gl::GL_ACTIVE_UNIFORM_MAX_LENGTH, &mut cap) };
            read_active_info(cap, |cap, written, size, type_, buf| unsafe {
                gl::glGetActiveUniform(program, index, cap, written, size, type_, buf)
            })
        })
    }

    /// Read a uniform's current value as up to 16 floats; smaller uniforms
    /// fill a prefix and leave the rest zero.
    pub fn get_uniform(&self, program: GLuint, location: GLint) -> Result<[GLfloat; 16]> {
        self.with_active(|_| {
            let mut values = [0.0; 16];
            unsafe { gl::glGetUniformfv(program, location, values.as_mut_ptr()) };
            values
        })
    }

    // ---- Uniforms ----------------------------------------------------------

    pub fn uniform1f(&self, location: GLint, v0: GLfloat) -> Result<()> {
        self.with_active(|_| unsafe { gl::glUniform1f(location, v0) })
    }

    pub fn uniform2f(&self, location: GLint, v0: GLfloat, v1: GLfloat) -> Result<()> {
        self.with_active(|_| unsafe { gl::glUniform2f(location, v0, v1) })
    }

    pub fn uniform3f(&self, location: GLint, v0: GLfloat, v1: GLfloat, v2: GLfloat) -> Result<()> {
        self.with_active(|_| unsafe { gl::glUniform3f(location, v0, v1, v2) })
    }

    pub fn uniform4f(
        &self,
        location: GLint,
        v0: GLfloat,
        v1: GLfloat,
        v2: GLfloat,
        v3: GLfloat,
    ) -> Result<()> {
        self.with_active(|_| unsafe { gl::glUniform4f(location, v0, v1, v2, v3) })
    }

    pub fn uniform1i(&self, location: GLint, v0: GLint) -> Result<()> {
        self.with_active(|_| unsafe { gl::glUniform1i(location, v0) })
    }

    pub fn uniform2i(&self, location: GLint, v0: GLint, v1: GLint) -> Result<()> {
        self.with_active(|_| unsafe { gl::glUniform2i(location, v0, v1) })
    }

    pub fn uniform3i(&self, location: GLint, v0: GLint, v1: GLint, v2: GLint) -> Result<()> {
        self.with_active(|_| unsafe { gl::glUniform3i(location, v0, v1, v2) })
    }

    pub fn uniform4i(
        &self,
        location: GLint,
        v0: GLint,
        v1: GLint,
        v2: GLint,
        v3: GLint,
    ) -> Result<()> {
        self.with_active(|_| unsafe { gl::glUniform4i(location, v0, v1, v2, v3) })
    }

    pub fn uniform_matrix2fv(&self, location: GLint, transpose: bool, value: &[GLfloat]) -> Result<()> {
        self.with_active(|_| unsafe {
            gl::glUniformMatrix2fv(location, (value.len() / 4) as GLsizei, transpose as GLboolean, value.as_ptr())
        })
    }

    pub fn uniform_matrix3fv(&self, location: GLint, transpose: bool, value: &[GLfloat]) -> Result<()> {
        self.with_active(|_| unsafe {
            gl::glUniformMatrix3fv(location, (value.len() / 9) as GLsizei, transpose as GLboolean, value.as_ptr())
        })
    }

    pub fn uniform_matrix4fv(&self, location: GLint, transpose: bool, value: &[GLfloat]) -> Result<()> {
        self.with_active(|_| unsafe {
            gl::glUniformMatrix4fv(location, (value.len() / 16) as GLsizei, transpose as GLboolean, value.as_ptr())
        })
    }

    // ---- Vertex attributes -------------------------------------------------

    pub fn vertex_attrib1f(&self, index: GLuint, x: GLfloat) -> Result<()> {
        self.with_active(|_| unsafe { gl::glVertexAttrib1f(index, x) })
    }

    pub fn vertex_attrib2f(&self, index: GLuint, x: GLfloat, y: GLfloat) -> Result<()> {
        self.with_active(|_| unsafe { gl::glVertexAttrib2f(index, x, y) })
    }

    pub fn vertex_attrib3f(&self, index: GLuint, x: GLfloat, y: GLfloat, z: GLfloat) -> Result<()> {
        self.with_active(|_| unsafe { gl::glVertexAttrib3f(index, x, y, z) })
    }

    pub fn vertex_attrib4f(
        &self,
        index: GLuint,
        x: GLfloat,
        y: GLfloat,
        z: GLfloat,
        w: GLfloat,
    ) -> Result<()> {
        self.with_active(|_| unsafe { gl::glVertexAttrib4f(index, x, y, z, w) })
    }

    /// Describe an attribute sourced from the bound array buffer; `offset` is
    /// a byte offset into that buffer.
    pub fn vertex_attrib_pointer(
        &self,
        index: GLuint,
        size: GLint,
        type_: GLenum,
        normalized: bool,
        stride: GLsizei,
        offset: GLintptr,
    ) -> Result<()> {
        self.with_active(|_| unsafe {
            gl::glVertexAttribPointer(
                index,
                size,
                type_,
                normalized as GLboolean,
                stride,
                offset as *const std::ffi::c_void,
            )
        })
    }

    pub fn enable_vertex_attrib_array(&self, index: GLuint) -> Result<()> {
        self.with_active(|_| unsafe { gl::glEnableVertexAttribArray(index) })
    }

    pub fn disable_vertex_attrib_array(&self, index: GLuint) -> Result<()> {
        self.with_active(|_| unsafe { gl::glDisableVertexAttribArray(index) })
    }

    pub fn vertex_attrib_divisor(&self, index: GLuint, divisor: GLuint) -> Result<()> {
        self.with_active(|me| unsafe { (me.ext.vertex_attrib_divisor)(index, divisor) })
    }

    /// `None` for names this query does not recognize.
    pub fn get_vertex_attrib(&self, index: GLuint, pname: GLenum) -> Result<Option<Parameter>> {
        self.with_active(|_| match pname {
            gl::GL_CURRENT_VERTEX_ATTRIB => {
                let mut values = [0.0; 4];
                unsafe { gl::glGetVertexAttribfv(index, pname, values.as_mut_ptr()) };
                Some(Parameter::Float4(values))
            }
            gl::GL_VERTEX_ATTRIB_ARRAY_ENABLED | gl::GL_VERTEX_ATTRIB_ARRAY_NORMALIZED => {
                let mut value = 0;
                unsafe { gl::glGetVertexAttribiv(index, pname, &mut value) };
                Some(Parameter::Bool(value != 0))
            }
            gl::GL_VERTEX_ATTRIB_ARRAY_SIZE
            | gl::GL_VERTEX_ATTRIB_ARRAY_STRIDE
            | gl::GL_VERTEX_ATTRIB_ARRAY_TYPE
            | gl::GL_VERTEX_ATTRIB_ARRAY_BUFFER_BINDING => {
                let mut value = 0;
                unsafe { gl::glGetVertexAttribiv(index, pname, &mut value) };
                Some(Parameter::Int(value))
            }
            _ => None,
        })
    }

    pub fn get_vertex_attrib_offset(&self, index: GLuint, pname: GLenum) -> Result<GLsizeiptr> {
        self.with_active(|_| {
            let mut pointer = std::ptr::null_mut();
            unsafe { gl::glGetVertexAttribPointerv(index, pname, &mut pointer) };
            pointer as GLsizeiptr
        })
    }

    // ---- Draws and synchronization -----------------------------------------

    pub fn draw_arrays(&self, mode: GLenum, first: GLint, count: GLsizei) -> Result<()> {
        self.with_active(|_| unsafe { gl::glDrawArrays(mode, first, count) })
    }

    /// `offset` is a byte offset into the bound element array buffer.
    pub fn draw_elements(
        &self,
        mode: GLenum,
        count: GLsizei,
        type_: GLenum,
        offset: GLintptr,
    ) -> Result<()> {
        self.with_active(|_| unsafe {
            gl::glDrawElements(mode, count, type_, offset as *const std::ffi::c_void)
        })
    }

    pub fn draw_arrays_instanced(
        &self,
        mode: GLenum,
        first: GLint,
        count: GLsizei,
        instance_count: GLsizei,
    ) -> Result<()> {
        self.with_active(|me| unsafe {
            (me.ext.draw_arrays_instanced)(mode, first, count, instance_count)
        })
    }

    pub fn draw_elements_instanced(
        &self,
        mode: GLenum,
        count: GLsizei,
        type_: GLenum,
        offset: GLintptr,
        instance_count: GLsizei,
    ) -> Result<()> {
        self.with_active(|me| unsafe {
            (me.ext.draw_elements_instanced)(
                mode,
                count,
                type_,
                offset as *const std::ffi::c_void,
                instance_count,
            )
        })
    }

    pub fn flush(&self) -> Result<()> {
        self.with_active(|_| unsafe { gl::glFlush() })
    }

    pub fn finish(&self) -> Result<()> {
        self.with_active(|_| unsafe { gl::glFinish() })
    }

    // ---- Fixed-function state ----------------------------------------------

    pub fn enable(&self, cap: GLenum) -> Result<()> {
        self.with_active(|_| unsafe { gl::glEnable(cap) })
    }

    pub fn disable(&self, cap: GLenum) -> Result<()> {
        self.with_active(|_| unsafe { gl::glDisable(cap) })
    }

    pub fn is_enabled(&self, cap: GLenum) -> Result<bool> {
        self.with_active(|_| unsafe { gl::glIsEnabled(cap) } == gl::GL_TRUE)
    }

    pub fn viewport(&self, x: GLint, y: GLint, width: GLsizei, height: GLsizei) -> Result<()> {
        self.with_active(|_| unsafe { gl::glViewport(x, y, width, height) })
    }

    pub fn scissor(&self, x: GLint, y: GLint, width: GLsizei, height: GLsizei) -> Result<()> {
        self.with_active(|_| unsafe { gl::glScissor(x, y, width, height) })
    }

    pub fn clear(&self, mask: GLbitfield) -> Result<()> {
        self.with_active(|_| unsafe { gl::glClear(mask) })
    }

    pub fn clear_color(&self, r: GLclampf, g: GLclampf, b: GLclampf, a: GLclampf) -> Result<()> {
        self.with_active(|_| unsafe { gl::glClearColor(r, g, b, a) })
    }

    pub fn clear_depth(&self, depth: GLclampf) -> Result<()> {
        self.with_active(|_| unsafe { gl::glClearDepthf(depth) })
    }

    pub fn clear_stencil(&self, s: GLint) -> Result<()> {
        self.with_active(|_| unsafe { gl::glClearStencil(s) })
    }

    pub fn color_mask(&self, r: bool, g: bool, b: bool, a: bool) -> Result<()> {
        self.with_active(|_| unsafe {
            gl::glColorMask(r as GLboolean, g as GLboolean, b as GLboolean, a as GLboolean)
        })
    }

    pub fn blend_color(&self, r: GLclampf, g: GLclampf, b: GLclampf, a: GLclampf) -> Result<()> {
        self.with_active(|_| unsafe { gl::glBlendColor(r, g, b, a) })
    }

    pub fn blend_equation(&self, mode: GLenum) -> Result<()> {
        self.with_active(|_| unsafe { gl::glBlendEquation(mode) })
    }

    pub fn blend_equation_separate(&self, mode_rgb: GLenum, mode_alpha: GLenum) -> Result<()> {
        self.with_active(|_| unsafe { gl::glBlendEquationSeparate(mode_rgb, mode_alpha) })
    }

    pub fn blend_func(&self, sfactor: GLenum, dfactor: GLenum) -> Result<()> {
        self.with_active(|_| unsafe { gl::glBlendFunc(sfactor, dfactor) })
    }

    pub fn blend_func_separate(
        &self,
        src_rgb: GLenum,
        dst_rgb: GLenum,
        src_alpha: GLenum,
        dst_alpha: GLenum,
    ) -> Result<()> {
        self.with_active(|_| unsafe {
            gl::glBlendFuncSeparate(src_rgb, dst_rgb, src_alpha, dst_alpha)
        })
    }

    pub fn depth_func(&self, func: GLenum) -> Result<()> {
        self.with_active(|_| unsafe { gl::glDepthFunc(func) })
    }

    pub fn depth_mask(&self, flag: bool) -> Result<()> {
        self.with_active(|_| unsafe { gl::glDepthMask(flag as GLboolean) })
    }

    pub fn depth_range(&self, near: GLclampf, far: GLclampf) -> Result<()> {
        self.with_active(|_| unsafe { gl::glDepthRangef(near, far) })
    }

    pub fn stencil_func(&self, func: GLenum, reference: GLint, mask: GLuint) -> Result<()> {
        self.with_active(|_| unsafe { gl::glStencilFunc(func, reference, mask) })
    }

    pub fn stencil_func_separate(
        &self,
        face: GLenum,
        func: GLenum,
        reference: GLint,
        mask: GLuint,
    ) -> Result<()> {
        self.with_active(|_| unsafe { gl::glStencilFuncSeparate(face, func, reference, mask) })
    }

    pub fn stencil_mask(&self, mask: GLuint) -> Result<()> {
        self.with_active(|_| unsafe { gl::glStencilMask(mask) })
    }

    pub fn stencil_mask_separate(&self, face: GLenum, mask: GLuint) -> Result<()> {
        self.with_active(|_| unsafe { gl::glStencilMaskSeparate(face, mask) })
    }

    pub fn stencil_op(&self, fail: GLenum, zfail: GLenum, zpass: GLenum) -> Result<()> {
        self.with_active(|_| unsafe { gl::glStencilOp(fail, zfail, zpass) })
    }

    pub fn stencil_op_separate(
        &self,
        face: GLenum,
        fail: GLenum,
        zfail: GLenum,
        zpass: GLenum,
    ) -> Result<()> {
        self.with_active(|_| unsafe { gl::glStencilOpSeparate(face, fail, zfail, zpass) })
    }

    pub fn cull_face(&self, mode: GLenum) -> Result<()> {
        self.with_active(|_| unsafe { gl::glCullFace(mode) })
    }

    pub fn front_face(&self, mode: GLenum) -> Result<()> {
        self.with_active(|_| unsafe { gl::glFrontFace(mode) })
    }

    pub fn line_width(&self, width: GLfloat) -> Result<()> {
        self.with_active(|_| unsafe { gl::glLineWidth(width) })
    }

    pub fn polygon_offset(&self, factor: GLfloat, units: GLfloat) -> Result<()> {
        self.with_active(|_| unsafe { gl::glPolygonOffset(factor, units) })
    }

    pub fn hint(&self, target: GLenum, mode: GLenum) -> Result<()> {
        self.with_active(|_| unsafe { gl::glHint(target, mode) })
    }

    pub fn sample_coverage(&self, value: GLclampf, invert: bool) -> Result<()> {
        self.with_active(|_| unsafe { gl::glSampleCoverage(value, invert as GLboolean) })
    }

    // ---- Queries -----------------------------------------------------------

    /// Query one piece of context state, shaped per name. The WebGL unpack
    /// pseudo-parameters are answered from context state without a driver
    /// round trip.
    pub fn get_parameter(&self, pname: GLenum) -> Result<Parameter> {
        self.with_active(|me| match classify(pname) {
            ParamClass::UnpackFlipY => Parameter::Bool(me.unpack.flip_y),
            ParamClass::UnpackPremultiplyAlpha => Parameter::Bool(me.unpack.premultiply_alpha),
            ParamClass::UnpackColorspaceConversion => {
                Parameter::Int(me.unpack.colorspace_conversion)
            }
            ParamClass::Bool => {
                let mut value: GLboolean = 0;
                unsafe { gl::glGetBooleanv(pname, &mut value) };
                Parameter::Bool(value != 0)
            }
            ParamClass::Float => {
                let mut value = 0.0;
                unsafe { gl::glGetFloatv(pname, &mut value) };
                Parameter::Float(value)
            }
            ParamClass::Str => {
                let ptr = unsafe { gl::glGetString(pname) };
                let s = if ptr.is_null() {
                    String::new()
                } else {
                    unsafe { std::ffi::CStr::from_ptr(ptr.cast()) }
                        .to_string_lossy()
                        .into_owned()
                };
                Parameter::String(s)
            }
            ParamClass::Int2 => {
                let mut values = [0; 2];
                unsafe { gl::glGetIntegerv(pname, values.as_mut_ptr()) };
                Parameter::Int2(values)
            }
            ParamClass::Int4 => {
                let mut values = [0; 4];
                unsafe { gl::glGetIntegerv(pname, values.as_mut_ptr()) };
                Parameter::Int4(values)
            }
            ParamClass::Float2 => {
                let mut values = [0.0; 2];
                unsafe { gl::glGetFloatv(pname, values.as_mut_ptr()) };
                Parameter::Float2(values)
            }
            ParamClass::Float4 => {
                let mut values = [0.0; 4];
                unsafe { gl::glGetFloatv(pname, values.as_mut_ptr()) };
                Parameter::Float4(values)
            }
            ParamClass::Bool4 => {
                let mut values: [GLboolean; 4] = [0; 4];
                unsafe { gl::glGetBooleanv(pname, values.as_mut_ptr()) };
                Parameter::Bool4(values.map(|v| v != 0))
            }
            ParamClass::Int => {
                let mut value = 0;
                unsafe { gl::glGetIntegerv(pname, &mut value) };
                Parameter::Int(value)
            }
        })
    }

    /// The extension list captured when the context was created.
    pub fn get_supported_extensions(&self) -> Result<String> {
        self.with_active(|me| me.extensions.as_str().to_owned())
    }
}

fn read_driver_string(
    len: GLint,
    fill: impl FnOnce(GLsizei, *mut GLsizei, *mut gl::GLchar),
) -> String {
    if len <= 0 {
        return String::new();
    }
    let mut buf = vec![0u8; len as usize];
    let mut written: GLsizei = 0;
    fill(len, &mut written, buf.as_mut_ptr().cast());
    buf.truncate(written.max(0) as usize);
    String::from_utf8_lossy(&buf).into_owned()
}

fn read_active_info(
    cap: GLint,
    fill: impl FnOnce(GLsizei, *mut GLsizei, *mut GLint, *mut GLenum, *mut gl::GLchar),
) -> ActiveInfo {
    let mut size = 0;
    let mut type_ = 0;
    let mut buf = vec![0u8; cap.max(1) as usize];
    let mut written: GLsizei = 0;
    fill(
        buf.len() as GLsizei,
        &mut written,
        &mut size,
        &mut type_,
        buf.as_mut_ptr().cast(),
    );
    buf.truncate(written.max(0) as usize);
    ActiveInfo {
        name: String::from_utf8_lossy(&buf).into_owned(),
        size,
        type_,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn latch_accepts_first_real_error() {
        assert!(should_latch(gl::GL_NO_ERROR, gl::GL_INVALID_OPERATION));
    }

    // Rejected candidates must not reach the driver poll either; set_error
    // with no error, or over an occupied latch, leaves the driver's error
    // queue for the next getError to report.
    #[test]
    fn latch_rejects_no_error_before_polling() {
        assert!(!should_latch(gl::GL_NO_ERROR, gl::GL_NO_ERROR));
    }

    #[test]
    fn latch_rejects_overwrite_before_polling() {
        assert!(!should_latch(gl::GL_INVALID_ENUM, gl::GL_INVALID_OPERATION));
        assert!(!should_latch(gl::GL_INVALID_ENUM, gl::GL_NO_ERROR));
    }

    #[test]
    fn read_prefers_latch_and_clears_it() {
        let mut latch = gl::GL_INVALID_OPERATION;
        // The polled driver code is outranked and discarded.
        assert_eq!(
            consume_error(&mut latch, gl::GL_OUT_OF_MEMORY),
            gl::GL_INVALID_OPERATION
        );
        assert_eq!(latch, gl::GL_NO_ERROR);
    }

    #[test]
    fn read_reports_driver_code_when_latch_empty() {
        let mut latch = gl::GL_NO_ERROR;
        assert_eq!(consume_error(&mut latch, gl::GL_INVALID_ENUM), gl::GL_INVALID_ENUM);
        assert_eq!(consume_error(&mut latch, gl::GL_NO_ERROR), gl::GL_NO_ERROR);
    }

    #[test]
    fn depth_stencil_attachment_expands() {
        assert_eq!(
            expand_attachment(gl::GL_DEPTH_STENCIL_ATTACHMENT_WEBGL),
            (gl::GL_DEPTH_ATTACHMENT, Some(gl::GL_STENCIL_ATTACHMENT))
        );
        assert_eq!(
            expand_attachment(gl::GL_DEPTH_ATTACHMENT),
            (gl::GL_DEPTH_ATTACHMENT, None)
        );
    }

    #[test]
    fn storage_format_remaps() {
        assert_eq!(
            remap_storage_format(gl::GL_DEPTH_STENCIL_OES, gl::GL_DEPTH_COMPONENT16),
            gl::GL_DEPTH24_STENCIL8_OES
        );
        assert_eq!(
            remap_storage_format(gl::GL_DEPTH_COMPONENT32_OES, gl::GL_DEPTH_COMPONENT24_OES),
            gl::GL_DEPTH_COMPONENT24_OES
        );
        assert_eq!(remap_storage_format(gl::GL_RGBA, gl::GL_DEPTH_COMPONENT16), gl::GL_RGBA);
    }

    #[test]
    fn deepest_advertised_depth_format_wins() {
        use crate::extensions::GlExtensions;

        let all = GlExtensions::from_list("GL_OES_depth24 GL_OES_depth32");
        assert_eq!(preferred_depth_format(&all), gl::GL_DEPTH_COMPONENT32_OES);

        let d24 = GlExtensions::from_list("GL_OES_depth24");
        assert_eq!(preferred_depth_format(&d24), gl::GL_DEPTH_COMPONENT24_OES);

        let none = GlExtensions::from_list("");
        assert_eq!(preferred_depth_format(&none), gl::GL_DEPTH_COMPONENT16);
    }

    #[test]
    fn default_attributes_match_creation_defaults() {
        let attrs = ContextAttributes::default();
        assert!(attrs.alpha);
        assert!(attrs.depth);
        assert!(!attrs.stencil);
        assert!(attrs.antialias);
        assert!(attrs.premultiplied_alpha);
        assert!(!attrs.preserve_drawing_buffer);
        assert!(!attrs.prefer_low_power);
        assert!(!attrs.fail_on_major_performance_caveat);
    }
}
