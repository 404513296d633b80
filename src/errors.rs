use crate::egl_ffi;
use crate::ContextState;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Failures surfaced through `Result`.
///
/// Driver-side GL errors are not part of this enum; they follow the polling
/// model of the underlying API and are consumed via [`crate::Context::error`].
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("could not open or initialize the default EGL display: {0}")]
    Display(EglError),
    #[error("no unique EGLConfig matches an 8-bit RGBA, 24-bit depth, 8-bit stencil pbuffer")]
    Config,
    #[error("EGL context creation failed: {0}")]
    ContextCreation(EglError),
    #[error("pbuffer surface creation failed: {0}")]
    Surface(EglError),
    #[error("could not make the context current: {0}")]
    Bind(EglError),
    #[error("required extension {0} is not supported")]
    ExtensionUnsupported(&'static str),
    #[error("required driver entry point {0} is missing")]
    MissingProc(&'static str),
    #[error("context is in the {0:?} state and cannot execute calls")]
    Defunct(ContextState),
    #[error("surface dimensions must be positive")]
    BadDimensions,
}

/// EGL error codes as reported by `eglGetError`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum EglError {
    #[error("the last function succeeded without error")]
    Success,
    #[error("EGL is not initialized for the display connection")]
    NotInitialized,
    #[error("EGL cannot access a requested resource")]
    BadAccess,
    #[error("EGL failed to allocate resources")]
    BadAlloc,
    #[error("unrecognized attribute or attribute value")]
    BadAttribute,
    #[error("argument does not name a valid rendering context")]
    BadContext,
    #[error("argument does not name a valid frame buffer configuration")]
    BadConfig,
    #[error("the current surface of the calling thread is no longer valid")]
    BadCurrentSurface,
    #[error("argument does not name a valid display connection")]
    BadDisplay,
    #[error("argument does not name a valid surface")]
    BadSurface,
    #[error("arguments are inconsistent")]
    BadMatch,
    #[error("one or more argument values are invalid")]
    BadParameter,
    #[error("argument does not refer to a valid native pixmap")]
    BadNativePixmap,
    #[error("argument does not refer to a valid native window")]
    BadNativeWindow,
    #[error("a power management event has occurred")]
    ContextLost,
    #[error("unknown EGL error")]
    Unknown,
}

impl EglError {
    pub fn last() -> Self {
        match unsafe { egl_ffi::eglGetError() } {
            egl_ffi::EGL_SUCCESS => Self::Success,
            egl_ffi::EGL_NOT_INITIALIZED => Self::NotInitialized,
            egl_ffi::EGL_BAD_ACCESS => Self::BadAccess,
            egl_ffi::EGL_BAD_ALLOC => Self::BadAlloc,
            egl_ffi::EGL_BAD_ATTRIBUTE => Self::BadAttribute,
            egl_ffi::EGL_BAD_CONTEXT => Self::BadContext,
            egl_ffi::EGL_BAD_CONFIG => Self::BadConfig,
            egl_ffi::EGL_BAD_CURRENT_SURFACE => Self::BadCurrentSurface,
            egl_ffi::EGL_BAD_DISPLAY => Self::BadDisplay,
            egl_ffi::EGL_BAD_SURFACE => Self::BadSurface,
            egl_ffi::EGL_BAD_MATCH => Self::BadMatch,
            egl_ffi::EGL_BAD_PARAMETER => Self::BadParameter,
            egl_ffi::EGL_BAD_NATIVE_PIXMAP => Self::BadNativePixmap,
            egl_ffi::EGL_BAD_NATIVE_WINDOW => Self::BadNativeWindow,
            egl_ffi::EGL_CONTEXT_LOST => Self::ContextLost,
            _ => Self::Unknown,
        }
    }
}
