//! Process-wide display and context bookkeeping.
//!
//! EGL's notion of a current context is thread-affine and this crate's
//! execution model is strictly single-threaded, so the "process-wide" state of
//! the design lives in thread-locals: one lazily initialized display shared by
//! every context, the registry of live contexts, and the pointer to the one
//! context currently bound to the driver.

use std::cell::{Cell, RefCell};

use crate::context::ContextShared;
use crate::debug::trace;
use crate::egl_ffi;
use crate::errors::{EglError, Error, Result};

/// Identifies one context for registry and active-pointer tracking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ContextId(u64);

thread_local! {
    static DISPLAY: Cell<Option<egl_ffi::EGLDisplay>> = const { Cell::new(None) };
    // Keyed by id so removal never has to borrow the contexts themselves;
    // disposal runs with the disposed context already mutably borrowed.
    static CONTEXTS: RefCell<Vec<(ContextId, ContextShared)>> = const { RefCell::new(Vec::new()) };
    static ACTIVE: Cell<Option<ContextId>> = const { Cell::new(None) };
    static NEXT_ID: Cell<u64> = const { Cell::new(0) };
}

/// Open and initialize the default display if this is the first context, and
/// hand back the shared handle. Idempotent once acquired.
pub(crate) fn acquire() -> Result<egl_ffi::EGLDisplay> {
    if let Some(dpy) = DISPLAY.get() {
        return Ok(dpy);
    }

    let dpy = unsafe { egl_ffi::eglGetDisplay(egl_ffi::EGL_DEFAULT_DISPLAY) };
    if dpy == egl_ffi::EGL_NO_DISPLAY {
        return Err(Error::Display(EglError::last()));
    }

    if unsafe { egl_ffi::eglInitialize(dpy, std::ptr::null_mut(), std::ptr::null_mut()) }
        != egl_ffi::EGL_TRUE
    {
        return Err(Error::Display(EglError::last()));
    }

    DISPLAY.set(Some(dpy));
    trace!("display initialized");
    Ok(dpy)
}

/// Release the display connection. Only meaningful once the context registry
/// is empty; a no-op when the display was never acquired.
fn terminate() {
    if let Some(dpy) = DISPLAY.take() {
        unsafe { egl_ffi::eglTerminate(dpy) };
        trace!("display terminated");
    }
}

pub(crate) fn next_context_id() -> ContextId {
    let id = NEXT_ID.get();
    NEXT_ID.set(id + 1);
    ContextId(id)
}

pub(crate) fn register(id: ContextId, ctx: ContextShared) {
    CONTEXTS.with_borrow_mut(|contexts| contexts.push((id, ctx)));
}

pub(crate) fn unregister(id: ContextId) {
    CONTEXTS.with_borrow_mut(|contexts| contexts.retain(|(ctx_id, _)| *ctx_id != id));
}

pub(crate) fn active() -> Option<ContextId> {
    ACTIVE.get()
}

pub(crate) fn set_active(id: Option<ContextId>) {
    ACTIVE.set(id);
}

/// Dispose every live context, most recently created first, then terminate
/// the display. Intended to run once at process or worker shutdown.
pub fn dispose_all() {
    loop {
        let Some((_, ctx)) = CONTEXTS.with_borrow_mut(|contexts| contexts.pop()) else {
            break;
        };
        ctx.borrow_mut().dispose();
    }
    terminate();
}
