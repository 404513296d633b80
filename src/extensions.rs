use std::ffi::CStr;
use std::fmt;

use crate::errors::{Error, Result};
use crate::gles_ffi;

/// The space-separated GL extension list of the current context.
pub struct GlExtensions(String);

impl GlExtensions {
    /// Query the current context. Requires a context to be bound; a missing
    /// extension string is treated as an empty list.
    pub(crate) fn query() -> Self {
        let ptr = unsafe { gles_ffi::glGetString(gles_ffi::GL_EXTENSIONS) };
        if ptr.is_null() {
            return Self(String::new());
        }
        let list = unsafe { CStr::from_ptr(ptr.cast()) }
            .to_string_lossy()
            .into_owned();
        Self(list)
    }

    pub(crate) fn from_list(list: impl Into<String>) -> Self {
        Self(list.into())
    }

    pub fn contains(&self, ext: &str) -> bool {
        self.0.split(' ').any(|e| e == ext)
    }

    pub fn require(&self, ext: &'static str) -> Result<()> {
        if self.contains(ext) {
            Ok(())
        } else {
            Err(Error::ExtensionUnsupported(ext))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for GlExtensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.0.split(' ')).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contains_matches_whole_names_only() {
        let exts = GlExtensions::from_list("GL_OES_depth24 GL_OES_packed_depth_stencil");
        assert!(exts.contains("GL_OES_depth24"));
        assert!(exts.contains("GL_OES_packed_depth_stencil"));
        assert!(!exts.contains("GL_OES_depth"));
        assert!(!exts.contains("GL_OES_depth32"));
    }

    #[test]
    fn require_reports_the_missing_name() {
        let exts = GlExtensions::from_list("");
        match exts.require("GL_ANGLE_instanced_arrays") {
            Err(Error::ExtensionUnsupported(name)) => {
                assert_eq!(name, "GL_ANGLE_instanced_arrays");
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }
}
