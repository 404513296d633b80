use std::collections::HashSet;

use crate::gles_ffi::GLuint;

/// Kinds of driver-side objects a context can own.
///
/// Handle namespaces are independent per kind, so the same integer handle may
/// legitimately exist for, say, a buffer and a texture at the same time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectKind {
    Buffer,
    Framebuffer,
    Program,
    Renderbuffer,
    Shader,
    Texture,
    VertexArray,
}

/// Per-context set of live (handle, kind) pairs, used to bulk-release every
/// driver object when the context is disposed.
#[derive(Debug, Default)]
pub(crate) struct ObjectRegistry {
    entries: HashSet<(GLuint, ObjectKind)>,
}

impl ObjectRegistry {
    pub fn register(&mut self, kind: ObjectKind, handle: GLuint) {
        self.entries.insert((handle, kind));
    }

    /// Removing an absent entry is a no-op; the driver itself may still reject
    /// the caller's double-delete.
    pub fn unregister(&mut self, kind: ObjectKind, handle: GLuint) {
        self.entries.remove(&(handle, kind));
    }

    pub fn contains(&self, kind: ObjectKind, handle: GLuint) -> bool {
        self.entries.contains(&(handle, kind))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn take(&mut self) -> HashSet<(GLuint, ObjectKind)> {
        std::mem::take(&mut self.entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unregister_is_noop_when_absent() {
        let mut reg = ObjectRegistry::default();
        reg.register(ObjectKind::Texture, 7);
        assert!(reg.contains(ObjectKind::Texture, 7));

        reg.unregister(ObjectKind::Texture, 7);
        assert!(!reg.contains(ObjectKind::Texture, 7));

        // Second unregister with the same arguments must not fail.
        reg.unregister(ObjectKind::Texture, 7);
        assert_eq!(reg.len(), 0);
    }

    #[test]
    fn duplicate_registration_does_not_duplicate() {
        let mut reg = ObjectRegistry::default();
        reg.register(ObjectKind::Buffer, 3);
        reg.register(ObjectKind::Buffer, 3);
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn same_handle_across_kinds() {
        let mut reg = ObjectRegistry::default();
        reg.register(ObjectKind::Buffer, 3);
        reg.register(ObjectKind::Texture, 3);
        assert_eq!(reg.len(), 2);

        reg.unregister(ObjectKind::Buffer, 3);
        assert!(reg.contains(ObjectKind::Texture, 3));
    }

    #[test]
    fn take_empties_the_registry() {
        let mut reg = ObjectRegistry::default();
        reg.register(ObjectKind::Shader, 1);
        reg.register(ObjectKind::Program, 2);
        reg.register(ObjectKind::Framebuffer, 2);

        let drained = reg.take();
        assert_eq!(drained.len(), 3);
        assert_eq!(reg.len(), 0);
        assert!(drained.contains(&(1, ObjectKind::Shader)));
        assert!(drained.contains(&(2, ObjectKind::Program)));
        assert!(drained.contains(&(2, ObjectKind::Framebuffer)));
    }
}
