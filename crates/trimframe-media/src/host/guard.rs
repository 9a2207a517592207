// crates/trimframe-media/src/host/guard.rs
//
// RAII wrappers that give every sampling/export call a guaranteed release
// path: the element is detached and the object URL revoked exactly once,
// whether the call returns Ok, Err, or unwinds.

use std::ops::{Deref, DerefMut};

use super::{MediaHost, VideoElement};

/// Call-scoped video element. Detached on drop.
pub struct ScopedElement(Box<dyn VideoElement>);

impl ScopedElement {
    pub fn new(element: Box<dyn VideoElement>) -> Self {
        Self(element)
    }
}

impl Deref for ScopedElement {
    type Target = dyn VideoElement;
    fn deref(&self) -> &Self::Target { &*self.0 }
}

impl DerefMut for ScopedElement {
    fn deref_mut(&mut self) -> &mut Self::Target { &mut *self.0 }
}

impl Drop for ScopedElement {
    fn drop(&mut self) {
        self.0.pause();
        self.0.detach();
    }
}

/// Object URL owned by one call. Revoked on `revoke()` or on drop, never twice.
pub struct ObjectUrlGuard<'h> {
    host: &'h dyn MediaHost,
    url:  Option<String>,
}

impl<'h> ObjectUrlGuard<'h> {
    pub fn new(host: &'h dyn MediaHost, url: String) -> Self {
        Self { host, url: Some(url) }
    }

    pub fn url(&self) -> &str {
        self.url.as_deref().unwrap_or("")
    }

    pub fn revoke(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if let Some(url) = self.url.take() {
            self.host.revoke_object_url(&url);
        }
    }
}

impl Drop for ObjectUrlGuard<'_> {
    fn drop(&mut self) {
        self.release();
    }
}
