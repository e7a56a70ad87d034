//! The persistent-store seam shared by both runtimes.

use std::collections::BTreeMap;

/// String-keyed view of the cookie store.
///
/// The browser runtime backs this with its manually-encoded jar; the
/// server runtime backs it with the request's `Cookie` header and the
/// response's `Set-Cookie` instructions. Abstracting the store keeps the
/// codec and the token predicates testable with a plain in-memory map.
pub trait CookieStore {
    /// Read one entry's decoded value.
    fn get(&self, name: &str) -> Option<String>;

    /// Write one entry, replacing any existing value.
    fn set(&mut self, name: &str, value: &str);

    /// Remove one entry.
    fn remove(&mut self, name: &str);
}

impl CookieStore for BTreeMap<String, String> {
    fn get(&self, name: &str) -> Option<String> {
        BTreeMap::get(self, name).cloned()
    }

    fn set(&mut self, name: &str, value: &str) {
        self.insert(name.to_string(), value.to_string());
    }

    fn remove(&mut self, name: &str) {
        BTreeMap::remove(self, name);
    }
}
