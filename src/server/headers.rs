//! Response headers and the policy hook that augments them.

/// Ordered response header list. Lookup is case-insensitive, serialization
/// keeps insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Headers {
    entries: Vec<(String, String)>,
}

impl Headers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.entries.push((name.into(), value.into()));
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn serialize_into(&self, out: &mut String) {
        for (name, value) in &self.entries {
            out.push_str(name);
            out.push_str(": ");
            out.push_str(value);
            out.push_str("\r\n");
        }
    }
}

/// Hook run on every response right before its head is written.
pub trait HeaderPolicy: Send + Sync {
    fn apply(&self, headers: &mut Headers);
}

pub const CACHE_CONTROL: &str = "no-store, no-cache, must-revalidate, max-age=0";
pub const PRAGMA: &str = "no-cache";
pub const EXPIRES: &str = "0";

/// Disables client-side caching so every reload hits the disk.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCacheHeaders;

impl HeaderPolicy for NoCacheHeaders {
    fn apply(&self, headers: &mut Headers) {
        headers.append("Cache-Control", CACHE_CONTROL);
        headers.append("Pragma", PRAGMA);
        headers.append("Expires", EXPIRES);
    }
}
