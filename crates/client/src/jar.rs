//! In-memory cookie jar with manual percent-encoding.
//!
//! The browser runtime has no framework cookie encoder; values are
//! percent-encoded on write and decoded on read so that serialized JSON
//! (braces, quotes, semicolons) survives the cookie syntax. Entries are
//! stored encoded, exactly as they would appear on the wire.

use std::collections::BTreeMap;

use beamline_session::{CookieStore, SESSION_COOKIE_NAMES};
use tracing::debug;

/// Cookie store backed by an encoded name/value map.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CookieJar {
    entries: BTreeMap<String, String>,
}

impl CookieJar {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a `Cookie`-header-style string (`name=value; name2=value2`).
    ///
    /// Values are kept in their encoded form; malformed pairs (no `=`) are
    /// skipped.
    #[must_use]
    pub fn from_header(header: &str) -> Self {
        let entries = header
            .split(';')
            .filter_map(|pair| {
                let (name, value) = pair.trim().split_once('=')?;
                (!name.is_empty()).then(|| (name.to_string(), value.to_string()))
            })
            .collect();
        Self { entries }
    }

    /// Serialize every entry back into `Cookie`-header form.
    #[must_use]
    pub fn to_header(&self) -> String {
        self.entries
            .iter()
            .map(|(name, value)| format!("{name}={value}"))
            .collect::<Vec<_>>()
            .join("; ")
    }

    /// The encoded value of one entry, as stored on the wire.
    #[must_use]
    pub fn raw(&self, name: &str) -> Option<&str> {
        self.entries.get(name).map(String::as_str)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl CookieStore for CookieJar {
    fn get(&self, name: &str) -> Option<String> {
        let encoded = self.entries.get(name)?;
        match urlencoding::decode(encoded) {
            Ok(decoded) => Some(decoded.into_owned()),
            Err(err) => {
                debug!(cookie = name, error = %err, "cookie value is not valid percent-encoding");
                None
            }
        }
    }

    fn set(&mut self, name: &str, value: &str) {
        self.entries.insert(name.to_string(), urlencoding::encode(value).into_owned());
    }

    fn remove(&mut self, name: &str) {
        self.entries.remove(name);
    }
}

/// Build the `Cookie` header carrying only the session entries of `store`.
///
/// Values are re-encoded from their decoded form, so this works with any
/// [`CookieStore`] backing, not just [`CookieJar`].
#[must_use]
pub fn session_cookie_header<S: CookieStore + ?Sized>(store: &S) -> String {
    SESSION_COOKIE_NAMES
        .iter()
        .filter_map(|name| {
            store.get(name).map(|value| format!("{name}={}", urlencoding::encode(&value)))
        })
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    //! Unit tests for the cookie jar.
    use beamline_session::COOKIE_TOKENS;

    use super::*;

    /// Validates percent-encoding survives the jar round-trip.
    ///
    /// Assertions:
    /// - Confirms JSON punctuation is encoded on the wire.
    /// - Confirms `get` restores the original value.
    #[test]
    fn test_json_value_round_trip() {
        let mut jar = CookieJar::new();
        let value = r#"{"auth.globus.org":{"access_token":"a;b=c"}}"#;
        jar.set(COOKIE_TOKENS, value);

        let raw = jar.raw(COOKIE_TOKENS).unwrap();
        assert!(!raw.contains('{'));
        assert!(!raw.contains(';'));
        assert_eq!(jar.get(COOKIE_TOKENS).as_deref(), Some(value));
    }

    /// Validates header parsing and serialization.
    ///
    /// Assertions:
    /// - Confirms `from_header` splits pairs and skips malformed ones.
    /// - Confirms `to_header` re-emits name=value pairs.
    #[test]
    fn test_header_round_trip() {
        let jar = CookieJar::from_header("a=1; tokens=%7B%7D; malformed;  b=2");
        assert_eq!(jar.raw("a"), Some("1"));
        assert_eq!(jar.raw("b"), Some("2"));
        assert_eq!(jar.get("tokens").as_deref(), Some("{}"));
        assert!(jar.raw("malformed").is_none());

        let header = jar.to_header();
        assert!(header.contains("tokens=%7B%7D"));
        assert!(header.contains("a=1"));
    }

    /// Validates an undecodable entry reads as absent.
    ///
    /// Assertions:
    /// - Ensures a value that decodes to invalid UTF-8 yields `None`
    ///   rather than an error or garbage.
    #[test]
    fn test_invalid_encoding_reads_as_absent() {
        let jar = CookieJar::from_header("tokens=%FF%FE");
        assert!(jar.get("tokens").is_none());
        assert!(jar.raw("tokens").is_some());
    }

    /// Validates `session_cookie_header` includes only session entries.
    ///
    /// Assertions:
    /// - Ensures non-session cookies are excluded.
    /// - Confirms values are re-encoded.
    #[test]
    fn test_session_cookie_header_filters_and_encodes() {
        let mut jar = CookieJar::new();
        jar.set(COOKIE_TOKENS, "{}");
        jar.set("is_authenticated", "true");
        jar.set("theme", "dark");

        let header = session_cookie_header(&jar);
        assert!(header.contains("tokens=%7B%7D"));
        assert!(header.contains("is_authenticated=true"));
        assert!(!header.contains("theme"));
    }
}
