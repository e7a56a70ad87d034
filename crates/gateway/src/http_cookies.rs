//! Request/response cookie plumbing for the gateway.
//!
//! The request's `Cookie` header is parsed once into a plain map that
//! satisfies the session crate's store seam; session writes become
//! `Set-Cookie` headers on the response. Values are percent-encoded on
//! the wire, matching the browser runtime's jar.

use std::collections::BTreeMap;

use axum::http::header::{HeaderMap, HeaderValue, COOKIE, SET_COOKIE};
use beamline_session::{encode_store, CookieAttributes, TokenStore, SESSION_COOKIE_NAMES};
use tracing::debug;

/// Decode the request's `Cookie` header into a name → value map.
///
/// Malformed pairs and undecodable values are skipped; a request with a
/// corrupt cookie reads the same as one without it.
#[must_use]
pub fn cookies_from_headers(headers: &HeaderMap) -> BTreeMap<String, String> {
    let mut cookies = BTreeMap::new();
    for header in headers.get_all(COOKIE) {
        let Ok(raw) = header.to_str() else { continue };
        for pair in raw.split(';') {
            let Some((name, value)) = pair.trim().split_once('=') else { continue };
            match urlencoding::decode(value) {
                Ok(decoded) => {
                    cookies.insert(name.to_string(), decoded.into_owned());
                }
                Err(err) => {
                    debug!(cookie = name, error = %err, "skipping undecodable cookie value");
                }
            }
        }
    }
    cookies
}

/// Append `Set-Cookie` headers persisting the full entry set of `store`.
pub fn write_session_cookies(headers: &mut HeaderMap, store: &TokenStore, secure: bool) {
    let attributes = CookieAttributes::session(secure);
    for entry in encode_store(store) {
        let header = format!(
            "{}={}{}",
            entry.name,
            urlencoding::encode(&entry.value),
            attributes.header_suffix()
        );
        if let Ok(value) = HeaderValue::from_str(&header) {
            headers.append(SET_COOKIE, value);
        }
    }
}

/// Append `Set-Cookie` headers expiring every session entry.
pub fn write_clearing_cookies(headers: &mut HeaderMap) {
    let attributes = CookieAttributes::expired();
    for name in SESSION_COOKIE_NAMES {
        if let Ok(value) = HeaderValue::from_str(&format!("{name}={}", attributes.header_suffix()))
        {
            headers.append(SET_COOKIE, value);
        }
    }
}

/// Rewrite a request's `Cookie` header so downstream handlers observe the
/// refreshed session within the same request.
pub fn replace_request_cookies(headers: &mut HeaderMap, cookies: &BTreeMap<String, String>) {
    let serialized = cookies
        .iter()
        .map(|(name, value)| format!("{name}={}", urlencoding::encode(value)))
        .collect::<Vec<_>>()
        .join("; ");
    if let Ok(value) = HeaderValue::from_str(&serialized) {
        headers.insert(COOKIE, value);
    }
}
