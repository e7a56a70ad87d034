//! Best-effort decoding of the provider's id token.

use base64::engine::general_purpose::{STANDARD_NO_PAD, URL_SAFE_NO_PAD};
use base64::Engine;
use tracing::debug;

use crate::types::IdTokenClaims;

/// Decode the claims segment of a compact id token.
///
/// Splits on `.`, base64-decodes the middle segment and parses it as JSON.
/// Any malformed input (wrong segment count, bad base64, non-JSON payload)
/// yields `None` rather than an error: identity claims are display-only
/// and must never block authentication.
///
/// The signature is **not** verified. Every authorization decision is
/// re-checked against the access token by the resource servers.
#[must_use]
pub fn decode_id_token_claims(id_token: &str) -> Option<IdTokenClaims> {
    let mut segments = id_token.split('.');
    let (Some(_header), Some(payload), Some(_signature), None) =
        (segments.next(), segments.next(), segments.next(), segments.next())
    else {
        debug!("id token does not have three segments");
        return None;
    };

    let bytes = decode_segment(payload)?;
    match serde_json::from_slice::<IdTokenClaims>(&bytes) {
        Ok(claims) => Some(claims),
        Err(err) => {
            debug!(error = %err, "id token payload is not valid claims JSON");
            None
        }
    }
}

/// Tokens are URL-safe base64 without padding; some issuers emit the
/// standard alphabet, so fall back to it before giving up.
fn decode_segment(segment: &str) -> Option<Vec<u8>> {
    let trimmed = segment.trim_end_matches('=');
    URL_SAFE_NO_PAD
        .decode(trimmed)
        .or_else(|_| STANDARD_NO_PAD.decode(trimmed))
        .ok()
}
