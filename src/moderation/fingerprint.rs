//! # Content Fingerprinting
//! Maps a photo payload to a stable SHA-256 fingerprint so byte-identical
//! images collide regardless of transport encoding. Pure, no I/O.

use base64::{engine::general_purpose, Engine as _};
use sha2::{Digest, Sha256};

/// Fingerprint of a photo payload: lowercase hex of the SHA-256 over the
/// decoded bytes. Empty or whitespace-only payloads carry no signal and
/// yield `None`.
///
/// Accepted payload forms, tried in order:
/// 1. `data:<mime>;base64,<body>` wrapper, stripped first;
/// 2. bare base64 (standard alphabet, padded or not, embedded whitespace
///    tolerated);
/// 3. anything else is hashed as raw bytes.
pub fn photo_fingerprint(payload: &str) -> Option<String> {
    let trimmed = payload.trim();
    if trimmed.is_empty() {
        return None;
    }
    let body = strip_data_url(trimmed);
    if body.trim().is_empty() {
        return None;
    }
    let bytes = decode_base64_lenient(body).unwrap_or_else(|| body.as_bytes().to_vec());
    Some(sha256_hex(&bytes))
}

/// Short fingerprint prefix used as the anonymous id in logs. Raw payloads
/// and descriptions never hit the logs. Ids that are too short, or where
/// byte 12 is not a char boundary, pass through whole.
pub fn short_id(fingerprint: &str) -> &str {
    fingerprint.get(..12).unwrap_or(fingerprint)
}

fn strip_data_url(payload: &str) -> &str {
    if let Some(rest) = payload.strip_prefix("data:") {
        if let Some((_, body)) = rest.split_once(',') {
            return body;
        }
    }
    payload
}

// Try standard base64 first, then the unpadded variant some clients send.
fn decode_base64_lenient(body: &str) -> Option<Vec<u8>> {
    let cleaned: String = body.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    general_purpose::STANDARD
        .decode(cleaned.as_bytes())
        .or_else(|_| general_purpose::STANDARD_NO_PAD.decode(cleaned.as_bytes()))
        .ok()
}

fn sha256_hex(bytes: &[u8]) -> String {
    let digest = Sha256::digest(bytes);
    let mut out = String::with_capacity(digest.len() * 2);
    for b in digest.iter() {
        use std::fmt::Write as _;
        let _ = write!(&mut out, "{:02x}", b);
    }
    out
}
