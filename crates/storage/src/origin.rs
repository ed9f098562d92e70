//! Storage-key decoding and origin matching.
//!
//! Chromium serializes a local-storage key as
//! `0x5F ∥ storage_key ∥ 0x00 ∥ key_payload`, where `storage_key` is the
//! origin text optionally suffixed with `^nonce` partition metadata. Some
//! stores also hold unprefixed keys of the same shape; those are only
//! trusted when the decoded origin actually looks like one.

use cursor::Cursor;

use crate::text;

/// A decoded local-storage key: the stored origin text (un-normalized) and
/// the user-visible key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct StorageKey {
    pub origin: String,
    pub key: String,
}

/// Decodes a merged-entry key as `(origin, key)`.
///
/// The `0x5F`-prefixed form is authoritative. The unprefixed fallback is
/// accepted only when [`looks_like_origin`] holds for the decoded origin —
/// anything else is one of the metadata records Chromium mixes into the same
/// store, and is silently skipped by returning `None`.
pub(crate) fn decode_storage_key(raw: &[u8]) -> Option<StorageKey> {
    if raw.first() == Some(&0x5f) {
        if let Some(key) = split_at_nul(raw, 1) {
            return Some(key);
        }
    }

    let key = split_at_nul(raw, 0)?;
    if !looks_like_origin(&key.origin) {
        return None;
    }
    Some(key)
}

/// Splits on the first `0x00` at or after `start`; the left side is the
/// origin text, the right side the key payload.
fn split_at_nul(raw: &[u8], start: usize) -> Option<StorageKey> {
    let rel = raw.get(start..)?.iter().position(|&b| b == 0)?;
    let nul = start + rel;

    let origin = text::decode_text(&raw[start..nul])?;
    let key = decode_key_payload(&raw[nul + 1..])?;
    Some(StorageKey { origin, key })
}

/// The key payload is a length-prefixed string when the prefix consumes the
/// payload exactly; otherwise it is taken as plain text.
fn decode_key_payload(payload: &[u8]) -> Option<String> {
    let mut cur = Cursor::new(payload);
    if let Some(slice) = cur.read_length_prefixed() {
        if cur.is_empty() && !slice.is_empty() {
            if let Some(decoded) = text::decode_text(slice) {
                return Some(decoded);
            }
        }
    }
    text::decode_text(payload)
}

/// Whether a decoded string plausibly names a web origin.
pub(crate) fn looks_like_origin(s: &str) -> bool {
    s.contains("://") || s.starts_with("localhost") || s.contains('.')
}

/// Normalizes a caller-supplied origin: trims whitespace and strips one
/// trailing `/`. Idempotent.
pub(crate) fn normalize_origin(origin: &str) -> String {
    let trimmed = origin.trim();
    trimmed.strip_suffix('/').unwrap_or(trimmed).to_string()
}

/// Reduces a decoded storage key to its origin: drops the `^nonce` partition
/// suffix, then everything past the authority, then a trailing `/`.
/// Idempotent.
pub(crate) fn storage_key_origin(raw: &str) -> String {
    let mut s = raw;
    if let Some(caret) = s.find('^') {
        s = &s[..caret];
    }

    s = match s.find("://") {
        Some(scheme_end) => {
            let authority_start = scheme_end + 3;
            match s[authority_start..].find('/') {
                Some(slash) => &s[..authority_start + slash],
                None => s,
            }
        }
        None => match s.find('/') {
            Some(slash) => &s[..slash],
            None => s,
        },
    };

    s.strip_suffix('/').unwrap_or(s).to_string()
}

/// Whether a stored origin refers to the requested one.
///
/// True on byte equality, on host+port equality, or when the stored origin
/// equals the requested one with its scheme stripped.
pub(crate) fn origin_matches(entry_origin: &str, requested: &str) -> bool {
    if entry_origin == requested {
        return true;
    }
    if let (Some(a), Some(b)) = (host_port(entry_origin), host_port(requested)) {
        if a == b {
            return true;
        }
    }
    if let Some((_, rest)) = requested.split_once("://") {
        if entry_origin == rest {
            return true;
        }
    }
    false
}

/// Extracts the lowercased `host[:port]` authority from an origin-shaped
/// string.
fn host_port(origin: &str) -> Option<String> {
    let rest = origin
        .split_once("://")
        .map(|(_, rest)| rest)
        .unwrap_or(origin);
    let authority = rest.split('/').next().unwrap_or("");
    if authority.is_empty() {
        return None;
    }
    Some(authority.to_ascii_lowercase())
}
