//! Text decoding and token scanning.
//!
//! Local-storage values carry a one-byte encoding prefix (`0x00` UTF-16LE,
//! `0x01` ISO-8859-1). Keys and legacy values do not, so an ordered
//! autodetect covers them: prefixed decode, a UTF-16 byte-distribution
//! heuristic, UTF-8, UTF-16LE, and finally ISO-8859-1, which accepts any
//! byte sequence.

use std::collections::BTreeSet;

/// Decodes an encoding-prefixed payload: `0x00` → UTF-16LE body, `0x01` →
/// ISO-8859-1 body. `None` for any other leading byte or an undecodable
/// UTF-16 body.
pub(crate) fn decode_prefixed(bytes: &[u8]) -> Option<String> {
    match bytes.first()? {
        0x00 => utf16_le(&bytes[1..]).map(|s| trim_control(&s)),
        0x01 => Some(trim_control(&latin1(&bytes[1..]))),
        _ => None,
    }
}

/// Ordered autodetect decode. ISO-8859-1 is the final fallback, so any input
/// decodes to something; control characters are trimmed from both ends.
pub(crate) fn decode_text(bytes: &[u8]) -> Option<String> {
    if bytes.len() >= 2 {
        if let Some(s) = decode_prefixed(bytes) {
            return Some(s);
        }
    }
    if looks_like_utf16(bytes) {
        if let Some(s) = utf16_le(bytes) {
            return Some(trim_control(&s));
        }
    }
    if let Ok(s) = std::str::from_utf8(bytes) {
        return Some(trim_control(s));
    }
    if let Some(s) = utf16_le(bytes) {
        return Some(trim_control(&s));
    }
    Some(trim_control(&latin1(bytes)))
}

/// Value decode for the origin query: the encoding prefix is authoritative
/// when present, autodetect covers the rest.
pub(crate) fn decode_value(bytes: &[u8]) -> Option<String> {
    if let Some(s) = decode_prefixed(bytes) {
        return Some(s);
    }
    decode_text(bytes)
}

/// Value decode for the text-entries query: keeps the longer of the
/// prefix-decoded and autodetected readings, preferring the prefix on a tie.
pub(crate) fn decode_value_lenient(bytes: &[u8]) -> Option<String> {
    let prefixed = decode_prefixed(bytes);
    let auto = decode_text(bytes);
    match (prefixed, auto) {
        (Some(p), Some(a)) => Some(if p.len() >= a.len() { p } else { a }),
        (Some(p), None) => Some(p),
        (None, auto) => auto,
    }
}

/// Decodes UTF-16 little-endian; `None` on odd length or unpaired
/// surrogates.
pub(crate) fn utf16_le(bytes: &[u8]) -> Option<String> {
    if bytes.len() % 2 != 0 {
        return None;
    }
    let units: Vec<u16> = bytes
        .chunks_exact(2)
        .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
        .collect();
    String::from_utf16(&units).ok()
}

/// ISO-8859-1: every byte is the identically-numbered code point.
pub(crate) fn latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| char::from(b)).collect()
}

/// Byte-distribution heuristic for unprefixed UTF-16LE: mostly-Latin text
/// has a zero in most odd positions. Sampled over the first 64 bytes;
/// requires an even length of at least 6 and a zero ratio above 60%.
fn looks_like_utf16(bytes: &[u8]) -> bool {
    if bytes.len() < 6 || bytes.len() % 2 != 0 {
        return false;
    }
    let window = &bytes[..bytes.len().min(64)];
    let odd_total = window.len() / 2;
    let odd_zero = window
        .iter()
        .skip(1)
        .step_by(2)
        .filter(|&&byte| byte == 0)
        .count();
    (odd_zero as f64) / (odd_total as f64) > 0.6
}

fn trim_control(s: &str) -> String {
    s.trim_matches(char::is_control).to_string()
}

/// Characters permitted inside a token candidate: the base64/base64url and
/// dotted-token alphabets.
fn is_token_byte(byte: u8) -> bool {
    byte.is_ascii_alphanumeric() || matches!(byte, b'.' | b'_' | b'-' | b'+' | b'/' | b'=')
}

/// Whether a maximal run qualifies as a token candidate: long enough, or
/// shaped like `header.payload.signature`.
fn keep_token(run: &str, min_len: usize) -> bool {
    if run.len() >= min_len {
        return true;
    }
    run.matches('.').count() >= 2 && run.split('.').filter(|seg| !seg.is_empty()).count() >= 3
}

/// Scans `bytes` for maximal token-alphabet runs, inserting qualifying ones
/// into `out`.
pub(crate) fn scan_tokens(bytes: &[u8], min_len: usize, out: &mut BTreeSet<String>) {
    let mut run_start = None;
    for (i, &byte) in bytes.iter().enumerate() {
        match (is_token_byte(byte), run_start) {
            (true, None) => run_start = Some(i),
            (false, Some(start)) => {
                push_run(&bytes[start..i], min_len, out);
                run_start = None;
            }
            _ => {}
        }
    }
    if let Some(start) = run_start {
        push_run(&bytes[start..], min_len, out);
    }
}

fn push_run(run: &[u8], min_len: usize, out: &mut BTreeSet<String>) {
    // Runs are pure ASCII by construction
    let Ok(run) = std::str::from_utf8(run) else {
        return;
    };
    if keep_token(run, min_len) {
        out.insert(run.to_string());
    }
}
