//! Textual encoding of IR names and string literals

use crate::error::{Error, Result};

fn is_ident_start(b: u8) -> bool {
    b.is_ascii_alphabetic() || matches!(b, b'-' | b'$' | b'.' | b'_')
}

fn is_ident_char(b: u8) -> bool {
    is_ident_start(b) || b.is_ascii_digit()
}

fn is_bare(name: &str) -> bool {
    let bytes = name.as_bytes();
    if bytes.is_empty() {
        return false;
    }
    if bytes.iter().all(u8::is_ascii_digit) {
        return true;
    }
    is_ident_start(bytes[0]) && bytes[1..].iter().all(|b| is_ident_char(*b))
}

/// Escapes a string for use inside `"..."` in the IR
///
/// Printable ASCII passes through; `"`, `\` and every other byte become a
/// two-digit `\XX` hex escape.
pub fn escape_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for b in s.bytes() {
        if (0x20..=0x7E).contains(&b) && b != b'"' && b != b'\\' {
            out.push(b as char);
        } else {
            out.push_str(&format!("\\{:02X}", b));
        }
    }
    out
}

/// Inverse of [`escape_string`]
pub fn unescape_string(s: &str) -> Result<String> {
    let bytes = s.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'\\' {
            let hex = s
                .get(i + 1..i + 3)
                .ok_or_else(|| Error::compiler(format!("truncated escape in {:?}", s)))?;
            let b = u8::from_str_radix(hex, 16)
                .map_err(|_| Error::compiler(format!("invalid escape \\{} in {:?}", hex, s)))?;
            out.push(b);
            i += 3;
        } else {
            out.push(bytes[i]);
            i += 1;
        }
    }
    String::from_utf8(out).map_err(|e| Error::compiler(format!("invalid UTF-8: {}", e)))
}

fn prefixed(sigil: char, name: &str) -> String {
    if is_bare(name) {
        format!("{}{}", sigil, name)
    } else {
        format!("{}\"{}\"", sigil, escape_string(name))
    }
}

/// `%name`
pub fn local(name: &str) -> String {
    prefixed('%', name)
}

/// `@name`
pub fn global(name: &str) -> String {
    prefixed('@', name)
}

/// `!name`; metadata names cannot be quoted, so odd bytes are hex-escaped
pub fn metadata(name: &str) -> String {
    let mut out = String::from("!");
    for b in name.bytes() {
        if is_ident_char(b) {
            out.push(b as char);
        } else {
            out.push_str(&format!("\\{:02X}", b));
        }
    }
    out
}
