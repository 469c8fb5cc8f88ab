//! Header line classification
//!
//! Response headers are matched against whole raw lines, by a
//! case-insensitive prefix that includes the colon. This is enough for the
//! handful of headers the client cares about and doesn't need a header map.

#[inline(always)]
fn has_prefix(line: &str, prefix: &[u8]) -> bool {
    if line.len() < prefix.len() {
        return false;
    }
    for (idx, ch) in line.bytes().take(prefix.len()).enumerate() {
        if prefix[idx] != ch.to_ascii_lowercase() {
            return false;
        }
    }
    return true;
}

#[inline(always)]
pub fn is_content_length(line: &str) -> bool {
    has_prefix(line, b"content-length:")
}

#[inline(always)]
pub fn is_connection(line: &str) -> bool {
    has_prefix(line, b"connection:")
}

#[inline(always)]
pub fn is_content_type(line: &str) -> bool {
    has_prefix(line, b"content-type:")
}

/// Splits a header line into trimmed name and value
pub fn split(line: &str) -> Option<(&str, &str)> {
    line.find(':').map(|idx| (line[..idx].trim(), line[idx+1..].trim()))
}

/// Returns trimmed value of the header line (text after the first colon)
pub fn value(line: &str) -> &str {
    split(line).map(|(_, v)| v).unwrap_or("")
}

// any occurence counts, like `Connection: Keep-Alive, Upgrade`
pub fn has_keep_alive(val: &str) -> bool {
    let needle = b"keep-alive";
    val.as_bytes().windows(needle.len())
        .any(|w| w.eq_ignore_ascii_case(needle))
}

/// Extracts `charset=` parameter of the `Content-Type` value
///
/// The value is trimmed and surrounding double quotes are stripped.
/// Returns `None` when there is no such parameter or it's empty.
pub fn charset_param(val: &str) -> Option<&str> {
    let needle = b"charset=";
    let start = val.as_bytes().windows(needle.len())
        .position(|w| w.eq_ignore_ascii_case(needle))?;
    let mut enc = &val[start + needle.len()..];
    if let Some(end) = enc.find(';') {
        enc = &enc[..end];
    }
    enc = enc.trim();
    if enc.len() > 2 && enc.starts_with('"') && enc.ends_with('"') {
        enc = enc[1..enc.len()-1].trim();
    }
    if enc.is_empty() {
        None
    } else {
        Some(enc)
    }
}
