//! Percent-encoding tables and the permissive decoder.
//!
//! Each RI component escapes its own reserved-character set, recovered from
//! `internet/ri.py`'s per-component `str.maketrans` tables: `user`,
//! `password`, `host`/`port`/path segments (`primary`), `query-key`,
//! `query-value` and `fragment` each escape a different minimal set, plus
//! every C0 control byte (0x00-0x20 inclusive, matching the original's
//! `list(range(0, 33))`). Strict mode replaces all of them with one table
//! escaping the full reserved set.

/// Which RI component a string is being escaped for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Component {
    User,
    Password,
    /// Host, port, and path segments all share the same minimal table.
    Primary,
    QueryKey,
    QueryValue,
    Fragment,
}

/// The full reserved set used for every component in strict mode.
const STRICT_RESERVED: &[u8] = b"%!*'();:@&=+$,/?#[]";

fn reserved_for(component: Component) -> &'static [u8] {
    match component {
        Component::User => b"%@:/?#",
        Component::Password => b"%@/?#",
        Component::Primary => b"%/?#",
        Component::QueryKey => b"%&#=",
        Component::QueryValue => b"%&#",
        Component::Fragment => b"%?#",
    }
}

fn must_escape(byte: u8, component: Component, strict: bool) -> bool {
    if byte < 0x21 {
        // C0 controls and space, matching `list(range(0, 33))` in the source.
        return true;
    }
    let set = if strict {
        STRICT_RESERVED
    } else {
        reserved_for(component)
    };
    set.contains(&byte)
}

/// Percent-encode `s` for the given component.
pub fn encode(s: &str, component: Component, strict: bool) -> String {
    let mut out = String::with_capacity(s.len());
    for byte in s.bytes() {
        if must_escape(byte, component, strict) {
            out.push_str(&format!("%{byte:02X}"));
        } else {
            out.push(byte as char);
        }
    }
    out
}

/// Permissively decode percent-escapes in `s`.
///
/// This never fails: a `%` not followed by two hex digits is left in the
/// output literally, rather than raising (the original
/// `internet/ri.py::_decode_parts` throws here; that behavior is not
/// carried over). Recognized escapes are
/// decoded to raw bytes and the whole buffer is reassembled as UTF-8,
/// lossily substituting the replacement character for any byte sequence
/// that isn't valid UTF-8.
pub fn decode(s: &str) -> String {
    let bytes = s.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' && i + 2 < bytes.len() {
            let hi = hex_val(bytes[i + 1]);
            let lo = hex_val(bytes[i + 2]);
            if let (Some(hi), Some(lo)) = (hi, lo) {
                out.push((hi << 4) | lo);
                i += 3;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    String::from_utf8(out).unwrap_or_else(|e| String::from_utf8_lossy(e.as_bytes()).into_owned())
}

fn hex_val(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'a'..=b'f' => Some(b - b'a' + 10),
        b'A'..=b'F' => Some(b - b'A' + 10),
        _ => None,
    }
}
