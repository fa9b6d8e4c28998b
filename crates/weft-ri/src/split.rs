//! `split`/`join`: the five-tuple form, with percent-escapes left verbatim.
//!
//! Ported directly from `internet/ri.py::split`/`join`, including the
//! netloc/path/query/fragment boundary precedence (fragment wins over
//! query, query wins over path, always scanning from the cursor left by
//! scheme detection) and the two amorphous-demotion edge cases. See
//! SPEC_FULL.md "Resolved Open Questions" for why each preserves
//! `join(split(s)) == s`.

use std::fmt;

/// What kind of indicator a string was identified as.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Kind {
    Authority,
    Absolute,
    Relative,
    None,
    Amorphous,
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Kind::Authority => "authority",
            Kind::Absolute => "absolute",
            Kind::Relative => "relative",
            Kind::None => "none",
            Kind::Amorphous => "amorphous",
        };
        f.write_str(s)
    }
}

/// The five-tuple split form: `(kind, scheme, netloc, path, query, fragment)`.
///
/// All string fields retain their percent-escapes verbatim; only
/// [`super::structured::Ri`] carries decoded values.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct SplitForm {
    pub kind: Option<Kind>,
    pub scheme: Option<String>,
    pub netloc: Option<String>,
    pub path: Option<String>,
    pub query: Option<String>,
    pub fragment: Option<String>,
}

fn is_valid_scheme(candidate: &str) -> bool {
    if candidate.is_empty() {
        return false;
    }
    candidate
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || "-.+".contains(c))
}

/// Split a Resource Indicator into its five-tuple form.
pub fn split(text: &str) -> SplitForm {
    let s = text.trim_start();
    let mut kind;
    let mut scheme: Option<String> = None;
    let mut pos = 0usize;

    if let Some(rest) = s.strip_prefix("//") {
        let _ = rest;
        pos = 2;
        kind = Kind::Relative;
    } else if let Some(scheme_pos) = s.find(':') {
        let candidate = &s[..scheme_pos];
        if s[scheme_pos..].starts_with("://") {
            kind = Kind::Authority;
            pos = scheme_pos + 3;
        } else {
            kind = Kind::Absolute;
            pos = scheme_pos + 1;
        }
        if is_valid_scheme(candidate) {
            scheme = Some(candidate.to_string());
        } else {
            pos = 0;
            scheme = None;
            kind = Kind::Amorphous;
        }
    } else {
        kind = Kind::None;
    }

    let end = s.len();
    let mut end_of_netloc = end;

    let mut path_pos = s[pos..].find('/').map(|i| i + pos);
    if let Some(p) = path_pos {
        end_of_netloc = p;
    }

    let mut query_pos = s[pos..].find('?').map(|i| i + pos);
    match query_pos {
        None => {}
        Some(q) => {
            if path_pos.is_none() || q < path_pos.unwrap() {
                path_pos = None;
                end_of_netloc = q;
            }
        }
    }

    let fragment_pos = s[pos..].find('#').map(|i| i + pos);
    if let Some(fpos) = fragment_pos {
        if let Some(q) = query_pos {
            if fpos < q {
                query_pos = None;
            }
        }
        if let Some(p) = path_pos {
            if fpos < p {
                path_pos = None;
                end_of_netloc = fpos;
            }
        }
        if query_pos.is_none() && path_pos.is_none() {
            end_of_netloc = fpos;
        }
    }

    let mut netloc = if end_of_netloc != pos {
        Some(s[pos..end_of_netloc].to_string())
    } else {
        None
    };

    if kind == Kind::Absolute {
        if let Some(n) = &netloc {
            if !n.is_empty() && n.bytes().all(|b| b.is_ascii_digit()) {
                netloc = Some(format!("{}:{}", scheme.take().unwrap_or_default(), n));
                kind = Kind::Amorphous;
            }
        }
    }

    let path = path_pos.map(|p| {
        let stop = query_pos.or(fragment_pos).unwrap_or(end);
        s[p + 1..stop].to_string()
    });
    let query = query_pos.map(|q| {
        let stop = fragment_pos.unwrap_or(end);
        s[q + 1..stop].to_string()
    });
    let fragment = fragment_pos.map(|f| s[f + 1..end].to_string());

    SplitForm {
        kind: Some(kind),
        scheme,
        netloc,
        path,
        query,
        fragment,
    }
}

/// Rejoin a five-tuple split form into a Resource Indicator string.
pub fn join(t: &SplitForm) -> String {
    let mut s = String::new();
    match t.kind {
        Some(Kind::Authority) => {
            if let Some(scheme) = &t.scheme {
                s.push_str(scheme);
            }
            s.push_str("://");
        }
        Some(Kind::Absolute) => {
            if let Some(scheme) = &t.scheme {
                s.push_str(scheme);
            }
            s.push(':');
        }
        Some(Kind::Relative) => s.push_str("//"),
        _ => {}
    }

    if let Some(netloc) = &t.netloc {
        s.push_str(netloc);
    }
    if let Some(path) = &t.path {
        s.push('/');
        s.push_str(path);
    }
    if let Some(query) = &t.query {
        s.push('?');
        s.push_str(query);
    }
    if let Some(fragment) = &t.fragment {
        s.push('#');
        s.push_str(fragment);
    }
    s
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roundtrip(s: &str) {
        assert_eq!(join(&split(s)), s, "roundtrip failed for {s:?}");
    }

    #[test]
    fn authority_form() {
        let f = split("https://fault.io/a/b?x=1#frag");
        assert_eq!(f.kind, Some(Kind::Authority));
        assert_eq!(f.scheme.as_deref(), Some("https"));
        assert_eq!(f.netloc.as_deref(), Some("fault.io"));
        assert_eq!(f.path.as_deref(), Some("a/b"));
        assert_eq!(f.query.as_deref(), Some("x=1"));
        assert_eq!(f.fragment.as_deref(), Some("frag"));
        roundtrip("https://fault.io/a/b?x=1#frag");
    }

    #[test]
    fn relative_form() {
        let f = split("//host/path");
        assert_eq!(f.kind, Some(Kind::Relative));
        assert_eq!(f.scheme, None);
        assert_eq!(f.netloc.as_deref(), Some("host"));
        roundtrip("//host/path");
    }

    #[test]
    fn absolute_form() {
        let f = split("mailto:user@example.com");
        assert_eq!(f.kind, Some(Kind::Absolute));
        assert_eq!(f.scheme.as_deref(), Some("mailto"));
        assert_eq!(f.netloc.as_deref(), Some("user@example.com"));
        roundtrip("mailto:user@example.com");
    }

    #[test]
    fn none_form_bare_reference() {
        // No scheme, no leading "//": cursor stays at 0, so the unified
        // netloc scan still captures whatever precedes the first slash.
        let f = split("a/b/c");
        assert_eq!(f.kind, Some(Kind::None));
        assert_eq!(f.netloc.as_deref(), Some("a"));
        assert_eq!(f.path.as_deref(), Some("b/c"));
        roundtrip("a/b/c");
    }

    #[test]
    fn none_form_leading_slash_has_no_netloc() {
        let f = split("/a/b");
        assert_eq!(f.kind, Some(Kind::None));
        assert_eq!(f.netloc, None);
        assert_eq!(f.path.as_deref(), Some("a/b"));
        roundtrip("/a/b");
    }

    #[test]
    fn amorphous_invalid_scheme_chars_roundtrips() {
        let f = split("bad!scheme:rest/path");
        assert_eq!(f.kind, Some(Kind::Amorphous));
        assert_eq!(f.scheme, None);
        roundtrip("bad!scheme:rest/path");
    }

    #[test]
    fn amorphous_digit_netloc_roundtrips() {
        let f = split("8080:9090");
        assert_eq!(f.kind, Some(Kind::Amorphous));
        assert_eq!(f.scheme, None);
        assert_eq!(f.netloc.as_deref(), Some("8080:9090"));
        roundtrip("8080:9090");
    }

    #[test]
    fn fragment_before_query_demotes_query() {
        // '#' occurs before what would otherwise be a '?' delimiter, so
        // everything after '#' — including the '?' — is fragment text.
        let f = split("http://host/path#frag?notquery");
        assert_eq!(f.path.as_deref(), Some("path"));
        assert_eq!(f.query, None);
        assert_eq!(f.fragment.as_deref(), Some("frag?notquery"));
        roundtrip("http://host/path#frag?notquery");
    }

    #[test]
    fn trailing_slash_preserves_empty_path() {
        let f = split("http://host/");
        assert_eq!(f.path.as_deref(), Some(""));
        roundtrip("http://host/");
    }

    #[test]
    fn no_markers_at_all() {
        let f = split("just-a-token");
        assert_eq!(f.kind, Some(Kind::None));
        assert_eq!(f.netloc.as_deref(), Some("just-a-token"));
        roundtrip("just-a-token");
    }
}
