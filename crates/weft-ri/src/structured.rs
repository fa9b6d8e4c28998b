//! The fully decoded, structured `Ri` record and the `parse`/`serialize`
//! entry points (`structure ∘ split` and `join ∘ construct` respectively).

use crate::netloc::{self, NetlocForm};
use crate::percent::{self, Component};
use crate::split::{self, Kind, SplitForm};

/// A fully parsed, percent-decoded Resource Indicator.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct Ri {
    pub kind: Option<Kind>,
    pub scheme: Option<String>,
    pub user: Option<String>,
    pub password: Option<String>,
    pub host: Option<String>,
    pub address: Option<String>,
    pub port: Option<String>,
    /// `None` when the RI had no `/`-delimited path at all; `Some(vec![])`
    /// when it had a path delimiter but nothing followed (e.g. a bare
    /// trailing slash).
    pub path: Option<Vec<String>>,
    /// `None` when there was no `?`; `Some(vec![])` when the query string
    /// was present but empty.
    pub query: Option<Vec<(String, Option<String>)>>,
    pub fragment: Option<String>,
}

fn parse_query(raw: &str) -> Vec<(String, Option<String>)> {
    raw.split('&')
        .map(|pair| match pair.split_once('=') {
            Some((k, v)) => (percent::decode(k), Some(percent::decode(v))),
            None => (percent::decode(pair), None),
        })
        .collect()
}

fn construct_query(pairs: &[(String, Option<String>)], strict: bool) -> String {
    pairs
        .iter()
        .map(|(k, v)| {
            let key = percent::encode(k, Component::QueryKey, strict);
            match v {
                Some(v) => format!("{key}={}", percent::encode(v, Component::QueryValue, strict)),
                None => key,
            }
        })
        .collect::<Vec<_>>()
        .join("&")
}

/// `structure`: turn a five-tuple split form into a decoded [`Ri`].
pub fn structure(form: &SplitForm) -> Ri {
    let mut ri = Ri {
        kind: form.kind,
        scheme: form.scheme.clone(),
        ..Default::default()
    };

    if let Some(netloc) = &form.netloc {
        let NetlocForm {
            user,
            password,
            host,
            address,
            port,
        } = netloc::split_netloc(netloc);
        ri.user = user.map(|s| percent::decode(&s));
        ri.password = password.map(|s| percent::decode(&s));
        ri.host = host.map(|s| percent::decode(&s));
        ri.address = address.map(|s| percent::decode(&s));
        ri.port = port.map(|s| percent::decode(&s));
    }

    ri.path = form.path.as_ref().map(|raw| {
        if raw.is_empty() {
            Vec::new()
        } else {
            raw.split('/').map(percent::decode).collect()
        }
    });

    ri.query = form.query.as_ref().map(|raw| {
        if raw.is_empty() {
            Vec::new()
        } else {
            parse_query(raw)
        }
    });

    ri.fragment = form.fragment.as_ref().map(|s| percent::decode(s));

    ri
}

/// `construct`: the inverse of [`structure`], re-escaping every field.
pub fn construct(ri: &Ri, strict: bool) -> SplitForm {
    let netloc_form = NetlocForm {
        user: ri.user.clone(),
        password: ri.password.clone(),
        host: ri.host.clone(),
        address: ri.address.clone(),
        port: ri.port.clone(),
    };

    let path = ri.path.as_ref().map(|segments| {
        segments
            .iter()
            .map(|s| percent::encode(s, Component::Primary, strict))
            .collect::<Vec<_>>()
            .join("/")
    });

    let query = ri
        .query
        .as_ref()
        .map(|pairs| construct_query(pairs, strict));

    let fragment = ri
        .fragment
        .as_ref()
        .map(|s| percent::encode(s, Component::Fragment, strict));

    SplitForm {
        kind: ri.kind,
        scheme: ri.scheme.clone(),
        netloc: netloc::join_netloc(&netloc_form, strict),
        path,
        query,
        fragment,
    }
}

/// Parse a Resource Indicator string into a decoded [`Ri`]. Synonym for
/// `structure(split(text))`; never fails (see [`crate::percent::decode`]).
pub fn parse(text: &str) -> Ri {
    structure(&split::split(text))
}

/// Serialize a decoded [`Ri`] back into a Resource Indicator string.
/// Synonym for `join(construct(ri))`.
pub fn serialize(ri: &Ri) -> String {
    split::join(&construct(ri, false))
}

/// As [`serialize`], but escaping the full strict reserved-character set
/// in every component instead of each component's minimal set.
pub fn serialize_strict(ri: &Ri) -> String {
    split::join(&construct(ri, true))
}

/// Render the HTTP request-target (`path[?query]`) for `ri`, defaulting to
/// `/` when there is no path. Grounded on `internet/ri.py::http()`; this is
/// the glue the TxProtocol/Invocations Router need to turn a parsed RI into
/// an `RLINE` URI field.
pub fn to_request_target(ri: &Ri) -> String {
    let path = match &ri.path {
        Some(segments) if !segments.is_empty() => segments
            .iter()
            .map(|s| percent::encode(s, Component::Primary, false))
            .collect::<Vec<_>>()
            .join("/"),
        _ => String::new(),
    };
    let path = format!("/{path}");

    match &ri.query {
        Some(pairs) => format!("{path}?{}", construct_query(pairs, false)),
        None => path,
    }
}
