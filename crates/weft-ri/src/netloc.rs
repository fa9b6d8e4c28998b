//! `split_netloc`/`join_netloc`: userinfo/host/address/port splitting.
//!
//! Ported from `internet/ri.py::split_netloc`/`join_netloc`.

use crate::percent::{self, Component};

/// The netloc broken into its userinfo/host/port parts, with percent-escapes
/// preserved verbatim (matching the split form's contract).
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct NetlocForm {
    pub user: Option<String>,
    pub password: Option<String>,
    /// Plain host name or bracketed IPv6/extension literal's inner text is
    /// NOT unwrapped here; see [`split_netloc`] for bracket handling.
    pub host: Option<String>,
    /// Set instead of `host` when the netloc carried a bracketed literal,
    /// e.g. `[::1]`. Stored without the brackets.
    pub address: Option<String>,
    pub port: Option<String>,
}

/// Split a netloc string into `(user, password, host_or_address, port)`.
pub fn split_netloc(netloc: &str) -> NetlocForm {
    let (userinfo, rest) = match netloc.rfind('@') {
        Some(at) => (Some(&netloc[..at]), &netloc[at + 1..]),
        None => (None, netloc),
    };

    let (user, password) = match userinfo {
        None => (None, None),
        Some(info) => match info.split_once(':') {
            Some((u, p)) => (Some(u.to_string()), Some(p.to_string())),
            None => (Some(info.to_string()), None),
        },
    };

    if rest.is_empty() {
        return NetlocForm {
            user,
            password,
            host: None,
            address: None,
            port: None,
        };
    }

    if let Some(bracketed) = rest.strip_prefix('[') {
        let (inner, after) = match bracketed.find(']') {
            Some(close) => (&bracketed[..close], &bracketed[close + 1..]),
            // Unterminated bracket: consume the remainder as the address,
            // matching the original's `next_pos == -1 -> len(netloc) - 1`.
            None => (bracketed, ""),
        };
        let port = after.strip_prefix(':').map(|p| p.to_string());
        return NetlocForm {
            user,
            password,
            host: None,
            address: Some(inner.to_string()),
            port,
        };
    }

    match rest.split_once(':') {
        Some((host, port)) => NetlocForm {
            user,
            password,
            host: Some(host.to_string()),
            address: None,
            port: Some(port.to_string()),
        },
        None => NetlocForm {
            user,
            password,
            host: Some(rest.to_string()),
            address: None,
            port: None,
        },
    }
}

/// Rejoin a netloc form into its string representation, percent-escaping
/// each field according to its own reserved-character table.
pub fn join_netloc(form: &NetlocForm, strict: bool) -> Option<String> {
    if form.user.is_none() && form.host.is_none() && form.address.is_none() {
        return None;
    }

    let mut s = String::new();
    if let Some(user) = &form.user {
        s.push_str(&percent::encode(user, Component::User, strict));
        if let Some(password) = &form.password {
            s.push(':');
            s.push_str(&percent::encode(password, Component::Password, strict));
        }
        s.push('@');
    }

    if let Some(host) = &form.host {
        s.push_str(&percent::encode(host, Component::Primary, strict));
    } else if let Some(address) = &form.address {
        s.push('[');
        s.push_str(address);
        s.push(']');
    }

    if let Some(port) = &form.port {
        s.push(':');
        s.push_str(&percent::encode(port, Component::Primary, strict));
    }

    Some(s)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn userinfo_and_port() {
        let f = split_netloc("alice:secret@host.example:8080");
        assert_eq!(f.user.as_deref(), Some("alice"));
        assert_eq!(f.password.as_deref(), Some("secret"));
        assert_eq!(f.host.as_deref(), Some("host.example"));
        assert_eq!(f.port.as_deref(), Some("8080"));
    }

    #[test]
    fn user_only_no_password() {
        let f = split_netloc("bob@host");
        assert_eq!(f.user.as_deref(), Some("bob"));
        assert_eq!(f.password, None);
    }

    #[test]
    fn bracketed_ipv6_with_port() {
        let f = split_netloc("[::1]:9000");
        assert_eq!(f.address.as_deref(), Some("::1"));
        assert_eq!(f.host, None);
        assert_eq!(f.port.as_deref(), Some("9000"));
    }

    #[test]
    fn unterminated_bracket_consumes_remainder() {
        let f = split_netloc("[::1");
        assert_eq!(f.address.as_deref(), Some("::1"));
        assert_eq!(f.port, None);
    }

    #[test]
    fn no_userinfo_plain_host() {
        let f = split_netloc("host.example");
        assert_eq!(f.user, None);
        assert_eq!(f.host.as_deref(), Some("host.example"));
        assert_eq!(f.port, None);
    }

    #[test]
    fn join_roundtrips_simple_case() {
        let form = NetlocForm {
            user: Some("alice".into()),
            password: None,
            host: Some("host.example".into()),
            address: None,
            port: Some("8080".into()),
        };
        assert_eq!(
            join_netloc(&form, false).as_deref(),
            Some("alice@host.example:8080")
        );
    }

    #[test]
    fn join_empty_netloc_is_none() {
        let form = NetlocForm::default();
        assert_eq!(join_netloc(&form, false), None);
    }
}
