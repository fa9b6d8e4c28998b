//! RI-based endpoint realization (spec.md §8 scenario S4): turn a parsed
//! [`Ri`](weft_ri::Ri) into the host/port pair a transport needs to open a
//! connection, filling in the scheme's default port when the RI didn't
//! carry one explicitly.

use weft_ri::Ri;

/// Host and port resolved from a [`Ri`], ready to hand to a transport.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RealizedEndpoint {
    pub host: String,
    pub port: u16,
}

/// No scheme and no explicit port: nothing to realize a connection from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UnrealizableEndpoint;

impl std::fmt::Display for UnrealizableEndpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "RI has neither a host nor a port to realize an endpoint from")
    }
}

impl std::error::Error for UnrealizableEndpoint {}

fn default_port(scheme: &str) -> Option<u16> {
    match scheme {
        "http" | "ws" => Some(80),
        "https" | "wss" => Some(443),
        _ => None,
    }
}

/// Resolve `ri` into a connectable host/port pair, per S4: an explicit
/// port always wins; otherwise the scheme's well-known port is used.
pub fn realize(ri: &Ri) -> Result<RealizedEndpoint, UnrealizableEndpoint> {
    let host = ri.host.clone().or_else(|| ri.address.clone()).ok_or(UnrealizableEndpoint)?;
    let port = match &ri.port {
        Some(p) => p.parse::<u16>().ok(),
        None => ri.scheme.as_deref().and_then(default_port),
    }
    .ok_or(UnrealizableEndpoint)?;
    Ok(RealizedEndpoint { host, port })
}
