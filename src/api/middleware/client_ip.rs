//! Client IP resolution from proxy headers.

use std::net::{IpAddr, SocketAddr};

use axum::http::HeaderMap;

/// Sentinel returned when no header carries a parseable address.
pub const ANONYMOUS_IP: &str = "anonymous";

/// Headers consulted in order. `X-Forwarded-For` contributes its leftmost
/// entry (the original client).
const IP_HEADERS: [&str; 3] = ["x-forwarded-for", "x-real-ip", "cf-connecting-ip"];

/// Resolve a best-effort client IP, or [`ANONYMOUS_IP`].
pub fn resolve_client_ip(headers: &HeaderMap) -> String {
    IP_HEADERS
        .iter()
        .filter_map(|name| headers.get(*name))
        .filter_map(|value| value.to_str().ok())
        .filter_map(|value| value.split(',').next())
        .find_map(parse_ip_candidate)
        .map(|ip| ip.to_string())
        .unwrap_or_else(|| ANONYMOUS_IP.to_string())
}

/// Parse a single header candidate, tolerating `[v6]`, `[v6]:port` and
/// `v4:port` forms.
fn parse_ip_candidate(raw: &str) -> Option<IpAddr> {
    let candidate = raw.trim();
    if candidate.is_empty() {
        return None;
    }

    if let Ok(ip) = candidate.parse::<IpAddr>() {
        return Some(ip);
    }
    if let Ok(addr) = candidate.parse::<SocketAddr>() {
        return Some(addr.ip());
    }

    candidate
        .strip_prefix('[')
        .and_then(|rest| rest.strip_suffix(']'))
        .and_then(|inner| inner.parse::<IpAddr>().ok())
}
