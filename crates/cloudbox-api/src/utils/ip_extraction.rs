//! Client identification for the upload log
//!
//! The client IP comes from `X-Forwarded-For` only as far as the configured
//! number of trusted proxies vouches for it, then `X-Real-IP`, then the
//! socket address.

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use axum::extract::{ConnectInfo, FromRequestParts};
use axum::http::{header, request::Parts, HeaderMap};
use cloudbox_core::models::{ClientInfo, UNKNOWN_CLIENT_VALUE};

use crate::state::AppState;

/// Extract the client IP from request headers
///
/// With `trusted_proxy_count` N > 0 the last N `X-Forwarded-For` entries were
/// appended by our own proxies; the entry appended by the outermost one is
/// the client. With N = 0 the forwarding headers are ignored entirely since
/// any client can set them.
pub fn extract_client_ip(
    headers: &HeaderMap,
    socket_addr: Option<&SocketAddr>,
    trusted_proxy_count: usize,
) -> String {
    if trusted_proxy_count > 0 {
        if let Some(ip) = headers
            .get("x-forwarded-for")
            .and_then(|value| value.to_str().ok())
            .and_then(|value| from_forwarded_for(value, trusted_proxy_count))
        {
            return ip;
        }

        if let Some(ip) = headers
            .get("x-real-ip")
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| is_valid_ip(value))
        {
            return ip.to_string();
        }
    }

    socket_addr
        .map(|addr| addr.ip().to_string())
        .unwrap_or_else(|| UNKNOWN_CLIENT_VALUE.to_string())
}

fn from_forwarded_for(header_value: &str, trusted_proxy_count: usize) -> Option<String> {
    let ips: Vec<&str> = header_value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect();

    // A chain shorter than the proxy count means a proxy was bypassed; the
    // leftmost entry is the best we have.
    let position = ips.len().saturating_sub(trusted_proxy_count);
    ips.get(position)
        .filter(|ip| is_valid_ip(ip))
        .map(|ip| ip.to_string())
}

fn is_valid_ip(ip_str: &str) -> bool {
    ip_str.parse::<IpAddr>().is_ok()
}

/// Extractor for the calling client's IP and user agent
#[derive(Debug, Clone)]
pub struct RequestClient(pub ClientInfo);

impl FromRequestParts<Arc<AppState>> for RequestClient {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let socket_addr = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr);
        let ip_address = extract_client_ip(
            &parts.headers,
            socket_addr,
            state.config.trusted_proxy_count(),
        );
        let user_agent = parts
            .headers
            .get(header::USER_AGENT)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default();

        Ok(RequestClient(ClientInfo::new(ip_address, user_agent)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers_with(name: &'static str, value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(name, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn test_single_proxy_uses_last_entry() {
        // Client -> Proxy -> Server; the proxy appends the address it saw
        assert_eq!(
            from_forwarded_for("203.0.113.7", 1).as_deref(),
            Some("203.0.113.7")
        );
        // A spoofed prefix is ignored
        assert_eq!(
            from_forwarded_for("1.2.3.4, 203.0.113.7", 1).as_deref(),
            Some("203.0.113.7")
        );
    }

    #[test]
    fn test_multiple_proxies() {
        // Client -> LB -> Proxy -> Server
        assert_eq!(
            from_forwarded_for("1.2.3.4, 203.0.113.7, 10.0.0.2", 2).as_deref(),
            Some("203.0.113.7")
        );
    }

    #[test]
    fn test_short_chain_and_garbage() {
        assert_eq!(
            from_forwarded_for("203.0.113.7", 3).as_deref(),
            Some("203.0.113.7")
        );
        assert_eq!(from_forwarded_for("not-an-ip", 1), None);
        assert_eq!(from_forwarded_for(" , ", 1), None);
    }

    #[test]
    fn test_ipv6() {
        assert_eq!(
            from_forwarded_for("2001:db8::1", 1).as_deref(),
            Some("2001:db8::1")
        );
    }

    #[test]
    fn test_no_trusted_proxies_ignores_headers() {
        let headers = headers_with("x-forwarded-for", "1.2.3.4");
        let socket: SocketAddr = "192.0.2.10:5555".parse().unwrap();
        assert_eq!(extract_client_ip(&headers, Some(&socket), 0), "192.0.2.10");
        assert_eq!(extract_client_ip(&headers, None, 0), "unknown");
    }

    #[test]
    fn test_real_ip_fallback() {
        let headers = headers_with("x-real-ip", " 198.51.100.4 ");
        assert_eq!(extract_client_ip(&headers, None, 1), "198.51.100.4");
    }

    #[test]
    fn test_socket_fallback() {
        let socket: SocketAddr = "[2001:db8::2]:443".parse().unwrap();
        assert_eq!(
            extract_client_ip(&HeaderMap::new(), Some(&socket), 1),
            "2001:db8::2"
        );
        assert_eq!(extract_client_ip(&HeaderMap::new(), None, 1), "unknown");
    }
}
