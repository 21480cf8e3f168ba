use axum::{
    async_trait,
    extract::{ConnectInfo, FromRequestParts},
    http::{request::Parts, HeaderMap},
};
use std::convert::Infallible;
use std::net::SocketAddr;

pub const UNKNOWN_IP: &str = "unknown";

/// Best-effort client address used as the rate-limit key.
///
/// Prefers `cf-connecting-ip`, then the first `x-forwarded-for` hop, then the
/// socket peer. Headers are client-controlled unless a proxy overwrites them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientIp(pub String);

impl ClientIp {
    pub fn resolve(headers: &HeaderMap, peer: Option<SocketAddr>) -> Self {
        if let Some(ip) = header_value(headers, "cf-connecting-ip") {
            return ClientIp(ip.to_string());
        }

        if let Some(first) = header_value(headers, "x-forwarded-for")
            .and_then(|v| v.split(',').next())
            .map(str::trim)
            .filter(|v| !v.is_empty())
        {
            return ClientIp(first.to_string());
        }

        match peer {
            Some(addr) => ClientIp(addr.ip().to_string()),
            None => ClientIp(UNKNOWN_IP.to_string()),
        }
    }
}

fn header_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

#[async_trait]
impl<S> FromRequestParts<S> for ClientIp
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let peer = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| *addr);

        Ok(ClientIp::resolve(&parts.headers, peer))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn prefers_cloudflare_header() {
        let mut headers = HeaderMap::new();
        headers.insert("cf-connecting-ip", HeaderValue::from_static("1.1.1.1"));
        headers.insert("x-forwarded-for", HeaderValue::from_static("2.2.2.2"));

        assert_eq!(ClientIp::resolve(&headers, None).0, "1.1.1.1");
    }

    #[test]
    fn takes_first_forwarded_hop() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-forwarded-for",
            HeaderValue::from_static(" 3.3.3.3 , 10.0.0.1"),
        );

        assert_eq!(ClientIp::resolve(&headers, None).0, "3.3.3.3");
    }

    #[test]
    fn falls_back_to_peer_then_unknown() {
        let peer: SocketAddr = "127.0.0.1:4000".parse().unwrap();

        assert_eq!(ClientIp::resolve(&HeaderMap::new(), Some(peer)).0, "127.0.0.1");
        assert_eq!(ClientIp::resolve(&HeaderMap::new(), None).0, UNKNOWN_IP);
    }
}
