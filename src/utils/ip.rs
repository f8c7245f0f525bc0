//! Client address resolution
//!
//! The rate limiter keys clients by address. The peer address of the TCP
//! connection is used unless the peer is a configured trusted proxy, in
//! which case the first `X-Forwarded-For` hop (or `X-Real-IP`) wins.

use std::net::{IpAddr, SocketAddr};

use actix_web::http::header::HeaderMap;
use tracing::debug;

/// Key used when neither the peer nor a forwarded header yields an address
pub const UNKNOWN_CLIENT: &str = "unknown";

/// Parses `ip` or `ip:port`
fn parse_ip(raw: &str) -> Option<IpAddr> {
    raw.parse::<SocketAddr>()
        .map(|addr| addr.ip())
        .or_else(|_| raw.parse::<IpAddr>())
        .ok()
}

/// 检查 IP 是否在可信代理列表中（支持单 IP 与 CIDR）
pub fn is_trusted_proxy(ip: &str, trusted_proxies: &[String]) -> bool {
    let Some(ip_addr) = parse_ip(ip) else {
        return false;
    };

    trusted_proxies.iter().any(|proxy| match proxy.split_once('/') {
        Some(_) => ip_in_cidr(&ip_addr, proxy),
        None => proxy.parse::<IpAddr>().is_ok_and(|p| p == ip_addr),
    })
}

/// CIDR 检查
pub fn ip_in_cidr(ip: &IpAddr, cidr: &str) -> bool {
    let Some((network, prefix_len)) = cidr.split_once('/') else {
        return false;
    };
    let Ok(prefix_len) = prefix_len.parse::<u32>() else {
        return false;
    };
    let Ok(network) = network.parse::<IpAddr>() else {
        return false;
    };

    match (ip, network) {
        (IpAddr::V4(ip), IpAddr::V4(net)) if prefix_len <= 32 => {
            let mask = u32::MAX.checked_shl(32 - prefix_len).unwrap_or(0);
            u32::from(*ip) & mask == u32::from(net) & mask
        }
        (IpAddr::V6(ip), IpAddr::V6(net)) if prefix_len <= 128 => {
            let mask = u128::MAX.checked_shl(128 - prefix_len).unwrap_or(0);
            u128::from(*ip) & mask == u128::from(net) & mask
        }
        _ => false,
    }
}

/// 从请求头提取转发的 IP（X-Forwarded-For 第一跳，其次 X-Real-IP）
pub fn extract_forwarded_ip_from_headers(headers: &HeaderMap) -> Option<String> {
    headers
        .get("x-forwarded-for")
        .and_then(|h| h.to_str().ok())
        .and_then(|s| s.split(',').next())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .or_else(|| {
            headers
                .get("x-real-ip")
                .and_then(|h| h.to_str().ok())
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
        })
}

/// Resolves the address a request is attributed to.
///
/// `peer` is the connection's remote address (`ip` or `ip:port`).
pub fn resolve_client_ip(
    peer: Option<&str>,
    headers: &HeaderMap,
    trusted_proxies: &[String],
) -> String {
    let Some(peer) = peer else {
        return UNKNOWN_CLIENT.to_string();
    };
    let peer_ip = parse_ip(peer).map_or_else(|| peer.to_string(), |ip| ip.to_string());

    if !trusted_proxies.is_empty()
        && is_trusted_proxy(peer, trusted_proxies)
        && let Some(forwarded) = extract_forwarded_ip_from_headers(headers)
    {
        debug!("Trusted proxy {} forwarded for {}", peer_ip, forwarded);
        return forwarded;
    }

    peer_ip
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::http::header::{HeaderName, HeaderValue};

    fn headers(pairs: &[(&'static str, &'static str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.insert(
                HeaderName::from_static(name),
                HeaderValue::from_static(value),
            );
        }
        map
    }

    #[test]
    fn test_ip_in_cidr() {
        let ip: IpAddr = "192.168.1.100".parse().unwrap();
        assert!(ip_in_cidr(&ip, "192.168.1.0/24"));
        assert!(ip_in_cidr(&ip, "192.168.0.0/16"));
        assert!(ip_in_cidr(&ip, "0.0.0.0/0"));
        assert!(!ip_in_cidr(&ip, "192.168.2.0/24"));
        assert!(!ip_in_cidr(&ip, "192.168.1.0/33"));

        let ip6: IpAddr = "2001:db8::1".parse().unwrap();
        assert!(ip_in_cidr(&ip6, "2001:db8::/32"));
        assert!(!ip_in_cidr(&ip6, "2001:db9::/32"));
        assert!(!ip_in_cidr(&ip6, "192.168.0.0/16"));
    }

    #[test]
    fn test_is_trusted_proxy() {
        let proxies = vec!["127.0.0.1".to_string(), "10.0.0.0/8".to_string()];

        assert!(is_trusted_proxy("127.0.0.1", &proxies));
        assert!(is_trusted_proxy("127.0.0.1:8080", &proxies));
        assert!(is_trusted_proxy("10.2.3.4", &proxies));
        assert!(!is_trusted_proxy("8.8.8.8", &proxies));
        assert!(!is_trusted_proxy("not-an-ip", &proxies));
    }

    #[test]
    fn test_forwarded_header_precedence() {
        let map = headers(&[
            ("x-forwarded-for", "203.0.113.7, 10.0.0.1"),
            ("x-real-ip", "198.51.100.1"),
        ]);
        assert_eq!(
            extract_forwarded_ip_from_headers(&map).as_deref(),
            Some("203.0.113.7")
        );

        let map = headers(&[("x-real-ip", "198.51.100.1")]);
        assert_eq!(
            extract_forwarded_ip_from_headers(&map).as_deref(),
            Some("198.51.100.1")
        );
    }

    #[test]
    fn test_resolve_client_ip_ignores_untrusted_forwarding() {
        let map = headers(&[("x-forwarded-for", "203.0.113.7")]);

        // 未配置可信代理：不信任请求头
        assert_eq!(resolve_client_ip(Some("8.8.8.8:5000"), &map, &[]), "8.8.8.8");

        let proxies = vec!["127.0.0.1".to_string()];
        assert_eq!(
            resolve_client_ip(Some("8.8.8.8:5000"), &map, &proxies),
            "8.8.8.8"
        );
        assert_eq!(
            resolve_client_ip(Some("127.0.0.1:5000"), &map, &proxies),
            "203.0.113.7"
        );
    }

    #[test]
    fn test_resolve_client_ip_without_peer() {
        assert_eq!(resolve_client_ip(None, &HeaderMap::new(), &[]), UNKNOWN_CLIENT);
    }
}
