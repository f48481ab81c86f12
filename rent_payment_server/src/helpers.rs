use std::{net::IpAddr, str::FromStr, sync::OnceLock};

use actix_web::HttpRequest;
use log::{debug, trace};
use regex::Regex;

fn forwarded_for_regex() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"for="?\[?(?P<ip>[^;,"\]]+)"#).ok()).as_ref()
}

/// Get the remote IP address from the request. It uses 3 sources to determine the IP address, in decreasing order
/// of preference:
/// 1. The `X-Forwarded-For` header, iif `use_x_forwarded_for` is set to true in the configuration.
/// 2. The `Forwarded` header, iif `use_forwarded` is set to true in the configuration.
/// 3. The peer address from the connection info.
pub fn get_remote_ip(req: &HttpRequest, use_x_forwarded_for: bool, use_forwarded: bool) -> Option<IpAddr> {
    let mut result = None;
    if use_x_forwarded_for {
        trace!("Checking X-Forwarded-For header");
        // The left-most entry is the originating client
        result = req
            .headers()
            .get("X-Forwarded-For")
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.split(',').next())
            .and_then(|s| IpAddr::from_str(s.trim()).ok());
        if let Some(ip) = result {
            debug!("Using X-Forwarded-For header for remote address: {ip}");
        }
    }
    if use_forwarded && result.is_none() {
        trace!("Checking Forwarded header");
        result = req
            .headers()
            .get("Forwarded")
            .and_then(|v| v.to_str().ok())
            .zip(forwarded_for_regex())
            .and_then(|(v, re)| re.captures(v))
            .and_then(|caps| caps.name("ip"))
            .map(|m| m.as_str())
            .and_then(|s| IpAddr::from_str(s).ok());
        if let Some(ip) = result {
            debug!("Using Forwarded header for remote address: {ip}");
        }
    }
    result.or_else(|| {
        let peer_addr = req.peer_addr().map(|a| a.ip());
        trace!("Using Peer address for remote address: {:?}", peer_addr);
        peer_addr
    })
}

/// `None` means that no whitelist is configured, and every peer is allowed.
pub fn is_whitelisted(peer: Option<IpAddr>, whitelist: Option<&[IpAddr]>) -> bool {
    match (peer, whitelist) {
        (_, None) => true,
        (Some(ip), Some(list)) => list.contains(&ip),
        (None, Some(_)) => false,
    }
}

#[cfg(test)]
mod test {
    use std::net::SocketAddr;

    use actix_web::test::TestRequest;

    use super::*;

    fn peer() -> SocketAddr {
        "10.0.0.5:40000".parse().unwrap()
    }

    #[test]
    fn peer_address_is_the_fallback() {
        let req = TestRequest::default()
            .peer_addr(peer())
            .insert_header(("X-Forwarded-For", "196.201.214.200"))
            .to_http_request();
        assert_eq!(get_remote_ip(&req, false, false), Some("10.0.0.5".parse().unwrap()));
    }

    #[test]
    fn forwarded_headers_when_trusted() {
        let req = TestRequest::default()
            .peer_addr(peer())
            .insert_header(("X-Forwarded-For", "196.201.214.200, 10.0.0.1"))
            .to_http_request();
        assert_eq!(get_remote_ip(&req, true, false), Some("196.201.214.200".parse().unwrap()));

        let req = TestRequest::default()
            .peer_addr(peer())
            .insert_header(("Forwarded", "for=196.201.214.206;proto=https"))
            .to_http_request();
        assert_eq!(get_remote_ip(&req, false, true), Some("196.201.214.206".parse().unwrap()));
        assert_eq!(get_remote_ip(&req, true, false), Some("10.0.0.5".parse().unwrap()));
    }

    #[test]
    fn whitelist_checks() {
        let ip: IpAddr = "196.201.214.200".parse().unwrap();
        let other: IpAddr = "8.8.8.8".parse().unwrap();
        let list = vec![ip];
        assert!(is_whitelisted(Some(other), None));
        assert!(is_whitelisted(None, None));
        assert!(is_whitelisted(Some(ip), Some(&list)));
        assert!(!is_whitelisted(Some(other), Some(&list)));
        assert!(!is_whitelisted(None, Some(&list)));
    }
}
