//! Client IP extraction utilities.

use std::net::SocketAddr;

use axum::{extract::ConnectInfo, http};

use crate::cli::ClientIpHeader;

/// Extract client IP address based on configuration.
///
/// If `ip_header` is set, the IP is read from that header and a missing or
/// invalid header is an error (no fallback to the socket address, which would
/// be the proxy's).
///
/// If `ip_header` is None, uses the SocketAddr from ConnectInfo.
pub fn extract_client_ip<B>(
    request: &http::Request<B>,
    ip_header: Option<ClientIpHeader>,
) -> Result<String, &'static str> {
    match ip_header {
        Some(header) => {
            let value = request
                .headers()
                .get(header.header_name())
                .ok_or("IP header not present")?
                .to_str()
                .map_err(|_| "IP header contains invalid characters")?;
            header.extract(value)
        }
        None => request
            .extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ci| ci.0.ip().to_string())
            .ok_or("No client IP available"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> http::request::Builder {
        http::Request::builder().uri("/api/user/login")
    }

    #[test]
    fn test_connect_info() {
        let mut req = request().body(()).unwrap();
        assert!(extract_client_ip(&req, None).is_err());

        req.extensions_mut()
            .insert(ConnectInfo(SocketAddr::from(([10, 0, 0, 7], 4000))));
        assert_eq!(extract_client_ip(&req, None).unwrap(), "10.0.0.7");
    }

    #[test]
    fn test_forwarded_for_takes_first_hop() {
        let req = request()
            .header("x-forwarded-for", "203.0.113.9, 10.0.0.1")
            .body(())
            .unwrap();
        assert_eq!(
            extract_client_ip(&req, Some(ClientIpHeader::XForwardedFor)).unwrap(),
            "203.0.113.9"
        );
    }

    #[test]
    fn test_real_ip() {
        let req = request().header("x-real-ip", "203.0.113.9").body(()).unwrap();
        assert_eq!(
            extract_client_ip(&req, Some(ClientIpHeader::XRealIp)).unwrap(),
            "203.0.113.9"
        );
    }

    #[test]
    fn test_configured_header_missing() {
        let mut req = request().body(()).unwrap();
        req.extensions_mut()
            .insert(ConnectInfo(SocketAddr::from(([10, 0, 0, 7], 4000))));
        assert!(extract_client_ip(&req, Some(ClientIpHeader::XForwardedFor)).is_err());
    }

    #[test]
    fn test_configured_header_garbage() {
        let req = request()
            .header("x-forwarded-for", "not-an-ip")
            .body(())
            .unwrap();
        assert!(extract_client_ip(&req, Some(ClientIpHeader::XForwardedFor)).is_err());
    }
}
