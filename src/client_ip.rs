use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use async_trait::async_trait;
use axum::{
    extract::{ConnectInfo, FromRequestParts},
    http::{header::FORWARDED, request::Parts, HeaderMap},
};
use forwarded_header_value::ForwardedHeaderValue;
use tracing::debug;

const X_FORWARDED_FOR: &str = "x-forwarded-for";

/// The address of the client that made a request.
///
/// Proxy headers take precedence over the address of the connecting socket.
/// If neither is available the unspecified address is used, so all such
/// clients share one rate limit.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ClientIp(pub IpAddr);

fn forwarded_ip(headers: &HeaderMap) -> Option<IpAddr> {
    if let Some(value) = headers.get(FORWARDED).and_then(|value| value.to_str().ok()) {
        if let Some(ip) = ForwardedHeaderValue::from_forwarded(value)
            .ok()
            .and_then(|forwarded| forwarded.remotest_forwarded_for_ip())
        {
            return Some(ip);
        }
    }

    headers
        .get(X_FORWARDED_FOR)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| ForwardedHeaderValue::from_x_forwarded_for(value).ok())
        .and_then(|forwarded| forwarded.remotest_forwarded_for_ip())
}

#[async_trait]
impl<S> FromRequestParts<S> for ClientIp
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        if let Some(ip) = forwarded_ip(&parts.headers) {
            return Ok(Self(ip));
        }

        match parts.extensions.get::<ConnectInfo<SocketAddr>>() {
            Some(ConnectInfo(addr)) => Ok(Self(addr.ip())),
            None => {
                debug!("No client address available for request.");

                Ok(Self(IpAddr::V4(Ipv4Addr::UNSPECIFIED)))
            }
        }
    }
}

#[cfg(test)]
mod test {
    use axum::http::HeaderValue;

    use super::*;

    #[test]
    fn forwarded_header_wins() {
        let mut headers = HeaderMap::new();
        headers.insert(FORWARDED, HeaderValue::from_static("for=192.0.2.60;proto=http"));
        headers.insert(X_FORWARDED_FOR, HeaderValue::from_static("203.0.113.7"));

        assert_eq!(
            Some("192.0.2.60".parse::<IpAddr>().unwrap()),
            forwarded_ip(&headers)
        );
    }

    #[test]
    fn falls_back_to_x_forwarded_for() {
        let mut headers = HeaderMap::new();
        headers.insert(
            X_FORWARDED_FOR,
            HeaderValue::from_static("203.0.113.7, 10.0.0.1"),
        );

        assert_eq!(
            Some("203.0.113.7".parse::<IpAddr>().unwrap()),
            forwarded_ip(&headers)
        );
    }

    #[test]
    fn no_headers_no_ip() {
        assert_eq!(None, forwarded_ip(&HeaderMap::new()));
    }
}
