use anyhow::Context;
use axum::http::{
    header::{ACCEPT, CONTENT_TYPE, ORIGIN},
    HeaderValue, Method,
};
use tower_http::cors::CorsLayer;

/// Build a layer that attaches CORS headers for the frontend's origin.
///
/// Credentialed requests require the allowed origin to match the request
/// origin exactly, so a wildcard is not an option.
pub fn layer(origin: &str) -> anyhow::Result<CorsLayer> {
    let origin: HeaderValue = origin
        .parse()
        .with_context(|| format!("Invalid CORS origin: {:?}", origin))?;

    Ok(CorsLayer::new()
        .allow_origin(origin)
        .allow_credentials(true)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([ACCEPT, CONTENT_TYPE, ORIGIN]))
}

#[cfg(test)]
mod test {
    use axum::{
        body::Body,
        http::{header, Request, StatusCode},
        routing::get,
        Router,
    };
    use tower::ServiceExt;

    use super::*;

    #[tokio::test]
    async fn preflight_allows_frontend_with_credentials() {
        let app = Router::new()
            .route("/api/budget", get(|| async { "ok" }))
            .layer(layer("http://localhost:5173").unwrap());

        let response = app
            .oneshot(
                Request::builder()
                    .method(Method::OPTIONS)
                    .uri("/api/budget")
                    .header(header::ORIGIN, "http://localhost:5173")
                    .header(header::ACCESS_CONTROL_REQUEST_METHOD, "DELETE")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(StatusCode::OK, response.status());
        assert_eq!(
            Some("http://localhost:5173"),
            response
                .headers()
                .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
                .and_then(|value| value.to_str().ok())
        );
        assert_eq!(
            Some("true"),
            response
                .headers()
                .get(header::ACCESS_CONTROL_ALLOW_CREDENTIALS)
                .and_then(|value| value.to_str().ok())
        );
    }

    #[test]
    fn rejects_unrepresentable_origin() {
        assert!(layer("http://bad\norigin").is_err());
    }
}
