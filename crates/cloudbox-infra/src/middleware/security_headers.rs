use std::sync::Arc;

use axum::http::{header, HeaderValue};
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

/// Security headers configuration
#[derive(Clone, Debug, Default)]
pub struct SecurityHeadersConfig {
    /// Extra origins the public files are served from (CDN or public base URL)
    pub media_origins: Vec<String>,
    pub is_production: bool,
}

impl SecurityHeadersConfig {
    pub fn new(media_origins: Vec<String>, is_production: bool) -> Self {
        Self {
            media_origins,
            is_production,
        }
    }

    /// Build Content-Security-Policy header value
    pub fn build_csp(&self) -> String {
        let mut img_src = "img-src 'self' data:".to_string();
        let mut connect_src = "connect-src 'self'".to_string();
        for origin in &self.media_origins {
            img_src.push(' ');
            img_src.push_str(origin);
            connect_src.push(' ');
            connect_src.push_str(origin);
        }

        [
            "default-src 'self'".to_string(),
            "script-src 'self'".to_string(),
            "style-src 'self'".to_string(),
            img_src,
            "font-src 'self' data:".to_string(),
            connect_src,
            "frame-ancestors 'none'".to_string(),
        ]
        .join("; ")
    }
}

/// Security headers middleware
/// Adds security headers to all HTTP responses
pub async fn security_headers_middleware(
    State(config): State<Arc<SecurityHeadersConfig>>,
    request: Request,
    next: Next,
) -> Response {
    let mut response = next.run(request).await;

    let headers = response.headers_mut();

    headers.insert(
        header::X_CONTENT_TYPE_OPTIONS,
        HeaderValue::from_static("nosniff"),
    );
    headers.insert(header::X_FRAME_OPTIONS, HeaderValue::from_static("DENY"));
    headers.insert(
        header::REFERRER_POLICY,
        HeaderValue::from_static("strict-origin-when-cross-origin"),
    );

    // HSTS only in production, where TLS terminates in front of us
    if config.is_production {
        headers.insert(
            header::STRICT_TRANSPORT_SECURITY,
            HeaderValue::from_static("max-age=31536000; includeSubDomains"),
        );
    }

    if let Ok(header_value) = HeaderValue::from_str(&config.build_csp()) {
        headers.insert(header::CONTENT_SECURITY_POLICY, header_value);
    }

    headers.insert(
        "Permissions-Policy",
        HeaderValue::from_static("geolocation=(), microphone=(), camera=()"),
    );

    // Handlers serving public files set their own caching policy
    if !headers.contains_key(header::CACHE_CONTROL) {
        headers.insert(
            header::CACHE_CONTROL,
            HeaderValue::from_static("no-store, private"),
        );
    }

    response
}
