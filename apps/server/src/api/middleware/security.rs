//! Response hardening headers

use axum::{extract::Request, http::HeaderValue, middleware::Next, response::Response};

fn forwarded_https(req: &Request) -> bool {
    let proxied = req
        .headers()
        .get("x-forwarded-proto")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.eq_ignore_ascii_case("https"));
    let direct = req
        .uri()
        .scheme_str()
        .is_some_and(|s| s.eq_ignore_ascii_case("https"));
    proxied || direct
}

/// Adds the headers every JSON/PDF response of this API carries. HSTS is
/// only sent when the request arrived over HTTPS.
pub async fn security_headers_middleware(req: Request, next: Next) -> Response {
    let https = forwarded_https(&req);

    let mut response = next.run(req).await;
    let headers = response.headers_mut();

    for (name, value) in [
        ("x-content-type-options", "nosniff"),
        ("x-frame-options", "DENY"),
        ("referrer-policy", "no-referrer"),
        ("content-security-policy", "default-src 'none'"),
        ("cross-origin-opener-policy", "same-origin"),
        ("cross-origin-resource-policy", "same-site"),
    ] {
        headers.insert(name, HeaderValue::from_static(value));
    }

    if https {
        headers.insert(
            "strict-transport-security",
            HeaderValue::from_static("max-age=31536000; includeSubDomains"),
        );
    }

    response
}
