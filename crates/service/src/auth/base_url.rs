//! Public base URL of the deployment, resolved per request.

use axum::http::HeaderMap;

fn header<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        // proxies may append a comma separated chain; the first hop is the client-facing one
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

/// Configured URL, then `x-forwarded-host` with `x-forwarded-proto`
/// (default `https`), then the platform-provided URL.
pub fn resolve_base_url(configured: Option<&str>, headers: &HeaderMap, platform: Option<&str>) -> Option<String> {
    if let Some(url) = configured.filter(|u| !u.trim().is_empty()) {
        return Some(url.trim().trim_end_matches('/').to_string());
    }
    if let Some(host) = header(headers, "x-forwarded-host") {
        let proto = header(headers, "x-forwarded-proto").unwrap_or("https");
        return Some(format!("{proto}://{host}"));
    }
    platform
        .filter(|u| !u.trim().is_empty())
        .map(|u| u.trim().trim_end_matches('/').to_string())
}

/// Last resort: the request `Host` over plain http.
pub fn host_fallback(headers: &HeaderMap) -> Option<String> {
    header(headers, "host").map(|h| format!("http://{h}"))
}
