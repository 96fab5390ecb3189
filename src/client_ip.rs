use axum::http::HeaderMap;

/// Address returned when no proxy header identifies the client
///
/// Requests from an unknown address are never rate limited (fail-open).
pub const UNKNOWN_CLIENT: &str = "unknown";

/// Derive the client address from proxy-forwarded headers
///
/// Precedence: CDN header, then generic real-IP header, then the first entry
/// of the forwarded-for list. The service always sits behind a proxy, so the
/// socket address is not consulted.
pub fn client_ip(headers: &HeaderMap) -> String {
    if let Some(ip) = header_str(headers, "cf-connecting-ip") {
        return ip.to_string();
    }
    if let Some(ip) = header_str(headers, "x-real-ip") {
        return ip.to_string();
    }
    if let Some(forwarded) = header_str(headers, "x-forwarded-for") {
        // x-forwarded-for can contain multiple addresses, take the first one
        if let Some(first) = forwarded.split(',').next() {
            let first = first.trim();
            if !first.is_empty() {
                return first.to_string();
            }
        }
    }
    UNKNOWN_CLIENT.to_string()
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
}
