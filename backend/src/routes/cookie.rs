//! Refresh token cookie
//!
//! The refresh token travels in an HttpOnly, SameSite=Strict cookie so
//! browser scripts never see it.

use axum::http::{header, HeaderMap};

/// Settings for the refresh token cookie
#[derive(Debug, Clone)]
pub struct RefreshCookie {
    name: String,
    secure: bool,
    max_age_secs: i64,
}

impl RefreshCookie {
    pub fn new(name: String, secure: bool, max_age_secs: i64) -> Self {
        Self {
            name,
            secure,
            max_age_secs,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Set-Cookie value carrying `token`
    pub fn build_set_cookie(&self, token: &str) -> String {
        let mut cookie = format!("{}={}; HttpOnly", self.name, token);
        if self.secure {
            cookie.push_str("; Secure");
        }
        cookie.push_str(&format!("; SameSite=Strict; Path=/; Max-Age={}", self.max_age_secs));
        cookie
    }

    /// Set-Cookie value that removes the cookie
    pub fn build_clear_cookie(&self) -> String {
        let mut cookie = format!("{}=; HttpOnly", self.name);
        if self.secure {
            cookie.push_str("; Secure");
        }
        cookie.push_str("; SameSite=Strict; Path=/; Max-Age=0");
        cookie
    }

    /// The refresh token sent by the client, if any
    pub fn read(&self, headers: &HeaderMap) -> Option<String> {
        extract_cookie(headers, &self.name).filter(|value| !value.is_empty())
    }
}

/// Extract a cookie value from headers
///
/// Looks through every Cookie header, not just the first.
pub fn extract_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .find_map(|pair| {
            let (key, value) = pair.trim().split_once('=')?;
            (key == name).then(|| value.to_string())
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_set_cookie_attributes() {
        let cookie = RefreshCookie::new("refreshToken".to_string(), true, 604800);
        let value = cookie.build_set_cookie("abc.def");

        assert!(value.starts_with("refreshToken=abc.def"));
        assert!(value.contains("HttpOnly"));
        assert!(value.contains("Secure"));
        assert!(value.contains("SameSite=Strict"));
        assert!(value.contains("Path=/"));
        assert!(value.contains("Max-Age=604800"));
    }

    #[test]
    fn test_insecure_cookie_for_development() {
        let cookie = RefreshCookie::new("refreshToken".to_string(), false, 60);
        assert!(!cookie.build_set_cookie("t").contains("Secure"));
        assert!(cookie.build_clear_cookie().contains("Max-Age=0"));
    }

    #[test]
    fn test_extract_cookie() {
        let mut headers = HeaderMap::new();
        headers.append(header::COOKIE, HeaderValue::from_static("theme=dark"));
        headers.append(
            header::COOKIE,
            HeaderValue::from_static("a=1; refreshToken=tok.en; b=2"),
        );

        assert_eq!(extract_cookie(&headers, "refreshToken"), Some("tok.en".to_string()));
        assert_eq!(extract_cookie(&headers, "theme"), Some("dark".to_string()));
        assert_eq!(extract_cookie(&headers, "missing"), None);
    }

    #[test]
    fn test_read_ignores_empty_cookie() {
        let cookie = RefreshCookie::new("refreshToken".to_string(), false, 60);
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_static("refreshToken="));
        assert!(cookie.read(&headers).is_none());
    }
}
