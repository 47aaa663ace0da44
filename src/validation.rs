//! URL and password checks applied before anything is stored

use url::Url;

/// Prefixes `http://` when the input carries neither `http://` nor `https://`
pub fn normalize_url(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("http://{}", trimmed)
    }
}

/// A URL is valid when it parses with both a scheme and a host
pub fn is_valid_url(candidate: &str) -> bool {
    match Url::parse(candidate) {
        Ok(parsed) => {
            !parsed.scheme().is_empty() && parsed.host_str().is_some_and(|h| !h.is_empty())
        }
        Err(_) => false,
    }
}

/// At least 8 characters, with at least one letter and one digit
pub fn is_strong_password(password: &str) -> bool {
    password.chars().count() >= 8
        && password.chars().any(char::is_alphabetic)
        && password.chars().any(|c| c.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_host_gets_http_scheme() {
        assert_eq!(normalize_url("example.com"), "http://example.com");
        assert_eq!(normalize_url("example.com/docs"), "http://example.com/docs");
        assert!(is_valid_url(&normalize_url("example.com")));
    }

    #[test]
    fn explicit_scheme_is_kept() {
        assert_eq!(normalize_url("https://rust-lang.org"), "https://rust-lang.org");
        assert_eq!(normalize_url("http://a.b"), "http://a.b");
    }

    #[test]
    fn text_with_spaces_is_rejected_after_normalization() {
        let normalized = normalize_url("not a url");
        assert_eq!(normalized, "http://not a url");
        assert!(!is_valid_url(&normalized));
    }

    #[test]
    fn url_without_host_is_rejected() {
        assert!(!is_valid_url("http://"));
        assert!(!is_valid_url("mailto:someone@example.com"));
        assert!(!is_valid_url(""));
    }

    #[test]
    fn password_rules() {
        assert!(is_strong_password("hunter22a"));
        assert!(!is_strong_password("short1a"));
        assert!(!is_strong_password("onlyletters"));
        assert!(!is_strong_password("1234567890"));
    }
}
