//! Endpoint URL handling
//!
//! Persona URLs are stored as the service's API root (for example
//! `http://localhost:11434/api`); every request path is joined onto it here.

/// Strip trailing slashes and surrounding whitespace from a persona URL.
///
/// ```
/// use meh::utils::url::normalize_base_url;
///
/// assert_eq!(normalize_base_url(" http://localhost:11434/api/ "), "http://localhost:11434/api");
/// ```
pub fn normalize_base_url(base_url: &str) -> String {
    base_url.trim().trim_end_matches('/').to_string()
}

/// Join an endpoint (`chat`, `generate`, `tags`) onto a persona URL.
///
/// ```
/// use meh::utils::url::construct_api_url;
///
/// assert_eq!(
///     construct_api_url("http://localhost:11434/api/", "/chat"),
///     "http://localhost:11434/api/chat"
/// );
/// ```
pub fn construct_api_url(base_url: &str, endpoint: &str) -> String {
    let normalized_base = normalize_base_url(base_url);
    let endpoint = endpoint.trim_start_matches('/');
    format!("{normalized_base}/{endpoint}")
}

/// Whether a user-entered URL has a scheme the HTTP client can talk to.
pub fn has_http_scheme(url: &str) -> bool {
    let url = url.trim();
    url.starts_with("http://") || url.starts_with("https://")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn joins_each_service_endpoint() {
        let base = "http://minty.local:11434/api";
        assert_eq!(construct_api_url(base, "chat"), "http://minty.local:11434/api/chat");
        assert_eq!(
            construct_api_url(base, "generate"),
            "http://minty.local:11434/api/generate"
        );
        assert_eq!(construct_api_url(base, "tags"), "http://minty.local:11434/api/tags");
    }

    #[test]
    fn collapses_repeated_slashes_at_the_seam() {
        assert_eq!(
            construct_api_url("http://x/api///", "//tags"),
            "http://x/api/tags"
        );
    }

    #[test]
    fn scheme_check() {
        assert!(has_http_scheme("http://localhost:11434/api"));
        assert!(has_http_scheme("  https://host/api"));
        assert!(!has_http_scheme("localhost:11434"));
        assert!(!has_http_scheme(""));
    }
}
