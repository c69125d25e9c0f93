//! Utility functions and helpers.

pub mod http;
pub mod log;
pub mod slug;

/// Join a server root and a server-relative link.
///
/// Links that are already absolute are returned unchanged.
pub fn resolve(server: &str, link: &str) -> String {
    if link.starts_with("http://") || link.starts_with("https://") {
        return link.to_string();
    }
    let server = server.trim_end_matches('/');
    if link.starts_with('/') {
        format!("{server}{link}")
    } else {
        format!("{server}/{link}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_relative_link() {
        assert_eq!(
            resolve("https://wiki.example.com/", "/rest/api/space?start=25"),
            "https://wiki.example.com/rest/api/space?start=25"
        );
        assert_eq!(
            resolve("https://wiki.example.com", "rest/api/space"),
            "https://wiki.example.com/rest/api/space"
        );
    }

    #[test]
    fn test_resolve_absolute_link() {
        assert_eq!(
            resolve("https://wiki.example.com", "https://other.example.com/x"),
            "https://other.example.com/x"
        );
    }
}
