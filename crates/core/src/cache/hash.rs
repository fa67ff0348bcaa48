//! Request descriptor keys for cache entries.

use sha2::{Digest, Sha256};

/// Compute the cache key for a request descriptor.
///
/// The method is uppercased so `get` and `GET` address the same entry.
pub fn compute_request_key(method: &str, url: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(method.to_ascii_uppercase().as_bytes());
    hasher.update(b"\n");
    hasher.update(url.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_stability() {
        let key1 = compute_request_key("GET", "https://jane.dev/");
        let key2 = compute_request_key("GET", "https://jane.dev/");
        assert_eq!(key1, key2);
    }

    #[test]
    fn test_key_method_case_insensitive() {
        assert_eq!(compute_request_key("get", "https://jane.dev/"), compute_request_key("GET", "https://jane.dev/"));
    }

    #[test]
    fn test_key_different_method() {
        assert_ne!(compute_request_key("GET", "https://jane.dev/"), compute_request_key("HEAD", "https://jane.dev/"));
    }

    #[test]
    fn test_key_different_query() {
        let a = compute_request_key("GET", "https://jane.dev/?page=1");
        let b = compute_request_key("GET", "https://jane.dev/?page=2");
        assert_ne!(a, b);
    }

    #[test]
    fn test_key_format() {
        let key = compute_request_key("GET", "https://jane.dev/");
        assert_eq!(key.len(), 64);
        assert!(key.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
