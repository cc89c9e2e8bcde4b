//! Pure pattern matching functions for cache keys.
//!
//! Invalidation patterns are literal substrings: a key matches when the
//! pattern occurs anywhere inside it. Characters such as `*` or `?` carry
//! no special meaning.

/// Checks if a cache key contains the given pattern.
///
/// An empty pattern matches every key.
///
/// # Examples
///
/// ```
/// use storecache_core::cache::key_matches;
///
/// assert!(key_matches("products", "products:limit:20|page:1"));
/// assert!(key_matches("page:1", "products:limit:20|page:1"));
/// assert!(!key_matches("orders", "products:limit:20|page:1"));
///
/// // `*` is matched literally.
/// assert!(!key_matches("products:*", "products:limit:20"));
/// ```
pub fn key_matches(pattern: &str, key: &str) -> bool {
    key.contains(pattern)
}

/// Collects an owned snapshot of every key that matches `pattern`.
///
/// Callers remove the returned keys afterwards, so the store is never
/// mutated while it is being enumerated.
pub fn matching_keys<'a, I>(pattern: &str, keys: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a String>,
{
    keys.into_iter()
        .filter(|key| key_matches(pattern, key))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_match() {
        assert!(key_matches("wallets", "wallets"));
        assert!(key_matches("orders:id:42", "orders:id:42"));
    }

    #[test]
    fn test_prefix_match() {
        assert!(key_matches("products", "products:limit:20|page:1"));
        assert!(key_matches("products:", "products:category:\"shoes\""));
    }

    #[test]
    fn test_substring_in_middle() {
        assert!(key_matches("page:2", "products:limit:20|page:2"));
        assert!(key_matches("\"paid\"", "payments:status:\"paid\""));
    }

    #[test]
    fn test_no_match() {
        assert!(!key_matches("orders", "products:limit:20"));
        assert!(!key_matches("products:limit:50", "products:limit:20"));
    }

    #[test]
    fn test_wildcards_are_literal() {
        assert!(!key_matches("products:*", "products:limit:20"));
        assert!(!key_matches("*", "anything"));
        assert!(key_matches("*", "odd:*:key"));
    }

    #[test]
    fn test_empty_pattern_matches_everything() {
        assert!(key_matches("", "products"));
        assert!(key_matches("", ""));
    }

    #[test]
    fn test_empty_key() {
        assert!(!key_matches("products", ""));
    }

    #[test]
    fn test_pattern_is_case_sensitive() {
        assert!(!key_matches("Products", "products:page:1"));
    }

    #[test]
    fn test_matching_keys_snapshot() {
        let keys = vec![
            "products:page:1".to_string(),
            "products:page:2".to_string(),
            "orders:page:1".to_string(),
            "featured_products".to_string(),
        ];

        let mut matched = matching_keys("products", &keys);
        matched.sort();

        assert_eq!(
            matched,
            vec![
                "featured_products".to_string(),
                "products:page:1".to_string(),
                "products:page:2".to_string(),
            ]
        );
    }

    #[test]
    fn test_matching_keys_none() {
        let keys = vec!["orders:page:1".to_string()];
        assert!(matching_keys("wallets", &keys).is_empty());
    }
}
