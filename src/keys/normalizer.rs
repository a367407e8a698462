//! Accessor-name to key conversion.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

static BOUNDARY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(.)([A-Z0-9])").expect("boundary pattern should compile"));

static GLOBAL: Lazy<Arc<KeyNormalizer>> = Lazy::new(|| Arc::new(KeyNormalizer::new()));

/// KeyNormalizer converts accessor-style names (`FirstData`) into
/// canonical snake_case keys (`first_data`), memoizing every conversion.
///
/// The cache is pure: dropping or resetting it only costs recomputation.
#[derive(Debug, Default)]
pub struct KeyNormalizer {
    cache: Mutex<HashMap<String, String>>,
}

impl KeyNormalizer {
    /// Creates a normalizer with an empty cache.
    pub fn new() -> Self {
        KeyNormalizer {
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the lazily created process-wide normalizer.
    pub fn global() -> Arc<KeyNormalizer> {
        Arc::clone(&GLOBAL)
    }

    /// Converts a name, consulting the cache first.
    pub fn normalize(&self, name: &str) -> String {
        let mut cache = self.cache.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(key) = cache.get(name) {
            return key.clone();
        }

        let key = convert(name);
        cache.insert(name.to_string(), key.clone());
        key
    }

    /// Number of memoized names.
    pub fn cached(&self) -> usize {
        self.cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Drops every memoized conversion.
    pub fn reset(&self) {
        self.cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

fn convert(name: &str) -> String {
    BOUNDARY.replace_all(name, "${1}_${2}").to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_camel_case() {
        let normalizer = KeyNormalizer::new();
        assert_eq!(normalizer.normalize("FirstData"), "first_data");
        assert_eq!(normalizer.normalize("DataNotExists"), "data_not_exists");
        assert_eq!(normalizer.normalize("Data2"), "data_2");
        assert_eq!(normalizer.normalize("plain"), "plain");
    }

    #[test]
    fn test_normalize_is_memoized() {
        let normalizer = KeyNormalizer::new();
        normalizer.normalize("FirstData");
        normalizer.normalize("FirstData");
        assert_eq!(normalizer.cached(), 1);

        normalizer.reset();
        assert_eq!(normalizer.cached(), 0);
        assert_eq!(normalizer.normalize("FirstData"), "first_data");
    }

    #[test]
    fn test_global_is_shared() {
        let a = KeyNormalizer::global();
        let b = KeyNormalizer::global();
        assert!(Arc::ptr_eq(&a, &b));
    }
}
