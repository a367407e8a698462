//! Parsing of accessor names such as `getFirstData` into a verb and a key.

use super::normalizer::KeyNormalizer;
use std::fmt;

/// Verb is the operation an accessor name asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Verb {
    Get,
    Set,
    Has,
    /// Strict inequality against the stored value.
    Not,
    Unset,
    Clear,
    Restore,
    /// Strict equality against the stored value.
    Is,
}

impl Verb {
    // Checked in this order; `is` must come after the longer prefixes.
    const PREFIXES: [(&'static str, Verb); 8] = [
        ("get", Verb::Get),
        ("set", Verb::Set),
        ("has", Verb::Has),
        ("not", Verb::Not),
        ("unset", Verb::Unset),
        ("clear", Verb::Clear),
        ("restore", Verb::Restore),
        ("is", Verb::Is),
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Verb::Get => "get",
            Verb::Set => "set",
            Verb::Has => "has",
            Verb::Not => "not",
            Verb::Unset => "unset",
            Verb::Clear => "clear",
            Verb::Restore => "restore",
            Verb::Is => "is",
        }
    }
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Accessor is a parsed accessor name.
///
/// An empty key means the accessor addresses the whole data set
/// (`get` / `unset` / `restore` with nothing after the verb).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Accessor {
    pub verb: Verb,
    pub key: String,
}

impl Accessor {
    /// Parses an accessor name, normalizing the key part.
    ///
    /// Returns None when the name does not start with a known verb.
    pub fn parse(name: &str, normalizer: &KeyNormalizer) -> Option<Accessor> {
        Verb::PREFIXES.iter().find_map(|(prefix, verb)| {
            name.strip_prefix(prefix).map(|rest| Accessor {
                verb: *verb,
                key: normalizer.normalize(rest),
            })
        })
    }

    /// Returns the key, or None when the accessor addresses all data.
    pub fn key(&self) -> Option<&str> {
        if self.key.is_empty() {
            None
        } else {
            Some(&self.key)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_verbs() {
        let normalizer = KeyNormalizer::new();

        let get = Accessor::parse("getFirstData", &normalizer).unwrap();
        assert_eq!(get.verb, Verb::Get);
        assert_eq!(get.key, "first_data");

        let unset = Accessor::parse("unsetDataSecond", &normalizer).unwrap();
        assert_eq!(unset.verb, Verb::Unset);
        assert_eq!(unset.key, "data_second");

        let is = Accessor::parse("isDataFirst", &normalizer).unwrap();
        assert_eq!(is.verb, Verb::Is);
        assert_eq!(is.key, "data_first");
    }

    #[test]
    fn test_parse_whole_data_accessor() {
        let normalizer = KeyNormalizer::new();
        let restore = Accessor::parse("restore", &normalizer).unwrap();
        assert_eq!(restore.verb, Verb::Restore);
        assert_eq!(restore.key(), None);
    }

    #[test]
    fn test_parse_unknown_verb() {
        let normalizer = KeyNormalizer::new();
        assert!(Accessor::parse("executeNonExistingMethod", &normalizer).is_none());
    }
}
