//! Construction options for containers.

use crate::codec::{Format, DEFAULT_INTEGER_KEY_PREFIX};
use crate::keys::KeyNormalizer;
use crate::rules::{Check, RuleError, TransformRules, ValidationRules};
use crate::value::Value;
use indexmap::IndexMap;
use serde::Deserialize;
use std::sync::Arc;
use thiserror::Error;

/// Separator used when joining data into flat text.
pub const DEFAULT_SEPARATOR: &str = ", ";

/// ConfigError is returned when options cannot be loaded.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid options document: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Rule(#[from] RuleError),
}

/// Options configures a new container.
///
/// `data` is interpreted according to `input_type`: text formats expect a
/// [`Value::String`], [`Format::Object`] accepts a [`Value::Object`] and
/// [`Format::Array`] accepts anything.
#[derive(Debug, Clone)]
pub struct Options {
    pub data: Option<Value>,
    pub input_type: Format,
    pub validation: ValidationRules,
    pub preparation: TransformRules,
    pub retrieve: TransformRules,
    pub integer_key_prefix: String,
    pub separator: String,
    pub normalizer: Option<Arc<KeyNormalizer>>,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            data: None,
            input_type: Format::Array,
            validation: ValidationRules::new(),
            preparation: TransformRules::new(),
            retrieve: TransformRules::new(),
            integer_key_prefix: DEFAULT_INTEGER_KEY_PREFIX.to_string(),
            separator: DEFAULT_SEPARATOR.to_string(),
            normalizer: None,
        }
    }
}

impl Options {
    /// Creates a new Options with defaults.
    pub fn new() -> Self {
        Options::default()
    }

    /// Sets the raw input and how to read it.
    pub fn data(mut self, data: impl Into<Value>, input_type: Format) -> Self {
        self.data = Some(data.into());
        self.input_type = input_type;
        self
    }

    pub fn validation(mut self, rules: ValidationRules) -> Self {
        self.validation = rules;
        self
    }

    pub fn preparation(mut self, rules: TransformRules) -> Self {
        self.preparation = rules;
        self
    }

    pub fn retrieve(mut self, rules: TransformRules) -> Self {
        self.retrieve = rules;
        self
    }

    pub fn integer_key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.integer_key_prefix = prefix.into();
        self
    }

    pub fn separator(mut self, separator: impl Into<String>) -> Self {
        self.separator = separator.into();
        self
    }

    /// Sets the accessor-name normalizer. Without one the process-wide
    /// normalizer is used.
    pub fn normalizer(mut self, normalizer: Arc<KeyNormalizer>) -> Self {
        self.normalizer = Some(normalizer);
        self
    }

    /// Loads options from a YAML document:
    ///
    /// ```yaml
    /// type: json
    /// integer_key_prefix: idx_
    /// separator: "; "
    /// validation:
    ///   "^age$": "^\\d+$"
    /// ```
    ///
    /// Each validation entry maps a key pattern to a value pattern. Rules are
    /// registered in the order they are written.
    pub fn from_yaml(yaml: &str) -> Result<Options, ConfigError> {
        let file: OptionsFile = serde_yaml::from_str(yaml)?;

        let mut validation = ValidationRules::new();
        for (key_pattern, value_pattern) in &file.validation {
            validation.add(key_pattern, Check::pattern(value_pattern)?)?;
        }

        Ok(Options {
            input_type: file.input_type,
            validation,
            integer_key_prefix: file.integer_key_prefix,
            separator: file.separator,
            ..Options::default()
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct OptionsFile {
    #[serde(rename = "type")]
    input_type: Format,
    integer_key_prefix: String,
    separator: String,
    validation: IndexMap<String, String>,
}

impl Default for OptionsFile {
    fn default() -> Self {
        OptionsFile {
            input_type: Format::Array,
            integer_key_prefix: DEFAULT_INTEGER_KEY_PREFIX.to_string(),
            separator: DEFAULT_SEPARATOR.to_string(),
            validation: IndexMap::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = Options::new();
        assert_eq!(options.input_type, Format::Array);
        assert_eq!(options.integer_key_prefix, "integer_key_");
        assert_eq!(options.separator, ", ");
        assert!(options.data.is_none());
    }

    #[test]
    fn test_from_yaml() {
        let options = Options::from_yaml(
            r#"
type: simple_xml
integer_key_prefix: idx_
validation:
  "^age$": "^\\d+$"
  "^name$": "^[a-z]+$"
"#,
        )
        .unwrap();
        assert_eq!(options.input_type, Format::SimpleXml);
        assert_eq!(options.integer_key_prefix, "idx_");
        assert_eq!(options.separator, ", ");
        assert_eq!(options.validation.patterns().collect::<Vec<_>>(), vec!["^age$", "^name$"]);
    }

    #[test]
    fn test_from_yaml_keeps_rule_order() {
        let options = Options::from_yaml(
            r#"
validation:
  "^zip$": "^\\d{5}$"
  "^age$": "^\\d+$"
  "^city$": "^[A-Z]"
"#,
        )
        .unwrap();
        assert_eq!(
            options.validation.patterns().collect::<Vec<_>>(),
            vec!["^zip$", "^age$", "^city$"]
        );
    }

    #[test]
    fn test_from_yaml_none_type() {
        let options = Options::from_yaml("type: none").unwrap();
        assert_eq!(options.input_type, Format::Array);
    }

    #[test]
    fn test_from_yaml_errors() {
        assert!(matches!(
            Options::from_yaml("validation:\n  \"^a$\": \"(\"\n"),
            Err(ConfigError::Rule(_))
        ));
        assert!(matches!(Options::from_yaml("type: csv"), Err(ConfigError::Yaml(_))));
        assert!(matches!(Options::from_yaml("colour: red"), Err(ConfigError::Yaml(_))));
    }
}
