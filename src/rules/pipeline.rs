//! Ordered (key pattern, action) pipelines.

use crate::value::Value;
use regex::Regex;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Predicate deciding whether a candidate value is acceptable for a key.
pub type Predicate = Arc<dyn Fn(&str, &Value) -> bool + Send + Sync>;

/// Transform rewriting a value for a key.
pub type Transform = Arc<dyn Fn(&str, Value) -> Value + Send + Sync>;

/// RuleError is returned when a rule cannot be registered.
#[derive(Debug, Clone, Error)]
pub enum RuleError {
    #[error("invalid pattern {pattern:?}: {message}")]
    InvalidPattern { pattern: String, message: String },
}

impl RuleError {
    fn invalid_pattern(pattern: &str, err: regex::Error) -> Self {
        RuleError::InvalidPattern {
            pattern: pattern.to_string(),
            message: err.to_string(),
        }
    }
}

pub(crate) fn compile(pattern: &str) -> Result<Regex, RuleError> {
    Regex::new(pattern).map_err(|e| RuleError::invalid_pattern(pattern, e))
}

/// Check is the action of a validation rule.
#[derive(Clone)]
pub enum Check {
    /// The value's text form must match the expression. Lists, maps and
    /// objects have no text form and never match.
    Pattern(Regex),
    /// An arbitrary named predicate.
    Predicate { name: String, predicate: Predicate },
}

impl Check {
    /// Creates a value-pattern check.
    pub fn pattern(pattern: &str) -> Result<Check, RuleError> {
        compile(pattern).map(Check::Pattern)
    }

    /// Creates a predicate check.
    pub fn predicate<F>(name: impl Into<String>, predicate: F) -> Check
    where
        F: Fn(&str, &Value) -> bool + Send + Sync + 'static,
    {
        Check::Predicate {
            name: name.into(),
            predicate: Arc::new(predicate),
        }
    }

    /// Returns true if the value passes.
    pub fn passes(&self, key: &str, value: &Value) -> bool {
        match self {
            Check::Pattern(re) => value.to_text().is_some_and(|text| re.is_match(&text)),
            Check::Predicate { predicate, .. } => predicate(key, value),
        }
    }

    /// Human readable description used in error records.
    pub fn describe(&self) -> String {
        match self {
            Check::Pattern(re) => re.as_str().to_string(),
            Check::Predicate { name, .. } => name.clone(),
        }
    }
}

impl fmt::Debug for Check {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Check::Pattern(re) => f.debug_tuple("Pattern").field(&re.as_str()).finish(),
            Check::Predicate { name, .. } => f.debug_struct("Predicate").field("name", name).finish(),
        }
    }
}

#[derive(Clone)]
struct Rule<A> {
    pattern: Regex,
    action: A,
}

/// RulePipeline is an ordered list of (key pattern, action) pairs.
///
/// A rule applies to a key when its pattern matches the key. Lookups made
/// without a key (e.g. appending to a collection) apply every rule.
#[derive(Clone)]
pub struct RulePipeline<A> {
    rules: Vec<Rule<A>>,
}

/// Pipeline of validation checks.
pub type ValidationRules = RulePipeline<Check>;

/// Pipeline of value transforms, used for preparation and retrieval.
pub type TransformRules = RulePipeline<Transform>;

impl<A> Default for RulePipeline<A> {
    fn default() -> Self {
        RulePipeline { rules: Vec::new() }
    }
}

impl<A> RulePipeline<A> {
    /// Creates an empty pipeline.
    pub fn new() -> Self {
        RulePipeline::default()
    }

    /// Appends a rule for keys matching `pattern`.
    pub fn add(&mut self, pattern: &str, action: A) -> Result<(), RuleError> {
        let pattern = compile(pattern)?;
        self.rules.push(Rule { pattern, action });
        Ok(())
    }

    /// Removes every rule registered under `pattern`. Returns true if any was removed.
    pub fn remove(&mut self, pattern: &str) -> bool {
        let before = self.rules.len();
        self.rules.retain(|r| r.pattern.as_str() != pattern);
        self.rules.len() != before
    }

    /// Removes all rules.
    pub fn clear(&mut self) {
        self.rules.clear();
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Returns the registered key patterns in order.
    pub fn patterns(&self) -> impl Iterator<Item = &str> {
        self.rules.iter().map(|r| r.pattern.as_str())
    }

    /// Returns the actions of every rule applying to `key`, in registration order.
    pub fn matching<'a>(&'a self, key: Option<&'a str>) -> impl Iterator<Item = (&'a str, &'a A)> + 'a {
        self.rules
            .iter()
            .filter(move |r| key.map_or(true, |k| r.pattern.is_match(k)))
            .map(|r| (r.pattern.as_str(), &r.action))
    }
}

impl<A> fmt::Debug for RulePipeline<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.patterns()).finish()
    }
}

/// RuleFailure describes one failed validation check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleFailure {
    /// Key pattern of the failing rule.
    pub pattern: String,
    /// Description of the failing check.
    pub rule: String,
}

impl ValidationRules {
    /// Evaluates every applicable check, without short-circuiting.
    pub fn validate(&self, key: Option<&str>, value: &Value) -> Vec<RuleFailure> {
        let name = key.unwrap_or_default();
        self.matching(key)
            .filter(|(_, check)| !check.passes(name, value))
            .map(|(pattern, check)| RuleFailure {
                pattern: pattern.to_string(),
                rule: check.describe(),
            })
            .collect()
    }
}

impl TransformRules {
    /// Registers a transform closure.
    pub fn add_fn<F>(&mut self, pattern: &str, transform: F) -> Result<(), RuleError>
    where
        F: Fn(&str, Value) -> Value + Send + Sync + 'static,
    {
        self.add(pattern, Arc::new(transform))
    }

    /// Feeds the value through every applicable transform in order.
    pub fn apply(&self, key: Option<&str>, value: Value) -> Value {
        let name = key.unwrap_or_default();
        self.matching(key)
            .fold(value, |value, (_, transform)| transform(name, value))
    }
}
