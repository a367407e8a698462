//! The DataContainer type.

use super::errors::{ErrorLog, ErrorRecord};
use super::options::Options;
use crate::codec::{
    decode_input, decode_struct, encode_json, encode_object, encode_serialized, encode_struct,
    encode_xml, encode_yaml, CodecError, Format, XmlOptions, SKIPPED_OBJECT,
};
use crate::keys::{Accessor, KeyNormalizer, Verb};
use crate::rules::{TransformRules, ValidationRules};
use crate::value::{Map, Object, Operator, Value};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{debug, trace};

/// DataContainer is a key/value store that remembers how its data looked
/// before it was edited.
///
/// Three pieces of state describe every key:
///
/// - `current` holds the live value;
/// - `original` holds the value a key had before its first edit, captured
///   lazily and only for keys that existed before being touched;
/// - `new_keys` lists keys added since construction or the last checkpoint.
///
/// A key is never in both `original` and `new_keys`, and once
/// `changed` is false both of them are empty.
#[derive(Debug)]
pub struct DataContainer {
    current: Map,
    original: Map,
    new_keys: BTreeSet<String>,
    changed: bool,
    errors: ErrorLog,
    validation: ValidationRules,
    preparation: TransformRules,
    retrieve: TransformRules,
    validation_on: bool,
    preparation_on: bool,
    retrieve_on: bool,
    integer_key_prefix: String,
    separator: String,
    normalizer: Arc<KeyNormalizer>,
    next_index: usize,
}

impl Default for DataContainer {
    fn default() -> Self {
        DataContainer::with_options(Options::default())
    }
}

impl DataContainer {
    /// Creates an empty container with default options.
    pub fn new() -> Self {
        DataContainer::default()
    }

    /// Creates a container from options, decoding `options.data` if present.
    ///
    /// A decoding failure leaves the container empty with an error recorded.
    pub fn with_options(options: Options) -> Self {
        let mut container = DataContainer {
            current: Map::new(),
            original: Map::new(),
            new_keys: BTreeSet::new(),
            changed: false,
            errors: ErrorLog::new(),
            validation: options.validation,
            preparation: options.preparation,
            retrieve: options.retrieve,
            validation_on: true,
            preparation_on: true,
            retrieve_on: true,
            integer_key_prefix: options.integer_key_prefix,
            separator: options.separator,
            normalizer: options.normalizer.unwrap_or_else(KeyNormalizer::global),
            next_index: 0,
        };

        if let Some(data) = options.data {
            container.load(data, options.input_type);
        }
        debug!(
            format = %options.input_type,
            keys = container.current.len(),
            errors = container.errors.len(),
            "created data container"
        );
        container
    }

    pub fn from_value(data: impl Into<Value>) -> Self {
        DataContainer::with_options(Options::new().data(data, Format::Array))
    }

    pub fn from_json(json: &str) -> Self {
        DataContainer::with_options(Options::new().data(json, Format::Json))
    }

    pub fn from_yaml(yaml: &str) -> Self {
        DataContainer::with_options(Options::new().data(yaml, Format::Yaml))
    }

    pub fn from_xml(xml: &str) -> Self {
        DataContainer::with_options(Options::new().data(xml, Format::Xml))
    }

    pub fn from_simple_xml(xml: &str) -> Self {
        DataContainer::with_options(Options::new().data(xml, Format::SimpleXml))
    }

    pub fn from_serialized(text: &str) -> Self {
        DataContainer::with_options(Options::new().data(text, Format::Serialized))
    }

    pub fn from_object(object: Object) -> Self {
        DataContainer::with_options(Options::new().data(object, Format::Object))
    }

    /// Creates a container from the public fields of any serializable type.
    pub fn from_struct<T: Serialize>(input: &T) -> Self {
        let mut container = DataContainer::new();
        match decode_struct(input) {
            Ok(data) => container.current = data,
            Err(err) => container.errors.push(ErrorRecord::decode(err, "")),
        }
        container
    }

    fn load(&mut self, data: Value, format: Format) {
        let snippet = data.to_text().unwrap_or_default();
        match decode_input(data, format, &self.integer_key_prefix) {
            Ok(Some(decoded)) => self.current = decoded,
            Ok(None) => debug!(format = %format, "input holds no data"),
            Err(err) => self.errors.push(ErrorRecord::decode(err, &snippet)),
        }
    }

    // Reads

    /// Returns the value stored under `key`, passed through the retrieve
    /// pipeline. None means the key is absent, not that it holds null.
    pub fn get(&self, key: &str) -> Option<Value> {
        self.current
            .get(key)
            .map(|value| self.retrieved(Some(key), value.clone()))
    }

    /// Returns all data, every value passed through the retrieve pipeline.
    pub fn get_all(&self) -> Map {
        self.current
            .iter()
            .map(|(key, value)| (key.clone(), self.retrieved(Some(key), value.clone())))
            .collect()
    }

    /// Returns the stored value without running the retrieve pipeline.
    pub fn get_ref(&self, key: &str) -> Option<&Value> {
        self.current.get(key)
    }

    pub fn has(&self, key: &str) -> bool {
        self.current.has(key)
    }

    pub fn has_data(&self) -> bool {
        !self.current.is_empty()
    }

    pub fn len(&self) -> usize {
        self.current.len()
    }

    pub fn is_empty(&self) -> bool {
        self.current.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.current.keys()
    }

    /// Iterates over `(key, value)` pairs in insertion order, values passed
    /// through the retrieve pipeline. Each call starts from the beginning.
    pub fn iterate(&self) -> impl Iterator<Item = (String, Value)> + '_ {
        self.current
            .iter()
            .map(|(key, value)| (key.clone(), self.retrieved(Some(key), value.clone())))
    }

    fn retrieved(&self, key: Option<&str>, value: Value) -> Value {
        if self.retrieve_on {
            self.retrieve.apply(key, value)
        } else {
            value
        }
    }

    // Writes

    /// Validates, prepares and stores a value.
    ///
    /// A value rejected by any validation rule is not written; one
    /// `ValidationMismatch` is recorded per failing rule.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        let key = key.into();
        let value = value.into();

        if self.validation_on {
            let failures = self.validation.validate(Some(&key), &value);
            if !failures.is_empty() {
                for failure in failures {
                    self.errors.push(ErrorRecord::ValidationMismatch {
                        key: key.clone(),
                        data: value.clone(),
                        rule: failure.rule,
                    });
                }
                return self;
            }
        }

        let value = if self.preparation_on {
            self.preparation.apply(Some(&key), value)
        } else {
            value
        };
        self.commit(key, value);
        self
    }

    /// Sets every entry of `data` in its iteration order.
    pub fn set_map(&mut self, data: Map) -> &mut Self {
        for (key, value) in data {
            self.set(key, value);
        }
        self
    }

    fn commit(&mut self, key: String, value: Value) {
        match self.current.get(&key) {
            Some(existing) if *existing == value => return,
            Some(existing) => {
                if !self.new_keys.contains(&key) && !self.original.has(&key) {
                    self.original.set(key.clone(), existing.clone());
                }
            }
            None => {
                // A key removed earlier in the session is still tracked in
                // `original`; writing it back is not a new key.
                if !self.original.has(&key) {
                    self.new_keys.insert(key.clone());
                }
            }
        }
        trace!(key = %key, "commit");
        self.current.set(key, value);
        self.changed = true;
    }

    /// Appends a value under the next free `<prefix><n>` key.
    pub fn push(&mut self, value: impl Into<Value>) -> &mut Self {
        let mut key = format!("{}{}", self.integer_key_prefix, self.next_index);
        while self.current.has(&key) {
            self.next_index += 1;
            key = format!("{}{}", self.integer_key_prefix, self.next_index);
        }
        self.next_index += 1;
        self.set(key, value)
    }

    /// Stores null under `key`.
    pub fn clear(&mut self, key: impl Into<String>) -> &mut Self {
        self.set(key, Value::Null)
    }

    /// Removes a key, remembering its value if it predates the session.
    pub fn unset(&mut self, key: &str) -> &mut Self {
        if let Some(existing) = self.current.delete(key) {
            if !self.new_keys.remove(key) && !self.original.has(key) {
                self.original.set(key, existing);
            }
            self.changed = true;
            trace!(key, "unset");
        }
        self
    }

    /// Removes every key, remembering values that predate the session.
    pub fn unset_all(&mut self) -> &mut Self {
        let current = std::mem::take(&mut self.current);
        self.original = current.without(&self.new_keys).merge(&self.original);
        self.new_keys.clear();
        self.changed = true;
        self
    }

    /// Puts back the value `key` had before it was first edited.
    ///
    /// Other keys, the new-key set and the changed flag are left as they are.
    pub fn restore(&mut self, key: &str) -> &mut Self {
        if let Some(value) = self.original.get(key) {
            self.current.set(key, value.clone());
        }
        self
    }

    /// Reverts every edit since construction or the last checkpoint.
    pub fn restore_all(&mut self) -> &mut Self {
        self.current = self.original_all();
        self.original.clear();
        self.new_keys.clear();
        self.changed = false;
        self
    }

    /// Accepts the current data as the new baseline.
    pub fn replace_baseline(&mut self) -> &mut Self {
        self.original.clear();
        self.new_keys.clear();
        self.changed = false;
        self
    }

    /// Sets every key of another container's data, then marks this one
    /// changed even if no value differed.
    pub fn merge_from(&mut self, other: &DataContainer) -> &mut Self {
        for (key, value) in other.get_all() {
            self.set(key, value);
        }
        self.changed = true;
        self
    }

    // Change tracking

    pub fn data_changed(&self) -> bool {
        self.changed
    }

    /// Reports whether `key` was added, edited to a different value or removed.
    pub fn key_changed(&self, key: &str) -> bool {
        if self.new_keys.contains(key) {
            return true;
        }
        match self.original.get(key) {
            Some(before) => self.current.get(key) != Some(before),
            None => false,
        }
    }

    /// Returns the value `key` had before any edit, or None if the key did
    /// not exist then.
    pub fn original(&self, key: &str) -> Option<Value> {
        if self.new_keys.contains(key) {
            return None;
        }
        self.original.get(key).or_else(|| self.current.get(key)).cloned()
    }

    /// Returns the data as it was before any edit.
    pub fn original_all(&self) -> Map {
        self.current.merge(&self.original).without(&self.new_keys)
    }

    // Comparison

    /// Evaluates `value <operator> stored`, where `stored` is the value under
    /// `key` (all data when `key` is None), optionally taken from before edits.
    ///
    /// Returns None for an unknown operator and `Some(false)` for an absent key.
    pub fn compare(
        &self,
        value: &Value,
        key: Option<&str>,
        operator: &str,
        use_original: bool,
    ) -> Option<bool> {
        let operator: Operator = operator.parse().ok()?;
        let stored = match (key, use_original) {
            (None, false) => Some(Value::Map(self.get_all())),
            (None, true) => Some(Value::Map(self.original_all())),
            (Some(key), false) => self.get(key),
            (Some(key), true) => self.original(key),
        };
        Some(stored.is_some_and(|stored| operator.apply(value, &stored)))
    }

    /// Like [`DataContainer::compare`], with another container's data as the given value.
    pub fn compare_container(
        &self,
        other: &DataContainer,
        key: Option<&str>,
        operator: &str,
        use_original: bool,
    ) -> Option<bool> {
        self.compare(&Value::Map(other.get_all()), key, operator, use_original)
    }

    // Bulk transforms

    /// Applies `f(key, value, self)` to the data (or to `data` when given)
    /// and returns the transformed copy.
    ///
    /// With `recursive`, maps and lists are descended into and `f` sees only
    /// leaves; list elements are keyed by position. Without it, nested maps
    /// and lists are passed through untouched.
    pub fn traveler<F>(&self, mut f: F, data: Option<&Map>, recursive: bool) -> Map
    where
        F: FnMut(&str, &Value, &DataContainer) -> Value,
    {
        let data = data.unwrap_or(&self.current);
        self.travel_map(&mut f, data, recursive)
    }

    fn travel_map<F>(&self, f: &mut F, data: &Map, recursive: bool) -> Map
    where
        F: FnMut(&str, &Value, &DataContainer) -> Value,
    {
        data.iter()
            .map(|(key, value)| (key.clone(), self.travel_value(f, key, value, recursive)))
            .collect()
    }

    fn travel_value<F>(&self, f: &mut F, key: &str, value: &Value, recursive: bool) -> Value
    where
        F: FnMut(&str, &Value, &DataContainer) -> Value,
    {
        match value {
            Value::Map(map) if recursive => Value::Map(self.travel_map(f, map, true)),
            Value::List(list) if recursive => Value::List(
                list.iter()
                    .enumerate()
                    .map(|(i, item)| self.travel_value(f, &i.to_string(), item, true))
                    .collect(),
            ),
            Value::Map(_) | Value::List(_) => value.clone(),
            leaf => f(key, leaf, self),
        }
    }

    // Exports

    pub fn to_json(&mut self) -> Option<String> {
        let result = encode_json(&self.get_all());
        self.exported(result)
    }

    pub fn to_yaml(&mut self) -> Option<String> {
        let result = encode_yaml(&self.get_all());
        self.exported(result)
    }

    /// Exports the data as XML, optionally with CDATA text and a DOCTYPE line.
    pub fn to_xml(&mut self, cdata: bool, dtd: Option<&str>) -> Option<String> {
        let mut options = XmlOptions::default()
            .cdata(cdata)
            .integer_key_prefix(self.integer_key_prefix.clone());
        if let Some(dtd) = dtd {
            options = options.dtd(dtd);
        }
        let result = encode_xml(&self.get_all(), &options);
        self.exported(result)
    }

    /// Exports the data as an opaque object of the given type name.
    pub fn to_object(&self, class: &str) -> Object {
        encode_object(&self.get_all(), class)
    }

    /// Exports the data into any deserializable type.
    pub fn to_struct<T: DeserializeOwned>(&mut self) -> Option<T> {
        let result = encode_struct(&self.get_all());
        self.exported(result)
    }

    /// Joins all values into one string with the configured separator.
    pub fn to_text(&mut self) -> Option<String> {
        let separator = self.separator.clone();
        self.to_string_with(&separator)
    }

    /// Joins all values into one string.
    ///
    /// Every value must be a scalar; otherwise `NotFlattenable` is recorded
    /// for the first offending key and None is returned.
    pub fn to_string_with(&mut self, separator: &str) -> Option<String> {
        let mut parts = Vec::with_capacity(self.current.len());
        for (key, value) in self.get_all() {
            match value.to_text() {
                Some(text) => parts.push(text),
                None => {
                    self.errors.push(ErrorRecord::NotFlattenable { key });
                    return None;
                }
            }
        }
        Some(parts.join(separator))
    }

    /// Exports the data in the serialized format. With `skip_objects`,
    /// every object value at any depth is replaced by a fixed marker first.
    pub fn serialize(&mut self, skip_objects: bool) -> Option<String> {
        let data = self.get_all();
        let data = if skip_objects {
            self.traveler(
                |_, value, _| {
                    if value.is_object() {
                        Value::from(SKIPPED_OBJECT)
                    } else {
                        value.clone()
                    }
                },
                Some(&data),
                true,
            )
        } else {
            data
        };
        let result = encode_serialized(&Value::Map(data));
        self.exported(result)
    }

    /// Replaces the data with a serialized payload.
    ///
    /// Existing keys are unset first, so their values stay available as
    /// original data. An undecodable payload leaves the container untouched.
    pub fn unserialize(&mut self, text: &str) -> &mut Self {
        match decode_input(Value::from(text), Format::Serialized, &self.integer_key_prefix) {
            Ok(data) => {
                self.unset_all();
                for (key, value) in data.unwrap_or_default() {
                    self.set(key, value);
                }
            }
            Err(err) => self.errors.push(ErrorRecord::decode(err, text)),
        }
        self
    }

    fn exported<T>(&mut self, result: Result<T, CodecError>) -> Option<T> {
        match result {
            Ok(out) => Some(out),
            Err(err) => {
                self.errors.push(ErrorRecord::encode(err));
                None
            }
        }
    }

    // Dispatch by accessor name

    /// Runs an accessor-style call such as `getFirstData` or
    /// `setFirstData(value)`.
    ///
    /// `get*` returns the value, `has*`, `is*` and `not*` return booleans.
    /// Mutating verbs return None. Names without a known verb record
    /// `UnknownAccessor` and return None.
    pub fn call(&mut self, name: &str, args: Vec<Value>) -> Option<Value> {
        let Some(accessor) = Accessor::parse(name, &self.normalizer) else {
            self.errors.push(ErrorRecord::UnknownAccessor {
                name: name.to_string(),
            });
            return None;
        };
        let mut args = args.into_iter();
        let key = accessor.key().map(str::to_string);

        match (accessor.verb, key) {
            (Verb::Get, None) => Some(Value::Map(self.get_all())),
            (Verb::Get, Some(key)) => self.get(&key),
            (Verb::Has, None) => Some(Value::Bool(self.has_data())),
            (Verb::Has, Some(key)) => Some(Value::Bool(self.has(&key))),
            (Verb::Is, key) | (Verb::Not, key) => {
                let operator = if accessor.verb == Verb::Is { "===" } else { "!==" };
                let given = args.next().unwrap_or_default();
                self.compare(&given, key.as_deref(), operator, false)
                    .map(Value::Bool)
            }
            (Verb::Set, Some(key)) => {
                self.set(key, args.next().unwrap_or_default());
                None
            }
            (Verb::Set, None) => {
                match args.next().and_then(Value::into_map) {
                    Some(data) => {
                        self.set_map(data);
                    }
                    None => self.errors.push(ErrorRecord::UnknownAccessor {
                        name: name.to_string(),
                    }),
                }
                None
            }
            (Verb::Unset, Some(key)) => {
                self.unset(&key);
                None
            }
            (Verb::Unset, None) => {
                self.unset_all();
                None
            }
            (Verb::Clear, Some(key)) => {
                self.clear(key);
                None
            }
            (Verb::Restore, Some(key)) => {
                self.restore(&key);
                None
            }
            (Verb::Restore, None) => {
                self.restore_all();
                None
            }
            (Verb::Clear, None) => {
                self.errors.push(ErrorRecord::UnknownAccessor {
                    name: name.to_string(),
                });
                None
            }
        }
    }

    /// Returns the normalizer used for accessor names.
    pub fn normalizer(&self) -> &KeyNormalizer {
        &self.normalizer
    }

    // Errors

    pub fn has_errors(&self) -> bool {
        self.errors.has_errors()
    }

    pub fn errors(&self) -> &[ErrorRecord] {
        self.errors.records()
    }

    pub fn error(&self, index: usize) -> Option<&ErrorRecord> {
        self.errors.get(index)
    }

    pub fn clear_errors(&mut self) -> &mut Self {
        self.errors.clear();
        self
    }

    // Rules

    pub fn validation_rules(&self) -> &ValidationRules {
        &self.validation
    }

    pub fn validation_rules_mut(&mut self) -> &mut ValidationRules {
        &mut self.validation
    }

    pub fn preparation_rules(&self) -> &TransformRules {
        &self.preparation
    }

    pub fn preparation_rules_mut(&mut self) -> &mut TransformRules {
        &mut self.preparation
    }

    pub fn retrieve_rules(&self) -> &TransformRules {
        &self.retrieve
    }

    pub fn retrieve_rules_mut(&mut self) -> &mut TransformRules {
        &mut self.retrieve
    }

    pub fn stop_validation(&mut self) -> &mut Self {
        self.validation_on = false;
        self
    }

    pub fn start_validation(&mut self) -> &mut Self {
        self.validation_on = true;
        self
    }

    pub fn stop_preparation(&mut self) -> &mut Self {
        self.preparation_on = false;
        self
    }

    pub fn start_preparation(&mut self) -> &mut Self {
        self.preparation_on = true;
        self
    }

    pub fn stop_retrieve(&mut self) -> &mut Self {
        self.retrieve_on = false;
        self
    }

    pub fn start_retrieve(&mut self) -> &mut Self {
        self.retrieve_on = true;
        self
    }
}
