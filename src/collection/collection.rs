//! The Collection type.

use crate::codec::{
    decode_input, decode_serialized, encode_serialized, input_text, CodecError, Format,
    SKIPPED_OBJECT,
};
use crate::container::{ErrorLog, ErrorRecord, Options};
use crate::rules::{TransformRules, ValidationRules};
use crate::value::{self, Value};
use std::collections::BTreeMap;
use tracing::{debug, trace};

/// Number of elements per page unless configured otherwise.
pub const DEFAULT_PAGE_SIZE: usize = 10;

/// Collection is an ordered list of values with change tracking and paging.
///
/// Elements are always stored densely: deleting one shifts every later
/// element down by one position. Change tracking follows elements rather
/// than positions. Each element remembers the baseline position it came
/// from (none for elements added since), and the value an element had at
/// its first edit or deletion is kept under that baseline position.
///
/// The rule pipelines are keyless here: every rule applies to every element.
#[derive(Debug)]
pub struct Collection {
    elements: Vec<Value>,
    origins: Vec<Option<usize>>,
    original_elements: BTreeMap<usize, Value>,
    baseline_len: usize,
    changed: bool,
    errors: ErrorLog,
    validation: ValidationRules,
    preparation: TransformRules,
    retrieve: TransformRules,
    validation_on: bool,
    preparation_on: bool,
    retrieve_on: bool,
    separator: String,
    page_size: usize,
    current_page: usize,
}

impl Default for Collection {
    fn default() -> Self {
        Collection::with_options(Options::default())
    }
}

impl Collection {
    /// Creates an empty collection.
    pub fn new() -> Self {
        Collection::default()
    }

    /// Creates a collection from options.
    ///
    /// Lists become the elements in order, maps contribute their values in
    /// insertion order and a single scalar becomes the only element. A decoding
    /// failure leaves the collection empty with an error recorded.
    pub fn with_options(options: Options) -> Self {
        let mut collection = Collection {
            elements: Vec::new(),
            origins: Vec::new(),
            original_elements: BTreeMap::new(),
            baseline_len: 0,
            changed: false,
            errors: ErrorLog::new(),
            validation: options.validation,
            preparation: options.preparation,
            retrieve: options.retrieve,
            validation_on: true,
            preparation_on: true,
            retrieve_on: true,
            separator: options.separator,
            page_size: DEFAULT_PAGE_SIZE,
            current_page: 1,
        };

        if let Some(data) = options.data {
            let snippet = data.to_text().unwrap_or_default();
            match decode_elements(data, options.input_type, &options.integer_key_prefix) {
                Ok(elements) => collection.reset_baseline(elements),
                Err(err) => collection.errors.push(ErrorRecord::decode(err, &snippet)),
            }
        }
        debug!(
            format = %options.input_type,
            elements = collection.elements.len(),
            "created collection"
        );
        collection
    }

    pub fn from_values(values: Vec<Value>) -> Self {
        Collection::with_options(Options::new().data(values, Format::Array))
    }

    pub fn from_json(json: &str) -> Self {
        Collection::with_options(Options::new().data(json, Format::Json))
    }

    pub fn from_serialized(text: &str) -> Self {
        Collection::with_options(Options::new().data(text, Format::Serialized))
    }

    fn reset_baseline(&mut self, elements: Vec<Value>) {
        self.origins = (0..elements.len()).map(Some).collect();
        self.baseline_len = elements.len();
        self.elements = elements;
        self.original_elements.clear();
        self.changed = false;
    }

    fn retrieved(&self, value: Value) -> Value {
        if self.retrieve_on {
            self.retrieve.apply(None, value)
        } else {
            value
        }
    }

    /// Runs validation and preparation. None means the value was rejected.
    fn admit(&mut self, index: usize, value: Value) -> Option<Value> {
        if self.validation_on {
            let failures = self.validation.validate(None, &value);
            if !failures.is_empty() {
                for failure in failures {
                    self.errors.push(ErrorRecord::ValidationMismatch {
                        key: index.to_string(),
                        data: value.clone(),
                        rule: failure.rule,
                    });
                }
                return None;
            }
        }
        Some(if self.preparation_on {
            self.preparation.apply(None, value)
        } else {
            value
        })
    }

    // Elements

    /// Validates, prepares and appends a value.
    pub fn add_element(&mut self, value: impl Into<Value>) -> &mut Self {
        let index = self.elements.len();
        if let Some(value) = self.admit(index, value.into()) {
            trace!(index, "add element");
            self.elements.push(value);
            self.origins.push(None);
            self.changed = true;
        }
        self
    }

    /// Appends every value in order.
    pub fn append_list(&mut self, values: Vec<Value>) -> &mut Self {
        for value in values {
            self.add_element(value);
        }
        self
    }

    /// Removes the element at `index`; later elements move down by one.
    pub fn delete(&mut self, index: usize) -> &mut Self {
        if index < self.elements.len() {
            let value = self.elements.remove(index);
            if let Some(origin) = self.origins.remove(index) {
                self.original_elements.entry(origin).or_insert(value);
            }
            self.changed = true;
            trace!(index, "delete element");
        }
        self
    }

    /// Replaces the element at `index`. Out-of-range indices are ignored.
    pub fn change_element(&mut self, index: usize, value: impl Into<Value>) -> &mut Self {
        self.change_element_with(index, value, |_, value, _| value)
    }

    /// Replaces the element at `index` with `transform(index, value, self)`,
    /// applied after validation and preparation of `value`.
    pub fn change_element_with<F>(
        &mut self,
        index: usize,
        value: impl Into<Value>,
        transform: F,
    ) -> &mut Self
    where
        F: FnOnce(usize, Value, &Collection) -> Value,
    {
        if index >= self.elements.len() {
            return self;
        }
        let Some(value) = self.admit(index, value.into()) else {
            return self;
        };
        let value = transform(index, value, self);
        if self.elements[index] == value {
            return self;
        }

        let previous = std::mem::replace(&mut self.elements[index], value);
        if let Some(origin) = self.origins[index] {
            self.original_elements.entry(origin).or_insert(previous);
        }
        self.changed = true;
        trace!(index, "change element");
        self
    }

    pub fn get_element(&self, index: usize) -> Option<Value> {
        self.elements
            .get(index)
            .map(|value| self.retrieved(value.clone()))
    }

    pub fn first(&self) -> Option<Value> {
        self.elements.first().map(|value| self.retrieved(value.clone()))
    }

    pub fn last(&self) -> Option<Value> {
        self.elements.last().map(|value| self.retrieved(value.clone()))
    }

    pub fn has_element(&self, index: usize) -> bool {
        index < self.elements.len()
    }

    /// Returns every element, passed through the retrieve pipeline.
    pub fn elements(&self) -> Vec<Value> {
        self.elements
            .iter()
            .map(|value| self.retrieved(value.clone()))
            .collect()
    }

    pub fn count(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Iterates over `(index, element)` pairs. Each call starts from the beginning.
    pub fn iterate(&self) -> impl Iterator<Item = (usize, Value)> + '_ {
        self.elements
            .iter()
            .enumerate()
            .map(|(index, value)| (index, self.retrieved(value.clone())))
    }

    // Change tracking

    pub fn data_changed(&self) -> bool {
        self.changed
    }

    /// Positions of elements added since the last checkpoint.
    pub fn new_indices(&self) -> Vec<usize> {
        self.origins
            .iter()
            .enumerate()
            .filter(|(_, origin)| origin.is_none())
            .map(|(index, _)| index)
            .collect()
    }

    /// Returns the elements as they were at the last checkpoint.
    pub fn original_collection(&self) -> Vec<Value> {
        let mut untouched: BTreeMap<usize, &Value> = self
            .origins
            .iter()
            .zip(&self.elements)
            .filter_map(|(origin, value)| origin.map(|origin| (origin, value)))
            .collect();

        (0..self.baseline_len)
            .filter_map(|position| {
                self.original_elements
                    .get(&position)
                    .or_else(|| untouched.remove(&position))
                    .cloned()
            })
            .collect()
    }

    /// Reverts every edit since construction or the last checkpoint.
    pub fn restore(&mut self) -> &mut Self {
        let elements = self.original_collection();
        self.reset_baseline(elements);
        self
    }

    /// Accepts the current elements as the new baseline.
    pub fn replace_baseline(&mut self) -> &mut Self {
        let elements = std::mem::take(&mut self.elements);
        self.reset_baseline(elements);
        self
    }

    // Paging

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Sets the page size; zero is treated as one.
    pub fn set_page_size(&mut self, size: usize) -> &mut Self {
        self.page_size = size.max(1);
        self
    }

    pub fn current_page(&self) -> usize {
        self.current_page
    }

    /// Number of pages, counting a partly filled last page.
    pub fn count_pages(&self) -> usize {
        self.elements.len().div_ceil(self.page_size)
    }

    /// Whether `page` is completely filled. Only such pages can be stepped
    /// onto with [`Collection::next_page`] and [`Collection::previous_page`].
    fn is_page_allowed(&self, page: usize) -> bool {
        page >= 1
            && self
                .page_size
                .checked_mul(page)
                .is_some_and(|needed| self.elements.len() >= needed)
    }

    /// Returns the elements of page `page` (1-based), including a partly
    /// filled last page. None when the page does not exist.
    pub fn get_page(&self, page: usize) -> Option<Vec<Value>> {
        if page < 1 || page > self.count_pages() {
            return None;
        }
        let start = (page - 1) * self.page_size;
        let end = start.saturating_add(self.page_size).min(self.elements.len());
        Some(
            self.elements[start..end]
                .iter()
                .map(|value| self.retrieved(value.clone()))
                .collect(),
        )
    }

    /// Moves to the next page if it is completely filled.
    pub fn next_page(&mut self) -> bool {
        if self.is_page_allowed(self.current_page + 1) {
            self.current_page += 1;
            true
        } else {
            false
        }
    }

    /// Moves to the previous page if there is one.
    pub fn previous_page(&mut self) -> bool {
        if self.current_page > 1 && self.is_page_allowed(self.current_page - 1) {
            self.current_page -= 1;
            true
        } else {
            false
        }
    }

    pub fn get_current_page(&self) -> Option<Vec<Value>> {
        self.get_page(self.current_page)
    }

    /// Returns the page [`Collection::next_page`] would move to, without moving.
    pub fn get_next_page(&self) -> Option<Vec<Value>> {
        let next = self.current_page + 1;
        if self.is_page_allowed(next) {
            self.get_page(next)
        } else {
            None
        }
    }

    /// Returns the page [`Collection::previous_page`] would move to, without moving.
    pub fn get_previous_page(&self) -> Option<Vec<Value>> {
        let previous = self.current_page.checked_sub(1)?;
        if self.is_page_allowed(previous) {
            self.get_page(previous)
        } else {
            None
        }
    }

    pub fn get_first_page(&self) -> Option<Vec<Value>> {
        self.get_page(1)
    }

    pub fn get_last_page(&self) -> Option<Vec<Value>> {
        self.get_page(self.count_pages())
    }

    // Exports

    pub fn to_json(&mut self) -> Option<String> {
        let result = value::to_json(&Value::List(self.elements())).map_err(CodecError::json);
        self.exported(result)
    }

    /// Joins all elements with the configured separator.
    pub fn to_text(&mut self) -> Option<String> {
        let separator = self.separator.clone();
        self.to_string_with(&separator)
    }

    /// Joins all elements into one string. Every element must be a scalar.
    pub fn to_string_with(&mut self, separator: &str) -> Option<String> {
        let mut parts = Vec::with_capacity(self.elements.len());
        for (index, value) in self.elements().into_iter().enumerate() {
            match value.to_text() {
                Some(text) => parts.push(text),
                None => {
                    self.errors.push(ErrorRecord::NotFlattenable {
                        key: index.to_string(),
                    });
                    return None;
                }
            }
        }
        Some(parts.join(separator))
    }

    /// Exports the elements in the serialized format, optionally replacing
    /// object values at any depth with a fixed marker.
    pub fn serialize(&mut self, skip_objects: bool) -> Option<String> {
        let mut elements = self.elements();
        if skip_objects {
            elements = elements.into_iter().map(without_objects).collect();
        }
        let result = encode_serialized(&Value::List(elements));
        self.exported(result)
    }

    /// Replaces the elements with a serialized payload. Current elements
    /// are deleted first, so they stay available as original data.
    pub fn unserialize(&mut self, text: &str) -> &mut Self {
        match decode_serialized(text) {
            Ok(decoded) => {
                while !self.elements.is_empty() {
                    self.delete(self.elements.len() - 1);
                }
                self.append_list(into_elements(decoded));
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

    pub fn validation_rules_mut(&mut self) -> &mut ValidationRules {
        &mut self.validation
    }

    pub fn preparation_rules_mut(&mut self) -> &mut TransformRules {
        &mut self.preparation
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

fn into_elements(value: Value) -> Vec<Value> {
    match value {
        Value::Null => Vec::new(),
        Value::List(list) => list,
        Value::Map(map) => map.into_iter().map(|(_, v)| v).collect(),
        other => vec![other],
    }
}

fn decode_elements(data: Value, format: Format, prefix: &str) -> Result<Vec<Value>, CodecError> {
    match format {
        Format::Json => value::from_json(input_text(&data, format)?)
            .map(into_elements)
            .map_err(CodecError::json),
        Format::Serialized => decode_serialized(input_text(&data, format)?).map(into_elements),
        Format::Array => Ok(into_elements(data)),
        other => Ok(decode_input(data, other, prefix)?
            .map(|map| map.into_iter().map(|(_, v)| v).collect())
            .unwrap_or_default()),
    }
}

fn without_objects(value: Value) -> Value {
    match value {
        Value::Object(_) => Value::from(SKIPPED_OBJECT),
        Value::List(list) => Value::List(list.into_iter().map(without_objects).collect()),
        Value::Map(map) => Value::Map(
            map.into_iter()
                .map(|(k, v)| (k, without_objects(v)))
                .collect(),
        ),
        other => other,
    }
}
