//! Core value types and operations.

use serde::{Deserialize, Serialize, Serializer};
use std::cmp::Ordering;
use indexmap::IndexMap;

/// Value represents any datum a container can hold.
///
/// `Object` carries a foreign value (a type name plus its public fields). It
/// is exported as a plain map by the JSON encoder and escaped by the XML and
/// serialized encoders so that it can be reconstituted exactly.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    List(Vec<Value>),
    Map(Map),
    #[serde(skip_deserializing)]
    Object(Object),
}

/// Map represents a key-value map where keys are strings.
///
/// Keys keep their insertion order. Overwriting a key keeps its position and
/// deleting a key closes the gap. Equality, ordering and hashing ignore order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Map {
    pub fields: IndexMap<String, Value>,
}

/// Object is an opaque foreign value: a type name and its public fields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Object {
    pub class: String,
    pub fields: Map,
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn is_bool(&self) -> bool {
        matches!(self, Value::Bool(_))
    }

    pub fn is_int(&self) -> bool {
        matches!(self, Value::Int(_))
    }

    pub fn is_float(&self) -> bool {
        matches!(self, Value::Float(_))
    }

    pub fn is_string(&self) -> bool {
        matches!(self, Value::String(_))
    }

    pub fn is_list(&self) -> bool {
        matches!(self, Value::List(_))
    }

    pub fn is_map(&self) -> bool {
        matches!(self, Value::Map(_))
    }

    pub fn is_object(&self) -> bool {
        matches!(self, Value::Object(_))
    }

    /// Returns true for values that have a direct text form.
    pub fn is_scalar(&self) -> bool {
        matches!(
            self,
            Value::Null | Value::Bool(_) | Value::Int(_) | Value::Float(_) | Value::String(_)
        )
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&Vec<Value>> {
        match self {
            Value::List(l) => Some(l),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&Map> {
        match self {
            Value::Map(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&Object> {
        match self {
            Value::Object(o) => Some(o),
            _ => None,
        }
    }

    /// Returns the numeric value of ints, floats and numeric strings.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Int(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        }
    }

    /// Returns the text form of a scalar, or None for lists, maps and objects.
    pub fn to_text(&self) -> Option<String> {
        match self {
            Value::Null => Some(String::new()),
            Value::Bool(b) => Some(b.to_string()),
            Value::Int(i) => Some(i.to_string()),
            Value::Float(f) => Some(f.to_string()),
            Value::String(s) => Some(s.clone()),
            Value::List(_) | Value::Map(_) | Value::Object(_) => None,
        }
    }

    /// Truthiness as used by attribute markers and loose comparison.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Bool(b) => *b,
            Value::Int(i) => *i != 0,
            Value::Float(f) => *f != 0.0,
            Value::String(s) => !s.is_empty() && s != "0",
            Value::List(l) => !l.is_empty(),
            Value::Map(m) => !m.is_empty(),
            Value::Object(_) => true,
        }
    }

    /// Short name of the variant, used in error records and logs.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::String(_) => "string",
            Value::List(_) => "list",
            Value::Map(_) => "map",
            Value::Object(_) => "object",
        }
    }

    /// Converts a list into a map keyed by element position; maps are returned as is.
    pub fn into_map(self) -> Option<Map> {
        match self {
            Value::Map(m) => Some(m),
            Value::List(l) => Some(
                l.into_iter()
                    .enumerate()
                    .map(|(i, v)| (i.to_string(), v))
                    .collect(),
            ),
            _ => None,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Map(a), Value::Map(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Value {}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Value {
    fn cmp(&self, other: &Self) -> Ordering {
        fn type_order(v: &Value) -> u8 {
            match v {
                Value::Null => 0,
                Value::Bool(_) => 1,
                Value::Int(_) => 2,
                Value::Float(_) => 3,
                Value::String(_) => 4,
                Value::List(_) => 5,
                Value::Map(_) => 6,
                Value::Object(_) => 7,
            }
        }

        let type_cmp = type_order(self).cmp(&type_order(other));
        if type_cmp != Ordering::Equal {
            return type_cmp;
        }

        match (self, other) {
            (Value::Null, Value::Null) => Ordering::Equal,
            (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
            (Value::Int(a), Value::Int(b)) => a.cmp(b),
            (Value::Float(a), Value::Float(b)) => a.partial_cmp(b).unwrap_or(Ordering::Equal),
            (Value::String(a), Value::String(b)) => a.cmp(b),
            (Value::List(a), Value::List(b)) => a.cmp(b),
            (Value::Map(a), Value::Map(b)) => a.cmp(b),
            (Value::Object(a), Value::Object(b)) => a
                .class
                .cmp(&b.class)
                .then_with(|| a.fields.cmp(&b.fields)),
            _ => Ordering::Equal,
        }
    }
}

impl std::hash::Hash for Value {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Value::Null => {}
            Value::Bool(b) => b.hash(state),
            Value::Int(i) => i.hash(state),
            Value::Float(f) => f.to_bits().hash(state),
            Value::String(s) => s.hash(state),
            Value::List(l) => l.hash(state),
            Value::Map(m) => m.hash(state),
            Value::Object(o) => {
                o.class.hash(state);
                o.fields.hash(state);
            }
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i64::from(i))
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<Vec<Value>> for Value {
    fn from(l: Vec<Value>) -> Self {
        Value::List(l)
    }
}

impl From<Map> for Value {
    fn from(m: Map) -> Self {
        Value::Map(m)
    }
}

impl From<Object> for Value {
    fn from(o: Object) -> Self {
        Value::Object(o)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

impl PartialEq for Map {
    fn eq(&self, other: &Self) -> bool {
        self.fields == other.fields
    }
}

impl Eq for Map {}

impl PartialOrd for Map {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Map {
    fn cmp(&self, other: &Self) -> Ordering {
        self.sorted().cmp(&other.sorted())
    }
}

impl std::hash::Hash for Map {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        for (k, v) in self.sorted() {
            k.hash(state);
            v.hash(state);
        }
    }
}

impl Map {
    pub fn new() -> Self {
        Map {
            fields: IndexMap::new(),
        }
    }

    fn sorted(&self) -> Vec<(&String, &Value)> {
        let mut entries: Vec<_> = self.fields.iter().collect();
        entries.sort_by(|a, b| a.0.cmp(b.0));
        entries
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut Value> {
        self.fields.get_mut(key)
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.fields.insert(key.into(), value.into());
    }

    pub fn has(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    pub fn delete(&mut self, key: &str) -> Option<Value> {
        self.fields.shift_remove(key)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn clear(&mut self) {
        self.fields.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.fields.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.fields.keys()
    }

    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.fields.values()
    }

    /// Returns a copy of `self` with every entry of `over` written on top.
    pub fn merge(&self, over: &Map) -> Map {
        let mut merged = self.clone();
        for (k, v) in over.iter() {
            merged.fields.insert(k.clone(), v.clone());
        }
        merged
    }

    /// Like [`Map::merge`], but nested maps and lists present on both sides are
    /// merged key by key (lists by position) instead of being replaced.
    pub fn merge_recursive(&self, over: &Map) -> Map {
        let mut merged = self.clone();
        for (k, v) in over.iter() {
            match merged.fields.get_mut(k) {
                Some(existing) => {
                    let base = std::mem::take(existing);
                    *existing = merge_values(base, v);
                }
                None => {
                    merged.fields.insert(k.clone(), v.clone());
                }
            }
        }
        merged
    }

    /// Returns a copy without the given keys.
    pub fn without<'a, I>(&self, keys: I) -> Map
    where
        I: IntoIterator<Item = &'a String>,
    {
        let mut out = self.clone();
        for key in keys {
            out.fields.shift_remove(key);
        }
        out
    }
}

fn merge_values(base: Value, over: &Value) -> Value {
    match (base, over) {
        (Value::Map(a), Value::Map(b)) => Value::Map(a.merge_recursive(b)),
        (Value::List(mut a), Value::List(b)) => {
            for (i, v) in b.iter().enumerate() {
                if i < a.len() {
                    let existing = std::mem::take(&mut a[i]);
                    a[i] = merge_values(existing, v);
                } else {
                    a.push(v.clone());
                }
            }
            Value::List(a)
        }
        (_, over) => over.clone(),
    }
}

impl FromIterator<(String, Value)> for Map {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Map {
            fields: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for Map {
    type Item = (String, Value);
    type IntoIter = indexmap::map::IntoIter<String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.into_iter()
    }
}

impl<'a> IntoIterator for &'a Map {
    type Item = (&'a String, &'a Value);
    type IntoIter = indexmap::map::Iter<'a, String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.iter()
    }
}

impl Object {
    /// Creates a new object of the given type.
    pub fn new(class: impl Into<String>, fields: Map) -> Self {
        Object {
            class: class.into(),
            fields,
        }
    }

    /// Captures the public fields of any serializable type.
    ///
    /// The type name is the last path segment of the Rust type name.
    pub fn capture<T: Serialize>(value: &T) -> Result<Object, serde_json::Error> {
        let fields = match to_value(value)? {
            Value::Map(m) => m,
            other => {
                let mut m = Map::new();
                m.set("default", other);
                m
            }
        };
        let full = std::any::type_name::<T>();
        let class = full.rsplit("::").next().unwrap_or(full);
        Ok(Object::new(class, fields))
    }
}

impl Serialize for Object {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.fields.serialize(serializer)
    }
}

/// Converts any serializable type into a Value.
pub fn to_value<T: Serialize>(value: &T) -> Result<Value, serde_json::Error> {
    serde_json::from_value(serde_json::to_value(value)?)
}

/// Parse a value from JSON.
pub fn from_json(json: &str) -> Result<Value, serde_json::Error> {
    serde_json::from_str(json)
}

/// Serialize a value to JSON.
pub fn to_json(value: &Value) -> Result<String, serde_json::Error> {
    serde_json::to_string(value)
}

/// Parse a value from YAML.
pub fn from_yaml(yaml: &str) -> Result<Value, serde_yaml::Error> {
    serde_yaml::from_str(yaml)
}

/// Serialize a value to YAML.
pub fn to_yaml(value: &Value) -> Result<String, serde_yaml::Error> {
    serde_yaml::to_string(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map(entries: Vec<(&str, Value)>) -> Map {
        entries
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect()
    }

    #[test]
    fn test_value_types() {
        assert!(Value::Null.is_null());
        assert!(Value::Bool(true).is_bool());
        assert!(Value::Int(42).is_int());
        assert!(Value::Float(3.5).is_float());
        assert!(Value::String("hello".into()).is_string());
        assert!(Value::List(vec![]).is_list());
        assert!(Value::Map(Map::new()).is_map());
        assert!(Value::Object(Object::default()).is_object());
    }

    #[test]
    fn test_value_equality_is_strict() {
        assert_eq!(Value::Int(42), Value::Int(42));
        assert_ne!(Value::Int(1), Value::Float(1.0));
        assert_ne!(Value::Int(1), Value::String("1".into()));
        assert_ne!(Value::Null, Value::Bool(false));
    }

    #[test]
    fn test_map_operations() {
        let mut map = Map::new();
        assert!(map.is_empty());

        map.set("key", "value");
        assert!(map.has("key"));
        assert_eq!(map.get("key"), Some(&Value::String("value".into())));

        map.delete("key");
        assert!(!map.has("key"));
    }

    #[test]
    fn test_map_keeps_insertion_order() {
        let mut m = Map::new();
        for key in ["10", "2", "z", "a", "1"] {
            m.set(key, Value::Null);
        }
        m.set("z", 1);
        m.delete("2");
        assert_eq!(m.keys().collect::<Vec<_>>(), vec!["10", "z", "a", "1"]);

        let merged = m.merge(&map(vec![("b", Value::Int(2)), ("10", Value::Int(3))]));
        assert_eq!(merged.keys().collect::<Vec<_>>(), vec!["10", "z", "a", "1", "b"]);
    }

    #[test]
    fn test_map_equality_ignores_order() {
        use std::collections::hash_map::DefaultHasher;
        use std::hash::{Hash, Hasher};

        let a = map(vec![("x", Value::Int(1)), ("y", Value::Int(2))]);
        let b = map(vec![("y", Value::Int(2)), ("x", Value::Int(1))]);
        assert_eq!(a, b);
        assert_eq!(a.cmp(&b), Ordering::Equal);

        let hash = |m: &Map| {
            let mut hasher = DefaultHasher::new();
            m.hash(&mut hasher);
            hasher.finish()
        };
        assert_eq!(hash(&a), hash(&b));
    }

    #[test]
    fn test_to_text() {
        assert_eq!(Value::Null.to_text().as_deref(), Some(""));
        assert_eq!(Value::Int(7).to_text().as_deref(), Some("7"));
        assert_eq!(Value::Float(1.5).to_text().as_deref(), Some("1.5"));
        assert_eq!(Value::List(vec![]).to_text(), None);
    }

    #[test]
    fn test_truthiness() {
        assert!(!Value::String("0".into()).is_truthy());
        assert!(!Value::String(String::new()).is_truthy());
        assert!(Value::String("true".into()).is_truthy());
        assert!(!Value::Int(0).is_truthy());
        assert!(Value::Object(Object::default()).is_truthy());
    }

    #[test]
    fn test_json_roundtrip() {
        let value = Value::Map(map(vec![
            ("name", Value::String("test".into())),
            ("count", Value::Int(42)),
            ("ratio", Value::Float(0.5)),
        ]));

        let json = to_json(&value).unwrap();
        let parsed = from_json(&json).unwrap();
        assert_eq!(value, parsed);
    }

    #[test]
    fn test_object_exports_fields_as_json() {
        let object = Object::new("Point", map(vec![("x", Value::Int(1))]));
        let json = to_json(&Value::Object(object)).unwrap();
        assert_eq!(json, r#"{"x":1}"#);
    }

    #[test]
    fn test_object_capture() {
        #[derive(Serialize)]
        struct Point {
            x: i64,
            y: i64,
        }

        let object = Object::capture(&Point { x: 1, y: 2 }).unwrap();
        assert_eq!(object.class, "Point");
        assert_eq!(object.fields.get("y"), Some(&Value::Int(2)));
    }

    #[test]
    fn test_merge_replaces_by_key() {
        let a = map(vec![("0", Value::Int(0)), ("5", Value::Int(2)), ("3", Value::Int(1))]);
        let b = map(vec![("0", Value::Int(0)), ("3", Value::Int(3)), ("first", Value::Int(1))]);

        let merged = a.merge(&b);
        assert_eq!(merged.len(), 4);
        assert_eq!(merged.get("3"), Some(&Value::Int(3)));
        assert_eq!(merged.get("5"), Some(&Value::Int(2)));
    }

    #[test]
    fn test_merge_recursive_descends() {
        let a = map(vec![
            ("first", Value::List(vec![Value::Int(1), Value::Int(2)])),
            ("second", Value::String("foo".into())),
        ]);
        let b = map(vec![
            ("first", Value::List(vec![Value::String("a".into())])),
            ("second", Value::String("bar".into())),
        ]);

        let merged = a.merge_recursive(&b);
        assert_eq!(
            merged.get("first"),
            Some(&Value::List(vec![Value::String("a".into()), Value::Int(2)]))
        );
        assert_eq!(merged.get("second"), Some(&Value::String("bar".into())));
    }

    #[test]
    fn test_list_into_map() {
        let m = Value::List(vec![Value::Int(4), Value::Int(5)]).into_map().unwrap();
        assert_eq!(m.get("1"), Some(&Value::Int(5)));
        assert!(Value::Int(1).into_map().is_none());
    }
}
