use serde_json::{Map, Value};

/// Request body fields, kept in insertion order.
///
/// Keys are unique: setting a key again replaces its value in place, so the
/// JSON and form encodings always carry the same fields. Serialized either
/// as compact JSON or as a form-encoded string, depending on
/// [`ClientOptions::use_form_encoding`](crate::ClientOptions::use_form_encoding).
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Payload(Map<String, Value>);

impl Payload {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a payload from any JSON value.
    ///
    /// Returns `None` unless the value is an object.
    pub fn from_json(value: Value) -> Option<Self> {
        match value {
            Value::Object(map) => Some(map.into()),
            _ => None,
        }
    }

    /// Sets a field. An existing key keeps its position and takes the new value.
    pub fn field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.0.iter().map(|(key, value)| (key.as_str(), value))
    }

    pub(crate) fn to_json_text(&self) -> String {
        Value::Object(self.0.clone()).to_string()
    }
}

impl From<Map<String, Value>> for Payload {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl<K, V> From<Vec<(K, V)>> for Payload
where
    K: Into<String>,
    V: Into<Value>,
{
    fn from(pairs: Vec<(K, V)>) -> Self {
        pairs.into_iter().collect()
    }
}

impl<K, V, const N: usize> From<[(K, V); N]> for Payload
where
    K: Into<String>,
    V: Into<Value>,
{
    fn from(pairs: [(K, V); N]) -> Self {
        pairs.into_iter().collect()
    }
}

impl<K, V> FromIterator<(K, V)> for Payload
where
    K: Into<String>,
    V: Into<Value>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        iter.into_iter()
            .fold(Self::new(), |payload, (key, value)| payload.field(key, value))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::Payload;

    #[test]
    fn from_json_requires_an_object() {
        assert!(Payload::from_json(json!([1, 2])).is_none());
        assert!(Payload::from_json(json!("text")).is_none());

        let payload = Payload::from_json(json!({"a": 1})).unwrap();
        assert_eq!(payload.iter().count(), 1);
    }

    #[test]
    fn builder_keeps_insertion_order() {
        let payload = Payload::new().field("z", 1).field("a", "two");
        let keys: Vec<&str> = payload.iter().map(|(key, _)| key).collect();
        assert_eq!(keys, vec!["z", "a"]);
    }

    #[test]
    fn json_text_follows_insertion_order() {
        let payload = Payload::new().field("z", 1).field("a", 2);
        assert_eq!(payload.to_json_text(), r#"{"z":1,"a":2}"#);
    }

    #[test]
    fn repeated_key_replaces_value_in_place() {
        let payload = Payload::new().field("z", 1).field("a", 2).field("z", 3);
        assert_eq!(payload.iter().count(), 2);
        assert_eq!(payload.to_json_text(), r#"{"z":3,"a":2}"#);

        let collected = Payload::from([("k", "first"), ("k", "second")]);
        assert_eq!(collected.to_json_text(), r#"{"k":"second"}"#);
    }

    #[test]
    fn json_text_is_compact() {
        let payload = Payload::from([("a", "b c")]);
        assert_eq!(payload.to_json_text(), r#"{"a":"b c"}"#);
    }
}
