//! Values exchanged with the store: primary keys, bin values and records.

use std::fmt::{self, Display, Formatter};

/// Primary-key value as stored by the server.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum UserKey {
    /// Integer key.
    Int(i64),
    /// String key.
    Str(String),
    /// Raw byte key.
    Bytes(Vec<u8>),
}

impl Display for UserKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            UserKey::Int(v) => write!(f, "{v}"),
            UserKey::Str(v) => write!(f, "{v}"),
            UserKey::Bytes(v) => write_hex(f, v),
        }
    }
}

fn write_hex(f: &mut Formatter<'_>, bytes: &[u8]) -> fmt::Result {
    f.write_str("0x")?;
    for b in bytes {
        write!(f, "{b:02x}")?;
    }
    Ok(())
}

impl From<i64> for UserKey {
    fn from(value: i64) -> Self {
        UserKey::Int(value)
    }
}

impl From<&str> for UserKey {
    fn from(value: &str) -> Self {
        UserKey::Str(value.to_string())
    }
}

impl From<String> for UserKey {
    fn from(value: String) -> Self {
        UserKey::Str(value)
    }
}

impl From<Vec<u8>> for UserKey {
    fn from(value: Vec<u8>) -> Self {
        UserKey::Bytes(value)
    }
}

/// Fully qualified address of one row: `(namespace, set, key)`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct KeyTuple {
    /// Namespace holding the row.
    pub namespace: String,
    /// Set holding the row.
    pub set_name: String,
    /// Primary key within the set.
    pub key: UserKey,
}

impl KeyTuple {
    /// Build a key tuple.
    pub fn new(
        namespace: impl Into<String>,
        set_name: impl Into<String>,
        key: impl Into<UserKey>,
    ) -> Self {
        Self {
            namespace: namespace.into(),
            set_name: set_name.into(),
            key: key.into(),
        }
    }
}

/// A bin value.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    /// Absent value.
    Nil,
    /// Boolean.
    Bool(bool),
    /// Signed integer.
    Int(i64),
    /// Double precision float.
    Float(f64),
    /// UTF-8 string.
    Str(String),
    /// Blob.
    Bytes(Vec<u8>),
    /// Ordered list.
    List(Vec<Value>),
    /// Map with entries in server order.
    Map(Vec<(Value, Value)>),
}

impl Value {
    /// View this value as a primary key, if its type can be one.
    pub fn as_user_key(&self) -> Option<UserKey> {
        match self {
            Value::Int(v) => Some(UserKey::Int(*v)),
            Value::Str(v) => Some(UserKey::Str(v.clone())),
            Value::Bytes(v) => Some(UserKey::Bytes(v.clone())),
            _ => None,
        }
    }
}

impl From<UserKey> for Value {
    fn from(key: UserKey) -> Self {
        match key {
            UserKey::Int(v) => Value::Int(v),
            UserKey::Str(v) => Value::Str(v),
            UserKey::Bytes(v) => Value::Bytes(v),
        }
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Str(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Str(value)
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nil => f.write_str("nil"),
            Value::Bool(v) => write!(f, "{v}"),
            Value::Int(v) => write!(f, "{v}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::Str(v) => f.write_str(v),
            Value::Bytes(v) => write_hex(f, v),
            Value::List(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
            Value::Map(entries) => {
                f.write_str("{")?;
                for (i, (k, v)) in entries.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{k}: {v}")?;
                }
                f.write_str("}")
            }
        }
    }
}

/// One row as returned by a scan or a get.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Record {
    /// The user key, when the store kept it alongside the record.
    pub key: Option<UserKey>,
    /// Bin name to value, in server order.
    pub bins: Vec<(String, Value)>,
}

impl Record {
    /// Create an empty record carrying `key`.
    pub fn with_key(key: impl Into<UserKey>) -> Self {
        Self {
            key: Some(key.into()),
            bins: Vec::new(),
        }
    }

    /// Append a bin, builder style.
    pub fn bin(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.bins.push((name.into(), value.into()));
        self
    }

    /// Look up a bin by name.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.bins
            .iter()
            .find(|(bin, _)| bin == name)
            .map(|(_, value)| value)
    }

    /// Keep only the named bins, preserving record order.
    pub fn project(&self, names: &[String]) -> Record {
        Record {
            key: self.key.clone(),
            bins: self
                .bins
                .iter()
                .filter(|(bin, _)| names.iter().any(|n| n == bin))
                .cloned()
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bytes_render_as_hex() {
        assert_eq!(UserKey::Bytes(vec![0x0a, 0xff]).to_string(), "0x0aff");
        assert_eq!(Value::Bytes(vec![1]).to_string(), "0x01");
    }

    #[test]
    fn nested_values_render() {
        let value = Value::Map(vec![(
            Value::from("petals"),
            Value::List(vec![Value::Int(1), Value::Float(2.5)]),
        )]);
        assert_eq!(value.to_string(), "{petals: [1, 2.5]}");
    }

    #[test]
    fn projection_keeps_record_order() {
        let record = Record::with_key(7i64)
            .bin("a", 1i64)
            .bin("b", "x")
            .bin("c", 2.0f64);
        let projected = record.project(&["c".to_string(), "a".to_string()]);
        assert_eq!(projected.key, Some(UserKey::Int(7)));
        assert_eq!(
            projected.bins,
            vec![
                ("a".to_string(), Value::Int(1)),
                ("c".to_string(), Value::Float(2.0))
            ]
        );
    }

    #[test]
    fn only_scalar_keys_become_user_keys() {
        assert_eq!(Value::Int(3).as_user_key(), Some(UserKey::Int(3)));
        assert_eq!(Value::from("k").as_user_key(), Some(UserKey::from("k")));
        assert_eq!(Value::Float(1.0).as_user_key(), None);
        assert_eq!(Value::Nil.as_user_key(), None);
    }
}
