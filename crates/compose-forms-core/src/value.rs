//! Values carried by controls.
//!
//! A [`FormValue`] is a small tree that mirrors the shape of the control tree
//! it came from: fields produce scalars, groups produce ordered maps and arrays
//! produce lists. The control tree never interprets scalars, it only moves
//! them around.

use std::fmt;
use std::hash::{Hash, Hasher};

use indexmap::IndexMap;

use crate::hash::hash_one;

#[derive(Clone, Debug, Default)]
pub enum FormValue {
    #[default]
    Null,
    Bool(bool),
    Number(f64),
    Text(String),
    Group(IndexMap<String, FormValue>),
    List(Vec<FormValue>),
}

impl FormValue {
    /// Builds a group value from `(key, value)` pairs, keeping insertion order.
    pub fn group<K, V, I>(entries: I) -> Self
    where
        K: Into<String>,
        V: Into<FormValue>,
        I: IntoIterator<Item = (K, V)>,
    {
        FormValue::Group(
            entries
                .into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        )
    }

    pub fn list<V, I>(items: I) -> Self
    where
        V: Into<FormValue>,
        I: IntoIterator<Item = V>,
    {
        FormValue::List(items.into_iter().map(Into::into).collect())
    }

    pub fn text(value: impl Into<String>) -> Self {
        FormValue::Text(value.into())
    }

    /// `true` for values that carry nothing worth copying: `Null` and empty text.
    pub fn is_blank(&self) -> bool {
        match self {
            FormValue::Null => true,
            FormValue::Text(text) => text.is_empty(),
            _ => false,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, FormValue::Null)
    }

    /// Looks up a key in a group value.
    pub fn get(&self, key: &str) -> Option<&FormValue> {
        match self {
            FormValue::Group(entries) => entries.get(key),
            _ => None,
        }
    }

    /// Looks up a position in a list value.
    pub fn at(&self, index: usize) -> Option<&FormValue> {
        match self {
            FormValue::List(items) => items.get(index),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            FormValue::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FormValue::Number(number) => Some(*number),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            FormValue::Bool(flag) => Some(*flag),
            _ => None,
        }
    }

    /// Length used by length validators: characters for text, entries for
    /// groups and lists, `None` for everything else.
    pub fn len(&self) -> Option<usize> {
        match self {
            FormValue::Text(text) => Some(text.chars().count()),
            FormValue::Group(entries) => Some(entries.len()),
            FormValue::List(items) => Some(items.len()),
            _ => None,
        }
    }

    /// Content hash used to detect changes between two reads of the same tree.
    pub fn fingerprint(&self) -> u64 {
        hash_one(self)
    }
}

impl PartialEq for FormValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (FormValue::Null, FormValue::Null) => true,
            (FormValue::Bool(a), FormValue::Bool(b)) => a == b,
            (FormValue::Number(a), FormValue::Number(b)) => a.to_bits() == b.to_bits(),
            (FormValue::Text(a), FormValue::Text(b)) => a == b,
            (FormValue::Group(a), FormValue::Group(b)) => {
                a.len() == b.len() && a.iter().zip(b.iter()).all(|(x, y)| x == y)
            }
            (FormValue::List(a), FormValue::List(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for FormValue {}

impl Hash for FormValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            FormValue::Null => {}
            FormValue::Bool(flag) => flag.hash(state),
            FormValue::Number(number) => number.to_bits().hash(state),
            FormValue::Text(text) => text.hash(state),
            FormValue::Group(entries) => {
                entries.len().hash(state);
                for (key, value) in entries {
                    key.hash(state);
                    value.hash(state);
                }
            }
            FormValue::List(items) => items.hash(state),
        }
    }
}

impl fmt::Display for FormValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormValue::Null => f.write_str("null"),
            FormValue::Bool(flag) => write!(f, "{flag}"),
            FormValue::Number(number) => write!(f, "{number}"),
            FormValue::Text(text) => write!(f, "{text:?}"),
            FormValue::Group(entries) => {
                f.write_str("{")?;
                for (index, (key, value)) in entries.iter().enumerate() {
                    if index > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{key}: {value}")?;
                }
                f.write_str("}")
            }
            FormValue::List(items) => {
                f.write_str("[")?;
                for (index, value) in items.iter().enumerate() {
                    if index > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{value}")?;
                }
                f.write_str("]")
            }
        }
    }
}

impl From<&str> for FormValue {
    fn from(value: &str) -> Self {
        FormValue::Text(value.to_owned())
    }
}

impl From<String> for FormValue {
    fn from(value: String) -> Self {
        FormValue::Text(value)
    }
}

impl From<bool> for FormValue {
    fn from(value: bool) -> Self {
        FormValue::Bool(value)
    }
}

impl From<f64> for FormValue {
    fn from(value: f64) -> Self {
        FormValue::Number(value)
    }
}

impl From<i32> for FormValue {
    fn from(value: i32) -> Self {
        FormValue::Number(f64::from(value))
    }
}

impl From<u32> for FormValue {
    fn from(value: u32) -> Self {
        FormValue::Number(f64::from(value))
    }
}

impl<T: Into<FormValue>> From<Option<T>> for FormValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(FormValue::Null)
    }
}

impl<T: Into<FormValue>> From<Vec<T>> for FormValue {
    fn from(value: Vec<T>) -> Self {
        FormValue::list(value)
    }
}
