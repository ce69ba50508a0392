//! Attribute values and their bridge to native collections.
//!
//! Declared and stored state attributes are tri-state: explicitly null,
//! unknown until computed, or a concrete value. Null and an empty collection
//! are different values and stay different through every conversion here.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A declared or stored attribute value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Attr<T> {
    /// Not specified.
    Null,
    /// Will only be known after apply; never persisted.
    Unknown,
    Value(T),
}

pub type StringAttr = Attr<String>;
/// List of strings whose elements may themselves be null or unknown.
pub type ListAttr = Attr<Vec<StringAttr>>;
/// Map of strings whose elements may themselves be null or unknown.
pub type MapAttr = Attr<BTreeMap<String, StringAttr>>;

impl<T> Default for Attr<T> {
    fn default() -> Self {
        Attr::Null
    }
}

impl<T> Attr<T> {
    pub fn is_null(&self) -> bool {
        matches!(self, Attr::Null)
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, Attr::Unknown)
    }

    pub fn is_known(&self) -> bool {
        matches!(self, Attr::Value(_))
    }

    pub fn as_value(&self) -> Option<&T> {
        match self {
            Attr::Value(v) => Some(v),
            _ => None,
        }
    }

    /// `None` becomes `Null`.
    pub fn from_option(value: Option<T>) -> Self {
        value.map_or(Attr::Null, Attr::Value)
    }
}

impl From<&str> for Attr<String> {
    fn from(s: &str) -> Self {
        Attr::Value(s.to_string())
    }
}

impl From<String> for Attr<String> {
    fn from(s: String) -> Self {
        Attr::Value(s)
    }
}

impl<T: Serialize> Serialize for Attr<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Attr::Null => serializer.serialize_none(),
            Attr::Value(v) => serializer.serialize_some(v),
            Attr::Unknown => Err(serde::ser::Error::custom(
                "unknown attribute values cannot be persisted",
            )),
        }
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Attr<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Option::<T>::deserialize(deserializer).map(Attr::from_option)
    }
}

// ---------------------------------------------------------------------------
// Conversion errors
// ---------------------------------------------------------------------------

/// An attribute could not be converted to its native form.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error(
    "cannot convert {} to a native {target}: {detail}",
    .attribute.as_deref().unwrap_or("value")
)]
pub struct ConversionError {
    /// `"map"` or `"list"`.
    pub target: &'static str,
    /// Attribute name, once known.
    pub attribute: Option<String>,
    pub detail: String,
}

impl ConversionError {
    fn new(target: &'static str, detail: String) -> Self {
        Self {
            target,
            attribute: None,
            detail,
        }
    }

    /// Name the attribute the failure belongs to.
    pub fn at(mut self, attribute: &str) -> Self {
        self.attribute = Some(attribute.to_string());
        self
    }
}

fn element_state<T>(element: &Attr<T>) -> Option<&'static str> {
    match element {
        Attr::Null => Some("null"),
        Attr::Unknown => Some("unknown"),
        Attr::Value(_) => None,
    }
}

// ---------------------------------------------------------------------------
// Attribute -> native
// ---------------------------------------------------------------------------

/// Convert a map attribute. Null and unknown become `None`, never an empty map.
pub fn to_native_map(value: &MapAttr) -> Result<Option<BTreeMap<String, String>>, ConversionError> {
    let elements = match value {
        Attr::Value(elements) => elements,
        Attr::Null | Attr::Unknown => return Ok(None),
    };
    let mut result = BTreeMap::new();
    for (key, element) in elements {
        match element {
            Attr::Value(v) => {
                result.insert(key.clone(), v.clone());
            }
            other => {
                return Err(ConversionError::new(
                    "map",
                    format!("element '{}' is {}", key, element_state(other).unwrap_or("")),
                ))
            }
        }
    }
    Ok(Some(result))
}

/// Convert a list attribute. Null and unknown become `None`, never an empty list.
pub fn to_native_list(value: &ListAttr) -> Result<Option<Vec<String>>, ConversionError> {
    let elements = match value {
        Attr::Value(elements) => elements,
        Attr::Null | Attr::Unknown => return Ok(None),
    };
    elements
        .iter()
        .enumerate()
        .map(|(index, element)| match element {
            Attr::Value(v) => Ok(v.clone()),
            other => Err(ConversionError::new(
                "list",
                format!(
                    "element at index {} is {}",
                    index,
                    element_state(other).unwrap_or("")
                ),
            )),
        })
        .collect::<Result<Vec<_>, _>>()
        .map(Some)
}

/// The string value, if known.
pub fn to_native_string(value: &StringAttr) -> Option<&str> {
    value.as_value().map(String::as_str)
}

/// Null, unknown, and `""` all count as "not set".
pub fn is_empty_string(value: &StringAttr) -> bool {
    to_native_string(value).map_or(true, str::is_empty)
}

// ---------------------------------------------------------------------------
// Native -> attribute
// ---------------------------------------------------------------------------

pub fn from_native_map(map: &BTreeMap<String, String>) -> MapAttr {
    Attr::Value(
        map.iter()
            .map(|(k, v)| (k.clone(), Attr::Value(v.clone())))
            .collect(),
    )
}

pub fn from_native_list(list: &[String]) -> ListAttr {
    Attr::Value(list.iter().cloned().map(Attr::Value).collect())
}

/// `None` becomes null; `Some` of an empty map stays an empty map.
pub fn from_optional_map(map: Option<&BTreeMap<String, String>>) -> MapAttr {
    map.map_or(Attr::Null, from_native_map)
}

/// `None` becomes null; `Some` of an empty list stays an empty list.
pub fn from_optional_list(list: Option<&[String]>) -> ListAttr {
    list.map_or(Attr::Null, from_native_list)
}

pub fn from_optional_string(value: Option<&str>) -> StringAttr {
    value.map_or(Attr::Null, |s| Attr::Value(s.to_string()))
}
