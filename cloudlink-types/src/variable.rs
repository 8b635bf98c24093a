//! Cloud variable kinds and values.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Maximum length of a cloud variable name, in bytes.
pub const MAX_VARIABLE_NAME_LEN: usize = 64;

/// Maximum length of a cloud function name, in bytes.
pub const MAX_FUNCTION_NAME_LEN: usize = 12;

/// The wire kind of a registered variable.
///
/// Discriminants match the tag values the connection engine stores in its
/// variable table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum VariableKind {
    Bool = 1,
    Int = 2,
    String = 4,
    Double = 9,
}

impl VariableKind {
    /// Returns the engine tag for this kind.
    #[must_use]
    pub const fn tag(self) -> u8 {
        self as u8
    }

    /// Returns the kind for an engine tag.
    pub fn from_tag(tag: u8) -> crate::Result<Self> {
        match tag {
            1 => Ok(Self::Bool),
            2 => Ok(Self::Int),
            4 => Ok(Self::String),
            9 => Ok(Self::Double),
            other => Err(crate::Error::UnknownKind(other)),
        }
    }

    /// Returns the lowercase name used in cloud API responses.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::Int => "int32",
            Self::String => "string",
            Self::Double => "double",
        }
    }
}

impl fmt::Display for VariableKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A value read from a registered variable at query time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum VariableValue {
    Bool(bool),
    Int(i32),
    Double(f64),
    String(String),
}

impl VariableValue {
    /// Returns the kind of this value.
    #[must_use]
    pub const fn kind(&self) -> VariableKind {
        match self {
            Self::Bool(_) => VariableKind::Bool,
            Self::Int(_) => VariableKind::Int,
            Self::Double(_) => VariableKind::Double,
            Self::String(_) => VariableKind::String,
        }
    }

    /// Returns the boolean payload, if this is a bool.
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the integer payload, if this is an int.
    #[must_use]
    pub fn as_int(&self) -> Option<i32> {
        match self {
            Self::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the floating-point payload, if this is a double.
    #[must_use]
    pub fn as_double(&self) -> Option<f64> {
        match self {
            Self::Double(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the string payload, if this is a string.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(v) => Some(v),
            _ => None,
        }
    }

    /// Renders the value the way the cloud reports a variable query:
    /// `{"name": ..., "result": ..., "type": ...}`.
    pub fn to_response_json(&self, name: &str) -> crate::Result<String> {
        let body = serde_json::json!({
            "name": name,
            "result": self,
            "type": self.kind().as_str(),
        });
        Ok(serde_json::to_string(&body)?)
    }
}

impl From<bool> for VariableValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i32> for VariableValue {
    fn from(v: i32) -> Self {
        Self::Int(v)
    }
}

/// Unsigned values share the 32-bit int wire kind; values above `i32::MAX`
/// wrap, matching how the engine reinterprets the storage.
impl From<u32> for VariableValue {
    fn from(v: u32) -> Self {
        Self::Int(v as i32)
    }
}

impl From<f64> for VariableValue {
    fn from(v: f64) -> Self {
        Self::Double(v)
    }
}

impl From<String> for VariableValue {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

impl From<&str> for VariableValue {
    fn from(v: &str) -> Self {
        Self::String(v.to_string())
    }
}
