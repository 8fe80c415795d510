//! Built-in value types and schema definitions
//!
//! The value vocabulary of the format (what an attribute or element value
//! may contain) and the schema definition files compiled into the library.

use std::fmt;

use serde::Serialize;

/// Schema definitions shipped with the library, keyed by format version
pub const BUILTIN_SCHEMAS: &[(&str, &str)] = &[
    ("1.6", include_str!("../../schemas/1.6.xml")),
    ("1.7", include_str!("../../schemas/1.7.xml")),
];

/// Type of an attribute or element value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueType {
    /// Free text
    String,
    /// `true`, `false`, `1` or `0`
    Bool,
    /// Signed integer
    Int,
    /// Unsigned integer
    UnsignedInt,
    /// Double precision number
    Double,
    /// Single precision number
    Float,
    /// Two numbers
    Vector2d,
    /// Two integers
    Vector2i,
    /// Three numbers
    Vector3,
    /// Position and roll-pitch-yaw: six numbers
    Pose,
    /// RGB or RGBA components
    Color,
    /// Seconds, optionally followed by nanoseconds
    Time,
}

impl ValueType {
    /// Parse a value type from its schema name
    pub fn from_name(name: &str) -> Option<Self> {
        let value_type = match name {
            "string" => ValueType::String,
            "bool" => ValueType::Bool,
            "int" => ValueType::Int,
            "unsigned int" => ValueType::UnsignedInt,
            "double" => ValueType::Double,
            "float" => ValueType::Float,
            "vector2d" => ValueType::Vector2d,
            "vector2i" => ValueType::Vector2i,
            "vector3" => ValueType::Vector3,
            "pose" => ValueType::Pose,
            "color" => ValueType::Color,
            "time" => ValueType::Time,
            _ => return None,
        };
        Some(value_type)
    }

    /// Get the schema name of the type
    pub fn as_str(&self) -> &'static str {
        match self {
            ValueType::String => "string",
            ValueType::Bool => "bool",
            ValueType::Int => "int",
            ValueType::UnsignedInt => "unsigned int",
            ValueType::Double => "double",
            ValueType::Float => "float",
            ValueType::Vector2d => "vector2d",
            ValueType::Vector2i => "vector2i",
            ValueType::Vector3 => "vector3",
            ValueType::Pose => "pose",
            ValueType::Color => "color",
            ValueType::Time => "time",
        }
    }

    /// Check that `value` is a lexically valid instance of this type
    pub fn is_valid(&self, value: &str) -> bool {
        let value = value.trim();
        match self {
            ValueType::String => true,
            ValueType::Bool => matches!(
                value.to_ascii_lowercase().as_str(),
                "true" | "false" | "1" | "0"
            ),
            ValueType::Int => value.parse::<i64>().is_ok(),
            ValueType::UnsignedInt => value.parse::<u64>().is_ok(),
            ValueType::Double | ValueType::Float => value.parse::<f64>().is_ok(),
            ValueType::Vector2d => numbers(value).map_or(false, |n| n == 2),
            ValueType::Vector2i => {
                let parts: Vec<&str> = value.split_whitespace().collect();
                parts.len() == 2 && parts.iter().all(|p| p.parse::<i64>().is_ok())
            }
            ValueType::Vector3 => numbers(value).map_or(false, |n| n == 3),
            ValueType::Pose => numbers(value).map_or(false, |n| n == 6),
            ValueType::Color => numbers(value).map_or(false, |n| n == 3 || n == 4),
            ValueType::Time => numbers(value).map_or(false, |n| n == 1 || n == 2),
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Count whitespace-separated numbers, or None if any token is not a number
fn numbers(value: &str) -> Option<usize> {
    let mut count = 0;
    for token in value.split_whitespace() {
        token.parse::<f64>().ok()?;
        count += 1;
    }
    Some(count)
}
