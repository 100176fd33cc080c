//! Field value kinds, bindable values and row coercion.
//!
//! # Responsibility
//! - Describe the storage-facing kinds a mapped field can declare.
//! - Move values between record fields and positional SQL parameters.
//! - Coerce raw SQLite row values into a field's declared kind.
//!
//! # Invariants
//! - A SQL `NULL` never goes through coercion; it maps to `FieldValue::Null`
//!   and from there to the field's empty representation.
//! - Integer narrowing is range-checked and never wraps.
//! - `f32` values survive a write/read cycle exactly (widened to `f64` on bind).

use rusqlite::types::{ToSqlOutput, Value, ValueRef};
use rusqlite::ToSql;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Declared storage kind of one mapped field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueType {
    I64,
    I32,
    F64,
    F32,
    Bool,
    Text,
    /// Opaque values passed through without conversion.
    Other,
}

impl ValueType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::I64 => "i64",
            Self::I32 => "i32",
            Self::F64 => "f64",
            Self::F32 => "f32",
            Self::Bool => "bool",
            Self::Text => "text",
            Self::Other => "other",
        }
    }

    /// Whether the storage can generate values of this kind on insert.
    pub fn is_integer(self) -> bool {
        matches!(self, Self::I64 | Self::I32)
    }
}

impl Display for ValueType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failure to move a value into or out of a record field.
///
/// Always indicates a mismatch between a record type's declaration and the
/// data it meets, never a storage failure.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldAccessError {
    TypeMismatch {
        expected: ValueType,
        found: &'static str,
    },
    OutOfRange {
        target: ValueType,
        value: String,
    },
    InvalidUtf8,
    /// The result row has no column with the mapped name.
    MissingColumn(String),
}

impl Display for FieldAccessError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TypeMismatch { expected, found } => {
                write!(f, "expected a `{expected}` value, found `{found}`")
            }
            Self::OutOfRange { target, value } => {
                write!(f, "value {value} does not fit into `{target}`")
            }
            Self::InvalidUtf8 => write!(f, "text value is not valid UTF-8"),
            Self::MissingColumn(column) => write!(f, "result row has no column `{column}`"),
        }
    }
}

impl Error for FieldAccessError {}

/// One field value, read from a record or coerced from a row.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Null,
    I64(i64),
    I32(i32),
    F64(f64),
    F32(f32),
    Bool(bool),
    Text(String),
    Other(Value),
}

impl FieldValue {
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Short kind name used in diagnostics.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::I64(_) => ValueType::I64.as_str(),
            Self::I32(_) => ValueType::I32.as_str(),
            Self::F64(_) => ValueType::F64.as_str(),
            Self::F32(_) => ValueType::F32.as_str(),
            Self::Bool(_) => ValueType::Bool.as_str(),
            Self::Text(_) => ValueType::Text.as_str(),
            Self::Other(_) => ValueType::Other.as_str(),
        }
    }

    /// Zero-as-new sentinel for identifier values.
    ///
    /// `Null` and numeric zero mean "not yet persisted". Every other value,
    /// including text and opaque values, means "already persisted". A record
    /// whose real identifier is zero is therefore always treated as new.
    pub fn is_unset_identifier(&self) -> bool {
        match self {
            Self::Null => true,
            Self::I64(value) => *value == 0,
            Self::I32(value) => *value == 0,
            Self::F64(value) => *value == 0.0,
            Self::F32(value) => *value == 0.0,
            Self::Bool(_) | Self::Text(_) | Self::Other(_) => false,
        }
    }

    /// Coerces one raw row value into the `target` kind.
    ///
    /// # Errors
    /// - `TypeMismatch` when the raw storage class cannot feed `target`.
    /// - `OutOfRange` when a numeric value does not fit an integer target.
    pub fn from_raw(raw: ValueRef<'_>, target: ValueType) -> Result<Self, FieldAccessError> {
        match (raw, target) {
            (ValueRef::Null, _) => Ok(Self::Null),
            (raw, ValueType::Other) => Ok(Self::Other(Value::from(raw))),
            (ValueRef::Integer(value), ValueType::I64) => Ok(Self::I64(value)),
            (ValueRef::Integer(value), ValueType::I32) => i32::try_from(value)
                .map(Self::I32)
                .map_err(|_| FieldAccessError::OutOfRange {
                    target,
                    value: value.to_string(),
                }),
            (ValueRef::Real(value), ValueType::I64) => real_to_i64(value, target).map(Self::I64),
            (ValueRef::Real(value), ValueType::I32) => {
                let widened = real_to_i64(value, target)?;
                i32::try_from(widened)
                    .map(Self::I32)
                    .map_err(|_| FieldAccessError::OutOfRange {
                        target,
                        value: value.to_string(),
                    })
            }
            (ValueRef::Integer(value), ValueType::F64) => Ok(Self::F64(value as f64)),
            (ValueRef::Real(value), ValueType::F64) => Ok(Self::F64(value)),
            (ValueRef::Integer(value), ValueType::F32) => Ok(Self::F32(value as f32)),
            (ValueRef::Real(value), ValueType::F32) => Ok(Self::F32(value as f32)),
            (ValueRef::Integer(value), ValueType::Bool) => Ok(Self::Bool(value != 0)),
            (ValueRef::Real(value), ValueType::Bool) => Ok(Self::Bool(value != 0.0)),
            (ValueRef::Text(bytes), ValueType::Text) => std::str::from_utf8(bytes)
                .map(|text| Self::Text(text.to_string()))
                .map_err(|_| FieldAccessError::InvalidUtf8),
            (raw, expected) => Err(FieldAccessError::TypeMismatch {
                expected,
                found: storage_class_name(raw),
            }),
        }
    }
}

impl ToSql for FieldValue {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        let output = match self {
            Self::Null => ToSqlOutput::Owned(Value::Null),
            Self::I64(value) => ToSqlOutput::Owned(Value::Integer(*value)),
            Self::I32(value) => ToSqlOutput::Owned(Value::Integer(i64::from(*value))),
            Self::F64(value) => ToSqlOutput::Owned(Value::Real(*value)),
            Self::F32(value) => ToSqlOutput::Owned(Value::Real(f64::from(*value))),
            Self::Bool(value) => ToSqlOutput::Owned(Value::Integer(i64::from(*value))),
            Self::Text(value) => ToSqlOutput::Borrowed(ValueRef::Text(value.as_bytes())),
            Self::Other(value) => ToSqlOutput::Borrowed(ValueRef::from(value)),
        };
        Ok(output)
    }
}

/// Rust field types that can back a mapped column.
///
/// Plain types map `Null` to their zero/empty default; `Option` types map it
/// to `None`.
pub trait FieldType: Sized {
    const VALUE_TYPE: ValueType;

    fn to_field_value(&self) -> FieldValue;

    fn from_field_value(value: FieldValue) -> Result<Self, FieldAccessError>;
}

macro_rules! impl_field_type {
    ($ty:ty, $variant:ident) => {
        impl FieldType for $ty {
            const VALUE_TYPE: ValueType = ValueType::$variant;

            fn to_field_value(&self) -> FieldValue {
                FieldValue::$variant(self.clone())
            }

            fn from_field_value(value: FieldValue) -> Result<Self, FieldAccessError> {
                match value {
                    FieldValue::$variant(inner) => Ok(inner),
                    FieldValue::Null => Ok(<$ty>::default()),
                    other => Err(FieldAccessError::TypeMismatch {
                        expected: ValueType::$variant,
                        found: other.kind_name(),
                    }),
                }
            }
        }

        impl FieldType for Option<$ty> {
            const VALUE_TYPE: ValueType = ValueType::$variant;

            fn to_field_value(&self) -> FieldValue {
                match self {
                    Some(inner) => FieldValue::$variant(inner.clone()),
                    None => FieldValue::Null,
                }
            }

            fn from_field_value(value: FieldValue) -> Result<Self, FieldAccessError> {
                match value {
                    FieldValue::$variant(inner) => Ok(Some(inner)),
                    FieldValue::Null => Ok(None),
                    other => Err(FieldAccessError::TypeMismatch {
                        expected: ValueType::$variant,
                        found: other.kind_name(),
                    }),
                }
            }
        }
    };
}

impl_field_type!(i64, I64);
impl_field_type!(i32, I32);
impl_field_type!(f64, F64);
impl_field_type!(f32, F32);
impl_field_type!(bool, Bool);
impl_field_type!(String, Text);

impl FieldType for Value {
    const VALUE_TYPE: ValueType = ValueType::Other;

    fn to_field_value(&self) -> FieldValue {
        match self {
            Value::Null => FieldValue::Null,
            other => FieldValue::Other(other.clone()),
        }
    }

    fn from_field_value(value: FieldValue) -> Result<Self, FieldAccessError> {
        let raw = match value {
            FieldValue::Null => Value::Null,
            FieldValue::I64(inner) => Value::Integer(inner),
            FieldValue::I32(inner) => Value::Integer(i64::from(inner)),
            FieldValue::F64(inner) => Value::Real(inner),
            FieldValue::F32(inner) => Value::Real(f64::from(inner)),
            FieldValue::Bool(inner) => Value::Integer(i64::from(inner)),
            FieldValue::Text(inner) => Value::Text(inner),
            FieldValue::Other(inner) => inner,
        };
        Ok(raw)
    }
}

fn real_to_i64(value: f64, target: ValueType) -> Result<i64, FieldAccessError> {
    let truncated = value.trunc();
    if truncated.is_finite() && truncated >= i64::MIN as f64 && truncated < i64::MAX as f64 {
        Ok(truncated as i64)
    } else {
        Err(FieldAccessError::OutOfRange {
            target,
            value: value.to_string(),
        })
    }
}

fn storage_class_name(raw: ValueRef<'_>) -> &'static str {
    match raw {
        ValueRef::Null => "null",
        ValueRef::Integer(_) => "integer",
        ValueRef::Real(_) => "real",
        ValueRef::Text(_) => "text",
        ValueRef::Blob(_) => "blob",
    }
}

#[cfg(test)]
mod tests {
    use super::{FieldAccessError, FieldType, FieldValue, ValueType};
    use rusqlite::types::{Value, ValueRef};

    #[test]
    fn null_maps_to_null_for_every_target() {
        for target in [
            ValueType::I64,
            ValueType::I32,
            ValueType::F64,
            ValueType::F32,
            ValueType::Bool,
            ValueType::Text,
            ValueType::Other,
        ] {
            assert_eq!(
                FieldValue::from_raw(ValueRef::Null, target).unwrap(),
                FieldValue::Null
            );
        }
    }

    #[test]
    fn integers_are_narrowed_with_range_check() {
        assert_eq!(
            FieldValue::from_raw(ValueRef::Integer(42), ValueType::I32).unwrap(),
            FieldValue::I32(42)
        );
        let err = FieldValue::from_raw(ValueRef::Integer(i64::MAX), ValueType::I32).unwrap_err();
        assert!(matches!(err, FieldAccessError::OutOfRange { .. }));
    }

    #[test]
    fn reals_feed_integer_and_float_targets() {
        assert_eq!(
            FieldValue::from_raw(ValueRef::Real(7.9), ValueType::I64).unwrap(),
            FieldValue::I64(7)
        );
        assert_eq!(
            FieldValue::from_raw(ValueRef::Integer(3), ValueType::F64).unwrap(),
            FieldValue::F64(3.0)
        );
        assert_eq!(
            FieldValue::from_raw(ValueRef::Real(1.5), ValueType::F32).unwrap(),
            FieldValue::F32(1.5)
        );
        let err = FieldValue::from_raw(ValueRef::Real(f64::NAN), ValueType::I64).unwrap_err();
        assert!(matches!(err, FieldAccessError::OutOfRange { .. }));
    }

    #[test]
    fn numeric_booleans_use_nonzero_rule() {
        assert_eq!(
            FieldValue::from_raw(ValueRef::Integer(7), ValueType::Bool).unwrap(),
            FieldValue::Bool(true)
        );
        assert_eq!(
            FieldValue::from_raw(ValueRef::Integer(0), ValueType::Bool).unwrap(),
            FieldValue::Bool(false)
        );
    }

    #[test]
    fn text_target_rejects_numbers() {
        let err = FieldValue::from_raw(ValueRef::Integer(1), ValueType::Text).unwrap_err();
        assert_eq!(
            err,
            FieldAccessError::TypeMismatch {
                expected: ValueType::Text,
                found: "integer",
            }
        );
    }

    #[test]
    fn other_target_passes_raw_value_through() {
        assert_eq!(
            FieldValue::from_raw(ValueRef::Blob(&[1, 2]), ValueType::Other).unwrap(),
            FieldValue::Other(Value::Blob(vec![1, 2]))
        );
    }

    #[test]
    fn zero_and_null_identifiers_are_unset() {
        assert!(FieldValue::Null.is_unset_identifier());
        assert!(FieldValue::I64(0).is_unset_identifier());
        assert!(FieldValue::I32(0).is_unset_identifier());
        assert!(!FieldValue::I64(5).is_unset_identifier());
        assert!(!FieldValue::Text(String::new()).is_unset_identifier());
    }

    #[test]
    fn plain_and_optional_types_handle_null_differently() {
        assert_eq!(i32::from_field_value(FieldValue::Null).unwrap(), 0);
        assert_eq!(String::from_field_value(FieldValue::Null).unwrap(), "");
        assert_eq!(
            Option::<String>::from_field_value(FieldValue::Null).unwrap(),
            None
        );
        assert_eq!(Some(3_i64).to_field_value(), FieldValue::I64(3));
        assert_eq!(None::<bool>.to_field_value(), FieldValue::Null);
    }

    #[test]
    fn field_type_rejects_mismatched_variant() {
        let err = i64::from_field_value(FieldValue::Text("x".to_string())).unwrap_err();
        assert!(matches!(
            err,
            FieldAccessError::TypeMismatch {
                expected: ValueType::I64,
                found: "text"
            }
        ));
    }
}
