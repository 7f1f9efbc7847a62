//! Value converters between domain types and column values.

use std::marker::PhantomData;

use serde::{Serialize, de::DeserializeOwned};
use thiserror::Error;

use crate::column::{ColumnKind, ColumnType, ColumnValue};

/// Why a value could not cross the domain/column boundary.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConversionError {
    #[error("expected {expected}, found NULL")]
    UnexpectedNull { expected: ColumnKind },

    #[error("expected {expected}, found {found}")]
    TypeMismatch {
        expected: ColumnKind,
        found: ColumnKind,
    },

    #[error("malformed value: {0}")]
    Malformed(String),

    #[error("unknown variant '{0}'")]
    UnknownVariant(String),
}

/// Converts a property of type `T` to and from its stored form.
pub trait ValueConverter<T>: Send + Sync {
    /// Kind of the column the converted value lands in.
    fn provider_kind(&self) -> ColumnKind;

    fn to_provider(&self, value: &T) -> Result<ColumnValue, ConversionError>;

    fn from_provider(&self, value: &ColumnValue) -> Result<T, ConversionError>;
}

/// Identity mapping for types that already have a column form.
#[derive(Debug, Clone, Copy, Default)]
pub struct ColumnTypeConverter;

impl<T: ColumnType> ValueConverter<T> for ColumnTypeConverter {
    fn provider_kind(&self) -> ColumnKind {
        T::KIND
    }

    fn to_provider(&self, value: &T) -> Result<ColumnValue, ConversionError> {
        Ok(value.to_column())
    }

    fn from_provider(&self, value: &ColumnValue) -> Result<T, ConversionError> {
        T::from_column(value)
    }
}

/// Stores a structured value as JSON text.
///
/// A `NULL` column means "not set yet" and reads back as `T::default()`
/// (an empty list for collections). Text that is not valid JSON for `T`
/// is a hard error, never silently replaced.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonConverter;

impl<T> ValueConverter<T> for JsonConverter
where
    T: Serialize + DeserializeOwned + Default,
{
    fn provider_kind(&self) -> ColumnKind {
        ColumnKind::Text
    }

    fn to_provider(&self, value: &T) -> Result<ColumnValue, ConversionError> {
        serde_json::to_string(value)
            .map(ColumnValue::Text)
            .map_err(|e| ConversionError::Malformed(e.to_string()))
    }

    fn from_provider(&self, value: &ColumnValue) -> Result<T, ConversionError> {
        match value {
            ColumnValue::Null => Ok(T::default()),
            ColumnValue::Text(json) => {
                serde_json::from_str(json).map_err(|e| ConversionError::Malformed(e.to_string()))
            }
            other => Err(ConversionError::TypeMismatch {
                expected: ColumnKind::Text,
                found: other.kind().unwrap_or(ColumnKind::Text),
            }),
        }
    }
}

/// Stores a fieldless enum as its variant name.
#[derive(Debug, Clone, Copy)]
pub struct EnumTextConverter<T>(PhantomData<fn() -> T>);

impl<T> EnumTextConverter<T> {
    pub fn new() -> Self {
        Self(PhantomData)
    }
}

impl<T> Default for EnumTextConverter<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> ValueConverter<T> for EnumTextConverter<T>
where
    T: Serialize + DeserializeOwned,
{
    fn provider_kind(&self) -> ColumnKind {
        ColumnKind::Text
    }

    fn to_provider(&self, value: &T) -> Result<ColumnValue, ConversionError> {
        match serde_json::to_value(value) {
            Ok(serde_json::Value::String(name)) => Ok(ColumnValue::Text(name)),
            Ok(other) => Err(ConversionError::Malformed(format!(
                "{other} is not a unit variant"
            ))),
            Err(e) => Err(ConversionError::Malformed(e.to_string())),
        }
    }

    fn from_provider(&self, value: &ColumnValue) -> Result<T, ConversionError> {
        match value {
            ColumnValue::Text(name) => serde_json::from_value(serde_json::Value::String(name.clone()))
                .map_err(|_| ConversionError::UnknownVariant(name.clone())),
            ColumnValue::Null => Err(ConversionError::UnexpectedNull {
                expected: ColumnKind::Text,
            }),
            other => Err(ConversionError::TypeMismatch {
                expected: ColumnKind::Text,
                found: other.kind().unwrap_or(ColumnKind::Text),
            }),
        }
    }
}
