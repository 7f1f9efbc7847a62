//! Provider-level column values.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::AggregateId;
use crate::convert::ConversionError;

/// Storage type of a mapped column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ColumnKind {
    Text,
    Integer,
    Boolean,
    Uuid,
    Timestamp,
}

impl std::fmt::Display for ColumnKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ColumnKind::Text => "text",
            ColumnKind::Integer => "integer",
            ColumnKind::Boolean => "boolean",
            ColumnKind::Uuid => "uuid",
            ColumnKind::Timestamp => "timestamp",
        };
        f.write_str(name)
    }
}

/// A single value as the store sees it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ColumnValue {
    Null,
    Text(String),
    Integer(i64),
    Boolean(bool),
    Uuid(Uuid),
    Timestamp(DateTime<Utc>),
}

impl ColumnValue {
    /// Returns the kind of a non-null value.
    pub fn kind(&self) -> Option<ColumnKind> {
        match self {
            ColumnValue::Null => None,
            ColumnValue::Text(_) => Some(ColumnKind::Text),
            ColumnValue::Integer(_) => Some(ColumnKind::Integer),
            ColumnValue::Boolean(_) => Some(ColumnKind::Boolean),
            ColumnValue::Uuid(_) => Some(ColumnKind::Uuid),
            ColumnValue::Timestamp(_) => Some(ColumnKind::Timestamp),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, ColumnValue::Null)
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            ColumnValue::Text(text) => Some(text),
            _ => None,
        }
    }

    fn mismatch(&self, expected: ColumnKind) -> ConversionError {
        match self.kind() {
            Some(found) => ConversionError::TypeMismatch { expected, found },
            None => ConversionError::UnexpectedNull { expected },
        }
    }
}

/// Rust types with a direct column representation.
pub trait ColumnType: Sized {
    const KIND: ColumnKind;

    fn to_column(&self) -> ColumnValue;

    fn from_column(value: &ColumnValue) -> Result<Self, ConversionError>;
}

impl ColumnType for String {
    const KIND: ColumnKind = ColumnKind::Text;

    fn to_column(&self) -> ColumnValue {
        ColumnValue::Text(self.clone())
    }

    fn from_column(value: &ColumnValue) -> Result<Self, ConversionError> {
        match value {
            ColumnValue::Text(text) => Ok(text.clone()),
            other => Err(other.mismatch(Self::KIND)),
        }
    }
}

impl ColumnType for i64 {
    const KIND: ColumnKind = ColumnKind::Integer;

    fn to_column(&self) -> ColumnValue {
        ColumnValue::Integer(*self)
    }

    fn from_column(value: &ColumnValue) -> Result<Self, ConversionError> {
        match value {
            ColumnValue::Integer(n) => Ok(*n),
            other => Err(other.mismatch(Self::KIND)),
        }
    }
}

impl ColumnType for u32 {
    const KIND: ColumnKind = ColumnKind::Integer;

    fn to_column(&self) -> ColumnValue {
        ColumnValue::Integer(i64::from(*self))
    }

    fn from_column(value: &ColumnValue) -> Result<Self, ConversionError> {
        let n = i64::from_column(value)?;
        u32::try_from(n).map_err(|_| ConversionError::Malformed(format!("{n} is out of range")))
    }
}

impl ColumnType for bool {
    const KIND: ColumnKind = ColumnKind::Boolean;

    fn to_column(&self) -> ColumnValue {
        ColumnValue::Boolean(*self)
    }

    fn from_column(value: &ColumnValue) -> Result<Self, ConversionError> {
        match value {
            ColumnValue::Boolean(b) => Ok(*b),
            other => Err(other.mismatch(Self::KIND)),
        }
    }
}

impl ColumnType for Uuid {
    const KIND: ColumnKind = ColumnKind::Uuid;

    fn to_column(&self) -> ColumnValue {
        ColumnValue::Uuid(*self)
    }

    fn from_column(value: &ColumnValue) -> Result<Self, ConversionError> {
        match value {
            ColumnValue::Uuid(uuid) => Ok(*uuid),
            other => Err(other.mismatch(Self::KIND)),
        }
    }
}

impl ColumnType for AggregateId {
    const KIND: ColumnKind = ColumnKind::Uuid;

    fn to_column(&self) -> ColumnValue {
        ColumnValue::Uuid(self.as_uuid())
    }

    fn from_column(value: &ColumnValue) -> Result<Self, ConversionError> {
        Uuid::from_column(value).map(AggregateId::from_uuid)
    }
}

impl ColumnType for DateTime<Utc> {
    const KIND: ColumnKind = ColumnKind::Timestamp;

    fn to_column(&self) -> ColumnValue {
        ColumnValue::Timestamp(*self)
    }

    fn from_column(value: &ColumnValue) -> Result<Self, ConversionError> {
        match value {
            ColumnValue::Timestamp(at) => Ok(*at),
            other => Err(other.mismatch(Self::KIND)),
        }
    }
}

impl<T: ColumnType> ColumnType for Option<T> {
    const KIND: ColumnKind = T::KIND;

    fn to_column(&self) -> ColumnValue {
        match self {
            Some(value) => value.to_column(),
            None => ColumnValue::Null,
        }
    }

    fn from_column(value: &ColumnValue) -> Result<Self, ConversionError> {
        match value {
            ColumnValue::Null => Ok(None),
            other => T::from_column(other).map(Some),
        }
    }
}
