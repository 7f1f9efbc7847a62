//! Declarative property mapping.
//!
//! A [`Property`] names a column, says how to read the value off an
//! aggregate, how to convert it for storage and how to compare two values
//! of it during change detection. Constraints (`required`, `max_length`)
//! are checked against the converted column value.

use std::hash::Hash;
use std::sync::Arc;

use crate::column::{ColumnKind, ColumnType, ColumnValue};
use crate::compare::{DefaultComparer, ValueComparer};
use crate::convert::{ColumnTypeConverter, ConversionError, ValueConverter};

/// Constraint a property value broke.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViolationKind {
    Required,
    TooLong { max: usize, actual: usize },
}

/// A single constraint violation on a mapped column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldViolation {
    pub column: &'static str,
    pub kind: ViolationKind,
}

impl FieldViolation {
    pub fn new(column: &'static str, kind: ViolationKind) -> Self {
        Self { column, kind }
    }
}

impl std::fmt::Display for FieldViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.kind {
            ViolationKind::Required => write!(f, "{} is required", self.column),
            ViolationKind::TooLong { max, actual } => {
                write!(f, "{} exceeds {max} characters ({actual})", self.column)
            }
        }
    }
}

/// Mapping of one property of `A` to one column.
pub struct Property<A, T> {
    column: &'static str,
    accessor: fn(&A) -> T,
    converter: Arc<dyn ValueConverter<T>>,
    comparer: Arc<dyn ValueComparer<T>>,
    required: bool,
    max_length: Option<usize>,
}

impl<A, T> Property<A, T>
where
    T: ColumnType + PartialEq + Hash + Send + Sync + 'static,
{
    /// Maps a property whose type has a direct column form.
    pub fn new(column: &'static str, accessor: fn(&A) -> T) -> Self {
        Self::converted(column, accessor, ColumnTypeConverter)
    }
}

impl<A, T> Property<A, T>
where
    T: PartialEq + Hash + Send + Sync + 'static,
{
    /// Maps a property through a custom converter.
    pub fn converted(
        column: &'static str,
        accessor: fn(&A) -> T,
        converter: impl ValueConverter<T> + 'static,
    ) -> Self {
        Self {
            column,
            accessor,
            converter: Arc::new(converter),
            comparer: Arc::new(DefaultComparer),
            required: false,
            max_length: None,
        }
    }
}

impl<A, T: 'static> Property<A, T> {
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Maximum length in characters of the stored text.
    pub fn max_length(mut self, max: usize) -> Self {
        self.max_length = Some(max);
        self
    }

    /// Overrides the equality used for change detection.
    pub fn with_comparer(mut self, comparer: impl ValueComparer<T> + 'static) -> Self {
        self.comparer = Arc::new(comparer);
        self
    }

    pub fn column(&self) -> &'static str {
        self.column
    }

    pub fn value_of(&self, entity: &A) -> T {
        (self.accessor)(entity)
    }

    pub fn comparer(&self) -> &dyn ValueComparer<T> {
        self.comparer.as_ref()
    }

    pub fn converter(&self) -> &dyn ValueConverter<T> {
        self.converter.as_ref()
    }
}

/// Type-erased property used by an entity type.
pub trait PropertyMapping<A>: Send + Sync {
    fn column(&self) -> &'static str;

    fn kind(&self) -> ColumnKind;

    fn is_required(&self) -> bool;

    fn max_length(&self) -> Option<usize>;

    /// Converts the property of `entity` to its stored form.
    fn write(&self, entity: &A) -> Result<ColumnValue, ConversionError>;

    /// True when the configured comparer says the value changed.
    fn differs(&self, current: &A, original: &A) -> bool;
}

impl<A, T> PropertyMapping<A> for Property<A, T>
where
    T: Send + Sync + 'static,
{
    fn column(&self) -> &'static str {
        self.column
    }

    fn kind(&self) -> ColumnKind {
        self.converter.provider_kind()
    }

    fn is_required(&self) -> bool {
        self.required
    }

    fn max_length(&self) -> Option<usize> {
        self.max_length
    }

    fn write(&self, entity: &A) -> Result<ColumnValue, ConversionError> {
        self.converter.to_provider(&self.value_of(entity))
    }

    fn differs(&self, current: &A, original: &A) -> bool {
        !self
            .comparer
            .equals(&self.value_of(current), &self.value_of(original))
    }
}

/// Checks a converted value against the property's constraints.
pub(crate) fn check_constraints<A>(
    property: &dyn PropertyMapping<A>,
    value: &ColumnValue,
    violations: &mut Vec<FieldViolation>,
) {
    let blank = match value {
        ColumnValue::Null => true,
        ColumnValue::Text(text) => text.trim().is_empty(),
        _ => false,
    };
    if property.is_required() && blank {
        violations.push(FieldViolation::new(
            property.column(),
            ViolationKind::Required,
        ));
    }

    if let (Some(max), ColumnValue::Text(text)) = (property.max_length(), value) {
        let actual = text.chars().count();
        if actual > max {
            violations.push(FieldViolation::new(
                property.column(),
                ViolationKind::TooLong { max, actual },
            ));
        }
    }
}
