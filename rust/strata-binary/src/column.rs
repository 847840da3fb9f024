//! Logical column model consumed by the makers.

use strata_common::error::Error;
use strata_encodings::numeric::IntegerValue;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ColumnType {
    Boolean = 1,
    Byte = 2,
    Short = 3,
    Integer = 4,
    Long = 5,
}

impl ColumnType {
    pub fn is_integer(&self) -> bool {
        matches!(
            self,
            ColumnType::Byte | ColumnType::Short | ColumnType::Integer | ColumnType::Long
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub enum PrimitiveValue {
    Boolean(bool),
    Byte(i8),
    Short(i16),
    Integer(i32),
    Long(i64),
}

impl PrimitiveValue {
    pub fn column_type(&self) -> ColumnType {
        match self {
            PrimitiveValue::Boolean(_) => ColumnType::Boolean,
            PrimitiveValue::Byte(_) => ColumnType::Byte,
            PrimitiveValue::Short(_) => ColumnType::Short,
            PrimitiveValue::Integer(_) => ColumnType::Integer,
            PrimitiveValue::Long(_) => ColumnType::Long,
        }
    }

    /// Integer value widened to `i64`, `None` for booleans.
    pub fn as_i64(&self) -> Option<i64> {
        match *self {
            PrimitiveValue::Boolean(_) => None,
            PrimitiveValue::Byte(v) => Some(v as i64),
            PrimitiveValue::Short(v) => Some(v as i64),
            PrimitiveValue::Integer(v) => Some(v as i64),
            PrimitiveValue::Long(v) => Some(v),
        }
    }

    /// Builds an integer value of the given column type, failing when `value`
    /// does not fit into it.
    pub fn from_i64(column_type: ColumnType, value: i64) -> strata_common::Result<Self> {
        let out_of_range =
            || Error::out_of_range("value", format!("{value} does not fit into {column_type:?}"));
        Ok(match column_type {
            ColumnType::Byte => PrimitiveValue::Byte(value.try_into().map_err(|_| out_of_range())?),
            ColumnType::Short => {
                PrimitiveValue::Short(value.try_into().map_err(|_| out_of_range())?)
            }
            ColumnType::Integer => {
                PrimitiveValue::Integer(value.try_into().map_err(|_| out_of_range())?)
            }
            ColumnType::Long => PrimitiveValue::Long(value),
            ColumnType::Boolean => {
                return Err(Error::encoding_unsupported(
                    "boolean value from an integer",
                ));
            }
        })
    }
}

/// Integer type stored in a column of a specific [`ColumnType`].
pub trait IntegerColumnValue: IntegerValue {
    const COLUMN_TYPE: ColumnType;

    fn from_value(value: &PrimitiveValue) -> Option<Self>;

    fn into_value(self) -> PrimitiveValue;
}

macro_rules! impl_integer_column_value {
    ($T:ty, $variant:ident) => {
        impl IntegerColumnValue for $T {
            const COLUMN_TYPE: ColumnType = ColumnType::$variant;

            fn from_value(value: &PrimitiveValue) -> Option<Self> {
                match *value {
                    PrimitiveValue::$variant(v) => Some(v),
                    _ => None,
                }
            }

            fn into_value(self) -> PrimitiveValue {
                PrimitiveValue::$variant(self)
            }
        }
    };
}

impl_integer_column_value!(i8, Byte);
impl_integer_column_value!(i16, Short);
impl_integer_column_value!(i32, Integer);
impl_integer_column_value!(i64, Long);

/// Read access to a logical column: a type tag and an ordered sequence of
/// nullable values.
pub trait Column {
    fn name(&self) -> &str;

    fn column_type(&self) -> ColumnType;

    fn row_count(&self) -> usize;

    /// Value at `index`, `None` for null rows.
    fn value(&self, index: usize) -> Option<PrimitiveValue>;

    fn is_null(&self, index: usize) -> bool {
        self.value(index).is_none()
    }
}

/// Column backed by a vector of nullable values.
///
/// Values are not checked against the column type on insertion; makers reject
/// values they cannot represent when encoding.
#[derive(Debug, Clone, PartialEq)]
pub struct PrimitiveColumn {
    name: String,
    column_type: ColumnType,
    values: Vec<Option<PrimitiveValue>>,
}

impl PrimitiveColumn {
    pub fn new(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self::with_values(name, column_type, Vec::new())
    }

    pub fn with_values(
        name: impl Into<String>,
        column_type: ColumnType,
        values: Vec<Option<PrimitiveValue>>,
    ) -> Self {
        Self {
            name: name.into(),
            column_type,
            values,
        }
    }

    /// Builds a column of the integer type matching `T`.
    pub fn from_integers<T, I>(name: impl Into<String>, values: I) -> Self
    where
        T: IntegerColumnValue,
        I: IntoIterator<Item = Option<T>>,
    {
        Self::with_values(
            name,
            T::COLUMN_TYPE,
            values
                .into_iter()
                .map(|v| v.map(IntegerColumnValue::into_value))
                .collect(),
        )
    }

    pub fn from_booleans<I>(name: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = Option<bool>>,
    {
        Self::with_values(
            name,
            ColumnType::Boolean,
            values
                .into_iter()
                .map(|v| v.map(PrimitiveValue::Boolean))
                .collect(),
        )
    }

    pub fn push(&mut self, value: Option<PrimitiveValue>) {
        self.values.push(value);
    }

    pub fn values(&self) -> &[Option<PrimitiveValue>] {
        &self.values
    }
}

impl Column for PrimitiveColumn {
    fn name(&self) -> &str {
        &self.name
    }

    fn column_type(&self) -> ColumnType {
        self.column_type
    }

    fn row_count(&self) -> usize {
        self.values.len()
    }

    fn value(&self, index: usize) -> Option<PrimitiveValue> {
        self.values.get(index).copied().flatten()
    }
}
