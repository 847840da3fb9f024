//! Vector-backed implementations of the in-memory sinks.

use crate::column::{ColumnType, PrimitiveColumn, PrimitiveValue};
use strata_encodings::inmemory::{Dictionary, MemoryAllocator};

/// Materializes rows into a vector of nullable values, growing it as needed.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ColumnValuesAllocator {
    values: Vec<Option<PrimitiveValue>>,
}

impl ColumnValuesAllocator {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            values: Vec::with_capacity(capacity),
        }
    }

    pub fn values(&self) -> &[Option<PrimitiveValue>] {
        &self.values
    }

    pub fn into_column(self, name: impl Into<String>, column_type: ColumnType) -> PrimitiveColumn {
        PrimitiveColumn::with_values(name, column_type, self.values)
    }

    fn set(&mut self, index: usize, value: Option<PrimitiveValue>) -> strata_common::Result<()> {
        if index >= self.values.len() {
            self.values.resize(index + 1, None);
        }
        self.values[index] = value;
        Ok(())
    }
}

impl MemoryAllocator for ColumnValuesAllocator {
    fn set_null(&mut self, index: usize) -> strata_common::Result<()> {
        self.set(index, None)
    }

    fn set_bool(&mut self, index: usize, value: bool) -> strata_common::Result<()> {
        self.set(index, Some(PrimitiveValue::Boolean(value)))
    }

    fn set_byte(&mut self, index: usize, value: i8) -> strata_common::Result<()> {
        self.set(index, Some(PrimitiveValue::Byte(value)))
    }

    fn set_short(&mut self, index: usize, value: i16) -> strata_common::Result<()> {
        self.set(index, Some(PrimitiveValue::Short(value)))
    }

    fn set_int(&mut self, index: usize, value: i32) -> strata_common::Result<()> {
        self.set(index, Some(PrimitiveValue::Integer(value)))
    }

    fn set_long(&mut self, index: usize, value: i64) -> strata_common::Result<()> {
        self.set(index, Some(PrimitiveValue::Long(value)))
    }
}

/// Dictionary storing entries by index.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ValueDictionary {
    entries: Vec<Option<PrimitiveValue>>,
}

impl ValueDictionary {
    pub fn entries(&self) -> &[Option<PrimitiveValue>] {
        &self.entries
    }

    pub fn get(&self, index: usize) -> Option<PrimitiveValue> {
        self.entries.get(index).copied().flatten()
    }

    fn set(&mut self, index: usize, value: PrimitiveValue) -> strata_common::Result<()> {
        if index >= self.entries.len() {
            self.entries.resize(index + 1, None);
        }
        self.entries[index] = Some(value);
        Ok(())
    }
}

impl Dictionary for ValueDictionary {
    fn set_bool(&mut self, index: usize, value: bool) -> strata_common::Result<()> {
        self.set(index, PrimitiveValue::Boolean(value))
    }

    fn set_byte(&mut self, index: usize, value: i8) -> strata_common::Result<()> {
        self.set(index, PrimitiveValue::Byte(value))
    }

    fn set_short(&mut self, index: usize, value: i16) -> strata_common::Result<()> {
        self.set(index, PrimitiveValue::Short(value))
    }

    fn set_int(&mut self, index: usize, value: i32) -> strata_common::Result<()> {
        self.set(index, PrimitiveValue::Integer(value))
    }

    fn set_long(&mut self, index: usize, value: i64) -> strata_common::Result<()> {
        self.set(index, PrimitiveValue::Long(value))
    }
}
