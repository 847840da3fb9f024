//! Sinks that decoders write into directly, bypassing intermediate value arrays.

use strata_common::error::Error;

#[cold]
fn unsupported(sink: &str, kind: &str) -> strata_common::Result<()> {
    Err(Error::encoding_unsupported(format!(
        "{sink} does not accept {kind} values"
    )))
}

/// Typed in-memory storage that is materialized by row index.
///
/// Implementations override the setters for the value kinds they hold; the
/// remaining setters reject the value.
pub trait MemoryAllocator {
    fn set_null(&mut self, index: usize) -> strata_common::Result<()>;

    fn set_bool(&mut self, _index: usize, _value: bool) -> strata_common::Result<()> {
        unsupported("memory allocator", "boolean")
    }

    fn set_byte(&mut self, _index: usize, _value: i8) -> strata_common::Result<()> {
        unsupported("memory allocator", "byte")
    }

    fn set_short(&mut self, _index: usize, _value: i16) -> strata_common::Result<()> {
        unsupported("memory allocator", "short")
    }

    fn set_int(&mut self, _index: usize, _value: i32) -> strata_common::Result<()> {
        unsupported("memory allocator", "int")
    }

    fn set_long(&mut self, _index: usize, _value: i64) -> strata_common::Result<()> {
        unsupported("memory allocator", "long")
    }
}

/// Dictionary of column values populated by dictionary index.
pub trait Dictionary {
    fn set_bool(&mut self, _index: usize, _value: bool) -> strata_common::Result<()> {
        unsupported("dictionary", "boolean")
    }

    fn set_byte(&mut self, _index: usize, _value: i8) -> strata_common::Result<()> {
        unsupported("dictionary", "byte")
    }

    fn set_short(&mut self, _index: usize, _value: i16) -> strata_common::Result<()> {
        unsupported("dictionary", "short")
    }

    fn set_int(&mut self, _index: usize, _value: i32) -> strata_common::Result<()> {
        unsupported("dictionary", "int")
    }

    fn set_long(&mut self, _index: usize, _value: i64) -> strata_common::Result<()> {
        unsupported("dictionary", "long")
    }
}
