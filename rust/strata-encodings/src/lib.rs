//! Numeric encodings of the strata columnar format: minimal bit-width packing
//! and the value-domain transforms layered on top of it.

pub mod bits;
pub mod inmemory;
pub mod numeric;
pub mod sparse;

pub use bits::{BitReader, BitWidthConverter, BitWriter, ByteOrder};
