//! Numeric encoders: value-domain transforms layered over the bit-width
//! converter.
//!
//! Encoders only deal with dense sequences: null rows have no slot in the
//! packed payload. The sparse decode paths of [`NumEncoder`] interleave the
//! dense payload with a null mask through [`crate::sparse`].

use crate::{
    bits::BitReader,
    inmemory::{Dictionary, MemoryAllocator},
    sparse::{for_each_row, merge_rows, non_null_count},
};
use strata_common::{error::Error, verify_arg};

mod diff;
mod plain;
mod value;

pub use diff::{DIFF_HEADER_SIZE, DiffNumEncoder};
pub use plain::PlainNumEncoder;
pub use value::IntegerValue;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum NumEncodingKind {
    /// Values are translated by the domain minimum and bit-packed.
    Diff = 1,
    /// Values are stored in their full width.
    Plain = 2,
}

impl TryFrom<u8> for NumEncodingKind {
    type Error = ();

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(NumEncodingKind::Diff),
            2 => Ok(NumEncodingKind::Plain),
            _ => Err(()),
        }
    }
}

pub trait NumEncoder<T: IntegerValue>: Send + Sync {
    fn kind(&self) -> NumEncodingKind;

    /// Size in bytes of the payload holding `rows` encoded values.
    fn calc_binary_size(&self, rows: usize) -> usize;

    /// Encodes all `values` into `target`, which must be at least
    /// `calc_binary_size(values.len())` bytes long. Returns the number of
    /// bytes written.
    fn encode_into(&self, values: &[T], target: &mut [u8]) -> strata_common::Result<usize>;

    /// Opens a read cursor over `rows` dense values of an encoded payload.
    fn values<'a>(&self, buffer: &'a [u8], rows: usize)
    -> strata_common::Result<NumValues<'a, T>>;

    /// Encodes the first `rows` entries of `values` into a freshly sized buffer.
    fn encode(&self, values: &[T], rows: usize) -> strata_common::Result<Vec<u8>> {
        verify_arg!(rows, rows <= values.len());
        let mut target = vec![0u8; self.calc_binary_size(rows)];
        self.encode_into(&values[..rows], &mut target)?;
        Ok(target)
    }

    /// Decodes `rows` dense values in their original order.
    fn decode(&self, buffer: &[u8], rows: usize) -> strata_common::Result<Vec<T>> {
        let mut values = self.values(buffer, rows)?;
        (0..rows).map(|_| values.next_value()).collect()
    }

    /// Decodes a dense payload holding one value per non-null entry of
    /// `is_null`, and returns one entry per row with nulls left unset.
    fn decode_sparse(
        &self,
        buffer: &[u8],
        is_null: &[bool],
    ) -> strata_common::Result<Vec<Option<T>>> {
        let mut values = self.values(buffer, non_null_count(is_null))?;
        merge_rows(is_null, || values.next_value())
    }

    /// Writes `rows` dense values into `dictionary`, keyed by their position.
    fn populate_dictionary(
        &self,
        buffer: &[u8],
        rows: usize,
        dictionary: &mut dyn Dictionary,
    ) -> strata_common::Result<()> {
        let mut values = self.values(buffer, rows)?;
        for index in 0..rows {
            values.next_value()?.store_in_dictionary(dictionary, index)?;
        }
        Ok(())
    }

    /// Merges the dense payload with `is_null` and writes every row straight
    /// into `allocator`, starting at `start_index`.
    fn load_into_memory(
        &self,
        buffer: &[u8],
        is_null: &[bool],
        allocator: &mut dyn MemoryAllocator,
        start_index: usize,
    ) -> strata_common::Result<()> {
        let mut values = self.values(buffer, non_null_count(is_null))?;
        for_each_row(
            is_null,
            || values.next_value(),
            |offset, value| match value {
                Some(value) => value.store(allocator, start_index + offset),
                None => allocator.set_null(start_index + offset),
            },
        )
    }
}

/// Reconstructs an encoder from the header of a payload written by an encoder
/// of the given kind.
pub fn open_encoder<T: IntegerValue>(
    kind: NumEncodingKind,
    buffer: &[u8],
) -> strata_common::Result<Box<dyn NumEncoder<T>>> {
    Ok(match kind {
        NumEncodingKind::Diff => Box::new(DiffNumEncoder::<T>::open(buffer)?),
        NumEncodingKind::Plain => Box::new(PlainNumEncoder::<T>::open(buffer)?),
    })
}

#[derive(Debug, Clone, Copy)]
enum ValueTransform {
    Offset(i64),
    TwosComplement,
}

/// Read cursor over a dense sequence of encoded values.
pub struct NumValues<'a, T> {
    reader: BitReader<'a>,
    transform: ValueTransform,
    _p: std::marker::PhantomData<T>,
}

impl<'a, T: IntegerValue> NumValues<'a, T> {
    fn new(reader: BitReader<'a>, transform: ValueTransform) -> Self {
        Self {
            reader,
            transform,
            _p: std::marker::PhantomData,
        }
    }

    pub fn next_value(&mut self) -> strata_common::Result<T> {
        let raw = self.reader.get_u64()?;
        Ok(match self.transform {
            ValueTransform::Offset(min) => T::from_i64(min.wrapping_add(raw as i64)),
            ValueTransform::TwosComplement => T::from_bits(raw),
        })
    }
}

#[cold]
fn payload_too_small(rows: usize) -> Error {
    Error::corrupt_data(
        "numeric payload",
        format!("buffer is too small to hold {rows} values"),
    )
}

#[cfg(test)]
mod tests {
    use super::{DiffNumEncoder, NumEncoder, NumEncodingKind, PlainNumEncoder, open_encoder};
    use crate::inmemory::{Dictionary, MemoryAllocator};

    #[derive(Debug, PartialEq)]
    enum Call {
        Null(usize),
        Long(usize, i64),
        Int(usize, i32),
    }

    #[derive(Default)]
    struct RecordingAllocator {
        calls: Vec<Call>,
    }

    impl MemoryAllocator for RecordingAllocator {
        fn set_null(&mut self, index: usize) -> strata_common::Result<()> {
            self.calls.push(Call::Null(index));
            Ok(())
        }

        fn set_long(&mut self, index: usize, value: i64) -> strata_common::Result<()> {
            self.calls.push(Call::Long(index, value));
            Ok(())
        }
    }

    #[derive(Default)]
    struct RecordingDictionary {
        calls: Vec<Call>,
    }

    impl Dictionary for RecordingDictionary {
        fn set_int(&mut self, index: usize, value: i32) -> strata_common::Result<()> {
            self.calls.push(Call::Int(index, value));
            Ok(())
        }
    }

    fn sparse_fixture() -> (Vec<bool>, Vec<i64>) {
        let is_null: Vec<bool> = (0..100).map(|i| i % 3 == 0 || i % 7 == 0).collect();
        let values: Vec<i64> = is_null
            .iter()
            .enumerate()
            .filter(|(_, null)| !**null)
            .map(|(i, _)| i as i64 * 13 - 500)
            .collect();
        (is_null, values)
    }

    #[test]
    fn test_decode_sparse() {
        let (is_null, values) = sparse_fixture();
        let encoder = DiffNumEncoder::new(-500i64, 800).unwrap();
        let encoded = encoder.encode(&values, values.len()).unwrap();

        let decoded = encoder.decode_sparse(&encoded, &is_null).unwrap();
        assert_eq!(decoded.len(), is_null.len());
        let mut dense = values.iter();
        for (row, value) in decoded.iter().enumerate() {
            if is_null[row] {
                assert_eq!(*value, None);
            } else {
                assert_eq!(value.as_ref(), dense.next());
            }
        }
        assert!(dense.next().is_none());
    }

    #[test]
    fn test_load_into_memory() {
        let (is_null, values) = sparse_fixture();
        let encoder = DiffNumEncoder::new(-500i64, 800).unwrap();
        let encoded = encoder.encode(&values, values.len()).unwrap();

        let mut allocator = RecordingAllocator::default();
        encoder
            .load_into_memory(&encoded, &is_null, &mut allocator, 1000)
            .unwrap();

        // One call per row, in index order.
        assert_eq!(allocator.calls.len(), is_null.len());
        let mut dense = values.iter();
        for (row, call) in allocator.calls.iter().enumerate() {
            if is_null[row] {
                assert_eq!(*call, Call::Null(1000 + row));
            } else {
                assert_eq!(*call, Call::Long(1000 + row, *dense.next().unwrap()));
            }
        }
    }

    #[test]
    fn test_load_into_memory_rejects_unsupported_kind() {
        let encoder = DiffNumEncoder::new(0i32, 10).unwrap();
        let encoded = encoder.encode(&[1, 2, 3], 3).unwrap();
        let mut allocator = RecordingAllocator::default();
        let err = encoder
            .load_into_memory(&encoded, &[false, false, false], &mut allocator, 0)
            .unwrap_err();
        assert!(err.is_encoding_unsupported());
    }

    #[test]
    fn test_populate_dictionary() {
        let values = [7i32, -3, 7, 100_000];
        let encoder = DiffNumEncoder::new(-3i32, 100_000).unwrap();
        let encoded = encoder.encode(&values, values.len()).unwrap();

        let mut dictionary = RecordingDictionary::default();
        encoder
            .populate_dictionary(&encoded, values.len(), &mut dictionary)
            .unwrap();
        assert_eq!(
            dictionary.calls,
            vec![
                Call::Int(0, 7),
                Call::Int(1, -3),
                Call::Int(2, 7),
                Call::Int(3, 100_000)
            ]
        );
    }

    #[test]
    fn test_encode_prefix_rows() {
        let encoder = DiffNumEncoder::new(0i64, 100).unwrap();
        let encoded = encoder.encode(&[1, 2, 3, 4, 5], 2).unwrap();
        assert_eq!(encoded.len(), encoder.calc_binary_size(2));
        assert_eq!(encoder.decode(&encoded, 2).unwrap(), vec![1, 2]);
        assert!(encoder.encode(&[1, 2], 3).is_err());
    }

    #[test]
    fn test_open_encoder() {
        let values: Vec<i16> = (0..500).map(|_| fastrand::i16(-1000..1000)).collect();
        let diff = DiffNumEncoder::new(-1000i16, 999)
            .unwrap()
            .encode(&values, values.len())
            .unwrap();
        let plain = PlainNumEncoder::<i16>::new(Default::default())
            .encode(&values, values.len())
            .unwrap();
        for (kind, encoded) in [(NumEncodingKind::Diff, diff), (NumEncodingKind::Plain, plain)] {
            let encoder = open_encoder::<i16>(kind, &encoded).unwrap();
            assert_eq!(encoder.kind(), kind);
            assert_eq!(encoder.decode(&encoded, values.len()).unwrap(), values);
        }
    }
}
