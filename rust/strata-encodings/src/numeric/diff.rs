use super::{
    IntegerValue, NumEncoder, NumEncodingKind, NumValues, ValueTransform, payload_too_small,
};
use crate::bits::{self, BitWidthConverter, ByteOrder};
use byteorder::{BigEndian, ByteOrder as _};
use num_traits::AsPrimitive;
use strata_common::{error::Error, verify_arg, verify_data};

/// Size of the diff payload header: converter header followed by the
/// big-endian translation minimum.
pub const DIFF_HEADER_SIZE: usize = bits::HEADER_SIZE + 8;

/// Difference encoding: every value is stored as its distance from the domain
/// minimum, packed with the minimal bit width covering `max - min`.
pub struct DiffNumEncoder<T> {
    min: i64,
    converter: BitWidthConverter,
    _p: std::marker::PhantomData<T>,
}

impl<T: IntegerValue> DiffNumEncoder<T> {
    /// Creates an encoder for the value domain `[min, max]`.
    ///
    /// Fails with an out-of-range error when `max - min` exceeds the largest
    /// positive value of `T`.
    pub fn new(min: T, max: T) -> strata_common::Result<Self> {
        Self::with_byte_order(min, max, ByteOrder::default())
    }

    pub fn with_byte_order(min: T, max: T, order: ByteOrder) -> strata_common::Result<Self> {
        verify_arg!(min, min <= max);
        let (min, max): (i64, i64) = (min.as_(), max.as_());
        let limit: i64 = T::max_value().as_();
        let diff = max as i128 - min as i128;
        if diff > limit as i128 {
            return Err(Error::out_of_range(
                "diff",
                format!("diff between {min} and {max} exceeds {limit}"),
            ));
        }
        Ok(Self {
            min,
            converter: BitWidthConverter::for_range(diff as u64, order),
            _p: std::marker::PhantomData,
        })
    }

    /// Reconstructs the encoder from the header of an encoded payload.
    pub fn open(buffer: &[u8]) -> strata_common::Result<Self> {
        let (converter, rest) = BitWidthConverter::read_header(buffer)?;
        verify_data!(rest, rest.len() >= 8);
        verify_data!(width, converter.width() as u32 <= T::BITS_COUNT);
        Ok(Self {
            min: BigEndian::read_i64(rest),
            converter,
            _p: std::marker::PhantomData,
        })
    }

    pub fn min(&self) -> T {
        T::from_i64(self.min)
    }

    pub fn bit_width(&self) -> u8 {
        self.converter.width()
    }
}

impl<T: IntegerValue> NumEncoder<T> for DiffNumEncoder<T> {
    fn kind(&self) -> NumEncodingKind {
        NumEncodingKind::Diff
    }

    fn calc_binary_size(&self, rows: usize) -> usize {
        8 + self.converter.calc_binary_size(rows)
    }

    fn encode_into(&self, values: &[T], target: &mut [u8]) -> strata_common::Result<usize> {
        let size = self.calc_binary_size(values.len());
        if target.len() < size {
            return Err(strata_common::error::ErrorKind::DestBufferTooSmall.into());
        }
        self.converter.write_header(target)?;
        BigEndian::write_i64(&mut target[bits::HEADER_SIZE..DIFF_HEADER_SIZE], self.min);

        let mut writer = self.converter.writer(&mut target[DIFF_HEADER_SIZE..size]);
        for &value in values {
            let value: i64 = value.as_();
            if value < self.min {
                return Err(Error::out_of_range(
                    "value",
                    format!("{value} is below the encoder minimum {}", self.min),
                ));
            }
            writer.put_u64(value.wrapping_sub(self.min) as u64)?;
        }
        writer.finish()?;
        Ok(size)
    }

    fn values<'a>(
        &self,
        buffer: &'a [u8],
        rows: usize,
    ) -> strata_common::Result<NumValues<'a, T>> {
        let (converter, rest) = BitWidthConverter::read_header(buffer)?;
        verify_data!(rest, rest.len() >= 8);
        let min = BigEndian::read_i64(rest);
        if converter.width() != self.converter.width() || min != self.min {
            return Err(Error::corrupt_data(
                "diff payload",
                format!(
                    "header (min {min}, width {}) does not match the encoder (min {}, width {})",
                    converter.width(),
                    self.min,
                    self.converter.width()
                ),
            ));
        }
        let packed = &rest[8..];
        if packed.len() < converter.packed_size(rows) {
            return Err(payload_too_small(rows));
        }
        Ok(NumValues::new(
            converter.reader(packed),
            ValueTransform::Offset(self.min),
        ))
    }
}
