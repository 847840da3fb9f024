//! Minimal bit-width packing of unsigned integers.
//!
//! A [`BitWidthConverter`] is built for a translated value domain `[0, max]` and
//! determines the fixed number of bits every value of that domain requires.
//! Packed payloads start with a two byte header (byte order marker, bit width)
//! followed by `ceil(rows * width / 8)` bytes of packed values.

use serde::{Deserialize, Serialize};
use strata_common::{error::Error, verify_arg, verify_data};

/// Size of the converter header: byte order marker and bit width.
pub const HEADER_SIZE: usize = 2;

/// Maximum supported bit width.
pub const MAX_BIT_WIDTH: u8 = 64;

/// Order in which packed bits are laid out in the byte stream.
///
/// `BigEndian` fills every byte starting from its most significant bit, so that
/// byte-aligned widths produce big-endian values. `LittleEndian` fills bytes
/// starting from the least significant bit.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum ByteOrder {
    BigEndian = 1,
    #[default]
    LittleEndian = 2,
}

impl TryFrom<u8> for ByteOrder {
    type Error = ();

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(ByteOrder::BigEndian),
            2 => Ok(ByteOrder::LittleEndian),
            _ => Err(()),
        }
    }
}

#[inline]
fn value_mask(width: u32) -> u64 {
    if width >= 64 {
        u64::MAX
    } else {
        (1u64 << width) - 1
    }
}

/// Converts between unsigned values of a known range and their bit-packed
/// representation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BitWidthConverter {
    width: u8,
    order: ByteOrder,
}

impl BitWidthConverter {
    /// Creates a converter able to hold any value in `[0, max]`.
    ///
    /// `max == 0` yields a zero-width converter: nothing is stored, and every
    /// read returns zero.
    pub fn for_range(max: u64, order: ByteOrder) -> Self {
        Self {
            width: (u64::BITS - max.leading_zeros()) as u8,
            order,
        }
    }

    /// Creates a converter with an explicit bit width.
    pub fn with_width(width: u8, order: ByteOrder) -> strata_common::Result<Self> {
        verify_arg!(width, width <= MAX_BIT_WIDTH);
        Ok(Self { width, order })
    }

    pub fn width(&self) -> u8 {
        self.width
    }

    pub fn order(&self) -> ByteOrder {
        self.order
    }

    /// Largest value that fits into the converter's width.
    pub fn max_value(&self) -> u64 {
        value_mask(self.width as u32)
    }

    /// Number of bytes occupied by `rows` packed values, excluding the header.
    pub fn packed_size(&self, rows: usize) -> usize {
        (rows * self.width as usize).div_ceil(8)
    }

    /// Number of bytes occupied by the header and `rows` packed values.
    pub fn calc_binary_size(&self, rows: usize) -> usize {
        HEADER_SIZE + self.packed_size(rows)
    }

    /// Writes the header (byte order marker and bit width) at the start of `target`.
    pub fn write_header(&self, target: &mut [u8]) -> strata_common::Result<()> {
        if target.len() < HEADER_SIZE {
            return Err(strata_common::error::ErrorKind::DestBufferTooSmall.into());
        }
        target[0] = self.order as u8;
        target[1] = self.width;
        Ok(())
    }

    /// Reads a converter header from `buffer`, returning the converter and the
    /// remaining bytes.
    pub fn read_header(buffer: &[u8]) -> strata_common::Result<(Self, &[u8])> {
        verify_data!(buffer, buffer.len() >= HEADER_SIZE);
        let order = ByteOrder::try_from(buffer[0])
            .map_err(|_| Error::corrupt_data("bit-packed header", "unknown byte order marker"))?;
        let width = buffer[1];
        verify_data!(width, width <= MAX_BIT_WIDTH);
        Ok((Self { width, order }, &buffer[HEADER_SIZE..]))
    }

    /// Returns a write cursor that packs values into `target`.
    pub fn writer<'a>(&self, target: &'a mut [u8]) -> BitWriter<'a> {
        BitWriter {
            target,
            pos: 0,
            acc: 0,
            pending: 0,
            width: self.width as u32,
            order: self.order,
        }
    }

    /// Returns a read cursor that unpacks values from `source`.
    pub fn reader<'a>(&self, source: &'a [u8]) -> BitReader<'a> {
        BitReader {
            source,
            pos: 0,
            acc: 0,
            available: 0,
            width: self.width as u32,
            order: self.order,
        }
    }
}

/// Sequential write cursor packing every value into the next `width`-bit slot.
pub struct BitWriter<'a> {
    target: &'a mut [u8],
    pos: usize,
    acc: u128,
    pending: u32,
    width: u32,
    order: ByteOrder,
}

impl BitWriter<'_> {
    pub fn put_u64(&mut self, value: u64) -> strata_common::Result<()> {
        if value & !value_mask(self.width) != 0 {
            return Err(Error::out_of_range(
                "value",
                format!("{value} does not fit into {} bits", self.width),
            ));
        }
        if self.width == 0 {
            return Ok(());
        }

        if self.width % 8 == 0 {
            let len = (self.width / 8) as usize;
            if self.pos + len > self.target.len() {
                return Err(strata_common::error::ErrorKind::DestBufferTooSmall.into());
            }
            let dest = &mut self.target[self.pos..self.pos + len];
            match self.order {
                ByteOrder::BigEndian => dest.copy_from_slice(&value.to_be_bytes()[8 - len..]),
                ByteOrder::LittleEndian => dest.copy_from_slice(&value.to_le_bytes()[..len]),
            }
            self.pos += len;
            return Ok(());
        }

        match self.order {
            ByteOrder::LittleEndian => {
                self.acc |= (value as u128) << self.pending;
                self.pending += self.width;
                while self.pending >= 8 {
                    self.push_byte(self.acc as u8)?;
                    self.acc >>= 8;
                    self.pending -= 8;
                }
            }
            ByteOrder::BigEndian => {
                self.acc = (self.acc << self.width) | value as u128;
                self.pending += self.width;
                while self.pending >= 8 {
                    self.pending -= 8;
                    self.push_byte((self.acc >> self.pending) as u8)?;
                    self.acc &= (1u128 << self.pending) - 1;
                }
            }
        }
        Ok(())
    }

    pub fn put_u32(&mut self, value: u32) -> strata_common::Result<()> {
        self.put_u64(value as u64)
    }

    /// Flushes the last partially filled byte and returns the number of bytes written.
    pub fn finish(mut self) -> strata_common::Result<usize> {
        if self.pending > 0 {
            let byte = match self.order {
                ByteOrder::LittleEndian => self.acc as u8,
                ByteOrder::BigEndian => (self.acc << (8 - self.pending)) as u8,
            };
            self.push_byte(byte)?;
            self.acc = 0;
            self.pending = 0;
        }
        Ok(self.pos)
    }

    #[inline]
    fn push_byte(&mut self, byte: u8) -> strata_common::Result<()> {
        let Some(dest) = self.target.get_mut(self.pos) else {
            return Err(strata_common::error::ErrorKind::DestBufferTooSmall.into());
        };
        *dest = byte;
        self.pos += 1;
        Ok(())
    }
}

/// Sequential read cursor yielding successive unpacked values.
pub struct BitReader<'a> {
    source: &'a [u8],
    pos: usize,
    acc: u128,
    available: u32,
    width: u32,
    order: ByteOrder,
}

impl BitReader<'_> {
    pub fn get_u64(&mut self) -> strata_common::Result<u64> {
        if self.width == 0 {
            return Ok(0);
        }

        if self.width % 8 == 0 {
            let len = (self.width / 8) as usize;
            let Some(src) = self.source.get(self.pos..self.pos + len) else {
                return Err(Self::exhausted());
            };
            let mut bytes = [0u8; 8];
            self.pos += len;
            return Ok(match self.order {
                ByteOrder::BigEndian => {
                    bytes[8 - len..].copy_from_slice(src);
                    u64::from_be_bytes(bytes)
                }
                ByteOrder::LittleEndian => {
                    bytes[..len].copy_from_slice(src);
                    u64::from_le_bytes(bytes)
                }
            });
        }

        let mask = value_mask(self.width) as u128;
        match self.order {
            ByteOrder::LittleEndian => {
                while self.available < self.width {
                    let byte = self.next_byte()?;
                    self.acc |= (byte as u128) << self.available;
                    self.available += 8;
                }
                let value = (self.acc & mask) as u64;
                self.acc >>= self.width;
                self.available -= self.width;
                Ok(value)
            }
            ByteOrder::BigEndian => {
                while self.available < self.width {
                    let byte = self.next_byte()?;
                    self.acc = (self.acc << 8) | byte as u128;
                    self.available += 8;
                }
                self.available -= self.width;
                let value = ((self.acc >> self.available) & mask) as u64;
                self.acc &= (1u128 << self.available) - 1;
                Ok(value)
            }
        }
    }

    pub fn get_u32(&mut self) -> strata_common::Result<u32> {
        let value = self.get_u64()?;
        u32::try_from(value).map_err(|_| {
            Error::out_of_range("value", format!("{value} does not fit into 32 bits"))
        })
    }

    #[inline]
    fn next_byte(&mut self) -> strata_common::Result<u8> {
        let byte = *self.source.get(self.pos).ok_or_else(Self::exhausted)?;
        self.pos += 1;
        Ok(byte)
    }

    #[cold]
    fn exhausted() -> Error {
        Error::corrupt_data("bit-packed values", "unexpected end of buffer")
    }
}

#[cfg(test)]
mod tests {
    use super::{BitWidthConverter, ByteOrder, HEADER_SIZE};

    fn round_trip(values: &[u64], max: u64, order: ByteOrder) {
        let converter = BitWidthConverter::for_range(max, order);
        let mut buffer = vec![0u8; converter.calc_binary_size(values.len())];
        converter.write_header(&mut buffer).unwrap();
        let mut writer = converter.writer(&mut buffer[HEADER_SIZE..]);
        for &value in values {
            writer.put_u64(value).unwrap();
        }
        let written = writer.finish().unwrap();
        assert_eq!(written, converter.packed_size(values.len()));

        let (decoded_converter, packed) = BitWidthConverter::read_header(&buffer).unwrap();
        assert_eq!(decoded_converter, converter);
        let mut reader = decoded_converter.reader(packed);
        for &value in values {
            assert_eq!(reader.get_u64().unwrap(), value);
        }
    }

    #[test]
    fn test_width_calculation() {
        assert_eq!(BitWidthConverter::for_range(0, ByteOrder::default()).width(), 0);
        assert_eq!(BitWidthConverter::for_range(1, ByteOrder::default()).width(), 1);
        assert_eq!(BitWidthConverter::for_range(255, ByteOrder::default()).width(), 8);
        assert_eq!(BitWidthConverter::for_range(256, ByteOrder::default()).width(), 9);
        assert_eq!(BitWidthConverter::for_range(1000, ByteOrder::default()).width(), 10);
        assert_eq!(
            BitWidthConverter::for_range(u64::MAX, ByteOrder::default()).width(),
            64
        );
    }

    #[test]
    fn test_round_trip() {
        for order in [ByteOrder::BigEndian, ByteOrder::LittleEndian] {
            for width in [1u32, 3, 7, 8, 10, 13, 16, 31, 32, 33, 48, 63, 64] {
                let max = if width == 64 {
                    u64::MAX
                } else {
                    (1u64 << width) - 1
                };
                let values: Vec<u64> = (0..257)
                    .map(|i| match i % 5 {
                        0 => 0,
                        1 => max,
                        _ => fastrand::u64(0..=max),
                    })
                    .collect();
                round_trip(&values, max, order);
            }
        }
    }

    #[test]
    fn test_zero_width() {
        let converter = BitWidthConverter::for_range(0, ByteOrder::BigEndian);
        assert_eq!(converter.calc_binary_size(1000), HEADER_SIZE);

        let mut buffer = vec![0u8; converter.packed_size(10)];
        let mut writer = converter.writer(&mut buffer);
        for _ in 0..10 {
            writer.put_u64(0).unwrap();
        }
        assert_eq!(writer.finish().unwrap(), 0);

        let mut reader = converter.reader(&[]);
        for _ in 0..10 {
            assert_eq!(reader.get_u64().unwrap(), 0);
        }
    }

    #[test]
    fn test_bit_layout() {
        let values = [1u64, 2, 3, 4];
        for order in [ByteOrder::BigEndian, ByteOrder::LittleEndian] {
            let converter = BitWidthConverter::for_range(7, order);
            let mut buffer = vec![0u8; converter.packed_size(values.len())];
            let mut writer = converter.writer(&mut buffer);
            for &v in &values {
                writer.put_u64(v).unwrap();
            }
            writer.finish().unwrap();
            match order {
                // 001 010 011 100
                ByteOrder::BigEndian => assert_eq!(buffer, [0b0010_1001, 0b1100_0000]),
                ByteOrder::LittleEndian => assert_eq!(buffer, [0b1101_0001, 0b0000_1000]),
            }
        }
    }

    #[test]
    fn test_aligned_widths_use_byte_order() {
        let converter = BitWidthConverter::for_range(u16::MAX as u64, ByteOrder::BigEndian);
        let mut buffer = vec![0u8; 2];
        let mut writer = converter.writer(&mut buffer);
        writer.put_u32(0x1234).unwrap();
        writer.finish().unwrap();
        assert_eq!(buffer, [0x12, 0x34]);

        let converter = BitWidthConverter::for_range(u16::MAX as u64, ByteOrder::LittleEndian);
        let mut writer = converter.writer(&mut buffer);
        writer.put_u32(0x1234).unwrap();
        writer.finish().unwrap();
        assert_eq!(buffer, [0x34, 0x12]);
    }

    #[test]
    fn test_value_wider_than_range() {
        let converter = BitWidthConverter::for_range(15, ByteOrder::default());
        let mut buffer = vec![0u8; 8];
        let mut writer = converter.writer(&mut buffer);
        assert!(writer.put_u64(16).unwrap_err().is_out_of_range());
    }

    #[test]
    fn test_truncated_buffer() {
        let converter = BitWidthConverter::for_range(1000, ByteOrder::default());
        let mut buffer = vec![0u8; converter.packed_size(3)];
        let mut writer = converter.writer(&mut buffer);
        for v in [1, 2, 3] {
            writer.put_u64(v).unwrap();
        }
        assert!(writer.put_u64(4).is_err());

        let mut reader = converter.reader(&buffer[..2]);
        assert_eq!(reader.get_u64().unwrap(), 1);
        assert!(reader.get_u64().unwrap_err().is_corrupt_data());
    }

    #[test]
    fn test_size_is_monotonic() {
        let mut previous = 0;
        for rows in 0..200 {
            let size =
                BitWidthConverter::for_range(1000, ByteOrder::default()).calc_binary_size(rows);
            assert!(size >= previous);
            previous = size;
        }
        let mut previous = 0;
        for max in (0..100_000u64).step_by(97) {
            let size =
                BitWidthConverter::for_range(max, ByteOrder::default()).calc_binary_size(33);
            assert!(size >= previous);
            previous = size;
        }
    }

    #[test]
    fn test_bad_header() {
        assert!(BitWidthConverter::read_header(&[1]).unwrap_err().is_corrupt_data());
        assert!(BitWidthConverter::read_header(&[9, 3]).unwrap_err().is_corrupt_data());
        assert!(BitWidthConverter::read_header(&[1, 65]).unwrap_err().is_corrupt_data());
    }
}
