use super::{
    IntegerValue, NumEncoder, NumEncodingKind, NumValues, ValueTransform, payload_too_small,
};
use crate::bits::{BitWidthConverter, ByteOrder};
use strata_common::error::Error;

/// Full-width encoding of signed integers, used when the value domain is too
/// wide for difference encoding.
pub struct PlainNumEncoder<T> {
    converter: BitWidthConverter,
    _p: std::marker::PhantomData<T>,
}

impl<T: IntegerValue> PlainNumEncoder<T> {
    pub fn new(order: ByteOrder) -> Self {
        Self {
            converter: BitWidthConverter::for_range(u64::MAX >> (64 - T::BITS_COUNT), order),
            _p: std::marker::PhantomData,
        }
    }

    pub fn open(buffer: &[u8]) -> strata_common::Result<Self> {
        let (converter, _) = BitWidthConverter::read_header(buffer)?;
        Self::check_width(&converter)?;
        Ok(Self {
            converter,
            _p: std::marker::PhantomData,
        })
    }

    fn check_width(converter: &BitWidthConverter) -> strata_common::Result<()> {
        if converter.width() as u32 != T::BITS_COUNT {
            return Err(Error::corrupt_data(
                "plain payload",
                format!(
                    "bit width {} does not match the value width {}",
                    converter.width(),
                    T::BITS_COUNT
                ),
            ));
        }
        Ok(())
    }
}

impl<T: IntegerValue> NumEncoder<T> for PlainNumEncoder<T> {
    fn kind(&self) -> NumEncodingKind {
        NumEncodingKind::Plain
    }

    fn calc_binary_size(&self, rows: usize) -> usize {
        self.converter.calc_binary_size(rows)
    }

    fn encode_into(&self, values: &[T], target: &mut [u8]) -> strata_common::Result<usize> {
        let size = self.calc_binary_size(values.len());
        if target.len() < size {
            return Err(strata_common::error::ErrorKind::DestBufferTooSmall.into());
        }
        self.converter.write_header(target)?;
        let mut writer = self
            .converter
            .writer(&mut target[crate::bits::HEADER_SIZE..size]);
        for &value in values {
            writer.put_u64(value.to_bits())?;
        }
        writer.finish()?;
        Ok(size)
    }

    fn values<'a>(
        &self,
        buffer: &'a [u8],
        rows: usize,
    ) -> strata_common::Result<NumValues<'a, T>> {
        let (converter, packed) = BitWidthConverter::read_header(buffer)?;
        Self::check_width(&converter)?;
        if packed.len() < converter.packed_size(rows) {
            return Err(payload_too_small(rows));
        }
        Ok(NumValues::new(
            converter.reader(packed),
            ValueTransform::TwosComplement,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::PlainNumEncoder;
    use crate::{bits::ByteOrder, numeric::NumEncoder};

    #[test]
    fn test_round_trip() {
        for order in [ByteOrder::BigEndian, ByteOrder::LittleEndian] {
            let encoder = PlainNumEncoder::<i64>::new(order);
            let values = vec![i64::MIN, -1, 0, 1, i64::MAX];
            let encoded = encoder.encode(&values, values.len()).unwrap();
            assert_eq!(encoded.len(), 2 + 8 * values.len());
            assert_eq!(encoder.decode(&encoded, values.len()).unwrap(), values);

            let encoder = PlainNumEncoder::<i8>::new(order);
            let values: Vec<i8> = (i8::MIN..=i8::MAX).collect();
            let encoded = encoder.encode(&values, values.len()).unwrap();
            assert_eq!(encoded.len(), 2 + values.len());
            assert_eq!(encoder.decode(&encoded, values.len()).unwrap(), values);
        }
    }

    #[test]
    fn test_width_mismatch() {
        let encoded = PlainNumEncoder::<i32>::new(ByteOrder::default())
            .encode(&[1, 2], 2)
            .unwrap();
        let err = PlainNumEncoder::<i64>::open(&encoded).err().unwrap();
        assert!(err.is_corrupt_data());
        assert!(PlainNumEncoder::<i32>::open(&encoded).is_ok());
    }
}
