use crate::inmemory::{Dictionary, MemoryAllocator};
use num_traits::{AsPrimitive, PrimInt};

/// Signed integer type that can be stored by the numeric encoders.
///
/// All translation arithmetic is carried out in `i64`; the width specific part
/// is the two's complement bit pattern and the sink setter to use.
pub trait IntegerValue:
    PrimInt + AsPrimitive<i64> + std::fmt::Debug + std::fmt::Display + Send + Sync + 'static
{
    const BITS_COUNT: u32;

    fn from_i64(value: i64) -> Self;

    /// Two's complement representation, zero-extended to 64 bits.
    fn to_bits(self) -> u64;

    fn from_bits(bits: u64) -> Self;

    fn store(
        self,
        allocator: &mut dyn MemoryAllocator,
        index: usize,
    ) -> strata_common::Result<()>;

    fn store_in_dictionary(
        self,
        dictionary: &mut dyn Dictionary,
        index: usize,
    ) -> strata_common::Result<()>;
}

macro_rules! impl_integer_value {
    ($T:ty, $U:ty, $setter:ident) => {
        impl IntegerValue for $T {
            const BITS_COUNT: u32 = <$T>::BITS;

            #[inline]
            fn from_i64(value: i64) -> Self {
                value as $T
            }

            #[inline]
            fn to_bits(self) -> u64 {
                self as $U as u64
            }

            #[inline]
            fn from_bits(bits: u64) -> Self {
                bits as $U as $T
            }

            #[inline]
            fn store(
                self,
                allocator: &mut dyn MemoryAllocator,
                index: usize,
            ) -> strata_common::Result<()> {
                allocator.$setter(index, self)
            }

            #[inline]
            fn store_in_dictionary(
                self,
                dictionary: &mut dyn Dictionary,
                index: usize,
            ) -> strata_common::Result<()> {
                dictionary.$setter(index, self)
            }
        }
    };
}

impl_integer_value!(i8, u8, set_byte);
impl_integer_value!(i16, u16, set_short);
impl_integer_value!(i32, u32, set_int);
impl_integer_value!(i64, u64, set_long);

#[cfg(test)]
mod tests {
    use super::IntegerValue;

    #[test]
    fn test_bits_round_trip() {
        assert_eq!((-1i8).to_bits(), 0xff);
        assert_eq!(i8::from_bits(0xff), -1);
        assert_eq!(i16::from_bits((-300i16).to_bits()), -300);
        assert_eq!(i32::from_bits(i32::MIN.to_bits()), i32::MIN);
        assert_eq!(i64::from_bits(i64::MIN.to_bits()), i64::MIN);
    }
}
