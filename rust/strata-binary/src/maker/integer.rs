use super::{
    ColumnBinaryMaker, ColumnBinaryMakerKind, PAYLOAD_HEADER_SIZE, PayloadHeader, check_maker,
    null_section_size, read_null_mask, seal_block, stored_size_estimate, write_bit_section,
};
use crate::{
    analysis::ColumnAnalysisResult,
    block_index::BlockIndexNode,
    column::{Column, ColumnType, IntegerColumnValue, PrimitiveColumn, PrimitiveValue},
    column_binary::ColumnBinary,
    config::{ColumnBinaryMakerConfig, ColumnBinaryMakerCustomConfigNode},
};
use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use num_traits::AsPrimitive;
use strata_common::{error::Error, verify_data};
use strata_compression::CompressResultNode;
use strata_encodings::{
    ByteOrder,
    inmemory::{Dictionary, MemoryAllocator},
    numeric::{DiffNumEncoder, NumEncoder, NumEncodingKind, PlainNumEncoder, open_encoder},
};

/// Encoding kind followed by the `i64` min and max of the non-null values.
const RANGE_SECTION_SIZE: usize = 17;

/// Calls `$f::<T>($args)` with the integer type stored in columns of
/// `$column_type`.
macro_rules! with_integer_type {
    ($column_type:expr, $f:ident ( $($arg:expr),* $(,)? )) => {
        match $column_type {
            ColumnType::Byte => $f::<i8>($($arg),*),
            ColumnType::Short => $f::<i16>($($arg),*),
            ColumnType::Integer => $f::<i32>($($arg),*),
            ColumnType::Long => $f::<i64>($($arg),*),
            column_type @ ColumnType::Boolean => Err(unsupported_column_type(column_type)),
        }
    };
}

/// Maker for integer columns of any width.
///
/// Non-null values are stored through the diff encoder translated by their
/// minimum. Columns whose range does not fit the signed span of their type
/// fall back to the full-width plain encoding.
#[derive(Debug, Clone, Copy, Default)]
pub struct DiffIntegerColumnBinaryMaker;

impl DiffIntegerColumnBinaryMaker {
    /// Writes the non-null values of `binary` into `dictionary`, keyed by their
    /// dense position.
    pub fn load_dictionary(
        &self,
        binary: &ColumnBinary,
        dictionary: &mut dyn Dictionary,
    ) -> strata_common::Result<()> {
        check_maker(binary, ColumnBinaryMakerKind::DiffInteger)?;
        with_integer_type!(binary.column_type(), load_dictionary(binary, dictionary))
    }
}

impl ColumnBinaryMaker for DiffIntegerColumnBinaryMaker {
    fn kind(&self) -> ColumnBinaryMakerKind {
        ColumnBinaryMakerKind::DiffInteger
    }

    fn to_binary(
        &self,
        common_config: &ColumnBinaryMakerConfig,
        custom_config: Option<&ColumnBinaryMakerCustomConfigNode>,
        compress_result: &CompressResultNode,
        column: &dyn Column,
    ) -> strata_common::Result<ColumnBinary> {
        let config = ColumnBinaryMakerCustomConfigNode::resolve(custom_config, common_config);
        let (header, raw) =
            with_integer_type!(column.column_type(), encode_payload(column, config.byte_order))?;
        seal_block(self.kind(), config, compress_result, column, &header, &raw)
    }

    fn to_column(&self, binary: &ColumnBinary) -> strata_common::Result<PrimitiveColumn> {
        check_maker(binary, self.kind())?;
        with_integer_type!(binary.column_type(), decode_column(binary))
    }

    fn calc_binary_size(&self, analysis: &ColumnAnalysisResult) -> usize {
        let mut size = PAYLOAD_HEADER_SIZE;
        if let Some((min, max)) = analysis.integer_range() {
            let non_null = analysis.non_null_count();
            size += RANGE_SECTION_SIZE;
            if analysis.null_count > 0 {
                size += null_section_size(analysis.row_count);
            }
            size += match analysis.column_type {
                ColumnType::Byte => values_size::<i8>(min, max, non_null),
                ColumnType::Short => values_size::<i16>(min, max, non_null),
                ColumnType::Integer => values_size::<i32>(min, max, non_null),
                ColumnType::Long | ColumnType::Boolean => values_size::<i64>(min, max, non_null),
            };
        }
        stored_size_estimate(size)
    }

    fn load_in_memory_storage(
        &self,
        binary: &ColumnBinary,
        allocator: &mut dyn MemoryAllocator,
    ) -> strata_common::Result<()> {
        check_maker(binary, self.kind())?;
        with_integer_type!(binary.column_type(), load_in_memory(binary, allocator))
    }

    fn set_block_index_node(
        &self,
        parent: &mut dyn BlockIndexNode,
        binary: &ColumnBinary,
        spread_index: usize,
    ) -> strata_common::Result<()> {
        check_maker(binary, self.kind())?;
        let raw = binary.decompress()?;
        let mut cursor = &raw[..];
        let header = PayloadHeader::read(&mut cursor)?;
        header.check(binary)?;
        let Some(range) = ValueRange::read(&mut cursor, &header)? else {
            return Ok(());
        };
        parent.set_bound(
            spread_index,
            PrimitiveValue::from_i64(binary.column_type(), range.min)?,
            PrimitiveValue::from_i64(binary.column_type(), range.max)?,
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ValueRange {
    kind: NumEncodingKind,
    min: i64,
    max: i64,
}

impl ValueRange {
    fn write(&self, target: &mut Vec<u8>) -> strata_common::Result<()> {
        target.write_u8(self.kind as u8)?;
        target.write_i64::<BigEndian>(self.min)?;
        target.write_i64::<BigEndian>(self.max)?;
        Ok(())
    }

    /// Reads the range section, present only in blocks with non-null values.
    fn read(buffer: &mut &[u8], header: &PayloadHeader) -> strata_common::Result<Option<Self>> {
        if header.non_null_count == 0 {
            return Ok(None);
        }
        verify_data!(range, buffer.len() >= RANGE_SECTION_SIZE);
        let kind = buffer.read_u8()?;
        let kind = NumEncodingKind::try_from(kind).map_err(|_| {
            Error::corrupt_data("range section", format!("unknown numeric encoding {kind}"))
        })?;
        let min = buffer.read_i64::<BigEndian>()?;
        let max = buffer.read_i64::<BigEndian>()?;
        verify_data!(range, min <= max);
        Ok(Some(Self { kind, min, max }))
    }
}

/// Decoded layout of an integer payload.
struct IntegerPayload<'a> {
    header: PayloadHeader,
    range: Option<ValueRange>,
    is_null: Vec<bool>,
    values: &'a [u8],
}

impl<'a> IntegerPayload<'a> {
    fn parse(raw: &'a [u8], binary: &ColumnBinary) -> strata_common::Result<Self> {
        let mut cursor = raw;
        let header = PayloadHeader::read(&mut cursor)?;
        header.check(binary)?;
        let range = ValueRange::read(&mut cursor, &header)?;
        let is_null = read_null_mask(&mut cursor, &header)?;
        Ok(Self {
            header,
            range,
            is_null,
            values: cursor,
        })
    }

    /// Encoder of the value section, `None` for all-null blocks.
    fn encoder<T: IntegerColumnValue>(
        &self,
    ) -> strata_common::Result<Option<Box<dyn NumEncoder<T>>>> {
        let Some(range) = self.range else {
            return Ok(None);
        };
        let encoder = open_encoder::<T>(range.kind, self.values)?;
        Ok(Some(encoder))
    }
}

/// Picks the diff encoder for `[min, max]`, or the plain encoder when the
/// range is too wide for `T`.
fn select_num_encoder<T: IntegerColumnValue>(
    min: T,
    max: T,
    order: ByteOrder,
) -> strata_common::Result<Box<dyn NumEncoder<T>>> {
    match DiffNumEncoder::with_byte_order(min, max, order) {
        Ok(encoder) => Ok(Box::new(encoder)),
        Err(e) if e.is_out_of_range() => {
            log::trace!("range [{min}, {max}] is too wide for diff encoding, storing plain values");
            Ok(Box::new(PlainNumEncoder::<T>::new(order)))
        }
        Err(e) => Err(e),
    }
}

fn values_size<T: IntegerColumnValue>(min: i64, max: i64, rows: usize) -> usize {
    select_num_encoder(T::from_i64(min), T::from_i64(max), ByteOrder::default())
        .map(|encoder| encoder.calc_binary_size(rows))
        .unwrap_or_else(|_| PlainNumEncoder::<T>::new(ByteOrder::default()).calc_binary_size(rows))
}

fn encode_payload<T: IntegerColumnValue>(
    column: &dyn Column,
    order: ByteOrder,
) -> strata_common::Result<(PayloadHeader, Vec<u8>)> {
    let row_count = column.row_count();
    let mut is_null = Vec::with_capacity(row_count);
    let mut values = Vec::with_capacity(row_count);
    for index in 0..row_count {
        match column.value(index) {
            None => is_null.push(true),
            Some(value) => {
                let value = T::from_value(&value).ok_or_else(|| {
                    Error::encoding_unsupported(format!(
                        "{:?} value in the {:?} column '{}'",
                        value.column_type(),
                        T::COLUMN_TYPE,
                        column.name()
                    ))
                })?;
                is_null.push(false);
                values.push(value);
            }
        }
    }

    let header = PayloadHeader {
        row_count,
        non_null_count: values.len(),
    };
    let mut raw = Vec::new();
    header.write(&mut raw)?;
    let (Some(&min), Some(&max)) = (values.iter().min(), values.iter().max()) else {
        return Ok((header, raw));
    };

    let encoder = select_num_encoder(min, max, order)?;
    ValueRange {
        kind: encoder.kind(),
        min: min.as_(),
        max: max.as_(),
    }
    .write(&mut raw)?;
    if header.has_null_section() {
        write_bit_section(&mut raw, is_null.iter().copied(), row_count, order)?;
    }
    let offset = raw.len();
    raw.resize(offset + encoder.calc_binary_size(values.len()), 0);
    encoder.encode_into(&values, &mut raw[offset..])?;
    Ok((header, raw))
}

fn decode_column<T: IntegerColumnValue>(
    binary: &ColumnBinary,
) -> strata_common::Result<PrimitiveColumn> {
    let raw = binary.decompress()?;
    let payload = IntegerPayload::parse(&raw, binary)?;
    let values = match payload.encoder::<T>()? {
        Some(encoder) => encoder
            .decode_sparse(payload.values, &payload.is_null)?
            .into_iter()
            .map(|value| value.map(IntegerColumnValue::into_value))
            .collect(),
        None => vec![None; payload.header.row_count],
    };
    Ok(PrimitiveColumn::with_values(
        binary.column_name().to_string(),
        binary.column_type(),
        values,
    ))
}

fn load_in_memory<T: IntegerColumnValue>(
    binary: &ColumnBinary,
    allocator: &mut dyn MemoryAllocator,
) -> strata_common::Result<()> {
    let raw = binary.decompress()?;
    let payload = IntegerPayload::parse(&raw, binary)?;
    match payload.encoder::<T>()? {
        Some(encoder) => encoder.load_into_memory(payload.values, &payload.is_null, allocator, 0),
        None => (0..payload.header.row_count).try_for_each(|index| allocator.set_null(index)),
    }
}

fn load_dictionary<T: IntegerColumnValue>(
    binary: &ColumnBinary,
    dictionary: &mut dyn Dictionary,
) -> strata_common::Result<()> {
    let raw = binary.decompress()?;
    let payload = IntegerPayload::parse(&raw, binary)?;
    match payload.encoder::<T>()? {
        Some(encoder) => encoder.populate_dictionary(
            payload.values,
            payload.header.non_null_count,
            dictionary,
        ),
        None => Ok(()),
    }
}

#[cold]
fn unsupported_column_type(column_type: ColumnType) -> Error {
    Error::encoding_unsupported(format!(
        "{column_type:?} columns are not handled by the integer maker"
    ))
}
