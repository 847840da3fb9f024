//! The column binary maker contract and its variants.
//!
//! Each variant encodes the columns of one family of logical types. All of
//! them share the same payload prefix: a flags byte, the row count and the
//! non-null count. Null rows are described by a separate null section and have
//! no slot in the value sections.

use crate::{
    analysis::ColumnAnalysisResult,
    block_index::BlockIndexNode,
    column::{Column, ColumnType, PrimitiveColumn},
    column_binary::{ColumnBinary, ColumnBinaryHeader},
    config::{ColumnBinaryMakerConfig, ColumnBinaryMakerCustomConfigNode},
};
use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use serde::{Deserialize, Serialize};
use strata_common::{error::Error, verify_data};
use strata_compression::{CompressResultNode, FRAME_HEADER_SIZE};
use strata_encodings::{BitWidthConverter, ByteOrder, bits, inmemory::MemoryAllocator, sparse};

mod boolean;
mod integer;

pub use boolean::BooleanColumnBinaryMaker;
pub use integer::DiffIntegerColumnBinaryMaker;

/// Converts logical columns of one type family to and from [`ColumnBinary`] blocks.
pub trait ColumnBinaryMaker: Send + Sync {
    fn kind(&self) -> ColumnBinaryMakerKind;

    /// Encodes `column` and compresses the payload into a new block.
    ///
    /// # Parameters
    ///
    /// - `common_config`: settings of the writer session.
    /// - `custom_config`: per-column overrides for this column, if any.
    /// - `compress_result`: compression feedback node of this column, shared by
    ///   all blocks of the column within the session.
    /// - `column`: the column to encode.
    ///
    /// Fails with an encoding-unsupported error when the column holds values
    /// this maker cannot represent.
    fn to_binary(
        &self,
        common_config: &ColumnBinaryMakerConfig,
        custom_config: Option<&ColumnBinaryMakerCustomConfigNode>,
        compress_result: &CompressResultNode,
        column: &dyn Column,
    ) -> strata_common::Result<ColumnBinary>;

    /// Materializes the logical column stored in `binary`.
    fn to_column(&self, binary: &ColumnBinary) -> strata_common::Result<PrimitiveColumn>;

    /// Estimates the stored size of a column from its statistics alone.
    fn calc_binary_size(&self, analysis: &ColumnAnalysisResult) -> usize;

    /// Decodes `binary` straight into `allocator`, one setter call per row.
    fn load_in_memory_storage(
        &self,
        binary: &ColumnBinary,
        allocator: &mut dyn MemoryAllocator,
    ) -> strata_common::Result<()>;

    /// Pushes the `[min, max]` summary of `binary` into `parent` at
    /// `spread_index`. Nothing is pushed for blocks without non-null values.
    fn set_block_index_node(
        &self,
        parent: &mut dyn BlockIndexNode,
        binary: &ColumnBinary,
        spread_index: usize,
    ) -> strata_common::Result<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum ColumnBinaryMakerKind {
    DiffInteger = 1,
    Boolean = 2,
}

impl ColumnBinaryMakerKind {
    pub fn maker(&self) -> &'static dyn ColumnBinaryMaker {
        static DIFF_INTEGER: DiffIntegerColumnBinaryMaker = DiffIntegerColumnBinaryMaker;
        static BOOLEAN: BooleanColumnBinaryMaker = BooleanColumnBinaryMaker;
        match self {
            ColumnBinaryMakerKind::DiffInteger => &DIFF_INTEGER,
            ColumnBinaryMakerKind::Boolean => &BOOLEAN,
        }
    }

    /// Default maker for a column, chosen from its statistics.
    pub fn select(analysis: &ColumnAnalysisResult) -> ColumnBinaryMakerKind {
        match analysis.column_type {
            ColumnType::Boolean => ColumnBinaryMakerKind::Boolean,
            ColumnType::Byte | ColumnType::Short | ColumnType::Integer | ColumnType::Long => {
                ColumnBinaryMakerKind::DiffInteger
            }
        }
    }
}

impl TryFrom<u8> for ColumnBinaryMakerKind {
    type Error = ();

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(ColumnBinaryMakerKind::DiffInteger),
            2 => Ok(ColumnBinaryMakerKind::Boolean),
            _ => Err(()),
        }
    }
}

/// Analyzes `column`, picks its default maker and encodes it.
pub fn encode_column(
    common_config: &ColumnBinaryMakerConfig,
    custom_config: Option<&ColumnBinaryMakerCustomConfigNode>,
    compress_result: &CompressResultNode,
    column: &dyn Column,
) -> strata_common::Result<ColumnBinary> {
    let analysis = ColumnAnalysisResult::analyze(column);
    ColumnBinaryMakerKind::select(&analysis).maker().to_binary(
        common_config,
        custom_config,
        compress_result,
        column,
    )
}

/// Decodes a block with the maker that produced it.
pub fn decode_column(binary: &ColumnBinary) -> strata_common::Result<PrimitiveColumn> {
    binary.maker().maker().to_column(binary)
}

const FLAG_HAS_NULL_SECTION: u8 = 1;

/// Size of the payload prefix: flags, row count and non-null count.
pub(crate) const PAYLOAD_HEADER_SIZE: usize = 9;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct PayloadHeader {
    pub row_count: usize,
    pub non_null_count: usize,
}

impl PayloadHeader {
    pub fn null_count(&self) -> usize {
        self.row_count - self.non_null_count
    }

    /// A null section is only stored when the block mixes null and non-null rows.
    pub fn has_null_section(&self) -> bool {
        self.non_null_count > 0 && self.non_null_count < self.row_count
    }

    pub fn write(&self, target: &mut Vec<u8>) -> strata_common::Result<()> {
        let flags = if self.has_null_section() {
            FLAG_HAS_NULL_SECTION
        } else {
            0
        };
        target.write_u8(flags)?;
        target.write_u32::<BigEndian>(count_to_u32("row count", self.row_count)?)?;
        target.write_u32::<BigEndian>(count_to_u32("non-null count", self.non_null_count)?)?;
        Ok(())
    }

    /// Reads the prefix, advancing `buffer` past it.
    pub fn read(buffer: &mut &[u8]) -> strata_common::Result<Self> {
        verify_data!(buffer, buffer.len() >= PAYLOAD_HEADER_SIZE);
        let flags = buffer.read_u8()?;
        let row_count = buffer.read_u32::<BigEndian>()? as usize;
        let non_null_count = buffer.read_u32::<BigEndian>()? as usize;
        verify_data!(non_null_count, non_null_count <= row_count);
        let header = Self {
            row_count,
            non_null_count,
        };
        verify_data!(
            flags,
            (flags & FLAG_HAS_NULL_SECTION != 0) == header.has_null_section()
        );
        Ok(header)
    }

    /// Checks the prefix against the block metadata.
    pub fn check(&self, binary: &ColumnBinary) -> strata_common::Result<()> {
        if self.row_count != binary.row_count() || self.null_count() != binary.null_count() {
            return Err(Error::corrupt_data(
                "column binary",
                format!(
                    "payload holds {} rows ({} null), block metadata says {} ({} null)",
                    self.row_count,
                    self.null_count(),
                    binary.row_count(),
                    binary.null_count()
                ),
            ));
        }
        Ok(())
    }
}

fn count_to_u32(name: &str, count: usize) -> strata_common::Result<u32> {
    u32::try_from(count)
        .map_err(|_| Error::out_of_range(name, format!("{count} exceeds the block row limit")))
}

/// Size of a null section covering `row_count` rows.
pub(crate) fn null_section_size(row_count: usize) -> usize {
    BitWidthConverter::for_range(1, ByteOrder::default()).calc_binary_size(row_count)
}

/// Appends a one-bit-per-row section holding `flags` to `target`.
pub(crate) fn write_bit_section<I>(
    target: &mut Vec<u8>,
    flags: I,
    count: usize,
    order: ByteOrder,
) -> strata_common::Result<()>
where
    I: IntoIterator<Item = bool>,
{
    let converter = BitWidthConverter::with_width(1, order)?;
    let offset = target.len();
    target.resize(offset + converter.calc_binary_size(count), 0);
    converter.write_header(&mut target[offset..])?;
    let mut writer = converter.writer(&mut target[offset + bits::HEADER_SIZE..]);
    let mut written = 0;
    for flag in flags {
        writer.put_u64(flag as u64)?;
        written += 1;
    }
    writer.finish()?;
    if written != count {
        return Err(Error::invalid_arg(
            "flags",
            format!("expected {count} flags, got {written}"),
        ));
    }
    Ok(())
}

/// Reads a one-bit-per-entry section of `count` entries, advancing `buffer`
/// past it.
pub(crate) fn read_bit_section(buffer: &mut &[u8], count: usize) -> strata_common::Result<Vec<bool>> {
    let data: &[u8] = *buffer;
    let (converter, packed) = BitWidthConverter::read_header(data)?;
    verify_data!(width, converter.width() == 1);
    let size = converter.packed_size(count);
    verify_data!(packed, packed.len() >= size);
    let mut reader = converter.reader(packed);
    let flags = (0..count)
        .map(|_| reader.get_u64().map(|bit| bit != 0))
        .collect::<strata_common::Result<Vec<_>>>()?;
    *buffer = &packed[size..];
    Ok(flags)
}

/// Reads the null mask of a block: the stored null section, or a uniform
/// mask when the block has none.
pub(crate) fn read_null_mask(
    buffer: &mut &[u8],
    header: &PayloadHeader,
) -> strata_common::Result<Vec<bool>> {
    if header.has_null_section() {
        let is_null = read_bit_section(buffer, header.row_count)?;
        verify_data!(null_section, sparse::non_null_count(&is_null) == header.non_null_count);
        Ok(is_null)
    } else {
        Ok(vec![header.non_null_count == 0; header.row_count])
    }
}

pub(crate) fn check_maker(binary: &ColumnBinary, kind: ColumnBinaryMakerKind) -> strata_common::Result<()> {
    if binary.maker() != kind {
        return Err(Error::invalid_arg(
            "binary",
            format!(
                "block of column '{}' was produced by {:?}, not {kind:?}",
                binary.column_name(),
                binary.maker()
            ),
        ));
    }
    Ok(())
}

/// Compresses an encoded payload and wraps it into a block.
pub(crate) fn seal_block(
    kind: ColumnBinaryMakerKind,
    config: &ColumnBinaryMakerConfig,
    compress_result: &CompressResultNode,
    column: &dyn Column,
    header: &PayloadHeader,
    raw: &[u8],
) -> strata_common::Result<ColumnBinary> {
    let frame = config
        .compressor
        .compressor()
        .compress(
            raw,
            compress_result.result_with(config.compression_policy, config.allowed_ratio),
        )?;
    log::debug!(
        "{kind:?} encoded column '{}': {} rows, {} nulls, {} raw bytes, {} stored bytes",
        column.name(),
        header.row_count,
        header.null_count(),
        raw.len(),
        frame.len()
    );
    let metadata = ColumnBinaryHeader {
        maker: kind,
        compressor: config.compressor,
        column_name: column.name().to_string(),
        column_type: column.column_type(),
        row_count: header.row_count,
        null_count: header.null_count(),
        raw_data_size: raw.len(),
    };
    Ok(ColumnBinary::new(metadata, frame))
}

/// Stored size estimate: payload size plus the compression frame header.
pub(crate) fn stored_size_estimate(raw_size: usize) -> usize {
    FRAME_HEADER_SIZE + raw_size
}

#[cfg(test)]
mod tests {
    use super::{PayloadHeader, read_bit_section, read_null_mask, write_bit_section};
    use strata_encodings::ByteOrder;

    #[test]
    fn test_payload_header() {
        for (rows, non_null, has_section) in [(10, 10, false), (10, 0, false), (10, 4, true)] {
            let header = PayloadHeader {
                row_count: rows,
                non_null_count: non_null,
            };
            assert_eq!(header.has_null_section(), has_section);
            let mut buffer = vec![];
            header.write(&mut buffer).unwrap();
            let mut cursor = &buffer[..];
            assert_eq!(PayloadHeader::read(&mut cursor).unwrap(), header);
            assert!(cursor.is_empty());
        }
    }

    #[test]
    fn test_payload_header_corrupt() {
        let mut buffer = vec![];
        PayloadHeader {
            row_count: 3,
            non_null_count: 3,
        }
        .write(&mut buffer)
        .unwrap();

        let mut bad_flags = buffer.clone();
        bad_flags[0] = 1;
        assert!(PayloadHeader::read(&mut &bad_flags[..]).unwrap_err().is_corrupt_data());

        let mut bad_counts = buffer.clone();
        bad_counts[8] = 4;
        assert!(PayloadHeader::read(&mut &bad_counts[..]).unwrap_err().is_corrupt_data());

        assert!(PayloadHeader::read(&mut &buffer[..5]).unwrap_err().is_corrupt_data());
    }

    #[test]
    fn test_bit_sections() {
        let flags: Vec<bool> = (0..77).map(|i| i % 3 == 0).collect();
        let mut buffer = vec![0xaa];
        write_bit_section(&mut buffer, flags.iter().copied(), flags.len(), ByteOrder::BigEndian)
            .unwrap();
        buffer.push(0x55);

        let mut cursor = &buffer[1..];
        assert_eq!(read_bit_section(&mut cursor, flags.len()).unwrap(), flags);
        assert_eq!(cursor, &[0x55]);

        assert!(write_bit_section(&mut vec![], [true], 2, ByteOrder::default()).is_err());
    }

    #[test]
    fn test_uniform_null_masks() {
        let all_null = PayloadHeader {
            row_count: 3,
            non_null_count: 0,
        };
        assert_eq!(read_null_mask(&mut &[][..], &all_null).unwrap(), vec![true; 3]);
        let no_null = PayloadHeader {
            row_count: 2,
            non_null_count: 2,
        };
        assert_eq!(read_null_mask(&mut &[][..], &no_null).unwrap(), vec![false; 2]);
    }
}
