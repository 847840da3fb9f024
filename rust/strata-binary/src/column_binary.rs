use crate::{column::ColumnType, maker::ColumnBinaryMakerKind};
use std::sync::Arc;
use strata_common::error::Error;
use strata_compression::CompressorKind;

/// Metadata describing a stored block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnBinaryHeader {
    /// Maker variant that produced the block.
    pub maker: ColumnBinaryMakerKind,
    /// Compressor that produced the stored frame.
    pub compressor: CompressorKind,
    pub column_name: String,
    pub column_type: ColumnType,
    pub row_count: usize,
    pub null_count: usize,
    /// Size of the encoded payload before compression.
    pub raw_data_size: usize,
}

/// One encoded and compressed column block.
///
/// The stored bytes live in `buffer()[binary_start()..][..binary_length()]`,
/// which lets several blocks share one buffer (e.g. a row group read from a
/// file). A block is immutable once produced; every decode path decompresses
/// it on its own.
#[derive(Debug, Clone)]
pub struct ColumnBinary {
    header: ColumnBinaryHeader,
    binary: Arc<[u8]>,
    binary_start: usize,
    binary_length: usize,
}

impl ColumnBinary {
    /// Wraps a freshly compressed frame.
    pub(crate) fn new(header: ColumnBinaryHeader, frame: Vec<u8>) -> Self {
        let binary_length = frame.len();
        Self {
            header,
            binary: Arc::from(frame),
            binary_start: 0,
            binary_length,
        }
    }

    /// Rebuilds a block from stored metadata and the location of its frame
    /// within `buffer`.
    pub fn open(
        header: ColumnBinaryHeader,
        buffer: Arc<[u8]>,
        start: usize,
        length: usize,
    ) -> strata_common::Result<Self> {
        let binary = Self {
            header,
            binary: buffer,
            binary_start: start,
            binary_length: length,
        };
        binary.payload()?;
        Ok(binary)
    }

    pub fn header(&self) -> &ColumnBinaryHeader {
        &self.header
    }

    pub fn maker(&self) -> ColumnBinaryMakerKind {
        self.header.maker
    }

    pub fn compressor(&self) -> CompressorKind {
        self.header.compressor
    }

    pub fn column_name(&self) -> &str {
        &self.header.column_name
    }

    pub fn column_type(&self) -> ColumnType {
        self.header.column_type
    }

    pub fn row_count(&self) -> usize {
        self.header.row_count
    }

    pub fn null_count(&self) -> usize {
        self.header.null_count
    }

    pub fn raw_data_size(&self) -> usize {
        self.header.raw_data_size
    }

    /// Buffer holding the frame, possibly shared with other blocks.
    pub fn buffer(&self) -> &Arc<[u8]> {
        &self.binary
    }

    pub fn binary_start(&self) -> usize {
        self.binary_start
    }

    pub fn binary_length(&self) -> usize {
        self.binary_length
    }

    /// The compressed frame of this block.
    pub fn payload(&self) -> strata_common::Result<&[u8]> {
        self.binary_start
            .checked_add(self.binary_length)
            .and_then(|end| self.binary.get(self.binary_start..end))
            .ok_or_else(|| {
                Error::corrupt_data(
                    "column binary",
                    format!(
                        "range {}+{} is outside of a {} byte buffer",
                        self.binary_start,
                        self.binary_length,
                        self.binary.len()
                    ),
                )
            })
    }

    /// Decompresses the stored frame into the encoded payload.
    pub fn decompress(&self) -> strata_common::Result<Vec<u8>> {
        let raw = self.compressor().compressor().decompress(self.payload()?)?;
        if raw.len() != self.raw_data_size() {
            return Err(Error::corrupt_data(
                "column binary",
                format!(
                    "decompressed {} bytes, expected {}",
                    raw.len(),
                    self.raw_data_size()
                ),
            ));
        }
        Ok(raw)
    }

    /// Rebinds the block to a copy of its frame placed at `start` within a
    /// shared buffer.
    pub fn relocate(&self, buffer: Arc<[u8]>, start: usize) -> strata_common::Result<Self> {
        let relocated = Self::open(self.header.clone(), buffer, start, self.binary_length)?;
        if relocated.payload()? != self.payload()? {
            return Err(Error::invalid_arg(
                "buffer",
                "shared buffer does not hold the block's frame at the given offset",
            ));
        }
        Ok(relocated)
    }
}

#[cfg(test)]
mod tests {
    use super::{ColumnBinary, ColumnBinaryHeader};
    use crate::{column::ColumnType, maker::ColumnBinaryMakerKind};
    use std::sync::Arc;
    use strata_compression::CompressorKind;

    fn header() -> ColumnBinaryHeader {
        ColumnBinaryHeader {
            maker: ColumnBinaryMakerKind::Boolean,
            compressor: CompressorKind::Gzip,
            column_name: "flag".to_string(),
            column_type: ColumnType::Boolean,
            row_count: 1,
            null_count: 0,
            raw_data_size: 12,
        }
    }

    #[test]
    fn test_open_checks_frame_range() {
        let buffer: Arc<[u8]> = Arc::from(vec![0u8; 32]);
        let binary = ColumnBinary::open(header(), buffer.clone(), 8, 24).unwrap();
        assert_eq!(binary.payload().unwrap().len(), 24);
        assert_eq!(binary.binary_start(), 8);
        assert_eq!(binary.header(), &header());

        assert!(ColumnBinary::open(header(), buffer.clone(), 9, 24).unwrap_err().is_corrupt_data());
        assert!(ColumnBinary::open(header(), buffer, usize::MAX, 2).unwrap_err().is_corrupt_data());
    }

    #[test]
    fn test_new_owns_whole_frame() {
        let binary = ColumnBinary::new(header(), vec![1, 2, 3]);
        assert_eq!(binary.binary_start(), 0);
        assert_eq!(binary.binary_length(), 3);
        assert_eq!(binary.payload().unwrap(), &[1, 2, 3]);
        assert_eq!(binary.buffer().len(), 3);
    }
}
