use crate::{
    gzip::GzipCompressor, policy::CompressionPolicy, result::CompressResult,
    zstandard::ZstdCompressor,
};
use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use serde::{Deserialize, Serialize};
use std::io::Read;
use strata_common::error::{Error, ErrorKind};

/// Size of the frame header holding the big-endian uncompressed length.
pub const FRAME_HEADER_SIZE: usize = 4;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum CompressorKind {
    #[default]
    Gzip = 1,
    Zstd = 2,
}

impl CompressorKind {
    pub fn compressor(&self) -> &'static dyn Compressor {
        static GZIP: GzipCompressor = GzipCompressor;
        static ZSTD: ZstdCompressor = ZstdCompressor;
        match self {
            CompressorKind::Gzip => &GZIP,
            CompressorKind::Zstd => &ZSTD,
        }
    }
}

impl TryFrom<u8> for CompressorKind {
    type Error = ();

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(CompressorKind::Gzip),
            2 => Ok(CompressorKind::Zstd),
            _ => Err(()),
        }
    }
}

/// Length-prefixed block compressor with a session-adaptive effort level.
///
/// Implementations provide the codec itself; framing and level selection are
/// shared by all of them.
pub trait Compressor: Send + Sync {
    fn kind(&self) -> CompressorKind;

    /// Effort level the codec would ideally use for the given policy.
    fn ideal_level(&self, policy: CompressionPolicy) -> u32;

    /// Compresses `data` with the given effort level, appending the codec
    /// payload to `target`.
    fn compress_payload(
        &self,
        data: &[u8],
        level: u32,
        target: &mut Vec<u8>,
    ) -> strata_common::Result<()>;

    /// Opens a decoding stream over a codec payload.
    fn payload_reader<'a>(&self, payload: &'a [u8]) -> strata_common::Result<Box<dyn Read + 'a>>;

    /// Decompresses a codec payload, filling exactly `target.len()` bytes.
    fn decompress_payload(&self, payload: &[u8], target: &mut [u8]) -> strata_common::Result<()> {
        read_exact_payload(self.kind(), self.payload_reader(payload)?, target)
    }

    /// Compresses `data` into a new frame.
    ///
    /// The effort level is taken from `result` before compressing, and the
    /// achieved sizes are reported back to it afterwards.
    fn compress(&self, data: &[u8], result: &CompressResult) -> strata_common::Result<Vec<u8>> {
        let length = u32::try_from(data.len()).map_err(|_| {
            Error::out_of_range(
                "data",
                format!("{} bytes exceed the frame length limit", data.len()),
            )
        })?;
        let level = result.select_level(self.ideal_level(result.policy()));

        let mut frame = Vec::with_capacity(FRAME_HEADER_SIZE + data.len() / 2);
        frame.write_u32::<BigEndian>(length)?;
        self.compress_payload(data, level, &mut frame)?;

        let compressed_size = frame.len() - FRAME_HEADER_SIZE;
        result.feed_back(data.len(), compressed_size);
        log::trace!(
            "{:?} compressed {} bytes into {compressed_size} at level {level}",
            self.kind(),
            data.len()
        );
        Ok(frame)
    }

    /// Reads the uncompressed length from the frame header without decompressing.
    fn decompressed_size(&self, frame: &[u8]) -> strata_common::Result<usize> {
        let mut header = frame;
        let length = header
            .read_u32::<BigEndian>()
            .map_err(|_| Error::corrupt_data("compressed frame", "truncated frame header"))?;
        Ok(length as usize)
    }

    /// Decompresses a frame into a new buffer.
    ///
    /// The buffer grows with the decoded stream rather than being sized from
    /// the header up front, so a corrupt length never allocates more than the
    /// payload actually expands to.
    fn decompress(&self, frame: &[u8]) -> strata_common::Result<Vec<u8>> {
        let size = self.decompressed_size(frame)?;
        let reader = self.payload_reader(&frame[FRAME_HEADER_SIZE..])?;
        let mut target = Vec::with_capacity(size.min(INITIAL_DECOMPRESS_CAPACITY));
        reader
            .take(size as u64 + 1)
            .read_to_end(&mut target)
            .map_err(|e| codec_error(self.kind(), e.to_string()))?;
        if target.len() != size {
            return Err(codec_error(
                self.kind(),
                if target.len() > size {
                    "payload is longer than the frame length".to_string()
                } else {
                    format!("frame declares {size} bytes, payload holds {}", target.len())
                },
            ));
        }
        Ok(target)
    }

    /// Decompresses a frame into the start of `target`, returning the number
    /// of bytes written.
    fn decompress_into(&self, frame: &[u8], target: &mut [u8]) -> strata_common::Result<usize> {
        let size = self.decompressed_size(frame)?;
        if target.len() < size {
            return Err(ErrorKind::DestBufferTooSmall.into());
        }
        self.decompress_payload(&frame[FRAME_HEADER_SIZE..], &mut target[..size])?;
        Ok(size)
    }
}

/// Upper bound of the buffer reserved before the first decoded byte arrives.
const INITIAL_DECOMPRESS_CAPACITY: usize = 1 << 20;

fn codec_error(kind: CompressorKind, message: impl Into<String>) -> Error {
    let element = match kind {
        CompressorKind::Gzip => "gzip payload",
        CompressorKind::Zstd => "zstd payload",
    };
    Error::corrupt_data(element, message)
}

/// Fills `target` from a codec stream, and checks that the stream ends right
/// after it.
fn read_exact_payload(
    kind: CompressorKind,
    mut reader: impl Read,
    target: &mut [u8],
) -> strata_common::Result<()> {
    reader
        .read_exact(target)
        .map_err(|e| codec_error(kind, e.to_string()))?;
    let mut extra = [0u8; 1];
    match reader.read(&mut extra) {
        Ok(0) => Ok(()),
        Ok(_) => Err(codec_error(kind, "payload is longer than the frame length")),
        Err(e) => Err(codec_error(kind, e.to_string())),
    }
}
