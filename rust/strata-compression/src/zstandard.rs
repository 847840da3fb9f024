use crate::{
    compressor::{Compressor, CompressorKind},
    policy::CompressionPolicy,
};
use std::io::{Read, Write};
use strata_common::error::Error;

/// Zstandard compressor sharing the frame format and level adaptation of the
/// gzip compressor.
#[derive(Debug, Default, Clone, Copy)]
pub struct ZstdCompressor;

impl Compressor for ZstdCompressor {
    fn kind(&self) -> CompressorKind {
        CompressorKind::Zstd
    }

    fn ideal_level(&self, policy: CompressionPolicy) -> u32 {
        match policy {
            CompressionPolicy::BestSpeed => 1,
            CompressionPolicy::Speed => 2,
            CompressionPolicy::Default => 3,
            CompressionPolicy::BestCompression => 19,
        }
    }

    fn compress_payload(
        &self,
        data: &[u8],
        level: u32,
        target: &mut Vec<u8>,
    ) -> strata_common::Result<()> {
        let mut zstd = zstd::stream::write::Encoder::new(target, level as i32)
            .map_err(|e| Error::io("Failed to create ZSTD encoder", e))?;
        zstd.write_all(data)
            .map_err(|e| Error::io("Failed to write ZSTD compressed data", e))?;
        zstd.finish()
            .map_err(|e| Error::io("Failed to finish ZSTD encoder", e))?;
        Ok(())
    }

    fn payload_reader<'a>(&self, payload: &'a [u8]) -> strata_common::Result<Box<dyn Read + 'a>> {
        let zstd = zstd::stream::read::Decoder::with_buffer(payload)
            .map_err(|e| Error::corrupt_data("zstd payload", e.to_string()))?;
        Ok(Box::new(zstd))
    }
}
