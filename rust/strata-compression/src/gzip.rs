use crate::{
    compressor::{Compressor, CompressorKind},
    policy::CompressionPolicy,
};
use flate2::{Compression, read::GzDecoder, write::GzEncoder};
use std::io::{Read, Write};
use strata_common::error::Error;

/// Gzip compressor. Effort levels follow deflate's `1..=9` scale.
#[derive(Debug, Default, Clone, Copy)]
pub struct GzipCompressor;

impl GzipCompressor {
    pub const BEST_SPEED_LEVEL: u32 = 1;
    pub const SPEED_LEVEL: u32 = Self::DEFAULT_LEVEL - 2;
    pub const DEFAULT_LEVEL: u32 = 6;
    pub const BEST_COMPRESSION_LEVEL: u32 = 9;
}

impl Compressor for GzipCompressor {
    fn kind(&self) -> CompressorKind {
        CompressorKind::Gzip
    }

    fn ideal_level(&self, policy: CompressionPolicy) -> u32 {
        match policy {
            CompressionPolicy::BestSpeed => Self::BEST_SPEED_LEVEL,
            CompressionPolicy::Speed => Self::SPEED_LEVEL,
            CompressionPolicy::Default => Self::DEFAULT_LEVEL,
            CompressionPolicy::BestCompression => Self::BEST_COMPRESSION_LEVEL,
        }
    }

    fn compress_payload(
        &self,
        data: &[u8],
        level: u32,
        target: &mut Vec<u8>,
    ) -> strata_common::Result<()> {
        let mut gzip = GzEncoder::new(target, Compression::new(level));
        gzip.write_all(data)
            .map_err(|e| Error::io("Failed to write gzip compressed data", e))?;
        gzip.finish()
            .map_err(|e| Error::io("Failed to finish gzip encoder", e))?;
        Ok(())
    }

    fn payload_reader<'a>(&self, payload: &'a [u8]) -> strata_common::Result<Box<dyn Read + 'a>> {
        Ok(Box::new(GzDecoder::new(payload)))
    }
}

#[cfg(test)]
mod tests {
    use super::GzipCompressor;
    use crate::{
        compressor::{Compressor, FRAME_HEADER_SIZE},
        policy::CompressionPolicy,
        result::CompressResult,
    };
    use flate2::read::GzDecoder;
    use std::io::Read;

    #[test]
    fn test_payload_is_plain_gzip() {
        let data: Vec<u8> = (0..1000).map(|i| (i % 10) as u8).collect();
        let result = CompressResult::new(CompressionPolicy::Default);
        let frame = GzipCompressor.compress(&data, &result).unwrap();

        let mut decoded = vec![];
        GzDecoder::new(&frame[FRAME_HEADER_SIZE..])
            .read_to_end(&mut decoded)
            .unwrap();
        assert_eq!(decoded, data);
        assert_eq!(result.state().last_level, Some(6));
    }

    #[test]
    fn test_policy_levels() {
        assert_eq!(GzipCompressor.ideal_level(CompressionPolicy::BestSpeed), 1);
        assert_eq!(GzipCompressor.ideal_level(CompressionPolicy::Speed), 4);
        assert_eq!(GzipCompressor.ideal_level(CompressionPolicy::Default), 6);
        assert_eq!(
            GzipCompressor.ideal_level(CompressionPolicy::BestCompression),
            9
        );
    }
}
