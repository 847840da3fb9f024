//! Block compressors of the strata columnar format.
//!
//! Every compressor produces the same frame: a 4-byte big-endian uncompressed
//! length followed by the codec payload. The effort level used for a block is
//! chosen from the session's [`CompressResult`], which lowers the effort over
//! time and never raises it again.

pub mod compressor;
pub mod gzip;
pub mod policy;
pub mod result;
pub mod zstandard;

pub use compressor::{Compressor, CompressorKind, FRAME_HEADER_SIZE};
pub use gzip::GzipCompressor;
pub use policy::CompressionPolicy;
pub use result::{CompressResult, CompressResultNode, FeedbackState};
pub use zstandard::ZstdCompressor;
