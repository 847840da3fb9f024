//! Column binary makers of the strata columnar format.
//!
//! A [`ColumnBinaryMaker`](maker::ColumnBinaryMaker) turns a logical column into
//! a self-describing, compressed [`ColumnBinary`](column_binary::ColumnBinary)
//! block, and reads such blocks back: as a logical column, straight into
//! in-memory storage, or just far enough to produce a block-index summary.

pub mod analysis;
pub mod block_index;
pub mod column;
pub mod column_binary;
pub mod config;
pub mod inmemory;
pub mod maker;

pub use analysis::ColumnAnalysisResult;
pub use block_index::{BlockIndexNode, RangeBlockIndexNode};
pub use column::{Column, ColumnType, PrimitiveColumn, PrimitiveValue};
pub use column_binary::{ColumnBinary, ColumnBinaryHeader};
pub use config::{ColumnBinaryMakerConfig, ColumnBinaryMakerCustomConfigNode};
pub use maker::{
    BooleanColumnBinaryMaker, ColumnBinaryMaker, ColumnBinaryMakerKind, DiffIntegerColumnBinaryMaker,
    decode_column, encode_column,
};
