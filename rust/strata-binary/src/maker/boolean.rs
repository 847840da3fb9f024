use super::{
    ColumnBinaryMaker, ColumnBinaryMakerKind, PAYLOAD_HEADER_SIZE, PayloadHeader, check_maker,
    null_section_size, read_bit_section, read_null_mask, seal_block, stored_size_estimate,
    write_bit_section,
};
use crate::{
    analysis::ColumnAnalysisResult,
    block_index::BlockIndexNode,
    column::{Column, ColumnType, PrimitiveColumn, PrimitiveValue},
    column_binary::ColumnBinary,
    config::{ColumnBinaryMakerConfig, ColumnBinaryMakerCustomConfigNode},
};
use strata_common::error::Error;
use strata_compression::CompressResultNode;
use strata_encodings::{
    inmemory::MemoryAllocator,
    sparse::{dense_source, for_each_row, merge_rows},
};

/// Maker for boolean columns: one bit per non-null value.
#[derive(Debug, Clone, Copy, Default)]
pub struct BooleanColumnBinaryMaker;

/// Null mask and dense values of a boolean block.
struct BooleanPayload {
    is_null: Vec<bool>,
    values: Vec<bool>,
}

impl BooleanPayload {
    fn read(binary: &ColumnBinary) -> strata_common::Result<Self> {
        if binary.column_type() != ColumnType::Boolean {
            return Err(Error::encoding_unsupported(format!(
                "{:?} block handed to the boolean maker",
                binary.column_type()
            )));
        }
        let raw = binary.decompress()?;
        let mut cursor = &raw[..];
        let header = PayloadHeader::read(&mut cursor)?;
        header.check(binary)?;
        let is_null = read_null_mask(&mut cursor, &header)?;
        let values = if header.non_null_count > 0 {
            read_bit_section(&mut cursor, header.non_null_count)?
        } else {
            Vec::new()
        };
        Ok(Self { is_null, values })
    }

    fn rows(&self) -> strata_common::Result<Vec<Option<bool>>> {
        merge_rows(&self.is_null, self.dense_values())
    }

    fn dense_values(&self) -> impl FnMut() -> strata_common::Result<bool> + '_ {
        dense_source("boolean values", self.values.iter().copied())
    }
}

impl ColumnBinaryMaker for BooleanColumnBinaryMaker {
    fn kind(&self) -> ColumnBinaryMakerKind {
        ColumnBinaryMakerKind::Boolean
    }

    fn to_binary(
        &self,
        common_config: &ColumnBinaryMakerConfig,
        custom_config: Option<&ColumnBinaryMakerCustomConfigNode>,
        compress_result: &CompressResultNode,
        column: &dyn Column,
    ) -> strata_common::Result<ColumnBinary> {
        let config = ColumnBinaryMakerCustomConfigNode::resolve(custom_config, common_config);
        if column.column_type() != ColumnType::Boolean {
            return Err(Error::encoding_unsupported(format!(
                "{:?} column '{}' handed to the boolean maker",
                column.column_type(),
                column.name()
            )));
        }

        let row_count = column.row_count();
        let mut is_null = Vec::with_capacity(row_count);
        let mut values = Vec::with_capacity(row_count);
        for index in 0..row_count {
            match column.value(index) {
                None => is_null.push(true),
                Some(PrimitiveValue::Boolean(value)) => {
                    is_null.push(false);
                    values.push(value);
                }
                Some(other) => {
                    return Err(Error::encoding_unsupported(format!(
                        "{:?} value in the boolean column '{}'",
                        other.column_type(),
                        column.name()
                    )));
                }
            }
        }

        let header = PayloadHeader {
            row_count,
            non_null_count: values.len(),
        };
        let mut raw = Vec::new();
        header.write(&mut raw)?;
        if header.has_null_section() {
            write_bit_section(&mut raw, is_null.iter().copied(), row_count, config.byte_order)?;
        }
        if !values.is_empty() {
            write_bit_section(&mut raw, values.iter().copied(), values.len(), config.byte_order)?;
        }
        seal_block(self.kind(), config, compress_result, column, &header, &raw)
    }

    fn to_column(&self, binary: &ColumnBinary) -> strata_common::Result<PrimitiveColumn> {
        check_maker(binary, self.kind())?;
        let payload = BooleanPayload::read(binary)?;
        Ok(PrimitiveColumn::from_booleans(
            binary.column_name().to_string(),
            payload.rows()?,
        ))
    }

    fn calc_binary_size(&self, analysis: &ColumnAnalysisResult) -> usize {
        let non_null = analysis.non_null_count();
        let mut size = PAYLOAD_HEADER_SIZE;
        if non_null > 0 {
            size += null_section_size(non_null);
            if analysis.null_count > 0 {
                size += null_section_size(analysis.row_count);
            }
        }
        stored_size_estimate(size)
    }

    fn load_in_memory_storage(
        &self,
        binary: &ColumnBinary,
        allocator: &mut dyn MemoryAllocator,
    ) -> strata_common::Result<()> {
        check_maker(binary, self.kind())?;
        let payload = BooleanPayload::read(binary)?;
        for_each_row(&payload.is_null, payload.dense_values(), |index, value| match value {
            Some(value) => allocator.set_bool(index, value),
            None => allocator.set_null(index),
        })
    }

    fn set_block_index_node(
        &self,
        parent: &mut dyn BlockIndexNode,
        binary: &ColumnBinary,
        spread_index: usize,
    ) -> strata_common::Result<()> {
        check_maker(binary, self.kind())?;
        let payload = BooleanPayload::read(binary)?;
        let (Some(&min), Some(&max)) = (payload.values.iter().min(), payload.values.iter().max())
        else {
            return Ok(());
        };
        parent.set_bound(
            spread_index,
            PrimitiveValue::Boolean(min),
            PrimitiveValue::Boolean(max),
        )
    }
}
