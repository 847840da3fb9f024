use crate::column::{Column, ColumnType, PrimitiveValue};

/// Column statistics used to estimate encoded sizes before encoding.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnAnalysisResult {
    pub column_type: ColumnType,
    pub row_count: usize,
    pub null_count: usize,
    /// Smallest non-null value, `None` when every row is null.
    pub min: Option<PrimitiveValue>,
    /// Largest non-null value, `None` when every row is null.
    pub max: Option<PrimitiveValue>,
}

impl ColumnAnalysisResult {
    /// Collects statistics of `column` in a single pass.
    ///
    /// Values whose type differs from the column type are not counted in the
    /// range; encoding such a column fails later on.
    pub fn analyze(column: &dyn Column) -> Self {
        let column_type = column.column_type();
        let row_count = column.row_count();
        let mut null_count = 0;
        let mut min: Option<PrimitiveValue> = None;
        let mut max: Option<PrimitiveValue> = None;
        for index in 0..row_count {
            let Some(value) = column.value(index) else {
                null_count += 1;
                continue;
            };
            if value.column_type() != column_type {
                continue;
            }
            if min.is_none_or(|min| value < min) {
                min = Some(value);
            }
            if max.is_none_or(|max| value > max) {
                max = Some(value);
            }
        }
        Self {
            column_type,
            row_count,
            null_count,
            min,
            max,
        }
    }

    pub fn non_null_count(&self) -> usize {
        self.row_count - self.null_count
    }

    /// Integer range of the column widened to `i64`.
    pub fn integer_range(&self) -> Option<(i64, i64)> {
        Some((self.min?.as_i64()?, self.max?.as_i64()?))
    }
}

#[cfg(test)]
mod tests {
    use super::ColumnAnalysisResult;
    use crate::column::{ColumnType, PrimitiveColumn, PrimitiveValue};

    #[test]
    fn test_analyze() {
        let column = PrimitiveColumn::from_integers("c", [Some(5i64), None, Some(-7), Some(12), None]);
        let analysis = ColumnAnalysisResult::analyze(&column);
        assert_eq!(analysis.column_type, ColumnType::Long);
        assert_eq!(analysis.row_count, 5);
        assert_eq!(analysis.null_count, 2);
        assert_eq!(analysis.non_null_count(), 3);
        assert_eq!(analysis.min, Some(PrimitiveValue::Long(-7)));
        assert_eq!(analysis.max, Some(PrimitiveValue::Long(12)));
        assert_eq!(analysis.integer_range(), Some((-7, 12)));
    }

    #[test]
    fn test_analyze_all_null() {
        let column = PrimitiveColumn::from_integers::<i32, _>("c", [None, None]);
        let analysis = ColumnAnalysisResult::analyze(&column);
        assert_eq!(analysis.null_count, 2);
        assert_eq!(analysis.min, None);
        assert_eq!(analysis.integer_range(), None);
    }

    #[test]
    fn test_analyze_booleans() {
        let column = PrimitiveColumn::from_booleans("b", [Some(true), Some(true), None]);
        let analysis = ColumnAnalysisResult::analyze(&column);
        assert_eq!(analysis.min, Some(PrimitiveValue::Boolean(true)));
        assert_eq!(analysis.max, Some(PrimitiveValue::Boolean(true)));
        assert_eq!(analysis.integer_range(), None);
    }
}
