//! Interleaving of dense value sequences with a per-row null mask.
//!
//! Null rows have no slot in a packed payload. Every sparse decode path walks
//! the mask with [`for_each_row`], pulling the next dense value for each
//! non-null row.

use strata_common::error::Error;

/// Number of non-null rows described by `is_null`.
pub fn non_null_count(is_null: &[bool]) -> usize {
    is_null.iter().filter(|&&null| !null).count()
}

/// Calls `visit` once per row of `is_null`, in row order, with the row index
/// and either `None` or the next value taken from `next_value`.
pub fn for_each_row<T>(
    is_null: &[bool],
    mut next_value: impl FnMut() -> strata_common::Result<T>,
    mut visit: impl FnMut(usize, Option<T>) -> strata_common::Result<()>,
) -> strata_common::Result<()> {
    for (index, &null) in is_null.iter().enumerate() {
        let value = if null { None } else { Some(next_value()?) };
        visit(index, value)?;
    }
    Ok(())
}

/// Collects one entry per row of `is_null`, with nulls left unset.
pub fn merge_rows<T>(
    is_null: &[bool],
    next_value: impl FnMut() -> strata_common::Result<T>,
) -> strata_common::Result<Vec<Option<T>>> {
    let mut rows = Vec::with_capacity(is_null.len());
    for_each_row(is_null, next_value, |_, value| {
        rows.push(value);
        Ok(())
    })?;
    Ok(rows)
}

/// Turns an iterator over dense values into a `next_value` source that fails
/// once the values run out.
pub fn dense_source<T>(
    element: &'static str,
    values: impl IntoIterator<Item = T>,
) -> impl FnMut() -> strata_common::Result<T> {
    let mut values = values.into_iter();
    move || {
        values
            .next()
            .ok_or_else(|| Error::corrupt_data(element, "fewer values than non-null rows"))
    }
}

#[cfg(test)]
mod tests {
    use super::{dense_source, for_each_row, merge_rows, non_null_count};

    #[test]
    fn test_merge_rows() {
        let is_null = [true, false, false, true, false];
        assert_eq!(non_null_count(&is_null), 3);
        let rows = merge_rows(&is_null, dense_source("values", [10, 20, 30])).unwrap();
        assert_eq!(rows, vec![None, Some(10), Some(20), None, Some(30)]);

        assert_eq!(merge_rows::<u8>(&[], dense_source("values", [])).unwrap(), vec![]);
        assert_eq!(
            merge_rows(&[true, true], dense_source("values", [1])).unwrap(),
            vec![None, None]
        );
    }

    #[test]
    fn test_short_dense_sequence() {
        let err = merge_rows(&[false, true, false], dense_source("flags", [true])).unwrap_err();
        assert!(err.is_corrupt_data());
    }

    #[test]
    fn test_visit_order_and_errors() {
        let mut seen = vec![];
        for_each_row(&[false, true, false], dense_source("values", ['a', 'b']), |index, value| {
            seen.push((index, value));
            Ok(())
        })
        .unwrap();
        assert_eq!(seen, vec![(0, Some('a')), (1, None), (2, Some('b'))]);

        let mut visited = 0;
        let err = for_each_row(&[true; 4], dense_source("values", [0u8]), |index, _| {
            visited += 1;
            if index == 1 {
                return Err(strata_common::error::Error::invalid_arg("index", "stop"));
            }
            Ok(())
        })
        .unwrap_err();
        assert!(!err.is_corrupt_data());
        assert_eq!(visited, 2);
    }
}
