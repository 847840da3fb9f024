use crate::column::PrimitiveValue;
use std::collections::BTreeMap;
use strata_common::error::Error;

/// Node of the block-index tree receiving per-column range summaries.
pub trait BlockIndexNode {
    /// Records `[min, max]` as the bound of the column at `spread_index`.
    fn set_bound(
        &mut self,
        spread_index: usize,
        min: PrimitiveValue,
        max: PrimitiveValue,
    ) -> strata_common::Result<()>;
}

/// In-memory block index keeping one `[min, max]` range per column position.
///
/// Bounds pushed repeatedly for the same position are merged into their
/// union. Positions without a bound are never pruned.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct RangeBlockIndexNode {
    bounds: BTreeMap<usize, (PrimitiveValue, PrimitiveValue)>,
}

impl RangeBlockIndexNode {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bound(&self, spread_index: usize) -> Option<(PrimitiveValue, PrimitiveValue)> {
        self.bounds.get(&spread_index).copied()
    }

    /// Returns `false` only when the column at `spread_index` has a bound that
    /// excludes `value`.
    pub fn may_contain(&self, spread_index: usize, value: PrimitiveValue) -> bool {
        match self.bounds.get(&spread_index) {
            Some((min, max)) if min.column_type() == value.column_type() => {
                *min <= value && value <= *max
            }
            _ => true,
        }
    }
}

impl BlockIndexNode for RangeBlockIndexNode {
    fn set_bound(
        &mut self,
        spread_index: usize,
        min: PrimitiveValue,
        max: PrimitiveValue,
    ) -> strata_common::Result<()> {
        if min.column_type() != max.column_type() || min > max {
            return Err(Error::invalid_arg(
                "bound",
                format!("[{min:?}, {max:?}] is not a valid range"),
            ));
        }
        match self.bounds.get_mut(&spread_index) {
            Some((current_min, current_max)) => {
                if current_min.column_type() != min.column_type() {
                    return Err(Error::invalid_arg(
                        "bound",
                        format!(
                            "{:?} bound for a {:?} column",
                            min.column_type(),
                            current_min.column_type()
                        ),
                    ));
                }
                if min < *current_min {
                    *current_min = min;
                }
                if max > *current_max {
                    *current_max = max;
                }
            }
            None => {
                self.bounds.insert(spread_index, (min, max));
            }
        }
        Ok(())
    }
}
