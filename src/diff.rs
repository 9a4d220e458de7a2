//! Preview Diff
//!
//! Aligns the original preview with the transformed preview strictly by row
//! index and classifies every cell. There is no row identity on the wire, so
//! a reordered or split row shows up as changed cells, and a transformed
//! preview that is merely shorter is indistinguishable from dropped rows.

use crate::types::{cell_text, ColumnProfile, Row};

/// Classification of one cell of the original preview
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellStatus {
    Unchanged,
    Changed,
    /// The transformed preview has no row at this index
    RemovedInTransformed,
}

/// Cell counts per status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DiffSummary {
    pub unchanged: usize,
    pub changed: usize,
    pub removed_rows: usize,
}

/// Row-major grid of cell statuses, one column per profile column
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DiffGrid {
    rows: Vec<Vec<CellStatus>>,
}

impl DiffGrid {
    pub fn rows(&self) -> &[Vec<CellStatus>] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn status(&self, row: usize, column: usize) -> Option<CellStatus> {
        self.rows.get(row).and_then(|r| r.get(column)).copied()
    }

    /// Whether the row at `row` has no transformed counterpart
    pub fn is_removed(&self, row: usize) -> bool {
        self.rows
            .get(row)
            .map(|r| !r.is_empty() && r.iter().all(|s| *s == CellStatus::RemovedInTransformed))
            .unwrap_or(false)
    }

    pub fn summary(&self) -> DiffSummary {
        let mut summary = DiffSummary::default();
        for (index, row) in self.rows.iter().enumerate() {
            if self.is_removed(index) {
                summary.removed_rows += 1;
                continue;
            }
            for status in row {
                match status {
                    CellStatus::Unchanged => summary.unchanged += 1,
                    CellStatus::Changed => summary.changed += 1,
                    CellStatus::RemovedInTransformed => {}
                }
            }
        }
        summary
    }
}

/// Positional diff of two previews.
///
/// Returns `None` when there is no transformed preview yet. Otherwise one row
/// per index up to the longer preview. Cells compare by their text, with
/// `Null` and missing values reading as the empty string; an index past the
/// original preview compares against empty cells.
pub fn diff(original: &[Row], transformed: Option<&[Row]>, columns: &[ColumnProfile]) -> Option<DiffGrid> {
    let transformed = transformed?;
    let row_count = original.len().max(transformed.len());

    let rows = (0..row_count)
        .map(|i| {
            let Some(after) = transformed.get(i) else {
                return vec![CellStatus::RemovedInTransformed; columns.len()];
            };
            let before = original.get(i);
            columns
                .iter()
                .map(|column| {
                    if cell_text(before, &column.name) == cell_text(Some(after), &column.name) {
                        CellStatus::Unchanged
                    } else {
                        CellStatus::Changed
                    }
                })
                .collect()
        })
        .collect();

    Some(DiffGrid { rows })
}
