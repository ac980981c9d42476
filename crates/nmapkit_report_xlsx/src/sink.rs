//! Tabular sink contract and the report emitter that drives it.

use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::conf::N_NROWS_EXCEL_MAX;
use crate::layout::derive_layout_strategy;
use crate::spec::{EnumCellStyle, ReportError, SpecHost, SpecReportOptions, SpecXlsxReport};
use crate::util::{clamp_cell_text, is_host_skipped, validate_width_column};

/// Cell-level writer the report is emitted into.
///
/// Rows and columns are zero-based; ranges are inclusive on both ends.
pub trait TabularSink {
    /// Set the text of one cell.
    fn set_cell_value(
        &mut self,
        col_idx: usize,
        row_idx: usize,
        value: &str,
    ) -> Result<(), ReportError>;

    /// Apply a named style to a cell range.
    fn apply_style(
        &mut self,
        col_first: usize,
        row_first: usize,
        col_last: usize,
        row_last: usize,
        style: EnumCellStyle,
    ) -> Result<(), ReportError>;

    /// Set display width for a column range.
    fn set_column_width(
        &mut self,
        col_first: usize,
        col_last: usize,
        width: f64,
    ) -> Result<(), ReportError>;

    /// Merge a rectangular range; the top-left cell's text is kept.
    fn merge_range(
        &mut self,
        col_first: usize,
        row_first: usize,
        col_last: usize,
        row_last: usize,
    ) -> Result<(), ReportError>;

    /// Persist the whole sheet to `path`.
    fn save(&mut self, path: &Path) -> Result<(), ReportError>;
}

/// One recorded sink call.
#[derive(Debug, Clone, PartialEq)]
pub enum EnumSinkOp {
    /// See [`TabularSink::set_cell_value`].
    SetCellValue {
        col_idx: usize,
        row_idx: usize,
        value: String,
    },
    /// See [`TabularSink::apply_style`].
    ApplyStyle {
        col_first: usize,
        row_first: usize,
        col_last: usize,
        row_last: usize,
        style: EnumCellStyle,
    },
    /// See [`TabularSink::set_column_width`].
    SetColumnWidth {
        col_first: usize,
        col_last: usize,
        width: f64,
    },
    /// See [`TabularSink::merge_range`].
    MergeRange {
        col_first: usize,
        row_first: usize,
        col_last: usize,
        row_last: usize,
    },
    /// See [`TabularSink::save`].
    Save { path: PathBuf },
}

/// Sink that only records the calls it receives.
#[derive(Debug, Default, Clone)]
pub struct MemorySink {
    /// Calls in arrival order.
    pub ops: Vec<EnumSinkOp>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last text set for `(col_idx, row_idx)`.
    pub fn cell_value(&self, col_idx: usize, row_idx: usize) -> Option<&str> {
        self.ops.iter().rev().find_map(|op| match op {
            EnumSinkOp::SetCellValue {
                col_idx: c,
                row_idx: r,
                value,
            } if *c == col_idx && *r == row_idx => Some(value.as_str()),
            _ => None,
        })
    }

    /// Recorded merges as `(col_first, row_first, col_last, row_last)`.
    pub fn merges(&self) -> Vec<(usize, usize, usize, usize)> {
        self.ops
            .iter()
            .filter_map(|op| match op {
                EnumSinkOp::MergeRange {
                    col_first,
                    row_first,
                    col_last,
                    row_last,
                } => Some((*col_first, *row_first, *col_last, *row_last)),
                _ => None,
            })
            .collect()
    }
}

impl TabularSink for MemorySink {
    fn set_cell_value(
        &mut self,
        col_idx: usize,
        row_idx: usize,
        value: &str,
    ) -> Result<(), ReportError> {
        self.ops.push(EnumSinkOp::SetCellValue {
            col_idx,
            row_idx,
            value: value.to_string(),
        });
        Ok(())
    }

    fn apply_style(
        &mut self,
        col_first: usize,
        row_first: usize,
        col_last: usize,
        row_last: usize,
        style: EnumCellStyle,
    ) -> Result<(), ReportError> {
        self.ops.push(EnumSinkOp::ApplyStyle {
            col_first,
            row_first,
            col_last,
            row_last,
            style,
        });
        Ok(())
    }

    fn set_column_width(
        &mut self,
        col_first: usize,
        col_last: usize,
        width: f64,
    ) -> Result<(), ReportError> {
        self.ops.push(EnumSinkOp::SetColumnWidth {
            col_first,
            col_last,
            width,
        });
        Ok(())
    }

    fn merge_range(
        &mut self,
        col_first: usize,
        row_first: usize,
        col_last: usize,
        row_last: usize,
    ) -> Result<(), ReportError> {
        self.ops.push(EnumSinkOp::MergeRange {
            col_first,
            row_first,
            col_last,
            row_last,
        });
        Ok(())
    }

    fn save(&mut self, path: &Path) -> Result<(), ReportError> {
        self.ops.push(EnumSinkOp::Save {
            path: path.to_path_buf(),
        });
        Ok(())
    }
}

/// Lay out `hosts` with `options.layout` and emit header, widths, rows and merges.
///
/// The sink is not saved here; callers save once after the emit succeeds.
pub fn emit_report<S: TabularSink + ?Sized>(
    sink: &mut S,
    hosts: &[SpecHost],
    options: &SpecReportOptions,
) -> Result<SpecXlsxReport, ReportError> {
    validate_width_column(options.width_column)?;

    let strategy = derive_layout_strategy(options.layout);
    let l_columns = strategy.columns();
    let l_groups = strategy.build_row_groups(hosts, options.if_skip_down_hosts);

    let n_rows_body: usize = l_groups.iter().map(|group| group.rows.len()).sum();
    let n_rows_total = n_rows_body + 1;
    if n_rows_total > N_NROWS_EXCEL_MAX {
        return Err(ReportError::RowLimitExceeded { rows: n_rows_total });
    }

    let mut report = SpecXlsxReport {
        layout: options.layout,
        cnt_hosts: hosts.len() as u64,
        cnt_hosts_skipped: hosts
            .iter()
            .filter(|host| is_host_skipped(host, options.if_skip_down_hosts))
            .count() as u64,
        cnt_groups: l_groups.len() as u64,
        cnt_rows: n_rows_body as u64,
        ..Default::default()
    };

    for (n_idx_col, column) in l_columns.iter().enumerate() {
        sink.set_cell_value(n_idx_col, 0, &column.header)?;
        sink.apply_style(n_idx_col, 0, n_idx_col, 0, column.style)?;
    }
    if !l_columns.is_empty() {
        sink.set_column_width(0, l_columns.len() - 1, options.width_column)?;
    }

    let mut n_row_cursor = 1usize;
    for group in &l_groups {
        if group.rows.is_empty() {
            continue;
        }
        debug!(key = %group.key, rows = group.rows.len(), row = n_row_cursor, "emit group");

        for (n_idx_row, row_values) in group.rows.iter().enumerate() {
            for (n_idx_col, value) in row_values.iter().enumerate() {
                let (c_value, if_cut) = clamp_cell_text(value);
                if if_cut {
                    let c_msg = format!(
                        "Cell text truncated to Excel limit at row {}, column {} (group {}).",
                        n_row_cursor + n_idx_row,
                        n_idx_col,
                        group.key
                    );
                    warn!("{c_msg}");
                    report.warn(c_msg);
                }
                sink.set_cell_value(n_idx_col, n_row_cursor + n_idx_row, &c_value)?;
            }
        }

        let n_row_last = n_row_cursor + group.rows.len() - 1;
        for (n_idx_col, column) in l_columns.iter().enumerate() {
            sink.apply_style(n_idx_col, n_row_cursor, n_idx_col, n_row_last, column.style)?;
        }

        for span in &group.merges {
            sink.merge_range(
                span.col_idx,
                n_row_cursor + span.row_idx_start,
                span.col_idx,
                n_row_cursor + span.row_idx_end,
            )?;
            report.cnt_merges += 1;
        }

        n_row_cursor = n_row_last + 1;
    }

    Ok(report)
}
