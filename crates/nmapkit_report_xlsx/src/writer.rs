//! XLSX sink backed by `rust_xlsxwriter`, plus the report entry points.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use rust_xlsxwriter::{Format, FormatAlign, FormatBorder, Workbook};
use tracing::{info, warn};

use crate::conf::derive_default_cell_styles;
use crate::sink::{TabularSink, emit_report};
use crate::spec::{
    EnumCellStyle, ReportError, SpecCellFormat, SpecHost, SpecReportOptions, SpecXlsxReport,
};
use crate::util::{cast_col_num, cast_row_num, derive_merge_tracker, sanitize_sheet_name};

/// Single-sheet workbook sink.
///
/// Cell values, styles, widths and merges are buffered in memory and turned
/// into a workbook by [`TabularSink::save`], so styles can be applied to
/// ranges in any order relative to the values.
pub struct XlsxWriter {
    sheet_name: String,
    dict_styles: BTreeMap<EnumCellStyle, SpecCellFormat>,
    dict_cell_values: BTreeMap<(usize, usize), String>,
    dict_cell_styles: BTreeMap<(usize, usize), EnumCellStyle>,
    dict_col_widths: BTreeMap<usize, f64>,
    l_merges: Vec<(usize, usize, usize, usize)>,
    path_saved: Option<PathBuf>,
}

impl XlsxWriter {
    /// Create a sink writing one sheet named `sheet_name` with the given named styles.
    pub fn new(sheet_name: &str, dict_styles: BTreeMap<EnumCellStyle, SpecCellFormat>) -> Self {
        Self {
            sheet_name: sheet_name.to_string(),
            dict_styles,
            dict_cell_values: BTreeMap::new(),
            dict_cell_styles: BTreeMap::new(),
            dict_col_widths: BTreeMap::new(),
            l_merges: Vec::new(),
            path_saved: None,
        }
    }

    /// Worksheet name.
    pub fn sheet_name(&self) -> &str {
        &self.sheet_name
    }

    /// Path of the saved workbook, once saved.
    pub fn path_saved(&self) -> Option<&Path> {
        self.path_saved.as_deref()
    }

    /// Cells written one by one on save, as `(row, col)`; cells hidden under a merge are left out.
    pub fn derive_plain_cells(&self) -> Vec<(usize, usize)> {
        let set_cells_covered = derive_merge_tracker(&self.l_merges);
        let set_cells: BTreeSet<(usize, usize)> = self
            .dict_cell_values
            .keys()
            .chain(self.dict_cell_styles.keys())
            .copied()
            .collect();

        set_cells
            .into_iter()
            .filter(|key| !set_cells_covered.contains(key))
            .collect()
    }

    /// Merge ranges `(col_first, row_first, col_last, row_last)` with their anchor text.
    pub fn derive_merge_cells(&self) -> Vec<((usize, usize, usize, usize), &str)> {
        self.l_merges
            .iter()
            .map(|range| {
                let (col_first, row_first, _, _) = *range;
                let c_text = self
                    .dict_cell_values
                    .get(&(row_first, col_first))
                    .map(String::as_str)
                    .unwrap_or_default();
                (*range, c_text)
            })
            .collect()
    }

    fn ensure_open(&self) -> Result<(), ReportError> {
        if self.path_saved.is_some() {
            return Err(ReportError::Closed);
        }
        Ok(())
    }
}

impl TabularSink for XlsxWriter {
    fn set_cell_value(
        &mut self,
        col_idx: usize,
        row_idx: usize,
        value: &str,
    ) -> Result<(), ReportError> {
        self.ensure_open()?;
        cast_row_num(row_idx)?;
        cast_col_num(col_idx)?;
        self.dict_cell_values.insert((row_idx, col_idx), value.to_string());
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
        self.ensure_open()?;
        for row_idx in row_first..=row_last {
            for col_idx in col_first..=col_last {
                self.dict_cell_styles.insert((row_idx, col_idx), style);
            }
        }
        Ok(())
    }

    fn set_column_width(
        &mut self,
        col_first: usize,
        col_last: usize,
        width: f64,
    ) -> Result<(), ReportError> {
        self.ensure_open()?;
        for col_idx in col_first..=col_last {
            self.dict_col_widths.insert(col_idx, width);
        }
        Ok(())
    }

    fn merge_range(
        &mut self,
        col_first: usize,
        row_first: usize,
        col_last: usize,
        row_last: usize,
    ) -> Result<(), ReportError> {
        self.ensure_open()?;
        if row_last < row_first || col_last < col_first {
            return Err(ReportError::InvalidOptions(format!(
                "Merge range end precedes start: ({col_first}, {row_first})..({col_last}, {row_last})."
            )));
        }
        if row_last == row_first && col_last == col_first {
            return Err(ReportError::InvalidOptions(format!(
                "Single-cell merge at ({col_first}, {row_first}) is not allowed."
            )));
        }
        self.l_merges.push((col_first, row_first, col_last, row_last));
        Ok(())
    }

    /// Build the workbook and write it to `path`. Idempotent once saved.
    fn save(&mut self, path: &Path) -> Result<(), ReportError> {
        if self.path_saved.is_some() {
            return Ok(());
        }

        let dict_formats: BTreeMap<EnumCellStyle, Format> = self
            .dict_styles
            .iter()
            .map(|(style, spec)| (*style, derive_rust_xlsx_format(spec)))
            .collect();
        let fmt_default = Format::new();
        let derive_format = |key: &(usize, usize)| {
            self.dict_cell_styles
                .get(key)
                .and_then(|style| dict_formats.get(style))
                .unwrap_or(&fmt_default)
        };

        let mut workbook = Workbook::new();
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(&self.sheet_name)?;

        for (col_idx, width) in &self.dict_col_widths {
            worksheet.set_column_width(cast_col_num(*col_idx)?, *width)?;
        }

        for (row_idx, col_idx) in self.derive_plain_cells() {
            let key = (row_idx, col_idx);
            let format = derive_format(&key);
            match self.dict_cell_values.get(&key) {
                Some(value) if !value.is_empty() => {
                    worksheet.write_string_with_format(
                        cast_row_num(row_idx)?,
                        cast_col_num(col_idx)?,
                        value,
                        format,
                    )?;
                }
                _ => {
                    worksheet.write_blank(cast_row_num(row_idx)?, cast_col_num(col_idx)?, format)?;
                }
            }
        }

        for ((col_first, row_first, col_last, row_last), c_text) in self.derive_merge_cells() {
            worksheet.merge_range(
                cast_row_num(row_first)?,
                cast_col_num(col_first)?,
                cast_row_num(row_last)?,
                cast_col_num(col_last)?,
                c_text,
                derive_format(&(row_first, col_first)),
            )?;
        }

        workbook.save(path)?;
        self.path_saved = Some(path.to_path_buf());
        Ok(())
    }
}

/// Lay out `hosts` per `options` and save the workbook to `options.file_out`.
pub fn write_report(
    hosts: &[SpecHost],
    options: &SpecReportOptions,
) -> Result<SpecXlsxReport, ReportError> {
    let c_sheet_name = sanitize_sheet_name(&options.sheet_name, "_");
    let dict_styles = derive_report_cell_styles(&options.base_format_patch);

    let mut writer = XlsxWriter::new(&c_sheet_name, dict_styles);
    let mut report = emit_report(&mut writer, hosts, options)?;

    if c_sheet_name != options.sheet_name {
        let c_msg = format!(
            "Sheet name {:?} sanitized to {c_sheet_name:?}.",
            options.sheet_name
        );
        warn!("{c_msg}");
        report.warn(c_msg);
    }

    writer.save(&options.file_out)?;

    report.file_out = options.file_out.to_string_lossy().to_string();
    report.sheet_name = writer.sheet_name().to_string();
    info!(file_out = %report.file_out, layout = %report.layout, "{report}");
    Ok(report)
}

/// Decode a JSON array of hosts, then [`write_report`].
pub fn write_report_from_json_bytes(
    v_json_hosts: &[u8],
    options: &SpecReportOptions,
) -> Result<SpecXlsxReport, ReportError> {
    let l_hosts: Vec<SpecHost> = serde_json::from_slice(v_json_hosts)?;
    write_report(&l_hosts, options)
}

/// Default named styles with `patch` overlaid on each.
pub fn derive_report_cell_styles(
    patch: &SpecCellFormat,
) -> BTreeMap<EnumCellStyle, SpecCellFormat> {
    derive_default_cell_styles()
        .into_iter()
        .map(|(style, spec)| (style, spec.merge(patch)))
        .collect()
}

fn derive_rust_xlsx_format(spec: &SpecCellFormat) -> Format {
    let mut format = Format::new();

    if let Some(val) = &spec.font_name {
        format = format.set_font_name(val.clone());
    }
    if let Some(val) = spec.font_size {
        format = format.set_font_size(val as f64);
    }
    if spec.bold.unwrap_or(false) {
        format = format.set_bold();
    }

    if let Some(val) = &spec.align
        && let Some(align) = derive_format_align(val)
    {
        format = format.set_align(align);
    }
    if let Some(val) = &spec.valign
        && let Some(align) = derive_format_align(val)
    {
        format = format.set_align(align);
    }

    if let Some(val) = &spec.bg_color {
        format = format.set_background_color(val.as_str());
    }
    if let Some(val) = spec.border {
        format = format.set_border(derive_format_border(val));
    }
    if spec.text_wrap.unwrap_or(false) {
        format = format.set_text_wrap();
    }

    format
}

fn derive_format_border(border: i64) -> FormatBorder {
    match border {
        1 => FormatBorder::Thin,
        2 => FormatBorder::Medium,
        3 => FormatBorder::Dashed,
        4 => FormatBorder::Dotted,
        5 => FormatBorder::Thick,
        6 => FormatBorder::Double,
        7 => FormatBorder::Hair,
        _ => FormatBorder::None,
    }
}

fn derive_format_align(align: &str) -> Option<FormatAlign> {
    let value = align.trim().to_ascii_lowercase();
    match value.as_str() {
        "general" => Some(FormatAlign::General),
        "left" => Some(FormatAlign::Left),
        "center" => Some(FormatAlign::Center),
        "right" => Some(FormatAlign::Right),
        "justify" => Some(FormatAlign::Justify),
        "top" => Some(FormatAlign::Top),
        "bottom" => Some(FormatAlign::Bottom),
        "vcenter" | "vertical_center" => Some(FormatAlign::VerticalCenter),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn writer() -> XlsxWriter {
        XlsxWriter::new("Sheet1", derive_default_cell_styles())
    }

    #[test]
    fn test_merge_range_rejects_single_cell_and_reversed_ranges() {
        let mut sink = writer();
        assert!(sink.merge_range(0, 1, 0, 1).is_err());
        assert!(sink.merge_range(0, 3, 0, 1).is_err());
        assert!(sink.merge_range(0, 1, 0, 2).is_ok());
    }

    #[test]
    fn test_writes_after_save_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.xlsx");
        let mut sink = writer();

        sink.set_cell_value(0, 0, "Domain").unwrap();
        sink.apply_style(0, 0, 0, 0, EnumCellStyle::CenterWrap).unwrap();
        sink.save(&path).unwrap();

        assert!(path.exists());
        assert_eq!(sink.path_saved(), Some(path.as_path()));
        assert!(matches!(
            sink.set_cell_value(0, 1, "x"),
            Err(ReportError::Closed)
        ));
        assert!(sink.save(&path).is_ok());
    }

    #[test]
    fn test_save_reports_invalid_sheet_name_as_xlsx_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = XlsxWriter::new("bad[name]", derive_default_cell_styles());

        assert!(matches!(
            sink.save(&dir.path().join("out.xlsx")),
            Err(ReportError::Xlsx(_))
        ));
    }

    #[test]
    fn test_save_plan_skips_cells_under_merge_and_keeps_anchor_text() {
        let mut sink = writer();
        sink.set_cell_value(0, 1, "web").unwrap();
        sink.set_cell_value(0, 2, "").unwrap();
        sink.set_cell_value(0, 3, "").unwrap();
        sink.set_cell_value(1, 1, "80/tcp http").unwrap();
        sink.set_cell_value(1, 2, "443/tcp https").unwrap();
        sink.apply_style(0, 1, 1, 3, EnumCellStyle::CenterWrap).unwrap();
        sink.merge_range(0, 1, 0, 3).unwrap();

        assert_eq!(sink.derive_plain_cells(), vec![(1, 0), (1, 1), (2, 1), (3, 1)]);
        assert_eq!(sink.derive_merge_cells(), vec![((0, 1, 0, 3), "web")]);
    }

    #[test]
    fn test_report_cell_styles_overlay_patch_on_presets() {
        let patch = SpecCellFormat {
            border: Some(1),
            bold: Some(true),
            ..Default::default()
        };

        let dict_styles = derive_report_cell_styles(&patch);
        let spec_wrap = &dict_styles[&EnumCellStyle::CenterWrap];

        assert_eq!(spec_wrap.border, Some(1));
        assert_eq!(spec_wrap.bold, Some(true));
        assert_eq!(spec_wrap.text_wrap, Some(true));
        assert_eq!(spec_wrap.align.as_deref(), Some("center"));
        assert_eq!(dict_styles[&EnumCellStyle::Center].border, Some(1));
        assert_eq!(
            derive_report_cell_styles(&SpecCellFormat::default()),
            derive_default_cell_styles()
        );
    }

    #[test]
    fn test_derive_rust_xlsx_format_maps_every_field() {
        let spec = SpecCellFormat {
            font_name: Some("Arial".to_string()),
            font_size: Some(12),
            bold: Some(true),
            align: Some("left".to_string()),
            valign: Some("top".to_string()),
            border: Some(2),
            text_wrap: Some(true),
            bg_color: Some("#FFFF00".to_string()),
        };

        let expected = Format::new()
            .set_font_name("Arial")
            .set_font_size(12)
            .set_bold()
            .set_align(FormatAlign::Left)
            .set_align(FormatAlign::Top)
            .set_background_color("#FFFF00")
            .set_border(FormatBorder::Medium)
            .set_text_wrap();

        assert_eq!(derive_rust_xlsx_format(&spec), expected);
        assert_eq!(derive_rust_xlsx_format(&SpecCellFormat::default()), Format::new());
        assert_eq!(derive_format_border(7), FormatBorder::Hair);
        assert_eq!(derive_format_border(9), FormatBorder::None);
    }

    #[test]
    fn test_derive_format_align_aliases() {
        assert_eq!(derive_format_align(" Center "), Some(FormatAlign::Center));
        assert_eq!(
            derive_format_align("vertical_center"),
            Some(FormatAlign::VerticalCenter)
        );
        assert_eq!(derive_format_align("diagonal"), None);
    }
}
