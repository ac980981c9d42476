//! Report constants and default preset factories.

use std::collections::BTreeMap;

use crate::spec::{EnumCellStyle, EnumLayoutMode, SpecCellFormat, SpecReportColumn};

/// Excel worksheet maximum row count.
pub const N_NROWS_EXCEL_MAX: usize = 1_048_576;
/// Excel sheet name maximum length.
pub const N_LEN_EXCEL_SHEET_NAME_MAX: usize = 31;
/// Excel cell text maximum length (characters).
pub const N_LEN_EXCEL_CELL_TEXT_MAX: usize = 32_767;
/// Excel column width upper bound (character units).
pub const N_WIDTH_EXCEL_COLUMN_MAX: f64 = 255.0;
/// Characters not allowed in sheet names.
pub const TUP_EXCEL_ILLEGAL: [&str; 7] = ["*", ":", "?", "/", "\\", "[", "]"];

/// Default output workbook path.
pub const C_FILE_OUT_DEFAULT: &str = "nmap-output.xlsx";
/// Default worksheet name.
pub const C_SHEET_NAME_DEFAULT: &str = "Sheet1";
/// Default display width shared by every report column.
pub const N_WIDTH_COLUMN_DEFAULT: f64 = 20.0;

/// Separator between a host's addresses in the grouping key.
pub const C_SEP_ADDRESSES: &str = "/";
/// Separator between a host's hostnames.
pub const C_SEP_HOSTNAMES: &str = "/";
/// Separator between stacked values inside one cell.
pub const C_SEP_CELL_LINES: &str = "\n";
/// Liveness state that marks a host as reachable.
pub const C_HOST_STATE_UP: &str = "up";

/// Header labels and column styles for one layout.
pub fn derive_layout_columns(mode: EnumLayoutMode) -> Vec<SpecReportColumn> {
    let l_columns: &[(&str, EnumCellStyle)] = match mode {
        EnumLayoutMode::GroupedByIpDeduped => &[
            ("Domain", EnumCellStyle::CenterWrap),
            ("IP", EnumCellStyle::Center),
            ("Services", EnumCellStyle::CenterWrap),
        ],
        EnumLayoutMode::PerHostMerged => &[
            ("Host", EnumCellStyle::CenterWrap),
            ("IP", EnumCellStyle::Center),
            ("Services", EnumCellStyle::CenterWrap),
        ],
        EnumLayoutMode::GroupedByIpWithBanner => &[
            ("Asset", EnumCellStyle::CenterWrap),
            ("IP", EnumCellStyle::Center),
            ("Port-Service", EnumCellStyle::CenterWrap),
            ("Banner", EnumCellStyle::CenterWrap),
        ],
    };

    l_columns
        .iter()
        .map(|(c_header, style)| SpecReportColumn {
            header: (*c_header).to_string(),
            style: *style,
        })
        .collect()
}

/// Build default named cell formats used by [`crate::writer::XlsxWriter`].
pub fn derive_default_cell_styles() -> BTreeMap<EnumCellStyle, SpecCellFormat> {
    let cfg_base_fmt_spec = SpecCellFormat {
        align: Some("center".to_string()),
        valign: Some("vcenter".to_string()),
        ..Default::default()
    };

    let mut dict_fmt = BTreeMap::new();
    dict_fmt.insert(EnumCellStyle::Center, cfg_base_fmt_spec.clone());
    dict_fmt.insert(
        EnumCellStyle::CenterWrap,
        cfg_base_fmt_spec.with_(SpecCellFormat {
            text_wrap: Some(true),
            ..Default::default()
        }),
    );

    dict_fmt
}
