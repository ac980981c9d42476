//! Shared report models.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use rust_xlsxwriter::XlsxError;
use serde::{Deserialize, Deserializer, Serialize, de};
use thiserror::Error;

use crate::conf::{
    C_FILE_OUT_DEFAULT, C_HOST_STATE_UP, C_SHEET_NAME_DEFAULT, N_WIDTH_COLUMN_DEFAULT,
};

////////////////////////////////////////////////////////////////////////////////
// #region CellFormat

/// Cell format options; unset fields keep the writer default.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SpecCellFormat {
    /// Font family name.
    pub font_name: Option<String>,
    /// Font size in points.
    pub font_size: Option<i64>,
    /// Bold style.
    pub bold: Option<bool>,

    /// Horizontal alignment.
    pub align: Option<String>,
    /// Vertical alignment.
    pub valign: Option<String>,
    /// Border style for all sides.
    pub border: Option<i64>,
    /// Text wrap.
    pub text_wrap: Option<bool>,

    /// Background fill color.
    pub bg_color: Option<String>,
}

impl SpecCellFormat {
    /// Return a new format by overlaying `patch` onto `self`.
    pub fn with_(&self, patch: SpecCellFormat) -> SpecCellFormat {
        self.merge(&patch)
    }

    /// Merge two formats with right-side non-`None` overwrite semantics.
    pub fn merge(&self, other: &SpecCellFormat) -> SpecCellFormat {
        SpecCellFormat {
            font_name: other.font_name.clone().or_else(|| self.font_name.clone()),
            font_size: other.font_size.or(self.font_size),
            bold: other.bold.or(self.bold),
            align: other.align.clone().or_else(|| self.align.clone()),
            valign: other.valign.clone().or_else(|| self.valign.clone()),
            border: other.border.or(self.border),
            text_wrap: other.text_wrap.or(self.text_wrap),
            bg_color: other.bg_color.clone().or_else(|| self.bg_color.clone()),
        }
    }
}

/// Named cell style applied by the sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum EnumCellStyle {
    /// Centered horizontally and vertically.
    Center,
    /// Centered with text wrapping for multi-line cells.
    CenterWrap,
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region ScanInputModel

/// One scanned host as handed over by the scan-result parser.
///
/// Every field defaults when absent so partially filled records never fail
/// to decode.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SpecHost {
    /// Reverse/user hostnames.
    pub hostnames: Vec<String>,
    /// IPv4/IPv6/MAC addresses.
    pub addresses: Vec<String>,
    /// Liveness state (`up`, `down`, `unknown`, ...).
    pub state: String,
    /// Observed ports in scan order.
    pub ports: Vec<SpecPort>,
}

impl SpecHost {
    /// Whether the host reported state `up`.
    pub fn is_up(&self) -> bool {
        self.state == C_HOST_STATE_UP
    }

    /// Addresses joined with `sep`.
    pub fn joined_addresses(&self, sep: &str) -> String {
        self.addresses.join(sep)
    }

    /// Hostnames joined with `sep`.
    pub fn joined_hostnames(&self, sep: &str) -> String {
        self.hostnames.join(sep)
    }
}

/// One observed port and its service fingerprint.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SpecPort {
    /// Port number.
    pub port_id: u32,
    /// Transport protocol (`tcp`, `udp`, `sctp`).
    pub protocol: String,
    /// Detected service name.
    pub service_name: String,
    /// Product name from version detection.
    pub product: String,
    /// Product version.
    pub version: String,
    /// Free-form extra info.
    pub extra_info: String,
}

impl SpecPort {
    /// `"{port}/{protocol} {service}"`.
    pub fn format_service(&self) -> String {
        format!("{}/{} {}", self.port_id, self.protocol, self.service_name)
    }

    /// `"{product} {version} {extra_info}"`; empty parts leave their spaces.
    pub fn format_banner(&self) -> String {
        format!("{} {} {}", self.product, self.version, self.extra_info)
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Layout

/// Report layout selector.
///
/// Decoding goes through [`FromStr`], so JSON options and direct parsing
/// accept the same spellings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EnumLayoutMode {
    /// One row per address group, services deduplicated across hosts (default).
    #[default]
    GroupedByIpDeduped,
    /// One row per port, host and address cells merged per host.
    PerHostMerged,
    /// One row per port inside an address group, with a banner column.
    GroupedByIpWithBanner,
}

impl EnumLayoutMode {
    /// Stable snake_case identifier.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::GroupedByIpDeduped => "grouped_by_ip_deduped",
            Self::PerHostMerged => "per_host_merged",
            Self::GroupedByIpWithBanner => "grouped_by_ip_with_banner",
        }
    }
}

impl fmt::Display for EnumLayoutMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EnumLayoutMode {
    type Err = ReportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "grouped_by_ip_deduped" => Ok(Self::GroupedByIpDeduped),
            "per_host_merged" => Ok(Self::PerHostMerged),
            "grouped_by_ip_with_banner" => Ok(Self::GroupedByIpWithBanner),
            _ => Err(ReportError::InvalidOptions(format!(
                "Unknown layout: {s:?} (expected grouped_by_ip_deduped, per_host_merged \
                 or grouped_by_ip_with_banner)."
            ))),
        }
    }
}

impl<'de> Deserialize<'de> for EnumLayoutMode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let c_value = String::deserialize(deserializer)?;
        c_value.parse().map_err(de::Error::custom)
    }
}

/// Header label plus the style shared by the column's cells.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecReportColumn {
    /// Header text in row 0.
    pub header: String,
    /// Style for header and body cells.
    pub style: EnumCellStyle,
}

/// Vertical merge inside one row-group.
///
/// Rows are relative to the group's first row; both ends are inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpecMergeSpan {
    /// Column index.
    pub col_idx: usize,
    /// First row (inclusive).
    pub row_idx_start: usize,
    /// Last row (inclusive).
    pub row_idx_end: usize,
}

impl SpecMergeSpan {
    /// Number of rows covered.
    pub fn height(&self) -> usize {
        self.row_idx_end - self.row_idx_start + 1
    }
}

/// Builder output unit: rows sharing one grouping key plus their merges.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SpecRowGroup {
    /// Joined address string.
    pub key: String,
    /// Display rows, one text per column.
    pub rows: Vec<Vec<String>>,
    /// Merges to apply after the rows are written.
    pub merges: Vec<SpecMergeSpan>,
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region ReportOptions

/// Per-report options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpecReportOptions {
    /// Layout variant.
    pub layout: EnumLayoutMode,
    /// Drop ports (or whole hosts, per layout) of hosts that are not `up`.
    pub if_skip_down_hosts: bool,
    /// Output workbook path.
    pub file_out: PathBuf,
    /// Worksheet name (sanitized before use).
    pub sheet_name: String,
    /// Display width applied to every report column.
    pub width_column: f64,
    /// Patch merged into every named style.
    pub base_format_patch: SpecCellFormat,
}

impl Default for SpecReportOptions {
    fn default() -> Self {
        Self {
            layout: EnumLayoutMode::default(),
            if_skip_down_hosts: false,
            file_out: PathBuf::from(C_FILE_OUT_DEFAULT),
            sheet_name: C_SHEET_NAME_DEFAULT.to_string(),
            width_column: N_WIDTH_COLUMN_DEFAULT,
            base_format_patch: SpecCellFormat::default(),
        }
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Report

/// Summary of one report generation.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SpecXlsxReport {
    /// Output path, lossily stringified.
    pub file_out: String,
    /// Sheet name actually used.
    pub sheet_name: String,
    /// Layout used.
    pub layout: EnumLayoutMode,
    /// Input hosts.
    pub cnt_hosts: u64,
    /// Hosts skipped (or whose ports were skipped) for not being `up`.
    pub cnt_hosts_skipped: u64,
    /// Emitted row-groups.
    pub cnt_groups: u64,
    /// Emitted body rows (header excluded).
    pub cnt_rows: u64,
    /// Emitted merge ranges.
    pub cnt_merges: u64,
    /// Non-fatal warnings.
    pub warnings: Vec<String>,
}

impl SpecXlsxReport {
    /// Add a warning message.
    pub fn warn(&mut self, msg: impl AsRef<str>) {
        self.warnings.push(msg.as_ref().to_string());
    }

    /// Number of collected warnings.
    pub fn warning_count(&self) -> usize {
        self.warnings.len()
    }

    /// Machine-readable counters.
    pub fn to_dict(&self) -> BTreeMap<String, u64> {
        let mut dict_counts = BTreeMap::new();
        dict_counts.insert("cnt_hosts".to_string(), self.cnt_hosts);
        dict_counts.insert("cnt_hosts_skipped".to_string(), self.cnt_hosts_skipped);
        dict_counts.insert("cnt_groups".to_string(), self.cnt_groups);
        dict_counts.insert("cnt_rows".to_string(), self.cnt_rows);
        dict_counts.insert("cnt_merges".to_string(), self.cnt_merges);
        dict_counts.insert("cnt_warnings".to_string(), self.warning_count() as u64);
        dict_counts
    }

    /// Human-readable one-line summary.
    pub fn format(&self, prefix: &str) -> String {
        let dict_counts = self.to_dict();
        format!(
            "{prefix} hosts={} skipped={} groups={} rows={} merges={} warnings={}",
            dict_counts["cnt_hosts"],
            dict_counts["cnt_hosts_skipped"],
            dict_counts["cnt_groups"],
            dict_counts["cnt_rows"],
            dict_counts["cnt_merges"],
            dict_counts["cnt_warnings"]
        )
    }
}

impl fmt::Display for SpecXlsxReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format("[XLSX]"))
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Errors

/// Terminal report-generation failure.
#[derive(Debug, Error)]
pub enum ReportError {
    /// Style, merge or save failure inside the workbook backend.
    #[error("xlsx write error: {0}")]
    Xlsx(#[from] XlsxError),
    /// Host list could not be decoded.
    #[error("Failed to decode hosts JSON: {0}")]
    Decode(#[from] serde_json::Error),
    /// Option value out of range or unknown.
    #[error("{0}")]
    InvalidOptions(String),
    /// Header plus body rows do not fit into one worksheet.
    #[error("Report needs {rows} rows; Excel allows at most 1048576.")]
    RowLimitExceeded {
        /// Total rows including the header.
        rows: usize,
    },
    /// Row/column index does not fit the backend's index type.
    #[error("{0}")]
    IndexOverflow(String),
    /// Sink was already saved.
    #[error("Cannot write after save().")]
    Closed,
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
