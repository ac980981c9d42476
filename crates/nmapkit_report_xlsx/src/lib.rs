//! `nmapkit_report_xlsx` v1:
//! Scan-result to XLSX report kernel.
//!
//! Modules:
//! - `conf`   : constants, layout headers and default style presets
//! - `spec`   : input model, options, row-group model, report, errors
//! - `util`   : pure helper functions
//! - `layout` : row-group builders (one strategy per layout)
//! - `sink`   : tabular sink contract and report emitter
//! - `writer` : `rust_xlsxwriter` sink and entry points
pub mod conf;
pub mod layout;
pub mod sink;
pub mod spec;
pub mod util;
pub mod writer;

pub use conf::{C_FILE_OUT_DEFAULT, C_SHEET_NAME_DEFAULT, N_NROWS_EXCEL_MAX};
pub use layout::{
    LayoutGroupedByIpDeduped, LayoutGroupedByIpWithBanner, LayoutPerHostMerged, LayoutStrategy,
    build_row_groups, derive_layout_strategy,
};
pub use sink::{EnumSinkOp, MemorySink, TabularSink, emit_report};
pub use spec::{
    EnumCellStyle, EnumLayoutMode, ReportError, SpecCellFormat, SpecHost, SpecMergeSpan,
    SpecPort, SpecReportColumn, SpecReportOptions, SpecRowGroup, SpecXlsxReport,
};
pub use writer::{XlsxWriter, write_report, write_report_from_json_bytes};
