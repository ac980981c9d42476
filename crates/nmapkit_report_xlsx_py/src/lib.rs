use std::collections::BTreeMap;
use std::path::PathBuf;

use nmapkit_report_xlsx::{
    EnumLayoutMode, ReportError, SpecCellFormat, SpecHost, SpecReportOptions,
    build_row_groups as rs_build_row_groups, write_report as rs_write_report,
};
use pyo3::exceptions::{PyRuntimeError, PyValueError};
use pyo3::prelude::*;
use pyo3::types::PyAny;

const N_BRIDGE_ABI_VERSION: u64 = 1;
const C_BRIDGE_CONTRACT_VERSION: &str = "nmapkit.report.xlsx.v1";
const C_BRIDGE_TRANSPORT: &str = "json";

type RowGroupTuple = (String, Vec<Vec<String>>, Vec<(usize, usize, usize)>);

/// Write a report workbook and return `(counters, warnings)`.
#[pyfunction]
#[pyo3(signature = (
    file_out,
    hosts_json,
    layout = "grouped_by_ip_deduped",
    if_skip_down_hosts = false,
    sheet_name = "Sheet1".to_string(),
    width_column = 20.0,
    base_format = None
))]
#[allow(clippy::too_many_arguments)]
fn write_report(
    file_out: String,
    hosts_json: &str,
    layout: &str,
    if_skip_down_hosts: bool,
    sheet_name: String,
    width_column: f64,
    base_format: Option<&Bound<'_, PyAny>>,
) -> PyResult<(BTreeMap<String, u64>, Vec<String>)> {
    let l_hosts = parse_hosts_json(hosts_json)?;
    let cfg_options = SpecReportOptions {
        layout: parse_layout_mode(layout)?,
        if_skip_down_hosts,
        file_out: PathBuf::from(file_out),
        sheet_name,
        width_column,
        base_format_patch: parse_spec_cell_format(base_format)?.unwrap_or_default(),
    };

    let report = rs_write_report(&l_hosts, &cfg_options).map_err(derive_py_err)?;
    Ok((report.to_dict(), report.warnings))
}

/// Lay out hosts without writing; returns `[(key, rows, [(col, row_start, row_end)])]`.
#[pyfunction]
#[pyo3(signature = (hosts_json, layout = "grouped_by_ip_deduped", if_skip_down_hosts = false))]
fn build_row_groups(
    hosts_json: &str,
    layout: &str,
    if_skip_down_hosts: bool,
) -> PyResult<Vec<RowGroupTuple>> {
    let l_hosts = parse_hosts_json(hosts_json)?;
    let mode = parse_layout_mode(layout)?;

    Ok(rs_build_row_groups(&l_hosts, mode, if_skip_down_hosts)
        .into_iter()
        .map(|group| {
            let l_spans = group
                .merges
                .iter()
                .map(|span| (span.col_idx, span.row_idx_start, span.row_idx_end))
                .collect();
            (group.key, group.rows, l_spans)
        })
        .collect())
}

/// Install the stderr `tracing` subscriber; `False` if one already exists.
#[pyfunction]
#[pyo3(signature = (level = "info"))]
fn init_logging(level: &str) -> PyResult<bool> {
    nmapkit_log::init_logging(level).map_err(PyValueError::new_err)
}

fn parse_hosts_json(hosts_json: &str) -> PyResult<Vec<SpecHost>> {
    serde_json::from_str(hosts_json).map_err(|err| derive_py_err(ReportError::Decode(err)))
}

fn parse_layout_mode(value: &str) -> PyResult<EnumLayoutMode> {
    value.parse::<EnumLayoutMode>().map_err(derive_py_err)
}

fn parse_spec_cell_format(obj: Option<&Bound<'_, PyAny>>) -> PyResult<Option<SpecCellFormat>> {
    let Some(obj) = obj else {
        return Ok(None);
    };
    if obj.is_none() {
        return Ok(None);
    }

    Ok(Some(SpecCellFormat {
        font_name: extract_optional_attr::<String>(obj, "font_name")?,
        font_size: extract_optional_attr::<i64>(obj, "font_size")?,
        bold: extract_optional_attr::<bool>(obj, "bold")?,
        align: extract_optional_attr::<String>(obj, "align")?,
        valign: extract_optional_attr::<String>(obj, "valign")?,
        border: extract_optional_attr::<i64>(obj, "border")?,
        text_wrap: extract_optional_attr::<bool>(obj, "text_wrap")?,
        bg_color: extract_optional_attr::<String>(obj, "bg_color")?,
    }))
}

fn extract_optional_attr<T>(obj: &Bound<'_, PyAny>, attr: &str) -> PyResult<Option<T>>
where
    for<'a> T: FromPyObject<'a>,
{
    if !obj.hasattr(attr)? {
        return Ok(None);
    }
    let val = obj.getattr(attr)?;
    if val.is_none() {
        return Ok(None);
    }
    Ok(Some(val.extract::<T>()?))
}

fn derive_py_err(err: ReportError) -> PyErr {
    match err {
        ReportError::Decode(_)
        | ReportError::InvalidOptions(_)
        | ReportError::RowLimitExceeded { .. }
        | ReportError::IndexOverflow(_) => PyValueError::new_err(err.to_string()),
        ReportError::Xlsx(_) | ReportError::Closed => PyRuntimeError::new_err(err.to_string()),
    }
}

#[pymodule]
fn _nmapkit_report_xlsx_rs(_py: Python<'_>, module: &Bound<'_, PyModule>) -> PyResult<()> {
    module.add_function(wrap_pyfunction!(write_report, module)?)?;
    module.add_function(wrap_pyfunction!(build_row_groups, module)?)?;
    module.add_function(wrap_pyfunction!(init_logging, module)?)?;
    module.add("__bridge_abi__", N_BRIDGE_ABI_VERSION)?;
    module.add("__bridge_contract__", C_BRIDGE_CONTRACT_VERSION)?;
    module.add("__bridge_transport__", C_BRIDGE_TRANSPORT)?;
    Ok(())
}
