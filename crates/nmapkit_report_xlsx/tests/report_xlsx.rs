use nmapkit_report_xlsx::{
    EnumLayoutMode, ReportError, SpecReportOptions, write_report, write_report_from_json_bytes,
};
use serde_json::json;

fn hosts_json() -> Vec<u8> {
    json!([
        {
            "hostnames": ["a.lab"],
            "addresses": ["10.0.0.1"],
            "state": "up",
            "ports": [
                {"port_id": 80, "protocol": "tcp", "service_name": "http",
                 "product": "nginx", "version": "1.25"},
                {"port_id": 443, "protocol": "tcp", "service_name": "https"}
            ]
        },
        {
            "hostnames": ["b.lab"],
            "addresses": ["10.0.0.1"],
            "state": "up",
            "ports": [{"port_id": 80, "protocol": "tcp", "service_name": "http"}]
        },
        {
            "hostnames": ["c.lab"],
            "addresses": ["10.0.0.2"],
            "state": "down",
            "ports": [{"port_id": 22, "protocol": "tcp", "service_name": "ssh"}]
        }
    ])
    .to_string()
    .into_bytes()
}

fn options(dir: &tempfile::TempDir, layout: EnumLayoutMode) -> SpecReportOptions {
    SpecReportOptions {
        layout,
        if_skip_down_hosts: true,
        file_out: dir.path().join(format!("{layout}.xlsx")),
        ..Default::default()
    }
}

#[test]
fn writes_grouped_deduped_workbook() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = options(&dir, EnumLayoutMode::GroupedByIpDeduped);

    let report = write_report_from_json_bytes(&hosts_json(), &cfg).unwrap();

    assert!(cfg.file_out.exists());
    assert_eq!(report.cnt_hosts, 3);
    assert_eq!(report.cnt_hosts_skipped, 1);
    assert_eq!(report.cnt_groups, 2);
    assert_eq!(report.cnt_rows, 2);
    assert_eq!(report.cnt_merges, 0);
    assert_eq!(report.sheet_name, "Sheet1");
    assert!(report.warnings.is_empty());
}

#[test]
fn writes_per_host_merged_workbook() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = options(&dir, EnumLayoutMode::PerHostMerged);

    let report = write_report_from_json_bytes(&hosts_json(), &cfg).unwrap();

    assert!(cfg.file_out.exists());
    assert_eq!(report.cnt_groups, 2);
    assert_eq!(report.cnt_rows, 3);
    assert_eq!(report.cnt_merges, 2);
}

#[test]
fn writes_banner_workbook_with_nested_merges() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = options(&dir, EnumLayoutMode::GroupedByIpWithBanner);

    let report = write_report_from_json_bytes(&hosts_json(), &cfg).unwrap();

    assert!(cfg.file_out.exists());
    assert_eq!(report.cnt_groups, 1);
    assert_eq!(report.cnt_rows, 3);
    // asset column over the group, address column over the first host
    assert_eq!(report.cnt_merges, 2);
}

#[test]
fn sanitized_sheet_name_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = SpecReportOptions {
        sheet_name: "scan 10.0.0.0/24".to_string(),
        ..options(&dir, EnumLayoutMode::GroupedByIpDeduped)
    };

    let report = write_report(&[], &cfg).unwrap();

    assert_eq!(report.sheet_name, "scan 10.0.0.0_24");
    assert_eq!(report.warnings.len(), 1);
    assert_eq!(report.cnt_rows, 0);
    assert!(cfg.file_out.exists());
}

#[test]
fn quoted_sheet_name_is_stripped_instead_of_failing() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = SpecReportOptions {
        sheet_name: "'scan'".to_string(),
        ..options(&dir, EnumLayoutMode::PerHostMerged)
    };

    let report = write_report_from_json_bytes(&hosts_json(), &cfg).unwrap();

    assert_eq!(report.sheet_name, "scan");
    assert_eq!(report.warnings.len(), 1);
    assert!(cfg.file_out.exists());
}

#[test]
fn options_json_with_base_format_patch_writes_workbook() {
    let dir = tempfile::tempdir().unwrap();
    let file_out = dir.path().join("styled.xlsx");
    let c_options = json!({
        "layout": "Grouped_By_Ip_With_Banner",
        "file_out": file_out,
        "base_format_patch": {"border": 1, "bold": true, "bg_color": "#DDEBF7"}
    })
    .to_string();
    let cfg: SpecReportOptions = serde_json::from_str(&c_options).unwrap();

    let report = write_report_from_json_bytes(&hosts_json(), &cfg).unwrap();

    assert_eq!(cfg.layout, EnumLayoutMode::GroupedByIpWithBanner);
    assert_eq!(cfg.base_format_patch.border, Some(1));
    assert_eq!(report.cnt_groups, 2);
    assert!(file_out.exists());
}

#[test]
fn malformed_json_is_a_decode_error() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = options(&dir, EnumLayoutMode::GroupedByIpDeduped);

    let err = write_report_from_json_bytes(b"{\"hosts\": 1}", &cfg).unwrap_err();

    assert!(matches!(err, ReportError::Decode(_)));
    assert!(!cfg.file_out.exists());
}

#[test]
fn unwritable_destination_is_an_xlsx_error() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = SpecReportOptions {
        file_out: dir.path().join("missing").join("out.xlsx"),
        ..Default::default()
    };

    let err = write_report_from_json_bytes(&hosts_json(), &cfg).unwrap_err();

    assert!(matches!(err, ReportError::Xlsx(_)));
}
