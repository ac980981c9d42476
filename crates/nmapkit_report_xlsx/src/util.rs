//! Stateless helper utilities used by the layout builder and the XLSX sink.

use std::collections::{BTreeSet, HashMap, HashSet};

use crate::conf::{
    C_SEP_ADDRESSES, C_SEP_CELL_LINES, C_SEP_HOSTNAMES, N_LEN_EXCEL_CELL_TEXT_MAX,
    N_LEN_EXCEL_SHEET_NAME_MAX, N_WIDTH_EXCEL_COLUMN_MAX, TUP_EXCEL_ILLEGAL,
};
use crate::spec::{ReportError, SpecHost, SpecMergeSpan};

////////////////////////////////////////////////////////////////////////////////
// #region HostGrouping

/// Partition hosts by joined address string, keeping first-appearance order.
pub fn group_hosts_by_address(hosts: &[SpecHost]) -> Vec<(String, Vec<&SpecHost>)> {
    let mut l_groups: Vec<(String, Vec<&SpecHost>)> = Vec::new();
    let mut dict_group_pos: HashMap<String, usize> = HashMap::new();

    for host in hosts {
        let c_key = host.joined_addresses(C_SEP_ADDRESSES);
        match dict_group_pos.get(&c_key) {
            Some(n_pos) => l_groups[*n_pos].1.push(host),
            None => {
                dict_group_pos.insert(c_key.clone(), l_groups.len());
                l_groups.push((c_key, vec![host]));
            }
        }
    }

    l_groups
}

/// Join every member host's hostnames into one multi-line cell text.
pub fn join_group_hostnames(hosts: &[&SpecHost]) -> String {
    hosts
        .iter()
        .map(|host| host.joined_hostnames(C_SEP_HOSTNAMES))
        .collect::<Vec<_>>()
        .join(C_SEP_CELL_LINES)
}

/// Whether a host's ports are dropped under the skip option.
pub fn is_host_skipped(host: &SpecHost, if_skip_down_hosts: bool) -> bool {
    if_skip_down_hosts && !host.is_up()
}

/// Formatted services of all surviving hosts, first occurrence wins.
///
/// The seen-set lives only for this call, so dedup never leaks across groups.
pub fn collect_deduped_services(hosts: &[&SpecHost], if_skip_down_hosts: bool) -> Vec<String> {
    let mut set_seen: HashSet<String> = HashSet::new();
    let mut l_services = Vec::new();

    for host in hosts {
        if is_host_skipped(host, if_skip_down_hosts) {
            continue;
        }
        for port in &host.ports {
            let c_service = port.format_service();
            if set_seen.insert(c_service.clone()) {
                l_services.push(c_service);
            }
        }
    }

    l_services
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region MergeUtils

/// Vertical merge for `col_idx` over `row_start..=row_end`, if it spans 2+ rows.
pub fn plan_vertical_merge(
    col_idx: usize,
    row_start: usize,
    row_end: usize,
) -> Option<SpecMergeSpan> {
    if row_end <= row_start {
        return None;
    }
    Some(SpecMergeSpan {
        col_idx,
        row_idx_start: row_start,
        row_idx_end: row_end,
    })
}

/// Cells covered by merges, excluding each merge's anchor cell.
pub fn derive_merge_tracker(
    merges: &[(usize, usize, usize, usize)],
) -> BTreeSet<(usize, usize)> {
    let mut set_covered = BTreeSet::new();

    for (col_first, row_first, col_last, row_last) in merges {
        for row_idx in *row_first..=*row_last {
            for col_idx in *col_first..=*col_last {
                if (row_idx, col_idx) != (*row_first, *col_first) {
                    set_covered.insert((row_idx, col_idx));
                }
            }
        }
    }

    set_covered
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region ExcelNormalization

/// Replace invalid chars and trim to valid Excel sheet name.
///
/// Excel also rejects names starting or ending with `'`, so those are stripped.
pub fn sanitize_sheet_name(name: &str, replace_to: &str) -> String {
    let mut c_name = name.to_string();
    for c_illegal in TUP_EXCEL_ILLEGAL {
        c_name = c_name.replace(c_illegal, replace_to);
    }
    let c_name: String = c_name
        .trim()
        .trim_matches('\'')
        .trim()
        .chars()
        .take(N_LEN_EXCEL_SHEET_NAME_MAX)
        .collect();
    let c_name = c_name.trim_end_matches('\'').trim_end();
    if c_name.is_empty() {
        return "Sheet".to_string();
    }

    c_name.to_string()
}

/// Cut text to the Excel cell limit; the flag reports whether it was cut.
pub fn clamp_cell_text(text: &str) -> (String, bool) {
    if text.chars().count() <= N_LEN_EXCEL_CELL_TEXT_MAX {
        return (text.to_string(), false);
    }
    (text.chars().take(N_LEN_EXCEL_CELL_TEXT_MAX).collect(), true)
}

/// Validate a column display width.
pub fn validate_width_column(width: f64) -> Result<(), ReportError> {
    if !width.is_finite() || width <= 0.0 || width > N_WIDTH_EXCEL_COLUMN_MAX {
        return Err(ReportError::InvalidOptions(format!(
            "width_column must be in (0, {N_WIDTH_EXCEL_COLUMN_MAX}], got {width}."
        )));
    }
    Ok(())
}

pub fn cast_row_num(value: usize) -> Result<u32, ReportError> {
    u32::try_from(value)
        .map_err(|_| ReportError::IndexOverflow(format!("row index overflow: {value}")))
}

pub fn cast_col_num(value: usize) -> Result<u16, ReportError> {
    u16::try_from(value)
        .map_err(|_| ReportError::IndexOverflow(format!("column index overflow: {value}")))
}

// #endregion
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::SpecPort;

    fn host(names: &[&str], addrs: &[&str], state: &str, ports: &[(u32, &str, &str)]) -> SpecHost {
        SpecHost {
            hostnames: names.iter().map(|s| s.to_string()).collect(),
            addresses: addrs.iter().map(|s| s.to_string()).collect(),
            state: state.to_string(),
            ports: ports
                .iter()
                .map(|(port_id, protocol, service_name)| SpecPort {
                    port_id: *port_id,
                    protocol: protocol.to_string(),
                    service_name: service_name.to_string(),
                    ..Default::default()
                })
                .collect(),
        }
    }

    #[test]
    fn test_group_hosts_by_address_keeps_first_appearance_order() {
        let hosts = vec![
            host(&["z"], &["10.0.0.9"], "up", &[]),
            host(&["a"], &["10.0.0.1"], "up", &[]),
            host(&["y"], &["10.0.0.9"], "up", &[]),
            host(&["m"], &["10.0.0.1", "aa:bb"], "up", &[]),
        ];

        let l_groups = group_hosts_by_address(&hosts);
        let l_keys: Vec<&str> = l_groups.iter().map(|(key, _)| key.as_str()).collect();
        assert_eq!(l_keys, vec!["10.0.0.9", "10.0.0.1", "10.0.0.1/aa:bb"]);
        assert_eq!(l_groups[0].1.len(), 2);
        assert_eq!(join_group_hostnames(&l_groups[0].1), "z\ny");
    }

    #[test]
    fn test_collect_deduped_services_across_hosts() {
        let a = host(&["A"], &["10.0.0.1"], "up", &[(80, "tcp", "http"), (443, "tcp", "https")]);
        let b = host(&["B"], &["10.0.0.1"], "up", &[(80, "tcp", "http"), (80, "udp", "http")]);

        assert_eq!(
            collect_deduped_services(&[&a, &b], false),
            vec!["80/tcp http", "443/tcp https", "80/udp http"]
        );
    }

    #[test]
    fn test_collect_deduped_services_skips_down_hosts_only_when_asked() {
        let a = host(&["A"], &["10.0.0.1"], "down", &[(22, "tcp", "ssh")]);
        let b = host(&["B"], &["10.0.0.1"], "up", &[(80, "tcp", "http")]);

        assert_eq!(collect_deduped_services(&[&a, &b], true), vec!["80/tcp http"]);
        assert_eq!(
            collect_deduped_services(&[&a, &b], false),
            vec!["22/tcp ssh", "80/tcp http"]
        );
    }

    #[test]
    fn test_plan_vertical_merge_rejects_single_row() {
        assert_eq!(plan_vertical_merge(0, 3, 3), None);
        let span = plan_vertical_merge(1, 2, 4).unwrap();
        assert_eq!(span.height(), 3);
    }

    #[test]
    fn test_derive_merge_tracker_excludes_anchor() {
        let set_covered = derive_merge_tracker(&[(0, 1, 0, 3)]);
        assert_eq!(
            set_covered.into_iter().collect::<Vec<_>>(),
            vec![(2, 0), (3, 0)]
        );
    }

    #[test]
    fn test_sanitize_sheet_name_and_clamp() {
        assert_eq!(sanitize_sheet_name("scan: 10/8 [a]", "_"), "scan_ 10_8 _a_");
        assert_eq!(sanitize_sheet_name("  ", "_"), "Sheet");
        assert_eq!(sanitize_sheet_name(&"x".repeat(40), "_").len(), 31);
        assert_eq!(sanitize_sheet_name("'scan'", "_"), "scan");
        assert_eq!(sanitize_sheet_name(" ''' ", "_"), "Sheet");
        assert_eq!(sanitize_sheet_name("it's up", "_"), "it's up");
        let c_long = format!("{}'tail", "y".repeat(30));
        assert_eq!(sanitize_sheet_name(&c_long, "_"), "y".repeat(30));

        let (c_text, if_cut) = clamp_cell_text(&"p".repeat(N_LEN_EXCEL_CELL_TEXT_MAX + 5));
        assert!(if_cut);
        assert_eq!(c_text.len(), N_LEN_EXCEL_CELL_TEXT_MAX);
        assert_eq!(clamp_cell_text("80/tcp http"), ("80/tcp http".to_string(), false));
    }

    #[test]
    fn test_validate_width_column() {
        assert!(validate_width_column(20.0).is_ok());
        assert!(validate_width_column(0.0).is_err());
        assert!(validate_width_column(f64::NAN).is_err());
        assert!(validate_width_column(300.0).is_err());
    }
}
