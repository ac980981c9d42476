//! Row-group builders, one per report layout.
//!
//! Every layout turns the host list into ordered [`SpecRowGroup`]s. Builders
//! are pure: no I/O, no state kept between calls.

use tracing::debug;

use crate::conf::{C_SEP_ADDRESSES, C_SEP_CELL_LINES, C_SEP_HOSTNAMES, derive_layout_columns};
use crate::spec::{EnumLayoutMode, SpecHost, SpecReportColumn, SpecRowGroup};
use crate::util::{
    collect_deduped_services, group_hosts_by_address, is_host_skipped, join_group_hostnames,
    plan_vertical_merge,
};

/// Strategy that lays out hosts into row-groups for one report layout.
pub trait LayoutStrategy {
    /// Layout identifier.
    fn mode(&self) -> EnumLayoutMode;

    /// Header labels and styles, in column order.
    fn columns(&self) -> Vec<SpecReportColumn> {
        derive_layout_columns(self.mode())
    }

    /// Build row-groups in output order.
    fn build_row_groups(
        &self,
        hosts: &[SpecHost],
        if_skip_down_hosts: bool,
    ) -> Vec<SpecRowGroup>;
}

/// Pick the strategy for `mode`.
pub fn derive_layout_strategy(mode: EnumLayoutMode) -> Box<dyn LayoutStrategy> {
    match mode {
        EnumLayoutMode::GroupedByIpDeduped => Box::new(LayoutGroupedByIpDeduped),
        EnumLayoutMode::PerHostMerged => Box::new(LayoutPerHostMerged),
        EnumLayoutMode::GroupedByIpWithBanner => Box::new(LayoutGroupedByIpWithBanner),
    }
}

/// Build row-groups for `mode`.
pub fn build_row_groups(
    hosts: &[SpecHost],
    mode: EnumLayoutMode,
    if_skip_down_hosts: bool,
) -> Vec<SpecRowGroup> {
    derive_layout_strategy(mode).build_row_groups(hosts, if_skip_down_hosts)
}

////////////////////////////////////////////////////////////////////////////////
// #region GroupedByIpDeduped

/// One row per address group: all hostnames, the address, deduped services.
#[derive(Debug, Clone, Copy, Default)]
pub struct LayoutGroupedByIpDeduped;

impl LayoutStrategy for LayoutGroupedByIpDeduped {
    fn mode(&self) -> EnumLayoutMode {
        EnumLayoutMode::GroupedByIpDeduped
    }

    fn build_row_groups(
        &self,
        hosts: &[SpecHost],
        if_skip_down_hosts: bool,
    ) -> Vec<SpecRowGroup> {
        group_hosts_by_address(hosts)
            .into_iter()
            .map(|(c_key, l_members)| {
                let l_services = collect_deduped_services(&l_members, if_skip_down_hosts);
                debug!(
                    key = %c_key,
                    hosts = l_members.len(),
                    services = l_services.len(),
                    "grouped address"
                );

                SpecRowGroup {
                    rows: vec![vec![
                        join_group_hostnames(&l_members),
                        c_key.clone(),
                        l_services.join(C_SEP_CELL_LINES),
                    ]],
                    key: c_key,
                    merges: vec![],
                }
            })
            .collect()
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region PerHostMerged

/// One row per port; host and address cells merged over the host's rows.
#[derive(Debug, Clone, Copy, Default)]
pub struct LayoutPerHostMerged;

impl LayoutStrategy for LayoutPerHostMerged {
    fn mode(&self) -> EnumLayoutMode {
        EnumLayoutMode::PerHostMerged
    }

    fn build_row_groups(
        &self,
        hosts: &[SpecHost],
        if_skip_down_hosts: bool,
    ) -> Vec<SpecRowGroup> {
        let mut l_groups = Vec::new();

        for host in hosts {
            if is_host_skipped(host, if_skip_down_hosts) {
                debug!(state = %host.state, "skipped host");
                continue;
            }

            let c_key = host.joined_addresses(C_SEP_ADDRESSES);
            let c_hostnames = host.joined_hostnames(C_SEP_HOSTNAMES);

            let mut l_rows = Vec::with_capacity(usize::max(1, host.ports.len()));
            if host.ports.is_empty() {
                l_rows.push(vec![c_hostnames.clone(), c_key.clone(), String::new()]);
            }
            for (n_idx_port, port) in host.ports.iter().enumerate() {
                if n_idx_port == 0 {
                    l_rows.push(vec![
                        c_hostnames.clone(),
                        c_key.clone(),
                        port.format_service(),
                    ]);
                } else {
                    l_rows.push(vec![String::new(), String::new(), port.format_service()]);
                }
            }

            let n_row_last = l_rows.len() - 1;
            let l_merges = [0, 1]
                .into_iter()
                .filter_map(|col_idx| plan_vertical_merge(col_idx, 0, n_row_last))
                .collect();

            l_groups.push(SpecRowGroup {
                key: c_key,
                rows: l_rows,
                merges: l_merges,
            });
        }

        l_groups
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region GroupedByIpWithBanner

/// One row per port inside an address group, with banner column and nested merges.
#[derive(Debug, Clone, Copy, Default)]
pub struct LayoutGroupedByIpWithBanner;

impl LayoutStrategy for LayoutGroupedByIpWithBanner {
    fn mode(&self) -> EnumLayoutMode {
        EnumLayoutMode::GroupedByIpWithBanner
    }

    fn build_row_groups(
        &self,
        hosts: &[SpecHost],
        if_skip_down_hosts: bool,
    ) -> Vec<SpecRowGroup> {
        let mut l_groups = Vec::new();

        for (c_key, l_members) in group_hosts_by_address(hosts) {
            let c_hostnames = join_group_hostnames(&l_members);
            let mut l_rows: Vec<Vec<String>> = Vec::new();
            let mut l_merges_inner = Vec::new();

            for host in &l_members {
                if is_host_skipped(host, if_skip_down_hosts) || host.ports.is_empty() {
                    continue;
                }

                let n_row_start = l_rows.len();
                for (n_idx_port, port) in host.ports.iter().enumerate() {
                    let c_asset = if l_rows.is_empty() {
                        c_hostnames.clone()
                    } else {
                        String::new()
                    };
                    let c_address = if n_idx_port == 0 {
                        c_key.clone()
                    } else {
                        String::new()
                    };
                    l_rows.push(vec![
                        c_asset,
                        c_address,
                        port.format_service(),
                        port.format_banner(),
                    ]);
                }
                l_merges_inner.extend(plan_vertical_merge(1, n_row_start, l_rows.len() - 1));
            }

            if l_rows.is_empty() {
                debug!(key = %c_key, "address group has no rows");
                continue;
            }

            let mut l_merges: Vec<_> = plan_vertical_merge(0, 0, l_rows.len() - 1)
                .into_iter()
                .collect();
            l_merges.extend(l_merges_inner);

            l_groups.push(SpecRowGroup {
                key: c_key,
                rows: l_rows,
                merges: l_merges,
            });
        }

        l_groups
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
