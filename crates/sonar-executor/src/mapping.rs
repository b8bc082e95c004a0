//! Conversion of a parsed report into the normalized result model.
//!
//! Numeric and time fields are parsed best effort: anything absent or
//! unparsable becomes the type's default instead of failing the scan.

use crate::report::{NmapRun, ReportHost, ReportPort};
use chrono::{DateTime, NaiveDateTime, Utc};
use sonar_core::{Host, HostMetadata, Port, ScanResult, Script};
use std::collections::BTreeMap;
use std::str::FromStr;

/// Formats nmap uses for `uptime/@lastboot`.
const LAST_BOOT_FORMATS: &[&str] = &["%a %b %e %H:%M:%S %Y", "%Y-%m-%d %H:%M:%S"];

/// Build a [`ScanResult`] from `report`.
///
/// Only hosts reported `up` are kept. The result gets a fresh id; job and
/// owner ids are left empty.
#[must_use]
pub fn map_report(report: &NmapRun, start_time: DateTime<Utc>, command: String) -> ScanResult {
    let finished = &report.runstats.finished;
    let end_secs: i64 = parse_or_default(&finished.time);

    ScanResult {
        id: uuid::Uuid::new_v4().to_string(),
        scan_id: String::new(),
        user_id: String::new(),
        start_time,
        end_time: DateTime::from_timestamp(end_secs, 0).unwrap_or_default(),
        duration: parse_or_default(&finished.elapsed),
        command,
        summary: finished.summary.clone(),
        total_hosts: parse_or_default(&report.runstats.hosts.total),
        up_hosts: parse_or_default(&report.runstats.hosts.up),
        hosts: report
            .hosts
            .iter()
            .filter(|host| host.status.state == "up")
            .map(map_host)
            .collect(),
    }
}

fn map_host(report_host: &ReportHost) -> Host {
    let ip = report_host
        .addresses
        .iter()
        .find(|address| address.addr_type == "ipv4")
        .map(|address| address.addr.clone())
        .unwrap_or_default();

    let mut ports = Vec::with_capacity(report_host.ports.ports.len());
    let mut scripts = Vec::new();
    for report_port in &report_host.ports.ports {
        scripts.extend(report_port.scripts.iter().map(|script| Script {
            id: script.id.clone(),
            output: script.output.clone(),
            data: BTreeMap::new(),
        }));
        ports.push(map_port(report_port));
    }

    Host {
        ip,
        hostnames: report_host
            .hostnames
            .hostnames
            .iter()
            .map(|hostname| hostname.name.clone())
            .collect(),
        status: report_host.status.state.clone(),
        os: report_host.os.matches.first().map(|m| m.name.clone()),
        ports,
        scripts,
        metadata: HostMetadata {
            distance: parse_or_default(&report_host.distance.value),
            uptime: parse_or_default(&report_host.uptime.seconds),
            last_boot: parse_last_boot(&report_host.uptime.last_boot),
            tcp_sequence: report_host.tcpsequence.difficulty.clone(),
            ip_id_sequence: report_host.ipidsequence.class.clone(),
        },
    }
}

fn map_port(report_port: &ReportPort) -> Port {
    let service = &report_port.service;
    Port {
        port: parse_or_default(&report_port.port_id),
        protocol: report_port.protocol.clone(),
        state: report_port.state.state.clone(),
        service: service.name.clone(),
        product: service.product.clone(),
        version: service.version.clone(),
        extra_info: service.extra_info.clone(),
    }
}

fn parse_or_default<T: FromStr + Default>(value: &str) -> T {
    value.trim().parse().unwrap_or_default()
}

fn parse_last_boot(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    LAST_BOOT_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
        .map(|naive| naive.and_utc())
}
