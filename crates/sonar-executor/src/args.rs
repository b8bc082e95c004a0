//! Command-line construction.

use sonar_core::job::{MAX_TIMING_TEMPLATE, MIN_TIMING_TEMPLATE};
use sonar_core::JobParameters;

/// Build the nmap argument list for `params`, excluding the report output
/// flags.
///
/// Order is fixed: target, ports, scan technique, timing, service detection,
/// OS detection, script scan, then extra options verbatim. Flags implied
/// twice (e.g. a `VERSION` scan with service detection on) are emitted twice.
#[must_use]
pub fn build_args(params: &JobParameters) -> Vec<String> {
    let mut args = vec![params.target.clone()];

    if !params.ports.is_empty() {
        args.push("-p".to_string());
        args.push(params.ports.clone());
    }

    if let Some(scan_type) = params.scan_type {
        args.push(scan_type.flag().to_string());
    }

    if (MIN_TIMING_TEMPLATE..=MAX_TIMING_TEMPLATE).contains(&params.timing_template) {
        args.push(format!("-T{}", params.timing_template));
    }

    if params.service_detection {
        args.push("-sV".to_string());
    }
    if params.os_detection {
        args.push("-O".to_string());
    }
    if params.script_scan {
        args.push("-sC".to_string());
    }

    args.extend(params.extra_options.iter().cloned());
    args
}

/// Literal command line recorded on a result for audit.
#[must_use]
pub fn command_line(binary: &str, args: &[String]) -> String {
    std::iter::once(binary)
        .chain(args.iter().map(String::as_str))
        .collect::<Vec<_>>()
        .join(" ")
}
