//! Character-set checks on request fields that reach the scanner's argv.

use crate::error::ApiError;
use once_cell::sync::Lazy;
use regex::Regex;
use sonar_core::JobParameters;

/// Hostnames, IPv4/IPv6 addresses, CIDR blocks, octet ranges and wildcards.
/// A leading `-` is refused so a target is never read as an option.
static TARGET_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9\[:*][A-Za-z0-9.:/_,*\[\]-]*$").expect("valid regex"));

/// Port lists and ranges with optional protocol prefixes (`U:53,T:21-25`).
static PORTS_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9:][A-Za-z0-9:,-]*$").expect("valid regex"));

/// Reject targets or ports outside the accepted character sets.
///
/// An empty target passes through so the orchestrator reports it.
pub fn validate_parameters(params: &JobParameters) -> Result<(), ApiError> {
    let target = params.target.trim();
    if !target.is_empty() && !TARGET_PATTERN.is_match(target) {
        return Err(ApiError::invalid_input(format!(
            "target contains unsupported characters: {target}"
        )));
    }

    let ports = params.ports.trim();
    if !ports.is_empty() && !PORTS_PATTERN.is_match(ports) {
        return Err(ApiError::invalid_input(format!(
            "ports contain unsupported characters: {ports}"
        )));
    }

    Ok(())
}
