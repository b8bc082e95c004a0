//! nmap XML report model.
//!
//! Only the parts that feed a [`ScanResult`](sonar_core::ScanResult) are
//! modelled. Every attribute is kept as a string and parsed later, so an odd
//! value in one field never rejects the whole report.

use serde::Deserialize;

/// Parse an nmap `-oX` report.
pub fn parse_report(xml: &str) -> Result<NmapRun, quick_xml::DeError> {
    quick_xml::de::from_str(xml)
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct NmapRun {
    #[serde(rename = "@args")]
    pub args: String,
    #[serde(rename = "@version")]
    pub version: String,
    #[serde(rename = "host")]
    pub hosts: Vec<ReportHost>,
    pub runstats: RunStats,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ReportHost {
    pub status: HostStatus,
    #[serde(rename = "address")]
    pub addresses: Vec<Address>,
    pub hostnames: Hostnames,
    pub ports: Ports,
    pub os: Os,
    pub uptime: Uptime,
    pub distance: Distance,
    pub tcpsequence: TcpSequence,
    pub ipidsequence: IpIdSequence,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct HostStatus {
    #[serde(rename = "@state")]
    pub state: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Address {
    #[serde(rename = "@addr")]
    pub addr: String,
    #[serde(rename = "@addrtype")]
    pub addr_type: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Hostnames {
    #[serde(rename = "hostname")]
    pub hostnames: Vec<Hostname>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Hostname {
    #[serde(rename = "@name")]
    pub name: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Ports {
    #[serde(rename = "port")]
    pub ports: Vec<ReportPort>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ReportPort {
    #[serde(rename = "@protocol")]
    pub protocol: String,
    #[serde(rename = "@portid")]
    pub port_id: String,
    pub state: PortState,
    pub service: Service,
    #[serde(rename = "script")]
    pub scripts: Vec<ReportScript>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct PortState {
    #[serde(rename = "@state")]
    pub state: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Service {
    #[serde(rename = "@name")]
    pub name: String,
    #[serde(rename = "@product")]
    pub product: String,
    #[serde(rename = "@version")]
    pub version: String,
    #[serde(rename = "@extrainfo")]
    pub extra_info: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ReportScript {
    #[serde(rename = "@id")]
    pub id: String,
    #[serde(rename = "@output")]
    pub output: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Os {
    #[serde(rename = "osmatch")]
    pub matches: Vec<OsMatch>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct OsMatch {
    #[serde(rename = "@name")]
    pub name: String,
    #[serde(rename = "@accuracy")]
    pub accuracy: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Uptime {
    #[serde(rename = "@seconds")]
    pub seconds: String,
    #[serde(rename = "@lastboot")]
    pub last_boot: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Distance {
    #[serde(rename = "@value")]
    pub value: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct TcpSequence {
    #[serde(rename = "@difficulty")]
    pub difficulty: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct IpIdSequence {
    #[serde(rename = "@class")]
    pub class: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RunStats {
    pub finished: Finished,
    pub hosts: HostCounts,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Finished {
    #[serde(rename = "@time")]
    pub time: String,
    #[serde(rename = "@elapsed")]
    pub elapsed: String,
    #[serde(rename = "@summary")]
    pub summary: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct HostCounts {
    #[serde(rename = "@up")]
    pub up: String,
    #[serde(rename = "@total")]
    pub total: String,
}
