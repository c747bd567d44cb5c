//! # certscan
//!
//! Probes a list of hostnames over TLS, reads session and peer-certificate
//! metadata from each one, and produces a JSON report of successful scans
//! plus a record of the hosts that could not be scanned.
//!
//! The pipeline is strictly sequential:
//!
//! 1. [`HostListStore`] loads the host list; [`BatchOrchestrator`] dedups it
//!    and writes the deduplicated list back.
//! 2. For each host, [`ScanExecutor`] asks a [`ConnectionProber`] for a TLS
//!    session and runs the [`FieldExtractor`] over the certificate text.
//! 3. Each host ends up in exactly one of `results` or `failures`.
//! 4. [`ReportAssembler`] hands both collections to a [`ReportSink`].
//!
//! ```no_run
//! use certscan::{
//!     BatchOrchestrator, FieldExtractor, FsReport, ReportAssembler, ScanExecutor, ScanLog,
//!     TlsProber, YamlHostList,
//! };
//! use std::path::Path;
//! use std::time::Duration;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let log = ScanLog::open(Path::new("logs/ssl_certificate.log"), "info")?;
//! let prober = TlsProber::new(Duration::from_secs(30), &log);
//! let executor = ScanExecutor::new(prober, FieldExtractor::standard()?, &log);
//! let orchestrator = BatchOrchestrator::new(executor, 443, &log);
//!
//! let mut hosts = YamlHostList::new("websites.yml");
//! let batch = orchestrator.run(&mut hosts)?;
//!
//! let mut report = FsReport::new("ssl_serializations", "ssl_certificates");
//! ReportAssembler::new(&log).assemble(&batch, &mut report)?;
//! # Ok(())
//! # }
//! ```

use std::fmt;

pub mod batch;
pub mod config;
pub mod error;
pub mod executor;
pub mod fields;
pub mod hosts;
pub mod logging;
pub mod metrics;
pub mod probe;
pub mod report;

pub use batch::{dedup, BatchOrchestrator, ScanBatch};
pub use error::{BatchIOError, ConnectionError, ExtractionError, ScanError};
pub use executor::{ScanExecutor, ScanFailure, ScanResult};
pub use fields::{CertField, CertificateFieldSet, FieldExtractor};
pub use hosts::{HostListStore, YamlHostList};
pub use logging::ScanLog;
pub use probe::{CertificateSummary, ConnectionProber, Session, TlsProber};
pub use report::{FsReport, ReportAssembler, ReportSink};

/// Port used for every host when none is configured.
pub const DEFAULT_PORT: u16 = 443;

/// A scan target. Two hosts are the same target when their hostnames match.
#[derive(Debug, Clone, Eq)]
pub struct Host {
    pub hostname: String,
    pub port: u16,
}

impl Host {
    pub fn new(hostname: impl Into<String>, port: u16) -> Host {
        Host {
            hostname: hostname.into(),
            port,
        }
    }

    /// `host:port`, as used in log context strings.
    pub fn address(&self) -> String {
        self.to_string()
    }
}

impl PartialEq for Host {
    fn eq(&self, other: &Self) -> bool {
        self.hostname == other.hostname
    }
}

impl fmt::Display for Host {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.hostname, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_host_equality_ignores_port() {
        assert_eq!(Host::new("a.example", 443), Host::new("a.example", 8443));
        assert_ne!(Host::new("a.example", 443), Host::new("A.example", 443));
    }

    #[test]
    fn test_host_address() {
        assert_eq!(Host::new("a.example", DEFAULT_PORT).address(), "a.example:443");
    }
}
