//! One host scan: probe, then extract certificate fields.

use std::net::IpAddr;

use serde::Serialize;

use crate::error::ScanError;
use crate::fields::{CertificateFieldSet, FieldExtractor};
use crate::logging::ScanLog;
use crate::probe::{CertificateSummary, ConnectionProber};
use crate::Host;

/// Report record for a successfully scanned host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScanResult {
    pub hostname: String,
    pub port: u16,
    pub ip_address: IpAddr,
    pub protocol: String,
    pub cipher_suite: String,
    #[serde(flatten)]
    pub fields: CertificateFieldSet,
    #[serde(skip)]
    pub summary: CertificateSummary,
}

/// A host that could not be scanned and why.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScanFailure {
    pub hostname: String,
    pub reason: String,
}

pub struct ScanExecutor<'a, P> {
    prober: P,
    extractor: FieldExtractor,
    log: &'a ScanLog,
}

impl<'a, P: ConnectionProber> ScanExecutor<'a, P> {
    pub fn new(prober: P, extractor: FieldExtractor, log: &'a ScanLog) -> ScanExecutor<'a, P> {
        ScanExecutor {
            prober,
            extractor,
            log,
        }
    }

    /// Scans `host`. Every failure comes back as a [`ScanFailure`] value after
    /// being logged; nothing is retried.
    pub fn scan(&self, host: &Host) -> Result<ScanResult, ScanFailure> {
        self.try_scan(host).map_err(|err| {
            self.log.error(
                format!("Error occurred during SSL scan for {}", host.address()),
                &err,
            );
            ScanFailure {
                hostname: host.hostname.clone(),
                reason: err.to_string(),
            }
        })
    }

    fn try_scan(&self, host: &Host) -> Result<ScanResult, ScanError> {
        let session = self.prober.probe(host)?;
        let fields = self.extractor.extract(&session.certificate_text)?;

        Ok(ScanResult {
            hostname: host.hostname.clone(),
            port: host.port,
            ip_address: session.ip_address,
            protocol: session.protocol,
            cipher_suite: session.cipher_suite,
            fields,
            summary: session.summary,
        })
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::collections::HashMap;
    use std::io;
    use std::net::{IpAddr, Ipv4Addr};

    use crate::error::ConnectionError;
    use crate::probe::{CertificateSummary, ConnectionProber, Session};
    use crate::Host;

    /// Prober answering from a fixed table; unknown hosts are refused.
    #[derive(Default)]
    pub struct ScriptedProber {
        pub sessions: HashMap<String, Session>,
    }

    impl ScriptedProber {
        pub fn with_host(mut self, hostname: &str, certificate_text: &str) -> Self {
            self.sessions.insert(
                hostname.to_string(),
                Session {
                    ip_address: IpAddr::V4(Ipv4Addr::new(192, 0, 2, 10)),
                    protocol: "TLSv1.3".to_string(),
                    cipher_suite: "TLS_AES_256_GCM_SHA384".to_string(),
                    certificate_text: certificate_text.to_string(),
                    summary: CertificateSummary {
                        subject: format!("/CN={}", hostname),
                        ..CertificateSummary::default()
                    },
                },
            );
            self
        }
    }

    impl ConnectionProber for ScriptedProber {
        fn probe(&self, host: &Host) -> Result<Session, ConnectionError> {
            self.sessions
                .get(&host.hostname)
                .cloned()
                .ok_or_else(|| ConnectionError::ConnectionFailed {
                    address: host.address(),
                    source: io::Error::new(io::ErrorKind::ConnectionRefused, "refused"),
                })
        }
    }
}
