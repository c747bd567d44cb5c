//! Hand-off of a finished batch to its output sinks.

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::batch::ScanBatch;
use crate::error::BatchIOError;
use crate::executor::{ScanFailure, ScanResult};
use crate::fields::CertField;
use crate::logging::ScanLog;

pub const REPORT_FILE: &str = "ssl_details.json";
pub const DETAILS_FILE: &str = "ssl_certificates.txt";
pub const ERRORS_FILE: &str = "ssl_certificate_errors.txt";

const SEPARATOR: &str = "-----------------------";

/// Destination for scan results and failures.
pub trait ReportSink {
    fn write_results(&mut self, results: &[ScanResult]) -> Result<(), BatchIOError>;
    fn write_failures(&mut self, failures: &[ScanFailure]) -> Result<(), BatchIOError>;
}

/// Filesystem sink.
///
/// - `<report_dir>/ssl_details.json`: pretty-printed array of results, replaced on each run
/// - `<certificates_dir>/ssl_certificates.txt`: appended text block per result
/// - `<certificates_dir>/ssl_certificate_errors.txt`: appended block per failure
#[derive(Debug, Clone)]
pub struct FsReport {
    report_dir: PathBuf,
    certificates_dir: PathBuf,
}

impl FsReport {
    pub fn new<P: AsRef<Path>, Q: AsRef<Path>>(report_dir: P, certificates_dir: Q) -> FsReport {
        FsReport {
            report_dir: report_dir.as_ref().to_path_buf(),
            certificates_dir: certificates_dir.as_ref().to_path_buf(),
        }
    }

    pub fn report_path(&self) -> PathBuf {
        self.report_dir.join(REPORT_FILE)
    }

    pub fn details_path(&self) -> PathBuf {
        self.certificates_dir.join(DETAILS_FILE)
    }

    pub fn errors_path(&self) -> PathBuf {
        self.certificates_dir.join(ERRORS_FILE)
    }
}

impl ReportSink for FsReport {
    fn write_results(&mut self, results: &[ScanResult]) -> Result<(), BatchIOError> {
        let report_path = self.report_path();
        let json = serde_json::to_string_pretty(results)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
            .map_err(|source| report_error(&report_path, source))?;
        create_parent(&report_path)?;
        fs::write(&report_path, json + "\n").map_err(|source| report_error(&report_path, source))?;

        if results.is_empty() {
            return Ok(());
        }
        let details_path = self.details_path();
        let mut text = String::new();
        for result in results {
            text.push_str(&details_block(result));
        }
        append(&details_path, &text)
    }

    fn write_failures(&mut self, failures: &[ScanFailure]) -> Result<(), BatchIOError> {
        if failures.is_empty() {
            return Ok(());
        }
        let mut text = String::new();
        for failure in failures {
            text.push_str(&format!(
                "{}\nReason: {}\n{}\n",
                failure.hostname, failure.reason, SEPARATOR
            ));
        }
        append(&self.errors_path(), &text)
    }
}

fn details_block(result: &ScanResult) -> String {
    let mut lines = vec![
        format!(
            "SSL/TLS Scan Results for {}:{}",
            result.hostname, result.port
        ),
        SEPARATOR.to_string(),
        format!("IP Address: {}", result.ip_address),
        format!("Host: {}", result.hostname),
        format!("Port: {}", result.port),
        format!("Subject: {}", result.summary.subject),
        format!("Issuer: {}", result.summary.issuer),
        format!("Valid from: {}", result.summary.not_before),
        format!("Valid until: {}", result.summary.not_after),
        SEPARATOR.to_string(),
        format!("Protocol: {}", result.protocol),
        format!("Cipher Suite: {}", result.cipher_suite),
        "Certificate Information:".to_string(),
    ];
    for field in CertField::schema() {
        lines.push(format!(
            "  {}: {}",
            field,
            result.fields.get(field).unwrap_or_default()
        ));
    }
    lines.join("\n") + "\n\n"
}

fn report_error(path: &Path, source: io::Error) -> BatchIOError {
    BatchIOError::Report {
        path: path.to_path_buf(),
        source,
    }
}

fn create_parent(path: &Path) -> Result<(), BatchIOError> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => {
            fs::create_dir_all(parent).map_err(|source| report_error(path, source))
        }
        _ => Ok(()),
    }
}

fn append(path: &Path, text: &str) -> Result<(), BatchIOError> {
    create_parent(path)?;
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .and_then(|mut file| file.write_all(text.as_bytes()))
        .map_err(|source| report_error(path, source))
}

/// Passes a finished batch to a sink, logging each step.
pub struct ReportAssembler<'a> {
    log: &'a ScanLog,
}

impl<'a> ReportAssembler<'a> {
    pub fn new(log: &'a ScanLog) -> ReportAssembler<'a> {
        ReportAssembler { log }
    }

    pub fn assemble<S: ReportSink + ?Sized>(
        &self,
        batch: &ScanBatch,
        sink: &mut S,
    ) -> Result<(), BatchIOError> {
        self.log.info(format!(
            "----- saving {} certificate results.",
            batch.results.len()
        ));
        sink.write_results(&batch.results).map_err(|e| {
            self.log.error("Saving certificate results", &e);
            e
        })?;

        self.log.info(format!(
            "----- going to save {} digital certificate error websites.",
            batch.failures.len()
        ));
        sink.write_failures(&batch.failures).map_err(|e| {
            self.log.error("Saving certificate errors", &e);
            e
        })
    }
}
