//! Integration tests for the public API

use std::collections::HashSet;
use std::fs;
use std::io;
use std::net::{IpAddr, Ipv6Addr};

use certscan::{
    BatchOrchestrator, CertificateSummary, ConnectionError, ConnectionProber, FieldExtractor,
    FsReport, Host, HostListStore, ReportAssembler, ScanExecutor, ScanLog, Session, YamlHostList,
};

const CERT_TEXT: &str = "Certificate:
    Data:
        Serial Number:
            03:aa:01
        Signature Algorithm: ecdsa-with-SHA256
        Issuer: C=US, O=Example Trust, CN=Example Issuing CA
        Validity
            Not Before: Jan  1 00:00:00 2025 GMT
            Not After : Jan  1 00:00:00 2026 GMT
        Subject: CN=a.example
        Subject Public Key Info:
            Public Key Algorithm: id-ecPublicKey
";

/// Succeeds for the listed hostnames and refuses everything else.
struct FakeProber {
    reachable: Vec<&'static str>,
}

impl ConnectionProber for FakeProber {
    fn probe(&self, host: &Host) -> Result<Session, ConnectionError> {
        if !self.reachable.contains(&host.hostname.as_str()) {
            return Err(ConnectionError::ConnectionFailed {
                address: host.address(),
                source: io::Error::new(io::ErrorKind::ConnectionRefused, "connection refused"),
            });
        }
        Ok(Session {
            ip_address: IpAddr::V6(Ipv6Addr::LOCALHOST),
            protocol: "TLSv1.3".to_string(),
            cipher_suite: "TLS_CHACHA20_POLY1305_SHA256".to_string(),
            certificate_text: CERT_TEXT.replace("a.example", &host.hostname),
            summary: CertificateSummary {
                subject: format!("/CN={}", host.hostname),
                issuer: "/C=US/O=Example Trust/CN=Example Issuing CA".to_string(),
                not_before: "Jan  1 00:00:00 2025 GMT".to_string(),
                not_after: "Jan  1 00:00:00 2026 GMT".to_string(),
            },
        })
    }
}

fn run_scan(
    reachable: Vec<&'static str>,
    store: &mut dyn HostListStore,
    report: &mut FsReport,
) -> certscan::ScanBatch {
    let log = ScanLog::silent();
    let executor = ScanExecutor::new(
        FakeProber { reachable },
        FieldExtractor::standard().unwrap(),
        &log,
    );
    let batch = BatchOrchestrator::new(executor, 443, &log)
        .run(store)
        .unwrap();
    ReportAssembler::new(&log).assemble(&batch, report).unwrap();
    batch
}

#[test]
fn test_end_to_end_scenario() {
    let dir = tempfile::tempdir().unwrap();
    let hosts_path = dir.path().join("websites.yml");
    fs::write(&hosts_path, "- a.example\n- a.example\n- b.example\n").unwrap();

    let mut store = YamlHostList::new(&hosts_path);
    let mut report = FsReport::new(dir.path().join("ssl_serializations"), dir.path().join("ssl_certificates"));
    let batch = run_scan(vec!["a.example"], &mut store, &mut report);

    // Host list rewritten without duplicates.
    assert_eq!(store.load().unwrap(), vec!["a.example", "b.example"]);

    // Exactly one report record.
    let json: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(report.report_path()).unwrap()).unwrap();
    let records = json.as_array().unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0]["hostname"], "a.example");
    assert_eq!(records[0]["port"], 443);
    assert_eq!(records[0]["ip_address"], "::1");
    assert_eq!(records[0]["protocol"], "TLSv1.3");
    assert_eq!(records[0]["subject"], "CN=a.example");
    assert_eq!(records[0]["serial_number"], "03:aa:01");
    assert_eq!(records[0]["public_key_algorithm"], "id-ecPublicKey");
    assert!(records[0].get("signed_certificate_timestamp").is_none());
    assert!(records[0].get("not_after").is_none());

    // Exactly one failure entry.
    let errors = fs::read_to_string(report.errors_path()).unwrap();
    assert_eq!(errors.matches("-----------------------").count(), 1);
    assert!(errors.starts_with("b.example\n"));
    assert!(!errors.contains("a.example"));

    assert_eq!(batch.results.len(), 1);
    assert_eq!(batch.failures.len(), 1);
}

#[test]
fn test_fault_isolation_in_middle_of_batch() {
    let dir = tempfile::tempdir().unwrap();
    let mut store: Vec<String> = vec!["a.example".into(), "b.example".into(), "c.example".into()];
    let mut report = FsReport::new(dir.path(), dir.path());

    let batch = run_scan(vec!["a.example", "c.example"], &mut store, &mut report);

    let scanned: Vec<&str> = batch.results.iter().map(|r| r.hostname.as_str()).collect();
    let failed: Vec<&str> = batch.failures.iter().map(|f| f.hostname.as_str()).collect();
    assert_eq!(scanned, vec!["a.example", "c.example"]);
    assert_eq!(failed, vec!["b.example"]);
    assert!(batch.failures[0].reason.contains("connection refused"));
}

#[test]
fn test_partition_completeness() {
    let dir = tempfile::tempdir().unwrap();
    let input: Vec<String> = ["x.example", "y.example", "x.example", "z.example", "w.example", "y.example"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    let mut store = input.clone();
    let mut report = FsReport::new(dir.path(), dir.path());

    let batch = run_scan(vec!["y.example", "w.example"], &mut store, &mut report);

    let distinct: HashSet<&str> = input.iter().map(String::as_str).collect();
    let scanned: HashSet<&str> = batch.results.iter().map(|r| r.hostname.as_str()).collect();
    let failed: HashSet<&str> = batch.failures.iter().map(|f| f.hostname.as_str()).collect();

    assert_eq!(batch.results.len() + batch.failures.len(), distinct.len());
    assert!(scanned.is_disjoint(&failed));
    let covered: HashSet<&str> = scanned.union(&failed).copied().collect();
    assert_eq!(covered, distinct);
}

#[test]
fn test_rewritten_host_list_round_trips() {
    let dir = tempfile::tempdir().unwrap();
    let hosts_path = dir.path().join("websites.yml");
    fs::write(&hosts_path, "- c.example\n- a.example\n- c.example\n- b.example\n").unwrap();

    let mut store = YamlHostList::new(&hosts_path);
    let mut report = FsReport::new(dir.path(), dir.path());
    let batch = run_scan(vec!["a.example", "b.example", "c.example"], &mut store, &mut report);

    let driven: Vec<&str> = batch.results.iter().map(|r| r.hostname.as_str()).collect();
    let reloaded = YamlHostList::new(&hosts_path).load().unwrap();
    assert_eq!(reloaded, driven);
}

#[test]
fn test_missing_host_list_aborts() {
    let dir = tempfile::tempdir().unwrap();
    let log = ScanLog::silent();
    let executor = ScanExecutor::new(
        FakeProber { reachable: vec![] },
        FieldExtractor::standard().unwrap(),
        &log,
    );
    let mut store = YamlHostList::new(dir.path().join("missing.yml"));

    let err = BatchOrchestrator::new(executor, 443, &log)
        .run(&mut store)
        .unwrap_err();
    assert!(matches!(err, certscan::BatchIOError::HostList { .. }));
}
