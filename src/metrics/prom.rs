use prometheus::{labels, Gauge, GaugeVec, Opts, Registry};

use crate::batch::ScanBatch;

/// Builds a registry holding the totals of `batch` and one
/// `certscan_host_scanned` sample per host (1 scanned, 0 failed).
pub fn batch_registry(batch: &ScanBatch) -> Result<Registry, prometheus::Error> {
    let registry = Registry::new();

    let hosts = Gauge::new("certscan_hosts_total", "hosts processed in the last batch")?;
    let success = Gauge::new(
        "certscan_scan_success_total",
        "hosts scanned successfully in the last batch",
    )?;
    let failures = Gauge::new(
        "certscan_scan_failures_total",
        "hosts that could not be scanned in the last batch",
    )?;
    let scanned = GaugeVec::new(
        Opts::new("certscan_host_scanned", "1 when the host was scanned, 0 when it failed"),
        &["host", "protocol"],
    )?;

    registry.register(Box::new(hosts.clone()))?;
    registry.register(Box::new(success.clone()))?;
    registry.register(Box::new(failures.clone()))?;
    registry.register(Box::new(scanned.clone()))?;

    hosts.set(batch.len() as f64);
    success.set(batch.results.len() as f64);
    failures.set(batch.failures.len() as f64);
    for result in &batch.results {
        scanned
            .with_label_values(&[result.hostname.as_str(), result.protocol.as_str()])
            .set(1.0);
    }
    for failure in &batch.failures {
        scanned
            .with_label_values(&[failure.hostname.as_str(), ""])
            .set(0.0);
    }

    Ok(registry)
}

/// Pushes the batch metrics to the gateway at `prometheus_address`.
pub fn prometheus_metrics(batch: &ScanBatch, prometheus_address: &str) -> Result<(), prometheus::Error> {
    let registry = batch_registry(batch)?;
    prometheus::push_metrics(
        "certscan",
        labels! {
            "instance".to_owned() => "certscan".to_owned(),
        },
        &format!("{}/metrics/job", prometheus_address),
        registry.gather(),
        None,
    )
}
