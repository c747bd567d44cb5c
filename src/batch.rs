//! Sequential scan of a deduplicated host list.
//!
//! A [`BatchOrchestrator`] runs exactly once: constructing it is the idle
//! state, [`BatchOrchestrator::run`] is the running state, and the
//! [`ScanBatch`] it returns is the finished state. `run` takes the
//! orchestrator by value, so a finished batch cannot be resumed.

use std::collections::HashSet;

use serde::Serialize;

use crate::error::BatchIOError;
use crate::executor::{ScanExecutor, ScanFailure, ScanResult};
use crate::hosts::HostListStore;
use crate::logging::ScanLog;
use crate::probe::ConnectionProber;
use crate::Host;

/// Removes repeated hostnames, keeping the first occurrence of each.
/// Comparison is exact and case-sensitive.
pub fn dedup(hosts: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    hosts
        .iter()
        .filter(|host| seen.insert(*host))
        .cloned()
        .collect()
}

/// Outcome of one run. Every distinct input hostname is in exactly one of
/// the two lists, each in completion order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScanBatch {
    pub results: Vec<ScanResult>,
    pub failures: Vec<ScanFailure>,
}

impl ScanBatch {
    /// Number of hosts processed.
    pub fn len(&self) -> usize {
        self.results.len() + self.failures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

pub struct BatchOrchestrator<'a, P> {
    executor: ScanExecutor<'a, P>,
    port: u16,
    log: &'a ScanLog,
}

impl<'a, P: ConnectionProber> BatchOrchestrator<'a, P> {
    pub fn new(executor: ScanExecutor<'a, P>, port: u16, log: &'a ScanLog) -> Self {
        BatchOrchestrator {
            executor,
            port,
            log,
        }
    }

    /// Loads and dedups the host list, saves the deduplicated list back, then
    /// scans every host in order.
    ///
    /// Host failures are recorded in the batch and never stop the run. Only a
    /// failure to load or save the host list is returned as an error.
    pub fn run<S: HostListStore + ?Sized>(self, store: &mut S) -> Result<ScanBatch, BatchIOError> {
        let hostnames = dedup(&store.load()?);
        store.save(&hostnames)?;

        let total = hostnames.len();
        self.log
            .info(format!("----- going to analyze {} hostnames.", total));

        let mut batch = ScanBatch::default();
        for (index, hostname) in hostnames.into_iter().enumerate() {
            let remaining = total - index - 1;
            let host = Host::new(hostname, self.port);
            match self.executor.scan(&host) {
                Ok(result) => {
                    batch.results.push(result);
                    self.log.info(format!(
                        "----- finished processing {} digital certificate. {} digital certificates remain.",
                        host.hostname, remaining
                    ));
                }
                Err(failure) => {
                    batch.failures.push(failure);
                    self.log
                        .info(format!("----- {} digital certificates remain.", remaining));
                }
            }
        }

        self.log.info(format!(
            "----- finished analyzing {} hostnames: {} scanned, {} failed.",
            total,
            batch.results.len(),
            batch.failures.len()
        ));
        Ok(batch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::test_support::ScriptedProber;
    use crate::fields::FieldExtractor;
    use crate::logging::test_support::SharedBuffer;

    fn hosts(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn orchestrator(prober: ScriptedProber, log: &ScanLog) -> BatchOrchestrator<'_, ScriptedProber> {
        let executor = ScanExecutor::new(prober, FieldExtractor::standard().unwrap(), log);
        BatchOrchestrator::new(executor, 443, log)
    }

    #[test]
    fn test_dedup_keeps_first_occurrence() {
        let input = hosts(&["b.example", "a.example", "b.example", "c.example", "a.example"]);
        assert_eq!(dedup(&input), hosts(&["b.example", "a.example", "c.example"]));
    }

    #[test]
    fn test_dedup_is_idempotent() {
        let input = hosts(&["a.example", "A.example", "a.example", "b.example"]);
        let once = dedup(&input);
        assert_eq!(dedup(&once), once);
        assert_eq!(once, hosts(&["a.example", "A.example", "b.example"]));
    }

    #[test]
    fn test_failure_is_isolated() {
        let log = ScanLog::silent();
        let prober = ScriptedProber::default()
            .with_host("a.example", "Subject: CN=a.example\n")
            .with_host("c.example", "Subject: CN=c.example\n");
        let mut store = hosts(&["a.example", "b.example", "c.example"]);

        let batch = orchestrator(prober, &log).run(&mut store).unwrap();

        let scanned: Vec<&str> = batch.results.iter().map(|r| r.hostname.as_str()).collect();
        assert_eq!(scanned, vec!["a.example", "c.example"]);
        assert_eq!(batch.failures.len(), 1);
        assert_eq!(batch.failures[0].hostname, "b.example");
    }

    #[test]
    fn test_partition_covers_distinct_hosts() {
        let log = ScanLog::silent();
        let prober = ScriptedProber::default()
            .with_host("a.example", "Subject: CN=a.example\n")
            .with_host("d.example", "Subject: CN=d.example\n");
        let input = hosts(&["a.example", "b.example", "a.example", "d.example", "e.example", "b.example"]);
        let mut store = input.clone();

        let batch = orchestrator(prober, &log).run(&mut store).unwrap();

        let distinct: HashSet<&str> = input.iter().map(String::as_str).collect();
        let scanned: HashSet<&str> = batch.results.iter().map(|r| r.hostname.as_str()).collect();
        let failed: HashSet<&str> = batch.failures.iter().map(|f| f.hostname.as_str()).collect();

        assert_eq!(batch.len(), distinct.len());
        assert!(scanned.is_disjoint(&failed));
        assert_eq!(scanned.union(&failed).copied().collect::<HashSet<_>>(), distinct);
    }

    #[test]
    fn test_deduplicated_list_is_saved_back() {
        let log = ScanLog::silent();
        let mut store = hosts(&["a.example", "a.example", "b.example"]);

        orchestrator(ScriptedProber::default(), &log)
            .run(&mut store)
            .unwrap();

        assert_eq!(store, hosts(&["a.example", "b.example"]));
    }

    #[test]
    fn test_progress_reports_remaining() {
        let buffer = SharedBuffer::default();
        let sink = buffer.clone();
        let log = ScanLog::from_writer(move || sink.clone(), "info");
        let prober = ScriptedProber::default().with_host("a.example", "Subject: CN=a.example\n");
        let mut store = hosts(&["a.example", "b.example"]);

        orchestrator(prober, &log).run(&mut store).unwrap();

        let out = buffer.contents();
        assert!(out.contains("going to analyze 2 hostnames"));
        assert!(out.contains("finished processing a.example digital certificate. 1 digital certificates remain."));
        assert!(out.contains("----- 0 digital certificates remain."));
        assert!(out.contains("Error occurred during SSL scan for b.example:443"));
        assert!(out.contains("finished analyzing 2 hostnames: 1 scanned, 1 failed."));
    }

    #[test]
    fn test_empty_list() {
        let log = ScanLog::silent();
        let mut store: Vec<String> = Vec::new();
        let batch = orchestrator(ScriptedProber::default(), &log)
            .run(&mut store)
            .unwrap();
        assert!(batch.is_empty());
    }
}
