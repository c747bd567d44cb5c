use std::path::Path;
use std::process::exit;

use certscan::config::{Config, OutputFormat, DEFAULT_CONFIG_FILE};
use certscan::metrics::prom::prometheus_metrics;
use certscan::{
    BatchOrchestrator, FieldExtractor, FsReport, ReportAssembler, ScanBatch, ScanExecutor,
    ScanLog, TlsProber, YamlHostList,
};
use clap::Parser;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{ContentArrangement, Table};

#[derive(Parser, Debug)]
#[command(name = "certscan", version, about, long_about = None)]
struct Args {
    /// YAML list of hostnames to scan (rewritten without duplicates)
    #[arg(short = 'f', long)]
    hosts_file: Option<String>,

    /// Port used for every host
    #[arg(short, long)]
    port: Option<u16>,

    /// Connect/handshake timeout in seconds
    #[arg(short, long)]
    timeout: Option<u64>,

    /// Console output once the batch is done
    #[arg(short, long, value_parser = ["summary", "json", "quiet"])]
    output: Option<String>,

    /// Configuration file (defaults to ./certscan.toml when present)
    #[arg(short, long)]
    config: Option<String>,

    /// Push batch totals to a Prometheus Push Gateway
    #[arg(long)]
    prometheus: bool,

    /// Push Gateway address
    #[arg(long)]
    prometheus_address: Option<String>,

    /// Print an example configuration file and exit
    #[arg(long)]
    print_config: bool,
}

fn main() {
    let args = Args::parse();

    if args.print_config {
        println!("{}", Config::example_toml());
        exit(0);
    }

    let config = match load_config(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}", e);
            exit(2);
        }
    };

    let log = match ScanLog::open(Path::new(config.log_file()), config.log_level()) {
        Ok(log) => log,
        Err(e) => {
            eprintln!("{}", e);
            exit(1);
        }
    };

    let extractor = match FieldExtractor::standard() {
        Ok(extractor) => extractor,
        Err(e) => {
            log.error("Building certificate field patterns", e);
            exit(1);
        }
    };

    let prober = TlsProber::new(config.timeout(), &log);
    let executor = ScanExecutor::new(prober, extractor, &log);
    let orchestrator = BatchOrchestrator::new(executor, config.port(), &log);

    let mut hosts = YamlHostList::new(config.hosts_file());
    let batch = match orchestrator.run(&mut hosts) {
        Ok(batch) => batch,
        Err(e) => {
            log.error("Batch aborted", e);
            exit(1);
        }
    };

    let mut report = FsReport::new(config.report_dir(), config.certificates_dir());
    if let Err(e) = ReportAssembler::new(&log).assemble(&batch, &mut report) {
        log.error("Report aborted", e);
        exit(1);
    }

    if let Some(address) = config.prometheus_address() {
        if let Err(e) = prometheus_metrics(&batch, address) {
            log.error(format!("Failed to push metrics to {}", address), e);
        }
    }

    match config.output_format() {
        OutputFormat::Summary => print_summary(&batch),
        OutputFormat::Json => match serde_json::to_string_pretty(&batch.results) {
            Ok(json) => println!("{}", json),
            Err(e) => log.error("Rendering JSON output", e),
        },
        OutputFormat::Quiet => {}
    }

    exit(0);
}

fn load_config(args: &Args) -> Result<Config, certscan::config::ConfigError> {
    let file_config = match &args.config {
        Some(path) => Config::from_file(path)?,
        None if Path::new(DEFAULT_CONFIG_FILE).exists() => Config::from_file(DEFAULT_CONFIG_FILE)?,
        None => Config::empty(),
    };

    let cli_config = Config::from_cli_args(
        args.hosts_file.clone(),
        args.port,
        args.timeout,
        args.output.clone(),
        if args.prometheus { Some(true) } else { None },
        args.prometheus_address.clone(),
    );

    let config = Config::default()
        .merge_with(file_config)
        .merge_with(cli_config);
    config.validate()?;
    Ok(config)
}

fn print_summary(batch: &ScanBatch) {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            "Host",
            "IP Address",
            "Protocol",
            "Cipher Suite",
            "Valid Until",
        ]);
    for result in &batch.results {
        table.add_row(vec![
            result.hostname.clone(),
            result.ip_address.to_string(),
            result.protocol.clone(),
            result.cipher_suite.clone(),
            result.summary.not_after.clone(),
        ]);
    }
    println!("{}", table);

    if !batch.failures.is_empty() {
        let mut failures = Table::new();
        failures
            .load_preset(UTF8_FULL)
            .set_content_arrangement(ContentArrangement::Dynamic)
            .set_header(vec!["Failed Host", "Reason"]);
        for failure in &batch.failures {
            failures.add_row(vec![failure.hostname.clone(), failure.reason.clone()]);
        }
        println!("{}", failures);
    }

    println!(
        "{} hosts: {} scanned, {} failed",
        batch.len(),
        batch.results.len(),
        batch.failures.len()
    );
}
