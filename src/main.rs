mod logging;

use afr_qr::generator::{default_issued_at, generate_requests, GeneratorConfig};
use afr_qr::models::{QrCodeDetails, QrKind, RequestRow};
use afr_qr::payload::InstantTransferQr;
use afr_qr::preflight::{self, preflight_csv};
use afr_qr::render::{build_payloads_from_csv, write_payloads};
use chrono::{DateTime, Datelike, FixedOffset};
use clap::{Parser, Subcommand};
use rand::Rng;
use std::fs::create_dir_all;
use std::path::{Path, PathBuf};
use std::time::Instant;

#[derive(Parser)]
#[command(name = "afr-qr")]
#[command(about = "Instant transfer QR-code payload builder", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    Encode(EncodeArgs),
    Render(RenderArgs),
    Preflight(PreflightArgs),
    Generate(GenerateArgs),
}

#[derive(Parser)]
struct EncodeArgs {
    /// HCT (transfer initiation) or RTP (payment request)
    #[arg(long, default_value = "HCT")]
    kind: QrKind,
    #[arg(long)]
    bic: String,
    #[arg(long)]
    name: String,
    #[arg(long)]
    iban: String,
    /// Whole HUF
    #[arg(long, allow_negative_numbers = true)]
    amount: Option<i64>,
    /// RFC 3339 timestamp, e.g. 2023-01-05T08:03:07+01:00
    #[arg(long, value_parser = parse_timestamp)]
    valid_until: Option<DateTime<FixedOffset>>,
    #[arg(long)]
    purpose: Option<String>,
    #[arg(long)]
    description: Option<String>,
    #[arg(long)]
    shop_id: Option<String>,
    #[arg(long)]
    merch_dev_id: Option<String>,
    #[arg(long)]
    invoice_id: Option<String>,
    #[arg(long)]
    customer_id: Option<String>,
    #[arg(long)]
    cred_tran_id: Option<String>,
    #[arg(long)]
    loyalty_id: Option<String>,
    #[arg(long)]
    nav_check_id: Option<String>,
    /// Write the payload to a file instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,
}

#[derive(Parser)]
struct RenderArgs {
    #[arg(long, default_value = "data/requests.csv")]
    input: PathBuf,
    #[arg(long, default_value = "data/output")]
    output_dir: PathBuf,
}

#[derive(Parser)]
struct PreflightArgs {
    #[arg(long, default_value = "data/requests.csv")]
    input: PathBuf,
}

#[derive(Parser)]
struct GenerateArgs {
    #[arg(long, default_value_t = 100)]
    count: usize,
    #[arg(long)]
    seed: Option<u64>,
    #[arg(long, default_value_t = 0.5)]
    rtp_ratio: f64,
    #[arg(long, default_value_t = 0.8)]
    amount_ratio: f64,
    #[arg(long, default_value_t = 0.3)]
    expiry_ratio: f64,
    #[arg(long, default_value = "data/synthetic/requests.csv")]
    output: PathBuf,
}

fn main() {
    if let Err(err) = run() {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), String> {
    logging::init_logging("afr-qr")?;
    let cli = Cli::parse();
    match cli.command {
        Command::Encode(args) => run_encode(args),
        Command::Render(args) => run_render(args),
        Command::Preflight(args) => run_preflight(args),
        Command::Generate(args) => run_generate(args),
    }
}

fn run_encode(args: EncodeArgs) -> Result<(), String> {
    let details = QrCodeDetails {
        bic: args.bic,
        name: args.name,
        iban: args.iban,
        amount: args.amount,
        valid_until: args.valid_until,
        purpose: args.purpose,
        description: args.description,
        shop_id: args.shop_id,
        merch_dev_id: args.merch_dev_id,
        invoice_id: args.invoice_id,
        customer_id: args.customer_id,
        cred_tran_id: args.cred_tran_id,
        loyalty_id: args.loyalty_id,
        nav_check_id: args.nav_check_id,
    };
    let qr = InstantTransferQr::new(args.kind, details).map_err(|err| err.to_string())?;
    let payload = qr.payload().map_err(|err| err.to_string())?;
    log::info!("Encoded {} ({} characters)", qr, payload.chars().count());

    match args.output {
        Some(path) => {
            ensure_parent(&path)?;
            std::fs::write(&path, &payload).map_err(|err| err.to_string())?;
            log::info!("Payload written to {}", path.display());
        }
        None => print!("{payload}"),
    }
    Ok(())
}

fn run_render(args: RenderArgs) -> Result<(), String> {
    let start = Instant::now();
    let rendered = build_payloads_from_csv(&args.input)?;
    let outputs = write_payloads(&rendered, &args.output_dir)?;

    emit_info_line(&format!(
        "Rendered {} payload(s) to {}",
        outputs.len(),
        args.output_dir.display()
    ));
    for (qr, path) in rendered.iter().zip(&outputs) {
        log::info!("{} -> {}", qr.summary, path.display());
    }
    emit_info_line(&format!("Render time: {} ms", start.elapsed().as_millis()));
    Ok(())
}

fn run_preflight(args: PreflightArgs) -> Result<(), String> {
    let report = preflight_csv(&args.input)?;

    let mut kinds: Vec<(&String, &usize)> = report.rows_by_kind.iter().collect();
    kinds.sort();
    let kinds = kinds
        .into_iter()
        .map(|(kind, count)| format!("{}={}", kind, count))
        .collect::<Vec<_>>()
        .join(" ");
    emit_info_line(&format!(
        "Preflight: rows={} valid={} {}",
        report.total_rows, report.valid_rows, kinds
    ));
    emit_info_line(&format!(
        "Preflight issues: errors={} warnings={}",
        report.error_count(),
        report.warning_count()
    ));

    emit_issue_summary("error", &report.issues, preflight::IssueLevel::Error);
    emit_issue_summary("warning", &report.issues, preflight::IssueLevel::Warning);

    if report.error_count() > 0 {
        return Err(format!(
            "preflight failed with {} error(s)",
            report.error_count()
        ));
    }

    Ok(())
}

fn emit_issue_summary(
    label: &str,
    issues: &[preflight::PreflightIssue],
    level: preflight::IssueLevel,
) {
    let mut counts = std::collections::HashMap::new();
    for issue in issues.iter().filter(|issue| issue.level == level) {
        *counts.entry(issue.message.as_str()).or_insert(0usize) += 1;
    }
    if counts.is_empty() {
        return;
    }

    let mut items: Vec<(&str, usize)> = counts.into_iter().collect();
    items.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));

    let max_items = 5usize;
    for (message, count) in items.iter().take(max_items) {
        emit_info_line(&format!("Preflight {}s: {} = {}", label, message, count));
    }
    if items.len() > max_items {
        emit_info_line(&format!(
            "Preflight {}s: {} additional issue types not shown",
            label,
            items.len() - max_items
        ));
    }
}

fn run_generate(args: GenerateArgs) -> Result<(), String> {
    let seed = args.seed.unwrap_or_else(random_seed);
    let today = chrono::Local::now().date_naive();
    let config = GeneratorConfig {
        requests: args.count,
        rtp_ratio: args.rtp_ratio,
        amount_ratio: args.amount_ratio,
        expiry_ratio: args.expiry_ratio,
        issued_at: default_issued_at(today.year(), today.month(), today.day())?,
    };

    log::info!(
        "Generator options: count={} rtp_ratio={} amount_ratio={} expiry_ratio={}",
        config.requests,
        config.rtp_ratio,
        config.amount_ratio,
        config.expiry_ratio
    );
    let start = Instant::now();
    let rows = generate_requests(&config, seed)?;
    write_csv(&args.output, &rows)?;

    emit_info_line(&format!(
        "Generated {} requests, seed {}, output {}",
        rows.len(),
        seed,
        args.output.display()
    ));
    emit_info_line(&format!(
        "Generation time: {} ms",
        start.elapsed().as_millis()
    ));
    Ok(())
}

fn parse_timestamp(value: &str) -> Result<DateTime<FixedOffset>, String> {
    DateTime::parse_from_rfc3339(value.trim()).map_err(|err| err.to_string())
}

fn random_seed() -> u64 {
    let mut rng = rand::rngs::OsRng;
    rng.gen()
}

fn ensure_parent(path: &Path) -> Result<(), String> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => {
            create_dir_all(parent).map_err(|err| err.to_string())
        }
        _ => Ok(()),
    }
}

fn write_csv(output: &Path, rows: &[RequestRow]) -> Result<(), String> {
    ensure_parent(output)?;
    let mut writer = csv::Writer::from_path(output).map_err(|err| err.to_string())?;
    for row in rows {
        writer.serialize(row).map_err(|err| err.to_string())?;
    }
    writer.flush().map_err(|err| err.to_string())
}

fn emit_info_line(message: &str) {
    if log::log_enabled!(log::Level::Info) {
        log::info!("{}", message);
    } else {
        println!("{message}");
    }
}
