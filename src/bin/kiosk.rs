//! `checkin-kiosk` - scanner station and scan log browser
//!
//! Talks to the check-in server over its REST API.

use std::fs::File;
use std::path::PathBuf;
use std::sync::Arc;

use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use tokio::sync::mpsc;

use trustee_checkin_server::{
    admin::{LogBrowser, SortKey},
    client::ApiClient,
    config::{AppConfig, ScannerConfig},
    kiosk::{
        decoder::LineCamera, feedback::TerminalFeedback, registry::DecoderRegistry, ScannerSession,
        SessionCommand, SessionExit,
    },
    logging,
};

/// Trustee check-in kiosk
#[derive(Debug, Parser)]
#[command(name = "checkin-kiosk")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Base URL of the check-in API
    #[arg(long, global = true, value_name = "URL")]
    server_url: Option<String>,

    /// Operator label recorded with each scan
    #[arg(long, global = true)]
    operator: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Scan QR codes from a keyboard-wedge scanner on standard input
    Scan,

    /// Browse and export the scan log
    Logs(LogsArgs),
}

#[derive(Debug, clap::Args)]
struct LogsArgs {
    /// Filter on trustee name or gaam
    #[arg(long)]
    search: Option<String>,

    /// Only scans made on this day
    #[arg(long, value_name = "YYYY-MM-DD")]
    date: Option<NaiveDate>,

    /// Sort column (trustee, gaam, scan_time). Repeat to toggle direction.
    #[arg(long = "sort", value_name = "KEY")]
    sort: Vec<SortKey>,

    /// Page to show, starting at 1
    #[arg(long, default_value_t = 1)]
    page: usize,

    /// Write the filtered rows to a CSV file
    #[arg(long, value_name = "FILE")]
    export: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let mut config = AppConfig::load()?;
    if let Some(url) = cli.server_url {
        config.kiosk.server_url = url;
    }
    if cli.operator.is_some() {
        config.kiosk.operator = cli.operator;
    }

    let log_guard = logging::init(&config.logging, "trustee_checkin_server={level}", "checkin-kiosk.log");

    let client = ApiClient::from_config(&config.kiosk)?;
    let code = match cli.command {
        Command::Scan => scan(&config, client).await,
        Command::Logs(args) => logs(&config, client, args).await?,
    };

    drop(log_guard);
    // The blocking stdin reader would otherwise hold the runtime open
    std::process::exit(code);
}

async fn scan(config: &AppConfig, client: ApiClient) -> i32 {
    let mut scanner = config.scanner.clone();
    if scanner.auto_restart().is_none() {
        // Standard input is the scanner itself, so there is no key to continue with
        scanner.auto_restart_ms = ScannerConfig::default().auto_restart_ms;
        tracing::warn!(
            "Automatic restart is required on a line scanner, using {} ms",
            scanner.auto_restart_ms
        );
    }

    let registry = DecoderRegistry::new(Arc::new(LineCamera::stdin()));
    let teardown = registry.teardown_handle();
    let (commands_tx, mut commands) = mpsc::channel(4);

    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            teardown.teardown().await;
            let _ = commands_tx.send(SessionCommand::Stop).await;
        }
    });

    tracing::info!(server = %config.kiosk.server_url, "Starting scanner session");
    let mut session = ScannerSession::new(
        registry,
        client,
        TerminalFeedback,
        &scanner,
        config.kiosk.operator.clone(),
    );

    match session.run(&mut commands).await {
        SessionExit::Stopped | SessionExit::DecoderClosed => {
            tracing::info!("Scanner session ended");
            0
        }
        SessionExit::Faulted { message } => {
            tracing::error!("Scanner session faulted: {}", message);
            1
        }
    }
}

async fn logs(config: &AppConfig, client: ApiClient, args: LogsArgs) -> anyhow::Result<i32> {
    let entries = client.scan_logs().await?;
    let mut browser = LogBrowser::new(entries, Local, config.admin.page_size);

    if let Some(search) = &args.search {
        browser.set_search(search);
    }
    browser.set_date(args.date);
    for key in args.sort {
        browser.request_sort(key);
    }
    browser.set_page(args.page);

    println!("{:<30} {:<15} {:<20} {}", "Trustee", "Gaam", "Scan Time", "Scanned By");
    for entry in browser.current_page() {
        println!(
            "{:<30} {:<15} {:<20} {}",
            entry.trustee.full_name(),
            entry.trustee.gaam,
            browser.display_time(entry),
            entry.scanned_by.as_deref().unwrap_or("Unknown")
        );
    }
    println!(
        "Page {}/{} ({} of {} entries)",
        browser.page(),
        browser.page_count(),
        browser.filtered().len(),
        browser.total()
    );

    if let Some(path) = args.export {
        let written = browser.export_csv(File::create(&path)?)?;
        println!("Exported {} rows to {}", written, path.display());
    }

    Ok(0)
}
