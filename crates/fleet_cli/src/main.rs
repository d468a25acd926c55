//! Command-line front end over `fleet_core`.
//!
//! # Responsibility
//! - Open the ledger from environment configuration and flag overrides.
//! - Print reports and move transport records in and out of files.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use fleet_core::export::{read_json, write_csv_file, write_json};
use fleet_core::{init_from_config, CompanyId, FleetConfig, Ledger};
use log::info;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "fleet")]
#[command(about = "Transport company records and reports")]
#[command(version)]
struct Cli {
    /// SQLite database file; in-memory when omitted
    #[arg(long, global = true)]
    db: Option<PathBuf>,
    /// trace|debug|info|warn|error
    #[arg(long, global = true)]
    log_level: Option<String>,
    /// Absolute directory for rolling log files
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List companies sorted by name
    Companies,
    /// Print the text report of a company
    Report { company_id: CompanyId },
    /// Export a company's transports as JSON
    ExportJson {
        company_id: CompanyId,
        output: PathBuf,
    },
    /// Export a company's transports as CSV
    ExportCsv {
        company_id: CompanyId,
        output: PathBuf,
    },
    /// Read exported transports back and list them; nothing is stored
    ImportJson { input: PathBuf },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = resolve_config(&cli)?;
    init_from_config(&config).context("logging init failed")?;

    let ledger = Ledger::open(&config).context("failed to open ledger")?;
    run(&ledger, cli.command)?;
    ledger.close().context("failed to close ledger")?;
    Ok(())
}

fn resolve_config(cli: &Cli) -> Result<FleetConfig> {
    let mut config = FleetConfig::from_env()?;
    if let Some(path) = &cli.db {
        config = config.with_db_path(path);
    }
    if let Some(level) = &cli.log_level {
        config = config.with_log_level(level)?;
    }
    if let Some(dir) = &cli.log_dir {
        config = config.with_log_dir(dir)?;
    }
    Ok(config)
}

fn run(ledger: &Ledger, command: Commands) -> Result<()> {
    match command {
        Commands::Companies => {
            for company in ledger.companies().find_all_sorted_by_name()? {
                println!("{}\t{}\t{:.2}", company.id, company.name, company.revenue);
            }
        }
        Commands::Report { company_id } => {
            let today = chrono::Local::now().date_naive();
            let report = ledger
                .reports()
                .generate_text_report(company_id, today)?
                .with_context(|| format!("company {company_id} not found"))?;
            print!("{report}");
        }
        Commands::ExportJson { company_id, output } => {
            let records = ledger.transports().export_records(company_id)?;
            write_json(&records, &output)?;
            println!("exported {} transport(s) to {}", records.len(), output.display());
        }
        Commands::ExportCsv { company_id, output } => {
            let records = ledger.transports().export_records(company_id)?;
            write_csv_file(&records, &output)?;
            println!("exported {} transport(s) to {}", records.len(), output.display());
        }
        Commands::ImportJson { input } => {
            let records = read_json(&input)?;
            for record in &records {
                println!(
                    "{}\t{} -> {}\t{}\t{}\t{}",
                    record.id,
                    record.start_point,
                    record.end_point,
                    record.price,
                    if record.paid { "paid" } else { "unpaid" },
                    record.client_name
                );
            }
            info!(
                "event=cli_import module=cli status=ok records={}",
                records.len()
            );
        }
    }
    Ok(())
}
