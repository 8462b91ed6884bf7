use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use env_logger::Env;

use txlens::data::loader::load_file;
use txlens::data::model::TransactionSet;
use txlens::data::summary::{Summaries, DEFAULT_TOP_BENEFICIARIES};
use txlens::state::DashboardState;

const PREVIEW_ROWS: usize = 10;

/// Command-line front end for the dashboard analytics core: loads a
/// transactions file, applies the category filters, and prints the summaries
/// an interactive dashboard would chart.
#[derive(Parser)]
#[clap(author, version, about, long_about = None)]
struct Cli {
    /// Transactions file (.csv or .json)
    file: PathBuf,

    /// Restrict to these account types (repeatable; default: all)
    #[clap(long = "account-type")]
    account_types: Vec<String>,

    /// Restrict to these regions (repeatable; default: all)
    #[clap(long = "region")]
    regions: Vec<String>,

    /// Per-region cutoff for the beneficiary ranking
    #[clap(long, default_value_t = DEFAULT_TOP_BENEFICIARIES)]
    top: usize,

    /// Emit the summaries as pretty JSON instead of a text report
    #[clap(long)]
    json: bool,
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let dataset =
        load_file(&cli.file).with_context(|| format!("loading {}", cli.file.display()))?;

    let mut state = DashboardState::default();
    state.top_beneficiaries = cli.top;
    state.set_dataset(dataset);

    if !cli.account_types.is_empty() {
        state.selection.account_types = cli.account_types.into_iter().collect();
    }
    if !cli.regions.is_empty() {
        state.selection.regions = cli.regions.into_iter().collect();
    }
    state.refilter();

    let summaries = state.summaries().context("no dataset loaded")?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&summaries)?);
    } else {
        print_report(&state, &summaries);
    }
    Ok(())
}

fn print_report(state: &DashboardState, summaries: &Summaries) {
    let total = state.dataset.as_ref().map_or(0, TransactionSet::len);
    println!(
        "{total} transactions loaded, {} visible",
        state.visible_indices.len()
    );

    let preview = state.visible_transactions();
    if !preview.is_empty() {
        println!(
            "\nFiltered rows (showing {} of {})",
            preview.len().min(PREVIEW_ROWS),
            preview.len()
        );
        for txn in preview.iter().take(PREVIEW_ROWS) {
            println!(
                "  {:<12} {:<10} {:<22} credit {:>12.2}  debit {:>12.2}  {}",
                txn.account_type,
                txn.region,
                txn.beneficiary,
                txn.credit,
                txn.debit,
                txn.date.map(|d| d.to_string()).unwrap_or_default()
            );
        }
    }

    println!("\nAccount type distribution");
    for (account_type, count) in &summaries.account_type_distribution {
        println!("  {account_type:<16} {count:>6}");
    }

    println!("\nTop beneficiaries by region (credit)");
    for row in &summaries.top_beneficiaries {
        println!(
            "  {:<12} {:<22} {:>14.2}",
            row.region, row.beneficiary, row.credit
        );
    }

    println!("\nTransaction intensity by region");
    for row in &summaries.regional_intensity {
        println!(
            "  {:<12} credit {:>14.2}   debit {:>14.2}",
            row.region, row.credit, row.debit
        );
    }

    match &summaries.yearly_trend {
        Some(trend) => {
            println!("\nYearly trend (all transactions)");
            for row in trend {
                println!(
                    "  {}  credit {:>14.2}   debit {:>14.2}",
                    row.year, row.credit, row.debit
                );
            }
        }
        None => println!("\nYearly trend skipped: no Date column in the source"),
    }

    println!("\nAnomalies (|z| > 3 on credit or debit)");
    if summaries.anomalies.is_empty() {
        println!("  none");
    } else {
        for anomaly in &summaries.anomalies {
            println!(
                "  row {:>5}  {:<12} {:<10} credit {:>12.2} (z {:+.2})  debit {:>12.2} (z {:+.2})",
                anomaly.index,
                anomaly.transaction.account_type,
                anomaly.transaction.region,
                anomaly.transaction.credit,
                anomaly.credit_z,
                anomaly.transaction.debit,
                anomaly.debit_z
            );
        }
    }
}
