use std::path::{Path, PathBuf};

use colored::Colorize;
use comfy_table::{Cell, CellAlignment, Table};
use tracing::{info, warn};

use crate::categorizer::CategoryMap;
use crate::error::{Result, SpendsortError};
use crate::fmt::{czk, percent};
use crate::importer::{discover, load_all};
use crate::models::CategoryTotal;
use crate::reconciler::{reconcile_transfers, TransferCheck};
use crate::reports::{self, Aggregation, Details, Summary};
use crate::settings::load_settings;

pub const SUMMARY_FILE: &str = "summary.json";
pub const DETAILS_FILE: &str = "details.json";

pub fn run(days: u32) -> Result<()> {
    let settings = load_settings();
    let mapping = CategoryMap::load_dir(&settings.mapping_path())?;

    let data_dir = settings.data_path();
    if !data_dir.is_dir() {
        return Err(SpendsortError::Config(format!(
            "Data directory not found: {}",
            data_dir.display()
        )));
    }
    let files = discover(&data_dir)?;
    let batch = load_all(&files, &mapping);
    if !batch.failures.is_empty() {
        warn!(
            "{} of {} files could not be read",
            batch.failures.len(),
            files.len()
        );
    }

    let check = reconcile_transfers(&batch.transactions, &settings.transfer_category);
    if !check.is_balanced() {
        println!("{}", format_unmatched(&check));
        return check.ensure_balanced();
    }

    let aggregation = reports::aggregate(&batch.transactions, days, &mapping)?;
    println!("{}", format_report(&aggregation, days));

    let summary = Summary::from_aggregation(&aggregation);
    let details = reports::group_details(&batch.transactions, &aggregation);
    write_artifacts(&settings.output_path(), &summary, &details)?;
    Ok(())
}

/// Write `summary.json` and `details.json` into `dir`.
pub fn write_artifacts(dir: &Path, summary: &Summary, details: &Details) -> Result<(PathBuf, PathBuf)> {
    std::fs::create_dir_all(dir)?;
    let summary_path = dir.join(SUMMARY_FILE);
    let details_path = dir.join(DETAILS_FILE);
    write_json(&summary_path, summary)?;
    write_json(&details_path, details)?;
    Ok((summary_path, details_path))
}

pub(crate) fn write_json<T: serde::Serialize>(path: &Path, value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    std::fs::write(path, format!("{json}\n"))?;
    info!("Wrote {}", path.display());
    Ok(())
}

// ---------------------------------------------------------------------------
// Formatting
// ---------------------------------------------------------------------------

fn bucket_table(items: &[CategoryTotal], bucket_total: f64) -> Table {
    let mut table = Table::new();
    table.set_header(vec!["Category", "Amount", "Share"]);
    for item in items {
        table.add_row(vec![
            Cell::new(&item.name),
            Cell::new(czk(item.total)).set_alignment(CellAlignment::Right),
            Cell::new(format!("{:.1} %", percent(item.total, bucket_total)))
                .set_alignment(CellAlignment::Right),
        ]);
    }
    table
}

pub fn format_report(aggregation: &Aggregation, days: u32) -> String {
    let income = aggregation.total_income();
    let expense = aggregation.total_expense();
    let balance = aggregation.balance();

    let mut out = Vec::new();
    out.push(format!("Monthly overview ({days} days of data scaled to 30)").bold().to_string());
    out.push(format!("  Incomes:  {}", czk(income)));
    out.push(format!("  Expenses: {}", czk(expense)));
    let balance_line = format!("  Balance:  {}", czk(balance));
    out.push(if balance >= 0.0 {
        balance_line.green().to_string()
    } else {
        balance_line.red().to_string()
    });

    if !aggregation.incomes.is_empty() {
        out.push(String::new());
        out.push("INCOMES".green().bold().to_string());
        out.push(bucket_table(&aggregation.incomes, income).to_string());
    }
    if !aggregation.expenses.is_empty() {
        out.push(String::new());
        out.push("EXPENSES".red().bold().to_string());
        out.push(bucket_table(&aggregation.expenses, expense).to_string());
    }
    if !aggregation.neutral.is_empty() {
        out.push(String::new());
        out.push("NEUTRAL".dimmed().bold().to_string());
        let names: Vec<&str> = aggregation.neutral.iter().map(|c| c.name.as_str()).collect();
        out.push(format!("  {}", names.join(", ")));
    }
    out.join("\n")
}

pub fn format_unmatched(check: &TransferCheck) -> String {
    let mut table = Table::new();
    table.set_header(vec!["Bank", "Amount", "Date", "Info"]);
    for txn in &check.unmatched {
        table.add_row(vec![
            Cell::new(txn.bank),
            Cell::new(czk(txn.amount)).set_alignment(CellAlignment::Right),
            Cell::new(&txn.date),
            Cell::new(&txn.info),
        ]);
    }
    format!(
        "{}\n{table}",
        format!("Unmatched transfers: {} of {} matched", check.matched, check.total)
            .red()
            .bold()
    )
}
