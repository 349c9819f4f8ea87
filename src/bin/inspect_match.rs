use std::fs;
use std::io;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use ipl_live_states::config;
use ipl_live_states::corpus::process_document;
use ipl_live_states::table::Table;

/// Prints the live-state rows of a single match file.
#[derive(Debug, Parser)]
struct Args {
    /// match JSON file
    path: PathBuf,

    /// print the match record and raw rows as JSON instead of the finalized CSV
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    config::init_tracing();
    let args = Args::parse();

    let bytes = fs::read(&args.path).with_context(|| format!("read {}", args.path.display()))?;
    let name = args.path.display().to_string();
    let parsed = process_document(&name, &bytes)?;

    if args.json {
        let out = serde_json::json!({
            "record": parsed.record,
            "stats": {
                "innings": parsed.stats.innings,
                "deliveries": parsed.stats.deliveries,
                "illegal": parsed.stats.illegal,
                "super_over": parsed.stats.super_over,
            },
            "rows": parsed.rows,
        });
        println!(
            "{}",
            serde_json::to_string_pretty(&out).context("serialize rows")?
        );
        return Ok(());
    }

    let mut table = Table::deliveries();
    for row in &parsed.rows {
        table.push_delivery(row, &parsed.record);
    }
    table.finalize();
    table.write_csv_to(io::stdout().lock(), "")?;
    Ok(())
}
