use anyhow::Result;
use clap::Parser;
use tracing::{debug, info};

use ipl_live_states::archive::{self, MatchSource};
use ipl_live_states::config::{self, BuildArgs};
use ipl_live_states::corpus::{self, BuildOutcome};

const PROGRESS_EVERY: usize = 100;

fn main() -> Result<()> {
    config::load_dotenv();
    config::init_tracing();

    let args = BuildArgs::parse();
    debug!("args: {args:?}");

    let archive_path = archive::ensure_archive(&args.archive, &args.url, args.offline)?;
    let source = MatchSource::open(&archive_path)?;
    let corpus = corpus::build_corpus(&source, &args.build_options(), |progress| {
        if progress.current % PROGRESS_EVERY == 0 || progress.current == progress.total {
            info!(
                "parsed {}/{} matches (last: {})",
                progress.current, progress.total, progress.message
            );
        }
    })?;

    let report = &corpus.report;
    println!("Live-state build complete");
    println!("Source: {}", source.path().display());
    println!(
        "Matches: {}/{} (skipped {})",
        report.matches_parsed, report.files_total, report.files_skipped
    );
    if !report.errors.is_empty() {
        println!("Errors: {}", report.errors.len());
        for err in report.errors.iter().take(8) {
            println!(" - {err}");
        }
    }

    match corpus::write_corpus(&corpus, &args.out, &args.na_rep)? {
        BuildOutcome::Written { path, rows } => {
            println!("Wrote {} rows: {}", rows, path.display());
        }
        BuildOutcome::Empty => println!("No rows parsed. Nothing written."),
    }

    Ok(())
}
