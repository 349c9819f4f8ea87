use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use chrono::Utc;
use rayon::prelude::*;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::archive::{MatchSource, SourceDocument};
use crate::coerce::to_mapping;
use crate::live_state::{DeliveryRow, TrackedMatch, TrackerStats, track_match};
use crate::match_info::{MatchRecord, parse_match_info};
use crate::table::Table;

pub const DEFAULT_MAX_REPORTED_ERRORS: usize = 50;

#[derive(Debug, Clone)]
pub struct BuildOptions {
    /// Matches processed in parallel. 1 keeps the build on the calling thread.
    pub threads: usize,
    pub max_reported_errors: usize,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            threads: 1,
            max_reported_errors: DEFAULT_MAX_REPORTED_ERRORS,
        }
    }
}

pub struct BuildProgress {
    pub current: usize,
    pub total: usize,
    pub message: String,
}

#[derive(Debug, Clone)]
pub struct CorpusReport {
    pub started_at: String,
    pub finished_at: String,
    pub files_total: usize,
    pub matches_parsed: usize,
    pub files_skipped: usize,
    pub rows: usize,
    /// The first few per-file diagnostics.
    pub errors: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct Corpus {
    pub table: Table,
    pub report: CorpusReport,
}

/// One fully processed match, ready to be committed to the table.
#[derive(Debug, Clone)]
pub struct MatchRows {
    pub source: String,
    pub record: MatchRecord,
    pub rows: Vec<DeliveryRow>,
    pub stats: TrackerStats,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildOutcome {
    Written { path: PathBuf, rows: usize },
    /// No rows across the whole corpus; nothing was written.
    Empty,
}

/// Decodes and tracks one match document.
pub fn process_document(name: &str, bytes: &[u8]) -> Result<MatchRows> {
    let doc: Value =
        serde_json::from_slice(bytes).with_context(|| format!("decode json in {name}"))?;
    if !doc.is_object() && to_mapping(&doc).is_empty() {
        bail!("{name}: top level is not a JSON object");
    }

    let record = parse_match_info(&doc);
    let TrackedMatch { mut rows, stats } = track_match(&doc, &record);
    stamp_match_fields(&mut rows, &record);
    Ok(MatchRows {
        source: name.to_string(),
        record,
        rows,
        stats,
    })
}

/// Re-applies the match-level columns to every row of the match.
pub fn stamp_match_fields(rows: &mut [DeliveryRow], record: &MatchRecord) {
    for row in rows {
        row.season = record.season.clone();
        row.date = record.date.clone();
        row.city = record.city.clone();
        row.venue = record.venue.clone();
    }
}

pub fn build_corpus(
    source: &MatchSource,
    options: &BuildOptions,
    on_progress: impl FnMut(BuildProgress),
) -> Result<Corpus> {
    let documents = source
        .documents()
        .with_context(|| format!("list match documents in {}", source.path().display()))?;
    info!(matches = documents.len(), "matches to parse");
    Ok(build_from_documents(documents, options, on_progress))
}

/// Processes every document and commits each match's rows in source order. On one thread
/// each document is read, tracked and committed before the next is read. With more than
/// one thread, documents are read up front and tracked in parallel, but still committed
/// whole and in order.
pub fn build_from_documents(
    documents: impl ExactSizeIterator<Item = SourceDocument>,
    options: &BuildOptions,
    mut on_progress: impl FnMut(BuildProgress),
) -> Corpus {
    let mut builder = CorpusBuilder::new(documents.len(), options.max_reported_errors);

    if options.threads > 1 {
        let documents: Vec<SourceDocument> = documents.collect();
        let processed: Vec<(String, Result<MatchRows>)> = with_build_pool(options.threads, || {
            documents
                .into_par_iter()
                .map(|doc| {
                    let result = process_source(&doc);
                    (doc.name, result)
                })
                .collect()
        });
        for (name, result) in processed {
            builder.commit(&name, result);
            on_progress(builder.progress(&name));
        }
    } else {
        for doc in documents {
            let result = process_source(&doc);
            builder.commit(&doc.name, result);
            on_progress(builder.progress(&doc.name));
        }
    }

    builder.finish()
}

/// Writes the finalized table, or nothing when the corpus produced no rows.
pub fn write_corpus(corpus: &Corpus, out: &Path, missing: &str) -> Result<BuildOutcome> {
    if corpus.table.is_empty() {
        warn!("no rows parsed; nothing written");
        return Ok(BuildOutcome::Empty);
    }
    corpus
        .table
        .write_csv(out, missing)
        .with_context(|| format!("write {}", out.display()))?;
    info!(path = %out.display(), rows = corpus.table.len(), "wrote live-state table");
    Ok(BuildOutcome::Written {
        path: out.to_path_buf(),
        rows: corpus.table.len(),
    })
}

fn process_source(doc: &SourceDocument) -> Result<MatchRows> {
    match &doc.data {
        Ok(bytes) => process_document(&doc.name, bytes),
        Err(err) => bail!("read {}: {err:#}", doc.name),
    }
}

struct CorpusBuilder {
    table: Table,
    report: CorpusReport,
    max_reported_errors: usize,
    done: usize,
}

impl CorpusBuilder {
    fn new(files_total: usize, max_reported_errors: usize) -> Self {
        Self {
            table: Table::deliveries(),
            report: CorpusReport {
                started_at: Utc::now().to_rfc3339(),
                finished_at: String::new(),
                files_total,
                matches_parsed: 0,
                files_skipped: 0,
                rows: 0,
                errors: Vec::new(),
            },
            max_reported_errors,
            done: 0,
        }
    }

    fn commit(&mut self, name: &str, result: Result<MatchRows>) {
        self.done += 1;
        match result {
            Ok(parsed) => {
                debug!(
                    source = name,
                    match_id = %parsed.record.match_id,
                    rows = parsed.rows.len(),
                    innings = parsed.stats.innings,
                    illegal = parsed.stats.illegal,
                    super_over = parsed.stats.super_over,
                    "tracked match"
                );
                for row in &parsed.rows {
                    self.table.push_delivery(row, &parsed.record);
                }
                self.report.matches_parsed += 1;
                self.report.rows += parsed.rows.len();
            }
            Err(err) => {
                warn!("skipping {name}: {err:#}");
                self.report.files_skipped += 1;
                if self.report.errors.len() < self.max_reported_errors {
                    self.report.errors.push(format!("{name}: {err:#}"));
                }
            }
        }
    }

    fn progress(&self, name: &str) -> BuildProgress {
        BuildProgress {
            current: self.done,
            total: self.report.files_total,
            message: name.to_string(),
        }
    }

    fn finish(mut self) -> Corpus {
        self.table.finalize();
        self.report.finished_at = Utc::now().to_rfc3339();
        Corpus {
            table: self.table,
            report: self.report,
        }
    }
}

fn with_build_pool<T>(threads: usize, action: impl FnOnce() -> T + Send) -> T
where
    T: Send,
{
    match rayon::ThreadPoolBuilder::new().num_threads(threads).build() {
        Ok(pool) => pool.install(action),
        Err(err) => {
            warn!("thread pool unavailable, building on one thread: {err}");
            action()
        }
    }
}
