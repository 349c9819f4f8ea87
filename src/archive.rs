//! Locating, downloading and reading the corpus of match documents.

use std::fs;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, anyhow, bail};
use tracing::{info, warn};

use crate::http_client::fetch_binary;

pub const CRICSHEET_IPL_ZIP_URL: &str = "https://cricsheet.org/downloads/ipl_json.zip";

const DOWNLOAD_ATTEMPTS: u32 = 4;
const BACKOFF_STEP_MS: u64 = 500;

/// Returns `path` if it already exists, downloading `url` into it otherwise.
pub fn ensure_archive(path: &Path, url: &str, offline: bool) -> Result<PathBuf> {
    if path.exists() {
        info!(path = %path.display(), "using existing match archive");
        return Ok(path.to_path_buf());
    }
    if offline {
        bail!(
            "no match archive at {} and downloads are disabled; place the Cricsheet JSON zip there",
            path.display()
        );
    }
    info!(url, path = %path.display(), "downloading match archive");
    download_file(url, path)
}

pub fn download_file(url: &str, path: &Path) -> Result<PathBuf> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).with_context(|| format!("create {}", parent.display()))?;
    }

    let mut last_err: Option<anyhow::Error> = None;
    for attempt in 1..=DOWNLOAD_ATTEMPTS {
        match fetch_binary(url) {
            Ok(bytes) => {
                let tmp = path.with_extension("zip.part");
                fs::write(&tmp, &bytes).with_context(|| format!("write {}", tmp.display()))?;
                fs::rename(&tmp, path).with_context(|| format!("swap {}", path.display()))?;
                info!(bytes = bytes.len(), path = %path.display(), "saved match archive");
                return Ok(path.to_path_buf());
            }
            Err(err) => {
                warn!(attempt, "archive download failed: {err:#}");
                last_err = Some(err);
                if attempt < DOWNLOAD_ATTEMPTS {
                    std::thread::sleep(Duration::from_millis(
                        BACKOFF_STEP_MS.saturating_mul(u64::from(attempt)),
                    ));
                }
            }
        }
    }
    Err(last_err.unwrap_or_else(|| anyhow!("download failed for {url}")))
}

/// One match file as read from the source. A read failure is kept per file so that the
/// rest of the corpus still builds.
#[derive(Debug)]
pub struct SourceDocument {
    pub name: String,
    pub data: Result<Vec<u8>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchSource {
    Zip(PathBuf),
    Dir(PathBuf),
}

impl MatchSource {
    pub fn open(path: &Path) -> Result<Self> {
        let md = fs::metadata(path).with_context(|| format!("stat {}", path.display()))?;
        if md.is_dir() {
            Ok(MatchSource::Dir(path.to_path_buf()))
        } else {
            Ok(MatchSource::Zip(path.to_path_buf()))
        }
    }

    pub fn path(&self) -> &Path {
        match self {
            MatchSource::Zip(path) | MatchSource::Dir(path) => path,
        }
    }

    /// Lists every `.json` document, in archive order for zips and path order for
    /// directories. Contents are read one document at a time as the iterator advances.
    pub fn documents(&self) -> Result<Documents> {
        match self {
            MatchSource::Zip(path) => {
                let file = fs::File::open(path).with_context(|| format!("open {}", path.display()))?;
                let archive = zip::ZipArchive::new(BufReader::new(file))
                    .with_context(|| format!("read zip {}", path.display()))?;
                let names: Vec<String> = archive
                    .file_names()
                    .filter(|name| is_json_name(name))
                    .map(str::to_string)
                    .collect();
                Ok(Documents::Zip {
                    archive,
                    names: names.into_iter(),
                })
            }
            MatchSource::Dir(root) => {
                let mut paths = Vec::new();
                collect_json_files(root, &mut paths)?;
                paths.sort();
                Ok(Documents::Dir {
                    root: root.clone(),
                    paths: paths.into_iter(),
                })
            }
        }
    }

    /// Every document with its contents, read up front.
    pub fn read_documents(&self) -> Result<Vec<SourceDocument>> {
        Ok(self.documents()?.collect())
    }
}

/// Streaming reader over the documents of a [`MatchSource`].
pub enum Documents {
    Zip {
        archive: zip::ZipArchive<BufReader<fs::File>>,
        names: std::vec::IntoIter<String>,
    },
    Dir {
        root: PathBuf,
        paths: std::vec::IntoIter<PathBuf>,
    },
}

impl Iterator for Documents {
    type Item = SourceDocument;

    fn next(&mut self) -> Option<SourceDocument> {
        match self {
            Documents::Zip { archive, names } => {
                let name = names.next()?;
                let data = read_zip_entry(archive, &name);
                Some(SourceDocument { name, data })
            }
            Documents::Dir { root, paths } => {
                let path = paths.next()?;
                let name = path
                    .strip_prefix(root.as_path())
                    .unwrap_or(&path)
                    .display()
                    .to_string();
                let data = fs::read(&path).with_context(|| format!("read {}", path.display()));
                Some(SourceDocument { name, data })
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        match self {
            Documents::Zip { names, .. } => names.size_hint(),
            Documents::Dir { paths, .. } => paths.size_hint(),
        }
    }
}

impl ExactSizeIterator for Documents {}

fn is_json_name(name: &str) -> bool {
    name.ends_with(".json")
}

fn read_zip_entry(archive: &mut zip::ZipArchive<BufReader<fs::File>>, name: &str) -> Result<Vec<u8>> {
    let mut entry = archive
        .by_name(name)
        .with_context(|| format!("open zip entry {name}"))?;
    let mut buf = Vec::with_capacity(usize::try_from(entry.size()).unwrap_or(0));
    entry
        .read_to_end(&mut buf)
        .with_context(|| format!("inflate {name}"))?;
    Ok(buf)
}

fn collect_json_files(path: &Path, files: &mut Vec<PathBuf>) -> Result<()> {
    let md = fs::metadata(path).with_context(|| format!("stat {}", path.display()))?;
    if md.is_dir() {
        let entries = fs::read_dir(path).with_context(|| format!("list {}", path.display()))?;
        for entry in entries {
            let entry = entry.with_context(|| format!("list {}", path.display()))?;
            collect_json_files(&entry.path(), files)?;
        }
    } else if path
        .file_name()
        .and_then(|name| name.to_str())
        .is_some_and(is_json_name)
    {
        files.push(path.to_path_buf());
    }
    Ok(())
}
