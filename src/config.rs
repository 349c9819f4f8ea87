use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::archive::CRICSHEET_IPL_ZIP_URL;
use crate::corpus::{BuildOptions, DEFAULT_MAX_REPORTED_ERRORS};

pub const DEFAULT_ARCHIVE_PATH: &str = "./ipl_dataset/ipl_json.zip";
pub const DEFAULT_OUT_CSV: &str = "./ipl_dataset/ipl_live_states_2008_2025.csv";
const MAX_THREADS: usize = 32;

/// Builds a ball-by-ball live-state table from Cricsheet match JSON.
#[derive(Debug, Clone, Parser)]
#[command(name = "ipl_live_states", version)]
pub struct BuildArgs {
    /// Cricsheet JSON zip, or a directory of match JSON files
    #[arg(long, env = "IPL_ARCHIVE_PATH", default_value = DEFAULT_ARCHIVE_PATH)]
    pub archive: PathBuf,

    /// where to download the zip from when it is not present locally
    #[arg(long, env = "IPL_ARCHIVE_URL", default_value = CRICSHEET_IPL_ZIP_URL)]
    pub url: String,

    /// where to write the CSV to
    #[arg(long, env = "IPL_OUT_CSV", default_value = DEFAULT_OUT_CSV)]
    pub out: PathBuf,

    /// matches processed in parallel
    #[arg(long, env = "IPL_BUILD_THREADS", default_value_t = 1)]
    pub threads: usize,

    /// never download; fail if the archive is missing
    #[arg(long, env = "IPL_OFFLINE")]
    pub offline: bool,

    /// marker written for values that do not apply (e.g. target in the first innings)
    #[arg(long, default_value = "")]
    pub na_rep: String,
}

impl BuildArgs {
    pub fn build_options(&self) -> BuildOptions {
        BuildOptions {
            threads: self.threads.clamp(1, MAX_THREADS),
            max_reported_errors: DEFAULT_MAX_REPORTED_ERRORS,
        }
    }
}

/// Loads `.env.local` then `.env`; variables already set take precedence.
pub fn load_dotenv() {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");
}

pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
