//! Typed records decoded from the analysis job's JSON-lines output.
//!
//! Each input folder holds one or more `*.json` files, one JSON object per
//! line. Files are read in filename order so runs are reproducible.

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// A subreddit with its degree, one per node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DegreeRecord {
    pub subreddit: String,
}

/// An aggregated link between two subreddits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkRecord {
    pub source: String,
    pub target: String,
    #[serde(rename = "cnt")]
    pub count: u64,
}

/// One entry of a top-sources or top-targets list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopSubredditRecord {
    pub subreddit: String,
}

fn is_json_file(path: &Path) -> bool {
    path.is_file() && path.extension().is_some_and(|ext| ext == "json")
}

/// Sorted paths of the `.json` files directly inside `folder`.
pub fn json_files_in(folder: &Path) -> Result<Vec<PathBuf>> {
    let entries = fs::read_dir(folder)
        .with_context(|| format!("failed to read folder {}", folder.display()))?;

    let mut files = Vec::new();
    for entry in entries {
        let path = entry
            .with_context(|| format!("failed to list folder {}", folder.display()))?
            .path();
        if is_json_file(&path) {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Decode every record in one JSON-lines file.
///
/// Blank lines are skipped. The first malformed line aborts with an error
/// naming the file and its 1-based line number.
pub fn read_json_lines<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let file = File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    let reader = BufReader::new(file);

    let mut records = Vec::new();
    for (idx, line) in reader.lines().enumerate() {
        let line_no = idx + 1;
        let line =
            line.with_context(|| format!("failed to read {}:{}", path.display(), line_no))?;
        if line.trim().is_empty() {
            continue;
        }
        let record = serde_json::from_str(&line)
            .with_context(|| format!("invalid record at {}:{}", path.display(), line_no))?;
        records.push(record);
    }
    Ok(records)
}

/// Load all records from every JSON-lines file in a folder.
pub fn load_folder<T: DeserializeOwned>(folder: &Path) -> Result<Vec<T>> {
    info!("reading folder: {}", folder.display());

    let mut records = Vec::new();
    for path in json_files_in(folder)? {
        let mut batch = read_json_lines(&path)?;
        debug!(file = %path.display(), records = batch.len(), "decoded file");
        records.append(&mut batch);
    }
    Ok(records)
}
