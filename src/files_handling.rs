
use crate::error::{Error, Result};
use crate::tokenize::DEFAULT_STOP_WORDS;

use std::collections::{BTreeSet, HashSet};
use std::fs::{self, File};
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use flate2::read::GzDecoder;
use log::warn;
use walkdir::WalkDir;


/// How the target list file is laid out.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TargetsFormat {
    /// whitespace separated words, any number per line
    Plain,
    /// hypernym evaluation pairs, `left-pos _ hyper right-pos`
    Hypernym,
}

/// Opens a plain text file, or a gzip stream when the name ends with `.gz`.
pub fn open_text(file_path: &Path) -> Result<Box<dyn BufRead>> {

    let f = File::open(file_path)?;
    let is_gz = file_path.extension().map_or(false, |ext| ext == "gz");
    if is_gz {
        Ok(Box::new(BufReader::new(GzDecoder::new(f))))
    } else {
        Ok(Box::new(BufReader::new(f)))
    }
}

/// Lists every file under `root`. A file root is returned as is, a directory is walked
/// recursively. Paths are sorted so that partitioning is stable between runs.
pub fn file_paths(root: &Path) -> Result<Vec<PathBuf>> {

    let meta = fs::metadata(root)?;
    if meta.is_file() {
        return Ok(vec![root.to_path_buf()]);
    }

    let mut paths = Vec::new();
    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry?;
        if entry.file_type().is_file() {
            paths.push(entry.into_path());
        }
    }
    Ok(paths)
}

/// Loads the target words. An unreadable list is reported and treated as empty.
pub fn load_targets(file_path: &Path, format: TargetsFormat) -> BTreeSet<String> {

    let mut targets = BTreeSet::new();
    let lines = match open_text(file_path) {
        Ok(reader) => reader.lines(),
        Err(e) => {
            warn!("could not read targets from {:?}: {}", file_path, e);
            return targets;
        }
    };

    for line in lines {
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                warn!("stopped reading targets from {:?}: {}", file_path, e);
                break;
            }
        };
        match format {
            TargetsFormat::Plain => parse_plain_targets(&line, &mut targets),
            TargetsFormat::Hypernym => parse_hypernym_targets(&line, &mut targets),
        }
    }
    targets
}

fn parse_plain_targets(line: &str, targets: &mut BTreeSet<String>) {
    for word in line.split_whitespace() {
        targets.insert(word.to_lowercase());
    }
}

fn parse_hypernym_targets(line: &str, targets: &mut BTreeSet<String>) {

    // only pairs annotated as hypernyms, keep the word part of `word-pos`
    let fields: Vec<&str> = line.split_whitespace().collect();
    if fields.len() < 4 || fields[2] != "hyper" {
        return;
    }
    for field in [fields[0], fields[3]] {
        if let Some(word) = field.split('-').next().filter(|w| !w.is_empty()) {
            targets.insert(word.to_lowercase());
        }
    }
}

/// Loads a newline separated stop word list, or the built-in English list when no path
/// is given. An unreadable list is reported and treated as empty.
pub fn load_stop_words(file_path: Option<&Path>) -> HashSet<String> {

    let file_path = match file_path {
        Some(file_path) => file_path,
        None => return DEFAULT_STOP_WORDS.iter().map(|w| w.to_string()).collect(),
    };

    let reader = match open_text(file_path) {
        Ok(reader) => reader,
        Err(e) => {
            warn!("could not read stop words from {:?}: {}", file_path, e);
            return HashSet::new();
        }
    };

    reader
        .lines()
        .map_while(|line| line.ok())
        .map(|line| line.trim().to_string())
        .filter(|word| !word.is_empty())
        .collect()
}

/// Creates the output folder if needed.
pub fn ensure_dir(output_dir: &Path) -> Result<()> {
    fs::create_dir_all(output_dir).map_err(Error::from)
}
