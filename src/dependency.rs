//! Dependency parsed corpora. Files hold one JSON object per line (optionally gzipped):
//!
//! ```text
//! {"words": ["The", "cat", "sat"], "dependencies": [["det", 1, 0], ["nsubj", 2, 1], ["root", -1, 2]]}
//! ```
//!
//! Indices are 0-based word positions, a negative index marks the virtual root.

use crate::corpus::{bump, CorpusReader, CountWords};
use crate::error::Result;
use crate::files_handling::open_text;

use std::collections::{BTreeMap, HashSet};
use std::io::BufRead;
use std::path::Path;
use fnv::FnvHashMap;
use log::warn;
use serde::Deserialize;


/// Relations that carry no lexical information.
pub const RELATION_STOPLIST: &[&str] = &["det", "punct", "mark", "cc", "case", "cop", "root", "dep"];


/// Retained edges of a sentence and the words at the positions they reference.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ParsedSentence {
    words: BTreeMap<usize, String>,
    pub edges: Vec<(usize, usize)>,
}

impl ParsedSentence {

    /// Keeps only the words referenced by an edge. Edges pointing past `words` are dropped.
    pub fn new(words: Vec<String>, edges: Vec<(usize, usize)>) -> Self {

        let edges: Vec<(usize, usize)> = edges
            .into_iter()
            .filter(|&(a, b)| a < words.len() && b < words.len())
            .collect();

        let mut referenced = BTreeMap::new();
        for &(a, b) in &edges {
            for i in [a, b] {
                referenced.entry(i).or_insert_with(|| words[i].clone());
            }
        }
        Self { words: referenced, edges }
    }

    pub fn word(&self, position: usize) -> Option<&str> {
        self.words.get(&position).map(|w| w.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }
}

// every referenced position counts once, however many edges it takes part in
impl CountWords for ParsedSentence {
    fn count_words(&self, counts: &mut FnvHashMap<String, u64>) {
        for word in self.words.values() {
            bump(counts, word);
        }
    }
}


#[derive(Deserialize)]
struct RawSentence {
    words: Vec<String>,
    #[serde(default)]
    dependencies: Vec<(String, i64, i64)>,
}


/// Reads JSON lines sentences, lowercasing words and keeping the edges that are not
/// stoplisted and touch at least one target.
pub struct ParsedCorpusReader {
    targets: HashSet<String>,
    stoplist: HashSet<&'static str>,
}

impl ParsedCorpusReader {

    pub fn new<I: IntoIterator<Item = String>>(targets: I) -> Self {
        Self {
            targets: targets.into_iter().collect(),
            stoplist: RELATION_STOPLIST.iter().copied().collect(),
        }
    }

    fn filter(&self, raw: RawSentence) -> ParsedSentence {

        let words: Vec<String> = raw.words.iter().map(|w| w.to_lowercase()).collect();
        let n = words.len() as i64;

        let edges = raw
            .dependencies
            .iter()
            .filter(|(rel, _, _)| !self.stoplist.contains(rel.as_str()))
            .filter(|(_, head, dep)| (0..n).contains(head) && (0..n).contains(dep))
            .map(|(_, head, dep)| (*head as usize, *dep as usize))
            .filter(|&(head, dep)| self.targets.contains(&words[head]) || self.targets.contains(&words[dep]))
            .collect();

        ParsedSentence::new(words, edges)
    }
}

impl CorpusReader for ParsedCorpusReader {
    type Unit = ParsedSentence;

    fn read_units<F>(&self, file_path: &Path, mut f: F) -> Result<()>
    where
        F: FnMut(&Self::Unit),
    {
        let lines = open_text(file_path)?.lines();
        for (line_i, line) in lines.enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let raw: RawSentence = match serde_json::from_str(&line) {
                Ok(raw) => raw,
                Err(e) => {
                    warn!("{:?} line {}: skipping malformed sentence: {}", file_path, line_i + 1, e);
                    continue;
                }
            };
            let sentence = self.filter(raw);
            if !sentence.is_empty() {
                f(&sentence);
            }
        }
        Ok(())
    }
}
