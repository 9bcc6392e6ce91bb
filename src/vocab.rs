
use crate::corpus::{CorpusReader, CountWords};
use crate::partition::for_each_file;

use std::path::PathBuf;
use fnv::FnvHashMap;
use log::info;
use parking_lot::Mutex;
use rayon::ThreadPool;


/// Share of the total token mass that must lie strictly inside the dense block when the
/// cutoff is derived from the corpus.
pub const SOFT_CUTOFF_MASS: f64 = 0.85;


/// Word to rank mapping, rank 0 being the most frequent word. Indices below `cutoff` are
/// stored densely by the accumulator, the rest only exist in soft cutoff mode.
#[derive(Clone, Debug, Default)]
pub struct Vocabulary {
    ranks: FnvHashMap<String, u32>,
    words: Vec<String>,
    cutoff: usize,
    soft_cutoff: bool,
}

impl Vocabulary {

    /// Builds from words already in rank order. `cutoff` is clamped to the number of words.
    pub fn new(words: Vec<String>, cutoff: usize, soft_cutoff: bool) -> Self {
        let ranks = words
            .iter()
            .enumerate()
            .map(|(i, w)| (w.to_owned(), i as u32))
            .collect();
        let cutoff = cutoff.min(words.len());
        Self { ranks, words, cutoff, soft_cutoff }
    }

    /// Ranks the observed words by descending count, ties broken by the word itself.
    /// A positive `dimension` keeps that many words and fixes the cutoff to it, anything
    /// else keeps every word and derives the cutoff from `SOFT_CUTOFF_MASS`.
    pub fn from_counts(counts: FnvHashMap<String, u64>, dimension: i64) -> Self {

        let mut ranked: Vec<(String, u64)> = counts.into_iter().collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

        if dimension > 0 {
            let dimension = dimension as usize;
            if dimension > ranked.len() {
                info!("only {} tokens in corpus, cutoff lowered from {}", ranked.len(), dimension);
            }
            ranked.truncate(dimension);
            let words = ranked.into_iter().map(|(w, _)| w).collect();
            return Self::new(words, dimension, false);
        }

        let frequencies: Vec<u64> = ranked.iter().map(|(_, c)| *c).collect();
        let cutoff = soft_cutoff_rank(&frequencies);
        let words = ranked.into_iter().map(|(w, _)| w).collect();
        Self::new(words, cutoff, true)
    }

    /// Counts every word the reader yields, one pool job per partition. Each file is tallied
    /// locally and merged into the shared table once it is done (or once it failed, so the
    /// part read before the failure still counts).
    pub fn build<R>(reader: &R, partitions: &[Vec<PathBuf>], pool: &ThreadPool, dimension: i64) -> Self
    where
        R: CorpusReader,
        R::Unit: CountWords,
    {
        let shared: Mutex<FnvHashMap<String, u64>> = Mutex::new(FnvHashMap::default());

        for_each_file(pool, partitions, |path| {
            let mut local = FnvHashMap::default();
            let res = reader.read_units(path, |unit| unit.count_words(&mut local));

            let mut table = shared.lock();
            for (word, count) in local {
                *table.entry(word).or_insert(0) += count;
            }
            res
        });

        let counts = shared.into_inner();
        let distinct = counts.len();
        let vocab = Self::from_counts(counts, dimension);
        info!("vocabulary of {} words out of {} distinct, cutoff {} (soft: {})",
            vocab.len(), distinct, vocab.cutoff(), vocab.soft_cutoff());
        vocab
    }

    pub fn rank(&self, word: &str) -> Option<u32> {
        self.ranks.get(word).copied()
    }

    pub fn contains(&self, word: &str) -> bool {
        self.ranks.contains_key(word)
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub fn cutoff(&self) -> usize {
        self.cutoff
    }

    pub fn soft_cutoff(&self) -> bool {
        self.soft_cutoff
    }

    pub fn words(&self) -> &[String] {
        &self.words
    }

    pub fn word(&self, rank: usize) -> Option<&str> {
        self.words.get(rank).map(|w| w.as_str())
    }

    /// Side of the full matrix: every word in soft cutoff mode, the cutoff otherwise.
    pub fn dimension(&self) -> usize {
        if self.soft_cutoff {
            self.len()
        } else {
            self.cutoff
        }
    }
}

/// Smallest `rank + 1` whose cumulative frequency is more than `SOFT_CUTOFF_MASS` of the
/// total, for frequencies sorted in descending order. Zero when there is no mass at all.
pub fn soft_cutoff_rank(frequencies: &[u64]) -> usize {

    let total: u64 = frequencies.iter().sum();
    if total == 0 {
        return 0;
    }

    let mut partial = 0u64;
    for (rank, freq) in frequencies.iter().enumerate() {
        partial += freq;
        if partial as f64 / total as f64 > SOFT_CUTOFF_MASS {
            return rank + 1;
        }
    }
    frequencies.len()
}
