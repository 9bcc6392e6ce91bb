//! Density matrices over pre-trained word vectors instead of vocabulary indices. A line's
//! context is the sum of the vectors of its words, and every target occurrence adds the
//! outer product of that context (minus its own vector) to the target's matrix.

use crate::accumulate::TargetSet;
use crate::error::{Error, Result};
use crate::files_handling::open_text;
use crate::vocab::Vocabulary;

use std::io::BufRead;
use std::path::Path;
use fnv::FnvHashMap;
use log::{info, warn};
use ndarray::{Array1, Array2};
use parking_lot::Mutex;


/// Vectors of the context words, all of the same length.
#[derive(Clone, Debug, Default)]
pub struct WordVectors {
    vectors: FnvHashMap<String, Array1<f32>>,
    dim: usize,
}

impl WordVectors {

    /// Loads `word v1 v2 ...` lines, keeping the words of `vocab`. The first kept vector
    /// fixes the length, later vectors of another length are skipped.
    pub fn load(file_path: &Path, vocab: &Vocabulary) -> Result<Self> {

        let mut vectors = FnvHashMap::default();
        let mut dim = None;

        for (line_i, line) in open_text(file_path)?.lines().enumerate() {
            let line = line?;
            let mut fields = line.split_whitespace();
            let word = match fields.next() {
                Some(word) if vocab.contains(word) => word.to_string(),
                _ => continue,
            };

            let values = fields
                .map(|v| v.parse::<f32>())
                .collect::<std::result::Result<Vec<f32>, _>>()
                .map_err(|e| Error::parse(format!("{:?} line {}: {}", file_path, line_i + 1, e)))?;

            match dim {
                None => dim = Some(values.len()),
                Some(d) if d != values.len() => {
                    warn!("vector for {} has {} values instead of {}, skipping", word, values.len(), d);
                    continue;
                }
                Some(_) => {}
            }
            vectors.insert(word, Array1::from(values));
        }

        if vectors.len() < vocab.len() {
            warn!("vectors exist for only {} out of {} context words", vectors.len(), vocab.len());
        }
        let dim = dim.unwrap_or(0);
        info!("loaded {} word vectors of dimension {}", vectors.len(), dim);
        Ok(Self { vectors, dim })
    }

    pub fn from_map(vectors: FnvHashMap<String, Array1<f32>>) -> Self {
        let dim = vectors.values().next().map_or(0, |v| v.len());
        Self { vectors, dim }
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    pub fn get(&self, word: &str) -> Option<&Array1<f32>> {
        self.vectors.get(word)
    }

    /// Sum of the vectors of `tokens`, words without a vector contribute nothing.
    pub fn context(&self, tokens: &[String]) -> Array1<f32> {
        let mut output = Array1::<f32>::zeros(self.dim);
        for vector in tokens.iter().filter_map(|tok| self.vectors.get(tok)) {
            output += vector;
        }
        output
    }
}


pub struct EmbeddingMatrices<'w> {
    vectors: &'w WordVectors,
    targets: TargetSet,
    // upper triangle only, mirrored on read
    matrices: Vec<Mutex<Array2<f32>>>,
}

impl<'w> EmbeddingMatrices<'w> {

    pub fn new(vectors: &'w WordVectors, targets: TargetSet) -> Self {
        let dim = vectors.dim();
        let matrices = (0..targets.len()).map(|_| Mutex::new(Array2::zeros((dim, dim)))).collect();
        Self { vectors, targets, matrices }
    }

    pub fn targets(&self) -> &TargetSet {
        &self.targets
    }

    pub fn dim(&self) -> usize {
        self.vectors.dim()
    }

    /// Accumulates every target occurrence of one tokenized line.
    pub fn process_line(&self, tokens: &[String]) {
        let base = self.vectors.context(tokens);
        for tok in tokens {
            self.accumulate(tok, &base);
        }
    }

    pub fn accumulate(&self, target: &str, base: &Array1<f32>) {

        let target_id = match self.targets.id(target) {
            Some(id) => id as usize,
            None => return,
        };

        let context = match self.vectors.get(target) {
            Some(own) => base - own,
            None => base.clone(),
        };

        let dim = self.dim();
        let mut matrix = self.matrices[target_id].lock();
        for i in 0..dim {
            for j in i..dim {
                matrix[[i, j]] += context[i] * context[j];
            }
        }
    }

    pub fn matrix(&self, target: &str) -> Option<Array2<f32>> {

        let target_id = self.targets.id(target)? as usize;
        let mut output = self.matrices[target_id].lock().clone();
        let dim = self.dim();
        for i in 0..dim {
            for j in i + 1..dim {
                output[[j, i]] = output[[i, j]];
            }
        }
        Some(output)
    }
}
