//! Thread safe accumulation of density matrices. The upper triangle below the cutoff is
//! shared between all targets, one lock per cell, each cell mapping target ids to values.
//! Pairs reaching past the cutoff go to a per-target overflow map in soft cutoff mode.

use crate::codec::{Entry, SparseMatrix};
use crate::vocab::Vocabulary;

use fnv::FnvHashMap;
use ndarray::{Array1, Array2};
use parking_lot::Mutex;


/// Context multiset, surface word to count.
pub type ContextCounts<'a> = FnvHashMap<&'a str, u32>;


/// Sorted, deduplicated target words, each with a dense id.
#[derive(Clone, Debug, Default)]
pub struct TargetSet {
    ids: FnvHashMap<String, u32>,
    words: Vec<String>,
}

impl TargetSet {

    pub fn new<I: IntoIterator<Item = String>>(words: I) -> Self {
        let mut words: Vec<String> = words.into_iter().collect();
        words.sort();
        words.dedup();
        let ids = words.iter().enumerate().map(|(i, w)| (w.to_owned(), i as u32)).collect();
        Self { ids, words }
    }

    pub fn id(&self, word: &str) -> Option<u32> {
        self.ids.get(word).copied()
    }

    pub fn contains(&self, word: &str) -> bool {
        self.ids.contains_key(word)
    }

    pub fn words(&self) -> &[String] {
        &self.words
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}


type Cell = Mutex<FnvHashMap<u32, f32>>;

pub struct DensityMatrices<'v> {
    vocab: &'v Vocabulary,
    targets: TargetSet,
    // row x holds cells (x, x) .. (x, cutoff - 1)
    cells: Vec<Vec<Cell>>,
    overflow: Vec<Mutex<FnvHashMap<(u32, u32), f32>>>,
    vectors: Option<Vec<Cell>>,
}

impl<'v> DensityMatrices<'v> {

    pub fn new(vocab: &'v Vocabulary, targets: TargetSet, with_vectors: bool) -> Self {

        let cutoff = vocab.cutoff();
        let cells = (0..cutoff)
            .map(|x| (x..cutoff).map(|_| Cell::default()).collect())
            .collect();
        let overflow = if vocab.soft_cutoff() {
            (0..targets.len()).map(|_| Mutex::default()).collect()
        } else {
            Vec::new()
        };
        let vectors = with_vectors.then(|| (0..cutoff).map(|_| Cell::default()).collect());

        Self { vocab, targets, cells, overflow, vectors }
    }

    pub fn targets(&self) -> &TargetSet {
        &self.targets
    }

    pub fn vocab(&self) -> &Vocabulary {
        self.vocab
    }

    pub fn dimension(&self) -> usize {
        self.vocab.dimension()
    }

    pub fn has_vectors(&self) -> bool {
        self.vectors.is_some()
    }

    /// Adds the outer product of `context` (restricted to the vocabulary) to the matrix of
    /// `target`. Callers may run this concurrently for any mix of targets.
    pub fn accumulate(&self, target: &str, context: &ContextCounts) {

        let target_id = match self.targets.id(target) {
            Some(id) => id,
            None => return,
        };

        let mut ranked: Vec<(u32, u32)> = context
            .iter()
            .filter_map(|(word, count)| self.vocab.rank(word).map(|rank| (rank, *count)))
            .collect();
        ranked.sort_unstable_by_key(|(rank, _)| *rank);

        let cutoff = self.vocab.cutoff() as u32;
        let mut overflow: Vec<((u32, u32), f32)> = Vec::new();

        for (i, &(x, outer)) in ranked.iter().enumerate() {

            if let Some(vectors) = &self.vectors {
                if x < cutoff && outer > 0 {
                    *vectors[x as usize].lock().entry(target_id).or_insert(0.0) += outer as f32;
                }
            }

            for &(y, inner) in &ranked[i..] {
                let value = (outer as u64 * inner as u64) as f32;
                if value == 0.0 {
                    continue;
                }
                if y < cutoff {
                    let cell = &self.cells[x as usize][(y - x) as usize];
                    *cell.lock().entry(target_id).or_insert(0.0) += value;
                } else if self.vocab.soft_cutoff() {
                    overflow.push(((x, y), value));
                }
            }
        }

        // one flush per call, after every cell lock is released
        if !overflow.is_empty() {
            let mut matrix = self.overflow[target_id as usize].lock();
            for (coords, value) in overflow {
                *matrix.entry(coords).or_insert(0.0) += value;
            }
        }
    }

    /// Full symmetric matrix of `target`, `None` for words outside the target set.
    pub fn matrix(&self, target: &str) -> Option<Array2<f32>> {

        let target_id = self.targets.id(target)?;
        let n = self.dimension();
        let mut output = Array2::<f32>::zeros((n, n));

        for (x, row) in self.cells.iter().enumerate() {
            for (offset, cell) in row.iter().enumerate() {
                if let Some(value) = cell.lock().get(&target_id) {
                    let y = x + offset;
                    output[[x, y]] = *value;
                    output[[y, x]] = *value;
                }
            }
        }
        if let Some(matrix) = self.overflow.get(target_id as usize) {
            for (&(x, y), value) in matrix.lock().iter() {
                output[[x as usize, y as usize]] = *value;
                output[[y as usize, x as usize]] = *value;
            }
        }
        Some(output)
    }

    /// Marginal counts of `target` over the dense indices, when vectors are tracked.
    pub fn vector(&self, target: &str) -> Option<Array1<f32>> {

        let target_id = self.targets.id(target)?;
        let vectors = self.vectors.as_ref()?;
        let values = vectors
            .iter()
            .map(|cell| cell.lock().get(&target_id).copied().unwrap_or(0.0))
            .collect::<Vec<f32>>();
        Some(Array1::from(values))
    }

    /// Stored entries of every target in one pass over the cells, indexed like
    /// `targets().words()`. Dense entries come first in ascending (x, y) order, then the
    /// overflow sorted the same way.
    pub fn sparse_matrices(&self) -> Vec<SparseMatrix> {

        let mut entries: Vec<Vec<Entry>> = vec![Vec::new(); self.targets.len()];

        for (x, row) in self.cells.iter().enumerate() {
            for (offset, cell) in row.iter().enumerate() {
                for (&target_id, &value) in cell.lock().iter() {
                    entries[target_id as usize].push(Entry { x: x as u32, y: (x + offset) as u32, value });
                }
            }
        }

        for (target_entries, matrix) in entries.iter_mut().zip(self.overflow.iter()) {
            let mut extra: Vec<Entry> = matrix
                .lock()
                .iter()
                .map(|(&(x, y), &value)| Entry { x, y, value })
                .collect();
            extra.sort_unstable_by_key(|e| (e.x, e.y));
            target_entries.extend(extra);
        }

        entries.into_iter().map(SparseMatrix::new).collect()
    }
}


#[cfg(test)]
mod tests {

    use super::*;
    use ndarray::array;

    fn vocab(words: &[&str], cutoff: usize, soft: bool) -> Vocabulary {
        Vocabulary::new(words.iter().map(|w| w.to_string()).collect(), cutoff, soft)
    }

    fn targets(words: &[&str]) -> TargetSet {
        TargetSet::new(words.iter().map(|w| w.to_string()))
    }

    fn context<'a>(pairs: &[(&'a str, u32)]) -> ContextCounts<'a> {
        pairs.iter().copied().collect()
    }

    #[test]
    fn target_set_is_sorted_and_deduplicated() {
        let set = targets(&["gamma", "alpha", "gamma"]);
        assert_eq!(set.words(), &["alpha".to_string(), "gamma".to_string()]);
        assert_eq!(set.id("gamma"), Some(1));
        assert!(!set.contains("beta"));
    }

    #[test]
    fn outer_product_is_symmetric() {

        let vocab = vocab(&["beta", "gamma", "alpha"], 3, false);
        let matrices = DensityMatrices::new(&vocab, targets(&["alpha"]), false);
        matrices.accumulate("alpha", &context(&[("beta", 2), ("gamma", 1)]));

        let expected = array![[4.0, 2.0, 0.0], [2.0, 1.0, 0.0], [0.0, 0.0, 0.0]];
        let matrix = matrices.matrix("alpha").unwrap();
        assert_eq!(matrix, expected);
        assert_eq!(matrix, matrix.t());
    }

    #[test]
    fn non_targets_and_unknown_words_are_ignored() {

        let vocab = vocab(&["beta", "gamma"], 2, false);
        let matrices = DensityMatrices::new(&vocab, targets(&["alpha"]), false);
        matrices.accumulate("beta", &context(&[("beta", 1), ("gamma", 1)]));
        matrices.accumulate("alpha", &context(&[("delta", 3)]));

        assert!(matrices.matrix("beta").is_none());
        assert_eq!(matrices.matrix("alpha").unwrap().sum(), 0.0);
        assert!(matrices.sparse_matrices()[0].entries().is_empty());
    }

    #[test]
    fn zero_counts_are_not_stored() {

        let vocab = vocab(&["beta", "gamma"], 2, false);
        let matrices = DensityMatrices::new(&vocab, targets(&["beta"]), true);
        matrices.accumulate("beta", &context(&[("beta", 0), ("gamma", 2)]));

        let sparse = matrices.sparse_matrices();
        assert_eq!(sparse[0].entries(), &[Entry { x: 1, y: 1, value: 4.0 }]);
        assert_eq!(matrices.vector("beta").unwrap(), array![0.0, 2.0]);
    }

    #[test]
    fn hard_cutoff_drops_pairs_past_cutoff() {

        let vocab = vocab(&["a", "b", "c"], 2, false);
        let matrices = DensityMatrices::new(&vocab, targets(&["t"]), false);
        matrices.accumulate("t", &context(&[("a", 1), ("c", 5)]));

        let matrix = matrices.matrix("t").unwrap();
        assert_eq!(matrix.dim(), (2, 2));
        assert_eq!(matrix, array![[1.0, 0.0], [0.0, 0.0]]);
    }

    #[test]
    fn soft_cutoff_keeps_overflow() {

        let vocab = vocab(&["a", "b", "c"], 1, true);
        let matrices = DensityMatrices::new(&vocab, targets(&["t"]), true);
        matrices.accumulate("t", &context(&[("a", 1), ("c", 2)]));
        matrices.accumulate("t", &context(&[("b", 1)]));

        let expected = array![[1.0, 0.0, 2.0], [0.0, 1.0, 0.0], [2.0, 0.0, 4.0]];
        assert_eq!(matrices.matrix("t").unwrap(), expected);

        let entries = matrices.sparse_matrices()[0].entries().to_vec();
        assert_eq!(entries, vec![
            Entry { x: 0, y: 0, value: 1.0 },
            Entry { x: 0, y: 2, value: 2.0 },
            Entry { x: 1, y: 1, value: 1.0 },
            Entry { x: 2, y: 2, value: 4.0 },
        ]);
        // only index 0 is below the cutoff
        assert_eq!(matrices.vector("t").unwrap(), array![1.0]);
    }

    #[test]
    fn dense_cells_update_while_overflow_is_locked() {

        let vocab = vocab(&["a", "b", "c"], 2, true);
        let matrices = DensityMatrices::new(&vocab, targets(&["t"]), false);
        let ctx = context(&[("a", 1), ("b", 1), ("c", 1)]);

        // (0, 2) overflows before the dense cell (1, 1) is reached
        let held = matrices.overflow[0].lock();
        let mut dense_done = false;
        std::thread::scope(|s| {
            s.spawn(|| matrices.accumulate("t", &ctx));
            for _ in 0..500 {
                if matrices.cells[1][0].lock().contains_key(&0) {
                    dense_done = true;
                    break;
                }
                std::thread::sleep(std::time::Duration::from_millis(10));
            }
            drop(held);
        });

        assert!(dense_done);
        assert_eq!(matrices.matrix("t").unwrap()[[0, 2]], 1.0);
    }

    #[test]
    fn concurrent_accumulation_matches_sequential() {

        let vocab = vocab(&["a", "b", "c", "d"], 3, true);
        let ctx = context(&[("a", 1), ("b", 2), ("d", 3)]);

        let sequential = DensityMatrices::new(&vocab, targets(&["t", "u"]), true);
        for _ in 0..200 {
            sequential.accumulate("t", &ctx);
            sequential.accumulate("u", &ctx);
        }

        let concurrent = DensityMatrices::new(&vocab, targets(&["t", "u"]), true);
        std::thread::scope(|s| {
            for _ in 0..4 {
                s.spawn(|| {
                    for _ in 0..50 {
                        concurrent.accumulate("t", &ctx);
                        concurrent.accumulate("u", &ctx);
                    }
                });
            }
        });

        for target in ["t", "u"] {
            assert_eq!(sequential.matrix(target), concurrent.matrix(target));
            assert_eq!(sequential.vector(target), concurrent.vector(target));
        }
    }
}
