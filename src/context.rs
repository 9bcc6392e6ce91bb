//! Context strategies. Each turns one corpus unit into `(target, context multiset)` pairs
//! that the accumulator consumes.

use crate::accumulate::{ContextCounts, TargetSet};
use crate::dependency::ParsedSentence;
use crate::vocab::Vocabulary;

use std::collections::BTreeMap;


pub trait ContextStrategy: Sync {
    type Unit;

    /// Calls `emit` once per target occurrence in `unit`. The multiset handed to `emit` is
    /// only valid for the duration of the call.
    fn extract<'a, F>(&self, unit: &'a Self::Unit, vocab: &Vocabulary, targets: &TargetSet, emit: F)
    where
        F: FnMut(&'a str, &ContextCounts<'a>);
}


/// Vocabulary tokens up to `window_size` positions on either side of the target. The
/// target position itself is never part of its window.
#[derive(Clone, Copy, Debug)]
pub struct Window {
    pub window_size: usize,
}

impl ContextStrategy for Window {
    type Unit = Vec<String>;

    fn extract<'a, F>(&self, unit: &'a Self::Unit, vocab: &Vocabulary, targets: &TargetSet, mut emit: F)
    where
        F: FnMut(&'a str, &ContextCounts<'a>),
    {
        let n = unit.len();
        for (i, tok) in unit.iter().enumerate() {

            if !targets.contains(tok) {
                continue;
            }

            let start = i.saturating_sub(self.window_size);
            let end = (i + self.window_size + 1).min(n);
            let mut counts = ContextCounts::default();
            for (j, context) in unit[start..end].iter().enumerate() {
                if start + j == i || !vocab.contains(context) {
                    continue;
                }
                *counts.entry(context.as_str()).or_insert(0) += 1;
            }
            emit(tok.as_str(), &counts);
        }
    }
}


/// The whole line is the context. A target in the vocabulary has its own occurrence
/// removed for the duration of its accumulation.
#[derive(Clone, Copy, Debug, Default)]
pub struct Sentence;

impl ContextStrategy for Sentence {
    type Unit = Vec<String>;

    fn extract<'a, F>(&self, unit: &'a Self::Unit, vocab: &Vocabulary, targets: &TargetSet, mut emit: F)
    where
        F: FnMut(&'a str, &ContextCounts<'a>),
    {
        let mut counts = ContextCounts::default();
        for tok in unit.iter().filter(|tok| vocab.contains(tok)) {
            *counts.entry(tok.as_str()).or_insert(0) += 1;
        }

        for tok in unit.iter().filter(|tok| targets.contains(tok)) {
            let own = counts.get(tok.as_str()).copied().unwrap_or(0);
            if own == 0 {
                emit(tok.as_str(), &counts);
                continue;
            }
            counts.insert(tok.as_str(), own - 1);
            emit(tok.as_str(), &counts);
            counts.insert(tok.as_str(), own);
        }
    }
}


/// Syntactic neighbours. Every occurrence of a target that heads at least one edge (in
/// either direction) gets the multiset of the words at the other ends of its edges, keyed
/// by surface word. Vocabulary filtering is left to the accumulator.
#[derive(Clone, Copy, Debug, Default)]
pub struct Dependency;

impl ContextStrategy for Dependency {
    type Unit = ParsedSentence;

    fn extract<'a, F>(&self, unit: &'a Self::Unit, _vocab: &Vocabulary, targets: &TargetSet, mut emit: F)
    where
        F: FnMut(&'a str, &ContextCounts<'a>),
    {
        let mut heads: BTreeMap<usize, ContextCounts<'a>> = BTreeMap::new();

        for &(a, b) in &unit.edges {
            if a == b {
                continue;
            }
            for (head, other) in [(a, b), (b, a)] {
                let (head_word, other_word) = match (unit.word(head), unit.word(other)) {
                    (Some(h), Some(o)) => (h, o),
                    _ => continue,
                };
                if targets.contains(head_word) {
                    *heads.entry(head).or_default().entry(other_word).or_insert(0) += 1;
                }
            }
        }

        for (head, counts) in &heads {
            if let Some(word) = unit.word(*head) {
                emit(word, counts);
            }
        }
    }
}


#[cfg(test)]
mod tests {

    use super::*;

    fn line(text: &str) -> Vec<String> {
        text.split_whitespace().map(|w| w.to_string()).collect()
    }

    fn vocab(words: &[&str]) -> Vocabulary {
        Vocabulary::new(words.iter().map(|w| w.to_string()).collect(), words.len(), false)
    }

    fn targets(words: &[&str]) -> TargetSet {
        TargetSet::new(words.iter().map(|w| w.to_string()))
    }

    fn collect<S: ContextStrategy>(strategy: &S, unit: &S::Unit, vocab: &Vocabulary, targets: &TargetSet) -> Vec<(String, Vec<(String, u32)>)> {
        let mut out = Vec::new();
        strategy.extract(unit, vocab, targets, |target, counts| {
            let mut counts: Vec<(String, u32)> = counts.iter().map(|(w, c)| (w.to_string(), *c)).collect();
            counts.sort();
            out.push((target.to_string(), counts));
        });
        out
    }

    fn pairs(items: &[(&str, u32)]) -> Vec<(String, u32)> {
        items.iter().map(|(w, c)| (w.to_string(), *c)).collect()
    }

    #[test]
    fn sentence_target_outside_vocabulary() {
        let out = collect(&Sentence, &line("alpha beta beta gamma"), &vocab(&["beta", "gamma"]), &targets(&["alpha"]));
        assert_eq!(out, vec![("alpha".to_string(), pairs(&[("beta", 2), ("gamma", 1)]))]);
    }

    #[test]
    fn sentence_removes_own_occurrence() {
        let out = collect(&Sentence, &line("alpha beta beta gamma"), &vocab(&["beta", "gamma", "alpha"]), &targets(&["alpha"]));
        assert_eq!(out, vec![("alpha".to_string(), pairs(&[("alpha", 0), ("beta", 2), ("gamma", 1)]))]);
    }

    #[test]
    fn sentence_restores_count_for_later_targets() {
        let out = collect(&Sentence, &line("beta alpha beta"), &vocab(&["beta", "alpha"]), &targets(&["alpha", "beta"]));
        assert_eq!(out, vec![
            ("beta".to_string(), pairs(&[("alpha", 1), ("beta", 1)])),
            ("alpha".to_string(), pairs(&[("alpha", 0), ("beta", 2)])),
            ("beta".to_string(), pairs(&[("alpha", 1), ("beta", 1)])),
        ]);
    }

    #[test]
    fn window_is_clipped_and_skips_target_position() {

        let unit = line("beta alpha gamma beta alpha delta");
        let out = collect(&Window { window_size: 1 }, &unit, &vocab(&["alpha", "beta", "gamma"]), &targets(&["alpha"]));
        assert_eq!(out, vec![
            ("alpha".to_string(), pairs(&[("beta", 1), ("gamma", 1)])),
            // delta is not in the vocabulary
            ("alpha".to_string(), pairs(&[("beta", 1)])),
        ]);

        let wide = collect(&Window { window_size: 10 }, &unit, &vocab(&["alpha", "beta", "gamma"]), &targets(&["alpha"]));
        assert_eq!(wide[0].1, pairs(&[("alpha", 1), ("beta", 2), ("gamma", 1)]));
    }

    #[test]
    fn window_scenario_matches_sentence() {
        let out = collect(&Window { window_size: 5 }, &line("alpha beta beta gamma"), &vocab(&["beta", "gamma"]), &targets(&["alpha"]));
        assert_eq!(out, vec![("alpha".to_string(), pairs(&[("beta", 2), ("gamma", 1)]))]);
    }

    #[test]
    fn dependency_neighbours_per_head() {

        // 0 cat, 1 chased, 2 dog, 3 cat
        let sentence = ParsedSentence::new(
            vec!["cat", "chased", "dog", "cat"].into_iter().map(String::from).collect(),
            vec![(1, 0), (1, 2), (2, 3), (3, 3)],
        );
        let out = collect(&Dependency, &sentence, &vocab(&[]), &targets(&["cat", "dog"]));
        assert_eq!(out, vec![
            ("cat".to_string(), pairs(&[("chased", 1)])),
            ("dog".to_string(), pairs(&[("cat", 1), ("chased", 1)])),
            ("cat".to_string(), pairs(&[("dog", 1)])),
        ]);
    }
}
