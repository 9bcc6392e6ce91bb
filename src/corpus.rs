//! Text sources. A reader turns one corpus file into a stream of units (a tokenized line,
//! a parsed sentence) and hands each one to a callback.

use crate::error::Result;
use crate::files_handling::open_text;
use crate::tokenize::Tokenizer;

use std::io::BufRead;
use std::path::Path;
use fnv::FnvHashMap;


pub trait CorpusReader: Sync {
    type Unit;

    /// Calls `f` once per unit in `file_path`, in file order. A read failure part way
    /// through returns the error after the units before it were delivered.
    fn read_units<F>(&self, file_path: &Path, f: F) -> Result<()>
    where
        F: FnMut(&Self::Unit);
}

/// Units whose words feed the vocabulary frequency table.
pub trait CountWords {
    fn count_words(&self, counts: &mut FnvHashMap<String, u64>);
}

pub(crate) fn bump(counts: &mut FnvHashMap<String, u64>, word: &str) {
    match counts.get_mut(word) {
        Some(count) => *count += 1,
        None => {
            counts.insert(word.to_owned(), 1);
        }
    }
}

impl CountWords for Vec<String> {
    fn count_words(&self, counts: &mut FnvHashMap<String, u64>) {
        for tok in self {
            bump(counts, tok);
        }
    }
}


/// Reads plain or gzip text line by line, one tokenized line per unit. Lines that
/// tokenize to nothing are skipped.
pub struct TokenizedReader<T: Tokenizer> {
    tokenizer: T,
}

impl<T: Tokenizer> TokenizedReader<T> {
    pub fn new(tokenizer: T) -> Self {
        Self { tokenizer }
    }
}

impl<T: Tokenizer> CorpusReader for TokenizedReader<T> {
    type Unit = Vec<String>;

    fn read_units<F>(&self, file_path: &Path, mut f: F) -> Result<()>
    where
        F: FnMut(&Self::Unit),
    {
        let lines = open_text(file_path)?.lines();
        for line in lines {
            let tokens = self.tokenizer.tokenize(&line?);
            if tokens.is_empty() {
                continue;
            }
            f(&tokens);
        }
        Ok(())
    }
}


#[cfg(test)]
mod tests {

    use super::*;
    use crate::tokenize::{StopWordTokenizer, WhitespaceTokenizer};
    use std::collections::HashSet;
    use std::fs;

    #[test]
    fn yields_one_unit_per_non_empty_line() {

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("corpus.txt");
        fs::write(&path, "<doc id=\"1\">\nAlpha beta, beta gamma.\n\n</doc>\ngamma 42\n").unwrap();

        let reader = TokenizedReader::new(StopWordTokenizer::new(HashSet::new()));
        let mut units = Vec::new();
        reader.read_units(&path, |tokens| units.push(tokens.clone())).unwrap();

        assert_eq!(units, vec![
            vec!["alpha".to_string(), "beta".to_string(), "beta".to_string(), "gamma".to_string()],
            vec!["gamma".to_string()],
        ]);
    }

    #[test]
    fn counts_words_of_a_line() {
        let mut counts = FnvHashMap::default();
        let line = WhitespaceTokenizer.tokenize("alpha beta beta gamma");
        line.count_words(&mut counts);
        line.count_words(&mut counts);
        assert_eq!(counts.get("beta"), Some(&4));
        assert_eq!(counts.get("alpha"), Some(&2));
        assert_eq!(counts.len(), 3);
    }

    #[test]
    fn missing_file_is_an_error() {
        let reader = TokenizedReader::new(WhitespaceTokenizer);
        assert!(reader.read_units(Path::new("/no/such/file.txt"), |_| {}).is_err());
    }
}
