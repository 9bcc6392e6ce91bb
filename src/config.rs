
use crate::error::{Error, Result};
use crate::files_handling::TargetsFormat;

use std::fmt::Display;
use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;
use serde_json::Value;


#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ContextKind {
    Sentence,
    Window,
    Dependency,
    Embedding,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Sparse,
    Dense,
    Bincode,
}

#[derive(Clone, Debug)]
pub struct Params {
    pub corpus_root: PathBuf,
    pub targets_file: PathBuf,
    pub output_dir: PathBuf,
    pub targets_format: TargetsFormat,
    pub stop_words_file: Option<PathBuf>,
    pub context: ContextKind,
    pub dimension: i64,
    pub window_size: usize,
    pub num_threads: usize,
    pub num_runs: usize,
    pub vectors: bool,
    pub wordmap: bool,
    pub format: OutputFormat,
    pub word_vectors_file: Option<PathBuf>,
    pub num_contexts: usize,
}

impl Display for Params {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "using params:
        corpus_root: {:?}
        targets_file: {:?} ({:?})
        output_dir: {:?}
        stop_words_file: {:?}
        context: {:?}
        dimension: {}
        window_size: {}
        num_threads: {}
        num_runs: {}
        vectors: {}
        wordmap: {}
        format: {:?}
        word_vectors_file: {:?}
        num_contexts: {}",
        self.corpus_root, self.targets_file, self.targets_format, self.output_dir, self.stop_words_file,
        self.context, self.dimension, self.window_size, self.num_threads, self.num_runs, self.vectors,
        self.wordmap, self.format, self.word_vectors_file, self.num_contexts
        )
    }
}

pub struct Config {
    params: Params
}

impl Config {

    pub fn get_params(&self) -> Params {
        self.params.clone()
    }

    pub fn new(args: &[String]) -> Result<Config> {

        if args.len() != 2 {
            return Err(Error::config("input should be a path to json file only"));
        }

        let f = BufReader::new(File::open(&args[1])?);
        let json: Value = serde_json::from_reader(f)?;
        Ok(Self { params: Self::from_json(&json)? })
    }

    pub fn from_json(json: &Value) -> Result<Params> {

        // required paths
        let corpus_root = required_path(json, "corpus_root")?;
        let targets_file = required_path(json, "targets_file")?;
        let output_dir = required_path(json, "output_dir")?;

        // handle default vs input parameters
        let targets_format = match optional_str(json, "targets_format")? {
            None | Some("plain") => TargetsFormat::Plain,
            Some("hypernym") => TargetsFormat::Hypernym,
            Some(other) => return Err(Error::config(format!("unknown targets_format {}", other))),
        };
        let context = match optional_str(json, "context")? {
            None | Some("sentence") => ContextKind::Sentence,
            Some("window") => ContextKind::Window,
            Some("dependency") => ContextKind::Dependency,
            Some("embedding") => ContextKind::Embedding,
            Some(other) => return Err(Error::config(format!("unknown context {}", other))),
        };
        let format = match optional_str(json, "format")? {
            None | Some("sparse") => OutputFormat::Sparse,
            Some("dense") => OutputFormat::Dense,
            Some("bincode") => OutputFormat::Bincode,
            Some(other) => return Err(Error::config(format!("unknown format {}", other))),
        };

        let stop_words_file = optional_str(json, "stop_words_file")?.map(PathBuf::from);
        let word_vectors_file = optional_str(json, "word_vectors_file")?.map(PathBuf::from);
        if context == ContextKind::Embedding && word_vectors_file.is_none() {
            return Err(Error::config("word_vectors_file is required for the embedding context"));
        }

        let dimension = match json.get("dimension") {
            Some(dimension) => dimension.as_i64().ok_or_else(|| Error::config("given dimension is not an integer"))?,
            None => 0
        };

        let params = Params {
            corpus_root,
            targets_file,
            output_dir,
            targets_format,
            stop_words_file,
            context,
            dimension,
            window_size: positive(json, "window_size", 5)?,
            num_threads: positive(json, "num_threads", 4)?,
            num_runs: positive(json, "num_runs", 1)?,
            vectors: flag(json, "vectors")?,
            wordmap: flag(json, "wordmap")?,
            format,
            word_vectors_file,
            num_contexts: positive(json, "num_contexts", 10000)?,
        };
        Ok(params)
    }
}

fn required_path(json: &Value, key: &str) -> Result<PathBuf> {
    match optional_str(json, key)? {
        Some(path) => Ok(PathBuf::from(path)),
        None => Err(Error::config(format!("{} was not supplied through json", key))),
    }
}

fn optional_str<'j>(json: &'j Value, key: &str) -> Result<Option<&'j str>> {
    match json.get(key) {
        Some(value) => value
            .as_str()
            .map(Some)
            .ok_or_else(|| Error::config(format!("given {} is not a string", key))),
        None => Ok(None),
    }
}

fn positive(json: &Value, key: &str, default: usize) -> Result<usize> {
    match json.get(key) {
        Some(value) => match value.as_i64() {
            Some(n) if n > 0 => Ok(n as usize),
            _ => Err(Error::config(format!("given {} is not a positive integer", key))),
        },
        None => Ok(default),
    }
}

fn flag(json: &Value, key: &str) -> Result<bool> {
    match json.get(key) {
        Some(value) => value.as_bool().ok_or_else(|| Error::config(format!("given {} is not boolean", key))),
        None => Ok(false),
    }
}
