use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("bincode error: {0}")]
    Bincode(#[from] bincode::Error),

    #[error("directory walk error: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("thread pool error: {0}")]
    Pool(#[from] rayon::ThreadPoolBuildError),

    #[error("configuration error: {0}")]
    Config(String),

    /// A sparse matrix file whose length is not a whole number of records.
    #[error("corrupt matrix file {path:?}: {len} bytes is not a multiple of {record} byte records")]
    CorruptMatrix { path: PathBuf, len: usize, record: usize },

    #[error("matrix entry ({x}, {y}) out of range for dimension {dimension}")]
    OutOfRange { x: usize, y: usize, dimension: usize },

    #[error("parse error: {0}")]
    Parse(String),
}

impl Error {
    pub fn config(msg: impl Into<String>) -> Self {
        Error::Config(msg.into())
    }

    pub fn parse(msg: impl Into<String>) -> Self {
        Error::Parse(msg.into())
    }
}
