
pub mod accumulate;
pub mod codec;
pub mod config;
pub mod context;
pub mod corpus;
pub mod dependency;
pub mod embedding;
pub mod error;
pub mod files_handling;
pub mod partition;
pub mod pipeline;
pub mod tokenize;
pub mod vocab;

pub use accumulate::{ContextCounts, DensityMatrices, TargetSet};
pub use codec::{DenseMatrix, Entry, MatrixRecord, Parameters, ReadFile, SaveFile, SparseMatrix, Wordmap};
pub use config::{Config, Params};
pub use context::{ContextStrategy, Dependency, Sentence, Window};
pub use error::{Error, Result};
pub use pipeline::Pipeline;
pub use vocab::Vocabulary;
