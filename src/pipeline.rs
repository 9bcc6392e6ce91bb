
use crate::accumulate::{DensityMatrices, TargetSet};
use crate::codec::{DenseMatrix, MatrixRecord, Parameters, SaveFile, VectorRows, Wordmap};
use crate::config::{Config, ContextKind, OutputFormat, Params};
use crate::context::{ContextStrategy, Dependency, Sentence, Window};
use crate::corpus::{CorpusReader, CountWords, TokenizedReader};
use crate::dependency::ParsedCorpusReader;
use crate::embedding::{EmbeddingMatrices, WordVectors};
use crate::error::{Error, Result};
use crate::files_handling::{ensure_dir, file_paths, load_stop_words, load_targets};
use crate::partition::{for_each_file, partition_files, partition_targets, thread_pool};
use crate::tokenize::StopWordTokenizer;
use crate::vocab::Vocabulary;

use std::env;
use std::path::PathBuf;
use std::time::Instant;
use log::{info, warn};
use rayon::ThreadPool;


pub struct Pipeline {}

impl Pipeline {

    // runs the main procedure -
    // -> configuration of arguments
    // -> vocabulary building
    // -> density matrices accumulation and write-out, once per target run

    pub fn run() -> Result<()> {

        info!("entering program...");
        let args: Vec<String> = env::args().collect();

        info!("building parameters...");
        let params = Config::new(&args)?.get_params();
        info!("{}", params);

        Self::execute(&params)
    }

    pub fn execute(params: &Params) -> Result<()> {

        let timer = Instant::now();
        ensure_dir(&params.output_dir)?;

        let files = match file_paths(&params.corpus_root) {
            Ok(files) => files,
            Err(e) => {
                warn!("could not list corpus files under {:?}: {}", params.corpus_root, e);
                Vec::new()
            }
        };
        info!("found {} corpus files", files.len());
        let partitions = partition_files(files, params.num_threads);
        let pool = thread_pool(params.num_threads)?;

        let targets: Vec<String> = load_targets(&params.targets_file, params.targets_format).into_iter().collect();
        info!("loaded {} targets", targets.len());

        match params.context {
            ContextKind::Sentence => {
                let reader = Self::tokenized_reader(params);
                Self::count_matrices(&reader, &Sentence, params, &partitions, &pool, &targets)
            }
            ContextKind::Window => {
                let reader = Self::tokenized_reader(params);
                let strategy = Window { window_size: params.window_size };
                Self::count_matrices(&reader, &strategy, params, &partitions, &pool, &targets)
            }
            ContextKind::Dependency => {
                let reader = ParsedCorpusReader::new(targets.iter().cloned());
                Self::count_matrices(&reader, &Dependency, params, &partitions, &pool, &targets)
            }
            ContextKind::Embedding => {
                let reader = Self::tokenized_reader(params);
                Self::embedding_matrices(&reader, params, &partitions, &pool, &targets)
            }
        }?;

        info!("finished, took {} seconds ...", timer.elapsed().as_secs());
        Ok(())
    }

    fn tokenized_reader(params: &Params) -> TokenizedReader<StopWordTokenizer> {
        let stop_words = load_stop_words(params.stop_words_file.as_deref());
        TokenizedReader::new(StopWordTokenizer::new(stop_words))
    }

    fn count_matrices<R, S>(
        reader: &R,
        strategy: &S,
        params: &Params,
        partitions: &[Vec<PathBuf>],
        pool: &ThreadPool,
        targets: &[String]) -> Result<()>
    where
        R: CorpusReader,
        R::Unit: CountWords,
        S: ContextStrategy<Unit = R::Unit>,
    {
        let timer = Instant::now();
        info!("starting vocab building...");
        let vocab = Vocabulary::build(reader, partitions, pool, params.dimension);
        info!("finished vocab building, took {} seconds ...", timer.elapsed().as_secs());

        if let Err(e) = Parameters::for_vocab(&vocab).save_file(&params.output_dir, "parameters") {
            warn!("could not write parameters: {}", e);
        }
        if params.wordmap {
            if let Err(e) = Wordmap::for_vocab(&vocab).save_file(&params.output_dir, "wordmap") {
                warn!("could not write wordmap: {}", e);
            }
        }

        let runs = partition_targets(targets, params.num_runs);
        for (run_i, run_targets) in runs.iter().enumerate() {

            let timer = Instant::now();
            info!("run {} of {}, accumulating {} targets...", run_i + 1, runs.len(), run_targets.len());

            let matrices = DensityMatrices::new(&vocab, TargetSet::new(run_targets.iter().cloned()), params.vectors);
            generate(reader, strategy, &matrices, partitions, pool);
            info!("finished accumulation, took {} seconds ...", timer.elapsed().as_secs());

            let timer = Instant::now();
            Self::write_matrices(&matrices, params);
            if matrices.has_vectors() {
                Self::write_vectors(&matrices, params, run_i > 0);
            }
            info!("matrix write took {} seconds", timer.elapsed().as_secs());
        }
        Ok(())
    }

    fn write_matrices(matrices: &DensityMatrices, params: &Params) {

        let dimension = matrices.dimension();
        let cutoff = Parameters::for_vocab(matrices.vocab()).cutoff;
        let words = matrices.targets().words();

        for (word, sparse) in words.iter().zip(matrices.sparse_matrices()) {
            let res = match params.format {
                OutputFormat::Sparse => sparse.save_file(&params.output_dir, word),
                OutputFormat::Dense => sparse
                    .to_dense(dimension)
                    .and_then(|dense| DenseMatrix(dense).save_file(&params.output_dir, word)),
                OutputFormat::Bincode => {
                    let record = MatrixRecord {
                        word: word.to_owned(),
                        dimension,
                        cutoff,
                        entries: sparse.into_entries(),
                    };
                    record.save_file(&params.output_dir, word)
                }
            };
            if let Err(e) = res {
                warn!("could not write matrix for {}: {}", word, e);
            }
        }
    }

    fn write_vectors(matrices: &DensityMatrices, params: &Params, append: bool) {

        let rows = matrices
            .targets()
            .words()
            .iter()
            .filter_map(|word| matrices.vector(word).map(|vector| (word.to_owned(), vector)))
            .collect();

        if let Err(e) = (VectorRows { rows, append }).save_file(&params.output_dir, "vectors") {
            warn!("could not write vectors: {}", e);
        }
    }

    fn embedding_matrices<R>(
        reader: &R,
        params: &Params,
        partitions: &[Vec<PathBuf>],
        pool: &ThreadPool,
        targets: &[String]) -> Result<()>
    where
        R: CorpusReader<Unit = Vec<String>>,
    {
        let timer = Instant::now();
        info!("starting wordmap building...");
        let vocab = Vocabulary::build(reader, partitions, pool, params.num_contexts as i64);
        let vectors_file = params
            .word_vectors_file
            .as_ref()
            .ok_or_else(|| Error::config("word_vectors_file is required for the embedding context"))?;
        let vectors = WordVectors::load(vectors_file, &vocab)?;
        info!("finished wordmap building, took {} seconds ...", timer.elapsed().as_secs());

        if params.vectors {
            warn!("marginal vectors are not produced for the embedding context");
        }
        if let Err(e) = (Parameters { dimension: vectors.dim(), cutoff: None }).save_file(&params.output_dir, "parameters") {
            warn!("could not write parameters: {}", e);
        }
        if params.wordmap {
            if let Err(e) = Wordmap::for_vocab(&vocab).save_file(&params.output_dir, "wordmap") {
                warn!("could not write wordmap: {}", e);
            }
        }

        for run_targets in partition_targets(targets, params.num_runs) {

            let matrices = EmbeddingMatrices::new(&vectors, TargetSet::new(run_targets));
            for_each_file(pool, partitions, |path| {
                reader.read_units(path, |tokens| matrices.process_line(tokens))
            });

            for word in matrices.targets().words() {
                let res = match matrices.matrix(word) {
                    Some(matrix) => DenseMatrix(matrix).save_file(&params.output_dir, word),
                    None => Ok(()),
                };
                if let Err(e) = res {
                    warn!("could not write matrix for {}: {}", word, e);
                }
            }
        }
        Ok(())
    }
}

/// Streams every corpus file through `strategy` into `matrices`, one pool job per partition.
pub fn generate<R, S>(reader: &R, strategy: &S, matrices: &DensityMatrices, partitions: &[Vec<PathBuf>], pool: &ThreadPool)
where
    R: CorpusReader,
    S: ContextStrategy<Unit = R::Unit>,
{
    for_each_file(pool, partitions, |path| {
        reader.read_units(path, |unit| {
            strategy.extract(unit, matrices.vocab(), matrices.targets(), |target, counts| {
                matrices.accumulate(target, counts)
            });
        })
    });
}
