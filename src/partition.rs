
use crate::error::Result;

use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use log::{info, warn};
use rayon::{ThreadPool, ThreadPoolBuilder};


/// Splits the file list into exactly `num_partitions` contiguous groups whose sizes differ
/// by at most one file. Sizes follow the file count only, not the file sizes.
pub fn partition_files(paths: Vec<PathBuf>, num_partitions: usize) -> Vec<Vec<PathBuf>> {

    let n = num_partitions.max(1);
    let base = paths.len() / n;
    let extra = paths.len() % n;

    let mut paths = paths.into_iter();
    (0..n)
        .map(|i| {
            let size = base + usize::from(i < extra);
            paths.by_ref().take(size).collect()
        })
        .collect()
}

/// Splits the targets into consecutive groups of `ceil(len / num_runs)` words, one group per
/// run. Fewer than `num_runs` groups come back when the division leaves nothing for the tail.
pub fn partition_targets(targets: &[String], num_runs: usize) -> Vec<Vec<String>> {

    if targets.is_empty() {
        return Vec::new();
    }
    let runs = num_runs.max(1);
    let size = (targets.len() + runs - 1) / runs;
    targets.chunks(size).map(|chunk| chunk.to_vec()).collect()
}

pub fn thread_pool(num_threads: usize) -> Result<ThreadPool> {
    let pool = ThreadPoolBuilder::new()
        .num_threads(num_threads)
        .thread_name(|i| format!("dmatrix-worker-{}", i))
        .build()?;
    Ok(pool)
}

/// Runs `process_file` over every file, one pool job per partition, each job walking its
/// partition in order. Blocks until every job is done. A file that fails (or panics) is
/// logged and the job moves on to its next file.
pub fn for_each_file<F>(pool: &ThreadPool, partitions: &[Vec<PathBuf>], process_file: F)
where
    F: Fn(&Path) -> Result<()> + Sync,
{
    let process_file = &process_file;
    pool.scope(|scope| {
        for (partition_i, partition) in partitions.iter().enumerate() {
            if partition.is_empty() {
                continue;
            }
            scope.spawn(move |_| {
                info!("partition {}, working on {} files", partition_i, partition.len());
                for path in partition {
                    match panic::catch_unwind(AssertUnwindSafe(|| process_file(path.as_path()))) {
                        Ok(Ok(())) => {}
                        Ok(Err(e)) => warn!("partition {}, skipping rest of {:?}: {}", partition_i, path, e),
                        Err(_) => warn!("partition {}, panicked while processing {:?}", partition_i, path),
                    }
                }
                info!("finished partition {}", partition_i);
            });
        }
    });
}


#[cfg(test)]
mod tests {

    use super::*;
    use crate::error::Error;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn paths(n: usize) -> Vec<PathBuf> {
        (0..n).map(|i| PathBuf::from(format!("f{}", i))).collect()
    }

    #[test]
    fn partitions_are_contiguous_and_near_even() {

        let parts = partition_files(paths(10), 4);
        let sizes: Vec<usize> = parts.iter().map(|p| p.len()).collect();
        assert_eq!(sizes, vec![3, 3, 2, 2]);

        let flattened: Vec<PathBuf> = parts.into_iter().flatten().collect();
        assert_eq!(flattened, paths(10));
    }

    #[test]
    fn more_workers_than_files_leaves_empty_partitions() {
        let parts = partition_files(paths(2), 4);
        assert_eq!(parts.len(), 4);
        assert_eq!(parts.iter().map(|p| p.len()).sum::<usize>(), 2);
        assert!(parts[2].is_empty() && parts[3].is_empty());
    }

    #[test]
    fn targets_split_by_ceiling_size() {
        let targets: Vec<String> = (0..5).map(|i| format!("t{}", i)).collect();
        let runs = partition_targets(&targets, 2);
        assert_eq!(runs.len(), 2);
        assert_eq!(runs[0], vec!["t0", "t1", "t2"]);
        assert_eq!(runs[1], vec!["t3", "t4"]);

        assert_eq!(partition_targets(&targets, 1).len(), 1);
        assert!(partition_targets(&[], 3).is_empty());
    }

    #[test]
    fn failing_files_do_not_stop_the_partition() {

        let pool = thread_pool(2).unwrap();
        let parts = partition_files(paths(6), 2);
        let processed = AtomicUsize::new(0);

        for_each_file(&pool, &parts, |path| {
            processed.fetch_add(1, Ordering::SeqCst);
            match path.to_str() {
                Some("f1") => Err(Error::parse("broken file")),
                Some("f4") => panic!("worker blew up"),
                _ => Ok(()),
            }
        });

        assert_eq!(processed.load(Ordering::SeqCst), 6);
    }
}
