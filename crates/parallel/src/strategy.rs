//! Parallel processing strategies

use rayon::prelude::*;
use tracing::warn;

/// Processing mode for per-year and per-tile work
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProcessingMode {
    /// Single-threaded processing
    Sequential,
    /// Parallel processing using the global rayon pool
    #[default]
    Parallel,
    /// Parallel with a dedicated pool of the given size
    ParallelWith(usize),
}

impl ProcessingMode {
    /// Mode for an optional configured thread count.
    ///
    /// `None` uses the global pool, `Some(1)` runs sequentially.
    pub fn from_threads(threads: Option<usize>) -> Self {
        match threads {
            None | Some(0) => ProcessingMode::Parallel,
            Some(1) => ProcessingMode::Sequential,
            Some(n) => ProcessingMode::ParallelWith(n),
        }
    }
}

/// Strategy for parallel execution
pub trait ParallelStrategy {
    /// Map a function over indices and collect results in index order
    fn par_map<T, F>(&self, range: std::ops::Range<usize>, f: F) -> Vec<T>
    where
        T: Send,
        F: Fn(usize) -> T + Sync + Send;

    /// Map a function over slice items and collect results in slice order
    fn par_map_items<I, T, F>(&self, items: &[I], f: F) -> Vec<T>
    where
        I: Sync,
        T: Send,
        F: Fn(&I) -> T + Sync + Send,
    {
        self.par_map(0..items.len(), |i| f(&items[i]))
    }
}

impl ParallelStrategy for ProcessingMode {
    fn par_map<T, F>(&self, range: std::ops::Range<usize>, f: F) -> Vec<T>
    where
        T: Send,
        F: Fn(usize) -> T + Sync + Send,
    {
        match self {
            ProcessingMode::Sequential => range.map(f).collect(),
            ProcessingMode::Parallel => range.into_par_iter().map(f).collect(),
            ProcessingMode::ParallelWith(threads) => {
                match rayon::ThreadPoolBuilder::new().num_threads(*threads).build() {
                    Ok(pool) => pool.install(|| range.into_par_iter().map(f).collect()),
                    Err(e) => {
                        warn!("thread pool with {threads} threads unavailable ({e}), running on the global pool");
                        range.into_par_iter().map(f).collect()
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_modes_agree_and_keep_order() {
        let square = |i: usize| i * i;
        let seq = ProcessingMode::Sequential.par_map(0..50, square);
        let par = ProcessingMode::Parallel.par_map(0..50, square);
        let sized = ProcessingMode::ParallelWith(2).par_map(0..50, square);
        assert_eq!(seq, par);
        assert_eq!(seq, sized);
        assert_eq!(seq[7], 49);
    }

    #[test]
    fn test_from_threads() {
        assert_eq!(ProcessingMode::from_threads(None), ProcessingMode::Parallel);
        assert_eq!(ProcessingMode::from_threads(Some(1)), ProcessingMode::Sequential);
        assert_eq!(ProcessingMode::from_threads(Some(4)), ProcessingMode::ParallelWith(4));
    }

    #[test]
    fn test_par_map_items() {
        let years = [1990, 1991, 1992];
        let out = ProcessingMode::Parallel.par_map_items(&years, |y| y + 1);
        assert_eq!(out, vec![1991, 1992, 1993]);
    }
}
