//! Parallelism settings shared by the kernels

use crate::util::SMALL_NNZ_LIMIT;

/// How many logical shards a kernel splits its input into.
///
/// Defaults follow the rayon pool, so `RAYON_NUM_THREADS` applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParallelConfig {
    pub nthread: usize,
    /// inputs smaller than this run as one shard
    pub small_work_limit: usize,
}

impl Default for ParallelConfig {
    fn default() -> Self {
        Self {
            nthread: rayon::current_num_threads().max(1),
            small_work_limit: SMALL_NNZ_LIMIT,
        }
    }
}

impl ParallelConfig {
    #[must_use]
    pub const fn serial() -> Self {
        Self {
            nthread: 1,
            small_work_limit: SMALL_NNZ_LIMIT,
        }
    }

    #[must_use]
    pub const fn with_nthread(mut self, nthread: usize) -> Self {
        self.nthread = if nthread == 0 { 1 } else { nthread };
        self
    }

    #[must_use]
    pub const fn with_small_work_limit(mut self, small_work_limit: usize) -> Self {
        self.small_work_limit = small_work_limit;
        self
    }

    /// Shard count for a pass over `work` items; never zero.
    #[must_use]
    pub fn shards_for(&self, work: usize) -> usize {
        let nshard = if work < self.small_work_limit {
            1
        } else {
            self.nthread.max(1)
        };
        log::trace!("{work} items over {nshard} shards");
        nshard
    }
}
