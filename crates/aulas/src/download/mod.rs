mod pool;

pub use pool::{SegmentFetcherPool, SegmentFetcherPoolBuilder};

use crate::hls::SegmentRef;

/// Progress of one fetch phase, emitted once per finished segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchEvent {
    Started {
        total: usize,
    },
    SegmentFinished {
        file_name: String,
        success: bool,
        completed: usize,
        total: usize,
    },
    Finished {
        succeeded: usize,
        failed: usize,
    },
}

/// Result of [SegmentFetcherPool::fetch_all].
#[derive(Debug, Clone, Default)]
pub struct FetchReport {
    pub total: usize,
    pub succeeded: usize,
    pub failed: Vec<SegmentRef>,
}

impl FetchReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty() && self.succeeded == self.total
    }
}
