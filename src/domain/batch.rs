//! Batch planning.
//!
//! Splits an ordered [`PromptSet`] into contiguous, index-tagged batches no
//! larger than the current maximum batch size. The batches partition the set
//! exactly: concatenated in order they reconstruct it with no gaps, overlaps
//! or reordering.

use crate::domain::prompt::PromptSet;

/// A contiguous slice of a [`PromptSet`], tagged with its start index.
///
/// The start index travels with the batch through dispatch so reassembly is
/// a sort by key, never positional trust.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Batch {
    start: usize,
    len: usize,
}

impl Batch {
    pub fn start(&self) -> usize {
        self.start
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

/// Plan `ceil(n / max_batch_size)` contiguous batches over the prompt set.
///
/// A zero `max_batch_size` is treated as 1; planning always makes progress.
pub fn plan(prompts: &PromptSet, max_batch_size: usize) -> Vec<Batch> {
    let size = max_batch_size.max(1);
    let total = prompts.len();
    let mut batches = Vec::with_capacity(total.div_ceil(size));
    let mut start = 0;
    while start < total {
        let len = size.min(total - start);
        batches.push(Batch { start, len });
        start += len;
    }
    batches
}
