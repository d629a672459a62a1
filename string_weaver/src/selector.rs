use std::ops::Range;

use rayon::iter::{IntoParallelRefMutIterator, ParallelIterator};

use crate::{DistanceTable, Float, NailDistancer, Raster};

/// Greedy choice of the next nail.
///
/// The candidate offsets of one step are split into contiguous, ascending
/// chunks, one per worker buffer. Every buffer keeps its first strictly
/// greater score and the buffers are merged in order with the same strict
/// comparison, so the result equals a sequential scan: on equal scores the
/// smallest offset wins.
pub struct Selector<S> {
    buffers: Vec<BatchBuffer<S>>,
}

impl<S: Float> Default for Selector<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: Float> Selector<S> {
    pub fn new() -> Self {
        Self::with_threads(num_cpus::get())
    }

    pub fn with_threads(threads: usize) -> Self {
        Self {
            buffers: (0..threads.max(1)).map(|_| BatchBuffer::default()).collect(),
        }
    }

    /// Index of the nail whose chord from `current` is darkest on average.
    ///
    /// Returns `current` itself when no candidate scores above zero, which the
    /// caller treats as a degenerate step.
    pub fn select_next(
        &mut self,
        current: usize,
        table: &DistanceTable<S>,
        raster: &Raster,
        distancer: NailDistancer,
    ) -> usize {
        let offsets = distancer.offsets();
        let chunk_size = offsets.len().div_ceil(self.buffers.len()).max(1);
        for (index, buffer) in self.buffers.iter_mut().enumerate() {
            let start = (offsets.start + index * chunk_size).min(offsets.end);
            buffer.range = start..offsets.end.min(start + chunk_size);
        }

        let origin = table.nails()[current];
        self.buffers.par_iter_mut().for_each(|buffer| {
            buffer.result = None;
            let mut best_weight = S::ZERO;
            for offset in buffer.range.clone() {
                let candidate = distancer.nail_at(current, offset);
                if table.nails()[candidate] == origin {
                    continue;
                }
                let weight = raster.sample_darkness(table, current, candidate);
                if weight > best_weight {
                    best_weight = weight;
                    buffer.result = Some(Candidate {
                        nail: candidate,
                        weight,
                    });
                }
            }
        });

        let mut best = Candidate {
            nail: current,
            weight: S::ZERO,
        };
        for candidate in self.buffers.iter().filter_map(|buffer| buffer.result) {
            if candidate.weight > best.weight {
                best = candidate;
            }
        }
        best.nail
    }
}

#[derive(Clone, Copy, Debug)]
struct Candidate<S> {
    nail: usize,
    weight: S,
}

struct BatchBuffer<S> {
    range: Range<usize>,
    result: Option<Candidate<S>>,
}

impl<S> Default for BatchBuffer<S> {
    fn default() -> Self {
        Self {
            range: 0..0,
            result: None,
        }
    }
}
