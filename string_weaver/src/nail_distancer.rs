use std::ops::Range;

use crate::config::Error;

/// Which ring offsets may be linked from any nail.
///
/// Offsets are measured clockwise from the current nail, so the scan covers
/// the whole ring once and never looks at the `skip` closest neighbours on
/// either side.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NailDistancer {
    count: usize,
    min: usize,
    max: usize,
}

impl NailDistancer {
    pub fn new(count: usize, skip: usize) -> Result<Self, Error> {
        if count < 2 {
            Err(Error::MinNailCount)
        } else if 2 * skip + 1 >= count {
            Err(Error::SkipTooLarge { skip, count })
        } else {
            Ok(Self {
                count,
                min: skip + 1,
                max: count - skip,
            })
        }
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn offsets(&self) -> Range<usize> {
        self.min..self.max
    }

    pub fn distance(&self) -> usize {
        self.max - self.min
    }

    pub fn nail_at(&self, current: usize, offset: usize) -> usize {
        (current + offset) % self.count
    }

    pub fn is_valid(&self, a_idx: usize, b_idx: usize) -> bool {
        let forward = if b_idx >= a_idx {
            b_idx - a_idx
        } else {
            self.count - a_idx + b_idx
        };
        self.offsets().contains(&forward)
    }
}
