use std::{fmt, iter::FusedIterator};

use super::Point;
use crate::Float;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Segment<T> {
    pub start: Point<T>,
    pub end: Point<T>,
}

impl<T: fmt::Display> fmt::Display for Segment<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.start, self.end)
    }
}

impl<T> Segment<T> {
    pub fn new(start: Point<T>, end: Point<T>) -> Self {
        Self { start, end }
    }
}

impl<T: Float> Segment<T> {
    pub fn length(&self) -> T {
        self.start.distance(&self.end)
    }

    /// Unit vector pointing from `start` to `end`. Zero for a degenerate segment.
    pub fn direction(&self, length: T) -> Point<T> {
        if length > T::ZERO {
            (self.end - self.start) / length
        } else {
            Point::new(T::ZERO, T::ZERO)
        }
    }
}

/// Cells visited when stepping one unit at a time along a chord.
///
/// The walk starts on the first endpoint and takes `round(length)` samples,
/// each rounded to the nearest cell. The far endpoint itself is not part of
/// the walk. Sampling, darkening and rendering all go through this iterator,
/// so they always touch the same cells for the same chord.
#[derive(Clone, Debug)]
pub struct Walk<S> {
    position: Point<S>,
    step: Point<S>,
    remaining: usize,
}

impl<S: Float> Walk<S> {
    pub fn new(start: Point<S>, step: Point<S>, length: S) -> Self {
        Self {
            position: start,
            step,
            remaining: length.round().to_usize().unwrap_or(0),
        }
    }

    pub fn empty() -> Self {
        Self {
            position: Point::new(S::ZERO, S::ZERO),
            step: Point::new(S::ZERO, S::ZERO),
            remaining: 0,
        }
    }
}

impl<S: Float> Iterator for Walk<S> {
    type Item = Point<usize>;

    fn next(&mut self) -> Option<Self::Item> {
        while self.remaining > 0 {
            self.remaining -= 1;
            let cell = self.position.round();
            self.position += self.step;
            if cell.is_some() {
                return cell;
            }
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.remaining))
    }
}

impl<S: Float> FusedIterator for Walk<S> {}
