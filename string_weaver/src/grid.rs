use serde::{Deserialize, Serialize};

use crate::geometry::Point;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grid<T = usize> {
    pub height: T,
    pub width: T,
}

impl<T> Grid<T> {
    pub fn new(height: T, width: T) -> Self {
        Self { height, width }
    }
}

impl Grid {
    pub fn len(&self) -> usize {
        self.height * self.width
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, point: Point<usize>) -> bool {
        point.x < self.width && point.y < self.height
    }

    pub fn index_of(&self, point: Point<usize>) -> Option<usize> {
        if self.contains(point) {
            Some(point.y * self.width + point.x)
        } else {
            None
        }
    }

    pub fn indexes_of<'a, I>(&'a self, cells: I) -> impl Iterator<Item = usize> + 'a
    where
        I: Iterator<Item = Point<usize>> + 'a,
    {
        cells.filter_map(|cell| self.index_of(cell))
    }
}
