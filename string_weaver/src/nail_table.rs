use std::{collections::HashMap, ops::Deref};

use num_traits::ToPrimitive;

use crate::{
    config::Shape,
    geometry::{Point, Segment, Walk},
    grid::Grid,
    verboser::{self, Message},
    Float,
};

/// A nail as seen by the rest of the crate: its position in the table plus
/// the raster cell it sits on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Nail {
    pub index: usize,
    pub position: Point<usize>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct NailTable {
    nails: Vec<Point<usize>>,
    grid: Grid,
    shape: Shape,
}

impl NailTable {
    pub fn new(
        grid: Grid,
        shape: Shape,
        nail_count: usize,
        verboser: &mut impl verboser::Verboser,
    ) -> Result<Self, Error> {
        match shape {
            Shape::Circle => Self::circle(grid, nail_count, verboser),
            Shape::Rectangle => Self::rectangle(grid, nail_count, verboser),
        }
    }

    /// Nails at equal angles on the circle inscribed in the raster's square extent.
    pub fn circle(
        grid: Grid,
        nail_count: usize,
        verboser: &mut impl verboser::Verboser,
    ) -> Result<Self, Error> {
        check_grid(grid)?;
        let center = Point {
            x: f64::from_usize(grid.width),
            y: f64::from_usize(grid.height),
        } * f64::HALF;
        let radius = f64::from_usize(grid.width.min(grid.height)) * f64::HALF - 1.0;
        let nails = (0..nail_count)
            .map(|i| {
                verboser.verbose(Message::CreatingNail(i));
                let theta = f64::TWO * f64::PI * f64::from_usize(i) / f64::from_usize(nail_count);
                let position = Point {
                    x: center.x + radius * theta.cos(),
                    y: center.y + radius * theta.sin(),
                };
                position.round().ok_or(Error::OutOfBounds(i))
            })
            .collect::<Result<_, _>>()?;
        verboser.verbose(Message::CreatingNail(nail_count));
        Self::with_shape(grid, nails, Shape::Circle)
    }

    /// Nails clockwise along the raster border, starting at the top-left corner.
    ///
    /// The requested count is split between the horizontal and vertical sides in
    /// proportion to their lengths, so the realised count is
    /// `2 * (per_top + per_left)` and may differ slightly from `nail_count`.
    pub fn rectangle(
        grid: Grid,
        nail_count: usize,
        verboser: &mut impl verboser::Verboser,
    ) -> Result<Self, Error> {
        check_grid(grid)?;
        let right = grid.width - 1;
        let bottom = grid.height - 1;
        let (w, h) = (f64::from_usize(right), f64::from_usize(bottom));
        let count = f64::from_usize(nail_count);
        let x_count = side_count(count * (w / (w + h)) * f64::HALF);
        let y_count = side_count(count * (h / (w + h)) * f64::HALF);
        let (x_spacing, y_spacing) = (w / f64::from_usize(x_count), h / f64::from_usize(y_count));
        let along = |spacing: f64, idx: usize| round_cell(spacing * f64::from_usize(idx));
        let back = |size: f64, spacing: f64, idx: usize| {
            round_cell(size - spacing * f64::from_usize(idx))
        };

        let mut nails = Vec::with_capacity(2 * (x_count + y_count));
        nails.extend((0..x_count).map(|idx| Point::new(along(x_spacing, idx), 0)));
        nails.extend((0..y_count).map(|idx| Point::new(right, along(y_spacing, idx))));
        nails.extend((0..x_count).map(|idx| Point::new(back(w, x_spacing, idx), bottom)));
        nails.extend((0..y_count).map(|idx| Point::new(0, back(h, y_spacing, idx))));
        for idx in 0..nails.len() {
            verboser.verbose(Message::CreatingNail(idx));
        }
        verboser.verbose(Message::CreatingNail(nails.len()));
        Self::with_shape(grid, nails, Shape::Rectangle)
    }

    /// A table from externally placed nails, kept in the given order.
    pub fn from_points(grid: Grid, nails: Vec<Point<usize>>, shape: Shape) -> Result<Self, Error> {
        check_grid(grid)?;
        Self::with_shape(grid, nails, shape)
    }

    fn with_shape(grid: Grid, nails: Vec<Point<usize>>, shape: Shape) -> Result<Self, Error> {
        if nails.len() < 2 {
            return Err(Error::MinNailCount);
        }
        let mut seen = HashMap::with_capacity(nails.len());
        for (idx, &nail) in nails.iter().enumerate() {
            if !grid.contains(nail) {
                return Err(Error::OutOfBounds(idx));
            }
            if let Some(first) = seen.insert(nail, idx) {
                return Err(Error::Overlapping(first, idx));
            }
        }
        Ok(Self { nails, grid, shape })
    }

    pub fn nails(&self) -> &[Point<usize>] {
        &self.nails
    }

    pub fn nail(&self, index: usize) -> Option<Nail> {
        self.nails.get(index).map(|&position| Nail { index, position })
    }

    pub fn iter(&self) -> impl Iterator<Item = Nail> + '_ {
        self.nails
            .iter()
            .enumerate()
            .map(|(index, &position)| Nail { index, position })
    }

    pub fn len(&self) -> usize {
        self.nails.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nails.is_empty()
    }

    pub fn grid(&self) -> Grid {
        self.grid
    }

    pub fn shape(&self) -> Shape {
        self.shape
    }
}

fn check_grid(grid: Grid) -> Result<(), Error> {
    if grid.width < 2 || grid.height < 2 {
        Err(Error::GridTooSmall(grid.width, grid.height))
    } else {
        Ok(())
    }
}

fn side_count(value: f64) -> usize {
    value.round().to_usize().unwrap_or(0).max(1)
}

fn round_cell(value: f64) -> usize {
    value.round().to_usize().unwrap_or(0)
}

/// Length and unit step of the chord between two nails.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Chord<S> {
    pub distance: S,
    pub step: Point<S>,
}

/// Every ordered nail pair baked into a dense `n * n` table.
///
/// Built once per run so the selection loop never recomputes a square root.
/// Entry `a * n + b` describes the chord walked from nail `a` to nail `b`.
#[derive(Clone, Debug)]
pub struct DistanceTable<S> {
    table: NailTable,
    chords: Vec<Chord<S>>,
}

impl<S: Float> DistanceTable<S> {
    pub fn new(table: NailTable, verboser: &mut impl verboser::Verboser) -> Self {
        verboser.verbose(Message::Baking);
        let positions: Vec<Point<S>> = table.nails.iter().map(|nail| nail.as_float()).collect();
        let chords = positions
            .iter()
            .flat_map(|&from| {
                positions.iter().map(move |&to| {
                    let segment = Segment::new(from, to);
                    let distance = segment.length();
                    Chord {
                        distance,
                        step: segment.direction(distance),
                    }
                })
            })
            .collect();
        Self { table, chords }
    }

    /// Chord from `from` to `to`.
    ///
    /// # Panics
    ///
    /// Panics if either index is outside the table.
    pub fn chord(&self, from: usize, to: usize) -> &Chord<S> {
        let n = self.table.len();
        assert!(from < n && to < n, "nail index out of range");
        &self.chords[from * n + to]
    }

    pub fn distance(&self, from: usize, to: usize) -> S {
        self.chord(from, to).distance
    }

    pub fn segment(&self, from: usize, to: usize) -> Segment<usize> {
        Segment::new(self.table.nails[from], self.table.nails[to])
    }

    /// Raster cells crossed by the thread from `from` to `to`.
    ///
    /// Empty when both indices name the same nail.
    pub fn walk(&self, from: usize, to: usize) -> Walk<S> {
        if from == to {
            return Walk::empty();
        }
        let chord = self.chord(from, to);
        Walk::new(self.table.nails[from].as_float(), chord.step, chord.distance)
    }

    pub fn table(&self) -> &NailTable {
        &self.table
    }
}

impl<S> From<DistanceTable<S>> for NailTable {
    fn from(value: DistanceTable<S>) -> Self {
        value.table
    }
}

impl<S> Deref for DistanceTable<S> {
    type Target = NailTable;

    fn deref(&self) -> &Self::Target {
        &self.table
    }
}

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error("Nail count must be greater or equal to 2")]
    MinNailCount,
    #[error("A {0}x{1} image is too small to place nails on")]
    GridTooSmall(usize, usize),
    #[error("Nail {0} lies outside the image")]
    OutOfBounds(usize),
    #[error("Nails {0} and {1} are overlapping")]
    Overlapping(usize, usize),
}
