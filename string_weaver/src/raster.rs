use image::{DynamicImage, GrayImage};

use crate::{geometry::Point, DistanceTable, Float, Grid};

/// Working intensity buffer of a synthesis run.
///
/// `0` is fully dark and [`Raster::MAX`] fully light. Drawing a thread only
/// ever raises intensities, which is what keeps the greedy search from
/// picking the same chord forever.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Raster {
    pixels: Vec<u8>,
    grid: Grid,
}

impl Raster {
    pub const MAX: u8 = u8::MAX;

    pub fn new(grid: Grid, value: u8) -> Self {
        Self {
            pixels: vec![value; grid.len()],
            grid,
        }
    }

    pub fn from_raw(pixels: Vec<u8>, grid: Grid) -> Result<Self, Error> {
        if pixels.len() != grid.len() {
            return Err(Error::Size {
                expected: grid.len(),
                found: pixels.len(),
            });
        }
        Ok(Self { pixels, grid })
    }

    pub fn from_fn(grid: Grid, mut builder: impl FnMut(Point<usize>) -> u8) -> Self {
        let pixels = (0..grid.height)
            .flat_map(|y| (0..grid.width).map(move |x| Point { x, y }))
            .map(|point| builder(point))
            .collect();
        Self { pixels, grid }
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub fn grid(&self) -> Grid {
        self.grid
    }

    pub fn get(&self, point: Point<usize>) -> Option<u8> {
        self.grid.index_of(point).map(|idx| self.pixels[idx])
    }

    /// Mean darkness per unit length along the chord `from -> to`.
    ///
    /// Adds `MAX - value` for every walked cell and divides by the chord
    /// length, so long and short chords compete on equal terms. A chord from a
    /// nail to itself scores zero.
    pub fn sample_darkness<S: Float>(&self, table: &DistanceTable<S>, from: usize, to: usize) -> S {
        let distance = table.distance(from, to);
        if from == to || distance <= S::ZERO {
            return S::ZERO;
        }
        let max = usize::from(Self::MAX);
        let total: usize = self
            .grid
            .indexes_of(table.walk(from, to))
            .map(|idx| max - usize::from(self.pixels[idx]))
            .sum();
        S::from_usize(total) / distance
    }

    /// Raises every cell on the chord `from -> to` by `amount`, saturating at [`Raster::MAX`].
    ///
    /// Walks exactly the cells [`Raster::sample_darkness`] reads. Does nothing
    /// when both ends are the same nail.
    pub fn darken<S: Float>(&mut self, table: &DistanceTable<S>, from: usize, to: usize, amount: u8) {
        if from == to {
            return;
        }
        for idx in self.grid.indexes_of(table.walk(from, to)) {
            let value = &mut self.pixels[idx];
            *value = value.saturating_add(amount);
        }
    }

    pub fn to_image(&self) -> Option<GrayImage> {
        GrayImage::from_raw(
            u32::try_from(self.grid.width).ok()?,
            u32::try_from(self.grid.height).ok()?,
            self.pixels.clone(),
        )
    }
}

impl From<GrayImage> for Raster {
    fn from(value: GrayImage) -> Self {
        let grid = Grid {
            height: value.height() as usize,
            width: value.width() as usize,
        };
        Self {
            pixels: value.into_raw(),
            grid,
        }
    }
}

impl From<&DynamicImage> for Raster {
    fn from(value: &DynamicImage) -> Self {
        value.to_luma8().into()
    }
}

impl From<DynamicImage> for Raster {
    fn from(value: DynamicImage) -> Self {
        value.into_luma8().into()
    }
}

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error("Expected {expected} pixels but found {found}")]
    Size { expected: usize, found: usize },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{verboser::Silent, NailTable, Shape};

    fn line_table() -> DistanceTable<f64> {
        let table = NailTable::from_points(
            Grid::new(10, 10),
            vec![Point::new(0, 0), Point::new(9, 0), Point::new(0, 9)],
            Shape::Rectangle,
        )
        .unwrap();
        DistanceTable::new(table, &mut Silent)
    }

    #[test]
    fn black_raster_scores_full_darkness_per_cell() {
        let table = line_table();
        let raster = Raster::new(Grid::new(10, 10), 0);
        assert_eq!(raster.sample_darkness(&table, 0, 1), 255.0);
    }

    #[test]
    fn white_raster_scores_nothing() {
        let table = line_table();
        let raster = Raster::new(Grid::new(10, 10), Raster::MAX);
        assert_eq!(raster.sample_darkness(&table, 0, 1), 0.0);
        assert_eq!(raster.sample_darkness(&table, 1, 2), 0.0);
    }

    #[test]
    fn darken_saturates_and_spares_the_far_nail() {
        let table = line_table();
        let mut raster = Raster::new(Grid::new(10, 10), 200);
        raster.darken(&table, 0, 1, 100);
        for x in 0..9 {
            assert_eq!(raster.get(Point::new(x, 0)), Some(Raster::MAX));
        }
        assert_eq!(raster.get(Point::new(9, 0)), Some(200));
        assert_eq!(raster.get(Point::new(0, 1)), Some(200));
    }

    #[test]
    fn darkening_never_raises_the_score() {
        let table = line_table();
        let mut raster = Raster::from_fn(Grid::new(10, 10), |p| (p.x * 20 + p.y) as u8);
        for (from, to) in [(0, 1), (1, 2), (2, 0), (1, 0)] {
            let before = raster.sample_darkness(&table, from, to);
            raster.darken(&table, from, to, 40);
            let after = raster.sample_darkness(&table, from, to);
            assert!(after <= before);
        }
    }

    #[test]
    fn self_chord_is_untouched() {
        let table = line_table();
        let mut raster = Raster::new(Grid::new(10, 10), 0);
        assert_eq!(raster.sample_darkness(&table, 1, 1), 0.0);
        raster.darken(&table, 1, 1, 255);
        assert!(raster.pixels().iter().all(|&v| v == 0));
    }

    #[test]
    fn from_raw_checks_size() {
        assert_eq!(
            Raster::from_raw(vec![0; 5], Grid::new(2, 2)),
            Err(Error::Size {
                expected: 4,
                found: 5
            })
        );
    }

    #[test]
    fn gray_image_round_trip_keeps_layout() {
        let raster = Raster::from_fn(Grid::new(3, 4), |p| (p.y * 4 + p.x) as u8);
        let image = raster.to_image().unwrap();
        assert_eq!(image.width(), 4);
        assert_eq!(image.get_pixel(3, 2).0, [11]);
        assert_eq!(Raster::from(image), raster);
    }
}
