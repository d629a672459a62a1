//! Saving and reloading the result of a run.
//!
//! Only the configuration and the path are stored. The working raster is
//! rebuilt on reload by replaying every stored edge on a freshly prepared
//! image, which gives back exactly the raster the run ended with.

use std::{
    fs::File,
    io::{BufReader, BufWriter},
    path::Path,
};

use serde::{Deserialize, Serialize};

use crate::{
    algorithm::Edge,
    config::{Config, Shape},
    geometry::Point,
    nail_table::{DistanceTable, NailTable},
    render::Drawing,
    verboser::{Message, Verboser},
    Float, Grid, Precision, Raster,
};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PathState {
    /// Identifier of the source image. Never interpreted.
    pub image_name: String,
    pub width: usize,
    pub height: usize,
    pub nail_count: usize,
    /// Steps the run actually executed, degenerate ones included.
    pub total_lines: usize,
    pub opacity: u8,
    pub skip_neighbors: usize,
    pub shape: Shape,
    /// Scalar the walks were computed with. Replays must use the same one.
    pub precision: Precision,
    pub edges: Vec<Edge>,
    pub points: Vec<Point<usize>>,
}

/// Configuration and path slices handed back by [`PathState::restore`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Restored<'a> {
    pub config: Config,
    pub edges: &'a [Edge],
    pub points: &'a [Point<usize>],
}

impl PathState {
    pub fn capture<S: Float>(
        image_name: impl Into<String>,
        config: &Config,
        table: &DistanceTable<S>,
        total_lines: usize,
        edges: &[Edge],
        points: &[Point<usize>],
    ) -> Self {
        let grid = table.grid();
        Self {
            image_name: image_name.into(),
            width: grid.width,
            height: grid.height,
            nail_count: config.nail_count,
            total_lines,
            opacity: config.opacity,
            skip_neighbors: config.skip_neighbors,
            shape: table.shape(),
            precision: S::PRECISION,
            edges: edges.to_vec(),
            points: points.to_vec(),
        }
    }

    pub fn grid(&self) -> Grid {
        Grid::new(self.height, self.width)
    }

    pub fn config(&self) -> Config {
        Config {
            nail_count: self.nail_count,
            max_lines: self.total_lines,
            opacity: self.opacity,
            skip_neighbors: self.skip_neighbors,
            shape: self.shape,
        }
    }

    /// Checks that the stored path is a chain starting on nail 0 with one
    /// point per visited nail.
    pub fn check(&self) -> Result<(), Error> {
        if self.points.len() != self.edges.len() + 1 {
            return Err(Error::Corrupted(format!(
                "{} points for {} edges",
                self.points.len(),
                self.edges.len()
            )));
        }
        if let Some(first) = self.edges.first() {
            if first.from != 0 {
                return Err(Error::Corrupted(format!(
                    "path starts on nail {} instead of 0",
                    first.from
                )));
            }
        }
        match self
            .edges
            .windows(2)
            .position(|pair| pair[0].to != pair[1].from)
        {
            Some(idx) => Err(Error::Corrupted(format!("edge {} does not chain", idx + 1))),
            None => Ok(()),
        }
    }

    /// Configuration and the first `limit` edges, with their `limit + 1` points.
    ///
    /// A missing or too large `limit` keeps the whole path.
    pub fn restore(&self, limit: Option<usize>) -> Restored<'_> {
        let kept = limit.map_or(self.edges.len(), |limit| limit.min(self.edges.len()));
        let mut config = self.config();
        if let Some(limit) = limit {
            config.max_lines = config.max_lines.min(limit);
        }
        Restored {
            config,
            edges: &self.edges[..kept],
            points: &self.points[..(kept + 1).min(self.points.len())],
        }
    }

    /// Rebuilds the nail table on `raster` and re-applies the first `limit`
    /// edges to it.
    ///
    /// `opacity` overrides the stored thread strength. Fails when `raster`
    /// does not have the stored size or when the nails rebuilt from the stored
    /// configuration are not where the stored path says they are.
    pub fn replay<S: Float>(
        &self,
        mut raster: Raster,
        limit: Option<usize>,
        opacity: Option<u8>,
        verboser: &mut impl Verboser,
    ) -> Result<Replay<S>, crate::Error> {
        self.check()?;
        if S::PRECISION != self.precision {
            return Err(Error::GeometryMismatch(format!(
                "computed in {} precision but replayed in {}",
                self.precision,
                S::PRECISION
            ))
            .into());
        }
        let Restored {
            mut config,
            edges,
            points,
        } = self.restore(limit);
        if let Some(opacity) = opacity {
            config.opacity = opacity;
        }
        config.validate()?;

        if raster.grid() != self.grid() {
            return Err(Error::GeometryMismatch(format!(
                "saved for a {}x{} image but got {}x{}",
                self.width,
                self.height,
                raster.grid().width,
                raster.grid().height
            ))
            .into());
        }
        let table = NailTable::new(raster.grid(), config.shape, config.nail_count, verboser)?;
        check_nails(&table, edges, points)?;
        let table = DistanceTable::new(table, verboser);

        for (idx, edge) in edges.iter().enumerate() {
            raster.darken(&table, edge.from, edge.to, config.opacity);
            verboser.verbose(Message::Replaying(idx + 1, edges.len()));
        }
        log::debug!(
            "replayed {} of {} edges of {}",
            edges.len(),
            self.edges.len(),
            self.image_name
        );
        Ok(Replay {
            config,
            table,
            raster,
            edges: edges.to_vec(),
            points: points.to_vec(),
        })
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), Error> {
        let path = path.as_ref();
        let writer = BufWriter::new(File::create(path)?);
        bincode::serialize_into(writer, self)?;
        log::info!("saved {} edges to {}", self.edges.len(), path.display());
        Ok(())
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        let reader = BufReader::new(File::open(path)?);
        let state: Self = bincode::deserialize_from(reader)?;
        state.check()?;
        log::info!("loaded {} edges from {}", state.edges.len(), path.display());
        Ok(state)
    }
}

fn check_nails(table: &NailTable, edges: &[Edge], points: &[Point<usize>]) -> Result<(), Error> {
    let nail_at = |idx: usize| {
        table.nail(idx).ok_or_else(|| {
            Error::GeometryMismatch(format!(
                "nail {} does not exist on a {} nail table",
                idx,
                table.len()
            ))
        })
    };
    if points.first() != Some(&nail_at(0)?.position) {
        return Err(Error::GeometryMismatch(String::from(
            "the first nail moved",
        )));
    }
    for (edge, &point) in edges.iter().zip(&points[1..]) {
        let nail = nail_at(edge.to)?;
        if nail.position != point {
            return Err(Error::GeometryMismatch(format!(
                "nail {} is no longer at {}",
                nail.index, point
            )));
        }
    }
    Ok(())
}

/// A stored path re-applied to a fresh raster.
pub struct Replay<S> {
    config: Config,
    table: DistanceTable<S>,
    raster: Raster,
    edges: Vec<Edge>,
    points: Vec<Point<usize>>,
}

impl<S: Float> Replay<S> {
    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn table(&self) -> &DistanceTable<S> {
        &self.table
    }

    pub fn raster(&self) -> &Raster {
        &self.raster
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn points(&self) -> &[Point<usize>] {
        &self.points
    }

    pub fn drawing(&self) -> Drawing<'_, S> {
        Drawing::new(&self.table, &self.edges, &self.points, self.config.opacity)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("The saved path does not fit this image: {0}")]
    GeometryMismatch(String),
    #[error("The saved path is corrupted: {0}")]
    Corrupted(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Encoding(#[from] bincode::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{verboser::Silent, Algorithm};

    fn gradient(size: usize) -> Raster {
        Raster::from_fn(Grid::new(size, size), |p| ((p.x + p.y) * 255 / (2 * size)) as u8)
    }

    fn run() -> (PathState, Raster) {
        let config = Config {
            nail_count: 36,
            max_lines: 40,
            opacity: 50,
            skip_neighbors: 4,
            shape: Shape::Circle,
        };
        let mut algorithm = Algorithm::<f64>::new(config, gradient(90), &mut Silent).unwrap();
        algorithm.compute_all(&mut Silent);
        (algorithm.capture("gradient.png"), algorithm.raster().clone())
    }

    #[test]
    fn capture_keeps_the_invariants() {
        let (state, _) = run();
        assert_eq!(state.points.len(), state.edges.len() + 1);
        assert_eq!(state.total_lines, 40);
        assert_eq!((state.width, state.height), (90, 90));
        assert!(state.check().is_ok());
    }

    #[test]
    fn restore_without_limit_returns_everything() {
        let (state, _) = run();
        let restored = state.restore(None);
        assert_eq!(restored.edges, &state.edges[..]);
        assert_eq!(restored.points, &state.points[..]);
        assert_eq!(restored.config, state.config());
    }

    #[test]
    fn restore_truncates_edges_and_points_together() {
        let (state, _) = run();
        let restored = state.restore(Some(5));
        assert_eq!(restored.edges.len(), 5);
        assert_eq!(restored.points.len(), 6);
        assert_eq!(restored.config.max_lines, 5);
        assert_eq!(state.restore(Some(10_000)).edges.len(), state.edges.len());
    }

    #[test]
    fn replay_rebuilds_the_final_raster() {
        let (state, raster) = run();
        let replay = state
            .replay::<f64>(gradient(90), None, None, &mut Silent)
            .unwrap();
        assert_eq!(replay.raster(), &raster);
        assert_eq!(replay.edges(), &state.edges[..]);
    }

    #[test]
    fn replay_rejects_another_image_size() {
        let (state, _) = run();
        assert!(matches!(
            state.replay::<f64>(gradient(80), None, None, &mut Silent),
            Err(crate::Error::Store(Error::GeometryMismatch(_)))
        ));
    }

    #[test]
    fn capture_records_the_precision() {
        let (state, _) = run();
        assert_eq!(state.precision, Precision::Double);
        assert!(matches!(
            state.replay::<f32>(gradient(90), None, None, &mut Silent),
            Err(crate::Error::Store(Error::GeometryMismatch(_)))
        ));
    }

    #[test]
    fn replay_rejects_another_layout() {
        let (mut state, _) = run();
        state.shape = Shape::Rectangle;
        assert!(matches!(
            state.replay::<f64>(gradient(90), None, None, &mut Silent),
            Err(crate::Error::Store(Error::GeometryMismatch(_)))
        ));
    }

    #[test]
    fn check_spots_broken_chains() {
        let (mut state, _) = run();
        state.points.pop();
        assert!(matches!(state.check(), Err(Error::Corrupted(_))));

        let (mut state, _) = run();
        state.edges[1].from += 1;
        assert!(matches!(state.check(), Err(Error::Corrupted(_))));
    }
}
