use serde::{Deserialize, Serialize};

use crate::{
    config::{self, Config},
    geometry::Point,
    nail_table::{self, DistanceTable, NailTable},
    raster::{self, Raster},
    render::Drawing,
    store::{self, PathState},
    verboser::{Message, Verboser},
    Float, NailDistancer, Selector,
};

/// Degenerate steps tolerated before the run is considered complete.
pub const DEGENERATE_LIMIT: usize = 10;

/// One thread pass between two nails.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Edge {
    pub from: usize,
    pub to: usize,
}

impl Edge {
    pub fn new(from: usize, to: usize) -> Self {
        Self { from, to }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum State {
    Running,
    Stopped(Termination),
}

/// Why a run stopped. Both outcomes are successful.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Termination {
    /// The configured line budget was used up.
    Budget,
    /// No dark chord was left: more than [`DEGENERATE_LIMIT`] steps picked the current nail.
    Degenerate,
}

/// The greedy path synthesizer.
///
/// Starts on nail 0 and, at every step, threads to the nail whose chord is the
/// darkest on the working raster, then brightens that chord. The raster is
/// owned by the run and every step reads what the previous one wrote, so
/// steps are strictly sequential.
pub struct Algorithm<S> {
    config: Config,
    table: DistanceTable<S>,
    distancer: NailDistancer,
    raster: Raster,
    selector: Selector<S>,
    current: usize,
    edges: Vec<Edge>,
    points: Vec<Point<usize>>,
    degenerate: usize,
    steps: usize,
    state: State,
}

impl<S: Float> Algorithm<S> {
    pub fn new(config: Config, raster: Raster, verboser: &mut impl Verboser) -> Result<Self, Error> {
        config.validate()?;
        let table = NailTable::new(raster.grid(), config.shape, config.nail_count, verboser)?;
        Self::with_table(config, DistanceTable::new(table, verboser), raster)
    }

    /// Runs on an already baked table, e.g. one built from external nail positions.
    pub fn with_table(config: Config, table: DistanceTable<S>, raster: Raster) -> Result<Self, Error> {
        if config.opacity == 0 {
            return Err(config::Error::ZeroOpacity.into());
        }
        let distancer = config.distancer(table.len())?;
        let points = vec![table.nails()[0]];
        let state = if config.max_lines == 0 {
            State::Stopped(Termination::Budget)
        } else {
            State::Running
        };
        Ok(Self {
            config,
            table,
            distancer,
            raster,
            selector: Selector::new(),
            current: 0,
            edges: Vec::new(),
            points,
            degenerate: 0,
            steps: 0,
            state,
        })
    }

    pub fn with_selector(mut self, selector: Selector<S>) -> Self {
        self.selector = selector;
        self
    }

    /// Performs a single transition and returns the resulting state.
    pub fn step(&mut self) -> State {
        if self.state != State::Running {
            return self.state;
        }
        let next = self
            .selector
            .select_next(self.current, &self.table, &self.raster, self.distancer);
        self.raster
            .darken(&self.table, self.current, next, self.config.opacity);
        if next == self.current {
            self.degenerate += 1;
        } else {
            self.edges.push(Edge::new(self.current, next));
            self.points.push(self.table.nails()[next]);
            self.current = next;
        }
        self.steps += 1;

        if self.steps >= self.config.max_lines {
            log::debug!("line budget of {} reached", self.config.max_lines);
            self.state = State::Stopped(Termination::Budget);
        } else if self.degenerate > DEGENERATE_LIMIT {
            log::info!(
                "stopped after {} lines because the image is complete",
                self.steps
            );
            self.state = State::Stopped(Termination::Degenerate);
        }
        self.state
    }

    /// Runs until the run stops or `lines` steps have been executed in total.
    ///
    /// Can be called repeatedly with growing `lines` to take snapshots of a
    /// run in progress.
    pub fn compute(&mut self, lines: usize, verboser: &mut impl Verboser) -> State {
        let budget = lines.min(self.config.max_lines);
        while self.state == State::Running && self.steps < budget {
            let from = self.current;
            self.step();
            verboser.verbose(Message::Computing(
                self.steps,
                self.config.max_lines,
                from,
                self.current,
            ));
        }
        self.state
    }

    /// Runs to completion.
    pub fn compute_all(&mut self, verboser: &mut impl Verboser) -> State {
        self.compute(self.config.max_lines, verboser)
    }

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

    pub fn current(&self) -> usize {
        self.current
    }

    pub fn state(&self) -> State {
        self.state
    }

    /// Steps executed so far, degenerate ones included.
    pub fn steps(&self) -> usize {
        self.steps
    }

    pub fn degenerate_steps(&self) -> usize {
        self.degenerate
    }

    pub fn drawing(&self) -> Drawing<'_, S> {
        Drawing::new(&self.table, &self.edges, &self.points, self.config.opacity)
    }

    /// Snapshot of the path produced so far, ready to be saved.
    pub fn capture(&self, image_name: impl Into<String>) -> PathState {
        PathState::capture(
            image_name,
            &self.config,
            &self.table,
            self.steps,
            &self.edges,
            &self.points,
        )
    }

    pub fn finish(self) -> Computation<S> {
        Computation {
            termination: match self.state {
                State::Stopped(termination) => Some(termination),
                State::Running => None,
            },
            config: self.config,
            table: self.table,
            raster: self.raster,
            edges: self.edges,
            points: self.points,
            steps: self.steps,
        }
    }
}

/// The output of a run.
pub struct Computation<S> {
    config: Config,
    table: DistanceTable<S>,
    raster: Raster,
    edges: Vec<Edge>,
    points: Vec<Point<usize>>,
    steps: usize,
    termination: Option<Termination>,
}

impl<S: Float> Computation<S> {
    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn table(&self) -> &DistanceTable<S> {
        &self.table
    }

    /// The working raster with every drawn thread applied.
    pub fn raster(&self) -> &Raster {
        &self.raster
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn points(&self) -> &[Point<usize>] {
        &self.points
    }

    pub fn steps(&self) -> usize {
        self.steps
    }

    /// `None` when the run was finished before reaching a terminal state.
    pub fn termination(&self) -> Option<Termination> {
        self.termination
    }

    pub fn drawing(&self) -> Drawing<'_, S> {
        Drawing::new(&self.table, &self.edges, &self.points, self.config.opacity)
    }

    pub fn capture(&self, image_name: impl Into<String>) -> PathState {
        PathState::capture(
            image_name,
            &self.config,
            &self.table,
            self.steps,
            &self.edges,
            &self.points,
        )
    }
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    InvalidConfiguration(#[from] config::Error),
    #[error(transparent)]
    NailTable(#[from] nail_table::Error),
    #[error(transparent)]
    Raster(#[from] raster::Error),
    #[error(transparent)]
    Store(#[from] store::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{verboser::Silent, Grid, Shape};

    fn config(nail_count: usize, max_lines: usize, opacity: u8, skip_neighbors: usize) -> Config {
        Config {
            nail_count,
            max_lines,
            opacity,
            skip_neighbors,
            shape: Shape::Circle,
        }
    }

    #[test]
    fn starts_running_on_nail_zero() {
        let algorithm = Algorithm::<f64>::new(
            config(8, 5, 255, 0),
            Raster::new(Grid::new(100, 100), 128),
            &mut Silent,
        )
        .unwrap();
        assert_eq!(algorithm.state(), State::Running);
        assert_eq!(algorithm.current(), 0);
        assert_eq!(algorithm.points(), &[Point::new(99, 50)]);
        assert!(algorithm.edges().is_empty());
    }

    #[test]
    fn zero_budget_is_stopped_from_the_start() {
        let mut algorithm = Algorithm::<f32>::new(
            config(8, 0, 255, 0),
            Raster::new(Grid::new(100, 100), 0),
            &mut Silent,
        )
        .unwrap();
        assert_eq!(algorithm.state(), State::Stopped(Termination::Budget));
        assert_eq!(algorithm.step(), State::Stopped(Termination::Budget));
        assert_eq!(algorithm.steps(), 0);
    }

    #[test]
    fn invalid_configuration_is_rejected_before_any_work() {
        let raster = Raster::new(Grid::new(100, 100), 0);
        assert!(matches!(
            Algorithm::<f32>::new(config(1, 5, 255, 0), raster.clone(), &mut Silent),
            Err(Error::InvalidConfiguration(config::Error::MinNailCount))
        ));
        assert!(matches!(
            Algorithm::<f32>::new(config(8, 5, 0, 0), raster.clone(), &mut Silent),
            Err(Error::InvalidConfiguration(config::Error::ZeroOpacity))
        ));
        assert!(matches!(
            Algorithm::<f32>::new(config(8, 5, 255, 4), raster, &mut Silent),
            Err(Error::InvalidConfiguration(config::Error::SkipTooLarge { .. }))
        ));
    }

    #[test]
    fn degenerate_step_is_counted_once_and_not_recorded() {
        let mut algorithm = Algorithm::<f64>::new(
            config(8, 50, 35, 0),
            Raster::new(Grid::new(100, 100), Raster::MAX),
            &mut Silent,
        )
        .unwrap();
        assert_eq!(algorithm.step(), State::Running);
        assert_eq!(algorithm.degenerate_steps(), 1);
        assert_eq!(algorithm.steps(), 1);
        assert!(algorithm.edges().is_empty());
        assert_eq!(algorithm.points().len(), 1);
        assert_eq!(algorithm.current(), 0);
    }

    #[test]
    fn compute_is_resumable() {
        let raster = Raster::from_fn(Grid::new(80, 80), |p| ((p.x * 3 + p.y * 5) % 256) as u8);
        let mut whole = Algorithm::<f32>::new(config(40, 30, 60, 3), raster.clone(), &mut Silent)
            .unwrap();
        whole.compute_all(&mut Silent);

        let mut chunked = Algorithm::<f32>::new(config(40, 30, 60, 3), raster, &mut Silent).unwrap();
        assert_eq!(chunked.compute(10, &mut Silent), State::Running);
        assert_eq!(chunked.steps(), 10);
        chunked.compute(20, &mut Silent);
        chunked.compute(100, &mut Silent);

        assert_eq!(chunked.steps(), whole.steps());
        assert_eq!(chunked.edges(), whole.edges());
        assert_eq!(chunked.raster(), whole.raster());
    }

    #[test]
    fn finish_reports_the_termination() {
        let mut algorithm = Algorithm::<f64>::new(
            config(8, 3, 255, 0),
            Raster::new(Grid::new(100, 100), 0),
            &mut Silent,
        )
        .unwrap();
        algorithm.compute_all(&mut Silent);
        let computation = algorithm.finish();
        assert_eq!(computation.termination(), Some(Termination::Budget));
        assert_eq!(computation.steps(), 3);
        assert_eq!(computation.points().len(), computation.edges().len() + 1);
    }
}
