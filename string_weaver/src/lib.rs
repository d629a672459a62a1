pub mod geometry {
    pub mod point;
    pub mod segment;

    pub use point::Point;
    pub use segment::{Segment, Walk};
}

mod algorithm;
pub mod config;
mod float;
pub mod grid;
pub mod image;
mod nail_distancer;
mod nail_table;
pub mod raster;
pub mod render;
mod selector;
pub mod store;
pub mod verboser;

pub use algorithm::*;
pub use algorithm::Error;
pub use config::{Config, Shape};
pub use float::{Float, Precision};
pub use grid::Grid;
pub use nail_distancer::NailDistancer;
pub use nail_table::*;
pub use raster::Raster;
pub use render::Drawing;
pub use selector::Selector;
pub use store::PathState;
