use std::fmt;

use serde::{Deserialize, Serialize};

use crate::NailDistancer;

/// Boundary on which the nails are placed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Shape {
    #[default]
    Circle,
    Rectangle,
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Circle => write!(f, "circle"),
            Self::Rectangle => write!(f, "rectangle"),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Requested number of nails. Rectangles split it per side, so the
    /// realised table may hold a slightly different count.
    pub nail_count: usize,
    /// Maximum number of synthesis steps.
    pub max_lines: usize,
    /// Intensity added to every cell a thread crosses.
    pub opacity: u8,
    /// Nearest neighbours on each side that may not be linked.
    pub skip_neighbors: usize,
    pub shape: Shape,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            nail_count: 200,
            max_lines: 1500,
            opacity: 35,
            skip_neighbors: 15,
            shape: Shape::Circle,
        }
    }
}

impl Config {
    pub fn validate(&self) -> Result<(), Error> {
        if self.opacity == 0 {
            return Err(Error::ZeroOpacity);
        }
        self.distancer(self.nail_count).map(|_| ())
    }

    /// Candidate offsets for a table of `nail_count` nails.
    pub fn distancer(&self, nail_count: usize) -> Result<NailDistancer, Error> {
        NailDistancer::new(nail_count, self.skip_neighbors)
    }
}

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error("Nail count must be greater or equal to 2")]
    MinNailCount,
    #[error("Skipping {skip} neighbours leaves no reachable nail out of {count}")]
    SkipTooLarge { skip: usize, count: usize },
    #[error("Thread opacity must be greater than 0")]
    ZeroOpacity,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_valid() {
        assert_eq!(Config::default().validate(), Ok(()));
    }

    #[test]
    fn rejects_too_few_nails() {
        for nail_count in [0, 1] {
            let config = Config {
                nail_count,
                skip_neighbors: 0,
                ..Default::default()
            };
            assert_eq!(config.validate(), Err(Error::MinNailCount));
        }
    }

    #[test]
    fn rejects_skip_without_candidates() {
        let config = Config {
            nail_count: 8,
            skip_neighbors: 4,
            ..Default::default()
        };
        assert_eq!(
            config.validate(),
            Err(Error::SkipTooLarge { skip: 4, count: 8 })
        );
        let config = Config {
            nail_count: 7,
            skip_neighbors: 3,
            ..Default::default()
        };
        assert!(config.validate().is_err());
        let config = Config {
            nail_count: 8,
            skip_neighbors: 3,
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn rejects_zero_opacity() {
        let config = Config {
            opacity: 0,
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(Error::ZeroOpacity));
    }
}
