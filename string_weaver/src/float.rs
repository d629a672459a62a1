use std::{
    fmt::{self, Debug, Display},
    ops::{AddAssign, DivAssign, MulAssign, SubAssign},
};

use num_traits::{ConstOne, ConstZero};
use serde::{Deserialize, Serialize};

/// Width of the scalar a run was computed with.
///
/// Walks are rounded from scalar positions, so a path only replays onto the
/// same cells with the precision that produced it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Precision {
    #[default]
    Single,
    Double,
}

impl Display for Precision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Single => write!(f, "single"),
            Self::Double => write!(f, "double"),
        }
    }
}

/// Scalar used for every geometric computation: nail placement, chord lengths,
/// walk positions and darkness scores.
pub trait Float:
    'static
    + Debug
    + Display
    + Sync
    + Send
    + AddAssign
    + SubAssign
    + MulAssign
    + DivAssign
    + num_traits::Float
    + ConstZero
    + ConstOne
{
    const HALF: Self;
    const TWO: Self;
    const PI: Self;
    const TWO_FIVE_FIVE: Self;
    const PRECISION: Precision;

    fn from_usize(value: usize) -> Self;
}

impl Float for f32 {
    const HALF: Self = 0.5;
    const TWO: Self = 2.0;
    const PI: Self = core::f32::consts::PI;
    const TWO_FIVE_FIVE: Self = 255.0;
    const PRECISION: Precision = Precision::Single;

    fn from_usize(value: usize) -> Self {
        value as f32
    }
}

impl Float for f64 {
    const HALF: Self = 0.5;
    const TWO: Self = 2.0;
    const PI: Self = core::f64::consts::PI;
    const TWO_FIVE_FIVE: Self = 255.0;
    const PRECISION: Precision = Precision::Double;

    fn from_usize(value: usize) -> Self {
        value as f64
    }
}
