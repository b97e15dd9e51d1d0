use serde::{Deserialize, Serialize};

/// Planar position `[x, y]`, indexed through [`Axis`].
pub type Point2 = [f64; 2];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Axis {
    X,
    Y,
}

impl Axis {
    pub const ALL: [Axis; 2] = [Axis::X, Axis::Y];

    pub fn index(self) -> usize {
        match self {
            Axis::X => 0,
            Axis::Y => 1,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Axis::X => "x",
            Axis::Y => "y",
        }
    }

    #[inline]
    pub fn of(self, point: &Point2) -> f64 {
        point[self.index()]
    }

    #[inline]
    pub fn set(self, point: &mut Point2, value: f64) {
        point[self.index()] = value;
    }
}

/// Full state of the chaotic flow: three unwrapped phase angles followed by
/// the planar position they steer.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ChaosState {
    pub x1: f64,
    pub x2: f64,
    pub x3: f64,
    pub x: f64,
    pub y: f64,
}

impl ChaosState {
    pub fn new(x1: f64, x2: f64, x3: f64, x: f64, y: f64) -> Self {
        Self { x1, x2, x3, x, y }
    }

    pub fn position(&self) -> Point2 {
        [self.x, self.y]
    }

    pub fn phases(&self) -> [f64; 3] {
        [self.x1, self.x2, self.x3]
    }

    pub fn is_finite(&self) -> bool {
        self.to_array().iter().all(|v| v.is_finite())
    }

    pub fn to_array(&self) -> [f64; 5] {
        [self.x1, self.x2, self.x3, self.x, self.y]
    }
}

impl From<[f64; 5]> for ChaosState {
    fn from(values: [f64; 5]) -> Self {
        let [x1, x2, x3, x, y] = values;
        Self { x1, x2, x3, x, y }
    }
}

impl From<ChaosState> for [f64; 5] {
    fn from(state: ChaosState) -> Self {
        state.to_array()
    }
}
