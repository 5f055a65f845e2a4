//! Fixed-point 2D vector

use std::fmt;
use std::ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign};

use serde::{Deserialize, Serialize};

use super::{FRACTIONAL_BITS, Fixed, isqrt_round, round_div};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FixedVec2 {
    pub x: Fixed,
    pub y: Fixed,
}

impl FixedVec2 {
    pub const ZERO: FixedVec2 = FixedVec2::new(Fixed::ZERO, Fixed::ZERO);
    pub const X: FixedVec2 = FixedVec2::new(Fixed::ONE, Fixed::ZERO);
    pub const Y: FixedVec2 = FixedVec2::new(Fixed::ZERO, Fixed::ONE);

    pub const fn new(x: Fixed, y: Fixed) -> Self {
        Self { x, y }
    }

    pub const fn from_int(x: i32, y: i32) -> Self {
        Self::new(Fixed::from_int(x), Fixed::from_int(y))
    }

    /// Unit vector pointing along `angle` (radians)
    pub fn from_angle(angle: Fixed) -> Self {
        let (sin, cos) = angle.sin_cos();
        Self::new(cos, sin)
    }

    pub fn dot(self, other: FixedVec2) -> Fixed {
        self.x * other.x + self.y * other.y
    }

    /// Saturates once the squared length leaves the Q32.32 range
    pub fn length_squared(self) -> Fixed {
        self.dot(self)
    }

    /// Euclidean length. Exact for any component size; saturates at
    /// `Fixed::MAX`.
    pub fn length(self) -> Fixed {
        Fixed::from_raw(i64::try_from(self.raw_length()).unwrap_or(i64::MAX))
    }

    /// Length in raw units, wide enough that it never saturates
    fn raw_length(self) -> u128 {
        let x = u128::from(self.x.raw().unsigned_abs());
        let y = u128::from(self.y.raw().unsigned_abs());
        isqrt_round(x * x + y * y)
    }

    /// Scale both components by `num / raw_length`. Neither component exceeds
    /// `raw_length`, so results stay within `|num|`.
    fn scaled(self, num: i128, raw_length: u128) -> Self {
        let den = raw_length as i128;
        let scale = |c: Fixed| Fixed::from_raw(round_div(i128::from(c.raw()) * num, den) as i64);
        Self::new(scale(self.x), scale(self.y))
    }

    /// Same direction with unit length, or zero for the zero vector
    pub fn normalize_or_zero(self) -> Self {
        let length = self.raw_length();
        if length == 0 {
            return FixedVec2::ZERO;
        }
        self.scaled(1 << FRACTIONAL_BITS, length)
    }

    /// Angle from the +x axis, in `[-PI, PI]`
    pub fn angle(self) -> Fixed {
        self.y.atan2(self.x)
    }

    /// Rotate counter-clockwise by `angle` radians
    pub fn rotate(self, angle: Fixed) -> Self {
        let (sin, cos) = angle.sin_cos();
        Self::new(
            self.x * cos - self.y * sin,
            self.x * sin + self.y * cos,
        )
    }

    /// Clamp the length to at most `max`; a negative `max` clamps to zero
    pub fn clamp_length(self, max: Fixed) -> Self {
        let max = max.raw().max(0);
        let length = self.raw_length();
        if length <= max as u128 {
            return self;
        }
        self.scaled(i128::from(max), length)
    }
}

impl Add for FixedVec2 {
    type Output = FixedVec2;
    fn add(self, rhs: FixedVec2) -> FixedVec2 {
        FixedVec2::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for FixedVec2 {
    type Output = FixedVec2;
    fn sub(self, rhs: FixedVec2) -> FixedVec2 {
        FixedVec2::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Neg for FixedVec2 {
    type Output = FixedVec2;
    fn neg(self) -> FixedVec2 {
        FixedVec2::new(-self.x, -self.y)
    }
}

impl Mul<Fixed> for FixedVec2 {
    type Output = FixedVec2;
    fn mul(self, rhs: Fixed) -> FixedVec2 {
        FixedVec2::new(self.x * rhs, self.y * rhs)
    }
}

impl AddAssign for FixedVec2 {
    fn add_assign(&mut self, rhs: FixedVec2) {
        *self = *self + rhs;
    }
}

impl SubAssign for FixedVec2 {
    fn sub_assign(&mut self, rhs: FixedVec2) {
        *self = *self - rhs;
    }
}

impl fmt::Display for FixedVec2 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}
