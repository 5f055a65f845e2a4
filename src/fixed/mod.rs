//! Deterministic fixed-point arithmetic
//!
//! `Fixed` is a Q32.32 number stored in an `i64`. Every operation is
//! integer-only, so two peers on different CPUs, compilers or operating
//! systems compute bit-identical results.
//!
//! Rules:
//! - Rescaling (multiply, divide, reciprocal, square root) goes through
//!   128-bit intermediates and rounds half away from zero
//! - Results outside the `i64` range saturate
//! - Out-of-domain inputs return a documented sentinel and bump the
//!   per-thread domain fault counter (see [`domain_faults`])

use std::cell::Cell;
use std::fmt;
use std::ops::{Add, AddAssign, Div, DivAssign, Mul, MulAssign, Neg, Sub, SubAssign};

use serde::{Deserialize, Serialize};
use thiserror::Error;

mod trig;
mod vec2;

pub use vec2::FixedVec2;

/// Number of fractional bits
pub const FRACTIONAL_BITS: u32 = 32;

const ONE_RAW: i64 = 1 << FRACTIONAL_BITS;
const FRACTION_MASK: u64 = (1 << FRACTIONAL_BITS) - 1;

/// An input outside an operation's mathematical domain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DomainFault {
    #[error("division by zero")]
    DivideByZero,
    #[error("reciprocal of zero")]
    ReciprocalOfZero,
    #[error("square root of negative value {0}")]
    NegativeSqrt(Fixed),
    #[error("{op} argument {value} outside [-1, 1]")]
    OutOfRange { op: &'static str, value: Fixed },
    #[error("result overflows the fixed-point range")]
    Overflow,
}

thread_local! {
    static DOMAIN_FAULTS: Cell<u64> = const { Cell::new(0) };
}

/// Domain faults recorded on this thread since the last reset
pub fn domain_faults() -> u64 {
    DOMAIN_FAULTS.with(Cell::get)
}

/// Reset this thread's domain fault counter
pub fn reset_domain_faults() {
    DOMAIN_FAULTS.with(|count| count.set(0));
}

pub(crate) fn record_fault(fault: DomainFault) {
    log::trace!("fixed-point domain fault: {}", fault);
    DOMAIN_FAULTS.with(|count| count.set(count.get().saturating_add(1)));
}

/// Shift right, rounding half away from zero
#[inline]
pub(crate) fn round_shift(value: i128, shift: u32) -> i128 {
    if shift == 0 {
        return value;
    }
    let half = 1i128 << (shift - 1);
    if value >= 0 {
        (value + half) >> shift
    } else {
        -((half - value) >> shift)
    }
}

/// Divide, rounding half away from zero. `den` must be non-zero.
#[inline]
pub(crate) fn round_div(num: i128, den: i128) -> i128 {
    let negative = (num < 0) != (den < 0);
    let (n, d) = (num.unsigned_abs(), den.unsigned_abs());
    let quotient = ((n + d / 2) / d) as i128;
    if negative { -quotient } else { quotient }
}

/// Floor of the square root
pub(crate) fn isqrt(n: u128) -> u128 {
    if n < 2 {
        return n;
    }
    let mut rem = n;
    let mut root = 0u128;
    let mut bit = 1u128 << ((127 - n.leading_zeros()) & !1);
    while bit != 0 {
        if rem >= root + bit {
            rem -= root + bit;
            root = (root >> 1) + bit;
        } else {
            root >>= 1;
        }
        bit >>= 2;
    }
    root
}

/// Square root rounded to the nearest integer
pub(crate) fn isqrt_round(n: u128) -> u128 {
    let root = isqrt(n);
    if n - root * root > root { root + 1 } else { root }
}

#[inline]
fn saturate(value: i128) -> i64 {
    value.clamp(i64::MIN as i128, i64::MAX as i128) as i64
}

/// Q32.32 fixed-point number
///
/// Equality is exact: two values are equal iff their raw integers are.
#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fixed(i64);

impl Fixed {
    pub const ZERO: Fixed = Fixed(0);
    pub const ONE: Fixed = Fixed(ONE_RAW);
    pub const NEG_ONE: Fixed = Fixed(-ONE_RAW);
    pub const HALF: Fixed = Fixed(ONE_RAW / 2);
    pub const TWO: Fixed = Fixed(ONE_RAW * 2);
    /// Smallest positive value
    pub const EPSILON: Fixed = Fixed(1);
    pub const MAX: Fixed = Fixed(i64::MAX);
    pub const MIN: Fixed = Fixed(i64::MIN);
    pub const PI: Fixed = Fixed(13_493_037_705);
    pub const HALF_PI: Fixed = Fixed(6_746_518_852);
    pub const QUARTER_PI: Fixed = Fixed(3_373_259_426);
    pub const TAU: Fixed = Fixed(26_986_075_409);

    #[inline]
    pub const fn from_raw(raw: i64) -> Self {
        Fixed(raw)
    }

    /// Underlying scaled integer
    #[inline]
    pub const fn raw(self) -> i64 {
        self.0
    }

    #[inline]
    pub const fn from_int(value: i32) -> Self {
        Fixed((value as i64) << FRACTIONAL_BITS)
    }

    /// `num / den`, rounded. A zero denominator is a domain fault with the
    /// same sentinel as division.
    pub fn from_ratio(num: i64, den: i64) -> Self {
        if den == 0 {
            record_fault(DomainFault::DivideByZero);
            return Self::division_sentinel(num);
        }
        Fixed(saturate(round_div((num as i128) << FRACTIONAL_BITS, den as i128)))
    }

    /// Integer part, rounded toward negative infinity
    #[inline]
    pub const fn to_int(self) -> i64 {
        self.0 >> FRACTIONAL_BITS
    }

    /// Lossy conversion for display and telemetry. Never feed the result
    /// back into simulation state.
    pub fn to_f64(self) -> f64 {
        self.0 as f64 / ONE_RAW as f64
    }

    #[inline]
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub const fn is_negative(self) -> bool {
        self.0 < 0
    }

    /// Absolute value (`MIN` saturates to `MAX`)
    #[inline]
    pub const fn abs(self) -> Self {
        Fixed(self.0.saturating_abs())
    }

    /// `-1`, `0` or `1`
    #[inline]
    pub const fn signum(self) -> Self {
        match self.0 {
            0 => Fixed::ZERO,
            v if v > 0 => Fixed::ONE,
            _ => Fixed::NEG_ONE,
        }
    }

    pub fn checked_mul(self, rhs: Fixed) -> Result<Fixed, DomainFault> {
        let product = round_shift(self.0 as i128 * rhs.0 as i128, FRACTIONAL_BITS);
        i64::try_from(product)
            .map(Fixed)
            .map_err(|_| DomainFault::Overflow)
    }

    pub fn checked_div(self, rhs: Fixed) -> Result<Fixed, DomainFault> {
        if rhs.0 == 0 {
            return Err(DomainFault::DivideByZero);
        }
        let quotient = round_div((self.0 as i128) << FRACTIONAL_BITS, rhs.0 as i128);
        i64::try_from(quotient)
            .map(Fixed)
            .map_err(|_| DomainFault::Overflow)
    }

    pub fn checked_recip(self) -> Result<Fixed, DomainFault> {
        if self.0 == 0 {
            return Err(DomainFault::ReciprocalOfZero);
        }
        let recip = round_div(1i128 << (2 * FRACTIONAL_BITS), self.0 as i128);
        i64::try_from(recip)
            .map(Fixed)
            .map_err(|_| DomainFault::Overflow)
    }

    pub fn checked_sqrt(self) -> Result<Fixed, DomainFault> {
        if self.0 < 0 {
            return Err(DomainFault::NegativeSqrt(self));
        }
        let root = isqrt_round((self.0 as u128) << FRACTIONAL_BITS);
        Ok(Fixed(root as i64))
    }

    /// `1 / self`. Zero returns `MAX` and records a domain fault.
    pub fn recip(self) -> Fixed {
        if self.0 == 0 {
            record_fault(DomainFault::ReciprocalOfZero);
            return Fixed::MAX;
        }
        Fixed(saturate(round_div(
            1i128 << (2 * FRACTIONAL_BITS),
            self.0 as i128,
        )))
    }

    /// Square root. Negative input returns `ZERO` and records a domain fault.
    pub fn sqrt(self) -> Fixed {
        match self.checked_sqrt() {
            Ok(root) => root,
            Err(fault) => {
                record_fault(fault);
                Fixed::ZERO
            }
        }
    }

    /// Linear interpolation, `t` in [0, 1]
    pub fn lerp(self, other: Fixed, t: Fixed) -> Fixed {
        self + (other - self) * t
    }

    /// Wrap an angle into `[-PI, PI)`
    pub fn wrap_angle(self) -> Fixed {
        let shifted = (self.0 as i128 + Fixed::PI.0 as i128).rem_euclid(Fixed::TAU.0 as i128);
        Fixed((shifted - Fixed::PI.0 as i128) as i64)
    }

    fn division_sentinel(num: i64) -> Fixed {
        match num {
            0 => Fixed::ZERO,
            n if n > 0 => Fixed::MAX,
            _ => Fixed::MIN,
        }
    }
}

impl From<i32> for Fixed {
    fn from(value: i32) -> Self {
        Fixed::from_int(value)
    }
}

impl Add for Fixed {
    type Output = Fixed;
    #[inline]
    fn add(self, rhs: Fixed) -> Fixed {
        Fixed(self.0.saturating_add(rhs.0))
    }
}

impl Sub for Fixed {
    type Output = Fixed;
    #[inline]
    fn sub(self, rhs: Fixed) -> Fixed {
        Fixed(self.0.saturating_sub(rhs.0))
    }
}

impl Neg for Fixed {
    type Output = Fixed;
    #[inline]
    fn neg(self) -> Fixed {
        Fixed(self.0.saturating_neg())
    }
}

impl Mul for Fixed {
    type Output = Fixed;
    #[inline]
    fn mul(self, rhs: Fixed) -> Fixed {
        Fixed(saturate(round_shift(
            self.0 as i128 * rhs.0 as i128,
            FRACTIONAL_BITS,
        )))
    }
}

/// Division by zero records a domain fault and returns `MAX`, `MIN` or
/// `ZERO` depending on the sign of the numerator.
impl Div for Fixed {
    type Output = Fixed;
    fn div(self, rhs: Fixed) -> Fixed {
        match self.checked_div(rhs) {
            Ok(quotient) => quotient,
            Err(DomainFault::Overflow) => {
                if self.is_negative() != rhs.is_negative() {
                    Fixed::MIN
                } else {
                    Fixed::MAX
                }
            }
            Err(fault) => {
                record_fault(fault);
                Fixed::division_sentinel(self.0)
            }
        }
    }
}

impl AddAssign for Fixed {
    fn add_assign(&mut self, rhs: Fixed) {
        *self = *self + rhs;
    }
}

impl SubAssign for Fixed {
    fn sub_assign(&mut self, rhs: Fixed) {
        *self = *self - rhs;
    }
}

impl MulAssign for Fixed {
    fn mul_assign(&mut self, rhs: Fixed) {
        *self = *self * rhs;
    }
}

impl DivAssign for Fixed {
    fn div_assign(&mut self, rhs: Fixed) {
        *self = *self / rhs;
    }
}

/// Six decimal places, computed without floating point
impl fmt::Display for Fixed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let magnitude = self.0.unsigned_abs();
        let mut whole = magnitude >> FRACTIONAL_BITS;
        let fraction = magnitude & FRACTION_MASK;
        let mut micros =
            ((fraction as u128 * 1_000_000 + (1u128 << (FRACTIONAL_BITS - 1))) >> FRACTIONAL_BITS) as u64;
        if micros == 1_000_000 {
            whole += 1;
            micros = 0;
        }
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}{}.{:06}", sign, whole, micros)
    }
}

impl fmt::Debug for Fixed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Fixed({})", self)
    }
}
