//! Integer-only transcendental functions
//!
//! CORDIC iteration on a Q16.48 working format with a 48-step arctangent
//! table. No floating point instruction is involved, so results are
//! bit-identical on every target.

use super::{DomainFault, FRACTIONAL_BITS, Fixed, isqrt_round, record_fault, round_shift};

const WORK_BITS: u32 = 48;
const GUARD_BITS: u32 = WORK_BITS - FRACTIONAL_BITS;
const ITERATIONS: usize = 48;
/// atan2 inputs are rescaled so the larger magnitude has this many bits
const NORMALIZED_BITS: u32 = 46;

/// Product of cos(atan(2^-i)) over all iterations, Q16.48
const CORDIC_GAIN_INV: i64 = 170_926_505_739_102;
const HALF_PI_W: i64 = 442_139_859_501_778;
const QUARTER_PI_W: i64 = HALF_PI_W / 2;
const TAU_W: i64 = HALF_PI_W * 4;

/// atan(2^-i), Q16.48. From i = 16 on the value rounds to 2^(48 - i).
const ATAN_TABLE: [i64; 16] = [
    221_069_929_750_889,
    130_505_199_945_453,
    68_955_363_498_242,
    35_002_819_193_903,
    17_569_333_089_919,
    8_793_231_387_230,
    4_397_688_649_582,
    2_198_978_517_948,
    1_099_506_035_422,
    549_755_114_839,
    274_877_819_563,
    137_438_942_549,
    68_719_475_371,
    34_359_738_197,
    17_179_869_163,
    8_589_934_589,
];

#[inline]
fn atan_step(i: usize) -> i64 {
    match ATAN_TABLE.get(i) {
        Some(step) => *step,
        None => 1i64 << (WORK_BITS as usize - i),
    }
}

#[inline]
fn to_fixed(work: i64) -> i64 {
    round_shift(work as i128, GUARD_BITS) as i64
}

/// Rotation mode: sine of `angle` in [0, PI/4], Q16.48 in and out
fn cordic_sin(angle: i64) -> i64 {
    let (mut x, mut y, mut z) = (CORDIC_GAIN_INV, 0i64, angle);
    for i in 0..ITERATIONS {
        let (dx, dy) = (y >> i, x >> i);
        let step = atan_step(i);
        if z >= 0 {
            x -= dx;
            y += dy;
            z -= step;
        } else {
            x += dx;
            y -= dy;
            z += step;
        }
    }
    y
}

/// `sqrt(1 - v^2)` on raw Q32.32 values, `|v| <= 1`
pub(crate) fn unit_complement(v: i64) -> i64 {
    let square = (v as i128 * v as i128) as u128;
    let one_square = 1u128 << (2 * FRACTIONAL_BITS);
    isqrt_round(one_square.saturating_sub(square)) as i64
}

impl Fixed {
    /// Sine and cosine of an angle in radians
    ///
    /// The smaller of the two components comes from CORDIC; the larger is
    /// derived from it with a rounded square root, which keeps
    /// `sin^2 + cos^2` within one LSB of `ONE`.
    pub fn sin_cos(self) -> (Fixed, Fixed) {
        let turn = ((self.raw() as i128) << GUARD_BITS).rem_euclid(TAU_W as i128) as i64;
        let quadrant = turn / HALF_PI_W;
        let t = turn - quadrant * HALF_PI_W;

        let (s, c) = if t <= QUARTER_PI_W {
            let s = to_fixed(cordic_sin(t)).max(0);
            (s, unit_complement(s))
        } else {
            let c = to_fixed(cordic_sin(HALF_PI_W - t)).max(0);
            (unit_complement(c), c)
        };

        let (s, c) = match quadrant {
            0 => (s, c),
            1 => (c, -s),
            2 => (-s, -c),
            _ => (-c, s),
        };
        (Fixed::from_raw(s), Fixed::from_raw(c))
    }

    pub fn sin(self) -> Fixed {
        self.sin_cos().0
    }

    pub fn cos(self) -> Fixed {
        self.sin_cos().1
    }

    /// Four-quadrant arctangent of `self / x`, in `[-PI, PI]`
    ///
    /// `atan2(0, 0)` is defined as zero.
    pub fn atan2(self, x: Fixed) -> Fixed {
        let (mut x, mut y) = (x.raw() as i128, self.raw() as i128);
        let magnitude = x.unsigned_abs().max(y.unsigned_abs());
        if magnitude == 0 {
            return Fixed::ZERO;
        }

        // Only the ratio matters, so rescale both by the same power of two
        let bits = 128 - magnitude.leading_zeros();
        if bits > NORMALIZED_BITS {
            x >>= bits - NORMALIZED_BITS;
            y >>= bits - NORMALIZED_BITS;
        } else {
            x <<= NORMALIZED_BITS - bits;
            y <<= NORMALIZED_BITS - bits;
        }
        let (mut x, mut y) = (x as i64, y as i64);

        // Vectoring only converges in the right half-plane
        let mut z = 0i64;
        if x < 0 {
            if y >= 0 {
                (x, y, z) = (y, -x, HALF_PI_W);
            } else {
                (x, y, z) = (-y, x, -HALF_PI_W);
            }
        }

        for i in 0..ITERATIONS {
            let (dx, dy) = (y >> i, x >> i);
            let step = atan_step(i);
            if y > 0 {
                x += dx;
                y -= dy;
                z += step;
            } else {
                x -= dx;
                y += dy;
                z -= step;
            }
        }

        let angle = to_fixed(z).clamp(-Fixed::PI.raw(), Fixed::PI.raw());
        Fixed::from_raw(angle)
    }

    pub fn checked_asin(self) -> Result<Fixed, DomainFault> {
        self.check_unit("asin")?;
        Ok(self.atan2(Fixed::from_raw(unit_complement(self.raw()))))
    }

    pub fn checked_acos(self) -> Result<Fixed, DomainFault> {
        self.check_unit("acos")?;
        Ok(Fixed::from_raw(unit_complement(self.raw())).atan2(self))
    }

    /// Arcsine in `[-PI/2, PI/2]`. Arguments outside [-1, 1] are clamped and
    /// recorded as a domain fault.
    pub fn asin(self) -> Fixed {
        let a = self.clamp_unit("asin");
        a.atan2(Fixed::from_raw(unit_complement(a.raw())))
    }

    /// Arccosine in `[0, PI]`, same clamping policy as [`Fixed::asin`]
    pub fn acos(self) -> Fixed {
        let a = self.clamp_unit("acos");
        Fixed::from_raw(unit_complement(a.raw())).atan2(a)
    }

    fn check_unit(self, op: &'static str) -> Result<(), DomainFault> {
        if self.abs() > Fixed::ONE {
            return Err(DomainFault::OutOfRange { op, value: self });
        }
        Ok(())
    }

    fn clamp_unit(self, op: &'static str) -> Fixed {
        match self.check_unit(op) {
            Ok(()) => self,
            Err(fault) => {
                record_fault(fault);
                self.clamp(Fixed::NEG_ONE, Fixed::ONE)
            }
        }
    }
}
