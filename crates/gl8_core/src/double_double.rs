//! Double-double extended precision scalar.
//!
//! A `DoubleDouble` is the unevaluated sum `hi + lo` of two `f64` values with
//! `|lo| <= ulp(hi) / 2`, which gives roughly 106 bits of mantissa (about 32
//! decimal digits) while keeping the exponent range of `f64`. Arithmetic is
//! built from the usual error-free transformations (two-sum and a fused
//! multiply-add based two-product).
//!
//! The type implements the `num_traits` numeric tower so it satisfies
//! [`Scalar`](crate::traits::Scalar) and can be used anywhere `f64` can.
//! Transcendental functions are evaluated in double-double precision; the
//! hyperbolic ones lose relative accuracy for arguments extremely close to
//! their zeros.

use num_traits::{Float, FromPrimitive, Num, One, ToPrimitive, Zero};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{
    Add, AddAssign, Div, DivAssign, Mul, MulAssign, Neg, Rem, RemAssign, Sub, SubAssign,
};
use std::str::FromStr;
use thiserror::Error;

const MAX_SERIES_TERMS: usize = 40;

#[inline]
fn two_sum(a: f64, b: f64) -> (f64, f64) {
    let s = a + b;
    let bb = s - a;
    (s, (a - (s - bb)) + (b - bb))
}

/// Requires |a| >= |b|.
#[inline]
fn quick_two_sum(a: f64, b: f64) -> (f64, f64) {
    let s = a + b;
    (s, b - (s - a))
}

#[inline]
fn two_prod(a: f64, b: f64) -> (f64, f64) {
    let p = a * b;
    (p, a.mul_add(b, -p))
}

#[derive(Debug, Clone, Copy, Default, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct DoubleDouble {
    pub hi: f64,
    pub lo: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseDoubleDoubleError {
    #[error("cannot parse a double-double from an empty string")]
    Empty,
    #[error("invalid double-double literal {0:?}")]
    Invalid(String),
}

impl DoubleDouble {
    pub const ZERO: Self = Self::new(0.0, 0.0);
    pub const ONE: Self = Self::new(1.0, 0.0);
    pub const PI: Self = Self::new(3.141592653589793, 1.2246467991473532e-16);
    pub const TAU: Self = Self::new(6.283185307179586, 2.4492935982947064e-16);
    pub const FRAC_PI_2: Self = Self::new(1.5707963267948966, 6.123233995736766e-17);
    pub const LN_2: Self = Self::new(0.6931471805599453, 2.3190468138462996e-17);
    pub const LN_10: Self = Self::new(2.302585092994046, -2.1707562233822494e-16);
    pub const E: Self = Self::new(2.718281828459045, 1.4456468917292502e-16);
    /// 2^-104, the spacing of double-double numbers around one.
    pub const EPSILON: Self = Self::new(4.930380657631324e-32, 0.0);

    /// Builds a value from components that are already normalized.
    pub const fn new(hi: f64, lo: f64) -> Self {
        Self { hi, lo }
    }

    /// Exact sum of two doubles.
    pub fn from_sum(a: f64, b: f64) -> Self {
        let (hi, lo) = two_sum(a, b);
        Self::finish(hi, lo)
    }

    /// Exact product of two doubles.
    pub fn from_product(a: f64, b: f64) -> Self {
        let (hi, lo) = two_prod(a, b);
        Self::finish(hi, lo)
    }

    // Non-finite leading parts poison the trailing part with NaN; drop it.
    #[inline]
    fn finish(hi: f64, lo: f64) -> Self {
        if hi.is_finite() {
            Self { hi, lo }
        } else {
            Self { hi, lo: 0.0 }
        }
    }

    fn mul_f64(self, b: f64) -> Self {
        let (p1, p2) = two_prod(self.hi, b);
        let (hi, lo) = quick_two_sum(p1, p2 + self.lo * b);
        Self::finish(hi, lo)
    }

    fn div_f64(self, b: f64) -> Self {
        let q1 = self.hi / b;
        if !q1.is_finite() {
            return Self::new(q1, 0.0);
        }
        let (p1, p2) = two_prod(q1, b);
        let (s, e) = two_sum(self.hi, -p1);
        let e = e - p2 + self.lo;
        let q2 = (s + e) / b;
        let (hi, lo) = quick_two_sum(q1, q2);
        Self::finish(hi, lo)
    }

    fn square(self) -> Self {
        let (p1, p2) = two_prod(self.hi, self.hi);
        let p2 = p2 + 2.0 * self.hi * self.lo + self.lo * self.lo;
        let (hi, lo) = quick_two_sum(p1, p2);
        Self::finish(hi, lo)
    }

    fn ldexp(self, exp: i32) -> Self {
        let half = exp / 2;
        let a = 2.0_f64.powi(half);
        let b = 2.0_f64.powi(exp - half);
        Self::finish(self.hi * a * b, self.lo * a * b)
    }

    fn series_converged(term: Self, sum: Self) -> bool {
        term.hi.abs() <= 1e-2 * Self::EPSILON.hi * sum.hi.abs()
    }

    /// `exp(r) - 1` by Taylor series, for small `|r|`.
    fn exp_m1_series(r: Self) -> Self {
        let mut term = r;
        let mut sum = r;
        for k in 2..MAX_SERIES_TERMS {
            term = (term * r).div_f64(k as f64);
            sum = sum + term;
            if Self::series_converged(term, sum) {
                break;
            }
        }
        sum
    }

    /// `sin(r)` by Taylor series, for `|r| <= pi/4`.
    fn sin_series(r: Self) -> Self {
        if r.hi == 0.0 {
            return Self::ZERO;
        }
        let minus_r2 = -r.square();
        let mut term = r;
        let mut sum = r;
        for k in 1..MAX_SERIES_TERMS {
            let denom = (2 * k) * (2 * k + 1);
            term = (term * minus_r2).div_f64(denom as f64);
            sum = sum + term;
            if Self::series_converged(term, sum) {
                break;
            }
        }
        sum
    }

    fn exp_dd(self) -> Self {
        if self.hi.is_nan() {
            return Self::nan();
        }
        if self.hi > 709.78 {
            return Self::infinity();
        }
        if self.hi < -745.2 {
            return Self::ZERO;
        }
        if self.hi == 0.0 {
            return Self::ONE;
        }
        // exp(x) = 2^m * (1 + s)^512 with |x - m ln2| / 512 tiny.
        let m = (self.hi / Self::LN_2.hi + 0.5).floor();
        let r = (self - Self::LN_2.mul_f64(m)).mul_f64(1.0 / 512.0);
        let mut s = Self::exp_m1_series(r);
        for _ in 0..9 {
            s = s.mul_f64(2.0) + s.square();
        }
        (s + Self::ONE).ldexp(m as i32)
    }

    fn exp_m1_dd(self) -> Self {
        if self.hi.abs() < 0.5 {
            Self::exp_m1_series(self)
        } else {
            self.exp_dd() - Self::ONE
        }
    }

    fn ln_dd(self) -> Self {
        if self.hi.is_nan() || self.hi < 0.0 {
            return Self::nan();
        }
        if self.hi == 0.0 {
            return Self::neg_infinity();
        }
        if self.hi.is_infinite() {
            return Self::infinity();
        }
        if self == Self::ONE {
            return Self::ZERO;
        }
        // One Newton step on exp(x) = a doubles the f64 estimate's accuracy.
        let x = Self::new(self.hi.ln(), 0.0);
        x + self * (-x).exp_dd() - Self::ONE
    }

    fn sqrt_dd(self) -> Self {
        if self.hi == 0.0 {
            return Self::ZERO;
        }
        if self.hi < 0.0 || self.hi.is_nan() {
            return Self::nan();
        }
        if self.hi.is_infinite() {
            return Self::infinity();
        }
        let x = 1.0 / self.hi.sqrt();
        let ax = self.hi * x;
        let correction = (self - Self::from_product(ax, ax)).hi * (x * 0.5);
        Self::from_sum(ax, correction)
    }

    fn sin_cos_dd(self) -> (Self, Self) {
        if !self.hi.is_finite() {
            return (Self::nan(), Self::nan());
        }
        if self.hi == 0.0 {
            return (Self::ZERO, Self::ONE);
        }
        let turns = (self / Self::TAU).hi.round();
        let r = self - Self::TAU.mul_f64(turns);
        let quadrant = (r.hi / Self::FRAC_PI_2.hi).round();
        let r = r - Self::FRAC_PI_2.mul_f64(quadrant);

        let s = Self::sin_series(r);
        let c = (Self::ONE - s.square()).sqrt_dd();
        match (quadrant as i64).rem_euclid(4) {
            0 => (s, c),
            1 => (c, -s),
            2 => (-s, -c),
            _ => (-c, s),
        }
    }

    fn atan2_dd(self, x: Self) -> Self {
        let y = self;
        let theta0 = y.hi.atan2(x.hi);
        if (y.hi == 0.0 && x.hi == 0.0) || !y.hi.is_finite() || !x.hi.is_finite() {
            return Self::new(theta0, 0.0);
        }
        // Newton step on x sin(t) - y cos(t) = 0.
        let theta = Self::new(theta0, 0.0);
        let (s, c) = theta.sin_cos_dd();
        theta + (y * c - x * s) / (x * c + y * s)
    }
}

impl From<f64> for DoubleDouble {
    fn from(value: f64) -> Self {
        Self::new(value, 0.0)
    }
}

impl fmt::Display for DoubleDouble {
    /// Scientific notation; the formatter precision selects the number of
    /// fractional mantissa digits (31 by default).
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.hi.is_nan() {
            return f.write_str("NaN");
        }
        if self.hi.is_infinite() {
            return f.write_str(if self.hi > 0.0 { "inf" } else { "-inf" });
        }
        if self.hi == 0.0 {
            return f.write_str(if self.hi.is_sign_negative() { "-0e0" } else { "0e0" });
        }

        let digits = f.precision().unwrap_or(31) + 1;
        // 10^-exponent overflows for subnormals, whose low word is zero anyway.
        if self.hi.abs() < f64::MIN_POSITIVE {
            return write!(f, "{:.*e}", digits - 1, self.hi);
        }
        let negative = self.hi < 0.0;
        let value = self.abs();
        let mut exponent = value.hi.log10().floor() as i32;
        let ten = Self::new(10.0, 0.0);
        let mut r = if exponent >= 0 {
            value / Float::powi(ten, exponent)
        } else {
            value * Float::powi(ten, -exponent)
        };
        if r.hi >= 10.0 {
            r = r.div_f64(10.0);
            exponent += 1;
        } else if r.hi < 1.0 {
            r = r.mul_f64(10.0);
            exponent -= 1;
        }

        let mut out: Vec<u8> = Vec::with_capacity(digits + 1);
        for _ in 0..=digits {
            let d = r.hi.floor().clamp(0.0, 9.0);
            out.push(d as u8);
            r = (r - Self::new(d, 0.0)).mul_f64(10.0);
        }
        if out.pop().is_some_and(|d| d >= 5) {
            let mut i = out.len();
            loop {
                if i == 0 {
                    out.insert(0, 1);
                    out.pop();
                    exponent += 1;
                    break;
                }
                i -= 1;
                if out[i] == 9 {
                    out[i] = 0;
                } else {
                    out[i] += 1;
                    break;
                }
            }
        }

        let mut text = String::with_capacity(digits + 8);
        if negative {
            text.push('-');
        }
        text.push(char::from(b'0' + out[0]));
        if out.len() > 1 {
            text.push('.');
            text.extend(out[1..].iter().map(|d| char::from(b'0' + d)));
        }
        text.push('e');
        text.push_str(&exponent.to_string());
        f.write_str(&text)
    }
}

impl FromStr for DoubleDouble {
    type Err = ParseDoubleDoubleError;

    /// Parses decimal literals (`-1.25e-3`, `.5`, `inf`, `nan`) with full
    /// double-double precision in the mantissa.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let text = s.trim();
        if text.is_empty() {
            return Err(ParseDoubleDoubleError::Empty);
        }
        match text.to_ascii_lowercase().as_str() {
            "nan" => return Ok(Self::nan()),
            "inf" | "+inf" | "infinity" | "+infinity" => return Ok(Self::infinity()),
            "-inf" | "-infinity" => return Ok(Self::neg_infinity()),
            _ => {}
        }

        let invalid = || ParseDoubleDoubleError::Invalid(s.to_string());
        let (negative, body) = if let Some(rest) = text.strip_prefix('-') {
            (true, rest)
        } else if let Some(rest) = text.strip_prefix('+') {
            (false, rest)
        } else {
            (false, text)
        };
        let (mantissa, mut scale) = match body.find(|c: char| c == 'e' || c == 'E') {
            Some(idx) => (
                &body[..idx],
                body[idx + 1..].parse::<i32>().map_err(|_| invalid())?,
            ),
            None => (body, 0),
        };

        let mut value = Self::ZERO;
        let mut digits = 0usize;
        let mut seen_point = false;
        for ch in mantissa.chars() {
            match ch {
                '0'..='9' => {
                    let digit = f64::from(ch as u32 - '0' as u32);
                    value = value.mul_f64(10.0) + Self::new(digit, 0.0);
                    digits += 1;
                    if seen_point {
                        scale -= 1;
                    }
                }
                '.' if !seen_point => seen_point = true,
                _ => return Err(invalid()),
            }
        }
        if digits == 0 {
            return Err(invalid());
        }

        // Powers of ten up to 1e44 are exact, so divide rather than multiply
        // by a rounded reciprocal.
        let ten = Self::new(10.0, 0.0);
        if scale > 0 {
            value = value * Float::powi(ten, scale);
        } else if scale < 0 {
            value = value / Float::powi(ten, -scale);
        }
        Ok(if negative { -value } else { value })
    }
}

impl Sum for DoubleDouble {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, |acc, x| acc + x)
    }
}

impl Zero for DoubleDouble {
    fn zero() -> Self {
        Self::ZERO
    }
    fn is_zero(&self) -> bool {
        self.hi == 0.0
    }
}

impl One for DoubleDouble {
    fn one() -> Self {
        Self::ONE
    }
}

impl Add for DoubleDouble {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        let (s1, s2) = two_sum(self.hi, rhs.hi);
        let (t1, t2) = two_sum(self.lo, rhs.lo);
        let (s1, s2) = quick_two_sum(s1, s2 + t1);
        let (hi, lo) = quick_two_sum(s1, s2 + t2);
        Self::finish(hi, lo)
    }
}

impl Sub for DoubleDouble {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        self + (-rhs)
    }
}

impl Mul for DoubleDouble {
    type Output = Self;
    fn mul(self, rhs: Self) -> Self {
        let (p1, p2) = two_prod(self.hi, rhs.hi);
        let p2 = p2 + (self.hi * rhs.lo + self.lo * rhs.hi);
        let (hi, lo) = quick_two_sum(p1, p2);
        Self::finish(hi, lo)
    }
}

impl Div for DoubleDouble {
    type Output = Self;
    fn div(self, rhs: Self) -> Self {
        let q1 = self.hi / rhs.hi;
        if !q1.is_finite() || !rhs.hi.is_finite() || q1 == 0.0 {
            return Self::new(q1, 0.0);
        }
        let r = self - rhs.mul_f64(q1);
        let q2 = r.hi / rhs.hi;
        let r = r - rhs.mul_f64(q2);
        let q3 = r.hi / rhs.hi;
        let (hi, lo) = quick_two_sum(q1, q2);
        Self::finish(hi, lo) + Self::new(q3, 0.0)
    }
}

impl Neg for DoubleDouble {
    type Output = Self;
    fn neg(self) -> Self {
        Self::new(-self.hi, -self.lo)
    }
}

impl Rem for DoubleDouble {
    type Output = Self;
    fn rem(self, rhs: Self) -> Self {
        self - (self / rhs).trunc() * rhs
    }
}

impl AddAssign for DoubleDouble {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}
impl SubAssign for DoubleDouble {
    fn sub_assign(&mut self, rhs: Self) {
        *self = *self - rhs;
    }
}
impl MulAssign for DoubleDouble {
    fn mul_assign(&mut self, rhs: Self) {
        *self = *self * rhs;
    }
}
impl DivAssign for DoubleDouble {
    fn div_assign(&mut self, rhs: Self) {
        *self = *self / rhs;
    }
}
impl RemAssign for DoubleDouble {
    fn rem_assign(&mut self, rhs: Self) {
        *self = *self % rhs;
    }
}

impl Num for DoubleDouble {
    type FromStrRadixErr = ParseDoubleDoubleError;
    fn from_str_radix(str: &str, radix: u32) -> Result<Self, Self::FromStrRadixErr> {
        if radix == 10 {
            return str.parse();
        }
        // Non-decimal radices are only parsed to f64 accuracy.
        <f64 as Num>::from_str_radix(str, radix)
            .map(Self::from)
            .map_err(|_| ParseDoubleDoubleError::Invalid(str.to_string()))
    }
}

impl ToPrimitive for DoubleDouble {
    fn to_i64(&self) -> Option<i64> {
        let t = self.trunc();
        let whole = t.hi.to_i128()? + t.lo.to_i128()?;
        whole.to_i64()
    }
    fn to_u64(&self) -> Option<u64> {
        let t = self.trunc();
        let whole = t.hi.to_i128()? + t.lo.to_i128()?;
        whole.to_u64()
    }
    fn to_f64(&self) -> Option<f64> {
        Some(self.hi)
    }
}

impl FromPrimitive for DoubleDouble {
    fn from_i64(n: i64) -> Option<Self> {
        let hi = n as f64;
        let lo = (i128::from(n) - hi as i128) as f64;
        Some(Self::from_sum(hi, lo))
    }
    fn from_u64(n: u64) -> Option<Self> {
        let hi = n as f64;
        let lo = (i128::from(n) - hi as i128) as f64;
        Some(Self::from_sum(hi, lo))
    }
    fn from_f64(n: f64) -> Option<Self> {
        Some(Self::new(n, 0.0))
    }
}

impl num_traits::NumCast for DoubleDouble {
    fn from<T: ToPrimitive>(n: T) -> Option<Self> {
        n.to_f64().map(<Self as From<f64>>::from)
    }
}

impl Float for DoubleDouble {
    fn nan() -> Self {
        Self::new(f64::NAN, 0.0)
    }
    fn infinity() -> Self {
        Self::new(f64::INFINITY, 0.0)
    }
    fn neg_infinity() -> Self {
        Self::new(f64::NEG_INFINITY, 0.0)
    }
    fn neg_zero() -> Self {
        Self::new(-0.0, 0.0)
    }
    fn min_value() -> Self {
        Self::new(f64::MIN, 0.0)
    }
    fn min_positive_value() -> Self {
        Self::new(f64::MIN_POSITIVE, 0.0)
    }
    fn max_value() -> Self {
        Self::new(f64::MAX, 0.0)
    }
    fn epsilon() -> Self {
        Self::EPSILON
    }
    fn is_nan(self) -> bool {
        self.hi.is_nan()
    }
    fn is_infinite(self) -> bool {
        self.hi.is_infinite()
    }
    fn is_finite(self) -> bool {
        self.hi.is_finite()
    }
    fn is_normal(self) -> bool {
        self.hi.is_normal()
    }
    fn classify(self) -> std::num::FpCategory {
        self.hi.classify()
    }
    fn floor(self) -> Self {
        let hi = self.hi.floor();
        if hi == self.hi {
            let (hi, lo) = quick_two_sum(hi, self.lo.floor());
            Self::finish(hi, lo)
        } else {
            Self::new(hi, 0.0)
        }
    }
    fn ceil(self) -> Self {
        let hi = self.hi.ceil();
        if hi == self.hi {
            let (hi, lo) = quick_two_sum(hi, self.lo.ceil());
            Self::finish(hi, lo)
        } else {
            Self::new(hi, 0.0)
        }
    }
    fn round(self) -> Self {
        let half = Self::new(0.5, 0.0);
        if self.hi >= 0.0 {
            (self + half).floor()
        } else {
            (self - half).ceil()
        }
    }
    fn trunc(self) -> Self {
        if self.hi >= 0.0 {
            self.floor()
        } else {
            self.ceil()
        }
    }
    fn fract(self) -> Self {
        self - self.trunc()
    }
    fn abs(self) -> Self {
        if self.hi < 0.0 {
            -self
        } else {
            self
        }
    }
    fn signum(self) -> Self {
        Self::new(self.hi.signum(), 0.0)
    }
    fn is_sign_positive(self) -> bool {
        self.hi.is_sign_positive()
    }
    fn is_sign_negative(self) -> bool {
        self.hi.is_sign_negative()
    }
    fn mul_add(self, a: Self, b: Self) -> Self {
        self * a + b
    }
    fn recip(self) -> Self {
        Self::ONE / self
    }

    fn powi(self, n: i32) -> Self {
        if n == 0 {
            return Self::ONE;
        }
        let mut base = self;
        let mut exp = n.unsigned_abs();
        let mut acc = Self::ONE;
        while exp > 0 {
            if exp & 1 == 1 {
                acc = acc * base;
            }
            exp >>= 1;
            if exp > 0 {
                base = base.square();
            }
        }
        if n < 0 {
            acc.recip()
        } else {
            acc
        }
    }

    fn powf(self, n: Self) -> Self {
        if n.lo == 0.0 && n.hi.fract() == 0.0 && n.hi.abs() < f64::from(i32::MAX) {
            return self.powi(n.hi as i32);
        }
        (n * self.ln_dd()).exp_dd()
    }

    fn sqrt(self) -> Self {
        self.sqrt_dd()
    }

    fn exp(self) -> Self {
        self.exp_dd()
    }
    fn exp2(self) -> Self {
        (self * Self::LN_2).exp_dd()
    }
    fn ln(self) -> Self {
        self.ln_dd()
    }
    fn log(self, base: Self) -> Self {
        self.ln_dd() / base.ln_dd()
    }
    fn log2(self) -> Self {
        self.ln_dd() / Self::LN_2
    }
    fn log10(self) -> Self {
        self.ln_dd() / Self::LN_10
    }

    fn max(self, other: Self) -> Self {
        if self.is_nan() || other > self {
            other
        } else {
            self
        }
    }
    fn min(self, other: Self) -> Self {
        if self.is_nan() || other < self {
            other
        } else {
            self
        }
    }

    fn abs_sub(self, other: Self) -> Self {
        if self <= other {
            Self::ZERO
        } else {
            self - other
        }
    }

    fn cbrt(self) -> Self {
        let y0 = self.hi.cbrt();
        if y0 == 0.0 || !y0.is_finite() {
            return Self::new(y0, 0.0);
        }
        let y = Self::new(y0, 0.0);
        y - (y.square() * y - self) / y.square().mul_f64(3.0)
    }
    fn hypot(self, other: Self) -> Self {
        if self.is_infinite() || other.is_infinite() {
            return Self::infinity();
        }
        let scale = self.abs().max(other.abs());
        if scale.is_zero() {
            return Self::ZERO;
        }
        let a = self / scale;
        let b = other / scale;
        scale * (a.square() + b.square()).sqrt_dd()
    }

    fn sin(self) -> Self {
        self.sin_cos_dd().0
    }
    fn cos(self) -> Self {
        self.sin_cos_dd().1
    }
    fn tan(self) -> Self {
        let (s, c) = self.sin_cos_dd();
        s / c
    }
    fn asin(self) -> Self {
        if self.abs() > Self::ONE {
            return Self::nan();
        }
        self.atan2_dd((Self::ONE - self.square()).sqrt_dd())
    }
    fn acos(self) -> Self {
        if self.abs() > Self::ONE {
            return Self::nan();
        }
        (Self::ONE - self.square()).sqrt_dd().atan2_dd(self)
    }
    fn atan(self) -> Self {
        self.atan2_dd(Self::ONE)
    }
    fn atan2(self, other: Self) -> Self {
        self.atan2_dd(other)
    }
    fn sin_cos(self) -> (Self, Self) {
        self.sin_cos_dd()
    }

    fn exp_m1(self) -> Self {
        self.exp_m1_dd()
    }
    fn ln_1p(self) -> Self {
        let y = (Self::ONE + self).ln_dd();
        if !y.is_finite() {
            return y;
        }
        let e = y.exp_m1_dd();
        y - (e - self) / (e + Self::ONE)
    }
    fn sinh(self) -> Self {
        (self.exp_m1_dd() - (-self).exp_m1_dd()).mul_f64(0.5)
    }
    fn cosh(self) -> Self {
        (self.exp_dd() + (-self).exp_dd()).mul_f64(0.5)
    }
    fn tanh(self) -> Self {
        if self.hi > 40.0 {
            return Self::ONE;
        }
        if self.hi < -40.0 {
            return -Self::ONE;
        }
        self.sinh() / self.cosh()
    }
    fn asinh(self) -> Self {
        let x = self.abs();
        let x2 = x.square();
        let magnitude = (x + x2 / (Self::ONE + (x2 + Self::ONE).sqrt_dd())).ln_1p();
        if self.hi < 0.0 {
            -magnitude
        } else {
            magnitude
        }
    }
    fn acosh(self) -> Self {
        (self + (self.square() - Self::ONE).sqrt_dd()).ln_dd()
    }
    fn atanh(self) -> Self {
        (self.mul_f64(2.0) / (Self::ONE - self)).ln_1p().mul_f64(0.5)
    }

    fn integer_decode(self) -> (u64, i16, i8) {
        self.hi.integer_decode()
    }
}
