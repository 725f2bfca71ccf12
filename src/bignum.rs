//! Arbitrary-magnitude decimal numbers
//!
//! A `BigNumber` is a normalized `(mantissa, exponent)` pair meaning
//! `mantissa × 10^exponent`, with `1 ≤ |mantissa| < 10` (or exactly zero).
//! Normalization happens on every construction, so equal values always have
//! identical fields and compare equal.
//!
//! Magnitudes saturate at `BigNumber::MAX` instead of overflowing, and values
//! smaller than `10^-MAX_EXPONENT` flush to zero.

use std::cmp::Ordering;
use std::fmt;
use std::ops::{Add, Div, Mul, Neg, Sub};
use std::str::FromStr;

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::Error;

/// Largest representable base-10 exponent
pub const MAX_EXPONENT: i64 = 9_000_000_000_000_000;

/// Mantissa digits kept when parsing (enough for any f64 shortest repr)
const PARSE_DIGITS: usize = 17;

/// Above this exponent every value is an integer at f64 precision
const INTEGRAL_EXPONENT: i64 = 16;

/// Exact powers of ten representable in f64
const POW10: [f64; 23] = [
    1e0, 1e1, 1e2, 1e3, 1e4, 1e5, 1e6, 1e7, 1e8, 1e9, 1e10, 1e11, 1e12, 1e13, 1e14, 1e15, 1e16,
    1e17, 1e18, 1e19, 1e20, 1e21, 1e22,
];

/// Display suffixes, one per power of 1000
pub const SUFFIXES: [&str; 22] = [
    "", "K", "M", "B", "T", "Qa", "Qi", "Sx", "Sp", "Oc", "No", "Dc", "UDc", "DDc", "TDc", "QaDc",
    "QiDc", "SxDc", "SpDc", "OcDc", "NoDc", "Vg",
];

#[derive(Clone, Copy)]
pub struct BigNumber {
    mantissa: f64,
    exponent: i64,
}

/// Whether `value` shown with `digits` decimals reaches `limit`
fn rounds_up_to(value: f64, digits: usize, limit: f64) -> bool {
    let unit = 10f64.powi(digits.min(15) as i32);
    (value * unit).round() / unit >= limit
}

/// Multiply by 10^k, splitting large shifts so intermediate values stay finite
fn scale_pow10(mut value: f64, mut k: i64) -> f64 {
    while k > 22 {
        value *= 1e22;
        k -= 22;
    }
    while k < -22 {
        value /= 1e22;
        k += 22;
    }
    if k >= 0 {
        value * POW10[k as usize]
    } else {
        value / POW10[(-k) as usize]
    }
}

impl BigNumber {
    pub const ZERO: Self = Self {
        mantissa: 0.0,
        exponent: 0,
    };
    pub const ONE: Self = Self {
        mantissa: 1.0,
        exponent: 0,
    };
    pub const MAX: Self = Self {
        mantissa: 9.999_999_999_999_998,
        exponent: MAX_EXPONENT,
    };

    /// Build from a raw pair, normalizing and saturating
    pub fn new(mantissa: f64, exponent: i64) -> Self {
        if mantissa.is_nan() || mantissa == 0.0 {
            return Self::ZERO;
        }
        if mantissa.is_infinite() {
            return Self::MAX.with_sign(mantissa);
        }

        let shift = if (1.0..10.0).contains(&mantissa.abs()) {
            0
        } else {
            mantissa.abs().log10().floor() as i64
        };
        let mut m = scale_pow10(mantissa, -shift);
        let mut e = exponent.saturating_add(shift);
        // log10 can be off by one around exact powers
        while m.abs() >= 10.0 {
            m /= 10.0;
            e = e.saturating_add(1);
        }
        while m.abs() < 1.0 {
            m *= 10.0;
            e = e.saturating_sub(1);
        }

        if e > MAX_EXPONENT {
            Self::MAX.with_sign(m)
        } else if e < -MAX_EXPONENT {
            Self::ZERO
        } else {
            Self {
                mantissa: m,
                exponent: e,
            }
        }
    }

    pub fn from_f64(value: f64) -> Self {
        Self::new(value, 0)
    }

    fn with_sign(self, sign: f64) -> Self {
        if sign.is_sign_negative() {
            -self
        } else {
            self
        }
    }

    #[inline]
    pub fn mantissa(&self) -> f64 {
        self.mantissa
    }

    #[inline]
    pub fn exponent(&self) -> i64 {
        self.exponent
    }

    #[inline]
    pub fn is_zero(&self) -> bool {
        self.mantissa == 0.0
    }

    #[inline]
    pub fn is_negative(&self) -> bool {
        self.mantissa < 0.0
    }

    #[inline]
    pub fn is_positive(&self) -> bool {
        self.mantissa > 0.0
    }

    pub fn abs(self) -> Self {
        if self.is_negative() { -self } else { self }
    }

    pub fn add(self, other: Self) -> Self {
        if self.is_zero() {
            return other;
        }
        if other.is_zero() {
            return self;
        }
        let (big, small) = if self.exponent >= other.exponent {
            (self, other)
        } else {
            (other, self)
        };
        let gap = big.exponent - small.exponent;
        if gap > PARSE_DIGITS as i64 {
            return big;
        }
        Self::new(big.mantissa + scale_pow10(small.mantissa, -gap), big.exponent)
    }

    pub fn sub(self, other: Self) -> Self {
        self.add(-other)
    }

    /// `self - other`, floored at zero (health and balance semantics)
    pub fn saturating_sub(self, other: Self) -> Self {
        let diff = self.sub(other);
        if diff.is_negative() { Self::ZERO } else { diff }
    }

    pub fn mul(self, other: Self) -> Self {
        if self.is_zero() || other.is_zero() {
            return Self::ZERO;
        }
        Self::new(
            self.mantissa * other.mantissa,
            self.exponent.saturating_add(other.exponent),
        )
    }

    pub fn mul_f64(self, factor: f64) -> Self {
        self.mul(Self::from_f64(factor))
    }

    /// Division by zero saturates (signed) instead of failing; `0 / 0` is zero
    pub fn div(self, other: Self) -> Self {
        if other.is_zero() {
            return if self.is_zero() {
                Self::ZERO
            } else {
                Self::MAX.with_sign(self.mantissa)
            };
        }
        if self.is_zero() {
            return Self::ZERO;
        }
        Self::new(
            self.mantissa / other.mantissa,
            self.exponent.saturating_sub(other.exponent),
        )
    }

    /// Integer power by repeated squaring
    pub fn pow(self, n: i32) -> Self {
        if n == 0 {
            return Self::ONE;
        }
        let mut base = self;
        let mut acc = Self::ONE;
        let mut k = n.unsigned_abs();
        while k > 0 {
            if k & 1 == 1 {
                acc = acc.mul(base);
            }
            base = base.mul(base);
            k >>= 1;
        }
        if n < 0 { Self::ONE.div(acc) } else { acc }
    }

    pub fn floor(self) -> Self {
        if self.is_zero() || self.exponent >= INTEGRAL_EXPONENT {
            return self;
        }
        if self.exponent < 0 {
            return if self.is_negative() { -Self::ONE } else { Self::ZERO };
        }
        Self::from_f64(self.to_f64().floor())
    }

    pub fn ceil(self) -> Self {
        if self.is_zero() || self.exponent >= INTEGRAL_EXPONENT {
            return self;
        }
        if self.exponent < 0 {
            return if self.is_negative() { Self::ZERO } else { Self::ONE };
        }
        Self::from_f64(self.to_f64().ceil())
    }

    /// Lossy conversion for display math; saturates at `f64::MAX`
    pub fn to_f64(&self) -> f64 {
        if self.is_zero() {
            return 0.0;
        }
        if self.exponent > 308 {
            return f64::MAX.copysign(self.mantissa);
        }
        if self.exponent < -330 {
            return 0.0;
        }
        let v = scale_pow10(self.mantissa, self.exponent);
        if v.is_infinite() { f64::MAX.copysign(v) } else { v }
    }

    /// Parse plain (`1500`, `-12.5`) or scientific (`1.5e3`, `2E+40`) decimals
    pub fn parse(input: &str) -> Result<Self, Error> {
        let malformed = || Error::MalformedNumber(input.to_string());
        let s = input.trim();

        let (negative, body) = match s.as_bytes().first() {
            Some(b'-') => (true, &s[1..]),
            Some(b'+') => (false, &s[1..]),
            _ => (false, s),
        };

        let (digits_part, exp_part) = match body.find(['e', 'E']) {
            Some(i) => (&body[..i], Some(&body[i + 1..])),
            None => (body, None),
        };

        let (int_part, frac_part) = match digits_part.find('.') {
            Some(i) => (&digits_part[..i], &digits_part[i + 1..]),
            None => (digits_part, ""),
        };
        if int_part.is_empty() && frac_part.is_empty() {
            return Err(malformed());
        }
        if !int_part.bytes().chain(frac_part.bytes()).all(|b| b.is_ascii_digit()) {
            return Err(malformed());
        }

        let exp_adjust: i64 = match exp_part {
            Some(e) => {
                let unsigned = e.strip_prefix(['+', '-']).unwrap_or(e);
                if unsigned.is_empty() || !unsigned.bytes().all(|b| b.is_ascii_digit()) {
                    return Err(malformed());
                }
                e.parse::<i64>().map_err(|_| malformed())?
            }
            None => 0,
        };

        let digits: Vec<u8> = int_part.bytes().chain(frac_part.bytes()).collect();
        let Some(first) = digits.iter().position(|&d| d != b'0') else {
            return Ok(Self::ZERO);
        };

        let significant = &digits[first..digits.len().min(first + PARSE_DIGITS)];
        let mut text = String::with_capacity(significant.len() + 1);
        text.push(significant[0] as char);
        if significant.len() > 1 {
            text.push('.');
            text.extend(significant[1..].iter().map(|&d| d as char));
        }
        let mantissa: f64 = text.parse().map_err(|_| malformed())?;

        let exponent = (int_part.len() as i64 - first as i64 - 1).saturating_add(exp_adjust);
        let value = Self::new(mantissa, exponent);
        Ok(if negative { -value } else { value })
    }

    /// Human-readable form with K/M/B/... suffixes, scientific past the table
    pub fn format(&self, precision: usize) -> String {
        if self.is_negative() {
            return format!("-{}", self.abs().format(precision));
        }
        let (mut index, mut scaled, mut digits) = if self.exponent < 3 {
            (0, self.to_f64(), precision.min(2))
        } else {
            let index = (self.exponent / 3) as usize;
            let scaled = scale_pow10(self.mantissa, self.exponent - 3 * index as i64);
            (index, scaled, precision)
        };
        // 999.999 at two digits prints as 1.00 of the next group
        if rounds_up_to(scaled, digits, 1000.0) {
            index += 1;
            scaled /= 1000.0;
            digits = precision;
        }
        match SUFFIXES.get(index) {
            Some(suffix) => format!("{scaled:.digits$}{suffix}"),
            None => {
                let (mut mantissa, mut exponent) = (self.mantissa, self.exponent);
                if rounds_up_to(mantissa, precision, 10.0) {
                    mantissa /= 10.0;
                    exponent += 1;
                }
                format!("{mantissa:.precision$}e{exponent}")
            }
        }
    }
}

impl Default for BigNumber {
    fn default() -> Self {
        Self::ZERO
    }
}

impl PartialEq for BigNumber {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for BigNumber {}

impl PartialOrd for BigNumber {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for BigNumber {
    fn cmp(&self, other: &Self) -> Ordering {
        let sign = |n: &Self| -> i8 {
            if n.is_zero() {
                0
            } else if n.is_negative() {
                -1
            } else {
                1
            }
        };
        let (sa, sb) = (sign(self), sign(other));
        if sa != sb || sa == 0 {
            return sa.cmp(&sb);
        }
        let magnitude = self
            .exponent
            .cmp(&other.exponent)
            .then(self.mantissa.abs().total_cmp(&other.mantissa.abs()));
        if sa < 0 { magnitude.reverse() } else { magnitude }
    }
}

impl fmt::Debug for BigNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BigNumber({self})")
    }
}

impl fmt::Display for BigNumber {
    /// Exact, parseable form: plain integer when that round-trips, else `me<exp>`
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_zero() {
            return f.write_str("0");
        }
        if (0..=20).contains(&self.exponent) {
            let plain = scale_pow10(self.mantissa, self.exponent);
            if plain.fract() == 0.0 {
                let text = format!("{plain}");
                if Self::parse(&text).is_ok_and(|back| back.mantissa == self.mantissa) {
                    return f.write_str(&text);
                }
            }
        }
        write!(f, "{}e{}", self.mantissa, self.exponent)
    }
}

impl FromStr for BigNumber {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl From<u64> for BigNumber {
    fn from(value: u64) -> Self {
        // u64 beyond 2^53 loses digits; go through the decimal text instead
        Self::parse(&value.to_string()).unwrap_or(Self::ZERO)
    }
}

impl From<u32> for BigNumber {
    fn from(value: u32) -> Self {
        Self::from_f64(value as f64)
    }
}

impl From<f64> for BigNumber {
    fn from(value: f64) -> Self {
        Self::from_f64(value)
    }
}

impl Neg for BigNumber {
    type Output = Self;

    fn neg(self) -> Self {
        if self.is_zero() {
            self
        } else {
            Self {
                mantissa: -self.mantissa,
                exponent: self.exponent,
            }
        }
    }
}

impl Add for BigNumber {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        BigNumber::add(self, rhs)
    }
}

impl Sub for BigNumber {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        BigNumber::sub(self, rhs)
    }
}

impl Mul for BigNumber {
    type Output = Self;
    fn mul(self, rhs: Self) -> Self {
        BigNumber::mul(self, rhs)
    }
}

impl Div for BigNumber {
    type Output = Self;
    fn div(self, rhs: Self) -> Self {
        BigNumber::div(self, rhs)
    }
}

impl Serialize for BigNumber {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

struct BigNumberVisitor;

impl Visitor<'_> for BigNumberVisitor {
    type Value = BigNumber;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a decimal number string")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<BigNumber, E> {
        BigNumber::parse(v).map_err(E::custom)
    }

    // Older saves stored small quantities as JSON numbers
    fn visit_u64<E: de::Error>(self, v: u64) -> Result<BigNumber, E> {
        Ok(BigNumber::from(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<BigNumber, E> {
        Ok(BigNumber::from_f64(v as f64))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<BigNumber, E> {
        if v.is_finite() {
            Ok(BigNumber::from_f64(v))
        } else {
            Err(E::custom("non-finite number"))
        }
    }
}

impl<'de> Deserialize<'de> for BigNumber {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(BigNumberVisitor)
    }
}
