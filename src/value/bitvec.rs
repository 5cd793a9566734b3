use std::fmt;

use num_bigint::{BigInt, BigUint, Sign};
use num_traits::{ToPrimitive, Zero};

use crate::utils::{mask, modulus};

/// A concrete bit-vector: an unsigned value in `0..2^width`.
///
/// # Invariants
///
/// - `width >= 1`
/// - `value < 2^width`
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct BitVecValue {
    value: BigUint,
    width: u32,
}

// Constructors
impl BitVecValue {
    /// Creates a bit-vector from any integer, wrapping it modulo `2^width`.
    ///
    /// # Panics
    ///
    /// Panics if `width == 0`.
    pub fn new(value: &BigInt, width: u32) -> Self {
        assert_ne!(width, 0, "Bit-vector width must be >= 1");
        let m = BigInt::from(modulus(width));
        let mut r = value % &m;
        if r.sign() == Sign::Minus {
            r += &m;
        }
        Self {
            value: r.magnitude().clone(),
            width,
        }
    }

    pub fn from_u64(value: u64, width: u32) -> Self {
        Self::new(&BigInt::from(value), width)
    }

    fn wrap(value: BigUint, width: u32) -> Self {
        Self {
            value: value & mask(width),
            width,
        }
    }
}

// Getters
impl BitVecValue {
    pub fn value(&self) -> &BigUint {
        &self.value
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn to_u64(&self) -> Option<u64> {
        self.value.to_u64()
    }

    pub fn is_negative(&self) -> bool {
        !(&self.value >> (self.width - 1)).is_zero()
    }

    /// Two's complement interpretation.
    pub fn to_signed(&self) -> BigInt {
        if self.is_negative() {
            BigInt::from(self.value.clone()) - BigInt::from(modulus(self.width))
        } else {
            BigInt::from(self.value.clone())
        }
    }

    /// Shift amount, saturated so that anything `>= width` stays `>= width`.
    fn amount(&self) -> u32 {
        self.value.to_u32().unwrap_or(u32::MAX)
    }
}

// Arithmetic. Binary operations expect operands of equal width.
impl BitVecValue {
    pub fn add(&self, other: &Self) -> Self {
        debug_assert_eq!(self.width, other.width);
        Self::wrap(&self.value + &other.value, self.width)
    }

    pub fn sub(&self, other: &Self) -> Self {
        debug_assert_eq!(self.width, other.width);
        Self::wrap(&self.value + modulus(self.width) - &other.value, self.width)
    }

    pub fn mul(&self, other: &Self) -> Self {
        debug_assert_eq!(self.width, other.width);
        Self::wrap(&self.value * &other.value, self.width)
    }

    pub fn pow(&self, other: &Self) -> Self {
        Self::wrap(self.value.modpow(&other.value, &modulus(self.width)), self.width)
    }

    /// Unsigned division; `None` on division by zero.
    pub fn udiv(&self, other: &Self) -> Option<Self> {
        if other.value.is_zero() {
            return None;
        }
        Some(Self::wrap(&self.value / &other.value, self.width))
    }

    /// Unsigned remainder; `None` on division by zero.
    pub fn urem(&self, other: &Self) -> Option<Self> {
        if other.value.is_zero() {
            return None;
        }
        Some(Self::wrap(&self.value % &other.value, self.width))
    }

    /// Signed division, truncating toward zero.
    pub fn sdiv(&self, other: &Self) -> Option<Self> {
        if other.value.is_zero() {
            return None;
        }
        Some(Self::new(&(self.to_signed() / other.to_signed()), self.width))
    }

    /// Signed modulo; the result takes the sign of the divisor.
    pub fn smod(&self, other: &Self) -> Option<Self> {
        if other.value.is_zero() {
            return None;
        }
        let b = other.to_signed();
        let mut r = self.to_signed() % &b;
        if !r.is_zero() && (r.sign() == Sign::Minus) != (b.sign() == Sign::Minus) {
            r += &b;
        }
        Some(Self::new(&r, self.width))
    }

    pub fn neg(&self) -> Self {
        Self::wrap(modulus(self.width) - &self.value, self.width)
    }

    pub fn abs(&self) -> Self {
        if self.is_negative() {
            self.neg()
        } else {
            self.clone()
        }
    }
}

// Bitwise
impl BitVecValue {
    pub fn invert(&self) -> Self {
        Self::wrap(&self.value ^ mask(self.width), self.width)
    }

    pub fn and(&self, other: &Self) -> Self {
        Self::wrap(&self.value & &other.value, self.width)
    }

    pub fn or(&self, other: &Self) -> Self {
        Self::wrap(&self.value | &other.value, self.width)
    }

    pub fn xor(&self, other: &Self) -> Self {
        Self::wrap(&self.value ^ &other.value, self.width)
    }

    pub fn shl(&self, other: &Self) -> Self {
        let k = other.amount();
        if k >= self.width {
            return Self::from_u64(0, self.width);
        }
        Self::wrap(&self.value << k, self.width)
    }

    /// Logical shift right.
    pub fn lshr(&self, other: &Self) -> Self {
        let k = other.amount();
        if k >= self.width {
            return Self::from_u64(0, self.width);
        }
        Self::wrap(&self.value >> k, self.width)
    }

    /// Arithmetic shift right.
    pub fn ashr(&self, other: &Self) -> Self {
        let k = other.amount().min(self.width);
        // `>>` on a negative BigInt rounds toward negative infinity.
        Self::new(&(self.to_signed() >> k), self.width)
    }

    pub fn rotate_left(&self, other: &Self) -> Self {
        let k = (&other.value % self.width).to_u32().unwrap_or(0);
        if k == 0 {
            return self.clone();
        }
        Self::wrap((&self.value << k) | (&self.value >> (self.width - k)), self.width)
    }

    pub fn rotate_right(&self, other: &Self) -> Self {
        let k = (&other.value % self.width).to_u32().unwrap_or(0);
        if k == 0 {
            return self.clone();
        }
        Self::wrap((&self.value >> k) | (&self.value << (self.width - k)), self.width)
    }

    /// Reverses the bit order.
    pub fn reverse(&self) -> Self {
        let bits = format!("{:0>width$b}", self.value, width = self.width as usize);
        let reversed: String = bits.chars().rev().collect();
        let value = BigUint::parse_bytes(reversed.as_bytes(), 2).unwrap_or_default();
        Self::wrap(value, self.width)
    }
}

// Structural
impl BitVecValue {
    /// `self` becomes the high part.
    pub fn concat(&self, other: &Self) -> Self {
        Self {
            value: (&self.value << other.width) | &other.value,
            width: self.width + other.width,
        }
    }

    /// Bits `high..=low`; the caller guarantees `low <= high < width`.
    pub fn extract(&self, high: u32, low: u32) -> Self {
        debug_assert!(low <= high && high < self.width);
        Self::wrap(&self.value >> low, high - low + 1)
    }

    pub fn zero_ext(&self, extra: u32) -> Self {
        Self {
            value: self.value.clone(),
            width: self.width + extra,
        }
    }

    pub fn sign_ext(&self, extra: u32) -> Self {
        Self::new(&self.to_signed(), self.width + extra)
    }
}

// Comparisons
impl BitVecValue {
    pub fn ult(&self, other: &Self) -> bool {
        self.value < other.value
    }

    pub fn ule(&self, other: &Self) -> bool {
        self.value <= other.value
    }

    pub fn slt(&self, other: &Self) -> bool {
        self.to_signed() < other.to_signed()
    }

    pub fn sle(&self, other: &Self) -> bool {
        self.to_signed() <= other.to_signed()
    }
}

impl fmt::Display for BitVecValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let digits = self.width.div_ceil(4) as usize;
        write!(f, "0x{:0>digits$x}#{}", self.value, self.width, digits = digits)
    }
}
