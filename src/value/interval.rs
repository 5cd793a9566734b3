//! Strided intervals over unsigned bit-vectors of at most 64 bits.
//!
//! `lower + k*stride` for every `k` with `lower + k*stride <= upper`. A stride
//! of zero means a single value. `lower > upper` is the empty interval.

use std::cmp::{max, min};
use std::fmt;

use crate::utils::{gcd, max_u64};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Interval {
    bits: u32,
    stride: u64,
    lower: u64,
    upper: u64,
}

impl Interval {
    /// Normalizes the stride and snaps `upper` down onto the stride grid.
    ///
    /// # Panics
    ///
    /// Panics if `bits` is not in `1..=64`.
    pub fn new(bits: u32, stride: u64, lower: u64, upper: u64) -> Self {
        let top = max_u64(bits);
        let (lower, upper) = (min(lower, top), min(upper, top));
        if lower > upper {
            return Self::empty(bits);
        }
        if lower == upper {
            return Self::constant(bits, lower);
        }
        let stride = if stride == 0 { 1 } else { stride };
        let upper = upper - (upper - lower) % stride;
        let stride = if lower == upper { 0 } else { stride };
        Self {
            bits,
            stride,
            lower,
            upper,
        }
    }

    pub fn constant(bits: u32, value: u64) -> Self {
        let value = value & max_u64(bits);
        Self {
            bits,
            stride: 0,
            lower: value,
            upper: value,
        }
    }

    pub fn top(bits: u32) -> Self {
        Self {
            bits,
            stride: 1,
            lower: 0,
            upper: max_u64(bits),
        }
    }

    pub fn empty(bits: u32) -> Self {
        Self {
            bits,
            stride: 0,
            lower: 1,
            upper: 0,
        }
    }
}

impl Interval {
    pub fn bits(&self) -> u32 {
        self.bits
    }

    pub fn stride(&self) -> u64 {
        self.stride
    }

    pub fn lower(&self) -> u64 {
        self.lower
    }

    pub fn upper(&self) -> u64 {
        self.upper
    }

    pub fn is_empty(&self) -> bool {
        self.lower > self.upper
    }

    /// A degenerate interval holding exactly one value.
    pub fn is_integer(&self) -> bool {
        self.lower == self.upper
    }

    pub fn is_top(&self) -> bool {
        self.lower == 0 && self.upper == max_u64(self.bits) && self.stride == 1
    }

    pub fn contains(&self, value: u64) -> bool {
        if self.is_empty() || value < self.lower || value > self.upper {
            return false;
        }
        self.stride == 0 || (value - self.lower) % self.stride == 0
    }
}

// Arithmetic. Anything that may wrap goes to top.
impl Interval {
    pub fn add(&self, other: &Self) -> Self {
        if self.is_empty() || other.is_empty() {
            return Self::empty(self.bits);
        }
        let top = max_u64(self.bits) as u128;
        let upper = self.upper as u128 + other.upper as u128;
        if upper > top {
            return Self::top(self.bits);
        }
        Self::new(
            self.bits,
            gcd(self.stride, other.stride),
            self.lower + other.lower,
            upper as u64,
        )
    }

    pub fn sub(&self, other: &Self) -> Self {
        if self.is_empty() || other.is_empty() {
            return Self::empty(self.bits);
        }
        if self.lower < other.upper {
            return Self::top(self.bits);
        }
        Self::new(
            self.bits,
            gcd(self.stride, other.stride),
            self.lower - other.upper,
            self.upper - other.lower,
        )
    }

    pub fn neg(&self) -> Self {
        if self.is_integer() {
            let value = (max_u64(self.bits) - self.lower).wrapping_add(1) & max_u64(self.bits);
            Self::constant(self.bits, value)
        } else if self.is_empty() {
            *self
        } else {
            Self::top(self.bits)
        }
    }
}

// Lattice
impl Interval {
    pub fn union(&self, other: &Self) -> Self {
        if self.is_empty() {
            return *other;
        }
        if other.is_empty() {
            return *self;
        }
        let stride = gcd(gcd(self.stride, other.stride), self.lower.abs_diff(other.lower));
        Self::new(
            self.bits,
            stride,
            min(self.lower, other.lower),
            max(self.upper, other.upper),
        )
    }

    pub fn intersection(&self, other: &Self) -> Self {
        if self.is_empty() || other.is_empty() {
            return Self::empty(self.bits);
        }
        let lower = max(self.lower, other.lower);
        let upper = min(self.upper, other.upper);
        if self.stride == other.stride && self.contains(lower) && other.contains(lower) {
            Self::new(self.bits, self.stride, lower, upper)
        } else {
            Self::new(self.bits, 1, lower, upper)
        }
    }

    pub fn widen(&self, other: &Self) -> Self {
        if self.is_empty() {
            return *other;
        }
        if other.is_empty() {
            return *self;
        }
        let lower = if other.lower < self.lower { 0 } else { self.lower };
        let upper = if other.upper > self.upper {
            max_u64(self.bits)
        } else {
            self.upper
        };
        let stride = if lower == self.lower && upper == self.upper {
            self.stride
        } else {
            1
        };
        Self::new(self.bits, stride, lower, upper)
    }
}

// Comparisons: `None` when both outcomes are possible.
impl Interval {
    pub fn ult(&self, other: &Self) -> Option<bool> {
        if self.upper < other.lower {
            Some(true)
        } else if self.lower >= other.upper {
            Some(false)
        } else {
            None
        }
    }

    pub fn ule(&self, other: &Self) -> Option<bool> {
        if self.upper <= other.lower {
            Some(true)
        } else if self.lower > other.upper {
            Some(false)
        } else {
            None
        }
    }

    pub fn equals(&self, other: &Self) -> Option<bool> {
        if self.is_integer() && other.is_integer() {
            Some(self.lower == other.lower)
        } else if self.intersection(other).is_empty() {
            Some(false)
        } else {
            None
        }
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            write!(f, "<{}>[EMPTY]", self.bits)
        } else {
            write!(f, "<{}>{}[{:#x}, {:#x}]", self.bits, self.stride, self.lower, self.upper)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalization() {
        let i = Interval::new(8, 4, 2, 13);
        assert_eq!(i.upper(), 10);
        assert_eq!(i.stride(), 4);
        assert!(Interval::new(8, 3, 5, 5).is_integer());
        assert!(Interval::new(8, 1, 6, 5).is_empty());
        assert!(Interval::top(8).is_top());
    }

    #[test]
    fn test_contains() {
        let i = Interval::new(8, 4, 2, 14);
        assert!(i.contains(2));
        assert!(i.contains(14));
        assert!(!i.contains(3));
        assert!(!Interval::empty(8).contains(0));
    }

    #[test]
    fn test_add_and_overflow() {
        let a = Interval::new(8, 2, 0, 10);
        let b = Interval::constant(8, 5);
        assert_eq!(a.add(&b), Interval::new(8, 2, 5, 15));
        let c = Interval::constant(8, 250);
        assert!(a.add(&c).is_top());
    }

    #[test]
    fn test_sub() {
        let a = Interval::new(8, 1, 10, 20);
        let b = Interval::new(8, 1, 1, 5);
        assert_eq!(a.sub(&b), Interval::new(8, 1, 5, 19));
        assert!(b.sub(&a).is_top());
    }

    #[test]
    fn test_neg() {
        assert_eq!(Interval::constant(8, 1).neg(), Interval::constant(8, 255));
        assert_eq!(Interval::constant(8, 0).neg(), Interval::constant(8, 0));
        assert!(Interval::new(8, 1, 1, 2).neg().is_top());
    }

    #[test]
    fn test_lattice() {
        let a = Interval::constant(8, 2);
        let b = Interval::constant(8, 8);
        let u = a.union(&b);
        assert_eq!(u, Interval::new(8, 6, 2, 8));
        assert_eq!(u.intersection(&a), a);
        assert!(a.intersection(&b).is_empty());
        let w = a.widen(&Interval::new(8, 1, 2, 3));
        assert_eq!(w.upper(), 255);
        assert_eq!(w.lower(), 2);
    }

    #[test]
    fn test_comparisons() {
        let small = Interval::new(8, 1, 0, 5);
        let big = Interval::new(8, 1, 10, 20);
        assert_eq!(small.ult(&big), Some(true));
        assert_eq!(big.ult(&small), Some(false));
        assert_eq!(small.ult(&Interval::new(8, 1, 3, 9)), None);
        assert_eq!(Interval::constant(8, 3).equals(&Interval::constant(8, 3)), Some(true));
        assert_eq!(small.equals(&big), Some(false));
        assert_eq!(small.ule(&Interval::constant(8, 5)), Some(true));
    }
}
