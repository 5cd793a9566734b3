//! Backend-native leaf values.

pub mod bitvec;
pub mod interval;

use std::fmt;

use num_bigint::BigInt;
use num_traits::ToPrimitive;

use crate::ast::AstRef;
use crate::op::Op;
use crate::proxy::{IfProxy, Operand};

pub use self::bitvec::BitVecValue;
pub use self::interval::Interval;

/// A concrete IEEE float of width 32 or 64, kept as raw bits.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct FloatValue {
    bits: u64,
    width: u32,
}

impl FloatValue {
    /// Rounds `value` to the given width.
    ///
    /// # Panics
    ///
    /// Panics if `width` is neither 32 nor 64.
    pub fn from_f64(value: f64, width: u32) -> Self {
        let bits = match width {
            32 => (value as f32).to_bits() as u64,
            64 => value.to_bits(),
            _ => panic!("Float width must be 32 or 64, got {}", width),
        };
        Self { bits, width }
    }

    pub fn to_f64(&self) -> f64 {
        if self.width == 32 {
            f32::from_bits(self.bits as u32) as f64
        } else {
            f64::from_bits(self.bits)
        }
    }

    pub fn bits(&self) -> u64 {
        self.bits
    }

    pub fn width(&self) -> u32 {
        self.width
    }
}

/// A non-tree operand: a literal or a value produced by a backend.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub enum Leaf {
    Bool(bool),
    Int(BigInt),
    /// Symbol names.
    Str(String),
    BitVec(BitVecValue),
    Interval(Interval),
    Float(FloatValue),
    Proxy(Box<IfProxy<AstRef, Leaf>>),
}

impl Leaf {
    pub fn int(value: i64) -> Self {
        Leaf::Int(BigInt::from(value))
    }

    pub fn bv(value: u64, width: u32) -> Self {
        Leaf::BitVec(BitVecValue::from_u64(value, width))
    }

    pub fn proxy(condition: AstRef, true_branch: Leaf, false_branch: Leaf) -> Self {
        Leaf::Proxy(Box::new(IfProxy::new(condition, true_branch, false_branch)))
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Leaf::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<&BigInt> {
        match self {
            Leaf::Int(i) => Some(i),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Leaf::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bitvec(&self) -> Option<&BitVecValue> {
        match self {
            Leaf::BitVec(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_interval(&self) -> Option<&Interval> {
        match self {
            Leaf::Interval(i) => Some(i),
            _ => None,
        }
    }

    /// Bit-width of a sized value. Plain booleans, integers and names have none.
    pub fn size(&self) -> Option<u32> {
        match self {
            Leaf::BitVec(v) => Some(v.width()),
            Leaf::Interval(i) => Some(i.bits()),
            Leaf::Float(f) => Some(f.width()),
            Leaf::Proxy(p) => p.true_branch().size(),
            Leaf::Bool(_) | Leaf::Int(_) | Leaf::Str(_) => None,
        }
    }

    /// A literal that folding loses nothing on.
    pub fn is_constant(&self) -> bool {
        matches!(self, Leaf::Bool(_) | Leaf::Int(_) | Leaf::Str(_) | Leaf::BitVec(_))
    }

    /// An interval holding exactly one value.
    pub fn is_integer_interval(&self) -> bool {
        matches!(self, Leaf::Interval(i) if i.is_integer())
    }
}

fn int_to_bv(i: &BigInt, width: u32) -> BitVecValue {
    BitVecValue::new(i, width)
}

fn interval_of(leaf: &Leaf, bits: u32) -> Option<Interval> {
    match leaf {
        Leaf::Interval(i) if i.bits() == bits => Some(*i),
        Leaf::BitVec(v) if v.width() == bits => Some(Interval::constant(bits, v.to_u64()?)),
        Leaf::Int(i) => Some(Interval::constant(bits, int_to_bv(i, bits).to_u64()?)),
        _ => None,
    }
}

fn bv_unary(v: &BitVecValue, op: Op) -> Option<BitVecValue> {
    Some(match op {
        Op::Neg => v.neg(),
        Op::Pos => v.clone(),
        Op::Abs => v.abs(),
        Op::Invert => v.invert(),
        Op::Reverse => v.reverse(),
        _ => return None,
    })
}

fn bv_binary(a: &BitVecValue, op: Op, b: &BitVecValue) -> Option<Leaf> {
    if a.width() != b.width() {
        return None;
    }
    let v = match op {
        Op::Add => a.add(b),
        Op::Sub => a.sub(b),
        Op::Mul => a.mul(b),
        Op::Pow => a.pow(b),
        Op::Div | Op::TrueDiv | Op::FloorDiv => a.udiv(b)?,
        Op::Mod => a.urem(b)?,
        Op::SDiv => a.sdiv(b)?,
        Op::SMod => a.smod(b)?,
        Op::BitAnd => a.and(b),
        Op::BitOr => a.or(b),
        Op::BitXor => a.xor(b),
        Op::Shl => a.shl(b),
        Op::Shr => a.ashr(b),
        Op::LShR => a.lshr(b),
        Op::RotateLeft => a.rotate_left(b),
        Op::RotateRight => a.rotate_right(b),
        Op::Union | Op::Intersection | Op::Widen if a == b => a.clone(),

        Op::Eq => return Some(Leaf::Bool(a == b)),
        Op::Ne => return Some(Leaf::Bool(a != b)),
        Op::Lt | Op::ULT => return Some(Leaf::Bool(a.ult(b))),
        Op::Le | Op::ULE => return Some(Leaf::Bool(a.ule(b))),
        Op::Gt | Op::UGT => return Some(Leaf::Bool(b.ult(a))),
        Op::Ge | Op::UGE => return Some(Leaf::Bool(b.ule(a))),
        Op::SLT => return Some(Leaf::Bool(a.slt(b))),
        Op::SLE => return Some(Leaf::Bool(a.sle(b))),
        Op::SGT => return Some(Leaf::Bool(b.slt(a))),
        Op::SGE => return Some(Leaf::Bool(b.sle(a))),
        _ => return None,
    };
    Some(Leaf::BitVec(v))
}

fn interval_binary(a: &Interval, op: Op, b: &Interval) -> Option<Leaf> {
    let v = match op {
        Op::Add => a.add(b),
        Op::Sub => a.sub(b),
        Op::Union => a.union(b),
        Op::Intersection => a.intersection(b),
        Op::Widen => a.widen(b),

        Op::Eq => return a.equals(b).map(Leaf::Bool),
        Op::Ne => return a.equals(b).map(|r| Leaf::Bool(!r)),
        Op::Lt | Op::ULT => return a.ult(b).map(Leaf::Bool),
        Op::Le | Op::ULE => return a.ule(b).map(Leaf::Bool),
        Op::Gt | Op::UGT => return b.ult(a).map(Leaf::Bool),
        Op::Ge | Op::UGE => return b.ule(a).map(Leaf::Bool),
        _ => return None,
    };
    Some(Leaf::Interval(v))
}

fn bool_binary(a: bool, op: Op, b: bool) -> Option<Leaf> {
    Some(Leaf::Bool(match op {
        Op::And | Op::BitAnd => a && b,
        Op::Or | Op::BitOr => a || b,
        Op::BitXor | Op::Ne => a != b,
        Op::Eq => a == b,
        _ => return None,
    }))
}

fn int_binary(a: &BigInt, op: Op, b: &BigInt) -> Option<Leaf> {
    Some(match op {
        Op::Add => Leaf::Int(a + b),
        Op::Sub => Leaf::Int(a - b),
        Op::Mul => Leaf::Int(a * b),
        Op::Eq => Leaf::Bool(a == b),
        Op::Ne => Leaf::Bool(a != b),
        Op::Lt => Leaf::Bool(a < b),
        Op::Le => Leaf::Bool(a <= b),
        Op::Gt => Leaf::Bool(a > b),
        Op::Ge => Leaf::Bool(a >= b),
        _ => return None,
    })
}

impl Operand for Leaf {
    type Cond = AstRef;

    fn apply_unary(&self, op: Op) -> Option<Self> {
        match self {
            Leaf::BitVec(v) => bv_unary(v, op).map(Leaf::BitVec),
            Leaf::Interval(i) => match op {
                Op::Neg => Some(Leaf::Interval(i.neg())),
                Op::Pos => Some(self.clone()),
                _ => None,
            },
            Leaf::Bool(b) => match op {
                Op::Not | Op::Invert => Some(Leaf::Bool(!b)),
                _ => None,
            },
            Leaf::Int(i) => match op {
                Op::Neg => Some(Leaf::Int(-i)),
                Op::Pos => Some(self.clone()),
                _ => None,
            },
            Leaf::Proxy(p) => p.apply_unary(op).ok().map(|p| Leaf::Proxy(Box::new(p))),
            Leaf::Str(_) | Leaf::Float(_) => None,
        }
    }

    fn apply_binary(&self, op: Op, other: &Self) -> Option<Self> {
        if let Leaf::Proxy(p) = self {
            return p.apply_binary(op, other).ok().map(|p| Leaf::Proxy(Box::new(p)));
        }
        if let Some(forward) = op.unreflected() {
            return other.apply_binary(forward, self);
        }
        match (self, other) {
            (Leaf::BitVec(a), Leaf::BitVec(b)) => bv_binary(a, op, b),
            (Leaf::BitVec(a), Leaf::Int(i)) => bv_binary(a, op, &int_to_bv(i, a.width())),
            (Leaf::Int(i), Leaf::BitVec(b)) => bv_binary(&int_to_bv(i, b.width()), op, b),
            (Leaf::Interval(a), _) => interval_binary(a, op, &interval_of(other, a.bits())?),
            (Leaf::BitVec(_), Leaf::Interval(b)) => interval_binary(&interval_of(self, b.bits())?, op, b),
            (Leaf::Bool(a), Leaf::Bool(b)) => bool_binary(*a, op, *b),
            (Leaf::Int(a), Leaf::Int(b)) => int_binary(a, op, b),
            _ => None,
        }
    }

    fn as_proxy(&self) -> Option<&IfProxy<AstRef, Leaf>> {
        match self {
            Leaf::Proxy(p) => Some(p),
            _ => None,
        }
    }
}

impl fmt::Display for Leaf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Leaf::Bool(b) => write!(f, "{}", b),
            Leaf::Int(i) => write!(f, "{}", i),
            Leaf::Str(s) => write!(f, "{}", s),
            Leaf::BitVec(v) => write!(f, "{}", v),
            Leaf::Interval(i) => write!(f, "{}", i),
            Leaf::Float(v) => write!(f, "{}f{}", v.to_f64(), v.width()),
            Leaf::Proxy(p) => write!(f, "{}", p),
        }
    }
}

impl From<bool> for Leaf {
    fn from(value: bool) -> Self {
        Leaf::Bool(value)
    }
}

impl From<i64> for Leaf {
    fn from(value: i64) -> Self {
        Leaf::Int(BigInt::from(value))
    }
}

impl From<u32> for Leaf {
    fn from(value: u32) -> Self {
        Leaf::Int(BigInt::from(value))
    }
}

impl From<&str> for Leaf {
    fn from(value: &str) -> Self {
        Leaf::Str(value.to_string())
    }
}

impl From<BitVecValue> for Leaf {
    fn from(value: BitVecValue) -> Self {
        Leaf::BitVec(value)
    }
}

impl From<Interval> for Leaf {
    fn from(value: Interval) -> Self {
        Leaf::Interval(value)
    }
}

impl From<FloatValue> for Leaf {
    fn from(value: FloatValue) -> Self {
        Leaf::Float(value)
    }
}

/// Reads a small non-negative integer leaf.
pub fn int_as_u32(leaf: &Leaf) -> Option<u32> {
    leaf.as_int()?.to_u32()
}
