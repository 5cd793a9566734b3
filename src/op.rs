//! The closed operation vocabulary and its static tables.
//!
//! Every table here is a `match`, so adding an operation without classifying it
//! is a compile error rather than a runtime lookup failure.

use std::fmt;

/// An operation identifier.
///
/// Reflected forms (`RAdd`, `RSub`, ...) mean "the same operation with the
/// operands swapped": `RSub(a, b)` is `b - a`.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum Op {
    // Arithmetic
    Add,
    RAdd,
    Sub,
    RSub,
    Mul,
    RMul,
    Div,
    RDiv,
    TrueDiv,
    RTrueDiv,
    FloorDiv,
    RFloorDiv,
    Pow,
    RPow,
    Mod,
    RMod,
    SDiv,
    SMod,
    Neg,
    Pos,
    Abs,

    // Bitwise
    Invert,
    BitAnd,
    RBitAnd,
    BitOr,
    RBitOr,
    BitXor,
    RBitXor,
    Shl,
    RShl,
    Shr,
    RShr,
    RotateLeft,
    RotateRight,
    LShR,
    Reverse,

    // Comparisons
    Eq,
    Ne,
    Ge,
    Le,
    Gt,
    Lt,
    SGE,
    SLE,
    SGT,
    SLT,
    UGE,
    ULE,
    UGT,
    ULT,

    // Boolean
    And,
    Or,
    Not,

    // Structural
    Concat,
    Extract,
    ZeroExt,
    SignExt,

    // Creation
    BoolVal,
    BitVecVal,
    FpVal,

    // Symbol creation
    BoolSym,
    BitVec,
    FpSym,

    // Abstract-domain creation
    TopStridedInterval,
    StridedInterval,
    ValueSet,
    AbstractLocation,

    // Set operations
    Union,
    Intersection,
    Widen,

    // Floating point
    FP,
    FpToFp,
    FpToIEEEBV,
    FpToSBV,
    FpToUBV,
    FpNeg,
    FpAbs,
    FpAdd,
    FpSub,
    FpMul,
    FpDiv,
    FpLT,
    FpLEQ,
    FpGT,
    FpGEQ,
    FpEQ,

    // Other
    If,
    Identical,
    /// Staging-only probe asking a backend for the size of a single leaf.
    Size,
}

/// The result sort of an operation.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum Sort {
    Bool,
    BitVec,
    Fp,
}

impl fmt::Display for Sort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sort::Bool => write!(f, "Bool"),
            Sort::BitVec => write!(f, "BV"),
            Sort::Fp => write!(f, "FP"),
        }
    }
}

/// How a node of a given operation is validated and sized at construction.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Finalizer {
    Identical,
    BoolVal,
    BoolSym,
    BitVec,
    BitVecVal,
    FpLeaf,
    If,
    Concat,
    Extract,
    Extend,
    FpConvert,
    TopInterval,
    Interval,
    AbstractLocation,
    /// Every operand that has a length has the same one, which is the result length.
    SameLength,
    /// No length concept (booleans and comparisons).
    NoLength,
    /// Never finalized; only valid in staged probe nodes.
    Staging,
}

pub const ALL_OPS: &[Op] = &[
    Op::Add,
    Op::RAdd,
    Op::Sub,
    Op::RSub,
    Op::Mul,
    Op::RMul,
    Op::Div,
    Op::RDiv,
    Op::TrueDiv,
    Op::RTrueDiv,
    Op::FloorDiv,
    Op::RFloorDiv,
    Op::Pow,
    Op::RPow,
    Op::Mod,
    Op::RMod,
    Op::SDiv,
    Op::SMod,
    Op::Neg,
    Op::Pos,
    Op::Abs,
    Op::Invert,
    Op::BitAnd,
    Op::RBitAnd,
    Op::BitOr,
    Op::RBitOr,
    Op::BitXor,
    Op::RBitXor,
    Op::Shl,
    Op::RShl,
    Op::Shr,
    Op::RShr,
    Op::RotateLeft,
    Op::RotateRight,
    Op::LShR,
    Op::Reverse,
    Op::Eq,
    Op::Ne,
    Op::Ge,
    Op::Le,
    Op::Gt,
    Op::Lt,
    Op::SGE,
    Op::SLE,
    Op::SGT,
    Op::SLT,
    Op::UGE,
    Op::ULE,
    Op::UGT,
    Op::ULT,
    Op::And,
    Op::Or,
    Op::Not,
    Op::Concat,
    Op::Extract,
    Op::ZeroExt,
    Op::SignExt,
    Op::BoolVal,
    Op::BitVecVal,
    Op::FpVal,
    Op::BoolSym,
    Op::BitVec,
    Op::FpSym,
    Op::TopStridedInterval,
    Op::StridedInterval,
    Op::ValueSet,
    Op::AbstractLocation,
    Op::Union,
    Op::Intersection,
    Op::Widen,
    Op::FP,
    Op::FpToFp,
    Op::FpToIEEEBV,
    Op::FpToSBV,
    Op::FpToUBV,
    Op::FpNeg,
    Op::FpAbs,
    Op::FpAdd,
    Op::FpSub,
    Op::FpMul,
    Op::FpDiv,
    Op::FpLT,
    Op::FpLEQ,
    Op::FpGT,
    Op::FpGEQ,
    Op::FpEQ,
    Op::If,
    Op::Identical,
    Op::Size,
];

impl Op {
    pub const fn name(self) -> &'static str {
        match self {
            Op::Add => "Add",
            Op::RAdd => "RAdd",
            Op::Sub => "Sub",
            Op::RSub => "RSub",
            Op::Mul => "Mul",
            Op::RMul => "RMul",
            Op::Div => "Div",
            Op::RDiv => "RDiv",
            Op::TrueDiv => "TrueDiv",
            Op::RTrueDiv => "RTrueDiv",
            Op::FloorDiv => "FloorDiv",
            Op::RFloorDiv => "RFloorDiv",
            Op::Pow => "Pow",
            Op::RPow => "RPow",
            Op::Mod => "Mod",
            Op::RMod => "RMod",
            Op::SDiv => "SDiv",
            Op::SMod => "SMod",
            Op::Neg => "Neg",
            Op::Pos => "Pos",
            Op::Abs => "Abs",
            Op::Invert => "Invert",
            Op::BitAnd => "BitAnd",
            Op::RBitAnd => "RBitAnd",
            Op::BitOr => "BitOr",
            Op::RBitOr => "RBitOr",
            Op::BitXor => "BitXor",
            Op::RBitXor => "RBitXor",
            Op::Shl => "Shl",
            Op::RShl => "RShl",
            Op::Shr => "Shr",
            Op::RShr => "RShr",
            Op::RotateLeft => "RotateLeft",
            Op::RotateRight => "RotateRight",
            Op::LShR => "LShR",
            Op::Reverse => "Reverse",
            Op::Eq => "Eq",
            Op::Ne => "Ne",
            Op::Ge => "Ge",
            Op::Le => "Le",
            Op::Gt => "Gt",
            Op::Lt => "Lt",
            Op::SGE => "SGE",
            Op::SLE => "SLE",
            Op::SGT => "SGT",
            Op::SLT => "SLT",
            Op::UGE => "UGE",
            Op::ULE => "ULE",
            Op::UGT => "UGT",
            Op::ULT => "ULT",
            Op::And => "And",
            Op::Or => "Or",
            Op::Not => "Not",
            Op::Concat => "Concat",
            Op::Extract => "Extract",
            Op::ZeroExt => "ZeroExt",
            Op::SignExt => "SignExt",
            Op::BoolVal => "BoolVal",
            Op::BitVecVal => "BitVecVal",
            Op::FpVal => "FpVal",
            Op::BoolSym => "BoolSym",
            Op::BitVec => "BitVec",
            Op::FpSym => "FpSym",
            Op::TopStridedInterval => "TopStridedInterval",
            Op::StridedInterval => "StridedInterval",
            Op::ValueSet => "ValueSet",
            Op::AbstractLocation => "AbstractLocation",
            Op::Union => "Union",
            Op::Intersection => "Intersection",
            Op::Widen => "Widen",
            Op::FP => "FP",
            Op::FpToFp => "FpToFp",
            Op::FpToIEEEBV => "FpToIEEEBV",
            Op::FpToSBV => "FpToSBV",
            Op::FpToUBV => "FpToUBV",
            Op::FpNeg => "FpNeg",
            Op::FpAbs => "FpAbs",
            Op::FpAdd => "FpAdd",
            Op::FpSub => "FpSub",
            Op::FpMul => "FpMul",
            Op::FpDiv => "FpDiv",
            Op::FpLT => "FpLT",
            Op::FpLEQ => "FpLEQ",
            Op::FpGT => "FpGT",
            Op::FpGEQ => "FpGEQ",
            Op::FpEQ => "FpEQ",
            Op::If => "If",
            Op::Identical => "Identical",
            Op::Size => "Size",
        }
    }

    /// Finalizer class used when a node of this operation is constructed.
    pub const fn finalizer(self) -> Finalizer {
        match self {
            Op::Identical => Finalizer::Identical,
            Op::BoolVal => Finalizer::BoolVal,
            Op::BoolSym => Finalizer::BoolSym,
            Op::BitVec => Finalizer::BitVec,
            Op::BitVecVal => Finalizer::BitVecVal,
            Op::FpVal | Op::FpSym => Finalizer::FpLeaf,
            Op::If => Finalizer::If,
            Op::Concat | Op::FP => Finalizer::Concat,
            Op::Extract => Finalizer::Extract,
            Op::ZeroExt | Op::SignExt => Finalizer::Extend,
            Op::FpToFp | Op::FpToSBV | Op::FpToUBV => Finalizer::FpConvert,
            Op::TopStridedInterval => Finalizer::TopInterval,
            Op::StridedInterval => Finalizer::Interval,
            Op::AbstractLocation => Finalizer::AbstractLocation,
            Op::Size => Finalizer::Staging,

            Op::Add
            | Op::RAdd
            | Op::Sub
            | Op::RSub
            | Op::Mul
            | Op::RMul
            | Op::Div
            | Op::RDiv
            | Op::TrueDiv
            | Op::RTrueDiv
            | Op::FloorDiv
            | Op::RFloorDiv
            | Op::Pow
            | Op::RPow
            | Op::Mod
            | Op::RMod
            | Op::SDiv
            | Op::SMod
            | Op::Neg
            | Op::Pos
            | Op::Abs
            | Op::Invert
            | Op::BitAnd
            | Op::RBitAnd
            | Op::BitOr
            | Op::RBitOr
            | Op::BitXor
            | Op::RBitXor
            | Op::Shl
            | Op::RShl
            | Op::Shr
            | Op::RShr
            | Op::RotateLeft
            | Op::RotateRight
            | Op::LShR
            | Op::Reverse
            | Op::Union
            | Op::Intersection
            | Op::Widen
            | Op::ValueSet
            | Op::FpToIEEEBV
            | Op::FpNeg
            | Op::FpAbs
            | Op::FpAdd
            | Op::FpSub
            | Op::FpMul
            | Op::FpDiv => Finalizer::SameLength,

            Op::Eq
            | Op::Ne
            | Op::Ge
            | Op::Le
            | Op::Gt
            | Op::Lt
            | Op::SGE
            | Op::SLE
            | Op::SGT
            | Op::SLT
            | Op::UGE
            | Op::ULE
            | Op::UGT
            | Op::ULT
            | Op::And
            | Op::Or
            | Op::Not
            | Op::FpLT
            | Op::FpLEQ
            | Op::FpGT
            | Op::FpGEQ
            | Op::FpEQ => Finalizer::NoLength,
        }
    }

    pub const fn is_length_none(self) -> bool {
        matches!(self.finalizer(), Finalizer::NoLength)
    }

    pub const fn is_length_same(self) -> bool {
        matches!(self.finalizer(), Finalizer::SameLength)
    }

    /// Result sort of a node built with this operation.
    pub const fn sort(self) -> Sort {
        match self.finalizer() {
            Finalizer::NoLength | Finalizer::BoolVal | Finalizer::BoolSym | Finalizer::Identical => Sort::Bool,
            _ => match self {
                Op::FpVal
                | Op::FpSym
                | Op::FP
                | Op::FpToFp
                | Op::FpNeg
                | Op::FpAbs
                | Op::FpAdd
                | Op::FpSub
                | Op::FpMul
                | Op::FpDiv => Sort::Fp,
                _ => Sort::BitVec,
            },
        }
    }

    /// Counterpart used when retrying with the operands swapped.
    pub const fn opposite(self) -> Option<Op> {
        Some(match self {
            Op::Add => Op::RAdd,
            Op::RAdd => Op::Add,
            Op::Div => Op::RDiv,
            Op::RDiv => Op::Div,
            Op::TrueDiv => Op::RTrueDiv,
            Op::RTrueDiv => Op::TrueDiv,
            Op::FloorDiv => Op::RFloorDiv,
            Op::RFloorDiv => Op::FloorDiv,
            Op::Mul => Op::RMul,
            Op::RMul => Op::Mul,
            Op::Sub => Op::RSub,
            Op::RSub => Op::Sub,
            Op::Pow => Op::RPow,
            Op::RPow => Op::Pow,
            Op::Mod => Op::RMod,
            Op::RMod => Op::Mod,

            Op::Eq => Op::Eq,
            Op::Ne => Op::Ne,
            Op::Ge => Op::Le,
            Op::Le => Op::Ge,
            Op::Gt => Op::Lt,
            Op::Lt => Op::Gt,
            Op::ULT => Op::UGT,
            Op::UGT => Op::ULT,
            Op::ULE => Op::UGE,
            Op::UGE => Op::ULE,
            Op::SLT => Op::SGT,
            Op::SGT => Op::SLT,
            Op::SLE => Op::SGE,
            Op::SGE => Op::SLE,

            Op::BitOr => Op::RBitOr,
            Op::RBitOr => Op::BitOr,
            Op::BitAnd => Op::RBitAnd,
            Op::RBitAnd => Op::BitAnd,
            Op::BitXor => Op::RBitXor,
            Op::RBitXor => Op::BitXor,
            Op::Shl => Op::RShl,
            Op::RShl => Op::Shl,
            Op::Shr => Op::RShr,
            Op::RShr => Op::Shr,
            _ => return None,
        })
    }

    /// The reflected (right-hand) form of a forward binary operator.
    pub const fn reflected(self) -> Option<Op> {
        Some(match self {
            Op::Add => Op::RAdd,
            Op::Sub => Op::RSub,
            Op::Mul => Op::RMul,
            Op::Div => Op::RDiv,
            Op::TrueDiv => Op::RTrueDiv,
            Op::FloorDiv => Op::RFloorDiv,
            Op::Pow => Op::RPow,
            Op::Mod => Op::RMod,
            Op::BitAnd => Op::RBitAnd,
            Op::BitOr => Op::RBitOr,
            Op::BitXor => Op::RBitXor,
            Op::Shl => Op::RShl,
            Op::Shr => Op::RShr,
            _ => return None,
        })
    }

    /// The forward operator a reflected operator stands for, with swapped operands.
    pub const fn unreflected(self) -> Option<Op> {
        Some(match self {
            Op::RAdd => Op::Add,
            Op::RSub => Op::Sub,
            Op::RMul => Op::Mul,
            Op::RDiv => Op::Div,
            Op::RTrueDiv => Op::TrueDiv,
            Op::RFloorDiv => Op::FloorDiv,
            Op::RPow => Op::Pow,
            Op::RMod => Op::Mod,
            Op::RBitAnd => Op::BitAnd,
            Op::RBitOr => Op::BitOr,
            Op::RBitXor => Op::BitXor,
            Op::RShl => Op::Shl,
            Op::RShr => Op::Shr,
            _ => return None,
        })
    }

    /// Logical negation of a comparison.
    pub const fn inverse(self) -> Option<Op> {
        Some(match self {
            Op::Eq => Op::Ne,
            Op::Ne => Op::Eq,
            Op::Gt => Op::Le,
            Op::Lt => Op::Ge,
            Op::Ge => Op::Lt,
            Op::Le => Op::Gt,
            Op::ULT => Op::UGE,
            Op::UGE => Op::ULT,
            Op::UGT => Op::ULE,
            Op::ULE => Op::UGT,
            Op::SLT => Op::SGE,
            Op::SGE => Op::SLT,
            Op::SLE => Op::SGT,
            Op::SGT => Op::SLE,
            _ => return None,
        })
    }

    /// Folding these never loses anything worth rewriting later.
    pub const fn is_not_invertible(self) -> bool {
        matches!(self, Op::Identical | Op::Union)
    }

    /// `op(Reverse(a), Reverse(b))` equals `Reverse(op(a, b))`.
    pub const fn is_reverse_distributable(self) -> bool {
        matches!(
            self,
            Op::Widen
                | Op::Union
                | Op::Intersection
                | Op::Invert
                | Op::BitOr
                | Op::RBitOr
                | Op::BitAnd
                | Op::RBitAnd
                | Op::BitXor
                | Op::RBitXor
        )
    }

    pub const fn is_commutative(self) -> bool {
        matches!(
            self,
            Op::BitAnd | Op::BitOr | Op::BitXor | Op::Add | Op::Mul | Op::And | Op::Or
        )
    }

    pub const fn is_symbol_creation(self) -> bool {
        matches!(self, Op::BoolSym | Op::BitVec | Op::FpSym)
    }

    pub const fn is_value_creation(self) -> bool {
        matches!(self, Op::BoolVal | Op::BitVecVal | Op::FpVal)
    }

    pub const fn is_leaf(self) -> bool {
        self.is_symbol_creation() || self.is_value_creation()
    }

    pub const fn infix(self) -> Option<&'static str> {
        Some(match self {
            Op::Add => "+",
            Op::Sub => "-",
            Op::Mul => "*",
            Op::Div | Op::FloorDiv => "/",
            Op::Pow => "**",
            Op::Mod => "%",
            Op::Eq => "==",
            Op::Ne => "!=",
            Op::Ge | Op::UGE => ">=",
            Op::Le | Op::ULE => "<=",
            Op::Gt | Op::UGT => ">",
            Op::Lt | Op::ULT => "<",
            Op::SGE => ">=s",
            Op::SLE => "<=s",
            Op::SGT => ">s",
            Op::SLT => "<s",
            Op::SDiv => "/s",
            Op::SMod => "%s",
            Op::BitOr => "|",
            Op::BitAnd => "&",
            Op::BitXor => "^",
            Op::Shl => "<<",
            Op::Shr => ">>",
            Op::And => "&&",
            Op::Or => "||",
            Op::Concat => "..",
            _ => return None,
        })
    }
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_opposite_is_an_involution() {
        for &op in ALL_OPS {
            if let Some(opp) = op.opposite() {
                assert_eq!(opp.opposite(), Some(op), "opposite of {} is not symmetric", op);
            }
        }
    }

    #[test]
    fn test_inverse_is_an_involution() {
        for &op in ALL_OPS {
            if let Some(inv) = op.inverse() {
                assert_eq!(inv.inverse(), Some(op));
                assert!(inv.is_length_none());
            }
        }
    }

    #[test]
    fn test_reflected_roundtrip() {
        for &op in ALL_OPS {
            if let Some(r) = op.reflected() {
                assert_eq!(r.unreflected(), Some(op));
                assert_eq!(op.opposite(), Some(r));
            }
        }
    }

    #[test]
    fn test_representative_tables() {
        assert_eq!(Op::Ge.opposite(), Some(Op::Le));
        assert_eq!(Op::ULT.opposite(), Some(Op::UGT));
        assert_eq!(Op::Eq.opposite(), Some(Op::Eq));
        assert_eq!(Op::Eq.inverse(), Some(Op::Ne));
        assert_eq!(Op::Gt.inverse(), Some(Op::Le));
        assert_eq!(Op::SLE.inverse(), Some(Op::SGT));
        assert_eq!(Op::Neg.opposite(), None);
    }

    #[test]
    fn test_every_op_listed_once() {
        let mut seen = std::collections::HashSet::new();
        for &op in ALL_OPS {
            assert!(seen.insert(op), "{} listed twice", op);
        }
        assert_eq!(Op::Size.finalizer(), Finalizer::Staging);
    }

    #[test]
    fn test_sorts() {
        assert_eq!(Op::ULT.sort(), Sort::Bool);
        assert_eq!(Op::BoolVal.sort(), Sort::Bool);
        assert_eq!(Op::Concat.sort(), Sort::BitVec);
        assert_eq!(Op::FpAdd.sort(), Sort::Fp);
        assert_eq!(Op::FpToIEEEBV.sort(), Sort::BitVec);
        assert_eq!(Op::FpLT.sort(), Sort::Bool);
    }
}
