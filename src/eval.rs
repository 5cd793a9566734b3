//! Operator overloading on expressions.
//!
//! `&a + &b` does not build anything by itself: it produces a [`PendingOp`]
//! that an engine evaluates with [`Engine::eval`], negotiating the operator
//! the same way [`Engine::apply`] does.
//!
//! ```
//! use symast::engine::Engine;
//! use symast::value::Leaf;
//!
//! let engine = Engine::default();
//! let a = engine.bvv(200, 8).unwrap();
//! let b = engine.bvv(100, 8).unwrap();
//! let sum = engine.eval(&a + &b).unwrap();
//! assert_eq!(sum.model(), Some(&Leaf::bv(44, 8)));
//! ```

use std::ops::{Add, BitAnd, BitOr, BitXor, Div, Mul, Neg, Not, Rem, Shl, Shr, Sub};

use crate::ast::Arg;
use crate::engine::Engine;
use crate::error::{AstError, Result};
use crate::expr::Expr;
use crate::op::Op;

/// An operation waiting for an engine.
#[derive(Debug, Clone)]
pub struct PendingOp {
    op: Op,
    args: Vec<Arg>,
}

impl PendingOp {
    pub fn new(op: Op, args: Vec<Arg>) -> Self {
        Self { op, args }
    }

    pub fn binary(op: Op, lhs: impl Into<Arg>, rhs: impl Into<Arg>) -> Self {
        Self::new(op, vec![lhs.into(), rhs.into()])
    }

    pub fn op(&self) -> Op {
        self.op
    }

    pub fn args(&self) -> &[Arg] {
        &self.args
    }
}

pub trait Eval {
    fn eval(&self, engine: &Engine) -> Result<Expr>;
}

impl Engine {
    pub fn eval(&self, value: impl Eval) -> Result<Expr> {
        value.eval(self)
    }
}

impl Eval for Expr {
    fn eval(&self, _engine: &Engine) -> Result<Expr> {
        Ok(self.clone())
    }
}

impl Eval for PendingOp {
    fn eval(&self, engine: &Engine) -> Result<Expr> {
        let bound = engine.registry().spec(self.op).is_some_and(|s| s.bound);
        if !bound {
            return Err(AstError::operation(format!("{} has no operator form", self.op)));
        }
        match self.args.as_slice() {
            [lhs, rhs] => engine.apply(self.op, lhs.clone(), rhs.clone()),
            _ => engine.construct(self.op, self.args.clone()),
        }
    }
}

macro_rules! binary_operator {
    ($trait:ident, $method:ident, $op:expr, $reflected:expr) => {
        impl $trait<&Expr> for &Expr {
            type Output = PendingOp;

            fn $method(self, rhs: &Expr) -> PendingOp {
                PendingOp::binary($op, self, rhs)
            }
        }

        impl $trait<i64> for &Expr {
            type Output = PendingOp;

            fn $method(self, rhs: i64) -> PendingOp {
                PendingOp::binary($op, self, rhs)
            }
        }

        impl $trait<&Expr> for i64 {
            type Output = PendingOp;

            fn $method(self, rhs: &Expr) -> PendingOp {
                PendingOp::binary($reflected, rhs, self)
            }
        }
    };
}

binary_operator!(Add, add, Op::Add, Op::RAdd);
binary_operator!(Sub, sub, Op::Sub, Op::RSub);
binary_operator!(Mul, mul, Op::Mul, Op::RMul);
binary_operator!(Div, div, Op::Div, Op::RDiv);
binary_operator!(Rem, rem, Op::Mod, Op::RMod);
binary_operator!(BitAnd, bitand, Op::BitAnd, Op::RBitAnd);
binary_operator!(BitOr, bitor, Op::BitOr, Op::RBitOr);
binary_operator!(BitXor, bitxor, Op::BitXor, Op::RBitXor);
binary_operator!(Shl, shl, Op::Shl, Op::RShl);
binary_operator!(Shr, shr, Op::Shr, Op::RShr);

impl Neg for &Expr {
    type Output = PendingOp;

    fn neg(self) -> PendingOp {
        PendingOp::new(Op::Neg, vec![self.into()])
    }
}

/// Bitwise complement.
impl Not for &Expr {
    type Output = PendingOp;

    fn not(self) -> PendingOp {
        PendingOp::new(Op::Invert, vec![self.into()])
    }
}

#[cfg(test)]
mod tests {
    use test_log::test;

    use super::*;
    use crate::value::Leaf;

    #[test]
    fn test_eval_expr() {
        let engine = Engine::default();
        let x = engine.bvs("x", 8).unwrap();
        assert_eq!(engine.eval(x.clone()).unwrap(), x);
    }

    #[test]
    fn test_eval_constants() {
        let engine = Engine::default();
        let a = engine.bvv(12, 8).unwrap();
        let b = engine.bvv(10, 8).unwrap();
        assert_eq!(engine.eval(&a - &b).unwrap().model(), Some(&Leaf::bv(2, 8)));
        assert_eq!(engine.eval(&a & &b).unwrap().model(), Some(&Leaf::bv(8, 8)));
        assert_eq!(engine.eval(&a ^ &b).unwrap().model(), Some(&Leaf::bv(6, 8)));
        assert_eq!(engine.eval(-&b).unwrap().model(), Some(&Leaf::bv(246, 8)));
        assert_eq!(engine.eval(!&b).unwrap().model(), Some(&Leaf::bv(0xf5, 8)));
        assert_eq!(engine.eval(&a % 5).unwrap().model(), Some(&Leaf::bv(2, 8)));
    }

    #[test]
    fn test_eval_symbolic() {
        let engine = Engine::default();
        let x = engine.bvs("x", 8).unwrap();
        let sum = engine.eval(&x + 1).unwrap();
        let ast = sum.ast().unwrap();
        assert_eq!(ast.op(), Op::Add);
        assert_eq!(ast.args()[1].as_leaf(), Some(&Leaf::bv(1, 8)));
    }

    #[test]
    fn test_eval_reflected_canonicalizes() {
        let engine = Engine::default();
        let x = engine.bvs("x", 8).unwrap();
        let diff = engine.eval(10 - &x).unwrap();
        let ast = diff.ast().unwrap();
        assert_eq!(ast.op(), Op::Sub);
        assert_eq!(ast.args()[0].as_leaf(), Some(&Leaf::bv(10, 8)));
        assert_eq!(ast.args()[1], Arg::Expr(x));
    }

    #[test]
    fn test_unbound_operator() {
        let engine = Engine::default();
        let x = engine.bvs("x", 8).unwrap();
        let pending = PendingOp::binary(Op::LShR, &x, &x);
        assert!(matches!(engine.eval(pending), Err(AstError::Operation(_))));
    }
}
