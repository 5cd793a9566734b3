use num_traits::ToPrimitive;

use crate::ast::{Arg, Ast};
use crate::backend::Backend;
use crate::engine::Engine;
use crate::error::BackendError;
use crate::expr::Expr;
use crate::filter::Filter;
use crate::op::Op;
use crate::proxy::{negotiate_binary, Operand};
use crate::resolve::ResolveContext;
use crate::value::{BitVecValue, Leaf};

/// Evaluates booleans and arbitrary-width bit-vectors exactly.
///
/// Symbols, floating point, and abstract values are declined.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConcreteBackend;

impl ConcreteBackend {
    pub const NAME: &'static str = "concrete";

    fn value(&self, engine: &Engine, arg: &Arg, ctx: Option<&mut ResolveContext>) -> Result<Leaf, BackendError> {
        match engine.resolve_arg(self, arg, ctx)? {
            v @ (Leaf::Bool(_) | Leaf::Int(_) | Leaf::BitVec(_)) => Ok(v),
            other => Err(BackendError::failed(format!("{} is not a concrete value", other))),
        }
    }

    fn bitvec(&self, engine: &Engine, arg: &Arg, ctx: Option<&mut ResolveContext>) -> Result<BitVecValue, BackendError> {
        match self.value(engine, arg, ctx)? {
            Leaf::BitVec(v) => Ok(v),
            other => Err(BackendError::failed(format!("{} is not a bit-vector", other))),
        }
    }

    fn boolean(&self, engine: &Engine, arg: &Arg, ctx: Option<&mut ResolveContext>) -> Result<bool, BackendError> {
        match self.value(engine, arg, ctx)? {
            Leaf::Bool(b) => Ok(b),
            other => Err(BackendError::failed(format!("{} is not a boolean", other))),
        }
    }
}

fn small_int(arg: &Arg) -> Result<u32, BackendError> {
    arg.as_int()
        .and_then(|i| i.to_u32())
        .ok_or_else(|| BackendError::failed(format!("{} is not a small integer", arg)))
}

fn is_concrete_unary(op: Op) -> bool {
    matches!(op, Op::Neg | Op::Pos | Op::Abs | Op::Invert | Op::Reverse)
}

fn is_concrete_binary(op: Op) -> bool {
    matches!(
        op,
        Op::Add
            | Op::Sub
            | Op::Mul
            | Op::Div
            | Op::TrueDiv
            | Op::FloorDiv
            | Op::Pow
            | Op::Mod
            | Op::SDiv
            | Op::SMod
            | Op::BitAnd
            | Op::BitOr
            | Op::BitXor
            | Op::Shl
            | Op::Shr
            | Op::LShR
            | Op::RotateLeft
            | Op::RotateRight
            | Op::Eq
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
    )
}

impl Backend for ConcreteBackend {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn size(&self, leaf: &Leaf) -> Option<u32> {
        match leaf {
            Leaf::BitVec(v) => Some(v.width()),
            _ => None,
        }
    }

    fn call(&self, engine: &Engine, ast: &Ast, mut ctx: Option<&mut ResolveContext>) -> Result<Leaf, BackendError> {
        let op = ast.op();
        match (op, ast.args()) {
            (Op::Size, [arg]) => arg
                .as_leaf()
                .and_then(|l| self.size(l))
                .map(Leaf::from)
                .ok_or(BackendError::Unsupported(op)),

            (Op::BoolVal, [arg]) => match arg.as_leaf() {
                Some(Leaf::Bool(b)) => Ok(Leaf::Bool(*b)),
                _ => Err(BackendError::failed("BoolVal without a boolean")),
            },

            (Op::BitVecVal, [value, width]) => match value.as_leaf() {
                Some(Leaf::Int(v)) => Ok(Leaf::BitVec(BitVecValue::new(v, small_int(width)?))),
                _ => Err(BackendError::failed("BitVecVal without an integer")),
            },

            (Op::If, [cond, then, otherwise]) => {
                if self.boolean(engine, cond, ctx.as_deref_mut())? {
                    self.value(engine, then, ctx)
                } else {
                    self.value(engine, otherwise, ctx)
                }
            }

            (Op::Concat, args) => {
                let mut acc: Option<BitVecValue> = None;
                for a in args {
                    let v = self.bitvec(engine, a, ctx.as_deref_mut())?;
                    acc = Some(match acc {
                        Some(high) => high.concat(&v),
                        None => v,
                    });
                }
                acc.map(Leaf::BitVec).ok_or(BackendError::Unsupported(op))
            }

            (Op::Extract, [high, low, source]) => {
                let v = self.bitvec(engine, source, ctx)?;
                Ok(Leaf::BitVec(v.extract(small_int(high)?, small_int(low)?)))
            }

            (Op::ZeroExt, [extra, source]) => Ok(Leaf::BitVec(self.bitvec(engine, source, ctx)?.zero_ext(small_int(extra)?))),
            (Op::SignExt, [extra, source]) => Ok(Leaf::BitVec(self.bitvec(engine, source, ctx)?.sign_ext(small_int(extra)?))),

            (Op::Identical, [a, b]) => {
                let a = self.value(engine, a, ctx.as_deref_mut())?;
                let b = self.value(engine, b, ctx)?;
                Ok(Leaf::Bool(a == b))
            }

            (Op::And | Op::Or, args) => {
                let mut acc = op == Op::And;
                for a in args {
                    let b = self.boolean(engine, a, ctx.as_deref_mut())?;
                    acc = if op == Op::And { acc && b } else { acc || b };
                }
                Ok(Leaf::Bool(acc))
            }

            (Op::Not, [a]) => Ok(Leaf::Bool(!self.boolean(engine, a, ctx)?)),

            (op, [a]) if is_concrete_unary(op) => {
                let a = self.value(engine, a, ctx)?;
                a.apply_unary(op).ok_or(BackendError::Unsupported(op))
            }

            (op, [a, b]) if is_concrete_binary(op) => {
                let a = self.value(engine, a, ctx.as_deref_mut())?;
                let b = self.value(engine, b, ctx)?;
                negotiate_binary(op, &a, &b).ok_or(BackendError::Unsupported(op))
            }

            _ => Err(BackendError::Unsupported(op)),
        }
    }
}

impl Filter for ConcreteBackend {
    fn convert(&self, engine: &Engine, expr: Expr) -> Result<Expr, BackendError> {
        Backend::convert(self, engine, expr)
    }
}

#[cfg(test)]
mod tests {
    use test_log::test;

    use super::*;

    fn engine() -> Engine {
        Engine::builder().backend(ConcreteBackend).build()
    }

    #[test]
    fn test_arithmetic() {
        let engine = engine();
        let a = engine.mk_ast(Op::BitVecVal, vec![200i64.into(), 8u32.into()]).unwrap();
        let b = engine.mk_ast(Op::BitVecVal, vec![100i64.into(), 8u32.into()]).unwrap();
        let sum = engine.mk_ast(Op::Add, vec![a.clone().into(), b.clone().into()]).unwrap();
        assert_eq!(engine.resolve(&sum, None), Arg::Leaf(Leaf::bv(44, 8)));
        let lt = engine.mk_ast(Op::SLT, vec![a.into(), b.into()]).unwrap();
        assert_eq!(engine.resolve(&lt, None), Arg::Leaf(Leaf::Bool(true)));
    }

    #[test]
    fn test_if_picks_branch() {
        let engine = engine();
        let t = engine.mk_ast(Op::BoolVal, vec![true.into()]).unwrap();
        let node = engine
            .mk_ast(Op::If, vec![t.into(), Leaf::bv(1, 4).into(), Leaf::bv(2, 4).into()])
            .unwrap();
        assert_eq!(engine.resolve(&node, None), Arg::Leaf(Leaf::bv(1, 4)));
    }

    #[test]
    fn test_declines_symbols() {
        let engine = engine();
        let x = engine.mk_ast(Op::BitVec, vec!["x".into(), 8u32.into()]).unwrap();
        let n = engine.mk_ast(Op::Neg, vec![x.into()]).unwrap();
        assert_eq!(engine.resolve(&n, None), Arg::Ast(n.clone()));
        let err = ConcreteBackend.call(&engine, &n, None).unwrap_err();
        assert_eq!(err, BackendError::Unsupported(Op::BitVec));
    }

    #[test]
    fn test_boolean_connectives() {
        let engine = engine();
        let t: Arg = true.into();
        let f: Arg = false.into();
        let and = engine.mk_ast(Op::And, vec![t.clone(), t.clone(), f.clone()]).unwrap();
        let or = engine.mk_ast(Op::Or, vec![f.clone(), t]).unwrap();
        assert_eq!(engine.resolve(&and, None), Arg::Leaf(Leaf::Bool(false)));
        assert_eq!(engine.resolve(&or, None), Arg::Leaf(Leaf::Bool(true)));
    }

    #[test]
    fn test_as_filter() {
        let engine = engine();
        let n = engine.mk_ast(Op::Reverse, vec![Leaf::bv(1, 8).into()]).unwrap();
        let expr = Expr::new(crate::expr::ExprNode::Ast(n), crate::op::Sort::BitVec);
        let out = Filter::convert(&ConcreteBackend, &engine, expr).unwrap();
        assert_eq!(out.model(), Some(&Leaf::bv(0x80, 8)));
    }
}
