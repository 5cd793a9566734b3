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
use crate::value::{BitVecValue, Interval, Leaf};

/// Evaluates over strided intervals.
///
/// Comparisons are answered only when their outcome is certain. An `If` whose
/// condition cannot be decided becomes an [`IfProxy`][crate::proxy::IfProxy]
/// over both branch values.
#[derive(Debug, Default, Clone, Copy)]
pub struct IntervalBackend;

impl IntervalBackend {
    pub const NAME: &'static str = "vsa";

    fn value(&self, engine: &Engine, arg: &Arg, ctx: Option<&mut ResolveContext>) -> Result<Leaf, BackendError> {
        engine.resolve_arg(self, arg, ctx)
    }
}

fn u64_arg(arg: &Arg) -> Result<u64, BackendError> {
    match arg.as_leaf() {
        Some(Leaf::Int(i)) => i
            .to_u64()
            .ok_or_else(|| BackendError::failed(format!("{} does not fit in 64 bits", i))),
        _ => Err(BackendError::failed(format!("{} is not an integer", arg))),
    }
}

fn bits_arg(arg: &Arg) -> Result<u32, BackendError> {
    match u64_arg(arg)? {
        b @ 1..=64 => Ok(b as u32),
        b => Err(BackendError::failed(format!("{}-bit intervals are not supported", b))),
    }
}

fn is_interval_binary(op: Op) -> bool {
    matches!(
        op,
        Op::Add
            | Op::Sub
            | Op::Union
            | Op::Intersection
            | Op::Widen
            | Op::Eq
            | Op::Ne
            | Op::Lt
            | Op::Le
            | Op::Gt
            | Op::Ge
            | Op::ULT
            | Op::ULE
            | Op::UGT
            | Op::UGE
    )
}

impl Backend for IntervalBackend {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn size(&self, leaf: &Leaf) -> Option<u32> {
        match leaf {
            Leaf::Interval(_) | Leaf::BitVec(_) | Leaf::Proxy(_) => leaf.size(),
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

            (Op::TopStridedInterval, [bits]) => Ok(Leaf::Interval(Interval::top(bits_arg(bits)?))),

            (Op::StridedInterval, [bits, stride, lower, upper]) => Ok(Leaf::Interval(Interval::new(
                bits_arg(bits)?,
                u64_arg(stride)?,
                u64_arg(lower)?,
                u64_arg(upper)?,
            ))),

            (Op::BitVecVal, [value, width]) => {
                let bits = bits_arg(width)?;
                let v = match value.as_leaf() {
                    Some(Leaf::Int(i)) => BitVecValue::new(i, bits),
                    _ => return Err(BackendError::failed("BitVecVal without an integer")),
                };
                let v = v.to_u64().ok_or_else(|| BackendError::failed("value does not fit in 64 bits"))?;
                Ok(Leaf::Interval(Interval::constant(bits, v)))
            }

            (Op::BoolVal, [arg]) => match arg.as_leaf() {
                Some(Leaf::Bool(b)) => Ok(Leaf::Bool(*b)),
                _ => Err(BackendError::failed("BoolVal without a boolean")),
            },

            (Op::If, [cond, then, otherwise]) => match self.value(engine, cond, ctx.as_deref_mut()) {
                Ok(Leaf::Bool(true)) => self.value(engine, then, ctx),
                Ok(Leaf::Bool(false)) => self.value(engine, otherwise, ctx),
                _ => {
                    let condition = cond
                        .as_ast()
                        .cloned()
                        .ok_or_else(|| BackendError::failed(format!("{} is not a condition", cond)))?;
                    let t = self.value(engine, then, ctx.as_deref_mut())?;
                    let f = self.value(engine, otherwise, ctx)?;
                    Ok(Leaf::proxy(condition, t, f))
                }
            },

            (Op::Neg | Op::Pos, [a]) => {
                let a = self.value(engine, a, ctx)?;
                a.apply_unary(op).ok_or(BackendError::Unsupported(op))
            }

            (op, [a, b]) if is_interval_binary(op) => {
                let a = self.value(engine, a, ctx.as_deref_mut())?;
                let b = self.value(engine, b, ctx)?;
                negotiate_binary(op, &a, &b).ok_or(BackendError::Unsupported(op))
            }

            _ => Err(BackendError::Unsupported(op)),
        }
    }
}

impl Filter for IntervalBackend {
    fn convert(&self, engine: &Engine, expr: Expr) -> Result<Expr, BackendError> {
        Backend::convert(self, engine, expr)
    }
}
