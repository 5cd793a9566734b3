//! Solving a binary relation for one of its subterms.
//!
//! Given `op(L, R)` and a target that occurs inside `L`, each structural
//! operation on the way down to the target is undone by applying its inverse
//! to `R`. The result is an equivalent relation whose left side is the target:
//!
//! ```text
//! ULE(Extract(7, 0, x), c)   pivot on x   ULE(x, ZeroExt(24, c))
//! ```

use log::debug;

use crate::ast::{Arg, AstRef};
use crate::engine::Engine;
use crate::error::{AstError, Result};
use crate::op::Op;

/// Path of operand indices from `haystack` down to the first occurrence of
/// `target`, searching operands left to right.
fn find_arg(haystack: &Arg, target: &AstRef) -> Option<Vec<usize>> {
    let mut stack: Vec<(&Arg, Vec<usize>)> = vec![(haystack, Vec::new())];
    while let Some((arg, path)) = stack.pop() {
        let Some(node) = arg.as_ast() else {
            continue;
        };
        if node == target {
            return Some(path);
        }
        for (i, child) in node.args().iter().enumerate().rev() {
            let mut p = path.clone();
            p.push(i);
            stack.push((child, p));
        }
    }
    None
}

impl Engine {
    /// Rewrites the binary relation `ast` so that the given endpoint stands
    /// alone on the left.
    ///
    /// Exactly one of `left` (a subterm of the left operand) and `right` (a
    /// subterm of the right operand) must be given.
    pub fn pivot(&self, ast: &AstRef, left: Option<&AstRef>, right: Option<&AstRef>) -> Result<AstRef> {
        let (target, swap) = match (left, right) {
            (Some(t), None) => (t, false),
            (None, Some(t)) => (t, true),
            (Some(_), Some(_)) => return Err(AstError::pivot("only one endpoint may be given")),
            (None, None) => return Err(AstError::pivot("no endpoint given")),
        };
        let [a, b] = ast.args() else {
            return Err(AstError::pivot(format!(
                "{} has {} operands, expected 2",
                ast.op(),
                ast.args().len()
            )));
        };

        let (op, mut lhs, mut rhs) = if swap {
            let op = if ast.op().is_commutative() {
                ast.op()
            } else {
                ast.op()
                    .opposite()
                    .ok_or_else(|| AstError::pivot(format!("{} cannot be turned around", ast.op())))?
            };
            (op, b.raw(), a.clone())
        } else {
            (ast.op(), a.raw(), b.clone())
        };

        let path = find_arg(&lhs, target).ok_or_else(|| AstError::pivot(format!("{} does not occur in {}", target, lhs)))?;
        debug!("pivot: {} along {:?}", op, path);

        for index in path {
            let node = lhs
                .as_ast()
                .cloned()
                .ok_or_else(|| AstError::pivot(format!("{} is not a tree", lhs)))?;
            let (l, r) = self.reverse_operation(&node, rhs, index)?;
            lhs = l;
            rhs = r;
        }

        self.mk_ast(op, vec![lhs, rhs])
    }

    /// Moves the operation `node` from the left side to the right side,
    /// keeping operand `index` on the left.
    fn reverse_operation(&self, node: &AstRef, rhs: Arg, index: usize) -> Result<(Arg, Arg)> {
        match (node.op(), node.args(), index) {
            (Op::Extract, [high, low, source], 2) => {
                let (Some(high), Some(0)) = (high.as_int(), low.as_int()) else {
                    return Err(AstError::pivot("only an Extract starting at bit 0 can be undone"));
                };
                let size = self
                    .arg_size(source)
                    .ok_or_else(|| AstError::pivot(format!("{} has no length", source)))?;
                let extra = i64::from(size) - (high + 1);
                let widened = self.mk_ast(Op::ZeroExt, vec![extra.into(), rhs])?;
                Ok((source.raw(), Arg::Ast(widened)))
            }
            (Op::ZeroExt, [extra, source], 1) => {
                let extra = extra
                    .as_int()
                    .ok_or_else(|| AstError::pivot("ZeroExt amount is not an integer"))?;
                let size = self
                    .arg_size(&rhs)
                    .ok_or_else(|| AstError::pivot(format!("{} has no length", rhs)))?;
                let high = i64::from(size) - extra - 1;
                let narrowed = self.mk_ast(Op::Extract, vec![high.into(), 0i64.into(), rhs])?;
                Ok((source.raw(), Arg::Ast(narrowed)))
            }
            (op, _, index) => Err(AstError::pivot(format!("cannot undo {} on operand {}", op, index))),
        }
    }
}
