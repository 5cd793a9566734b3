//! Peephole simplification and eager folding of freshly built nodes.

use log::debug;

use crate::ast::{Arg, Ast, AstRef};
use crate::engine::Engine;
use crate::error::Result;
use crate::op::Op;

/// The operand of a `Reverse` node, if `arg` is one.
fn reversed(arg: &Arg) -> Option<&Arg> {
    match arg.as_ast() {
        Some(a) if a.op() == Op::Reverse => a.arg(0),
        _ => None,
    }
}

impl Engine {
    /// Applies the reverse rewrites once at the root.
    ///
    /// - `Reverse(Reverse(x))` is `x`.
    /// - `op(Reverse(a), Reverse(b), ..)` is `Reverse(op(a, b, ..))` when `op`
    ///   distributes over bit reversal; the inner node is simplified again.
    pub fn simplified(&self, ast: &AstRef) -> Result<Arg> {
        if ast.op() == Op::Reverse {
            if let Some(inner) = ast.arg(0).and_then(reversed) {
                debug!("simplify: reverse-of-reverse");
                return Ok(inner.raw());
            }
        }

        if ast.op().is_reverse_distributable() && !ast.args().is_empty() {
            let inner: Option<Vec<Arg>> = ast.args().iter().map(|a| reversed(a).cloned()).collect();
            if let Some(inner) = inner {
                debug!("simplify: pulling Reverse out of {}", ast.op());
                let node = self.mk_ast(ast.op(), inner)?;
                let node = self.simplified(&node)?;
                return self.mk_ast(Op::Reverse, vec![node]).map(Arg::Ast);
            }
        }

        Ok(Arg::Ast(ast.clone()))
    }

    /// Whether `ast` may be folded into a plain value.
    pub fn should_collapse(&self, ast: &Ast) -> bool {
        if ast.args().iter().filter_map(Arg::as_ast).any(|a| !a.collapsible()) {
            return false;
        }
        if ast.op().is_not_invertible() {
            return true;
        }
        if ast.args().iter().all(|a| a.as_leaf().is_some_and(|l| l.is_constant())) {
            return true;
        }
        let points = ast
            .args()
            .iter()
            .filter(|a| a.as_leaf().is_some_and(|l| l.is_integer_interval()))
            .count();
        points > 1
    }

    /// Resolves `ast` if it may be folded; otherwise keeps the tree.
    pub fn collapsed(&self, ast: &AstRef) -> Arg {
        if ast.collapsible() && self.should_collapse(ast) {
            self.resolve(ast, None)
        } else {
            Arg::Ast(ast.clone())
        }
    }

    /// Simplification followed by collapsing.
    pub fn reduced(&self, ast: &AstRef) -> Result<Arg> {
        match self.simplified(ast)? {
            Arg::Ast(a) => Ok(self.collapsed(&a)),
            other => Ok(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use test_log::test;

    use super::*;
    use crate::value::Leaf;

    #[test]
    fn test_reverse_of_reverse() {
        let engine = Engine::default();
        let x = engine.mk_ast(Op::BitVec, vec!["x".into(), 16u32.into()]).unwrap();
        let r = engine.mk_ast(Op::Reverse, vec![x.clone().into()]).unwrap();
        let rr = engine.mk_ast(Op::Reverse, vec![r.into()]).unwrap();
        assert_eq!(engine.simplified(&rr).unwrap(), Arg::Ast(x));
    }

    #[test]
    fn test_reverse_distributes() {
        let engine = Engine::default();
        let x = engine.mk_ast(Op::BitVec, vec!["x".into(), 16u32.into()]).unwrap();
        let y = engine.mk_ast(Op::BitVec, vec!["y".into(), 16u32.into()]).unwrap();
        let rx = engine.mk_ast(Op::Reverse, vec![x.clone().into()]).unwrap();
        let ry = engine.mk_ast(Op::Reverse, vec![y.clone().into()]).unwrap();
        let and = engine.mk_ast(Op::BitAnd, vec![rx.clone().into(), ry.into()]).unwrap();

        let Arg::Ast(out) = engine.simplified(&and).unwrap() else {
            panic!("expected a tree");
        };
        assert_eq!(out.op(), Op::Reverse);
        let inner = out.arg(0).and_then(Arg::as_ast).unwrap();
        assert_eq!(inner.op(), Op::BitAnd);
        assert_eq!(inner.args(), &[Arg::Ast(x.clone()), Arg::Ast(y)]);

        // Not every operand is reversed.
        let mixed = engine.mk_ast(Op::BitAnd, vec![rx.into(), x.into()]).unwrap();
        assert_eq!(engine.simplified(&mixed).unwrap(), Arg::Ast(mixed.clone()));
    }

    #[test]
    fn test_collapse_rules() {
        let engine = Engine::default();
        let constants = engine
            .mk_ast(Op::Add, vec![Leaf::bv(3, 8).into(), Leaf::bv(4, 8).into()])
            .unwrap();
        assert!(engine.should_collapse(&constants));
        assert_eq!(engine.collapsed(&constants), Arg::Leaf(Leaf::bv(7, 8)));

        let x = engine.mk_ast(Op::BitVec, vec!["x".into(), 8u32.into()]).unwrap();
        let symbolic = engine.mk_ast(Op::Add, vec![x.into(), Leaf::bv(4, 8).into()]).unwrap();
        assert!(!engine.should_collapse(&symbolic));

        let pinned = engine
            .mk_ast_with(Op::Add, vec![Leaf::bv(3, 8).into(), Leaf::bv(4, 8).into()], false)
            .unwrap();
        assert_eq!(engine.collapsed(&pinned), Arg::Ast(pinned.clone()));
        assert_eq!(engine.reduced(&pinned).unwrap(), Arg::Ast(pinned.clone()));
        let outer = engine.mk_ast(Op::Add, vec![pinned.into(), Leaf::bv(1, 8).into()]).unwrap();
        assert!(!engine.should_collapse(&outer));
        assert_eq!(engine.collapsed(&outer), Arg::Ast(outer.clone()));
    }

    #[test]
    fn test_point_intervals_collapse() {
        use crate::value::Interval;

        let engine = Engine::default();
        let a = Leaf::Interval(Interval::constant(8, 2));
        let b = Leaf::Interval(Interval::constant(8, 3));
        let sum = engine.mk_ast(Op::Add, vec![a.clone().into(), b.into()]).unwrap();
        assert!(engine.should_collapse(&sum));

        let wide = Leaf::Interval(Interval::new(8, 1, 0, 9));
        let sum = engine.mk_ast(Op::Add, vec![a.into(), wide.into()]).unwrap();
        assert!(!engine.should_collapse(&sum));
    }
}
