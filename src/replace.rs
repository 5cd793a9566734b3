//! Structural substitution of subterms.

use std::collections::HashMap;
use std::sync::Arc;

use log::debug;

use crate::ast::{Arg, Ast, AstRef};
use crate::engine::Engine;
use crate::error::Result;
use crate::expr::ExprNode;

#[derive(Debug, Clone)]
enum Rewrite {
    Same,
    Matched,
    Rebuilt(Arg),
}

/// Puts `replacement` where `original` was, keeping the wrapper if there was one.
fn rewrap(original: &Arg, replacement: Arg) -> Arg {
    match original {
        Arg::Expr(e) => Arg::Expr(e.with_node(ExprNode::from_arg(replacement))),
        _ => replacement,
    }
}

impl Engine {
    /// Substitutes `new` for every subterm of `ast` structurally equal to `old`.
    ///
    /// Nodes are rebuilt only along paths where something changed; untouched
    /// subtrees are shared with the input. Returns the result and whether any
    /// substitution happened.
    pub fn replace(&self, ast: &AstRef, old: &AstRef, new: &Arg) -> Result<(Arg, bool)> {
        let old_hash = old.hash_value();
        let matches = |node: &Ast| node.hash_value() == old_hash && node == old.as_ref();

        let mut memo: HashMap<*const Ast, Rewrite> = HashMap::new();
        let mut stack: Vec<(&AstRef, bool)> = vec![(ast, false)];

        while let Some((node, expanded)) = stack.pop() {
            let key = Arc::as_ptr(node);
            if memo.contains_key(&key) {
                continue;
            }
            if matches(&**node) {
                memo.insert(key, Rewrite::Matched);
                continue;
            }
            if !expanded {
                stack.push((node, true));
                for child in node.children() {
                    if !memo.contains_key(&Arc::as_ptr(child)) {
                        stack.push((child, false));
                    }
                }
                continue;
            }

            let mut changed = false;
            let mut args = Vec::with_capacity(node.args().len());
            for arg in node.args() {
                let rewrite = arg.as_ast().and_then(|child| memo.get(&Arc::as_ptr(child)));
                match rewrite {
                    Some(Rewrite::Matched) => {
                        changed = true;
                        args.push(rewrap(arg, new.clone()));
                    }
                    Some(Rewrite::Rebuilt(r)) => {
                        changed = true;
                        args.push(rewrap(arg, r.clone()));
                    }
                    Some(Rewrite::Same) | None => args.push(arg.clone()),
                }
            }

            let rewrite = if changed {
                debug!("replace: rebuilding {}", node.op());
                let rebuilt = self.mk_ast_with(node.op(), args, node.collapsible())?;
                Rewrite::Rebuilt(Arg::Ast(rebuilt))
            } else {
                Rewrite::Same
            };
            memo.insert(key, rewrite);
        }

        Ok(match memo.remove(&Arc::as_ptr(ast)) {
            Some(Rewrite::Matched) => (new.clone(), true),
            Some(Rewrite::Rebuilt(r)) => (r, true),
            Some(Rewrite::Same) | None => (Arg::Ast(ast.clone()), false),
        })
    }
}

#[cfg(test)]
mod tests {
    use test_log::test;

    use super::*;
    use crate::op::Op;
    use crate::value::Leaf;

    fn sym(engine: &Engine, name: &str) -> AstRef {
        engine.mk_ast(Op::BitVec, vec![name.into(), 8u32.into()]).unwrap()
    }

    #[test]
    fn test_replace_everywhere() {
        let engine = Engine::default();
        let x = sym(&engine, "x");
        let y = sym(&engine, "y");
        let sum = engine.mk_ast(Op::Add, vec![x.clone().into(), x.clone().into()]).unwrap();
        let prod = engine.mk_ast(Op::Mul, vec![sum.into(), y.clone().into()]).unwrap();

        let z = sym(&engine, "z");
        let (out, replaced) = engine.replace(&prod, &x, &Arg::Ast(z.clone())).unwrap();
        assert!(replaced);
        let out = out.as_ast().unwrap().clone();
        let expected_sum = engine.mk_ast(Op::Add, vec![z.clone().into(), z.into()]).unwrap();
        let expected = engine.mk_ast(Op::Mul, vec![expected_sum.into(), y.into()]).unwrap();
        assert_eq!(out, expected);
    }

    #[test]
    fn test_untouched_subtrees_are_shared() {
        let engine = Engine::default();
        let x = sym(&engine, "x");
        let y = sym(&engine, "y");
        let left = engine.mk_ast(Op::Neg, vec![y.clone().into()]).unwrap();
        let root = engine.mk_ast(Op::Add, vec![left.clone().into(), x.clone().into()]).unwrap();

        let (out, _) = engine.replace(&root, &x, &Leaf::bv(1, 8).into()).unwrap();
        let out = out.as_ast().unwrap().clone();
        assert!(Arc::ptr_eq(out.arg(0).and_then(Arg::as_ast).unwrap(), &left));
        assert_eq!(out.arg(1), Some(&Arg::Leaf(Leaf::bv(1, 8))));
    }

    #[test]
    fn test_no_match() {
        let engine = Engine::default();
        let x = sym(&engine, "x");
        let y = sym(&engine, "y");
        let root = engine.mk_ast(Op::Neg, vec![x.into()]).unwrap();
        let (out, replaced) = engine.replace(&root, &y, &Leaf::bv(1, 8).into()).unwrap();
        assert!(!replaced);
        assert!(Arc::ptr_eq(out.as_ast().unwrap(), &root));
    }

    #[test]
    fn test_root_match() {
        let engine = Engine::default();
        let x = sym(&engine, "x");
        let copy = sym(&engine, "x");
        let (out, replaced) = engine.replace(&x, &copy, &Leaf::bv(9, 8).into()).unwrap();
        assert!(replaced);
        assert_eq!(out, Arg::Leaf(Leaf::bv(9, 8)));
    }

    #[test]
    fn test_collapsible_flag_survives() {
        let engine = Engine::default();
        let x = sym(&engine, "x");
        let pinned = engine
            .mk_ast_with(Op::Add, vec![x.clone().into(), Leaf::bv(1, 8).into()], false)
            .unwrap();
        let (out, _) = engine.replace(&pinned, &x, &Leaf::bv(2, 8).into()).unwrap();
        assert!(!out.as_ast().unwrap().collapsible());
    }

    #[test]
    fn test_deep_chain() {
        let engine = Engine::default();
        let x = sym(&engine, "x");
        let mut node = x.clone();
        for _ in 0..2_000 {
            node = engine.mk_ast(Op::Neg, vec![node.into()]).unwrap();
        }
        let (out, replaced) = engine.replace(&node, &x, &Leaf::bv(0, 8).into()).unwrap();
        assert!(replaced);
        assert_eq!(out.as_ast().unwrap().length(), Some(8));
    }
}
