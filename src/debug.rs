//! Debug utilities for inspecting tree structure.
//!
//! These are primarily useful in tests and during development.

use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::sync::Arc;

use crate::ast::{Arg, Ast, AstRef};
use crate::engine::Engine;
use crate::op::Op;

/// Detailed information about a single node.
#[derive(Debug, Clone)]
pub struct NodeInfo {
    /// Position of this node in the breadth-first listing
    pub index: usize,
    pub op: Op,
    pub length: Option<u32>,
    pub collapsible: bool,
    /// The memoized structural hash
    pub hash: u64,
    /// Operand summaries: `#i` for a node listed at index `i`, the value otherwise
    pub operands: Vec<String>,
}

impl fmt::Display for NodeInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "#{} {}({}) length={} hash={:016x}",
            self.index,
            self.op,
            self.operands.join(", "),
            self.length.map_or("-".to_string(), |l| l.to_string()),
            self.hash,
        )?;
        if !self.collapsible {
            write!(f, " pinned")?;
        }
        Ok(())
    }
}

/// Every distinct node reachable from a root, breadth-first.
#[derive(Debug, Clone)]
pub struct AstTree {
    pub nodes: Vec<NodeInfo>,
}

impl AstTree {
    pub fn root(&self) -> Option<&NodeInfo> {
        self.nodes.first()
    }
}

impl fmt::Display for AstTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "AST (size={}):", self.nodes.len())?;
        for node in &self.nodes {
            writeln!(f, "  {}", node)?;
        }
        Ok(())
    }
}

impl Engine {
    /// Lists every distinct node reachable from `root` in BFS order.
    ///
    /// Nodes shared between several parents are listed once.
    pub fn debug_tree(&self, root: &AstRef) -> AstTree {
        let mut index: HashMap<*const Ast, usize> = HashMap::new();
        let mut order: Vec<&AstRef> = Vec::new();
        let mut queue: VecDeque<&AstRef> = VecDeque::from([root]);

        while let Some(node) = queue.pop_front() {
            let key = Arc::as_ptr(node);
            if index.contains_key(&key) {
                continue;
            }
            index.insert(key, order.len());
            order.push(node);
            queue.extend(node.children());
        }

        let nodes = order
            .iter()
            .enumerate()
            .map(|(i, node)| NodeInfo {
                index: i,
                op: node.op(),
                length: node.length(),
                collapsible: node.collapsible(),
                hash: node.hash_value(),
                operands: node
                    .args()
                    .iter()
                    .map(|arg| match arg.as_ast().and_then(|a| index.get(&Arc::as_ptr(a))) {
                        Some(j) => format!("#{}", j),
                        None => match arg {
                            Arg::Expr(e) => e.node().to_string(),
                            other => other.to_string(),
                        },
                    })
                    .collect(),
            })
            .collect();

        AstTree { nodes }
    }

    /// Compact multi-line dump of a tree.
    pub fn debug_string(&self, root: &AstRef) -> String {
        self.debug_tree(root).to_string()
    }
}

#[cfg(test)]
mod tests {
    use test_log::test;

    use super::*;
    use crate::value::Leaf;

    #[test]
    fn test_shared_nodes_listed_once() {
        let engine = Engine::default();
        let x = engine.mk_ast(Op::BitVec, vec!["x".into(), 8u32.into()]).unwrap();
        let sum = engine.mk_ast(Op::Add, vec![x.clone().into(), x.clone().into()]).unwrap();
        let root = engine.mk_ast(Op::Mul, vec![sum.into(), Leaf::bv(3, 8).into()]).unwrap();

        let tree = engine.debug_tree(&root);
        assert_eq!(tree.nodes.len(), 3);
        assert_eq!(tree.root().unwrap().op, Op::Mul);
        assert_eq!(tree.nodes[0].operands, vec!["#1".to_string(), "0x03#8".to_string()]);
        assert_eq!(tree.nodes[1].operands, vec!["#2".to_string(), "#2".to_string()]);
        assert_eq!(tree.nodes[2].op, Op::BitVec);
    }

    #[test]
    fn test_debug_string() {
        let engine = Engine::default();
        let x = engine.mk_ast(Op::BitVec, vec!["x".into(), 8u32.into()]).unwrap();
        let pinned = engine.mk_ast_with(Op::Neg, vec![x.into()], false).unwrap();
        let s = engine.debug_string(&pinned);
        assert!(s.starts_with("AST (size=2):"), "unexpected dump: {}", s);
        assert!(s.contains("Neg(#1) length=8"), "unexpected dump: {}", s);
        assert!(s.contains("pinned"), "unexpected dump: {}", s);
    }
}
