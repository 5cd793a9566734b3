//! The user-facing expression wrapper.
//!
//! An [`Expr`] holds either a tree or an already-folded value, together with
//! the metadata that construction threads through: free variables, the filter
//! chain, and the uninitialized flag.

use std::collections::BTreeSet;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use crate::ast::{Arg, AstRef};
use crate::engine::Engine;
use crate::error::{AstError, Result};
use crate::filter::Filter;
use crate::op::Sort;
use crate::value::Leaf;

/// What an [`Expr`] wraps. Never another wrapper.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ExprNode {
    Ast(AstRef),
    Leaf(Leaf),
}

impl ExprNode {
    /// Unwraps an operand; wrappers give up their node.
    pub fn from_arg(arg: Arg) -> Self {
        match arg {
            Arg::Ast(a) => ExprNode::Ast(a),
            Arg::Leaf(l) => ExprNode::Leaf(l),
            Arg::Expr(e) => e.node,
        }
    }

    pub fn to_arg(&self) -> Arg {
        match self {
            ExprNode::Ast(a) => Arg::Ast(a.clone()),
            ExprNode::Leaf(l) => Arg::Leaf(l.clone()),
        }
    }

    fn length(&self) -> Option<u32> {
        match self {
            ExprNode::Ast(a) => a.length(),
            ExprNode::Leaf(l) => l.size(),
        }
    }

    fn derived(&self) -> (BTreeSet<String>, bool) {
        match self {
            ExprNode::Ast(a) => (a.variables(), a.symbolic()),
            ExprNode::Leaf(_) => (BTreeSet::new(), false),
        }
    }
}

impl fmt::Display for ExprNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExprNode::Ast(a) => write!(f, "{}", a),
            ExprNode::Leaf(l) => write!(f, "{}", l),
        }
    }
}

#[derive(Clone)]
pub struct Expr {
    node: ExprNode,
    sort: Sort,
    length: Option<u32>,
    variables: BTreeSet<String>,
    symbolic: bool,
    filters: Vec<Arc<dyn Filter>>,
    uninitialized: bool,
}

impl Expr {
    pub fn new(node: ExprNode, sort: Sort) -> Self {
        let length = node.length();
        let (variables, symbolic) = node.derived();
        Self {
            node,
            sort,
            length,
            variables,
            symbolic,
            filters: Vec::new(),
            uninitialized: false,
        }
    }

    pub fn with_length(mut self, length: Option<u32>) -> Self {
        self.length = length;
        self
    }

    /// Records extra free variables that the tree itself does not declare.
    pub fn with_variables(mut self, extra: impl IntoIterator<Item = String>) -> Self {
        let before = self.variables.len();
        self.variables.extend(extra);
        self.symbolic |= self.variables.len() > before;
        self
    }

    pub fn with_filters(mut self, filters: Vec<Arc<dyn Filter>>) -> Self {
        self.filters = filters;
        self
    }

    pub fn with_uninitialized(mut self, uninitialized: bool) -> Self {
        self.uninitialized = uninitialized;
        self
    }

    /// Same metadata, different node.
    ///
    /// Variables derived from the old node are swapped for those of the new
    /// one; variables recorded on top of the tree are kept.
    pub fn with_node(&self, node: ExprNode) -> Self {
        let (old_derived, _) = self.node.derived();
        let (mut variables, symbolic) = node.derived();
        let derived = variables.len();
        variables.extend(self.variables.difference(&old_derived).cloned());
        let extra = variables.len() > derived;
        Self {
            length: node.length().or(self.length),
            node,
            sort: self.sort,
            variables,
            symbolic: symbolic || extra,
            filters: self.filters.clone(),
            uninitialized: self.uninitialized,
        }
    }
}

impl Expr {
    pub fn node(&self) -> &ExprNode {
        &self.node
    }

    /// Moves the tree out, leaving a placeholder value behind. Used on teardown.
    pub(crate) fn take_ast(&mut self) -> Option<AstRef> {
        match std::mem::replace(&mut self.node, ExprNode::Leaf(Leaf::Bool(false))) {
            ExprNode::Ast(a) => Some(a),
            leaf => {
                self.node = leaf;
                None
            }
        }
    }

    /// The underlying tree, unless the expression has been folded to a value.
    pub fn ast(&self) -> Option<&AstRef> {
        match &self.node {
            ExprNode::Ast(a) => Some(a),
            ExprNode::Leaf(_) => None,
        }
    }

    /// The backend-facing value, if the expression has been folded to one.
    pub fn model(&self) -> Option<&Leaf> {
        match &self.node {
            ExprNode::Leaf(l) => Some(l),
            ExprNode::Ast(_) => None,
        }
    }

    pub fn sort(&self) -> Sort {
        self.sort
    }

    pub fn size(&self) -> Option<u32> {
        self.length
    }

    pub fn variables(&self) -> &BTreeSet<String> {
        &self.variables
    }

    pub fn symbolic(&self) -> bool {
        self.symbolic
    }

    pub fn filters(&self) -> &[Arc<dyn Filter>] {
        &self.filters
    }

    pub fn is_uninitialized(&self) -> bool {
        self.uninitialized
    }

    pub(crate) fn same_metadata(&self, other: &Self) -> bool {
        self.sort == other.sort
            && self.length == other.length
            && self.variables == other.variables
            && self.symbolic == other.symbolic
            && self.uninitialized == other.uninitialized
    }
}

impl Expr {
    /// Substitutes `new` for every subterm structurally equal to `old`.
    ///
    /// Returns the rewritten expression and whether anything was replaced.
    pub fn replace(&self, engine: &Engine, old: &Expr, new: &Expr) -> Result<(Expr, bool)> {
        let old = old
            .ast()
            .ok_or_else(|| AstError::operation("replace target must be a tree"))?;
        match &self.node {
            ExprNode::Leaf(_) => Ok((self.clone(), false)),
            ExprNode::Ast(ast) => {
                let (arg, replaced) = engine.replace(ast, old, &Arg::Expr(new.clone()))?;
                if !replaced {
                    return Ok((self.clone(), false));
                }
                Ok((self.with_node(ExprNode::from_arg(arg)), true))
            }
        }
    }
}

impl PartialEq for Expr {
    fn eq(&self, other: &Self) -> bool {
        self.same_metadata(other) && self.node == other.node
    }
}

impl Eq for Expr {}

impl Hash for Expr {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.node.hash(state);
    }
}

impl fmt::Debug for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Expr")
            .field("node", &self.node)
            .field("sort", &self.sort)
            .field("length", &self.length)
            .field("variables", &self.variables)
            .field("filters", &self.filters.len())
            .field("uninitialized", &self.uninitialized)
            .finish()
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{} {}>", self.sort, self.node)
    }
}
