//! Pluggable evaluators.
//!
//! A [`Backend`] interprets some subset of operations into [`Leaf`] values.
//! Declining a node is the normal way to say "not mine": resolution then moves
//! on to the next backend, and finally falls back to the tree itself.

pub mod concrete;
pub mod vsa;

use crate::ast::Ast;
use crate::engine::Engine;
use crate::error::BackendError;
use crate::expr::{Expr, ExprNode};
use crate::resolve::ResolveContext;
use crate::value::Leaf;

pub use self::concrete::ConcreteBackend;
pub use self::vsa::IntervalBackend;

pub trait Backend: Send + Sync {
    /// Key of this backend in a [`ResolveContext`].
    fn name(&self) -> &str;

    /// Evaluates a node.
    fn call(&self, engine: &Engine, ast: &Ast, ctx: Option<&mut ResolveContext>) -> Result<Leaf, BackendError>;

    /// Answers the single-leaf size probe.
    fn size(&self, _leaf: &Leaf) -> Option<u32> {
        None
    }

    /// Folds an expression into this backend's value, if it can.
    fn convert(&self, engine: &Engine, expr: Expr) -> Result<Expr, BackendError> {
        match expr.node() {
            ExprNode::Leaf(_) => Ok(expr),
            ExprNode::Ast(ast) => {
                let value = engine.resolve_backend(self, ast, None)?;
                Ok(expr.with_node(ExprNode::Leaf(value)))
            }
        }
    }
}
