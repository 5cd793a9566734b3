//! The engine: owner of backends, the operator registry, and node identity.
//!
//! All node operations go through an [`Engine`]. Nodes built by one engine
//! carry its namespace in their hash, so trees from different engines never
//! compare equal.
//!
//! ```
//! use symast::engine::Engine;
//! use symast::value::Leaf;
//!
//! let engine = Engine::default();
//! let v = engine.concat(&[&engine.bvv(5, 8).unwrap(), &engine.bvv(3, 8).unwrap()]).unwrap();
//! assert_eq!(v.model(), Some(&Leaf::bv(0x0503, 16)));
//! ```

use std::fmt;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::Arc;

use log::debug;
use num_bigint::BigInt;
use num_traits::ToPrimitive;

use crate::ast::{Arg, Ast, AstRef};
use crate::backend::{Backend, ConcreteBackend, IntervalBackend};
use crate::error::{AstError, Result};
use crate::expr::Expr;
use crate::op::Op;
use crate::registry::{Outcome, Registry};
use crate::value::{FloatValue, Leaf};

static NEXT_NAMESPACE: AtomicU32 = AtomicU32::new(1);

pub struct Engine {
    name: String,
    namespace: u32,
    backends: Vec<Box<dyn Backend>>,
    registry: Arc<Registry>,
    union_counter: Arc<AtomicU64>,
}

pub struct EngineBuilder {
    name: String,
    backends: Vec<Box<dyn Backend>>,
    registry: Option<Arc<Registry>>,
    union_counter: Option<Arc<AtomicU64>>,
}

impl EngineBuilder {
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Appends a backend. Backends are consulted in the order they were added.
    pub fn backend(mut self, backend: impl Backend + 'static) -> Self {
        self.backends.push(Box::new(backend));
        self
    }

    pub fn registry(mut self, registry: Arc<Registry>) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Shares a union-name counter, e.g. between engines that must not mint the same name twice.
    pub fn union_counter(mut self, counter: Arc<AtomicU64>) -> Self {
        self.union_counter = Some(counter);
        self
    }

    pub fn build(self) -> Engine {
        let namespace = NEXT_NAMESPACE.fetch_add(1, Ordering::Relaxed);
        debug!("new engine '{}' (namespace = {})", self.name, namespace);
        Engine {
            name: self.name,
            namespace,
            backends: self.backends,
            registry: self.registry.unwrap_or_else(Registry::standard),
            union_counter: self.union_counter.unwrap_or_default(),
        }
    }
}

impl Engine {
    pub fn builder() -> EngineBuilder {
        EngineBuilder {
            name: "default".to_string(),
            backends: Vec::new(),
            registry: None,
            union_counter: None,
        }
    }
}

impl Default for Engine {
    /// Concrete evaluation first, then intervals.
    fn default() -> Self {
        Engine::builder()
            .backend(ConcreteBackend)
            .backend(IntervalBackend)
            .build()
    }
}

impl fmt::Debug for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Engine")
            .field("name", &self.name)
            .field("namespace", &self.namespace)
            .field("backends", &self.backends.iter().map(|b| b.name()).collect::<Vec<_>>())
            .field("registry", &self.registry.len())
            .finish()
    }
}

impl Engine {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn namespace(&self) -> u32 {
        self.namespace
    }

    pub fn backends(&self) -> &[Box<dyn Backend>] {
        &self.backends
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Mints a fresh implicit variable name for a set union.
    pub fn next_union_name(&self) -> String {
        format!("union_{}", self.union_counter.fetch_add(1, Ordering::Relaxed))
    }
}

// Node construction
impl Engine {
    pub fn mk_ast(&self, op: Op, args: Vec<Arg>) -> Result<AstRef> {
        debug!("mk(op = {}, args = {})", op, args.len());
        Ast::new(self, op, args, None).map(Arc::new)
    }

    pub fn mk_ast_with(&self, op: Op, args: Vec<Arg>, collapsible: bool) -> Result<AstRef> {
        debug!("mk(op = {}, args = {}, collapsible = {})", op, args.len(), collapsible);
        Ast::new(self, op, args, Some(collapsible)).map(Arc::new)
    }

    /// Bit-length of an operand.
    ///
    /// Wrappers and nodes know their own length; a plain leaf is probed
    /// through each backend in turn.
    pub fn arg_size(&self, arg: &Arg) -> Option<u32> {
        match arg {
            Arg::Expr(e) => e.size(),
            Arg::Ast(a) => a.length(),
            Arg::Leaf(leaf) => {
                let probe = Ast::staged(self, Op::Size, vec![Arg::Leaf(leaf.clone())]);
                self.backends.iter().find_map(|b| match b.call(self, &probe, None) {
                    Ok(Leaf::Int(n)) => n.to_u32(),
                    _ => None,
                })
            }
        }
    }
}

// Negotiated construction
impl Engine {
    /// Builds `op(lhs, rhs)`, retrying as `opposite(op)(rhs, lhs)`.
    pub fn apply(&self, op: Op, lhs: Arg, rhs: Arg) -> Result<Expr> {
        if let Outcome::Built(e) = self.build(op, vec![lhs.clone(), rhs.clone()])? {
            return Ok(e);
        }
        let opposite = op.opposite();
        if let Some(opp) = opposite {
            debug!("apply: {} unsupported, retrying as {}", op, opp);
            if let Outcome::Built(e) = self.build(opp, vec![rhs, lhs])? {
                return Ok(e);
            }
        }
        Err(AstError::Unsupported { op, opposite })
    }

    /// Builds `op(args)`, treating an unsupported outcome as an error.
    pub fn construct(&self, op: Op, args: Vec<Arg>) -> Result<Expr> {
        match self.build(op, args)? {
            Outcome::Built(e) => Ok(e),
            Outcome::Unsupported => Err(AstError::Unsupported { op, opposite: None }),
        }
    }
}

// Convenience constructors
impl Engine {
    pub fn bvv(&self, value: i64, width: u32) -> Result<Expr> {
        self.construct(Op::BitVecVal, vec![value.into(), width.into()])
    }

    pub fn bvv_big(&self, value: &BigInt, width: u32) -> Result<Expr> {
        self.construct(Op::BitVecVal, vec![Leaf::Int(value.clone()).into(), width.into()])
    }

    pub fn bvs(&self, name: &str, width: u32) -> Result<Expr> {
        self.construct(Op::BitVec, vec![name.into(), width.into()])
    }

    pub fn bool_val(&self, value: bool) -> Result<Expr> {
        self.construct(Op::BoolVal, vec![value.into()])
    }

    pub fn bool_sym(&self, name: &str) -> Result<Expr> {
        self.construct(Op::BoolSym, vec![name.into()])
    }

    pub fn fpv(&self, value: f64, width: u32) -> Result<Expr> {
        if width != 32 && width != 64 {
            return Err(AstError::operation(format!("FpVal width must be 32 or 64, got {}", width)));
        }
        self.construct(
            Op::FpVal,
            vec![Leaf::Float(FloatValue::from_f64(value, width)).into(), width.into()],
        )
    }

    pub fn fps(&self, name: &str, width: u32) -> Result<Expr> {
        self.construct(Op::FpSym, vec![name.into(), width.into()])
    }

    pub fn si(&self, bits: u32, stride: u64, lower: u64, upper: u64) -> Result<Expr> {
        let int = |v: u64| Arg::Leaf(Leaf::Int(BigInt::from(v)));
        self.construct(
            Op::StridedInterval,
            vec![bits.into(), int(stride), int(lower), int(upper)],
        )
    }

    pub fn top_si(&self, bits: u32) -> Result<Expr> {
        self.construct(Op::TopStridedInterval, vec![bits.into()])
    }

    pub fn extract(&self, high: u32, low: u32, source: &Expr) -> Result<Expr> {
        self.construct(Op::Extract, vec![high.into(), low.into(), source.into()])
    }

    pub fn zero_ext(&self, extra: u32, source: &Expr) -> Result<Expr> {
        self.construct(Op::ZeroExt, vec![extra.into(), source.into()])
    }

    pub fn sign_ext(&self, extra: u32, source: &Expr) -> Result<Expr> {
        self.construct(Op::SignExt, vec![extra.into(), source.into()])
    }

    pub fn concat(&self, parts: &[&Expr]) -> Result<Expr> {
        self.construct(Op::Concat, parts.iter().map(|&e| e.into()).collect())
    }

    pub fn ite(&self, cond: &Expr, then: &Expr, otherwise: &Expr) -> Result<Expr> {
        self.construct(Op::If, vec![cond.into(), then.into(), otherwise.into()])
    }

    pub fn reverse(&self, value: &Expr) -> Result<Expr> {
        self.construct(Op::Reverse, vec![value.into()])
    }
}

#[cfg(test)]
mod tests {
    use test_log::test;

    use super::*;

    #[test]
    fn test_namespaces_are_distinct() {
        let a = Engine::default();
        let b = Engine::default();
        assert_ne!(a.namespace(), b.namespace());
    }

    #[test]
    fn test_union_counter_is_shared() {
        let counter = Arc::new(AtomicU64::new(40));
        let a = Engine::builder().union_counter(counter.clone()).build();
        let b = Engine::builder().union_counter(counter).build();
        assert_eq!(a.next_union_name(), "union_40");
        assert_eq!(b.next_union_name(), "union_41");
        assert_eq!(a.next_union_name(), "union_42");
    }

    #[test]
    fn test_arg_size_probes_backends() {
        let engine = Engine::default();
        assert_eq!(engine.arg_size(&Leaf::bv(0, 12).into()), Some(12));
        assert_eq!(engine.arg_size(&Leaf::int(12).into()), None);
        let bare = Engine::builder().build();
        assert_eq!(bare.arg_size(&Leaf::bv(0, 12).into()), None);
    }

    #[test]
    fn test_apply_coerces_integers() {
        let engine = Engine::default();
        let x = engine.bvs("x", 16).unwrap();
        let e = engine.apply(Op::Add, Leaf::int(1).into(), (&x).into()).unwrap();
        assert_eq!(e.size(), Some(16));
        let ast = e.ast().unwrap();
        assert_eq!(ast.op(), Op::Add);
        assert_eq!(ast.args()[0].as_leaf(), Some(&Leaf::bv(1, 16)));
    }

    #[test]
    fn test_apply_unsupported() {
        let engine = Engine::default();
        let x = engine.bvs("x", 16).unwrap();
        let err = engine.apply(Op::Sub, "name".into(), (&x).into()).unwrap_err();
        assert_eq!(
            err,
            AstError::Unsupported {
                op: Op::Sub,
                opposite: Some(Op::RSub)
            }
        );
    }

    #[test]
    fn test_fpv_width() {
        let engine = Engine::default();
        assert_eq!(engine.fpv(1.0, 32).unwrap().size(), Some(32));
        assert!(engine.fpv(1.0, 16).is_err());
    }
}
