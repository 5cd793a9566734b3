//! Resolution of trees through the backend list.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use log::debug;

use crate::ast::{Arg, Ast, AstRef};
use crate::backend::Backend;
use crate::engine::Engine;
use crate::error::BackendError;
use crate::value::Leaf;

/// Per-batch memo of resolved nodes, one map per backend.
///
/// Owned by the caller and passed explicitly; drop it when the batch is done.
/// Nodes a backend declined are remembered too, so they are not retried.
#[derive(Debug, Default, Clone)]
pub struct ResolveContext {
    resolve_cache: HashMap<String, HashMap<AstRef, Leaf>>,
    declined: HashMap<String, HashMap<AstRef, BackendError>>,
}

impl ResolveContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, backend: &str, ast: &AstRef) -> Option<&Leaf> {
        self.resolve_cache.get(backend)?.get(ast)
    }

    pub fn insert(&mut self, backend: &str, ast: AstRef, value: Leaf) {
        self.resolve_cache
            .entry(backend.to_string())
            .or_default()
            .insert(ast, value);
    }

    pub fn declined(&self, backend: &str, ast: &AstRef) -> Option<&BackendError> {
        self.declined.get(backend)?.get(ast)
    }

    fn decline(&mut self, backend: &str, ast: AstRef, err: BackendError) {
        self.declined.entry(backend.to_string()).or_default().insert(ast, err);
    }

    fn is_known(&self, backend: &str, ast: &AstRef) -> bool {
        self.get(backend, ast).is_some() || self.declined(backend, ast).is_some()
    }

    /// Number of resolved entries across all backends.
    pub fn len(&self) -> usize {
        self.resolve_cache.values().map(HashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&mut self) {
        self.resolve_cache.clear();
        self.declined.clear();
    }
}

impl Engine {
    /// Resolves `ast` with one backend, consulting and filling the memo if given.
    ///
    /// Operands are evaluated bottom-up before their parents, so a backend
    /// that resolves operands through [`Engine::resolve_arg`] finds them in
    /// the memo and never recurses more than one level, however deep the tree.
    /// Without a caller memo a temporary one is used for this call only.
    pub fn resolve_backend<B: Backend + ?Sized>(
        &self,
        backend: &B,
        ast: &AstRef,
        ctx: Option<&mut ResolveContext>,
    ) -> Result<Leaf, BackendError> {
        match ctx {
            Some(ctx) => self.resolve_memoized(backend, ast, ctx),
            None => self.resolve_memoized(backend, ast, &mut ResolveContext::new()),
        }
    }

    fn resolve_memoized<B: Backend + ?Sized>(
        &self,
        backend: &B,
        ast: &AstRef,
        ctx: &mut ResolveContext,
    ) -> Result<Leaf, BackendError> {
        let name = backend.name();
        if let Some(value) = ctx.get(name, ast) {
            return Ok(value.clone());
        }
        if let Some(err) = ctx.declined(name, ast) {
            return Err(err.clone());
        }
        for node in pending_operands(name, ast, ctx) {
            // A declined operand is only fatal if its parent needs it.
            let _ = self.evaluate(backend, &node, ctx);
        }
        self.evaluate(backend, ast, ctx)
    }

    fn evaluate<B: Backend + ?Sized>(
        &self,
        backend: &B,
        ast: &AstRef,
        ctx: &mut ResolveContext,
    ) -> Result<Leaf, BackendError> {
        let result = backend.call(self, ast, Some(&mut *ctx));
        match &result {
            Ok(value) => ctx.insert(backend.name(), ast.clone(), value.clone()),
            Err(err) => ctx.decline(backend.name(), ast.clone(), err.clone()),
        }
        result
    }

    /// Resolves `ast` with the first backend that accepts it.
    ///
    /// Never fails: if every backend declines, the tree itself is returned.
    pub fn resolve(&self, ast: &AstRef, mut ctx: Option<&mut ResolveContext>) -> Arg {
        for backend in self.backends() {
            match self.resolve_backend(backend.as_ref(), ast, ctx.as_deref_mut()) {
                Ok(value) => return Arg::Leaf(value),
                Err(err) => debug!("resolve: backend {} declined {}: {}", backend.name(), ast, err),
            }
        }
        Arg::Ast(ast.clone())
    }

    /// Value of one operand under a given backend.
    pub(crate) fn resolve_arg<B: Backend + ?Sized>(
        &self,
        backend: &B,
        arg: &Arg,
        ctx: Option<&mut ResolveContext>,
    ) -> Result<Leaf, BackendError> {
        if let Some(leaf) = arg.as_leaf() {
            return Ok(leaf.clone());
        }
        match arg.as_ast() {
            Some(ast) => self.resolve_backend(backend, ast, ctx),
            None => Err(BackendError::failed(format!("operand {} has no value", arg))),
        }
    }
}

/// Distinct tree operands below `root` not yet in the memo, children before parents.
fn pending_operands(backend: &str, root: &AstRef, ctx: &ResolveContext) -> Vec<AstRef> {
    let mut order = Vec::new();
    let mut seen: HashSet<*const Ast> = HashSet::new();
    let mut stack: Vec<(&AstRef, bool)> = root.children().map(|c| (c, false)).collect();
    while let Some((node, expanded)) = stack.pop() {
        if expanded {
            order.push(node.clone());
            continue;
        }
        if !seen.insert(Arc::as_ptr(node)) || ctx.is_known(backend, node) {
            continue;
        }
        stack.push((node, true));
        stack.extend(node.children().map(|c| (c, false)));
    }
    order
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use test_log::test;

    use super::*;
    use crate::ast::Ast;
    use crate::backend::ConcreteBackend;
    use crate::op::Op;

    /// Declines everything.
    struct Nothing;

    impl Backend for Nothing {
        fn name(&self) -> &str {
            "nothing"
        }

        fn call(&self, _: &Engine, ast: &Ast, _: Option<&mut ResolveContext>) -> Result<Leaf, BackendError> {
            Err(BackendError::Unsupported(ast.op()))
        }
    }

    /// Answers every node with `true`, counting calls.
    struct Counting(Arc<AtomicUsize>);

    impl Backend for Counting {
        fn name(&self) -> &str {
            "counting"
        }

        fn call(&self, _: &Engine, _: &Ast, _: Option<&mut ResolveContext>) -> Result<Leaf, BackendError> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(Leaf::Bool(true))
        }
    }

    #[test]
    fn test_all_backends_decline() {
        let engine = Engine::builder().backend(Nothing).backend(Nothing).build();
        let node = engine.mk_ast(Op::BoolSym, vec!["c".into()]).unwrap();
        assert_eq!(engine.resolve(&node, None), Arg::Ast(node.clone()));
    }

    #[test]
    fn test_priority_order_and_cache() {
        let calls = Arc::new(AtomicUsize::new(0));
        let engine = Engine::builder()
            .backend(Nothing)
            .backend(Counting(calls.clone()))
            .build();
        let node = engine.mk_ast(Op::BoolSym, vec!["c".into()]).unwrap();

        let mut ctx = ResolveContext::new();
        assert_eq!(engine.resolve(&node, Some(&mut ctx)), Arg::Leaf(Leaf::Bool(true)));
        assert_eq!(engine.resolve(&node, Some(&mut ctx)), Arg::Leaf(Leaf::Bool(true)));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(ctx.len(), 1);
        assert!(ctx.get("counting", &node).is_some());
        assert!(ctx.get("nothing", &node).is_none());

        engine.resolve(&node, None);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_deep_chain_resolves_without_recursion() {
        let engine = Engine::default();
        let mut node = engine.mk_ast(Op::BitVecVal, vec![0i64.into(), 8u32.into()]).unwrap();
        for _ in 0..50_000 {
            node = engine.mk_ast(Op::Add, vec![node.into(), Leaf::bv(1, 8).into()]).unwrap();
        }
        // 50_000 mod 256
        assert_eq!(engine.resolve(&node, None), Arg::Leaf(Leaf::bv(80, 8)));
    }

    #[test]
    fn test_declined_operands_are_remembered() {
        let engine = Engine::default();
        let f = engine.mk_ast(Op::FpSym, vec!["f".into(), 32u32.into()]).unwrap();
        let neg = engine.mk_ast(Op::FpNeg, vec![f.clone().into()]).unwrap();
        let mut ctx = ResolveContext::new();
        assert!(engine.resolve_backend(&ConcreteBackend, &neg, Some(&mut ctx)).is_err());
        assert!(ctx.declined("concrete", &f).is_some());
        assert!(ctx.declined("concrete", &neg).is_some());
        assert!(ctx.is_empty());
    }
}
