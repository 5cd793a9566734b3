//! The expression-tree node.
//!
//! An [`Ast`] is an operation applied to a fixed-order list of operands. Nodes
//! are immutable once built: every edit produces a new node that shares the
//! unchanged subtrees through [`AstRef`] (`Arc<Ast>`).
//!
//! Construction runs a per-operation *finalizer* (see [`Finalizer`]) that
//! validates the operands and infers the bit-length of the result. Nodes are
//! normally created through [`Engine::mk_ast`][crate::engine::Engine::mk_ast],
//! which owns the backends consulted when an operand's length must be probed.

use std::collections::hash_map::DefaultHasher;
use std::collections::{BTreeSet, HashSet};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, OnceLock};

use num_traits::ToPrimitive;

use crate::engine::Engine;
use crate::error::{AstError, Result};
use crate::expr::{Expr, ExprNode};
use crate::op::{Finalizer, Op};
use crate::value::{BitVecValue, Leaf};

pub type AstRef = Arc<Ast>;

/// An operand of a node.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Arg {
    Ast(AstRef),
    Expr(Expr),
    Leaf(Leaf),
}

impl Arg {
    /// Tree view: the node behind this operand, looking through wrappers.
    pub fn as_ast(&self) -> Option<&AstRef> {
        match self {
            Arg::Ast(a) => Some(a),
            Arg::Expr(e) => e.ast(),
            Arg::Leaf(_) => None,
        }
    }

    /// Model view: the plain value behind this operand, looking through wrappers.
    pub fn as_leaf(&self) -> Option<&Leaf> {
        match self {
            Arg::Leaf(l) => Some(l),
            Arg::Expr(e) => e.model(),
            Arg::Ast(_) => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Arg::Leaf(Leaf::Int(i)) => i.to_i64(),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Arg::Leaf(Leaf::Str(s)) => Some(s),
            _ => None,
        }
    }

    /// Strips a wrapper, leaving the node or leaf it holds.
    pub fn raw(&self) -> Arg {
        match self {
            Arg::Expr(e) => e.node().to_arg(),
            other => other.clone(),
        }
    }
}

impl From<AstRef> for Arg {
    fn from(value: AstRef) -> Self {
        Arg::Ast(value)
    }
}

impl From<Expr> for Arg {
    fn from(value: Expr) -> Self {
        Arg::Expr(value)
    }
}

impl From<&Expr> for Arg {
    fn from(value: &Expr) -> Self {
        Arg::Expr(value.clone())
    }
}

impl From<Leaf> for Arg {
    fn from(value: Leaf) -> Self {
        Arg::Leaf(value)
    }
}

impl From<i64> for Arg {
    fn from(value: i64) -> Self {
        Arg::Leaf(Leaf::from(value))
    }
}

impl From<u32> for Arg {
    fn from(value: u32) -> Self {
        Arg::Leaf(Leaf::from(value))
    }
}

impl From<bool> for Arg {
    fn from(value: bool) -> Self {
        Arg::Leaf(Leaf::Bool(value))
    }
}

impl From<&str> for Arg {
    fn from(value: &str) -> Self {
        Arg::Leaf(Leaf::from(value))
    }
}

pub struct Ast {
    op: Op,
    args: Box<[Arg]>,
    length: Option<u32>,
    collapsible: bool,
    namespace: u32,
    hash: OnceLock<u64>,
}

impl Ast {
    /// Builds and finalizes a node.
    ///
    /// `collapsible` defaults to `true`; a node is never collapsible if any of
    /// its tree operands is not.
    pub(crate) fn new(engine: &Engine, op: Op, args: Vec<Arg>, collapsible: Option<bool>) -> Result<Self> {
        let length = finalize(engine, op, &args)?;
        let collapsible = collapsible.unwrap_or(true) && args.iter().all(|a| a.as_ast().map_or(true, |t| t.collapsible));
        Ok(Self {
            op,
            args: args.into_boxed_slice(),
            length,
            collapsible,
            namespace: engine.namespace(),
            hash: OnceLock::new(),
        })
    }

    /// Builds a node without finalization. Only used for backend probes.
    pub(crate) fn staged(engine: &Engine, op: Op, args: Vec<Arg>) -> Self {
        Self {
            op,
            args: args.into_boxed_slice(),
            length: None,
            collapsible: true,
            namespace: engine.namespace(),
            hash: OnceLock::new(),
        }
    }
}

impl Ast {
    pub fn op(&self) -> Op {
        self.op
    }

    pub fn args(&self) -> &[Arg] {
        &self.args
    }

    pub fn arg(&self, index: usize) -> Option<&Arg> {
        self.args.get(index)
    }

    pub fn length(&self) -> Option<u32> {
        self.length
    }

    pub fn collapsible(&self) -> bool {
        self.collapsible
    }

    pub fn namespace(&self) -> u32 {
        self.namespace
    }

    /// Operands with wrappers stripped.
    pub fn raw_asts(&self) -> Vec<Arg> {
        self.args.iter().map(Arg::raw).collect()
    }

    /// Plain values of the operands; `None` where an operand is a tree.
    pub fn raw_models(&self) -> Vec<Option<&Leaf>> {
        self.args.iter().map(Arg::as_leaf).collect()
    }

    /// Direct child nodes, looking through wrappers.
    pub fn children(&self) -> impl Iterator<Item = &AstRef> {
        self.args.iter().filter_map(Arg::as_ast)
    }
}

// Finalization

fn int_operand(op: Op, args: &[Arg], index: usize) -> Result<i64> {
    args.get(index)
        .and_then(Arg::as_int)
        .ok_or_else(|| AstError::operation(format!("{} operand {} must be an integer", op, index)))
}

fn str_operand<'a>(op: Op, args: &'a [Arg], index: usize) -> Result<&'a str> {
    args.get(index)
        .and_then(Arg::as_str)
        .ok_or_else(|| AstError::operation(format!("{} operand {} must be a string", op, index)))
}

fn expect_arity(op: Op, args: &[Arg], n: usize) -> Result<()> {
    if args.len() != n {
        return Err(AstError::operation(format!(
            "{} takes {} operands, got {}",
            op,
            n,
            args.len()
        )));
    }
    Ok(())
}

fn positive_width(op: Op, width: i64) -> Result<u32> {
    if width <= 0 {
        return Err(AstError::operation(format!("{} width must be positive, got {}", op, width)));
    }
    checked_length(width)
}

fn checked_length(length: i64) -> Result<u32> {
    if length < 0 {
        return Err(AstError::operation("length is negative"));
    }
    u32::try_from(length).map_err(|_| AstError::operation(format!("length {} is too large", length)))
}

fn sized_operand(engine: &Engine, op: Op, arg: &Arg) -> Result<u32> {
    engine
        .arg_size(arg)
        .ok_or_else(|| AstError::operation(format!("{} operand {} has no length", op, arg)))
}

/// Validates the operands of `op` and returns the length of the result.
fn finalize(engine: &Engine, op: Op, args: &[Arg]) -> Result<Option<u32>> {
    match op.finalizer() {
        Finalizer::Identical => Ok(Some(0)),

        Finalizer::BoolVal => {
            expect_arity(op, args, 1)?;
            match args[0].as_leaf() {
                Some(Leaf::Bool(_)) => Ok(None),
                _ => Err(AstError::operation("BoolVal operand must be true or false")),
            }
        }

        Finalizer::BoolSym => {
            expect_arity(op, args, 1)?;
            str_operand(op, args, 0)?;
            Ok(None)
        }

        Finalizer::BitVec => {
            expect_arity(op, args, 2)?;
            str_operand(op, args, 0)?;
            positive_width(op, int_operand(op, args, 1)?).map(Some)
        }

        Finalizer::BitVecVal => {
            expect_arity(op, args, 2)?;
            // The value may exceed i64, so it is not read through `int_operand`.
            if !matches!(args[0], Arg::Leaf(Leaf::Int(_))) {
                return Err(AstError::operation("BitVecVal value must be an integer"));
            }
            positive_width(op, int_operand(op, args, 1)?).map(Some)
        }

        Finalizer::FpLeaf => {
            expect_arity(op, args, 2)?;
            match int_operand(op, args, 1)? {
                w @ (32 | 64) => Ok(Some(w as u32)),
                w => Err(AstError::operation(format!("{} width must be 32 or 64, got {}", op, w))),
            }
        }

        Finalizer::If => {
            expect_arity(op, args, 3)?;
            if engine.arg_size(&args[0]).is_some() {
                return Err(AstError::operation("If condition must be a boolean"));
            }
            // Unsized cases take the length of the sized one.
            let lengths: BTreeSet<u32> = args[1..].iter().filter_map(|a| engine.arg_size(a)).collect();
            if lengths.len() != 1 {
                return Err(AstError::operation(format!(
                    "If cases must have exactly one length, got {:?}",
                    lengths
                )));
            }
            Ok(lengths.into_iter().next())
        }

        Finalizer::Concat => {
            if args.len() < 2 {
                return Err(AstError::operation(format!("{} takes at least two operands", op)));
            }
            let mut total: i64 = 0;
            for a in args {
                total += sized_operand(engine, op, a)? as i64;
            }
            checked_length(total).map(Some)
        }

        Finalizer::Extract => {
            expect_arity(op, args, 3)?;
            let high = int_operand(op, args, 0)?;
            let low = int_operand(op, args, 1)?;
            let size = sized_operand(engine, op, &args[2])? as i64;
            if low < 0 {
                return Err(AstError::operation("Extract low bit is negative"));
            }
            let length = high
                .checked_sub(low)
                .and_then(|d| d.checked_add(1))
                .ok_or_else(|| AstError::operation(format!("Extract({}, {}) overflows", high, low)))?;
            if length <= 0 {
                return Err(AstError::operation(format!("Extract({}, {}) has non-positive length", high, low)));
            }
            if high >= size || low >= size {
                return Err(AstError::operation(format!(
                    "Extract({}, {}) is out of range for a {}-bit operand",
                    high, low, size
                )));
            }
            if length > size {
                return Err(AstError::operation("Extract is longer than its operand"));
            }
            checked_length(length).map(Some)
        }

        Finalizer::Extend => {
            expect_arity(op, args, 2)?;
            let extra = int_operand(op, args, 0)?;
            if extra < 0 {
                return Err(AstError::operation(format!("{} amount is negative", op)));
            }
            let size = sized_operand(engine, op, &args[1])? as i64;
            let length = size
                .checked_add(extra)
                .ok_or_else(|| AstError::operation(format!("{} by {} overflows", op, extra)))?;
            checked_length(length).map(Some)
        }

        Finalizer::FpConvert => {
            expect_arity(op, args, 2)?;
            sized_operand(engine, op, &args[0])?;
            positive_width(op, int_operand(op, args, 1)?).map(Some)
        }

        Finalizer::TopInterval => {
            expect_arity(op, args, 1)?;
            positive_width(op, int_operand(op, args, 0)?).map(Some)
        }

        Finalizer::Interval => {
            expect_arity(op, args, 4)?;
            for i in 1..4 {
                if int_operand(op, args, i)? < 0 {
                    return Err(AstError::operation(format!("{} bounds must be non-negative", op)));
                }
            }
            positive_width(op, int_operand(op, args, 0)?).map(Some)
        }

        Finalizer::AbstractLocation => {
            expect_arity(op, args, 2)?;
            str_operand(op, args, 0)?;
            positive_width(op, int_operand(op, args, 1)?).map(Some)
        }

        Finalizer::SameLength => {
            let lengths: BTreeSet<u32> = args.iter().filter_map(|a| engine.arg_size(a)).collect();
            if lengths.len() != 1 {
                return Err(AstError::operation(format!(
                    "{} operands must all have the same length, got {:?}",
                    op, lengths
                )));
            }
            Ok(lengths.into_iter().next())
        }

        Finalizer::NoLength => Ok(None),

        Finalizer::Staging => Err(AstError::operation(format!("{} is a staging operation", op))),
    }
}

// Hashing and equality

impl Ast {
    /// The memoized structural hash over `(op, args, namespace)`.
    pub fn hash_value(&self) -> u64 {
        if let Some(&h) = self.hash.get() {
            return h;
        }

        // Post-order over the nodes that are not memoized yet, so that
        // `compute_hash` always finds its children's hashes in place.
        let mut stack: Vec<(&Ast, bool)> = vec![(self, false)];
        while let Some((node, expanded)) = stack.pop() {
            if node.hash.get().is_some() {
                continue;
            }
            if expanded {
                let h = node.compute_hash();
                let _ = node.hash.set(h);
            } else {
                stack.push((node, true));
                for child in node.children() {
                    if child.hash.get().is_none() {
                        stack.push((child, false));
                    }
                }
            }
        }

        self.hash.get().copied().unwrap_or_else(|| self.compute_hash())
    }

    fn compute_hash(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.op.hash(&mut hasher);
        self.namespace.hash(&mut hasher);
        self.args.len().hash(&mut hasher);
        for arg in self.args.iter() {
            match arg {
                Arg::Ast(a) => {
                    0u8.hash(&mut hasher);
                    a.hash_value().hash(&mut hasher);
                }
                Arg::Expr(e) => {
                    1u8.hash(&mut hasher);
                    match e.node() {
                        ExprNode::Ast(a) => a.hash_value().hash(&mut hasher),
                        ExprNode::Leaf(l) => l.hash(&mut hasher),
                    }
                }
                Arg::Leaf(l) => {
                    2u8.hash(&mut hasher);
                    l.hash(&mut hasher);
                }
            }
        }
        hasher.finish()
    }
}

impl Hash for Ast {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.hash_value());
    }
}

/// Full structural equality, with the memoized hash as a pre-filter.
impl PartialEq for Ast {
    fn eq(&self, other: &Self) -> bool {
        let mut stack: Vec<(&Ast, &Ast)> = vec![(self, other)];
        while let Some((a, b)) = stack.pop() {
            if std::ptr::eq(a, b) {
                continue;
            }
            if a.op != b.op
                || a.namespace != b.namespace
                || a.length != b.length
                || a.args.len() != b.args.len()
                || a.hash_value() != b.hash_value()
            {
                return false;
            }
            for (x, y) in a.args.iter().zip(b.args.iter()) {
                match (x, y) {
                    (Arg::Ast(x), Arg::Ast(y)) => stack.push((x, y)),
                    (Arg::Leaf(x), Arg::Leaf(y)) => {
                        if x != y {
                            return false;
                        }
                    }
                    (Arg::Expr(x), Arg::Expr(y)) => {
                        if !x.same_metadata(y) {
                            return false;
                        }
                        match (x.node(), y.node()) {
                            (ExprNode::Ast(x), ExprNode::Ast(y)) => stack.push((x, y)),
                            (ExprNode::Leaf(x), ExprNode::Leaf(y)) => {
                                if x != y {
                                    return false;
                                }
                            }
                            _ => return false,
                        }
                    }
                    _ => return false,
                }
            }
        }
        true
    }
}

impl Eq for Ast {}

/// Tears down uniquely owned subtrees with an explicit stack.
impl Drop for Ast {
    fn drop(&mut self) {
        let mut stack = Vec::new();
        detach_subtrees(&mut self.args, &mut stack);
        while let Some(node) = stack.pop() {
            // Shared subtrees stay alive; only the last owner dismantles a node.
            if let Ok(mut inner) = Arc::try_unwrap(node) {
                detach_subtrees(&mut inner.args, &mut stack);
            }
        }
    }
}

fn detach_subtrees(args: &mut Box<[Arg]>, stack: &mut Vec<AstRef>) {
    for arg in std::mem::take(args).into_vec() {
        match arg {
            Arg::Ast(a) => stack.push(a),
            Arg::Expr(mut e) => stack.extend(e.take_ast()),
            Arg::Leaf(_) => {}
        }
    }
}

// Derived metadata

impl Ast {
    /// Free variables: symbol names declared in this tree plus the variables
    /// recorded on every wrapper operand.
    pub fn variables(&self) -> BTreeSet<String> {
        self.metadata().0
    }

    /// Whether the tree mentions any symbol.
    pub fn symbolic(&self) -> bool {
        self.metadata().1
    }

    fn metadata(&self) -> (BTreeSet<String>, bool) {
        let mut variables = BTreeSet::new();
        let mut symbolic = false;
        let mut visited: HashSet<*const Ast> = HashSet::new();
        let mut stack: Vec<&Ast> = vec![self];

        while let Some(node) = stack.pop() {
            if !visited.insert(node as *const Ast) {
                continue;
            }
            if node.op.is_symbol_creation() {
                symbolic = true;
                if let Some(name) = node.args.first().and_then(Arg::as_str) {
                    variables.insert(name.to_string());
                }
            }
            for arg in node.args.iter() {
                match arg {
                    Arg::Ast(a) => stack.push(a),
                    Arg::Expr(e) => {
                        variables.extend(e.variables().iter().cloned());
                        symbolic |= e.symbolic();
                    }
                    Arg::Leaf(_) => {}
                }
            }
        }

        (variables, symbolic)
    }
}

impl fmt::Display for Arg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arg::Ast(a) => write!(f, "{}", a),
            Arg::Expr(e) => write!(f, "{}", e),
            Arg::Leaf(l) => write!(f, "{}", l),
        }
    }
}

impl fmt::Display for Ast {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.op, &self.args[..]) {
            (Op::BitVec | Op::BoolSym | Op::FpSym, [name, ..]) => write!(f, "{}", name),
            (Op::BoolVal, [value]) => write!(f, "{}", value),
            (Op::BitVecVal, [value, width]) => match (value.as_leaf(), width.as_int()) {
                (Some(Leaf::Int(v)), Some(w)) if w > 0 => {
                    write!(f, "{}", BitVecValue::new(v, w as u32))
                }
                _ => write!(f, "BitVecVal({}, {})", value, width),
            },
            (Op::Concat, args) => {
                write!(f, "(")?;
                for (i, a) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, " .. ")?;
                    }
                    write!(f, "{}", a)?;
                }
                write!(f, ")")
            }
            (op, [lhs, rhs]) if op.infix().is_some() => {
                write!(f, "({} {} {})", lhs, op.infix().unwrap_or_default(), rhs)
            }
            (op, args) => {
                write!(f, "{}(", op)?;
                for (i, a) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", a)?;
                }
                write!(f, ")")
            }
        }
    }
}

impl fmt::Debug for Ast {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Ast")
            .field("op", &self.op)
            .field("length", &self.length)
            .field("collapsible", &self.collapsible)
            .field("repr", &self.to_string())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use test_log::test;

    use super::*;

    fn sym(engine: &Engine, name: &str, width: u32) -> AstRef {
        engine.mk_ast(Op::BitVec, vec![name.into(), width.into()]).unwrap()
    }

    #[test]
    fn test_extract_length() {
        let engine = Engine::default();
        let x = sym(&engine, "x", 32);
        let e = engine.mk_ast(Op::Extract, vec![7i64.into(), 0i64.into(), x.into()]).unwrap();
        assert_eq!(e.length(), Some(8));
    }

    #[test]
    fn test_extract_malformed() {
        let engine = Engine::default();
        let x = sym(&engine, "x", 32);
        for (h, l) in [(3, 5), (32, 0), (40, 35), (7, -1)] {
            let r = engine.mk_ast(Op::Extract, vec![Arg::from(h as i64), Arg::from(l as i64), x.clone().into()]);
            assert!(matches!(r, Err(AstError::Operation(_))), "Extract({}, {}) accepted", h, l);
        }
    }

    #[test]
    fn test_concat_length() {
        let engine = Engine::default();
        let a = sym(&engine, "a", 8);
        let b = sym(&engine, "b", 8);
        let c = sym(&engine, "c", 16);
        let n = engine.mk_ast(Op::Concat, vec![a.into(), b.into(), c.into()]).unwrap();
        assert_eq!(n.length(), Some(32));

        let single = engine.mk_ast(Op::Concat, vec![sym(&engine, "a", 8).into()]);
        assert!(single.is_err());
    }

    #[test]
    fn test_extend_length() {
        let engine = Engine::default();
        let x = sym(&engine, "x", 8);
        let n = engine.mk_ast(Op::ZeroExt, vec![24i64.into(), x.clone().into()]).unwrap();
        assert_eq!(n.length(), Some(32));
        assert!(engine.mk_ast(Op::SignExt, vec![(-1i64).into(), x.into()]).is_err());
    }

    #[test]
    fn test_symbol_width_must_be_positive() {
        let engine = Engine::default();
        assert!(engine.mk_ast(Op::BitVec, vec!["x".into(), 0i64.into()]).is_err());
        assert!(engine.mk_ast(Op::BitVec, vec!["x".into(), (-4i64).into()]).is_err());
        assert!(engine.mk_ast(Op::BitVecVal, vec![5i64.into(), 0i64.into()]).is_err());
    }

    #[test]
    fn test_if_lengths() {
        let engine = Engine::default();
        let c = engine.mk_ast(Op::BoolSym, vec!["c".into()]).unwrap();
        let a = sym(&engine, "a", 8);
        let b = sym(&engine, "b", 8);
        let w = sym(&engine, "w", 16);
        let ok = engine.mk_ast(Op::If, vec![c.clone().into(), a.clone().into(), b.into()]).unwrap();
        assert_eq!(ok.length(), Some(8));
        let bad = engine.mk_ast(Op::If, vec![c.clone().into(), a.clone().into(), w.into()]);
        assert!(matches!(bad, Err(AstError::Operation(_))));
        let sized_cond = engine.mk_ast(Op::If, vec![a.clone().into(), a.clone().into(), a.clone().into()]);
        assert!(sized_cond.is_err());

        // One unsized case takes the other case's length.
        let mixed = engine.mk_ast(Op::If, vec![c.clone().into(), a.into(), 7i64.into()]).unwrap();
        assert_eq!(mixed.length(), Some(8));

        // Two boolean cases leave no length to infer.
        let d = engine.mk_ast(Op::BoolSym, vec!["d".into()]).unwrap();
        let e = engine.mk_ast(Op::BoolSym, vec!["e".into()]).unwrap();
        let unsized_cases = engine.mk_ast(Op::If, vec![c.into(), d.into(), e.into()]);
        assert!(matches!(unsized_cases, Err(AstError::Operation(_))));
    }

    #[test]
    fn test_deep_chain_drops() {
        let engine = Engine::default();
        let x = sym(&engine, "x", 8);
        let mut node = x.clone();
        for _ in 0..200_000 {
            node = engine.mk_ast(Op::Neg, vec![node.into()]).unwrap();
        }
        let shared = engine.mk_ast(Op::Add, vec![x.clone().into(), x.clone().into()]).unwrap();
        let outer = engine.mk_ast(Op::Add, vec![node.into(), shared.clone().into()]).unwrap();
        drop(outer);
        assert_eq!(Arc::strong_count(&shared), 1);
        assert_eq!(Arc::strong_count(&x), 3);
        assert_eq!(shared.arg(0).and_then(Arg::as_ast), Some(&x));
    }

    #[test]
    fn test_overflowing_bounds_are_malformed() {
        let engine = Engine::default();
        let x = sym(&engine, "x", 8);
        let extract = engine.mk_ast(Op::Extract, vec![i64::MAX.into(), (-1i64).into(), x.clone().into()]);
        assert!(matches!(extract, Err(AstError::Operation(_))));
        let extract = engine.mk_ast(Op::Extract, vec![i64::MAX.into(), i64::MIN.into(), x.clone().into()]);
        assert!(matches!(extract, Err(AstError::Operation(_))));
        let widened = engine.mk_ast(Op::ZeroExt, vec![i64::MAX.into(), x.clone().into()]);
        assert!(matches!(widened, Err(AstError::Operation(_))));
        let widened = engine.mk_ast(Op::SignExt, vec![i64::from(u32::MAX).into(), x.into()]);
        assert!(matches!(widened, Err(AstError::Operation(_))));
    }

    #[test]
    fn test_same_length() {
        let engine = Engine::default();
        let a = sym(&engine, "a", 8);
        let b = sym(&engine, "b", 16);
        assert!(engine.mk_ast(Op::Add, vec![a.clone().into(), b.into()]).is_err());
        let n = engine.mk_ast(Op::Add, vec![a.clone().into(), a.into()]).unwrap();
        assert_eq!(n.length(), Some(8));
    }

    #[test]
    fn test_bool_val_requires_bool() {
        let engine = Engine::default();
        assert!(engine.mk_ast(Op::BoolVal, vec![true.into()]).is_ok());
        assert!(engine.mk_ast(Op::BoolVal, vec![1i64.into()]).is_err());
    }

    #[test]
    fn test_leaf_length_is_probed() {
        let engine = Engine::default();
        let x = sym(&engine, "x", 8);
        let n = engine
            .mk_ast(Op::Add, vec![x.into(), Leaf::bv(3, 8).into()])
            .unwrap();
        assert_eq!(n.length(), Some(8));
    }

    #[test]
    fn test_structural_equality_and_hash() {
        let engine = Engine::default();
        let a1 = sym(&engine, "a", 8);
        let a2 = sym(&engine, "a", 8);
        assert!(!Arc::ptr_eq(&a1, &a2));
        assert_eq!(a1, a2);
        assert_eq!(a1.hash_value(), a2.hash_value());

        let s1 = engine.mk_ast(Op::Add, vec![a1.clone().into(), a1.into()]).unwrap();
        let s2 = engine.mk_ast(Op::Add, vec![a2.clone().into(), a2.into()]).unwrap();
        assert_eq!(s1, s2);

        let b = sym(&engine, "b", 8);
        let s3 = engine.mk_ast(Op::Add, vec![b.clone().into(), b.into()]).unwrap();
        assert_ne!(s1, s3);
    }

    #[test]
    fn test_namespace_separates_engines() {
        let e1 = Engine::default();
        let e2 = Engine::default();
        assert_ne!(sym(&e1, "a", 8), sym(&e2, "a", 8));
    }

    #[test]
    fn test_variables() {
        let engine = Engine::default();
        let a = sym(&engine, "a", 8);
        let b = sym(&engine, "b", 8);
        let n = engine.mk_ast(Op::Sub, vec![a.into(), b.into()]).unwrap();
        let vars: Vec<_> = n.variables().into_iter().collect();
        assert_eq!(vars, vec!["a".to_string(), "b".to_string()]);
        assert!(n.symbolic());
    }

    #[test]
    fn test_collapsible_propagates() {
        let engine = Engine::default();
        let a = engine.mk_ast_with(Op::BitVec, vec!["a".into(), 8u32.into()], false).unwrap();
        let n = engine.mk_ast(Op::Neg, vec![a.into()]).unwrap();
        assert!(!n.collapsible());
    }

    #[test]
    fn test_display() {
        let engine = Engine::default();
        let a = sym(&engine, "a", 8);
        let n = engine.mk_ast(Op::ULE, vec![a.clone().into(), Leaf::bv(3, 8).into()]).unwrap();
        assert_eq!(n.to_string(), "(a <= 0x03#8)");
        let r = engine.mk_ast(Op::Reverse, vec![a.into()]).unwrap();
        assert_eq!(r.to_string(), "Reverse(a)");
    }

    #[test]
    fn test_deep_tree_hash_and_eq() {
        let engine = Engine::default();
        let mut n1 = sym(&engine, "x", 8);
        let mut n2 = sym(&engine, "x", 8);
        for _ in 0..2_000 {
            n1 = engine.mk_ast(Op::Neg, vec![n1.into()]).unwrap();
            n2 = engine.mk_ast(Op::Neg, vec![n2.into()]).unwrap();
        }
        assert_eq!(n1.hash_value(), n2.hash_value());
        assert_eq!(n1, n2);
    }
}
