//! Operator descriptors and the construction protocol.
//!
//! Each registered operation declares the shape of its operands. Building an
//! operation checks arity, matches operand types, coerces mismatched operands
//! through the converter table, threads filters and variables through, and
//! finally constructs, simplifies and folds the node.
//!
//! A mismatch that no converter can fix is not an error: the build returns
//! [`Outcome::Unsupported`] so that the caller can retry with the opposite
//! operator and swapped operands (see [`Engine::apply`]).

use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::sync::{Arc, OnceLock};

use log::debug;
use num_bigint::BigInt;

use crate::ast::Arg;
use crate::engine::Engine;
use crate::error::{AstError, Result};
use crate::expr::{Expr, ExprNode};
use crate::filter::{apply_filters, Filter};
use crate::op::{Finalizer, Op, Sort, ALL_OPS};
use crate::value::Leaf;

/// Result of a negotiated construction.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<T> {
    Built(T),
    /// The operands do not fit this operator; the caller may retry.
    Unsupported,
}

impl<T> Outcome<T> {
    pub fn built(self) -> Option<T> {
        match self {
            Outcome::Built(v) => Some(v),
            Outcome::Unsupported => None,
        }
    }

    pub fn is_unsupported(&self) -> bool {
        matches!(self, Outcome::Unsupported)
    }
}

/// The type of an operand, as far as operand matching is concerned.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum ArgType {
    /// A tree or wrapper of the given sort.
    Expr(Sort),
    Bool,
    Int,
    Str,
    BitVec,
    Interval,
    Float,
    Proxy,
    Any,
}

impl ArgType {
    pub fn of(arg: &Arg) -> ArgType {
        match arg {
            Arg::Expr(e) => ArgType::Expr(e.sort()),
            Arg::Ast(a) => ArgType::Expr(a.op().sort()),
            Arg::Leaf(leaf) => match leaf {
                Leaf::Bool(_) => ArgType::Bool,
                Leaf::Int(_) => ArgType::Int,
                Leaf::Str(_) => ArgType::Str,
                Leaf::BitVec(_) => ArgType::BitVec,
                Leaf::Interval(_) => ArgType::Interval,
                Leaf::Float(_) => ArgType::Float,
                Leaf::Proxy(_) => ArgType::Proxy,
            },
        }
    }

    pub fn matches(self, arg: &Arg) -> bool {
        self == ArgType::Any || self == ArgType::of(arg)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArgShape {
    /// Exactly these operands, in order.
    Fixed(Vec<ArgType>),
    /// One or more operands, all of this type.
    Uniform(ArgType),
}

/// A predicate over the coerced operands, with the message used when it fails.
#[derive(Clone, Copy)]
pub struct Check {
    pub test: fn(&Engine, &[Arg]) -> bool,
    pub message: &'static str,
}

pub type LengthFn = fn(&Engine, &[Arg]) -> Option<u32>;

/// Converts `value` into the target type, given the first operand that
/// already matched as a reference. `Ok(None)` means "cannot convert".
pub type Converter = fn(&Engine, Option<&Arg>, &Arg) -> Result<Option<Arg>>;

/// Rewrites operands and metadata right before node construction.
pub type Preprocessor = fn(&Engine, &mut Vec<Arg>, &mut Metadata) -> Result<()>;

/// Metadata threaded from the operands into the built expression.
#[derive(Debug, Default, Clone)]
pub struct Metadata {
    pub variables: BTreeSet<String>,
    pub filters: Vec<Arc<dyn Filter>>,
    pub uninitialized: bool,
}

#[derive(Clone)]
pub struct OpSpec {
    pub op: Op,
    pub shape: ArgShape,
    pub extra_check: Option<Check>,
    pub calc_length: Option<LengthFn>,
    pub coerce: bool,
    pub bound: bool,
}

impl OpSpec {
    pub fn new(op: Op, shape: ArgShape) -> Self {
        Self {
            op,
            shape,
            extra_check: None,
            calc_length: None,
            coerce: false,
            bound: false,
        }
    }

    pub fn check(mut self, test: fn(&Engine, &[Arg]) -> bool, message: &'static str) -> Self {
        self.extra_check = Some(Check { test, message });
        self
    }

    pub fn length(mut self, calc: LengthFn) -> Self {
        self.calc_length = Some(calc);
        self
    }

    pub fn coerce(mut self) -> Self {
        self.coerce = true;
        self
    }

    pub fn bound(mut self) -> Self {
        self.bound = true;
        self
    }
}

impl fmt::Debug for OpSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpSpec")
            .field("op", &self.op)
            .field("shape", &self.shape)
            .field("extra_check", &self.extra_check.map(|c| c.message))
            .field("calc_length", &self.calc_length.is_some())
            .field("coerce", &self.coerce)
            .field("bound", &self.bound)
            .finish()
    }
}

#[derive(Default)]
pub struct Registry {
    specs: HashMap<Op, OpSpec>,
    converters: HashMap<(ArgType, ArgType), Converter>,
    preprocessors: HashMap<Op, Preprocessor>,
}

impl Registry {
    pub fn empty() -> Self {
        Self::default()
    }

    /// The process-wide standard table, built on first use.
    pub fn standard() -> Arc<Registry> {
        static STANDARD: OnceLock<Arc<Registry>> = OnceLock::new();
        STANDARD.get_or_init(|| Arc::new(Registry::with_standard_ops())).clone()
    }

    pub fn register(&mut self, spec: OpSpec) -> Result<()> {
        if spec.op.finalizer() == Finalizer::Staging {
            return Err(AstError::operation(format!("{} cannot be registered", spec.op)));
        }
        if self.specs.contains_key(&spec.op) {
            return Err(AstError::operation(format!("{} is already registered", spec.op)));
        }
        self.specs.insert(spec.op, spec);
        Ok(())
    }

    pub fn register_converter(&mut self, target: ArgType, source: ArgType, converter: Converter) {
        self.converters.insert((target, source), converter);
    }

    pub fn register_preprocessor(&mut self, op: Op, preprocessor: Preprocessor) {
        self.preprocessors.insert(op, preprocessor);
    }

    pub fn spec(&self, op: Op) -> Option<&OpSpec> {
        self.specs.get(&op)
    }

    pub fn converter(&self, target: ArgType, source: ArgType) -> Option<Converter> {
        self.converters.get(&(target, source)).copied()
    }

    pub fn preprocessor(&self, op: Op) -> Option<Preprocessor> {
        self.preprocessors.get(&op).copied()
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("specs", &self.specs.len())
            .field("converters", &self.converters.len())
            .field("preprocessors", &self.preprocessors.len())
            .finish()
    }
}

// Standard table

const BV: ArgType = ArgType::Expr(Sort::BitVec);
const BOOL: ArgType = ArgType::Expr(Sort::Bool);
const FP: ArgType = ArgType::Expr(Sort::Fp);

fn sizes<'a>(engine: &'a Engine, args: &'a [Arg]) -> impl Iterator<Item = u32> + 'a {
    args.iter().filter_map(|a| engine.arg_size(a))
}

fn length_same_check(engine: &Engine, args: &[Arg]) -> bool {
    let mut it = sizes(engine, args);
    match it.next() {
        Some(first) => it.all(|s| s == first),
        None => true,
    }
}

fn basic_length_calc(engine: &Engine, args: &[Arg]) -> Option<u32> {
    sizes(engine, args).next()
}

fn concat_length_calc(engine: &Engine, args: &[Arg]) -> Option<u32> {
    args.iter().map(|a| engine.arg_size(a)).sum()
}

fn extract_check(engine: &Engine, args: &[Arg]) -> bool {
    match (args[0].as_int(), args[1].as_int(), engine.arg_size(&args[2])) {
        (Some(high), Some(low), Some(size)) => 0 <= low && low <= high && high < size as i64,
        _ => false,
    }
}

fn extract_length_calc(_: &Engine, args: &[Arg]) -> Option<u32> {
    let length = args[0].as_int()?.checked_sub(args[1].as_int()?)?.checked_add(1)?;
    u32::try_from(length).ok()
}

fn ext_length_calc(engine: &Engine, args: &[Arg]) -> Option<u32> {
    let extra = u32::try_from(args[0].as_int()?).ok()?;
    engine.arg_size(&args[1])?.checked_add(extra)
}

fn width_calc(_: &Engine, args: &[Arg]) -> Option<u32> {
    u32::try_from(args.last()?.as_int()?).ok()
}

fn fp_width_check(_: &Engine, args: &[Arg]) -> bool {
    matches!(args.last().and_then(Arg::as_int), Some(32 | 64))
}

fn fp_reinterpret_check(engine: &Engine, args: &[Arg]) -> bool {
    fp_width_check(engine, args) && engine.arg_size(&args[0]).map(i64::from) == args[1].as_int()
}

fn union_preprocessor(engine: &Engine, _args: &mut Vec<Arg>, metadata: &mut Metadata) -> Result<()> {
    let name = engine.next_union_name();
    debug!("union: minted implicit variable {}", name);
    metadata.variables.insert(name);
    Ok(())
}

fn reference_size(engine: &Engine, reference: Option<&Arg>) -> Option<u32> {
    reference.and_then(|r| engine.arg_size(r))
}

fn bitvec_from_int(engine: &Engine, reference: Option<&Arg>, value: &Arg) -> Result<Option<Arg>> {
    let (Some(width), Some(Leaf::Int(i))) = (reference_size(engine, reference), value.as_leaf()) else {
        return Ok(None);
    };
    engine.bvv_big(i, width).map(|e| Some(Arg::Expr(e)))
}

fn bitvec_from_value(engine: &Engine, _: Option<&Arg>, value: &Arg) -> Result<Option<Arg>> {
    let Some(Leaf::BitVec(v)) = value.as_leaf() else {
        return Ok(None);
    };
    engine
        .bvv_big(&BigInt::from(v.value().clone()), v.width())
        .map(|e| Some(Arg::Expr(e)))
}

fn bitvec_from_interval(engine: &Engine, _: Option<&Arg>, value: &Arg) -> Result<Option<Arg>> {
    let Some(Leaf::Interval(i)) = value.as_leaf() else {
        return Ok(None);
    };
    if i.is_empty() {
        return Ok(None);
    }
    engine
        .si(i.bits(), i.stride(), i.lower(), i.upper())
        .map(|e| Some(Arg::Expr(e)))
}

fn bool_from_bool(engine: &Engine, _: Option<&Arg>, value: &Arg) -> Result<Option<Arg>> {
    let Some(Leaf::Bool(b)) = value.as_leaf() else {
        return Ok(None);
    };
    engine.bool_val(*b).map(|e| Some(Arg::Expr(e)))
}

fn fp_from_float(engine: &Engine, _: Option<&Arg>, value: &Arg) -> Result<Option<Arg>> {
    let Some(Leaf::Float(f)) = value.as_leaf() else {
        return Ok(None);
    };
    engine.fpv(f.to_f64(), f.width()).map(|e| Some(Arg::Expr(e)))
}

fn fp_from_int(engine: &Engine, reference: Option<&Arg>, value: &Arg) -> Result<Option<Arg>> {
    let (Some(width), Some(i)) = (reference_size(engine, reference), value.as_int()) else {
        return Ok(None);
    };
    engine.fpv(i as f64, width).map(|e| Some(Arg::Expr(e)))
}

impl Registry {
    pub fn with_standard_ops() -> Self {
        use ArgShape::{Fixed, Uniform};
        use ArgType::{Any, Float, Int, Str};

        let mut specs = Vec::new();

        // Binary bit-vector operations with an operator form.
        for op in [
            Op::Add,
            Op::Sub,
            Op::Mul,
            Op::Div,
            Op::TrueDiv,
            Op::FloorDiv,
            Op::Pow,
            Op::Mod,
            Op::BitAnd,
            Op::BitOr,
            Op::BitXor,
            Op::Shl,
            Op::Shr,
        ] {
            for op in [Some(op), op.reflected()].into_iter().flatten() {
                specs.push(
                    OpSpec::new(op, Fixed(vec![BV, BV]))
                        .check(length_same_check, "args' length must all be equal")
                        .length(basic_length_calc)
                        .coerce()
                        .bound(),
                );
            }
        }

        for op in [Op::SDiv, Op::SMod, Op::LShR, Op::RotateLeft, Op::RotateRight] {
            specs.push(
                OpSpec::new(op, Fixed(vec![BV, BV]))
                    .check(length_same_check, "args' length must all be equal")
                    .length(basic_length_calc)
                    .coerce(),
            );
        }

        for op in [Op::Union, Op::Intersection, Op::Widen] {
            specs.push(
                OpSpec::new(op, Fixed(vec![BV, BV]))
                    .check(length_same_check, "args' length must all be equal")
                    .length(basic_length_calc)
                    .coerce()
                    .bound(),
            );
        }

        for op in [
            Op::Eq,
            Op::Ne,
            Op::Ge,
            Op::Le,
            Op::Gt,
            Op::Lt,
            Op::SGE,
            Op::SLE,
            Op::SGT,
            Op::SLT,
            Op::UGE,
            Op::ULE,
            Op::UGT,
            Op::ULT,
        ] {
            specs.push(
                OpSpec::new(op, Fixed(vec![BV, BV]))
                    .check(length_same_check, "args' length must all be equal")
                    .coerce()
                    .bound(),
            );
        }

        for op in [Op::Neg, Op::Pos, Op::Abs, Op::Invert, Op::Reverse] {
            specs.push(OpSpec::new(op, Fixed(vec![BV])).length(basic_length_calc).bound());
        }

        specs.push(OpSpec::new(Op::And, Uniform(BOOL)).coerce().bound());
        specs.push(OpSpec::new(Op::Or, Uniform(BOOL)).coerce().bound());
        specs.push(OpSpec::new(Op::Not, Fixed(vec![BOOL])).bound());

        specs.push(OpSpec::new(Op::Concat, Uniform(BV)).length(concat_length_calc).coerce());
        specs.push(
            OpSpec::new(Op::Extract, Fixed(vec![Int, Int, BV]))
                .check(extract_check, "Invalid extract bounds")
                .length(extract_length_calc),
        );
        for op in [Op::ZeroExt, Op::SignExt] {
            specs.push(OpSpec::new(op, Fixed(vec![Int, BV])).length(ext_length_calc));
        }

        specs.push(OpSpec::new(Op::BoolVal, Fixed(vec![ArgType::Bool])));
        specs.push(OpSpec::new(Op::BitVecVal, Fixed(vec![Int, Int])).length(width_calc));
        specs.push(
            OpSpec::new(Op::FpVal, Fixed(vec![Float, Int]))
                .check(fp_width_check, "floating-point width must be 32 or 64")
                .length(width_calc),
        );
        specs.push(OpSpec::new(Op::BoolSym, Fixed(vec![Str])));
        specs.push(OpSpec::new(Op::BitVec, Fixed(vec![Str, Int])).length(width_calc));
        specs.push(
            OpSpec::new(Op::FpSym, Fixed(vec![Str, Int]))
                .check(fp_width_check, "floating-point width must be 32 or 64")
                .length(width_calc),
        );

        specs.push(OpSpec::new(Op::TopStridedInterval, Fixed(vec![Int])).length(width_calc));
        specs.push(OpSpec::new(Op::StridedInterval, Fixed(vec![Int, Int, Int, Int])));
        specs.push(OpSpec::new(Op::ValueSet, Fixed(vec![Str, BV])).length(basic_length_calc));
        specs.push(OpSpec::new(Op::AbstractLocation, Fixed(vec![Str, Int])).length(width_calc));

        specs.push(OpSpec::new(Op::FP, Fixed(vec![BV, BV, BV])).length(concat_length_calc));
        specs.push(
            OpSpec::new(Op::FpToFp, Fixed(vec![BV, Int]))
                .check(fp_reinterpret_check, "FpToFp reinterprets a 32- or 64-bit vector of the same width")
                .length(width_calc),
        );
        specs.push(OpSpec::new(Op::FpToIEEEBV, Fixed(vec![FP])).length(basic_length_calc));
        for op in [Op::FpToSBV, Op::FpToUBV] {
            specs.push(OpSpec::new(op, Fixed(vec![FP, Int])).length(width_calc));
        }
        for op in [Op::FpNeg, Op::FpAbs] {
            specs.push(OpSpec::new(op, Fixed(vec![FP])).length(basic_length_calc));
        }
        for op in [Op::FpAdd, Op::FpSub, Op::FpMul, Op::FpDiv] {
            specs.push(
                OpSpec::new(op, Fixed(vec![FP, FP]))
                    .check(length_same_check, "args' length must all be equal")
                    .length(basic_length_calc)
                    .coerce(),
            );
        }
        for op in [Op::FpLT, Op::FpLEQ, Op::FpGT, Op::FpGEQ, Op::FpEQ] {
            specs.push(
                OpSpec::new(op, Fixed(vec![FP, FP]))
                    .check(length_same_check, "args' length must all be equal")
                    .coerce(),
            );
        }

        specs.push(
            OpSpec::new(Op::If, Fixed(vec![BOOL, BV, BV]))
                .check(length_same_check_cases, "If cases must have the same length")
                .coerce(),
        );
        specs.push(OpSpec::new(Op::Identical, Fixed(vec![Any, Any])));

        let mut registry = Registry::empty();
        for spec in specs {
            registry.specs.insert(spec.op, spec);
        }

        registry.register_converter(BV, Int, bitvec_from_int);
        registry.register_converter(BV, ArgType::BitVec, bitvec_from_value);
        registry.register_converter(BV, ArgType::Interval, bitvec_from_interval);
        registry.register_converter(BOOL, ArgType::Bool, bool_from_bool);
        registry.register_converter(FP, Float, fp_from_float);
        registry.register_converter(FP, Int, fp_from_int);

        registry.register_preprocessor(Op::Union, union_preprocessor);

        registry
    }

    /// Operations that have no registered descriptor.
    pub fn unregistered(&self) -> Vec<Op> {
        ALL_OPS
            .iter()
            .copied()
            .filter(|op| !self.specs.contains_key(op))
            .collect()
    }
}

fn length_same_check_cases(engine: &Engine, args: &[Arg]) -> bool {
    length_same_check(engine, &args[1..])
}

// Construction

/// Index of the operand used as a conversion reference for position `index`:
/// the first matching operand of the same expected type, else the first
/// matching operand at all.
fn reference_for(expected: &[ArgType], matched: &[bool], index: usize) -> Option<usize> {
    let same = (0..expected.len()).find(|&i| matched[i] && expected[i] == expected[index]);
    same.or_else(|| matched.iter().position(|&m| m))
}

impl Engine {
    /// Builds `op(args)` through the registry.
    pub fn build(&self, op: Op, args: Vec<Arg>) -> Result<Outcome<Expr>> {
        let spec = self
            .registry()
            .spec(op)
            .ok_or_else(|| AstError::operation(format!("{} is not registered", op)))?;

        let expected: Vec<ArgType> = match &spec.shape {
            ArgShape::Fixed(types) => {
                if types.len() != args.len() {
                    return Err(AstError::type_error(format!(
                        "{} takes {} operands, got {}",
                        op,
                        types.len(),
                        args.len()
                    )));
                }
                types.clone()
            }
            ArgShape::Uniform(ty) => {
                if args.is_empty() {
                    return Err(AstError::type_error(format!("{} takes at least one operand", op)));
                }
                vec![*ty; args.len()]
            }
        };

        let matched: Vec<bool> = args.iter().zip(&expected).map(|(a, t)| t.matches(a)).collect();
        let mut fixed = Vec::with_capacity(args.len());
        for (i, arg) in args.iter().enumerate() {
            if matched[i] {
                fixed.push(arg.clone());
                continue;
            }
            if !spec.coerce {
                debug!("build: {} operand {} does not match and {} does not coerce", op, i, op);
                return Ok(Outcome::Unsupported);
            }
            let Some(convert) = self.registry().converter(expected[i], ArgType::of(arg)) else {
                debug!("build: no converter from {:?} to {:?}", ArgType::of(arg), expected[i]);
                return Ok(Outcome::Unsupported);
            };
            let reference = reference_for(&expected, &matched, i).map(|r| &args[r]);
            match convert(self, reference, arg)? {
                Some(converted) => fixed.push(converted),
                None => return Ok(Outcome::Unsupported),
            }
        }

        if let Some(check) = spec.extra_check {
            if !(check.test)(self, &fixed) {
                return Err(AstError::operation(check.message));
            }
        }
        let length = spec.calc_length.and_then(|calc| calc(self, &fixed));

        let mut metadata = Metadata::default();
        for arg in &fixed {
            if let Arg::Expr(e) = arg {
                if e.filters().len() > metadata.filters.len() {
                    metadata.filters = e.filters().to_vec();
                }
                metadata.uninitialized |= e.is_uninitialized();
                metadata.variables.extend(e.variables().iter().cloned());
            }
        }

        // Trees never hold reflected operators.
        let (op, mut fixed) = match op.unreflected() {
            Some(forward) => {
                fixed.reverse();
                (forward, fixed)
            }
            None => (op, fixed),
        };

        if let Some(preprocess) = self.registry().preprocessor(op) {
            preprocess(self, &mut fixed, &mut metadata)?;
        }

        let node = self.mk_ast(op, fixed)?;
        let reduced = self.reduced(&node)?;

        let mut expr = Expr::new(ExprNode::from_arg(reduced), op.sort())
            .with_variables(metadata.variables)
            .with_filters(metadata.filters.clone())
            .with_uninitialized(metadata.uninitialized);
        if length.is_some() {
            expr = expr.with_length(length);
        }
        Ok(Outcome::Built(apply_filters(self, expr, &metadata.filters)))
    }
}

#[cfg(test)]
mod tests {
    use test_log::test;

    use super::*;

    #[test]
    fn test_standard_covers_vocabulary() {
        let registry = Registry::standard();
        assert_eq!(registry.unregistered(), vec![Op::Size]);
    }

    #[test]
    fn test_register_rejects_duplicates_and_staging() {
        let mut registry = Registry::empty();
        registry.register(OpSpec::new(Op::Add, ArgShape::Fixed(vec![BV, BV]))).unwrap();
        assert!(registry.register(OpSpec::new(Op::Add, ArgShape::Fixed(vec![BV]))).is_err());
        assert!(registry.register(OpSpec::new(Op::Size, ArgShape::Uniform(ArgType::Any))).is_err());
    }

    #[test]
    fn test_arity_mismatch_is_type_error() {
        let engine = Engine::default();
        let x = engine.bvs("x", 8).unwrap();
        let r = engine.build(Op::Add, vec![(&x).into()]);
        assert!(matches!(r, Err(AstError::Type(_))));
        let r = engine.build(Op::And, vec![]);
        assert!(matches!(r, Err(AstError::Type(_))));
    }

    #[test]
    fn test_unconvertible_is_unsupported() {
        let engine = Engine::default();
        let x = engine.bvs("x", 8).unwrap();
        let r = engine.build(Op::Add, vec![(&x).into(), "y".into()]).unwrap();
        assert!(r.is_unsupported());
        // No coercion for Extract at all.
        let r = engine.build(Op::Extract, vec![Leaf::bv(1, 8).into(), 0i64.into(), (&x).into()]).unwrap();
        assert!(r.is_unsupported());
    }

    #[test]
    fn test_extra_check_is_fatal() {
        let engine = Engine::default();
        let x = engine.bvs("x", 8).unwrap();
        let y = engine.bvs("y", 16).unwrap();
        let r = engine.build(Op::Add, vec![(&x).into(), (&y).into()]);
        assert_eq!(r.unwrap_err(), AstError::operation("args' length must all be equal"));
        let r = engine.build(Op::Extract, vec![3i64.into(), 5i64.into(), (&x).into()]);
        assert_eq!(r.unwrap_err(), AstError::operation("Invalid extract bounds"));
    }

    #[test]
    fn test_reflected_is_canonicalized() {
        let engine = Engine::default();
        let x = engine.bvs("x", 8).unwrap();
        let y = engine.bvs("y", 8).unwrap();
        let e = engine.build(Op::RSub, vec![(&x).into(), (&y).into()]).unwrap().built().unwrap();
        let ast = e.ast().unwrap();
        assert_eq!(ast.op(), Op::Sub);
        assert_eq!(ast.args()[0], Arg::Expr(y));
        assert_eq!(ast.args()[1], Arg::Expr(x));
    }

    #[test]
    fn test_reference_prefers_same_expected_type() {
        let engine = Engine::default();
        let c = engine.bool_sym("c").unwrap();
        let x = engine.bvs("x", 16).unwrap();
        let e = engine.construct(Op::If, vec![(&c).into(), 7i64.into(), (&x).into()]).unwrap();
        assert_eq!(e.size(), Some(16));
    }

    #[test]
    fn test_union_mints_variables() {
        let engine = Engine::default();
        let a = engine.si(8, 0, 2, 2).unwrap();
        let b = engine.si(8, 0, 8, 8).unwrap();
        let u1 = engine.apply(Op::Union, (&a).into(), (&b).into()).unwrap();
        let u2 = engine.apply(Op::Union, (&a).into(), (&b).into()).unwrap();
        let v1: Vec<_> = u1.variables().iter().cloned().collect();
        let v2: Vec<_> = u2.variables().iter().cloned().collect();
        assert_eq!(v1.len(), 1);
        assert!(v1[0].starts_with("union_"));
        assert_ne!(v1, v2);
    }

    #[test]
    fn test_uninitialized_propagates() {
        let engine = Engine::default();
        let x = engine.bvs("x", 8).unwrap().with_uninitialized(true);
        let y = engine.bvs("y", 8).unwrap();
        let e = engine.apply(Op::Add, (&y).into(), (&x).into()).unwrap();
        assert!(e.is_uninitialized());
    }

    #[test]
    fn test_longest_filter_chain_wins() {
        use crate::filter::FnFilter;

        let engine = Engine::default();
        let keep = FnFilter::new("keep", |_: &Engine, e: Expr| Ok(e));
        let x = engine.bvs("x", 8).unwrap().with_filters(vec![keep.clone()]);
        let y = engine.bvs("y", 8).unwrap().with_filters(vec![keep.clone(), keep]);
        let e = engine.apply(Op::Add, (&x).into(), (&y).into()).unwrap();
        assert_eq!(e.filters().len(), 2);
    }
}
