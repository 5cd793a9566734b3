//! Two-branch conditional values.
//!
//! An [`IfProxy`] says "the value is `a` along the true branch and `b` along
//! the false branch" without committing to either. Abstract backends produce
//! one when a condition cannot be decided, and every operator applied to it is
//! broadcast across both branches.
//!
//! ```
//! use symast::op::Op;
//! use symast::proxy::{IfProxy, Operand};
//!
//! #[derive(Debug, Clone, PartialEq)]
//! struct N(i64);
//!
//! impl Operand for N {
//!     type Cond = &'static str;
//!
//!     fn apply_unary(&self, op: Op) -> Option<Self> {
//!         (op == Op::Neg).then(|| N(-self.0))
//!     }
//!
//!     fn apply_binary(&self, op: Op, other: &Self) -> Option<Self> {
//!         (op == Op::Add || op == Op::RAdd).then(|| N(self.0 + other.0))
//!     }
//! }
//!
//! let p = IfProxy::new("c", N(1), N(2));
//! let q = p.apply_binary(Op::Add, &N(10)).unwrap();
//! assert_eq!(q, IfProxy::new("c", N(11), N(12)));
//! ```

use std::fmt;

use log::{debug, error};

use crate::error::{AstError, Result};
use crate::op::Op;

/// A value that operators can be applied to, one branch at a time.
///
/// `None` from an `apply_*` method means "not supported for these operands",
/// which lets the caller retry with the opposite operator.
pub trait Operand: Clone {
    /// Condition token carried by proxies of this value type. Never inspected here.
    type Cond: Clone;

    fn apply_unary(&self, op: Op) -> Option<Self>;

    fn apply_binary(&self, op: Op, other: &Self) -> Option<Self>;

    /// Views the value as a proxy, if it is one.
    fn as_proxy(&self) -> Option<&IfProxy<Self::Cond, Self>> {
        None
    }
}

/// Applies a binary operator, retrying as the opposite operator with swapped operands.
///
/// Returns `None` only when both attempts are unsupported.
pub fn negotiate_binary<V: Operand>(op: Op, lhs: &V, rhs: &V) -> Option<V> {
    if let Some(r) = lhs.apply_binary(op, rhs) {
        return Some(r);
    }
    let opposite = op.opposite()?;
    debug!("negotiate: {} unsupported, trying {} with swapped operands", op, opposite);
    rhs.apply_binary(opposite, lhs)
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IfProxy<C, V> {
    condition: C,
    true_branch: V,
    false_branch: V,
}

impl<C, V> IfProxy<C, V> {
    pub fn new(condition: C, true_branch: V, false_branch: V) -> Self {
        Self {
            condition,
            true_branch,
            false_branch,
        }
    }

    pub fn condition(&self) -> &C {
        &self.condition
    }

    pub fn true_branch(&self) -> &V {
        &self.true_branch
    }

    pub fn false_branch(&self) -> &V {
        &self.false_branch
    }

    pub fn branch(&self, side: bool) -> &V {
        if side {
            &self.true_branch
        } else {
            &self.false_branch
        }
    }
}

impl<C, V> IfProxy<C, V>
where
    C: Clone,
    V: Operand<Cond = C>,
{
    /// Applies a unary operator to both branches.
    pub fn apply_unary(&self, op: Op) -> Result<Self> {
        let apply = |v: &V| {
            v.apply_unary(op).ok_or_else(|| {
                error!("{} does not apply to a proxy branch", op);
                AstError::Unsupported { op, opposite: None }
            })
        };
        Ok(Self::new(
            self.condition.clone(),
            apply(&self.true_branch)?,
            apply(&self.false_branch)?,
        ))
    }

    /// Applies a binary operator to both branches.
    ///
    /// When `other` is itself a proxy its condition is assumed to be the same
    /// as ours and branches are paired positionally. This is an approximation:
    /// proxies over independent conditions are not expanded into a product.
    pub fn apply_binary(&self, op: Op, other: &V) -> Result<Self> {
        let (other_true, other_false) = match other.as_proxy() {
            Some(p) => (&p.true_branch, &p.false_branch),
            None => (other, other),
        };
        let apply = |v: &V, o: &V| {
            negotiate_binary(op, v, o).ok_or_else(|| {
                error!("neither {} nor its opposite apply to a proxy branch", op);
                AstError::Unsupported {
                    op,
                    opposite: op.opposite(),
                }
            })
        };
        Ok(Self::new(
            self.condition.clone(),
            apply(&self.true_branch, other_true)?,
            apply(&self.false_branch, other_false)?,
        ))
    }

    /// Follows one side through any chain of nested proxies.
    ///
    /// Returns the outermost condition (if `value` is a proxy at all) together
    /// with the innermost non-proxy value on that side.
    pub fn unwrap(value: &V, side: bool) -> (Option<C>, V) {
        let Some(outer) = value.as_proxy() else {
            return (None, value.clone());
        };
        let mut current = outer.branch(side);
        while let Some(inner) = current.as_proxy() {
            current = inner.branch(side);
        }
        (Some(outer.condition.clone()), current.clone())
    }
}

impl<C: fmt::Display, V: fmt::Display> fmt::Display for IfProxy<C, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "IfProxy({}, {}, {})",
            self.condition, self.true_branch, self.false_branch
        )
    }
}

#[cfg(test)]
mod tests {
    use test_log::test;

    use super::*;

    /// Integers that only know how to add from the left, so the opposite retry is visible.
    #[derive(Debug, Clone, PartialEq)]
    enum Num {
        Plain(i64),
        Lefty(i64),
        Proxy(Box<IfProxy<u8, Num>>),
    }

    impl Operand for Num {
        type Cond = u8;

        fn apply_unary(&self, op: Op) -> Option<Self> {
            match (self, op) {
                (Num::Plain(a), Op::Neg) => Some(Num::Plain(-a)),
                (Num::Lefty(a), Op::Neg) => Some(Num::Lefty(-a)),
                (Num::Proxy(p), _) => p.apply_unary(op).ok().map(|p| Num::Proxy(Box::new(p))),
                _ => None,
            }
        }

        fn apply_binary(&self, op: Op, other: &Self) -> Option<Self> {
            match (self, op, other) {
                (Num::Plain(a), Op::Add | Op::RAdd, Num::Plain(b)) => Some(Num::Plain(a + b)),
                (Num::Plain(a), Op::Sub, Num::Plain(b)) => Some(Num::Plain(a - b)),
                (Num::Plain(a), Op::RSub, Num::Plain(b)) => Some(Num::Plain(b - a)),
                (Num::Lefty(a), Op::RSub, Num::Plain(b)) => Some(Num::Plain(b - a)),
                (Num::Proxy(p), _, _) => p.apply_binary(op, other).ok().map(|p| Num::Proxy(Box::new(p))),
                _ => None,
            }
        }

        fn as_proxy(&self) -> Option<&IfProxy<u8, Num>> {
            match self {
                Num::Proxy(p) => Some(p),
                _ => None,
            }
        }
    }

    fn proxy(c: u8, a: Num, b: Num) -> Num {
        Num::Proxy(Box::new(IfProxy::new(c, a, b)))
    }

    #[test]
    fn test_unary_broadcast() {
        let p = IfProxy::new(1u8, Num::Plain(3), Num::Plain(-4));
        let q = p.apply_unary(Op::Neg).unwrap();
        assert_eq!(q, IfProxy::new(1, Num::Plain(-3), Num::Plain(4)));
    }

    #[test]
    fn test_unary_unsupported() {
        let p = IfProxy::new(1u8, Num::Plain(3), Num::Plain(4));
        let err = p.apply_unary(Op::Invert).unwrap_err();
        assert_eq!(
            err,
            AstError::Unsupported {
                op: Op::Invert,
                opposite: None
            }
        );
    }

    #[test]
    fn test_binary_uniform_other() {
        let p = IfProxy::new(7u8, Num::Plain(1), Num::Plain(2));
        let q = p.apply_binary(Op::Sub, &Num::Plain(10)).unwrap();
        assert_eq!(q, IfProxy::new(7, Num::Plain(-9), Num::Plain(-8)));
    }

    #[test]
    fn test_binary_pairs_branches_positionally() {
        let p = IfProxy::new(7u8, Num::Plain(1), Num::Plain(2));
        let other = proxy(7, Num::Plain(10), Num::Plain(20));
        let q = p.apply_binary(Op::Add, &other).unwrap();
        assert_eq!(q, IfProxy::new(7, Num::Plain(11), Num::Plain(22)));
    }

    #[test]
    fn test_binary_falls_back_to_opposite() {
        // Plain has no Sub rule for Lefty, so each branch retries as Lefty RSub Plain.
        let p = IfProxy::new(0u8, Num::Plain(10), Num::Plain(20));
        let q = p.apply_binary(Op::Sub, &Num::Lefty(1));
        assert_eq!(q, Ok(IfProxy::new(0, Num::Plain(9), Num::Plain(19))));

        let p = IfProxy::new(0u8, Num::Lefty(1), Num::Lefty(2));
        let q = p.apply_binary(Op::Sub, &Num::Plain(10)).unwrap_err();
        assert_eq!(
            q,
            AstError::Unsupported {
                op: Op::Sub,
                opposite: Some(Op::RSub)
            }
        );
    }

    #[test]
    fn test_negotiate_uses_opposite() {
        // Plain(10) - Lefty(1): Plain has no rule for Lefty, Lefty handles RSub.
        let r = negotiate_binary(Op::Sub, &Num::Plain(10), &Num::Lefty(1));
        assert_eq!(r, Some(Num::Plain(9)));
    }

    #[test]
    fn test_unwrap_nested() {
        let inner = proxy(2, Num::Plain(1), Num::Plain(2));
        let outer = proxy(1, inner, Num::Plain(3));
        let (c, v) = IfProxy::unwrap(&outer, true);
        assert_eq!(c, Some(1));
        assert_eq!(v, Num::Plain(1));
        let (c, v) = IfProxy::unwrap(&outer, false);
        assert_eq!(c, Some(1));
        assert_eq!(v, Num::Plain(3));
        let (c, v) = IfProxy::<u8, Num>::unwrap(&Num::Plain(5), true);
        assert_eq!(c, None);
        assert_eq!(v, Num::Plain(5));
    }
}
