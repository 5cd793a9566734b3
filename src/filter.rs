//! Post-construction tree transforms.
//!
//! Every expression carries a chain of filters inherited from its operands.
//! After a node is built, each filter gets a chance to rewrite it. A filter
//! that fails is skipped: the expression keeps its pre-filter form.

use std::fmt;
use std::sync::Arc;

use log::warn;

use crate::engine::Engine;
use crate::error::BackendError;
use crate::expr::Expr;

pub trait Filter: Send + Sync + fmt::Debug {
    fn convert(&self, engine: &Engine, expr: Expr) -> Result<Expr, BackendError>;
}

type FilterFn = dyn Fn(&Engine, Expr) -> Result<Expr, BackendError> + Send + Sync;

/// A filter made from a closure.
pub struct FnFilter {
    name: String,
    f: Box<FilterFn>,
}

impl FnFilter {
    pub fn new<F>(name: impl Into<String>, f: F) -> Arc<dyn Filter>
    where
        F: Fn(&Engine, Expr) -> Result<Expr, BackendError> + Send + Sync + 'static,
    {
        Arc::new(Self {
            name: name.into(),
            f: Box::new(f),
        })
    }
}

impl fmt::Debug for FnFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FnFilter({})", self.name)
    }
}

impl Filter for FnFilter {
    fn convert(&self, engine: &Engine, expr: Expr) -> Result<Expr, BackendError> {
        (self.f)(engine, expr)
    }
}

/// Runs every filter in order, skipping the ones that fail.
pub fn apply_filters(engine: &Engine, mut expr: Expr, filters: &[Arc<dyn Filter>]) -> Expr {
    for filter in filters {
        match filter.convert(engine, expr.clone()) {
            Ok(converted) => expr = converted,
            Err(err) => warn!("filter {:?} skipped on {}: {}", filter, expr, err),
        }
    }
    expr
}
