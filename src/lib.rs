//! # symast: symbolic expression trees in Rust
//!
//! **`symast`** is a manager-centric library for building, validating and rewriting
//! **symbolic expression trees** over booleans, bit-vectors, floating point and abstract
//! (strided interval) values. It is the core of a symbolic reasoning pipeline: trees are built
//! once, checked and sized at construction, simplified, folded into plain values when nothing
//! is lost by doing so, and handed to pluggable **backends** for evaluation.
//!
//! ## Key Features
//!
//! - **Manager-Centric Architecture**: All operations go through the [`Engine`][crate::engine::Engine].
//!   It owns the backend list, the operator registry and the namespace that feeds node identity.
//! - **Checked Construction**: Every node is validated and sized once, when it is built
//!   (see [`ast`]). Malformed operations never produce a node.
//! - **Operator Negotiation**: Operands are matched and coerced through the
//!   [`Registry`][crate::registry::Registry]. An operator that does not fit is retried as its
//!   opposite with swapped operands before giving up.
//! - **Rewriting**: Structural [`replace`], algebraic [`pivot`], and peephole [`simplify`].
//! - **Conditional Values**: [`IfProxy`][crate::proxy::IfProxy] carries "A if c else B"
//!   through operators without committing to a branch.
//!
//! ## Basic Usage
//!
//! ```rust
//! use symast::engine::Engine;
//! use symast::value::Leaf;
//!
//! // 1. Initialize the engine (concrete backend first, then intervals)
//! let engine = Engine::default();
//!
//! // 2. Constants fold as soon as they are combined
//! let hi = engine.bvv(5, 8).unwrap();
//! let lo = engine.bvv(3, 8).unwrap();
//! let v = engine.concat(&[&hi, &lo]).unwrap();
//! assert_eq!(v.model(), Some(&Leaf::bv(0x0503, 16)));
//!
//! // 3. Symbols stay symbolic
//! let x = engine.bvs("x", 32).unwrap();
//! let low = engine.extract(7, 0, &x).unwrap();
//! assert_eq!(low.size(), Some(8));
//! assert!(low.variables().contains("x"));
//!
//! // 4. Operators on expressions are evaluated by the engine
//! let y = engine.eval(&low + 1).unwrap();
//! assert!(y.symbolic());
//! assert_eq!(y.size(), Some(8));
//! ```
//!
//! ## Core Components
//!
//! - **[`op`]**: The closed operation vocabulary and its static tables.
//! - **[`ast`]**: Tree nodes, finalization, hashing and structural equality.
//! - **[`registry`]**: Operator descriptors, coercion and the construction protocol.
//! - **[`engine`]**: The [`Engine`][crate::engine::Engine] manager.
//! - **[`backend`]**: The backend interface and the reference concrete and interval backends.

pub mod ast;
pub mod backend;
pub mod debug;
pub mod engine;
pub mod error;
pub mod eval;
pub mod expr;
pub mod filter;
pub mod op;
pub mod pivot;
pub mod proxy;
pub mod registry;
pub mod replace;
pub mod resolve;
pub mod simplify;
pub mod utils;
pub mod value;
