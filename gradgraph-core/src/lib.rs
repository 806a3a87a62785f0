//! Reverse-mode automatic differentiation over scalar, vector and matrix
//! computation graphs.
//!
//! A [`Graph`] is an arena of nodes. Leaves hold caller-supplied values;
//! every other node applies one primitive from [`ops`] to earlier nodes.
//! [`Graph::calculate_derivatives`] evaluates the graph forward and then
//! accumulates `d(objective)/d(node)` into every node's gradient.
//!
//! ```
//! use gradgraph_core::Graph;
//!
//! let mut g: Graph<f64> = Graph::new();
//! let a = g.parameter(2.0);
//! let b = g.parameter(6.0);
//! let s = g.add(a, b)?;
//! let f = g.mul(s, b)?;
//! g.calculate_derivatives(f)?;
//!
//! assert_eq!(g.scalar_value(f)?, 48.0);
//! assert_eq!(g.gradient(a)?.as_scalar(), Some(6.0));
//! assert_eq!(g.gradient(b)?.as_scalar(), Some(14.0));
//! # Ok::<(), gradgraph_core::GradGraphError>(())
//! ```

pub mod autograd;
pub mod config;
pub mod display;
pub mod error;
pub mod graph;
pub mod init;
pub mod numeric;
pub mod ops;
pub mod persist;
pub mod utils;
pub mod value;

pub use config::GraphConfig;
pub use error::GradGraphError;
pub use graph::{Checkpoint, Graph, NodeId};
pub use numeric::GraphFloat;
pub use ops::{Op, OpKind, Operands};
pub use value::{Matrix, Rank, Shape, Value};

// Re-export traits required by public functions/structs
pub use num_traits;
