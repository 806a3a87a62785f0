//! Gradient-based optimizers for `gradgraph-core` graphs.
//!
//! An [`Optimizer`] tracks a set of trainable leaves and, on every
//! [`Optimizer::step`], feeds each leaf's value and gradient accumulator to an
//! [`UpdateRule`]. Rules work on flat buffers, so scalar, vector and matrix
//! parameters are updated the same way.
//!
//! ```
//! use gradgraph_core::Graph;
//! use gradgraph_optim::{GradientDescent, Optimizer};
//!
//! let mut g: Graph<f64> = Graph::new();
//! let w = g.parameter(vec![3.0, -2.0]);
//! let sq = g.mul(w, w)?;
//! let loss = g.sum(sq)?;
//!
//! let mut opt = Optimizer::from_objective(&g, loss, GradientDescent::new(0.1)?)?;
//! for _ in 0..100 {
//!     g.calculate_derivatives(loss)?;
//!     opt.step(&mut g)?;
//! }
//! assert!(g.scalar_value(loss)? < 1e-6);
//! # Ok::<(), gradgraph_core::GradGraphError>(())
//! ```

pub mod adagrad;
pub mod adam;
pub mod momentum;
pub mod optimizer;
pub mod rmsprop;
pub mod rule;
pub mod sgd;

pub use adagrad::AdaGrad;
pub use adam::{Adam, AdamState};
pub use momentum::{Momentum, Nesterov, NesterovState};
pub use optimizer::Optimizer;
pub use rmsprop::RmsProp;
pub use rule::UpdateRule;
pub use sgd::GradientDescent;
