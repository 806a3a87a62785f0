//! Traversal and gradient accumulation over a [`Graph`](crate::Graph).
//!
//! - `topo`: operands-before-consumers ordering and dependency layers.
//! - `backward`: the forward/backward driver (`eval`, `calculate_derivatives`,
//!   `jacobian`).
//! - `parallel`: the layered rayon executor used when
//!   [`GraphConfig::parallel`](crate::GraphConfig) is set.
//! - `grad_check`: finite-difference verification of analytical gradients.

pub mod backward;
pub mod grad_check;
pub(crate) mod parallel;
pub mod topo;

pub use grad_check::{check_grad, GradCheckError};
