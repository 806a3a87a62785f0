//! Velocity-based rules: classical momentum and Nesterov lookahead.

use crate::rule::{decay_rate, learning_rate, UpdateRule};
use gradgraph_core::{GradGraphError, GraphFloat};

/// Heavy-ball momentum. The velocity accumulates raw gradients and is scaled
/// by the learning rate once, when applied:
///
/// ```text
/// v = beta * v + grad
/// param -= lr * v
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Momentum<T> {
    lr: T,
    beta: T,
}

impl<T: GraphFloat> Momentum<T> {
    pub fn new(lr: f64, beta: f64) -> Result<Self, GradGraphError> {
        Ok(Momentum {
            lr: learning_rate(lr)?,
            beta: decay_rate(beta, "Momentum beta")?,
        })
    }

    pub fn lr(&self) -> T {
        self.lr
    }

    pub fn beta(&self) -> T {
        self.beta
    }
}

impl<T: GraphFloat> Default for Momentum<T> {
    fn default() -> Self {
        Momentum {
            lr: T::cast(0.01),
            beta: T::cast(0.9),
        }
    }
}

impl<T: GraphFloat> UpdateRule<T> for Momentum<T> {
    /// Velocity.
    type State = Vec<T>;

    fn name(&self) -> &'static str {
        "momentum"
    }

    fn init_state(&self, len: usize) -> Self::State {
        vec![T::zero(); len]
    }

    fn update(&self, param: &mut [T], grad: &[T], velocity: &mut Self::State, _step: u64) {
        for ((p, &g), v) in param.iter_mut().zip(grad).zip(velocity.iter_mut()) {
            *v = self.beta * *v + g;
            *p -= self.lr * *v;
        }
    }
}

/// Nesterov accelerated gradient in lookahead form.
///
/// [`UpdateRule::prepare`] remembers `theta` and moves the parameter to the
/// lookahead point `theta + beta * v`; the caller then computes the gradient
/// there and steps:
///
/// ```text
/// v = beta * v - lr * grad
/// theta = theta_saved + v
/// ```
///
/// Stepping without a preceding `prepare` applies the same velocity update
/// from the current value, i.e. classical momentum.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Nesterov<T> {
    lr: T,
    beta: T,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NesterovState<T> {
    pub velocity: Vec<T>,
    /// Parameter value before the lookahead move, set by `prepare`.
    pub saved: Option<Vec<T>>,
}

impl<T: GraphFloat> Nesterov<T> {
    pub fn new(lr: f64, beta: f64) -> Result<Self, GradGraphError> {
        Ok(Nesterov {
            lr: learning_rate(lr)?,
            beta: decay_rate(beta, "Nesterov beta")?,
        })
    }

    pub fn lr(&self) -> T {
        self.lr
    }

    pub fn beta(&self) -> T {
        self.beta
    }
}

impl<T: GraphFloat> Default for Nesterov<T> {
    fn default() -> Self {
        Nesterov {
            lr: T::cast(0.01),
            beta: T::cast(0.9),
        }
    }
}

impl<T: GraphFloat> UpdateRule<T> for Nesterov<T> {
    type State = NesterovState<T>;

    fn name(&self) -> &'static str {
        "nesterov"
    }

    fn init_state(&self, len: usize) -> Self::State {
        NesterovState {
            velocity: vec![T::zero(); len],
            saved: None,
        }
    }

    fn prepare(&self, param: &mut [T], state: &mut Self::State) {
        // A second prepare keeps the original anchor.
        let saved = state.saved.get_or_insert_with(|| param.to_vec());
        for ((p, &theta), &v) in param.iter_mut().zip(saved.iter()).zip(&state.velocity) {
            *p = theta + self.beta * v;
        }
    }

    fn update(&self, param: &mut [T], grad: &[T], state: &mut Self::State, _step: u64) {
        for (v, &g) in state.velocity.iter_mut().zip(grad) {
            *v = self.beta * *v - self.lr * g;
        }
        match state.saved.take() {
            Some(saved) => {
                for ((p, theta), &v) in param.iter_mut().zip(saved).zip(&state.velocity) {
                    *p = theta + v;
                }
            }
            None => {
                for (p, &v) in param.iter_mut().zip(&state.velocity) {
                    *p += v;
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "momentum_test.rs"]
mod tests;
