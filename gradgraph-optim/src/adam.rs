use crate::rule::{decay_rate, epsilon, learning_rate, UpdateRule};
use gradgraph_core::{GradGraphError, GraphFloat};
use num_traits::Float;

/// Adam with bias-corrected moment estimates.
///
/// ```text
/// m = beta1 * m + (1 - beta1) * grad
/// v = beta2 * v + (1 - beta2) * grad * grad
/// param -= lr * (m / (1 - beta1^t)) / (sqrt(v / (1 - beta2^t)) + eps)
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Adam<T> {
    lr: T,
    beta1: T,
    beta2: T,
    eps: T,
}

/// First and second moment estimates of one parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct AdamState<T> {
    pub m: Vec<T>,
    pub v: Vec<T>,
}

impl<T: GraphFloat> Adam<T> {
    /// # Arguments
    /// * `lr` - Learning rate, positive.
    /// * `beta1` - Decay of the first moment, in `[0, 1)`.
    /// * `beta2` - Decay of the second moment, in `[0, 1)`.
    /// * `eps` - Guard added to the denominator, positive.
    pub fn new(lr: f64, beta1: f64, beta2: f64, eps: f64) -> Result<Self, GradGraphError> {
        Ok(Adam {
            lr: learning_rate(lr)?,
            beta1: decay_rate(beta1, "Beta1")?,
            beta2: decay_rate(beta2, "Beta2")?,
            eps: epsilon(eps)?,
        })
    }

    /// Default decay rates and epsilon with the given learning rate.
    pub fn with_lr(lr: f64) -> Result<Self, GradGraphError> {
        Self::new(lr, 0.9, 0.999, 1e-8)
    }

    pub fn lr(&self) -> T {
        self.lr
    }

    pub fn betas(&self) -> (T, T) {
        (self.beta1, self.beta2)
    }

    pub fn eps(&self) -> T {
        self.eps
    }
}

impl<T: GraphFloat> Default for Adam<T> {
    fn default() -> Self {
        Adam {
            lr: T::cast(1e-3),
            beta1: T::cast(0.9),
            beta2: T::cast(0.999),
            eps: T::cast(1e-8),
        }
    }
}

/// `1 - beta^t`, saturating the exponent for very long runs.
fn bias_correction<T: GraphFloat>(beta: T, step: u64) -> T {
    let t = i32::try_from(step).unwrap_or(i32::MAX);
    T::one() - Float::powi(beta, t)
}

impl<T: GraphFloat> UpdateRule<T> for Adam<T> {
    type State = AdamState<T>;

    fn name(&self) -> &'static str {
        "adam"
    }

    fn init_state(&self, len: usize) -> Self::State {
        AdamState {
            m: vec![T::zero(); len],
            v: vec![T::zero(); len],
        }
    }

    fn update(&self, param: &mut [T], grad: &[T], state: &mut Self::State, step: u64) {
        let correction1 = bias_correction(self.beta1, step.max(1));
        let correction2 = bias_correction(self.beta2, step.max(1));
        let one = T::one();

        for (k, (p, &g)) in param.iter_mut().zip(grad).enumerate() {
            let m = &mut state.m[k];
            let v = &mut state.v[k];
            *m = self.beta1 * *m + (one - self.beta1) * g;
            *v = self.beta2 * *v + (one - self.beta2) * g * g;

            let m_hat = *m / correction1;
            let v_hat = *v / correction2;
            *p -= self.lr * m_hat / (v_hat.sqrt() + self.eps);
        }
    }
}

#[cfg(test)]
#[path = "adam_test.rs"]
mod tests;
