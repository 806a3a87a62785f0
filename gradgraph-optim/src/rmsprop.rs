use crate::rule::{decay_rate, epsilon, learning_rate, UpdateRule};
use gradgraph_core::{GradGraphError, GraphFloat};

/// RMSProp: step sizes follow a decaying average of squared gradients.
///
/// ```text
/// V = beta * V + (1 - beta) * grad * grad
/// param -= lr * grad / (sqrt(V) + eps)
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RmsProp<T> {
    lr: T,
    beta: T,
    eps: T,
}

impl<T: GraphFloat> RmsProp<T> {
    pub fn new(lr: f64, beta: f64, eps: f64) -> Result<Self, GradGraphError> {
        Ok(RmsProp {
            lr: learning_rate(lr)?,
            beta: decay_rate(beta, "RMSProp beta")?,
            eps: epsilon(eps)?,
        })
    }

    pub fn lr(&self) -> T {
        self.lr
    }

    pub fn beta(&self) -> T {
        self.beta
    }

    pub fn eps(&self) -> T {
        self.eps
    }
}

impl<T: GraphFloat> Default for RmsProp<T> {
    fn default() -> Self {
        RmsProp {
            lr: T::cast(0.01),
            beta: T::cast(0.99),
            eps: T::cast(1e-8),
        }
    }
}

impl<T: GraphFloat> UpdateRule<T> for RmsProp<T> {
    /// Running average of squared gradients.
    type State = Vec<T>;

    fn name(&self) -> &'static str {
        "rmsprop"
    }

    fn init_state(&self, len: usize) -> Self::State {
        vec![T::zero(); len]
    }

    fn update(&self, param: &mut [T], grad: &[T], square_avg: &mut Self::State, _step: u64) {
        let keep = self.beta;
        let blend = T::one() - self.beta;
        for ((p, &g), s) in param.iter_mut().zip(grad).zip(square_avg.iter_mut()) {
            *s = keep * *s + blend * g * g;
            *p -= self.lr * g / (s.sqrt() + self.eps);
        }
    }
}
