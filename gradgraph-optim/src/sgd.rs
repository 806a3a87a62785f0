use crate::rule::{learning_rate, UpdateRule};
use gradgraph_core::{GradGraphError, GraphFloat};

/// Plain gradient descent: `param -= lr * grad`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GradientDescent<T> {
    lr: T,
}

impl<T: GraphFloat> GradientDescent<T> {
    pub fn new(lr: f64) -> Result<Self, GradGraphError> {
        Ok(GradientDescent {
            lr: learning_rate(lr)?,
        })
    }

    pub fn lr(&self) -> T {
        self.lr
    }
}

impl<T: GraphFloat> Default for GradientDescent<T> {
    fn default() -> Self {
        GradientDescent { lr: T::cast(0.01) }
    }
}

impl<T: GraphFloat> UpdateRule<T> for GradientDescent<T> {
    type State = ();

    fn name(&self) -> &'static str {
        "gradient_descent"
    }

    fn init_state(&self, _len: usize) -> Self::State {}

    fn update(&self, param: &mut [T], grad: &[T], _state: &mut Self::State, _step: u64) {
        for (p, &g) in param.iter_mut().zip(grad) {
            *p -= self.lr * g;
        }
    }
}

#[cfg(test)]
#[path = "sgd_test.rs"]
mod tests;
