use crate::rule::{epsilon, learning_rate, UpdateRule};
use gradgraph_core::{GradGraphError, GraphFloat};

/// AdaGrad: per-element step sizes shrink with the running sum of squared
/// gradients.
///
/// ```text
/// G += grad * grad
/// param -= lr * grad / (sqrt(G) + eps)
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AdaGrad<T> {
    lr: T,
    eps: T,
}

impl<T: GraphFloat> AdaGrad<T> {
    pub fn new(lr: f64, eps: f64) -> Result<Self, GradGraphError> {
        Ok(AdaGrad {
            lr: learning_rate(lr)?,
            eps: epsilon(eps)?,
        })
    }

    pub fn lr(&self) -> T {
        self.lr
    }

    pub fn eps(&self) -> T {
        self.eps
    }
}

impl<T: GraphFloat> Default for AdaGrad<T> {
    fn default() -> Self {
        AdaGrad {
            lr: T::cast(0.01),
            eps: T::cast(1e-8),
        }
    }
}

impl<T: GraphFloat> UpdateRule<T> for AdaGrad<T> {
    /// Sum of squared gradients.
    type State = Vec<T>;

    fn name(&self) -> &'static str {
        "adagrad"
    }

    fn init_state(&self, len: usize) -> Self::State {
        vec![T::zero(); len]
    }

    fn update(&self, param: &mut [T], grad: &[T], sum_sq: &mut Self::State, _step: u64) {
        for ((p, &g), s) in param.iter_mut().zip(grad).zip(sum_sq.iter_mut()) {
            *s += g * g;
            *p -= self.lr * g / (s.sqrt() + self.eps);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_adagrad_first_steps() {
        let rule = AdaGrad::<f64>::new(0.5, 1e-8).unwrap();
        let mut param = vec![1.0, -1.0];
        let mut state = rule.init_state(2);

        rule.update(&mut param, &[2.0, -4.0], &mut state, 1);
        // First step moves each element by about lr in the gradient direction.
        assert_relative_eq!(param[0], 0.5, epsilon = 1e-6);
        assert_relative_eq!(param[1], -0.5, epsilon = 1e-6);
        assert_eq!(state, vec![4.0, 16.0]);

        rule.update(&mut param, &[2.0, 0.0], &mut state, 2);
        assert_relative_eq!(param[0], 0.5 - 0.5 * 2.0 / 8.0f64.sqrt(), epsilon = 1e-6);
        assert_relative_eq!(param[1], -0.5, epsilon = 1e-12);
    }

    #[test]
    fn test_adagrad_zero_gradient_is_guarded() {
        let rule = AdaGrad::<f32>::default();
        let mut param = vec![3.0f32];
        let mut state = rule.init_state(1);
        rule.update(&mut param, &[0.0], &mut state, 1);
        assert_eq!(param[0], 3.0);
        assert!(AdaGrad::<f32>::new(0.1, 0.0).is_err());
    }
}
