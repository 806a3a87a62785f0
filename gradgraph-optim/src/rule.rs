use gradgraph_core::{GradGraphError, GraphFloat};
use std::fmt::Debug;

/// Per-element arithmetic applied to one parameter on every optimizer step.
///
/// Rules work on the flat row-major buffers of a leaf, so scalars, vectors
/// and matrices are handled identically. Each tracked parameter owns one
/// `State`, created by [`UpdateRule::init_state`] with the parameter's
/// element count.
pub trait UpdateRule<T: GraphFloat> {
    /// Auxiliary per-parameter record (velocity, moment estimates, ...).
    type State: Debug + Clone;

    fn name(&self) -> &'static str;

    fn init_state(&self, len: usize) -> Self::State;

    /// Writes the new value of `param` in place from its gradient.
    ///
    /// # Arguments
    /// * `param` - The parameter values, updated in place.
    /// * `grad` - The gradient accumulator of the same parameter.
    /// * `state` - This parameter's auxiliary state.
    /// * `step` - Number of the current step, starting at 1.
    fn update(&self, param: &mut [T], grad: &[T], state: &mut Self::State, step: u64);

    /// Hook run before the gradient of the next step is computed. Rules that
    /// evaluate the gradient at a lookahead point move `param` there.
    fn prepare(&self, _param: &mut [T], _state: &mut Self::State) {}
}

// --- Hyper-parameter validation ---

fn to_float<T: GraphFloat>(value: f64, what: &str) -> Result<T, GradGraphError> {
    num_traits::cast::<f64, T>(value).ok_or_else(|| {
        GradGraphError::ConfigurationError(format!("{} {} is not representable", what, value))
    })
}

pub(crate) fn learning_rate<T: GraphFloat>(lr: f64) -> Result<T, GradGraphError> {
    if !(lr > 0.0) || !lr.is_finite() {
        return Err(GradGraphError::ConfigurationError(format!(
            "Learning rate must be positive and finite, got {}",
            lr
        )));
    }
    to_float(lr, "Learning rate")
}

/// A decay rate in `[0, 1)`.
pub(crate) fn decay_rate<T: GraphFloat>(beta: f64, name: &str) -> Result<T, GradGraphError> {
    if !(0.0..1.0).contains(&beta) {
        return Err(GradGraphError::ConfigurationError(format!(
            "{} must be in [0, 1), got {}",
            name, beta
        )));
    }
    to_float(beta, name)
}

pub(crate) fn epsilon<T: GraphFloat>(eps: f64) -> Result<T, GradGraphError> {
    if !(eps > 0.0) || !eps.is_finite() {
        return Err(GradGraphError::ConfigurationError(format!(
            "Epsilon must be positive, got {}",
            eps
        )));
    }
    to_float(eps, "Epsilon")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_rejects_out_of_range_values() {
        assert!(learning_rate::<f32>(0.1).is_ok());
        assert!(matches!(
            learning_rate::<f32>(0.0),
            Err(GradGraphError::ConfigurationError(_))
        ));
        assert!(learning_rate::<f64>(f64::NAN).is_err());
        assert!(learning_rate::<f64>(-1.0).is_err());

        assert_eq!(decay_rate::<f64>(0.0, "beta").unwrap(), 0.0);
        assert!(decay_rate::<f64>(1.0, "beta").is_err());
        assert!(decay_rate::<f64>(-0.1, "beta").is_err());

        assert!(epsilon::<f64>(1e-8).is_ok());
        assert!(epsilon::<f64>(0.0).is_err());
    }
}
