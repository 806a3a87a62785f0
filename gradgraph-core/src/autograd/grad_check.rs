use crate::error::GradGraphError;
use crate::graph::{Graph, NodeId};
use crate::numeric::GraphFloat;
use crate::value::Value;
use approx::relative_eq;
use log::debug;
use thiserror::Error;

/// Error type specifically for gradient checking failures.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GradCheckError {
    #[error("Gradient check failed for input {input_index}, element {element_index}: analytical {analytical:?} != numerical {numerical:?} (difference {difference:?})")]
    GradientMismatch {
        input_index: usize,
        element_index: usize,
        analytical: f64,
        numerical: f64,
        difference: f64,
    },

    #[error("Numerical gradient is NaN or infinite for input {input_index}, element {element_index}. Loss+: {loss_plus:?}, Loss-: {loss_minus:?}")]
    NonFiniteNumerical {
        input_index: usize,
        element_index: usize,
        loss_plus: f64,
        loss_minus: f64,
    },

    #[error("Analytical gradient is NaN or infinite for input {input_index}, element {element_index}. Value: {value:?}")]
    NonFiniteAnalytical {
        input_index: usize,
        element_index: usize,
        value: f64,
    },

    #[error("Gradient check input must be a leaf node. Input index: {input_index}")]
    InputNotLeaf { input_index: usize },

    #[error("Graph error during gradient check: {0}")]
    Graph(#[from] GradGraphError),
}

/// Compares the gradients of `output` with respect to each leaf in `inputs`
/// against central finite differences.
///
/// The output is reduced to a scalar by weighting it with `output_grad`
/// (all ones when `None`), which is also the seed of the analytical backward
/// pass. Every input element is perturbed by `±epsilon`, the graph is
/// re-evaluated, and the estimate `(L+ - L-) / (x+ - x-)` must match the
/// analytical gradient within `tolerance`, both absolute and relative.
///
/// Input values are restored and the graph re-evaluated before returning.
///
/// # Arguments
/// * `graph` - The graph holding `output` and `inputs`.
/// * `output` - The node being differentiated.
/// * `inputs` - Leaves to differentiate against.
/// * `output_grad` - Optional seed of `output`'s shape.
/// * `epsilon` - Perturbation size.
/// * `tolerance` - Allowed deviation.
pub fn check_grad<T: GraphFloat>(
    graph: &mut Graph<T>,
    output: NodeId,
    inputs: &[NodeId],
    output_grad: Option<&Value<T>>,
    epsilon: f64,
    tolerance: f64,
) -> Result<(), GradCheckError> {
    // --- Initial Checks ---
    if !(epsilon > 0.0) || !(tolerance > 0.0) {
        return Err(GradGraphError::ConfigurationError(format!(
            "gradient check needs positive epsilon and tolerance, got {} and {}",
            epsilon, tolerance
        ))
        .into());
    }
    for (input_index, &input) in inputs.iter().enumerate() {
        if !graph.is_leaf(input)? {
            return Err(GradCheckError::InputNotLeaf { input_index });
        }
    }
    let seed = match output_grad {
        Some(seed) => seed.clone(),
        None => Value::ones(graph.shape(output)?),
    };

    // --- 1. Analytical gradients ---
    for &input in inputs {
        graph.reset_gradient(input, T::zero())?;
    }
    graph.calculate_derivatives_with_seed(output, seed.clone())?;
    let analytical = inputs
        .iter()
        .map(|&input| {
            graph
                .gradient(input)
                .map(|g| g.as_slice().iter().map(|x| x.widen()).collect::<Vec<f64>>())
        })
        .collect::<Result<Vec<_>, _>>()?;

    // --- 2. Numerical gradients, element by element ---
    let step = T::cast(epsilon);
    let mut outcome = Ok(());
    'inputs: for (input_index, &input) in inputs.iter().enumerate() {
        for (element_index, &analytical_grad) in analytical[input_index].iter().enumerate() {
            let original = graph.leaf_values_mut(input)?[element_index];
            let (plus, minus) = (original + step, original - step);

            graph.leaf_values_mut(input)?[element_index] = plus;
            let loss_plus = weighted_output(graph, output, &seed)?;
            graph.leaf_values_mut(input)?[element_index] = minus;
            let loss_minus = weighted_output(graph, output, &seed)?;
            graph.leaf_values_mut(input)?[element_index] = original;

            if !loss_plus.is_finite() || !loss_minus.is_finite() {
                outcome = Err(GradCheckError::NonFiniteNumerical {
                    input_index,
                    element_index,
                    loss_plus,
                    loss_minus,
                });
                break 'inputs;
            }
            if !analytical_grad.is_finite() {
                outcome = Err(GradCheckError::NonFiniteAnalytical {
                    input_index,
                    element_index,
                    value: analytical_grad,
                });
                break 'inputs;
            }

            let numerical = (loss_plus - loss_minus) / (plus - minus).widen();
            if !relative_eq!(
                analytical_grad,
                numerical,
                epsilon = tolerance,
                max_relative = tolerance
            ) {
                outcome = Err(GradCheckError::GradientMismatch {
                    input_index,
                    element_index,
                    analytical: analytical_grad,
                    numerical,
                    difference: (analytical_grad - numerical).abs(),
                });
                break 'inputs;
            }
        }
    }

    // --- 3. Restore the forward state ---
    graph.eval(output)?;
    debug!(
        "Gradient check over {} inputs finished: {}",
        inputs.len(),
        if outcome.is_ok() { "ok" } else { "mismatch" }
    );
    outcome
}

/// `Σ seed ⊙ output` after a fresh forward pass.
fn weighted_output<T: GraphFloat>(
    graph: &mut Graph<T>,
    output: NodeId,
    seed: &Value<T>,
) -> Result<f64, GradGraphError> {
    graph.eval(output)?;
    Ok(graph
        .value(output)?
        .as_slice()
        .iter()
        .zip(seed.as_slice())
        .map(|(y, s)| y.widen() * s.widen())
        .sum())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_grad_accepts_correct_gradients() {
        let mut graph: Graph<f64> = Graph::new();
        let x = graph.parameter(vec![0.3, -1.2, 2.0]);
        let y = graph.parameter(vec![1.5, 0.7, -0.4]);
        let p = graph.mul(x, y).unwrap();
        let s = graph.sin(p).unwrap();
        let out = graph.sum(s).unwrap();

        check_grad(&mut graph, out, &[x, y], None, 1e-6, 1e-5).unwrap();

        // Values are restored afterwards.
        assert_eq!(graph.value(x).unwrap().as_slice(), &[0.3, -1.2, 2.0]);
    }

    #[test]
    fn test_check_grad_rejects_derived_inputs() {
        let mut graph: Graph<f64> = Graph::new();
        let x = graph.parameter(2.0);
        let y = graph.exp(x).unwrap();
        let err = check_grad(&mut graph, y, &[y], None, 1e-6, 1e-5).unwrap_err();
        assert_eq!(err, GradCheckError::InputNotLeaf { input_index: 0 });
    }

    #[test]
    fn test_check_grad_rejects_bad_settings() {
        let mut graph: Graph<f64> = Graph::new();
        let x = graph.parameter(2.0);
        let err = check_grad(&mut graph, x, &[x], None, 0.0, 1e-5).unwrap_err();
        assert!(matches!(
            err,
            GradCheckError::Graph(GradGraphError::ConfigurationError(_))
        ));
    }

    #[test]
    fn test_check_grad_reports_non_finite_values() {
        let mut graph: Graph<f64> = Graph::new();
        let x = graph.parameter(0.0);
        let y = graph.ln(x).unwrap();
        let err = check_grad(&mut graph, y, &[x], None, 1e-6, 1e-5).unwrap_err();
        assert!(matches!(err, GradCheckError::NonFiniteNumerical { .. }));
    }
}
