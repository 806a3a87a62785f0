use gradgraph_core::{GradGraphError, Graph, NodeId};
use gradgraph_optim::{Optimizer, UpdateRule};

#[allow(dead_code)]
pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// One training iteration: optional lookahead, forward/backward, update.
/// Returns the objective value the gradients were computed at.
#[allow(dead_code)]
pub fn train_step<R: UpdateRule<f64>>(
    graph: &mut Graph<f64>,
    objective: NodeId,
    optimizer: &mut Optimizer<f64, R>,
) -> Result<f64, GradGraphError> {
    optimizer.prepare(graph)?;
    graph.calculate_derivatives(objective)?;
    let value = graph.scalar_value(objective)?;
    optimizer.step(graph)?;
    Ok(value)
}

/// Current objective value after re-evaluating the graph.
#[allow(dead_code)]
pub fn objective_value(graph: &mut Graph<f64>, objective: NodeId) -> f64 {
    graph.eval(objective).unwrap();
    graph.scalar_value(objective).unwrap()
}
