use crate::error::GradGraphError;
use crate::graph::{Graph, NodeId};
use crate::numeric::GraphFloat;

impl<T: GraphFloat> Graph<T> {
    /// Mean squared error `Σ (prediction - target)² / n` as a scalar node.
    ///
    /// Built from `sub`, `mul`, `sum` and `scale_by`, so it needs no
    /// dedicated backward rule.
    pub fn mse_loss(&mut self, prediction: NodeId, target: NodeId) -> Result<NodeId, GradGraphError> {
        let shape = self.elementwise_shape(prediction, target, "mse_loss")?;
        let n = shape.numel();
        if n == 0 {
            return Err(GradGraphError::EmptyInput {
                operation: "mse_loss".to_string(),
            });
        }
        let diff = self.sub(prediction, target)?;
        let squared = self.mul(diff, diff)?;
        let total = self.sum(squared)?;
        self.scale_by(total, T::one() / T::cast(n as f64))
    }
}
