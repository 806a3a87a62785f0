use crate::autograd::parallel;
use crate::error::GradGraphError;
use crate::graph::{Graph, NodeId};
use crate::numeric::GraphFloat;
use crate::value::{Matrix, Value};
use log::debug;

impl<T: GraphFloat> Graph<T> {
    /// Forward pass only: re-evaluates every node reachable from `root` in
    /// dependency order. Gradient accumulators are left untouched.
    pub fn eval(&mut self, root: NodeId) -> Result<(), GradGraphError> {
        let order = self.topo_indices(root)?;
        debug!("eval: {} nodes (parallel: {})", order.len(), self.config.parallel);
        self.forward_pass(&order);
        Ok(())
    }

    /// Full two-phase pass with `root` as the objective.
    ///
    /// Every reachable node is evaluated and its accumulator reset to zero,
    /// the root accumulator is seeded with ones, and gradients are then
    /// propagated in reverse dependency order. Afterwards
    /// [`Graph::gradient`] returns `d(root)/d(node)` for every reachable node.
    pub fn calculate_derivatives(&mut self, root: NodeId) -> Result<(), GradGraphError> {
        let seed = Value::ones(self.shape(root)?);
        self.calculate_derivatives_with_seed(root, seed)
    }

    /// Same as [`Graph::calculate_derivatives`] with a caller-supplied seed
    /// of the root's shape, i.e. a vector-Jacobian product.
    pub fn calculate_derivatives_with_seed(
        &mut self,
        root: NodeId,
        seed: impl Into<Value<T>>,
    ) -> Result<(), GradGraphError> {
        let seed = seed.into();
        let root_index = self.resolve(root)?;
        let expected = self.values[root_index].shape();
        if seed.shape() != expected {
            return Err(GradGraphError::shape_mismatch(
                expected,
                seed.shape(),
                "calculate_derivatives_with_seed",
            ));
        }

        let order = self.topo_indices(root)?;
        debug!(
            "calculate_derivatives: {} nodes (parallel: {})",
            order.len(),
            self.config.parallel
        );
        self.forward_pass(&order);
        self.zero_gradients(&order);
        self.grads[root_index] = seed;
        self.backward_pass(&order);
        Ok(())
    }

    /// Jacobian of `output` with respect to `wrt`.
    ///
    /// Row `i` holds the gradient of the `i`-th element of `output` (row-major
    /// for matrix outputs) with respect to every element of `wrt`. One
    /// forward pass is followed by one one-hot seeded backward pass per output
    /// element. If `wrt` does not influence `output` the result is all zeros.
    pub fn jacobian(&mut self, output: NodeId, wrt: NodeId) -> Result<Matrix<T>, GradGraphError> {
        let output_index = self.resolve(output)?;
        let wrt_index = self.resolve(wrt)?;
        let out_shape = self.values[output_index].shape();
        let (rows, cols) = (out_shape.numel(), self.values[wrt_index].numel());

        let order = self.topo_indices(output)?;
        let mut jacobian = Matrix::zeros(rows, cols);
        if !order.contains(&wrt_index) {
            return Ok(jacobian);
        }

        debug!("jacobian: {} x {} over {} nodes", rows, cols, order.len());
        self.forward_pass(&order);
        for row in 0..rows {
            self.zero_gradients(&order);
            self.grads[output_index].as_mut_slice()[row] = T::one();
            self.backward_pass(&order);
            jacobian
                .row_mut(row)
                .copy_from_slice(self.grads[wrt_index].as_slice());
        }
        Ok(jacobian)
    }

    fn forward_pass(&mut self, order: &[usize]) {
        if self.config.parallel {
            let layers = self.layer_indices(order);
            parallel::forward_layers(self, &layers);
        } else {
            for &index in order {
                self.evaluate_index(index);
            }
        }
    }

    fn backward_pass(&mut self, order: &[usize]) {
        if self.config.parallel {
            let layers = self.layer_indices(order);
            parallel::backward_layers(self, &layers);
        } else {
            for &index in order.iter().rev() {
                self.propagate_index(index);
            }
        }
    }

    fn zero_gradients(&mut self, order: &[usize]) {
        for &index in order {
            self.grads[index].fill(T::zero());
        }
    }
}
