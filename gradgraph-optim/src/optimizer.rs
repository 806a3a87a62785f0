use crate::rule::UpdateRule;
use gradgraph_core::{GradGraphError, Graph, GraphFloat, NodeId};
use log::{debug, trace, warn};
use std::marker::PhantomData;

/// Applies an [`UpdateRule`] to a fixed set of trainable leaves.
///
/// The optimizer holds node handles and one rule state per parameter; the
/// graph itself is passed to every call. A typical iteration is
/// `prepare` (for lookahead rules), `calculate_derivatives` on the
/// objective, then `step`.
#[derive(Debug, Clone)]
pub struct Optimizer<T: GraphFloat, R: UpdateRule<T>> {
    rule: R,
    params: Vec<NodeId>,
    /// Element count of each parameter, for re-creating states.
    lens: Vec<usize>,
    states: Vec<R::State>,
    steps: u64,
    _element: PhantomData<T>,
}

impl<T: GraphFloat, R: UpdateRule<T>> Optimizer<T, R> {
    /// Tracks every trainable leaf the objective depends on, in topological
    /// order.
    pub fn from_objective(
        graph: &Graph<T>,
        objective: NodeId,
        rule: R,
    ) -> Result<Self, GradGraphError> {
        let mut params = Vec::new();
        for id in graph.topological_order(objective)? {
            if graph.is_leaf(id)? && graph.is_trainable(id)? {
                params.push(id);
            }
        }
        if params.is_empty() {
            warn!(
                "Optimizer ({}) built from {} tracks no trainable parameters",
                rule.name(),
                objective
            );
        }
        Self::build(graph, params, rule)
    }

    /// Tracks the given leaves, whether or not they are flagged trainable.
    /// Repeated handles are tracked once.
    pub fn with_params(
        graph: &Graph<T>,
        params: &[NodeId],
        rule: R,
    ) -> Result<Self, GradGraphError> {
        let mut unique: Vec<NodeId> = Vec::with_capacity(params.len());
        for &id in params {
            if !graph.is_leaf(id)? {
                return Err(GradGraphError::NotALeaf { index: id.index() });
            }
            if !unique.contains(&id) {
                unique.push(id);
            }
        }
        Self::build(graph, unique, rule)
    }

    fn build(graph: &Graph<T>, params: Vec<NodeId>, rule: R) -> Result<Self, GradGraphError> {
        let lens = params
            .iter()
            .map(|&id| graph.value(id).map(|v| v.numel()))
            .collect::<Result<Vec<_>, _>>()?;
        let states = lens.iter().map(|&len| rule.init_state(len)).collect();
        debug!(
            "Optimizer ({}) tracking {} parameters",
            rule.name(),
            params.len()
        );
        Ok(Optimizer {
            rule,
            params,
            lens,
            states,
            steps: 0,
            _element: PhantomData,
        })
    }

    /// Updates every tracked parameter from its current gradient accumulator.
    pub fn step(&mut self, graph: &mut Graph<T>) -> Result<(), GradGraphError> {
        self.steps += 1;
        for (&id, state) in self.params.iter().zip(self.states.iter_mut()) {
            let (values, grads) = graph.leaf_buffers_mut(id)?;
            self.rule.update(values, grads, state, self.steps);
            trace!("{} step {} updated {}", self.rule.name(), self.steps, id);
        }
        debug!(
            "{} step {} over {} parameters",
            self.rule.name(),
            self.steps,
            self.params.len()
        );
        Ok(())
    }

    /// Runs the rule's pre-step hook on every tracked parameter.
    pub fn prepare(&mut self, graph: &mut Graph<T>) -> Result<(), GradGraphError> {
        for (&id, state) in self.params.iter().zip(self.states.iter_mut()) {
            self.rule.prepare(graph.leaf_values_mut(id)?, state);
        }
        Ok(())
    }

    /// Clears the gradient accumulators of the tracked parameters.
    pub fn zero_grad(&self, graph: &mut Graph<T>) -> Result<(), GradGraphError> {
        for &id in &self.params {
            graph.reset_gradient(id, T::zero())?;
        }
        Ok(())
    }

    /// Forgets all rule state and the step count.
    pub fn reset(&mut self) {
        self.states = self.lens.iter().map(|&len| self.rule.init_state(len)).collect();
        self.steps = 0;
    }

    pub fn params(&self) -> &[NodeId] {
        &self.params
    }

    pub fn steps(&self) -> u64 {
        self.steps
    }

    pub fn rule(&self) -> &R {
        &self.rule
    }

    pub fn states(&self) -> &[R::State] {
        &self.states
    }
}

#[cfg(test)]
#[path = "optimizer_test.rs"]
mod tests;
