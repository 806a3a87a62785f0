//! The node arena.
//!
//! A [`Graph`] owns every node in struct-of-arrays form: per-node metadata
//! (operation, flags, consumer edges), current values and gradient
//! accumulators. Nodes are addressed by [`NodeId`] handles. An operation can
//! only reference nodes that already exist, so every operand index is
//! strictly smaller than the index of its consumer and the graph is acyclic
//! by construction.

use crate::config::GraphConfig;
use crate::error::GradGraphError;
use crate::numeric::GraphFloat;
use crate::ops::{self, Op};
use crate::value::{Rank, Shape, Value};
use log::{debug, trace};
use std::fmt;

/// Handle to a node of a [`Graph`].
///
/// The generation ties the handle to the arena epoch it was created in, so a
/// handle to a node discarded by [`Graph::rewind`] is rejected even when its
/// index has been reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId {
    index: usize,
    generation: u64,
}

impl NodeId {
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "n{}", self.index)
    }
}

#[derive(Debug, Clone)]
pub(crate) struct NodeMeta {
    pub(crate) op: Op,
    pub(crate) generation: u64,
    pub(crate) trainable: bool,
    pub(crate) name: Option<String>,
    /// Indices of the nodes reading this one, in creation order, deduplicated.
    pub(crate) consumers: Vec<usize>,
}

/// Marker returned by [`Graph::checkpoint`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Checkpoint {
    len: usize,
    epoch: u64,
}

impl Checkpoint {
    /// Number of nodes alive when the checkpoint was taken.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

/// A computation graph over scalars, vectors and matrices of `T`.
#[derive(Debug, Clone)]
pub struct Graph<T: GraphFloat = f32> {
    pub(crate) meta: Vec<NodeMeta>,
    pub(crate) values: Vec<Value<T>>,
    pub(crate) grads: Vec<Value<T>>,
    epoch: u64,
    pub(crate) config: GraphConfig,
}

impl<T: GraphFloat> Default for Graph<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: GraphFloat> Graph<T> {
    pub fn new() -> Self {
        Self::with_config(GraphConfig::default())
    }

    pub fn with_config(config: GraphConfig) -> Self {
        Graph {
            meta: Vec::new(),
            values: Vec::new(),
            grads: Vec::new(),
            epoch: 0,
            config,
        }
    }

    pub fn config(&self) -> &GraphConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: GraphConfig) {
        self.config = config;
    }

    /// Number of live nodes.
    pub fn len(&self) -> usize {
        self.meta.len()
    }

    pub fn is_empty(&self) -> bool {
        self.meta.is_empty()
    }

    // --- Leaves ---

    /// Adds a non-trainable leaf (an input or a constant).
    pub fn leaf(&mut self, value: impl Into<Value<T>>) -> NodeId {
        self.push_leaf(value.into(), false)
    }

    /// Adds a trainable leaf, picked up by optimizers built from an objective.
    pub fn parameter(&mut self, value: impl Into<Value<T>>) -> NodeId {
        self.push_leaf(value.into(), true)
    }

    /// Replaces the value of a leaf. The new value must keep the leaf's shape.
    pub fn set_value(&mut self, id: NodeId, value: impl Into<Value<T>>) -> Result<(), GradGraphError> {
        let index = self.leaf_index(id)?;
        let value = value.into();
        let expected = self.values[index].shape();
        if value.shape() != expected {
            return Err(GradGraphError::shape_mismatch(
                expected,
                value.shape(),
                "set_value",
            ));
        }
        self.values[index] = value;
        Ok(())
    }

    /// Flat, row-major, writable view of a leaf's value.
    pub fn leaf_values_mut(&mut self, id: NodeId) -> Result<&mut [T], GradGraphError> {
        let index = self.leaf_index(id)?;
        Ok(self.values[index].as_mut_slice())
    }

    /// Writable value buffer and read-only gradient buffer of a leaf, borrowed
    /// together so an update rule can consume one while writing the other.
    pub fn leaf_buffers_mut(&mut self, id: NodeId) -> Result<(&mut [T], &[T]), GradGraphError> {
        let index = self.leaf_index(id)?;
        Ok((self.values[index].as_mut_slice(), self.grads[index].as_slice()))
    }

    pub fn set_trainable(&mut self, id: NodeId, trainable: bool) -> Result<(), GradGraphError> {
        let index = self.leaf_index(id)?;
        self.meta[index].trainable = trainable;
        Ok(())
    }

    pub fn is_trainable(&self, id: NodeId) -> Result<bool, GradGraphError> {
        Ok(self.meta[self.resolve(id)?].trainable)
    }

    pub fn is_leaf(&self, id: NodeId) -> Result<bool, GradGraphError> {
        Ok(self.meta[self.resolve(id)?].op.is_leaf())
    }

    // --- Labels ---

    /// Attaches a debugging label, used by [`Graph::expression`].
    pub fn set_name(&mut self, id: NodeId, name: impl Into<String>) -> Result<(), GradGraphError> {
        let index = self.resolve(id)?;
        self.meta[index].name = Some(name.into());
        Ok(())
    }

    pub fn name(&self, id: NodeId) -> Result<Option<&str>, GradGraphError> {
        Ok(self.meta[self.resolve(id)?].name.as_deref())
    }

    // --- Reads ---

    pub fn value(&self, id: NodeId) -> Result<&Value<T>, GradGraphError> {
        Ok(&self.values[self.resolve(id)?])
    }

    /// The gradient accumulator, holding `d(objective)/d(node)` after a
    /// backward pass.
    pub fn gradient(&self, id: NodeId) -> Result<&Value<T>, GradGraphError> {
        Ok(&self.grads[self.resolve(id)?])
    }

    pub fn shape(&self, id: NodeId) -> Result<Shape, GradGraphError> {
        Ok(self.values[self.resolve(id)?].shape())
    }

    /// Value of a scalar node.
    pub fn scalar_value(&self, id: NodeId) -> Result<T, GradGraphError> {
        let value = self.value(id)?;
        value.as_scalar().ok_or_else(|| {
            GradGraphError::rank_mismatch(Rank::Scalar, value.rank(), "scalar_value")
        })
    }

    pub fn op(&self, id: NodeId) -> Result<&Op, GradGraphError> {
        Ok(&self.meta[self.resolve(id)?].op)
    }

    pub fn operands(&self, id: NodeId) -> Result<&[NodeId], GradGraphError> {
        Ok(self.meta[self.resolve(id)?].op.operands.as_slice())
    }

    pub fn consumers(&self, id: NodeId) -> Result<Vec<NodeId>, GradGraphError> {
        let index = self.resolve(id)?;
        Ok(self.meta[index]
            .consumers
            .iter()
            .map(|&c| self.handle(c))
            .collect())
    }

    // --- Node contract ---

    /// Recomputes a node's value from the current values of its operands.
    /// A no-op for leaves.
    pub fn evaluate(&mut self, id: NodeId) -> Result<(), GradGraphError> {
        let index = self.resolve(id)?;
        self.evaluate_index(index);
        Ok(())
    }

    /// Adds this node's chain-rule contribution into each operand's
    /// accumulator. A no-op for leaves.
    pub fn propagate_gradient(&mut self, id: NodeId) -> Result<(), GradGraphError> {
        let index = self.resolve(id)?;
        self.propagate_index(index);
        Ok(())
    }

    /// Sets every element of a node's accumulator to `seed`.
    pub fn reset_gradient(&mut self, id: NodeId, seed: T) -> Result<(), GradGraphError> {
        let index = self.resolve(id)?;
        self.grads[index].fill(seed);
        Ok(())
    }

    pub(crate) fn evaluate_index(&mut self, index: usize) {
        let (before, rest) = self.values.split_at_mut(index);
        ops::forward(&self.meta[index].op, before, &mut rest[0]);
    }

    pub(crate) fn propagate_index(&mut self, index: usize) {
        let (before, rest) = self.grads.split_at_mut(index);
        ops::backward(
            &self.meta[index].op,
            &self.values[index],
            &rest[0],
            &self.values,
            before,
        );
    }

    // --- Checkpoint / rewind ---

    pub fn checkpoint(&self) -> Checkpoint {
        Checkpoint {
            len: self.meta.len(),
            epoch: self.epoch,
        }
    }

    /// Drops every node created after `checkpoint` and zeroes the gradients
    /// of the nodes that remain.
    ///
    /// Handles to the dropped nodes become invalid, including once their
    /// indices are reused by new nodes. The epoch is a `u64`, so it cannot
    /// run out in any realistic rebuild loop. Fails with `ConfigurationError` when
    /// the checkpoint no longer describes a prefix of this arena (for example
    /// after rewinding further back than it).
    pub fn rewind(&mut self, checkpoint: Checkpoint) -> Result<(), GradGraphError> {
        let len = checkpoint.len;
        let still_prefix = len <= self.meta.len()
            && (len == 0 || self.meta[len - 1].generation <= checkpoint.epoch);
        if !still_prefix {
            return Err(GradGraphError::ConfigurationError(format!(
                "checkpoint of {} nodes (epoch {}) is not a prefix of the current graph",
                len, checkpoint.epoch
            )));
        }

        let dropped = self.meta.len() - len;
        self.meta.truncate(len);
        self.values.truncate(len);
        self.grads.truncate(len);
        for meta in &mut self.meta {
            meta.consumers.retain(|&c| c < len);
        }
        // Surviving accumulators hold derivatives of an objective that no
        // longer exists.
        for grad in &mut self.grads {
            grad.fill(T::zero());
        }
        self.epoch += 1;
        debug!(
            "Rewound graph to {} nodes, dropped {} (epoch {})",
            len, dropped, self.epoch
        );
        Ok(())
    }

    // --- Internal helpers shared by the op builders ---

    /// Validates a handle and returns its arena index.
    pub(crate) fn resolve(&self, id: NodeId) -> Result<usize, GradGraphError> {
        match self.meta.get(id.index) {
            Some(meta) if meta.generation == id.generation => Ok(id.index),
            _ => Err(GradGraphError::InvalidNode {
                index: id.index,
                generation: id.generation,
            }),
        }
    }

    fn leaf_index(&self, id: NodeId) -> Result<usize, GradGraphError> {
        let index = self.resolve(id)?;
        if !self.meta[index].op.is_leaf() {
            return Err(GradGraphError::NotALeaf { index });
        }
        Ok(index)
    }

    pub(crate) fn handle(&self, index: usize) -> NodeId {
        NodeId {
            index,
            generation: self.meta[index].generation,
        }
    }

    /// Shape of `id`, which must have the given rank.
    pub(crate) fn expect_rank(
        &self,
        id: NodeId,
        rank: Rank,
        operation: &str,
    ) -> Result<Shape, GradGraphError> {
        let shape = self.shape(id)?;
        if shape.rank() != rank {
            return Err(GradGraphError::rank_mismatch(rank, shape.rank(), operation));
        }
        Ok(shape)
    }

    /// Common shape of two operands of an elementwise operation.
    pub(crate) fn elementwise_shape(
        &self,
        a: NodeId,
        b: NodeId,
        operation: &str,
    ) -> Result<Shape, GradGraphError> {
        let shape_a = self.shape(a)?;
        let shape_b = self.shape(b)?;
        if shape_a != shape_b {
            return Err(GradGraphError::shape_mismatch(shape_a, shape_b, operation));
        }
        Ok(shape_a)
    }

    fn push_leaf(&mut self, value: Value<T>, trainable: bool) -> NodeId {
        let shape = value.shape();
        let id = self.push_node(Op::leaf(), value);
        self.meta[id.index].trainable = trainable;
        trace!("Leaf {} {} (trainable: {})", id, shape, trainable);
        id
    }

    /// Appends an operation node and evaluates it once from the current
    /// operand values. Operands must already be validated.
    pub(crate) fn push_op(&mut self, op: Op, shape: Shape) -> NodeId {
        let mut value = Value::zeros(shape);
        ops::forward(&op, &self.values, &mut value);
        let id = self.push_node(op, value);
        trace!("Node {} = {} {}", id, self.meta[id.index].op.kind.name(), shape);
        id
    }

    fn push_node(&mut self, op: Op, value: Value<T>) -> NodeId {
        let index = self.meta.len();
        for operand in op.operands.as_slice() {
            let consumers = &mut self.meta[operand.index].consumers;
            if consumers.last() != Some(&index) {
                consumers.push(index);
            }
        }
        self.grads.push(Value::zeros(value.shape()));
        self.values.push(value);
        self.meta.push(NodeMeta {
            op,
            generation: self.epoch,
            trainable: false,
            name: None,
            consumers: Vec::new(),
        });
        NodeId {
            index,
            generation: self.epoch,
        }
    }
}

#[cfg(test)]
#[path = "graph_test.rs"]
mod tests;
