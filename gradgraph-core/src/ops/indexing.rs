//! Extraction and assembly: one element of a vector, one row of a matrix,
//! and a vector stacked from scalar nodes.

use crate::error::GradGraphError;
use crate::graph::{Graph, NodeId};
use crate::numeric::GraphFloat;
use crate::ops::{GradientSink, Op, OpKind};
use crate::value::{axpy, Rank, Shape, Value};

impl<T: GraphFloat> Graph<T> {
    /// Element `index` of a vector, as a scalar node.
    pub fn element(&mut self, v: NodeId, index: usize) -> Result<NodeId, GradGraphError> {
        let len = self.expect_rank(v, Rank::Vector, "element")?.numel();
        if index >= len {
            return Err(GradGraphError::IndexOutOfBounds {
                index,
                len,
                operation: "element".to_string(),
            });
        }
        Ok(self.push_op(Op::unary(OpKind::Element(index), v), Shape::Scalar))
    }

    /// Row `index` of a matrix, as a vector node.
    pub fn row(&mut self, m: NodeId, index: usize) -> Result<NodeId, GradGraphError> {
        let (rows, cols) = match self.expect_rank(m, Rank::Matrix, "row")? {
            Shape::Matrix { rows, cols } => (rows, cols),
            other => return Err(GradGraphError::rank_mismatch(Rank::Matrix, other.rank(), "row")),
        };
        if index >= rows {
            return Err(GradGraphError::IndexOutOfBounds {
                index,
                len: rows,
                operation: "row".to_string(),
            });
        }
        Ok(self.push_op(Op::unary(OpKind::Row(index), m), Shape::Vector(cols)))
    }

    /// Vector `[s0, s1, ..]` built from scalar nodes.
    pub fn stack(&mut self, scalars: &[NodeId]) -> Result<NodeId, GradGraphError> {
        if scalars.is_empty() {
            return Err(GradGraphError::EmptyInput {
                operation: "stack".to_string(),
            });
        }
        for &s in scalars {
            self.expect_rank(s, Rank::Scalar, "stack")?;
        }
        Ok(self.push_op(
            Op::many(OpKind::Stack, scalars.to_vec()),
            Shape::Vector(scalars.len()),
        ))
    }
}

pub(crate) fn element_forward<T: GraphFloat>(v: &Value<T>, index: usize, out: &mut Value<T>) {
    out.as_mut_slice()[0] = v.as_slice()[index];
}

pub(crate) fn row_forward<T: GraphFloat>(m: &Value<T>, index: usize, out: &mut Value<T>) {
    let out = out.as_mut_slice();
    let cols = out.len();
    out.copy_from_slice(&m.as_slice()[index * cols..(index + 1) * cols]);
}

pub(crate) fn stack_forward<T: GraphFloat>(ids: &[NodeId], values: &[Value<T>], out: &mut Value<T>) {
    for (o, id) in out.as_mut_slice().iter_mut().zip(ids) {
        *o = values[id.index()].as_slice()[0];
    }
}

pub(crate) fn element_backward<T, S>(v: usize, index: usize, g: &[T], sink: &mut S)
where
    T: GraphFloat,
    S: GradientSink<T> + ?Sized,
{
    let g = g[0];
    sink.accumulate(v, |acc| acc[index] += g);
}

pub(crate) fn row_backward<T, S>(m: usize, index: usize, g: &[T], sink: &mut S)
where
    T: GraphFloat,
    S: GradientSink<T> + ?Sized,
{
    let cols = g.len();
    sink.accumulate(m, |acc| {
        axpy(&mut acc[index * cols..(index + 1) * cols], T::one(), g)
    });
}

pub(crate) fn stack_backward<T, S>(ids: &[NodeId], g: &[T], sink: &mut S)
where
    T: GraphFloat,
    S: GradientSink<T> + ?Sized,
{
    for (id, &gk) in ids.iter().zip(g) {
        sink.accumulate(id.index(), |acc| acc[0] += gk);
    }
}

#[cfg(test)]
#[path = "indexing_test.rs"]
mod tests;
