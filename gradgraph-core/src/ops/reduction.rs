use crate::error::GradGraphError;
use crate::graph::{Graph, NodeId};
use crate::numeric::GraphFloat;
use crate::ops::{GradientSink, Op, OpKind};
use crate::value::{Shape, Value};

impl<T: GraphFloat> Graph<T> {
    /// Total of all elements, as a scalar.
    pub fn sum(&mut self, x: NodeId) -> Result<NodeId, GradGraphError> {
        self.resolve(x)?;
        Ok(self.push_op(Op::unary(OpKind::Sum, x), Shape::Scalar))
    }

    /// Largest element, as a scalar. Matrices are scanned row-major and ties
    /// go to the first occurrence, which alone receives the gradient.
    pub fn max(&mut self, x: NodeId) -> Result<NodeId, GradGraphError> {
        if self.shape(x)?.numel() == 0 {
            return Err(GradGraphError::EmptyInput {
                operation: "max".to_string(),
            });
        }
        Ok(self.push_op(Op::unary(OpKind::Max, x), Shape::Scalar))
    }
}

/// Index of the first maximal element. Comparisons against `NaN` are false,
/// so a `NaN` is only picked when it sits at index 0.
pub(crate) fn argmax<T: GraphFloat>(values: &[T]) -> usize {
    let mut best = 0;
    for (k, &v) in values.iter().enumerate().skip(1) {
        if v > values[best] {
            best = k;
        }
    }
    best
}

pub(crate) fn sum_forward<T: GraphFloat>(x: &Value<T>, out: &mut Value<T>) {
    out.as_mut_slice()[0] = x.as_slice().iter().copied().sum();
}

pub(crate) fn max_forward<T: GraphFloat>(x: &Value<T>, out: &mut Value<T>) {
    let x = x.as_slice();
    out.as_mut_slice()[0] = x[argmax(x)];
}

pub(crate) fn sum_backward<T, S>(x: usize, g: &[T], sink: &mut S)
where
    T: GraphFloat,
    S: GradientSink<T> + ?Sized,
{
    let g = g[0];
    sink.accumulate(x, |acc| acc.iter_mut().for_each(|a| *a += g));
}

pub(crate) fn max_backward<T, S>(x: usize, x_value: &Value<T>, g: &[T], sink: &mut S)
where
    T: GraphFloat,
    S: GradientSink<T> + ?Sized,
{
    let winner = argmax(x_value.as_slice());
    let g = g[0];
    sink.accumulate(x, |acc| acc[winner] += g);
}

#[cfg(test)]
#[path = "reduction_test.rs"]
mod tests;
