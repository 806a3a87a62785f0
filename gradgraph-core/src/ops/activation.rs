use crate::error::GradGraphError;
use crate::graph::{Graph, NodeId};
use crate::numeric::GraphFloat;
use crate::ops::{accumulate_scaled, map_into, GradientSink, OpKind};
use crate::value::Value;

impl<T: GraphFloat> Graph<T> {
    /// Logistic function `1 / (1 + e^-x)`, elementwise.
    pub fn sigmoid(&mut self, x: NodeId) -> Result<NodeId, GradGraphError> {
        self.elementwise_unary(OpKind::Sigmoid, x)
    }

    /// Hyperbolic tangent `2 / (1 + e^-2x) - 1`, elementwise.
    pub fn tanh(&mut self, x: NodeId) -> Result<NodeId, GradGraphError> {
        self.elementwise_unary(OpKind::Tanh, x)
    }
}

pub(crate) fn sigmoid_forward<T: GraphFloat>(x: &Value<T>, out: &mut Value<T>) {
    map_into(x, out, |v| T::one() / (T::one() + (-v).exp()));
}

pub(crate) fn tanh_forward<T: GraphFloat>(x: &Value<T>, out: &mut Value<T>) {
    map_into(x, out, T::tanh);
}

// Both derivatives are expressed through the output value.

pub(crate) fn sigmoid_backward<T, S>(x: usize, y: &Value<T>, g: &[T], sink: &mut S)
where
    T: GraphFloat,
    S: GradientSink<T> + ?Sized,
{
    let y = y.as_slice();
    accumulate_scaled(sink, x, g, |k| y[k] * (T::one() - y[k]));
}

pub(crate) fn tanh_backward<T, S>(x: usize, y: &Value<T>, g: &[T], sink: &mut S)
where
    T: GraphFloat,
    S: GradientSink<T> + ?Sized,
{
    let y = y.as_slice();
    accumulate_scaled(sink, x, g, |k| T::one() - y[k] * y[k]);
}

#[cfg(test)]
#[path = "activation_test.rs"]
mod tests;
