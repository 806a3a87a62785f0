//! Elementwise transcendental functions.
//!
//! All of them accept any rank and keep the operand's shape. Arguments
//! outside a function's domain (`ln` of a non-positive value, `sqrt` of a
//! negative one) produce `NaN` or `-inf` rather than an error.

use crate::error::GradGraphError;
use crate::graph::{Graph, NodeId};
use crate::numeric::GraphFloat;
use crate::ops::{accumulate_scaled, map_into, GradientSink, Op, OpKind};
use crate::value::Value;

impl<T: GraphFloat> Graph<T> {
    pub fn exp(&mut self, x: NodeId) -> Result<NodeId, GradGraphError> {
        self.elementwise_unary(OpKind::Exp, x)
    }

    /// Natural logarithm.
    pub fn ln(&mut self, x: NodeId) -> Result<NodeId, GradGraphError> {
        self.elementwise_unary(OpKind::Ln, x)
    }

    pub fn sin(&mut self, x: NodeId) -> Result<NodeId, GradGraphError> {
        self.elementwise_unary(OpKind::Sin, x)
    }

    pub fn cos(&mut self, x: NodeId) -> Result<NodeId, GradGraphError> {
        self.elementwise_unary(OpKind::Cos, x)
    }

    pub fn sqrt(&mut self, x: NodeId) -> Result<NodeId, GradGraphError> {
        self.elementwise_unary(OpKind::Sqrt, x)
    }

    pub(crate) fn elementwise_unary(
        &mut self,
        kind: OpKind,
        x: NodeId,
    ) -> Result<NodeId, GradGraphError> {
        let shape = self.shape(x)?;
        Ok(self.push_op(Op::unary(kind, x), shape))
    }
}

pub(crate) fn exp_forward<T: GraphFloat>(x: &Value<T>, out: &mut Value<T>) {
    map_into(x, out, T::exp);
}

pub(crate) fn ln_forward<T: GraphFloat>(x: &Value<T>, out: &mut Value<T>) {
    map_into(x, out, T::ln);
}

pub(crate) fn sin_forward<T: GraphFloat>(x: &Value<T>, out: &mut Value<T>) {
    map_into(x, out, T::sin);
}

pub(crate) fn cos_forward<T: GraphFloat>(x: &Value<T>, out: &mut Value<T>) {
    map_into(x, out, T::cos);
}

pub(crate) fn sqrt_forward<T: GraphFloat>(x: &Value<T>, out: &mut Value<T>) {
    map_into(x, out, T::sqrt);
}

/// d exp(x) = exp(x), read from the node's own value.
pub(crate) fn exp_backward<T, S>(x: usize, y: &Value<T>, g: &[T], sink: &mut S)
where
    T: GraphFloat,
    S: GradientSink<T> + ?Sized,
{
    let y = y.as_slice();
    accumulate_scaled(sink, x, g, |k| y[k]);
}

pub(crate) fn ln_backward<T, S>(x: usize, x_value: &Value<T>, g: &[T], sink: &mut S)
where
    T: GraphFloat,
    S: GradientSink<T> + ?Sized,
{
    let v = x_value.as_slice();
    accumulate_scaled(sink, x, g, |k| v[k].recip());
}

pub(crate) fn sin_backward<T, S>(x: usize, x_value: &Value<T>, g: &[T], sink: &mut S)
where
    T: GraphFloat,
    S: GradientSink<T> + ?Sized,
{
    let v = x_value.as_slice();
    accumulate_scaled(sink, x, g, |k| v[k].cos());
}

pub(crate) fn cos_backward<T, S>(x: usize, x_value: &Value<T>, g: &[T], sink: &mut S)
where
    T: GraphFloat,
    S: GradientSink<T> + ?Sized,
{
    let v = x_value.as_slice();
    accumulate_scaled(sink, x, g, |k| -v[k].sin());
}

/// d sqrt(x) = 1 / (2 sqrt(x)), read from the node's own value.
pub(crate) fn sqrt_backward<T, S>(x: usize, y: &Value<T>, g: &[T], sink: &mut S)
where
    T: GraphFloat,
    S: GradientSink<T> + ?Sized,
{
    let y = y.as_slice();
    let half = T::cast(0.5);
    accumulate_scaled(sink, x, g, |k| half / y[k]);
}

#[cfg(test)]
#[path = "math_elem_test.rs"]
mod tests;
