use crate::error::GradGraphError;
use crate::graph::{Graph, NodeId};
use crate::numeric::GraphFloat;
use crate::ops::{accumulate_scaled, map_into, zip_into, GradientSink, Op, OpKind};
use crate::value::{axpy, Rank, Value};

// --- Builders ---

impl<T: GraphFloat> Graph<T> {
    /// Elementwise sum of two nodes of identical shape.
    pub fn add(&mut self, a: NodeId, b: NodeId) -> Result<NodeId, GradGraphError> {
        let shape = self.elementwise_shape(a, b, "add")?;
        Ok(self.push_op(Op::binary(OpKind::Add, a, b), shape))
    }

    /// Elementwise difference `a - b`.
    pub fn sub(&mut self, a: NodeId, b: NodeId) -> Result<NodeId, GradGraphError> {
        let shape = self.elementwise_shape(a, b, "sub")?;
        Ok(self.push_op(Op::binary(OpKind::Sub, a, b), shape))
    }

    /// Elementwise product. For scalars this is the ordinary product, for
    /// vectors and matrices the Hadamard product.
    pub fn mul(&mut self, a: NodeId, b: NodeId) -> Result<NodeId, GradGraphError> {
        let shape = self.elementwise_shape(a, b, "mul")?;
        Ok(self.push_op(Op::binary(OpKind::Mul, a, b), shape))
    }

    /// Same as [`Graph::mul`], named for readability on vectors and matrices.
    pub fn hadamard(&mut self, a: NodeId, b: NodeId) -> Result<NodeId, GradGraphError> {
        self.mul(a, b)
    }

    /// Elementwise quotient `a / b`.
    ///
    /// A zero denominator is not trapped: the result follows IEEE semantics
    /// (`inf` or `NaN`) and propagates through the rest of the graph.
    pub fn div(&mut self, a: NodeId, b: NodeId) -> Result<NodeId, GradGraphError> {
        let shape = self.elementwise_shape(a, b, "div")?;
        Ok(self.push_op(Op::binary(OpKind::Div, a, b), shape))
    }

    pub fn neg(&mut self, a: NodeId) -> Result<NodeId, GradGraphError> {
        let shape = self.shape(a)?;
        Ok(self.push_op(Op::unary(OpKind::Neg, a), shape))
    }

    /// Multiplies every element of `x` by the scalar node `s`.
    pub fn scale(&mut self, x: NodeId, s: NodeId) -> Result<NodeId, GradGraphError> {
        let shape = self.shape(x)?;
        self.expect_rank(s, Rank::Scalar, "scale")?;
        Ok(self.push_op(Op::binary(OpKind::Scale, x, s), shape))
    }

    /// `x + c` for a constant `c`, stored as a non-trainable leaf.
    pub fn add_scalar(&mut self, x: NodeId, c: T) -> Result<NodeId, GradGraphError> {
        let shape = self.shape(x)?;
        let constant = self.leaf(Value::filled(shape, c));
        self.add(x, constant)
    }

    /// `c * x` for a constant `c`, stored as a non-trainable scalar leaf.
    pub fn scale_by(&mut self, x: NodeId, c: T) -> Result<NodeId, GradGraphError> {
        self.resolve(x)?;
        let constant = self.leaf(c);
        self.scale(x, constant)
    }
}

// --- Kernels ---

pub(crate) fn add_forward<T: GraphFloat>(a: &Value<T>, b: &Value<T>, out: &mut Value<T>) {
    zip_into(a, b, out, |x, y| x + y);
}

pub(crate) fn sub_forward<T: GraphFloat>(a: &Value<T>, b: &Value<T>, out: &mut Value<T>) {
    zip_into(a, b, out, |x, y| x - y);
}

pub(crate) fn mul_forward<T: GraphFloat>(a: &Value<T>, b: &Value<T>, out: &mut Value<T>) {
    zip_into(a, b, out, |x, y| x * y);
}

pub(crate) fn div_forward<T: GraphFloat>(a: &Value<T>, b: &Value<T>, out: &mut Value<T>) {
    zip_into(a, b, out, |x, y| x / y);
}

pub(crate) fn neg_forward<T: GraphFloat>(a: &Value<T>, out: &mut Value<T>) {
    map_into(a, out, |x| -x);
}

pub(crate) fn scale_forward<T: GraphFloat>(x: &Value<T>, s: &Value<T>, out: &mut Value<T>) {
    let s = s.as_slice()[0];
    map_into(x, out, |v| v * s);
}

pub(crate) fn add_backward<T, S>(a: usize, b: usize, g: &[T], sink: &mut S)
where
    T: GraphFloat,
    S: GradientSink<T> + ?Sized,
{
    sink.accumulate(a, |acc| axpy(acc, T::one(), g));
    sink.accumulate(b, |acc| axpy(acc, T::one(), g));
}

pub(crate) fn sub_backward<T, S>(a: usize, b: usize, g: &[T], sink: &mut S)
where
    T: GraphFloat,
    S: GradientSink<T> + ?Sized,
{
    sink.accumulate(a, |acc| axpy(acc, T::one(), g));
    sink.accumulate(b, |acc| axpy(acc, -T::one(), g));
}

pub(crate) fn mul_backward<T, S>(
    a: usize,
    b: usize,
    x_a: &Value<T>,
    x_b: &Value<T>,
    g: &[T],
    sink: &mut S,
) where
    T: GraphFloat,
    S: GradientSink<T> + ?Sized,
{
    let (va, vb) = (x_a.as_slice(), x_b.as_slice());
    accumulate_scaled(sink, a, g, |k| vb[k]);
    accumulate_scaled(sink, b, g, |k| va[k]);
}

pub(crate) fn div_backward<T, S>(
    a: usize,
    b: usize,
    x_a: &Value<T>,
    x_b: &Value<T>,
    g: &[T],
    sink: &mut S,
) where
    T: GraphFloat,
    S: GradientSink<T> + ?Sized,
{
    let (num, den) = (x_a.as_slice(), x_b.as_slice());
    accumulate_scaled(sink, a, g, |k| T::one() / den[k]);
    accumulate_scaled(sink, b, g, |k| -num[k] / (den[k] * den[k]));
}

pub(crate) fn neg_backward<T, S>(a: usize, g: &[T], sink: &mut S)
where
    T: GraphFloat,
    S: GradientSink<T> + ?Sized,
{
    sink.accumulate(a, |acc| axpy(acc, -T::one(), g));
}

pub(crate) fn scale_backward<T, S>(
    x: usize,
    s: usize,
    x_value: &Value<T>,
    s_value: &Value<T>,
    g: &[T],
    sink: &mut S,
) where
    T: GraphFloat,
    S: GradientSink<T> + ?Sized,
{
    let factor = s_value.as_slice()[0];
    sink.accumulate(x, |acc| axpy(acc, factor, g));
    let total: T = g
        .iter()
        .zip(x_value.as_slice())
        .map(|(&gk, &xk)| gk * xk)
        .sum();
    sink.accumulate(s, |acc| acc[0] += total);
}

#[cfg(test)]
#[path = "arithmetic_test.rs"]
mod tests;
