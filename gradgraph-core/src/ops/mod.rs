//! The primitive operation catalogue.
//!
//! Every derived node stores an [`Op`]: the kind of primitive plus the handles
//! of its operands. [`forward`] and [`backward`] dispatch on the kind with an
//! exhaustive `match`; the per-primitive kernels live in the submodules next
//! to the `Graph` methods that build and shape-check the nodes.

pub mod activation;
pub mod arithmetic;
pub mod indexing;
pub mod linalg;
pub mod loss;
pub mod math_elem;
pub mod reduction;

use crate::graph::NodeId;
use crate::numeric::GraphFloat;
use crate::value::Value;

/// The primitive a node computes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OpKind {
    Leaf,
    Add,
    Sub,
    /// Elementwise product (Hadamard for vectors and matrices).
    Mul,
    Div,
    Neg,
    /// Tensor times a scalar node.
    Scale,
    Exp,
    Ln,
    Sin,
    Cos,
    Sqrt,
    Sigmoid,
    Tanh,
    Dot,
    MatVec,
    MatMul,
    Transpose,
    /// Matrix plus a vector added to every column, indexed by row.
    BroadcastRows,
    /// Matrix plus a vector added to every row, indexed by column.
    BroadcastCols,
    Sum,
    Max,
    Element(usize),
    Row(usize),
    Stack,
}

impl OpKind {
    pub fn name(&self) -> &'static str {
        match self {
            OpKind::Leaf => "leaf",
            OpKind::Add => "add",
            OpKind::Sub => "sub",
            OpKind::Mul => "mul",
            OpKind::Div => "div",
            OpKind::Neg => "neg",
            OpKind::Scale => "scale",
            OpKind::Exp => "exp",
            OpKind::Ln => "ln",
            OpKind::Sin => "sin",
            OpKind::Cos => "cos",
            OpKind::Sqrt => "sqrt",
            OpKind::Sigmoid => "sigmoid",
            OpKind::Tanh => "tanh",
            OpKind::Dot => "dot",
            OpKind::MatVec => "matvec",
            OpKind::MatMul => "matmul",
            OpKind::Transpose => "transpose",
            OpKind::BroadcastRows => "broadcast_rows",
            OpKind::BroadcastCols => "broadcast_cols",
            OpKind::Sum => "sum",
            OpKind::Max => "max",
            OpKind::Element(_) => "element",
            OpKind::Row(_) => "row",
            OpKind::Stack => "stack",
        }
    }
}

/// Operand handles, indexed by arity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operands {
    None,
    Unary([NodeId; 1]),
    Binary([NodeId; 2]),
    Many(Vec<NodeId>),
}

impl Operands {
    pub fn as_slice(&self) -> &[NodeId] {
        match self {
            Operands::None => &[],
            Operands::Unary(ids) => ids,
            Operands::Binary(ids) => ids,
            Operands::Many(ids) => ids,
        }
    }

    pub fn len(&self) -> usize {
        self.as_slice().len()
    }

    pub fn is_empty(&self) -> bool {
        self.as_slice().is_empty()
    }
}

/// An operation together with its operands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Op {
    pub kind: OpKind,
    pub operands: Operands,
}

impl Op {
    pub fn leaf() -> Self {
        Op {
            kind: OpKind::Leaf,
            operands: Operands::None,
        }
    }

    pub fn unary(kind: OpKind, a: NodeId) -> Self {
        Op {
            kind,
            operands: Operands::Unary([a]),
        }
    }

    pub fn binary(kind: OpKind, a: NodeId, b: NodeId) -> Self {
        Op {
            kind,
            operands: Operands::Binary([a, b]),
        }
    }

    pub fn many(kind: OpKind, operands: Vec<NodeId>) -> Self {
        Op {
            kind,
            operands: Operands::Many(operands),
        }
    }

    pub fn is_leaf(&self) -> bool {
        self.kind == OpKind::Leaf
    }
}

/// Destination of gradient contributions during a backward step.
///
/// `accumulate` hands the flat accumulator of node `index` to `f`, which adds
/// its contribution in place.
pub(crate) trait GradientSink<T> {
    fn accumulate<F: FnOnce(&mut [T])>(&mut self, index: usize, f: F);
}

impl<T: GraphFloat> GradientSink<T> for [Value<T>] {
    fn accumulate<F: FnOnce(&mut [T])>(&mut self, index: usize, f: F) {
        f(self[index].as_mut_slice())
    }
}

fn operand<'a, T>(values: &'a [Value<T>], ids: &[NodeId], k: usize) -> &'a Value<T> {
    &values[ids[k].index()]
}

/// Recomputes `out` from the operand values. `values` must cover every
/// operand index.
pub(crate) fn forward<T: GraphFloat>(op: &Op, values: &[Value<T>], out: &mut Value<T>) {
    let ids = op.operands.as_slice();
    let x = |k: usize| operand(values, ids, k);
    match op.kind {
        OpKind::Leaf => {}
        OpKind::Add => arithmetic::add_forward(x(0), x(1), out),
        OpKind::Sub => arithmetic::sub_forward(x(0), x(1), out),
        OpKind::Mul => arithmetic::mul_forward(x(0), x(1), out),
        OpKind::Div => arithmetic::div_forward(x(0), x(1), out),
        OpKind::Neg => arithmetic::neg_forward(x(0), out),
        OpKind::Scale => arithmetic::scale_forward(x(0), x(1), out),
        OpKind::Exp => math_elem::exp_forward(x(0), out),
        OpKind::Ln => math_elem::ln_forward(x(0), out),
        OpKind::Sin => math_elem::sin_forward(x(0), out),
        OpKind::Cos => math_elem::cos_forward(x(0), out),
        OpKind::Sqrt => math_elem::sqrt_forward(x(0), out),
        OpKind::Sigmoid => activation::sigmoid_forward(x(0), out),
        OpKind::Tanh => activation::tanh_forward(x(0), out),
        OpKind::Dot => linalg::dot_forward(x(0), x(1), out),
        OpKind::MatVec => linalg::matvec_forward(x(0), x(1), out),
        OpKind::MatMul => linalg::matmul_forward(x(0), x(1), out),
        OpKind::Transpose => linalg::transpose_forward(x(0), out),
        OpKind::BroadcastRows => linalg::broadcast_rows_forward(x(0), x(1), out),
        OpKind::BroadcastCols => linalg::broadcast_cols_forward(x(0), x(1), out),
        OpKind::Sum => reduction::sum_forward(x(0), out),
        OpKind::Max => reduction::max_forward(x(0), out),
        OpKind::Element(index) => indexing::element_forward(x(0), index, out),
        OpKind::Row(index) => indexing::row_forward(x(0), index, out),
        OpKind::Stack => indexing::stack_forward(ids, values, out),
    }
}

/// Adds the local chain-rule contribution of one node into the accumulators
/// of its operands.
///
/// `value` and `grad` belong to the node itself; `values` must cover every
/// operand index.
pub(crate) fn backward<T, S>(
    op: &Op,
    value: &Value<T>,
    grad: &Value<T>,
    values: &[Value<T>],
    sink: &mut S,
) where
    T: GraphFloat,
    S: GradientSink<T> + ?Sized,
{
    let ids = op.operands.as_slice();
    let x = |k: usize| operand(values, ids, k);
    let at = |k: usize| ids[k].index();
    let g = grad.as_slice();
    match op.kind {
        OpKind::Leaf => {}
        OpKind::Add => arithmetic::add_backward(at(0), at(1), g, sink),
        OpKind::Sub => arithmetic::sub_backward(at(0), at(1), g, sink),
        OpKind::Mul => arithmetic::mul_backward(at(0), at(1), x(0), x(1), g, sink),
        OpKind::Div => arithmetic::div_backward(at(0), at(1), x(0), x(1), g, sink),
        OpKind::Neg => arithmetic::neg_backward(at(0), g, sink),
        OpKind::Scale => arithmetic::scale_backward(at(0), at(1), x(0), x(1), g, sink),
        OpKind::Exp => math_elem::exp_backward(at(0), value, g, sink),
        OpKind::Ln => math_elem::ln_backward(at(0), x(0), g, sink),
        OpKind::Sin => math_elem::sin_backward(at(0), x(0), g, sink),
        OpKind::Cos => math_elem::cos_backward(at(0), x(0), g, sink),
        OpKind::Sqrt => math_elem::sqrt_backward(at(0), value, g, sink),
        OpKind::Sigmoid => activation::sigmoid_backward(at(0), value, g, sink),
        OpKind::Tanh => activation::tanh_backward(at(0), value, g, sink),
        OpKind::Dot => linalg::dot_backward(at(0), at(1), x(0), x(1), g, sink),
        OpKind::MatVec => linalg::matvec_backward(at(0), at(1), x(0), x(1), g, sink),
        OpKind::MatMul => linalg::matmul_backward(at(0), at(1), x(0), x(1), g, sink),
        OpKind::Transpose => linalg::transpose_backward(at(0), x(0), g, sink),
        OpKind::BroadcastRows => linalg::broadcast_rows_backward(at(0), at(1), x(0), g, sink),
        OpKind::BroadcastCols => linalg::broadcast_cols_backward(at(0), at(1), x(0), g, sink),
        OpKind::Sum => reduction::sum_backward(at(0), g, sink),
        OpKind::Max => reduction::max_backward(at(0), x(0), g, sink),
        OpKind::Element(index) => indexing::element_backward(at(0), index, g, sink),
        OpKind::Row(index) => indexing::row_backward(at(0), index, g, sink),
        OpKind::Stack => indexing::stack_backward(ids, g, sink),
    }
}

// --- Shared elementwise kernels ---

pub(crate) fn map_into<T: GraphFloat>(x: &Value<T>, out: &mut Value<T>, f: impl Fn(T) -> T) {
    out.as_mut_slice()
        .iter_mut()
        .zip(x.as_slice())
        .for_each(|(o, &a)| *o = f(a));
}

pub(crate) fn zip_into<T: GraphFloat>(
    a: &Value<T>,
    b: &Value<T>,
    out: &mut Value<T>,
    f: impl Fn(T, T) -> T,
) {
    out.as_mut_slice()
        .iter_mut()
        .zip(a.as_slice().iter().zip(b.as_slice()))
        .for_each(|(o, (&x, &y))| *o = f(x, y));
}

/// `acc[k] += g[k] * local(k)` for every element.
pub(crate) fn accumulate_scaled<T, S>(
    sink: &mut S,
    index: usize,
    g: &[T],
    local: impl Fn(usize) -> T,
) where
    T: GraphFloat,
    S: GradientSink<T> + ?Sized,
{
    sink.accumulate(index, |acc| {
        for (k, (a, &gk)) in acc.iter_mut().zip(g).enumerate() {
            *a += gk * local(k);
        }
    });
}
