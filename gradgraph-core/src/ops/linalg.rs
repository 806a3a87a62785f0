//! Dot products, matrix products, transpose and vector broadcasting.
//!
//! Matrices are row-major, so element `(i, j)` of an `r x c` matrix lives at
//! flat index `i * c + j`.

use crate::error::GradGraphError;
use crate::graph::{Graph, NodeId};
use crate::numeric::GraphFloat;
use crate::ops::{GradientSink, Op, OpKind};
use crate::value::{axpy, Rank, Shape, Value};

// --- Builders ---

impl<T: GraphFloat> Graph<T> {
    /// Inner product of two vectors of equal length.
    pub fn dot(&mut self, a: NodeId, b: NodeId) -> Result<NodeId, GradGraphError> {
        let shape_a = self.expect_rank(a, Rank::Vector, "dot")?;
        let shape_b = self.expect_rank(b, Rank::Vector, "dot")?;
        if shape_a != shape_b {
            return Err(GradGraphError::shape_mismatch(shape_a, shape_b, "dot"));
        }
        Ok(self.push_op(Op::binary(OpKind::Dot, a, b), Shape::Scalar))
    }

    /// Matrix (`r x c`) times vector (`c`), giving a vector of length `r`.
    pub fn matvec(&mut self, m: NodeId, v: NodeId) -> Result<NodeId, GradGraphError> {
        let (rows, cols) = self.matrix_dims(m, "matvec")?;
        let shape_v = self.expect_rank(v, Rank::Vector, "matvec")?;
        if shape_v != Shape::Vector(cols) {
            return Err(GradGraphError::shape_mismatch(
                Shape::Vector(cols),
                shape_v,
                "matvec",
            ));
        }
        Ok(self.push_op(Op::binary(OpKind::MatVec, m, v), Shape::Vector(rows)))
    }

    /// Matrix product `(n x p) · (p x m)`.
    pub fn matmul(&mut self, a: NodeId, b: NodeId) -> Result<NodeId, GradGraphError> {
        let (n, p) = self.matrix_dims(a, "matmul")?;
        let (p_b, m) = self.matrix_dims(b, "matmul")?;
        if p != p_b {
            return Err(GradGraphError::shape_mismatch(
                Shape::Matrix { rows: p, cols: m },
                Shape::Matrix { rows: p_b, cols: m },
                "matmul",
            ));
        }
        Ok(self.push_op(
            Op::binary(OpKind::MatMul, a, b),
            Shape::Matrix { rows: n, cols: m },
        ))
    }

    pub fn transpose(&mut self, a: NodeId) -> Result<NodeId, GradGraphError> {
        let (rows, cols) = self.matrix_dims(a, "transpose")?;
        Ok(self.push_op(
            Op::unary(OpKind::Transpose, a),
            Shape::Matrix {
                rows: cols,
                cols: rows,
            },
        ))
    }

    /// `out[i][j] = m[i][j] + v[i]` for a matrix `r x c` and a vector of
    /// length `r`.
    pub fn broadcast_rows(&mut self, m: NodeId, v: NodeId) -> Result<NodeId, GradGraphError> {
        let (rows, cols) = self.matrix_dims(m, "broadcast_rows")?;
        self.expect_vector_len(v, rows, "broadcast_rows")?;
        Ok(self.push_op(
            Op::binary(OpKind::BroadcastRows, m, v),
            Shape::Matrix { rows, cols },
        ))
    }

    /// `out[i][j] = m[i][j] + v[j]` for a matrix `r x c` and a vector of
    /// length `c`. This is the usual bias add for a batch stored one sample
    /// per row.
    pub fn broadcast_cols(&mut self, m: NodeId, v: NodeId) -> Result<NodeId, GradGraphError> {
        let (rows, cols) = self.matrix_dims(m, "broadcast_cols")?;
        self.expect_vector_len(v, cols, "broadcast_cols")?;
        Ok(self.push_op(
            Op::binary(OpKind::BroadcastCols, m, v),
            Shape::Matrix { rows, cols },
        ))
    }

    fn matrix_dims(&self, id: NodeId, operation: &str) -> Result<(usize, usize), GradGraphError> {
        match self.expect_rank(id, Rank::Matrix, operation)? {
            Shape::Matrix { rows, cols } => Ok((rows, cols)),
            other => Err(GradGraphError::rank_mismatch(
                Rank::Matrix,
                other.rank(),
                operation,
            )),
        }
    }

    fn expect_vector_len(
        &self,
        id: NodeId,
        len: usize,
        operation: &str,
    ) -> Result<(), GradGraphError> {
        let shape = self.expect_rank(id, Rank::Vector, operation)?;
        if shape != Shape::Vector(len) {
            return Err(GradGraphError::shape_mismatch(
                Shape::Vector(len),
                shape,
                operation,
            ));
        }
        Ok(())
    }
}

// --- Kernels ---

/// `(rows, cols)` of a value, vectors read as columns.
fn dims<T: GraphFloat>(v: &Value<T>) -> (usize, usize) {
    match v.shape() {
        Shape::Matrix { rows, cols } => (rows, cols),
        Shape::Vector(len) => (len, 1),
        Shape::Scalar => (1, 1),
    }
}

fn inner<T: GraphFloat>(a: &[T], b: &[T]) -> T {
    a.iter().zip(b).map(|(&x, &y)| x * y).sum()
}

pub(crate) fn dot_forward<T: GraphFloat>(a: &Value<T>, b: &Value<T>, out: &mut Value<T>) {
    out.as_mut_slice()[0] = inner(a.as_slice(), b.as_slice());
}

pub(crate) fn matvec_forward<T: GraphFloat>(m: &Value<T>, v: &Value<T>, out: &mut Value<T>) {
    let (_, cols) = dims(m);
    let (m, v) = (m.as_slice(), v.as_slice());
    for (i, o) in out.as_mut_slice().iter_mut().enumerate() {
        *o = inner(&m[i * cols..(i + 1) * cols], v);
    }
}

pub(crate) fn matmul_forward<T: GraphFloat>(a: &Value<T>, b: &Value<T>, out: &mut Value<T>) {
    let (n, p) = dims(a);
    let (_, m) = dims(b);
    let (a, b) = (a.as_slice(), b.as_slice());
    let out = out.as_mut_slice();
    out.iter_mut().for_each(|o| *o = T::zero());
    for i in 0..n {
        let out_row = &mut out[i * m..(i + 1) * m];
        for k in 0..p {
            axpy(out_row, a[i * p + k], &b[k * m..(k + 1) * m]);
        }
    }
}

pub(crate) fn transpose_forward<T: GraphFloat>(a: &Value<T>, out: &mut Value<T>) {
    let (rows, cols) = dims(a);
    let (a, out) = (a.as_slice(), out.as_mut_slice());
    for i in 0..rows {
        for j in 0..cols {
            out[j * rows + i] = a[i * cols + j];
        }
    }
}

pub(crate) fn broadcast_rows_forward<T: GraphFloat>(m: &Value<T>, v: &Value<T>, out: &mut Value<T>) {
    let (_, cols) = dims(m);
    let (m, v) = (m.as_slice(), v.as_slice());
    for (k, o) in out.as_mut_slice().iter_mut().enumerate() {
        *o = m[k] + v[k / cols];
    }
}

pub(crate) fn broadcast_cols_forward<T: GraphFloat>(m: &Value<T>, v: &Value<T>, out: &mut Value<T>) {
    let (_, cols) = dims(m);
    let (m, v) = (m.as_slice(), v.as_slice());
    for (k, o) in out.as_mut_slice().iter_mut().enumerate() {
        *o = m[k] + v[k % cols];
    }
}

pub(crate) fn dot_backward<T, S>(
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
    let g = g[0];
    sink.accumulate(a, |acc| axpy(acc, g, x_b.as_slice()));
    sink.accumulate(b, |acc| axpy(acc, g, x_a.as_slice()));
}

pub(crate) fn matvec_backward<T, S>(
    m: usize,
    v: usize,
    x_m: &Value<T>,
    x_v: &Value<T>,
    g: &[T],
    sink: &mut S,
) where
    T: GraphFloat,
    S: GradientSink<T> + ?Sized,
{
    let (rows, cols) = dims(x_m);
    let (mat, vec) = (x_m.as_slice(), x_v.as_slice());
    // dM[i][j] += g[i] * v[j]
    sink.accumulate(m, |acc| {
        for i in 0..rows {
            axpy(&mut acc[i * cols..(i + 1) * cols], g[i], vec);
        }
    });
    // dv = M^T g
    sink.accumulate(v, |acc| {
        for i in 0..rows {
            axpy(acc, g[i], &mat[i * cols..(i + 1) * cols]);
        }
    });
}

pub(crate) fn matmul_backward<T, S>(
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
    let (n, p) = dims(x_a);
    let (_, m) = dims(x_b);
    let (va, vb) = (x_a.as_slice(), x_b.as_slice());
    // dA = G · B^T
    sink.accumulate(a, |acc| {
        for i in 0..n {
            let g_row = &g[i * m..(i + 1) * m];
            for k in 0..p {
                acc[i * p + k] += inner(g_row, &vb[k * m..(k + 1) * m]);
            }
        }
    });
    // dB = A^T · G
    sink.accumulate(b, |acc| {
        for i in 0..n {
            let g_row = &g[i * m..(i + 1) * m];
            for k in 0..p {
                axpy(&mut acc[k * m..(k + 1) * m], va[i * p + k], g_row);
            }
        }
    });
}

pub(crate) fn transpose_backward<T, S>(a: usize, x_a: &Value<T>, g: &[T], sink: &mut S)
where
    T: GraphFloat,
    S: GradientSink<T> + ?Sized,
{
    let (rows, cols) = dims(x_a);
    sink.accumulate(a, |acc| {
        for i in 0..rows {
            for j in 0..cols {
                acc[i * cols + j] += g[j * rows + i];
            }
        }
    });
}

pub(crate) fn broadcast_rows_backward<T, S>(
    m: usize,
    v: usize,
    x_m: &Value<T>,
    g: &[T],
    sink: &mut S,
) where
    T: GraphFloat,
    S: GradientSink<T> + ?Sized,
{
    let (_, cols) = dims(x_m);
    sink.accumulate(m, |acc| axpy(acc, T::one(), g));
    sink.accumulate(v, |acc| {
        for (k, &gk) in g.iter().enumerate() {
            acc[k / cols] += gk;
        }
    });
}

pub(crate) fn broadcast_cols_backward<T, S>(
    m: usize,
    v: usize,
    x_m: &Value<T>,
    g: &[T],
    sink: &mut S,
) where
    T: GraphFloat,
    S: GradientSink<T> + ?Sized,
{
    let (_, cols) = dims(x_m);
    sink.accumulate(m, |acc| axpy(acc, T::one(), g));
    sink.accumulate(v, |acc| {
        for (k, &gk) in g.iter().enumerate() {
            acc[k % cols] += gk;
        }
    });
}

#[cfg(test)]
#[path = "linalg_test.rs"]
mod tests;
