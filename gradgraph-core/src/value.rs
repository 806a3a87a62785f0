//! Numeric containers held by graph nodes.
//!
//! A node carries exactly one rank for its whole life: a scalar, a vector of
//! scalars, or a row-major matrix of scalars. Values and gradient
//! accumulators share these containers, and both expose a flat buffer so
//! update rules and persistence can treat every rank the same way.

use crate::error::GradGraphError;
use crate::numeric::GraphFloat;
use std::fmt;
use std::ops::{Index, IndexMut};

/// The rank of a node value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Rank {
    Scalar,
    Vector,
    Matrix,
}

/// The full shape of a node value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Shape {
    Scalar,
    Vector(usize),
    Matrix { rows: usize, cols: usize },
}

impl Shape {
    pub fn rank(&self) -> Rank {
        match self {
            Shape::Scalar => Rank::Scalar,
            Shape::Vector(_) => Rank::Vector,
            Shape::Matrix { .. } => Rank::Matrix,
        }
    }

    /// Number of scalar elements.
    pub fn numel(&self) -> usize {
        match *self {
            Shape::Scalar => 1,
            Shape::Vector(len) => len,
            Shape::Matrix { rows, cols } => rows * cols,
        }
    }

    /// Rank-specific dimensions: empty, `[len]` or `[rows, cols]`.
    pub fn dims(&self) -> Vec<usize> {
        match *self {
            Shape::Scalar => vec![],
            Shape::Vector(len) => vec![len],
            Shape::Matrix { rows, cols } => vec![rows, cols],
        }
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Shape::Scalar => write!(f, "scalar"),
            Shape::Vector(len) => write!(f, "[{}]", len),
            Shape::Matrix { rows, cols } => write!(f, "[{} x {}]", rows, cols),
        }
    }
}

/// A dense row-major matrix.
#[derive(Debug, Clone, PartialEq)]
pub struct Matrix<T> {
    rows: usize,
    cols: usize,
    data: Vec<T>,
}

impl<T: GraphFloat> Matrix<T> {
    /// Creates a matrix from row-major `data`.
    pub fn new(rows: usize, cols: usize, data: Vec<T>) -> Result<Self, GradGraphError> {
        if data.len() != rows * cols {
            return Err(GradGraphError::shape_mismatch(
                Shape::Matrix { rows, cols },
                Shape::Vector(data.len()),
                "Matrix::new",
            ));
        }
        Ok(Matrix { rows, cols, data })
    }

    pub fn filled(rows: usize, cols: usize, value: T) -> Self {
        Matrix {
            rows,
            cols,
            data: vec![value; rows * cols],
        }
    }

    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self::filled(rows, cols, T::zero())
    }

    /// Builds a matrix from nested rows. Ragged input is a shape error.
    pub fn from_rows(rows: Vec<Vec<T>>) -> Result<Self, GradGraphError> {
        let n_rows = rows.len();
        let n_cols = rows.first().map_or(0, Vec::len);
        let mut data = Vec::with_capacity(n_rows * n_cols);
        for row in rows {
            if row.len() != n_cols {
                return Err(GradGraphError::shape_mismatch(
                    Shape::Vector(n_cols),
                    Shape::Vector(row.len()),
                    "Matrix::from_rows",
                ));
            }
            data.extend(row);
        }
        Ok(Matrix {
            rows: n_rows,
            cols: n_cols,
            data,
        })
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn shape(&self) -> Shape {
        Shape::Matrix {
            rows: self.rows,
            cols: self.cols,
        }
    }

    pub fn row(&self, index: usize) -> &[T] {
        &self.data[index * self.cols..(index + 1) * self.cols]
    }

    pub fn row_mut(&mut self, index: usize) -> &mut [T] {
        &mut self.data[index * self.cols..(index + 1) * self.cols]
    }

    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.data
    }

    pub fn transpose(&self) -> Matrix<T> {
        let mut out = Matrix::zeros(self.cols, self.rows);
        for i in 0..self.rows {
            for j in 0..self.cols {
                out[(j, i)] = self[(i, j)];
            }
        }
        out
    }

    pub fn into_vec(self) -> Vec<T> {
        self.data
    }
}

impl<T> Index<(usize, usize)> for Matrix<T> {
    type Output = T;

    fn index(&self, (i, j): (usize, usize)) -> &T {
        &self.data[i * self.cols + j]
    }
}

impl<T> IndexMut<(usize, usize)> for Matrix<T> {
    fn index_mut(&mut self, (i, j): (usize, usize)) -> &mut T {
        &mut self.data[i * self.cols + j]
    }
}

/// The current value (or gradient accumulator) of a node.
#[derive(Debug, Clone, PartialEq)]
pub enum Value<T> {
    Scalar(T),
    Vector(Vec<T>),
    Matrix(Matrix<T>),
}

impl<T: GraphFloat> Default for Value<T> {
    fn default() -> Self {
        Value::Scalar(T::zero())
    }
}

impl<T: GraphFloat> Value<T> {
    /// A value of `shape` with every element set to `fill`.
    pub fn filled(shape: Shape, fill: T) -> Self {
        match shape {
            Shape::Scalar => Value::Scalar(fill),
            Shape::Vector(len) => Value::Vector(vec![fill; len]),
            Shape::Matrix { rows, cols } => Value::Matrix(Matrix::filled(rows, cols, fill)),
        }
    }

    pub fn zeros(shape: Shape) -> Self {
        Self::filled(shape, T::zero())
    }

    pub fn ones(shape: Shape) -> Self {
        Self::filled(shape, T::one())
    }

    pub fn shape(&self) -> Shape {
        match self {
            Value::Scalar(_) => Shape::Scalar,
            Value::Vector(v) => Shape::Vector(v.len()),
            Value::Matrix(m) => m.shape(),
        }
    }

    pub fn rank(&self) -> Rank {
        self.shape().rank()
    }

    pub fn numel(&self) -> usize {
        self.as_slice().len()
    }

    /// Flat, row-major view of the elements.
    pub fn as_slice(&self) -> &[T] {
        match self {
            Value::Scalar(x) => std::slice::from_ref(x),
            Value::Vector(v) => v,
            Value::Matrix(m) => m.as_slice(),
        }
    }

    pub fn as_mut_slice(&mut self) -> &mut [T] {
        match self {
            Value::Scalar(x) => std::slice::from_mut(x),
            Value::Vector(v) => v,
            Value::Matrix(m) => m.as_mut_slice(),
        }
    }

    pub fn as_scalar(&self) -> Option<T> {
        match self {
            Value::Scalar(x) => Some(*x),
            _ => None,
        }
    }

    pub fn as_vector(&self) -> Option<&[T]> {
        match self {
            Value::Vector(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_matrix(&self) -> Option<&Matrix<T>> {
        match self {
            Value::Matrix(m) => Some(m),
            _ => None,
        }
    }

    pub fn fill(&mut self, value: T) {
        self.as_mut_slice().iter_mut().for_each(|x| *x = value);
    }

    /// Elementwise `self += other`.
    pub fn add_assign(&mut self, other: &Value<T>) -> Result<(), GradGraphError> {
        self.check_same_shape(other, "Value::add_assign")?;
        axpy(self.as_mut_slice(), T::one(), other.as_slice());
        Ok(())
    }

    /// Multiplies every element by `factor` in place.
    pub fn scale(&mut self, factor: T) {
        self.as_mut_slice().iter_mut().for_each(|x| *x *= factor);
    }

    pub fn scaled(&self, factor: T) -> Value<T> {
        let mut out = self.clone();
        out.scale(factor);
        out
    }

    /// Elementwise (Hadamard) product.
    pub fn hadamard(&self, other: &Value<T>) -> Result<Value<T>, GradGraphError> {
        self.check_same_shape(other, "Value::hadamard")?;
        let mut out = self.clone();
        out.as_mut_slice()
            .iter_mut()
            .zip(other.as_slice())
            .for_each(|(x, &y)| *x *= y);
        Ok(out)
    }

    pub fn map(&self, f: impl Fn(T) -> T) -> Value<T> {
        let mut out = self.clone();
        out.as_mut_slice().iter_mut().for_each(|x| *x = f(*x));
        out
    }

    fn check_same_shape(&self, other: &Value<T>, operation: &str) -> Result<(), GradGraphError> {
        if self.shape() != other.shape() {
            return Err(GradGraphError::shape_mismatch(
                self.shape(),
                other.shape(),
                operation,
            ));
        }
        Ok(())
    }
}

impl<T> From<T> for Value<T> {
    fn from(x: T) -> Self {
        Value::Scalar(x)
    }
}

impl<T> From<Vec<T>> for Value<T> {
    fn from(v: Vec<T>) -> Self {
        Value::Vector(v)
    }
}

impl<T> From<Matrix<T>> for Value<T> {
    fn from(m: Matrix<T>) -> Self {
        Value::Matrix(m)
    }
}

/// `dst += alpha * src` over equally sized slices.
pub(crate) fn axpy<T: GraphFloat>(dst: &mut [T], alpha: T, src: &[T]) {
    debug_assert_eq!(dst.len(), src.len());
    dst.iter_mut().zip(src).for_each(|(d, &s)| *d += alpha * s);
}

#[cfg(test)]
#[path = "value_test.rs"]
mod tests;
