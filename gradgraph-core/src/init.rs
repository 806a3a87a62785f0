//! Random initialisation of leaf values.
//!
//! The graph itself never draws random numbers; callers create initialised
//! leaves through [`Graph::random_vector`] / [`Graph::random_matrix`] with any
//! [`Sampler`]. [`RandSampler`] is the `rand`-backed implementation.

use crate::error::GradGraphError;
use crate::graph::{Graph, NodeId};
use crate::numeric::GraphFloat;
use crate::value::{Matrix, Value};
use log::trace;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};

/// Source of random scalars.
pub trait Sampler<T> {
    fn sample_normal(&mut self, mean: T, std_dev: T) -> Result<T, GradGraphError>;
    fn sample_uniform(&mut self, low: T, high: T) -> Result<T, GradGraphError>;
}

/// [`Sampler`] over any `rand` generator.
#[derive(Debug, Clone)]
pub struct RandSampler<R> {
    rng: R,
}

impl<R: Rng> RandSampler<R> {
    pub fn new(rng: R) -> Self {
        RandSampler { rng }
    }
}

impl RandSampler<StdRng> {
    /// Reproducible sampler for tests and examples.
    pub fn seeded(seed: u64) -> Self {
        Self::new(StdRng::seed_from_u64(seed))
    }

    pub fn from_entropy() -> Self {
        Self::new(StdRng::from_entropy())
    }
}

impl<T: GraphFloat, R: Rng> Sampler<T> for RandSampler<R> {
    fn sample_normal(&mut self, mean: T, std_dev: T) -> Result<T, GradGraphError> {
        // rand_distr accepts a negative standard deviation and mirrors it.
        if !(std_dev >= T::zero()) || !std_dev.is_finite() || !mean.is_finite() {
            return Err(GradGraphError::ConfigurationError(format!(
                "invalid normal distribution N({}, {}): parameters must be finite with a non-negative standard deviation",
                mean, std_dev
            )));
        }
        let normal = Normal::new(mean.widen(), std_dev.widen()).map_err(|e| {
            GradGraphError::ConfigurationError(format!(
                "invalid normal distribution N({}, {}): {}",
                mean, std_dev, e
            ))
        })?;
        Ok(T::cast(normal.sample(&mut self.rng)))
    }

    fn sample_uniform(&mut self, low: T, high: T) -> Result<T, GradGraphError> {
        if !(low < high) || !low.is_finite() || !high.is_finite() {
            return Err(GradGraphError::ConfigurationError(format!(
                "invalid uniform range [{}, {})",
                low, high
            )));
        }
        Ok(T::cast(self.rng.gen_range(low.widen()..high.widen())))
    }
}

/// How to fill a freshly created leaf.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Init<T> {
    Normal { mean: T, std_dev: T },
    Uniform { low: T, high: T },
    Constant(T),
}

impl<T: GraphFloat> Init<T> {
    /// Standard normal, `N(0, 1)`.
    pub fn standard_normal() -> Self {
        Init::Normal {
            mean: T::zero(),
            std_dev: T::one(),
        }
    }

    /// Glorot/Xavier uniform: `U(-a, a)` with `a = sqrt(6 / (fan_in + fan_out))`.
    pub fn xavier_uniform(fan_in: usize, fan_out: usize) -> Self {
        let limit = T::cast((6.0 / (fan_in + fan_out).max(1) as f64).sqrt());
        Init::Uniform {
            low: -limit,
            high: limit,
        }
    }

    fn draw<S: Sampler<T> + ?Sized>(&self, sampler: &mut S, n: usize) -> Result<Vec<T>, GradGraphError> {
        (0..n)
            .map(|_| match *self {
                Init::Normal { mean, std_dev } => sampler.sample_normal(mean, std_dev),
                Init::Uniform { low, high } => sampler.sample_uniform(low, high),
                Init::Constant(c) => Ok(c),
            })
            .collect()
    }
}

impl<T: GraphFloat> Graph<T> {
    /// New vector leaf of length `len` drawn from `init`.
    pub fn random_vector<S: Sampler<T> + ?Sized>(
        &mut self,
        len: usize,
        init: Init<T>,
        sampler: &mut S,
        trainable: bool,
    ) -> Result<NodeId, GradGraphError> {
        let data = init.draw(sampler, len)?;
        trace!("random_vector [{}] from {:?}", len, init);
        Ok(self.init_leaf(Value::Vector(data), trainable))
    }

    /// New `rows x cols` matrix leaf drawn from `init`.
    pub fn random_matrix<S: Sampler<T> + ?Sized>(
        &mut self,
        rows: usize,
        cols: usize,
        init: Init<T>,
        sampler: &mut S,
        trainable: bool,
    ) -> Result<NodeId, GradGraphError> {
        let data = init.draw(sampler, rows * cols)?;
        trace!("random_matrix [{} x {}] from {:?}", rows, cols, init);
        Ok(self.init_leaf(Value::Matrix(Matrix::new(rows, cols, data)?), trainable))
    }

    fn init_leaf(&mut self, value: Value<T>, trainable: bool) -> NodeId {
        if trainable {
            self.parameter(value)
        } else {
            self.leaf(value)
        }
    }
}
