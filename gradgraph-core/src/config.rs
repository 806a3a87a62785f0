//! Per-graph execution settings.

use crate::error::GradGraphError;
use log::debug;
use std::env;

/// Environment variable enabling the layered parallel executor (`1`/`true`).
pub const ENV_PARALLEL: &str = "GRADGRAPH_PARALLEL";
/// Environment variable overriding [`GraphConfig::parallel_min_layer_width`].
pub const ENV_PARALLEL_MIN_WIDTH: &str = "GRADGRAPH_PARALLEL_MIN_WIDTH";

const DEFAULT_MIN_LAYER_WIDTH: usize = 8;

/// Execution settings owned by a [`Graph`](crate::Graph).
///
/// The default is the serial executor. With `parallel` enabled, forward and
/// backward passes group nodes into dependency layers and dispatch each layer
/// that holds at least `parallel_min_layer_width` nodes to the rayon pool.
/// Narrower layers run on the calling thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GraphConfig {
    pub parallel: bool,
    pub parallel_min_layer_width: usize,
}

impl Default for GraphConfig {
    fn default() -> Self {
        GraphConfig {
            parallel: false,
            parallel_min_layer_width: DEFAULT_MIN_LAYER_WIDTH,
        }
    }
}

impl GraphConfig {
    pub fn serial() -> Self {
        Self::default()
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn with_min_layer_width(mut self, width: usize) -> Self {
        self.parallel_min_layer_width = width.max(1);
        self
    }

    /// Reads [`ENV_PARALLEL`] and [`ENV_PARALLEL_MIN_WIDTH`] on top of the
    /// defaults. Unset variables keep their default; malformed ones are a
    /// `ConfigurationError`.
    pub fn from_env() -> Result<Self, GradGraphError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub(crate) fn from_lookup<F>(lookup: F) -> Result<Self, GradGraphError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(raw) = lookup(ENV_PARALLEL) {
            config.parallel = match raw.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => true,
                "0" | "false" | "no" | "off" | "" => false,
                other => {
                    return Err(GradGraphError::ConfigurationError(format!(
                        "{} must be a boolean, got '{}'",
                        ENV_PARALLEL, other
                    )))
                }
            };
        }

        if let Some(raw) = lookup(ENV_PARALLEL_MIN_WIDTH) {
            let width = raw.trim().parse::<usize>().map_err(|_| {
                GradGraphError::ConfigurationError(format!(
                    "{} must be a positive integer, got '{}'",
                    ENV_PARALLEL_MIN_WIDTH, raw
                ))
            })?;
            config = config.with_min_layer_width(width);
        }

        debug!("GraphConfig from environment: {:?}", config);
        Ok(config)
    }
}
