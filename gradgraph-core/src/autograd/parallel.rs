//! Layered execution on the rayon pool.
//!
//! Nodes of one dependency layer share no edges, so a layer can be processed
//! concurrently once the previous layer (forward) or the next layer
//! (backward) is complete. During the backward pass several nodes of a layer
//! may feed the same operand, so each accumulator sits behind its own mutex.

use crate::graph::Graph;
use crate::numeric::GraphFloat;
use crate::ops::{self, GradientSink};
use crate::value::Value;
use log::{trace, warn};
use rayon::prelude::*;
use std::sync::{Mutex, MutexGuard};

pub(crate) fn forward_layers<T: GraphFloat>(graph: &mut Graph<T>, layers: &[Vec<usize>]) {
    let min_width = graph.config.parallel_min_layer_width;
    for (depth, layer) in layers.iter().enumerate() {
        if layer.len() < min_width {
            for &index in layer {
                graph.evaluate_index(index);
            }
            continue;
        }

        trace!("Forward layer {}: {} nodes on the pool", depth, layer.len());
        let computed: Vec<(usize, Value<T>)> = {
            let meta = &graph.meta;
            let values = &graph.values;
            layer
                .par_iter()
                .filter(|&&index| !meta[index].op.is_leaf())
                .map(|&index| {
                    let mut out = Value::zeros(values[index].shape());
                    ops::forward(&meta[index].op, values, &mut out);
                    (index, out)
                })
                .collect()
        };
        for (index, value) in computed {
            graph.values[index] = value;
        }
    }
}

pub(crate) fn backward_layers<T: GraphFloat>(graph: &mut Graph<T>, layers: &[Vec<usize>]) {
    let min_width = graph.config.parallel_min_layer_width;
    let slots: Vec<Mutex<Value<T>>> = std::mem::take(&mut graph.grads)
        .into_iter()
        .map(Mutex::new)
        .collect();

    {
        let meta = &graph.meta;
        let values = &graph.values;
        let slots = &slots;
        let run = |&index: &usize| {
            let op = &meta[index].op;
            if op.is_leaf() {
                return;
            }
            // Operands live in shallower layers, so no other worker holds
            // this node's slot and `own` never aliases a sink slot.
            let own = lock(&slots[index]);
            let mut sink = LockedGrads(slots);
            ops::backward(op, &values[index], &*own, values, &mut sink);
        };

        for (depth, layer) in layers.iter().enumerate().rev() {
            if layer.len() < min_width {
                layer.iter().for_each(run);
            } else {
                trace!("Backward layer {}: {} nodes on the pool", depth, layer.len());
                layer.par_iter().for_each(run);
            }
        }
    }

    graph.grads = slots
        .into_iter()
        .map(|slot| {
            slot.into_inner().unwrap_or_else(|poisoned| {
                warn!("Gradient slot mutex was poisoned; recovering its contents");
                poisoned.into_inner()
            })
        })
        .collect();
}

struct LockedGrads<'a, T>(&'a [Mutex<Value<T>>]);

impl<T: GraphFloat> GradientSink<T> for LockedGrads<'_, T> {
    fn accumulate<F: FnOnce(&mut [T])>(&mut self, index: usize, f: F) {
        let mut guard = lock(&self.0[index]);
        f(guard.as_mut_slice());
    }
}

fn lock<T>(slot: &Mutex<T>) -> MutexGuard<'_, T> {
    slot.lock().unwrap_or_else(|poisoned| {
        warn!("Gradient slot mutex was poisoned; recovering its contents");
        poisoned.into_inner()
    })
}
