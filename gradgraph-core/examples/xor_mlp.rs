//! Trains a 2-8-1 multi-layer perceptron on the XOR table with hand-written
//! gradient descent.
//!
//! Each epoch runs one forward/backward pass over the whole batch and then
//! updates every trainable leaf in place through `leaf_buffers_mut`.
//!
//! Run with `cargo run --example xor_mlp`. Set `GRADGRAPH_PARALLEL=1` to use
//! the layered parallel executor.

use gradgraph_core::init::{Init, RandSampler};
use gradgraph_core::{GradGraphError, Graph, GraphConfig, Matrix};

const HIDDEN: usize = 8;
const EPOCHS: usize = 5000;
const LEARNING_RATE: f32 = 0.5;

fn main() -> Result<(), GradGraphError> {
    env_logger::init();
    let mut graph: Graph<f32> = Graph::with_config(GraphConfig::from_env()?);
    let mut sampler = RandSampler::seeded(42);

    // --- Data ---
    let x = graph.leaf(Matrix::from_rows(vec![
        vec![0.0f32, 0.0],
        vec![1.0, 0.0],
        vec![0.0, 1.0],
        vec![1.0, 1.0],
    ])?);
    let target = graph.leaf(Matrix::from_rows(vec![
        vec![0.0f32],
        vec![1.0],
        vec![1.0],
        vec![0.0],
    ])?);

    // --- Parameters ---
    let w1 = graph.random_matrix(2, HIDDEN, Init::xavier_uniform(2, HIDDEN), &mut sampler, true)?;
    let b1 = graph.random_vector(HIDDEN, Init::Constant(0.0), &mut sampler, true)?;
    let w2 = graph.random_matrix(HIDDEN, 1, Init::xavier_uniform(HIDDEN, 1), &mut sampler, true)?;
    let b2 = graph.random_vector(1, Init::Constant(0.0), &mut sampler, true)?;
    let params = [w1, b1, w2, b2];

    // --- Model ---
    let h = graph.matmul(x, w1)?;
    let h = graph.broadcast_cols(h, b1)?;
    let h = graph.tanh(h)?;
    let o = graph.matmul(h, w2)?;
    let o = graph.broadcast_cols(o, b2)?;
    let output = graph.sigmoid(o)?;
    let loss = graph.mse_loss(output, target)?;

    // --- Training ---
    for epoch in 0..EPOCHS {
        graph.calculate_derivatives(loss)?;
        if epoch % 500 == 0 {
            println!("epoch {:5}: mse = {:.6}", epoch, graph.scalar_value(loss)?);
        }
        for &p in &params {
            let (values, grads) = graph.leaf_buffers_mut(p)?;
            for (v, g) in values.iter_mut().zip(grads) {
                *v -= LEARNING_RATE * g;
            }
        }
    }

    graph.eval(loss)?;
    println!("final mse = {:.6}", graph.scalar_value(loss)?);
    for (row, y) in graph.value(output)?.as_slice().iter().enumerate() {
        println!("xor sample {} -> {:.3}", row, y);
    }
    Ok(())
}
