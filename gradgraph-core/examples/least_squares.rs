//! Fits `y = a * exp(b * x)` to noisy samples with Gauss-Newton iterations.
//!
//! The residual vector `r_i = a * exp(b * x_i) - y_i` is built once as a graph;
//! every iteration takes its Jacobian with respect to `[a, b]`, solves the
//! normal equations `(J^T J) delta = -J^T r` and moves the parameters.
//!
//! Run with `cargo run --example least_squares`.

use gradgraph_core::init::{RandSampler, Sampler};
use gradgraph_core::{GradGraphError, Graph, Matrix};

const TRUE_A: f64 = 1.2;
const TRUE_B: f64 = 0.5;
const NOISE: f64 = 1.5;
const ITERATIONS: usize = 10;

/// Solves the square system `a x = b` by Gaussian elimination with partial
/// pivoting.
fn solve(mut a: Matrix<f64>, mut b: Vec<f64>) -> Result<Vec<f64>, GradGraphError> {
    let n = b.len();
    for k in 0..n {
        let pivot = (k..n)
            .max_by(|&i, &j| a[(i, k)].abs().total_cmp(&a[(j, k)].abs()))
            .unwrap_or(k);
        if a[(pivot, k)] == 0.0 {
            return Err(GradGraphError::ConfigurationError(
                "normal equations are singular".to_string(),
            ));
        }
        if pivot != k {
            for j in 0..n {
                let tmp = a[(k, j)];
                a[(k, j)] = a[(pivot, j)];
                a[(pivot, j)] = tmp;
            }
            b.swap(k, pivot);
        }
        for i in k + 1..n {
            let m = a[(i, k)] / a[(k, k)];
            for j in k..n {
                a[(i, j)] -= m * a[(k, j)];
            }
            b[i] -= m * b[k];
        }
    }

    let mut x = vec![0.0; n];
    for k in (0..n).rev() {
        let tail: f64 = (k + 1..n).map(|j| a[(k, j)] * x[j]).sum();
        x[k] = (b[k] - tail) / a[(k, k)];
    }
    Ok(x)
}

fn main() -> Result<(), GradGraphError> {
    env_logger::init();
    let mut sampler = RandSampler::seeded(2024);
    let mut graph: Graph<f64> = Graph::new();

    let params = graph.parameter(vec![1.9, -0.1]);
    graph.set_name(params, "p")?;
    let a = graph.element(params, 0)?;
    let b = graph.element(params, 1)?;

    let mut residuals = Vec::new();
    for step in 0..=150 {
        let x = -10.0 + 0.1 * step as f64;
        let jitter: f64 = Sampler::<f64>::sample_uniform(&mut sampler, -0.5, 0.5)?;
        let y = TRUE_A * (TRUE_B * x).exp() + jitter * NOISE;
        let bx = graph.scale_by(b, x)?;
        let e = graph.exp(bx)?;
        let model = graph.mul(a, e)?;
        residuals.push(graph.add_scalar(model, -y)?);
    }
    let f = graph.stack(&residuals)?;
    println!("residual 0 = {}", graph.expression(residuals[0])?);

    for iter in 0..ITERATIONS {
        // Also refreshes every residual value.
        let jac = graph.jacobian(f, params)?;
        let r = graph.value(f)?.as_slice();

        let jt = jac.transpose();
        let mut jtj = Matrix::zeros(2, 2);
        let mut jtr = vec![0.0; 2];
        for i in 0..2 {
            for j in 0..2 {
                jtj[(i, j)] = jt.row(i).iter().zip(jt.row(j)).map(|(x, y)| x * y).sum();
            }
            jtr[i] = -jt.row(i).iter().zip(r).map(|(x, y)| x * y).sum::<f64>();
        }
        let delta = solve(jtj, jtr)?;

        let cost: f64 = r.iter().map(|v| v * v).sum::<f64>() / 2.0;
        for (p, d) in graph.leaf_values_mut(params)?.iter_mut().zip(&delta) {
            *p += d;
        }
        println!("iter {:2}: cost before step = {:.4}", iter, cost);
    }

    let fitted = graph.value(params)?.as_slice();
    println!(
        "Final params: a = {:.4}, b = {:.4} (true {} and {})",
        fitted[0], fitted[1], TRUE_A, TRUE_B
    );
    Ok(())
}
