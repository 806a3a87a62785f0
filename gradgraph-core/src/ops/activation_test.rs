use crate::autograd::check_grad;
use crate::graph::Graph;
use crate::init::{Init, RandSampler};
use crate::utils::testing::{check_value_near, executor_configs, GRAD_CHECK_SEEDS};
use crate::value::Shape;
use approx::assert_relative_eq;

#[test]
fn test_sigmoid_forward_backward() {
    let mut g: Graph<f64> = Graph::new();
    let x = g.parameter(vec![0.0, 2.0, -2.0]);
    let y = g.sigmoid(x).unwrap();

    let s2 = 1.0 / (1.0 + (-2.0f64).exp());
    check_value_near(g.value(y).unwrap(), Shape::Vector(3), &[0.5, s2, 1.0 - s2], 1e-12);

    g.calculate_derivatives(y).unwrap();
    let d2 = s2 * (1.0 - s2);
    check_value_near(g.gradient(x).unwrap(), Shape::Vector(3), &[0.25, d2, d2], 1e-12);
}

#[test]
fn test_tanh_forward_backward() {
    let mut g: Graph<f64> = Graph::new();
    let x = g.parameter(0.7);
    let y = g.tanh(x).unwrap();
    g.calculate_derivatives(y).unwrap();

    let t = 0.7f64.tanh();
    assert_relative_eq!(g.scalar_value(y).unwrap(), t);
    assert_relative_eq!(g.gradient(x).unwrap().as_scalar().unwrap(), 1.0 - t * t);
}

#[test]
fn test_sigmoid_saturates_without_nan() {
    let mut g: Graph<f32> = Graph::new();
    let x = g.parameter(vec![-100.0f32, 100.0]);
    let y = g.sigmoid(x).unwrap();
    g.calculate_derivatives(y).unwrap();

    let values = g.value(y).unwrap().as_slice();
    assert_eq!(values[0], 0.0);
    assert_eq!(values[1], 1.0);
    assert!(g.gradient(x).unwrap().as_slice().iter().all(|d| *d == 0.0));
}

#[test]
fn test_activations_match_finite_differences() {
    let mut g: Graph<f64> = Graph::new();
    let x = g.parameter(vec![-1.3, 0.2, 0.9, 2.4]);
    let h = g.tanh(x).unwrap();
    let y = g.sigmoid(h).unwrap();
    let z = g.mul(y, x).unwrap();

    check_grad(&mut g, z, &[x], None, 1e-6, 1e-6).unwrap();
}

#[test]
fn test_activations_random_operands() {
    for config in executor_configs() {
        for seed in GRAD_CHECK_SEEDS {
            let mut g: Graph<f64> = Graph::with_config(config);
            let mut sampler = RandSampler::seeded(seed);
            let x = g
                .random_matrix(2, 3, Init::standard_normal(), &mut sampler, true)
                .unwrap();
            let h = g.tanh(x).unwrap();
            let y = g.sigmoid(h).unwrap();
            let z = g.hadamard(y, x).unwrap();
            let out = g.sum(z).unwrap();

            check_grad(&mut g, out, &[x], None, 1e-6, 1e-5).unwrap();
        }
    }
}
