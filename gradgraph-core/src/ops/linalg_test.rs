use crate::autograd::check_grad;
use crate::error::GradGraphError;
use crate::graph::Graph;
use crate::init::{Init, RandSampler, Sampler};
use crate::utils::testing::{check_value_near, executor_configs, GRAD_CHECK_SEEDS};
use crate::value::{Matrix, Rank, Shape, Value};
use approx::assert_relative_eq;

fn matrix(rows: usize, cols: usize, data: &[f64]) -> Matrix<f64> {
    Matrix::new(rows, cols, data.to_vec()).unwrap()
}

#[test]
fn test_dot_of_constant_vectors() {
    let mut g: Graph<f64> = Graph::new();
    let a = g.parameter(vec![1.2; 5]);
    let b = g.parameter(vec![0.3; 5]);
    let d = g.dot(a, b).unwrap();
    g.calculate_derivatives(d).unwrap();

    assert_relative_eq!(g.scalar_value(d).unwrap(), 1.8, epsilon = 1e-12);
    check_value_near(g.gradient(a).unwrap(), Shape::Vector(5), &[0.3; 5], 1e-12);
    check_value_near(g.gradient(b).unwrap(), Shape::Vector(5), &[1.2; 5], 1e-12);
}

#[test]
fn test_dot_rejects_mismatched_lengths() {
    let mut g: Graph<f64> = Graph::new();
    let a = g.leaf(vec![1.0, 2.0]);
    let b = g.leaf(vec![1.0, 2.0, 3.0]);
    let s = g.leaf(1.0);
    assert!(matches!(
        g.dot(a, b),
        Err(GradGraphError::ShapeMismatch { .. })
    ));
    assert!(matches!(g.dot(a, s), Err(GradGraphError::RankMismatch { .. })));
}

#[test]
fn test_matvec_forward_backward() {
    let mut g: Graph<f64> = Graph::new();
    let m = g.parameter(matrix(2, 3, &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]));
    let v = g.parameter(vec![1.0, 0.0, -1.0]);
    let y = g.matvec(m, v).unwrap();
    check_value_near(g.value(y).unwrap(), Shape::Vector(2), &[-2.0, -2.0], 1e-12);

    g.calculate_derivatives_with_seed(y, vec![1.0, 2.0]).unwrap();
    // dM = g v^T, dv = M^T g
    check_value_near(
        g.gradient(m).unwrap(),
        Shape::Matrix { rows: 2, cols: 3 },
        &[1.0, 0.0, -1.0, 2.0, 0.0, -2.0],
        1e-12,
    );
    check_value_near(g.gradient(v).unwrap(), Shape::Vector(3), &[9.0, 12.0, 15.0], 1e-12);
}

#[test]
fn test_matvec_mismatch_fails_at_construction() {
    let mut g: Graph<f64> = Graph::new();
    let m = g.leaf(Matrix::<f64>::zeros(2, 3));
    let v = g.leaf(vec![1.0, 2.0]);
    let before = g.len();

    assert_eq!(
        g.matvec(m, v).unwrap_err(),
        GradGraphError::ShapeMismatch {
            expected: Shape::Vector(3),
            actual: Shape::Vector(2),
            operation: "matvec".to_string(),
        }
    );
    assert_eq!(
        g.matvec(v, v).unwrap_err(),
        GradGraphError::RankMismatch {
            expected: Rank::Matrix,
            actual: Rank::Vector,
            operation: "matvec".to_string(),
        }
    );
    assert_eq!(g.len(), before);
}

#[test]
fn test_matmul_forward() {
    let mut g: Graph<f64> = Graph::new();
    let a = g.leaf(matrix(2, 3, &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]));
    let b = g.leaf(matrix(3, 2, &[7.0, 8.0, 9.0, 10.0, 11.0, 12.0]));
    let c = g.matmul(a, b).unwrap();
    check_value_near(
        g.value(c).unwrap(),
        Shape::Matrix { rows: 2, cols: 2 },
        &[58.0, 64.0, 139.0, 154.0],
        1e-12,
    );

    let bad = g.leaf(Matrix::<f64>::zeros(2, 2));
    assert!(matches!(
        g.matmul(a, bad),
        Err(GradGraphError::ShapeMismatch { .. })
    ));
}

#[test]
fn test_transpose_forward() {
    let mut g: Graph<f64> = Graph::new();
    let a = g.leaf(matrix(2, 3, &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]));
    let t = g.transpose(a).unwrap();
    check_value_near(
        g.value(t).unwrap(),
        Shape::Matrix { rows: 3, cols: 2 },
        &[1.0, 4.0, 2.0, 5.0, 3.0, 6.0],
        1e-12,
    );
}

#[test]
fn test_broadcasts_forward_backward() {
    let mut g: Graph<f64> = Graph::new();
    let m = g.parameter(Matrix::<f64>::zeros(2, 3));
    let per_row = g.parameter(vec![1.0, 2.0]);
    let per_col = g.parameter(vec![10.0, 20.0, 30.0]);
    let r = g.broadcast_rows(m, per_row).unwrap();
    let c = g.broadcast_cols(r, per_col).unwrap();

    let shape = Shape::Matrix { rows: 2, cols: 3 };
    check_value_near(
        g.value(c).unwrap(),
        shape,
        &[11.0, 21.0, 31.0, 12.0, 22.0, 32.0],
        1e-12,
    );

    g.calculate_derivatives(c).unwrap();
    check_value_near(g.gradient(m).unwrap(), shape, &[1.0; 6], 1e-12);
    check_value_near(g.gradient(per_row).unwrap(), Shape::Vector(2), &[3.0, 3.0], 1e-12);
    check_value_near(g.gradient(per_col).unwrap(), Shape::Vector(3), &[2.0, 2.0, 2.0], 1e-12);

    let wrong = g.leaf(vec![1.0, 2.0]);
    assert!(g.broadcast_cols(m, wrong).is_err());
}

#[test]
fn test_linalg_matches_finite_differences() {
    let mut g: Graph<f64> = Graph::new();
    let a = g.parameter(matrix(2, 3, &[0.5, -1.0, 0.3, 1.2, 0.8, -0.4]));
    let b = g.parameter(matrix(3, 2, &[1.1, -0.2, 0.0, 0.6, -0.9, 0.4]));
    let bias = g.parameter(vec![0.1, -0.3]);
    let v = g.parameter(vec![0.7, -1.5]);

    let ab = g.matmul(a, b).unwrap();
    let t = g.transpose(ab).unwrap();
    let shifted = g.broadcast_cols(t, bias).unwrap();
    let rows = g.broadcast_rows(shifted, v).unwrap();
    let y = g.matvec(rows, v).unwrap();
    let w = g.dot(y, v).unwrap();

    check_grad(&mut g, w, &[a, b, bias, v], None, 1e-6, 1e-6).unwrap();
}

#[test]
fn test_linalg_random_rectangular_operands() {
    for config in executor_configs() {
        for seed in GRAD_CHECK_SEEDS {
            let mut g: Graph<f64> = Graph::with_config(config);
            let mut sampler = RandSampler::seeded(seed);
            let init = Init::Uniform { low: -1.0, high: 1.0 };
            let a = g.random_matrix(2, 3, init, &mut sampler, true).unwrap();
            let b = g.random_matrix(3, 4, init, &mut sampler, true).unwrap();
            let r = g.random_vector(2, init, &mut sampler, true).unwrap();
            let c = g.random_vector(4, init, &mut sampler, true).unwrap();
            let v = g.random_vector(2, init, &mut sampler, true).unwrap();

            let ab = g.matmul(a, b).unwrap();
            let by_row = g.broadcast_rows(ab, r).unwrap();
            let by_col = g.broadcast_cols(by_row, c).unwrap();
            let t = g.transpose(by_col).unwrap();
            assert_eq!(g.shape(t).unwrap(), Shape::Matrix { rows: 4, cols: 2 });
            let y = g.matvec(t, v).unwrap();
            let out = g.dot(y, c).unwrap();

            check_grad(&mut g, out, &[a, b, r, c, v], None, 1e-6, 1e-5).unwrap();

            let seed_values: Vec<f64> = (0..4)
                .map(|_| Sampler::sample_uniform(&mut sampler, -1.0, 1.0).unwrap())
                .collect();
            let upstream = Value::Vector(seed_values);
            check_grad(&mut g, y, &[a, b, r, c, v], Some(&upstream), 1e-6, 1e-5).unwrap();
        }
    }
}
