use crate::autograd::check_grad;
use crate::error::GradGraphError;
use crate::graph::Graph;
use crate::init::{Init, RandSampler};
use crate::utils::testing::{check_value_near, executor_configs, GRAD_CHECK_SEEDS};
use crate::value::{Matrix, Shape};

#[test]
fn test_element_picks_one_entry() {
    let mut g: Graph<f64> = Graph::new();
    let v = g.parameter(vec![3.0, 4.0, 5.0]);
    let e = g.element(v, 1).unwrap();
    g.calculate_derivatives(e).unwrap();

    assert_eq!(g.scalar_value(e).unwrap(), 4.0);
    assert_eq!(g.gradient(v).unwrap().as_slice(), &[0.0, 1.0, 0.0]);
}

#[test]
fn test_element_out_of_bounds() {
    let mut g: Graph<f64> = Graph::new();
    let v = g.leaf(vec![3.0, 4.0, 5.0]);
    assert_eq!(
        g.element(v, 3).unwrap_err(),
        GradGraphError::IndexOutOfBounds {
            index: 3,
            len: 3,
            operation: "element".to_string(),
        }
    );
    let s = g.leaf(1.0);
    assert!(matches!(
        g.element(s, 0),
        Err(GradGraphError::RankMismatch { .. })
    ));
}

#[test]
fn test_row_extraction() {
    let mut g: Graph<f64> = Graph::new();
    let m = g.parameter(Matrix::new(3, 2, vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]).unwrap());
    let r = g.row(m, 2).unwrap();
    check_value_near(g.value(r).unwrap(), Shape::Vector(2), &[5.0, 6.0], 1e-12);

    g.calculate_derivatives_with_seed(r, vec![-1.0, 2.0]).unwrap();
    assert_eq!(
        g.gradient(m).unwrap().as_slice(),
        &[0.0, 0.0, 0.0, 0.0, -1.0, 2.0]
    );

    assert!(matches!(
        g.row(m, 3),
        Err(GradGraphError::IndexOutOfBounds { index: 3, len: 3, .. })
    ));
}

#[test]
fn test_stack_scalars() {
    let mut g: Graph<f64> = Graph::new();
    let a = g.parameter(1.0);
    let b = g.parameter(2.0);
    let v = g.stack(&[a, b, a]).unwrap();
    check_value_near(g.value(v).unwrap(), Shape::Vector(3), &[1.0, 2.0, 1.0], 1e-12);

    g.calculate_derivatives_with_seed(v, vec![1.0, 10.0, 100.0]).unwrap();
    assert_eq!(g.gradient(a).unwrap().as_scalar(), Some(101.0));
    assert_eq!(g.gradient(b).unwrap().as_scalar(), Some(10.0));
}

#[test]
fn test_stack_rejects_bad_operands() {
    let mut g: Graph<f64> = Graph::new();
    assert_eq!(
        g.stack(&[]).unwrap_err(),
        GradGraphError::EmptyInput {
            operation: "stack".to_string(),
        }
    );
    let s = g.leaf(1.0);
    let v = g.leaf(vec![1.0, 2.0]);
    assert!(matches!(
        g.stack(&[s, v]),
        Err(GradGraphError::RankMismatch { .. })
    ));
}

#[test]
fn test_indexing_matches_finite_differences() {
    let mut g: Graph<f64> = Graph::new();
    let m = g.parameter(Matrix::new(2, 3, vec![0.2, -0.7, 1.4, 0.5, 0.9, -1.1]).unwrap());
    let r0 = g.row(m, 0).unwrap();
    let r1 = g.row(m, 1).unwrap();
    let p = g.mul(r0, r1).unwrap();
    let e0 = g.element(p, 0).unwrap();
    let e2 = g.element(p, 2).unwrap();
    let sq = g.mul(e0, e2).unwrap();
    let v = g.stack(&[e0, sq, e2]).unwrap();

    check_grad(&mut g, v, &[m], None, 1e-6, 1e-6).unwrap();
}

#[test]
fn test_indexing_random_operands() {
    for config in executor_configs() {
        for seed in GRAD_CHECK_SEEDS {
            let mut g: Graph<f64> = Graph::with_config(config);
            let mut sampler = RandSampler::seeded(seed);
            let m = g
                .random_matrix(3, 2, Init::standard_normal(), &mut sampler, true)
                .unwrap();
            let r0 = g.row(m, 0).unwrap();
            let r2 = g.row(m, 2).unwrap();
            let p = g.hadamard(r0, r2).unwrap();
            let e0 = g.element(p, 0).unwrap();
            let e1 = g.element(r2, 1).unwrap();
            let sq = g.mul(e0, e1).unwrap();
            let out = g.stack(&[e1, sq, e0, e1]).unwrap();

            check_grad(&mut g, out, &[m], None, 1e-6, 1e-5).unwrap();
        }
    }
}
