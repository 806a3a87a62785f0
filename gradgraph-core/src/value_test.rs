use super::*;
use crate::error::GradGraphError;

#[test]
fn test_shape_numel_and_dims() {
    assert_eq!(Shape::Scalar.numel(), 1);
    assert_eq!(Shape::Vector(5).numel(), 5);
    assert_eq!(Shape::Matrix { rows: 2, cols: 3 }.numel(), 6);
    assert_eq!(Shape::Scalar.dims(), Vec::<usize>::new());
    assert_eq!(Shape::Matrix { rows: 2, cols: 3 }.dims(), vec![2, 3]);
    assert_eq!(Shape::Vector(4).rank(), Rank::Vector);
}

#[test]
fn test_shape_display() {
    assert_eq!(Shape::Scalar.to_string(), "scalar");
    assert_eq!(Shape::Vector(3).to_string(), "[3]");
    assert_eq!(Shape::Matrix { rows: 2, cols: 4 }.to_string(), "[2 x 4]");
}

#[test]
fn test_matrix_new_checks_length() {
    let m = Matrix::new(2, 2, vec![1.0f32, 2.0, 3.0, 4.0]).unwrap();
    assert_eq!(m[(1, 0)], 3.0);
    assert_eq!(m.row(1), &[3.0, 4.0]);

    let err = Matrix::new(2, 3, vec![1.0f32; 5]).unwrap_err();
    assert!(matches!(err, GradGraphError::ShapeMismatch { .. }));
}

#[test]
fn test_matrix_from_rows_rejects_ragged() {
    let m = Matrix::from_rows(vec![vec![1.0f64, 2.0, 3.0], vec![4.0, 5.0, 6.0]]).unwrap();
    assert_eq!(m.shape(), Shape::Matrix { rows: 2, cols: 3 });
    assert_eq!(m.as_slice(), &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);

    let ragged = Matrix::from_rows(vec![vec![1.0f64, 2.0], vec![3.0]]);
    assert!(ragged.is_err());
}

#[test]
fn test_matrix_transpose() {
    let m = Matrix::from_rows(vec![vec![1.0f32, 2.0, 3.0], vec![4.0, 5.0, 6.0]]).unwrap();
    let t = m.transpose();
    assert_eq!(t.rows(), 3);
    assert_eq!(t.cols(), 2);
    assert_eq!(t.as_slice(), &[1.0, 4.0, 2.0, 5.0, 3.0, 6.0]);
}

#[test]
fn test_value_flat_views() {
    let mut s: Value<f32> = Value::Scalar(2.0);
    assert_eq!(s.as_slice(), &[2.0]);
    s.as_mut_slice()[0] = 3.0;
    assert_eq!(s.as_scalar(), Some(3.0));

    let m: Value<f32> = Matrix::filled(2, 2, 1.5).into();
    assert_eq!(m.numel(), 4);
    assert_eq!(m.rank(), Rank::Matrix);
    assert!(m.as_vector().is_none());
}

#[test]
fn test_value_elementwise_helpers() {
    let mut a: Value<f64> = vec![1.0, 2.0, 3.0].into();
    let b: Value<f64> = vec![0.5, 0.5, 0.5].into();

    a.add_assign(&b).unwrap();
    assert_eq!(a.as_slice(), &[1.5, 2.5, 3.5]);

    let h = a.hadamard(&b).unwrap();
    assert_eq!(h.as_slice(), &[0.75, 1.25, 1.75]);

    let s = b.scaled(4.0);
    assert_eq!(s.as_slice(), &[2.0, 2.0, 2.0]);

    let sq = b.map(|x| x * x);
    assert_eq!(sq.as_slice(), &[0.25, 0.25, 0.25]);
}

#[test]
fn test_value_helpers_reject_mismatched_shapes() {
    let mut a: Value<f32> = vec![1.0, 2.0].into();
    let b: Value<f32> = vec![1.0, 2.0, 3.0].into();
    let err = a.add_assign(&b).unwrap_err();
    assert_eq!(
        err,
        GradGraphError::ShapeMismatch {
            expected: Shape::Vector(2),
            actual: Shape::Vector(3),
            operation: "Value::add_assign".to_string(),
        }
    );
    assert!(a.hadamard(&b).is_err());
}

#[test]
fn test_value_zeros_ones_fill() {
    let mut v = Value::<f32>::zeros(Shape::Matrix { rows: 2, cols: 3 });
    assert!(v.as_slice().iter().all(|&x| x == 0.0));
    v.fill(7.0);
    assert!(v.as_slice().iter().all(|&x| x == 7.0));
    assert_eq!(Value::<f32>::ones(Shape::Vector(2)).as_slice(), &[1.0, 1.0]);
    assert_eq!(Value::<f32>::default(), Value::Scalar(0.0));
}
