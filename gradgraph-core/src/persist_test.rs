use super::*;
use crate::value::Shape;
use std::io::Cursor;
use std::path::PathBuf;

fn scratch_path(name: &str) -> PathBuf {
    std::env::temp_dir()
        .join(format!("gradgraph-persist-{}", std::process::id()))
        .join(name)
}

#[test]
fn test_record_layout() {
    let mut g: Graph<f32> = Graph::new();
    let m = g.parameter(Matrix::new(2, 1, vec![1.5f32, -2.0]).unwrap());

    let mut buf = Vec::new();
    write_leaf(&g, m, &mut buf).unwrap();

    let mut expected = vec![1u8];
    expected.extend_from_slice(&2u64.to_le_bytes());
    expected.extend_from_slice(&1u64.to_le_bytes());
    expected.extend_from_slice(&1.5f32.to_le_bytes());
    expected.extend_from_slice(&(-2.0f32).to_le_bytes());
    assert_eq!(buf, expected);
}

#[test]
fn test_write_then_read_leaf() {
    let mut g: Graph<f64> = Graph::new();
    let s = g.leaf(3.25);
    let v = g.parameter(vec![1.0, 2.0, 3.0]);

    let mut buf = Vec::new();
    write_leaf(&g, s, &mut buf).unwrap();
    write_leaf(&g, v, &mut buf).unwrap();

    let mut other: Graph<f64> = Graph::new();
    let mut reader = Cursor::new(buf);
    let s2 = read_leaf(&mut other, Rank::Scalar, &mut reader).unwrap();
    let v2 = read_leaf(&mut other, Rank::Vector, &mut reader).unwrap();

    assert_eq!(other.scalar_value(s2).unwrap(), 3.25);
    assert!(!other.is_trainable(s2).unwrap());
    assert_eq!(other.value(v2).unwrap().as_slice(), &[1.0, 2.0, 3.0]);
    assert!(other.is_trainable(v2).unwrap());
}

#[test]
fn test_write_rejects_derived_nodes() {
    let mut g: Graph<f64> = Graph::new();
    let a = g.leaf(1.0);
    let b = g.exp(a).unwrap();
    let err = write_leaf(&g, b, &mut Vec::new()).unwrap_err();
    assert_eq!(err, GradGraphError::NotALeaf { index: b.index() });
}

#[test]
fn test_load_into_checks_shape() {
    let mut g: Graph<f64> = Graph::new();
    let v = g.parameter(vec![1.0, 2.0]);
    let w = g.parameter(vec![0.0, 0.0, 0.0]);

    let mut buf = Vec::new();
    write_leaf(&g, v, &mut buf).unwrap();

    let err = load_into(&mut g, w, &mut Cursor::new(buf.clone())).unwrap_err();
    assert_eq!(
        err,
        GradGraphError::ShapeMismatch {
            expected: Shape::Vector(3),
            actual: Shape::Vector(2),
            operation: "load_into".to_string(),
        }
    );
    assert_eq!(g.value(w).unwrap().as_slice(), &[0.0, 0.0, 0.0]);

    g.set_value(v, vec![9.0, 9.0]).unwrap();
    load_into(&mut g, v, &mut Cursor::new(buf)).unwrap();
    assert_eq!(g.value(v).unwrap().as_slice(), &[1.0, 2.0]);
}

#[test]
fn test_truncated_and_malformed_records() {
    let mut g: Graph<f32> = Graph::new();
    let v = g.leaf(vec![1.0f32, 2.0, 3.0]);
    let mut buf = Vec::new();
    write_leaf(&g, v, &mut buf).unwrap();

    let short = buf[..buf.len() - 2].to_vec();
    let err = read_leaf(&mut g, Rank::Vector, &mut Cursor::new(short)).unwrap_err();
    assert!(matches!(err, GradGraphError::InvalidFormat(_)));

    let header_only = buf[..4].to_vec();
    let err = read_leaf(&mut g, Rank::Vector, &mut Cursor::new(header_only)).unwrap_err();
    assert!(matches!(err, GradGraphError::InvalidFormat(_)));

    let mut bad_flag = buf.clone();
    bad_flag[0] = 7;
    let err = read_leaf(&mut g, Rank::Vector, &mut Cursor::new(bad_flag)).unwrap_err();
    assert!(matches!(err, GradGraphError::InvalidFormat(_)));

    // Nothing was added by the failed reads.
    assert_eq!(g.len(), 1);
}

#[test]
fn test_file_round_trip_creates_directories() {
    let path = scratch_path("nested/params.bin");
    let mut g: Graph<f32> = Graph::new();
    let w = g.parameter(Matrix::new(2, 2, vec![0.1f32, 0.2, 0.3, 0.4]).unwrap());
    let b = g.parameter(vec![0.5f32, -0.5]);
    save_to_file(&g, &[w, b], &path).unwrap();

    g.set_value(w, Matrix::filled(2, 2, 0.0f32)).unwrap();
    g.set_value(b, vec![0.0f32, 0.0]).unwrap();
    load_from_file(&mut g, &[w, b], &path).unwrap();

    assert_eq!(g.value(w).unwrap().as_slice(), &[0.1, 0.2, 0.3, 0.4]);
    assert_eq!(g.value(b).unwrap().as_slice(), &[0.5, -0.5]);
    let _ = std::fs::remove_dir_all(path.parent().unwrap());
}

#[test]
fn test_failed_file_load_leaves_graph_untouched() {
    let path = scratch_path("partial.bin");
    let mut g: Graph<f32> = Graph::new();
    let a = g.parameter(vec![1.0f32, 2.0]);
    save_to_file(&g, &[a], &path).unwrap();

    // The file holds one record; asking for two fails on the second and must
    // not have applied the first.
    let b = g.parameter(vec![0.0f32, 0.0]);
    g.set_value(a, vec![5.0f32, 5.0]).unwrap();
    let err = load_from_file(&mut g, &[a, b], &path).unwrap_err();
    assert!(matches!(err, GradGraphError::InvalidFormat(_)));
    assert_eq!(g.value(a).unwrap().as_slice(), &[5.0, 5.0]);

    let missing = load_from_file(&mut g, &[a], scratch_path("does-not-exist.bin")).unwrap_err();
    assert!(matches!(missing, GradGraphError::Io(_)));
    let _ = std::fs::remove_file(&path);
}
