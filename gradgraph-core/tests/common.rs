use gradgraph_core::{Graph, NodeId};

/// Routes `log` output through the test harness. Safe to call from every test.
#[allow(dead_code)]
pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// A small two-layer network over a fixed batch, returning the loss node and
/// its trainable leaves `[w1, b1, w2, b2]`.
#[allow(dead_code)]
pub fn build_two_layer_loss(graph: &mut Graph<f64>) -> (NodeId, Vec<NodeId>) {
    use gradgraph_core::Matrix;

    let x = graph.leaf(
        Matrix::from_rows(vec![
            vec![0.1, -0.4, 0.7],
            vec![1.2, 0.3, -0.5],
            vec![-0.8, 0.9, 0.2],
            vec![0.0, -1.1, 0.6],
        ])
        .unwrap(),
    );
    let w1 = graph.parameter(
        Matrix::from_rows(vec![
            vec![0.2, -0.3, 0.5, 0.1],
            vec![-0.6, 0.4, 0.05, -0.2],
            vec![0.3, 0.7, -0.4, 0.25],
        ])
        .unwrap(),
    );
    let b1 = graph.parameter(vec![0.01, -0.02, 0.03, 0.0]);
    let w2 = graph.parameter(
        Matrix::from_rows(vec![vec![0.5], vec![-0.25], vec![0.75], vec![-0.6]]).unwrap(),
    );
    let b2 = graph.parameter(vec![0.1]);
    let target = graph.leaf(Matrix::from_rows(vec![vec![0.0], vec![1.0], vec![1.0], vec![0.0]]).unwrap());

    let h = graph.matmul(x, w1).unwrap();
    let h = graph.broadcast_cols(h, b1).unwrap();
    let h = graph.tanh(h).unwrap();
    let o = graph.matmul(h, w2).unwrap();
    let o = graph.broadcast_cols(o, b2).unwrap();
    let o = graph.sigmoid(o).unwrap();
    let loss = graph.mse_loss(o, target).unwrap();
    (loss, vec![w1, b1, w2, b2])
}
