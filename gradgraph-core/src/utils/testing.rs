use crate::config::GraphConfig;
use crate::numeric::GraphFloat;
use crate::value::{Shape, Value};

/// Seeds for gradient checks over random operands.
pub const GRAD_CHECK_SEEDS: [u64; 5] = [3, 17, 29, 101, 2024];

/// The serial executor and a parallel one that splits every layer.
pub fn executor_configs() -> [GraphConfig; 2] {
    [
        GraphConfig::serial(),
        GraphConfig::serial()
            .with_parallel(true)
            .with_min_layer_width(1),
    ]
}

/// Checks that a value has the expected shape and that every element is
/// within `tolerance` of `expected_data`.
/// Panics with the first offending index otherwise.
pub fn check_value_near<T: GraphFloat>(
    actual: &Value<T>,
    expected_shape: Shape,
    expected_data: &[T],
    tolerance: T,
) {
    assert_eq!(actual.shape(), expected_shape, "Shape mismatch");

    let actual_data = actual.as_slice();
    assert_eq!(
        actual_data.len(),
        expected_data.len(),
        "Data length mismatch"
    );

    for (i, (a, e)) in actual_data.iter().zip(expected_data.iter()).enumerate() {
        let diff = (*a - *e).abs();
        if !(diff <= tolerance) {
            panic!(
                "Data mismatch at index {}: actual={:?}, expected={:?}, diff={:?}, tolerance={:?}",
                i, a, e, diff, tolerance
            );
        }
    }
}
