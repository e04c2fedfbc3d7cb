/// Asserts that two slices have the same length and agree element-wise to
/// within `tolerance`.
///
/// Panics with the first offending index.
pub fn check_slice_near(actual: &[f64], expected: &[f64], tolerance: f64) {
    assert_eq!(actual.len(), expected.len(), "Data length mismatch");
    for (i, (a, e)) in actual.iter().zip(expected).enumerate() {
        let diff = (a - e).abs();
        if !(diff <= tolerance) {
            panic!(
                "Data mismatch at index {}: actual={:?}, expected={:?}, diff={:?}, tolerance={:?}",
                i, a, e, diff, tolerance
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_slice_near_accepts_small_error() {
        check_slice_near(&[1.0, 2.0], &[1.0 + 1e-9, 2.0], 1e-6);
    }

    #[test]
    #[should_panic(expected = "Data mismatch at index 1")]
    fn test_check_slice_near_reports_index() {
        check_slice_near(&[1.0, 2.0], &[1.0, 2.1], 1e-6);
    }

    #[test]
    #[should_panic(expected = "Data mismatch at index 0")]
    fn test_check_slice_near_rejects_nan() {
        check_slice_near(&[f64::NAN], &[0.0], 1.0);
    }
}
