use crate::maths::add_assign;
use crate::nn::variant::SliceTable;

fn slot_range(table: &SliceTable, dims: usize, key: &str) -> std::ops::Range<usize> {
    let start = table.slot(key) * dims;
    start..start + dims
}

/// The slice of the shared region selected by `key`.
pub(crate) fn forward(table: &SliceTable, dims: usize, key: &str, weights: &[f64]) -> Vec<f64> {
    weights[slot_range(table, dims, key)].to_vec()
}

/// Adds `incoming` into the gradient slice of `key`.
///
/// Every occurrence of the same key in a net lands on the same slice, so the
/// slice ends up holding the sum of all contributions.
pub(crate) fn backward(
    table: &SliceTable,
    dims: usize,
    key: &str,
    incoming: &[f64],
    grad_weights: &mut [f64],
) {
    add_assign(&mut grad_weights[slot_range(table, dims, key)], incoming);
}
