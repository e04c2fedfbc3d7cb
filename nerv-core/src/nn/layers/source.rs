use crate::error::NervError;
use crate::nn::variant::Variant;

/// Checks a constant activation vector against the variant's fan-out.
pub(crate) fn check_activations(variant: &Variant, activations: &[f64]) -> Result<(), NervError> {
    if activations.len() != variant.fan_out() {
        return Err(NervError::DimensionMismatch {
            expected: variant.fan_out(),
            actual: activations.len(),
        });
    }
    Ok(())
}
