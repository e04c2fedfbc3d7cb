use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::error::NervError;
use crate::maths::EPSILON;
use crate::nn::model::Model;
use crate::nn::net::Net;
use crate::nn::parameter::ParamStore;

/// Settings of [`check_gradients`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradCheckConfig {
    /// Perturbation applied to each parameter component.
    pub epsilon: f64,
    /// Absolute tolerance between analytical and numerical components.
    pub tolerance: f64,
    /// Relative tolerance, used when the absolute one is exceeded.
    pub max_relative: f64,
    pub check_bias: bool,
    /// Also log the regions that agree.
    pub verbose: bool,
}

impl Default for GradCheckConfig {
    fn default() -> Self {
        GradCheckConfig {
            epsilon: EPSILON,
            tolerance: 1e-6,
            max_relative: 1e-5,
            check_bias: true,
            verbose: false,
        }
    }
}

/// A weight or bias region whose analytical gradient disagrees with the
/// numerical estimate.
#[derive(Debug, Clone, PartialEq)]
pub struct Mismatch {
    pub variant: String,
    pub bias: bool,
    pub analytical: Vec<f64>,
    pub numerical: Vec<f64>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct GradCheckReport {
    /// Number of parameter components compared.
    pub checked: usize,
    pub mismatches: Vec<Mismatch>,
}

impl GradCheckReport {
    pub fn passed(&self) -> bool {
        self.mismatches.is_empty()
    }
}

fn join(values: &[f64]) -> String {
    values
        .iter()
        .map(|v| format!("{:.10}", v))
        .collect::<Vec<_>>()
        .join("\t")
}

fn total_loss(model: &Model, nets: &mut [Net]) -> Result<f64, NervError> {
    Ok(model.loss(nets, false)?.total())
}

/// `(L(x + ε) - L(x - ε)) / 2ε` for one component of `probe`, which is
/// restored afterwards.
fn central_difference(
    probe: &mut Model,
    nets: &mut [Net],
    index: usize,
    epsilon: f64,
) -> Result<f64, NervError> {
    let original = probe.params()[index];
    probe.params_mut()[index] = original + epsilon;
    let plus = total_loss(probe, nets);
    probe.params_mut()[index] = original - epsilon;
    let minus = total_loss(probe, nets);
    probe.params_mut()[index] = original;
    Ok((plus? - minus?) / (2.0 * epsilon))
}

/// Compares the gradient backpropagated through `nets` with central finite
/// differences of their summed loss, region by region.
///
/// Disagreements are logged at `warn` level and collected in the report; they
/// never make the check fail. Errors are only returned when the nets cannot be
/// evaluated at all. `model` itself is left untouched.
pub fn check_gradients(
    model: &Model,
    nets: &mut [Net],
    config: &GradCheckConfig,
) -> Result<GradCheckReport, NervError> {
    if config.epsilon.is_nan() || config.epsilon <= 0.0 {
        return Err(NervError::InvalidHyperParameter(format!(
            "finite-difference epsilon must be positive, got {}",
            config.epsilon
        )));
    }
    if config.tolerance < 0.0 || config.max_relative < 0.0 {
        return Err(NervError::InvalidHyperParameter(
            "tolerances must not be negative".to_string(),
        ));
    }

    let (_, gradient) = model.loss_and_gradient(nets, false)?;
    let mut probe = model.clone();
    let mut report = GradCheckReport::default();

    let layout = model.shared_layout();
    for name in layout.names() {
        let region = layout.region(name)?;
        let mut parts = vec![(false, region.weight.clone())];
        if config.check_bias {
            parts.push((true, region.bias.clone()));
        }
        for (bias, range) in parts {
            if range.is_empty() {
                continue;
            }
            let numerical = range
                .clone()
                .map(|i| central_difference(&mut probe, nets, i, config.epsilon))
                .collect::<Result<Vec<_>, _>>()?;
            let analytical = gradient.params()[range].to_vec();
            report.checked += analytical.len();

            let agree = analytical.iter().zip(&numerical).all(|(a, n)| {
                approx::relative_eq!(
                    *a,
                    *n,
                    epsilon = config.tolerance,
                    max_relative = config.max_relative
                )
            });
            let what = if bias { "bias" } else { "weight" };
            if agree {
                if config.verbose {
                    info!("Gradient check: {} {} agrees", name, what);
                    info!("analytical\t{}", join(&analytical));
                    info!("numerical\t{}", join(&numerical));
                }
            } else {
                warn!("Gradient check: {} {} mismatch", name, what);
                warn!("analytical\t{}", join(&analytical));
                warn!("numerical\t{}", join(&numerical));
                report.mismatches.push(Mismatch {
                    variant: name.to_string(),
                    bias,
                    analytical,
                    numerical,
                });
            }
        }
    }
    Ok(report)
}

#[cfg(test)]
#[path = "grad_check_test.rs"]
mod tests;
