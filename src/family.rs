use crate::types::{LinkFunction, ResponseFamily};
use ndarray::Array1;
use statrs::function::gamma::ln_gamma;

/// Stabilization constant applied on the probability scale before inverting
/// toward a mean (link layer).
const PROB_EPS: f64 = 1e-8;

/// Stabilization constant applied inside canonical-parameter logs for the
/// bernoulli and binomial families.
const CANONICAL_EPS: f64 = 1e-10;

/// Standard normal PDF.
#[inline]
fn normal_pdf(x: f64) -> f64 {
    const INV_SQRT_2PI: f64 = 0.398_942_280_401_432_7;
    INV_SQRT_2PI * (-0.5 * x * x).exp()
}

/// Standard normal CDF using a stable Abramowitz-Stegun-style approximation.
#[inline]
fn normal_cdf_approx(x: f64) -> f64 {
    let z = x.abs().clamp(0.0, 30.0);
    let t = 1.0 / (1.0 + 0.231_641_9 * z);
    let poly = (((((1.330_274_429 * t - 1.821_255_978) * t) + 1.781_477_937) * t - 0.356_563_782)
        * t
        + 0.319_381_530)
        * t;
    let cdf_pos = 1.0 - normal_pdf(z) * poly;
    if x >= 0.0 { cdf_pos } else { 1.0 - cdf_pos }
}

/// Maps the Gaussian-scale linear predictor to the conditional mean mu_O.
///
/// Mean-scale links go straight to a mean; probability-scale links produce
/// p_O first and convert it according to the response family. The
/// negative-binomial mean is scaled by the size parameter k_Z on both the
/// probability scale and the log / square-root mean scales.
pub(crate) fn conditional_mean(
    link: LinkFunction,
    response: ResponseFamily,
    y_o: &Array1<f64>,
    k_z: &Array1<f64>,
) -> Array1<f64> {
    if link.is_probability_scale() {
        let p_o = match link {
            LinkFunction::Logit => y_o.mapv(|v| 1.0 / (1.0 + (-v).exp())),
            LinkFunction::Probit => y_o.mapv(normal_cdf_approx),
            LinkFunction::Cloglog => y_o.mapv(|v| 1.0 - (-v.exp()).exp()),
            _ => unreachable!("probability-scale links are logit/probit/cloglog"),
        };
        let eps2 = 2.0 * (1.0 - 1.0 / (1.0 + PROB_EPS));
        return match response {
            ResponseFamily::Binomial => k_z * &p_o,
            ResponseFamily::NegativeBinomial => {
                let adjusted = p_o.mapv(|p| 1.0 / (p + PROB_EPS) - 1.0 + eps2);
                k_z * &adjusted
            }
            // Bernoulli keeps the probability as its mean; for the remaining
            // families a probability link leaves the scale untouched.
            _ => p_o,
        };
    }

    let mu_o = match link {
        LinkFunction::Identity => y_o.clone(),
        LinkFunction::Inverse => y_o.mapv(|v| 1.0 / v),
        LinkFunction::InverseSquared => y_o.mapv(|v| 1.0 / v.sqrt()),
        LinkFunction::Log => y_o.mapv(f64::exp),
        LinkFunction::SquareRoot => y_o.mapv(|v| v * v),
        _ => unreachable!("probability-scale links handled above"),
    };
    if response == ResponseFamily::NegativeBinomial
        && matches!(link, LinkFunction::Log | LinkFunction::SquareRoot)
    {
        k_z * &mu_o
    } else {
        mu_o
    }
}

/// Conditional log-density of the observations given the latent process,
/// in exponential-family form: sum((Z * lambda - b(lambda)) / a(phi)) +
/// sum(c(Z, phi)).
///
/// `phi` is the exponentiated dispersion parameter; the Gaussian family
/// replaces it with the caller-supplied measurement-error variance sigma2e.
pub(crate) fn response_log_density(
    response: ResponseFamily,
    z: &Array1<f64>,
    mu_o: &Array1<f64>,
    k_z: &Array1<f64>,
    phi: f64,
    sigma2e: f64,
) -> f64 {
    let mut ld_z = 0.0;
    for i in 0..z.len() {
        let zi = z[i];
        let mu = mu_o[i];
        let (lambda, b_lambda, a_phi, c_z_phi) = match response {
            ResponseFamily::Gaussian => {
                let phi = sigma2e;
                let lambda = mu;
                (
                    lambda,
                    lambda * lambda / 2.0,
                    phi,
                    -0.5 * (zi * zi / phi + (2.0 * std::f64::consts::PI * phi).ln()),
                )
            }
            ResponseFamily::Poisson => {
                let lambda = mu.ln();
                (lambda, lambda.exp(), 1.0, -ln_gamma(zi + 1.0))
            }
            ResponseFamily::Bernoulli => {
                let lambda = ((mu + CANONICAL_EPS) / (1.0 - mu + CANONICAL_EPS)).ln();
                (lambda, (1.0 + lambda.exp()).ln(), 1.0, 0.0)
            }
            ResponseFamily::Gamma => {
                let lambda = 1.0 / mu;
                (
                    lambda,
                    lambda.ln(),
                    -phi,
                    (zi / phi).ln() / phi - zi.ln() - ln_gamma(1.0 / phi),
                )
            }
            ResponseFamily::InverseGaussian => {
                let lambda = 1.0 / (mu * mu);
                (
                    lambda,
                    2.0 * lambda.sqrt(),
                    -2.0 * phi,
                    -0.5 / (phi * zi) - 0.5 * (2.0 * std::f64::consts::PI * phi * zi.powi(3)).ln(),
                )
            }
            ResponseFamily::NegativeBinomial => {
                let k = k_z[i];
                let lambda = (mu / (mu + k)).ln();
                (
                    lambda,
                    -k * (1.0 - lambda.exp()).ln(),
                    1.0,
                    ln_gamma(zi + k) - ln_gamma(zi + 1.0) - ln_gamma(k),
                )
            }
            ResponseFamily::Binomial => {
                let k = k_z[i];
                let lambda = ((mu + CANONICAL_EPS) / (k - mu + CANONICAL_EPS)).ln();
                (
                    lambda,
                    k * (1.0 + lambda.exp()).ln(),
                    1.0,
                    ln_gamma(k + 1.0) - ln_gamma(zi + 1.0) - ln_gamma(k - zi + 1.0),
                )
            }
        };
        ld_z += (zi * lambda - b_lambda) / a_phi + c_z_phi;
    }
    ld_z
}
