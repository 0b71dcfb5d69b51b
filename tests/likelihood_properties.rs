use approx::assert_abs_diff_eq;
use ndarray::{Array1, array};
use spatlik::{
    CovarianceType, DesignMatrix, LikelihoodError, LinkFunction, ModelData, Parameters,
    ResponseFamily, log_density_parts, negative_log_likelihood,
};
use statrs::function::gamma::ln_gamma;

fn base_model(response: ResponseFamily, link: LinkFunction) -> (ModelData, Parameters) {
    let r = 2;
    let data = ModelData {
        z: array![1.0, 0.0, 2.0],
        x: array![[1.0], [1.0], [1.0]],
        s: DesignMatrix::Dense(array![[1.0, 0.0], [0.0, 1.0], [0.5, 0.5]]),
        ri: vec![r],
        sigma2e: 1.0,
        covariance: CovarianceType::Precision,
        response,
        link,
        k_z: array![5.0, 5.0, 5.0],
        alpha: vec![],
        row_indices: vec![0, 1],
        col_indices: vec![0, 1],
        values: vec![0.0, 0.0],
        nnz: vec![2],
        n_r: vec![],
        n_c: vec![],
    };
    let params = Parameters {
        beta: array![0.2],
        logsigma2xi: -0.5,
        logphi: 0.0,
        logsigma2: Array1::zeros(2),
        logtau: Array1::zeros(2),
        eta: array![0.3, -0.4],
        xi_o: array![0.05, -0.1, 0.2],
    };
    (data, params)
}

/// An indefinite precision block must surface the distinct
/// non-positive-definite failure, not a panic, so the outer optimizer can
/// reject the parameter point.
#[test]
fn indefinite_block_is_reported_not_fatal() {
    let (mut data, params) = base_model(ResponseFamily::Gaussian, LinkFunction::Identity);
    // rho * (x + kappa) = 1 * (-3 + 1) < 0 on the diagonal.
    data.values = vec![-3.0, -3.0];
    let err = negative_log_likelihood(&data, &params).unwrap_err();
    assert!(matches!(
        err,
        LikelihoodError::BlockNotPositiveDefinite { resolution: 0 }
    ));
}

/// Configuration strings are resolved into closed enums before evaluation;
/// unknown names never reach the hot path.
#[test]
fn unknown_configuration_strings_fail_before_evaluation() {
    assert!("spherical".parse::<CovarianceType>().is_err());
    assert!("tweedie".parse::<ResponseFamily>().is_err());
    assert!("loglog".parse::<LinkFunction>().is_err());

    // Round-trip every configuration actually used elsewhere in the suite.
    let covariance: CovarianceType = "precision".parse().unwrap();
    let response: ResponseFamily = "poisson".parse().unwrap();
    let link: LinkFunction = "log".parse().unwrap();
    let (mut data, params) = base_model(response, link);
    data.covariance = covariance;
    assert!(negative_log_likelihood(&data, &params).is_ok());
}

/// Poisson response through the log link, whole pipeline: the response term
/// must equal the sum of Poisson log-pmfs at mu = exp(X beta + S eta + xi).
#[test]
fn poisson_log_link_response_matches_pmf_sum() {
    let (data, params) = base_model(ResponseFamily::Poisson, LinkFunction::Log);
    let parts = log_density_parts(&data, &params).expect("evaluation should succeed");

    let y0: f64 = 0.2 + 0.3 + 0.05;
    let y1 = 0.2 - 0.4 - 0.1;
    let y2 = 0.2 + 0.5 * 0.3 + 0.5 * (-0.4) + 0.2;
    let z = [1.0, 0.0, 2.0];
    let expected: f64 = [y0, y1, y2]
        .iter()
        .zip(z.iter())
        .map(|(&y, &zi)| {
            let mu: f64 = y.exp();
            zi * mu.ln() - mu - ln_gamma(zi + 1.0)
        })
        .sum();
    assert_abs_diff_eq!(parts.response, expected, epsilon = 1e-10);
}

/// Binomial response through the logit link: mean is k_Z * p and the
/// normalizer is the log binomial coefficient.
#[test]
fn binomial_logit_response_matches_pmf_sum() {
    let (data, params) = base_model(ResponseFamily::Binomial, LinkFunction::Logit);
    let parts = log_density_parts(&data, &params).expect("evaluation should succeed");

    let y: [f64; 3] = [
        0.2 + 0.3 + 0.05,
        0.2 - 0.4 - 0.1,
        0.2 + 0.5 * 0.3 + 0.5 * (-0.4) + 0.2,
    ];
    let z = [1.0, 0.0, 2.0];
    let k = 5.0;
    let expected: f64 = y
        .iter()
        .zip(z.iter())
        .map(|(&yi, &zi)| {
            let p = 1.0 / (1.0 + (-yi).exp());
            zi * p.ln() + (k - zi) * (1.0 - p).ln() + ln_gamma(k + 1.0)
                - ln_gamma(zi + 1.0)
                - ln_gamma(k - zi + 1.0)
        })
        .sum();
    // The canonical-parameter epsilon perturbs the exact pmf at ~1e-10.
    assert_abs_diff_eq!(parts.response, expected, epsilon = 1e-6);
}

/// Gamma response through the log link with the dispersion supplied on the
/// log scale: the response term must match the shape/scale density evaluated
/// at phi = exp(logphi).
#[test]
fn gamma_dispersion_enters_through_logphi() {
    let (mut data, mut params) = base_model(ResponseFamily::Gamma, LinkFunction::Log);
    data.z = array![1.0, 0.4, 2.0];
    let phi: f64 = 0.5;
    params.logphi = phi.ln();
    let parts = log_density_parts(&data, &params).expect("evaluation should succeed");

    let y: [f64; 3] = [
        0.2 + 0.3 + 0.05,
        0.2 - 0.4 - 0.1,
        0.2 + 0.5 * 0.3 + 0.5 * (-0.4) + 0.2,
    ];
    let expected: f64 = y
        .iter()
        .zip(data.z.iter())
        .map(|(&yi, &zi)| {
            let mu: f64 = yi.exp();
            let shape = 1.0 / phi;
            let scale = mu * phi;
            (shape - 1.0) * zi.ln() - zi / scale - ln_gamma(shape) - shape * scale.ln()
        })
        .sum();
    assert_abs_diff_eq!(parts.response, expected, epsilon = 1e-10);
}

/// The objective is exactly the negated sum of the three parts.
#[test]
fn objective_is_negated_sum_of_parts() {
    let (data, params) = base_model(ResponseFamily::Gaussian, LinkFunction::Identity);
    let parts = log_density_parts(&data, &params).expect("parts");
    let nll = negative_log_likelihood(&data, &params).expect("objective");
    assert_abs_diff_eq!(
        nll,
        -(parts.response + parts.coarse_scale + parts.fine_scale),
        epsilon = 0.0
    );
}

/// Shape violations are caught before any factorization work.
#[test]
fn mismatched_eta_length_is_an_input_error() {
    let (data, mut params) = base_model(ResponseFamily::Gaussian, LinkFunction::Identity);
    params.eta = array![0.3, -0.4, 0.9];
    assert!(matches!(
        negative_log_likelihood(&data, &params),
        Err(LikelihoodError::InvalidInput(_))
    ));
}
