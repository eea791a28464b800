//! Ordinary least squares with intercept.
//!
//! The centred design is solved through its SVD. Singular directions below a
//! relative cut-off get zero weight, so rank-deficient designs (one row,
//! constant or collinear columns) still yield the minimum-norm fit.

use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};

use crate::common::error::{RiskError, RiskResult};

use super::domain::FeatureVector;

const N: usize = FeatureVector::LEN;
const RANK_EPS: f64 = 1e-10;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LinearModel {
    pub intercept: f64,
    pub coefficients: [f64; N],
}

impl LinearModel {
    pub fn fit(x: &[FeatureVector], y: &[f64]) -> RiskResult<Self> {
        let n = x.len() as f64;
        let rows: Vec<[f64; N]> = x.iter().map(FeatureVector::to_array).collect();

        let mut x_mean = [0.0; N];
        for row in &rows {
            for (m, v) in x_mean.iter_mut().zip(row) {
                *m += v / n;
            }
        }
        let y_mean = y.iter().sum::<f64>() / n;

        let design = DMatrix::from_fn(rows.len(), N, |i, j| rows[i][j] - x_mean[j]);
        let targets = DVector::from_iterator(y.len(), y.iter().map(|v| v - y_mean));

        let svd = design.svd(true, true);
        let eps = RANK_EPS * svd.singular_values.max().max(1.0);
        let beta = svd
            .solve(&targets, eps)
            .map_err(|reason| RiskError::internal(format!("least squares failed: {reason}")))?;

        let coefficients: [f64; N] = std::array::from_fn(|j| beta[j]);
        let intercept = y_mean
            - coefficients
                .iter()
                .zip(&x_mean)
                .map(|(b, m)| b * m)
                .sum::<f64>();

        Ok(Self {
            intercept,
            coefficients,
        })
    }

    pub fn predict(&self, features: &FeatureVector) -> f64 {
        self.intercept
            + self
                .coefficients
                .iter()
                .zip(features.to_array())
                .map(|(b, v)| b * v)
                .sum::<f64>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fv(count_lag: f64, forest: f64, temp: f64, prot: f64) -> FeatureVector {
        FeatureVector {
            count_lag,
            forest_loss_pct: forest,
            temp_anom: temp,
            prot_cov: prot,
        }
    }

    #[test]
    fn recovers_an_exact_linear_relation() {
        let x: Vec<FeatureVector> = (0..40)
            .map(|i| {
                let t = i as f64;
                fv(
                    50.0 + 3.0 * t,
                    (t * 0.7) % 5.0,
                    (t * 0.13).sin(),
                    0.1 + (t % 7.0) / 10.0,
                )
            })
            .collect();
        let y: Vec<f64> = x
            .iter()
            .map(|f| {
                0.05 - 0.001 * f.count_lag - 0.02 * f.forest_loss_pct
                    + 0.1 * f.temp_anom
                    + 0.3 * f.prot_cov
            })
            .collect();

        let model = LinearModel::fit(&x, &y).unwrap();
        for (f, target) in x.iter().zip(&y) {
            assert!((model.predict(f) - target).abs() < 1e-6);
        }
        assert!((model.coefficients[3] - 0.3).abs() < 1e-5);
    }

    #[test]
    fn single_row_predicts_its_target() {
        let x = [fv(80.0, 2.0, 0.1, 0.3)];
        let model = LinearModel::fit(&x, &[-0.2]).unwrap();
        assert!((model.predict(&x[0]) + 0.2).abs() < 1e-9);
        assert!(model.coefficients.iter().all(|c| c.is_finite()));
    }

    #[test]
    fn collinear_columns_still_fit() {
        // count_lag, forest_loss_pct and temp_anom move together; prot_cov is constant.
        let x: Vec<FeatureVector> = (0..12)
            .map(|i| {
                let t = i as f64;
                fv(100.0 - 2.0 * t, t, t, 0.4)
            })
            .collect();
        let y: Vec<f64> = x.iter().map(|f| 0.2 - 0.01 * f.forest_loss_pct).collect();

        let model = LinearModel::fit(&x, &y).unwrap();
        assert!(model.coefficients.iter().all(|c| c.is_finite()));
        for (f, target) in x.iter().zip(&y) {
            assert!((model.predict(f) - target).abs() < 1e-9);
        }
        assert!(model.coefficients[3].abs() < 1e-12);
    }
}
