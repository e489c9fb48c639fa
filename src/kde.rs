use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis};
use std::f64::consts::PI;

use crate::map_estimate::EstimationError;

/// Isotropic Gaussian kernel density estimate over the rows of a sample
#[derive(Debug, Clone)]
pub struct GaussianKde {
    data: Array2<f64>,
    bandwidth: f64,
}

impl GaussianKde {
    pub fn fit(data: ArrayView2<f64>, bandwidth: f64) -> Result<Self, EstimationError> {
        if data.nrows() == 0 {
            return Err(EstimationError::EmptySample);
        }
        if !(bandwidth > 0.0 && bandwidth.is_finite()) {
            return Err(EstimationError::InvalidBandwidth(bandwidth));
        }
        if data.iter().any(|v| !v.is_finite()) {
            return Err(EstimationError::NonFiniteSample);
        }
        Ok(Self {
            data: data.to_owned(),
            bandwidth,
        })
    }

    pub fn bandwidth(&self) -> f64 {
        self.bandwidth
    }

    /// Log of the normalized density at `point`
    pub fn log_density(&self, point: ArrayView1<f64>) -> f64 {
        let n = self.data.nrows() as f64;
        let d = self.data.ncols() as f64;
        let h2 = self.bandwidth * self.bandwidth;

        // log-sum-exp over the kernel exponents
        let exponents: Vec<f64> = self
            .data
            .axis_iter(Axis(0))
            .map(|row| -squared_distance(row, point) / (2.0 * h2))
            .collect();
        let max = exponents.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        if max == f64::NEG_INFINITY {
            return f64::NEG_INFINITY;
        }
        let sum: f64 = exponents.iter().map(|e| (e - max).exp()).sum();

        max + sum.ln() - n.ln() - 0.5 * d * (2.0 * PI * h2).ln()
    }

    pub fn density(&self, point: ArrayView1<f64>) -> f64 {
        self.log_density(point).exp()
    }

    /// Log-density of every row of `points`
    pub fn score_samples(&self, points: ArrayView2<f64>) -> Array1<f64> {
        points.axis_iter(Axis(0)).map(|p| self.log_density(p)).collect()
    }
}

pub(crate) fn squared_distance(a: ArrayView1<f64>, b: ArrayView1<f64>) -> f64 {
    a.iter().zip(b.iter()).map(|(x, y)| (x - y) * (x - y)).sum()
}
