//! Approximate MAP exemplar of a parameter sample.
//!
//! Mean-shift proposes a handful of modes, a Gaussian KDE over the whole sample
//! scores them, and the sample row closest to the best scored mode is the
//! exemplar. This is a diagnostic: when mode finding breaks down the estimate
//! degrades to row 0 instead of failing.

use log::{debug, warn};
use ndarray::{ArrayView2, Axis};
use thiserror::Error;

use crate::constants::KDE_BANDWIDTH;
use crate::kde::{squared_distance, GaussianKde};
use crate::mean_shift::MeanShift;

/// Why mode finding could not produce an estimate
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EstimationError {
    #[error("sample is empty")]
    EmptySample,

    #[error("sample contains non-finite values")]
    NonFiniteSample,

    #[error("bandwidth must be positive, got {0}")]
    InvalidBandwidth(f64),

    #[error("no seed converged to a supported center")]
    NoCenters,

    #[error("no center has a finite density score")]
    NonFiniteDensity,
}

/// Outcome of a MAP search
#[derive(Debug, Clone, PartialEq)]
pub enum MapEstimate {
    /// Row closest to the highest-density mode
    Mode { index: usize, log_density: f64 },
    /// Mode finding failed; `index` is always 0
    Degenerate { index: usize, reason: EstimationError },
}

impl MapEstimate {
    /// Row index of the exemplar, whichever way it was obtained
    pub fn index(&self) -> usize {
        match self {
            MapEstimate::Mode { index, .. } | MapEstimate::Degenerate { index, .. } => *index,
        }
    }

    pub fn is_degenerate(&self) -> bool {
        matches!(self, MapEstimate::Degenerate { .. })
    }
}

/// MAP estimator configuration
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MapEstimator {
    pub mean_shift: MeanShift,
    pub kde_bandwidth: f64,
}

impl Default for MapEstimator {
    fn default() -> Self {
        Self {
            mean_shift: MeanShift::default(),
            kde_bandwidth: KDE_BANDWIDTH,
        }
    }
}

impl MapEstimator {
    /// Never fails: errors are logged and reported as [`MapEstimate::Degenerate`].
    pub fn estimate(&self, sample: ArrayView2<f64>) -> MapEstimate {
        match self.try_estimate(sample) {
            Ok(estimate) => estimate,
            Err(reason) => {
                warn!("Mean shift failed ({}), using sample 0 as MAP exemplar", reason);
                MapEstimate::Degenerate { index: 0, reason }
            }
        }
    }

    pub fn try_estimate(&self, sample: ArrayView2<f64>) -> Result<MapEstimate, EstimationError> {
        let fit = self.mean_shift.fit(sample)?;
        let kde = GaussianKde::fit(sample, self.kde_bandwidth)?;

        let scores = kde.score_samples(fit.centers.view());
        let (best, log_density) = scores
            .iter()
            .enumerate()
            .filter(|(_, s)| s.is_finite())
            .fold(None, |best: Option<(usize, f64)>, (i, &s)| match best {
                Some((_, b)) if b >= s => best,
                _ => Some((i, s)),
            })
            .ok_or(EstimationError::NonFiniteDensity)?;
        let center = fit.centers.row(best);
        debug!(
            "best of {} centers: {} (log density {:.4})",
            fit.centers.nrows(),
            center,
            log_density
        );

        let mut index = 0;
        let mut closest = f64::INFINITY;
        for (i, row) in sample.axis_iter(Axis(0)).enumerate() {
            let d = squared_distance(row, center);
            if d < closest {
                closest = d;
                index = i;
            }
        }

        Ok(MapEstimate::Mode { index, log_density })
    }
}

/// MAP exemplar with the default estimator
pub fn find_map(sample: ArrayView2<f64>) -> MapEstimate {
    MapEstimator::default().estimate(sample)
}
