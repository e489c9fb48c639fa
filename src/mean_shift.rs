//! Flat-kernel mean-shift mode seeking.
//!
//! Every sample seeds a hill climb. Seeds that converge within one bandwidth
//! of a better supported center are merged into it.

use log::debug;
use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis};
use std::cmp::Ordering;

use crate::constants::{MEAN_SHIFT_MAX_ITER, MEAN_SHIFT_QUANTILE, MEAN_SHIFT_STOP_FACTOR};
use crate::kde::squared_distance;
use crate::map_estimate::EstimationError;

/// Mean-shift configuration
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeanShift {
    pub bandwidth: Option<f64>,  // estimated from the data when None
    pub quantile: f64,           // neighbour quantile for the estimate
    pub max_iter: usize,
}

impl Default for MeanShift {
    fn default() -> Self {
        Self {
            bandwidth: None,
            quantile: MEAN_SHIFT_QUANTILE,
            max_iter: MEAN_SHIFT_MAX_ITER,
        }
    }
}

/// Converged cluster centers, best supported first
#[derive(Debug, Clone)]
pub struct MeanShiftFit {
    pub centers: Array2<f64>,
    pub intensities: Vec<usize>,  // samples within bandwidth of each center
    pub bandwidth: f64,
}

/// Mean distance from each sample to its k-th nearest neighbour (itself
/// included), with `k = max(1, floor(n * quantile))`
pub fn estimate_bandwidth(data: ArrayView2<f64>, quantile: f64) -> f64 {
    let n = data.nrows();
    if n == 0 {
        return 0.0;
    }
    let k = ((n as f64 * quantile) as usize).clamp(1, n);

    let mut total = 0.0;
    let mut distances = vec![0.0; n];
    for row in data.axis_iter(Axis(0)) {
        for (d, other) in distances.iter_mut().zip(data.axis_iter(Axis(0))) {
            *d = squared_distance(row, other);
        }
        let (_, kth, _) = distances.select_nth_unstable_by(k - 1, |a, b| {
            a.partial_cmp(b).unwrap_or(Ordering::Equal)
        });
        total += kth.sqrt();
    }
    total / n as f64
}

impl MeanShift {
    pub fn fit(&self, data: ArrayView2<f64>) -> Result<MeanShiftFit, EstimationError> {
        if data.nrows() == 0 {
            return Err(EstimationError::EmptySample);
        }
        if data.iter().any(|v| !v.is_finite()) {
            return Err(EstimationError::NonFiniteSample);
        }

        let bandwidth = match self.bandwidth {
            Some(bw) => bw,
            None => estimate_bandwidth(data, self.quantile),
        };
        if !(bandwidth > 0.0 && bandwidth.is_finite()) {
            return Err(EstimationError::InvalidBandwidth(bandwidth));
        }
        debug!("mean shift bandwidth {:.6} over {} samples", bandwidth, data.nrows());

        let mut candidates: Vec<(Array1<f64>, usize)> = data
            .axis_iter(Axis(0))
            .filter_map(|seed| self.climb(data, seed, bandwidth))
            .collect();
        if candidates.is_empty() {
            return Err(EstimationError::NoCenters);
        }

        // Highest support first, ties broken by the larger center
        candidates.sort_by(|a, b| {
            b.1.cmp(&a.1).then_with(|| {
                b.0.iter()
                    .zip(a.0.iter())
                    .map(|(x, y)| x.partial_cmp(y).unwrap_or(Ordering::Equal))
                    .find(|o| *o != Ordering::Equal)
                    .unwrap_or(Ordering::Equal)
            })
        });

        let bw2 = bandwidth * bandwidth;
        let mut unique = vec![true; candidates.len()];
        for i in 0..candidates.len() {
            if !unique[i] {
                continue;
            }
            for j in (i + 1)..candidates.len() {
                if unique[j] && squared_distance(candidates[i].0.view(), candidates[j].0.view()) <= bw2 {
                    unique[j] = false;
                }
            }
        }

        let kept: Vec<&(Array1<f64>, usize)> = candidates
            .iter()
            .zip(unique.iter())
            .filter(|(_, u)| **u)
            .map(|(c, _)| c)
            .collect();

        let mut centers = Array2::zeros((kept.len(), data.ncols()));
        for (mut row, (center, _)) in centers.axis_iter_mut(Axis(0)).zip(kept.iter()) {
            row.assign(center);
        }
        let intensities = kept.iter().map(|(_, count)| *count).collect();
        debug!("mean shift found {} centers", kept.len());

        Ok(MeanShiftFit {
            centers,
            intensities,
            bandwidth,
        })
    }

    /// Shift `seed` to the mean of its neighbourhood until it settles.
    /// Returns the center and its neighbour count, `None` if it lost all support.
    fn climb(
        &self,
        data: ArrayView2<f64>,
        seed: ArrayView1<f64>,
        bandwidth: f64,
    ) -> Option<(Array1<f64>, usize)> {
        let bw2 = bandwidth * bandwidth;
        let stop = MEAN_SHIFT_STOP_FACTOR * bandwidth;
        let mut mean = seed.to_owned();
        let mut support = 0;
        let mut iterations = 0;

        loop {
            let mut sum = Array1::<f64>::zeros(data.ncols());
            let mut count = 0;
            for row in data.axis_iter(Axis(0)) {
                if squared_distance(row, mean.view()) <= bw2 {
                    sum += &row;
                    count += 1;
                }
            }
            if count == 0 {
                break;
            }
            support = count;

            let next = sum / count as f64;
            let shift = squared_distance(next.view(), mean.view()).sqrt();
            mean = next;
            if shift <= stop || iterations == self.max_iter {
                break;
            }
            iterations += 1;
        }

        if support > 0 {
            Some((mean, support))
        } else {
            None
        }
    }
}
