//! Impact extraction: reduce each trajectory to where it returns to the ground.

use ndarray::{Array2, ArrayView1, Axis};

use crate::constants::PRE_APEX_SENTINEL;
use crate::trajectory::{argmax, TrajectoryBatch};

/// Horizontal impact coordinate of a single trajectory.
///
/// Heights recorded before the apex's x-position are replaced by a small
/// positive sentinel, then the first sign-bit flip between consecutive samples
/// is located. The x-position of the last sample before the flip is returned.
/// `+0.0` counts as above ground. Returns `None` if the curve never crosses
/// within the simulated window, or if `xs` and `ys` differ in length.
pub fn impact_from_curve(xs: ArrayView1<f64>, ys: ArrayView1<f64>) -> Option<f64> {
    let n = xs.len();
    if n < 2 || ys.len() != n {
        return None;
    }

    let x_peak = xs[argmax(ys)];
    let below_ground = |i: usize| -> bool {
        let y = if xs[i] < x_peak { PRE_APEX_SENTINEL } else { ys[i] };
        y.is_sign_negative()
    };

    let mut previous = below_ground(0);
    for i in 1..n {
        let current = below_ground(i);
        if current != previous {
            return Some(xs[i - 1]);
        }
        previous = current;
    }
    None
}

/// Row-aligned `N x 1` observation batch.
///
/// Trajectories without a ground crossing yield `NaN`, so the output always
/// has as many rows as the input.
pub fn impacts_from_trajectories(trajectories: &TrajectoryBatch) -> Array2<f64> {
    let mut impacts = Array2::from_elem((trajectories.len(), 1), f64::NAN);
    for (i, (xs, ys)) in trajectories
        .xs
        .axis_iter(Axis(0))
        .zip(trajectories.ys.axis_iter(Axis(0)))
        .enumerate()
    {
        if let Some(x) = impact_from_curve(xs, ys) {
            impacts[[i, 0]] = x;
        }
    }
    impacts
}

/// Impact points of the trajectories that do cross the ground.
///
/// Rows without a crossing are skipped, so the result is NOT row-aligned with
/// the batch. Meant for point-cloud style consumers such as figure density
/// curves.
pub fn crossing_impacts(trajectories: &TrajectoryBatch) -> Vec<f64> {
    trajectories
        .xs
        .axis_iter(Axis(0))
        .zip(trajectories.ys.axis_iter(Axis(0)))
        .filter_map(|(xs, ys)| impact_from_curve(xs, ys))
        .collect()
}

/// Number of rows in an observation batch that carry no impact
pub fn count_missing_impacts(observations: &Array2<f64>) -> usize {
    observations.iter().filter(|v| v.is_nan()).count()
}
