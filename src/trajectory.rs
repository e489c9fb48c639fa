//! Closed-form trajectory simulator.
//!
//! Linear drag admits an exact solution, so every trajectory is evaluated
//! directly on a fixed time grid instead of being integrated step by step.

use ndarray::{s, Array1, Array2, ArrayView1, ArrayView2, Axis, Zip};
use once_cell::sync::Lazy;

use crate::constants::{N_TIME_SAMPLES, T_MAX};
use crate::error::{BallisticsError, Result};
use crate::model::{InverseBallisticsModel, PhysicsConstants};

/// Shared sampling times, `N_TIME_SAMPLES` points evenly spaced over `[0, T_MAX]`
static TIME_GRID: Lazy<Array1<f64>> = Lazy::new(|| Array1::linspace(0.0, T_MAX, N_TIME_SAMPLES));

/// Sampling times every trajectory is evaluated at
pub fn time_grid() -> ArrayView1<'static, f64> {
    TIME_GRID.view()
}

/// Positions of N trajectories, one row per parameter row
#[derive(Debug, Clone, PartialEq)]
pub struct TrajectoryBatch {
    pub xs: Array2<f64>,  // N x N_TIME_SAMPLES horizontal positions
    pub ys: Array2<f64>,  // N x N_TIME_SAMPLES heights
}

impl TrajectoryBatch {
    pub fn new(xs: Array2<f64>, ys: Array2<f64>) -> Result<Self> {
        if xs.dim() != ys.dim() {
            return Err(BallisticsError::shape(format!(
                "trajectory x/y shapes differ: {:?} vs {:?}",
                xs.dim(),
                ys.dim()
            )));
        }
        Ok(Self { xs, ys })
    }

    /// Number of trajectories
    pub fn len(&self) -> usize {
        self.xs.nrows()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Curve of a single trajectory
    pub fn curve(&self, index: usize) -> (ArrayView1<'_, f64>, ArrayView1<'_, f64>) {
        (self.xs.row(index), self.ys.row(index))
    }

    /// Copy out the trajectories in `start..end`
    pub fn slice_rows(&self, start: usize, end: usize) -> Self {
        Self {
            xs: self.xs.slice(s![start..end, ..]).to_owned(),
            ys: self.ys.slice(s![start..end, ..]).to_owned(),
        }
    }

    /// Time index of the highest point of each trajectory (first one on ties)
    pub fn peak_indices(&self) -> Vec<usize> {
        self.ys.axis_iter(Axis(0)).map(argmax).collect()
    }
}

/// Index of the first maximum of `values`
pub(crate) fn argmax(values: ArrayView1<f64>) -> usize {
    let mut best = 0;
    for (i, &v) in values.iter().enumerate() {
        if v > values[best] {
            best = i;
        }
    }
    best
}

/// Evaluate the trajectories of an `N x 4` parameter batch
///
/// ```text
/// vx = v0 cos(angle),  vy = v0 sin(angle)
/// e(t) = exp(-k t / m) - 1
/// x(t) = x0 - (vx m / k) e(t)
/// y(t) = y0 - (m / k^2) ((g m + vy k) e(t) + g t k)
/// ```
pub fn trajectories_from_parameters(
    constants: &PhysicsConstants,
    params: ArrayView2<f64>,
) -> Result<TrajectoryBatch> {
    if params.ncols() != InverseBallisticsModel::N_PARAMETERS {
        return Err(BallisticsError::shape(format!(
            "expected {} parameter columns, got {}",
            InverseBallisticsModel::N_PARAMETERS,
            params.ncols()
        )));
    }

    let g = constants.gravity;
    let k = constants.drag_coefficient;
    let m = constants.mass;

    let t = time_grid();
    let expterm = t.mapv(|t| (-k * t / m).exp() - 1.0);

    let n = params.nrows();
    let mut xs = Array2::zeros((n, N_TIME_SAMPLES));
    let mut ys = Array2::zeros((n, N_TIME_SAMPLES));

    Zip::from(xs.rows_mut())
        .and(ys.rows_mut())
        .and(params.rows())
        .for_each(|mut x_row, mut y_row, p| {
            let (x0, y0, angle, v0) = (p[0], p[1], p[2], p[3]);
            let vx = v0 * angle.cos();
            let vy = v0 * angle.sin();

            Zip::from(&mut x_row)
                .and(&mut y_row)
                .and(&t)
                .and(&expterm)
                .for_each(|x, y, &t, &e| {
                    *x = x0 - (vx * m / k) * e;
                    *y = y0 - (m / (k * k)) * ((g * m + vy * k) * e + g * t * k);
                });
        });

    Ok(TrajectoryBatch { xs, ys })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;
    use std::f64::consts::FRAC_PI_4;

    fn scenario() -> Array2<f64> {
        array![[0.0, 1.5, FRAC_PI_4, 15.0]]
    }

    #[test]
    fn test_time_grid() {
        let t = time_grid();
        assert_eq!(t.len(), 1500);
        assert_eq!(t[0], 0.0);
        assert_relative_eq!(t[1499], 6.0, epsilon = 1e-12);
        assert_relative_eq!(t[1] - t[0], 6.0 / 1499.0, epsilon = 1e-12);
    }

    #[test]
    fn test_initial_position() {
        let params = array![[0.3, 1.2, 0.7, 12.0], [-1.0, 0.0, 1.2, 20.0]];
        let batch = trajectories_from_parameters(&PhysicsConstants::default(), params.view()).unwrap();

        assert_eq!(batch.xs.dim(), (2, 1500));
        assert_eq!(batch.ys.dim(), (2, 1500));
        for (i, row) in params.rows().into_iter().enumerate() {
            assert_relative_eq!(batch.xs[[i, 0]], row[0], epsilon = 1e-12);
            assert_relative_eq!(batch.ys[[i, 0]], row[1], epsilon = 1e-12);
        }
    }

    #[test]
    fn test_simulation_deterministic() {
        let constants = PhysicsConstants::default();
        let a = trajectories_from_parameters(&constants, scenario().view()).unwrap();
        let b = trajectories_from_parameters(&constants, scenario().view()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_rows_independent() {
        let constants = PhysicsConstants::default();
        let params = array![[0.0, 1.5, FRAC_PI_4, 15.0], [0.5, 2.0, 0.4, 9.0]];
        let joint = trajectories_from_parameters(&constants, params.view()).unwrap();
        let single = trajectories_from_parameters(&constants, params.slice(s![1..2, ..])).unwrap();
        assert_eq!(joint.slice_rows(1, 2), single);
    }

    #[test]
    fn test_peak_before_one_and_a_half_time_units() {
        let batch = trajectories_from_parameters(&PhysicsConstants::default(), scenario().view()).unwrap();
        let peak = batch.peak_indices()[0];
        let t_peak = time_grid()[peak];

        // Analytic apex: t = (m/k) ln(1 + vy k / (g m))
        let vy = 15.0 * FRAC_PI_4.sin();
        let expected = 0.8 * (1.0 + vy * 0.25 / (9.81 * 0.2)).ln();
        assert!(t_peak < 1.5);
        assert!((t_peak - expected).abs() < 6.0 / 1499.0);
    }

    #[test]
    fn test_horizontal_range_bounded_by_drag() {
        // x(t) approaches x0 + vx m / k as t grows
        let batch = trajectories_from_parameters(&PhysicsConstants::default(), scenario().view()).unwrap();
        let vx = 15.0 * FRAC_PI_4.cos();
        let limit = vx * 0.2 / 0.25;
        let x_end = batch.xs[[0, 1499]];
        assert!(x_end < limit);
        assert!(limit - x_end < 1e-2);
    }

    #[test]
    fn test_rejects_wrong_column_count() {
        let params = array![[0.0, 1.5, 0.7]];
        assert!(trajectories_from_parameters(&PhysicsConstants::default(), params.view()).is_err());
    }

    #[test]
    fn test_empty_batch() {
        let params = Array2::<f64>::zeros((0, 4));
        let batch = trajectories_from_parameters(&PhysicsConstants::default(), params.view()).unwrap();
        assert!(batch.is_empty());
        assert_eq!(batch.xs.dim(), (0, 1500));
    }

    #[test]
    fn test_argmax_first_of_ties() {
        assert_eq!(argmax(array![1.0, 3.0, 3.0, 2.0].view()), 1);
        assert_eq!(argmax(array![5.0].view()), 0);
    }
}
