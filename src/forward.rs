//! Forward process: parameters to impact observations, in bounded-memory chunks.

use log::{info, warn};
use ndarray::{Array2, ArrayView2, Axis};

use crate::constants::FORWARD_CHUNK_SIZE;
use crate::error::{BallisticsError, Result};
use crate::impact::{count_missing_impacts, impacts_from_trajectories};
use crate::model::PhysicsConstants;
use crate::trajectory::trajectories_from_parameters;

/// Simulate and reduce one batch in a single pass.
///
/// Peak memory is two `N x N_TIME_SAMPLES` arrays.
pub fn evaluate_batch(constants: &PhysicsConstants, params: ArrayView2<f64>) -> Result<Array2<f64>> {
    let trajectories = trajectories_from_parameters(constants, params)?;
    Ok(impacts_from_trajectories(&trajectories))
}

/// Observation batch for `params`, chunked at `FORWARD_CHUNK_SIZE`.
///
/// Same code path as [`forward_process_chunked`].
pub fn forward_process(constants: &PhysicsConstants, params: ArrayView2<f64>) -> Result<Array2<f64>> {
    forward_process_chunked(constants, params, FORWARD_CHUNK_SIZE)
}

/// Observation batch for `params`, simulating at most `chunk_size` rows at a time.
///
/// Rows are independent, so the result does not depend on `chunk_size`.
pub fn forward_process_chunked(
    constants: &PhysicsConstants,
    params: ArrayView2<f64>,
    chunk_size: usize,
) -> Result<Array2<f64>> {
    if chunk_size == 0 {
        return Err(BallisticsError::config("forward process chunk size must be positive"));
    }

    let n = params.nrows();
    let observations = if n <= chunk_size {
        evaluate_batch(constants, params)?
    } else {
        let n_chunks = (n - 1) / chunk_size + 1;
        let mut observations = Array2::from_elem((n, 1), f64::NAN);
        for (i, (chunk, mut out)) in params
            .axis_chunks_iter(Axis(0), chunk_size)
            .zip(observations.axis_chunks_iter_mut(Axis(0), chunk_size))
            .enumerate()
        {
            info!("Forward process chunk {}/{} ({} rows)...", i + 1, n_chunks, chunk.nrows());
            out.assign(&evaluate_batch(constants, chunk)?);
        }
        observations
    };

    let missing = count_missing_impacts(&observations);
    if missing > 0 {
        warn!(
            "{} of {} trajectories did not reach the ground within the simulated window",
            missing, n
        );
    }

    Ok(observations)
}
