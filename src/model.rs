//! The inverse ballistics forward model.
//!
//! Bundles the physical constants, the prior over launch parameters and the
//! closed-form simulator behind the [`ForwardModel`] trait that the dataset
//! cache is written against.

use nalgebra::Vector2;
use ndarray::{Array2, ArrayView1, ArrayView2};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_DRAG_COEFFICIENT, DEFAULT_GRAVITY, DEFAULT_MASS};
use crate::error::{BallisticsError, Result};
use crate::forward::forward_process;
use crate::impact::impacts_from_trajectories;
use crate::prior::Prior;
use crate::trajectory::{trajectories_from_parameters, TrajectoryBatch};

/// Physical constants of the linear-drag particle model
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsConstants {
    pub gravity: f64,           // g
    pub drag_coefficient: f64,  // k, depends on object shape and traversed medium
    pub mass: f64,              // m
}

impl Default for PhysicsConstants {
    fn default() -> Self {
        Self {
            gravity: DEFAULT_GRAVITY,
            drag_coefficient: DEFAULT_DRAG_COEFFICIENT,
            mass: DEFAULT_MASS,
        }
    }
}

impl PhysicsConstants {
    /// Reject constants for which the closed-form solution is undefined.
    pub fn validate(&self) -> Result<()> {
        if !self.gravity.is_finite() {
            return Err(BallisticsError::config(format!(
                "gravity must be finite, got {}",
                self.gravity
            )));
        }
        if !(self.drag_coefficient > 0.0 && self.drag_coefficient.is_finite()) {
            return Err(BallisticsError::config(format!(
                "drag coefficient must be positive, got {}",
                self.drag_coefficient
            )));
        }
        if !(self.mass > 0.0 && self.mass.is_finite()) {
            return Err(BallisticsError::config(format!(
                "mass must be positive, got {}",
                self.mass
            )));
        }
        Ok(())
    }
}

/// One latent launch configuration
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ParameterVector {
    pub x0: f64,     // initial horizontal position
    pub y0: f64,     // initial height
    pub angle: f64,  // launch angle (radians)
    pub v0: f64,     // initial speed
}

impl ParameterVector {
    pub fn new(x0: f64, y0: f64, angle: f64, v0: f64) -> Self {
        Self { x0, y0, angle, v0 }
    }

    /// Read a parameter row `(x0, y0, angle, v0)`.
    ///
    /// Returns `None` if the row does not have exactly four entries.
    pub fn from_row(row: ArrayView1<f64>) -> Option<Self> {
        if row.len() != InverseBallisticsModel::N_PARAMETERS {
            return None;
        }
        Some(Self::new(row[0], row[1], row[2], row[3]))
    }

    pub fn to_array(&self) -> [f64; 4] {
        [self.x0, self.y0, self.angle, self.v0]
    }

    /// Launch position as a 2D point
    pub fn origin(&self) -> Vector2<f64> {
        Vector2::new(self.x0, self.y0)
    }

    /// Initial velocity vector (vx, vy)
    pub fn launch_velocity(&self) -> Vector2<f64> {
        Vector2::new(self.v0 * self.angle.cos(), self.v0 * self.angle.sin())
    }
}

/// Description of a parametric forward process the dataset cache can drive.
pub trait ForwardModel {
    /// Identity used to key cached artifacts.
    fn name(&self) -> &str;

    /// Columns of a parameter batch.
    fn n_parameters(&self) -> usize;

    /// Columns of an observation batch.
    fn n_observations(&self) -> usize;

    /// Draw `n` independent parameter rows from the prior.
    fn sample_prior<R: Rng + ?Sized>(&self, n: usize, rng: &mut R) -> Array2<f64>;

    /// Map a parameter batch to a row-aligned observation batch.
    fn forward_process(&self, params: ArrayView2<f64>) -> Result<Array2<f64>>;
}

/// Projectile launched under gravity and linear drag, observed at its impact point
#[derive(Debug, Clone)]
pub struct InverseBallisticsModel {
    constants: PhysicsConstants,
    prior: Prior,
}

impl InverseBallisticsModel {
    pub const NAME: &'static str = "inverse-ballistics";
    pub const N_PARAMETERS: usize = 4;
    pub const N_OBSERVATIONS: usize = 1;

    /// Build the model with the standard prior.
    pub fn new(constants: PhysicsConstants) -> Result<Self> {
        Self::with_prior(constants, Prior::standard()?)
    }

    pub fn with_prior(constants: PhysicsConstants, prior: Prior) -> Result<Self> {
        constants.validate()?;
        Ok(Self { constants, prior })
    }

    pub fn constants(&self) -> &PhysicsConstants {
        &self.constants
    }

    pub fn prior(&self) -> &Prior {
        &self.prior
    }

    pub fn trajectories_from_parameters(&self, params: ArrayView2<f64>) -> Result<TrajectoryBatch> {
        trajectories_from_parameters(&self.constants, params)
    }

    pub fn impacts_from_trajectories(&self, trajectories: &TrajectoryBatch) -> Array2<f64> {
        impacts_from_trajectories(trajectories)
    }
}

impl ForwardModel for InverseBallisticsModel {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn n_parameters(&self) -> usize {
        Self::N_PARAMETERS
    }

    fn n_observations(&self) -> usize {
        Self::N_OBSERVATIONS
    }

    fn sample_prior<R: Rng + ?Sized>(&self, n: usize, rng: &mut R) -> Array2<f64> {
        self.prior.sample(n, rng)
    }

    fn forward_process(&self, params: ArrayView2<f64>) -> Result<Array2<f64>> {
        forward_process(&self.constants, params)
    }
}
