//! Physical and numerical constants used by the inverse ballistics model

/// Default gravitational acceleration
pub const DEFAULT_GRAVITY: f64 = 9.81;

/// Default linear drag coefficient (depends on object shape and traversed medium)
pub const DEFAULT_DRAG_COEFFICIENT: f64 = 0.25;

/// Default object mass
pub const DEFAULT_MASS: f64 = 0.2;

/// Number of fixed time samples per simulated trajectory
pub const N_TIME_SAMPLES: usize = 1500;

/// End of the simulated time window (the window starts at 0)
pub const T_MAX: f64 = 6.0;

/// Height written over samples that lie before the apex, so no ground
/// crossing is detected on the ascending branch
pub const PRE_APEX_SENTINEL: f64 = 0.1;

/// Maximum number of rows pushed through the simulator at once
pub const FORWARD_CHUNK_SIZE: usize = 100_000;

// Prior distribution

/// Mean of the launch position (x0, y0)
pub const PRIOR_XY_MEAN: [f64; 2] = [0.0, 1.5];

/// Standard deviation of the launch position (x0, y0)
pub const PRIOR_XY_STD: [f64; 2] = [0.5, 0.5];

/// Fraction of the quarter circle skipped at each end of the angle range
pub const PRIOR_ANGLE_MARGIN: f64 = 0.1;

/// Rate of the Poisson distribution for the initial speed
pub const PRIOR_SPEED_RATE: f64 = 15.0;

// Mode finding

/// Gaussian kernel bandwidth of the density used to score mean-shift centers
pub const KDE_BANDWIDTH: f64 = 0.1;

/// Neighbour quantile used to estimate the mean-shift bandwidth
pub const MEAN_SHIFT_QUANTILE: f64 = 0.3;

/// Iteration cap for a single mean-shift seed
pub const MEAN_SHIFT_MAX_ITER: usize = 300;

/// Convergence threshold for a seed, relative to the bandwidth
pub const MEAN_SHIFT_STOP_FACTOR: f64 = 1e-3;

// Sample figure

/// Number of launch arrows drawn in a sample figure
pub const FIGURE_MAX_ARROWS: usize = 150;

/// Scale applied to the exemplar launch velocity arrow
pub const EXEMPLAR_ARROW_SCALE: f64 = 0.2;

/// Covariance factor of the impact density curve
pub const IMPACT_DENSITY_FACTOR: f64 = 0.15;

/// Number of evaluation points of the impact density curve
pub const IMPACT_DENSITY_POINTS: usize = 200;

/// Padding added on both sides of the impact density domain
pub const IMPACT_DENSITY_PADDING: f64 = 0.5;

/// Peak height the impact density curve is normalized to
pub const IMPACT_DENSITY_HEIGHT: f64 = 3.0;
