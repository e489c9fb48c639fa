use ndarray::Array2;
use rand::Rng;
use rand_distr::{Distribution, Normal, Poisson};
use std::f64::consts::FRAC_PI_2;

use crate::constants::{PRIOR_ANGLE_MARGIN, PRIOR_SPEED_RATE, PRIOR_XY_MEAN, PRIOR_XY_STD};
use crate::error::{BallisticsError, Result};
use crate::model::ParameterVector;

/// Prior over launch parameters `(x0, y0, angle, v0)`
///
/// - `x0 ~ Normal(mu_x, std_x)`
/// - `y0 ~ max(Normal(mu_y, std_y), 0)`
/// - `angle ~ Uniform` over the quarter circle minus a margin at each end
/// - `v0 ~ Poisson(rate)`, integer valued but stored as f64
#[derive(Debug, Clone)]
pub struct Prior {
    x0: Normal<f64>,
    y0: Normal<f64>,
    angle_margin: f64,
    speed: Poisson<f64>,
}

impl Prior {
    pub fn new(xy_mu: [f64; 2], xy_std: [f64; 2], angle_margin: f64, speed_rate: f64) -> Result<Self> {
        let x0 = Normal::new(xy_mu[0], xy_std[0])
            .map_err(|e| BallisticsError::config(format!("Invalid x0 distribution: {}", e)))?;
        let y0 = Normal::new(xy_mu[1], xy_std[1])
            .map_err(|e| BallisticsError::config(format!("Invalid y0 distribution: {}", e)))?;
        if !(0.0..0.5).contains(&angle_margin) {
            return Err(BallisticsError::config(format!(
                "angle margin must lie in [0, 0.5), got {}",
                angle_margin
            )));
        }
        let speed = Poisson::new(speed_rate)
            .map_err(|e| BallisticsError::config(format!("Invalid speed distribution: {}", e)))?;

        Ok(Self { x0, y0, angle_margin, speed })
    }

    /// The prior the dataset is generated from
    pub fn standard() -> Result<Self> {
        Self::new(PRIOR_XY_MEAN, PRIOR_XY_STD, PRIOR_ANGLE_MARGIN, PRIOR_SPEED_RATE)
    }

    /// Closed interval the launch angle is drawn from
    pub fn angle_range(&self) -> (f64, f64) {
        (
            FRAC_PI_2 * self.angle_margin,
            FRAC_PI_2 * (1.0 - self.angle_margin),
        )
    }

    pub fn sample_one<R: Rng + ?Sized>(&self, rng: &mut R) -> ParameterVector {
        let x0 = self.x0.sample(rng);
        let y0 = self.y0.sample(rng).max(0.0);
        let angle = rng.gen::<f64>() * FRAC_PI_2 * (1.0 - 2.0 * self.angle_margin)
            + FRAC_PI_2 * self.angle_margin;
        let v0 = self.speed.sample(rng);
        ParameterVector::new(x0, y0, angle, v0)
    }

    /// Draw an `n x 4` parameter batch.
    pub fn sample<R: Rng + ?Sized>(&self, n: usize, rng: &mut R) -> Array2<f64> {
        let mut batch = Array2::zeros((n, 4));
        for mut row in batch.rows_mut() {
            let p = self.sample_one(rng);
            row[0] = p.x0;
            row[1] = p.y0;
            row[2] = p.angle;
            row[3] = p.v0;
        }
        batch
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::f64::consts::PI;

    #[test]
    fn test_prior_sample_bounds() {
        let prior = Prior::standard().unwrap();
        let mut rng = StdRng::seed_from_u64(7);
        let batch = prior.sample(10_000, &mut rng);

        assert_eq!(batch.dim(), (10_000, 4));
        for row in batch.rows() {
            assert!(row[1] >= 0.0, "negative height {}", row[1]);
            assert!(row[2] >= 0.05 * PI - 1e-12 && row[2] <= 0.45 * PI + 1e-12);
            assert!(row[3] >= 0.0);
            assert_eq!(row[3], row[3].round(), "speed not integer valued");
        }
    }

    #[test]
    fn test_prior_sample_moments() {
        let prior = Prior::standard().unwrap();
        let mut rng = StdRng::seed_from_u64(11);
        let batch = prior.sample(20_000, &mut rng);

        let mean_x0 = batch.column(0).mean().unwrap();
        let mean_v0 = batch.column(3).mean().unwrap();
        assert!(mean_x0.abs() < 0.05, "x0 mean {}", mean_x0);
        assert!((mean_v0 - 15.0).abs() < 0.2, "v0 mean {}", mean_v0);

        // Clamping at zero happens in ~0.1% of draws for mu=1.5, std=0.5
        let clamped = batch.column(1).iter().filter(|&&y| y == 0.0).count();
        assert!(clamped < 100);
    }

    #[test]
    fn test_prior_seeded_reproducible() {
        let prior = Prior::standard().unwrap();
        let a = prior.sample(50, &mut StdRng::seed_from_u64(3));
        let b = prior.sample(50, &mut StdRng::seed_from_u64(3));
        assert_eq!(a, b);
    }

    #[test]
    fn test_angle_range() {
        let prior = Prior::standard().unwrap();
        let (lo, hi) = prior.angle_range();
        assert!((lo - 0.05 * PI).abs() < 1e-12);
        assert!((hi - 0.45 * PI).abs() < 1e-12);
    }

    #[test]
    fn test_invalid_prior_rejected() {
        assert!(Prior::new([0.0, 1.5], [-1.0, 0.5], 0.1, 15.0).is_err());
        assert!(Prior::new([0.0, 1.5], [0.5, 0.5], 0.6, 15.0).is_err());
        assert!(Prior::new([0.0, 1.5], [0.5, 0.5], 0.1, 0.0).is_err());
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    proptest! {
        #[test]
        fn prop_every_draw_in_support(seed in any::<u64>()) {
            let prior = Prior::standard().unwrap();
            let (lo, hi) = prior.angle_range();
            let mut rng = StdRng::seed_from_u64(seed);
            for _ in 0..64 {
                let p = prior.sample_one(&mut rng);
                prop_assert!(p.y0 >= 0.0);
                prop_assert!(p.angle >= lo && p.angle <= hi);
                prop_assert!(p.v0 >= 0.0 && p.v0.fract() == 0.0);
            }
        }
    }
}
