//! Figure preparation for visualizing a parameter sample.
//!
//! Drawing itself happens behind the [`Renderer`] trait; this module computes
//! what a sample figure shows: every trajectory, launch arrows, the MAP
//! exemplar, the impact points and a smoothed impact density.

use nalgebra::Vector2;
use ndarray::{arr1, Array1, Array2, ArrayView2, Axis};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::constants::{
    EXEMPLAR_ARROW_SCALE, FIGURE_MAX_ARROWS, IMPACT_DENSITY_FACTOR, IMPACT_DENSITY_HEIGHT,
    IMPACT_DENSITY_PADDING, IMPACT_DENSITY_POINTS,
};
use crate::error::Result;
use crate::impact::{crossing_impacts, impact_from_curve};
use crate::kde::GaussianKde;
use crate::map_estimate::{find_map, MapEstimate};
use crate::model::{InverseBallisticsModel, ParameterVector};
use crate::trajectory::TrajectoryBatch;

/// Parts of a sample figure that take a color and opacity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FigureElement {
    Lines,
    Arrows,
    Impact,
    Density,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Color {
    Rgb([f64; 3]),
    Hex(String),
}

/// Styling and framing of a sample figure.
///
/// `colors` and `alphas` only need to hold overrides, missing elements fall
/// back to the defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderOptions {
    pub colors: BTreeMap<FigureElement, Color>,
    pub alphas: BTreeMap<FigureElement, f64>,
    pub annotate: bool,
    pub target: Option<f64>,   // vertical marker at this impact position
    pub x_range: (f64, f64),
    pub y_range: (f64, f64),
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            colors: BTreeMap::new(),
            alphas: BTreeMap::new(),
            annotate: false,
            target: None,
            x_range: (-2.0, 18.0),
            y_range: (-1.5, 6.5),
        }
    }
}

impl RenderOptions {
    pub fn color(&self, element: FigureElement) -> Color {
        if let Some(color) = self.colors.get(&element) {
            return color.clone();
        }
        match element {
            FigureElement::Lines => Color::Rgb([0.5, 0.5, 0.5]),
            FigureElement::Arrows => Color::Rgb([0.2, 0.2, 0.2]),
            FigureElement::Impact | FigureElement::Density => Color::Hex("#96BF0D".to_string()),
        }
    }

    pub fn alpha(&self, element: FigureElement) -> f64 {
        if let Some(&alpha) = self.alphas.get(&element) {
            return alpha;
        }
        match element {
            FigureElement::Lines => 0.015,
            FigureElement::Arrows => 0.4,
            FigureElement::Impact => 0.2,
            FigureElement::Density => 0.2,
        }
    }
}

/// Launch position and initial velocity of one sample
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LaunchArrow {
    pub origin: Vector2<f64>,
    pub velocity: Vector2<f64>,
}

impl From<&ParameterVector> for LaunchArrow {
    fn from(p: &ParameterVector) -> Self {
        Self {
            origin: p.origin(),
            velocity: p.launch_velocity(),
        }
    }
}

/// Impact density sampled on an even grid, peak scaled to a fixed height
#[derive(Debug, Clone, PartialEq)]
pub struct DensityCurve {
    pub domain: Vec<f64>,
    pub heights: Vec<f64>,
}

/// Everything a renderer needs to draw a sample figure
#[derive(Debug, Clone)]
pub struct SampleFigure {
    pub trajectories: TrajectoryBatch,
    pub exemplar: MapEstimate,
    pub arrows: Vec<LaunchArrow>,
    pub exemplar_arrow: Option<LaunchArrow>,  // velocity already scaled for display
    pub impacts: Vec<f64>,
    pub exemplar_impact: Option<f64>,
    pub density: Option<DensityCurve>,
    pub options: RenderOptions,
}

impl SampleFigure {
    pub fn exemplar_index(&self) -> usize {
        self.exemplar.index()
    }
}

/// Backend that turns a prepared figure into pixels or a file
pub trait Renderer {
    fn render(&mut self, figure: &SampleFigure) -> Result<()>;
}

/// Prepare a sample figure.
///
/// `trajectories` may be passed when they are already available, otherwise
/// they are simulated from `params`.
pub fn prepare_sample_figure(
    model: &InverseBallisticsModel,
    params: ArrayView2<f64>,
    trajectories: Option<TrajectoryBatch>,
    options: RenderOptions,
) -> Result<SampleFigure> {
    let trajectories = match trajectories {
        Some(t) => t,
        None => model.trajectories_from_parameters(params)?,
    };
    let exemplar = find_map(params);
    let index = exemplar.index();

    let arrows: Vec<LaunchArrow> = params
        .axis_iter(Axis(0))
        .take(FIGURE_MAX_ARROWS)
        .filter_map(ParameterVector::from_row)
        .map(|p| LaunchArrow::from(&p))
        .collect();

    let exemplar_arrow = params
        .axis_iter(Axis(0))
        .nth(index)
        .and_then(ParameterVector::from_row)
        .map(|p| LaunchArrow {
            origin: p.origin(),
            velocity: p.launch_velocity() * EXEMPLAR_ARROW_SCALE,
        });

    let impacts = crossing_impacts(&trajectories);
    let exemplar_impact = if index < trajectories.len() {
        let (xs, ys) = trajectories.curve(index);
        impact_from_curve(xs, ys)
    } else {
        None
    };
    let density = impact_density(&impacts);

    Ok(SampleFigure {
        trajectories,
        exemplar,
        arrows,
        exemplar_arrow,
        impacts,
        exemplar_impact,
        density,
        options,
    })
}

/// Smoothed impact distribution for the figure baseline.
///
/// The kernel width is `IMPACT_DENSITY_FACTOR` times the sample standard
/// deviation. Needs at least two distinct impacts.
pub fn impact_density(impacts: &[f64]) -> Option<DensityCurve> {
    let n = impacts.len();
    if n < 2 {
        return None;
    }
    let mean = impacts.iter().sum::<f64>() / n as f64;
    let var = impacts.iter().map(|x| (x - mean) * (x - mean)).sum::<f64>() / (n - 1) as f64;
    let sigma = IMPACT_DENSITY_FACTOR * var.sqrt();

    let data = Array2::from_shape_vec((n, 1), impacts.to_vec()).ok()?;
    let kde = GaussianKde::fit(data.view(), sigma).ok()?;

    let lo = impacts.iter().cloned().fold(f64::INFINITY, f64::min) - IMPACT_DENSITY_PADDING;
    let hi = impacts.iter().cloned().fold(f64::NEG_INFINITY, f64::max) + IMPACT_DENSITY_PADDING;
    let domain: Vec<f64> = Array1::linspace(lo, hi, IMPACT_DENSITY_POINTS).to_vec();

    let raw: Vec<f64> = domain
        .iter()
        .map(|&x| kde.density(arr1(&[x]).view()))
        .collect();
    let peak = raw.iter().cloned().fold(0.0, f64::max);
    if !(peak > 0.0) {
        return None;
    }
    let heights = raw.iter().map(|d| IMPACT_DENSITY_HEIGHT * d / peak).collect();

    Some(DensityCurve { domain, heights })
}
