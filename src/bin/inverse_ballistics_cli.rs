use clap::{Parser, Subcommand, ValueEnum};
use log::info;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::path::PathBuf;

use inverse_ballistics::{
    find_map, time_grid, ArtifactStore, DatasetConfig, DirectoryStore, ForwardModel,
    InverseBallisticsDataset, InverseBallisticsModel, MapEstimate, ParameterVector,
};

#[derive(Parser)]
#[command(name = "inverse-ballistics")]
#[command(version = "0.1.0")]
#[command(about = "Synthetic inverse ballistics dataset generator", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load or generate a dataset and summarize it
    Generate {
        /// JSON settings file; flags below override it
        #[arg(short = 'c', long)]
        config: Option<PathBuf>,

        /// Number of samples
        #[arg(short = 'n', long)]
        n: Option<usize>,

        /// Directory the artifacts are cached in
        #[arg(short = 'd', long)]
        root_dir: Option<PathBuf>,

        /// Artifact name suffix (e.g. train, test)
        #[arg(short = 's', long)]
        suffix: Option<String>,

        /// Random seed for prior sampling
        #[arg(long)]
        seed: Option<u64>,

        /// Output format
        #[arg(short = 'o', long, default_value = "table")]
        output: OutputFormat,
    },

    /// Sample the prior and report the MAP exemplar
    Map {
        /// Number of prior samples
        #[arg(
            short = 'n',
            long,
            default_value = "2000",
            value_parser = clap::builder::RangedU64ValueParser::<usize>::new().range(1..)
        )]
        n: usize,

        /// Random seed for prior sampling
        #[arg(long, default_value = "0")]
        seed: u64,
    },

    /// Simulate a single launch
    Trajectory {
        /// Initial horizontal position
        #[arg(long, default_value = "0.0", allow_hyphen_values = true)]
        x0: f64,

        /// Initial height
        #[arg(long, default_value = "1.5")]
        y0: f64,

        /// Launch angle (degrees)
        #[arg(short = 'a', long, default_value = "45.0")]
        angle: f64,

        /// Initial speed
        #[arg(short = 'v', long, default_value = "15.0")]
        velocity: f64,

        /// Print every n-th trajectory sample
        #[arg(long, default_value = "100")]
        every: usize,

        /// Output format
        #[arg(short = 'o', long, default_value = "table")]
        output: OutputFormat,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    Json,
    Csv,
    Table,
}

#[derive(Debug, Serialize, Deserialize)]
struct DatasetSummary {
    samples: usize,
    suffix: String,
    missing_impacts: usize,
    min_impact: f64,
    max_impact: f64,
    mean_impact: f64,
}

#[derive(Debug, Serialize, Deserialize)]
struct TrajectoryPoint {
    time: f64,
    x: f64,
    y: f64,
}

#[derive(Debug, Serialize, Deserialize)]
struct TrajectoryReport {
    parameters: ParameterVector,
    impact: Option<f64>,
    max_height: f64,
    trajectory: Vec<TrajectoryPoint>,
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Generate { config, n, root_dir, suffix, seed, output } => {
            let mut settings = match config {
                Some(path) => DatasetConfig::from_json_file(path)?,
                None => DatasetConfig::default(),
            };
            if let Some(n) = n {
                settings.n = n;
            }
            if root_dir.is_some() {
                settings.root_dir = root_dir;
            }
            if let Some(suffix) = suffix {
                settings.suffix = suffix;
            }
            if seed.is_some() {
                settings.seed = seed;
            }
            settings.validate()?;

            let summary = generate(&settings)?;
            display_summary(&summary, output)?;
        }

        Commands::Map { n, seed } => {
            let model = InverseBallisticsModel::new(Default::default())?;
            let sample = model.sample_prior(n, &mut StdRng::seed_from_u64(seed));
            let estimate = find_map(sample.view());
            let p = sample
                .rows()
                .into_iter()
                .nth(estimate.index())
                .and_then(ParameterVector::from_row)
                .ok_or("no prior sample at the MAP exemplar index")?;

            match &estimate {
                MapEstimate::Mode { index, log_density } => {
                    println!("MAP exemplar: sample {} (log density {:.4})", index, log_density);
                }
                MapEstimate::Degenerate { reason, .. } => {
                    println!("Mode finding failed ({}), falling back to sample 0", reason);
                }
            }
            println!("  x0    = {:>8.4}", p.x0);
            println!("  y0    = {:>8.4}", p.y0);
            println!("  angle = {:>8.4} rad ({:.2} deg)", p.angle, p.angle.to_degrees());
            println!("  v0    = {:>8.4}", p.v0);
        }

        Commands::Trajectory { x0, y0, angle, velocity, every, output } => {
            let model = InverseBallisticsModel::new(Default::default())?;
            let p = ParameterVector::new(x0, y0, angle.to_radians(), velocity);
            let params = ndarray::Array2::from_shape_vec((1, 4), p.to_array().to_vec())?;
            let trajectories = model.trajectories_from_parameters(params.view())?;
            let impacts = model.impacts_from_trajectories(&trajectories);

            let (xs, ys) = trajectories.curve(0);
            let step = every.max(1);
            let report = TrajectoryReport {
                parameters: p,
                impact: Some(impacts[[0, 0]]).filter(|x| x.is_finite()),
                max_height: ys.iter().cloned().fold(f64::NEG_INFINITY, f64::max),
                trajectory: time_grid()
                    .iter()
                    .zip(xs.iter().zip(ys.iter()))
                    .step_by(step)
                    .map(|(&time, (&x, &y))| TrajectoryPoint { time, x, y })
                    .collect(),
            };
            display_trajectory(&report, output)?;
        }
    }

    Ok(())
}

fn generate(settings: &DatasetConfig) -> Result<DatasetSummary, Box<dyn Error>> {
    let model = InverseBallisticsModel::new(settings.model)?;
    let mut rng = match settings.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let mut store = settings.root_dir.as_ref().map(DirectoryStore::new);
    if let Some(s) = &store {
        info!("Caching artifacts in {}", s.root().display());
    }

    let dataset = InverseBallisticsDataset::new(
        model,
        settings.n,
        store.as_mut().map(|s| s as &mut dyn ArtifactStore),
        &settings.suffix,
        &mut rng,
    )?;

    let impacts: Vec<f64> = dataset
        .observations()
        .iter()
        .cloned()
        .filter(|x| x.is_finite())
        .collect();
    let mean_impact = if impacts.is_empty() {
        f64::NAN
    } else {
        impacts.iter().sum::<f64>() / impacts.len() as f64
    };

    Ok(DatasetSummary {
        samples: dataset.len(),
        suffix: dataset.suffix().to_string(),
        missing_impacts: dataset.len() - impacts.len(),
        min_impact: impacts.iter().cloned().fold(f64::INFINITY, f64::min),
        max_impact: impacts.iter().cloned().fold(f64::NEG_INFINITY, f64::max),
        mean_impact,
    })
}

fn display_summary(summary: &DatasetSummary, format: OutputFormat) -> Result<(), Box<dyn Error>> {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(summary)?);
        }

        OutputFormat::Csv => {
            println!("metric,value");
            println!("samples,{}", summary.samples);
            println!("missing_impacts,{}", summary.missing_impacts);
            println!("min_impact,{:.4}", summary.min_impact);
            println!("max_impact,{:.4}", summary.max_impact);
            println!("mean_impact,{:.4}", summary.mean_impact);
        }

        OutputFormat::Table => {
            println!("╔════════════════════════════════════════╗");
            println!("║      INVERSE BALLISTICS DATASET        ║");
            println!("╠════════════════════════════════════════╣");
            println!("║ Samples:           {:>10}          ║", summary.samples);
            println!("║ Missing impacts:   {:>10}          ║", summary.missing_impacts);
            println!("║ Min impact:        {:>10.4}          ║", summary.min_impact);
            println!("║ Max impact:        {:>10.4}          ║", summary.max_impact);
            println!("║ Mean impact:       {:>10.4}          ║", summary.mean_impact);
            println!("╚════════════════════════════════════════╝");
        }
    }
    Ok(())
}

fn display_trajectory(report: &TrajectoryReport, format: OutputFormat) -> Result<(), Box<dyn Error>> {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(report)?);
        }

        OutputFormat::Csv => {
            println!("time,x,y");
            for p in &report.trajectory {
                println!("{:.4},{:.4},{:.4}", p.time, p.x, p.y);
            }
        }

        OutputFormat::Table => {
            println!("╔════════════════════════════════════════╗");
            println!("║         TRAJECTORY RESULTS             ║");
            println!("╠════════════════════════════════════════╣");
            match report.impact {
                Some(x) => println!("║ Impact:            {:>8.4}            ║", x),
                None => println!("║ Impact:            none in window      ║"),
            }
            println!("║ Max Height:        {:>8.4}            ║", report.max_height);
            println!("╚════════════════════════════════════════╝");
            println!("┌──────────┬──────────┬──────────┐");
            println!("│ Time     │    X     │    Y     │");
            println!("├──────────┼──────────┼──────────┤");
            for p in &report.trajectory {
                println!("│ {:>8.3} │ {:>8.3} │ {:>8.3} │", p.time, p.x, p.y);
            }
            println!("└──────────┴──────────┴──────────┘");
        }
    }
    Ok(())
}
