use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use ndarray::{Array1, Array2};
use rayon::ThreadPoolBuilder;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use terrain_edit::{
    AnnulusInterpolation, Filter, Grid, InterpolationMode, ModelId, ModelKind, PolygonId, Scene, Transformation,
    PLANE_HEIGHT,
};
use tracing::info;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Worker threads for the parallel operators (default: number of cores)
    #[arg(short, long, global = true)]
    threads: Option<usize>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run every transformation on a synthetic terrain and print timings
    Bench {
        /// Number of rows and columns of the synthetic grid
        #[arg(short, long, default_value_t = 256)]
        size: usize,

        /// Write the timings to this file as well
        #[arg(short, long, value_name = "FILE")]
        report: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let args = Args::parse();

    if let Some(threads) = args.threads {
        ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()
            .context("Failed to build thread pool")?;
    }

    match args.command {
        Command::Bench { size, report } => {
            let start_time = Instant::now();
            let timings = run_bench(size)?;
            for (name, elapsed) in &timings {
                println!("{name:<24} {:>10.3} ms", elapsed.as_secs_f64() * 1000.0);
            }
            if let Some(path) = report {
                write_report(&path, size, &timings)?;
                info!("Report written: {:?}", path);
            }
            info!("Total processing time: {:?}", start_time.elapsed());
        }
    }

    Ok(())
}

/// Synthetic rolling terrain with a band of missing cells.
fn synthetic_grid(size: usize) -> Result<Grid> {
    let axis = Array1::from_iter((0..size).map(|i| i as f64));
    let heights = Array2::from_shape_fn((size, size), |(r, c)| {
        let (x, y) = (c as f64 / 16.0, r as f64 / 16.0);
        if r % 37 == 5 && c % 3 != 0 {
            f64::NAN
        } else {
            500.0 + 120.0 * x.sin() * y.cos() + 4.0 * x
        }
    });
    Grid::new(axis.clone(), axis, heights).context("Failed to build synthetic grid")
}

fn draw(scene: &mut Scene, points: &[(f64, f64)]) -> Result<PolygonId> {
    let id = scene.create_polygon();
    scene.set_active_polygon(&id)?;
    for &(x, y) in points {
        scene.add_vertex_to_active_polygon(x, y, PLANE_HEIGHT)?;
    }
    Ok(id)
}

fn run_bench(size: usize) -> Result<Vec<(&'static str, Duration)>> {
    anyhow::ensure!(size >= 16, "Grid size must be at least 16, got {size}");

    let mut scene = Scene::default();
    let dem = ModelId::from("dem");
    let copy = ModelId::from("copy");
    let grid = synthetic_grid(size)?;
    scene.add_model(dem.clone(), "synthetic", ModelKind::Map2d, grid.clone());
    scene.add_model(copy.clone(), "synthetic copy", ModelKind::Map2d, grid);
    info!("Synthetic grid ready ({}x{})", size, size);

    let s = size as f64;
    let area = draw(
        &mut scene,
        &[(0.2 * s, 0.2 * s), (0.7 * s, 0.25 * s), (0.6 * s, 0.7 * s), (0.25 * s, 0.6 * s)],
    )?;
    let hole = draw(
        &mut scene,
        &[(0.35 * s, 0.35 * s), (0.45 * s, 0.35 * s), (0.45 * s, 0.45 * s), (0.35 * s, 0.45 * s)],
    )?;

    let requests = [
        (
            "linear rescale",
            Transformation::LinearRescale {
                model: dem.clone(),
                polygon: area.clone(),
                min_height: 0.0,
                max_height: 100.0,
                filters: vec![Filter::IsNotIn(hole.clone())],
            },
        ),
        (
            "interpolate linear",
            Transformation::Interpolate {
                model: dem.clone(),
                polygon: hole.clone(),
                distance: 0.05 * s,
                kind: AnnulusInterpolation::Linear,
            },
        ),
        (
            "interpolate smooth",
            Transformation::Interpolate {
                model: dem.clone(),
                polygon: area.clone(),
                distance: 0.05 * s,
                kind: AnnulusInterpolation::Smooth,
            },
        ),
        (
            "convolution fill",
            Transformation::ConvolutionFill {
                model: dem.clone(),
                kernel_distance: 3,
                nan_fraction_threshold: 0.3,
            },
        ),
        (
            "fill nan",
            Transformation::FillNan {
                model: dem.clone(),
                polygon: hole.clone(),
                filters: vec![],
            },
        ),
        (
            "interpolate nearest",
            Transformation::InterpolateMissing {
                model: copy.clone(),
                mode: InterpolationMode::Nearest,
            },
        ),
        (
            "interpolate cubic",
            Transformation::InterpolateMissing {
                model: dem.clone(),
                mode: InterpolationMode::Cubic,
            },
        ),
        (
            "merge",
            Transformation::Merge {
                base: dem.clone(),
                overlay: copy.clone(),
            },
        ),
        (
            "subtract",
            Transformation::Subtract {
                model: copy.clone(),
                subtrahend: dem.clone(),
            },
        ),
        ("fill nan in polygons", Transformation::FillNanInPolygons { model: copy.clone() }),
        (
            "replace with nan",
            Transformation::ReplaceWithNan {
                model: dem.clone(),
                marker: copy,
            },
        ),
    ];

    let mut timings = Vec::with_capacity(requests.len());
    for (name, request) in &requests {
        let start = Instant::now();
        scene
            .apply_transformation(request)
            .with_context(|| format!("Transformation '{name}' failed"))?;
        let elapsed = start.elapsed();
        info!("{} finished in {:?}", name, elapsed);
        timings.push((*name, elapsed));
    }
    Ok(timings)
}

fn write_report(path: &Path, size: usize, timings: &[(&str, Duration)]) -> Result<()> {
    let mut report = format!("grid {size}x{size}\n");
    for (name, elapsed) in timings {
        report.push_str(&format!("{name}\t{:.3}\n", elapsed.as_secs_f64() * 1000.0));
    }
    fs::write(path, report).with_context(|| format!("Failed to write report to {}", path.display()))
}
