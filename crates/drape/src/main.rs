//! drape: fit a segmented garment image onto a photograph of a person.
//!
//! Reads the garment and body photos, body landmarks from a JSON
//! sidecar (or `--landmarks`), and optionally a garment mask, then
//! writes the composite PNG beside the body photo.
//!
//! # Usage
//!
//! ```text
//! cargo run --release --bin drape -- [OPTIONS] <GARMENT> <BODY>
//! ```

#![allow(clippy::print_stdout, clippy::print_stderr)]

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{ArgAction, Parser, ValueEnum};
use drape_pipeline::{ExternalMask, TryOnConfig};

/// Warp a garment image onto a photograph of a person.
///
/// Body landmarks come from `<body_stem>.landmarks.json` beside the
/// body photo unless `--landmarks` names another file. The result is
/// written to `<body_stem>_warped_tryon.png` unless `--output` is given.
#[derive(Parser)]
#[command(name = "drape", version)]
struct Cli {
    /// Garment photo (PNG with alpha, or any format with `--mask`).
    garment: PathBuf,

    /// Photograph of the person (PNG, JPEG, BMP, WebP).
    body: PathBuf,

    /// Body landmark JSON file.
    #[arg(long)]
    landmarks: Option<PathBuf>,

    /// Grayscale garment mask, same size as the garment photo.
    #[arg(long)]
    mask: Option<PathBuf>,

    /// Morphological cleanup radius applied to `--mask` (0 disables).
    #[arg(long, default_value_t = ExternalMask::DEFAULT_CLEANUP_RADIUS)]
    mask_cleanup_radius: u8,

    /// Where to write the composite PNG.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Warp engine.
    #[arg(long, value_enum, default_value_t = CLI_DEFAULT_ENGINE)]
    engine: Engine,

    /// What to do when the warp cannot be computed.
    #[arg(long, value_enum, default_value_t = OnFailure::Fail)]
    on_warp_failure: OnFailure,

    /// Pixel resampling filter for the warp.
    #[arg(long, value_enum, default_value_t = CLI_DEFAULT_RESAMPLE)]
    resample: Resample,

    /// Garment alpha values above this count as garment.
    #[arg(long, default_value_t = TryOnConfig::DEFAULT_MASK_THRESHOLD)]
    mask_threshold: u8,

    /// Thin-plate spline smoothing (0 interpolates exactly).
    #[arg(long, default_value_t = TryOnConfig::DEFAULT_TPS_REGULARIZATION)]
    tps_regularization: f64,

    /// Garment category.
    #[arg(long, value_enum, default_value_t = Kind::UpperBody)]
    garment_kind: Kind,

    /// Full try-on config as a JSON string.
    ///
    /// When provided, all other config flags are ignored. The JSON must
    /// be a valid `TryOnConfig` serialization; missing fields take their
    /// defaults.
    #[arg(long)]
    config_json: Option<String>,

    /// Print the result record as JSON on stdout.
    #[arg(long)]
    json: bool,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

/// Warp engine selection.
#[derive(Clone, Copy, PartialEq, Eq, Debug, ValueEnum)]
enum Engine {
    /// Delaunay triangles, one affine map each.
    Piecewise,
    /// One smooth thin-plate spline over all anchors.
    Tps,
}

/// Warp failure policy selection.
#[derive(Clone, Copy, PartialEq, Eq, Debug, ValueEnum)]
enum OnFailure {
    /// Stop with an error.
    Fail,
    /// Scale and paste the garment at the shoulders instead.
    Overlay,
}

/// Resampling filter selection.
#[derive(Clone, Copy, PartialEq, Eq, Debug, ValueEnum)]
enum Resample {
    /// Nearest neighbour.
    Nearest,
    /// Bilinear interpolation.
    Bilinear,
}

/// Garment category selection.
#[derive(Clone, Copy, PartialEq, Eq, Debug, ValueEnum)]
enum Kind {
    UpperBody,
    LowerBody,
    Shoes,
}

/// Maps a [`drape_pipeline::WarpEngineKind`] to the local CLI [`Engine`] enum.
const fn engine_from_pipeline(kind: drape_pipeline::WarpEngineKind) -> Engine {
    match kind {
        drape_pipeline::WarpEngineKind::PiecewiseAffine => Engine::Piecewise,
        drape_pipeline::WarpEngineKind::ThinPlateSpline => Engine::Tps,
    }
}

/// Maps a [`drape_pipeline::ResampleFilter`] to the local CLI [`Resample`] enum.
const fn resample_from_pipeline(filter: drape_pipeline::ResampleFilter) -> Resample {
    match filter {
        drape_pipeline::ResampleFilter::Nearest => Resample::Nearest,
        drape_pipeline::ResampleFilter::Bilinear => Resample::Bilinear,
    }
}

const CLI_DEFAULT_ENGINE: Engine = engine_from_pipeline(TryOnConfig::DEFAULT_ENGINE);
const CLI_DEFAULT_RESAMPLE: Resample = resample_from_pipeline(TryOnConfig::DEFAULT_RESAMPLE);

/// Build a [`TryOnConfig`] from CLI arguments.
///
/// If `--config-json` is provided, the JSON is parsed directly and all
/// individual config flags are ignored.
fn config_from_cli(cli: &Cli) -> Result<TryOnConfig, String> {
    if let Some(ref json) = cli.config_json {
        return serde_json::from_str(json).map_err(|e| format!("Error parsing --config-json: {e}"));
    }

    Ok(TryOnConfig {
        engine: match cli.engine {
            Engine::Piecewise => drape_pipeline::WarpEngineKind::PiecewiseAffine,
            Engine::Tps => drape_pipeline::WarpEngineKind::ThinPlateSpline,
        },
        on_warp_failure: match cli.on_warp_failure {
            OnFailure::Fail => drape_pipeline::WarpFailurePolicy::Fail,
            OnFailure::Overlay => drape_pipeline::WarpFailurePolicy::FallbackToSimpleOverlay,
        },
        resample: match cli.resample {
            Resample::Nearest => drape_pipeline::ResampleFilter::Nearest,
            Resample::Bilinear => drape_pipeline::ResampleFilter::Bilinear,
        },
        garment_kind: match cli.garment_kind {
            Kind::UpperBody => drape_pipeline::GarmentKind::UpperBody,
            Kind::LowerBody => drape_pipeline::GarmentKind::LowerBody,
            Kind::Shoes => drape_pipeline::GarmentKind::Shoes,
        },
        mask_threshold: cli.mask_threshold,
        tps_regularization: cli.tps_regularization,
        ..TryOnConfig::default()
    })
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = match config_from_cli(&cli) {
        Ok(c) => c,
        Err(msg) => {
            eprintln!("{msg}");
            return ExitCode::FAILURE;
        }
    };
    log::debug!("config: {config:?}");

    let request = drape_io::TryOnRequest {
        garment: cli.garment,
        body: cli.body,
        landmarks: cli.landmarks,
        mask: cli.mask,
        mask_cleanup_radius: cli.mask_cleanup_radius,
        output: cli.output,
        config,
    };

    let result = match drape_io::run(&request) {
        Ok(result) => result,
        Err(e) => {
            eprintln!("Error: {e}");
            return ExitCode::FAILURE;
        }
    };

    if cli.json {
        match serde_json::to_string_pretty(&result) {
            Ok(json) => println!("{json}"),
            Err(e) => {
                eprintln!("Error serializing result: {e}");
                return ExitCode::FAILURE;
            }
        }
    } else {
        eprintln!(
            "Result written to {} ({} anchors matched{})",
            result.result_path.display(),
            result.report.matched_keypoint_count,
            if result.report.overlay.is_some() {
                ", simple overlay"
            } else {
                ""
            },
        );
    }

    ExitCode::SUCCESS
}
