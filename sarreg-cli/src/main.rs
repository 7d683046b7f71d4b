use clap::Parser;
use sarreg::image::io::{load_raster, load_rgb, save_display};
use sarreg::{
    register, Compression, Determinism, NormalizeConfig, NormalizedMatch, PrecomputedMatcher,
    RangeSelector, RansacConfig, RegistrationConfig, RegistrationOutput, SharpenConfig,
};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

const SCHEMA_JSON: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/config.schema.json"));
const EXAMPLE_JSON: &str =
    include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/config.example.json"));

#[derive(Parser, Debug)]
#[command(author, version, about = "SAR-to-optical registration (JSON config driven)")]
struct Cli {
    /// Path to the JSON configuration file.
    #[arg(short, long, value_name = "FILE", default_value = "config.json")]
    config: PathBuf,
    /// Print the JSON schema and exit.
    #[arg(long)]
    print_schema: bool,
    /// Print an example config and exit.
    #[arg(long)]
    print_example: bool,
    /// Enable tracing output for per-stage timings and counts.
    #[arg(long)]
    trace: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct PathsJson {
    optical_image: String,
    sar_image: String,
    matches: String,
    output_dir: String,
}

#[derive(Clone, Copy, Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
enum CompressionJson {
    Decibel,
    Linear,
}

impl From<CompressionJson> for Compression {
    fn from(value: CompressionJson) -> Self {
        match value {
            CompressionJson::Decibel => Compression::Decibel,
            CompressionJson::Linear => Compression::Linear,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct SharpenJson {
    sigma: f32,
    strength: f32,
}

impl Default for SharpenJson {
    fn default() -> Self {
        let cfg = SharpenConfig::default();
        Self {
            sigma: cfg.sigma,
            strength: cfg.strength,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct RansacJson {
    reproj_threshold: f64,
    max_iterations: usize,
}

impl Default for RansacJson {
    fn default() -> Self {
        let cfg = RansacConfig::default();
        Self {
            reproj_threshold: cfg.reprojection_threshold,
            max_iterations: cfg.max_iterations,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct VisualizationJson {
    max_inliers: usize,
    overlay_alpha: f32,
}

impl Default for VisualizationJson {
    fn default() -> Self {
        let cfg = RegistrationConfig::default();
        Self {
            max_inliers: cfg.max_shown,
            overlay_alpha: cfg.overlay_alpha,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct ProcessingJson {
    seed: u64,
    flip_horizontal: bool,
    sar_compression: CompressionJson,
    sar_percentiles: [f64; 2],
    optical_sharpen: SharpenJson,
    num_matches: usize,
    ransac: RansacJson,
    visualization: VisualizationJson,
}

impl Default for ProcessingJson {
    fn default() -> Self {
        Self {
            seed: Determinism::default().seed(),
            flip_horizontal: true,
            sar_compression: CompressionJson::Decibel,
            sar_percentiles: [2.0, 98.0],
            optical_sharpen: SharpenJson::default(),
            num_matches: RegistrationConfig::default().sample_count,
            ransac: RansacJson::default(),
            visualization: VisualizationJson::default(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Config {
    paths: PathsJson,
    processing: ProcessingJson,
}

impl ProcessingJson {
    fn to_registration_config(&self) -> RegistrationConfig {
        let [low, high] = self.sar_percentiles;
        RegistrationConfig {
            normalize: NormalizeConfig {
                compression: self.sar_compression.into(),
                range: RangeSelector::Percentiles { low, high },
            },
            sharpen: SharpenConfig {
                sigma: self.optical_sharpen.sigma,
                strength: self.optical_sharpen.strength,
            },
            sample_count: self.num_matches,
            ransac: RansacConfig {
                reprojection_threshold: self.ransac.reproj_threshold,
                max_iterations: self.ransac.max_iterations,
                seed: self.seed,
            },
            max_shown: self.visualization.max_inliers,
            overlay_alpha: self.visualization.overlay_alpha,
            ..RegistrationConfig::default()
        }
    }
}

/// One correspondence in normalized `[-1, 1]` coordinates.
#[derive(Debug, Deserialize)]
struct MatchJson {
    source: [f32; 2],
    target: [f32; 2],
}

impl From<MatchJson> for NormalizedMatch {
    fn from(value: MatchJson) -> Self {
        Self {
            source: value.source,
            target: value.target,
        }
    }
}

#[derive(Debug, Serialize)]
struct Report {
    total_matches: usize,
    valid_matches: usize,
    inliers: usize,
    inlier_ratio: f64,
    mean_inlier_error: f64,
    refined: bool,
    homography: [f64; 9],
}

impl From<&RegistrationOutput> for Report {
    fn from(out: &RegistrationOutput) -> Self {
        Self {
            total_matches: out.report.total_matches,
            valid_matches: out.report.valid_matches,
            inliers: out.report.inliers,
            inlier_ratio: out.report.inlier_ratio,
            mean_inlier_error: out.estimate.mean_inlier_error,
            refined: out.estimate.refined,
            homography: out.estimate.homography.to_row_major(),
        }
    }
}

fn load_matches(path: &Path) -> Result<PrecomputedMatcher, Box<dyn std::error::Error>> {
    let text = fs::read_to_string(path)
        .map_err(|err| format!("failed to read matches {}: {err}", path.display()))?;
    let records: Vec<MatchJson> = serde_json::from_str(&text)?;
    Ok(PrecomputedMatcher::new(
        records.into_iter().map(NormalizedMatch::from).collect(),
    ))
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    if cli.trace {
        tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::from_default_env()
                    .add_directive("sarreg=info".parse()?)
                    .add_directive("sarreg_cli=info".parse()?),
            )
            .with_target(false)
            .init();
    }

    if cli.print_schema {
        println!("{SCHEMA_JSON}");
        return Ok(());
    }
    if cli.print_example {
        println!("{EXAMPLE_JSON}");
        return Ok(());
    }

    let config_text = fs::read_to_string(&cli.config)?;
    let config: Config = serde_json::from_str(&config_text)?;
    let paths = &config.paths;
    if paths.optical_image.is_empty() || paths.sar_image.is_empty() || paths.matches.is_empty() {
        return Err("paths.optical_image, paths.sar_image and paths.matches must be set".into());
    }
    let output_dir = if paths.output_dir.is_empty() {
        PathBuf::from(".")
    } else {
        PathBuf::from(&paths.output_dir)
    };

    let reg_cfg = config.processing.to_registration_config();
    reg_cfg.validate()?;
    let determinism = Determinism::initialize(config.processing.seed);

    let optical = load_rgb(&paths.optical_image)?;
    let mut radar = load_raster(&paths.sar_image)?;
    if config.processing.flip_horizontal {
        radar = radar.flipped_horizontal();
    }
    let matcher = load_matches(Path::new(&paths.matches))?;

    let output = register(&radar, &optical, &matcher, &reg_cfg, &determinism)?;

    fs::create_dir_all(&output_dir)?;
    let artifacts = [
        ("sar_display.png", &output.radar_display),
        ("optical_enhanced.png", &output.optical_display),
        ("matches_inliers.png", &output.matches_image),
        ("fused_overlay.png", &output.overlay),
    ];
    for (name, img) in artifacts {
        let path = output_dir.join(name);
        save_display(img, &path)?;
        tracing::info!(path = %path.display(), "artifact written");
    }

    let json = serde_json::to_string_pretty(&Report::from(&output))?;
    fs::write(output_dir.join("report.json"), &json)?;
    println!("{json}");

    Ok(())
}
