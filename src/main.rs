use clap::Parser;
use mask2bez::bitmap::{load_and_threshold, Crop};
use mask2bez::output::svg;
use mask2bez::{Degree, ThresholdMethod, TraceError, TracingConfig};
use std::path::PathBuf;
use std::time::Instant;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "mask2bez", about = "Trace a bitmap selection into bezier outlines (SVG)")]
struct Cli {
    /// Input image path (PNG, JPEG, BMP)
    #[arg(short, long)]
    input: PathBuf,

    /// Output SVG path
    #[arg(short, long)]
    output: PathBuf,

    /// Fixed brightness threshold (0-255). Overrides Otsu auto-detection.
    #[arg(long)]
    threshold: Option<u8>,

    /// Select light pixels instead of dark ones
    #[arg(long)]
    invert: bool,

    /// JSON file holding a saved TracingConfig; flags below override it
    #[arg(long)]
    preset: Option<PathBuf>,

    /// Corner angle threshold in degrees (180 = straight)
    #[arg(long)]
    corner_threshold: Option<f64>,

    /// Largest accepted distance (pixels) between outline and curve
    #[arg(long)]
    error_threshold: Option<f64>,

    /// Smoothing passes per curve
    #[arg(long)]
    filter_iterations: Option<usize>,

    /// Snap endpoints that are at most this far off an axis
    #[arg(long)]
    align_threshold: Option<f64>,

    /// Keep one-pixel staircase knees
    #[arg(long)]
    keep_knees: bool,
}

impl Cli {
    fn config(&self) -> Result<TracingConfig, TraceError> {
        let mut config = match &self.preset {
            Some(path) => serde_json::from_str(&std::fs::read_to_string(path)?)?,
            None => TracingConfig::default(),
        };
        if let Some(v) = self.corner_threshold {
            config.corner_threshold = v;
        }
        if let Some(v) = self.error_threshold {
            config.error_threshold = v;
        }
        if let Some(v) = self.filter_iterations {
            config.filter_iteration_count = v;
        }
        if let Some(v) = self.align_threshold {
            config.align_threshold = v;
        }
        if self.keep_knees {
            config.keep_knees = true;
        }
        config.validate()?;
        Ok(config)
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = cli.config()?;
    let t_start = Instant::now();

    eprintln!();
    eprintln!("  mask2bez \u{00b7} {}", cli.input.display());
    eprintln!();

    // ── Load & threshold ──────────────────────────────────
    let method = match cli.threshold {
        Some(t) => ThresholdMethod::Fixed(t),
        None => ThresholdMethod::Otsu,
    };
    let gray = load_and_threshold(&cli.input, method, cli.invert)?;
    let (w, h) = gray.dimensions();
    let threshold_name = match method {
        ThresholdMethod::Otsu => "Otsu".to_string(),
        ThresholdMethod::Fixed(t) => format!("fixed {}", t),
    };
    eprintln!("  Load        {}x{} px, {} threshold", w, h, threshold_name);

    // ── Crop to selection ─────────────────────────────────
    let crop = Crop::to_selection(&gray).ok_or(TraceError::EmptyMask)?;
    let bounds = crop.bounds();
    eprintln!(
        "  Select      {}x{} px at ({}, {})",
        bounds.width(),
        bounds.height(),
        bounds.min_col,
        bounds.min_row,
    );

    // ── Trace ─────────────────────────────────────────────
    let lists = mask2bez::trace_mask(&crop, &config)?;
    let holes = lists.iter().filter(|l| l.clockwise).count();
    let count = |degree| lists.iter().map(|l| l.count(degree)).sum::<usize>();
    eprintln!(
        "  Trace       {} outlines ({} outer, {} holes) \u{2192} {} curves + {} lines",
        lists.len(),
        lists.len() - holes,
        holes,
        count(Degree::Cubic),
        count(Degree::Linear),
    );

    // ── Write ─────────────────────────────────────────────
    std::fs::write(&cli.output, svg::document(&lists, bounds, w, h))?;
    eprintln!("  Result      ({}ms)", t_start.elapsed().as_millis());

    eprintln!();
    eprintln!("  \u{2713} {}", cli.output.display());
    eprintln!();

    Ok(())
}
