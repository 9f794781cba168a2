use std::{ffi::OsString, path::PathBuf, process::ExitCode};

use bottle_detect::{
    annotate::{AnnotationStyle, MAX_STROKE},
    pipeline, report, Config, Error, Result,
};
use clap::{error::ErrorKind as ClapErrorKind, Parser};
use tracing_subscriber::EnvFilter;

/// Detects bottles in an image, saves an annotated copy and prints the
/// detections as JSON.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Image to run detection on.
    #[arg(allow_hyphen_values = true)]
    image: Option<PathBuf>,

    /// Anything after the image path is ignored.
    #[arg(hide = true, trailing_var_arg = true, allow_hyphen_values = true)]
    _rest: Vec<OsString>,

    /// ONNX model file.
    #[arg(long, default_value = Config::DEFAULT_MODEL_PATH)]
    model: PathBuf,

    /// Where the annotated image is written; the extension picks the format.
    #[arg(long, default_value = Config::DEFAULT_OUTPUT_PATH)]
    output: PathBuf,

    /// Class names, one per line, replacing the names stored in the model.
    #[arg(long)]
    labels: Option<PathBuf>,

    /// Minimum confidence for a detection.
    #[arg(long, default_value_t = 0.25)]
    conf: f32,

    /// IoU threshold for non-maximum suppression.
    #[arg(long, default_value_t = 0.7)]
    iou: f32,

    #[arg(long, default_value_t = 300)]
    max_det: usize,

    /// Input size for models without a fixed input shape.
    #[arg(long, default_value_t = 640)]
    imgsz: u32,

    /// onnxruntime intra-op threads.
    #[arg(long)]
    threads: Option<usize>,

    /// Box line thickness in pixels.
    #[arg(long, default_value_t = 2, value_parser = clap::value_parser!(u32).range(1..=MAX_STROKE as i64))]
    thickness: u32,

    /// Label glyph magnification.
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..=MAX_STROKE as i64))]
    font_scale: u32,
}

impl Args {
    fn config(&self) -> Config {
        Config::new()
            .model_path(&self.model)
            .output_path(&self.output)
            .labels_path(self.labels.clone())
            .input_size(self.imgsz)
            .confidence_threshold(self.conf)
            .iou_threshold(self.iou)
            .max_detections(self.max_det)
            .threads(self.threads)
            .style(AnnotationStyle {
                thickness: self.thickness,
                font_scale: self.font_scale,
                ..Default::default()
            })
    }
}

/// First line of a clap error without its `error: ` prefix.
fn usage_message(err: &clap::Error) -> String {
    let rendered = err.to_string();
    let line = rendered.lines().next().unwrap_or_default();
    line.strip_prefix("error: ").unwrap_or(line).to_string()
}

fn execute(args: Args) -> Result<String> {
    let image_path = pipeline::validate_image_path(args.image.clone())?;
    let config = args.config();
    let report = pipeline::run(&config, &image_path)?;
    report::detections_json(&report.detections)
}

fn main() -> ExitCode {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(err) if matches!(err.kind(), ClapErrorKind::DisplayHelp | ClapErrorKind::DisplayVersion) => {
            err.exit()
        }
        Err(err) => {
            println!("{}", report::error_json(&Error::Usage(usage_message(&err))));
            return ExitCode::FAILURE;
        }
    };

    // stdout carries the JSON result, logs go to stderr
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    match execute(args) {
        Ok(json) => {
            println!("{json}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            tracing::debug!(kind = ?err.kind(), "{err}");
            println!("{}", report::error_json(&err));
            ExitCode::FAILURE
        }
    }
}
