//! Validate -> load -> infer -> annotate -> write.

use std::path::{Path, PathBuf};

use image::DynamicImage;
use ort::Session;

use crate::{
    annotate::annotate,
    models::{labels::read_label_file, YOLOModel},
    Config, Detection, Error, Result,
};

/// Anything that can find objects in an image.
pub trait Detect {
    fn detect(&self, img: &DynamicImage) -> Result<Vec<Detection>>;
}

impl Detect for YOLOModel {
    fn detect(&self, img: &DynamicImage) -> Result<Vec<Detection>> {
        self.predict(img)
    }
}

/// Outcome of a successful run.
#[derive(Debug)]
pub struct Report {
    pub detections: Vec<Detection>,
    /// Rectangles drawn on the saved image; always `detections.len()`.
    pub rectangles: usize,
    pub output_path: PathBuf,
}

/// Checks that an image path was given and that it exists. Nothing else about
/// the file is inspected.
pub fn validate_image_path(arg: Option<PathBuf>) -> Result<PathBuf> {
    let path = arg.ok_or(Error::NoImagePath)?;
    if !path.exists() {
        return Err(Error::ImageNotFound(path));
    }
    Ok(path)
}

pub fn load_model(config: &Config) -> Result<YOLOModel> {
    if !config.model_path.exists() {
        return Err(Error::ModelNotFound(config.model_path.clone()));
    }

    let label_map = config
        .labels_path
        .as_ref()
        .map(read_label_file)
        .transpose()?;

    let mut session_builder = Session::builder()?;
    if let Some(threads) = config.threads {
        session_builder = session_builder.with_intra_threads(threads)?;
    }
    #[cfg(feature = "cuda")]
    {
        session_builder = session_builder
            .with_execution_providers([ort::CUDAExecutionProvider::default().build()])?;
    }

    Ok(YOLOModel::new_from_file(&config.model_path, label_map, session_builder)?
        .with_input_size(config.input_size)
        .with_confidence_threshold(config.confidence_threshold)
        .with_iou_threshold(config.iou_threshold)
        .with_max_detections(config.max_detections))
}

/// Runs the whole pipeline with the model named in `config`.
pub fn run(config: &Config, image_path: &Path) -> Result<Report> {
    let model = load_model(config)?;
    run_with(&model, config, image_path)
}

/// Runs inference, annotation and writing with an already loaded detector.
pub fn run_with<D: Detect>(detector: &D, config: &Config, image_path: &Path) -> Result<Report> {
    let img = image::open(image_path)?;

    let detections = detector.detect(&img)?;
    tracing::info!(image = %image_path.display(), count = detections.len(), "detection finished");

    let annotated = annotate(&img, &detections, &config.style);
    annotated.image.save(&config.output_path)?;
    tracing::info!(
        "Image with bounding boxes saved as {}",
        config.output_path.display()
    );

    Ok(Report {
        detections,
        rectangles: annotated.rectangles,
        output_path: config.output_path.clone(),
    })
}
