use std::path::PathBuf;

use crate::{annotate::AnnotationStyle, models::YOLOModel};

/// Everything the pipeline needs besides the image itself.
#[derive(Debug, Clone)]
pub struct Config {
    pub model_path: PathBuf,
    pub output_path: PathBuf,
    /// Overrides the class names stored in the model.
    pub labels_path: Option<PathBuf>,
    pub input_size: u32,
    pub confidence_threshold: f32,
    pub iou_threshold: f32,
    pub max_detections: usize,
    /// onnxruntime intra-op threads; onnxruntime picks when unset.
    pub threads: Option<usize>,
    pub style: AnnotationStyle,
}

impl Config {
    pub const DEFAULT_MODEL_PATH: &'static str = "./controllers/best.onnx";
    pub const DEFAULT_OUTPUT_PATH: &'static str = "output_image_with_boxes.jpg";

    pub fn new() -> Self {
        Self::default()
    }

    pub fn model_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.model_path = path.into();
        self
    }

    pub fn output_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_path = path.into();
        self
    }

    pub fn labels_path(mut self, path: Option<PathBuf>) -> Self {
        self.labels_path = path;
        self
    }

    pub fn input_size(mut self, size: u32) -> Self {
        self.input_size = size;
        self
    }

    pub fn confidence_threshold(mut self, threshold: f32) -> Self {
        self.confidence_threshold = threshold;
        self
    }

    pub fn iou_threshold(mut self, threshold: f32) -> Self {
        self.iou_threshold = threshold;
        self
    }

    pub fn max_detections(mut self, max_detections: usize) -> Self {
        self.max_detections = max_detections;
        self
    }

    pub fn threads(mut self, threads: Option<usize>) -> Self {
        self.threads = threads;
        self
    }

    pub fn style(mut self, style: AnnotationStyle) -> Self {
        self.style = style;
        self
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            model_path: Self::DEFAULT_MODEL_PATH.into(),
            output_path: Self::DEFAULT_OUTPUT_PATH.into(),
            labels_path: None,
            input_size: YOLOModel::DEFAULT_INPUT_SIZE,
            confidence_threshold: YOLOModel::DEFAULT_CONFIDENCE_THRESHOLD,
            iou_threshold: YOLOModel::DEFAULT_IOU_THRESHOLD,
            max_detections: YOLOModel::DEFAULT_MAX_DETECTIONS,
            threads: None,
            style: AnnotationStyle::default(),
        }
    }
}
