use std::path::Path;

use image::imageops;
use itertools::Itertools;
use ndarray::{s, Array, Array1, Array2, ArrayBase, ArrayViewD, Axis, Dim, Ix2, OwnedRepr};
use ort::{Session, SessionBuilder};

pub use crate::error::{Error, Result};
use crate::{
    models::labels::{label_for, parse_names_metadata},
    utils, Detection,
};

/// Offset added per class index so that boxes of different classes never overlap during NMS.
const MAX_WH: f32 = 7680.0;
const PAD_VALUE: f32 = 114.0 / 255.0;

/// A [`YOLOv8`](https://github.com/ultralytics/ultralytics)-style detector exported to ONNX.
pub struct YOLOModel {
    model_name: String,
    model: Session,
    label_map: Vec<(i64, String)>,
    input_width: u32,
    input_height: u32,
    fixed_input: bool,
    confidence_threshold: f32,
    iou_threshold: f32,
    max_detections: usize,
}

/// A decoded box before non-maximum suppression.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Candidate {
    /** [x1, y1, x2, y2] in source image pixels */
    pub xyxy: [f32; 4],
    pub score: f32,
    pub class_id: usize,
}

impl YOLOModel {
    /// Input side used when the model does not declare a static input shape.
    pub const DEFAULT_INPUT_SIZE: u32 = 640;
    pub const DEFAULT_CONFIDENCE_THRESHOLD: f32 = 0.25;
    pub const DEFAULT_IOU_THRESHOLD: f32 = 0.7;
    pub const DEFAULT_MAX_DETECTIONS: usize = 300;

    /// Construct a [`YOLOModel`] from a model file.
    ///
    /// Class names come from `label_map` when given, otherwise from the `names`
    /// entry of the model metadata.
    pub fn new_from_file(
        file_path: impl AsRef<Path>,
        label_map: Option<Vec<(i64, String)>>,
        session_builder: SessionBuilder,
    ) -> Result<Self> {
        let file_path = file_path.as_ref();
        if !file_path.exists() {
            return Err(Error::ModelNotFound(file_path.to_path_buf()));
        }

        let model = session_builder.commit_from_file(file_path)?;

        let label_map = match label_map {
            Some(label_map) => label_map,
            None => match model.metadata()?.custom("names")? {
                Some(names) => parse_names_metadata(&names),
                None => {
                    tracing::warn!("model has no `names` metadata, every class will be labelled Unknown");
                    vec![]
                }
            },
        };

        let static_dims = model
            .inputs
            .first()
            .and_then(|input| input.input_type.tensor_dimensions())
            .filter(|dims| dims.len() == 4 && dims[2] > 0 && dims[3] > 0)
            .map(|dims| (dims[3] as u32, dims[2] as u32));
        let (input_width, input_height) =
            static_dims.unwrap_or((Self::DEFAULT_INPUT_SIZE, Self::DEFAULT_INPUT_SIZE));

        let model_name = file_path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();

        tracing::debug!(
            model = %model_name,
            classes = label_map.len(),
            input_width,
            input_height,
            "loaded model"
        );

        Ok(Self {
            model_name,
            model,
            label_map,
            input_width,
            input_height,
            fixed_input: static_dims.is_some(),
            confidence_threshold: Self::DEFAULT_CONFIDENCE_THRESHOLD,
            iou_threshold: Self::DEFAULT_IOU_THRESHOLD,
            max_detections: Self::DEFAULT_MAX_DETECTIONS,
        })
    }

    /// Square input side for models with dynamic input shapes. Ignored when the
    /// model declares its own.
    pub fn with_input_size(mut self, size: u32) -> Self {
        if !self.fixed_input {
            self.input_width = size;
            self.input_height = size;
        }
        self
    }

    pub fn with_confidence_threshold(mut self, threshold: f32) -> Self {
        self.confidence_threshold = threshold;
        self
    }

    pub fn with_iou_threshold(mut self, threshold: f32) -> Self {
        self.iou_threshold = threshold;
        self
    }

    pub fn with_max_detections(mut self, max_detections: usize) -> Self {
        self.max_detections = max_detections;
        self
    }

    /// Predict [`Detection`]s from the image provided, highest confidence first.
    pub fn predict(&self, img: &image::DynamicImage) -> Result<Vec<Detection>> {
        let (input, placement) = letterbox(img, self.input_width, self.input_height);

        let input_name = &self.model.inputs[0].name;
        let outputs = self.model.run(ort::inputs![input_name => input]?)?;

        if outputs.is_empty() {
            tracing::warn!(model = %self.model_name, "model produced no outputs, no detections found");
            return Ok(vec![]);
        }
        let output = outputs[0].try_extract_tensor::<f32>()?;

        let Some(candidates) = decode_predictions(
            output.view(),
            placement,
            (img.width(), img.height()),
            self.confidence_threshold,
        ) else {
            tracing::warn!(
                model = %self.model_name,
                shape = ?output.shape(),
                "unrecognized output layout, no detections found"
            );
            return Ok(vec![]);
        };

        let detections: Vec<Detection> =
            non_max_suppression(candidates, self.iou_threshold, self.max_detections)
                .into_iter()
                .map(|c| {
                    let [x1, y1, x2, y2] = c.xyxy;
                    let class_id = c.class_id as i64;
                    Detection::new(
                        x1,
                        y1,
                        x2,
                        y2,
                        label_for(&self.label_map, class_id),
                        class_id,
                        c.score,
                    )
                })
                .collect();

        tracing::debug!(model = %self.model_name, count = detections.len(), "inference done");

        Ok(detections)
    }
}

/// Where the source image sits inside the model input.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Letterbox {
    pub ratio: f32,
    pub pad_x: f32,
    pub pad_y: f32,
}

/// Resizes `img` to fit `width x height` keeping its aspect ratio, centers it on
/// a gray canvas and returns the `[1, 3, height, width]` RGB tensor in `[0, 1]`.
pub(crate) fn letterbox(
    img: &image::DynamicImage,
    width: u32,
    height: u32,
) -> (ArrayBase<OwnedRepr<f32>, Dim<[usize; 4]>>, Letterbox) {
    let (img_width, img_height) = (img.width(), img.height());

    let mut padded_img: ArrayBase<OwnedRepr<f32>, Dim<[usize; 4]>> =
        Array::from_elem((1, 3, height as usize, width as usize), PAD_VALUE);

    let r: f64 = f64::min(
        height as f64 / img_height as f64,
        width as f64 / img_width as f64,
    );

    let new_width = ((img_width as f64 * r) as u32).clamp(1, width);
    let new_height = ((img_height as f64 * r) as u32).clamp(1, height);
    let (pad_x, pad_y) = ((width - new_width) / 2, (height - new_height) / 2);

    let resized_img = img.resize_exact(new_width, new_height, imageops::FilterType::Triangle);

    for pixel in resized_img.into_rgb8().enumerate_pixels() {
        let x = (pixel.0 + pad_x) as usize;
        let y = (pixel.1 + pad_y) as usize;
        let [r, g, b] = pixel.2 .0;
        padded_img[[0, 0, y, x]] = r as f32 / 255.0;
        padded_img[[0, 1, y, x]] = g as f32 / 255.0;
        padded_img[[0, 2, y, x]] = b as f32 / 255.0;
    }

    (
        padded_img,
        Letterbox {
            ratio: r as f32,
            pad_x: pad_x as f32,
            pad_y: pad_y as f32,
        },
    )
}

/// Turns a `[1, 4 + classes, candidates]` prediction tensor into boxes in source
/// image coordinates, undoing `placement`. Returns `None` when the tensor does
/// not have that layout.
pub(crate) fn decode_predictions(
    output: ArrayViewD<f32>,
    placement: Letterbox,
    (img_width, img_height): (u32, u32),
    score_thr: f32,
) -> Option<Vec<Candidate>> {
    if output.ndim() != 3 || output.shape()[0] == 0 {
        return None;
    }

    let predictions = output
        .index_axis(Axis(0), 0)
        .into_dimensionality::<Ix2>()
        .ok()?;
    if predictions.shape()[0] < 5 {
        return None;
    }

    let Letterbox {
        ratio,
        pad_x,
        pad_y,
    } = placement;
    let (max_x, max_y) = (img_width as f32, img_height as f32);
    let mut candidates = vec![];

    for column in predictions.axis_iter(Axis(1)) {
        let class_scores = column.slice(s![4..]);
        let Some(class_id) = class_scores.iter().copied().position_max_by(|a, b| a.total_cmp(b)) else {
            continue;
        };
        let score = class_scores[class_id];
        if !(score > score_thr) {
            continue;
        }

        let (cx, cy, w, h) = (column[0], column[1], column[2], column[3]);
        let x1 = ((cx - w / 2.0 - pad_x) / ratio).clamp(0.0, max_x);
        let y1 = ((cy - h / 2.0 - pad_y) / ratio).clamp(0.0, max_y);
        let x2 = ((cx + w / 2.0 - pad_x) / ratio).clamp(0.0, max_x);
        let y2 = ((cy + h / 2.0 - pad_y) / ratio).clamp(0.0, max_y);
        if !(x2 > x1 && y2 > y1) {
            continue;
        }

        candidates.push(Candidate {
            xyxy: [x1, y1, x2, y2],
            score,
            class_id,
        });
    }

    Some(candidates)
}

/// Class-aware NMS. Survivors come back sorted by descending score.
pub(crate) fn non_max_suppression(
    candidates: Vec<Candidate>,
    nms_thr: f32,
    max_detections: usize,
) -> Vec<Candidate> {
    if candidates.is_empty() {
        return candidates;
    }

    let boxes = Array2::from_shape_fn((candidates.len(), 4), |(i, j)| {
        candidates[i].xyxy[j] + candidates[i].class_id as f32 * MAX_WH
    });
    let scores = Array1::from_iter(candidates.iter().map(|c| c.score));

    nms(&boxes, &scores, nms_thr)
        .into_iter()
        .take(max_detections)
        .map(|i| candidates[i].clone())
        .collect()
}

fn nms(
    boxes: &Array<f32, Dim<[usize; 2]>>,
    scores: &Array<f32, Dim<[usize; 1]>>,
    nms_thr: f32,
) -> Vec<usize> {
    let x1 = boxes.slice(s![.., 0]);
    let y1 = boxes.slice(s![.., 1]);
    let x2 = boxes.slice(s![.., 2]);
    let y2 = boxes.slice(s![.., 3]);

    let areas = (&x2 - &x1) * (&y2 - &y1);
    let mut order = {
        let mut o = utils::argsort_by(scores, |a, b| a.total_cmp(b));
        o.reverse();
        o
    };

    let mut keep = vec![];

    while !order.is_empty() {
        let i = order[0];
        keep.push(i);

        order = order
            .iter()
            .skip(1)
            .copied()
            .filter(|&j| {
                let w = f32::max(0.0, f32::min(x2[i], x2[j]) - f32::max(x1[i], x1[j]));
                let h = f32::max(0.0, f32::min(y2[i], y2[j]) - f32::max(y1[i], y1[j]));
                let inter = w * h;
                inter / (areas[i] + areas[j] - inter) <= nms_thr
            })
            .collect();
    }

    keep
}
