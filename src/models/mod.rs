//! Implemented detection models.

pub mod labels;
mod yolo;

pub use yolo::YOLOModel;
