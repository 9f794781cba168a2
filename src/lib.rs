//! # Overview
//!
//! Finds bottles in an image with a [YOLOv8](https://github.com/ultralytics/ultralytics)
//! model exported to ONNX and run through onnxruntime (bindings via [ort](https://github.com/pykeio/ort)),
//! draws the detections onto a copy of the image and reports them as JSON.
//!
//! ```no_run
//! use bottle_detect::{pipeline, Config};
//!
//! let config = Config::new().model_path("./controllers/best.onnx");
//! let report = pipeline::run(&config, "bottles.jpg".as_ref())?;
//! println!("{}", bottle_detect::report::detections_json(&report.detections)?);
//! # Ok::<(), bottle_detect::Error>(())
//! ```

pub mod annotate;
mod config;
mod detection;
mod error;
pub mod models;
pub mod pipeline;
pub mod report;
mod utils;

pub use config::Config;
pub use detection::Detection;
pub use error::{Error, ErrorKind, Result};

// re-exports
pub use geo_types;
pub use image;
pub use ort;
