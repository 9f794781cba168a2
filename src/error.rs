use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("{0}")]
    Usage(String),
    #[error("No image path provided")]
    NoImagePath,
    #[error("Image file not found: {}", .0.display())]
    ImageNotFound(PathBuf),
    #[error("Model file not found at {}", .0.display())]
    ModelNotFound(PathBuf),
    #[error("ort (onnxruntime) error: {0}")]
    Ort(#[from] ort::Error),
    #[error("image: {0}")]
    Image(#[from] image::ImageError),
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
    #[error("json: {0}")]
    Json(#[from] serde_json::Error),
}

/// Whether an error was raised before any model work or while processing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Precondition,
    Processing,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Usage(_)
            | Error::NoImagePath
            | Error::ImageNotFound(_)
            | Error::ModelNotFound(_) => {
                ErrorKind::Precondition
            }
            _ => ErrorKind::Processing,
        }
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn precondition_messages() {
        assert_eq!(Error::NoImagePath.to_string(), "No image path provided");
        assert_eq!(
            Error::ImageNotFound("missing.jpg".into()).to_string(),
            "Image file not found: missing.jpg"
        );
        assert_eq!(
            Error::ModelNotFound("./controllers/best.onnx".into()).to_string(),
            "Model file not found at ./controllers/best.onnx"
        );
    }

    #[test]
    fn kinds() {
        assert_eq!(Error::NoImagePath.kind(), ErrorKind::Precondition);
        assert_eq!(
            Error::Usage("invalid value 'abc' for '--conf <CONF>'".into()).kind(),
            ErrorKind::Precondition
        );
        assert_eq!(
            Error::ModelNotFound("m.onnx".into()).kind(),
            ErrorKind::Precondition
        );
        let io = Error::from(std::io::Error::new(std::io::ErrorKind::Other, "boom"));
        assert_eq!(io.kind(), ErrorKind::Processing);
    }
}
