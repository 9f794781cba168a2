//! JSON printed on standard output.
//!
//! Separators are `", "` and `": "`, so an error reads
//! `{"error": "No image path provided"}`.

use std::io;

use serde::Serialize;
use serde_json::ser::Formatter;

use crate::{Detection, Error, Result};

struct SpacedFormatter;

impl Formatter for SpacedFormatter {
    fn begin_array_value<W: ?Sized + io::Write>(&mut self, writer: &mut W, first: bool) -> io::Result<()> {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_key<W: ?Sized + io::Write>(&mut self, writer: &mut W, first: bool) -> io::Result<()> {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_value<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        writer.write_all(b": ")
    }
}

pub fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    let mut buf = Vec::new();
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, SpacedFormatter);
    value.serialize(&mut ser)?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

pub fn detections_json(detections: &[Detection]) -> Result<String> {
    to_json(detections)
}

#[derive(Serialize)]
struct ErrorReport<'a> {
    error: &'a str,
}

pub fn error_json(err: &Error) -> String {
    let message = err.to_string();
    to_json(&ErrorReport { error: &message })
        .unwrap_or_else(|_| r#"{"error": "unreportable error"}"#.to_string())
}
