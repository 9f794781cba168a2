//! Class-name tables.

use std::path::Path;

use crate::Result;

/// Label used for class indices missing from the table.
pub const UNKNOWN_LABEL: &str = "Unknown";

/// Parses the `names` metadata entry written by Ultralytics ONNX exports,
/// e.g. `{0: 'bottle', 1: 'can'}`. Malformed entries are skipped.
pub fn parse_names_metadata(raw: &str) -> Vec<(i64, String)> {
    let body = raw.trim().trim_start_matches('{').trim_end_matches('}');
    let mut chars = body.chars().peekable();
    let mut label_map = vec![];

    loop {
        let key: String = chars
            .by_ref()
            .skip_while(|c| c.is_whitespace() || *c == ',')
            .take_while(|c| *c != ':')
            .collect();
        if key.is_empty() {
            break;
        }

        while chars.peek().is_some_and(|c| c.is_whitespace()) {
            chars.next();
        }
        let Some(quote) = chars.next_if(|c| *c == '\'' || *c == '"') else {
            tracing::warn!(entry = %key, "skipping unquoted class name in model metadata");
            chars.by_ref().take_while(|c| *c != ',').for_each(drop);
            continue;
        };
        let name: String = chars.by_ref().take_while(|c| *c != quote).collect();

        match key.trim().parse::<i64>() {
            Ok(id) => label_map.push((id, name)),
            Err(_) => tracing::warn!(entry = %key, "skipping non-numeric class id in model metadata"),
        }
    }

    label_map
}

/// Reads a label file holding one class name per line; line `n` is class `n`.
pub fn read_label_file(path: impl AsRef<Path>) -> Result<Vec<(i64, String)>> {
    let contents = std::fs::read_to_string(path)?;
    Ok(contents
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .enumerate()
        .map(|(i, l)| (i as i64, l.to_string()))
        .collect())
}

/// Looks up a class name, falling back to [`UNKNOWN_LABEL`].
pub fn label_for(label_map: &[(i64, String)], label_id: i64) -> &str {
    label_map
        .iter()
        .find(|(l_i, _)| *l_i == label_id)
        .map(|(_, l)| l.as_str())
        .unwrap_or(UNKNOWN_LABEL)
}
