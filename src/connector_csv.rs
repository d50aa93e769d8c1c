//! CSV connector.
//!
//! Turns each record of the source file into one [`Document`]. By default the
//! page content is every column rendered as `header: value` on its own line;
//! with `source.column` set, only that column's value is used.

use anyhow::{bail, Context, Result};
use serde_json::json;
use std::path::Path;

use crate::config::SourceConfig;
use crate::models::Document;

pub fn load_csv(source: &SourceConfig) -> Result<Vec<Document>> {
    let path = &source.path;
    if !path.exists() {
        bail!("CSV source does not exist: {}", path.display());
    }

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        // Short or long rows are rendered against the header, not rejected
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("Failed to open CSV source: {}", path.display()))?;

    let headers: Vec<String> = reader
        .headers()
        .with_context(|| format!("Failed to read CSV header: {}", path.display()))?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let column_index = match &source.column {
        Some(column) => match headers.iter().position(|h| h == column.trim()) {
            Some(idx) => Some(idx),
            None => bail!(
                "Column '{}' not found in CSV header of {}",
                column,
                path.display()
            ),
        },
        None => None,
    };

    let mut documents = Vec::new();
    for (i, record) in reader.records().enumerate() {
        let record = record.with_context(|| {
            format!("Failed to parse CSV record {} of {}", i + 1, path.display())
        })?;

        let page_content = match column_index {
            Some(idx) => record.get(idx).unwrap_or_default().trim().to_string(),
            None => render_record(&headers, &record),
        };

        documents.push(Document {
            page_content,
            metadata: json!({
                "source": source_label(path),
                "line": i + 1,
            }),
        });
    }

    Ok(documents)
}

fn render_record(headers: &[String], record: &csv::StringRecord) -> String {
    headers
        .iter()
        .zip(record.iter())
        .map(|(key, value)| format!("{}: {}", key, value.trim()))
        .collect::<Vec<_>>()
        .join("\n")
}

fn source_label(path: &Path) -> String {
    path.to_string_lossy().to_string()
}
