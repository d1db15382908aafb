pub mod duty_pipeline;
pub mod seat_pipeline;

#[cfg(test)]
pub(crate) mod testing;

use crate::core::{Storage, Table};
use crate::utils::error::Result;
use std::path::Path;

/// File stem of the seat allocation result.
pub const SEAT_ARTIFACT: &str = "classroom_allocation";

/// File stem of the duty assignment result.
pub const DUTY_ARTIFACT: &str = "faculty_allocation";

pub fn artifact_path(output_path: &str, artifact: &str, format: &str) -> String {
    Path::new(output_path)
        .join(format!("{}.{}", artifact, format))
        .to_string_lossy()
        .into_owned()
}

/// Where the duty phase looks for the seat phase's result by default.
pub fn default_allocation_path(output_path: &str) -> String {
    artifact_path(output_path, SEAT_ARTIFACT, "csv")
}

/// Formats the seat phase writes: the configured ones plus csv, which the
/// duty phase reads back.
pub fn seat_output_formats(formats: &[String]) -> Vec<String> {
    let mut formats = formats.to_vec();
    if !formats.iter().any(|f| f == "csv") {
        formats.push("csv".to_string());
    }
    formats
}

/// Encodes every format first and only then writes, so a bad format leaves
/// earlier results untouched. Returns the written paths in `formats` order.
pub(crate) async fn save_table<S: Storage>(
    storage: &S,
    output_path: &str,
    artifact: &str,
    table: &Table,
    formats: &[String],
) -> Result<Vec<String>> {
    let mut encoded = Vec::with_capacity(formats.len());
    for format in formats {
        if encoded.iter().any(|(f, _): &(&str, Vec<u8>)| *f == format.as_str()) {
            continue;
        }
        encoded.push((format.as_str(), table.encode(format)?));
    }

    let mut written = Vec::with_capacity(encoded.len());
    for (format, bytes) in encoded {
        let path = artifact_path(output_path, artifact, format);
        tracing::debug!("Writing {} ({} bytes)", path, bytes.len());
        storage.write_file(&path, &bytes).await?;
        written.push(path);
    }
    Ok(written)
}
