pub mod analyze;
pub mod extract;
pub mod info;
pub mod sections;
pub mod split;

use anyhow::{Context, Result};
use std::path::Path;

use crate::split::Artifact;

/// Write each artifact into `output_dir`, creating it if needed. Returns
/// the written paths.
pub fn write_artifacts<P: AsRef<Path>>(artifacts: &[Artifact], output_dir: P) -> Result<Vec<String>> {
    let output_dir = output_dir.as_ref();
    std::fs::create_dir_all(output_dir)
        .with_context(|| format!("Failed to create directory: {}", output_dir.display()))?;

    let mut written = Vec::with_capacity(artifacts.len());
    for artifact in artifacts {
        let path = output_dir.join(&artifact.file_name);
        std::fs::write(&path, &artifact.bytes)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        written.push(path.display().to_string());
    }
    Ok(written)
}
