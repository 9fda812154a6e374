use crate::commands::write_artifacts;
use crate::pdf::PdfDocument;
use crate::split::{split_sections, write_archive, Section};
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

pub enum Destination {
    Archive(PathBuf),
    Directory(PathBuf),
}

/// Load sections from a JSON array of `{"name": ..., "pages": ...}`.
pub fn load_sections<P: AsRef<Path>>(path: P) -> Result<Vec<Section>> {
    let path = path.as_ref();
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read sections: {}", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("Invalid sections data in {}", path.display()))
}

pub fn run<P: AsRef<Path>>(input: P, sections: &[Section], destination: Destination) -> Result<()> {
    let input = input.as_ref();
    let doc = PdfDocument::open(input)?;

    let outcome = split_sections(&doc, sections)?;
    for skipped in &outcome.skipped {
        println!("  Skipped section '{}': {}", skipped.name, skipped.reason);
    }

    match destination {
        Destination::Archive(path) => {
            let archive = write_archive(&outcome.artifacts)?;
            std::fs::write(&path, archive)
                .with_context(|| format!("Failed to write archive: {}", path.display()))?;
            println!(
                "Wrote {} of {} section(s) to {}",
                outcome.artifacts.len(),
                sections.len(),
                path.display()
            );
        }
        Destination::Directory(dir) => {
            let written = write_artifacts(&outcome.artifacts, &dir)?;
            for file in &written {
                println!("Created: {}", file);
            }
            println!(
                "Wrote {} of {} section(s) to {}",
                written.len(),
                sections.len(),
                dir.display()
            );
        }
    }

    Ok(())
}
