//! Turning page selections into output documents.
//!
//! Three modes share one materializer: a single extraction, fixed-size
//! chunking of the whole document, and a batch of named sections.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::io::{Cursor, Write};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::error::{Result, SplitError};
use crate::page_range::PageSelection;

/// The only capabilities of a PDF library this module needs.
pub trait PageSource {
    fn page_count(&self) -> u32;

    /// Serialize a document made of the given 1-based pages, in order.
    fn write_pages(&self, pages: &[u32]) -> Result<Vec<u8>>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtractionStatus {
    Complete,
    /// At least one page was written, some requested pages were skipped
    Partial,
}

#[derive(Debug, Clone)]
pub struct ExtractionResult {
    pub selected_count: usize,
    /// Requested pages outside `1..=page_count`, ascending
    pub skipped_pages: Vec<i64>,
    pub output: Vec<u8>,
}

impl ExtractionResult {
    pub fn status(&self) -> ExtractionStatus {
        if self.skipped_pages.is_empty() {
            ExtractionStatus::Complete
        } else {
            ExtractionStatus::Partial
        }
    }

    pub fn summary(&self) -> String {
        let mut message = format!("Successfully extracted {} page(s)", self.selected_count);
        if !self.skipped_pages.is_empty() {
            message.push_str(&format!(
                ". Invalid pages skipped: {:?}",
                self.skipped_pages
            ));
        }
        message
    }
}

/// Write the pages of `selection` that exist in `source`.
///
/// Pages outside the document are collected in `skipped_pages` instead of
/// aborting. Returns [`SplitError::NoValidPages`] when nothing is left to
/// write, which includes an empty selection.
pub fn materialize<S: PageSource + ?Sized>(
    source: &S,
    selection: &PageSelection,
) -> Result<ExtractionResult> {
    let total = i64::from(source.page_count());

    let mut valid = Vec::with_capacity(selection.len());
    let mut skipped = Vec::new();
    for &page in selection.pages() {
        if (1..=total).contains(&page) {
            valid.push(page as u32);
        } else {
            skipped.push(page);
        }
    }

    if valid.is_empty() {
        return Err(SplitError::NoValidPages { skipped });
    }
    if !skipped.is_empty() {
        tracing::warn!(?skipped, total, "skipping pages outside the document");
    }

    let output = source.write_pages(&valid)?;
    Ok(ExtractionResult {
        selected_count: valid.len(),
        skipped_pages: skipped,
        output,
    })
}

/// A run of consecutive pages, numbered from 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chunk {
    pub index: u32,
    pub start: u32,
    pub end: u32,
}

impl Chunk {
    pub fn len(&self) -> u32 {
        self.end - self.start + 1
    }

    pub fn pages(&self) -> Vec<u32> {
        (self.start..=self.end).collect()
    }

    pub fn file_name(&self, stem: &str) -> String {
        format!(
            "{}_part_{}_pages_{}-{}.pdf",
            stem, self.index, self.start, self.end
        )
    }
}

/// Partition `1..=total_pages` into runs of `chunk_size`; the last run takes
/// the remainder.
pub fn plan_chunks(total_pages: u32, chunk_size: usize) -> Result<Vec<Chunk>> {
    if chunk_size == 0 {
        return Err(SplitError::InvalidChunkSize(chunk_size));
    }
    let size = u32::try_from(chunk_size).unwrap_or(u32::MAX);

    let mut chunks = Vec::new();
    let mut start = 1u32;
    while start <= total_pages {
        let end = start.saturating_add(size - 1).min(total_pages);
        chunks.push(Chunk {
            index: chunks.len() as u32 + 1,
            start,
            end,
        });
        start = match end.checked_add(1) {
            Some(next) => next,
            None => break,
        };
    }
    Ok(chunks)
}

/// One named output file.
#[derive(Debug, Clone)]
pub struct Artifact {
    pub file_name: String,
    pub page_count: usize,
    pub bytes: Vec<u8>,
}

pub fn split_into_chunks<S: PageSource + ?Sized>(
    source: &S,
    chunk_size: usize,
    stem: &str,
) -> Result<Vec<Artifact>> {
    let chunks = plan_chunks(source.page_count(), chunk_size)?;

    let mut artifacts = Vec::with_capacity(chunks.len());
    for chunk in chunks {
        let bytes = source.write_pages(&chunk.pages())?;
        let file_name = chunk.file_name(stem);
        tracing::info!(file = %file_name, start = chunk.start, end = chunk.end, "wrote chunk");
        artifacts.push(Artifact {
            file_name,
            page_count: chunk.len() as usize,
            bytes,
        });
    }
    Ok(artifacts)
}

/// A named page specification; one output file per section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    #[serde(default = "default_section_name")]
    pub name: String,
    #[serde(default)]
    pub pages: String,
}

fn default_section_name() -> String {
    "Section".to_string()
}

/// Make a section name safe to use as a single file name component.
pub fn sanitize_section_name(name: &str) -> String {
    let safe = name.trim().replace(['/', '\\'], "_");
    if safe.is_empty() {
        default_section_name()
    } else {
        safe
    }
}

/// A section that produced no output, and why.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedSection {
    pub name: String,
    pub reason: String,
}

#[derive(Debug, Default)]
pub struct SectionsOutcome {
    pub artifacts: Vec<Artifact>,
    pub skipped: Vec<SkippedSection>,
}

/// Materialize every section independently.
///
/// Sections with no valid pages are recorded in `skipped` and do not stop
/// the batch. Unreadable output still fails the whole batch.
pub fn split_sections<S: PageSource + ?Sized>(
    source: &S,
    sections: &[Section],
) -> Result<SectionsOutcome> {
    let mut outcome = SectionsOutcome::default();
    let mut used_names: HashSet<String> = HashSet::new();

    for section in sections {
        let selection = PageSelection::parse(&section.pages);
        let reason = if selection.is_empty() {
            Some("no page numbers in specification".to_string())
        } else {
            match materialize(source, &selection) {
                Ok(result) => {
                    let stem = unique_name(&mut used_names, sanitize_section_name(&section.name));
                    let file_name = format!("{}.pdf", stem);
                    tracing::info!(
                        section = %section.name,
                        file = %file_name,
                        pages = result.selected_count,
                        "wrote section"
                    );
                    outcome.artifacts.push(Artifact {
                        file_name,
                        page_count: result.selected_count,
                        bytes: result.output,
                    });
                    None
                }
                Err(SplitError::NoValidPages { skipped }) => {
                    Some(format!("no valid pages (requested {:?})", skipped))
                }
                Err(e) => return Err(e),
            }
        };

        if let Some(reason) = reason {
            tracing::warn!(section = %section.name, %reason, "section produced no output");
            outcome.skipped.push(SkippedSection {
                name: section.name.clone(),
                reason,
            });
        }
    }

    Ok(outcome)
}

/// `name`, or the first of `name_2`, `name_3`, ... not yet in `used`.
fn unique_name(used: &mut HashSet<String>, name: String) -> String {
    let mut candidate = name.clone();
    let mut n = 1;
    while used.contains(&candidate) {
        n += 1;
        candidate = format!("{}_{}", name, n);
    }
    used.insert(candidate.clone());
    candidate
}

/// Pack artifacts into a deflated zip archive.
pub fn write_archive(artifacts: &[Artifact]) -> Result<Vec<u8>> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    for artifact in artifacts {
        zip.start_file(artifact.file_name.as_str(), options)?;
        zip.write_all(&artifact.bytes)?;
    }

    Ok(zip.finish()?.into_inner())
}
