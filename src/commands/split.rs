use crate::commands::write_artifacts;
use crate::pdf::PdfDocument;
use crate::split::split_into_chunks;
use anyhow::Result;
use std::path::Path;

pub fn run<P: AsRef<Path>, Q: AsRef<Path>>(
    input: P,
    output_dir: Q,
    pages_per_file: usize,
) -> Result<()> {
    let input = input.as_ref();
    let output_dir = output_dir.as_ref();

    let doc = PdfDocument::open(input)?;
    let total_pages = doc.page_count();

    // Get the base name of the input file
    let stem = input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("page");

    println!("Total pages in PDF: {}", total_pages);
    println!(
        "Splitting into files with {} page(s) each...",
        pages_per_file
    );

    let artifacts = split_into_chunks(&doc, pages_per_file, stem)?;
    let written = write_artifacts(&artifacts, output_dir)?;
    for artifact in &artifacts {
        println!("Created: {} ({} page(s))", artifact.file_name, artifact.page_count);
    }

    println!(
        "\nDone! Created {} files in '{}'",
        written.len(),
        output_dir.display()
    );

    Ok(())
}
