use crate::error::SplitError;
use crate::page_range::PageSelection;
use crate::pdf::PdfDocument;
use crate::split::{self, ExtractionStatus};
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// `<dir>/<stem>_extracted.pdf` next to the input
pub fn default_output(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("document");
    input.with_file_name(format!("{}_extracted.pdf", stem))
}

pub fn run<P: AsRef<Path>>(input: P, pages: &str, output: Option<PathBuf>, strict: bool) -> Result<()> {
    let input = input.as_ref();
    let output = output.unwrap_or_else(|| default_output(input));

    let selection = if strict {
        PageSelection::parse_strict(pages)?
    } else {
        let (selection, rejected) = PageSelection::parse_with_rejects(pages);
        for token in rejected {
            eprintln!("Warning: Invalid page token '{}' (skipped)", token);
        }
        selection
    };
    if selection.is_empty() {
        return Err(SplitError::EmptySelection.into());
    }

    let doc = PdfDocument::open(input)?;
    println!("Total pages in PDF: {}", doc.page_count());
    println!("Extracting pages: {}", selection);

    let result = split::materialize(&doc, &selection)?;
    std::fs::write(&output, &result.output)
        .with_context(|| format!("Failed to save PDF: {}", output.display()))?;

    if result.status() == ExtractionStatus::Partial {
        for page in &result.skipped_pages {
            println!("  Warning: Page {} doesn't exist (skipped)", page);
        }
    }
    println!("{} to {}", result.summary(), output.display());

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf::document::fixtures::sample_pdf;

    #[test]
    fn test_default_output_name() {
        assert_eq!(
            default_output(Path::new("/tmp/books/novel.pdf")),
            PathBuf::from("/tmp/books/novel_extracted.pdf")
        );
    }

    #[test]
    fn test_extract_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.pdf");
        std::fs::write(&input, sample_pdf(6)).unwrap();

        run(&input, "1, 5-6, 42", None, false).unwrap();

        let out = PdfDocument::open(dir.path().join("in_extracted.pdf")).unwrap();
        assert_eq!(out.page_count(), 3);
    }

    #[test]
    fn test_extract_nothing_valid_fails() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.pdf");
        std::fs::write(&input, sample_pdf(2)).unwrap();
        let output = dir.path().join("out.pdf");

        let err = run(&input, "10-12", Some(output.clone()), false).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<SplitError>(),
            Some(SplitError::NoValidPages { .. })
        ));
        assert!(!output.exists());

        let err = run(&input, "nope", Some(output), false).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<SplitError>(),
            Some(SplitError::EmptySelection)
        ));
    }

    #[test]
    fn test_extract_strict() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.pdf");
        std::fs::write(&input, sample_pdf(2)).unwrap();

        let err = run(&input, "1,1-2-3", None, true).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<SplitError>(),
            Some(SplitError::MalformedToken(_))
        ));
    }
}
