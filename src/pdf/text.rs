use anyhow::{Context, Result};
use serde::Serialize;
use std::path::Path;

use crate::pdf::PdfDocument;

/// Characters of page text kept per page for analysis
pub const PAGE_TEXT_LIMIT: usize = 2000;

const PREVIEW_LIMIT: usize = 500;

#[derive(Debug, Clone, Serialize)]
pub struct PageContent {
    pub page_number: u32,
    pub text: String,
    /// Length of the untruncated page text
    pub char_count: usize,
}

/// Text of the first pages of a document.
#[derive(Debug, Clone, Serialize)]
pub struct TextSample {
    pub total_pages: u32,
    pub analyzed_pages: u32,
    pub page_contents: Vec<PageContent>,
}

/// Extract text from at most `max_pages` leading pages of a PDF.
pub fn sample_pages(pdf_bytes: &[u8], max_pages: u32) -> Result<TextSample> {
    let total_pages = PdfDocument::from_bytes(pdf_bytes)?.page_count();

    let texts = pdf_extract::extract_text_from_mem_by_pages(pdf_bytes)
        .context("Error extracting text from PDF")?;

    Ok(build_sample(total_pages, &texts, max_pages))
}

fn build_sample(total_pages: u32, texts: &[String], max_pages: u32) -> TextSample {
    let analyzed_pages = max_pages.min(total_pages);

    let page_contents = (0..analyzed_pages)
        .map(|i| {
            let text = texts.get(i as usize).map(String::as_str).unwrap_or("");
            PageContent {
                page_number: i + 1,
                text: truncate_chars(text, PAGE_TEXT_LIMIT).to_string(),
                char_count: text.chars().count(),
            }
        })
        .collect();

    TextSample {
        total_pages,
        analyzed_pages,
        page_contents,
    }
}

/// Basic facts about a PDF, no AI involved.
#[derive(Debug, Clone, Serialize)]
pub struct QuickSummary {
    pub total_pages: u32,
    pub first_page_preview: String,
    pub file_size_mb: f64,
}

pub fn quick_summary<P: AsRef<Path>>(path: P) -> Result<QuickSummary> {
    let path = path.as_ref();
    let bytes =
        std::fs::read(path).with_context(|| format!("Failed to read PDF: {}", path.display()))?;

    let sample = sample_pages(&bytes, 1)
        .with_context(|| format!("Could not read PDF: {}", path.display()))?;
    let first_page_preview = sample
        .page_contents
        .first()
        .map(|p| truncate_chars(&p.text, PREVIEW_LIMIT).to_string())
        .unwrap_or_default();

    Ok(QuickSummary {
        total_pages: sample.total_pages,
        first_page_preview,
        file_size_mb: bytes.len() as f64 / (1024.0 * 1024.0),
    })
}

/// Longest prefix of `s` holding at most `max` characters.
pub fn truncate_chars(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_chars() {
        assert_eq!(truncate_chars("hello", 3), "hel");
        assert_eq!(truncate_chars("hi", 10), "hi");
        assert_eq!(truncate_chars("żółw", 2), "żó");
        assert_eq!(truncate_chars("", 5), "");
    }

    #[test]
    fn test_sample_is_capped() {
        let texts: Vec<String> = (1..=10).map(|i| format!("text {}", i)).collect();
        let sample = build_sample(10, &texts, 3);
        assert_eq!(sample.total_pages, 10);
        assert_eq!(sample.analyzed_pages, 3);
        assert_eq!(sample.page_contents.len(), 3);
        assert_eq!(sample.page_contents[2].page_number, 3);
        assert_eq!(sample.page_contents[2].text, "text 3");
    }

    #[test]
    fn test_sample_truncates_long_pages() {
        let long = "x".repeat(PAGE_TEXT_LIMIT + 50);
        let sample = build_sample(1, &[long], 30);
        assert_eq!(sample.analyzed_pages, 1);
        assert_eq!(sample.page_contents[0].text.len(), PAGE_TEXT_LIMIT);
        assert_eq!(sample.page_contents[0].char_count, PAGE_TEXT_LIMIT + 50);
    }

    #[test]
    fn test_sample_tolerates_missing_page_text() {
        let sample = build_sample(2, &["only one".to_string()], 5);
        assert_eq!(sample.page_contents[1].text, "");
        assert_eq!(sample.page_contents[1].char_count, 0);
    }
}
