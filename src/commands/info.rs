use crate::pdf::{text, PdfDocument};
use anyhow::Result;
use std::path::Path;

pub fn run<P: AsRef<Path>>(path: P, preview: bool) -> Result<()> {
    let doc = PdfDocument::open(&path)?;
    let info = doc.get_info();

    println!("File: {}", path.as_ref().display());
    println!("Pages: {}", info.page_count);

    let fields = [
        ("Title", &info.title),
        ("Author", &info.author),
        ("Subject", &info.subject),
        ("Creator", &info.creator),
        ("Producer", &info.producer),
    ];
    for (label, value) in fields {
        if let Some(value) = value {
            println!("{}: {}", label, value);
        }
    }
    if let Some(creation_date) = &info.creation_date {
        println!("Created: {}", format_pdf_date(creation_date));
    }

    if preview {
        let summary = text::quick_summary(&path)?;
        println!("Size: {:.2} MB", summary.file_size_mb);
        println!();
        println!("{}", summary.first_page_preview.trim());
    }

    Ok(())
}

/// Render a PDF date (`D:YYYYMMDDHHmmSS...`) as `YYYY-MM-DD HH:mm:SS`.
fn format_pdf_date(date: &str) -> String {
    let Some(d) = date.strip_prefix("D:") else {
        return date.to_string();
    };
    if d.len() < 8 || !d.as_bytes()[..8].iter().all(u8::is_ascii_digit) {
        return date.to_string();
    }

    let mut out = format!("{}-{}-{}", &d[0..4], &d[4..6], &d[6..8]);
    if d.len() >= 14 && d.as_bytes()[8..14].iter().all(u8::is_ascii_digit) {
        out.push_str(&format!(" {}:{}:{}", &d[8..10], &d[10..12], &d[12..14]));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_pdf_date() {
        assert_eq!(format_pdf_date("D:20240131"), "2024-01-31");
        assert_eq!(
            format_pdf_date("D:20240131235901+01'00'"),
            "2024-01-31 23:59:01"
        );
        assert_eq!(format_pdf_date("yesterday"), "yesterday");
        assert_eq!(format_pdf_date("D:2024"), "D:2024");
    }
}
