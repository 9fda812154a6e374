use lopdf::{Document, Object, ObjectId};
use std::path::Path;

use crate::error::{Result, SplitError};
use crate::split::PageSource;

pub struct PdfDocument {
    pub doc: Document,
    pub path: String,
}

impl PdfDocument {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_str = path.as_ref().display().to_string();
        let doc = Document::load(&path).map_err(|e| {
            SplitError::InvalidSourceDocument(format!("Failed to open PDF {}: {}", path_str, e))
        })?;
        Ok(PdfDocument {
            doc,
            path: path_str,
        })
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let doc = Document::load_mem(bytes)
            .map_err(|e| SplitError::InvalidSourceDocument(e.to_string()))?;
        Ok(PdfDocument {
            doc,
            path: "<memory>".to_string(),
        })
    }

    pub fn page_count(&self) -> u32 {
        self.doc.get_pages().len() as u32
    }

    /// Get 1-indexed page object IDs
    pub fn page_ids(&self) -> Vec<(u32, ObjectId)> {
        let mut pages: Vec<_> = self.doc.get_pages().into_iter().collect();
        pages.sort_by_key(|(num, _)| *num);
        pages
    }

    /// Get metadata from the document info dictionary
    pub fn get_info(&self) -> PdfInfo {
        let mut info = PdfInfo::default();

        if let Ok(Object::Reference(info_ref)) = self.doc.trailer.get(b"Info") {
            if let Ok(Object::Dictionary(dict)) = self.doc.get_object(*info_ref) {
                info.title = get_string_from_dict(dict, b"Title");
                info.author = get_string_from_dict(dict, b"Author");
                info.creator = get_string_from_dict(dict, b"Creator");
                info.producer = get_string_from_dict(dict, b"Producer");
                info.creation_date = get_string_from_dict(dict, b"CreationDate");
                info.subject = get_string_from_dict(dict, b"Subject");
            }
        }

        info.page_count = self.page_count();
        info
    }

    /// Build a new document holding only `pages` (1-based, ascending).
    ///
    /// Pages are kept by deleting everything else from a clone, so the
    /// output follows source order.
    pub fn extract_pages(&self, pages: &[u32]) -> Result<Document> {
        let mut new_doc = self.doc.clone();
        let all_pages = self.page_ids();
        let total = all_pages.len() as u32;

        if let Some(&page) = pages.iter().find(|&&p| p == 0 || p > total) {
            return Err(SplitError::Write(format!(
                "Page {} is out of range (1-{}) in {}",
                page, total, self.path
            )));
        }

        let pages_to_delete: Vec<u32> = all_pages
            .iter()
            .filter(|(num, _)| !pages.contains(num))
            .map(|(num, _)| *num)
            .collect();

        if !pages_to_delete.is_empty() {
            new_doc.delete_pages(&pages_to_delete);
            new_doc.prune_objects();
        }

        Ok(new_doc)
    }

    pub fn to_bytes(doc: &mut Document) -> Result<Vec<u8>> {
        let mut buffer = Vec::new();
        doc.save_to(&mut buffer)
            .map_err(|e| SplitError::Write(e.to_string()))?;
        Ok(buffer)
    }
}

impl PageSource for PdfDocument {
    fn page_count(&self) -> u32 {
        PdfDocument::page_count(self)
    }

    fn write_pages(&self, pages: &[u32]) -> Result<Vec<u8>> {
        let mut new_doc = self.extract_pages(pages)?;
        PdfDocument::to_bytes(&mut new_doc)
    }
}

#[derive(Debug, Default, Clone)]
pub struct PdfInfo {
    pub title: Option<String>,
    pub author: Option<String>,
    pub creator: Option<String>,
    pub producer: Option<String>,
    pub creation_date: Option<String>,
    pub subject: Option<String>,
    pub page_count: u32,
}

fn get_string_from_dict(dict: &lopdf::Dictionary, key: &[u8]) -> Option<String> {
    dict.get(key).ok().and_then(|obj| match obj {
        Object::String(bytes, _) => decode_pdf_string(bytes),
        _ => None,
    })
}

fn decode_pdf_string(bytes: &[u8]) -> Option<String> {
    // UTF-16 BE with BOM, otherwise treat as Latin-1
    if bytes.len() >= 2 && bytes[0] == 0xFE && bytes[1] == 0xFF {
        let u16_chars: Vec<u16> = bytes[2..]
            .chunks_exact(2)
            .map(|chunk| u16::from_be_bytes([chunk[0], chunk[1]]))
            .collect();
        String::from_utf16(&u16_chars).ok()
    } else {
        Some(bytes.iter().map(|&b| b as char).collect())
    }
}

/// In-memory PDFs for tests. Page `i` shows the text "Page i".
#[cfg(test)]
pub(crate) mod fixtures {
    use lopdf::content::{Content, Operation};
    use lopdf::{dictionary, Document, Object, Stream, StringFormat};

    pub fn sample_pdf(num_pages: u32) -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! { "F1" => font_id },
        });

        let mut kids = Vec::new();
        for i in 1..=num_pages {
            let content = Content {
                operations: vec![
                    Operation::new("BT", vec![]),
                    Operation::new("Tf", vec!["F1".into(), 24.into()]),
                    Operation::new("Td", vec![100.into(), 600.into()]),
                    Operation::new(
                        "Tj",
                        vec![Object::String(
                            format!("Page {}", i).into_bytes(),
                            StringFormat::Literal,
                        )],
                    ),
                    Operation::new("ET", vec![]),
                ],
            };
            let content_id = doc.add_object(Stream::new(
                dictionary! {},
                content.encode().expect("encode content"),
            ));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
            });
            kids.push(Object::Reference(page_id));
        }

        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => num_pages as i64,
                "Resources" => resources_id,
                "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut buffer = Vec::new();
        doc.save_to(&mut buffer).expect("save sample pdf");
        buffer
    }
}
