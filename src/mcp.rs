use anyhow::Result;
use rmcp::{
    ServerHandler, ServiceExt,
    handler::server::{router::tool::ToolRouter, wrapper::Parameters},
    model::{ServerCapabilities, ServerInfo},
    schemars, tool, tool_router,
};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::commands::write_artifacts;
use crate::page_range::PageSelection;
use crate::pdf::PdfDocument;
use crate::split::{self, Section};

// Request structs for tools

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct PathRequest {
    #[schemars(description = "Path to the PDF file")]
    pub path: String,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct PdfExtractRequest {
    #[schemars(description = "Path to the source PDF file")]
    pub path: String,
    #[schemars(description = "Pages to keep (e.g., '1,3,5-10,15'). Malformed parts are ignored.")]
    pub pages: String,
    #[schemars(description = "Output file path")]
    pub output: String,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct PdfSplitChunksRequest {
    #[schemars(description = "Path to the source PDF file")]
    pub path: String,
    #[schemars(description = "Pages per output file (default: 1)")]
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    #[schemars(description = "Directory for the output files")]
    pub output_dir: String,
}

fn default_chunk_size() -> usize {
    1
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct SectionRequest {
    #[schemars(description = "Section name, used as the output file name")]
    pub name: String,
    #[schemars(description = "Pages of this section (e.g., '1-10')")]
    pub pages: String,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct PdfSplitSectionsRequest {
    #[schemars(description = "Path to the source PDF file")]
    pub path: String,
    #[schemars(description = "Named sections, one output file each")]
    pub sections: Vec<SectionRequest>,
    #[schemars(description = "Directory for the output files")]
    pub output_dir: String,
}

#[derive(Debug, Clone)]
pub struct PdfServer {
    #[allow(dead_code)]
    tool_router: ToolRouter<Self>,
}

impl PdfServer {
    pub fn new() -> Self {
        Self {
            tool_router: Self::tool_router(),
        }
    }
}

impl Default for PdfServer {
    fn default() -> Self {
        Self::new()
    }
}

fn to_json<T: Serialize>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|e| format!("Error: {}", e))
}

#[tool_router]
impl PdfServer {
    #[tool(description = "Get PDF metadata including title, author, creator, producer, creation date, and page count")]
    fn pdf_info(&self, Parameters(PathRequest { path }): Parameters<PathRequest>) -> String {
        match PdfDocument::open(&path) {
            Ok(doc) => {
                let info = doc.get_info();
                to_json(&PdfInfoResult {
                    path,
                    page_count: info.page_count,
                    title: info.title,
                    author: info.author,
                    creator: info.creator,
                    producer: info.producer,
                    creation_date: info.creation_date,
                    subject: info.subject,
                })
            }
            Err(e) => format!("Error: {}", e),
        }
    }

    #[tool(description = "Extract specific pages from a PDF and save them to a new file. Pages outside the document are skipped and reported.")]
    fn pdf_extract(&self, Parameters(req): Parameters<PdfExtractRequest>) -> String {
        let doc = match PdfDocument::open(&req.path) {
            Ok(d) => d,
            Err(e) => return format!("Error: {}", e),
        };

        let selection = PageSelection::parse(&req.pages);
        let result = match split::materialize(&doc, &selection) {
            Ok(r) => r,
            Err(e) => return format!("Error: {}", e),
        };

        if let Err(e) = std::fs::write(&req.output, &result.output) {
            return format!("Error: Failed to write {}: {}", req.output, e);
        }

        to_json(&ExtractResult {
            output_path: req.output,
            page_count: result.selected_count,
            skipped_pages: result.skipped_pages,
        })
    }

    #[tool(description = "Split a whole PDF into consecutive files of chunk_size pages each")]
    fn pdf_split_chunks(&self, Parameters(req): Parameters<PdfSplitChunksRequest>) -> String {
        let doc = match PdfDocument::open(&req.path) {
            Ok(d) => d,
            Err(e) => return format!("Error: {}", e),
        };
        let stem = stem_of(&req.path);

        let artifacts = match split::split_into_chunks(&doc, req.chunk_size, &stem) {
            Ok(a) => a,
            Err(e) => return format!("Error: {}", e),
        };

        match write_artifacts(&artifacts, &req.output_dir) {
            Ok(files) => to_json(&SplitResult {
                files,
                skipped_sections: Vec::new(),
            }),
            Err(e) => format!("Error: {:#}", e),
        }
    }

    #[tool(description = "Split a PDF into one file per named section. Sections with no valid pages are skipped and reported.")]
    fn pdf_split_sections(&self, Parameters(req): Parameters<PdfSplitSectionsRequest>) -> String {
        let doc = match PdfDocument::open(&req.path) {
            Ok(d) => d,
            Err(e) => return format!("Error: {}", e),
        };
        let sections: Vec<Section> = req
            .sections
            .into_iter()
            .map(|s| Section {
                name: s.name,
                pages: s.pages,
            })
            .collect();

        let outcome = match split::split_sections(&doc, &sections) {
            Ok(o) => o,
            Err(e) => return format!("Error: {}", e),
        };

        match write_artifacts(&outcome.artifacts, &req.output_dir) {
            Ok(files) => to_json(&SplitResult {
                files,
                skipped_sections: outcome
                    .skipped
                    .into_iter()
                    .map(|s| format!("{}: {}", s.name, s.reason))
                    .collect(),
            }),
            Err(e) => format!("Error: {:#}", e),
        }
    }
}

fn stem_of(path: &str) -> String {
    Path::new(path)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("document")
        .to_string()
}

// Result types for MCP tools

#[derive(Debug, Serialize, Deserialize, schemars::JsonSchema)]
pub struct PdfInfoResult {
    pub path: String,
    pub page_count: u32,
    pub title: Option<String>,
    pub author: Option<String>,
    pub creator: Option<String>,
    pub producer: Option<String>,
    pub creation_date: Option<String>,
    pub subject: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, schemars::JsonSchema)]
pub struct ExtractResult {
    pub output_path: String,
    pub page_count: usize,
    pub skipped_pages: Vec<i64>,
}

#[derive(Debug, Serialize, Deserialize, schemars::JsonSchema)]
pub struct SplitResult {
    pub files: Vec<String>,
    pub skipped_sections: Vec<String>,
}

impl ServerHandler for PdfServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(
                "PDF page extraction and splitting tools. Use pdf_info to get document metadata, \
                 pdf_extract to copy selected pages into a new PDF, pdf_split_chunks to cut a PDF \
                 into fixed-size parts, and pdf_split_sections to produce one PDF per named section."
                    .to_string(),
            ),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }
}

pub async fn run_server() -> Result<()> {
    let server = PdfServer::new();

    // Serve using stdin/stdout as a tuple
    let service = server.serve((tokio::io::stdin(), tokio::io::stdout())).await?;

    service.waiting().await?;

    Ok(())
}
