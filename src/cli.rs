use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "pagecut")]
#[command(about = "Extract pages from PDFs and split them into parts, with a web UI and MCP server")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the web server
    Serve {
        /// Address to bind (overrides SERVER_HOST)
        #[arg(long)]
        host: Option<String>,

        /// Port to listen on (overrides SERVER_PORT)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Run as MCP server over stdio
    Mcp,

    /// Display PDF metadata
    Info {
        /// PDF file to inspect
        path: PathBuf,

        /// Also show file size and a text preview of the first page
        #[arg(long)]
        preview: bool,
    },

    /// Extract selected pages to a new PDF
    #[command(alias = "cat")]
    Extract {
        /// PDF file to extract from
        path: PathBuf,

        /// Pages to keep (e.g., "1,3,5-10,15")
        pages: String,

        /// Output file (default: <name>_extracted.pdf)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Fail on malformed page tokens instead of skipping them
        #[arg(long)]
        strict: bool,
    },

    /// Split PDF into files of N consecutive pages
    #[command(alias = "burst")]
    Split {
        /// PDF file to split
        path: PathBuf,

        /// Pages per output file
        #[arg(short = 'n', long, default_value = "1")]
        pages_per_file: usize,

        /// Output directory
        #[arg(short, long, default_value = "split_output")]
        output_dir: PathBuf,
    },

    /// Split PDF into one file per named section
    Sections {
        /// PDF file to split
        path: PathBuf,

        /// JSON file with [{"name": ..., "pages": ...}, ...]
        sections: PathBuf,

        /// Zip archive to write (default: split_<name>.zip)
        #[arg(short, long, conflicts_with = "output_dir")]
        output: Option<PathBuf>,

        /// Write the section PDFs into this directory instead of a zip
        #[arg(long)]
        output_dir: Option<PathBuf>,
    },

    /// Ask the configured AI provider how to split a PDF
    Analyze {
        /// PDF file to analyze
        path: PathBuf,

        /// Specific question about how to split
        question: Option<String>,
    },
}
