mod analysis;
mod cli;
mod commands;
mod config;
mod error;
mod mcp;
mod page_range;
mod pdf;
mod split;
mod web;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands};
use commands::sections::Destination;
use config::Config;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // stderr keeps stdout free for command output and MCP framing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pagecut=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    dotenvy::dotenv().ok();
    let mut config = Config::from_env();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { host, port } => {
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }
            web::run_server(config).await?;
        }
        Commands::Mcp => {
            mcp::run_server().await?;
        }
        Commands::Info { path, preview } => {
            commands::info::run(&path, preview)?;
        }
        Commands::Extract {
            path,
            pages,
            output,
            strict,
        } => {
            commands::extract::run(&path, &pages, output, strict)?;
        }
        Commands::Split {
            path,
            pages_per_file,
            output_dir,
        } => {
            commands::split::run(&path, &output_dir, pages_per_file)?;
        }
        Commands::Sections {
            path,
            sections,
            output,
            output_dir,
        } => {
            let sections = commands::sections::load_sections(&sections)?;
            let destination = match (output, output_dir) {
                (_, Some(dir)) => Destination::Directory(dir),
                (Some(zip), None) => Destination::Archive(zip),
                (None, None) => {
                    let stem = path
                        .file_stem()
                        .and_then(|s| s.to_str())
                        .unwrap_or("document");
                    Destination::Archive(path.with_file_name(format!("split_{}.zip", stem)))
                }
            };
            commands::sections::run(&path, &sections, destination)?;
        }
        Commands::Analyze { path, question } => {
            commands::analyze::run(&path, question.as_deref(), &config.ai).await?;
        }
    }

    Ok(())
}
