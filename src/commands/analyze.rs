use crate::analysis::{provider, Analyzer};
use crate::config::AiConfig;
use crate::pdf::text;
use anyhow::{bail, Context, Result};
use std::path::Path;

pub async fn run<P: AsRef<Path>>(path: P, question: Option<&str>, config: &AiConfig) -> Result<()> {
    let path = path.as_ref();
    if !config.is_enabled() {
        bail!(
            "AI analysis is not configured. Set the API key for AI_PROVIDER ({:?}) or use AI_PROVIDER=ollama.",
            config.provider
        );
    }
    let analyzer = Analyzer::new(provider::from_config(config)?);

    let bytes =
        std::fs::read(path).with_context(|| format!("Failed to read PDF: {}", path.display()))?;
    let max_pages = config.max_pages;
    let sample = tokio::task::spawn_blocking(move || text::sample_pages(&bytes, max_pages))
        .await
        .context("Text extraction task failed")??;

    eprintln!(
        "Analyzing {} of {} page(s) with AI...",
        sample.analyzed_pages, sample.total_pages
    );
    let analysis = analyzer.analyze(&sample, question).await;
    println!("{}", serde_json::to_string_pretty(&analysis)?);

    Ok(())
}
