//! AI-assisted split suggestions.
//!
//! The model is shown a text preview of the document and asked for JSON
//! describing how to split it. Replies are parsed leniently: anything that
//! is not usable JSON comes back as `raw_response` with no suggestions.

pub mod provider;

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

use crate::pdf::text::{truncate_chars, TextSample};
use crate::split::Section;
use provider::CompletionProvider;

/// Pages of the sample quoted in the prompt
const PROMPT_PAGE_LIMIT: usize = 20;
/// Characters quoted per page
const PROMPT_PREVIEW_CHARS: usize = 300;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Analysis {
    #[serde(default)]
    pub document_type: String,
    #[serde(default)]
    pub structure: String,
    #[serde(default)]
    pub suggestions: Vec<Suggestion>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_response: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_pages: Option<u32>,
}

impl Analysis {
    fn unparsed(raw: &str) -> Self {
        Analysis {
            document_type: "Unknown".to_string(),
            structure: "Could not parse structure".to_string(),
            raw_response: Some(raw.to_string()),
            ..Default::default()
        }
    }

    fn failed(message: String) -> Self {
        Analysis {
            error: Some(message),
            ..Default::default()
        }
    }
}

/// One way to split the document, ready to feed to the section splitter.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Suggestion {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub page_ranges: String,
    #[serde(default)]
    pub sections: Vec<Section>,
}

pub fn build_prompt(sample: &TextSample, question: Option<&str>) -> String {
    let previews: Vec<String> = sample
        .page_contents
        .iter()
        .take(PROMPT_PAGE_LIMIT)
        .map(|page| {
            let preview = truncate_chars(&page.text, PROMPT_PREVIEW_CHARS).replace('\n', " ");
            format!("Page {}: {}...", page.page_number, preview)
        })
        .collect();

    let mut prompt = format!(
        "I have a PDF document with {} total pages. I need help deciding how to split it into smaller, logical sections.\n\n\
         Here's a preview of the first pages:\n\n{}\n\n",
        sample.total_pages,
        previews.join("\n")
    );

    if let Some(question) = question.map(str::trim).filter(|q| !q.is_empty()) {
        prompt.push_str(&format!("\nUser's specific question: {}\n", question));
    }

    prompt.push_str(RESPONSE_INSTRUCTIONS);
    prompt
}

const RESPONSE_INSTRUCTIONS: &str = r#"
Please analyze this document and provide:

1. **Document Type**: What type of document is this? (e.g., textbook, report, manual, article collection)

2. **Content Structure**: Describe the structure (e.g., chapters, sections, topics)

3. **Splitting Suggestions**: Provide 2-3 specific recommendations for how to split this PDF. For each suggestion:
   - Describe the splitting strategy
   - List the specific page ranges
   - Explain why this split makes sense

Format your response as JSON:
{
  "document_type": "type here",
  "structure": "structure description",
  "suggestions": [
    {
      "name": "Suggestion name",
      "description": "Why this split makes sense",
      "page_ranges": "1-10,11-25,26-50",
      "sections": [
        {"name": "Section 1 name", "pages": "1-10"},
        {"name": "Section 2 name", "pages": "11-25"}
      ]
    }
  ]
}
"#;

fn json_span() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // Greedy: first '{' through last '}'
    RE.get_or_init(|| Regex::new(r"(?s)\{.*\}").expect("valid regex"))
}

/// Pull the JSON object out of a free-text model reply.
pub fn parse_response(reply: &str) -> Analysis {
    let Some(span) = json_span().find(reply) else {
        return Analysis::unparsed(reply);
    };

    match serde_json::from_str::<Analysis>(span.as_str()) {
        Ok(analysis) => analysis,
        Err(e) => {
            tracing::debug!(error = %e, "model reply was not valid analysis JSON");
            Analysis::unparsed(reply)
        }
    }
}

pub struct Analyzer {
    provider: Box<dyn CompletionProvider>,
}

impl Analyzer {
    pub fn new(provider: Box<dyn CompletionProvider>) -> Self {
        Self { provider }
    }

    /// Ask the model for split suggestions. Provider failures are reported
    /// in [`Analysis::error`].
    pub async fn analyze(&self, sample: &TextSample, question: Option<&str>) -> Analysis {
        let prompt = build_prompt(sample, question);
        tracing::info!(
            provider = self.provider.name(),
            pages = sample.analyzed_pages,
            prompt_chars = prompt.len(),
            "requesting split suggestions"
        );

        let mut analysis = match self.provider.complete(&prompt).await {
            Ok(reply) => parse_response(&reply),
            Err(e) => {
                tracing::warn!(error = %e, "AI analysis failed");
                Analysis::failed(format!("AI analysis failed: {}", e))
            }
        };
        analysis.total_pages = Some(sample.total_pages);
        analysis
    }
}

#[cfg(test)]
mod tests {
    use super::provider::ProviderError;
    use super::*;
    use crate::pdf::text::PageContent;
    use async_trait::async_trait;

    fn sample(pages: u32) -> TextSample {
        TextSample {
            total_pages: pages,
            analyzed_pages: pages,
            page_contents: (1..=pages)
                .map(|i| PageContent {
                    page_number: i,
                    text: format!("Chapter {}\nbody text", i),
                    char_count: 20,
                })
                .collect(),
        }
    }

    struct CannedProvider(Result<&'static str, ()>);

    #[async_trait]
    impl CompletionProvider for CannedProvider {
        fn name(&self) -> &'static str {
            "canned"
        }

        async fn complete(&self, _prompt: &str) -> Result<String, ProviderError> {
            match self.0 {
                Ok(reply) => Ok(reply.to_string()),
                Err(()) => Err(ProviderError::EmptyResponse { provider: "canned" }),
            }
        }
    }

    #[test]
    fn test_prompt_limits_pages_and_flattens_newlines() {
        let prompt = build_prompt(&sample(25), None);
        assert!(prompt.starts_with("I have a PDF document with 25 total pages."));
        assert!(prompt.contains("Page 1: Chapter 1 body text..."));
        assert!(prompt.contains("Page 20: "));
        assert!(!prompt.contains("Page 21: "));
        assert!(!prompt.contains("User's specific question"));
        assert!(prompt.contains("\"document_type\": \"type here\""));
    }

    #[test]
    fn test_prompt_includes_question() {
        let prompt = build_prompt(&sample(2), Some("  split by chapter "));
        assert!(prompt.contains("\nUser's specific question: split by chapter\n"));
    }

    #[test]
    fn test_parse_response_with_surrounding_text() {
        let reply = r#"Sure! Here you go:
{
  "document_type": "textbook",
  "structure": "chapters",
  "suggestions": [
    {"name": "By chapter", "description": "natural", "page_ranges": "1-3,4-5",
     "sections": [{"name": "Ch 1", "pages": "1-3"}, {"name": "Ch 2", "pages": "4-5"}]}
  ]
}
Hope that helps."#;
        let analysis = parse_response(reply);
        assert_eq!(analysis.document_type, "textbook");
        assert_eq!(analysis.suggestions.len(), 1);
        assert_eq!(analysis.suggestions[0].sections[1].pages, "4-5");
        assert!(analysis.raw_response.is_none());
    }

    #[test]
    fn test_parse_response_without_json() {
        let analysis = parse_response("I cannot help with that.");
        assert_eq!(analysis.document_type, "Unknown");
        assert_eq!(analysis.structure, "Could not parse structure");
        assert_eq!(
            analysis.raw_response.as_deref(),
            Some("I cannot help with that.")
        );
        assert!(analysis.suggestions.is_empty());
    }

    #[test]
    fn test_parse_response_invalid_json() {
        let analysis = parse_response("{ not: json }");
        assert_eq!(analysis.document_type, "Unknown");
        assert!(analysis.raw_response.is_some());
    }

    #[test]
    fn test_parse_response_missing_fields_default() {
        let analysis = parse_response(r#"{"document_type": "memo"}"#);
        assert_eq!(analysis.document_type, "memo");
        assert!(analysis.structure.is_empty());
        assert!(analysis.suggestions.is_empty());
    }

    #[tokio::test]
    async fn test_analyzer_success() {
        let analyzer = Analyzer::new(Box::new(CannedProvider(Ok(
            r#"{"document_type": "report", "structure": "flat", "suggestions": []}"#,
        ))));
        let analysis = analyzer.analyze(&sample(3), None).await;
        assert_eq!(analysis.document_type, "report");
        assert_eq!(analysis.total_pages, Some(3));
        assert!(analysis.error.is_none());
    }

    #[tokio::test]
    async fn test_analyzer_provider_failure_is_reported() {
        let analyzer = Analyzer::new(Box::new(CannedProvider(Err(()))));
        let analysis = analyzer.analyze(&sample(3), Some("why?")).await;
        assert!(analysis
            .error
            .as_deref()
            .unwrap()
            .starts_with("AI analysis failed:"));
        assert!(analysis.suggestions.is_empty());
    }
}
