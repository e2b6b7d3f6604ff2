pub mod errors;
pub mod gemini;

pub use errors::GenerationError;
pub use gemini::{GeminiClient, GeminiFactory};

use async_trait::async_trait;
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{info, instrument, warn};

use crate::config::Config;
use crate::extractor::ExtractionResult;
use crate::extractor::model::truncate_chars;

pub const EXHAUSTED_PREFIX: &str =
    "Report generation failed: all candidate models were exhausted";

const NO_HIDDEN_CATEGORIES: &str = "none found";
const NO_REVIEWS: &str = "(no reviews captured)";
const NO_PAGE_TEXT: &str = "(no page text captured)";

/// A text-generation service bound to one credential.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, model: &str, prompt: &str) -> Result<String, GenerationError>;
}

/// Credentials arrive per request, so generators are built per request too.
pub trait GeneratorFactory: Send + Sync {
    fn for_credential(&self, api_key: &str) -> Arc<dyn TextGenerator>;
}

#[derive(Debug, Clone)]
pub struct ReportGenerator {
    candidates: Vec<String>,
    char_budget: usize,
    language: String,
}

impl ReportGenerator {
    pub fn new(candidates: Vec<String>, char_budget: usize, language: impl Into<String>) -> Self {
        Self {
            candidates,
            char_budget,
            language: language.into(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.model_candidates().to_vec(),
            config.char_budget(),
            config.report_language(),
        )
    }

    pub fn candidates(&self) -> &[String] {
        &self.candidates
    }

    pub fn build_prompt(
        &self,
        extraction: &ExtractionResult,
        hidden_categories: &BTreeSet<String>,
    ) -> String {
        let hidden = if hidden_categories.is_empty() {
            NO_HIDDEN_CATEGORIES.to_string()
        } else {
            hidden_categories
                .iter()
                .map(String::as_str)
                .collect::<Vec<_>>()
                .join(", ")
        };
        let reviews = excerpt(&extraction.review_text, self.char_budget, NO_REVIEWS);
        let page_text = excerpt(&extraction.visible_text, self.char_budget, NO_PAGE_TEXT);

        format!(
            "The following data was collected from a Google Maps business listing.\n\
             \n\
             Name: {name}\n\
             Primary category: {category}\n\
             Additional categories: {hidden}\n\
             \n\
             Customer reviews:\n\
             '''\n\
             {reviews}\n\
             '''\n\
             \n\
             Page text:\n\
             '''\n\
             {page_text}\n\
             '''\n\
             \n\
             Write a professional report in {language} with these sections:\n\
             1. **Business name**\n\
             2. **Category** (check it against the page text and the additional categories)\n\
             3. **Services** (what the business offers)\n\
             4. **Strengths and weaknesses** (drawn from the reviews)\n\
             5. **SEO suggestions** (5 keywords)\n",
            name = extraction.name,
            category = extraction.category,
            language = self.language,
        )
    }

    /// Try each candidate model once, in order. Never fails: when every
    /// candidate errors the result is a fixed failure message.
    #[instrument(skip_all, fields(name = %extraction.name))]
    pub async fn generate(
        &self,
        generator: &dyn TextGenerator,
        extraction: &ExtractionResult,
        hidden_categories: &BTreeSet<String>,
    ) -> String {
        let prompt = self.build_prompt(extraction, hidden_categories);
        let mut failures = Vec::with_capacity(self.candidates.len());

        for model in &self.candidates {
            match generator.generate(model, &prompt).await {
                Ok(report) => {
                    info!(model = %model, "report generated");
                    return report;
                }
                Err(e) => {
                    warn!(model = %model, kind = e.kind(), error = %e, "model candidate failed");
                    failures.push(format!("{model}: {}", e.kind()));
                }
            }
        }

        exhausted_message(&failures)
    }
}

fn excerpt<'a>(text: &'a str, budget: usize, placeholder: &'a str) -> &'a str {
    let text = truncate_chars(text.trim(), budget);
    if text.is_empty() { placeholder } else { text }
}

fn exhausted_message(failures: &[String]) -> String {
    if failures.is_empty() {
        format!("{EXHAUSTED_PREFIX} (no candidate models configured)")
    } else {
        format!("{EXHAUSTED_PREFIX} ({})", failures.join("; "))
    }
}
