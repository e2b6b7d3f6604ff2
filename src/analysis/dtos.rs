use base64::{Engine as _, engine::general_purpose::STANDARD};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::extractor::model::truncate_chars;
use crate::pipeline::AnalysisOutcome;

const MAX_URL_LEN: usize = 4096;
/// Characters of visible page text echoed back for display.
const PAGE_TEXT_PREVIEW_CHARS: usize = 1_000;

#[derive(Debug, Deserialize, ToSchema)]
pub struct AnalyzeRequest {
    /// Credential for the text-generation service. Used for this request only.
    pub api_key: String,
    /// Listing URL as copied from the browser or a share link.
    pub url: String,
}

impl AnalyzeRequest {
    pub fn validate(&self) -> Result<(), String> {
        if self.api_key.trim().is_empty() {
            return Err("API key cannot be empty".to_string());
        }
        if self.url.trim().is_empty() {
            return Err("URL cannot be empty".to_string());
        }
        if self.url.len() > MAX_URL_LEN {
            return Err("URL too long".to_string());
        }
        Ok(())
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AnalyzeResponse {
    pub request_id: Uuid,
    pub normalized_url: String,
    pub name: String,
    pub category: String,
    pub hidden_categories: Vec<String>,
    pub review_text: String,
    /// Start of the rendered page text, for eyeballing what was scraped.
    pub page_text_preview: String,
    pub report: String,
    /// Base64 PNG, present only when diagnostic mode caught a missing heading.
    pub screenshot: Option<String>,
    pub analyzed_at: DateTime<Utc>,
}

impl From<AnalysisOutcome> for AnalyzeResponse {
    fn from(outcome: AnalysisOutcome) -> Self {
        let extraction = outcome.extraction;
        Self {
            request_id: outcome.request_id,
            normalized_url: outcome.normalized_url,
            name: extraction.name,
            category: extraction.category,
            hidden_categories: outcome.hidden_categories.into_iter().collect(),
            page_text_preview: truncate_chars(&extraction.visible_text, PAGE_TEXT_PREVIEW_CHARS)
                .to_string(),
            review_text: extraction.review_text,
            report: outcome.report,
            screenshot: extraction.screenshot.map(|bytes| STANDARD.encode(bytes)),
            analyzed_at: outcome.analyzed_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractor::ExtractionResult;
    use std::collections::BTreeSet;

    fn request(api_key: &str, url: &str) -> AnalyzeRequest {
        AnalyzeRequest {
            api_key: api_key.to_string(),
            url: url.to_string(),
        }
    }

    #[test]
    fn test_analyze_request_valid() {
        assert!(request("key", "https://maps.app.goo.gl/abc").validate().is_ok());
    }

    #[test]
    fn test_analyze_request_missing_fields() {
        assert!(request("", "https://maps.app.goo.gl/abc").validate().is_err());
        assert!(request("   ", "https://maps.app.goo.gl/abc").validate().is_err());
        assert!(request("key", "").validate().is_err());
    }

    #[test]
    fn test_analyze_request_url_too_long() {
        let url = format!("https://example.com/{}", "a".repeat(MAX_URL_LEN));
        assert!(request("key", &url).validate().is_err());
    }

    #[test]
    fn test_response_from_outcome() {
        let outcome = AnalysisOutcome {
            request_id: Uuid::new_v4(),
            normalized_url: "https://www.google.com/maps/place/X".to_string(),
            extraction: ExtractionResult {
                name: "X".to_string(),
                category: "Pharmacy".to_string(),
                visible_text: "X\nOpen 24 hours".to_string(),
                screenshot: Some(b"png".to_vec()),
                ..Default::default()
            },
            hidden_categories: BTreeSet::from(["Drug Store".to_string(), "Chemist".to_string()]),
            report: "report".to_string(),
            analyzed_at: Utc::now(),
        };

        let response = AnalyzeResponse::from(outcome);

        assert_eq!(response.hidden_categories, vec!["Chemist", "Drug Store"]);
        assert_eq!(response.screenshot.as_deref(), Some("cG5n"));
        assert_eq!(response.report, "report");
        assert_eq!(response.page_text_preview, "X\nOpen 24 hours");
    }

    #[test]
    fn test_page_text_preview_is_bounded() {
        let outcome = AnalysisOutcome {
            request_id: Uuid::new_v4(),
            normalized_url: "https://www.google.com/maps/place/X".to_string(),
            extraction: ExtractionResult {
                visible_text: "é".repeat(PAGE_TEXT_PREVIEW_CHARS + 50),
                ..Default::default()
            },
            hidden_categories: BTreeSet::new(),
            report: String::new(),
            analyzed_at: Utc::now(),
        };

        let response = AnalyzeResponse::from(outcome);

        assert_eq!(
            response.page_text_preview.chars().count(),
            PAGE_TEXT_PREVIEW_CHARS
        );
    }
}
