use chrono::{DateTime, Utc};
use std::collections::BTreeSet;
use std::sync::Arc;
use thiserror::Error;
use tracing::{Instrument, info, info_span, warn};
use uuid::Uuid;

use crate::browser::{BrowserError, BrowserLauncher, SessionProfile, setup};
use crate::config::Config;
use crate::extractor::{ExtractionResult, ExtractorSettings, PageExtractor};
use crate::miner::HiddenFieldMiner;
use crate::normalizer::normalize_listing_url;
use crate::report::{ReportGenerator, TextGenerator};

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("invalid listing reference: {0}")]
    InvalidReference(String),

    #[error(transparent)]
    Browser(#[from] BrowserError),
}

#[derive(Debug, Clone)]
pub struct AnalysisOutcome {
    pub request_id: Uuid,
    pub normalized_url: String,
    pub extraction: ExtractionResult,
    pub hidden_categories: BTreeSet<String>,
    pub report: String,
    pub analyzed_at: DateTime<Utc>,
}

/// Normalize, extract, mine and report for one listing. Holds no per-request
/// state; every call opens and closes its own browser session.
pub struct AnalysisPipeline {
    config: Arc<Config>,
    launcher: Arc<dyn BrowserLauncher>,
    extractor: PageExtractor,
    miner: Arc<dyn HiddenFieldMiner>,
    reporter: ReportGenerator,
}

impl AnalysisPipeline {
    pub fn new(
        config: Arc<Config>,
        launcher: Arc<dyn BrowserLauncher>,
        miner: Arc<dyn HiddenFieldMiner>,
    ) -> Self {
        Self {
            extractor: PageExtractor::new(ExtractorSettings::from_config(&config)),
            reporter: ReportGenerator::from_config(&config),
            config,
            launcher,
            miner,
        }
    }

    pub fn with_extractor(mut self, extractor: PageExtractor) -> Self {
        self.extractor = extractor;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub async fn analyze(
        &self,
        raw_url: &str,
        generator: &dyn TextGenerator,
    ) -> Result<AnalysisOutcome, PipelineError> {
        let request_id = Uuid::new_v4();
        self.run(request_id, raw_url, generator)
            .instrument(info_span!("analyze", %request_id))
            .await
    }

    async fn run(
        &self,
        request_id: Uuid,
        raw_url: &str,
        generator: &dyn TextGenerator,
    ) -> Result<AnalysisOutcome, PipelineError> {
        setup::prepare_environment(self.config.browser_install_cmd()).await;

        let normalized_url = normalize_listing_url(raw_url.trim());
        validate_reference(&normalized_url)?;
        info!(url = %normalized_url, "analyzing listing");

        let profile = SessionProfile::from_config(&self.config);
        let session = self.launcher.launch(&profile).await?;

        let extracted = self.extractor.extract(session.as_ref(), &normalized_url).await;
        if let Err(e) = session.close().await {
            warn!(error = %e, "browser session did not close cleanly");
        }
        let extraction = extracted?;

        let hidden_categories = self
            .miner
            .mine(&extraction.raw_markup, &extraction.category);
        let report = self
            .reporter
            .generate(generator, &extraction, &hidden_categories)
            .await;

        info!(
            name = %extraction.name,
            hidden = hidden_categories.len(),
            "analysis finished"
        );

        Ok(AnalysisOutcome {
            request_id,
            normalized_url,
            extraction,
            hidden_categories,
            report,
            analyzed_at: Utc::now(),
        })
    }
}

fn validate_reference(reference: &str) -> Result<(), PipelineError> {
    let parsed = url::Url::parse(reference)
        .map_err(|e| PipelineError::InvalidReference(format!("{reference}: {e}")))?;
    match parsed.scheme() {
        "http" | "https" => Ok(()),
        scheme => Err(PipelineError::InvalidReference(format!(
            "unsupported scheme {scheme}"
        ))),
    }
}
