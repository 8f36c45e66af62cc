//! Metrics orchestration for one company.

use chrono::Utc;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use payout_core::{
    Cik, CompanyFacts, CompanyMetricsReport, ContentCache, EmployeeEvidence, EngineConfig, Filing,
    MetricProvenance, MetricSnapshot, NARRATIVE_FALLBACK, PayoutError, Result,
};
use payout_edgar::{
    DIVIDEND_TAGS, EMPLOYEE_TAGS, EdgarClient, FetchOptions, Fetcher, REPURCHASE_TAGS,
    TagCandidate, resolve,
};
use payout_text::{EXTRACTION_METHOD, NarrativeExtractor, strip_markup};

use crate::ttm::compute_ttm;

/// Computes capital-return metrics for a company's recent filings.
///
/// Filings are processed one at a time, newest first. Structured facts are
/// preferred for every metric. When a 10-K has no structured headcount, its
/// primary document is fetched and scanned for one. Failures on that fallback
/// path become warnings on the affected snapshot; only a failure to load the
/// filing list aborts the run.
///
/// # Example
///
/// ```rust,ignore
/// use std::sync::Arc;
/// use payout::{EngineConfig, InMemoryCache, MetricsEngine};
///
/// let engine = MetricsEngine::new(EngineConfig::from_env()?, Arc::new(InMemoryCache::new()))?;
/// let report = engine.compute("320193").await?;
/// for snapshot in &report.snapshots {
///     println!("{} {:?}", snapshot.filing.accession, snapshot.total_returned);
/// }
/// ```
#[derive(Debug, Clone)]
pub struct MetricsEngine {
    client: EdgarClient,
    extractor: NarrativeExtractor,
    config: EngineConfig,
}

impl MetricsEngine {
    /// Creates an engine against the public SEC endpoints.
    ///
    /// # Errors
    /// Fails if the fetcher or narrative settings are invalid.
    pub fn new(config: EngineConfig, cache: Arc<dyn ContentCache>) -> Result<Self> {
        let fetcher = Fetcher::new(config.fetcher.clone(), cache)?;
        Self::with_client(config, EdgarClient::new(fetcher))
    }

    /// Creates an engine around an existing client.
    ///
    /// # Errors
    /// Fails if the narrative settings are invalid.
    pub fn with_client(config: EngineConfig, client: EdgarClient) -> Result<Self> {
        if config.recent_filings == 0 {
            return Err(PayoutError::InvalidParameter(
                "recent_filings must be at least 1".to_string(),
            ));
        }
        let extractor = NarrativeExtractor::new(&config.narrative)?;
        Ok(Self {
            client,
            extractor,
            config,
        })
    }

    /// The EDGAR client.
    #[must_use]
    pub const fn client(&self) -> &EdgarClient {
        &self.client
    }

    /// Engine settings.
    #[must_use]
    pub const fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Normalizes `input` and computes its report.
    ///
    /// # Errors
    /// - [`PayoutError::InvalidIdentifier`] before any request is made
    /// - any error raised while loading the filing list
    pub async fn compute(&self, input: &str) -> Result<CompanyMetricsReport> {
        let cik = Cik::normalize(input)?;
        self.compute_for(&cik, None).await
    }

    /// Computes the report for a normalized identifier.
    ///
    /// When `cancel` fires, the in-flight request is aborted and
    /// [`PayoutError::Cancelled`] is returned.
    ///
    /// # Errors
    /// Fails if the filing list cannot be loaded or the run is cancelled.
    #[instrument(skip(self, cik, cancel), fields(cik = %cik))]
    pub async fn compute_for(
        &self,
        cik: &Cik,
        cancel: Option<CancellationToken>,
    ) -> Result<CompanyMetricsReport> {
        let options = |ttl| {
            let options = FetchOptions::new().with_ttl(ttl);
            match &cancel {
                Some(token) => options.with_cancel(token.clone()),
                None => options,
            }
        };

        let filings = self
            .client
            .filings(cik, self.config.recent_filings, &options(self.config.submissions_ttl))
            .await?;
        debug!(count = filings.len(), "Processing filings");

        let (facts, facts_warning) = match self
            .client
            .company_facts(cik, &options(self.config.facts_ttl))
            .await
        {
            Ok(facts) => (facts, None),
            Err(e @ PayoutError::Cancelled(_)) => return Err(e),
            Err(e) => {
                warn!(error = %e, "Structured facts unavailable, continuing without them");
                (None, Some(format!("Structured facts unavailable: {e}")))
            }
        };

        let document_options = options(self.config.document_ttl)
            .with_max_bytes(self.config.narrative_max_bytes);

        let mut snapshots = Vec::with_capacity(filings.len());
        for filing in filings {
            let snapshot = self
                .snapshot(filing, facts.as_ref(), facts_warning.as_deref(), &document_options)
                .await?;
            snapshots.push(snapshot);
        }

        let ttm = compute_ttm(&snapshots);
        info!(snapshots = snapshots.len(), "Computed metrics");

        Ok(CompanyMetricsReport {
            cik: cik.clone(),
            snapshots,
            ttm,
            last_updated: Utc::now(),
        })
    }

    async fn snapshot(
        &self,
        filing: Filing,
        facts: Option<&CompanyFacts>,
        facts_warning: Option<&str>,
        document_options: &FetchOptions,
    ) -> Result<MetricSnapshot> {
        let mut provenance = MetricProvenance::default();
        if let Some(warning) = facts_warning {
            provenance.warn(warning);
        }

        let dividends = resolve_metric(facts, DIVIDEND_TAGS, &filing, &mut provenance);
        let repurchases = resolve_metric(facts, REPURCHASE_TAGS, &filing, &mut provenance);
        let mut employees =
            resolve_metric(facts, EMPLOYEE_TAGS, &filing, &mut provenance).and_then(headcount);

        // Quarterly reports rarely describe the workforce, so only 10-Ks are scanned
        if employees.is_none() && filing.is_annual() {
            employees = self
                .narrative_employees(&filing, &mut provenance, document_options)
                .await?;
        }

        Ok(MetricSnapshot::new(
            filing,
            dividends,
            repurchases,
            employees,
            provenance,
        ))
    }

    async fn narrative_employees(
        &self,
        filing: &Filing,
        provenance: &mut MetricProvenance,
        options: &FetchOptions,
    ) -> Result<Option<u64>> {
        provenance.record_fallback(NARRATIVE_FALLBACK);

        let markup = match self.client.document(&filing.document_url, options).await {
            Ok(markup) => markup,
            Err(e @ PayoutError::Cancelled(_)) => return Err(e),
            Err(e) => {
                warn!(accession = %filing.accession, error = %e, "Narrative fallback failed");
                provenance.warn(
                    PayoutError::PartialExtraction {
                        accession: filing.accession.clone(),
                        reason: e.to_string(),
                    }
                    .to_string(),
                );
                return Ok(None);
            }
        };

        let text = strip_markup(&markup);
        let extraction = self.extractor.extract(&text);
        for warning in extraction.warnings {
            provenance.warn(warning);
        }

        let (Some(count), Some(quote), Some(span)) =
            (extraction.count, extraction.quote, extraction.span)
        else {
            debug!(accession = %filing.accession, "No headcount found in filing text");
            return Ok(None);
        };

        provenance.employee_evidence = Some(EmployeeEvidence {
            source_url: filing.document_url.clone(),
            accession: filing.accession.clone(),
            form: filing.form,
            period_end: Some(filing.period_end),
            quote,
            method: EXTRACTION_METHOD.to_string(),
            span,
        });
        Ok(Some(count))
    }
}

fn resolve_metric(
    facts: Option<&CompanyFacts>,
    candidates: &[TagCandidate],
    filing: &Filing,
    provenance: &mut MetricProvenance,
) -> Option<f64> {
    let resolution = resolve(facts?, candidates, filing.form, filing.period_end);
    if let Some(tag) = resolution.tag_used {
        provenance.record_tag(tag);
    }
    for warning in resolution.warnings {
        provenance.warn(warning);
    }
    resolution.value
}

// A zero headcount is a tagging artifact, not a workforce.
fn headcount(value: f64) -> Option<u64> {
    (value.is_finite() && value >= 0.5).then(|| value.round() as u64)
}
