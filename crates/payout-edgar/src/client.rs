//! EDGAR endpoints: filing list, structured facts and filing documents.

use chrono::NaiveDate;
use payout_core::{Cik, CompanyFacts, Filing, FormKind, PayoutError, Result};
use serde::Deserialize;
use tracing::{debug, instrument};

use crate::fetcher::{FetchOptions, Fetcher};

/// SEC EDGAR API base URL
pub const DATA_BASE_URL: &str = "https://data.sec.gov";

/// SEC EDGAR archive base URL, where filing documents live
pub const ARCHIVE_BASE_URL: &str = "https://www.sec.gov";

/// Client for the three EDGAR endpoints the engine reads.
///
/// All traffic goes through one [`Fetcher`], so the throttle and the cache
/// apply uniformly. Base URLs can be pointed at a mock server for tests.
#[derive(Debug, Clone)]
pub struct EdgarClient {
    fetcher: Fetcher,
    data_base_url: String,
    archive_base_url: String,
}

impl EdgarClient {
    /// Creates a client against the public SEC endpoints.
    #[must_use]
    pub fn new(fetcher: Fetcher) -> Self {
        Self {
            fetcher,
            data_base_url: DATA_BASE_URL.to_string(),
            archive_base_url: ARCHIVE_BASE_URL.to_string(),
        }
    }

    /// Overrides both base URLs.
    #[must_use]
    pub fn with_base_urls(mut self, data: impl Into<String>, archive: impl Into<String>) -> Self {
        self.data_base_url = data.into().trim_end_matches('/').to_string();
        self.archive_base_url = archive.into().trim_end_matches('/').to_string();
        self
    }

    /// The underlying fetcher.
    #[must_use]
    pub const fn fetcher(&self) -> &Fetcher {
        &self.fetcher
    }

    /// Submissions (filing list) URL for a company.
    #[must_use]
    pub fn submissions_url(&self, cik: &Cik) -> String {
        format!("{}/submissions/CIK{}.json", self.data_base_url, cik)
    }

    /// Company facts URL for a company.
    #[must_use]
    pub fn facts_url(&self, cik: &Cik) -> String {
        format!(
            "{}/api/xbrl/companyfacts/CIK{}.json",
            self.data_base_url, cik
        )
    }

    /// Canonical URL of a filing's primary document.
    #[must_use]
    pub fn document_url(&self, cik: &Cik, accession: &str, primary_document: &str) -> String {
        format!(
            "{}/Archives/edgar/data/{}/{}/{}",
            self.archive_base_url,
            cik.short(),
            accession.replace('-', ""),
            primary_document
        )
    }

    /// Fetches the most recent annual and quarterly filings, newest period first.
    ///
    /// # Errors
    /// Fails if the filing list cannot be fetched or parsed.
    #[instrument(skip(self, cik, options), fields(cik = %cik))]
    pub async fn filings(
        &self,
        cik: &Cik,
        limit: usize,
        options: &FetchOptions,
    ) -> Result<Vec<Filing>> {
        let body = self.fetcher.fetch(&self.submissions_url(cik), options).await?;
        let submissions: Submissions = serde_json::from_str(&body)
            .map_err(|e| PayoutError::Parse(format!("Failed to parse submissions: {e}")))?;

        let filings = self.recent_filings(cik, &submissions.filings.recent, limit);
        debug!(count = filings.len(), "Parsed filing list");
        Ok(filings)
    }

    /// Fetches every structured fact a company has reported.
    ///
    /// Returns `Ok(None)` when the company has no structured facts at all.
    ///
    /// # Errors
    /// Fails if the endpoint is unavailable or the payload cannot be parsed.
    #[instrument(skip(self, cik, options), fields(cik = %cik))]
    pub async fn company_facts(
        &self,
        cik: &Cik,
        options: &FetchOptions,
    ) -> Result<Option<CompanyFacts>> {
        match self.fetcher.fetch(&self.facts_url(cik), options).await {
            Ok(body) => serde_json::from_str(&body)
                .map(Some)
                .map_err(|e| PayoutError::Parse(format!("Failed to parse company facts: {e}"))),
            Err(PayoutError::Http { status: 404, .. }) => {
                debug!("Company has no structured facts");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// Fetches a filing document's raw markup.
    ///
    /// # Errors
    /// Fails if the document cannot be fetched.
    pub async fn document(&self, url: &str, options: &FetchOptions) -> Result<String> {
        self.fetcher.fetch(url, options).await
    }

    fn recent_filings(&self, cik: &Cik, recent: &RecentFilings, limit: usize) -> Vec<Filing> {
        let mut filings: Vec<Filing> = (0..recent.form.len())
            .filter_map(|i| {
                let form = FormKind::from_form(recent.form.get(i)?)?;
                let accession = recent.accession_number.get(i)?;
                let filing_date = parse_date(recent.filing_date.get(i)?)?;
                let period_end = parse_date(recent.report_date.get(i)?)?;
                let primary_document = recent.primary_document.get(i)?;
                if accession.is_empty() || primary_document.is_empty() {
                    return None;
                }

                Some(Filing::new(
                    form,
                    accession.as_str(),
                    filing_date,
                    period_end,
                    self.document_url(cik, accession, primary_document),
                ))
            })
            .collect();

        filings.sort_by(|a, b| {
            b.period_end
                .cmp(&a.period_end)
                .then_with(|| b.filing_date.cmp(&a.filing_date))
        });
        filings.truncate(limit);
        filings
    }
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").ok()
}

// =============================================================================
// SEC API Response Types
// =============================================================================

/// Company submissions/filings metadata.
#[derive(Debug, Default, Deserialize)]
struct Submissions {
    #[serde(default)]
    filings: SubmissionFilings,
}

#[derive(Debug, Default, Deserialize)]
struct SubmissionFilings {
    #[serde(default)]
    recent: RecentFilings,
}

/// Column-oriented arrays; index `i` across all of them is one filing.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RecentFilings {
    #[serde(default)]
    accession_number: Vec<String>,
    #[serde(default)]
    filing_date: Vec<String>,
    #[serde(default)]
    report_date: Vec<String>,
    #[serde(default)]
    form: Vec<String>,
    #[serde(default)]
    primary_document: Vec<String>,
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rate_limit::RateLimiter;
    use payout_cache::InMemoryCache;
    use payout_core::FetcherConfig;
    use serde_json::json;
    use std::sync::Arc;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer) -> EdgarClient {
        let fetcher = Fetcher::with_limiter(
            FetcherConfig::new("payout-tests/0.1 (test@example.com)").with_max_attempts(1),
            Arc::new(InMemoryCache::new()),
            Arc::new(RateLimiter::unthrottled()),
        )
        .unwrap();
        EdgarClient::new(fetcher).with_base_urls(server.uri(), format!("{}/", server.uri()))
    }

    fn submissions() -> serde_json::Value {
        json!({
            "cik": "320193",
            "name": "Apple Inc.",
            "filings": {"recent": {
                "accessionNumber": [
                    "0000320193-24-000081", "0000320193-24-000123", "0000320193-24-000100",
                    "0000320193-24-000069", "0000320193-24-000200"
                ],
                "filingDate": ["2024-08-02", "2024-11-01", "2024-10-15", "2024-05-03", "2024-11-20"],
                "reportDate": ["2024-06-29", "2024-09-28", "", "2024-03-30", "2024-09-28"],
                "form": ["10-Q", "10-K", "8-K", "10-Q", "10-K/A"],
                "primaryDocument": [
                    "aapl-20240629.htm", "aapl-20240928.htm", "ex99.htm",
                    "aapl-20240330.htm", "aapl-20240928a.htm"
                ]
            }}
        })
    }

    #[tokio::test]
    async fn test_filings_keep_annual_and_quarterly_newest_first() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/submissions/CIK0000320193.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(submissions()))
            .mount(&server)
            .await;

        let client = client(&server);
        let cik = Cik::normalize("320193").unwrap();
        let filings = client.filings(&cik, 10, &FetchOptions::new()).await.unwrap();

        let accessions: Vec<&str> = filings.iter().map(|f| f.accession.as_str()).collect();
        assert_eq!(
            accessions,
            vec![
                "0000320193-24-000123",
                "0000320193-24-000081",
                "0000320193-24-000069"
            ]
        );
        assert_eq!(filings[0].form, FormKind::Annual);
        assert_eq!(
            filings[0].period_end,
            NaiveDate::from_ymd_opt(2024, 9, 28).unwrap()
        );
        assert_eq!(
            filings[0].document_url,
            format!(
                "{}/Archives/edgar/data/320193/000032019324000123/aapl-20240928.htm",
                server.uri()
            )
        );
    }

    #[tokio::test]
    async fn test_filings_respect_limit() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(submissions()))
            .mount(&server)
            .await;

        let cik = Cik::normalize("320193").unwrap();
        let filings = client(&server)
            .filings(&cik, 1, &FetchOptions::new())
            .await
            .unwrap();
        assert_eq!(filings.len(), 1);
        assert_eq!(filings[0].accession, "0000320193-24-000123");
    }

    #[tokio::test]
    async fn test_malformed_submissions_are_parse_errors() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let cik = Cik::normalize("1").unwrap();
        let err = client(&server)
            .filings(&cik, 5, &FetchOptions::new())
            .await
            .unwrap_err();
        assert!(matches!(err, PayoutError::Parse(_)));
    }

    #[tokio::test]
    async fn test_missing_facts_are_not_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/xbrl/companyfacts/CIK0000000042.json"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let cik = Cik::normalize("42").unwrap();
        let facts = client(&server)
            .company_facts(&cik, &FetchOptions::new())
            .await
            .unwrap();
        assert!(facts.is_none());
    }

    #[tokio::test]
    async fn test_company_facts_parse() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/xbrl/companyfacts/CIK0000320193.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "cik": 320193,
                "entityName": "Apple Inc.",
                "facts": {"dei": {"EntityNumberOfEmployees": {
                    "label": "Entity Number of Employees",
                    "units": {"pure": [{
                        "end": "2024-09-28", "val": 164000, "accn": "0000320193-24-000123",
                        "fy": 2024, "fp": "FY", "form": "10-K", "filed": "2024-11-01"
                    }]}
                }}}
            })))
            .mount(&server)
            .await;

        let cik = Cik::normalize("320193").unwrap();
        let facts = client(&server)
            .company_facts(&cik, &FetchOptions::new())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(facts.entity_name.as_deref(), Some("Apple Inc."));
        assert!(facts.concept("dei", "EntityNumberOfEmployees").is_some());
    }

    #[test]
    fn test_public_endpoints() {
        let fetcher = Fetcher::new(
            FetcherConfig::default(),
            Arc::new(InMemoryCache::new()),
        )
        .unwrap();
        let client = EdgarClient::new(fetcher);
        let cik = Cik::normalize("CIK-320193").unwrap();

        assert_eq!(
            client.submissions_url(&cik),
            "https://data.sec.gov/submissions/CIK0000320193.json"
        );
        assert_eq!(
            client.facts_url(&cik),
            "https://data.sec.gov/api/xbrl/companyfacts/CIK0000320193.json"
        );
        assert_eq!(
            client.document_url(&cik, "0000320193-24-000123", "aapl-20240928.htm"),
            "https://www.sec.gov/Archives/edgar/data/320193/000032019324000123/aapl-20240928.htm"
        );
    }
}
