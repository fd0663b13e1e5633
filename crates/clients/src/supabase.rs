//! PostgREST-backed candidate store (the hosted requirements table).
//!
//! The flat eligibility predicates are pushed down as PostgREST filters. The
//! same predicates are re-checked on the returned rows, and the engine runs
//! the full rule chain afterwards, so results match the in-memory catalog.

use std::time::Duration;

use async_trait::async_trait;
use catalog::parser::parse_candidates;
use catalog::{
    CandidateDetail, CandidateRecord, CandidateStore, CatalogError, DetailStore, StoreQuery,
};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use tracing::{debug, info};

use crate::error::{ClientError, Result};
use crate::retry::{with_retries, RetryPolicy};

const SERVICE: &str = "candidate store";

#[derive(Clone)]
pub struct SupabaseConfig {
    pub url: String,
    pub service_key: String,
    pub table: String,
    pub timeout: Duration,
    pub retry: RetryPolicy,
}

impl SupabaseConfig {
    pub const DEFAULT_TABLE: &'static str = "universities_requirements";

    pub fn new(url: impl Into<String>, service_key: impl Into<String>) -> Self {
        Self {
            url: url.into().trim_end_matches('/').to_string(),
            service_key: service_key.into(),
            table: Self::DEFAULT_TABLE.to_string(),
            timeout: Duration::from_secs(15),
            retry: RetryPolicy::default(),
        }
    }

    /// Read `SUPABASE_URL` and `SUPABASE_SERVICE_ROLE_KEY`, plus an optional
    /// `SUPABASE_TABLE`.
    pub fn from_env() -> Result<Self> {
        let url = std::env::var("SUPABASE_URL")
            .map_err(|_| ClientError::config("SUPABASE_URL not set"))?;
        let key = std::env::var("SUPABASE_SERVICE_ROLE_KEY")
            .map_err(|_| ClientError::config("SUPABASE_SERVICE_ROLE_KEY not set"))?;

        let config = Self::new(url, key);
        match std::env::var("SUPABASE_TABLE") {
            Ok(table) if !table.trim().is_empty() => Ok(config.with_table(table.trim())),
            _ => Ok(config),
        }
    }

    pub fn with_table(mut self, table: impl Into<String>) -> Self {
        self.table = table.into();
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }
}

impl std::fmt::Debug for SupabaseConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SupabaseConfig")
            .field("url", &self.url)
            .field("service_key", &"<redacted>")
            .field("table", &self.table)
            .field("timeout", &self.timeout)
            .field("retry", &self.retry)
            .finish()
    }
}

/// PostgREST query parameters for a store query.
///
/// ## Algorithm
/// - Boolean requirements become `column=eq.true`
/// - Nullable minimums become `or(column.lte.X,column.is.null)` clauses,
///   combined under a single `and=(...)` parameter (an unset minimum means
///   no requirement)
pub fn pushdown_params(query: &StoreQuery) -> Vec<(String, String)> {
    let mut params = vec![("select".to_string(), "*".to_string())];

    let flags = [
        ("msc_allowed", query.msc_only),
        ("english_only_possible", query.english_only),
        ("erasmus_available", query.erasmus_only),
    ];
    for (column, required) in flags {
        if required {
            params.push((column.to_string(), "eq.true".to_string()));
        }
    }

    let mut minimums = Vec::new();
    if let Some(gpa) = query.gpa_at_least {
        minimums.push(format!("or(min_gpa.lte.{gpa},min_gpa.is.null)"));
    }
    if let Some(semesters) = query.semesters_at_least {
        minimums.push(format!(
            "or(min_semesters_completed.lte.{semesters},min_semesters_completed.is.null)"
        ));
    }
    if !minimums.is_empty() {
        params.push(("and".to_string(), format!("({})", minimums.join(","))));
    }

    params
}

/// Candidate and detail store over the PostgREST API.
#[derive(Debug, Clone)]
pub struct RestCandidateStore {
    client: reqwest::Client,
    config: SupabaseConfig,
}

impl RestCandidateStore {
    pub fn new(config: SupabaseConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        let mut key = HeaderValue::from_str(&config.service_key)
            .map_err(|_| ClientError::config("Invalid service key format"))?;
        let mut bearer = HeaderValue::from_str(&format!("Bearer {}", config.service_key))
            .map_err(|_| ClientError::config("Invalid service key format"))?;
        key.set_sensitive(true);
        bearer.set_sensitive(true);
        headers.insert("apikey", key);
        headers.insert(AUTHORIZATION, bearer);

        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .default_headers(headers)
            .build()
            .map_err(|e| {
                ClientError::config(format!("Failed to create HTTP client: {}", e.without_url()))
            })?;

        Ok(Self { client, config })
    }

    pub fn from_env() -> Result<Self> {
        Self::new(SupabaseConfig::from_env()?)
    }

    fn table_url(&self) -> String {
        format!("{}/rest/v1/{}", self.config.url, self.config.table)
    }

    async fn fetch_rows(&self, params: &[(String, String)]) -> Result<Vec<CandidateRecord>> {
        let response = self
            .client
            .get(self.table_url())
            .query(params)
            .send()
            .await
            .map_err(|e| ClientError::http(SERVICE, e, self.config.timeout))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::Status {
                service: SERVICE,
                status: status.as_u16(),
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| ClientError::http(SERVICE, e, self.config.timeout))?;
        parse_candidates(&self.config.table, &body)
            .map_err(|e| ClientError::malformed(SERVICE, e.to_string()))
    }

    async fn fetch_with_retries(&self, params: &[(String, String)]) -> Result<Vec<CandidateRecord>> {
        with_retries(SERVICE, self.config.retry, || self.fetch_rows(params)).await
    }
}

fn unavailable(err: ClientError) -> CatalogError {
    CatalogError::Unavailable(err.to_string())
}

#[async_trait]
impl CandidateStore for RestCandidateStore {
    fn name(&self) -> &str {
        SERVICE
    }

    async fn query(&self, query: &StoreQuery) -> catalog::Result<Vec<CandidateRecord>> {
        let params = pushdown_params(query);
        debug!("Querying {} with {} parameters", self.config.table, params.len());

        let rows = self.fetch_with_retries(&params).await.map_err(unavailable)?;
        let fetched = rows.len();
        let rows: Vec<CandidateRecord> = rows.into_iter().filter(|r| query.matches(r)).collect();

        info!(
            "Fetched {} rows from {} ({} after re-check)",
            fetched,
            self.config.table,
            rows.len()
        );
        Ok(rows)
    }
}

#[async_trait]
impl DetailStore for RestCandidateStore {
    async fn fetch(&self, name: &str) -> catalog::Result<Option<CandidateDetail>> {
        let params = vec![
            ("select".to_string(), "*".to_string()),
            ("name".to_string(), format!("eq.{name}")),
            ("limit".to_string(), "1".to_string()),
        ];
        let rows = self.fetch_with_retries(&params).await.map_err(unavailable)?;
        Ok(rows.first().map(CandidateDetail::from_record))
    }
}
