//! HTTP behaviour of the collaborators against local mock servers.

use std::sync::Arc;
use std::time::Duration;

use catalog::{CandidateRef, CandidateStore, CatalogError, DetailStore, StoreQuery};
use clients::{
    ChatBackend, ChatRequest, ClientError, Enricher, LlmClient, LlmConfig, LlmScoringOracle,
    ReferenceTables, RestCandidateStore, RetryPolicy, ScoringOracle, SupabaseConfig,
    WikipediaEnricher,
};
use pipeline::ScoreCategory;
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn fast_retry(max_retries: u32) -> RetryPolicy {
    RetryPolicy::new(max_retries, Duration::from_millis(1))
}

fn llm(server: &MockServer, max_retries: u32) -> LlmClient {
    let config = LlmConfig::new(server.uri(), "sk-test")
        .with_model("test-model")
        .with_timeout(Duration::from_secs(5))
        .with_retry(fast_retry(max_retries));
    LlmClient::new(config).unwrap()
}

fn completion(content: &str) -> serde_json::Value {
    json!({"choices": [{"message": {"content": content}}]})
}

// =============================================================================
// Chat client
// =============================================================================

#[tokio::test]
async fn chat_sends_model_and_json_mode() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(header("authorization", "Bearer sk-test"))
        .and(body_partial_json(json!({
            "model": "test-model",
            "response_format": {"type": "json_object"}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion("{\"ok\": true}")))
        .expect(1)
        .mount(&server)
        .await;

    let content = llm(&server, 0)
        .chat(&ChatRequest::new("sys", "hi").json())
        .await
        .unwrap();
    assert_eq!(content, "{\"ok\": true}");
}

#[tokio::test]
async fn chat_retries_transient_failures() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .with_priority(1)
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion("rank")))
        .expect(1)
        .mount(&server)
        .await;

    let content = llm(&server, 2)
        .chat(&ChatRequest::new("sys", "hi"))
        .await
        .unwrap();
    assert_eq!(content, "rank");
}

#[tokio::test]
async fn chat_does_not_retry_client_errors() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;

    let err = llm(&server, 3)
        .chat(&ChatRequest::new("sys", "hi"))
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::Status { status: 401, .. }));
    assert!(!err.to_string().contains(&server.uri()));
    assert!(!err.to_string().contains("sk-test"));
}

#[tokio::test]
async fn chat_reports_missing_content() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"choices": []})))
        .mount(&server)
        .await;

    let err = llm(&server, 2)
        .chat(&ChatRequest::new("sys", "hi"))
        .await
        .unwrap_err();
    assert_eq!(err.code(), "malformed_response");
}

// =============================================================================
// Scoring oracle
// =============================================================================

#[tokio::test]
async fn oracle_parses_scores() {
    let server = MockServer::start().await;
    let answer = json!({
        "scored_universities": [
            {"university_name": "CTU", "country": "Czech Republic",
             "scores": {"academic_fit": 70, "lifestyle_fit": 95, "financial_fit": null},
             "reasoning": "Erasmus goldmine"},
            {"university_name": "DTU", "country": "Denmark",
             "scores": {"academic_fit": 85}, "reasoning": "Friday bars"}
        ]
    });

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion(&answer.to_string())))
        .mount(&server)
        .await;

    let oracle = LlmScoringOracle::new(Arc::new(llm(&server, 0)));
    let scored = oracle
        .score(
            &[
                CandidateRef::new("CTU", "Czech Republic"),
                CandidateRef::new("DTU", "Denmark"),
            ],
            "party vibe",
            &ReferenceTables::standard(),
        )
        .await
        .unwrap();

    assert_eq!(scored.len(), 2);
    assert_eq!(scored[0].scores.get(ScoreCategory::LifestyleFit), Some(95));
    assert_eq!(scored[0].scores.get(ScoreCategory::FinancialFit), None);
    assert_eq!(scored[1].reasoning, "Friday bars");
}

#[tokio::test]
async fn oracle_rejects_malformed_scores() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion("here are my thoughts")))
        .mount(&server)
        .await;

    let oracle = LlmScoringOracle::new(Arc::new(llm(&server, 0)));
    let err = oracle
        .score(&[CandidateRef::new("CTU", "Czech Republic")], "", &ReferenceTables::standard())
        .await
        .unwrap_err();
    assert_eq!(err.code(), "malformed_response");
}

// =============================================================================
// PostgREST store
// =============================================================================

fn store(server: &MockServer, max_retries: u32) -> RestCandidateStore {
    let config = SupabaseConfig::new(server.uri(), "service-key").with_retry(fast_retry(max_retries));
    RestCandidateStore::new(config).unwrap()
}

#[tokio::test]
async fn store_pushes_predicates_down() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/universities_requirements"))
        .and(header("apikey", "service-key"))
        .and(query_param("msc_allowed", "eq.true"))
        .and(query_param("and", "(or(min_gpa.lte.85,min_gpa.is.null))"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"name": "CTU", "country": "Czech Republic", "min_gpa": 75, "msc_allowed": true},
            {"name": "Stale Row", "country": "Nowhere", "min_gpa": 99, "msc_allowed": true}
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let query = StoreQuery {
        gpa_at_least: Some(85.0),
        msc_only: true,
        ..StoreQuery::all()
    };
    let rows = store(&server, 0).query(&query).await.unwrap();

    // rows that slip past the pushdown are re-checked locally
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].name, "CTU");
}

#[tokio::test]
async fn store_reads_from_configured_table() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/partner_universities"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"name": "DTU", "country": "Denmark"}
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let config = SupabaseConfig::new(server.uri(), "service-key")
        .with_table("partner_universities")
        .with_retry(fast_retry(0));
    let rows = RestCandidateStore::new(config)
        .unwrap()
        .query(&StoreQuery::all())
        .await
        .unwrap();

    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].name, "DTU");
}

#[tokio::test]
async fn store_failure_is_sanitized() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .expect(2)
        .mount(&server)
        .await;

    let err = store(&server, 1).query(&StoreQuery::all()).await.unwrap_err();
    assert!(matches!(err, CatalogError::Unavailable(_)));
    assert!(!err.to_string().contains(&server.uri()));
    assert!(!err.to_string().contains("service-key"));
}

#[tokio::test]
async fn store_fetches_details_by_name() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/universities_requirements"))
        .and(query_param("name", "eq.CTU"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"name": "CTU", "country": "Czech Republic", "min_gpa": 75, "erasmus_available": true}
        ])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/universities_requirements"))
        .and(query_param("name", "eq.Nowhere U"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let store = store(&server, 0);
    let detail = store.fetch("CTU").await.unwrap().unwrap();
    assert_eq!(detail.country, "Czech Republic");
    assert!(detail.highlights.contains(&"Minimum GPA 75".to_string()));

    assert!(store.fetch("Nowhere U").await.unwrap().is_none());
}

// =============================================================================
// Wikipedia
// =============================================================================

#[tokio::test]
async fn wikipedia_falls_back_to_country_title() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/page/summary/KTH"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/page/summary/KTH_(Sweden)"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"extract": "x".repeat(450)})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let enricher = WikipediaEnricher::with_base_url(
        format!("{}/page/summary", server.uri()),
        Duration::from_secs(5),
    )
    .unwrap();

    let summary = enricher.fetch_summary("KTH", "Sweden").await.unwrap();
    assert_eq!(summary.len(), 403);
    assert!(summary.ends_with("..."));
}

#[tokio::test]
async fn wikipedia_failures_yield_none() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"title": "No extract"})))
        .mount(&server)
        .await;

    let enricher = WikipediaEnricher::with_base_url(
        format!("{}/page/summary", server.uri()),
        Duration::from_secs(5),
    )
    .unwrap();

    assert!(enricher.fetch_summary("Unknown College", "").await.is_none());
}
