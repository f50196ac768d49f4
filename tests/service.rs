//! End-to-end tests of the library boundary: store, matcher, tools and the
//! HTTP server, with a fake source page in place of the network.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use faq_harness::config::{Config, ExtraEntry, MatchMode};
use faq_harness::error::FetchError;
use faq_harness::faq::FaqService;
use faq_harness::fetch::{FetchedPage, PageFetcher};
use faq_harness::server::run_server_with_service;
use faq_harness::store::CorpusStore;
use faq_harness::tools::ToolRegistry;
use tempfile::TempDir;

const FAQ_PAGE: &str = r#"<html><head><title>FAQs</title></head><body>
  <h1>Frequently Asked Questions</h1>
  <h2>How do I collect my saliva sample?</h2>
  <p>Spit into the tube from the kit mailed to you, then seal it.</p>
  <h2>How can I contact customer support?</h2>
  <p>Email our support team or call during business hours.</p>
  <h3>When will I receive my report?</h3>
  <div>Reports are ready within four weeks of the lab receiving your kit.</div>
</body></html>"#;

/// Fake source page that can be switched off and counts fetches.
struct FakeSite {
    body: String,
    down: AtomicBool,
    calls: AtomicUsize,
}

impl FakeSite {
    fn new(body: &str) -> Arc<Self> {
        Arc::new(Self {
            body: body.to_string(),
            down: AtomicBool::new(false),
            calls: AtomicUsize::new(0),
        })
    }

    fn down() -> Arc<Self> {
        let site = Self::new("");
        site.down.store(true, Ordering::SeqCst);
        site
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PageFetcher for FakeSite {
    async fn fetch(&self, url: &str) -> Result<FetchedPage, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.down.load(Ordering::SeqCst) {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: 503,
            });
        }
        Ok(FetchedPage {
            url: url.to_string(),
            status: 200,
            body: self.body.clone(),
        })
    }
}

fn test_config(tmp: &TempDir) -> Config {
    let mut config = Config::default();
    config.source.url = "https://faq.example.com/faqs/".to_string();
    config.cache.path = tmp.path().join("data").join("faqs_cache.json");
    config
}

fn service(config: &Config, site: Arc<FakeSite>) -> FaqService {
    let store = Arc::new(CorpusStore::new(config, site));
    FaqService::new(store, &config.retrieval)
}

// ─── Library boundary ───────────────────────────────────────────────

#[tokio::test]
async fn test_snapshot_survives_process_restart() {
    let tmp = TempDir::new().unwrap();
    let config = test_config(&tmp);

    let first = service(&config, FakeSite::new(FAQ_PAGE));
    let loaded = first.store().load().await.unwrap();
    assert_eq!(loaded.len(), 3);
    assert!(config.cache.path.exists());

    // A fresh store with the network down must serve the same corpus.
    let offline = FakeSite::down();
    let second = service(&config, offline.clone());
    let reloaded = second.store().load().await.unwrap();
    assert_eq!(reloaded.entries(), loaded.entries());
    assert_eq!(offline.calls(), 0);
}

#[tokio::test]
async fn test_search_is_idempotent() {
    let tmp = TempDir::new().unwrap();
    let config = test_config(&tmp);
    let site = FakeSite::new(FAQ_PAGE);
    let svc = service(&config, site.clone());

    let a = svc.search_faq("how to collect sample").await;
    let b = svc.search_faq("how to collect sample").await;
    assert_eq!(a, b);
    assert_eq!(a.results[0].question, "How do I collect my saliva sample?");
    assert_eq!(site.calls(), 1);
}

#[tokio::test]
async fn test_verbatim_question_ranks_first_in_both_modes() {
    let tmp = TempDir::new().unwrap();
    let config = test_config(&tmp);
    let svc = service(&config, FakeSite::new(FAQ_PAGE));

    for mode in [MatchMode::Strict, MatchMode::Citation] {
        let response = svc.search("When will I receive my report?", mode).await;
        assert_eq!(response.results[0].question, "When will I receive my report?");
        assert_eq!(response.results[0].source_url, "https://faq.example.com/faqs/");
    }
}

#[tokio::test]
async fn test_unrelated_question_strict_mode_is_empty() {
    let tmp = TempDir::new().unwrap();
    let config = test_config(&tmp);
    let svc = service(&config, FakeSite::new(FAQ_PAGE));

    let response = svc.search("what is the weather today", MatchMode::Strict).await;
    assert_eq!(response.query, "what is the weather today");
    assert!(response.results.is_empty());
}

#[tokio::test]
async fn test_citation_mode_bounds() {
    let tmp = TempDir::new().unwrap();
    let config = test_config(&tmp);
    let svc = service(&config, FakeSite::new(FAQ_PAGE));

    let response = svc.search("how do I get my kit", MatchMode::Citation).await;
    assert!(response.results.len() <= 3);
    for r in &response.results {
        assert!((0.0..=1.0).contains(&r.score));
        assert!(r.score >= 0.20);
    }
}

#[tokio::test]
async fn test_unstructured_page_falls_back_to_raw_text() {
    let tmp = TempDir::new().unwrap();
    let mut config = test_config(&tmp);
    config.extraction.raw_text_limit = 80;
    let body = format!(
        "<html><body><script>var x = 1;</script><p>{}</p></body></html>",
        "Our team answers questions about genetic testing. ".repeat(20)
    );
    let svc = service(&config, FakeSite::new(&body));

    let index = svc.store().load().await.unwrap();
    assert_eq!(index.len(), 1);
    let entry = &index.entries()[0];
    assert!(!entry.answer.is_empty());
    assert!(entry.answer.chars().count() <= 80);
    assert!(!entry.answer.contains("var x"));
}

#[tokio::test]
async fn test_unreachable_source_without_cache_is_fail_soft() {
    let tmp = TempDir::new().unwrap();
    let config = test_config(&tmp);
    let svc = service(&config, FakeSite::down());

    let response = svc.search_faq("how to collect sample").await;
    assert_eq!(response.query, "how to collect sample");
    assert!(response.results.is_empty());
    assert!(!config.cache.path.exists());
}

#[tokio::test]
async fn test_invalidate_then_refresh() {
    let tmp = TempDir::new().unwrap();
    let config = test_config(&tmp);
    let site = FakeSite::new(FAQ_PAGE);
    let svc = service(&config, site.clone());

    svc.search_faq("report").await;
    svc.store().invalidate();
    assert!(!svc.store().is_loaded());

    // Invalidation drops memory only; the snapshot still satisfies the reload.
    svc.search_faq("report").await;
    assert_eq!(site.calls(), 1);

    svc.store().refresh().await.unwrap();
    assert_eq!(site.calls(), 2);
}

#[tokio::test]
async fn test_extra_entries_are_searchable() {
    let tmp = TempDir::new().unwrap();
    let mut config = test_config(&tmp);
    config.extra_entries.push(ExtraEntry {
        question: "Do you ship internationally?".to_string(),
        answer: "Only within India for now.".to_string(),
        url: None,
    });
    let svc = service(&config, FakeSite::new(FAQ_PAGE));

    let response = svc
        .search("Do you ship internationally?", MatchMode::Strict)
        .await;
    assert_eq!(response.results.len(), 1);
    assert_eq!(response.results[0].answer, "Only within India for now.");
    assert_eq!(response.results[0].source_url, "https://faq.example.com/faqs/");
}

// ─── HTTP server ────────────────────────────────────────────────────

fn find_free_port() -> u16 {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap().port()
}

async fn wait_for_server(port: u16) {
    let client = reqwest::Client::new();
    let url = format!("http://127.0.0.1:{}/health", port);
    for _ in 0..50 {
        tokio::time::sleep(std::time::Duration::from_millis(100)).await;
        if let Ok(resp) = client.get(&url).send().await {
            if resp.status().is_success() {
                return;
            }
        }
    }
    panic!("Server did not become ready within 5 seconds");
}

async fn spawn_server(config: &Config, site: Arc<FakeSite>) -> String {
    let port = find_free_port();
    let bind = format!("127.0.0.1:{}", port);
    let svc = Arc::new(service(config, site));
    let addr = bind.clone();
    tokio::spawn(async move {
        run_server_with_service(&addr, svc, ToolRegistry::with_builtins())
            .await
            .unwrap();
    });
    wait_for_server(port).await;
    format!("http://{}", bind)
}

#[tokio::test]
async fn test_http_faq_and_tools() {
    let tmp = TempDir::new().unwrap();
    let config = test_config(&tmp);
    let base = spawn_server(&config, FakeSite::new(FAQ_PAGE)).await;
    let client = reqwest::Client::new();

    let health: serde_json::Value = client
        .get(format!("{}/health", base))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(health["status"], "ok");
    assert_eq!(health["corpus_loaded"], false);

    let resp = client
        .get(format!("{}/faq", base))
        .query(&[("q", "How can I contact customer support?"), ("mode", "strict")])
        .send()
        .await
        .unwrap();
    assert!(resp.status().is_success());
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["results"].as_array().unwrap().len(), 1);
    assert_eq!(
        body["results"][0]["question"],
        "How can I contact customer support?"
    );

    let list: serde_json::Value = client
        .get(format!("{}/tools/list", base))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let names: Vec<&str> = list["tools"]
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["search_faq", "refresh_corpus"]);

    let resp = client
        .post(format!("{}/tools/search_faq", base))
        .json(&serde_json::json!({ "query": "how to collect sample" }))
        .send()
        .await
        .unwrap();
    assert!(resp.status().is_success());
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["result"]["query"], "how to collect sample");
    assert_eq!(
        body["result"]["results"][0]["question"],
        "How do I collect my saliva sample?"
    );

    let resp = client
        .post(format!("{}/tools/refresh_corpus", base))
        .json(&serde_json::json!({}))
        .send()
        .await
        .unwrap();
    assert!(resp.status().is_success());
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["result"]["entries"], 3);
}

#[tokio::test]
async fn test_http_error_contract() {
    let tmp = TempDir::new().unwrap();
    let config = test_config(&tmp);
    let base = spawn_server(&config, FakeSite::down()).await;
    let client = reqwest::Client::new();

    let resp = client
        .post(format!("{}/tools/nope", base))
        .json(&serde_json::json!({}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 404);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["code"], "not_found");

    let resp = client
        .get(format!("{}/faq", base))
        .query(&[("q", "kit"), ("mode", "fuzzy")])
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 400);

    // Search stays fail-soft even with the source down.
    let resp = client
        .get(format!("{}/faq", base))
        .query(&[("q", "how to collect sample")])
        .send()
        .await
        .unwrap();
    assert!(resp.status().is_success());
    let body: serde_json::Value = resp.json().await.unwrap();
    assert!(body["results"].as_array().unwrap().is_empty());

    let resp = client
        .post(format!("{}/corpus/refresh", base))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 502);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["code"], "fetch_error");
}
