//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock HTTP servers and test
//! the full crawl cycle end-to-end.

use lang_ripple::config::{Config, CrawlConfig, OutputConfig, PolitenessConfig, UserAgentConfig};
use lang_ripple::crawler::{Coordinator, StopReason};
use lang_ripple::graph::{compute_pagerank, PageRankOptions};
use lang_ripple::output::{read_gml, EdgeListExporter, GmlExporter, GraphExporter};
use wiremock::matchers::{method, path, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration restricted to the mock server's host
fn create_test_config(server: &MockServer, budget: u64, seeds: &[&str]) -> Config {
    let base_url = server.uri();

    Config {
        crawl: CrawlConfig {
            page_budget: budget,
            allowed_domain: base_url.clone(),
            seeds: seeds.iter().map(|s| format!("{}{}", base_url, s)).collect(),
            base_language: "en".to_string(),
            article_prefix: "/wiki/".to_string(),
            max_duration_secs: None,
        },
        politeness: PolitenessConfig {
            max_concurrent_fetches: 1,
            download_delay_ms: 0,
            max_delay_ms: 10,
            retry_backoff_ms: 1,
            max_attempts: 1,
            request_timeout_secs: 5,
            ..PolitenessConfig::default()
        },
        user_agent: UserAgentConfig {
            crawler_name: "TestBot".to_string(),
            crawler_version: "1.0.0".to_string(),
            contact_url: "https://example.com/contact".to_string(),
            contact_email: "test@example.com".to_string(),
        },
        output: OutputConfig::default(),
    }
}

/// An article page with language alternates and outbound links
fn article(languages: &[&str], links: &[&str]) -> ResponseTemplate {
    let mut body = String::from("<html><head><title>Article</title></head><body>\n");
    for link in links {
        body.push_str(&format!("<a href=\"{}\">link</a>\n", link));
    }
    body.push_str("<ul class=\"interlanguage\">\n");
    for lang in languages {
        body.push_str(&format!(
            "<li><a hreflang=\"{0}\" href=\"https://{0}.example.org/wiki/Article\">{0}</a></li>\n",
            lang
        ));
    }
    body.push_str("</ul></body></html>");

    ResponseTemplate::new(200).set_body_raw(body.into_bytes(), "text/html")
}

async fn mount_article(server: &MockServer, page: &str, response: ResponseTemplate, hits: u64) {
    Mock::given(method("GET"))
        .and(path(page))
        .respond_with(response)
        .expect(hits)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_budget_limits_fetches_breadth_first() {
    let server = MockServer::start().await;

    mount_article(
        &server,
        "/wiki/A",
        article(&["fr"], &["/wiki/B", "/wiki/C", "/wiki/D"]),
        1,
    )
    .await;
    mount_article(&server, "/wiki/B", article(&["de"], &[]), 1).await;
    mount_article(&server, "/wiki/C", article(&[], &[]), 1).await;
    mount_article(&server, "/wiki/D", article(&["es"], &[]), 0).await;

    let config = create_test_config(&server, 3, &["/wiki/A"]);
    let result = Coordinator::new(config).unwrap().run().await.unwrap();

    assert_eq!(result.pages_processed(), 3);
    assert_eq!(result.pages_succeeded(), 3);
    assert_eq!(result.stop_reason(), StopReason::BudgetReached);

    let graph = result.graph();
    let nodes: Vec<&str> = graph.nodes().collect();
    assert_eq!(nodes, vec!["de", "en", "fr"]);
    assert_eq!(graph.weight("en", "fr"), 1);
    assert_eq!(graph.weight("de", "en"), 1);
    assert!(!graph.contains_node("es"));
}

#[tokio::test]
async fn test_single_language_page_still_enqueues_links() {
    let server = MockServer::start().await;

    mount_article(&server, "/wiki/X", article(&[], &["/wiki/Y"]), 1).await;
    mount_article(&server, "/wiki/Y", article(&["es"], &[]), 1).await;

    let config = create_test_config(&server, 10, &["/wiki/X"]);
    let result = Coordinator::new(config).unwrap().run().await.unwrap();

    assert_eq!(result.pages_processed(), 2);
    assert_eq!(result.stop_reason(), StopReason::FrontierExhausted);

    let graph = result.graph();
    assert_eq!(graph.edge_count(), 1);
    let edge = graph.edge("en", "es").unwrap();
    assert!(edge.contains_article("Y"));
    assert!(!edge.contains_article("X"));
}

#[tokio::test]
async fn test_off_domain_and_namespace_links_never_fetched() {
    let server = MockServer::start().await;
    let port = url::Url::parse(&server.uri()).unwrap().port().unwrap();

    let links = vec![
        "https://other.example.org/wiki/Elsewhere".to_string(),
        // Same server, but a different host name
        format!("http://localhost:{}/wiki/Alias", port),
        "/wiki/Category:Languages".to_string(),
        "/w/index.php?title=A&action=edit".to_string(),
        "/wiki/B".to_string(),
    ];
    let link_refs: Vec<&str> = links.iter().map(String::as_str).collect();

    mount_article(&server, "/wiki/A", article(&["fr"], &link_refs), 1).await;
    mount_article(&server, "/wiki/B", article(&[], &[]), 1).await;
    mount_article(&server, "/wiki/Alias", article(&[], &[]), 0).await;
    mount_article(&server, "/wiki/Category:Languages", article(&[], &[]), 0).await;

    let config = create_test_config(&server, 50, &["/wiki/A"]);
    let result = Coordinator::new(config).unwrap().run().await.unwrap();

    assert_eq!(result.pages_processed(), 2);
}

#[tokio::test]
async fn test_off_domain_redirect_never_followed() {
    let server = MockServer::start().await;
    let elsewhere = MockServer::start().await;
    let port = url::Url::parse(&elsewhere.uri()).unwrap().port().unwrap();

    mount_article(&server, "/wiki/A", article(&["fr"], &["/wiki/R"]), 1).await;
    Mock::given(method("GET"))
        .and(path("/wiki/R"))
        .respond_with(ResponseTemplate::new(302).insert_header(
            "Location",
            format!("http://localhost:{}/wiki/Elsewhere", port).as_str(),
        ))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .respond_with(article(&["de"], &[]))
        .expect(0)
        .mount(&elsewhere)
        .await;

    let config = create_test_config(&server, 10, &["/wiki/A"]);
    let result = Coordinator::new(config).unwrap().run().await.unwrap();

    assert_eq!(result.pages_processed(), 2);
    assert_eq!(result.counters().failed_permanent, 1);
    assert!(elsewhere.received_requests().await.unwrap().is_empty());
    assert!(!result.graph().contains_node("de"));
}

#[tokio::test]
async fn test_duplicate_links_fetched_once() {
    let server = MockServer::start().await;

    mount_article(
        &server,
        "/wiki/A",
        article(&["fr"], &["/wiki/B", "/wiki/B#History", "/wiki/C"]),
        1,
    )
    .await;
    mount_article(&server, "/wiki/B", article(&["fr"], &["/wiki/A", "/wiki/C"]), 1).await;
    mount_article(&server, "/wiki/C", article(&["fr"], &["/wiki/A", "/wiki/B"]), 1).await;

    let config = create_test_config(&server, 50, &["/wiki/A", "/wiki/A"]);
    let result = Coordinator::new(config).unwrap().run().await.unwrap();

    assert_eq!(result.pages_processed(), 3);

    // Three distinct articles share the (en, fr) pair
    let edge = result.graph().edge("fr", "en").unwrap();
    assert_eq!(edge.weight(), 3);
    let articles: Vec<&str> = edge.articles().collect();
    assert_eq!(articles, vec!["A", "B", "C"]);
}

#[tokio::test]
async fn test_failed_fetches_yield_empty_graph() {
    let server = MockServer::start().await;

    mount_article(&server, "/wiki/Missing", ResponseTemplate::new(404), 1).await;
    mount_article(&server, "/wiki/Broken", ResponseTemplate::new(503), 1).await;

    let config = create_test_config(&server, 10, &["/wiki/Missing", "/wiki/Broken"]);
    let result = Coordinator::new(config).unwrap().run().await.unwrap();

    assert_eq!(result.pages_processed(), 2);
    assert_eq!(result.pages_succeeded(), 0);
    assert_eq!(result.counters().failed_permanent, 1);
    assert_eq!(result.counters().failed_transient, 1);
    assert!(result.graph().is_empty());
}

#[tokio::test]
async fn test_cancel_before_run_yields_empty_result() {
    let server = MockServer::start().await;
    mount_article(&server, "/wiki/A", article(&["fr"], &[]), 0).await;

    let config = create_test_config(&server, 10, &["/wiki/A"]);
    let coordinator = Coordinator::new(config).unwrap();
    coordinator.cancellation_token().cancel();

    let result = coordinator.run().await.unwrap();
    assert_eq!(result.stop_reason(), StopReason::Cancelled);
    assert_eq!(result.pages_processed(), 0);
    assert!(result.graph().is_empty());
}

#[tokio::test]
async fn test_concurrent_crawl_respects_budget() {
    let server = MockServer::start().await;

    let links: Vec<String> = (0..30).map(|i| format!("/wiki/P{}", i)).collect();
    let link_refs: Vec<&str> = links.iter().map(String::as_str).collect();

    Mock::given(method("GET"))
        .and(path_regex(r"^/wiki/(Hub|P\d+)$"))
        .respond_with(article(&["fr", "de"], &link_refs))
        .mount(&server)
        .await;

    let mut config = create_test_config(&server, 7, &["/wiki/Hub"]);
    config.politeness.max_concurrent_fetches = 4;
    let result = Coordinator::new(config).unwrap().run().await.unwrap();

    assert_eq!(result.pages_processed(), 7);
    assert_eq!(result.stop_reason(), StopReason::BudgetReached);

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 7);

    // Every page carries {en, fr, de}
    let graph = result.graph();
    assert_eq!(graph.edge_count(), 3);
    for (_, edge) in graph.edges() {
        assert_eq!(edge.weight(), 7);
    }
}

#[tokio::test]
async fn test_time_limit_stops_crawl() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/wiki/Slow"))
        .respond_with(
            article(&["fr"], &["/wiki/Never"]).set_delay(std::time::Duration::from_millis(1500)),
        )
        .mount(&server)
        .await;
    mount_article(&server, "/wiki/Never", article(&[], &[]), 0).await;

    let mut config = create_test_config(&server, 10, &["/wiki/Slow"]);
    config.crawl.max_duration_secs = Some(1);
    let result = Coordinator::new(config).unwrap().run().await.unwrap();

    // The in-flight fetch still drains and merges
    assert_eq!(result.stop_reason(), StopReason::TimeLimit);
    assert_eq!(result.pages_processed(), 1);
    assert_eq!(result.graph().weight("en", "fr"), 1);
}

#[tokio::test]
async fn test_exports_after_crawl() {
    let server = MockServer::start().await;

    mount_article(&server, "/wiki/A", article(&["fr", "de"], &["/wiki/B"]), 1).await;
    mount_article(&server, "/wiki/B", article(&["fr"], &[]), 1).await;

    let config = create_test_config(&server, 10, &["/wiki/A"]);
    let result = Coordinator::new(config).unwrap().run().await.unwrap();

    let dir = tempfile::tempdir().unwrap();
    let csv_path = dir.path().join("languages.csv");
    let gml_path = dir.path().join("languages.gml");

    EdgeListExporter.export(result.graph(), &csv_path).unwrap();
    GmlExporter.export(result.graph(), &gml_path).unwrap();

    let csv = std::fs::read_to_string(&csv_path).unwrap();
    assert_eq!(csv, "lang1,lang2,weight\nde,en,1\nde,fr,1\nen,fr,2\n");

    let gml = std::fs::read_to_string(&gml_path).unwrap();
    assert_eq!(gml.matches("  node [").count(), 3);
    assert!(gml.contains("    weight 2\n"));

    // Unweighted, the triangle is symmetric
    let scores = compute_pagerank(result.graph(), &PageRankOptions::default()).unwrap();
    let total: f64 = scores.values().sum();
    assert!((total - 1.0).abs() < 1e-9);
    assert!((scores["en"] - scores["de"]).abs() < 1e-6);

    let weighted = PageRankOptions {
        weighted: true,
        ..PageRankOptions::default()
    };
    let scores = compute_pagerank(result.graph(), &weighted).unwrap();
    assert!(scores["en"] > scores["de"]);
}

#[tokio::test]
async fn test_edge_list_quotes_codes_from_markup() {
    let server = MockServer::start().await;

    mount_article(&server, "/wiki/A", article(&["zh,Hant", "fr"], &[]), 1).await;

    let config = create_test_config(&server, 10, &["/wiki/A"]);
    let result = Coordinator::new(config).unwrap().run().await.unwrap();
    assert!(result.graph().contains_node("zh,Hant"));

    let dir = tempfile::tempdir().unwrap();
    let csv_path = dir.path().join("languages.csv");
    EdgeListExporter.export(result.graph(), &csv_path).unwrap();

    let mut reader = csv::Reader::from_path(&csv_path).unwrap();
    let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
    assert_eq!(rows.len(), 3);
    assert!(rows.iter().all(|row| row.len() == 3));
    assert!(rows
        .iter()
        .any(|row| &row[0] == "en" && &row[1] == "zh,Hant" && &row[2] == "1"));
}

#[tokio::test]
async fn test_saved_graph_reloads_for_pagerank() {
    let server = MockServer::start().await;

    mount_article(&server, "/wiki/A", article(&["fr", "de"], &["/wiki/B"]), 1).await;
    mount_article(&server, "/wiki/B", article(&["fr"], &[]), 1).await;

    let config = create_test_config(&server, 10, &["/wiki/A"]);
    let result = Coordinator::new(config).unwrap().run().await.unwrap();

    let dir = tempfile::tempdir().unwrap();
    let gml_path = dir.path().join("languages.gml");
    GmlExporter.export(result.graph(), &gml_path).unwrap();

    let loaded = read_gml(&gml_path).unwrap();
    assert_eq!(&loaded, result.graph());

    let options = PageRankOptions::default();
    let reloaded = compute_pagerank(&loaded, &options).unwrap();
    let original = compute_pagerank(result.graph(), &options).unwrap();
    assert_eq!(reloaded.len(), original.len());
    for (code, score) in &original {
        assert!((reloaded[code] - score).abs() < 1e-12, "{}", code);
    }
}
