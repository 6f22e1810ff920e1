use crate::common::{read_meta, store, test_config};
use corpus_harvest::Coordinator;
use serde_json::json;
use tempfile::TempDir;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_remote_renderer_markdown_page() {
    let render_service = MockServer::start().await;
    let site = MockServer::start().await;
    let seed = format!("{}/", site.uri());
    let page_url = format!("{}/intro", site.uri());

    Mock::given(method("POST"))
        .and(path("/crawl"))
        .and(body_partial_json(json!({
            "urls": [seed],
            "crawler_config": {"params": {
                "page_timeout": 5000,
                "cache_mode": {"type": "CacheMode", "params": "bypass"},
                "deep_crawl_strategy": {"params": {"max_pages": 150}}
            }}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "results": [{
                "url": page_url,
                "status": 200,
                "markdown": "# Intro",
                "links": ["https://elsewhere.example/a", 42, "  "],
                "domain": "Site.Example"
            }]
        })))
        .expect(1)
        .mount(&render_service)
        .await;

    // The site itself must not be hit: rendering succeeded
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&site)
        .await;

    let dir = TempDir::new().unwrap();
    let mut config = test_config(&dir, &[seed]);
    config.renderer.endpoint = Some(render_service.uri());

    let coordinator = Coordinator::new(config.clone(), false).unwrap();
    let summary = coordinator.run().await;
    assert_eq!(summary.fetched, 1);
    assert_eq!(summary.html_saved, 1);

    let store = store(&config);
    let html = std::fs::read_to_string(store.html_path(&page_url)).unwrap();
    assert_eq!(html, "<pre>\n# Intro\n</pre>");

    let meta = read_meta(&store.page_sidecar_path(&page_url));
    assert_eq!(meta.out_links, vec!["https://elsewhere.example/a"]);
    assert_eq!(meta.domain.as_deref(), Some("site.example"));
    assert_eq!(meta.status, Some(200));
}

#[tokio::test]
async fn test_remote_renderer_failure_uses_fallback() {
    let render_service = MockServer::start().await;
    let site = MockServer::start().await;
    let seed = format!("{}/", site.uri());

    Mock::given(method("POST"))
        .and(path("/crawl"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&render_service)
        .await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "text/html")
                .set_body_string("<p>plain</p>"),
        )
        .expect(1)
        .mount(&site)
        .await;

    let dir = TempDir::new().unwrap();
    let mut config = test_config(&dir, &[seed]);
    config.renderer.endpoint = Some(render_service.uri());

    let summary = Coordinator::new(config, false).unwrap().run().await;
    assert_eq!(summary.fetched, 1);
    assert_eq!(summary.seeds_skipped, 0);
}
