use crate::common::{files_in, hash, log_lines, read_meta, store, test_config, ScriptedRenderer};
use async_trait::async_trait;
use corpus_harvest::crawler::{RenderEngine, RenderError, RenderOptions};
use corpus_harvest::Coordinator;
use serde_json::{json, Value};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_rendered_page_saved_with_linked_file() {
    let server = MockServer::start().await;
    let base = server.uri();
    let seed = format!("{}/", base);
    let page_url = format!("{}/x/y", base);
    let file_url = format!("{}/a/b.pdf", base);

    Mock::given(method("GET"))
        .and(path("/a/b.pdf"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "application/pdf")
                .set_body_bytes(b"%PDF-1.4 test".to_vec()),
        )
        .expect(1)
        .mount(&server)
        .await;

    let renderer = ScriptedRenderer::new().answer(
        &seed,
        json!({
            "success": true,
            "results": [{
                "url": page_url,
                "status_code": 200,
                "content_type": "text/html; charset=utf-8",
                "html": r#"<html><a href="/a/b.pdf">report</a><a href="/about">about</a></html>"#,
            }]
        }),
    );

    let dir = TempDir::new().unwrap();
    let config = test_config(&dir, &[seed.clone()]);
    let coordinator = Coordinator::with_renderer(config.clone(), Box::new(renderer), false).unwrap();
    let summary = coordinator.run().await;

    assert_eq!(summary.fetched, 1);
    assert_eq!(summary.html_saved, 1);
    assert_eq!(summary.files_saved, 1);
    assert!(!summary.has_warnings());

    let store = store(&config);

    let html = std::fs::read_to_string(store.html_path(&page_url)).unwrap();
    assert!(html.contains("/a/b.pdf"));

    let page_meta = read_meta(&store.page_sidecar_path(&page_url));
    assert_eq!(page_meta.status, Some(200));
    assert_eq!(page_meta.out_links, vec!["/a/b.pdf", "/about"]);
    assert_eq!(page_meta.domain.as_deref(), Some("127.0.0.1"));
    assert!(page_meta.html_path.is_some());

    let file_path = store.file_path(&file_url, ".pdf");
    assert_eq!(std::fs::read(&file_path).unwrap(), b"%PDF-1.4 test");

    let file_meta = read_meta(&store.file_sidecar_path(&file_url, ".pdf"));
    assert_eq!(file_meta.url, file_url);
    assert_eq!(file_meta.content_type.as_deref(), Some("application/pdf"));
    assert_eq!(
        file_meta.notes.as_deref(),
        Some(format!("discovered from {}", page_url).as_str())
    );

    let lines = log_lines(&config);
    assert_eq!(lines.len(), 1);
    assert!(lines[0].ends_with(&format!("{} -> status=200", page_url)));
}

#[tokio::test]
async fn test_fallback_invoked_exactly_once_on_render_error() {
    let server = MockServer::start().await;
    let seed = format!("{}/", server.uri());

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "text/html")
                .set_body_string("<html><p>fallback</p></html>"),
        )
        .expect(1)
        .mount(&server)
        .await;

    let renderer = ScriptedRenderer::new().fail(&seed, "browser crashed");
    let calls = renderer.calls();

    let dir = TempDir::new().unwrap();
    let config = test_config(&dir, &[seed.clone()]);
    let coordinator = Coordinator::with_renderer(config.clone(), Box::new(renderer), false).unwrap();
    let summary = coordinator.run().await;

    assert_eq!(*calls.lock().unwrap(), vec![seed.clone()]);
    assert_eq!(summary.fetched, 1);
    assert_eq!(summary.html_saved, 1);
    assert_eq!(summary.seeds_skipped, 0);

    let store = store(&config);
    let html = std::fs::read_to_string(store.html_path(&seed)).unwrap();
    assert_eq!(html, "<html><p>fallback</p></html>");
    assert_eq!(read_meta(&store.page_sidecar_path(&seed)).status, Some(200));

    let lines = log_lines(&config);
    assert_eq!(lines.len(), 2);
    assert!(lines[0].ends_with(&format!(
        "RenderError {} -> render engine reported failure: browser crashed",
        seed
    )));
    assert!(lines[1].ends_with(&format!("{} -> status=200", seed)));
}

#[tokio::test]
async fn test_empty_render_result_falls_back() {
    let server = MockServer::start().await;
    let seed = format!("{}/", server.uri());

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "text/html")
                .set_body_string("<p>hi</p>"),
        )
        .expect(1)
        .mount(&server)
        .await;

    let renderer = ScriptedRenderer::new().answer(&seed, json!({"results": []}));

    let dir = TempDir::new().unwrap();
    let config = test_config(&dir, &[seed]);
    let coordinator = Coordinator::with_renderer(config.clone(), Box::new(renderer), false).unwrap();

    assert_eq!(coordinator.run().await.fetched, 1);

    // No render error to report, only the fetched page
    let lines = log_lines(&config);
    assert_eq!(lines.len(), 1);
    assert!(!lines[0].contains("RenderError"));
}

#[tokio::test]
async fn test_double_failure_skips_seed_with_one_log_line() {
    // Nothing listens on port 9 of localhost
    let seed = "http://127.0.0.1:9/".to_string();
    let renderer = ScriptedRenderer::new().fail(&seed, "timeout");

    let dir = TempDir::new().unwrap();
    let config = test_config(&dir, &[seed.clone()]);
    let coordinator = Coordinator::with_renderer(config.clone(), Box::new(renderer), false).unwrap();
    let summary = coordinator.run().await;

    assert_eq!(summary.fetched, 0);
    assert_eq!(summary.seeds_skipped, 1);
    assert!(files_in(&config.output.meta_dir).is_empty());
    assert!(coordinator.frontier().is_empty());

    let lines = log_lines(&config);
    assert_eq!(lines.len(), 1);
    assert!(lines[0].contains(&format!("SeedSkipped {} -> render: ", seed)));
    assert!(lines[0].contains("timeout"));
}

#[tokio::test]
async fn test_second_run_reprocesses_nothing() {
    let server = MockServer::start().await;
    let base = server.uri();
    let seed = format!("{}/", base);
    let page_url = format!("{}/docs/index", base);

    Mock::given(method("GET"))
        .and(path("/docs/guide.pdf"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "application/pdf")
                .set_body_bytes(b"%PDF".to_vec()),
        )
        .expect(1)
        .mount(&server)
        .await;

    let document = json!([{
        "url": page_url,
        "html": r#"<a href="guide.pdf">guide</a>"#,
    }]);

    let dir = TempDir::new().unwrap();
    let config = test_config(&dir, &[seed.clone()]);

    let first = Coordinator::with_renderer(
        config.clone(),
        Box::new(ScriptedRenderer::new().answer(&seed, document.clone())),
        false,
    )
    .unwrap()
    .run()
    .await;
    assert_eq!(first.fetched, 1);
    assert_eq!(first.files_saved, 1);

    let sidecars = files_in(&config.output.meta_dir).len();
    let log_len = log_lines(&config).len();

    let second = Coordinator::with_renderer(
        config.clone(),
        Box::new(ScriptedRenderer::new().answer(&seed, document)),
        false,
    )
    .unwrap()
    .run()
    .await;

    assert_eq!(second.fetched, 0);
    assert_eq!(second.files_saved, 0);
    assert_eq!(files_in(&config.output.meta_dir).len(), sidecars);
    assert_eq!(log_lines(&config).len(), log_len);
}

#[tokio::test]
async fn test_fresh_run_ignores_saved_frontier() {
    let server = MockServer::start().await;
    let seed = format!("{}/", server.uri());

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "text/html")
                .set_body_string("<p>again</p>"),
        )
        .expect(2)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let config = test_config(&dir, &[seed]);

    for _ in 0..2 {
        let summary = Coordinator::with_renderer(config.clone(), Box::new(ScriptedRenderer::new()), true)
            .unwrap()
            .run()
            .await;
        assert_eq!(summary.fetched, 1);
    }
}

#[tokio::test]
async fn test_empty_direct_file_gets_empty_binary_sidecar() {
    let server = MockServer::start().await;
    let seed = format!("{}/", server.uri());
    let file_url = format!("{}/doc.pdf", server.uri());

    Mock::given(method("GET"))
        .and(path("/doc.pdf"))
        .respond_with(ResponseTemplate::new(200).insert_header("content-type", "application/pdf"))
        .expect(1)
        .mount(&server)
        .await;

    let renderer = ScriptedRenderer::new().answer(
        &seed,
        json!({"url": file_url, "status_code": 200, "content_type": "application/pdf"}),
    );

    let dir = TempDir::new().unwrap();
    let config = test_config(&dir, &[seed]);
    let coordinator = Coordinator::with_renderer(config.clone(), Box::new(renderer), false).unwrap();
    let summary = coordinator.run().await;

    assert_eq!(summary.fetched, 1);
    assert_eq!(summary.files_saved, 0);
    assert!(files_in(&config.output.files_dir).is_empty());

    let sidecar = store(&config).page_sidecar_path(&file_url);
    assert!(sidecar.ends_with(format!("{}.json", hash(&file_url))));

    let meta = read_meta(&sidecar);
    assert_eq!(meta.notes.as_deref(), Some("empty binary"));
    assert!(meta.file_path.is_none());

    let lines = log_lines(&config);
    assert_eq!(lines.len(), 1);
    assert!(lines[0].ends_with(&format!("DirectFileError {} -> empty binary", file_url)));
}

#[tokio::test]
async fn test_fallback_binary_body_is_reused() {
    let server = MockServer::start().await;
    let seed = format!("{}/files/report", server.uri());

    // A second request would break the expectation
    Mock::given(method("GET"))
        .and(path("/files/report"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header(
                    "content-type",
                    "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
                )
                .set_body_bytes(b"PK\x03\x04".to_vec()),
        )
        .expect(1)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let config = test_config(&dir, &[seed.clone()]);
    let coordinator =
        Coordinator::with_renderer(config.clone(), Box::new(ScriptedRenderer::new()), false).unwrap();
    let summary = coordinator.run().await;

    assert_eq!(summary.files_saved, 1);
    assert_eq!(summary.html_saved, 0);

    let store = store(&config);
    assert_eq!(std::fs::read(store.file_path(&seed, ".docx")).unwrap(), b"PK\x03\x04");

    let meta = read_meta(&store.file_sidecar_path(&seed, ".docx"));
    assert_eq!(meta.status, Some(200));
    assert!(meta.notes.is_none());
}

#[tokio::test]
async fn test_failed_file_download_is_logged_without_sidecar() {
    let server = MockServer::start().await;
    let seed = format!("{}/", server.uri());
    let page_url = format!("{}/list", server.uri());
    let missing = format!("{}/missing.pdf", server.uri());

    // No mock for /missing.pdf: wiremock answers 404 with an empty body
    let renderer = ScriptedRenderer::new().answer(
        &seed,
        json!({"pages": [{"url": page_url, "html": "<a href='/missing.pdf'>x</a>"}]}),
    );

    let dir = TempDir::new().unwrap();
    let config = test_config(&dir, &[seed]);
    let coordinator = Coordinator::with_renderer(config.clone(), Box::new(renderer), false).unwrap();
    let summary = coordinator.run().await;

    assert_eq!(summary.file_errors, 1);
    assert_eq!(summary.files_saved, 0);

    let store = store(&config);
    assert!(!store.file_sidecar_path(&missing, ".bin").exists());
    assert_eq!(store.sidecar_paths().unwrap(), vec![store.page_sidecar_path(&page_url)]);

    let lines = log_lines(&config);
    assert_eq!(lines.len(), 2);
    assert!(lines[0].ends_with(&format!("FileError {} -> empty/failed", missing)));
    assert!(lines[1].ends_with(&format!("{} -> status=unknown", page_url)));
}

#[tokio::test]
async fn test_policy_filters_and_domain_override() {
    let server = MockServer::start().await;
    let base = server.uri();
    let seed = format!("{}/", base);
    let archived = format!("{}/docs/archive/y", base);
    let outside = "https://other.example/docs/archive/z".to_string();
    let unrelated = "https://other.example/news".to_string();

    let renderer = ScriptedRenderer::new().answer(
        &seed,
        json!([
            {"url": archived, "html": "<p>archived</p>"},
            {"url": outside, "html": "<p>outside</p>"},
            {"url": unrelated, "html": "<p>unrelated</p>"},
            {"html": "<p>no url</p>"},
        ]),
    );

    let dir = TempDir::new().unwrap();
    let mut config = test_config(&dir, &[seed]);
    config.scope.include_patterns = vec!["/docs/".to_string()];
    config.scope.exclude_patterns = vec!["/docs/archive/".to_string()];
    config.scope.allowed_domains = vec!["127.0.0.1".to_string()];

    let coordinator = Coordinator::with_renderer(config.clone(), Box::new(renderer), false).unwrap();
    let summary = coordinator.run().await;

    assert_eq!(summary.fetched, 1);
    assert!(coordinator.frontier().contains(&archived));
    assert!(!coordinator.frontier().contains(&outside));
    assert!(!coordinator.frontier().contains(&unrelated));
    assert_eq!(
        store(&config).sidecar_paths().unwrap(),
        vec![store(&config).page_sidecar_path(&archived)]
    );
}

#[tokio::test]
async fn test_concurrent_seeds_process_shared_page_once() {
    let server = MockServer::start().await;
    let base = server.uri();
    let seeds = vec![format!("{}/one", base), format!("{}/two", base)];
    let shared = format!("{}/shared", base);

    let page = json!([{"url": shared, "html": "<p>shared</p>"}]);
    let renderer = ScriptedRenderer::new()
        .answer(&seeds[0], page.clone())
        .answer(&seeds[1], page);

    let dir = TempDir::new().unwrap();
    let mut config = test_config(&dir, &seeds);
    config.crawler.seed_workers = 2;

    let coordinator = Coordinator::with_renderer(config.clone(), Box::new(renderer), false).unwrap();
    let summary = coordinator.run().await;

    assert_eq!(summary.seeds, 2);
    assert_eq!(summary.fetched, 1);
    assert_eq!(log_lines(&config).len(), 1);
}

#[tokio::test]
async fn test_frontier_saved_sorted_at_end_of_run() {
    let server = MockServer::start().await;
    let base = server.uri();
    let seed = format!("{}/", base);

    let renderer = ScriptedRenderer::new().answer(
        &seed,
        json!([
            {"url": format!("{}/b", base), "html": "<p>b</p>"},
            {"url": format!("{}/a", base), "html": "<p>a</p>"},
        ]),
    );

    let dir = TempDir::new().unwrap();
    let config = test_config(&dir, &[seed]);
    Coordinator::with_renderer(config.clone(), Box::new(renderer), false)
        .unwrap()
        .run()
        .await;

    let saved: Vec<String> =
        serde_json::from_str(&std::fs::read_to_string(&config.output.frontier_path).unwrap())
            .unwrap();
    assert_eq!(saved, vec![format!("{}/a", base), format!("{}/b", base)]);
}

#[tokio::test]
async fn test_corrupt_frontier_is_reported_not_fatal() {
    let server = MockServer::start().await;
    let seed = format!("{}/", server.uri());

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<p>ok</p>"))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let config = test_config(&dir, &[seed]);
    std::fs::create_dir_all(dir.path().join("logs")).unwrap();
    std::fs::write(&config.output.frontier_path, "{not json").unwrap();

    let summary = Coordinator::with_renderer(config, Box::new(ScriptedRenderer::new()), false)
        .unwrap()
        .run()
        .await;

    assert_eq!(summary.fetched, 1);
    assert_eq!(summary.warnings.len(), 1);
}

/// Answers the first seed with a batch of pages, then reads the frontier
/// file when asked for the second one
struct FrontierReader {
    first: String,
    pages: usize,
    frontier_path: PathBuf,
    seen: Arc<Mutex<Option<usize>>>,
}

#[async_trait]
impl RenderEngine for FrontierReader {
    fn name(&self) -> &str {
        "frontier-reader"
    }

    async fn render(&self, url: &str, _options: &RenderOptions) -> Result<Value, RenderError> {
        if url == self.first {
            let pages: Vec<Value> = (0..self.pages)
                .map(|i| json!({"url": format!("https://h.example/p{}", i), "html": "<p>x</p>"}))
                .collect();
            return Ok(json!({"results": pages}));
        }

        let saved = std::fs::read_to_string(&self.frontier_path)
            .ok()
            .and_then(|raw| serde_json::from_str::<Vec<String>>(&raw).ok())
            .map(|urls| urls.len());
        *self.seen.lock().unwrap() = saved;
        Err(RenderError::Engine("stop".to_string()))
    }
}

#[tokio::test]
async fn test_frontier_checkpointed_after_hundredth_page() {
    let first = "https://h.example/".to_string();
    // Nothing listens on port 9, so the fallback fails too
    let second = "http://127.0.0.1:9/".to_string();

    let dir = TempDir::new().unwrap();
    let config = test_config(&dir, &[first.clone(), second]);
    let seen = Arc::new(Mutex::new(None));
    let renderer = FrontierReader {
        first,
        pages: 100,
        frontier_path: PathBuf::from(&config.output.frontier_path),
        seen: Arc::clone(&seen),
    };

    let summary = Coordinator::with_renderer(config, Box::new(renderer), false)
        .unwrap()
        .run()
        .await;

    // The checkpoint was on disk before the run reached the next seed
    assert_eq!(*seen.lock().unwrap(), Some(100));
    assert_eq!(summary.seeds_skipped, 1);
}
