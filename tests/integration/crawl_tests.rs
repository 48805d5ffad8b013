//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock HTTP servers and drive full
//! sessions through the real HTTP fetcher and a session directory on disk.

use creeper::config::SessionConfig;
use creeper::crawler::{build_http_client, Coordinator, ReqwestFetcher};
use creeper::storage::layout::{BUFFER_FILE, RESULTS_FILE, UNVISITED_FILE, VISITED_FILE};
use creeper::storage::{SessionDirectory, Storage};
use creeper::{CrawlOutcome, CrawlResult, Session};
use std::fs;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn html(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .set_body_string(body.to_string())
        .insert_header("content-type", "text/html")
}

async fn mount_page(server: &MockServer, route: &str, body: &str) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(html(body))
        .mount(server)
        .await;
}

/// Creates a session rooted in a fresh temporary directory
fn create_session(
    seed: &str,
    configure: impl FnOnce(&mut SessionConfig),
) -> (TempDir, SessionDirectory, Session) {
    let temp = TempDir::new().expect("Failed to create temp dir");
    let mut config = SessionConfig::new(seed, temp.path().join("session"));
    configure(&mut config);

    let dir = SessionDirectory::create(&config).expect("Failed to create session");
    (temp, dir, Session::new(config))
}

fn coordinator(session: Session, dir: &SessionDirectory) -> Coordinator {
    let client = build_http_client().expect("Failed to build client");
    Coordinator::new(
        session,
        Box::new(dir.clone()),
        Box::new(ReqwestFetcher::new(client)),
    )
}

fn read_results(dir: &SessionDirectory) -> Vec<CrawlResult> {
    let content = fs::read_to_string(dir.path(RESULTS_FILE)).expect("Failed to read results");
    serde_json::from_str(&content).expect("Failed to parse results")
}

#[tokio::test]
async fn test_full_crawl_single_host() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_page(
        &server,
        "/",
        r#"<html><head><title>Home</title></head><body>
           <p>Welcome home</p>
           <a href="/a">A</a>
           <a href="/b">B</a>
           <a href="https://elsewhere.test/x">External</a>
           </body></html>"#,
    )
    .await;
    mount_page(
        &server,
        "/a",
        r#"<html><head><title>A</title></head><body><p>Page A</p><a href="/">home</a></body></html>"#,
    )
    .await;
    mount_page(
        &server,
        "/b",
        r#"<html><head><title>B</title></head><body><p>Page B</p></body></html>"#,
    )
    .await;

    let (_temp, dir, session) = create_session(&format!("{}/", base), |_| {});
    let mut coordinator = coordinator(session, &dir);

    let outcome = coordinator.run().await.expect("Crawl failed");
    assert_eq!(outcome, CrawlOutcome::Completed);

    let results = read_results(&dir);
    let urls: Vec<_> = results.iter().map(|r| r.url.as_str()).collect();
    assert_eq!(
        urls,
        vec![
            format!("{}/", base),
            format!("{}/a", base),
            format!("{}/b", base)
        ]
    );

    let home = &results[0];
    assert_eq!(home.status_code, 200);
    assert_eq!(home.title.as_deref(), Some("Home"));
    assert!(home.text.contains("Welcome home"));
    assert!(home
        .links
        .contains(&"https://elsewhere.test/x".to_string()));

    // The external host was never admitted
    let session = coordinator.session();
    assert!(!session.frontier.is_visited("https://elsewhere.test/x"));
    assert_eq!(session.frontier.visited_len(), 3);
}

#[tokio::test]
async fn test_session_files_after_completion() {
    let server = MockServer::start().await;
    mount_page(&server, "/", "<html><body><p>Only page</p></body></html>").await;

    let (_temp, dir, session) = create_session(&format!("{}/", server.uri()), |_| {});
    let mut coordinator = coordinator(session, &dir);
    coordinator.run().await.expect("Crawl failed");

    assert!(dir.path(VISITED_FILE).exists());
    assert!(dir.path(BUFFER_FILE).exists());
    assert!(dir.path(RESULTS_FILE).exists());
    assert!(!dir.path(UNVISITED_FILE).exists());
    assert!(!dir.has_unvisited());

    let visited = fs::read_to_string(dir.path(VISITED_FILE)).unwrap();
    let line = visited.lines().next().unwrap();
    let (mark, url) = line.split_once("<:>").unwrap();
    assert_eq!(url, format!("{}/", server.uri()));
    assert_eq!(mark.len(), 64);

    let buffered = dir.load_results().unwrap();
    assert_eq!(buffered, read_results(&dir));
}

#[tokio::test]
async fn test_duplicate_content_collapses() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_page(
        &server,
        "/",
        r#"<html><body><p>Index</p><a href="/one">1</a><a href="/two">2</a></body></html>"#,
    )
    .await;
    mount_page(&server, "/one", "<html><body><p>Same   text</p></body></html>").await;
    mount_page(&server, "/two", "<html><body><p>Same text</p></body></html>").await;

    let (_temp, dir, session) = create_session(&format!("{}/", base), |_| {});
    let mut coordinator = coordinator(session, &dir);
    coordinator.run().await.expect("Crawl failed");

    let results = read_results(&dir);
    assert_eq!(results.len(), 2);

    // Both URLs are visited under the same fingerprint
    let session = coordinator.session();
    let one = session.frontier.visit_mark(&format!("{}/one", base)).cloned();
    let two = session.frontier.visit_mark(&format!("{}/two", base)).cloned();
    assert!(one.is_some());
    assert_eq!(one, two);
    assert_eq!(session.seen.len(), 2);
}

#[tokio::test]
async fn test_redirect_is_followed_and_recorded() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_page(
        &server,
        "/",
        r#"<html><body><p>Index</p><a href="/old">old</a></body></html>"#,
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/old"))
        .respond_with(ResponseTemplate::new(301).insert_header("location", "/new"))
        .mount(&server)
        .await;
    mount_page(&server, "/new", "<html><body><p>Moved here</p></body></html>").await;

    let (_temp, dir, session) = create_session(&format!("{}/", base), |_| {});
    let mut coordinator = coordinator(session, &dir);
    coordinator.run().await.expect("Crawl failed");

    let results = read_results(&dir);
    let moved = results
        .iter()
        .find(|r| r.text.contains("Moved here"))
        .expect("redirect target was not crawled");

    assert_eq!(moved.url, format!("{}/new", base));
    assert_eq!(moved.status_code, 301);
    assert_eq!(moved.redirects.len(), 2);
    assert_eq!(moved.redirects[0].url, format!("{}/old", base));
    assert_eq!(moved.redirects[1].status_code, 200);

    let session = coordinator.session();
    assert!(session.frontier.is_visited(&format!("{}/old", base)));
    assert!(session.frontier.is_visited(&format!("{}/new", base)));
}

#[tokio::test]
async fn test_resume_after_interrupt() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_page(
        &server,
        "/",
        r#"<html><body><p>Index</p><a href="/next">next</a></body></html>"#,
    )
    .await;
    mount_page(&server, "/next", "<html><body><p>Next page</p></body></html>").await;

    let (_temp, dir, session) = create_session(&format!("{}/", base), |_| {});

    // Cancelled before the first URL: only the seeded frontier is persisted
    let cancel = Arc::new(AtomicBool::new(true));
    let mut first = coordinator(session, &dir).with_cancel_flag(Arc::clone(&cancel));
    let outcome = first.run().await.expect("Crawl failed");
    assert_eq!(outcome, CrawlOutcome::Interrupted);
    assert!(dir.has_unvisited());
    assert!(!dir.path(RESULTS_FILE).exists());

    let (reopened, config) = SessionDirectory::open(dir.root()).expect("Failed to reopen");
    let restored = reopened.load_session(config).expect("Failed to load session");
    assert_eq!(restored.frontier.unvisited_len(), 1);

    cancel.store(false, Ordering::SeqCst);
    let mut second = coordinator(restored, &reopened).with_cancel_flag(cancel);
    let outcome = second.run().await.expect("Crawl failed");
    assert_eq!(outcome, CrawlOutcome::Completed);

    let results = read_results(&reopened);
    assert_eq!(results.len(), 2);
    assert!(!reopened.has_unvisited());
}

#[tokio::test]
async fn test_downloads_enabled_category() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_page(
        &server,
        "/",
        r#"<html><body><p>Files</p>
           <a href="/files/report.pdf">report</a>
           <img src="/img/logo.png">
           </body></html>"#,
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/files/report.pdf"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(b"%PDF-1.4".to_vec())
                .insert_header("content-type", "application/pdf"),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/img/logo.png"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![0x89, 0x50]))
        .mount(&server)
        .await;

    let (_temp, dir, session) = create_session(&format!("{}/", base), |config| {
        config.downloads.documents = true;
    });
    let mut coordinator = coordinator(session, &dir);
    coordinator.run().await.expect("Crawl failed");

    let document = dir.path("documents").join("report.pdf");
    assert_eq!(fs::read(&document).unwrap(), b"%PDF-1.4");
    assert!(!dir.path("images").exists());
}

#[tokio::test]
async fn test_not_found_page_is_recorded() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_page(
        &server,
        "/",
        r#"<html><body><p>Index</p><a href="/missing">gone</a></body></html>"#,
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(
            ResponseTemplate::new(404)
                .set_body_string("<html><body><p>Not here</p></body></html>")
                .insert_header("content-type", "text/html"),
        )
        .mount(&server)
        .await;

    let (_temp, dir, session) = create_session(&format!("{}/", base), |_| {});
    let mut coordinator = coordinator(session, &dir);
    coordinator.run().await.expect("Crawl failed");

    let results = read_results(&dir);
    let missing = results
        .iter()
        .find(|r| r.url == format!("{}/missing", base))
        .expect("404 page was not recorded");
    assert_eq!(missing.status_code, 404);
}
