//! End-to-end scrape tests
//!
//! Each test mounts a mock wiki (gallery page plus detail pages) on a
//! wiremock server and runs the real HTTP pipeline against it.

use gallery_scrape::config::{
    Config, FetchConfig, MarkupConfig, OutputConfig, SiteConfig, UserAgentConfig,
};
use gallery_scrape::scrape::{run_scrape, FetchStatus, OrchestratorError};
use gallery_scrape::storage::{open_snapshot, read_table};
use gallery_scrape::viewer::load_entries;
use gallery_scrape::{ExtractionError, GalleryEntry, ImageRef, RunState, ScrapeError};
use std::path::Path;
use tempfile::TempDir;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const GALLERY_PATH: &str = "/Art_Gallery";

/// Creates a test configuration pointing at the mock wiki
fn create_test_config(base_url: &str, dir: &Path) -> Config {
    Config {
        site: SiteConfig {
            base_origin: base_url.to_string(),
            gallery_url: format!("{}{}", base_url, GALLERY_PATH),
        },
        markup: MarkupConfig::default(),
        user_agent: UserAgentConfig {
            crawler_name: "TestBot".to_string(),
            crawler_version: "1.0.0".to_string(),
            contact_url: "https://example.com/contact".to_string(),
            contact_email: "test@example.com".to_string(),
        },
        output: OutputConfig {
            csv_path: dir.join("entries.csv").to_string_lossy().into_owned(),
            snapshot_path: dir.join("entries.db").to_string_lossy().into_owned(),
        },
        fetch: FetchConfig::default(),
    }
}

fn thumbnails(links: &[&str]) -> String {
    links
        .iter()
        .map(|link| format!(r#"<a href="{}"><img src="/thumb/{}"></a>"#, link, link))
        .collect()
}

fn entry_table(artworks: &[&str], date: &str, title: &str, sources: &[&str]) -> String {
    format!(
        r#"<table class="diamonds volume"><tbody><tr>
            <td class="volume">{}</td>
            <td class="volume"><center>{}</center></td>
            <td class="volume"><center>{}</center></td>
            <td class="volume">{}</td>
        </tr></tbody></table>"#,
        thumbnails(artworks),
        date,
        title,
        thumbnails(sources)
    )
}

fn gallery_page(tables: &[String]) -> String {
    format!(
        r#"<html><head><title>Art Gallery</title></head><body>
        <div class="phantom-blood-tabs">{}</div>
        </body></html>"#,
        tables.concat()
    )
}

fn alts(images: &[ImageRef]) -> Vec<&str> {
    images.iter().map(|image| image.alt_text()).collect()
}

async fn mount_html(server: &MockServer, route: &str, status: u16, body: String) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(
            ResponseTemplate::new(status)
                .set_body_string(body)
                .insert_header("content-type", "text/html"),
        )
        .mount(server)
        .await;
}

async fn mount_detail(server: &MockServer, route: &str, src: &str, alt: &str) {
    let body = format!(
        r#"<html><body><div id="file"><a href="{src}"><img src="{src}" alt="{alt}"></a></div></body></html>"#
    );
    mount_html(server, route, 200, body).await;
}

#[tokio::test]
async fn test_scrape_with_broken_thumbnail() {
    let mock_server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let config = create_test_config(&mock_server.uri(), dir.path());

    mount_html(
        &mock_server,
        GALLERY_PATH,
        200,
        gallery_page(&[entry_table(
            &["/wiki/File:A.png", "/wiki/File:Broken.png"],
            "2023",
            "Example",
            &[],
        )]),
    )
    .await;
    mount_detail(&mock_server, "/wiki/File:A.png", "a.png", "A").await;
    mount_html(&mock_server, "/wiki/File:Broken.png", 500, "error".to_string()).await;

    let entries = run_scrape(&config, "hash").await.unwrap();

    let expected = vec![GalleryEntry::new(
        vec![ImageRef::new("a.png", "A")],
        "2023",
        "Example",
        vec![],
    )];
    assert_eq!(entries, expected);

    // Both outputs hold the same entries
    let csv = std::fs::read_to_string(&config.output.csv_path).unwrap();
    assert_eq!(
        csv,
        "ARTWORK,DATE,SOURCE TITLE,SOURCE IMAGE\r\n\"<src: a.png\nalt: A>\n\",2023,Example,\r\n"
    );
    assert_eq!(read_table(Path::new(&config.output.csv_path)).unwrap(), expected);
    assert_eq!(
        load_entries(Path::new(&config.output.snapshot_path)).unwrap(),
        expected
    );
}

#[tokio::test]
async fn test_entries_keep_document_order() {
    let mock_server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let config = create_test_config(&mock_server.uri(), dir.path());

    mount_html(
        &mock_server,
        GALLERY_PATH,
        200,
        gallery_page(&[
            entry_table(&["/wiki/File:1.png", "/wiki/File:2.png"], "2021", "One", &["/wiki/File:S1.png"]),
            entry_table(&["/wiki/File:3.png"], "2022", "Two", &[]),
            entry_table(&[], "2023", "Three", &["/wiki/File:S2.png", "/wiki/File:S3.png"]),
        ]),
    )
    .await;
    for name in ["1", "2", "3", "S1", "S2", "S3"] {
        mount_detail(
            &mock_server,
            &format!("/wiki/File:{}.png", name),
            &format!("https://static.example.com/{}.png", name),
            name,
        )
        .await;
    }

    let entries = run_scrape(&config, "hash").await.unwrap();

    let titles: Vec<_> = entries.iter().map(|e| e.source_title.as_str()).collect();
    assert_eq!(titles, vec!["One", "Two", "Three"]);

    assert_eq!(alts(&entries[0].artworks), vec!["1", "2"]);
    assert_eq!(alts(&entries[0].source_images), vec!["S1"]);
    assert_eq!(alts(&entries[2].source_images), vec!["S2", "S3"]);
    assert!(entries[2].artworks.is_empty());

    assert_eq!(
        load_entries(Path::new(&config.output.snapshot_path)).unwrap(),
        entries
    );
}

#[tokio::test]
async fn test_empty_gallery_writes_header_only() {
    let mock_server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let config = create_test_config(&mock_server.uri(), dir.path());

    mount_html(&mock_server, GALLERY_PATH, 200, gallery_page(&[])).await;

    let entries = run_scrape(&config, "hash").await.unwrap();

    assert!(entries.is_empty());
    assert_eq!(
        std::fs::read_to_string(&config.output.csv_path).unwrap(),
        "ARTWORK,DATE,SOURCE TITLE,SOURCE IMAGE\r\n"
    );

    let store = open_snapshot(Path::new(&config.output.snapshot_path)).unwrap();
    let run = store.latest_run().unwrap().unwrap();
    assert_eq!(run.status, RunState::Done);
    assert_eq!(run.entry_count, 0);
}

#[tokio::test]
async fn test_missing_container_keeps_prior_snapshot() {
    let mock_server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let config = create_test_config(&mock_server.uri(), dir.path());

    // First run succeeds
    mount_html(
        &mock_server,
        GALLERY_PATH,
        200,
        gallery_page(&[entry_table(&["/wiki/File:A.png"], "2023", "Kept", &[])]),
    )
    .await;
    mount_detail(&mock_server, "/wiki/File:A.png", "a.png", "A").await;

    let first = run_scrape(&config, "hash").await.unwrap();
    let csv_before = std::fs::read_to_string(&config.output.csv_path).unwrap();

    // The site is redesigned
    mock_server.reset().await;
    mount_html(
        &mock_server,
        GALLERY_PATH,
        200,
        "<html><body><div class=\"new-layout\"></div></body></html>".to_string(),
    )
    .await;

    let err = run_scrape(&config, "hash").await.unwrap_err();

    match err {
        ScrapeError::Aborted(e) => {
            assert_eq!(e.state(), RunState::AbortedExtractionFailure);
            assert!(matches!(
                e,
                OrchestratorError::AbortedExtractionFailure(ExtractionError::ContainerNotFound { .. })
            ));
            assert!(e.persisted().is_empty());
        }
        other => panic!("expected an aborted run, got {:?}", other),
    }

    assert_eq!(
        load_entries(Path::new(&config.output.snapshot_path)).unwrap(),
        first
    );
    assert_eq!(
        std::fs::read_to_string(&config.output.csv_path).unwrap(),
        csv_before
    );

    let store = open_snapshot(Path::new(&config.output.snapshot_path)).unwrap();
    let statuses: Vec<_> = store
        .list_runs()
        .unwrap()
        .into_iter()
        .map(|run| run.status)
        .collect();
    assert_eq!(
        statuses,
        vec![RunState::Done, RunState::AbortedExtractionFailure]
    );
}

#[tokio::test]
async fn test_gallery_http_error_aborts() {
    let mock_server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let config = create_test_config(&mock_server.uri(), dir.path());

    mount_html(&mock_server, GALLERY_PATH, 500, "unavailable".to_string()).await;

    let err = run_scrape(&config, "hash").await.unwrap_err();

    match err {
        ScrapeError::Aborted(OrchestratorError::AbortedFetchFailure { status, .. }) => {
            assert_eq!(status, FetchStatus::HttpError { code: 500 });
        }
        other => panic!("expected a fetch failure, got {:?}", other),
    }
    assert!(!Path::new(&config.output.csv_path).exists());
}

#[tokio::test]
async fn test_requests_identify_the_scraper() {
    let mock_server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let config = create_test_config(&mock_server.uri(), dir.path());

    Mock::given(method("GET"))
        .and(path(GALLERY_PATH))
        .and(header(
            "user-agent",
            "TestBot/1.0.0 (+https://example.com/contact; test@example.com)",
        ))
        .respond_with(ResponseTemplate::new(200).set_body_string(gallery_page(&[])))
        .expect(1)
        .mount(&mock_server)
        .await;

    run_scrape(&config, "hash").await.unwrap();
}

#[tokio::test]
async fn test_dedupe_fetches_each_detail_page_once() {
    let mock_server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let mut config = create_test_config(&mock_server.uri(), dir.path());
    config.fetch.dedupe_detail_pages = true;

    mount_html(
        &mock_server,
        GALLERY_PATH,
        200,
        gallery_page(&[
            entry_table(&["/wiki/File:Shared.png"], "2021", "First", &[]),
            entry_table(&["/wiki/File:Other.png"], "2022", "Second", &["/wiki/File:Shared.png"]),
        ]),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/wiki/File:Shared.png"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(r#"<div id="file"><img src="shared.png" alt="S"></div>"#),
        )
        .expect(1)
        .mount(&mock_server)
        .await;
    mount_detail(&mock_server, "/wiki/File:Other.png", "other.png", "O").await;

    let entries = run_scrape(&config, "hash").await.unwrap();

    assert_eq!(entries[0].artworks, vec![ImageRef::new("shared.png", "S")]);
    assert_eq!(entries[1].source_images, vec![ImageRef::new("shared.png", "S")]);
}
