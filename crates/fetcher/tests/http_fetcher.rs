use axum::http::StatusCode;
use axum::response::Html;
use axum::routing::get;
use axum::Router;
use fetcher::{FetchConfig, HttpTranscriptFetcher};
use pipeline::{FetchError, TranscriptFetcher};

const LISTING: &str = r#"<html><body>
<a href="/earnings/call-transcripts/2025/nvidia-nvda-q1-2026-call/">Q1</a>
<a href="/news/nvidia-nvda-rally/">News</a>
<a href="/earnings/call-transcripts/2025/nvidia-nvda-q4-2025-call/">Q4</a>
<a href="/earnings/call-transcripts/2024/nvidia-nvda-q3-2025-call/">Q3</a>
</body></html>"#;

async fn spawn_site(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    format!("http://{addr}")
}

fn config(site: &str, count: usize) -> FetchConfig {
    FetchConfig {
        listing_url: format!("{site}/quote/nvda/"),
        base_url: site.to_string(),
        count,
        timeout_secs: 5,
        ..FetchConfig::default()
    }
}

#[tokio::test]
async fn fetches_newest_transcripts_as_text() {
    let app = Router::new()
        .route("/quote/nvda/", get(|| async { Html(LISTING) }))
        .route(
            "/earnings/call-transcripts/2025/nvidia-nvda-q1-2026-call/",
            get(|| async {
                Html("<body><article><p>Jensen Huang: Record quarter.</p></article></body>")
            }),
        )
        .route(
            "/earnings/call-transcripts/2025/nvidia-nvda-q4-2025-call/",
            get(|| async { Html("<body><article><p>Colette Kress: Strong demand.</p></article></body>") }),
        );
    let site = spawn_site(app).await;
    let fetcher = HttpTranscriptFetcher::new(config(&site, 2)).unwrap();

    let transcripts = fetcher.fetch_latest().await.unwrap();

    let names: Vec<_> = transcripts.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(names, vec!["nvidia-nvda-q1-2026-call", "nvidia-nvda-q4-2025-call"]);
    assert_eq!(transcripts[0].text, "Jensen Huang: Record quarter.");
}

#[tokio::test]
async fn missing_transcript_page_fails_the_fetch() {
    let app = Router::new().route("/quote/nvda/", get(|| async { Html(LISTING) }));
    let site = spawn_site(app).await;
    let fetcher = HttpTranscriptFetcher::new(config(&site, 1)).unwrap();

    match fetcher.fetch_latest().await {
        Err(FetchError::Status { url, status }) => {
            assert_eq!(status, 404);
            assert!(url.ends_with("nvidia-nvda-q1-2026-call/"));
        }
        other => panic!("expected a status error, got {other:?}"),
    }
}

#[tokio::test]
async fn listing_without_matching_links_yields_nothing() {
    let app = Router::new().route(
        "/quote/nvda/",
        get(|| async { (StatusCode::OK, Html("<body><a href=\"/about\">About</a></body>")) }),
    );
    let site = spawn_site(app).await;
    let fetcher = HttpTranscriptFetcher::new(config(&site, 4)).unwrap();

    assert!(fetcher.fetch_latest().await.unwrap().is_empty());
}
