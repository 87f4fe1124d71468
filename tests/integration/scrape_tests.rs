//! Integration tests for the scraper
//!
//! These tests use wiremock to create mock HTTP servers and run whole
//! batches through the real HTTP source.

use std::time::{Duration, Instant};
use word_harvest::config::{
    Config, PaginatedEntry, PresenterConfig, ScraperConfig, UserAgentConfig,
};
use word_harvest::crawler::{self, Coordinator, HttpSource, Outcome, ScrapeResults};
use word_harvest::output::{format_aggregate, ResultPresenter};
use word_harvest::ScrapeError;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration scraping the given URLs
fn create_test_config(urls: Vec<String>, concurrency: usize) -> Config {
    Config {
        scraper: ScraperConfig {
            concurrency,
            request_timeout_secs: 5,
            connect_timeout_secs: 2,
        },
        user_agent: UserAgentConfig {
            name: "TestHarvester".to_string(),
            version: "1.0".to_string(),
        },
        presenter: PresenterConfig {
            stop_words_path: "stop_words.txt".to_string(),
            min_count: 1,
        },
        urls,
        paginated: vec![],
    }
}

fn html_page(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(
        format!(
            "<html><head><title>ignored title</title></head><body>{}</body></html>",
            body
        ),
        "text/html; charset=utf-8",
    )
}

async fn mount_page(server: &MockServer, route: &str, body: &str, expected_hits: u64) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(html_page(body))
        .expect(expected_hits)
        .mount(server)
        .await;
}

async fn run_batch(config: &Config, urls: &[String]) -> (Vec<Outcome>, ScrapeResults) {
    let (submitter, announcer, mut results) =
        crawler::start(config).expect("Failed to build HTTP client");
    for url in urls {
        submitter.submit(url.as_str()).expect("coordinator closed early");
    }
    announcer.announce(urls.len());

    let mut outcomes = Vec::new();
    while let Some(outcome) = results.next().await {
        outcomes.push(outcome);
    }
    (outcomes, results)
}

fn outcome_for<'a>(outcomes: &'a [Outcome], url: &str) -> Vec<&'a Outcome> {
    outcomes.iter().filter(|o| o.url == url).collect()
}

#[tokio::test]
async fn test_full_batch_with_duplicates_and_failures() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_page(
        &server,
        "/fox",
        "The quick fox <script>var hidden = 1;</script> jumps over the fox",
        1,
    )
    .await;
    mount_page(&server, "/dog", "<p>lazy dog</p><style>.fox{}</style>", 1).await;

    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/data.json"))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw(r#"{"fox": 1}"#, "application/json"),
        )
        .expect(1)
        .mount(&server)
        .await;

    let urls: Vec<String> = ["/fox", "/dog", "/missing", "/data.json", "/fox"]
        .iter()
        .map(|p| format!("{}{}", base, p))
        .collect();
    let config = create_test_config(vec![], 4);

    let (outcomes, results) = run_batch(&config, &urls).await;
    assert_eq!(outcomes.len(), urls.len());

    let fox = outcome_for(&outcomes, &urls[0]);
    assert_eq!(fox.len(), 2);
    assert_eq!(fox[0].result, fox[1].result);
    assert_eq!(fox.iter().filter(|o| o.cached).count(), 1);
    let words = fox[0].words().expect("fox page should succeed");
    assert_eq!(words.get("fox"), 2);
    assert_eq!(words.get("hidden"), 0);
    assert_eq!(words.get("title"), 0);

    let missing = outcome_for(&outcomes, &urls[2]);
    assert!(matches!(
        missing[0].error(),
        Some(ScrapeError::HttpStatus { status: 404, .. })
    ));

    let json = outcome_for(&outcomes, &urls[3]);
    assert!(matches!(
        json[0].error(),
        Some(ScrapeError::ContentType { .. })
    ));

    let aggregate = results.aggregate().await.unwrap();
    // Both deliveries of /fox count, the failures contribute nothing.
    assert_eq!(aggregate.get("fox"), 4);
    assert_eq!(aggregate.get("dog"), 1);
    assert_eq!(aggregate.get("lazy"), 1);
    assert_eq!(aggregate.get("The"), 2);
    assert_eq!(aggregate.get("the"), 2);
}

#[tokio::test]
async fn test_aggregate_matches_sum_of_outcomes() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_page(&server, "/one", "alpha beta beta", 1).await;
    mount_page(&server, "/two", "beta gamma", 1).await;
    mount_page(&server, "/three", "gamma gamma alpha 2024", 1).await;

    let urls: Vec<String> = ["/one", "/two", "/three", "/two"]
        .iter()
        .map(|p| format!("{}{}", base, p))
        .collect();
    let config = create_test_config(vec![], 2);

    let (outcomes, results) = run_batch(&config, &urls).await;
    let aggregate = results.aggregate().await.unwrap();

    for word in ["alpha", "beta", "gamma"] {
        let summed: usize = outcomes
            .iter()
            .filter_map(|o| o.words())
            .map(|w| w.get(word))
            .sum();
        assert_eq!(aggregate.get(word), summed, "mismatch for {}", word);
    }
    assert_eq!(aggregate.get("beta"), 4);
}

#[tokio::test]
async fn test_user_agent_header_is_sent() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/ua"))
        .and(header("user-agent", "TestHarvester/1.0"))
        .respond_with(html_page("agent checked"))
        .expect(1)
        .mount(&server)
        .await;

    let urls = vec![format!("{}/ua", server.uri())];
    let config = create_test_config(vec![], 1);

    let (outcomes, _results) = run_batch(&config, &urls).await;
    assert_eq!(outcomes.len(), 1);
    assert!(outcomes[0].result.is_ok(), "{:?}", outcomes[0].result);
}

#[tokio::test]
async fn test_connection_failure_is_fetch_error() {
    // Nothing listens on port 1.
    let urls = vec!["http://127.0.0.1:1/".to_string()];
    let config = create_test_config(vec![], 1);

    let (outcomes, results) = run_batch(&config, &urls).await;
    assert_eq!(outcomes.len(), 1);
    assert!(matches!(
        outcomes[0].error(),
        Some(ScrapeError::Fetch { .. })
    ));
    assert!(results.aggregate().await.unwrap().is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_single_slot_serializes_fetches() {
    let server = MockServer::start().await;
    let delay = Duration::from_millis(100);

    for route in ["/slow/1", "/slow/2", "/slow/3"] {
        Mock::given(method("GET"))
            .and(path(route))
            .respond_with(html_page("slow page").set_delay(delay))
            .expect(1)
            .mount(&server)
            .await;
    }

    let base = format!("{}/slow/", server.uri());
    let mut config = create_test_config(vec![], 1);
    config.paginated.push(PaginatedEntry {
        base_url: base,
        pages: 3,
    });
    let urls = config.batch_urls();

    let started = Instant::now();
    let (outcomes, results) = run_batch(&config, &urls).await;
    let elapsed = started.elapsed();

    assert_eq!(outcomes.len(), 3);
    assert!(
        elapsed >= delay * 3,
        "three fetches through one slot took only {:?}",
        elapsed
    );
    assert_eq!(results.aggregate().await.unwrap().get("slow"), 3);
}

#[tokio::test]
async fn test_coordinator_over_http_source_directly() {
    let server = MockServer::start().await;
    mount_page(&server, "/direct", "direct words words", 1).await;

    let client = crawler::build_http_client(
        &UserAgentConfig::default(),
        &ScraperConfig::default(),
    )
    .unwrap();
    let (submitter, announcer, mut results) = Coordinator::spawn(HttpSource::new(client), 2);

    // Total first, URL afterwards.
    announcer.announce(1);
    submitter
        .submit(format!("{}/direct", server.uri()))
        .unwrap();

    let outcome = results.next().await.unwrap();
    assert_eq!(outcome.words().unwrap().get("words"), 2);
    assert!(results.next().await.is_none());

    let presenter = ResultPresenter::from_words(["direct"], 1);
    let aggregate = results.aggregate().await.unwrap();
    assert_eq!(
        format_aggregate(&aggregate, &presenter),
        "Aggregated results:\n[words->2]"
    );
}
