//! Integration tests for the probe scheduler against a wiremock server

mod common;

use common::{definition, exists_on_body, test_config};
use corvus::catalog::ProbeDefinition;
use corvus::http::HttpClient;
use corvus::models::{ProbeStatus, RunReport, SearchConfig, Token, TokenKind};
use corvus::probe::{aggregate, ProbeScheduler, DETAIL_CANCELLED, DETAIL_DEADLINE};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn run_search(
    config: SearchConfig,
    token: Token,
    catalog: Vec<ProbeDefinition>,
    cancel: CancellationToken,
) -> RunReport {
    let client = HttpClient::from_config(&config).expect("client");
    let scheduler = ProbeScheduler::new(client, config);
    let applicable = catalog.iter().filter(|d| d.kind == token.kind()).count();
    let outcomes = scheduler.run(token.clone(), Arc::new(catalog), cancel);
    aggregate(token, applicable, outcomes).await
}

#[tokio::test]
async fn end_to_end_exists_and_not_found() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/a/alice"))
        .respond_with(ResponseTemplate::new(200).set_body_string("OK"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/b/alice"))
        .respond_with(ResponseTemplate::new(404).set_body_string("gone"))
        .mount(&server)
        .await;

    let site_a = exists_on_body("A", &format!("{}/a/{{account}}", server.uri()), "OK");
    let mut site_b = definition("B", &format!("{}/b/{{account}}", server.uri()));
    site_b.exists.strings = vec!["member since".to_string()];
    site_b.not_found.status = vec![404];

    let report = run_search(
        test_config(),
        Token::username("alice"),
        vec![site_a, site_b],
        CancellationToken::new(),
    )
    .await;

    assert_eq!(report.outcomes.len(), 2);
    assert_eq!(report.outcomes[0].site_name, "A");
    assert_eq!(report.outcomes[0].status, ProbeStatus::Exists);
    assert_eq!(report.outcomes[1].site_name, "B");
    assert_eq!(report.outcomes[1].status, ProbeStatus::NotFound);
}

#[tokio::test]
async fn one_outcome_per_applicable_definition() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("OK"))
        .mount(&server)
        .await;

    let catalog = vec![
        exists_on_body("Up", &format!("{}/u/{{account}}", server.uri()), "OK"),
        // Nothing listens on the discard port, so this is a transport failure
        exists_on_body("Down", "http://127.0.0.1:9/u/{account}", "OK"),
        exists_on_body("Odd", &format!("{}/o/{{account}}", server.uri()), "no-match"),
    ];

    let report = run_search(
        test_config(),
        Token::username("alice"),
        catalog,
        CancellationToken::new(),
    )
    .await;

    assert_eq!(report.outcomes.len(), 3, "every definition must produce an outcome");
    assert_eq!(report.outcomes[0].status, ProbeStatus::Exists);
    assert_eq!(report.outcomes[1].status, ProbeStatus::Error);
    assert!(report.outcomes[1].error_detail.is_some());
    assert_eq!(report.outcomes[2].status, ProbeStatus::Unknown);
}

#[tokio::test]
async fn oversized_bodies_are_truncated_and_still_classified() {
    let server = MockServer::start().await;
    let body = format!("OK{}", "x".repeat(4096));
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(&server)
        .await;

    let config = SearchConfig {
        max_body_bytes: 64,
        ..test_config()
    };

    let report = run_search(
        config,
        Token::username("alice"),
        vec![exists_on_body("Big", &format!("{}/b/{{account}}", server.uri()), "OK")],
        CancellationToken::new(),
    )
    .await;

    let outcome = &report.outcomes[0];
    // The marker sits inside the kept prefix, so the verdict must survive
    // the truncation
    assert_eq!(outcome.status, ProbeStatus::Exists);
    assert_eq!(outcome.body.as_ref().map(String::len), Some(64));
    assert_eq!(
        outcome.error_detail.as_deref(),
        Some("body truncated at 64 bytes")
    );
}

#[tokio::test]
async fn definitions_of_other_kinds_are_skipped() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("OK"))
        .mount(&server)
        .await;

    let username_site = exists_on_body("U", &format!("{}/u/{{account}}", server.uri()), "OK");
    let mut email_site = exists_on_body("E", &format!("{}/e/{{account}}", server.uri()), "OK");
    email_site.kind = TokenKind::Email;

    let report = run_search(
        test_config(),
        Token::username("alice"),
        vec![username_site, email_site],
        CancellationToken::new(),
    )
    .await;

    assert_eq!(report.outcomes.len(), 1);
    assert_eq!(report.outcomes[0].site_name, "U");
    assert_eq!(report.total_sites, 1);
}

#[tokio::test]
async fn per_host_limit_serializes_requests() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("OK")
                .set_delay(Duration::from_millis(100)),
        )
        .mount(&server)
        .await;

    let catalog: Vec<ProbeDefinition> = (0..4)
        .map(|i| exists_on_body(&format!("S{i}"), &format!("{}/s{i}/{{account}}", server.uri()), "OK"))
        .collect();

    let config = SearchConfig {
        max_per_host: 1,
        ..test_config()
    };

    let started = Instant::now();
    let report = run_search(
        config,
        Token::username("alice"),
        catalog,
        CancellationToken::new(),
    )
    .await;

    // With one permit per host, four 100ms responses cannot overlap
    assert!(
        started.elapsed() >= Duration::from_millis(400),
        "per-host limit was not enforced: {:?}",
        started.elapsed()
    );
    assert_eq!(report.outcomes.len(), 4);
    assert!(report.outcomes.iter().all(|o| o.status == ProbeStatus::Exists));
}

#[tokio::test]
async fn transport_failure_retries_are_counted() {
    let server = MockServer::start().await;
    // Longer than the request timeout, so every attempt fails at the transport level
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("OK")
                .set_delay(Duration::from_secs(10)),
        )
        .mount(&server)
        .await;

    let config = SearchConfig {
        timeout_secs: 1,
        max_retries: 2,
        retry_backoff_ms: 10,
        ..test_config()
    };

    let report = run_search(
        config,
        Token::username("alice"),
        vec![exists_on_body("Slow", &format!("{}/s/{{account}}", server.uri()), "OK")],
        CancellationToken::new(),
    )
    .await;

    assert_eq!(report.outcomes[0].status, ProbeStatus::Error);
    let requests = server.received_requests().await.unwrap_or_default();
    assert_eq!(requests.len(), 3, "expected 1 initial attempt + 2 retries");
}

#[tokio::test]
async fn cancellation_preserves_completed_outcomes() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/fast/alice"))
        .respond_with(ResponseTemplate::new(200).set_body_string("OK"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("OK")
                .set_delay(Duration::from_secs(30)),
        )
        .mount(&server)
        .await;

    let mut catalog = vec![exists_on_body(
        "Fast",
        &format!("{}/fast/{{account}}", server.uri()),
        "OK",
    )];
    for i in 0..3 {
        catalog.push(exists_on_body(
            &format!("Slow{i}"),
            &format!("{}/slow{i}/{{account}}", server.uri()),
            "OK",
        ));
    }

    let config = test_config();
    let client = HttpClient::from_config(&config).expect("client");
    let scheduler = ProbeScheduler::new(client, config);
    let cancel = CancellationToken::new();

    let outcomes = scheduler.run(Token::username("alice"), Arc::new(catalog), cancel.clone());
    let collector = tokio::spawn(aggregate(Token::username("alice"), 4, outcomes));

    tokio::time::sleep(Duration::from_millis(500)).await;
    cancel.cancel();

    let report = collector.await.expect("collector");

    assert_eq!(report.outcomes.len(), 4, "no outcome may be dropped on cancellation");
    assert_eq!(report.outcomes[0].status, ProbeStatus::Exists);
    let cancelled = report
        .outcomes
        .iter()
        .filter(|o| o.error_detail.as_deref() == Some(DETAIL_CANCELLED))
        .count();
    assert_eq!(cancelled, 3);
    assert_eq!(report.unresolved, 3);
    assert!(
        report
            .outcomes
            .iter()
            .filter(|o| o.error_detail.as_deref() == Some(DETAIL_CANCELLED))
            .all(|o| o.elapsed_ms >= 400),
        "cut-short outcomes must report the time actually spent waiting"
    );
}

#[tokio::test]
async fn deadline_cuts_off_pending_probes() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/fast/alice"))
        .respond_with(ResponseTemplate::new(200).set_body_string("OK"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("OK")
                .set_delay(Duration::from_secs(30)),
        )
        .mount(&server)
        .await;

    let catalog = vec![
        exists_on_body("Fast", &format!("{}/fast/{{account}}", server.uri()), "OK"),
        exists_on_body("Slow", &format!("{}/slow/{{account}}", server.uri()), "OK"),
    ];

    let config = SearchConfig {
        deadline_secs: Some(1),
        ..test_config()
    };

    let report = run_search(
        config,
        Token::username("alice"),
        catalog,
        CancellationToken::new(),
    )
    .await;

    assert_eq!(report.outcomes.len(), 2);
    assert_eq!(report.outcomes[0].status, ProbeStatus::Exists);
    assert_eq!(report.outcomes[1].status, ProbeStatus::Error);
    assert_eq!(
        report.outcomes[1].error_detail.as_deref(),
        Some(DETAIL_DEADLINE)
    );
    assert!(
        report.outcomes[1].elapsed_ms >= 900,
        "a probe cut off at the deadline waited roughly the whole deadline"
    );
    assert_eq!(report.unresolved, 1);
}

#[tokio::test]
async fn multi_token_reports_come_back_in_input_order() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("OK"))
        .mount(&server)
        .await;

    let catalog = vec![exists_on_body(
        "Site",
        &format!("{}/u/{{account}}", server.uri()),
        "OK",
    )];

    let config = test_config();
    let client = HttpClient::from_config(&config).expect("client");
    let scheduler = ProbeScheduler::new(client, config);

    let tokens = vec![
        Token::username("alice"),
        Token::username("bob"),
        Token::username("carol"),
    ];
    let reports = scheduler
        .run_many(tokens, Arc::new(catalog), CancellationToken::new())
        .await;

    assert_eq!(reports.len(), 3);
    assert_eq!(reports[0].token.value(), "alice");
    assert_eq!(reports[1].token.value(), "bob");
    assert_eq!(reports[2].token.value(), "carol");
    assert!(reports
        .iter()
        .all(|r| r.outcomes[0].status == ProbeStatus::Exists));
}
