//! Full pipeline scenarios against the mock repository and mock oracle:
//! outcome accounting, failure isolation, event ordering, retry behavior,
//! and fatal-error propagation.

use std::sync::Arc;

use kansa_scanner::{
    ChannelSink, FileOutcome, MockLLMProvider, MockRepoSource, ScanConfig, ScanEngine, ScanError,
    ScanEvent, UnitErrorKind,
};
use tokio_util::sync::CancellationToken;

fn test_config(concurrency: usize) -> ScanConfig {
    ScanConfig {
        concurrency,
        retry_attempts: 3,
        backoff_base_ms: 1,
        ..ScanConfig::default()
    }
}

fn engine(repo: MockRepoSource, provider: MockLLMProvider, concurrency: usize) -> ScanEngine {
    ScanEngine::new(
        Arc::new(repo),
        Arc::new(provider),
        test_config(concurrency),
    )
}

#[tokio::test(flavor = "multi_thread")]
async fn test_twenty_five_files_one_buggy_one_failing() {
    let mut repo = MockRepoSource::new();
    for i in 1..=25 {
        repo = repo.with_file(&format!("src/file{i:02}.ts"), "const x = 1;");
    }
    let repo = repo.with_fetch_failure("src/file19.ts", "connection reset");

    let provider = MockLLMProvider::new().with_response(
        "src/file07.ts",
        r#"{"bugs": [
            {"title": "XSS", "description": "unescaped output", "lines": [3, 5]},
            {"title": "Open redirect", "description": "unvalidated target", "lines": [9, 9]}
        ]}"#,
    );

    let (sink, mut rx) = ChannelSink::new();
    let report = engine(repo, provider, 13)
        .scan(
            "https://github.com/acme/webapp",
            Arc::new(sink),
            CancellationToken::new(),
        )
        .await
        .unwrap();

    assert_eq!(report.repo_name, "webapp");
    assert_eq!(report.total_files, 25);
    assert_eq!(report.outcomes.len(), 25);
    assert!(report.is_complete());
    assert_eq!(report.success_count(), 24);
    assert_eq!(report.failure_count(), 1);
    assert_eq!(report.total_bugs(), 2);

    let buggy = &report.outcomes["src/file07.ts"];
    let bugs = buggy.bugs();
    assert_eq!(bugs.len(), 2);
    assert_eq!(bugs[0].id, "sha-src/file07.ts-0");
    assert_eq!(bugs[1].id, "sha-src/file07.ts-1");

    match &report.outcomes["src/file19.ts"] {
        FileOutcome::Failure { kind, message, .. } => {
            assert_eq!(*kind, UnitErrorKind::Fetch);
            assert!(message.contains("connection reset"));
        }
        other => panic!("expected a failure outcome, got {other:?}"),
    }

    // Every other file completed with zero bugs.
    let empty_successes = report
        .outcomes
        .values()
        .filter(|o| o.is_success() && o.bugs().is_empty())
        .count();
    assert_eq!(empty_successes, 23);

    // Event stream: started, discovered, interleaved per-file events, then
    // exactly one scan-completed after all 25 file-completed events.
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }

    assert!(matches!(events[0], ScanEvent::ScanStarted { .. }));
    assert!(matches!(events[1], ScanEvent::FilesDiscovered { count: 25 }));

    let completed_positions: Vec<usize> = events
        .iter()
        .enumerate()
        .filter(|(_, e)| matches!(e, ScanEvent::FileCompleted { .. }))
        .map(|(i, _)| i)
        .collect();
    assert_eq!(completed_positions.len(), 25);

    let terminal_positions: Vec<usize> = events
        .iter()
        .enumerate()
        .filter(|(_, e)| matches!(e, ScanEvent::ScanCompleted { .. }))
        .map(|(i, _)| i)
        .collect();
    assert_eq!(terminal_positions.len(), 1);
    assert!(terminal_positions[0] > *completed_positions.last().unwrap());
}

#[tokio::test]
async fn test_fetch_failure_does_not_affect_siblings() {
    let repo = MockRepoSource::new()
        .with_file("a.ts", "let a;")
        .with_file("b.ts", "let b;")
        .with_file("c.ts", "let c;")
        .with_fetch_failure("b.ts", "404 Not Found");

    let report = engine(repo, MockLLMProvider::new(), 13)
        .scan(
            "acme/webapp",
            Arc::new(kansa_scanner::NullSink),
            CancellationToken::new(),
        )
        .await
        .unwrap();

    assert!(report.outcomes["a.ts"].is_success());
    assert!(report.outcomes["c.ts"].is_success());
    assert!(!report.outcomes["b.ts"].is_success());
    assert!(report.is_complete());
}

#[tokio::test]
async fn test_unparseable_oracle_output_is_isolated() {
    let repo = MockRepoSource::new()
        .with_file("good.ts", "x")
        .with_file("bad.ts", "y");

    let provider = MockLLMProvider::new().with_response("bad.ts", "I am not JSON, sorry");

    let report = engine(repo, provider, 2)
        .scan(
            "acme/webapp",
            Arc::new(kansa_scanner::NullSink),
            CancellationToken::new(),
        )
        .await
        .unwrap();

    assert!(report.outcomes["good.ts"].is_success());
    match &report.outcomes["bad.ts"] {
        FileOutcome::Failure { kind, .. } => {
            assert_eq!(*kind, UnitErrorKind::MalformedResponse)
        }
        other => panic!("expected malformed-response failure, got {other:?}"),
    }
}

#[tokio::test]
async fn test_schema_violation_is_isolated() {
    let repo = MockRepoSource::new().with_file("odd.ts", "z");
    let provider = MockLLMProvider::new().with_response(
        "odd.ts",
        r#"{"bugs": [{"title": "t", "description": "d", "lines": [5, 3]}]}"#,
    );

    let report = engine(repo, provider, 1)
        .scan(
            "acme/webapp",
            Arc::new(kansa_scanner::NullSink),
            CancellationToken::new(),
        )
        .await
        .unwrap();

    match &report.outcomes["odd.ts"] {
        FileOutcome::Failure { kind, .. } => assert_eq!(*kind, UnitErrorKind::SchemaViolation),
        other => panic!("expected schema-violation failure, got {other:?}"),
    }
}

#[tokio::test]
async fn test_rate_limited_fetch_is_retried_then_succeeds() {
    let repo = MockRepoSource::new()
        .with_file("hot.ts", "x")
        .with_rate_limited("hot.ts", 2);

    let report = engine(repo, MockLLMProvider::new(), 1)
        .scan(
            "acme/webapp",
            Arc::new(kansa_scanner::NullSink),
            CancellationToken::new(),
        )
        .await
        .unwrap();

    assert!(report.outcomes["hot.ts"].is_success());
}

#[tokio::test]
async fn test_rate_limit_exhaustion_becomes_failure_outcome() {
    let repo = MockRepoSource::new()
        .with_file("hot.ts", "x")
        .with_rate_limited("hot.ts", 99);

    let report = engine(repo, MockLLMProvider::new(), 1)
        .scan(
            "acme/webapp",
            Arc::new(kansa_scanner::NullSink),
            CancellationToken::new(),
        )
        .await
        .unwrap();

    match &report.outcomes["hot.ts"] {
        FileOutcome::Failure { kind, .. } => assert_eq!(*kind, UnitErrorKind::RateLimited),
        other => panic!("expected rate-limited failure, got {other:?}"),
    }
}

#[tokio::test]
async fn test_invalid_reference_emits_scan_failed() {
    let (sink, mut rx) = ChannelSink::new();
    let result = engine(MockRepoSource::new(), MockLLMProvider::new(), 13)
        .scan("not a repo url", Arc::new(sink), CancellationToken::new())
        .await;

    assert!(matches!(result, Err(ScanError::InvalidReference(_))));

    let mut saw_failed = false;
    while let Ok(event) = rx.try_recv() {
        if matches!(event, ScanEvent::ScanFailed { .. }) {
            saw_failed = true;
        }
        assert!(!matches!(event, ScanEvent::ScanCompleted { .. }));
    }
    assert!(saw_failed);
}

#[tokio::test]
async fn test_listing_failure_emits_scan_failed() {
    let (sink, mut rx) = ChannelSink::new();
    let result = engine(MockRepoSource::failing_listing(), MockLLMProvider::new(), 13)
        .scan("acme/webapp", Arc::new(sink), CancellationToken::new())
        .await;

    assert!(matches!(result, Err(ScanError::Listing(_))));

    let mut saw_failed = false;
    while let Ok(event) = rx.try_recv() {
        saw_failed |= matches!(event, ScanEvent::ScanFailed { .. });
    }
    assert!(saw_failed);
}

#[tokio::test]
async fn test_empty_candidate_set_completes_cleanly() {
    let repo = MockRepoSource::new()
        .with_file("README.md", "docs only")
        .with_tree_entry("src", "tree");

    let (sink, mut rx) = ChannelSink::new();
    let report = engine(repo, MockLLMProvider::new(), 13)
        .scan("acme/docs", Arc::new(sink), CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(report.total_files, 0);
    assert!(report.is_complete());

    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    assert!(matches!(
        events.last(),
        Some(ScanEvent::ScanCompleted { total_files: 0, .. })
    ));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_cancellation_aborts_the_scan() {
    let mut repo = MockRepoSource::new();
    for i in 0..20 {
        repo = repo.with_file(&format!("src/f{i}.ts"), "x");
    }
    let provider = MockLLMProvider::new().with_latency(std::time::Duration::from_millis(200));

    let cancel = CancellationToken::new();
    let handle = {
        let cancel = cancel.clone();
        let engine = engine(repo, provider, 2);
        tokio::spawn(async move {
            engine
                .scan("acme/webapp", Arc::new(kansa_scanner::NullSink), cancel)
                .await
        })
    };

    tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    cancel.cancel();

    let result = handle.await.unwrap();
    assert!(matches!(result, Err(ScanError::Cancelled)));
}
