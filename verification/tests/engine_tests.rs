//! Integration tests driving the engine against the nullable provider and
//! store: single triggers, retries, token refresh, bulk runs and registry
//! reconciliation.

use std::sync::Arc;
use std::time::Duration;

use bgv_nullables::{NullClock, NullProvider, NullVerificationStore, Reply};
use bgv_store::VerificationStore;
use bgv_types::{
    CandidateId, CheckKind, CompanyMatchToken, EngineParams, EntryId, ErrorCategory,
    MatchedValues, RegistryIdentifier, RegistryResult, Timestamp, VerificationOutcome,
    VerificationStatus, WorkHistoryEntry,
};
use bgv_verification::{EngineError, EngineEvent, EngineMetrics, VerificationEngine};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

type Engine = VerificationEngine<Arc<NullProvider>, Arc<NullVerificationStore>>;

struct Harness {
    engine: Arc<Engine>,
    provider: Arc<NullProvider>,
    store: Arc<NullVerificationStore>,
}

fn params(max_attempts: u32) -> EngineParams {
    EngineParams {
        max_attempts,
        retry_backoff_secs: 300,
        pacing_millis: 1_000,
    }
}

fn harness_with(provider: NullProvider, params: EngineParams) -> Harness {
    let provider = Arc::new(provider);
    let store = Arc::new(NullVerificationStore::new());
    let engine = VerificationEngine::builder(Arc::clone(&provider), Arc::clone(&store))
        .params(params)
        .clock(Arc::new(NullClock::default()))
        .build();
    Harness {
        engine,
        provider,
        store,
    }
}

fn harness(max_attempts: u32) -> Harness {
    harness_with(NullProvider::new(), params(max_attempts))
}

fn entry(id: &str, employer: &str) -> WorkHistoryEntry {
    WorkHistoryEntry::new(id, "cand-1", "Jane Doe", employer)
}

fn track(h: &Harness, id: &str, employer: &str) -> EntryId {
    h.engine.track(entry(id, employer)).unwrap();
    EntryId::new(id)
}

fn drain(rx: &mut tokio::sync::broadcast::Receiver<EngineEvent>) -> Vec<EngineEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

// ---------------------------------------------------------------------------
// Single-entry verification
// ---------------------------------------------------------------------------

#[tokio::test]
async fn company_then_employee_verifies_entry() {
    let h = harness(5);
    h.provider
        .script(CheckKind::Company, Reply::company("EST-1", "ACME CORP", "s1"))
        .script(CheckKind::Employee, Reply::employee("Jane Doe", "ACME CORP"));
    let id = track(&h, "e1", "Acme Corp");
    let mut events = h.engine.subscribe();

    let report = h.engine.verify_one(&id).await.unwrap();
    assert_eq!(report.status, VerificationStatus::EmployeeVerified);
    assert_eq!(report.message, "employment verified");
    assert!(report.warnings.is_empty());

    let entry = h.engine.entry(&id).unwrap();
    assert_eq!(entry.active_token.unwrap().secret_token, "s1");
    assert_eq!(entry.employee_record.unwrap().establishment_name, "ACME CORP");

    let history = h.engine.history(&id).unwrap();
    assert_eq!(history.len(), 2);
    assert!(history.iter().all(|o| o.success));

    let transitions: Vec<_> = drain(&mut events)
        .into_iter()
        .filter_map(|e| match e {
            EngineEvent::StatusChanged { to, .. } => Some(to),
            _ => None,
        })
        .collect();
    assert_eq!(
        transitions,
        vec![
            VerificationStatus::CompanyVerifying,
            VerificationStatus::CompanyVerified,
            VerificationStatus::EmployeeVerifying,
            VerificationStatus::EmployeeVerified,
        ]
    );
}

#[tokio::test]
async fn verified_entry_is_never_reverified() {
    let h = harness(5);
    h.provider
        .script(CheckKind::Company, Reply::company("EST-1", "ACME CORP", "s1"))
        .script(CheckKind::Employee, Reply::employee("Jane Doe", "ACME CORP"));
    let id = track(&h, "e1", "Acme Corp");
    h.engine.verify_one(&id).await.unwrap();

    for _ in 0..3 {
        let report = h.engine.verify_one(&id).await.unwrap();
        assert!(report.is_verified());
    }
    let summary = h.engine.verify_all(&[id.clone()]).await;
    assert_eq!(summary.processed(), 0);

    assert_eq!(h.provider.calls(CheckKind::Company), 1);
    assert_eq!(h.provider.calls(CheckKind::Employee), 1);
    assert_eq!(h.engine.history(&id).unwrap().len(), 2);
}

#[tokio::test]
async fn conclusive_company_failure_settles_without_retry() {
    let h = harness(5);
    h.provider.script(CheckKind::Company, Reply::no_record());
    let id = track(&h, "e1", "Nowhere Ltd");

    let report = h.engine.verify_one(&id).await.unwrap();
    assert_eq!(report.status, VerificationStatus::CompanyFailed);
    let failure = report.failure.unwrap();
    assert_eq!(failure.category, ErrorCategory::NotFound);
    assert!(!failure.exhausted);
    assert!(report.retry.is_none());
    assert_eq!(h.engine.pending_retries(), 0);
}

#[tokio::test]
async fn invalid_input_fails_before_any_provider_call() {
    let h = harness(5);
    let id = track(&h, "e1", "   ");

    let report = h.engine.verify_one(&id).await.unwrap();
    assert_eq!(report.status, VerificationStatus::CompanyFailed);
    assert_eq!(report.failure.unwrap().category, ErrorCategory::Validation);
    assert_eq!(h.provider.calls(CheckKind::Company), 0);
}

#[tokio::test]
async fn employee_failure_can_be_retriggered_with_the_same_token() {
    let h = harness(5);
    h.provider
        .script(CheckKind::Company, Reply::company("EST-1", "ACME CORP", "s1"))
        .script(CheckKind::Employee, Reply::status(2, "No employee found"))
        .script(CheckKind::Employee, Reply::employee("Jane Doe", "ACME CORP"));
    let id = track(&h, "e1", "Acme Corp");

    let first = h.engine.verify_one(&id).await.unwrap();
    assert_eq!(first.status, VerificationStatus::EmployeeFailed);
    assert_eq!(first.failure.unwrap().category, ErrorCategory::NotFound);

    let second = h.engine.verify_one(&id).await.unwrap();
    assert_eq!(second.status, VerificationStatus::EmployeeVerified);
    assert_eq!(h.provider.calls(CheckKind::Company), 1);
    assert_eq!(h.provider.calls(CheckKind::Employee), 2);
}

#[tokio::test]
async fn stored_token_is_reused_after_reload() {
    let h = harness(5);
    let id = EntryId::new("e1");
    let token = CompanyMatchToken {
        establishment_id: "EST-1".into(),
        company_name: "ACME CORP".into(),
        secret_token: "from-last-session".into(),
        transaction_id: "ts-1".into(),
    };
    h.store
        .append_attempt(
            &id,
            &VerificationOutcome::success(
                id.clone(),
                CheckKind::Company,
                MatchedValues::Company(token),
                1,
                Timestamp::new(1),
            ),
        )
        .unwrap();
    h.provider
        .script(CheckKind::Employee, Reply::employee("Jane Doe", "ACME CORP"));

    track(&h, "e1", "Acme Corp");
    assert_eq!(
        h.engine.entry(&id).unwrap().status,
        VerificationStatus::CompanyVerified
    );

    let report = h.engine.verify_one(&id).await.unwrap();
    assert!(report.is_verified());
    assert_eq!(h.provider.calls(CheckKind::Company), 0);
    let sent = h.provider.requests(CheckKind::Employee);
    assert_eq!(sent[0]["secretToken"], "from-last-session");
}

#[tokio::test]
async fn tracking_twice_is_rejected() {
    let h = harness(5);
    track(&h, "e1", "Acme Corp");
    let err = h.engine.track(entry("e1", "Acme Corp")).unwrap_err();
    assert!(matches!(err, EngineError::AlreadyTracked(_)));
}

// ---------------------------------------------------------------------------
// Token refresh
// ---------------------------------------------------------------------------

#[tokio::test]
async fn expired_token_is_refreshed_once_and_replayed() {
    let h = harness(5);
    h.provider
        .script(CheckKind::Company, Reply::company("EST-1", "ACME CORP", "old"))
        .script(CheckKind::Company, Reply::company("EST-1", "ACME CORP", "new"))
        .script(CheckKind::Employee, Reply::token_expired())
        .script(CheckKind::Employee, Reply::employee("Jane Doe", "ACME CORP"));
    let id = track(&h, "e1", "Acme Corp");

    let report = h.engine.verify_one(&id).await.unwrap();
    assert_eq!(report.status, VerificationStatus::EmployeeVerified);
    assert_eq!(h.provider.calls(CheckKind::Employee), 2);
    assert_eq!(h.provider.calls(CheckKind::Company), 2);

    let sent = h.provider.requests(CheckKind::Employee);
    assert_eq!(sent[0]["secretToken"], "old");
    assert_eq!(sent[1]["secretToken"], "new");
    assert_eq!(
        h.engine.entry(&id).unwrap().active_token.unwrap().secret_token,
        "new"
    );

    let log: Vec<_> = h
        .engine
        .history(&id)
        .unwrap()
        .into_iter()
        .map(|o| (o.kind, o.category, o.attempt))
        .collect();
    assert_eq!(
        log,
        vec![
            (CheckKind::Company, None, 1),
            (CheckKind::Employee, Some(ErrorCategory::TokenExpired), 2),
            (CheckKind::Company, None, 3),
            (CheckKind::Employee, None, 4),
        ]
    );
}

#[tokio::test]
async fn endless_token_expiry_is_bounded_by_the_retry_cap() {
    let h = harness(4);
    h.provider
        .always(CheckKind::Company, Reply::company("EST-1", "ACME CORP", "s"))
        .always(CheckKind::Employee, Reply::token_expired());
    let id = track(&h, "e1", "Acme Corp");

    let report = h.engine.verify_one(&id).await.unwrap();
    assert_eq!(report.status, VerificationStatus::EmployeeFailed);
    let failure = report.failure.unwrap();
    assert_eq!(failure.category, ErrorCategory::TokenExpired);
    assert!(failure.exhausted);
    assert_eq!(
        h.provider.calls(CheckKind::Company) + h.provider.calls(CheckKind::Employee),
        4
    );
    assert_eq!(h.engine.pending_retries(), 0);
}

// ---------------------------------------------------------------------------
// Retries
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn transient_failures_retry_until_the_cap() {
    let h = harness(3);
    h.provider.always(CheckKind::Company, Reply::source_down());
    let id = track(&h, "e1", "Acme Corp");

    let report = h.engine.verify_one(&id).await.unwrap();
    assert_eq!(report.status, VerificationStatus::CompanyVerifying);
    assert_eq!(report.message, "retrying (attempt 2 of 3) in 5m 0s");
    let notice = report.retry.unwrap();
    assert_eq!(notice.attempt, 1);
    assert_eq!(notice.next_attempt_at, Timestamp::new(1_700_000_300));
    assert_eq!(h.engine.pending_retries(), 1);

    tokio::time::sleep(Duration::from_secs(301)).await;
    assert_eq!(h.provider.calls(CheckKind::Company), 2);
    assert_eq!(h.engine.entry(&id).unwrap().retry.unwrap().attempt, 2);

    tokio::time::sleep(Duration::from_secs(301)).await;
    assert_eq!(h.provider.calls(CheckKind::Company), 3);
    let entry = h.engine.entry(&id).unwrap();
    assert_eq!(entry.status, VerificationStatus::CompanyFailed);
    let failure = entry.last_failure.unwrap();
    assert!(failure.exhausted);
    assert_eq!(failure.attempts, 3);
    assert!(failure.to_string().ends_with("(gave up after 3 attempts)"));
    assert!(entry.retry.is_none());

    // Nothing else fires.
    tokio::time::sleep(Duration::from_secs(3_600)).await;
    assert_eq!(h.provider.calls(CheckKind::Company), 3);
    assert_eq!(h.engine.pending_retries(), 0);
}

#[tokio::test(start_paused = true)]
async fn retry_recovers_and_completes_verification() {
    let h = harness(5);
    h.provider
        .script(CheckKind::Company, Reply::Unreachable)
        .script(CheckKind::Company, Reply::company("EST-1", "ACME CORP", "s1"))
        .script(CheckKind::Employee, Reply::employee("Jane Doe", "ACME CORP"));
    let id = track(&h, "e1", "Acme Corp");
    let mut events = h.engine.subscribe();

    let report = h.engine.verify_one(&id).await.unwrap();
    assert!(report.is_retry_pending());

    tokio::time::sleep(Duration::from_secs(301)).await;
    let entry = h.engine.entry(&id).unwrap();
    assert_eq!(entry.status, VerificationStatus::EmployeeVerified);
    assert!(entry.retry.is_none());
    assert!(entry.last_failure.is_none());

    let events = drain(&mut events);
    assert!(events
        .iter()
        .any(|e| matches!(e, EngineEvent::RetryScheduled { notice, .. } if notice.attempt == 1)));
    assert!(matches!(
        events.last(),
        Some(EngineEvent::Settled { status: VerificationStatus::EmployeeVerified, .. })
    ));
}

#[tokio::test(start_paused = true)]
async fn manual_trigger_replaces_pending_retry_with_fresh_budget() {
    let h = harness(2);
    h.provider
        .script(CheckKind::Company, Reply::source_down())
        .script(CheckKind::Company, Reply::source_down())
        .script(CheckKind::Company, Reply::source_down());
    let id = track(&h, "e1", "Acme Corp");

    h.engine.verify_one(&id).await.unwrap();
    assert_eq!(h.engine.pending_retries(), 1);

    // Manual trigger: the old timer is canceled and the budget restarts at 1.
    let report = h.engine.verify_one(&id).await.unwrap();
    assert_eq!(report.retry.unwrap().attempt, 1);
    assert_eq!(h.engine.pending_retries(), 1);

    tokio::time::sleep(Duration::from_secs(301)).await;
    assert_eq!(h.provider.calls(CheckKind::Company), 3);
    let entry = h.engine.entry(&id).unwrap();
    assert_eq!(entry.status, VerificationStatus::CompanyFailed);
    assert_eq!(entry.last_failure.unwrap().attempts, 2);
}

#[tokio::test(start_paused = true)]
async fn untrack_cancels_pending_retry() {
    let h = harness(5);
    h.provider.always(CheckKind::Company, Reply::source_down());
    let id = track(&h, "e1", "Acme Corp");

    h.engine.verify_one(&id).await.unwrap();
    assert_eq!(h.engine.pending_retries(), 1);

    let removed = h.engine.untrack(&id).unwrap();
    assert_eq!(removed.status, VerificationStatus::CompanyVerifying);
    assert_eq!(h.engine.pending_retries(), 0);

    tokio::time::sleep(Duration::from_secs(3_600)).await;
    assert_eq!(h.provider.calls(CheckKind::Company), 1);
    assert!(matches!(
        h.engine.verify_one(&id).await,
        Err(EngineError::UnknownEntry(_))
    ));
}

#[tokio::test(start_paused = true)]
async fn teardown_cancels_every_retry_and_refuses_work() {
    let h = harness(5);
    h.provider.always(CheckKind::Company, Reply::source_down());
    let a = track(&h, "a", "Acme Corp");
    let b = track(&h, "b", "Globex");
    h.engine.verify_one(&a).await.unwrap();
    h.engine.verify_one(&b).await.unwrap();

    assert_eq!(h.engine.teardown(), 2);
    tokio::time::sleep(Duration::from_secs(3_600)).await;
    assert_eq!(h.provider.calls(CheckKind::Company), 2);
    assert!(matches!(
        h.engine.verify_one(&a).await,
        Err(EngineError::TornDown)
    ));
}

// ---------------------------------------------------------------------------
// Concurrency guard
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn in_flight_entry_is_excluded_from_other_triggers() {
    let provider = NullProvider::new().with_latency(Duration::from_secs(10));
    let h = harness_with(provider, params(5));
    h.provider
        .script(CheckKind::Company, Reply::company("EST-1", "ACME CORP", "s1"))
        .script(CheckKind::Employee, Reply::employee("Jane Doe", "ACME CORP"));
    let id = track(&h, "e1", "Acme Corp");

    let engine = Arc::clone(&h.engine);
    let target = id.clone();
    let running = tokio::spawn(async move { engine.verify_one(&target).await });
    while !h.engine.is_in_flight(&id) {
        tokio::task::yield_now().await;
    }

    assert!(matches!(
        h.engine.verify_one(&id).await,
        Err(EngineError::AlreadyInFlight(_))
    ));
    let summary = h.engine.verify_all(&[id.clone()]).await;
    assert_eq!(summary.skipped, 1);
    assert_eq!(summary.processed(), 0);

    let report = running.await.unwrap().unwrap();
    assert!(report.is_verified());
    assert!(!h.engine.is_in_flight(&id));
    assert_eq!(h.provider.calls(CheckKind::Company), 1);
}

#[tokio::test(start_paused = true)]
async fn untrack_during_call_arms_no_retry() {
    let provider = NullProvider::new().with_latency(Duration::from_secs(10));
    let h = harness_with(provider, params(5));
    h.provider.always(CheckKind::Company, Reply::source_down());
    let id = track(&h, "e1", "Acme Corp");

    let engine = Arc::clone(&h.engine);
    let target = id.clone();
    let running = tokio::spawn(async move { engine.verify_one(&target).await });
    while !h.engine.is_in_flight(&id) {
        tokio::task::yield_now().await;
    }

    assert!(h.engine.untrack(&id).is_some());
    // The old call is still out; the id cannot be reused until it returns.
    assert!(matches!(
        h.engine.track(entry("e1", "Acme Corp")),
        Err(EngineError::AlreadyInFlight(_))
    ));

    let outcome = running.await.unwrap();
    assert!(matches!(outcome, Err(EngineError::UnknownEntry(_))));
    assert_eq!(h.engine.pending_retries(), 0);

    track(&h, "e1", "Acme Corp");
    tokio::time::sleep(Duration::from_secs(320)).await;
    assert_eq!(h.provider.calls(CheckKind::Company), 1);
    assert_eq!(h.engine.pending_retries(), 0);
    assert_eq!(
        h.engine.entry(&id).unwrap().status,
        VerificationStatus::Unverified
    );
}

// ---------------------------------------------------------------------------
// Persistence
// ---------------------------------------------------------------------------

#[tokio::test]
async fn failed_writes_warn_but_keep_state() {
    let h = harness(5);
    h.provider
        .script(CheckKind::Company, Reply::company("EST-1", "ACME CORP", "s1"))
        .script(CheckKind::Employee, Reply::employee("Jane Doe", "ACME CORP"));
    let id = track(&h, "e1", "Acme Corp");
    let mut events = h.engine.subscribe();
    h.store.fail_writes(true);

    let report = h.engine.verify_one(&id).await.unwrap();
    assert_eq!(report.status, VerificationStatus::EmployeeVerified);
    assert_eq!(report.warnings.len(), 2);
    assert!(report.warnings[0].contains("was not saved"));
    assert_eq!(h.store.attempt_count(), 0);

    let warnings = drain(&mut events)
        .into_iter()
        .filter(|e| matches!(e, EngineEvent::PersistenceWarning { .. }))
        .count();
    assert_eq!(warnings, 2);
}

#[tokio::test]
async fn metrics_track_calls_and_outcomes() {
    let provider = Arc::new(NullProvider::new());
    provider
        .script(CheckKind::Company, Reply::company("EST-1", "ACME CORP", "s1"))
        .script(CheckKind::Employee, Reply::token_expired())
        .script(CheckKind::Company, Reply::company("EST-1", "ACME CORP", "s2"))
        .script(CheckKind::Employee, Reply::employee("Jane Doe", "ACME CORP"));
    let metrics = Arc::new(EngineMetrics::new().unwrap());
    let engine = VerificationEngine::builder(Arc::clone(&provider), NullVerificationStore::new())
        .metrics(Arc::clone(&metrics))
        .build();
    engine.track(entry("e1", "Acme Corp")).unwrap();

    engine.verify_one(&EntryId::new("e1")).await.unwrap();
    assert_eq!(metrics.token_refreshes.get(), 1);
    assert_eq!(metrics.provider_calls.with_label_values(&["company"]).get(), 2);
    assert_eq!(metrics.outcomes.with_label_values(&["success"]).get(), 3);
    assert_eq!(metrics.pending_retries.get(), 0);
}

// ---------------------------------------------------------------------------
// Bulk runs
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn bulk_run_counts_transient_failures_and_never_aborts() {
    let h = harness(5);
    for reply in [
        Reply::company("EST-1", "ACME", "s1"),
        Reply::source_down(),
        Reply::company("EST-3", "INITECH", "s3"),
        Reply::HttpError(503),
        Reply::company("EST-5", "HOOLI", "s5"),
    ] {
        h.provider.script(CheckKind::Company, reply);
    }
    h.provider
        .always(CheckKind::Employee, Reply::employee("Jane Doe", "ANY"));
    let ids: Vec<EntryId> = ["e1", "e2", "e3", "e4", "e5"]
        .iter()
        .map(|id| track(&h, id, "Some Employer"))
        .collect();

    let started = tokio::time::Instant::now();
    let summary = h.engine.verify_all(&ids).await;
    assert_eq!(summary.succeeded, 3);
    assert_eq!(summary.failed, 2);
    assert_eq!(summary.skipped, 0);
    assert_eq!(summary.reports.len(), 5);
    assert!(summary.reports[1].is_retry_pending());
    assert!(summary.reports[3].is_retry_pending());
    assert_eq!(h.engine.pending_retries(), 2);

    // Four pauses between five provider-bound entries.
    assert!(started.elapsed() >= Duration::from_secs(4));
    assert!(started.elapsed() < Duration::from_secs(5));
}

#[tokio::test]
async fn bulk_run_only_selects_unverified_entries_of_the_candidate() {
    let h = harness(5);
    h.provider
        .always(CheckKind::Company, Reply::company("EST-1", "ACME", "s"))
        .always(CheckKind::Employee, Reply::employee("Jane Doe", "ACME"));
    track(&h, "e1", "Acme");
    track(&h, "e2", "Acme");
    h.engine
        .track(WorkHistoryEntry::new("other", "cand-2", "John Roe", "Acme"))
        .unwrap();
    h.engine.verify_one(&EntryId::new("e1")).await.unwrap();

    let summary = h
        .engine
        .verify_candidate(&CandidateId::new("cand-1"))
        .await;
    assert_eq!(summary.succeeded, 1);
    assert_eq!(summary.reports[0].entry, EntryId::new("e2"));
    assert_eq!(
        h.engine.entry(&EntryId::new("other")).unwrap().status,
        VerificationStatus::Unverified
    );
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

#[tokio::test]
async fn registry_match_confirms_entry_as_currently_employed() {
    let h = harness(5);
    h.provider.script(
        CheckKind::RegistryFull,
        Reply::registry(&[("Acme Corp", "01-2019", "NA")]),
    );
    let id = track(&h, "e1", "Acme Corp");
    let candidate = CandidateId::new("cand-1");
    let uan = RegistryIdentifier::uan("123456789012").unwrap();

    let report = h
        .engine
        .verify_registry(&candidate, &uan, false)
        .await
        .unwrap();
    assert!(!report.cached);
    assert!(report.notice.is_none());
    assert_eq!(report.confirmed, vec![id.clone()]);

    let entry = h.engine.entry(&id).unwrap();
    assert_eq!(entry.status, VerificationStatus::EmployeeVerified);
    let record = entry.employee_record.unwrap();
    assert!(record.exit.is_current());
    assert_eq!(record.exit.to_string(), "currently employed");
    assert_eq!(record.joined.as_deref(), Some("01-2019"));

    let stored = h.store.latest_registry_result(&candidate).unwrap().unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].establishment_name, "Acme Corp");
    assert!(stored[0].exit.is_current());

    assert_eq!(h.provider.calls(CheckKind::Company), 0);
    assert_eq!(
        h.engine.history(&EntryId::for_registry(&candidate)).unwrap().len(),
        1
    );
}

#[tokio::test]
async fn stored_registry_result_is_served_unless_forced() {
    let h = harness(5);
    h.provider.always(
        CheckKind::RegistryFull,
        Reply::registry(&[("Globex", "03-2017", "12-2018"), ("Acme Corp", "01-2019", "NA")]),
    );
    let candidate = CandidateId::new("cand-1");
    let uan = RegistryIdentifier::uan("123456789012").unwrap();

    h.engine.verify_registry(&candidate, &uan, false).await.unwrap();
    let cached = h
        .engine
        .verify_registry(&candidate, &uan, false)
        .await
        .unwrap();
    assert!(cached.cached);
    assert_eq!(cached.records().len(), 2);
    assert_eq!(h.provider.calls(CheckKind::RegistryFull), 1);

    let forced = h
        .engine
        .verify_registry(&candidate, &uan, true)
        .await
        .unwrap();
    assert!(!forced.cached);
    assert_eq!(h.provider.calls(CheckKind::RegistryFull), 2);
}

#[tokio::test]
async fn registry_no_record_is_informational() {
    let h = harness(5);
    h.provider
        .script(CheckKind::RegistryBasic, Reply::no_record());
    let id = track(&h, "e1", "Acme Corp");
    let candidate = CandidateId::new("cand-1");
    let mobile = RegistryIdentifier::mobile("9876543210").unwrap();

    let report = h
        .engine
        .verify_registry(&candidate, &mobile, false)
        .await
        .unwrap();
    assert_eq!(report.result, RegistryResult::NoRecord);
    assert!(report.notice.unwrap().contains("no UAN record"));
    assert!(report.confirmed.is_empty());
    assert_eq!(h.engine.pending_retries(), 0);
    assert_eq!(
        h.engine.entry(&id).unwrap().status,
        VerificationStatus::Unverified
    );
}

#[tokio::test]
async fn registry_provider_errors_are_returned() {
    let h = harness(5);
    h.provider
        .script(CheckKind::RegistryBasic, Reply::source_down());
    let candidate = CandidateId::new("cand-1");
    let pan = RegistryIdentifier::pan("ABCDE1234F").unwrap();

    let err = h
        .engine
        .verify_registry(&candidate, &pan, false)
        .await
        .unwrap_err();
    match err {
        EngineError::Protocol(e) => assert_eq!(e.category(), ErrorCategory::Transient),
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(h.engine.pending_retries(), 0);
    assert!(h.store.latest_registry_result(&candidate).unwrap().is_none());
}
