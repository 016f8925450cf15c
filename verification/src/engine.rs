//! The verification engine.
//!
//! One [`VerificationEngine`] serves both single-entry triggers
//! ([`verify_one`](VerificationEngine::verify_one)) and bulk runs
//! ([`verify_all`](VerificationEngine::verify_all)). Both go through the same
//! per-entry in-flight guard, so no two provider calls for one entry ever
//! overlap.
//!
//! An entry is driven stage by stage until it settles or parks on a retry:
//! company resolution mints a token, employee confirmation spends it. A
//! token the provider rejects sends the entry back to company resolution and
//! then straight on to a replay, with every provider call drawn from the same
//! retry budget.

use std::collections::{BTreeMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, Weak};

use bgv_protocol::{registry, NationalRegistryClient, ProtocolClient, ProtocolError, Transport};
use bgv_store::VerificationStore;
use bgv_types::{
    CandidateId, CheckKind, Clock, CompanyMatchToken, EngineParams, EntryId, ErrorCategory,
    FailureReason, MatchedValues, NationalRegistryRecord, RegistryIdentifier, RegistryResult,
    RetryNotice, SystemClock, VerificationOutcome, VerificationStatus, WorkHistoryEntry,
};
use tokio::sync::broadcast;

use crate::events::EngineEvent;
use crate::metrics::EngineMetrics;
use crate::reconcile;
use crate::report::{EntryReport, RegistryReport};
use crate::retry::RetryScheduler;
use crate::state::{next_status, Transition};
use crate::EngineError;

/// Events buffered per subscriber before the oldest are dropped.
pub const EVENT_CAPACITY: usize = 256;

const NO_REGISTRY_RECORD: &str = "no UAN record found for this identifier";

/// Builds a [`VerificationEngine`].
pub struct EngineBuilder<T, S> {
    transport: T,
    store: S,
    params: EngineParams,
    clock: Arc<dyn Clock>,
    metrics: Option<Arc<EngineMetrics>>,
}

impl<T: Transport + 'static, S: VerificationStore + 'static> EngineBuilder<T, S> {
    pub fn params(mut self, params: EngineParams) -> Self {
        self.params = params;
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn metrics(mut self, metrics: Arc<EngineMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn build(self) -> Arc<VerificationEngine<T, S>> {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        let retries = RetryScheduler::new(self.params.max_attempts, self.params.retry_backoff());
        Arc::new_cyclic(|this| VerificationEngine {
            client: ProtocolClient::new(self.transport),
            store: self.store,
            clock: self.clock,
            params: self.params,
            retries,
            entries: Mutex::new(BTreeMap::new()),
            in_flight: Mutex::new(HashSet::new()),
            events,
            metrics: self.metrics,
            torn_down: AtomicBool::new(false),
            this: this.clone(),
        })
    }
}

pub struct VerificationEngine<T, S> {
    client: ProtocolClient<T>,
    store: S,
    clock: Arc<dyn Clock>,
    params: EngineParams,
    retries: RetryScheduler,
    entries: Mutex<BTreeMap<EntryId, WorkHistoryEntry>>,
    in_flight: Mutex<HashSet<EntryId>>,
    events: broadcast::Sender<EngineEvent>,
    metrics: Option<Arc<EngineMetrics>>,
    torn_down: AtomicBool,
    /// Handed to retry timers so they never keep the engine alive.
    this: Weak<Self>,
}

/// Marks an entry as in flight until dropped.
struct InFlightGuard<'a> {
    set: &'a Mutex<HashSet<EntryId>>,
    id: EntryId,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        lock(self.set).remove(&self.id);
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

enum Stage {
    Company,
    Employee(CompanyMatchToken),
}

enum Step {
    /// Drive the entry through its next stage.
    Continue,
    /// The entry settled or parked on a retry.
    Done,
}

impl<T: Transport + 'static, S: VerificationStore + 'static> VerificationEngine<T, S> {
    pub fn builder(transport: T, store: S) -> EngineBuilder<T, S> {
        EngineBuilder {
            transport,
            store,
            params: EngineParams::default(),
            clock: Arc::new(SystemClock),
            metrics: None,
        }
    }

    pub fn params(&self) -> &EngineParams {
        &self.params
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Receive engine events from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<EngineEvent> {
        self.events.subscribe()
    }

    // ── Tracking ────────────────────────────────────────────────────────

    /// Start tracking `entry`.
    ///
    /// The store is consulted first: a company token recorded by an earlier
    /// session is reinstated so it is not paid for twice. Pending retries do
    /// not survive a reload.
    pub fn track(&self, mut entry: WorkHistoryEntry) -> Result<(), EngineError> {
        self.ensure_live()?;
        if entry.active_token.is_none() {
            match self.store.latest_verified_state(&entry.id) {
                Ok(Some(token)) => {
                    tracing::debug!(entry = %entry.id, "reinstated company token from store");
                    entry.active_token = Some(token);
                    if entry.status == VerificationStatus::Unverified {
                        entry.status = VerificationStatus::CompanyVerified;
                    }
                }
                Ok(None) => {}
                Err(err) => {
                    tracing::warn!(entry = %entry.id, error = %err, "could not load verified state");
                }
            }
        }
        if entry.active_token.is_none()
            && matches!(
                entry.status,
                VerificationStatus::CompanyVerified | VerificationStatus::EmployeeVerifying
            )
        {
            entry.status = VerificationStatus::Unverified;
        }
        entry.retry = None;

        let mut entries = lock(&self.entries);
        if entries.contains_key(&entry.id) {
            return Err(EngineError::AlreadyTracked(entry.id));
        }
        // A call started for an untracked predecessor must finish first.
        if lock(&self.in_flight).contains(&entry.id) {
            return Err(EngineError::AlreadyInFlight(entry.id));
        }
        entries.insert(entry.id.clone(), entry);
        Ok(())
    }

    /// Stop tracking an entry, canceling its pending retry.
    ///
    /// A call already out for the entry completes, but arms no retry.
    pub fn untrack(&self, id: &EntryId) -> Option<WorkHistoryEntry> {
        // Remove first: `schedule_retry` only arms while the entry is present.
        let removed = lock(&self.entries).remove(id);
        if self.retries.clear(id) {
            self.sync_pending_gauge();
        }
        if removed.is_some() {
            tracing::debug!(entry = %id, "entry untracked");
        }
        removed
    }

    /// Cancel every pending retry and refuse further work.
    ///
    /// Returns the number of retries canceled.
    pub fn teardown(&self) -> usize {
        self.torn_down.store(true, Ordering::SeqCst);
        let canceled = self.retries.clear_all();
        self.sync_pending_gauge();
        tracing::info!(canceled, "verification engine torn down");
        canceled
    }

    pub fn is_torn_down(&self) -> bool {
        self.torn_down.load(Ordering::SeqCst)
    }

    pub fn entry(&self, id: &EntryId) -> Option<WorkHistoryEntry> {
        lock(&self.entries).get(id).cloned()
    }

    /// Tracked entries belonging to `candidate`, ordered by id.
    pub fn entries_for(&self, candidate: &CandidateId) -> Vec<WorkHistoryEntry> {
        lock(&self.entries)
            .values()
            .filter(|e| &e.candidate == candidate)
            .cloned()
            .collect()
    }

    pub fn is_in_flight(&self, id: &EntryId) -> bool {
        lock(&self.in_flight).contains(id)
    }

    /// Number of armed retry timers.
    pub fn pending_retries(&self) -> usize {
        self.retries.armed()
    }

    /// The durable attempt log for `id`, oldest first.
    pub fn history(&self, id: &EntryId) -> Result<Vec<VerificationOutcome>, EngineError> {
        Ok(self.store.attempts(id)?)
    }

    // ── Verification ────────────────────────────────────────────────────

    /// Verify one entry now.
    ///
    /// A fully verified entry is reported as-is without touching the
    /// network. Otherwise any pending retry is canceled and the entry gets a
    /// fresh retry budget.
    pub async fn verify_one(&self, id: &EntryId) -> Result<EntryReport, EngineError> {
        self.ensure_live()?;
        let entry = self
            .entry(id)
            .ok_or_else(|| EngineError::UnknownEntry(id.clone()))?;
        if entry.status.is_fully_verified() {
            tracing::debug!(entry = %id, "already verified");
            return Ok(self.report(&entry, Vec::new()));
        }

        let _guard = self
            .claim_in_flight(id)
            .ok_or_else(|| EngineError::AlreadyInFlight(id.clone()))?;
        if self.retries.clear(id) {
            self.sync_pending_gauge();
        }
        self.update(id, |e| e.retry = None)?;
        self.drive(id).await
    }

    /// Timer callback: re-enter the engine for `id` if `generation` is live.
    async fn run_retry(&self, id: EntryId, generation: u64) {
        if self.is_torn_down() || !self.retries.claim(&id, generation) {
            return;
        }
        self.sync_pending_gauge();
        let Some(_guard) = self.claim_in_flight(&id) else {
            tracing::debug!(entry = %id, "entry busy, scheduled retry dropped");
            return;
        };
        if self.update(&id, |e| e.retry = None).is_err() {
            return;
        }

        tracing::info!(entry = %id, "running scheduled retry");
        match self.drive(&id).await {
            Ok(report) => tracing::debug!(entry = %id, status = %report.status, "retry finished"),
            Err(err) => tracing::warn!(entry = %id, error = %err, "retry aborted"),
        }
    }

    async fn drive(&self, id: &EntryId) -> Result<EntryReport, EngineError> {
        let mut warnings = Vec::new();
        loop {
            let entry = self
                .entry(id)
                .ok_or_else(|| EngineError::UnknownEntry(id.clone()))?;
            let stage = match (entry.status, &entry.active_token) {
                (VerificationStatus::EmployeeVerified, _) => break,
                (
                    VerificationStatus::CompanyVerified
                    | VerificationStatus::EmployeeVerifying
                    | VerificationStatus::EmployeeFailed,
                    Some(token),
                ) => Stage::Employee(token.clone()),
                _ => Stage::Company,
            };

            let step = match stage {
                Stage::Company => self.resolve_company(&entry, &mut warnings).await?,
                Stage::Employee(token) => {
                    self.confirm_employee(&entry, &token, &mut warnings).await?
                }
            };
            if let Step::Done = step {
                break;
            }
        }

        let entry = self
            .entry(id)
            .ok_or_else(|| EngineError::UnknownEntry(id.clone()))?;
        Ok(self.report(&entry, warnings))
    }

    async fn resolve_company(
        &self,
        entry: &WorkHistoryEntry,
        warnings: &mut Vec<String>,
    ) -> Result<Step, EngineError> {
        let id = &entry.id;
        let Some(attempt) = self.begin_attempt(id)? else {
            self.give_up(entry, CheckKind::Company)?;
            return Ok(Step::Done);
        };
        self.transition(id, Transition::BeginCompany)?;
        self.count_call(CheckKind::Company);
        tracing::info!(entry = %id, attempt, employer = %entry.employer_name, "resolving company");

        match self.client.resolve_company(&entry.employer_name).await {
            Ok(token) => {
                self.record(
                    VerificationOutcome::success(
                        id.clone(),
                        CheckKind::Company,
                        MatchedValues::Company(token.clone()),
                        attempt,
                        self.clock.now(),
                    ),
                    warnings,
                );
                self.update(id, |e| {
                    e.active_token = Some(token);
                    e.last_failure = None;
                })?;
                self.transition(id, Transition::CompanyMatched)?;
                Ok(Step::Continue)
            }
            Err(err) => self.handle_failure(id, CheckKind::Company, err, attempt, warnings),
        }
    }

    async fn confirm_employee(
        &self,
        entry: &WorkHistoryEntry,
        token: &CompanyMatchToken,
        warnings: &mut Vec<String>,
    ) -> Result<Step, EngineError> {
        let id = &entry.id;
        let Some(attempt) = self.begin_attempt(id)? else {
            self.give_up(entry, CheckKind::Employee)?;
            return Ok(Step::Done);
        };
        self.transition(id, Transition::BeginEmployee)?;
        self.count_call(CheckKind::Employee);
        tracing::info!(entry = %id, attempt, "confirming employee");

        match self.client.confirm_employee(&entry.employee_name, token).await {
            Ok(record) => {
                self.record(
                    VerificationOutcome::success(
                        id.clone(),
                        CheckKind::Employee,
                        MatchedValues::Employee(record.clone()),
                        attempt,
                        self.clock.now(),
                    ),
                    warnings,
                );
                self.update(id, |e| {
                    e.employee_record = Some(record);
                    e.last_failure = None;
                    e.retry = None;
                })?;
                self.transition(id, Transition::EmployeeConfirmed)?;
                self.settle(id);
                Ok(Step::Done)
            }
            Err(err) => self.handle_failure(id, CheckKind::Employee, err, attempt, warnings),
        }
    }

    /// Decide between refresh, retry and settling after a failed call.
    fn handle_failure(
        &self,
        id: &EntryId,
        kind: CheckKind,
        err: ProtocolError,
        attempt: u32,
        warnings: &mut Vec<String>,
    ) -> Result<Step, EngineError> {
        let category = err.category();
        let message = err.to_string();
        tracing::debug!(entry = %id, %kind, attempt, %category, error = %message, "attempt failed");
        self.record(
            VerificationOutcome::failure(
                id.clone(),
                kind,
                category,
                message.clone(),
                attempt,
                self.clock.now(),
            ),
            warnings,
        );

        let final_attempt = self.retries.is_final(attempt);
        let reason = FailureReason {
            category,
            message,
            attempts: attempt,
            exhausted: final_attempt && (category.is_retryable() || category == ErrorCategory::TokenExpired),
        };

        match category {
            ErrorCategory::TokenExpired if !final_attempt => {
                if let Some(metrics) = &self.metrics {
                    metrics.token_refreshes.inc();
                }
                tracing::info!(entry = %id, attempt, "company token invalidated, refreshing");
                self.update(id, |e| e.active_token = None)?;
                self.transition(id, Transition::TokenRefresh)?;
                Ok(Step::Continue)
            }
            c if c.is_retryable() && !final_attempt => {
                self.schedule_retry(id, reason);
                Ok(Step::Done)
            }
            _ => {
                if reason.exhausted {
                    if let Some(metrics) = &self.metrics {
                        metrics.retries_exhausted.inc();
                    }
                }
                self.fail(id, kind, reason)?;
                Ok(Step::Done)
            }
        }
    }

    /// The budget ran out between stages (a refresh spent the last attempt).
    fn give_up(&self, entry: &WorkHistoryEntry, kind: CheckKind) -> Result<(), EngineError> {
        let reason = match &entry.last_failure {
            Some(last) => FailureReason {
                attempts: self.retries.max_attempts(),
                exhausted: true,
                ..last.clone()
            },
            None => FailureReason {
                category: ErrorCategory::TokenExpired,
                message: "retry budget spent refreshing the company token".to_string(),
                attempts: self.retries.max_attempts(),
                exhausted: true,
            },
        };
        if let Some(metrics) = &self.metrics {
            metrics.retries_exhausted.inc();
        }
        self.fail(&entry.id, kind, reason)
    }

    /// Settle `id` into the failed status for `kind`.
    fn fail(&self, id: &EntryId, kind: CheckKind, reason: FailureReason) -> Result<(), EngineError> {
        let (begin, failed, verifying) = match kind {
            CheckKind::Company => (
                Transition::BeginCompany,
                Transition::CompanyFailed,
                VerificationStatus::CompanyVerifying,
            ),
            _ => (
                Transition::BeginEmployee,
                Transition::EmployeeFailed,
                VerificationStatus::EmployeeVerifying,
            ),
        };
        let status = self
            .entry(id)
            .map(|e| e.status)
            .ok_or_else(|| EngineError::UnknownEntry(id.clone()))?;
        if status != verifying {
            self.transition(id, begin)?;
        }

        tracing::warn!(entry = %id, %kind, reason = %reason, "verification failed");
        self.update(id, |e| {
            e.last_failure = Some(reason);
            e.retry = None;
        })?;
        self.transition(id, failed)?;
        self.settle(id);
        Ok(())
    }

    /// Forget the retry budget and announce the terminal status.
    fn settle(&self, id: &EntryId) {
        if self.retries.clear(id) {
            self.sync_pending_gauge();
        }
        if let Some(entry) = self.entry(id) {
            self.emit(EngineEvent::Settled {
                entry: id.clone(),
                status: entry.status,
                failure: entry.last_failure.filter(|_| entry.status.is_failed()),
            });
        }
    }

    /// Arm a retry timer for `id`, unless it was untracked while the call
    /// was out.
    ///
    /// Must stay a plain fn: the timer future it builds re-enters `run_retry`.
    fn schedule_retry(&self, id: &EntryId, reason: FailureReason) {
        let now = self.clock.now();
        let notice = RetryNotice {
            attempt: reason.attempts,
            max_attempts: self.retries.max_attempts(),
            next_attempt_at: now.plus_secs(self.retries.backoff().as_secs()),
        };

        {
            // Held across `arm`: presence and timer change together.
            let mut entries = lock(&self.entries);
            let Some(entry) = entries.get_mut(id) else {
                self.retries.clear(id);
                tracing::debug!(entry = %id, "entry untracked during call, retry not armed");
                return;
            };
            let weak = self.this.clone();
            let target = id.clone();
            self.retries.arm(id, now, move |generation| async move {
                if let Some(engine) = weak.upgrade() {
                    engine.run_retry(target, generation).await;
                }
            });
            tracing::info!(
                entry = %id,
                attempt = notice.attempt,
                max_attempts = notice.max_attempts,
                reason = %reason.message,
                "retry scheduled"
            );
            entry.last_failure = Some(reason);
            entry.retry = Some(notice.clone());
        }

        if let Some(metrics) = &self.metrics {
            metrics.retries_scheduled.inc();
        }
        self.sync_pending_gauge();
        self.emit(EngineEvent::RetryScheduled {
            entry: id.clone(),
            notice,
        });
    }

    // ── Registry ────────────────────────────────────────────────────────

    /// Look a candidate up in the national registry.
    ///
    /// A stored result is served without a provider call unless `force` is
    /// set. A fresh result is stored, and any tracked entry of the candidate
    /// whose employer appears in it is confirmed as verified.
    pub async fn verify_registry(
        &self,
        candidate: &CandidateId,
        identifier: &RegistryIdentifier,
        force: bool,
    ) -> Result<RegistryReport, EngineError> {
        self.ensure_live()?;
        identifier.validate().map_err(ProtocolError::from)?;
        let mut warnings = Vec::new();

        if !force {
            match self.store.latest_registry_result(candidate) {
                Ok(Some(records)) => {
                    tracing::debug!(%candidate, segments = records.len(), "serving stored registry result");
                    return Ok(registry_report(candidate, records, true, Vec::new(), warnings));
                }
                Ok(None) => {}
                Err(err) => {
                    tracing::warn!(%candidate, error = %err, "could not read stored registry result");
                    warnings.push(format!("stored registry result unavailable: {err}"));
                }
            }
        }

        let kind = registry::kind_for(identifier);
        let log_id = EntryId::for_registry(candidate);
        self.count_call(kind);
        tracing::info!(%candidate, %kind, identifier = identifier.field_name(), "registry lookup");

        let result = NationalRegistryClient::new(&self.client)
            .lookup_any(identifier)
            .await;
        let records = match result {
            Ok(result) => result.records().to_vec(),
            Err(err) => {
                self.record(
                    VerificationOutcome::failure(
                        log_id,
                        kind,
                        err.category(),
                        err.to_string(),
                        1,
                        self.clock.now(),
                    ),
                    &mut warnings,
                );
                return Err(err.into());
            }
        };

        self.record(
            VerificationOutcome::success(
                log_id,
                kind,
                MatchedValues::Registry(records.clone()),
                1,
                self.clock.now(),
            ),
            &mut warnings,
        );
        if let Err(err) = self.store.put_registry_result(candidate, &records) {
            tracing::warn!(%candidate, error = %err, "failed to store registry result");
            if let Some(metrics) = &self.metrics {
                metrics.persistence_failures.inc();
            }
            warnings.push(format!("registry result was not saved: {err}"));
        }

        let confirmed = self.reconcile(candidate, kind, &records, &mut warnings);
        Ok(registry_report(candidate, records, false, confirmed, warnings))
    }

    /// Confirm tracked entries whose employer appears in `segments`.
    fn reconcile(
        &self,
        candidate: &CandidateId,
        kind: CheckKind,
        segments: &[NationalRegistryRecord],
        warnings: &mut Vec<String>,
    ) -> Vec<EntryId> {
        let mut confirmed = Vec::new();
        if segments.is_empty() {
            return confirmed;
        }

        for entry in self.entries_for(candidate) {
            if entry.status.is_fully_verified() {
                continue;
            }
            let Some(segment) = reconcile::matching_segment(&entry, segments) else {
                continue;
            };
            let Some(_guard) = self.claim_in_flight(&entry.id) else {
                tracing::debug!(entry = %entry.id, "entry busy, registry match not applied");
                continue;
            };

            self.record(
                VerificationOutcome::success(
                    entry.id.clone(),
                    kind,
                    MatchedValues::Registry(vec![segment.clone()]),
                    1,
                    self.clock.now(),
                ),
                warnings,
            );
            let record = reconcile::confirmed_record(&entry, segment);
            let applied = self
                .update(&entry.id, |e| {
                    e.employee_record = Some(record);
                    e.last_failure = None;
                    e.retry = None;
                })
                .and_then(|_| self.transition(&entry.id, Transition::RegistryMatched));
            match applied {
                Ok(_) => {
                    tracing::info!(entry = %entry.id, employer = %segment.establishment_name, exit = %segment.exit, "confirmed from registry");
                    self.settle(&entry.id);
                    confirmed.push(entry.id);
                }
                Err(err) => {
                    tracing::warn!(entry = %entry.id, error = %err, "registry match not applied");
                }
            }
        }
        confirmed
    }

    // ── Helpers ─────────────────────────────────────────────────────────

    /// Spend one attempt of `id`'s budget. Budget state is dropped again if
    /// the entry was untracked meanwhile.
    fn begin_attempt(&self, id: &EntryId) -> Result<Option<u32>, EngineError> {
        let attempt = self.retries.begin_attempt(id);
        if !lock(&self.entries).contains_key(id) {
            self.retries.clear(id);
            return Err(EngineError::UnknownEntry(id.clone()));
        }
        Ok(attempt)
    }

    fn ensure_live(&self) -> Result<(), EngineError> {
        if self.is_torn_down() {
            Err(EngineError::TornDown)
        } else {
            Ok(())
        }
    }

    fn claim_in_flight(&self, id: &EntryId) -> Option<InFlightGuard<'_>> {
        if lock(&self.in_flight).insert(id.clone()) {
            Some(InFlightGuard {
                set: &self.in_flight,
                id: id.clone(),
            })
        } else {
            None
        }
    }

    fn update<R>(
        &self,
        id: &EntryId,
        f: impl FnOnce(&mut WorkHistoryEntry) -> R,
    ) -> Result<R, EngineError> {
        let mut entries = lock(&self.entries);
        let entry = entries
            .get_mut(id)
            .ok_or_else(|| EngineError::UnknownEntry(id.clone()))?;
        Ok(f(entry))
    }

    /// Apply `transition` to `id`, announcing the change.
    fn transition(
        &self,
        id: &EntryId,
        transition: Transition,
    ) -> Result<VerificationStatus, EngineError> {
        let (from, to) = {
            let mut entries = lock(&self.entries);
            let entry = entries
                .get_mut(id)
                .ok_or_else(|| EngineError::UnknownEntry(id.clone()))?;
            let from = entry.status;
            entry.status = next_status(from, transition)?;
            (from, entry.status)
        };
        if from != to {
            tracing::trace!(entry = %id, %from, %to, "status changed");
            self.emit(EngineEvent::StatusChanged {
                entry: id.clone(),
                from,
                to,
            });
        }
        Ok(to)
    }

    /// Append an outcome to the store. A failed write becomes a warning.
    fn record(&self, outcome: VerificationOutcome, warnings: &mut Vec<String>) {
        if let Some(metrics) = &self.metrics {
            metrics.record_outcome(outcome.category);
        }
        if let Err(err) = self.store.append_attempt(&outcome.entry, &outcome) {
            let message = format!(
                "{} attempt {} was not saved: {err}",
                outcome.kind, outcome.attempt
            );
            tracing::warn!(entry = %outcome.entry, error = %err, "failed to persist attempt");
            if let Some(metrics) = &self.metrics {
                metrics.persistence_failures.inc();
            }
            self.emit(EngineEvent::PersistenceWarning {
                entry: outcome.entry.clone(),
                message: message.clone(),
            });
            warnings.push(message);
        }
    }

    fn count_call(&self, kind: CheckKind) {
        if let Some(metrics) = &self.metrics {
            metrics.record_call(kind);
        }
    }

    fn sync_pending_gauge(&self) {
        if let Some(metrics) = &self.metrics {
            metrics.pending_retries.set(self.retries.armed() as i64);
        }
    }

    fn emit(&self, event: EngineEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }

    fn report(&self, entry: &WorkHistoryEntry, warnings: Vec<String>) -> EntryReport {
        EntryReport::from_entry(entry, self.retries.backoff().as_secs(), warnings)
    }
}

fn registry_report(
    candidate: &CandidateId,
    records: Vec<NationalRegistryRecord>,
    cached: bool,
    confirmed: Vec<EntryId>,
    warnings: Vec<String>,
) -> RegistryReport {
    let (result, notice) = if records.is_empty() {
        (RegistryResult::NoRecord, Some(NO_REGISTRY_RECORD.to_string()))
    } else {
        (RegistryResult::Records(records), None)
    };
    RegistryReport {
        candidate: candidate.clone(),
        result,
        cached,
        notice,
        confirmed,
        warnings,
    }
}
