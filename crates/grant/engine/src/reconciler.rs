//! Reconciler: grants case visibility to every eligible candidate
//!
//! One run per ready user task:
//!
//! ```text
//! Idle -> Filtering -> Resolving -> Deduplicating -> Granting -> Idle
//! ```
//!
//! - **Filtering**: exempt processes stop here.
//! - **Resolving**: candidate lookup; a failed lookup or a single
//!   candidate stops here.
//! - **Deduplicating**: the case history is read and the assignee and
//!   existing grant holders are set aside.
//! - **Granting**: each remaining candidate gets a grant record, created
//!   then archived as terminal. Failures are per candidate.
//!
//! The reconciler keeps no state between runs. Every run re-reads the
//! case history, so redelivering an event only grants the candidates an
//! earlier, partial run missed.

use crate::candidate_resolver::CandidateResolver;
use crate::case_lock::CaseLocks;
use crate::config::{GranterConfig, LedgerReadPolicy};
use crate::ledger_reader::{GrantLedger, LedgerReader};
use crate::policy_evaluator::{ExemptionSource, PolicyEvaluator};
use crate::services::TenantServices;
use crate::synthesizer::GrantSynthesizer;
use crate::traits::{TaskArchiver, TaskCreator};
use grant_types::{CaseId, EngineError, HumanTask, UserId};
use std::collections::HashSet;
use std::sync::Arc;

// ── Phases and Outcomes ──────────────────────────────────────────────

/// Reconciliation phase
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReconcilePhase {
    Idle,
    Filtering,
    Resolving,
    Deduplicating,
    Granting,
}

/// Which half of committing a grant failed
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GrantStage {
    Create,
    Archive,
}

/// A candidate whose grant could not be committed
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GrantFailure {
    pub user: UserId,
    pub stage: GrantStage,
    pub error: EngineError,
}

/// What a run that reached the granting phase did
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    /// Candidates granted in this run, in candidate order
    pub granted: Vec<UserId>,
    /// Candidates the case history already covered
    pub already_granted: Vec<UserId>,
    /// The assignee, when it was among the candidates
    pub assignee_skipped: Option<UserId>,
    pub failures: Vec<GrantFailure>,
}

impl ReconcileReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// How a run ended
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// The process definition opted out
    Exempt(ExemptionSource),
    /// Candidate lookup failed
    ResolutionFailed(EngineError),
    /// Nobody can execute the task
    NoCandidates,
    /// Only one user can execute the task; nothing to reconcile
    SingleCandidate(UserId),
    /// History unreadable under a fail-closed ledger policy
    LedgerUnavailable(EngineError),
    Reconciled(ReconcileReport),
}

impl ReconcileOutcome {
    /// The phase the run terminated in.
    pub fn final_phase(&self) -> ReconcilePhase {
        match self {
            Self::Exempt(_) => ReconcilePhase::Filtering,
            Self::ResolutionFailed(_) | Self::NoCandidates | Self::SingleCandidate(_) => {
                ReconcilePhase::Resolving
            }
            Self::LedgerUnavailable(_) => ReconcilePhase::Deduplicating,
            Self::Reconciled(_) => ReconcilePhase::Granting,
        }
    }

    /// Users granted by this run.
    pub fn granted(&self) -> &[UserId] {
        match self {
            Self::Reconciled(report) => &report.granted,
            _ => &[],
        }
    }
}

// ── Reconciler ───────────────────────────────────────────────────────

pub struct Reconciler {
    policy: PolicyEvaluator,
    resolver: CandidateResolver,
    ledger: LedgerReader,
    synthesizer: GrantSynthesizer,
    creator: Arc<dyn TaskCreator>,
    archiver: Arc<dyn TaskArchiver>,
    ledger_read_policy: LedgerReadPolicy,
    case_locks: Option<CaseLocks>,
}

impl Reconciler {
    pub fn new(services: &TenantServices, config: &GranterConfig) -> Self {
        Self {
            policy: PolicyEvaluator::new(
                services.parameters.clone(),
                services.categories.clone(),
                config.exemption_marker.clone(),
                config.page_size,
            ),
            resolver: CandidateResolver::new(services.candidates.clone(), config.max_candidates),
            ledger: LedgerReader::new(services.history.clone(), config.page_size),
            synthesizer: GrantSynthesizer::new(
                config.grant_name.clone(),
                config.grant_description.clone(),
                config.delegate_user_id,
            ),
            creator: services.creator.clone(),
            archiver: services.archiver.clone(),
            ledger_read_policy: config.ledger_read_policy,
            case_locks: config.serialize_per_case.then(CaseLocks::new),
        }
    }

    /// Reconcile grants for a task that just became ready.
    pub fn reconcile(&self, task: &HumanTask) -> ReconcileOutcome {
        let outcome = match &self.case_locks {
            Some(locks) => locks.with_case(task.case_id, || self.run(task)),
            None => self.run(task),
        };
        enter(task, ReconcilePhase::Idle);
        outcome
    }

    fn run(&self, task: &HumanTask) -> ReconcileOutcome {
        enter(task, ReconcilePhase::Filtering);
        if let Some(source) = self.policy.exemption(task.process_definition_id) {
            tracing::debug!(
                process_definition_id = %task.process_definition_id,
                source = ?source,
                "Process exempt from grant reconciliation"
            );
            return ReconcileOutcome::Exempt(source);
        }

        enter(task, ReconcilePhase::Resolving);
        let candidates = match self.resolver.resolve_candidates(task.id) {
            Ok(candidates) => candidates,
            Err(err) => {
                tracing::warn!(
                    task_id = %task.id,
                    error = %err,
                    "Could not resolve possible executors of task"
                );
                return ReconcileOutcome::ResolutionFailed(err);
            }
        };
        match candidates.as_slice() {
            [] => return ReconcileOutcome::NoCandidates,
            [only] => return ReconcileOutcome::SingleCandidate(*only),
            _ => {}
        }

        enter(task, ReconcilePhase::Deduplicating);
        let ledger = match self.read_ledger(task.case_id) {
            Ok(ledger) => ledger,
            Err(err) => return ReconcileOutcome::LedgerUnavailable(err),
        };

        enter(task, ReconcilePhase::Granting);
        ReconcileOutcome::Reconciled(self.grant_all(task, &candidates, &ledger))
    }

    fn read_ledger(&self, case_id: CaseId) -> Result<GrantLedger, EngineError> {
        match self.ledger.existing_grants(case_id) {
            Ok(ledger) => Ok(ledger),
            Err(err) => match self.ledger_read_policy {
                LedgerReadPolicy::FailOpen => {
                    tracing::warn!(
                        case_id = %case_id,
                        error = %err,
                        "Could not read archived activities, assuming no prior grants"
                    );
                    Ok(GrantLedger::empty())
                }
                LedgerReadPolicy::FailClosed => {
                    tracing::warn!(
                        case_id = %case_id,
                        error = %err,
                        "Could not read archived activities, abandoning reconciliation"
                    );
                    Err(err)
                }
            },
        }
    }

    fn grant_all(
        &self,
        task: &HumanTask,
        candidates: &[UserId],
        ledger: &GrantLedger,
    ) -> ReconcileReport {
        let mut report = ReconcileReport::default();
        let mut seen = HashSet::with_capacity(candidates.len());

        for &candidate in candidates {
            if !seen.insert(candidate) {
                continue;
            }
            if task.is_assigned_to(candidate) {
                report.assignee_skipped = Some(candidate);
                continue;
            }
            if ledger.has_grant(candidate) {
                tracing::info!(
                    user_id = %candidate,
                    case_id = %task.case_id,
                    "Access already exists"
                );
                report.already_granted.push(candidate);
                continue;
            }

            match self.commit(task, candidate) {
                Ok(()) => report.granted.push(candidate),
                Err(failure) => report.failures.push(failure),
            }
        }

        tracing::info!(
            task_id = %task.id,
            case_id = %task.case_id,
            granted = report.granted.len(),
            already_granted = report.already_granted.len(),
            failed = report.failures.len(),
            "Grant reconciliation finished"
        );
        report
    }

    /// Create the grant record, then archive it as terminal.
    fn commit(&self, task: &HumanTask, candidate: UserId) -> Result<(), GrantFailure> {
        tracing::debug!(
            user_id = %candidate,
            case_id = %task.case_id,
            "Creating grant record"
        );
        let record = self.synthesizer.synthesize(task, candidate);

        if let Err(error) = self.creator.create(&record) {
            tracing::warn!(
                user_id = %candidate,
                task_id = %task.id,
                error = %error,
                "Could not create grant record"
            );
            return Err(GrantFailure {
                user: candidate,
                stage: GrantStage::Create,
                error,
            });
        }

        if let Err(error) = self
            .archiver
            .archive(&record, true, task.process_definition_id)
        {
            tracing::warn!(
                user_id = %candidate,
                task_id = %task.id,
                error = %error,
                "Could not archive grant record"
            );
            return Err(GrantFailure {
                user: candidate,
                stage: GrantStage::Archive,
                error,
            });
        }

        Ok(())
    }
}

fn enter(task: &HumanTask, phase: ReconcilePhase) {
    tracing::debug!(task_id = %task.id, case_id = %task.case_id, phase = ?phase, "Reconciler phase");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryEngine;
    use grant_types::{ArchivedActivity, Category, ProcessDefinitionId, TaskId};

    const CASE: CaseId = CaseId(100);
    const PD: ProcessDefinitionId = ProcessDefinitionId(3);
    const TASK: TaskId = TaskId(50);

    fn setup(config: GranterConfig) -> (Arc<InMemoryEngine>, Reconciler) {
        let engine = Arc::new(InMemoryEngine::new());
        let reconciler = Reconciler::new(&TenantServices::from_engine(engine.clone()), &config);
        (engine, reconciler)
    }

    fn task() -> HumanTask {
        HumanTask::user_task(TASK, CASE, PD).with_assignee(UserId::new(5))
    }

    #[test]
    fn test_grants_every_unassigned_candidate() {
        let (engine, reconciler) = setup(GranterConfig::default());
        engine.set_candidates(TASK, [5, 7, 9].map(UserId::new));

        let outcome = reconciler.reconcile(&task());
        let ReconcileOutcome::Reconciled(report) = &outcome else {
            panic!("unexpected outcome {outcome:?}");
        };
        assert_eq!(report.granted, vec![UserId::new(7), UserId::new(9)]);
        assert_eq!(report.assignee_skipped, Some(UserId::new(5)));
        assert!(report.is_clean());
        assert_eq!(outcome.final_phase(), ReconcilePhase::Granting);
        assert_eq!(engine.created().len(), 2);
    }

    #[test]
    fn test_exempt_process_stops_in_filtering() {
        let (engine, reconciler) = setup(GranterConfig::default());
        engine.add_category(PD, Category::new("skipAutoPermissionGranting"));
        engine.set_candidates(TASK, [5, 7].map(UserId::new));

        let outcome = reconciler.reconcile(&task());
        assert_eq!(outcome, ReconcileOutcome::Exempt(ExemptionSource::Category));
        assert_eq!(outcome.final_phase(), ReconcilePhase::Filtering);
        assert_eq!(engine.candidate_reads(), 0);
    }

    #[test]
    fn test_no_candidates_skips_ledger() {
        let (engine, reconciler) = setup(GranterConfig::default());
        assert_eq!(reconciler.reconcile(&task()), ReconcileOutcome::NoCandidates);
        assert_eq!(engine.history_reads(), 0);
    }

    #[test]
    fn test_fail_closed_ledger_abandons_event() {
        let config = GranterConfig {
            ledger_read_policy: LedgerReadPolicy::FailClosed,
            ..GranterConfig::default()
        };
        let (engine, reconciler) = setup(config);
        engine.set_candidates(TASK, [5, 7].map(UserId::new));
        engine.fail_history_reads(true);

        let outcome = reconciler.reconcile(&task());
        assert!(matches!(outcome, ReconcileOutcome::LedgerUnavailable(EngineError::Read(_))));
        assert_eq!(outcome.final_phase(), ReconcilePhase::Deduplicating);
        assert!(engine.created().is_empty());
    }

    #[test]
    fn test_fail_open_ledger_grants_anyway() {
        let (engine, reconciler) = setup(GranterConfig::default());
        engine.set_candidates(TASK, [5, 7].map(UserId::new));
        engine.add_archived(ArchivedActivity::new(CASE, "Old").executed_by(UserId::new(7)));
        engine.fail_history_reads(true);

        let outcome = reconciler.reconcile(&task());
        assert_eq!(outcome.granted(), &[UserId::new(7)]);
    }

    #[test]
    fn test_repeated_candidate_is_granted_once() {
        let (engine, reconciler) = setup(GranterConfig::default());
        engine.set_candidates(TASK, [7, 9, 7].map(UserId::new));

        let outcome = reconciler.reconcile(&task());
        assert_eq!(outcome.granted(), &[UserId::new(7), UserId::new(9)]);
        assert_eq!(engine.created().len(), 2);
    }

    #[test]
    fn test_serialized_cases_behave_the_same() {
        let config = GranterConfig {
            serialize_per_case: true,
            ..GranterConfig::default()
        };
        let (engine, reconciler) = setup(config);
        engine.set_candidates(TASK, [5, 7, 9].map(UserId::new));

        assert_eq!(reconciler.reconcile(&task()).granted().len(), 2);
        assert!(reconciler.reconcile(&task()).granted().is_empty());
    }
}
