//! In-memory engine services
//!
//! A deterministic stand-in for the engine, implementing every contract
//! the reconciler consumes. Faults can be injected per contract (and per
//! user for creation and archival) and reads are counted, so tests can
//! observe exactly what a run touched.

use crate::services::{ServiceAccessor, TenantServices};
use crate::traits::{
    ActivityHistory, CandidateLookup, CategoryStore, ParameterStore, TaskArchiver, TaskCreator,
};
use grant_types::{
    ArchivedActivity, CaseId, Category, CategoryOrder, EngineError, EngineResult, GrantRecord,
    Parameter, ParameterOrder, ProcessDefinitionId, QueryWindow, TaskId, TenantId, UserId,
};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

#[derive(Debug, Default)]
struct Faults {
    parameters: bool,
    categories: bool,
    candidates: bool,
    history: bool,
    create_for: HashSet<UserId>,
    archive_for: HashSet<UserId>,
}

/// In-memory engine adapter
#[derive(Debug, Default)]
pub struct InMemoryEngine {
    parameters: RwLock<HashMap<ProcessDefinitionId, Vec<Parameter>>>,
    categories: RwLock<HashMap<ProcessDefinitionId, Vec<Category>>>,
    candidates: RwLock<HashMap<TaskId, Vec<UserId>>>,
    archived: RwLock<Vec<ArchivedActivity>>,
    created: RwLock<Vec<GrantRecord>>,
    faults: RwLock<Faults>,
    candidate_reads: AtomicUsize,
    history_reads: AtomicUsize,
    last_candidate_window: RwLock<Option<QueryWindow>>,
    last_parameter_read: RwLock<Option<(QueryWindow, ParameterOrder)>>,
    last_category_read: RwLock<Option<(QueryWindow, CategoryOrder)>>,
}

impl InMemoryEngine {
    pub fn new() -> Self {
        Self::default()
    }

    // ── Seeding ──────────────────────────────────────────────────────

    pub fn add_parameter(&self, process_definition_id: ProcessDefinitionId, parameter: Parameter) {
        write(&self.parameters)
            .entry(process_definition_id)
            .or_default()
            .push(parameter);
    }

    pub fn add_category(&self, process_definition_id: ProcessDefinitionId, category: Category) {
        write(&self.categories)
            .entry(process_definition_id)
            .or_default()
            .push(category);
    }

    /// Replace the candidate pool of a task.
    pub fn set_candidates(&self, task_id: TaskId, users: impl IntoIterator<Item = UserId>) {
        write(&self.candidates).insert(task_id, users.into_iter().collect());
    }

    pub fn add_archived(&self, activity: ArchivedActivity) {
        write(&self.archived).push(activity);
    }

    // ── Fault Injection ──────────────────────────────────────────────

    pub fn fail_parameter_reads(&self, fail: bool) {
        write(&self.faults).parameters = fail;
    }

    pub fn fail_category_reads(&self, fail: bool) {
        write(&self.faults).categories = fail;
    }

    pub fn fail_candidate_reads(&self, fail: bool) {
        write(&self.faults).candidates = fail;
    }

    pub fn fail_history_reads(&self, fail: bool) {
        write(&self.faults).history = fail;
    }

    pub fn fail_create_for(&self, user: UserId) {
        write(&self.faults).create_for.insert(user);
    }

    pub fn fail_archive_for(&self, user: UserId) {
        write(&self.faults).archive_for.insert(user);
    }

    /// Clear every injected fault.
    pub fn heal(&self) {
        *write(&self.faults) = Faults::default();
    }

    // ── Inspection ───────────────────────────────────────────────────

    /// Records accepted by `create`, in order.
    pub fn created(&self) -> Vec<GrantRecord> {
        read(&self.created).clone()
    }

    pub fn grants_on(&self, case_id: CaseId) -> Vec<GrantRecord> {
        read(&self.created)
            .iter()
            .filter(|record| record.case_id == case_id)
            .cloned()
            .collect()
    }

    pub fn archived(&self, case_id: CaseId) -> Vec<ArchivedActivity> {
        read(&self.archived)
            .iter()
            .filter(|entry| entry.case_id == case_id)
            .cloned()
            .collect()
    }

    pub fn candidate_reads(&self) -> usize {
        self.candidate_reads.load(Ordering::SeqCst)
    }

    pub fn history_reads(&self) -> usize {
        self.history_reads.load(Ordering::SeqCst)
    }

    pub fn last_candidate_window(&self) -> Option<QueryWindow> {
        *read(&self.last_candidate_window)
    }

    /// Window and ordering of the most recent parameter listing.
    pub fn last_parameter_read(&self) -> Option<(QueryWindow, ParameterOrder)> {
        *read(&self.last_parameter_read)
    }

    pub fn last_category_read(&self) -> Option<(QueryWindow, CategoryOrder)> {
        *read(&self.last_category_read)
    }

    fn check_window(window: QueryWindow) -> EngineResult<()> {
        if window.limit == 0 {
            return Err(EngineError::OutOfBound {
                offset: window.offset,
                limit: window.limit,
            });
        }
        Ok(())
    }
}

fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}

// Contract calls report poisoning; seeding and inspection recover.
fn read_or_fail<'a, T>(lock: &'a RwLock<T>, what: &str) -> EngineResult<RwLockReadGuard<'a, T>> {
    lock.read().map_err(|_| EngineError::Backend(format!("{what} lock poisoned")))
}

fn write_or_fail<'a, T>(
    lock: &'a RwLock<T>,
    what: &str,
) -> EngineResult<RwLockWriteGuard<'a, T>> {
    lock.write().map_err(|_| EngineError::Backend(format!("{what} lock poisoned")))
}

fn page<T: Clone>(items: &[T], window: QueryWindow) -> Vec<T> {
    items
        .iter()
        .skip(window.offset)
        .take(window.limit)
        .cloned()
        .collect()
}

impl ParameterStore for InMemoryEngine {
    fn list_parameters(
        &self,
        process_definition_id: ProcessDefinitionId,
        window: QueryWindow,
        order: ParameterOrder,
    ) -> EngineResult<Vec<Parameter>> {
        *write(&self.last_parameter_read) = Some((window, order));
        if read_or_fail(&self.faults, "faults")?.parameters {
            return Err(EngineError::Read("parameter store unavailable".into()));
        }
        Self::check_window(window)?;

        let mut parameters = read_or_fail(&self.parameters, "parameters")?
            .get(&process_definition_id)
            .cloned()
            .unwrap_or_default();
        // Stable sort: same-named parameters keep insertion order.
        match order {
            ParameterOrder::NameAsc => parameters.sort_by(|a, b| a.name.cmp(&b.name)),
            ParameterOrder::NameDesc => parameters.sort_by(|a, b| b.name.cmp(&a.name)),
        }
        Ok(page(&parameters, window))
    }
}

impl CategoryStore for InMemoryEngine {
    fn list_categories(
        &self,
        process_definition_id: ProcessDefinitionId,
        window: QueryWindow,
        order: CategoryOrder,
    ) -> EngineResult<Vec<Category>> {
        *write(&self.last_category_read) = Some((window, order));
        if read_or_fail(&self.faults, "faults")?.categories {
            return Err(EngineError::Read("category store unavailable".into()));
        }
        Self::check_window(window)?;

        let mut categories = read_or_fail(&self.categories, "categories")?
            .get(&process_definition_id)
            .cloned()
            .unwrap_or_default();
        // Category names are never null, so only the direction matters.
        match order {
            CategoryOrder::AscNullsFirst | CategoryOrder::AscNullsLast => {
                categories.sort_by(|a, b| a.name.cmp(&b.name))
            }
            CategoryOrder::DescNullsFirst | CategoryOrder::DescNullsLast => {
                categories.sort_by(|a, b| b.name.cmp(&a.name))
            }
        }
        Ok(page(&categories, window))
    }
}

impl CandidateLookup for InMemoryEngine {
    fn possible_candidates(
        &self,
        task_id: TaskId,
        window: QueryWindow,
    ) -> EngineResult<Vec<UserId>> {
        self.candidate_reads.fetch_add(1, Ordering::SeqCst);
        *write(&self.last_candidate_window) = Some(window);
        if read_or_fail(&self.faults, "faults")?.candidates {
            return Err(EngineError::Read(format!(
                "candidate search failed for task {task_id}"
            )));
        }
        Self::check_window(window)?;

        Ok(read_or_fail(&self.candidates, "candidates")?
            .get(&task_id)
            .map(|users| page(users, window))
            .unwrap_or_default())
    }
}

impl ActivityHistory for InMemoryEngine {
    fn archived_activities(
        &self,
        case_id: CaseId,
        window: QueryWindow,
    ) -> EngineResult<Vec<ArchivedActivity>> {
        self.history_reads.fetch_add(1, Ordering::SeqCst);
        if read_or_fail(&self.faults, "faults")?.history {
            return Err(EngineError::Read(format!(
                "archived activities unavailable for case {case_id}"
            )));
        }
        Self::check_window(window)?;

        let history: Vec<_> = read_or_fail(&self.archived, "archived activities")?
            .iter()
            .filter(|entry| entry.case_id == case_id)
            .cloned()
            .collect();
        Ok(page(&history, window))
    }
}

impl TaskCreator for InMemoryEngine {
    fn create(&self, record: &GrantRecord) -> EngineResult<()> {
        if read_or_fail(&self.faults, "faults")?
            .create_for
            .contains(&record.executed_by)
        {
            return Err(EngineError::Creation(format!(
                "could not create grant for user {}",
                record.executed_by
            )));
        }
        write_or_fail(&self.created, "created records")?.push(record.clone());
        Ok(())
    }
}

impl TaskArchiver for InMemoryEngine {
    fn archive(
        &self,
        record: &GrantRecord,
        terminal: bool,
        _process_definition_id: ProcessDefinitionId,
    ) -> EngineResult<()> {
        if read_or_fail(&self.faults, "faults")?
            .archive_for
            .contains(&record.executed_by)
        {
            return Err(EngineError::Archiving(format!(
                "could not archive grant for user {}",
                record.executed_by
            )));
        }
        if !terminal {
            return Err(EngineError::Archiving(
                "only terminal records can be archived".into(),
            ));
        }
        if !read_or_fail(&self.created, "created records")?.contains(record) {
            return Err(EngineError::Archiving(format!(
                "grant for user {} was never created",
                record.executed_by
            )));
        }

        write_or_fail(&self.archived, "archived activities")?.push(
            ArchivedActivity::new(record.case_id, record.name.clone())
                .executed_by(record.executed_by)
                .on_behalf_of(record.executed_by_substitute),
        );
        Ok(())
    }
}

/// Serves one fixed tenant; any other tenant fails service access
#[derive(Debug)]
pub struct StaticAccessor {
    tenant_id: TenantId,
    services: TenantServices,
}

impl StaticAccessor {
    pub fn new(tenant_id: TenantId, services: TenantServices) -> Self {
        Self {
            tenant_id,
            services,
        }
    }
}

impl ServiceAccessor for StaticAccessor {
    fn tenant_services(&self, tenant_id: TenantId) -> EngineResult<TenantServices> {
        if tenant_id != self.tenant_id {
            return Err(EngineError::ServiceAccess(format!(
                "no services registered for tenant {tenant_id}"
            )));
        }
        Ok(self.services.clone())
    }
}
