//! Engine service contracts consumed by the reconciler
//!
//! The engine owns all of these. The reconciler only reads configuration
//! and history, and submits grant records for creation and archival.
//! Every call is synchronous and runs on the dispatching thread.

use grant_types::{
    ArchivedActivity, CaseId, Category, CategoryOrder, EngineResult, GrantRecord, Parameter,
    ParameterOrder, ProcessDefinitionId, QueryWindow, TaskId, UserId,
};

/// Process definition parameters
pub trait ParameterStore: Send + Sync {
    fn list_parameters(
        &self,
        process_definition_id: ProcessDefinitionId,
        window: QueryWindow,
        order: ParameterOrder,
    ) -> EngineResult<Vec<Parameter>>;
}

/// Categories attached to process definitions
pub trait CategoryStore: Send + Sync {
    fn list_categories(
        &self,
        process_definition_id: ProcessDefinitionId,
        window: QueryWindow,
        order: CategoryOrder,
    ) -> EngineResult<Vec<Category>>;
}

/// Users eligible to execute a pending task
pub trait CandidateLookup: Send + Sync {
    /// Candidate user ids in the engine's order, at most `window.limit`.
    fn possible_candidates(&self, task_id: TaskId, window: QueryWindow)
        -> EngineResult<Vec<UserId>>;
}

/// Archived (historical) activities of a case
pub trait ActivityHistory: Send + Sync {
    fn archived_activities(
        &self,
        case_id: CaseId,
        window: QueryWindow,
    ) -> EngineResult<Vec<ArchivedActivity>>;
}

/// Persists new task records
pub trait TaskCreator: Send + Sync {
    /// Fails with `EngineError::Creation`.
    fn create(&self, record: &GrantRecord) -> EngineResult<()>;
}

/// Moves task records into the case history
pub trait TaskArchiver: Send + Sync {
    /// Fails with `EngineError::Archiving`.
    fn archive(
        &self,
        record: &GrantRecord,
        terminal: bool,
        process_definition_id: ProcessDefinitionId,
    ) -> EngineResult<()>;
}
