//! Candidate resolver: who may execute a pending task
//!
//! Tasks mapped to very large groups would otherwise produce unbounded
//! candidate lists, so every lookup is capped.

use crate::traits::CandidateLookup;
use grant_types::{EngineResult, QueryWindow, TaskId, UserId};
use std::sync::Arc;

#[derive(Clone)]
pub struct CandidateResolver {
    lookup: Arc<dyn CandidateLookup>,
    max_candidates: usize,
}

impl CandidateResolver {
    pub fn new(lookup: Arc<dyn CandidateLookup>, max_candidates: usize) -> Self {
        Self {
            lookup,
            max_candidates,
        }
    }

    /// Candidate user ids in lookup order, never more than the cap.
    pub fn resolve_candidates(&self, task_id: TaskId) -> EngineResult<Vec<UserId>> {
        let mut candidates = self
            .lookup
            .possible_candidates(task_id, QueryWindow::first(self.max_candidates))?;
        // Lookups are asked for the cap but not trusted to honour it.
        candidates.truncate(self.max_candidates);
        Ok(candidates)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryEngine;
    use grant_types::EngineError;

    #[test]
    fn test_preserves_lookup_order() {
        let engine = Arc::new(InMemoryEngine::new());
        engine.set_candidates(TaskId::new(1), [9, 5, 7].map(UserId::new));
        let resolver = CandidateResolver::new(engine, 25);
        assert_eq!(
            resolver.resolve_candidates(TaskId::new(1)).unwrap(),
            [9, 5, 7].map(UserId::new).to_vec()
        );
    }

    #[test]
    fn test_caps_large_pools() {
        let engine = Arc::new(InMemoryEngine::new());
        engine.set_candidates(TaskId::new(1), (1..=100).map(UserId::new));
        let resolver = CandidateResolver::new(engine.clone(), 25);

        let candidates = resolver.resolve_candidates(TaskId::new(1)).unwrap();
        assert_eq!(candidates.len(), 25);
        assert_eq!(candidates.first(), Some(&UserId::new(1)));
        assert_eq!(engine.last_candidate_window().map(|w| w.limit), Some(25));
    }

    #[test]
    fn test_unknown_task_has_no_candidates() {
        let resolver = CandidateResolver::new(Arc::new(InMemoryEngine::new()), 25);
        assert!(resolver.resolve_candidates(TaskId::new(404)).unwrap().is_empty());
    }

    #[test]
    fn test_read_failure_propagates() {
        let engine = Arc::new(InMemoryEngine::new());
        engine.fail_candidate_reads(true);
        let resolver = CandidateResolver::new(engine, 25);
        assert!(matches!(
            resolver.resolve_candidates(TaskId::new(1)),
            Err(EngineError::Read(_))
        ));
    }
}
