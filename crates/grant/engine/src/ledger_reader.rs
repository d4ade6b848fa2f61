//! Grant ledger: the case history seen as a set of grant holders
//!
//! Anyone who executed an archived activity of the case, directly or as
//! substitute, already has visibility and must not be granted again.

use crate::traits::ActivityHistory;
use grant_types::{ArchivedActivity, CaseId, EngineResult, QueryWindow, UserId};
use std::sync::Arc;

/// Archived activities of one case
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GrantLedger {
    entries: Vec<ArchivedActivity>,
}

impl GrantLedger {
    pub fn new(entries: Vec<ArchivedActivity>) -> Self {
        Self { entries }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[ArchivedActivity] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn has_grant(&self, user: UserId) -> bool {
        self.entries.iter().any(|entry| entry.involves(user))
    }
}

/// Reads the grant ledger of a case
#[derive(Clone)]
pub struct LedgerReader {
    history: Arc<dyn ActivityHistory>,
    page_size: usize,
}

impl LedgerReader {
    pub fn new(history: Arc<dyn ActivityHistory>, page_size: usize) -> Self {
        Self { history, page_size }
    }

    /// The first page of the case's archived activities.
    pub fn existing_grants(&self, case_id: CaseId) -> EngineResult<GrantLedger> {
        let entries = self
            .history
            .archived_activities(case_id, QueryWindow::first(self.page_size))?;
        Ok(GrantLedger::new(entries))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryEngine;

    #[test]
    fn test_executor_and_substitute_hold_grants() {
        let ledger = GrantLedger::new(vec![
            ArchivedActivity::new(CaseId::new(1), "Submit").executed_by(UserId::new(3)),
            ArchivedActivity::new(CaseId::new(1), "Approve")
                .executed_by(UserId::new(4))
                .on_behalf_of(UserId::new(8)),
        ]);
        assert!(ledger.has_grant(UserId::new(3)));
        assert!(ledger.has_grant(UserId::new(4)));
        assert!(ledger.has_grant(UserId::new(8)));
        assert!(!ledger.has_grant(UserId::new(5)));
    }

    #[test]
    fn test_reads_only_the_requested_case() {
        let engine = Arc::new(InMemoryEngine::new());
        engine.add_archived(ArchivedActivity::new(CaseId::new(1), "A").executed_by(UserId::new(3)));
        engine.add_archived(ArchivedActivity::new(CaseId::new(2), "B").executed_by(UserId::new(4)));

        let reader = LedgerReader::new(engine.clone(), 500);
        let ledger = reader.existing_grants(CaseId::new(1)).unwrap();
        assert_eq!(ledger.len(), 1);
        assert!(!ledger.has_grant(UserId::new(4)));
        assert_eq!(engine.history_reads(), 1);
    }

    #[test]
    fn test_page_size_bounds_the_read() {
        let engine = Arc::new(InMemoryEngine::new());
        for user in 0..10 {
            engine.add_archived(
                ArchivedActivity::new(CaseId::new(1), "Step").executed_by(UserId::new(user)),
            );
        }
        let ledger = LedgerReader::new(engine, 4)
            .existing_grants(CaseId::new(1))
            .unwrap();
        assert_eq!(ledger.len(), 4);
        let executors: Vec<_> = ledger
            .entries()
            .iter()
            .filter_map(|entry| entry.executed_by)
            .collect();
        assert_eq!(executors, (0..4).map(UserId::new).collect::<Vec<_>>());
    }
}
