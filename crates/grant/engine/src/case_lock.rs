//! Per-case serialization
//!
//! Two tasks of the same case readied at the same moment can race
//! through deduplication and both grant the same user. When enabled,
//! reconciliations of one case run one at a time within this process.
//! Different cases never wait on each other.

use grant_types::CaseId;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

#[derive(Debug, Default)]
pub struct CaseLocks {
    locks: Mutex<HashMap<CaseId, Arc<Mutex<()>>>>,
}

impl CaseLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `f` while holding the lock for `case_id`.
    pub fn with_case<T>(&self, case_id: CaseId, f: impl FnOnce() -> T) -> T {
        let entry = self.enter(case_id);
        // The guarded value is (), so a poisoned lock carries no broken state.
        let _guard = entry.lock.lock().unwrap_or_else(PoisonError::into_inner);
        f()
    }

    fn enter(&self, case_id: CaseId) -> CaseEntry<'_> {
        let mut locks = self.map();
        CaseEntry {
            locks: self,
            case_id,
            lock: Arc::clone(locks.entry(case_id).or_default()),
        }
    }

    fn map(&self) -> MutexGuard<'_, HashMap<CaseId, Arc<Mutex<()>>>> {
        self.locks.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Cases with a reconciliation in flight or queued.
    pub fn active_cases(&self) -> usize {
        self.map().len()
    }
}

/// One caller's claim on a case lock; releasing it drops the map entry
/// once no other caller holds or waits on the lock.
struct CaseEntry<'a> {
    locks: &'a CaseLocks,
    case_id: CaseId,
    lock: Arc<Mutex<()>>,
}

impl Drop for CaseEntry<'_> {
    fn drop(&mut self) {
        let mut locks = self.locks.map();
        drop(std::mem::take(&mut self.lock));
        if locks
            .get(&self.case_id)
            .is_some_and(|lock| Arc::strong_count(lock) == 1)
        {
            locks.remove(&self.case_id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::panic::{self, AssertUnwindSafe};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::mpsc;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_returns_closure_result_and_cleans_up() {
        let locks = CaseLocks::new();
        let value = locks.with_case(CaseId::new(1), || 42);
        assert_eq!(value, 42);
        assert_eq!(locks.active_cases(), 0);
    }

    #[test]
    fn test_same_case_is_serialized() {
        let locks = Arc::new(CaseLocks::new());
        let inside = Arc::new(AtomicUsize::new(0));
        let max_inside = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let locks = Arc::clone(&locks);
                let inside = Arc::clone(&inside);
                let max_inside = Arc::clone(&max_inside);
                thread::spawn(move || {
                    locks.with_case(CaseId::new(7), || {
                        let now = inside.fetch_add(1, Ordering::SeqCst) + 1;
                        max_inside.fetch_max(now, Ordering::SeqCst);
                        thread::sleep(Duration::from_millis(5));
                        inside.fetch_sub(1, Ordering::SeqCst);
                    })
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(max_inside.load(Ordering::SeqCst), 1);
        assert_eq!(locks.active_cases(), 0);
    }

    #[test]
    fn test_panicking_run_releases_the_case() {
        let locks = CaseLocks::new();
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            locks.with_case(CaseId::new(3), || panic!("reconciliation aborted"))
        }));
        assert!(outcome.is_err());
        assert_eq!(locks.active_cases(), 0);

        assert_eq!(locks.with_case(CaseId::new(3), || "again"), "again");
        assert_eq!(locks.active_cases(), 0);
    }

    #[test]
    fn test_entry_stays_while_another_caller_waits() {
        let locks = Arc::new(CaseLocks::new());
        let (entered_tx, entered_rx) = mpsc::channel();
        let (release_tx, release_rx) = mpsc::channel::<()>();

        let holder = {
            let locks = Arc::clone(&locks);
            thread::spawn(move || {
                locks.with_case(CaseId::new(4), || {
                    entered_tx.send(()).unwrap();
                    release_rx.recv().unwrap();
                })
            })
        };
        entered_rx.recv().unwrap();

        let waiter = {
            let locks = Arc::clone(&locks);
            thread::spawn(move || locks.with_case(CaseId::new(4), || ()))
        };
        thread::sleep(Duration::from_millis(20));
        release_tx.send(()).unwrap();

        holder.join().unwrap();
        waiter.join().unwrap();
        assert_eq!(locks.active_cases(), 0);
    }
}
