//! Walkthrough: one ready task, three candidates, one prior participant.
//!
//! Run with `RUST_LOG=grant_engine=debug` to see every reconciler phase.

use grant_engine::{EventHandler, GranterConfig, InMemoryEngine, SecurityGrantHandler, TenantServices};
use grant_types::*;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("grant_engine=info")),
        )
        .init();

    let engine = Arc::new(InMemoryEngine::new());
    let case_id = CaseId::new(4_001);
    let task_id = TaskId::new(88);

    // Users 12, 15 and 21 may all work the review; 15 submitted the claim earlier.
    engine.set_candidates(task_id, [12, 15, 21].map(UserId::new));
    engine.add_archived(ArchivedActivity::new(case_id, "Submit claim").executed_by(UserId::new(15)));

    let config = GranterConfig::load("granter.toml")?;
    let handler = SecurityGrantHandler::new(config, TenantServices::from_engine(engine.clone()))?;

    let task = HumanTask::user_task(task_id, case_id, ProcessDefinitionId::new(3))
        .with_name("Review claim")
        .with_assignee(UserId::new(12));
    let event = EngineEvent::task_updated(task);

    if handler.is_interested(&event) {
        let outcome = handler.execute(&event)?;
        println!("outcome: {outcome:?}");
    }

    for record in engine.grants_on(case_id) {
        println!(
            "granted user {} on case {} (claimed {})",
            record.executed_by, record.case_id, record.claimed_at
        );
    }
    Ok(())
}
