//! One controller tick against a store

use chrono::{DateTime, Utc};
use dp_dbi::{DbiResult, Transactional};
use serde::Serialize;

use crate::action::Action;
use crate::generator::ActionGenerator;

/// Outcome of one tick
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TickReport {
    /// Feasible CBSDs loaded
    pub cbsds: usize,
    /// Executed actions, in execution order
    pub actions: Vec<Action>,
}

impl TickReport {
    pub fn request_count(&self) -> usize {
        self.actions.iter().filter(|a| a.is_request()).count()
    }
}

/// Load state, generate actions and execute them in one transaction
pub fn run_tick<S: Transactional>(
    store: &mut S,
    generator: &mut ActionGenerator,
    now: DateTime<Utc>,
) -> DbiResult<TickReport> {
    let report = store.in_transaction(|manager| {
        let state = manager.get_state()?;
        let cbsds = state.len();
        let actions = generator.generate_actions(state, now);
        for action in &actions {
            action.execute(manager)?;
        }
        Ok(TickReport { cbsds, actions })
    })?;

    log::info!(
        "{} CBSDs, {} actions ({} requests)",
        report.cbsds,
        report.actions.len(),
        report.request_count()
    );
    Ok(report)
}
