//! Idle grant cleanup

use dp_dbi::{DetailedCbsd, GrantState};

use crate::action::Action;
use crate::frequency::unset_grant_frequency;

/// Drop idle grants from `cbsd`, returning the actions that persist it
///
/// Each idle grant frees its bit in the available frequencies (an update
/// is emitted only when that changes the masks) and is then deleted.
/// `cbsd` keeps only its non-idle grants and the updated masks.
pub fn remove_idle_grants(cbsd: &mut DetailedCbsd) -> Vec<Action> {
    let mut actions = Vec::new();
    let (idle, active): (Vec<_>, Vec<_>) = std::mem::take(&mut cbsd.grants)
        .into_iter()
        .partition(|g| g.state == GrantState::Idle);

    for grant in idle {
        let frequencies = unset_grant_frequency(&cbsd.cbsd, &grant.grant);
        if frequencies != cbsd.cbsd.available_frequencies {
            cbsd.cbsd.available_frequencies = frequencies.clone();
            actions.push(Action::store_available_frequencies(cbsd.cbsd.id, frequencies));
        }
        log::debug!("CBSD {}: removing idle grant {}", cbsd.cbsd.id, grant.grant.id);
        actions.push(Action::DeleteGrant(grant.grant));
    }

    cbsd.grants = active;
    actions
}
