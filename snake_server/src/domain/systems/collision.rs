use crate::domain::state::{EntityId, Snake};

/// Marks the first snake whose head hit a body and returns its id.
///
/// Snakes are scanned in slice order and the scan stops at the first death, so on a head-on
/// crash only the earlier snake dies. A head that lands on another snake counts as a hit no
/// matter which cell it is, the other head included.
pub fn resolve_collisions(snakes: &mut [&mut Snake]) -> Option<EntityId> {
    for i in 0..snakes.len() {
        if !snakes[i].alive {
            continue;
        }

        let head = snakes[i].head();
        let hit = snakes[i].bites_itself()
            || snakes
                .iter()
                .enumerate()
                .any(|(j, other)| j != i && other.occupies(head));

        if hit {
            snakes[i].alive = false;
            return Some(snakes[i].id);
        }
    }
    None
}
