use std::collections::HashSet;

use crate::handler_core::Tag;

/// Outcome of one reconciliation. `tags` is the full set to submit to a
/// whole-set-replace API (surviving current tags in their original order,
/// then missing mandatory tags in mandatory order); `added` is just the
/// appended subset, for incremental APIs that would otherwise resubmit
/// unchanged tags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconcilePlan {
    pub tags: Vec<Tag>,
    pub added: Vec<Tag>,
}

impl ReconcilePlan {
    pub fn changed(&self) -> bool {
        !self.added.is_empty()
    }
}

/// Fill gaps only: drop provider-reserved tags (never writable), then append
/// each mandatory tag whose key is absent. A mandatory key that is already
/// present keeps whatever value it has.
pub fn gap_fill(current: &[Tag], mandatory: &[Tag], reserved_prefix: &str) -> ReconcilePlan {
    let mut tags: Vec<Tag> = current
        .iter()
        .filter(|t| !t.key.starts_with(reserved_prefix))
        .cloned()
        .collect();

    let added: Vec<Tag> = {
        let have: HashSet<&str> = tags.iter().map(|t| t.key.as_str()).collect();
        mandatory
            .iter()
            .filter(|m| !have.contains(m.key.as_str()))
            .cloned()
            .collect()
    };

    tags.extend(added.iter().cloned());
    ReconcilePlan { tags, added }
}

/// Response to an explicit tag removal: ignore whatever is left on the
/// resource and rewrite the mandatory set in full.
pub fn force_reapply(mandatory: &[Tag]) -> ReconcilePlan {
    ReconcilePlan { tags: mandatory.to_vec(), added: mandatory.to_vec() }
}
