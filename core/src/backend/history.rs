use super::models::MemoryEntry;
use crate::stream::event::parse_timestamp;

/// Memory entries belonging to one plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanHistory {
    pub plan_id: i64,
    pub prompt: Option<String>,
    pub created_at: Option<String>,
    pub entries: Vec<MemoryEntry>,
}

/// Groups entries by `content.plan_id`, newest plan first. A plan is dated by
/// its first entry; plans without a readable date go last, in order of first
/// appearance. Entries without a plan id are skipped.
pub fn group_by_plan(entries: &[MemoryEntry]) -> Vec<PlanHistory> {
    let mut groups: Vec<PlanHistory> = Vec::new();

    for entry in entries {
        let Some(plan_id) = entry.content.plan_id else {
            continue;
        };
        match groups.iter_mut().find(|g| g.plan_id == plan_id) {
            Some(group) => {
                if group.prompt.is_none() {
                    group.prompt = entry.content.prompt.clone();
                }
                group.entries.push(entry.clone());
            }
            None => groups.push(PlanHistory {
                plan_id,
                prompt: entry.content.prompt.clone(),
                created_at: entry.created_at.clone(),
                entries: vec![entry.clone()],
            }),
        }
    }

    groups.sort_by_cached_key(|g| {
        std::cmp::Reverse(g.created_at.as_deref().and_then(parse_timestamp))
    });
    groups
}
