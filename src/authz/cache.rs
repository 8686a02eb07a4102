use std::collections::HashMap;

use crate::authz::types::EffectivePermissionSet;

/// Request-scoped memo table over the resolver, keyed by
/// (user id, project id).
///
/// Allocate one per inbound request and pass it by `&mut` into every
/// resolution call; drop it when the request ends. There is no
/// invalidation: grant state is assumed not to change mid-request, and a
/// cache must never be shared between requests or workers.
#[derive(Debug, Default)]
pub struct PermissionCache {
    entries: HashMap<(i64, i64), EffectivePermissionSet>,
}

impl PermissionCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, user_id: i64, project_id: i64) -> Option<EffectivePermissionSet> {
        self.entries.get(&(user_id, project_id)).copied()
    }

    pub fn insert(&mut self, user_id: i64, project_id: i64, set: EffectivePermissionSet) {
        self.entries.insert((user_id, project_id), set);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_miss_then_hit() {
        let mut cache = PermissionCache::new();
        assert!(cache.get(1, 2).is_none());
        assert!(cache.is_empty());

        let set = EffectivePermissionSet {
            can_view_project: true,
            ..Default::default()
        };
        cache.insert(1, 2, set);

        assert_eq!(cache.get(1, 2), Some(set));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_keys_are_per_user_and_per_project() {
        let mut cache = PermissionCache::new();
        cache.insert(1, 2, EffectivePermissionSet::all_granted());

        // Same project, different user; same user, different project
        assert!(cache.get(3, 2).is_none());
        assert!(cache.get(1, 4).is_none());
    }

    #[test]
    fn test_insert_overwrites() {
        let mut cache = PermissionCache::new();
        cache.insert(1, 2, EffectivePermissionSet::default());
        cache.insert(1, 2, EffectivePermissionSet::all_granted());

        assert_eq!(cache.get(1, 2), Some(EffectivePermissionSet::all_granted()));
        assert_eq!(cache.len(), 1);
    }
}
