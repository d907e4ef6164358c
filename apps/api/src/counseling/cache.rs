//! Best-effort, process-lifetime cache of recent turns per student.
//!
//! Injected through `AppState` rather than living as a global. The external
//! store stays authoritative: the cache only saves a read when assembling
//! history, is lost on restart, and is not synchronized against concurrent
//! turns for the same student. Eviction: per-student ring capped at
//! `TURN_CAPACITY`, oldest turn dropped first.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use uuid::Uuid;

use crate::models::student::ConversationTurn;

pub const TURN_CAPACITY: usize = 32;

pub struct TurnCache {
    capacity: usize,
    inner: Mutex<HashMap<Uuid, VecDeque<ConversationTurn>>>,
}

impl TurnCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            inner: Mutex::new(HashMap::new()),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<Uuid, VecDeque<ConversationTurn>>> {
        // Best-effort cache: a poisoned lock still holds usable data.
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// The most recent `n` cached turns, oldest first. `None` when the
    /// student has no cache entry yet.
    pub fn recent(&self, student_id: Uuid, n: usize) -> Option<Vec<ConversationTurn>> {
        let map = self.lock();
        let turns = map.get(&student_id)?;
        let skip = turns.len().saturating_sub(n);
        Some(turns.iter().skip(skip).cloned().collect())
    }

    /// Seeds a student's entry from the authoritative log, keeping only the
    /// newest `capacity` turns.
    pub fn seed(&self, student_id: Uuid, turns: &[ConversationTurn]) {
        let start = turns.len().saturating_sub(self.capacity);
        let ring: VecDeque<ConversationTurn> = turns[start..].iter().cloned().collect();
        self.lock().insert(student_id, ring);
    }

    pub fn push(&self, student_id: Uuid, turn: ConversationTurn) {
        let mut map = self.lock();
        let ring = map.entry(student_id).or_default();
        ring.push_back(turn);
        while ring.len() > self.capacity {
            ring.pop_front();
        }
    }

    pub fn invalidate(&self, student_id: Uuid) {
        self.lock().remove(&student_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::student::TurnRole;

    fn turn(content: &str) -> ConversationTurn {
        ConversationTurn::now(TurnRole::User, content)
    }

    #[test]
    fn test_recent_is_none_for_unknown_student() {
        let cache = TurnCache::new(4);
        assert!(cache.recent(Uuid::new_v4(), 10).is_none());
    }

    #[test]
    fn test_push_then_recent_returns_newest_n_in_order() {
        let cache = TurnCache::new(8);
        let id = Uuid::new_v4();
        for i in 0..5 {
            cache.push(id, turn(&format!("m{i}")));
        }
        let recent = cache.recent(id, 3).unwrap();
        let contents: Vec<&str> = recent.iter().map(|t| t.content.as_str()).collect();
        assert_eq!(contents, vec!["m2", "m3", "m4"]);
    }

    #[test]
    fn test_ring_evicts_oldest_beyond_capacity() {
        let cache = TurnCache::new(3);
        let id = Uuid::new_v4();
        for i in 0..5 {
            cache.push(id, turn(&format!("m{i}")));
        }
        let recent = cache.recent(id, 10).unwrap();
        let contents: Vec<&str> = recent.iter().map(|t| t.content.as_str()).collect();
        assert_eq!(contents, vec!["m2", "m3", "m4"]);
    }

    #[test]
    fn test_seed_keeps_newest_capacity_turns() {
        let cache = TurnCache::new(2);
        let id = Uuid::new_v4();
        let turns: Vec<ConversationTurn> = (0..4).map(|i| turn(&format!("m{i}"))).collect();
        cache.seed(id, &turns);
        let recent = cache.recent(id, 10).unwrap();
        let contents: Vec<&str> = recent.iter().map(|t| t.content.as_str()).collect();
        assert_eq!(contents, vec!["m2", "m3"]);
    }

    #[test]
    fn test_seed_with_empty_log_creates_empty_entry() {
        let cache = TurnCache::new(4);
        let id = Uuid::new_v4();
        cache.seed(id, &[]);
        assert_eq!(cache.recent(id, 10).unwrap().len(), 0);
    }

    #[test]
    fn test_invalidate_removes_entry() {
        let cache = TurnCache::new(4);
        let id = Uuid::new_v4();
        cache.push(id, turn("m0"));
        cache.invalidate(id);
        assert!(cache.recent(id, 10).is_none());
    }

    #[test]
    fn test_students_do_not_share_entries() {
        let cache = TurnCache::new(4);
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        cache.push(a, turn("from a"));
        assert!(cache.recent(b, 10).is_none());
        assert_eq!(cache.recent(a, 10).unwrap().len(), 1);
    }
}
