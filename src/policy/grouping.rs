// Burst grouping for notification priority
//
// The first notification of a burst goes out at normal priority and anchors the
// window. Later notifications inside the window are lowered; the anchor only
// moves when a notification lands at or past the end of the window.

use crate::config::GroupingConfig;
use chrono::{DateTime, Utc};
use std::sync::{Arc, Mutex};
use tracing::debug;

/// Priority decided for one notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriorityLevel {
    Normal,
    Lowered,
}

/// Shared anchor of the current burst.
///
/// Cloning shares the same cell, so tests can hold a handle and inspect it.
/// State is in-memory only (resets on restart).
#[derive(Debug, Clone, Default)]
pub struct GroupingState {
    anchor: Arc<Mutex<Option<DateTime<Utc>>>>,
}

impl GroupingState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with an existing burst anchored at `anchor`.
    pub fn with_anchor(anchor: DateTime<Utc>) -> Self {
        Self {
            anchor: Arc::new(Mutex::new(Some(anchor))),
        }
    }

    /// Timestamp of the notification that opened the current burst.
    pub fn anchor(&self) -> Option<DateTime<Utc>> {
        *self.anchor.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Decides normal vs lowered priority from time since the burst anchor.
#[derive(Debug, Clone)]
pub struct GroupingPolicy {
    enabled: bool,
    window_minutes: i64,
    state: GroupingState,
}

impl GroupingPolicy {
    pub fn new(config: &GroupingConfig, state: GroupingState) -> Self {
        Self {
            enabled: config.grouping_enabled,
            window_minutes: i64::try_from(config.grouping_minutes).unwrap_or(i64::MAX),
            state,
        }
    }

    pub fn state(&self) -> &GroupingState {
        &self.state
    }

    /// Decide the priority for a notification sent at `now`.
    ///
    /// Only call this for events that passed suppression. The read and the
    /// conditional anchor update happen under one lock.
    pub fn decide_priority(&self, now: DateTime<Utc>) -> PriorityLevel {
        if !self.enabled {
            return PriorityLevel::Normal;
        }

        let mut anchor = self.state.anchor.lock().unwrap_or_else(|e| e.into_inner());

        let Some(start) = *anchor else {
            *anchor = Some(now);
            debug!(anchor = %now, "Starting first notification burst");
            return PriorityLevel::Normal;
        };

        // Whole minutes, truncated
        let elapsed_minutes = (now - start).num_minutes();
        if elapsed_minutes >= self.window_minutes && now >= start {
            *anchor = Some(now);
            debug!(elapsed_minutes, anchor = %now, "Grouping window elapsed, starting new burst");
            PriorityLevel::Normal
        } else {
            debug!(elapsed_minutes, anchor = %start, "Inside grouping window, lowering priority");
            PriorityLevel::Lowered
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    fn policy(enabled: bool, minutes: u64, state: GroupingState) -> GroupingPolicy {
        GroupingPolicy::new(
            &GroupingConfig {
                grouping_enabled: enabled,
                grouping_minutes: minutes,
            },
            state,
        )
    }

    #[test]
    fn test_disabled_always_normal_and_leaves_state() {
        let state = GroupingState::new();
        let policy = policy(false, 10, state.clone());
        assert_eq!(policy.decide_priority(t0()), PriorityLevel::Normal);
        assert_eq!(policy.decide_priority(t0()), PriorityLevel::Normal);
        assert_eq!(state.anchor(), None);
    }

    #[test]
    fn test_first_notification_is_normal_and_sets_anchor() {
        let state = GroupingState::new();
        let policy = policy(true, 10, state.clone());
        assert_eq!(policy.decide_priority(t0()), PriorityLevel::Normal);
        assert_eq!(state.anchor(), Some(t0()));
    }

    #[test]
    fn test_inside_window_is_lowered_and_anchor_fixed() {
        let state = GroupingState::with_anchor(t0());
        let policy = policy(true, 10, state.clone());

        assert_eq!(
            policy.decide_priority(t0() + Duration::minutes(3)),
            PriorityLevel::Lowered
        );
        // Not a sliding window: still measured from the original anchor
        assert_eq!(
            policy.decide_priority(t0() + Duration::seconds(9 * 60 + 59)),
            PriorityLevel::Lowered
        );
        assert_eq!(state.anchor(), Some(t0()));
    }

    #[test]
    fn test_at_window_end_starts_new_burst() {
        let state = GroupingState::with_anchor(t0());
        let policy = policy(true, 10, state.clone());

        let later = t0() + Duration::minutes(10);
        assert_eq!(policy.decide_priority(later), PriorityLevel::Normal);
        assert_eq!(state.anchor(), Some(later));

        assert_eq!(
            policy.decide_priority(later + Duration::minutes(1)),
            PriorityLevel::Lowered
        );
    }

    #[test]
    fn test_zero_window_never_lowers() {
        let state = GroupingState::with_anchor(t0());
        let policy = policy(true, 0, state.clone());
        assert_eq!(policy.decide_priority(t0()), PriorityLevel::Normal);
        assert_eq!(
            policy.decide_priority(t0() + Duration::seconds(1)),
            PriorityLevel::Normal
        );
    }

    #[test]
    fn test_clock_going_backwards_keeps_anchor() {
        let state = GroupingState::with_anchor(t0());
        let policy = policy(true, 0, state.clone());
        assert_eq!(
            policy.decide_priority(t0() - Duration::seconds(30)),
            PriorityLevel::Lowered
        );
        assert_eq!(state.anchor(), Some(t0()));
    }

    #[test]
    fn test_concurrent_decisions_start_one_burst() {
        let state = GroupingState::new();
        let policy = Arc::new(policy(true, 10, state.clone()));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let policy = Arc::clone(&policy);
                std::thread::spawn(move || policy.decide_priority(t0()))
            })
            .collect();

        let normal = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|p| *p == PriorityLevel::Normal)
            .count();
        assert_eq!(normal, 1);
    }
}
