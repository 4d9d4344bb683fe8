use super::{
    event::DiagnosticEvent,
    scheduler::{RoutineScheduler, RoutineToken},
};
use chrono::{DateTime, Utc};
use opentelemetry::{otel_debug, otel_warn};
use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::Duration,
};

/// Limits for diagnostic event throttling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThrottlingSettings {
    /// Number of occurrences of one event allowed per interval.
    pub throttle_after: u32,
    /// How often all counters are reset.
    pub reset_interval: Duration,
}

impl Default for ThrottlingSettings {
    fn default() -> Self {
        ThrottlingSettings {
            throttle_after: 5,
            reset_interval: Duration::from_secs(24 * 60 * 60),
        }
    }
}

/// Decides whether a diagnostic event should be suppressed.
pub trait Throttle: Send + Sync {
    /// Count one occurrence of `event_id` and return `true` if it should be suppressed.
    fn should_throttle(&self, event_id: i32, timestamp: DateTime<Utc>) -> bool;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ThrottlingState {
    count: u32,
    window_start: DateTime<Utc>,
}

type Counters = Arc<Mutex<HashMap<i32, ThrottlingState>>>;

/// Counts occurrences per event id and suppresses events above
/// [`throttle_after`](ThrottlingSettings::throttle_after) until the next periodic reset.
///
/// Counters are only reset by a routine registered with the [`RoutineScheduler`]. If that
/// registration fails, no event is ever throttled.
pub struct ThrottlingManager {
    counters: Counters,
    throttle_after: u32,
    scheduler: Arc<dyn RoutineScheduler>,
    token: Option<RoutineToken>,
}

impl std::fmt::Debug for ThrottlingManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ThrottlingManager")
            .field("throttle_after", &self.throttle_after)
            .field("token", &self.token)
            .finish()
    }
}

impl ThrottlingManager {
    /// Create a manager and register its reset routine with `scheduler`.
    pub fn new(scheduler: Arc<dyn RoutineScheduler>, settings: ThrottlingSettings) -> Self {
        let counters = Counters::default();
        let reset_counters = counters.clone();
        let throttle_after = settings.throttle_after;
        let token = match scheduler.schedule_to_run_every_interval(
            settings.reset_interval,
            Box::new(move || reset(&reset_counters, throttle_after)),
        ) {
            Ok(token) => Some(token),
            Err(e) => {
                otel_warn!(
                    name: "ThrottlingManager.ScheduleResetFailed",
                    error = format!("{}", e)
                );
                None
            }
        };
        ThrottlingManager {
            counters,
            throttle_after,
            scheduler,
            token,
        }
    }
}

fn lock(counters: &Counters) -> MutexGuard<'_, HashMap<i32, ThrottlingState>> {
    counters.lock().unwrap_or_else(PoisonError::into_inner)
}

fn reset(counters: &Counters, throttle_after: u32) {
    let previous = std::mem::take(&mut *lock(counters));
    for (event_id, state) in previous {
        otel_debug!(
            name: "ThrottlingManager.CounterReset",
            event_id = event_id,
            count = state.count,
            window_start = state.window_start.to_rfc3339()
        );
        if state.count > throttle_after {
            DiagnosticEvent::throttling_reset(event_id, state.count).log();
        }
    }
}

impl Throttle for ThrottlingManager {
    fn should_throttle(&self, event_id: i32, timestamp: DateTime<Utc>) -> bool {
        if self.token.is_none() {
            return false;
        }
        let count = {
            let mut counters = lock(&self.counters);
            let state = counters.entry(event_id).or_insert(ThrottlingState {
                count: 0,
                window_start: timestamp,
            });
            state.count = state.count.saturating_add(1);
            state.count
        };
        if count == self.throttle_after.saturating_add(1) {
            DiagnosticEvent::throttling_started(event_id).log();
        }
        count > self.throttle_after
    }
}

impl Drop for ThrottlingManager {
    fn drop(&mut self) {
        if let Some(token) = self.token.take() {
            let _ = self.scheduler.remove_scheduled_routine(token);
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::{diagnostics::ThrottlingScheduler, Error};

    /// Scheduler that keeps routines and runs them on demand.
    #[derive(Default)]
    pub(crate) struct ManualScheduler {
        routines: Mutex<Vec<Box<dyn FnMut() + Send>>>,
        removed: Mutex<Vec<RoutineToken>>,
        pub(crate) fail: bool,
    }

    impl ManualScheduler {
        pub(crate) fn fire(&self) {
            for routine in self.routines.lock().unwrap().iter_mut() {
                routine();
            }
        }
    }

    impl RoutineScheduler for ManualScheduler {
        fn schedule_to_run_every_interval(
            &self,
            _interval: Duration,
            action: Box<dyn FnMut() + Send>,
        ) -> Result<RoutineToken, Error> {
            if self.fail {
                return Err(Error::SchedulerDisposed);
            }
            let mut routines = self.routines.lock().unwrap();
            routines.push(action);
            Ok(RoutineToken::new(0, routines.len() as u64))
        }

        fn remove_scheduled_routine(&self, token: RoutineToken) -> Result<(), Error> {
            self.removed.lock().unwrap().push(token);
            Ok(())
        }
    }

    fn settings(throttle_after: u32) -> ThrottlingSettings {
        ThrottlingSettings {
            throttle_after,
            reset_interval: Duration::from_secs(60),
        }
    }

    #[test]
    fn allows_ceiling_then_throttles_until_reset() {
        let scheduler = Arc::new(ManualScheduler::default());
        let manager = ThrottlingManager::new(scheduler.clone(), settings(3));
        let now = Utc::now();

        let decisions: Vec<_> = (0..5).map(|_| manager.should_throttle(1, now)).collect();
        assert_eq!(vec![false, false, false, true, true], decisions);

        scheduler.fire();
        assert!(!manager.should_throttle(1, now));
    }

    #[test]
    fn counts_are_per_event() {
        let manager = ThrottlingManager::new(Arc::new(ManualScheduler::default()), settings(1));
        let now = Utc::now();

        assert!(!manager.should_throttle(1, now));
        assert!(manager.should_throttle(1, now));
        assert!(!manager.should_throttle(2, now));
    }

    #[test]
    fn never_throttles_when_scheduling_fails() {
        let scheduler = ManualScheduler {
            fail: true,
            ..Default::default()
        };
        let manager = ThrottlingManager::new(Arc::new(scheduler), settings(1));
        let now = Utc::now();

        assert!((0..10).all(|_| !manager.should_throttle(1, now)));
    }

    #[test]
    fn drop_removes_reset_routine_from_scheduler() {
        let scheduler = Arc::new(ManualScheduler::default());
        drop(ThrottlingManager::new(scheduler.clone(), settings(1)));
        assert_eq!(vec![RoutineToken::new(0, 1)], *scheduler.removed.lock().unwrap());
    }

    #[test]
    fn drop_disposes_timer() {
        let scheduler = Arc::new(ThrottlingScheduler::new());
        let manager = ThrottlingManager::new(scheduler.clone(), settings(1));
        assert_eq!(1, scheduler.tokens().len());

        drop(manager);
        assert!(scheduler.tokens().is_empty());
    }
}
