use super::timer::TaskTimer;
use crate::Error;
use opentelemetry::{otel_debug, otel_warn};
use std::{
    sync::{
        atomic::{AtomicBool, AtomicU64, Ordering},
        Mutex, MutexGuard, PoisonError,
    },
    time::Duration,
};

static NEXT_SCHEDULER_ID: AtomicU64 = AtomicU64::new(1);

/// Handle to a routine registered with a [`RoutineScheduler`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RoutineToken {
    scheduler_id: u64,
    routine_id: u64,
}

impl RoutineToken {
    pub(crate) fn new(scheduler_id: u64, routine_id: u64) -> Self {
        RoutineToken {
            scheduler_id,
            routine_id,
        }
    }
}

/// Runs routines periodically.
pub trait RoutineScheduler: Send + Sync {
    /// Run `action` every `interval` until the routine is removed.
    ///
    /// Fails with [`Error::InvalidArgument`] if `interval` is zero.
    fn schedule_to_run_every_interval(
        &self,
        interval: Duration,
        action: Box<dyn FnMut() + Send>,
    ) -> Result<RoutineToken, Error>;

    /// Stop a routine.
    ///
    /// Fails with [`Error::InvalidArgument`] if the token was not issued by this scheduler.
    /// Removing a routine that is already gone is a no-op.
    fn remove_scheduled_routine(&self, token: RoutineToken) -> Result<(), Error>;
}

/// [`RoutineScheduler`] backed by one [`TaskTimer`] per routine.
///
/// Every routine re-arms its timer after it returns, so a routine never runs concurrently with
/// itself. Dropping the scheduler disposes all timers.
#[derive(Debug)]
pub struct ThrottlingScheduler {
    id: u64,
    next_routine_id: AtomicU64,
    timers: Mutex<Vec<(RoutineToken, TaskTimer)>>,
    disposed: AtomicBool,
}

impl Default for ThrottlingScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl ThrottlingScheduler {
    /// Create a scheduler without routines.
    pub fn new() -> Self {
        ThrottlingScheduler {
            id: NEXT_SCHEDULER_ID.fetch_add(1, Ordering::Relaxed),
            next_routine_id: AtomicU64::new(1),
            timers: Mutex::new(Vec::new()),
            disposed: AtomicBool::new(false),
        }
    }

    /// Tokens of all active routines.
    pub fn tokens(&self) -> Vec<RoutineToken> {
        self.timers().iter().map(|(token, _)| *token).collect()
    }

    /// Stop all routines. Subsequent calls are no-ops.
    pub fn dispose(&self) {
        if self.disposed.swap(true, Ordering::SeqCst) {
            return;
        }
        let timers = std::mem::take(&mut *self.timers());
        for (_, timer) in timers {
            dispose_timer(&timer);
        }
    }

    fn timers(&self) -> MutexGuard<'_, Vec<(RoutineToken, TaskTimer)>> {
        self.timers.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Adds a running timer unless the scheduler was disposed in the meantime.
    ///
    /// `dispose` sets the flag before taking the timers, so checking it under the lock means a
    /// timer is either taken by `dispose` or never added.
    fn insert(&self, token: RoutineToken, timer: TaskTimer) -> Result<(), Error> {
        let mut timers = self.timers();
        if self.disposed.load(Ordering::SeqCst) {
            drop(timers);
            dispose_timer(&timer);
            return Err(Error::SchedulerDisposed);
        }
        timers.push((token, timer));
        Ok(())
    }
}

fn dispose_timer(timer: &TaskTimer) {
    if let Err(e) = timer.dispose() {
        otel_warn!(
            name: "ThrottlingScheduler.DisposeTimerFailure",
            error = format!("{}", e)
        );
    }
}

impl RoutineScheduler for ThrottlingScheduler {
    fn schedule_to_run_every_interval(
        &self,
        interval: Duration,
        action: Box<dyn FnMut() + Send>,
    ) -> Result<RoutineToken, Error> {
        if interval.is_zero() {
            return Err(Error::invalid_argument("interval", "must be greater than zero"));
        }
        if self.disposed.load(Ordering::SeqCst) {
            return Err(Error::SchedulerDisposed);
        }

        let timer = TaskTimer::new(interval)?;
        timer.start_periodic(action)?;
        let token = RoutineToken::new(
            self.id,
            self.next_routine_id.fetch_add(1, Ordering::Relaxed),
        );
        self.insert(token, timer)?;

        otel_debug!(
            name: "ThrottlingScheduler.TimerCreated",
            interval_ms = interval.as_millis() as u64
        );
        Ok(token)
    }

    fn remove_scheduled_routine(&self, token: RoutineToken) -> Result<(), Error> {
        if token.scheduler_id != self.id {
            return Err(Error::invalid_argument(
                "token",
                "not issued by this scheduler",
            ));
        }

        let removed = {
            let mut timers = self.timers();
            timers
                .iter()
                .position(|(t, _)| *t == token)
                .map(|index| timers.remove(index))
        };
        if let Some((_, timer)) = removed {
            dispose_timer(&timer);
            otel_debug!(name: "ThrottlingScheduler.TimerRemoved");
        }
        Ok(())
    }
}

impl Drop for ThrottlingScheduler {
    fn drop(&mut self) {
        self.dispose();
    }
}
