use crate::Error;
use opentelemetry::{otel_debug, otel_error};
use std::{
    fmt,
    sync::{
        atomic::{AtomicBool, Ordering},
        mpsc::{self, Receiver, RecvTimeoutError, Sender},
        Arc,
    },
    thread,
    time::{Duration, Instant},
};

type Action = Box<dyn FnMut() + Send>;

enum Command {
    Start {
        delay: Duration,
        periodic: bool,
        action: Action,
    },
    Cancel,
    Dispose,
}

enum State {
    Idle,
    Armed {
        deadline: Instant,
        delay: Duration,
        periodic: bool,
        action: Action,
    },
}

/// Error returned when the timer's worker thread is gone, e.g. because an action panicked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("timer worker has stopped")]
pub struct TimerStopped;

/// A restartable delay.
///
/// [`start`](TaskTimer::start) arms the timer. When the delay elapses without another call to
/// `start` or [`cancel`](TaskTimer::cancel), the action runs once on the timer's own thread.
/// Calling `start` again before that replaces the pending action and restarts the delay.
///
/// Dropping the timer disposes it.
pub struct TaskTimer {
    delay: Duration,
    sender: Sender<Command>,
    disposed: Arc<AtomicBool>,
}

impl fmt::Debug for TaskTimer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskTimer")
            .field("delay", &self.delay)
            .field("disposed", &self.disposed.load(Ordering::Relaxed))
            .finish()
    }
}

impl TaskTimer {
    /// Create an idle timer with the given delay.
    ///
    /// Fails if the worker thread cannot be spawned.
    pub fn new(delay: Duration) -> Result<Self, Error> {
        let (sender, receiver) = mpsc::channel();
        let disposed = Arc::new(AtomicBool::new(false));
        let worker_disposed = disposed.clone();
        thread::Builder::new()
            .name("ApplicationInsights.TaskTimer".to_string())
            .spawn(move || run(receiver, worker_disposed))
            .map_err(|e| {
                otel_error!(name: "TaskTimer.ThreadStartError", error = format!("{:?}", e));
                Error::TimerSpawn(e)
            })?;
        Ok(TaskTimer {
            delay,
            sender,
            disposed,
        })
    }

    /// Delay between [`start`](TaskTimer::start) and the action running.
    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Change the delay used by subsequent calls to [`start`](TaskTimer::start).
    pub fn set_delay(&mut self, delay: Duration) {
        self.delay = delay;
    }

    /// Arm the timer to run `action` once after the delay, replacing any pending action.
    pub fn start<F>(&self, action: F) -> Result<(), TimerStopped>
    where
        F: FnOnce() + Send + 'static,
    {
        let mut action = Some(action);
        self.send(Command::Start {
            delay: self.delay,
            periodic: false,
            action: Box::new(move || {
                if let Some(action) = action.take() {
                    action();
                }
            }),
        })
    }

    /// Arm the timer to run `action` after every delay.
    ///
    /// The next delay starts once the action returns, so invocations never overlap.
    pub fn start_periodic<F>(&self, action: F) -> Result<(), TimerStopped>
    where
        F: FnMut() + Send + 'static,
    {
        self.send(Command::Start {
            delay: self.delay,
            periodic: true,
            action: Box::new(action),
        })
    }

    /// Disarm the timer without running the pending action.
    pub fn cancel(&self) -> Result<(), TimerStopped> {
        self.send(Command::Cancel)
    }

    /// Whether [`dispose`](TaskTimer::dispose) was called.
    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::SeqCst)
    }

    /// Cancel any pending action and stop the worker thread.
    ///
    /// An action that is running finishes but is not rearmed. Calling this more than once is a
    /// no-op. The worker thread is not joined, so an action may dispose its own timer.
    pub fn dispose(&self) -> Result<(), TimerStopped> {
        if self.disposed.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        self.sender.send(Command::Dispose).map_err(|_| TimerStopped)
    }

    fn send(&self, command: Command) -> Result<(), TimerStopped> {
        if self.is_disposed() {
            return Err(TimerStopped);
        }
        self.sender.send(command).map_err(|_| TimerStopped)
    }
}

impl Drop for TaskTimer {
    fn drop(&mut self) {
        let _ = self.dispose();
    }
}

fn run(receiver: Receiver<Command>, disposed: Arc<AtomicBool>) {
    let mut state = State::Idle;
    loop {
        let command = match &state {
            State::Idle => match receiver.recv() {
                Ok(command) => Some(command),
                Err(_) => break,
            },
            State::Armed { deadline, .. } => {
                let timeout = deadline.saturating_duration_since(Instant::now());
                match receiver.recv_timeout(timeout) {
                    Ok(command) => Some(command),
                    Err(RecvTimeoutError::Timeout) => None,
                    Err(RecvTimeoutError::Disconnected) => break,
                }
            }
        };

        match command {
            Some(Command::Start {
                delay,
                periodic,
                action,
            }) => {
                state = State::Armed {
                    deadline: Instant::now() + delay,
                    delay,
                    periodic,
                    action,
                };
            }
            Some(Command::Cancel) => state = State::Idle,
            Some(Command::Dispose) => break,
            None => {
                if disposed.load(Ordering::SeqCst) {
                    break;
                }
                if let State::Armed {
                    delay,
                    periodic,
                    mut action,
                    ..
                } = std::mem::replace(&mut state, State::Idle)
                {
                    action();
                    if periodic && !disposed.load(Ordering::SeqCst) {
                        state = State::Armed {
                            deadline: Instant::now() + delay,
                            delay,
                            periodic,
                            action,
                        };
                    }
                }
            }
        }
    }
    otel_debug!(name: "TaskTimer.ThreadStopped");
}
