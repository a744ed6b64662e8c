//! Background sweep timer.
//!
//! A [`Sweeper`] owns one named thread that sleeps on a condition variable
//! until its next deadline, runs a tick, and schedules the next deadline from
//! the interval the tick returns. Stopping wakes the thread at once and joins
//! it; a new `Sweeper` can be spawned afterwards.

use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};
use tracing::{debug, error};

use crate::error::{CacheError, Result};

#[derive(Debug, Default)]
struct StopSignal {
    stopped: Mutex<bool>,
    cvar: Condvar,
}

impl StopSignal {
    /// Sleeps until `deadline` or until stopped. Returns `true` if stopped.
    /// Blocks until stopped or until `deadline`; `None` waits for the stop
    /// alone.
    fn wait_until(&self, deadline: Option<Instant>) -> bool {
        let mut stopped = self.stopped.lock();
        while !*stopped {
            match deadline {
                Some(deadline) => {
                    if self.cvar.wait_until(&mut stopped, deadline).timed_out() {
                        break;
                    }
                }
                None => self.cvar.wait(&mut stopped),
            }
        }
        *stopped
    }

    fn stop(&self) {
        *self.stopped.lock() = true;
        self.cvar.notify_all();
    }
}

/// Handle to a running sweep thread.
#[derive(Debug)]
pub struct Sweeper {
    handle: Option<JoinHandle<()>>,
    signal: Arc<StopSignal>,
}

impl Sweeper {
    /// Spawns the sweep thread.
    ///
    /// `tick` runs every time the current interval elapses and returns the
    /// next interval, or `None` to end the thread.
    pub fn spawn<F>(name: &str, initial: Duration, mut tick: F) -> Result<Self>
    where
        F: FnMut() -> Option<Duration> + Send + 'static,
    {
        let signal = Arc::new(StopSignal::default());
        let thread_signal = Arc::clone(&signal);
        let handle = thread::Builder::new()
            .name(name.to_owned())
            .spawn(move || {
                let mut interval = initial;
                loop {
                    if thread_signal.wait_until(Instant::now().checked_add(interval)) {
                        break;
                    }
                    match tick() {
                        Some(next) => interval = next,
                        None => break,
                    }
                }
                debug!("sweeper thread exiting");
            })
            .map_err(CacheError::Spawn)?;
        Ok(Self {
            handle: Some(handle),
            signal,
        })
    }

    /// Returns `true` while the thread has not exited.
    pub fn is_running(&self) -> bool {
        self.handle.as_ref().map_or(false, |h| !h.is_finished())
    }

    /// Signals the thread and waits for it to exit.
    pub fn stop(&mut self) {
        self.signal.stop();
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                error!("sweeper thread panicked");
            }
        }
    }
}

impl Drop for Sweeper {
    fn drop(&mut self) {
        self.stop();
    }
}
