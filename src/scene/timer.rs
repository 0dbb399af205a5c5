//! Spawn timer state machine.
//!
//! Every schedule is tagged with a fresh generation. The scene only honours
//! firings whose generation matches the running one, so a callback that was
//! already queued when the rate changed can never spawn with the old period.

use crate::error::SceneError;

/// Platform interval source (`setInterval` in the browser).
pub trait TimerHost {
    type Handle;

    /// Fire `generation` every `period_ms` until cancelled.
    fn schedule(&mut self, period_ms: u32, generation: u64) -> Result<Self::Handle, SceneError>;
    fn cancel(&mut self, handle: Self::Handle);
}

#[derive(Debug)]
pub enum TimerState<H> {
    Stopped,
    Running {
        handle: H,
        period_ms: u32,
        generation: u64,
    },
}

pub struct SpawnTimer<T: TimerHost> {
    host: T,
    state: TimerState<T::Handle>,
    last_generation: u64,
}

impl<T: TimerHost> SpawnTimer<T> {
    pub fn new(host: T) -> Self {
        Self {
            host,
            state: TimerState::Stopped,
            last_generation: 0,
        }
    }

    /// Stopped -> Running. On an already running timer this is a restart.
    pub fn start(&mut self, period_ms: u32) -> Result<u64, SceneError> {
        self.restart(period_ms)
    }

    /// Cancel the current schedule (if any) and install a new one. If the host
    /// refuses the new schedule the timer ends up stopped.
    pub fn restart(&mut self, period_ms: u32) -> Result<u64, SceneError> {
        self.stop();
        self.last_generation += 1;
        let generation = self.last_generation;
        let handle = self.host.schedule(period_ms, generation)?;
        self.state = TimerState::Running {
            handle,
            period_ms,
            generation,
        };
        Ok(generation)
    }

    /// Running -> Stopped. No-op when already stopped.
    pub fn stop(&mut self) {
        if let TimerState::Running { handle, .. } =
            std::mem::replace(&mut self.state, TimerState::Stopped)
        {
            self.host.cancel(handle);
        }
    }

    pub fn is_current(&self, generation: u64) -> bool {
        matches!(self.state, TimerState::Running { generation: g, .. } if g == generation)
    }

    pub fn is_running(&self) -> bool {
        matches!(self.state, TimerState::Running { .. })
    }

    pub fn period_ms(&self) -> Option<u32> {
        match self.state {
            TimerState::Running { period_ms, .. } => Some(period_ms),
            TimerState::Stopped => None,
        }
    }

    pub fn state(&self) -> &TimerState<T::Handle> {
        &self.state
    }

    pub fn host(&self) -> &T {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut T {
        &mut self.host
    }
}

#[derive(Debug)]
struct ManualTimer {
    handle: u64,
    generation: u64,
    period_ms: u64,
    next_due_ms: u64,
}

/// Virtual-clock timer host for host-side runs and tests; the browser uses
/// `web::WebTimers`. Nothing fires until [`advance`](Self::advance) is
/// called, which makes tick accounting exact.
#[derive(Debug, Default)]
pub struct ManualTimers {
    now_ms: u64,
    next_handle: u64,
    active: Vec<ManualTimer>,
    scheduled_total: usize,
}

impl ManualTimers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Move the clock forward and return the generations of every firing, in
    /// the order they happened.
    pub fn advance(&mut self, ms: u64) -> Vec<u64> {
        let target = self.now_ms + ms;
        let mut fired = Vec::new();
        loop {
            // earliest due timer; ties go to the older schedule
            let next = self
                .active
                .iter_mut()
                .filter(|t| t.next_due_ms <= target)
                .min_by_key(|t| (t.next_due_ms, t.handle));
            let Some(timer) = next else { break };
            self.now_ms = timer.next_due_ms;
            timer.next_due_ms += timer.period_ms;
            fired.push(timer.generation);
        }
        self.now_ms = target;
        fired
    }

    pub fn now_ms(&self) -> u64 {
        self.now_ms
    }

    pub fn active_count(&self) -> usize {
        self.active.len()
    }

    pub fn scheduled_total(&self) -> usize {
        self.scheduled_total
    }
}

impl TimerHost for ManualTimers {
    type Handle = u64;

    fn schedule(&mut self, period_ms: u32, generation: u64) -> Result<u64, SceneError> {
        let handle = self.next_handle;
        self.next_handle += 1;
        self.scheduled_total += 1;
        let period_ms = u64::from(period_ms.max(1));
        self.active.push(ManualTimer {
            handle,
            generation,
            period_ms,
            next_due_ms: self.now_ms + period_ms,
        });
        Ok(handle)
    }

    fn cancel(&mut self, handle: u64) {
        self.active.retain(|t| t.handle != handle);
    }
}
