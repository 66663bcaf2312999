//! Frame scheduler
//!
//! Calls registered step functions once per tick with the milliseconds
//! elapsed since that step's previous call. The first call of each step
//! receives 0.0. A step returning `Break`, or a handle passed to `stop`,
//! is detached before the next tick and never called again.

use std::ops::ControlFlow;
use std::time::Duration;

use tokio::time::{interval, Instant, MissedTickBehavior};

/// Step function: elapsed milliseconds in, keep going or detach out
pub type StepFn = Box<dyn FnMut(f64) -> ControlFlow<()>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FrameHandle(u64);

struct Registration {
    handle: FrameHandle,
    step: StepFn,
    last_tick: Option<f64>,
}

#[derive(Default)]
pub struct FrameScheduler {
    next_id: u64,
    entries: Vec<Registration>,
}

impl FrameScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start<F>(&mut self, step: F) -> FrameHandle
    where
        F: FnMut(f64) -> ControlFlow<()> + 'static,
    {
        let handle = FrameHandle(self.next_id);
        self.next_id += 1;
        self.entries.push(Registration { handle, step: Box::new(step), last_tick: None });
        tracing::debug!(handle = handle.0, "frame step attached");
        handle
    }

    /// Detach a step. Returns false if it was already gone.
    pub fn stop(&mut self, handle: FrameHandle) -> bool {
        let before = self.entries.len();
        self.entries.retain(|r| r.handle != handle);
        let removed = self.entries.len() != before;
        if removed {
            tracing::debug!(handle = handle.0, "frame step detached");
        }
        removed
    }

    pub fn is_active(&self, handle: FrameHandle) -> bool {
        self.entries.iter().any(|r| r.handle == handle)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Run every attached step once at time `now_ms`; returns how many ran
    pub fn tick(&mut self, now_ms: f64) -> usize {
        let mut ran = 0;
        self.entries.retain_mut(|r| {
            let elapsed = r.last_tick.map(|last| (now_ms - last).max(0.0)).unwrap_or(0.0);
            r.last_tick = Some(now_ms);
            ran += 1;
            match (r.step)(elapsed) {
                ControlFlow::Continue(()) => true,
                ControlFlow::Break(()) => {
                    tracing::debug!(handle = r.handle.0, "frame step finished");
                    false
                }
            }
        });
        ran
    }
}

/// Drive `scheduler` from a tokio interval at `fps` for up to `frames` ticks.
///
/// Returns early once no step is attached. Returns the number of ticks.
pub async fn run_frames(scheduler: &mut FrameScheduler, fps: u32, frames: u64) -> u64 {
    let period = Duration::from_secs_f64(1.0 / fps.max(1) as f64);
    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let origin = Instant::now();

    let mut ticks = 0;
    while ticks < frames && !scheduler.is_empty() {
        ticker.tick().await;
        let now_ms = origin.elapsed().as_secs_f64() * 1000.0;
        scheduler.tick(now_ms);
        ticks += 1;
    }
    tracing::debug!(ticks, fps, "frame loop stopped");
    ticks
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn recorder() -> (Rc<RefCell<Vec<f64>>>, impl FnMut(f64) -> ControlFlow<()>) {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        (seen, move |dt| {
            sink.borrow_mut().push(dt);
            ControlFlow::Continue(())
        })
    }

    #[test]
    fn test_first_delta_is_zero() {
        let mut scheduler = FrameScheduler::new();
        let (seen, step) = recorder();
        scheduler.start(step);
        scheduler.tick(1000.0);
        scheduler.tick(1016.0);
        scheduler.tick(1050.0);
        assert_eq!(*seen.borrow(), vec![0.0, 16.0, 34.0]);
    }

    #[test]
    fn test_stop_prevents_further_calls() {
        let mut scheduler = FrameScheduler::new();
        let (seen, step) = recorder();
        let handle = scheduler.start(step);
        scheduler.tick(0.0);
        assert!(scheduler.stop(handle));
        assert!(!scheduler.stop(handle));
        assert_eq!(scheduler.tick(16.0), 0);
        assert_eq!(seen.borrow().len(), 1);
        assert!(!scheduler.is_active(handle));
    }

    #[test]
    fn test_break_detaches() {
        let mut scheduler = FrameScheduler::new();
        let calls = Rc::new(RefCell::new(0));
        let counter = Rc::clone(&calls);
        let handle = scheduler.start(move |_| {
            *counter.borrow_mut() += 1;
            if *counter.borrow() == 3 {
                ControlFlow::Break(())
            } else {
                ControlFlow::Continue(())
            }
        });
        for t in 0..10 {
            scheduler.tick(t as f64 * 16.0);
        }
        assert_eq!(*calls.borrow(), 3);
        assert!(!scheduler.is_active(handle));
        assert!(scheduler.is_empty());
    }

    #[test]
    fn test_independent_steps() {
        let mut scheduler = FrameScheduler::new();
        let (first, a) = recorder();
        let (second, b) = recorder();
        let ha = scheduler.start(a);
        scheduler.tick(0.0);
        let hb = scheduler.start(b);
        assert_ne!(ha, hb);
        scheduler.tick(20.0);
        assert_eq!(*first.borrow(), vec![0.0, 20.0]);
        assert_eq!(*second.borrow(), vec![0.0]);
    }

    #[test]
    fn test_clock_going_backwards_clamps() {
        let mut scheduler = FrameScheduler::new();
        let (seen, step) = recorder();
        scheduler.start(step);
        scheduler.tick(100.0);
        scheduler.tick(90.0);
        assert_eq!(*seen.borrow(), vec![0.0, 0.0]);
    }

    #[tokio::test]
    async fn test_run_frames_stops_when_empty() {
        let mut scheduler = FrameScheduler::new();
        let calls = Rc::new(RefCell::new(0));
        let counter = Rc::clone(&calls);
        scheduler.start(move |_| {
            *counter.borrow_mut() += 1;
            if *counter.borrow() >= 4 {
                ControlFlow::Break(())
            } else {
                ControlFlow::Continue(())
            }
        });
        let ticks = run_frames(&mut scheduler, 1000, 100).await;
        assert_eq!(ticks, 4);
        assert_eq!(*calls.borrow(), 4);
    }
}
