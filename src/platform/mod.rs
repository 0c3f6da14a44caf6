//! Platform abstraction layer
//!
//! The simulation never talks to a host timing API directly. A session asks
//! its `Scheduler` for the next step; in the browser the host answers with
//! `requestAnimationFrame`, in tests and the headless binary a
//! `FixedStepDriver` answers with a fixed delta-time.

use crate::sim::{Game, GameEvent, Session};

/// Something that can run the next simulation step later
pub trait Scheduler {
    fn request_next_step(&mut self);
}

/// Records whether a step was requested; the host polls it after each frame
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameFlag {
    requested: bool,
}

impl FrameFlag {
    /// Read and clear the request
    pub fn take(&mut self) -> bool {
        std::mem::take(&mut self.requested)
    }
}

impl Scheduler for FrameFlag {
    fn request_next_step(&mut self) {
        self.requested = true;
    }
}

/// Summary of a driver run
#[derive(Debug, Clone, Default)]
pub struct DriverReport {
    pub frames: u32,
    pub events: Vec<GameEvent>,
}

/// Deterministic driver: runs requested frames back to back with a fixed dt
#[derive(Debug, Clone)]
pub struct FixedStepDriver {
    dt: f32,
    flag: FrameFlag,
}

impl FixedStepDriver {
    pub fn new(dt: f32) -> Self {
        Self {
            dt,
            flag: FrameFlag::default(),
        }
    }

    pub fn dt(&self) -> f32 {
        self.dt
    }

    /// Start `session` and keep stepping while frames are requested, up to
    /// `max_frames`.
    pub fn run<G: Game>(&mut self, session: &mut Session<G>, max_frames: u32) -> DriverReport {
        let mut report = DriverReport::default();
        session.start(&mut self.flag);
        while report.frames < max_frames && self.flag.take() {
            let events = session.frame(self.dt, &mut self.flag);
            report.events.extend(events);
            report.frames += 1;
        }
        report
    }
}

/// Append `new` to a host-side event queue, dropping the oldest entries
/// beyond `cap` so an unread queue cannot grow without bound
pub fn push_capped(pending: &mut Vec<GameEvent>, new: Vec<GameEvent>, cap: usize) {
    pending.extend(new);
    if pending.len() > cap {
        let excess = pending.len() - cap;
        pending.drain(..excess);
    }
}

impl Scheduler for FixedStepDriver {
    fn request_next_step(&mut self) {
        self.flag.request_next_step();
    }
}
