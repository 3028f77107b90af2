//! Elapsed presentation time for the notes display

use std::time::{Duration, Instant};

use chrono::Local;

/// Interval between clock ticks
pub const TICK: Duration = Duration::from_secs(1);

/// Extra information a display host shows next to its page
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PanelKind {
    /// Time since the presentation started, plus the wall clock
    ElapsedTime,
}

/// Counts whole seconds since the presentation started
#[derive(Clone, Debug)]
pub struct ElapsedClock {
    started: Instant,
    last_second: Option<u64>,
}

impl ElapsedClock {
    pub fn start(now: Instant) -> Self {
        Self {
            started: now,
            last_second: None,
        }
    }

    pub fn elapsed(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.started)
    }

    /// New label if a second boundary has passed since the last tick
    pub fn tick(&mut self, now: Instant) -> Option<String> {
        let second = self.elapsed(now).as_secs();
        if self.last_second == Some(second) {
            return None;
        }
        self.last_second = Some(second);
        Some(self.label(now))
    }

    /// When the next second boundary falls
    pub fn next_deadline(&self, now: Instant) -> Instant {
        let into_second = self.elapsed(now).subsec_nanos();
        now + TICK - Duration::from_nanos(u64::from(into_second))
    }

    pub fn label(&self, now: Instant) -> String {
        format!(
            "{} elapsed, {}",
            format_elapsed(self.elapsed(now)),
            Local::now().format("%H:%M")
        )
    }
}

/// `HH:MM:SS`, hours keep counting past 99
pub fn format_elapsed(elapsed: Duration) -> String {
    let secs = elapsed.as_secs();
    format!("{:02}:{:02}:{:02}", secs / 3600, secs / 60 % 60, secs % 60)
}
