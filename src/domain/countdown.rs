//! Countdown timers for flash sales and delivery estimates.
//!
//! A [`Countdown`] is a plain value ticked once per second. Flash-sale countdowns
//! wrap back to their starting duration on the tick after zero; delivery
//! countdowns stop at zero. [`Countdown::spawn`] drives one from a tokio interval.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;

const SECONDS_PER_DAY: u64 = 86_400;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum OnZero {
    /// Restart from the initial duration.
    Wrap,
    /// Stay at zero.
    Halt,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Countdown {
    remaining: u64,
    start: u64,
    on_zero: OnZero,
}

impl Countdown {
    pub fn flash_sale(start: Duration) -> Self {
        Self { remaining: start.as_secs(), start: start.as_secs(), on_zero: OnZero::Wrap }
    }

    pub fn delivery(remaining: Duration) -> Self {
        Self { remaining: remaining.as_secs(), start: remaining.as_secs(), on_zero: OnZero::Halt }
    }

    /// Delivery countdown to `target`; already expired when `target` is not after `now`.
    pub fn until(target: DateTime<Utc>, now: DateTime<Utc>) -> Self {
        let seconds = (target - now).num_seconds().max(0).unsigned_abs();
        Self::delivery(Duration::from_secs(seconds))
    }

    pub fn remaining(&self) -> Duration { Duration::from_secs(self.remaining) }
    pub fn on_zero(&self) -> OnZero { self.on_zero }
    pub fn is_expired(&self) -> bool { self.on_zero == OnZero::Halt && self.remaining == 0 }
    pub fn clock(&self) -> Clock { Clock::from_secs(self.remaining) }

    /// Advances one second and returns what is left.
    pub fn tick(&mut self) -> Duration {
        self.remaining = match (self.remaining, self.on_zero) {
            (0, OnZero::Wrap) => self.start,
            (0, OnZero::Halt) => 0,
            (n, _) => n - 1,
        };
        self.remaining()
    }

    /// Runs the countdown on a one-second interval. Dropping the handle stops it.
    pub fn spawn(mut self) -> TickerHandle {
        let (tx, rx) = watch::channel(self.remaining());
        let task = tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(1));
            interval.tick().await;
            while !self.is_expired() {
                interval.tick().await;
                if tx.send(self.tick()).is_err() { break; }
            }
            tracing::debug!("countdown finished");
        });
        TickerHandle { rx, task }
    }
}

/// Per-second sequence of remaining durations. Endless when wrapping; a halting
/// countdown ends after yielding zero.
impl Iterator for Countdown {
    type Item = Duration;

    fn next(&mut self) -> Option<Duration> {
        if self.is_expired() { return None; }
        Some(self.tick())
    }
}

/// Owns a running countdown task and aborts it on drop.
#[derive(Debug)]
pub struct TickerHandle {
    rx: watch::Receiver<Duration>,
    task: JoinHandle<()>,
}

impl TickerHandle {
    pub fn remaining(&self) -> Duration { *self.rx.borrow() }
    pub fn subscribe(&self) -> watch::Receiver<Duration> { self.rx.clone() }
    pub fn is_finished(&self) -> bool { self.task.is_finished() }
}

impl Drop for TickerHandle {
    fn drop(&mut self) { self.task.abort(); }
}

/// Days/hours/minutes/seconds breakdown for display.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Clock {
    pub days: u64,
    pub hours: u64,
    pub minutes: u64,
    pub seconds: u64,
}

impl Clock {
    pub fn from_secs(total: u64) -> Self {
        Self {
            days: total / SECONDS_PER_DAY,
            hours: total % SECONDS_PER_DAY / 3_600,
            minutes: total % 3_600 / 60,
            seconds: total % 60,
        }
    }

    pub fn as_duration(&self) -> Duration {
        Duration::from_secs(self.days * SECONDS_PER_DAY + self.hours * 3_600 + self.minutes * 60 + self.seconds)
    }
}

impl fmt::Display for Clock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}:{:02}:{:02}", self.days, self.hours, self.minutes, self.seconds)
    }
}
