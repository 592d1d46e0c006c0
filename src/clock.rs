use std::time::{Duration, Instant};

use chrono::{NaiveDateTime, Timelike};

use crate::{alarm::AlarmController, audio::AudioOutput};

pub const TICK: Duration = Duration::from_secs(1);

/// Hand rotations in degrees, clockwise from 12 o'clock.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct HandAngles {
    pub hour: f32,
    pub minute: f32,
}

impl HandAngles {
    /// Both hands move a little every second instead of jumping once a minute.
    #[must_use]
    pub fn at(time: &impl Timelike) -> Self {
        let (hour, minute, second) = (
            f64::from(time.hour()),
            f64::from(time.minute()),
            f64::from(time.second()),
        );
        Self {
            #[allow(clippy::cast_possible_truncation)]
            hour: ((hour % 12.0).mul_add(30.0, minute * 0.5) + second * (0.5 / 60.0)) as f32,
            #[allow(clippy::cast_possible_truncation)]
            minute: minute.mul_add(6.0, second * 0.1) as f32,
        }
    }
}

/// what the face shows for one moment
#[derive(Debug, Clone, PartialEq)]
pub struct ClockReading {
    /// `HH:MM`
    pub time_text: String,
    pub hands: HandAngles,
}

impl ClockReading {
    #[must_use]
    pub fn at(now: NaiveDateTime) -> Self {
        Self {
            time_text: now.format("%H:%M").to_string(),
            hands: HandAngles::at(&now),
        }
    }
}

/// Drives the face and the alarm once per interval from the frame loop.
#[derive(Debug)]
pub struct ClockDriver {
    interval: Duration,
    last_tick: Option<Instant>,
    reading: ClockReading,
}

impl ClockDriver {
    #[must_use]
    pub fn new(interval: Duration, now: NaiveDateTime) -> Self {
        Self {
            interval,
            last_tick: None,
            reading: ClockReading::at(now),
        }
    }

    /// Whether a tick is due at `at`. The first poll is always due.
    pub fn poll(&mut self, at: Instant) -> bool {
        let due = self
            .last_tick
            .is_none_or(|last| at.saturating_duration_since(last) >= self.interval);
        if due {
            self.last_tick = Some(at);
        }
        due
    }

    /// time left until the next tick is due
    #[must_use]
    pub fn until_next(&self, at: Instant) -> Duration {
        self.last_tick.map_or(Duration::ZERO, |last| {
            self.interval
                .saturating_sub(at.saturating_duration_since(last))
        })
    }

    /// Updates the reading and lets the alarm check the time. Returns true if
    /// the alarm fired.
    pub fn tick<A: AudioOutput>(&mut self, now: NaiveDateTime, alarm: &mut AlarmController<A>) -> bool {
        self.reading = ClockReading::at(now);
        alarm.check(now)
    }

    #[must_use]
    pub const fn reading(&self) -> &ClockReading {
        &self.reading
    }
}
