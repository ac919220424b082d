//! Variable-speed virtual clock bounded by a fixed horizon.

use std::time::Duration;

use chrono::{NaiveDate, NaiveDateTime};

use crate::error::ValidationError;

const SECONDS_PER_DAY: f64 = 86_400.0;

/// Accepted range for the speed multiplier (app seconds per real second).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpeedBounds {
    pub min: f64,
    pub max: f64,
}

impl Default for SpeedBounds {
    fn default() -> Self {
        Self {
            min: 1.0,
            max: 3600.0,
        }
    }
}

impl SpeedBounds {
    /// Checks a requested multiplier against the bounds.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::SpeedOutOfRange`] for non-finite, zero,
    /// negative, or out-of-range values.
    pub fn check(&self, speed: f64) -> Result<f64, ValidationError> {
        if speed.is_finite() && speed > 0.0 && speed >= self.min && speed <= self.max {
            Ok(speed)
        } else {
            Err(ValidationError::SpeedOutOfRange {
                speed,
                min: self.min,
                max: self.max,
            })
        }
    }
}

/// Outcome of one [`Clock::advance`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advance {
    /// App time after the advance; the horizon has not been reached.
    Running(u64),
    /// App time sits at the horizon. The simulation is complete.
    HorizonReached(u64),
}

impl Advance {
    /// App time after the advance.
    pub fn now(&self) -> u64 {
        match self {
            Self::Running(t) | Self::HorizonReached(t) => *t,
        }
    }
}

/// A variable-speed virtual clock bounded by a fixed horizon.
///
/// App time only moves when the tick driver calls [`Clock::advance`] with
/// the real time that passed since the previous tick. Speed changes never
/// move app time, and restarting returns to zero without touching speed.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use smart_home_sim::sim::clock::{Advance, Clock, SpeedBounds};
///
/// let mut clock = Clock::new(3600, 60.0, SpeedBounds::default()).unwrap();
/// assert_eq!(clock.advance(Duration::from_secs(2)), Advance::Running(120));
/// assert_eq!(clock.advance(Duration::from_secs(600)), Advance::HorizonReached(3600));
/// ```
#[derive(Debug, Clone)]
pub struct Clock {
    /// Whole app seconds since simulation start.
    elapsed: u64,
    /// Sub-second app time not yet folded into `elapsed`.
    carry: f64,
    speed: f64,
    horizon: u64,
    bounds: SpeedBounds,
}

impl Clock {
    /// Creates a clock at app time zero.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::SpeedOutOfRange`] if `speed` is outside `bounds`.
    pub fn new(horizon: u64, speed: f64, bounds: SpeedBounds) -> Result<Self, ValidationError> {
        let speed = bounds.check(speed)?;
        Ok(Self {
            elapsed: 0,
            carry: 0.0,
            speed,
            horizon,
            bounds,
        })
    }

    /// Advances app time by `real_elapsed * speed`, clamped at the horizon.
    ///
    /// Whole seconds are applied immediately; the fractional remainder is
    /// carried into the next call so slow speeds and short ticks do not
    /// lose time.
    pub fn advance(&mut self, real_elapsed: Duration) -> Advance {
        if self.elapsed < self.horizon {
            let total = self.carry + real_elapsed.as_secs_f64() * self.speed;
            let whole = total.floor();
            self.carry = total - whole;
            let step = if whole >= (self.horizon - self.elapsed) as f64 {
                self.horizon - self.elapsed
            } else {
                whole as u64
            };
            self.elapsed += step;
        }

        if self.elapsed >= self.horizon {
            self.carry = 0.0;
            Advance::HorizonReached(self.elapsed)
        } else {
            Advance::Running(self.elapsed)
        }
    }

    /// Changes the speed multiplier without moving app time.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::SpeedOutOfRange`] and leaves the clock
    /// untouched if `speed` is outside the configured bounds.
    pub fn set_speed(&mut self, speed: f64) -> Result<(), ValidationError> {
        self.speed = self.bounds.check(speed)?;
        Ok(())
    }

    /// Returns app time to zero. Speed is kept.
    pub fn restart(&mut self) {
        self.elapsed = 0;
        self.carry = 0.0;
    }

    /// Current app time in whole seconds.
    pub fn now(&self) -> u64 {
        self.elapsed
    }

    pub fn speed(&self) -> f64 {
        self.speed
    }

    pub fn horizon(&self) -> u64 {
        self.horizon
    }

    pub fn bounds(&self) -> SpeedBounds {
        self.bounds
    }

    /// Returns `true` once app time has reached the horizon.
    pub fn is_finished(&self) -> bool {
        self.elapsed >= self.horizon
    }

    /// Real time needed for `app_secs` of app time at the current speed.
    ///
    /// Rounded up to the next nanosecond, so advancing by the result always
    /// covers at least `app_secs`.
    pub fn real_interval(&self, app_secs: u64) -> Duration {
        let nanos = (app_secs as f64 / self.speed * 1e9).ceil();
        Duration::from_nanos(nanos as u64)
    }

    /// App time as fractional days.
    pub fn days_elapsed(&self) -> f64 {
        self.elapsed as f64 / SECONDS_PER_DAY
    }

    /// Renders app time as a wall-calendar label relative to `start`:
    ///
    /// ```text
    /// 12:00:00 AM
    /// Monday
    /// Day 1
    /// ```
    pub fn label(&self, start: NaiveDateTime) -> String {
        let day = self.elapsed / SECONDS_PER_DAY as u64 + 1;
        let at = start + chrono::Duration::seconds(self.elapsed as i64);
        format!("{}\nDay {day}", at.format("%I:%M:%S %p\n%A"))
    }
}

/// Default calendar anchor: midnight on Monday, 29 November 2021.
pub fn default_start() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2021, 11, 29)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clock(horizon: u64, speed: f64) -> Clock {
        Clock::new(horizon, speed, SpeedBounds::default()).expect("valid speed")
    }

    #[test]
    fn test_new_clock() {
        let c = clock(100, 60.0);
        assert_eq!(c.now(), 0);
        assert_eq!(c.speed(), 60.0);
        assert!(!c.is_finished());
    }

    #[test]
    fn advance_scales_real_time_by_speed() {
        let mut c = clock(10_000, 60.0);
        assert_eq!(c.advance(Duration::from_secs(1)), Advance::Running(60));
        assert_eq!(c.advance(Duration::from_millis(500)), Advance::Running(90));
    }

    #[test]
    fn fractional_seconds_carry_over() {
        let mut c = clock(10_000, 1.0);
        for _ in 0..10 {
            c.advance(Duration::from_millis(100));
        }
        // 10 x 0.1 s may land a hair under 1.0 in floating point.
        assert!(c.now() == 1 || c.now() == 0);
        c.advance(Duration::from_millis(150));
        assert_eq!(c.now(), 1);
    }

    #[test]
    fn clamps_and_signals_at_horizon() {
        let mut c = clock(100, 3600.0);
        assert_eq!(c.advance(Duration::from_secs(1)), Advance::HorizonReached(100));
        assert_eq!(c.advance(Duration::from_secs(1)), Advance::HorizonReached(100));
        assert!(c.is_finished());
    }

    #[test]
    fn speed_change_keeps_time() {
        let mut c = clock(1_000_000, 60.0);
        c.advance(Duration::from_secs(3));
        let before = c.now();
        for s in [1.0, 2.5, 60.0, 1800.0, 3600.0] {
            c.set_speed(s).expect("speed in range");
            assert_eq!(c.now(), before);
        }
    }

    #[test]
    fn rejects_bad_speeds() {
        let mut c = clock(100, 60.0);
        for s in [0.0, -1.0, 0.5, 3601.0, f64::NAN, f64::INFINITY] {
            assert!(c.set_speed(s).is_err(), "speed {s} should be rejected");
        }
        assert_eq!(c.speed(), 60.0);
        assert!(Clock::new(100, 0.0, SpeedBounds::default()).is_err());
    }

    #[test]
    fn restart_resets_time_not_speed() {
        let mut c = clock(10_000, 120.0);
        c.advance(Duration::from_secs(5));
        c.restart();
        assert_eq!(c.now(), 0);
        assert_eq!(c.speed(), 120.0);
    }

    #[test]
    fn real_interval_inverts_speed() {
        let c = clock(10_000, 60.0);
        assert_eq!(c.real_interval(30), Duration::from_millis(500));

        let mut slow = Clock::new(86_400, 7.0, SpeedBounds::default()).expect("valid");
        let step = slow.real_interval(1800);
        assert_eq!(slow.advance(step), Advance::Running(1800));
    }

    #[test]
    fn label_formats_calendar_time() {
        let mut c = clock(1_000_000, 3600.0);
        assert_eq!(c.label(default_start()), "12:00:00 AM\nMonday\nDay 1");
        c.advance(Duration::from_secs(25)); // 25 app hours
        assert_eq!(c.label(default_start()), "01:00:00 AM\nTuesday\nDay 2");
        assert!((c.days_elapsed() - 25.0 / 24.0).abs() < 1e-9);
    }
}
