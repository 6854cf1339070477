//! Multi-frame value transitions.
//!
//! State is explicit and advanced by `tick(dt)` from the frame loop. Nothing
//! here sleeps or schedules.

use crate::scaled::Lerp;

#[derive(Debug, Clone, PartialEq)]
pub struct Transition<T: Lerp> {
    active: bool,
    start: T,
    target: T,
    elapsed: f32,
    duration: f32,
    /// Return to `start` after reaching `target`.
    ping_pong: bool,
    returning: bool,
}

impl<T: Lerp> Transition<T> {
    /// An idle transition resting at `value`.
    pub fn idle(value: T) -> Self {
        Self {
            active: false,
            start: value.clone(),
            target: value,
            elapsed: 0.0,
            duration: 0.0,
            ping_pong: false,
            returning: false,
        }
    }

    pub fn start(&mut self, from: T, to: T, duration: f32) {
        self.active = true;
        self.start = from;
        self.target = to;
        self.elapsed = 0.0;
        self.duration = duration.max(0.0);
        self.ping_pong = false;
        self.returning = false;
    }

    /// Go `from -> to -> from`, each leg taking `leg_duration`.
    pub fn start_ping_pong(&mut self, from: T, to: T, leg_duration: f32) {
        self.start(from, to, leg_duration);
        self.ping_pong = true;
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn progress(&self) -> f32 {
        if self.duration <= 0.0 {
            1.0
        } else {
            (self.elapsed / self.duration).min(1.0)
        }
    }

    pub fn value(&self) -> T {
        if !self.active {
            return self.target.clone();
        }
        T::lerp(&self.start, &self.target, self.progress())
    }

    pub fn cancel(&mut self) {
        self.active = false;
    }

    /// Advance by `dt` seconds. Returns the new value while running, including
    /// the final value on the tick that completes the transition.
    pub fn tick(&mut self, dt: f32) -> Option<T> {
        if !self.active {
            return None;
        }
        self.elapsed += dt;
        if self.elapsed < self.duration {
            return Some(self.value());
        }
        if self.ping_pong && !self.returning {
            self.returning = true;
            self.elapsed = 0.0;
            std::mem::swap(&mut self.start, &mut self.target);
            return Some(self.start.clone());
        }
        self.active = false;
        Some(self.target.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn runs_to_target_then_stops() {
        let mut t = Transition::idle(0.0_f32);
        t.start(0.0, 1.0, 1.0);
        assert_eq!(t.tick(0.5), Some(0.5));
        assert_eq!(t.tick(0.5), Some(1.0));
        assert!(!t.is_active());
        assert_eq!(t.tick(0.5), None);
        assert_eq!(t.value(), 1.0);
    }

    #[test]
    fn ping_pong_returns_to_start() {
        let mut t = Transition::idle(0.0_f32);
        t.start_ping_pong(0.0, 1.0, 0.5);
        assert_eq!(t.tick(0.25), Some(0.5));
        assert_eq!(t.tick(0.25), Some(1.0));
        assert!(t.is_active());
        assert_eq!(t.tick(0.25), Some(0.5));
        assert_eq!(t.tick(0.25), Some(0.0));
        assert!(!t.is_active());
    }

    #[test]
    fn zero_duration_completes_immediately() {
        let mut t = Transition::idle(0_i32);
        t.start(0, 10, 0.0);
        assert_eq!(t.tick(0.0), Some(10));
    }
}
