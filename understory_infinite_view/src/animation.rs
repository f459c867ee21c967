// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Scoped offset animations driven by the host clock.

use kurbo::{Point, Vec2};

/// Duration of every offset animation, in seconds.
pub(crate) const DURATION: f64 = 0.3;

/// What started an animation; decides which callbacks bracket it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum AnimationKind {
    /// `set_content_offset(.., true)` or `scroll_to_item(.., true)`.
    Programmatic,
    /// Settling after a drag.
    Deceleration,
}

/// An ease-out interpolation between two offsets.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct ScrollAnimation {
    kind: AnimationKind,
    from: Point,
    to: Point,
    elapsed: f64,
}

impl ScrollAnimation {
    pub(crate) fn new(kind: AnimationKind, from: Point, to: Point) -> Self {
        Self {
            kind,
            from,
            to,
            elapsed: 0.0,
        }
    }

    pub(crate) fn kind(&self) -> AnimationKind {
        self.kind
    }

    pub(crate) fn target(&self) -> Point {
        self.to
    }

    /// Restarts from `from` toward `to`, keeping the kind.
    pub(crate) fn retarget(&mut self, from: Point, to: Point) {
        self.from = from;
        self.to = to;
        self.elapsed = 0.0;
    }

    /// Moves both ends by `delta`, after the offset was remapped underneath.
    pub(crate) fn shift(&mut self, delta: Vec2) {
        self.from += delta;
        self.to += delta;
    }

    /// Advances by `dt` seconds. Returns the new offset and whether it arrived.
    pub(crate) fn advance(&mut self, dt: f64) -> (Point, bool) {
        if dt.is_finite() && dt > 0.0 {
            self.elapsed += dt;
        } else if dt == f64::INFINITY {
            self.elapsed = DURATION;
        }
        if self.elapsed >= DURATION {
            return (self.to, true);
        }
        let t = ease_out(self.elapsed / DURATION);
        (self.from.lerp(self.to, t), false)
    }
}

/// Cubic ease-out over `[0, 1]`.
fn ease_out(t: f64) -> f64 {
    let inv = 1.0 - t.clamp(0.0, 1.0);
    1.0 - inv * inv * inv
}

#[cfg(test)]
mod tests {
    use kurbo::{Point, Vec2};

    use super::{AnimationKind, DURATION, ScrollAnimation, ease_out};

    #[test]
    fn ease_out_starts_fast_and_ends_at_one() {
        assert_eq!(ease_out(0.0), 0.0);
        assert_eq!(ease_out(1.0), 1.0);
        assert!(ease_out(0.5) > 0.5);
    }

    #[test]
    fn advance_reaches_the_target_after_the_duration() {
        let mut animation = ScrollAnimation::new(
            AnimationKind::Programmatic,
            Point::ZERO,
            Point::new(100.0, 0.0),
        );
        let (mid, done) = animation.advance(DURATION / 2.0);
        assert!(!done);
        assert!(mid.x > 50.0 && mid.x < 100.0);
        let (end, done) = animation.advance(DURATION);
        assert!(done);
        assert_eq!(end, Point::new(100.0, 0.0));
    }

    #[test]
    fn retarget_and_shift_move_the_endpoints() {
        let mut animation = ScrollAnimation::new(
            AnimationKind::Deceleration,
            Point::ZERO,
            Point::new(100.0, 0.0),
        );
        animation.advance(0.1);
        animation.retarget(Point::new(40.0, 0.0), Point::new(10.0, 0.0));
        animation.shift(Vec2::new(-500.0, 0.0));
        assert_eq!(animation.target(), Point::new(-490.0, 0.0));
        assert_eq!(animation.kind(), AnimationKind::Deceleration);
        assert_eq!(animation.advance(f64::INFINITY), (Point::new(-490.0, 0.0), true));
    }
}
