// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Float helpers that do not need `std` or `libm`.

use kurbo::Rect;

/// Returns `true` if `a` and `b` overlap with positive area.
///
/// Rectangles that merely touch along an edge do not intersect, and an empty
/// rectangle intersects nothing.
pub(crate) fn intersects(a: Rect, b: Rect) -> bool {
    a.x0 < a.x1
        && a.y0 < a.y1
        && b.x0 < b.x1
        && b.y0 < b.y1
        && a.x0 < b.x1
        && b.x0 < a.x1
        && a.y0 < b.y1
        && b.y0 < a.y1
}

/// Returns `true` if `rect` contains `point`, half-open on the far edges.
pub(crate) fn contains(rect: Rect, x: f64, y: f64) -> bool {
    x >= rect.x0 && x < rect.x1 && y >= rect.y0 && y < rect.y1
}

/// Smallest count `n` with `n >= value`; non-positive and non-finite inputs yield `0`.
pub(crate) fn ceil_count(value: f64) -> usize {
    if !value.is_finite() || value <= 0.0 {
        return 0;
    }
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        reason = "value is finite and positive; the truncation is corrected below"
    )]
    let truncated = value as usize;
    #[allow(clippy::cast_precision_loss, reason = "page counts are far below 2^52")]
    let exact = (truncated as f64) >= value;
    if exact { truncated } else { truncated + 1 }
}

/// Largest integer `<= value`, as an `f64`.
pub(crate) fn floor(value: f64) -> f64 {
    if !value.is_finite() {
        return value;
    }
    #[allow(
        clippy::cast_possible_truncation,
        reason = "offsets are far below the i64 range"
    )]
    let truncated = value as i64;
    #[allow(clippy::cast_precision_loss, reason = "round-trips exactly for offsets")]
    let truncated = truncated as f64;
    if truncated > value {
        truncated - 1.0
    } else {
        truncated
    }
}

/// Smallest integer `>= value`, as an `f64`.
pub(crate) fn ceil(value: f64) -> f64 {
    -floor(-value)
}

/// Nearest integer to `value`, halves rounding up.
pub(crate) fn round(value: f64) -> f64 {
    floor(value + 0.5)
}

/// `value` modulo `period`, normalized into `[0, period)`.
pub(crate) fn wrap_into(value: f64, period: f64) -> f64 {
    if period <= 0.0 {
        return value;
    }
    let rem = value % period;
    if rem < 0.0 { rem + period } else { rem }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ceil_count_rounds_up_fractions_only() {
        assert_eq!(ceil_count(2.0), 2);
        assert_eq!(ceil_count(1.25), 2);
        assert_eq!(ceil_count(0.0), 0);
        assert_eq!(ceil_count(-3.0), 0);
        assert_eq!(ceil_count(f64::NAN), 0);
    }

    #[test]
    fn floor_ceil_round_handle_negatives() {
        assert_eq!(floor(-0.5), -1.0);
        assert_eq!(floor(2.75), 2.0);
        assert_eq!(ceil(-0.5), 0.0);
        assert_eq!(ceil(2.25), 3.0);
        assert_eq!(round(2.5), 3.0);
        assert_eq!(round(-1.4), -1.0);
    }

    #[test]
    fn touching_rects_do_not_intersect() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        assert!(intersects(a, Rect::new(5.0, 5.0, 15.0, 15.0)));
        assert!(!intersects(a, Rect::new(10.0, 0.0, 20.0, 10.0)));
        assert!(!intersects(a, Rect::new(2.0, 2.0, 2.0, 8.0)));
    }

    #[test]
    fn wrap_into_normalizes_negative_values() {
        assert_eq!(wrap_into(-25.0, 100.0), 75.0);
        assert_eq!(wrap_into(250.0, 100.0), 50.0);
        assert_eq!(wrap_into(40.0, 0.0), 40.0);
    }
}
