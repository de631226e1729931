//! Epsilon-terminated linear approach, shared by aim zoom, bow pull and reload.
//!
//! Plain frame-time lerps only ever approach their target asymptotically, so each
//! user of these helpers treats "within `epsilon`" as arrived.

/// Returns `true` when `current` is inside the `epsilon` band around `target`.
pub fn settled(current: f32, target: f32, epsilon: f32) -> bool {
    (current - target).abs() <= epsilon
}

/// Moves `current` toward `target` by the fraction `t` (clamped to `0..=1`).
///
/// Nothing happens when `current` is already settled, in which case this returns
/// `true`. Otherwise the value is stepped and `false` is returned, so arrival is
/// reported on the frame after the step that reached the band.
pub fn approach(current: &mut f32, target: f32, t: f32, epsilon: f32) -> bool {
    if settled(*current, target, epsilon) {
        return true;
    }

    // A full step lands exactly on the target, so the value never overshoots.
    if t >= 1.0 {
        *current = target;
    } else {
        *current += (target - *current) * t.max(0.0);
    }
    false
}

/// Convenience for the common `rate * delta` lerp factor.
pub fn step_factor(rate: f32, delta_secs: f32) -> f32 {
    (rate * delta_secs).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn settled_value_is_left_untouched() {
        let mut value = 30.05;
        assert!(approach(&mut value, 30.0, 0.5, 0.1));
        assert_eq!(value, 30.05);
    }

    #[test]
    fn converges_in_finite_frames_for_small_rates() {
        for rate in [0.1_f32, 1.2, 3.0, 5.0, 60.0, 1000.0] {
            let mut value = 60.0;
            let mut frames = 0;
            while !approach(&mut value, 30.0, step_factor(rate, 1.0 / 60.0), 0.1) {
                frames += 1;
                assert!(frames < 100_000, "rate {rate} never settled");
            }
            assert!(settled(value, 30.0, 0.1));
        }
    }

    #[test]
    fn never_crosses_the_target() {
        let mut value = 0.0;
        let mut previous_gap = 1.0_f32;
        loop {
            let done = approach(&mut value, 1.0, 0.7, 0.01);
            let gap = 1.0 - value;
            assert!(gap >= 0.0);
            assert!(gap <= previous_gap);
            previous_gap = gap;
            if done {
                break;
            }
        }
    }

    #[test]
    fn large_factor_snaps_to_target() {
        let mut value = -3.0;
        assert!(!approach(&mut value, 0.3, 4.0, 0.1));
        assert_eq!(value, 0.3);
        assert!(approach(&mut value, 0.3, 4.0, 0.1));
    }
}
