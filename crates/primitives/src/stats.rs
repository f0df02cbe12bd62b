//! Running block-time statistics.

/// Fold one more inter-block gap into a running average.
///
/// `height` is the block that produced `delta_ms`; the previous average covers
/// `height - 1` blocks, so the recurrence is
/// `new = (old * (height - 1) + delta) / height`.
pub fn running_average(old_avg_ms: f64, height: u64, delta_ms: f64) -> f64 {
    debug_assert!(height > 0);
    (old_avg_ms * (height - 1) as f64 + delta_ms) / height as f64
}

#[cfg(test)]
mod tests {
    use super::running_average;

    #[test]
    fn first_height_is_just_the_delta() {
        assert_eq!(running_average(0.0, 1, 5000.0), 5000.0);
    }

    #[test]
    fn average_converges_toward_observed_deltas() {
        // two blocks at 6000ms average, third gap of 3000ms
        let avg = running_average(6000.0, 3, 3000.0);
        assert!((avg - 5000.0).abs() < 1e-9);
    }

    #[test]
    fn constant_deltas_keep_the_average() {
        let mut avg = 5000.0;
        for h in 2..100u64 {
            avg = running_average(avg, h, 5000.0);
        }
        assert!((avg - 5000.0).abs() < 1e-6);
    }
}
