//! Level mapping - cumulative XP to level and band progress.

use ember_core::catalog::LEVEL_THRESHOLDS;

/// Map cumulative XP to a level.
///
/// Returns the smallest `i + 1` such that `xp < LEVEL_THRESHOLDS[i]`,
/// scanning from index 1. XP at or beyond the last threshold maps to the
/// top tabulated level; the table's last band is open-ended.
pub fn level_of(xp: u64) -> u32 {
    for (i, threshold) in LEVEL_THRESHOLDS.iter().enumerate().skip(1) {
        if xp < *threshold {
            return i as u32;
        }
    }
    LEVEL_THRESHOLDS.len() as u32
}

/// Fractional progress through the current level band, as a percentage.
///
/// The upper bound of the top band is synthesized as `floor * 1.5`, so
/// the result can exceed 100 there; callers that need a gauge value may
/// clamp for display, but the metric itself is not clamped.
pub fn level_progress(xp: u64) -> f64 {
    let level = level_of(xp) as usize;
    let floor = LEVEL_THRESHOLDS[level - 1];
    let upper = match LEVEL_THRESHOLDS.get(level) {
        Some(t) => *t as f64,
        None => floor as f64 * 1.5,
    };

    (xp - floor) as f64 / (upper - floor as f64) * 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_xp_is_level_one_with_no_progress() {
        assert_eq!(level_of(0), 1);
        assert_eq!(level_progress(0), 0.0);
    }

    #[test]
    fn levels_at_band_boundaries() {
        assert_eq!(level_of(99), 1);
        assert_eq!(level_of(100), 2);
        assert_eq!(level_of(249), 2);
        assert_eq!(level_of(250), 3);
    }

    #[test]
    fn xp_beyond_the_table_maps_to_the_top_level() {
        assert_eq!(level_of(3250), 10);
        assert_eq!(level_of(4000), 10);
        assert_eq!(level_of(u64::MAX), 10);
    }

    #[test]
    fn progress_is_halfway_through_a_band() {
        // Level 2 spans [100, 250); 175 is exactly halfway.
        assert!((level_progress(175) - 50.0).abs() < 1e-9);
    }

    #[test]
    fn top_band_progress_is_not_clamped() {
        // Top band floor is 2700, synthesized upper 4050.
        assert!(level_progress(4050) >= 100.0);
        assert!(level_progress(5000) > 100.0);
    }
}
