//! Focus/break segment planning.
//!
//! Divides a requested focus duration into equal focus slices with
//! breaks interleaved between them. A break is only inserted when at
//! least [`MIN_FOCUS_SLICE_SECS`] of focus fits alongside it.

use super::{Segment, SegmentKind};

/// Minimum focus slice (seconds) below which inserting a break is not
/// meaningful.
pub const MIN_FOCUS_SLICE_SECS: u64 = 5 * 60;

/// Plan the ordered segment list for a session.
///
/// Returns `2 * breaks + 1` segments where
/// `breaks = min(max_breaks, total / (MIN_FOCUS_SLICE_SECS + break_duration))`.
/// The focus time is split evenly; the integer remainder goes to the
/// last focus segment so the segment durations sum to exactly
/// `total_focus_duration + breaks * break_duration`.
///
/// Very short (or zero) totals yield a single focus segment and never
/// error.
pub fn plan_segments(total_focus_duration: u64, break_duration: u64, max_breaks: u32) -> Vec<Segment> {
    let breaks = total_focus_duration
        .checked_div(MIN_FOCUS_SLICE_SECS.saturating_add(break_duration))
        .unwrap_or(0)
        .min(u64::from(max_breaks));

    let slots = breaks + 1;
    let focus_len = total_focus_duration / slots;
    let remainder = total_focus_duration % slots;

    let mut segments = Vec::with_capacity((2 * breaks + 1) as usize);
    for i in 0..slots {
        let mut len = focus_len;
        if i == slots - 1 {
            len += remainder;
        }
        segments.push(Segment::new(SegmentKind::Focus, len));
        if i < breaks {
            segments.push(Segment::new(SegmentKind::Break, break_duration));
        }
    }
    segments
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn breaks_used(segments: &[Segment]) -> u64 {
        segments
            .iter()
            .filter(|s| s.kind == SegmentKind::Break)
            .count() as u64
    }

    #[test]
    fn interleaves_breaks_between_equal_focus_slices() {
        // 25 min focus, 5 min breaks, up to 4 breaks -> 2 fit.
        let segments = plan_segments(1500, 300, 4);
        assert_eq!(segments.len(), 5);
        let kinds: Vec<_> = segments.iter().map(|s| s.kind).collect();
        assert_eq!(
            kinds,
            vec![
                SegmentKind::Focus,
                SegmentKind::Break,
                SegmentKind::Focus,
                SegmentKind::Break,
                SegmentKind::Focus,
            ]
        );
        for seg in segments.iter().filter(|s| s.kind == SegmentKind::Focus) {
            assert_eq!(seg.total_duration, 500);
        }
        let sum: u64 = segments.iter().map(|s| s.total_duration).sum();
        assert_eq!(sum, 1500 + 2 * 300);
    }

    #[test]
    fn short_total_yields_single_focus_segment() {
        let segments = plan_segments(120, 300, 3);
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].kind, SegmentKind::Focus);
        assert_eq!(segments[0].total_duration, 120);
    }

    #[test]
    fn zero_everything_does_not_panic() {
        let segments = plan_segments(0, 0, 0);
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].total_duration, 0);
    }

    #[test]
    fn huge_break_duration_disables_breaks_without_overflow() {
        let segments = plan_segments(1500, u64::MAX, 4);
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].kind, SegmentKind::Focus);
        assert_eq!(segments[0].total_duration, 1500);
    }

    #[test]
    fn remainder_goes_to_last_focus_segment() {
        // 1501s over 3 focus slices: 500 + 500 + 501.
        let segments = plan_segments(1501, 300, 2);
        let focus: Vec<u64> = segments
            .iter()
            .filter(|s| s.kind == SegmentKind::Focus)
            .map(|s| s.total_duration)
            .collect();
        assert_eq!(focus, vec![500, 500, 501]);
    }

    proptest! {
        #[test]
        fn durations_sum_exactly(
            total in 0u64..=48 * 3600,
            break_dur in 0u64..=3600,
            max_breaks in 0u32..=12,
        ) {
            let segments = plan_segments(total, break_dur, max_breaks);
            let breaks = breaks_used(&segments);
            prop_assert!(breaks <= u64::from(max_breaks));
            prop_assert_eq!(segments.len() as u64, 2 * breaks + 1);
            let sum: u64 = segments.iter().map(|s| s.total_duration).sum();
            prop_assert_eq!(sum, total + breaks * break_dur);
        }
    }
}
