//! Timeline normalization.
//!
//! Source timestamps are converted into extraction segments and into
//! clip-relative times for captions and overlays.

use hilite_models::{NormalizedUtterance, Segment, TimeSpan, Utterance};

/// Default maximum gap, in seconds, bridged when merging spans.
pub const DEFAULT_GAP_THRESHOLD_SECS: f64 = 1.5;

/// Pieces shorter than this are dropped after clipping to a segment.
const MIN_PIECE_SECS: f64 = 1e-3;

/// Merge spans whose gap is at most `gap_threshold` into segments.
///
/// The output is sorted, non-overlapping and covers every input span.
pub fn merge_continuous_utterances<T: TimeSpan>(spans: &[T], gap_threshold: f64) -> Vec<Segment> {
    let mut sorted: Vec<(f64, f64)> = spans.iter().map(|s| (s.start(), s.end())).collect();
    sorted.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.total_cmp(&b.1)));

    let mut merged: Vec<Segment> = Vec::with_capacity(sorted.len());
    for (start, end) in sorted {
        if let Some(last) = merged.last_mut() {
            if start - last.end_timestamp <= gap_threshold {
                last.end_timestamp = last.end_timestamp.max(end);
                continue;
            }
        }
        merged.push(Segment::new(start, end.max(start)));
    }
    merged
}

/// Lay utterances end to end from zero, in input order.
///
/// Utterances with zero or negative duration are dropped; the originals
/// are kept on each result.
pub fn normalize_utterance_timestamps(utterances: &[Utterance]) -> Vec<NormalizedUtterance> {
    let mut cursor = 0.0;
    utterances
        .iter()
        .filter(|u| u.end_timestamp > u.start_timestamp)
        .map(|u| {
            let start = cursor;
            cursor += u.end_timestamp - u.start_timestamp;
            NormalizedUtterance {
                utterance: u.clone(),
                normalized_start: start,
                normalized_end: cursor,
            }
        })
        .collect()
}

/// Map utterances onto the concatenation of `segments`.
///
/// Each utterance is clipped to every segment it overlaps and placed at
/// that segment's offset in the output, so silences inside a segment are
/// preserved. An utterance spanning two segments yields two pieces.
pub fn normalize_within_segments(
    utterances: &[Utterance],
    segments: &[Segment],
) -> Vec<NormalizedUtterance> {
    let mut result = Vec::new();
    let mut offset = 0.0;

    for segment in segments.iter().filter(|s| s.is_valid()) {
        for utterance in utterances.iter().filter(|u| segment.overlaps(*u)) {
            let start = utterance.start_timestamp.max(segment.start_timestamp);
            let end = utterance.end_timestamp.min(segment.end_timestamp);
            if end - start < MIN_PIECE_SECS {
                continue;
            }
            result.push(NormalizedUtterance {
                utterance: utterance.clone(),
                normalized_start: offset + (start - segment.start_timestamp),
                normalized_end: offset + (end - segment.start_timestamp),
            });
        }
        offset += segment.duration();
    }

    result.sort_by(|a, b| a.normalized_start.total_cmp(&b.normalized_start));
    result
}

/// Combined length of the segments.
pub fn total_duration(segments: &[Segment]) -> f64 {
    segments.iter().map(TimeSpan::duration).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spans(pairs: &[(f64, f64)]) -> Vec<Utterance> {
        pairs
            .iter()
            .map(|&(s, e)| Utterance::new("w", s, e))
            .collect()
    }

    #[test]
    fn test_merge_empty() {
        assert!(merge_continuous_utterances::<Utterance>(&[], 1.5).is_empty());
    }

    #[test]
    fn test_merge_bridges_small_gaps() {
        let input = spans(&[(10.0, 12.0), (0.0, 2.0), (3.0, 5.0), (5.5, 6.0)]);
        let merged = merge_continuous_utterances(&input, 1.5);
        assert_eq!(merged, vec![Segment::new(0.0, 6.0), Segment::new(10.0, 12.0)]);
    }

    #[test]
    fn test_merge_gap_equal_to_threshold_merges() {
        let merged = merge_continuous_utterances(&spans(&[(0.0, 1.0), (2.5, 3.0)]), 1.5);
        assert_eq!(merged, vec![Segment::new(0.0, 3.0)]);
    }

    #[test]
    fn test_merge_keeps_contained_span_end() {
        let merged = merge_continuous_utterances(&spans(&[(0.0, 10.0), (2.0, 4.0)]), 0.0);
        assert_eq!(merged, vec![Segment::new(0.0, 10.0)]);
    }

    #[test]
    fn test_merge_output_is_sorted_disjoint_and_covering() {
        let input = spans(&[(40.0, 41.0), (1.0, 3.0), (20.0, 25.0), (2.0, 8.0), (26.0, 27.0)]);
        let merged = merge_continuous_utterances(&input, 0.5);
        for pair in merged.windows(2) {
            assert!(pair[0].end_timestamp < pair[1].start_timestamp);
        }
        for span in &input {
            assert!(merged
                .iter()
                .any(|m| m.start_timestamp <= span.start_timestamp
                    && m.end_timestamp >= span.end_timestamp));
        }
    }

    #[test]
    fn test_normalize_worked_example() {
        let input = spans(&[(100.0, 105.0), (200.0, 203.0), (300.0, 310.0)]);
        let normalized = normalize_utterance_timestamps(&input);
        let ranges: Vec<(f64, f64)> = normalized
            .iter()
            .map(|n| (n.normalized_start, n.normalized_end))
            .collect();
        assert_eq!(ranges, vec![(0.0, 5.0), (5.0, 8.0), (8.0, 18.0)]);
        assert_eq!(normalized[1].utterance.start_timestamp, 200.0);
    }

    #[test]
    fn test_normalize_drops_empty_utterances() {
        let input = spans(&[(0.0, 2.0), (5.0, 5.0), (6.0, 4.0), (8.0, 9.0)]);
        let normalized = normalize_utterance_timestamps(&input);
        assert_eq!(normalized.len(), 2);
        assert_eq!(normalized[1].normalized_start, 2.0);
        assert_eq!(normalized[1].normalized_end, 3.0);
    }

    #[test]
    fn test_within_segments_matches_accumulation_for_one_segment_each() {
        let input = spans(&[(100.0, 105.0), (200.0, 203.0), (300.0, 310.0)]);
        let segments: Vec<Segment> = input
            .iter()
            .map(|u| Segment::new(u.start_timestamp, u.end_timestamp))
            .collect();
        assert_eq!(
            normalize_within_segments(&input, &segments),
            normalize_utterance_timestamps(&input)
        );
    }

    #[test]
    fn test_within_segments_preserves_gaps_and_clips() {
        let input = spans(&[(9.0, 12.0), (14.0, 15.0), (30.0, 31.0), (50.0, 51.0)]);
        let segments = vec![Segment::new(10.0, 16.0), Segment::new(29.0, 32.0)];
        let normalized = normalize_within_segments(&input, &segments);

        let ranges: Vec<(f64, f64)> = normalized
            .iter()
            .map(|n| (n.normalized_start, n.normalized_end))
            .collect();
        assert_eq!(ranges, vec![(0.0, 2.0), (4.0, 5.0), (7.0, 8.0)]);
        assert!((total_duration(&segments) - 9.0).abs() < 1e-9);
    }
}
